use serde::{Deserialize, Serialize};

/// User document in the `users` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,                         // server-assigned, immutable
    pub email: String,                      // unique
    pub username: String,                   // unique
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,           // Argon2 hash, projected out on reads
    #[serde(default)]
    pub role: i32,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub active_until: i64,                  // unix seconds
    #[serde(default)]
    pub created_at: i64,                    // unix seconds, set once
    #[serde(default)]
    pub updated_at: i64,                    // unix seconds
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAt,
    UpdatedAt,
}

impl OrderBy {
    /// Unknown or empty values fall back to `created_at`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "UPDATED_AT" => OrderBy::UpdatedAt,
            _ => OrderBy::CreatedAt,
        }
    }

    pub fn field(self) -> &'static str {
        match self {
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Asc,
    Desc,
}

impl OrderType {
    /// Unknown or empty values fall back to ascending.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "DESC" => OrderType::Desc,
            _ => OrderType::Asc,
        }
    }

    pub fn direction(self) -> i32 {
        match self {
            OrderType::Asc => 1,
            OrderType::Desc => -1,
        }
    }
}

/// Normalized FindAll parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    pub limit: i64,
    pub order_by: OrderBy,
    pub order_type: OrderType,
}

impl ListQuery {
    pub fn normalize(page: i64, limit: i64, order_by: &str, order_type: &str) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            order_by: OrderBy::parse(order_by),
            order_type: OrderType::parse(order_type),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit) as u64
    }
}

/// One page of users plus paging metadata. Built per FindAll call.
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult {
    pub total_records: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub data: Vec<User>,
    pub next_page: Option<i64>,
    pub prev_page: Option<i64>,
}

impl PagedResult {
    pub fn new(data: Vec<User>, total_records: i64, query: &ListQuery) -> Self {
        let total_pages = if total_records <= 0 {
            0
        } else {
            (total_records - 1) / query.limit + 1
        };
        let next_page = (query.page < total_pages).then(|| query.page + 1);
        let prev_page = (query.page > 1).then(|| query.page - 1);
        Self {
            total_records,
            page: query.page,
            limit: query.limit,
            total_pages,
            data,
            next_page,
            prev_page,
        }
    }
}
