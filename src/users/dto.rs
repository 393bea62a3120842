use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::repo_types::User;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Request body for Store and Update. Server-owned fields are accepted and
/// then overwritten by the service on Store.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: i32,
    pub is_email_verified: bool,
    pub is_active: bool,
    pub active_until: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<UserPayload> for User {
    fn from(p: UserPayload) -> Self {
        Self {
            id: p.id,
            email: p.email,
            username: p.username,
            password: Some(p.password),
            role: p.role,
            is_email_verified: p.is_email_verified,
            is_active: p.is_active,
            active_until: p.active_until,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Query string for FindAll. Anything missing is normalized by the repository.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub order_by: String,
    pub order_type: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails are stored trimmed and lowercased, so lookups by email are too.
/// Ids and usernames are matched as given.
pub fn normalize_identifier(raw: &str) -> String {
    if raw.contains('@') {
        raw.trim().to_lowercase()
    } else {
        raw.to_string()
    }
}

impl UserPayload {
    /// Trim/lowercase identifiers and reject malformed input. On Update an
    /// empty password means "keep the current one".
    pub fn validate(&mut self, password_required: bool) -> Result<(), String> {
        self.email = self.email.trim().to_lowercase();
        self.username = self.username.trim().to_string();

        if !is_valid_email(&self.email) {
            return Err("Invalid email".into());
        }
        if self.username.is_empty() {
            return Err("Username is required".into());
        }
        let skip_password = !password_required && self.password.is_empty();
        if !skip_password && self.password.len() < MIN_PASSWORD_LEN {
            return Err("Password too short".into());
        }
        Ok(())
    }
}
