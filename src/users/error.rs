/// Domain error kinds surfaced by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Not found")]
    NotFound,

    #[error("Already exists")]
    AlreadyExists,

    #[error("Hashing failed: {0}")]
    HashingFailure(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Storage call timed out")]
    Timeout,
}

impl From<mongodb::error::Error> for AccountError {
    fn from(e: mongodb::error::Error) -> Self {
        if is_duplicate_key(&e) {
            AccountError::AlreadyExists
        } else {
            AccountError::StorageFailure(e.to_string())
        }
    }
}

const DUPLICATE_KEY: i32 = 11000;

pub(crate) fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(bw) => bw
            .write_errors
            .as_ref()
            .is_some_and(|errs| errs.iter().any(|we| we.code == DUPLICATE_KEY)),
        ErrorKind::Command(ce) => ce.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use mongodb::{
        bson::{self, doc},
        error::{ErrorKind, WriteError, WriteFailure},
    };

    use super::*;

    fn write_error(code: i32) -> mongodb::error::Error {
        let we: WriteError = bson::from_document(doc! {
            "code": code,
            "codeName": "Test",
            "errmsg": "write failed",
        })
        .unwrap();
        mongodb::error::Error::from(ErrorKind::Write(WriteFailure::WriteError(we)))
    }

    #[test]
    fn duplicate_key_maps_to_already_exists() {
        let e = write_error(DUPLICATE_KEY);
        assert!(is_duplicate_key(&e));
        assert!(matches!(AccountError::from(e), AccountError::AlreadyExists));
    }

    #[test]
    fn other_write_errors_are_storage_failures() {
        let e = write_error(121);
        assert!(!is_duplicate_key(&e));
        assert!(matches!(AccountError::from(e), AccountError::StorageFailure(_)));
    }
}
