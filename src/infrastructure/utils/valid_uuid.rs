use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path id, answering 400 rather than 404 for malformed ids.
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidInput(format!("Invalid id '{}': expected a UUID", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(valid_uuid(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn rejects_garbage_as_invalid_input() {
        assert!(matches!(valid_uuid("42"), Err(AppError::InvalidInput(_))));
    }
}
