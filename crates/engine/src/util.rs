use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parses a stored id column back into a [`Uuid`].
///
/// The label names the entity in the error message ("member", "household").
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_uuid() {
        let err = parse_uuid("not-a-uuid", "member").unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidId("invalid member id".to_string())
        );
    }

    #[test]
    fn accepts_canonical_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "member").unwrap(), id);
    }
}
