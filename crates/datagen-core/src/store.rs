use async_trait::async_trait;

use crate::error::StoreError;

/// Read access to the store backing `random_row` generators.
#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Returns the engine identifier (e.g. `sqlite`).
    fn engine(&self) -> &'static str;

    /// `select value from {table} where {column} = {value}`.
    async fn select_values(
        &self,
        table: &str,
        column: &str,
        value: &str,
    ) -> Result<Vec<String>, StoreError>;
}

/// Check that a table or column name can be spliced into SQL as-is.
pub fn validate_identifier(name: &str) -> Result<&str, StoreError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_identifier("person_prop").is_ok());
        assert!(validate_identifier("_type").is_ok());
    }

    #[test]
    fn rejects_injection_attempts() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1table").is_err());
        assert!(validate_identifier("person; drop table locale").is_err());
    }
}
