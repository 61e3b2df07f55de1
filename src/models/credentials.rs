use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{ERR_MISSING_REFRESH_TOKEN, ERR_MISSING_WAREHOUSE_ID};
use crate::error::AppError;

/// Credentials record stored in redb
/// Uses Unix timestamp for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRecord {
    pub refresh_token: String,
    pub warehouse_id: String,
    /// When the credentials were saved (Unix timestamp)
    pub updated_at: i64,
}

/// The single active set of upstream credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub refresh_token: String,
    pub warehouse_id: String,
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    /// Validate and trim raw credential input
    ///
    /// Rejects empty or whitespace-only values with a field-level message.
    pub fn validate(refresh_token: &str, warehouse_id: &str) -> Result<(String, String), AppError> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AppError::InvalidInput(ERR_MISSING_REFRESH_TOKEN.to_string()));
        }

        let warehouse_id = warehouse_id.trim();
        if warehouse_id.is_empty() {
            return Err(AppError::InvalidInput(ERR_MISSING_WAREHOUSE_ID.to_string()));
        }

        Ok((refresh_token.to_string(), warehouse_id.to_string()))
    }

    /// Last four characters of the refresh token, masked
    pub fn token_hint(&self) -> String {
        let chars: Vec<char> = self.refresh_token.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("***{}", tail)
    }
}

impl From<CredentialsRecord> for Credentials {
    fn from(record: CredentialsRecord) -> Self {
        Self {
            refresh_token: record.refresh_token,
            warehouse_id: record.warehouse_id,
            updated_at: DateTime::from_timestamp(record.updated_at, 0).unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_values() {
        let (token, warehouse) = Credentials::validate("  tok-123 ", "\tV2FyZWhvdXNlOjE=\n").unwrap();
        assert_eq!(token, "tok-123");
        assert_eq!(warehouse, "V2FyZWhvdXNlOjE=");
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let err = Credentials::validate("   ", "wh").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == ERR_MISSING_REFRESH_TOKEN));

        let err = Credentials::validate("token", "").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(ref m) if m == ERR_MISSING_WAREHOUSE_ID));
    }

    #[test]
    fn test_token_hint() {
        let creds = Credentials {
            refresh_token: "abcdefgh1234".to_string(),
            warehouse_id: "wh".to_string(),
            updated_at: Utc::now(),
        };
        assert_eq!(creds.token_hint(), "***1234");

        let short = Credentials {
            refresh_token: "ab".to_string(),
            ..creds
        };
        assert_eq!(short.token_hint(), "***ab");
    }
}
