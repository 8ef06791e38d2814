//! Append-only audit rows kept in the relational `access_logs` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Action recorded against a product.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessAction {
    Create,
}

impl AccessAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessAction::Create => "CREATE",
        }
    }
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown access action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for AccessAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AccessAction::Create),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// One row of `access_logs`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccessLogEntry {
    /// Auto-increment key assigned by the database.
    pub id: i64,

    pub product_id: String,

    pub action: AccessAction,

    /// When the action was recorded (UTC).
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_uppercase_action() {
        let entry = AccessLogEntry {
            id: 7,
            product_id: "p-1".into(),
            action: AccessAction::Create,
            timestamp: Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "CREATE");
        assert_eq!(json["timestamp"], "2026-10-18T09:30:00Z");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn parses_stored_action() {
        assert_eq!("CREATE".parse::<AccessAction>().unwrap(), AccessAction::Create);
        assert!("DELETE".parse::<AccessAction>().is_err());
    }
}
