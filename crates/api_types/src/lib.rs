//! Wire types of the kakeibo ledger API.
//!
//! Every endpoint lives under `api/` and is authenticated with a `key` query
//! parameter. Bodies are JSON except for `upload` (multipart) and `download`
//! (TSV attachment).

use serde::{Deserialize, Serialize};

pub mod receipt {
    use super::*;

    /// A receipt read by the server from an uploaded picture.
    ///
    /// The reader fills whatever it managed to recognize, so every field is
    /// optional.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Receipt {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub date: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub amount: Option<i64>,
        /// Invoice registration number (`T` followed by 13 digits).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub registration: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub remark: Option<String>,
    }

    /// Response body of `POST api/upload`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UploadResponse {
        pub receipts: Vec<Receipt>,
    }
}

pub mod entry {
    use super::*;
    use chrono::NaiveDate;
    use std::fmt;

    /// Identifier assigned by the ledger to a sent entry.
    ///
    /// The ledger hands out Unix timestamps, suffixed with `+n` when several
    /// entries are recorded within the same second. Depending on the server
    /// version it arrives as a JSON string or number; it is echoed back in
    /// the same shape.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum EntryId {
        Number(i64),
        Text(String),
    }

    impl fmt::Display for EntryId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Number(id) => write!(f, "{id}"),
                Self::Text(id) => f.write_str(id),
            }
        }
    }

    impl From<&str> for EntryId {
        fn from(value: &str) -> Self {
            match value.parse::<i64>() {
                Ok(id) => Self::Number(id),
                Err(_) => Self::Text(value.to_string()),
            }
        }
    }

    /// Request body of `POST api/send`.
    ///
    /// Amounts are signed yen per member: negative for an expense, positive
    /// for a gain, `null` when the member is not involved.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EntryNew {
        pub date: NaiveDate,
        pub riku: Option<i64>,
        pub anju: Option<i64>,
        pub remark: String,
        pub category: String,
        pub registration: String,
    }

    /// Response body of `POST api/send`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryCreated {
        pub id: EntryId,
    }

    /// Request body of `POST api/withdraw`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Withdrawal {
        pub id: EntryId,
    }
}

/// Error body returned by the API on failure.
///
/// The ledger reports `{"detail": ...}`; `error` is accepted too. The detail
/// is usually a string, but request validation errors carry a list of
/// `{"loc", "msg", "type"}` objects.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(alias = "error")]
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Human readable form of the detail. List items are joined with `; `.
    pub fn message(&self) -> String {
        fn item(value: &serde_json::Value) -> String {
            match value {
                serde_json::Value::String(text) => text.clone(),
                serde_json::Value::Object(fields) => match fields.get("msg") {
                    Some(serde_json::Value::String(msg)) => msg.clone(),
                    _ => value.to_string(),
                },
                other => other.to_string(),
            }
        }

        match &self.detail {
            serde_json::Value::Array(items) => {
                items.iter().map(item).collect::<Vec<_>>().join("; ")
            }
            other => item(other),
        }
    }
}
