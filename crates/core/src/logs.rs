//! Server log listing payloads returned by `/api/v1/logs/`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::query::SortDirection;
use crate::timestamp;
use crate::types::Timestamp;

/// One server log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default, with = "timestamp::option")]
    pub log_date: Option<Timestamp>,
    /// Log level as emitted by the server (`INFO`, `WARNING`, ...).
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
    pub total_count: u64,
    pub items: Vec<LogRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSortColumn {
    LogDate,
    Status,
}

impl LogSortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogDate => "log_date",
            Self::Status => "status",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "log_date" => Ok(Self::LogDate),
            "status" => Ok(Self::Status),
            other => Err(CoreError::UnknownVariant {
                kind: "log sort column",
                value: other.to_string(),
            }),
        }
    }
}

/// Parameters for `/api/v1/logs/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub count: u32,
    pub offset: u64,
    pub search: String,
    pub sort_column: LogSortColumn,
    pub sort_direction: SortDirection,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            count: 70,
            offset: 0,
            search: String::new(),
            sort_column: LogSortColumn::LogDate,
            sort_direction: SortDirection::Desc,
        }
    }
}

impl LogQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("count", self.count.to_string()),
            ("offset", self.offset.to_string()),
            ("search", self.search.clone()),
            ("sort_by", self.sort_column.as_str().to_string()),
            ("sort_direction", self.sort_direction.as_str().to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_log_page() {
        let json = r#"{"total_count":1,"items":[
            {"log_date":"2024-05-01 12:00:00,123","status":"INFO","message":"started"}
        ]}"#;
        let page: LogPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items[0].status, "INFO");
        assert!(page.items[0].log_date.is_some());
    }

    #[test]
    fn malformed_log_date_fails_decoding() {
        let json = r#"{"total_count":1,"items":[
            {"log_date":"May 1st","status":"INFO","message":"started"}
        ]}"#;
        assert!(serde_json::from_str::<LogPage>(json).is_err());
    }

    #[test]
    fn default_params() {
        let params = LogQuery::default().to_params();
        assert_eq!(params[3], ("sort_by", "log_date".to_string()));
        assert_eq!(params[4], ("sort_direction", "desc".to_string()));
    }
}
