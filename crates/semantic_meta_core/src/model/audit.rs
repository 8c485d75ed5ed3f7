//! Audit metadata attached to every entity row.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Principal recorded when no caller identity is supplied.
pub const SYSTEM_PRINCIPAL: &str = "system";

/// Who created/modified an entity and when (Unix epoch milliseconds).
///
/// Persisted as a JSON text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub creator: String,
    pub create_time_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_time_ms: Option<i64>,
}

impl AuditInfo {
    pub fn created_by(creator: impl Into<String>, at_ms: i64) -> Self {
        Self {
            creator: creator.into(),
            create_time_ms: at_ms,
            last_modifier: None,
            last_modified_time_ms: None,
        }
    }

    /// Records a modification by `modifier` at `at_ms`.
    pub fn touch(&mut self, modifier: impl Into<String>, at_ms: i64) {
        self.last_modifier = Some(modifier.into());
        self.last_modified_time_ms = Some(at_ms);
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(self)
            .map_err(|err| StoreError::corrupt(format!("cannot encode audit_info: {err}")))
    }

    pub fn from_json(raw: &str) -> StoreResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| StoreError::corrupt(format!("invalid audit_info `{raw}`: {err}")))
    }
}
