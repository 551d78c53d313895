//! State - 非同期検索タスクの状態
//!
//! # 状態遷移
//! - Running -> Completed | Failed | Cancelled （エンジンからのコールバック）
//! - 任意の状態 -> Expired （retention 期限切れ、その後 registry から削除）

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchStatus {
    /// The search is still executing.
    Running,

    /// Finished with a result.
    Completed,

    /// The search itself errored.
    Failed,

    /// Cancelled explicitly.
    Cancelled,

    /// Retention deadline passed; the entry is being reaped.
    Expired,
}

impl SearchStatus {
    /// Terminal in the protocol sense: no further transition besides expiry.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SearchStatus::Completed | SearchStatus::Failed | SearchStatus::Cancelled
        )
    }

    /// Waiters are released on any terminal status and also on expiry,
    /// which the service then reports as not found.
    pub fn is_settled(self) -> bool {
        self.is_terminal() || self == SearchStatus::Expired
    }
}

/// Structured description of why a search failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFailure {
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: String,
}

impl SearchFailure {
    pub fn new(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SearchStatus::Running, false, false)]
    #[case(SearchStatus::Completed, true, true)]
    #[case(SearchStatus::Failed, true, true)]
    #[case(SearchStatus::Cancelled, true, true)]
    #[case(SearchStatus::Expired, false, true)]
    fn classification(#[case] status: SearchStatus, #[case] terminal: bool, #[case] settled: bool) {
        assert_eq!(status.is_terminal(), terminal);
        assert_eq!(status.is_settled(), settled);
    }

    #[test]
    fn status_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&SearchStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
    }

    #[test]
    fn failure_uses_type_key() {
        let v = serde_json::to_value(SearchFailure::new("parse_exception", "bad query")).unwrap();
        assert_eq!(v["type"], "parse_exception");
        assert_eq!(v["reason"], "bad query");
    }
}
