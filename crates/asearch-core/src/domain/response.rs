//! AsyncSearchResponse - get/submit の応答
//!
//! 常に snapshot から一度だけ作られ、以後変更されません。

use serde::{Deserialize, Serialize};

use super::snapshot::SearchSnapshot;
use super::state::{SearchFailure, SearchStatus};

/// Wire-level answer to a submit or get call.
///
/// - `COMPLETED`: `response` is set, `error` is absent.
/// - `FAILED`: `error` is set, `response` is absent.
/// - otherwise both are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncSearchResponse {
    pub id: String,
    pub status: SearchStatus,
    pub is_running: bool,
    pub start_time_in_millis: i64,
    pub expiration_time_in_millis: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SearchFailure>,
}

impl From<SearchSnapshot> for AsyncSearchResponse {
    fn from(snapshot: SearchSnapshot) -> Self {
        let (response, error) = match snapshot.status {
            SearchStatus::Completed => (snapshot.result, None),
            SearchStatus::Failed => (None, snapshot.failure),
            _ => (None, None),
        };
        Self {
            id: snapshot.handle.encode(),
            status: snapshot.status,
            is_running: snapshot.status == SearchStatus::Running,
            start_time_in_millis: snapshot.started_at.timestamp_millis(),
            expiration_time_in_millis: snapshot.expires_at.timestamp_millis(),
            response,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AsyncSearchHandle, NodeId, SearchId};
    use chrono::{TimeZone, Utc};
    use ulid::Ulid;

    fn snapshot(status: SearchStatus) -> SearchSnapshot {
        let handle = AsyncSearchHandle::new(
            NodeId::new("n1").unwrap(),
            SearchId::from_ulid(Ulid::new()),
        );
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut s = SearchSnapshot::running(handle, started, started + chrono::TimeDelta::hours(1));
        s.status = status;
        s
    }

    #[test]
    fn running_carries_only_status_and_deadlines() {
        let s = snapshot(SearchStatus::Running);
        let expected_expiry = s.expires_at.timestamp_millis();
        let r = AsyncSearchResponse::from(s);
        assert!(r.is_running);
        assert_eq!(r.expiration_time_in_millis, expected_expiry);
        assert!(r.response.is_none());
        assert!(r.error.is_none());

        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("response").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failed_carries_error_not_result() {
        let mut s = snapshot(SearchStatus::Failed);
        s.failure = Some(SearchFailure::new("search_exception", "boom"));
        s.result = Some(serde_json::json!({"stale": true}));
        let r = AsyncSearchResponse::from(s);
        assert!(!r.is_running);
        assert_eq!(r.error.unwrap().reason, "boom");
        assert!(r.response.is_none());
    }

    #[test]
    fn completed_carries_result() {
        let mut s = snapshot(SearchStatus::Completed);
        s.result = Some(serde_json::json!({"hits": 3}));
        let r = AsyncSearchResponse::from(s);
        assert_eq!(r.response, Some(serde_json::json!({"hits": 3})));
        assert!(r.error.is_none());
    }
}
