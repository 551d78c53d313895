//! REST - HTTP パラメータから request envelope への変換
//!
//! `GET /_async_search/{id}?wait_for_completion_timeout=5s&keep_alive=1h`
//! のようなパラメータを受け取り、GetAsyncSearchRequest にします。
//! HTTP サーバー自体はこのクレートには含めません。

use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::{
    AsyncSearchError, DeleteAsyncSearchRequest, ErrorKind, GetAsyncSearchRequest, TimeValue,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetAsyncSearchParams {
    pub id: String,
    #[serde(default)]
    pub wait_for_completion_timeout: Option<String>,
    #[serde(default)]
    pub keep_alive: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAsyncSearchParams {
    pub id: String,
}

fn parse_param(
    name: &'static str,
    raw: Option<&str>,
) -> Result<Option<TimeValue>, AsyncSearchError> {
    raw.map(|s| {
        s.parse::<TimeValue>()
            .map_err(|source| AsyncSearchError::InvalidParameter { name, source })
    })
    .transpose()
}

impl TryFrom<GetAsyncSearchParams> for GetAsyncSearchRequest {
    type Error = AsyncSearchError;

    fn try_from(params: GetAsyncSearchParams) -> Result<Self, Self::Error> {
        let mut request = GetAsyncSearchRequest::new(&params.id)?;
        if let Some(wait) = parse_param(
            "wait_for_completion_timeout",
            params.wait_for_completion_timeout.as_deref(),
        )? {
            request.set_wait_for_completion_timeout(wait);
        }
        if let Some(keep_alive) = parse_param("keep_alive", params.keep_alive.as_deref())? {
            request.set_keep_alive(keep_alive);
        }
        Ok(request)
    }
}

impl TryFrom<DeleteAsyncSearchParams> for DeleteAsyncSearchRequest {
    type Error = AsyncSearchError;

    fn try_from(params: DeleteAsyncSearchParams) -> Result<Self, Self::Error> {
        Ok(DeleteAsyncSearchRequest::new(&params.id)?)
    }
}

/// Error body in the usual `{"error": {...}, "status": N}` shape.
pub fn error_body(err: &AsyncSearchError) -> Value {
    let error_type = match (err, err.kind()) {
        (AsyncSearchError::Validation(_), _) => "action_request_validation_exception",
        (_, ErrorKind::BadRequest) => "illegal_argument_exception",
        (_, ErrorKind::NotFound) => "resource_not_found_exception",
        (_, ErrorKind::Conflict) => "status_exception",
        (_, ErrorKind::Internal) => "exception",
    };
    json!({
        "error": {
            "type": error_type,
            "reason": err.to_string(),
        },
        "status": err.status_code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RegistryError, TimeUnit};
    use rstest::rstest;

    const ID: &str = "node-1.01ARZ3NDEKTSV4RRFFQ69G5FAV";

    fn params(wait: Option<&str>, keep_alive: Option<&str>) -> GetAsyncSearchParams {
        GetAsyncSearchParams {
            id: ID.to_string(),
            wait_for_completion_timeout: wait.map(str::to_string),
            keep_alive: keep_alive.map(str::to_string),
        }
    }

    #[test]
    fn absent_params_stay_absent() {
        let request = GetAsyncSearchRequest::try_from(params(None, None)).unwrap();
        assert_eq!(request.handle().encode(), ID);
        assert!(request.wait_for_completion_timeout().is_none());
        assert!(request.keep_alive().is_none());
    }

    #[test]
    fn durations_are_parsed() {
        let request = GetAsyncSearchRequest::try_from(params(Some("5s"), Some("2h"))).unwrap();
        assert_eq!(
            request.wait_for_completion_timeout(),
            Some(TimeValue::from_secs(5))
        );
        assert_eq!(request.keep_alive(), Some(TimeValue::new(2, TimeUnit::Hours)));
    }

    #[test]
    fn deserializes_from_query_like_json() {
        let p: GetAsyncSearchParams =
            serde_json::from_str(&format!(r#"{{"id": "{ID}", "keep_alive": "1d"}}"#)).unwrap();
        let request = GetAsyncSearchRequest::try_from(p).unwrap();
        assert_eq!(request.keep_alive(), Some(TimeValue::from_days(1)));
    }

    #[rstest]
    #[case::bad_wait(Some("soon"), None, "wait_for_completion_timeout")]
    #[case::bad_keep_alive(None, Some("10 parsecs"), "keep_alive")]
    fn unparsable_duration_is_invalid_parameter(
        #[case] wait: Option<&str>,
        #[case] keep_alive: Option<&str>,
        #[case] expected: &str,
    ) {
        let err = GetAsyncSearchRequest::try_from(params(wait, keep_alive)).unwrap_err();
        assert!(
            matches!(err, AsyncSearchError::InvalidParameter { name, .. } if name == expected)
        );
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn malformed_id_is_rejected() {
        let err = GetAsyncSearchRequest::try_from(GetAsyncSearchParams {
            id: "not-a-handle".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AsyncSearchError::Handle(_)));
    }

    #[test]
    fn delete_params() {
        let request = DeleteAsyncSearchRequest::try_from(DeleteAsyncSearchParams {
            id: ID.to_string(),
        })
        .unwrap();
        assert_eq!(request.handle().encode(), ID);
    }

    #[test]
    fn not_found_error_body() {
        let handle = crate::domain::AsyncSearchHandle::decode(ID).unwrap();
        let body = error_body(&AsyncSearchError::Registry(RegistryError::TaskNotFound(
            handle,
        )));
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"]["type"], "resource_not_found_exception");
        assert!(body["error"]["reason"].as_str().unwrap().contains(ID));
    }
}
