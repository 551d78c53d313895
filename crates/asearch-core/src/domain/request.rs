//! Request envelopes for the async search actions.
//!
//! `GetAsyncSearchRequest` is the polling request: a handle plus two optional
//! durations. Defaults are applied by the receiver, never encoded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::handle::{AsyncSearchHandle, HandleError};
use super::time_value::TimeValue;
use super::wire::{StreamReader, StreamWriter, WireError};

/// Default of `AsyncSearchConfig::default_wait_for_completion_timeout`,
/// which the receiver applies when `wait_for_completion_timeout` is absent.
pub const DEFAULT_WAIT_FOR_COMPLETION_TIMEOUT: TimeValue = TimeValue::from_secs(1);

/// All violations found by `validate()`, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation Failed: {}", .errors.join("; "))]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}

impl ValidationErrors {
    fn check(errors: Vec<String>) -> Result<(), ValidationErrors> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors })
        }
    }
}

fn require_non_negative(errors: &mut Vec<String>, field: &str, value: Option<TimeValue>) {
    if let Some(tv) = value
        && tv.is_negative()
    {
        errors.push(format!("{field} must be non-negative, got [{tv}]"));
    }
}

/// Decoding error for any request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Handle(#[from] HandleError),
}

/// Fetch an async search by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAsyncSearchRequest {
    handle: AsyncSearchHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wait_for_completion_timeout: Option<TimeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    keep_alive: Option<TimeValue>,
}

impl GetAsyncSearchRequest {
    /// Fails with `MalformedHandle` when `id` cannot be decoded.
    pub fn new(id: &str) -> Result<Self, HandleError> {
        Ok(Self::for_handle(AsyncSearchHandle::decode(id)?))
    }

    pub fn for_handle(handle: AsyncSearchHandle) -> Self {
        Self {
            handle,
            wait_for_completion_timeout: None,
            keep_alive: None,
        }
    }

    pub fn handle(&self) -> &AsyncSearchHandle {
        &self.handle
    }

    /// Raw value as sent by the client; `None` when absent.
    pub fn wait_for_completion_timeout(&self) -> Option<TimeValue> {
        self.wait_for_completion_timeout
    }

    /// Zero means return the current state without blocking.
    pub fn set_wait_for_completion_timeout(&mut self, timeout: TimeValue) {
        self.wait_for_completion_timeout = Some(timeout);
    }

    pub fn with_wait_for_completion_timeout(mut self, timeout: TimeValue) -> Self {
        self.set_wait_for_completion_timeout(timeout);
        self
    }

    pub fn keep_alive(&self) -> Option<TimeValue> {
        self.keep_alive
    }

    pub fn set_keep_alive(&mut self, keep_alive: TimeValue) {
        self.keep_alive = Some(keep_alive);
    }

    pub fn with_keep_alive(mut self, keep_alive: TimeValue) -> Self {
        self.set_keep_alive(keep_alive);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        require_non_negative(&mut errors, "keep_alive", self.keep_alive);
        require_non_negative(
            &mut errors,
            "wait_for_completion_timeout",
            self.wait_for_completion_timeout,
        );
        ValidationErrors::check(errors)
    }

    /// `[handle][keep_alive?][wait_for_completion_timeout?]`
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        let mut w = StreamWriter::new(out);
        w.put_string(&self.handle.encode())?;
        w.put_optional_time_value(self.keep_alive);
        w.put_optional_time_value(self.wait_for_completion_timeout);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn read_from(reader: &mut StreamReader<'_>) -> Result<Self, DecodeError> {
        let handle = AsyncSearchHandle::decode(&reader.take_string()?)?;
        let keep_alive = reader.take_optional_time_value()?;
        let wait_for_completion_timeout = reader.take_optional_time_value()?;
        Ok(Self {
            handle,
            wait_for_completion_timeout,
            keep_alive,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::read_from(&mut StreamReader::new(bytes))
    }
}

/// Start a new async search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitAsyncSearchRequest {
    /// Opaque query handed to the executor.
    pub query: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_completion_timeout: Option<TimeValue>,
    /// Initial retention; the service default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<TimeValue>,
}

impl SubmitAsyncSearchRequest {
    pub fn new(query: serde_json::Value) -> Self {
        Self {
            query,
            wait_for_completion_timeout: None,
            keep_alive: None,
        }
    }

    pub fn with_wait_for_completion_timeout(mut self, timeout: TimeValue) -> Self {
        self.wait_for_completion_timeout = Some(timeout);
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: TimeValue) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();
        require_non_negative(&mut errors, "keep_alive", self.keep_alive);
        require_non_negative(
            &mut errors,
            "wait_for_completion_timeout",
            self.wait_for_completion_timeout,
        );
        if let Some(tv) = self.keep_alive
            && tv.as_nanos() == 0
        {
            errors.push("keep_alive must be greater than zero".to_string());
        }
        ValidationErrors::check(errors)
    }
}

/// Cancel (if running) and remove an async search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAsyncSearchRequest {
    handle: AsyncSearchHandle,
}

impl DeleteAsyncSearchRequest {
    pub fn new(id: &str) -> Result<Self, HandleError> {
        Ok(Self {
            handle: AsyncSearchHandle::decode(id)?,
        })
    }

    pub fn handle(&self) -> &AsyncSearchHandle {
        &self.handle
    }

    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), WireError> {
        StreamWriter::new(out).put_string(&self.handle.encode())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = StreamReader::new(bytes);
        Ok(Self {
            handle: AsyncSearchHandle::decode(&reader.take_string()?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeId, SearchId, TimeUnit};
    use ulid::Ulid;

    fn handle() -> AsyncSearchHandle {
        AsyncSearchHandle::new(NodeId::new("node-1").unwrap(), SearchId::from_ulid(Ulid::new()))
    }

    #[test]
    fn new_rejects_malformed_id() {
        assert!(matches!(
            GetAsyncSearchRequest::new("garbage"),
            Err(HandleError::MalformedHandle { .. })
        ));
    }

    #[test]
    fn defaults_are_applied_by_receiver() {
        let req = GetAsyncSearchRequest::for_handle(handle());
        assert_eq!(req.wait_for_completion_timeout(), None);
        assert_eq!(req.keep_alive(), None);
    }

    #[test]
    fn only_keep_alive_survives_encoding_alone() {
        let req = GetAsyncSearchRequest::for_handle(handle()).with_keep_alive(TimeValue::from_minutes(10));
        let back = GetAsyncSearchRequest::from_bytes(&req.to_bytes().unwrap()).unwrap();
        assert_eq!(back.keep_alive(), Some(TimeValue::from_minutes(10)));
        assert_eq!(back.wait_for_completion_timeout(), None);
        assert_eq!(back, req);
    }

    #[test]
    fn field_order_is_keep_alive_then_wait() {
        let h = handle();
        let req = GetAsyncSearchRequest::for_handle(h.clone())
            .with_keep_alive(TimeValue::from_secs(3))
            .with_wait_for_completion_timeout(TimeValue::from_millis(7));
        let bytes = req.to_bytes().unwrap();

        let header = 4 + h.encode().len();
        let mut expected = Vec::new();
        expected.push(1);
        expected.extend_from_slice(&3i64.to_be_bytes());
        expected.push(TimeUnit::Seconds.tag());
        expected.push(1);
        expected.extend_from_slice(&7i64.to_be_bytes());
        expected.push(TimeUnit::Milliseconds.tag());
        assert_eq!(&bytes[header..], expected.as_slice());
    }

    #[test]
    fn older_writer_without_optional_fields_decodes_as_absent() {
        let h = handle();
        let mut bytes = Vec::new();
        StreamWriter::new(&mut bytes).put_string(&h.encode()).unwrap();

        let req = GetAsyncSearchRequest::from_bytes(&bytes).unwrap();
        assert_eq!(req.handle(), &h);
        assert_eq!(req.keep_alive(), None);
        assert_eq!(req.wait_for_completion_timeout(), None);
    }

    #[test]
    fn newer_writer_trailing_fields_are_ignored() {
        let req = GetAsyncSearchRequest::for_handle(handle())
            .with_wait_for_completion_timeout(TimeValue::ZERO);
        let mut bytes = req.to_bytes().unwrap();
        // 将来追加される optional フィールド
        bytes.extend_from_slice(&[1, 0, 0, 0, 0, 0, 0, 0, 9, 3]);
        assert_eq!(GetAsyncSearchRequest::from_bytes(&bytes).unwrap(), req);
    }

    #[test]
    fn malformed_handle_on_the_wire_is_a_decode_error() {
        let mut bytes = Vec::new();
        StreamWriter::new(&mut bytes).put_string("nope").unwrap();
        assert!(matches!(
            GetAsyncSearchRequest::from_bytes(&bytes),
            Err(DecodeError::Handle(_))
        ));
    }

    #[test]
    fn validate_accepts_zero_and_absent() {
        let req = GetAsyncSearchRequest::for_handle(handle());
        assert!(req.validate().is_ok());
        let req = req
            .with_wait_for_completion_timeout(TimeValue::ZERO)
            .with_keep_alive(TimeValue::ZERO);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validate_reports_every_negative_duration() {
        let req = GetAsyncSearchRequest::for_handle(handle())
            .with_wait_for_completion_timeout(TimeValue::MINUS_ONE)
            .with_keep_alive(TimeValue::from_secs(-5));
        let err = req.validate().unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err.to_string().starts_with("Validation Failed: keep_alive"));
    }

    #[test]
    fn submit_rejects_zero_keep_alive() {
        let req = SubmitAsyncSearchRequest::new(serde_json::json!({}))
            .with_keep_alive(TimeValue::ZERO);
        assert_eq!(req.validate().unwrap_err().errors.len(), 1);
    }

    #[test]
    fn delete_request_round_trips_handle() {
        let h = handle();
        let req = DeleteAsyncSearchRequest::new(&h.encode()).unwrap();
        let mut bytes = Vec::new();
        req.write_to(&mut bytes).unwrap();
        assert_eq!(DeleteAsyncSearchRequest::from_bytes(&bytes).unwrap(), req);
    }
}
