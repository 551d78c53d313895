//! AsyncSearchHandle - クライアントに返す不透明な ID
//!
//! ハンドル文字列は `<node_id>.<ULID>` 形式で、coordinating node と
//! タスク ID の両方を決定的にエンコードします。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::ids::{NodeId, SearchId};

const SEPARATOR: char = '.';

/// Opaque identifier of an async search: search id + coordinating node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AsyncSearchHandle {
    node_id: NodeId,
    search_id: SearchId,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    #[error("malformed async search id [{id}]: {reason}")]
    MalformedHandle { id: String, reason: String },
}

impl HandleError {
    fn malformed(id: &str, reason: impl Into<String>) -> Self {
        HandleError::MalformedHandle {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

impl AsyncSearchHandle {
    pub fn new(node_id: NodeId, search_id: SearchId) -> Self {
        Self { node_id, search_id }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn search_id(&self) -> SearchId {
        self.search_id
    }

    /// Client-visible string form.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn decode(id: &str) -> Result<Self, HandleError> {
        let Some((node, ulid)) = id.rsplit_once(SEPARATOR) else {
            return Err(HandleError::malformed(id, "missing node separator"));
        };
        let node_id = NodeId::new(node).map_err(|e| HandleError::malformed(id, e.to_string()))?;
        let ulid = Ulid::from_string(ulid)
            .map_err(|e| HandleError::malformed(id, format!("bad search id: {e}")))?;
        Ok(Self::new(node_id, SearchId::from_ulid(ulid)))
    }
}

impl fmt::Display for AsyncSearchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.node_id, SEPARATOR, self.search_id)
    }
}

impl FromStr for AsyncSearchHandle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for AsyncSearchHandle {
    type Error = HandleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::decode(&s)
    }
}

impl From<AsyncSearchHandle> for String {
    fn from(handle: AsyncSearchHandle) -> Self {
        handle.encode()
    }
}
