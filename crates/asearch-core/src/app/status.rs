//! Status - registry の状態別件数

use serde::{Deserialize, Serialize};

use crate::domain::SearchStatus;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCounts {
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl RegistryCounts {
    pub(crate) fn record(&mut self, status: SearchStatus) {
        match status {
            SearchStatus::Running => self.running += 1,
            SearchStatus::Completed => self.completed += 1,
            SearchStatus::Failed => self.failed += 1,
            SearchStatus::Cancelled => self.cancelled += 1,
            // 期限切れは registry から外される途中なので数えない
            SearchStatus::Expired => {}
        }
    }

    pub fn total(&self) -> usize {
        self.running + self.completed + self.failed + self.cancelled
    }
}
