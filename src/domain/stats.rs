//! Count aggregations reported by the per-entity statistics endpoint.

use serde::{Deserialize, Serialize};

/// Counts over the full history of one entity type, computed at call time.
///
/// `this_month`, `this_week` and `today` use calendar boundaries (UTC, ISO
/// week starting Monday) relative to the moment of invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleStatistics {
    pub total: i64,
    pub active: i64,
    pub trashed: i64,
    pub this_month: i64,
    pub this_week: i64,
    pub today: i64,
}
