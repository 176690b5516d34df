use std::time::Duration;

use courseplan_core::{PlanStatus, SortField};

/// Filter and ordering for plan listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanListOptions {
    /// `None` lists plans in any status.
    pub status: Option<PlanStatus>,
    pub sort: SortField,
    pub ascending: bool,
}

impl PlanListOptions {
    pub fn with_status(status: PlanStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Pool settings for the Postgres backend.
#[derive(Debug, Clone)]
pub struct PostgresOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}
