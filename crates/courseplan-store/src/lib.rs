//! Storage collaborators for plan submission.
//!
//! The traits in [`adapter`] are the seams the rules crate talks to. Two
//! backends implement them: Postgres via `sqlx`, and an in-memory backend
//! used by tests and demos.

pub mod adapter;
pub mod memory;
pub mod options;
pub mod postgres;
pub mod query;
pub mod store;

pub use adapter::{CourseCatalog, IdentityDirectory, PlanRepository};
pub use memory::MemoryBackend;
pub use options::{PlanListOptions, PostgresOptions};
pub use postgres::PostgresBackend;
pub use query::PlanQueryService;
pub use store::{PlanStore, PlanUpdate};
