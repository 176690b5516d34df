use async_trait::async_trait;

use courseplan_core::{
    Activity, Course, PlanHeader, PlanId, PlanState, PlanSummary, Result, User, UserId,
};

use crate::options::PlanListOptions;

/// Identity lookup consumed by the constraint engine.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>>;
}

/// Read-only batched queries over the course catalog.
///
/// Each method costs one round trip regardless of how many codes it is given.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    /// Number of catalog courses whose code is in `codes`.
    async fn count_existing(&self, codes: &[String]) -> Result<i64>;

    /// `(code, restriction level)` for restricted courses in `codes`,
    /// ordered by restriction ascending.
    async fn restrictions_of(&self, codes: &[String]) -> Result<Vec<(String, i16)>>;

    /// Sum of credits over the courses in `codes`; zero when none match.
    async fn credit_sum_of(&self, codes: &[String]) -> Result<i64>;
}

/// Statement-level plan persistence.
///
/// Each method is atomic on its own; sequencing and compensation live in
/// [`crate::PlanStore`].
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Insert a plan header in `AwaitingReview` and return its id.
    async fn insert_plan(&self, student_id: UserId, plan_name: &str) -> Result<PlanId>;

    /// Insert one association row per course code, all or nothing.
    async fn insert_selected_courses(&self, plan_id: PlanId, codes: &[String]) -> Result<u64>;

    /// Delete a plan; selected courses, reviews and comments go with it.
    async fn delete_plan(&self, plan_id: PlanId) -> Result<u64>;

    async fn rename_plan(&self, plan_id: PlanId, plan_name: &str) -> Result<u64>;

    async fn plan_state(&self, plan_id: PlanId) -> Result<Option<PlanState>>;

    /// Append a review row moving the plan back to `AwaitingReview` and
    /// apply that status to the plan.
    async fn reset_review_status(&self, plan_id: PlanId, user_id: UserId) -> Result<u64>;

    /// Set `AwaitingReview` and bump `last_updated` without a review row.
    async fn touch_plan(&self, plan_id: PlanId) -> Result<u64>;

    async fn clear_selected_courses(&self, plan_id: PlanId) -> Result<u64>;

    async fn fetch_plan(&self, plan_id: PlanId) -> Result<Option<PlanHeader>>;

    /// Selected courses ordered by course code.
    async fn fetch_selected_courses(&self, plan_id: PlanId) -> Result<Vec<Course>>;

    async fn list_plans(&self, options: &PlanListOptions) -> Result<Vec<PlanSummary>>;

    /// Plans owned by a student, most recently updated first.
    async fn list_plans_by_owner(&self, student_id: UserId) -> Result<Vec<PlanHeader>>;

    /// Comments and reviews of a plan, newest first.
    async fn fetch_activity(&self, plan_id: PlanId) -> Result<Vec<Activity>>;
}
