use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use courseplan_core::{
    Activity, Course, Error, PlanHeader, PlanId, PlanState, PlanSummary, Result, User, UserId,
};

use crate::adapter::{CourseCatalog, IdentityDirectory, PlanRepository};
use crate::options::{PlanListOptions, PostgresOptions};

mod batch;
mod mapper;
mod queries;

/// DDL for the user, catalog, plan, review and comment tables.
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Postgres implementation of every storage trait.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Create a backend using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `url`.
    pub async fn connect(url: &str, opts: &PostgresOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect(url)
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create any missing tables and indexes. Returns the statement count.
    pub async fn install_schema(&self) -> Result<usize> {
        let executed = queries::execute_script(&self.pool, SCHEMA_SQL).await?;
        tracing::info!(event = "schema_installed", statements = executed);
        Ok(executed)
    }
}

#[async_trait]
impl IdentityDirectory for PostgresBackend {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        queries::find_user(&self.pool, user_id)
            .await?
            .map(mapper::map_user)
            .transpose()
    }
}

#[async_trait]
impl CourseCatalog for PostgresBackend {
    async fn count_existing(&self, codes: &[String]) -> Result<i64> {
        if codes.is_empty() {
            return Ok(0);
        }
        queries::count_courses(&self.pool, codes).await
    }

    async fn restrictions_of(&self, codes: &[String]) -> Result<Vec<(String, i16)>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(queries::list_restrictions(&self.pool, codes)
            .await?
            .into_iter()
            .map(|row| (row.course_code, row.restriction))
            .collect())
    }

    async fn credit_sum_of(&self, codes: &[String]) -> Result<i64> {
        if codes.is_empty() {
            return Ok(0);
        }
        queries::sum_credits(&self.pool, codes).await
    }
}

#[async_trait]
impl PlanRepository for PostgresBackend {
    async fn insert_plan(&self, student_id: UserId, plan_name: &str) -> Result<PlanId> {
        queries::insert_plan(&self.pool, student_id, plan_name).await
    }

    async fn insert_selected_courses(&self, plan_id: PlanId, codes: &[String]) -> Result<u64> {
        if codes.is_empty() {
            return Ok(0);
        }
        queries::insert_selected_courses(&self.pool, plan_id, codes).await
    }

    async fn delete_plan(&self, plan_id: PlanId) -> Result<u64> {
        queries::delete_plan(&self.pool, plan_id).await
    }

    async fn rename_plan(&self, plan_id: PlanId, plan_name: &str) -> Result<u64> {
        queries::rename_plan(&self.pool, plan_id, plan_name).await
    }

    async fn plan_state(&self, plan_id: PlanId) -> Result<Option<PlanState>> {
        queries::plan_state(&self.pool, plan_id)
            .await?
            .map(mapper::map_plan_state)
            .transpose()
    }

    async fn reset_review_status(&self, plan_id: PlanId, user_id: UserId) -> Result<u64> {
        queries::reset_review_status(&self.pool, plan_id, user_id).await
    }

    async fn touch_plan(&self, plan_id: PlanId) -> Result<u64> {
        queries::touch_plan(&self.pool, plan_id).await
    }

    async fn clear_selected_courses(&self, plan_id: PlanId) -> Result<u64> {
        queries::clear_selected_courses(&self.pool, plan_id).await
    }

    async fn fetch_plan(&self, plan_id: PlanId) -> Result<Option<PlanHeader>> {
        queries::fetch_plan(&self.pool, plan_id)
            .await?
            .map(mapper::map_plan)
            .transpose()
    }

    async fn fetch_selected_courses(&self, plan_id: PlanId) -> Result<Vec<Course>> {
        Ok(mapper::map_courses(
            queries::fetch_selected_courses(&self.pool, plan_id).await?,
        ))
    }

    async fn list_plans(&self, options: &PlanListOptions) -> Result<Vec<PlanSummary>> {
        mapper::map_summaries(queries::list_plans(&self.pool, options).await?)
    }

    async fn list_plans_by_owner(&self, student_id: UserId) -> Result<Vec<PlanHeader>> {
        mapper::map_plans(queries::list_plans_by_owner(&self.pool, student_id).await?)
    }

    async fn fetch_activity(&self, plan_id: PlanId) -> Result<Vec<Activity>> {
        mapper::map_activity(queries::fetch_activity(&self.pool, plan_id).await?)
    }
}
