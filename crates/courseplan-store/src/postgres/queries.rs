use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use courseplan_core::{Error, PlanId, PlanStatus, Result, SortField, UserId};

use super::batch;
use crate::options::PlanListOptions;

fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

#[derive(Debug, FromRow)]
pub struct RawUser {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: i16,
}

pub async fn find_user(pool: &PgPool, user_id: UserId) -> Result<Option<RawUser>> {
    sqlx::query_as::<_, RawUser>(
        r#"
        select user_id, first_name, last_name, role
        from app_user
        where user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error)
}

pub async fn count_courses(pool: &PgPool, codes: &[String]) -> Result<i64> {
    let mut builder = batch::in_list(
        "select count(*) from course where course_code in",
        codes,
        "",
    );
    builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(db_error)
}

#[derive(Debug, FromRow)]
pub struct RawRestriction {
    pub course_code: String,
    pub restriction: i16,
}

pub async fn list_restrictions(pool: &PgPool, codes: &[String]) -> Result<Vec<RawRestriction>> {
    let mut builder = batch::in_list(
        "select course_code, restriction from course where course_code in",
        codes,
        " and restriction > 0 order by restriction, course_code",
    );
    builder
        .build_query_as::<RawRestriction>()
        .fetch_all(pool)
        .await
        .map_err(db_error)
}

pub async fn sum_credits(pool: &PgPool, codes: &[String]) -> Result<i64> {
    let mut builder = batch::in_list(
        "select coalesce(sum(credits), 0)::bigint from course where course_code in",
        codes,
        "",
    );
    builder
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(db_error)
}

pub async fn insert_plan(pool: &PgPool, student_id: UserId, plan_name: &str) -> Result<PlanId> {
    sqlx::query_scalar::<_, i64>(
        r#"
        insert into plan (student_id, plan_name, status)
        values ($1, $2, $3)
        returning plan_id
        "#,
    )
    .bind(student_id)
    .bind(plan_name)
    .bind(PlanStatus::AwaitingReview.code())
    .fetch_one(pool)
    .await
    .map_err(db_error)
}

pub async fn insert_selected_courses(
    pool: &PgPool,
    plan_id: PlanId,
    codes: &[String],
) -> Result<u64> {
    let mut builder = batch::selected_course_rows(plan_id, codes);
    let done = builder.build().execute(pool).await.map_err(db_error)?;
    Ok(done.rows_affected())
}

pub async fn delete_plan(pool: &PgPool, plan_id: PlanId) -> Result<u64> {
    let done = sqlx::query("delete from plan where plan_id = $1")
        .bind(plan_id)
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(done.rows_affected())
}

pub async fn rename_plan(pool: &PgPool, plan_id: PlanId, plan_name: &str) -> Result<u64> {
    let done = sqlx::query(
        "update plan set plan_name = $1, last_updated = now() where plan_id = $2",
    )
    .bind(plan_name)
    .bind(plan_id)
    .execute(pool)
    .await
    .map_err(db_error)?;
    Ok(done.rows_affected())
}

#[derive(Debug, FromRow)]
pub struct RawPlanState {
    pub student_id: i64,
    pub status: i16,
}

pub async fn plan_state(pool: &PgPool, plan_id: PlanId) -> Result<Option<RawPlanState>> {
    sqlx::query_as::<_, RawPlanState>("select student_id, status from plan where plan_id = $1")
        .bind(plan_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

/// Review row and status change commit together.
pub async fn reset_review_status(
    pool: &PgPool,
    plan_id: PlanId,
    user_id: UserId,
) -> Result<u64> {
    let status = PlanStatus::AwaitingReview.code();
    let mut tx = pool.begin().await.map_err(db_error)?;

    let review = sqlx::query(
        "insert into plan_review (plan_id, user_id, status) values ($1, $2, $3)",
    )
    .bind(plan_id)
    .bind(user_id)
    .bind(status)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;
    let plan = sqlx::query(
        "update plan set status = $1, last_updated = now() where plan_id = $2",
    )
    .bind(status)
    .bind(plan_id)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    Ok(review.rows_affected() + plan.rows_affected())
}

pub async fn touch_plan(pool: &PgPool, plan_id: PlanId) -> Result<u64> {
    let done = sqlx::query(
        "update plan set status = $1, last_updated = now() where plan_id = $2",
    )
    .bind(PlanStatus::AwaitingReview.code())
    .bind(plan_id)
    .execute(pool)
    .await
    .map_err(db_error)?;
    Ok(done.rows_affected())
}

pub async fn clear_selected_courses(pool: &PgPool, plan_id: PlanId) -> Result<u64> {
    let done = sqlx::query("delete from selected_course where plan_id = $1")
        .bind(plan_id)
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(done.rows_affected())
}

#[derive(Debug, FromRow)]
pub struct RawPlan {
    pub plan_id: i64,
    pub student_id: i64,
    pub plan_name: String,
    pub status: i16,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

pub async fn fetch_plan(pool: &PgPool, plan_id: PlanId) -> Result<Option<RawPlan>> {
    sqlx::query_as::<_, RawPlan>(
        r#"
        select plan_id, student_id, plan_name, status, created, last_updated
        from plan
        where plan_id = $1
        "#,
    )
    .bind(plan_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error)
}

#[derive(Debug, FromRow)]
pub struct RawCourse {
    pub course_id: i64,
    pub course_code: String,
    pub title: String,
    pub credits: i32,
    pub restriction: i16,
}

pub async fn fetch_selected_courses(pool: &PgPool, plan_id: PlanId) -> Result<Vec<RawCourse>> {
    sqlx::query_as::<_, RawCourse>(
        r#"
        select c.course_id, c.course_code, c.title, c.credits, c.restriction
        from selected_course s
        join course c on c.course_id = s.course_id
        where s.plan_id = $1
        order by c.course_code
        "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

#[derive(Debug, FromRow)]
pub struct RawPlanSummary {
    #[sqlx(flatten)]
    pub plan: RawPlan,
    pub first_name: String,
    pub last_name: String,
}

pub async fn list_plans(pool: &PgPool, options: &PlanListOptions) -> Result<Vec<RawPlanSummary>> {
    let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
        "select p.plan_id, p.student_id, p.plan_name, p.status, p.created, p.last_updated, \
         u.first_name, u.last_name \
         from plan p join app_user u on u.user_id = p.student_id",
    );
    if let Some(status) = options.status {
        builder.push(" where p.status = ").push_bind(status.code());
    }
    let column = match options.sort {
        SortField::Created => "p.created",
        SortField::LastUpdated => "p.last_updated",
    };
    let direction = if options.ascending { "asc" } else { "desc" };
    builder.push(format!(
        " order by {column} {direction}, p.plan_id {direction}"
    ));

    builder
        .build_query_as::<RawPlanSummary>()
        .fetch_all(pool)
        .await
        .map_err(db_error)
}

pub async fn list_plans_by_owner(pool: &PgPool, student_id: UserId) -> Result<Vec<RawPlan>> {
    sqlx::query_as::<_, RawPlan>(
        r#"
        select plan_id, student_id, plan_name, status, created, last_updated
        from plan
        where student_id = $1
        order by last_updated desc, plan_id desc
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

/// Comment and review rows normalized to one envelope.
///
/// Comments carry `status = -1` and `review_id = 0`; reviews carry an empty
/// `text` and `comment_id = 0`.
#[derive(Debug, FromRow)]
pub struct RawActivity {
    pub review_id: i64,
    pub comment_id: i64,
    pub plan_id: i64,
    pub user_id: i64,
    pub text: String,
    pub status: i16,
    pub time: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
}

pub async fn fetch_activity(pool: &PgPool, plan_id: PlanId) -> Result<Vec<RawActivity>> {
    sqlx::query_as::<_, RawActivity>(
        r#"
        select 0::bigint as review_id, c.comment_id, c.plan_id, c.user_id, c.text,
               (-1)::smallint as status, c.time, u.first_name, u.last_name
        from comment c
        join app_user u on u.user_id = c.user_id
        where c.plan_id = $1
        union all
        select r.review_id, 0::bigint as comment_id, r.plan_id, r.user_id, '' as text,
               r.status, r.time, u.first_name, u.last_name
        from plan_review r
        join app_user u on u.user_id = r.user_id
        where r.plan_id = $1
        order by time desc, review_id desc, comment_id desc
        "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn execute_script(pool: &PgPool, script: &str) -> Result<usize> {
    let mut executed = 0;
    for statement in script.split(';') {
        let sql = statement.trim();
        if sql.is_empty() {
            continue;
        }
        sqlx::query(sql).execute(pool).await.map_err(db_error)?;
        executed += 1;
    }
    Ok(executed)
}
