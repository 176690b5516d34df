//! In-process backend for tests and demos.
//!
//! Mirrors the Postgres backend's statement semantics (cascading deletes,
//! all-or-nothing multi-row inserts, newest-first activity) without a
//! database. Course inserts can be made to fail on demand to exercise the
//! store's compensation path.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use courseplan_core::{
    Activity, ActivityKind, Course, Error, PlanHeader, PlanId, PlanState, PlanStatus,
    PlanSummary, Restriction, Result, Review, Role, SortField, User, UserId,
};

use crate::adapter::{CourseCatalog, IdentityDirectory, PlanRepository};
use crate::options::PlanListOptions;

#[derive(Debug, Clone)]
struct StoredComment {
    comment_id: i64,
    plan_id: PlanId,
    user_id: UserId,
    text: String,
    time: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    courses: BTreeMap<String, Course>,
    plans: BTreeMap<PlanId, PlanHeader>,
    selected: BTreeMap<PlanId, Vec<i64>>,
    reviews: Vec<Review>,
    comments: Vec<StoredComment>,
    next_id: i64,
    last_tick: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Strictly increasing timestamps so orderings by time are total.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let time = match self.last_tick {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_tick = Some(time);
        time
    }

    fn course_by_id(&self, course_id: i64) -> Option<&Course> {
        self.courses
            .values()
            .find(|course| course.course_id == course_id)
    }

    fn user_names(&self, user_id: UserId) -> (String, String) {
        self.users
            .get(&user_id)
            .map(|user| (user.first_name.clone(), user.last_name.clone()))
            .unwrap_or_default()
    }
}

/// Storage traits backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    fail_course_inserts: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following selected-course insert fail until reset.
    pub fn fail_course_inserts(&self, fail: bool) {
        self.fail_course_inserts.store(fail, Ordering::SeqCst);
    }

    pub async fn add_user(&self, first_name: &str, last_name: &str, role: Role) -> User {
        let mut state = self.state.write().await;
        let user = User {
            user_id: state.next_id(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
        };
        state.users.insert(user.user_id, user.clone());
        user
    }

    pub async fn add_course(&self, code: &str, credits: i32, restriction: i16) -> Course {
        let mut state = self.state.write().await;
        let course = Course {
            course_id: state.next_id(),
            course_code: code.to_string(),
            title: String::new(),
            credits,
            restriction: Restriction::from_level(restriction),
        };
        state.courses.insert(course.course_code.clone(), course.clone());
        course
    }

    /// Append a comment; fails when the plan does not exist.
    pub async fn add_comment(&self, plan_id: PlanId, user_id: UserId, text: &str) -> Result<i64> {
        let mut state = self.state.write().await;
        if !state.plans.contains_key(&plan_id) {
            return Err(Error::NotFound(format!("plan {plan_id}")));
        }
        let comment_id = state.next_id();
        let time = state.tick();
        state.comments.push(StoredComment {
            comment_id,
            plan_id,
            user_id,
            text: text.to_string(),
            time,
        });
        Ok(comment_id)
    }

    /// Record an advisor review: append history and move the plan to `status`.
    pub async fn add_review(
        &self,
        plan_id: PlanId,
        user_id: UserId,
        status: PlanStatus,
    ) -> Result<i64> {
        let mut state = self.state.write().await;
        let review_id = state.next_id();
        let time = state.tick();
        let plan = state
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))?;
        plan.status = status;
        plan.last_updated = time;
        state.reviews.push(Review {
            review_id,
            plan_id,
            user_id,
            status,
            time,
        });
        Ok(review_id)
    }

    /// Number of plan headers stored, including any left without courses.
    pub async fn plan_count(&self) -> usize {
        self.state.read().await.plans.len()
    }
}

#[async_trait]
impl IdentityDirectory for MemoryBackend {
    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl CourseCatalog for MemoryBackend {
    async fn count_existing(&self, codes: &[String]) -> Result<i64> {
        let state = self.state.read().await;
        Ok(codes
            .iter()
            .filter(|code| state.courses.contains_key(code.as_str()))
            .count() as i64)
    }

    async fn restrictions_of(&self, codes: &[String]) -> Result<Vec<(String, i16)>> {
        let state = self.state.read().await;
        let mut restricted: Vec<(String, i16)> = codes
            .iter()
            .filter_map(|code| state.courses.get(code.as_str()))
            .filter(|course| course.restriction != Restriction::None)
            .map(|course| (course.course_code.clone(), course.restriction.level()))
            .collect();
        restricted.sort_by(|left, right| left.1.cmp(&right.1).then_with(|| left.0.cmp(&right.0)));
        Ok(restricted)
    }

    async fn credit_sum_of(&self, codes: &[String]) -> Result<i64> {
        let state = self.state.read().await;
        Ok(codes
            .iter()
            .filter_map(|code| state.courses.get(code.as_str()))
            .map(|course| i64::from(course.credits))
            .sum())
    }
}

#[async_trait]
impl PlanRepository for MemoryBackend {
    async fn insert_plan(&self, student_id: UserId, plan_name: &str) -> Result<PlanId> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&student_id) {
            return Err(Error::Db(format!("student {student_id} does not exist")));
        }
        let plan_id = state.next_id();
        let now = state.tick();
        state.plans.insert(
            plan_id,
            PlanHeader {
                plan_id,
                student_id,
                plan_name: plan_name.to_string(),
                status: PlanStatus::AwaitingReview,
                created: now,
                last_updated: now,
            },
        );
        Ok(plan_id)
    }

    async fn insert_selected_courses(&self, plan_id: PlanId, codes: &[String]) -> Result<u64> {
        if self.fail_course_inserts.load(Ordering::SeqCst) {
            return Err(Error::Db("selected course insert rejected".to_string()));
        }
        let mut state = self.state.write().await;
        if !state.plans.contains_key(&plan_id) {
            return Err(Error::Db(format!("plan {plan_id} does not exist")));
        }

        let mut course_ids = state.selected.get(&plan_id).cloned().unwrap_or_default();
        for code in codes {
            let course_id = state
                .courses
                .get(code.as_str())
                .map(|course| course.course_id)
                .ok_or_else(|| Error::Db(format!("course {code} does not exist")))?;
            if course_ids.contains(&course_id) {
                return Err(Error::Db(format!("course {code} already selected")));
            }
            course_ids.push(course_id);
        }

        state.selected.insert(plan_id, course_ids);
        Ok(codes.len() as u64)
    }

    async fn delete_plan(&self, plan_id: PlanId) -> Result<u64> {
        let mut state = self.state.write().await;
        if state.plans.remove(&plan_id).is_none() {
            return Ok(0);
        }
        state.selected.remove(&plan_id);
        state.reviews.retain(|review| review.plan_id != plan_id);
        state.comments.retain(|comment| comment.plan_id != plan_id);
        Ok(1)
    }

    async fn rename_plan(&self, plan_id: PlanId, plan_name: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = state.tick();
        Ok(match state.plans.get_mut(&plan_id) {
            Some(plan) => {
                plan.plan_name = plan_name.to_string();
                plan.last_updated = now;
                1
            }
            None => 0,
        })
    }

    async fn plan_state(&self, plan_id: PlanId) -> Result<Option<PlanState>> {
        Ok(self
            .state
            .read()
            .await
            .plans
            .get(&plan_id)
            .map(|plan| PlanState {
                owner: plan.student_id,
                status: plan.status,
            }))
    }

    async fn reset_review_status(&self, plan_id: PlanId, user_id: UserId) -> Result<u64> {
        let mut state = self.state.write().await;
        let review_id = state.next_id();
        let now = state.tick();
        let plan = state
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| Error::Db(format!("plan {plan_id} does not exist")))?;
        plan.status = PlanStatus::AwaitingReview;
        plan.last_updated = now;
        state.reviews.push(Review {
            review_id,
            plan_id,
            user_id,
            status: PlanStatus::AwaitingReview,
            time: now,
        });
        Ok(2)
    }

    async fn touch_plan(&self, plan_id: PlanId) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = state.tick();
        Ok(match state.plans.get_mut(&plan_id) {
            Some(plan) => {
                plan.status = PlanStatus::AwaitingReview;
                plan.last_updated = now;
                1
            }
            None => 0,
        })
    }

    async fn clear_selected_courses(&self, plan_id: PlanId) -> Result<u64> {
        let mut state = self.state.write().await;
        Ok(state
            .selected
            .remove(&plan_id)
            .map(|course_ids| course_ids.len() as u64)
            .unwrap_or(0))
    }

    async fn fetch_plan(&self, plan_id: PlanId) -> Result<Option<PlanHeader>> {
        Ok(self.state.read().await.plans.get(&plan_id).cloned())
    }

    async fn fetch_selected_courses(&self, plan_id: PlanId) -> Result<Vec<Course>> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .selected
            .get(&plan_id)
            .map(|course_ids| {
                course_ids
                    .iter()
                    .filter_map(|course_id| state.course_by_id(*course_id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        courses.sort_by(|left, right| left.course_code.cmp(&right.course_code));
        Ok(courses)
    }

    async fn list_plans(&self, options: &PlanListOptions) -> Result<Vec<PlanSummary>> {
        let state = self.state.read().await;
        let mut plans: Vec<PlanSummary> = state
            .plans
            .values()
            .filter(|plan| options.status.is_none_or(|status| plan.status == status))
            .filter_map(|plan| {
                let user = state.users.get(&plan.student_id)?;
                Some(PlanSummary {
                    header: plan.clone(),
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                })
            })
            .collect();

        plans.sort_by(|left, right| {
            let (left, right) = (&left.header, &right.header);
            let by_time = match options.sort {
                SortField::Created => left.created.cmp(&right.created),
                SortField::LastUpdated => left.last_updated.cmp(&right.last_updated),
            };
            by_time.then_with(|| left.plan_id.cmp(&right.plan_id))
        });
        if !options.ascending {
            plans.reverse();
        }
        Ok(plans)
    }

    async fn list_plans_by_owner(&self, student_id: UserId) -> Result<Vec<PlanHeader>> {
        let state = self.state.read().await;
        let mut plans: Vec<PlanHeader> = state
            .plans
            .values()
            .filter(|plan| plan.student_id == student_id)
            .cloned()
            .collect();
        plans.sort_by(|left, right| {
            right
                .last_updated
                .cmp(&left.last_updated)
                .then_with(|| right.plan_id.cmp(&left.plan_id))
        });
        Ok(plans)
    }

    async fn fetch_activity(&self, plan_id: PlanId) -> Result<Vec<Activity>> {
        let state = self.state.read().await;
        let comments = state
            .comments
            .iter()
            .filter(|comment| comment.plan_id == plan_id)
            .map(|comment| {
                let (first_name, last_name) = state.user_names(comment.user_id);
                Activity {
                    kind: ActivityKind::Comment {
                        comment_id: comment.comment_id,
                        text: comment.text.clone(),
                    },
                    plan_id,
                    user_id: comment.user_id,
                    first_name,
                    last_name,
                    time: comment.time,
                }
            });
        let reviews = state
            .reviews
            .iter()
            .filter(|review| review.plan_id == plan_id)
            .map(|review| {
                let (first_name, last_name) = state.user_names(review.user_id);
                Activity {
                    kind: ActivityKind::Review {
                        review_id: review.review_id,
                        status: review.status,
                    },
                    plan_id,
                    user_id: review.user_id,
                    first_name,
                    last_name,
                    time: review.time,
                }
            });

        let mut activity: Vec<Activity> = comments.chain(reviews).collect();
        activity.sort_by(|left, right| right.time.cmp(&left.time));
        Ok(activity)
    }
}
