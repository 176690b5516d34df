use std::sync::Arc;

use courseplan_core::{
    Activity, ActivityKind, Error, Plan, PlanHeader, PlanId, PlanStatus, PlanSummary, Result,
    Review, UserId,
};

use crate::adapter::PlanRepository;
use crate::options::PlanListOptions;

/// Read side of plan persistence.
#[derive(Clone)]
pub struct PlanQueryService {
    repo: Arc<dyn PlanRepository>,
}

impl PlanQueryService {
    pub fn new(repo: Arc<dyn PlanRepository>) -> Self {
        Self { repo }
    }

    /// A plan with its selected courses, ordered by course code.
    pub async fn get(&self, plan_id: PlanId) -> Result<Plan> {
        let header = self
            .repo
            .fetch_plan(plan_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))?;
        let courses = self.repo.fetch_selected_courses(plan_id).await?;
        Ok(Plan { header, courses })
    }

    pub async fn list_by_status(&self, options: &PlanListOptions) -> Result<Vec<PlanSummary>> {
        self.repo.list_plans(options).await
    }

    pub async fn list_by_owner(&self, student_id: UserId) -> Result<Vec<PlanHeader>> {
        self.repo.list_plans_by_owner(student_id).await
    }

    /// Comments and reviews merged, newest first. An unknown plan is
    /// [`Error::NotFound`], not an empty stream.
    pub async fn activity(&self, plan_id: PlanId) -> Result<Vec<Activity>> {
        let activity = self.repo.fetch_activity(plan_id).await?;
        if activity.is_empty() && self.repo.fetch_plan(plan_id).await?.is_none() {
            return Err(Error::NotFound(format!("plan {plan_id}")));
        }
        Ok(activity)
    }

    /// Status history, oldest first, starting with the plan's submission.
    pub async fn history(&self, plan_id: PlanId) -> Result<Vec<Review>> {
        let header = self
            .repo
            .fetch_plan(plan_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("plan {plan_id}")))?;

        let mut history = vec![Review {
            review_id: 0,
            plan_id,
            user_id: header.student_id,
            status: PlanStatus::AwaitingReview,
            time: header.created,
        }];
        let mut reviews: Vec<Review> = self
            .repo
            .fetch_activity(plan_id)
            .await?
            .into_iter()
            .filter_map(|entry| match entry.kind {
                ActivityKind::Review { review_id, status } => Some(Review {
                    review_id,
                    plan_id,
                    user_id: entry.user_id,
                    status,
                    time: entry.time,
                }),
                ActivityKind::Comment { .. } => None,
            })
            .collect();
        reviews.reverse();
        history.extend(reviews);
        Ok(history)
    }
}
