use crate::records::{StudyGoal, StudyPlan};
use crate::stats::{plan_progress, PlanProgress};
use crate::sync::{Collection, LoadOutcome};
use crate::{CoreError, RecordStore, Scope};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

pub struct Planner {
    pub plans: Collection<StudyPlan>,
    pub goals: Collection<StudyGoal>,
}

impl Planner {
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope) -> Self {
        Self {
            plans: Collection::new(store.clone(), scope.clone()),
            goals: Collection::new(store, scope),
        }
    }

    pub async fn load(&self) -> (LoadOutcome, LoadOutcome) {
        (self.plans.load().await, self.goals.load().await)
    }

    pub async fn add_plan(&self, plan: StudyPlan) -> Result<StudyPlan, CoreError> {
        if plan.title.trim().is_empty() {
            return Err(CoreError::Invalid("plan title is empty"));
        }
        if plan.duration_minutes == 0 {
            return Err(CoreError::Invalid("plan duration must be positive"));
        }
        self.plans.create(plan).await
    }

    /// Writes the flipped value, so toggling twice restores the original.
    pub async fn toggle_plan_completion(&self, id: Uuid) -> Result<StudyPlan, CoreError> {
        self.plans.toggle(id, "completed").await
    }

    pub fn plans_on(&self, date: NaiveDate) -> Vec<StudyPlan> {
        let mut v: Vec<StudyPlan> = self.plans.records().into_iter().filter(|p| p.date == date).collect();
        v.sort_by(|a, b| b.priority.cmp(&a.priority));
        v
    }

    pub fn progress(&self) -> PlanProgress {
        plan_progress(&self.plans.records())
    }

    pub async fn add_goal(&self, goal: StudyGoal) -> Result<StudyGoal, CoreError> {
        if goal.title.trim().is_empty() {
            return Err(CoreError::Invalid("goal title is empty"));
        }
        self.goals.create(goal).await
    }

    /// Clamped to 0..=100; reaching 100 marks the goal achieved.
    pub async fn update_goal_progress(&self, id: Uuid, progress: i64) -> Result<StudyGoal, CoreError> {
        let mut goal = self.goals.get(id).ok_or(CoreError::NotFound("goal"))?;
        goal.progress = progress.clamp(0, 100) as u8;
        goal.achieved = goal.progress == 100;
        self.goals.update(goal).await
    }
}
