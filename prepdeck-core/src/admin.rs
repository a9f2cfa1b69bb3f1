use crate::records::{AiSettings, ContentItem, ContentStatus, Profile, AI_SETTINGS_ID};
use crate::repo::{self, Query, Record, RecordStore};
use crate::sync::{Collection, LoadOutcome};
use crate::{CoreError, Scope};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Users seen within this window count as active.
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

pub fn require_admin(profile: &Profile) -> Result<(), CoreError> {
    if profile.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("admin access required"))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_users: usize,
    pub active_users: usize,
    pub premium_users: usize,
    pub new_users_today: usize,
}

pub async fn user_stats(store: &dyn RecordStore, now: DateTime<Utc>) -> Result<UserStats, CoreError> {
    let table = Profile::TABLE;
    let active_since = (now - Duration::days(ACTIVE_WINDOW_DAYS)).to_rfc3339();
    let today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc().to_rfc3339())
        .ok_or(CoreError::Invalid("bad date"))?;

    Ok(UserStats {
        total_users: store.count(table, &Query::all()).await?,
        active_users: store.count(table, &Query::all().gte("last_active", active_since)).await?,
        premium_users: store
            .count(table, &Query::all().eq("subscription_status", "premium"))
            .await?,
        new_users_today: store.count(table, &Query::all().gte("created_at", today)).await?,
    })
}

/// Replaces the single settings row; there is never more than one.
pub async fn save_ai_settings(
    store: &dyn RecordStore,
    admin: &Profile,
    mut settings: AiSettings,
) -> Result<AiSettings, CoreError> {
    require_admin(admin)?;
    if settings.provider.trim().is_empty() {
        return Err(CoreError::Invalid("AI provider is empty"));
    }
    settings.id = AI_SETTINGS_ID;
    repo::save(store, &settings)
        .await
        .map_err(|e| CoreError::action("save AI settings", e))
}

pub async fn ai_settings(store: &dyn RecordStore, admin: &Profile) -> Result<Option<AiSettings>, CoreError> {
    require_admin(admin)?;
    match repo::fetch_by_id(store, AI_SETTINGS_ID).await {
        Ok(s) => Ok(Some(s)),
        Err(CoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Pending user submissions, newest first. Approved or rejected items
/// leave the list as soon as the decision is made.
pub struct Moderation {
    pub pending: Collection<ContentItem>,
}

impl Moderation {
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope, admin: &Profile) -> Result<Self, CoreError> {
        require_admin(admin)?;
        let query = Query::all()
            .eq("status", ContentStatus::Pending.as_str())
            .order_by("created_at", false);
        Ok(Self {
            pending: Collection::with_query(store, scope, query),
        })
    }

    pub async fn load(&self) -> LoadOutcome {
        self.pending.load().await
    }

    pub async fn approve(&self, id: Uuid) -> Result<ContentItem, CoreError> {
        self.decide(id, ContentStatus::Active).await
    }

    pub async fn reject(&self, id: Uuid) -> Result<ContentItem, CoreError> {
        self.decide(id, ContentStatus::Rejected).await
    }

    async fn decide(&self, id: Uuid, status: ContentStatus) -> Result<ContentItem, CoreError> {
        let mut item = self.pending.get(id).ok_or(CoreError::NotFound("content"))?;
        item.status = status;
        self.pending.update_and_evict(item).await
    }
}
