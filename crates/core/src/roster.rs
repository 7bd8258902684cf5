//! Learner Roster
//!
//! Learner-level persistence built on any [`KeyValueStore`]. The roster is a
//! single JSON array stored under [`ROSTER_KEY`]; the signed-in learner is
//! mirrored under [`ACTIVE_LEARNER_KEY`] so a restart can resume the session.
//!
//! Every roster mutation is a read-modify-write of the whole array. Writes are
//! serialized through `write_lock`, which makes this process the single
//! writer; multiple processes sharing one store are not supported.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::learner::{LearnerProfile, ModuleResult};
use crate::store::{ACTIVE_LEARNER_KEY, KeyValueStore, ROSTER_KEY};

#[derive(Clone)]
pub struct LearnerRepository {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl LearnerRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Lists every learner on the roster.
    pub async fn list_learners(&self) -> Result<Vec<LearnerProfile>> {
        let Some(value) = self.store.get(ROSTER_KEY).await? else {
            return Ok(Vec::new());
        };
        let mut learners: Vec<LearnerProfile> =
            serde_json::from_value(value).context("Roster is not a list of learner profiles")?;
        learners.iter_mut().for_each(LearnerProfile::normalize);
        Ok(learners)
    }

    /// Finds a learner by email, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<LearnerProfile>> {
        Ok(self
            .list_learners()
            .await?
            .into_iter()
            .find(|l| l.email.eq_ignore_ascii_case(email)))
    }

    /// Inserts the learner, or replaces the entry with the same id.
    pub async fn upsert_learner(&self, learner: &LearnerProfile) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut learners = self.list_learners().await?;
        match learners.iter_mut().find(|l| l.id == learner.id) {
            Some(existing) => *existing = learner.clone(),
            None => learners.push(learner.clone()),
        }
        self.save_roster(&learners).await?;
        debug!(learner_id = %learner.id, "Learner upserted");
        Ok(())
    }

    /// Removes a learner. Returns `false` if no such learner existed.
    pub async fn delete_learner(&self, id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut learners = self.list_learners().await?;
        let before = learners.len();
        learners.retain(|l| l.id != id);
        if learners.len() == before {
            return Ok(false);
        }
        self.save_roster(&learners).await?;
        info!(learner_id = %id, "Learner deleted");
        Ok(true)
    }

    /// Records a mastered module for a learner and returns the updated profile.
    ///
    /// Returns `Ok(None)` when the learner is not on the roster. A result for
    /// a module the learner already completed is ignored, so repeated calls
    /// never inflate the badge count.
    pub async fn record_module_result(
        &self,
        learner_id: Uuid,
        result: ModuleResult,
    ) -> Result<Option<LearnerProfile>> {
        let _guard = self.write_lock.lock().await;
        let mut learners = self.list_learners().await?;
        let Some(learner) = learners.iter_mut().find(|l| l.id == learner_id) else {
            warn!(%learner_id, "Cannot record module result: learner not found");
            return Ok(None);
        };

        let module_id = result.module_id;
        if learner.record_result(result) {
            info!(%learner_id, module_id, badges = learner.badge_count(), "Module result recorded");
        } else {
            debug!(%learner_id, module_id, "Module already completed; result ignored");
        }
        let updated = learner.clone();
        self.save_roster(&learners).await?;
        Ok(Some(updated))
    }

    /// Loads the profile of the signed-in learner, if any.
    pub async fn active_learner(&self) -> Result<Option<LearnerProfile>> {
        match self.store.get(ACTIVE_LEARNER_KEY).await? {
            Some(value) => {
                let mut learner: LearnerProfile = serde_json::from_value(value)
                    .context("Active session is not a learner profile")?;
                learner.normalize();
                Ok(Some(learner))
            }
            None => Ok(None),
        }
    }

    pub async fn set_active_learner(&self, learner: &LearnerProfile) -> Result<()> {
        self.store
            .set(ACTIVE_LEARNER_KEY, serde_json::to_value(learner)?)
            .await
    }

    pub async fn clear_active_learner(&self) -> Result<()> {
        self.store.remove(ACTIVE_LEARNER_KEY).await
    }

    async fn save_roster(&self, learners: &[LearnerProfile]) -> Result<()> {
        self.store
            .set(ROSTER_KEY, serde_json::to_value(learners)?)
            .await
    }
}
