//! Conversation/Progress Controller
//!
//! Owns the live conversation, the active module and RISE step, and the
//! learner's badge ledger. It sends each turn to the generation boundary,
//! reads the reply's signals through a [`SignalDetector`], and persists
//! progress through the [`LearnerRepository`].
//!
//! The state lock is never held across a generation call. Every operation that
//! invalidates an in-flight reply bumps `epoch`; a reply that comes back under
//! a different epoch is dropped.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::curriculum::{self, CurriculumModule};
use crate::generation::{GenerationClient, GenerationContext};
use crate::learner::{LearnerProfile, ModuleResult, Profession, Role};
use crate::message::ConversationMessage;
use crate::response::{KeywordDetector, ReplySignal, SignalContext, SignalDetector, parse_reply};
use crate::roster::LearnerRepository;
use crate::session::{
    Phase, SessionSnapshot, SessionState, SignInStep, Tab, ValidationError, validate_credentials,
};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Sign in to continue.")]
    NotSignedIn,
    #[error("Administrator access required.")]
    Forbidden,
    #[error("Module {0} does not exist.")]
    UnknownModule(u32),
    #[error("Module {0} is locked.")]
    Locked(u32),
    #[error("Finish or leave the current module first.")]
    Busy,
    #[error("The proctor is unavailable: {0}")]
    Generation(anyhow::Error),
    #[error("Progress could not be saved: {0}")]
    Storage(anyhow::Error),
}

/// What happened to a launch or send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Preconditions were not met; nothing changed.
    Ignored,
    /// The reply was applied, carrying at most one signal.
    Replied(Option<ReplySignal>),
    /// The learner moved on before the reply arrived; it was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub verification_code: String,
    /// Pause between the mastery signal and persisting the result, so the
    /// celebration can play.
    pub mastery_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            verification_code: "1234".to_string(),
            mastery_delay: Duration::from_secs(4),
        }
    }
}

struct PendingMastery {
    id: u64,
    module: &'static CurriculumModule,
    timer: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct ControllerState {
    learner: Option<LearnerProfile>,
    session: SessionState,
    messages: Vec<ConversationMessage>,
    epoch: u64,
    pending: Option<PendingMastery>,
}

impl ControllerState {
    fn phase(&self) -> Phase {
        self.session.phase(&self.messages)
    }

    /// Drops the live module and its conversation.
    fn clear_module(&mut self) {
        self.session.active_module = None;
        self.session.review_mode = false;
        self.session.step = 0;
        self.session.loading = false;
        self.session.mastery_pending = false;
        self.messages.clear();
        self.epoch += 1;
    }
}

/// State restored when a generation call fails.
struct Rollback {
    active_module: Option<&'static CurriculumModule>,
    review_mode: bool,
    step: u8,
    messages: Vec<ConversationMessage>,
}

impl Rollback {
    fn capture(st: &ControllerState) -> Self {
        Self {
            active_module: st.session.active_module,
            review_mode: st.session.review_mode,
            step: st.session.step,
            messages: st.messages.clone(),
        }
    }

    fn restore(self, st: &mut ControllerState) {
        st.session.active_module = self.active_module;
        st.session.review_mode = self.review_mode;
        st.session.step = self.step;
        st.messages = self.messages;
    }
}

/// The single controller driving one learner's session.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct ProgressController {
    state: Arc<Mutex<ControllerState>>,
    roster: LearnerRepository,
    generator: Arc<dyn GenerationClient>,
    detector: Arc<dyn SignalDetector>,
    settings: Arc<ControllerSettings>,
}

impl ProgressController {
    pub fn new(
        roster: LearnerRepository,
        generator: Arc<dyn GenerationClient>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState::default())),
            roster,
            generator,
            detector: Arc::new(KeywordDetector),
            settings: Arc::new(settings),
        }
    }

    /// Replaces the keyword strategy used to read replies.
    pub fn with_detector(mut self, detector: Arc<dyn SignalDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn roster(&self) -> &LearnerRepository {
        &self.roster
    }

    // --- Session lifecycle ---

    /// Restores the learner who was signed in when the process last stopped.
    pub async fn resume(&self) -> Result<Option<LearnerProfile>, ControllerError> {
        let learner = self
            .roster
            .active_learner()
            .await
            .map_err(ControllerError::Storage)?;
        if let Some(l) = &learner {
            info!(learner_id = %l.id, badges = l.badge_count(), "Resumed active learner");
        }
        self.state.lock().await.learner = learner.clone();
        Ok(learner)
    }

    /// First sign-in step: checks the credentials and waits for a code.
    pub async fn begin_sign_in(
        &self,
        name: &str,
        email: &str,
        profession: Option<Profession>,
    ) -> Result<(), ControllerError> {
        let mut st = self.state.lock().await;
        st.session.error = None;
        let (name, email, profession) = match validate_credentials(name, email, profession) {
            Ok(creds) => creds,
            Err(e) => return Err(report(&mut st, e.into())),
        };
        debug!(%email, %profession, "Credentials accepted; awaiting verification code");
        st.session.sign_in = SignInStep::AwaitingCode {
            name,
            email,
            profession,
        };
        Ok(())
    }

    /// Second sign-in step: checks the code, then signs in or signs up.
    ///
    /// An existing learner is matched by email and adopts the newly entered
    /// name and profession. A new learner whose email mentions "admin" is
    /// enrolled as an administrator.
    pub async fn verify(&self, code: &str) -> Result<LearnerProfile, ControllerError> {
        let mut st = self.state.lock().await;
        st.session.error = None;
        let SignInStep::AwaitingCode {
            name,
            email,
            profession,
        } = st.session.sign_in.clone()
        else {
            return Err(report(&mut st, ValidationError::NoPendingSignIn.into()));
        };
        if code.trim() != self.settings.verification_code {
            return Err(report(&mut st, ValidationError::InvalidCode.into()));
        }
        self.settle_pending(&mut st).await?;

        let existing = self
            .roster
            .find_by_email(&email)
            .await
            .map_err(ControllerError::Storage)?;
        let learner = match existing {
            Some(mut learner) => {
                learner.name = name;
                learner.profession = profession;
                learner.touch();
                info!(learner_id = %learner.id, "Learner signed in");
                learner
            }
            None => {
                let role = if email.to_lowercase().contains("admin") {
                    Role::Administrator
                } else {
                    Role::Standard
                };
                let learner = LearnerProfile::new(name, email, profession, role);
                info!(learner_id = %learner.id, ?role, "Learner signed up");
                learner
            }
        };
        self.roster
            .upsert_learner(&learner)
            .await
            .map_err(ControllerError::Storage)?;
        self.roster
            .set_active_learner(&learner)
            .await
            .map_err(ControllerError::Storage)?;

        st.clear_module();
        st.session = SessionState::default();
        st.learner = Some(learner.clone());
        Ok(learner)
    }

    /// Ends the session and forgets the active learner.
    pub async fn sign_out(&self) -> Result<(), ControllerError> {
        let mut st = self.state.lock().await;
        self.settle_pending(&mut st).await?;
        self.roster
            .clear_active_learner()
            .await
            .map_err(ControllerError::Storage)?;
        if let Some(learner) = st.learner.take() {
            info!(learner_id = %learner.id, "Learner signed out");
        }
        st.clear_module();
        st.session = SessionState::default();
        Ok(())
    }

    // --- Module progression ---

    /// Starts a module and requests the proctor's introduction.
    pub async fn launch(&self, module_id: u32) -> Result<TurnOutcome, ControllerError> {
        let (epoch, context, rollback) = {
            let mut st = self.state.lock().await;
            self.settle_pending(&mut st).await?;
            let Some(learner) = st.learner.as_ref() else {
                return Err(ControllerError::NotSignedIn);
            };
            let module = curriculum::find_module(module_id)
                .ok_or(ControllerError::UnknownModule(module_id))?;
            if curriculum::next_unlocked(&learner.completed_set()).map(|m| m.id) != Some(module_id) {
                return Err(ControllerError::Locked(module_id));
            }
            if !matches!(st.phase(), Phase::Idle | Phase::Review) || st.session.loading {
                return Err(ControllerError::Busy);
            }
            let context = GenerationContext {
                learner_name: learner.name.clone(),
                profession: learner.profession,
                active_module: Some(module),
                is_launch: true,
            };

            let rollback = Rollback::capture(&st);
            st.messages.clear();
            st.epoch += 1;
            st.session.active_tab = Tab::Dashboard;
            st.session.active_module = Some(module);
            st.session.review_mode = false;
            st.session.step = 1;
            st.session.loading = true;
            st.session.error = None;
            info!(module_id, title = module.title, "Launching module");
            (st.epoch, context, rollback)
        };

        let reply = self.generator.generate(&[], "", &context).await;

        let mut st = self.state.lock().await;
        if st.epoch != epoch {
            debug!(module_id, "Discarding introduction for an abandoned module");
            return Ok(TurnOutcome::Stale);
        }
        st.session.loading = false;
        match reply {
            Ok(raw) => {
                let parsed = parse_reply(&raw);
                st.messages.push(
                    ConversationMessage::proctor(parsed.display_text, parsed.choices)
                        .into_module_intro(),
                );
                Ok(TurnOutcome::Replied(None))
            }
            Err(e) => {
                warn!(module_id, error = %e, "Module launch failed");
                rollback.restore(&mut st);
                Err(report(&mut st, ControllerError::Generation(e)))
            }
        }
    }

    /// Sends the learner's text (typed or a clicked option) to the proctor.
    ///
    /// Ignored when the text is blank, a reply is already pending, nobody is
    /// signed in, no live module is active, or mastery is being recorded.
    pub async fn send_message(&self, text: &str) -> Result<TurnOutcome, ControllerError> {
        let (epoch, history, context, module, rollback) = {
            let mut st = self.state.lock().await;
            let Some(module) = st.session.active_module else {
                return Ok(TurnOutcome::Ignored);
            };
            let Some(learner) = st.learner.as_ref() else {
                return Ok(TurnOutcome::Ignored);
            };
            if text.trim().is_empty()
                || st.session.loading
                || st.session.review_mode
                || st.session.mastery_pending
            {
                return Ok(TurnOutcome::Ignored);
            }
            let context = GenerationContext {
                learner_name: learner.name.clone(),
                profession: learner.profession,
                active_module: Some(module),
                is_launch: false,
            };

            let rollback = Rollback::capture(&st);
            let history = st.messages.clone();
            st.messages.iter_mut().for_each(|m| m.choices = None);
            st.messages.push(ConversationMessage::user(text));
            st.session.loading = true;
            st.session.error = None;
            (st.epoch, history, context, module, rollback)
        };

        let reply = self.generator.generate(&history, text, &context).await;

        let mut st = self.state.lock().await;
        if st.epoch != epoch {
            debug!(module_id = module.id, "Discarding reply for an abandoned module");
            return Ok(TurnOutcome::Stale);
        }
        st.session.loading = false;
        let raw = match reply {
            Ok(raw) => raw,
            Err(e) => {
                warn!(module_id = module.id, error = %e, "Proctor request failed");
                rollback.restore(&mut st);
                return Err(report(&mut st, ControllerError::Generation(e)));
            }
        };

        let parsed = parse_reply(&raw);
        st.messages
            .push(ConversationMessage::proctor(parsed.display_text, parsed.choices));

        let signal = self.detector.detect(
            &raw,
            &SignalContext {
                profession: context.profession,
                module,
            },
        );
        match signal {
            Some(ReplySignal::MasteryConfirmed) => self.schedule_mastery(&mut st, module),
            Some(ReplySignal::AdvanceTo(step)) => {
                debug!(module_id = module.id, ?step, "RISE step advanced");
                st.session.step = step.index();
            }
            None => {}
        }
        Ok(TurnOutcome::Replied(signal))
    }

    /// Opens the archived transcript of a completed module.
    ///
    /// Returns `Ok(false)` when nobody is signed in or the module has no
    /// stored result.
    pub async fn review(&self, module_id: u32) -> Result<bool, ControllerError> {
        let mut st = self.state.lock().await;
        self.settle_pending(&mut st).await?;
        let Some(result) = st
            .learner
            .as_ref()
            .and_then(|l| l.result_for(module_id))
            .cloned()
        else {
            return Ok(false);
        };
        let Some(module) = curriculum::find_module(module_id) else {
            return Ok(false);
        };
        if !matches!(st.phase(), Phase::Idle | Phase::Review) {
            return Err(ControllerError::Busy);
        }

        st.clear_module();
        st.session.active_tab = Tab::Dashboard;
        st.session.active_module = Some(module);
        st.session.review_mode = true;
        st.session.error = None;
        st.messages = result
            .transcript
            .into_iter()
            .map(|entry| ConversationMessage {
                speaker: entry.speaker,
                segments: vec![entry.text],
                created_at: result.completed_at,
                choices: None,
                is_module_intro: false,
            })
            .collect();
        debug!(module_id, "Entered review mode");
        Ok(true)
    }

    /// Switches tab. Review mode always ends; the dashboard also abandons a
    /// live module. A pending mastery is recorded first.
    pub async fn navigate(&self, tab: Tab) -> Result<(), ControllerError> {
        let mut st = self.state.lock().await;
        self.settle_pending(&mut st).await?;
        if st.session.review_mode {
            st.clear_module();
        } else if tab == Tab::Dashboard && st.session.active_module.is_some() {
            info!(
                module_id = ?st.session.active_module.map(|m| m.id),
                "Module abandoned without mastery"
            );
            st.clear_module();
        }
        st.session.active_tab = tab;
        Ok(())
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.session.error = None;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let st = self.state.lock().await;
        SessionSnapshot {
            phase: st.phase(),
            state: st.session.clone(),
            messages: st.messages.clone(),
            badge_count: st.learner.as_ref().map_or(0, LearnerProfile::badge_count),
            learner: st.learner.clone(),
        }
    }

    pub async fn current_learner(&self) -> Option<LearnerProfile> {
        self.state.lock().await.learner.clone()
    }

    // --- Mastery recording ---

    /// Waits for a scheduled mastery recording to finish, if one is pending.
    pub async fn wait_for_mastery(&self) {
        let timer = {
            let mut st = self.state.lock().await;
            st.pending.as_mut().and_then(|p| p.timer.take())
        };
        if let Some(timer) = timer {
            if let Err(e) = timer.await {
                warn!(error = %e, "Mastery timer did not complete");
            }
        }
    }

    /// Records any pending mastery immediately. Call before shutting down.
    pub async fn shutdown(&self) -> Result<(), ControllerError> {
        let mut st = self.state.lock().await;
        self.settle_pending(&mut st).await
    }

    fn schedule_mastery(&self, st: &mut ControllerState, module: &'static CurriculumModule) {
        st.session.mastery_pending = true;
        let id = st.epoch;
        let this = self.clone();
        let delay = self.settings.mastery_delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut st = this.state.lock().await;
            let pending = match st.pending.take() {
                Some(p) if p.id == id => p,
                other => {
                    st.pending = other;
                    return;
                }
            };
            if let Err(e) = this.finalize_mastery(&mut st, pending.module).await {
                error!(module_id = pending.module.id, error = %e, "Failed to record mastery");
            }
        });
        info!(
            module_id = module.id,
            delay_ms = delay.as_millis() as u64,
            "Mastery confirmed; recording after delay"
        );
        st.pending = Some(PendingMastery {
            id,
            module,
            timer: Some(timer),
        });
    }

    /// Cancels the mastery timer, if any, and records the result now.
    async fn settle_pending(&self, st: &mut ControllerState) -> Result<(), ControllerError> {
        let Some(pending) = st.pending.take() else {
            return Ok(());
        };
        if let Some(timer) = pending.timer {
            timer.abort();
        }
        debug!(module_id = pending.module.id, "Recording pending mastery early");
        self.finalize_mastery(st, pending.module).await.map(|_| ())
    }

    /// Persists the module result and returns to `Idle`.
    async fn finalize_mastery(
        &self,
        st: &mut ControllerState,
        module: &'static CurriculumModule,
    ) -> Result<Option<LearnerProfile>, ControllerError> {
        st.session.mastery_pending = false;
        let Some((learner_id, profession)) = st.learner.as_ref().map(|l| (l.id, l.profession))
        else {
            st.clear_module();
            return Ok(None);
        };

        let result = ModuleResult::mastered(module, profession, &st.messages);
        let updated = match self.persist_result(learner_id, result).await {
            Ok(updated) => updated,
            Err(e) => return Err(report(st, e)),
        };
        if let Some(profile) = &updated {
            st.learner = Some(profile.clone());
        }
        st.clear_module();
        Ok(updated)
    }

    async fn persist_result(
        &self,
        learner_id: Uuid,
        result: ModuleResult,
    ) -> Result<Option<LearnerProfile>, ControllerError> {
        let module_id = result.module_id;
        let updated = self
            .roster
            .record_module_result(learner_id, result)
            .await
            .map_err(ControllerError::Storage)?;
        match &updated {
            Some(profile) => {
                self.roster
                    .set_active_learner(profile)
                    .await
                    .map_err(ControllerError::Storage)?;
                info!(%learner_id, module_id, badges = profile.badge_count(), "Badge awarded");
            }
            None => warn!(%learner_id, module_id, "Learner no longer on roster; result dropped"),
        }
        Ok(updated)
    }

    // --- Administration ---

    pub async fn list_learners(&self) -> Result<Vec<LearnerProfile>, ControllerError> {
        self.require_admin().await?;
        self.roster
            .list_learners()
            .await
            .map_err(ControllerError::Storage)
    }

    /// Enrolls a learner on behalf of an administrator. Enrolled learners
    /// always get the standard role.
    pub async fn enroll_learner(
        &self,
        name: &str,
        email: &str,
        profession: Profession,
    ) -> Result<LearnerProfile, ControllerError> {
        self.require_admin().await?;
        let (name, email, profession) = validate_credentials(name, email, Some(profession))?;
        let learner = LearnerProfile::new(name, email, profession, Role::Standard);
        self.roster
            .upsert_learner(&learner)
            .await
            .map_err(ControllerError::Storage)?;
        info!(learner_id = %learner.id, "Learner enrolled by administrator");
        Ok(learner)
    }

    pub async fn delete_learner(&self, id: Uuid) -> Result<bool, ControllerError> {
        self.require_admin().await?;
        self.roster
            .delete_learner(id)
            .await
            .map_err(ControllerError::Storage)
    }

    async fn require_admin(&self) -> Result<(), ControllerError> {
        match self.state.lock().await.learner.as_ref() {
            Some(l) if l.is_admin() => Ok(()),
            Some(_) => Err(ControllerError::Forbidden),
            None => Err(ControllerError::NotSignedIn),
        }
    }
}

/// Stores the error's message for the presentation layer and hands it back.
fn report(st: &mut ControllerState, err: ControllerError) -> ControllerError {
    st.session.error = Some(err.to_string());
    err
}
