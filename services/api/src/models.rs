//! API Models
//!
//! Request payloads and response views for the HTTP surface, with `utoipa`
//! schemas for the OpenAPI document. Views are built from the core types so
//! handlers never serialize controller internals directly.

use chrono::{DateTime, Utc};
use rise_core::{
    accreditation::{AccreditationSummary, Certificate},
    curriculum::{Availability, CurriculumModule, ModuleStatus, ProtocolStep},
    learner::{LearnerProfile, ModuleResult, Profession, Role},
    library::LibraryPrompt,
    message::{ConversationMessage, Speaker},
    response::{ReplySignal, RiseStep},
    session::{Phase, SessionSnapshot, SignInStep, Tab},
    standing::Standing,
    TurnOutcome,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// --- Payloads ---

#[derive(Deserialize, ToSchema)]
pub struct SignInPayload {
    #[schema(example = "Kofi Mensah")]
    pub name: String,
    #[schema(example = "kofi@gcb.com.gh")]
    pub email: String,
    #[schema(value_type = Option<String>, example = "Banker")]
    pub profession: Option<Profession>,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyPayload {
    #[schema(example = "1234")]
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct NavigatePayload {
    #[schema(value_type = String, example = "treasury")]
    pub tab: Tab,
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessagePayload {
    #[schema(example = "Credit Risk Officer")]
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct EnrollPayload {
    #[schema(example = "Esi Owusu")]
    pub name: String,
    #[schema(example = "esi@gja.org.gh")]
    pub email: String,
    #[schema(value_type = String, example = "Journalist")]
    pub profession: Profession,
}

#[derive(Deserialize, IntoParams)]
pub struct LibraryQuery {
    /// Search text matched against prompt titles and categories.
    pub q: Option<String>,
}

// --- Views ---

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct ModuleView {
    pub id: u32,
    pub track: u32,
    pub category: String,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
}

impl From<&CurriculumModule> for ModuleView {
    fn from(module: &CurriculumModule) -> Self {
        Self {
            id: module.id,
            track: module.track,
            category: module.category.to_string(),
            title: module.title.to_string(),
            description: module.description.to_string(),
            topics: module.topics.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct ModuleStatusView {
    pub module: ModuleView,
    #[schema(value_type = String, example = "unlocked")]
    pub availability: Availability,
}

impl From<&ModuleStatus> for ModuleStatusView {
    fn from(status: &ModuleStatus) -> Self {
        Self {
            module: status.module.into(),
            availability: status.availability,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CurriculumView {
    pub progress_percent: u32,
    pub next_unlocked: Option<u32>,
    pub modules: Vec<ModuleStatusView>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ProtocolStepView {
    pub step: String,
    pub letter: String,
    pub name: String,
    pub guidance: String,
}

impl From<&ProtocolStep> for ProtocolStepView {
    fn from(step: &ProtocolStep) -> Self {
        Self {
            step: step.step.to_string(),
            letter: step.letter.to_string(),
            name: step.name.to_string(),
            guidance: step.guidance.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct MessageView {
    #[schema(value_type = String, example = "proctor")]
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub choices: Vec<String>,
    pub is_module_intro: bool,
}

impl From<&ConversationMessage> for MessageView {
    fn from(msg: &ConversationMessage) -> Self {
        Self {
            speaker: msg.speaker,
            text: msg.text(),
            created_at: msg.created_at,
            choices: msg.choices.clone().unwrap_or_default(),
            is_module_intro: msg.is_module_intro,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct ModuleResultView {
    pub module_id: u32,
    pub title: Option<String>,
    pub score: u32,
    pub feedback: String,
    pub completed_at: DateTime<Utc>,
    pub mastery_code: Option<String>,
}

impl From<&ModuleResult> for ModuleResultView {
    fn from(result: &ModuleResult) -> Self {
        Self {
            module_id: result.module_id,
            title: rise_core::curriculum::find_module(result.module_id)
                .map(|m| m.title.to_string()),
            score: result.score,
            feedback: result.feedback.clone(),
            completed_at: result.completed_at,
            mastery_code: result.mastery_code.clone(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct LearnerView {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[schema(value_type = String, example = "Banker")]
    pub profession: Profession,
    #[schema(value_type = String, example = "standard")]
    pub role: Role,
    pub last_active: DateTime<Utc>,
    pub badge_count: usize,
    pub cpd_points: f64,
    /// Completed module ids, in completion order.
    pub completed_modules: Vec<u32>,
    pub results: Vec<ModuleResultView>,
}

impl From<&LearnerProfile> for LearnerView {
    fn from(learner: &LearnerProfile) -> Self {
        Self {
            id: learner.id,
            name: learner.name.clone(),
            email: learner.email.clone(),
            profession: learner.profession,
            role: learner.role,
            last_active: learner.last_active,
            badge_count: learner.badge_count(),
            cpd_points: rise_core::accreditation::cpd_points(learner.badge_count()),
            completed_modules: learner.completed_modules().to_vec(),
            results: learner.module_results().values().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SessionView {
    #[schema(value_type = String, example = "awaiting_role_choice")]
    pub phase: Phase,
    #[schema(value_type = String, example = "dashboard")]
    pub active_tab: Tab,
    pub active_module: Option<ModuleView>,
    pub review_mode: bool,
    pub step: u8,
    pub loading: bool,
    pub error: Option<String>,
    pub mastery_pending: bool,
    /// True between a successful sign-in request and code verification.
    pub awaiting_code: bool,
    pub messages: Vec<MessageView>,
    pub learner: Option<LearnerView>,
    pub badge_count: usize,
}

impl From<&SessionSnapshot> for SessionView {
    fn from(snap: &SessionSnapshot) -> Self {
        Self {
            phase: snap.phase,
            active_tab: snap.state.active_tab,
            active_module: snap.state.active_module.map(Into::into),
            review_mode: snap.state.review_mode,
            step: snap.state.step,
            loading: snap.state.loading,
            error: snap.state.error.clone(),
            mastery_pending: snap.state.mastery_pending,
            awaiting_code: matches!(snap.state.sign_in, SignInStep::AwaitingCode { .. }),
            messages: snap.messages.iter().map(Into::into).collect(),
            learner: snap.learner.as_ref().map(Into::into),
            badge_count: snap.badge_count,
        }
    }
}

/// The result of a launch or send request, with the session afterwards.
#[derive(Serialize, ToSchema, Debug)]
pub struct TurnResponse {
    #[schema(example = "replied")]
    pub outcome: String,
    #[schema(example = "advance_to_input")]
    pub signal: Option<String>,
    pub session: SessionView,
}

impl TurnResponse {
    pub fn new(outcome: TurnOutcome, snap: &SessionSnapshot) -> Self {
        let (outcome, signal) = match outcome {
            TurnOutcome::Ignored => ("ignored", None),
            TurnOutcome::Stale => ("stale", None),
            TurnOutcome::Replied(signal) => ("replied", signal.map(signal_name)),
        };
        Self {
            outcome: outcome.to_string(),
            signal: signal.map(str::to_string),
            session: snap.into(),
        }
    }
}

fn signal_name(signal: ReplySignal) -> &'static str {
    match signal {
        ReplySignal::MasteryConfirmed => "mastery_confirmed",
        ReplySignal::AdvanceTo(RiseStep::Role) => "advance_to_role",
        ReplySignal::AdvanceTo(RiseStep::Input) => "advance_to_input",
        ReplySignal::AdvanceTo(RiseStep::Steps) => "advance_to_steps",
        ReplySignal::AdvanceTo(RiseStep::Expectation) => "advance_to_expectation",
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct LibraryPromptView {
    pub id: u32,
    pub title: String,
    pub category: String,
    pub prompt: String,
}

impl From<&LibraryPrompt> for LibraryPromptView {
    fn from(p: &LibraryPrompt) -> Self {
        Self {
            id: p.id,
            title: p.title.to_string(),
            category: p.category.to_string(),
            prompt: p.prompt.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AccreditationView {
    #[schema(value_type = String, example = "Lawyer")]
    pub profession: Profession,
    pub accrediting_body: String,
    pub badge_count: usize,
    pub total_modules: usize,
    pub cpd_points: f64,
}

impl From<AccreditationSummary> for AccreditationView {
    fn from(s: AccreditationSummary) -> Self {
        Self {
            profession: s.profession,
            accrediting_body: s.accrediting_body.to_string(),
            badge_count: s.badge_count,
            total_modules: s.total_modules,
            cpd_points: s.cpd_points,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct CertificateView {
    #[schema(value_type = String, format = Uuid)]
    pub learner_id: Uuid,
    #[schema(example = "K3J9QX2M-7P4A-2026")]
    pub verification_hash: String,
    pub accrediting_body: String,
    pub subject: String,
    pub body: String,
    pub issued_at: DateTime<Utc>,
}

impl From<Certificate> for CertificateView {
    fn from(c: Certificate) -> Self {
        Self {
            learner_id: c.learner_id,
            verification_hash: c.verification_hash,
            accrediting_body: c.accrediting_body.to_string(),
            subject: c.subject,
            body: c.body,
            issued_at: c.issued_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct AnalyticsView {
    pub framework_proficiency: u32,
    pub precision_rating: u32,
    pub case_synthesis_velocity: u32,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct StandingView {
    pub badge_count: usize,
    pub rank_level: u32,
    pub training_minutes: u32,
    pub cpd_points: f64,
    pub analytics: AnalyticsView,
}

impl From<Standing> for StandingView {
    fn from(s: Standing) -> Self {
        Self {
            badge_count: s.badge_count,
            rank_level: s.rank_level,
            training_minutes: s.training_minutes,
            cpd_points: s.cpd_points,
            analytics: AnalyticsView {
                framework_proficiency: s.analytics.framework_proficiency,
                precision_rating: s.analytics.precision_rating,
                case_synthesis_velocity: s.analytics.case_synthesis_velocity,
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
