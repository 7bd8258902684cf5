//! In-memory session state and sign-in validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curriculum::CurriculumModule;
use crate::learner::{LearnerProfile, Profession};
use crate::message::ConversationMessage;

/// Input problems reported back to the learner. None of these touch storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Full professional name is required.")]
    MissingName,
    #[error("Valid professional email required.")]
    InvalidEmail,
    #[error("Select your professional track.")]
    MissingProfession,
    #[error("Invalid verification code.")]
    InvalidCode,
    #[error("No sign-in is awaiting verification.")]
    NoPendingSignIn,
}

/// Trims and checks the sign-in credentials.
pub fn validate_credentials(
    name: &str,
    email: &str,
    profession: Option<Profession>,
) -> Result<(String, String, Profession), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let email = email.trim();
    if !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    let profession = profession.ok_or(ValidationError::MissingProfession)?;
    Ok((name.to_string(), email.to_string(), profession))
}

/// Views the presentation layer can show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Dashboard,
    Treasury,
    Accreditation,
    ReviewProtocol,
    MasteryArchive,
    CurrentStatus,
    Admin,
}

/// Where the module conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    ModuleIntro,
    AwaitingRoleChoice,
    AwaitingInputChoice,
    AwaitingStepsChoice,
    AwaitingExpectationChoice,
    MasteryPending,
    Review,
}

/// Progress through the two-step sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SignInStep {
    #[default]
    Credentials,
    AwaitingCode {
        name: String,
        email: String,
        profession: Profession,
    },
}

/// Transient UI-facing state. Never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub active_tab: Tab,
    pub active_module: Option<&'static CurriculumModule>,
    pub review_mode: bool,
    /// RISE step, 0 when no module is live, otherwise 1 through 4.
    pub step: u8,
    pub loading: bool,
    pub error: Option<String>,
    pub mastery_pending: bool,
    pub sign_in: SignInStep,
}

impl SessionState {
    pub fn phase(&self, messages: &[ConversationMessage]) -> Phase {
        if self.review_mode {
            return Phase::Review;
        }
        if self.mastery_pending {
            return Phase::MasteryPending;
        }
        if self.active_module.is_none() {
            return Phase::Idle;
        }
        if messages.is_empty() {
            return Phase::ModuleIntro;
        }
        match self.step {
            2 => Phase::AwaitingInputChoice,
            3 => Phase::AwaitingStepsChoice,
            4 => Phase::AwaitingExpectationChoice,
            _ => Phase::AwaitingRoleChoice,
        }
    }
}

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub state: SessionState,
    pub messages: Vec<ConversationMessage>,
    pub learner: Option<LearnerProfile>,
    pub badge_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::find_module;

    #[test]
    fn test_validate_credentials() {
        assert_eq!(
            validate_credentials("  ", "a@b.c", Some(Profession::Lawyer)),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            validate_credentials("Abena", "abena.gh", Some(Profession::Lawyer)),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_credentials("Abena", "abena@law.gh", None),
            Err(ValidationError::MissingProfession)
        );
        assert_eq!(
            validate_credentials(" Abena ", " abena@law.gh ", Some(Profession::Lawyer)),
            Ok((
                "Abena".to_string(),
                "abena@law.gh".to_string(),
                Profession::Lawyer
            ))
        );
    }

    #[test]
    fn test_phase_follows_state() {
        let mut state = SessionState::default();
        assert_eq!(state.phase(&[]), Phase::Idle);

        state.active_module = find_module(1);
        state.step = 1;
        assert_eq!(state.phase(&[]), Phase::ModuleIntro);

        let messages = vec![ConversationMessage::proctor("Hi", vec![])];
        assert_eq!(state.phase(&messages), Phase::AwaitingRoleChoice);
        state.step = 3;
        assert_eq!(state.phase(&messages), Phase::AwaitingStepsChoice);

        state.mastery_pending = true;
        assert_eq!(state.phase(&messages), Phase::MasteryPending);

        state.review_mode = true;
        assert_eq!(state.phase(&messages), Phase::Review);
    }

    #[test]
    fn test_tab_serialization() {
        assert_eq!(
            serde_json::to_string(&Tab::ReviewProtocol).unwrap(),
            "\"review_protocol\""
        );
        let tab: Tab = serde_json::from_str("\"mastery_archive\"").unwrap();
        assert_eq!(tab, Tab::MasteryArchive);
    }
}
