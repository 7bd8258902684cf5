use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Proctor,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Proctor => write!(f, "proctor"),
        }
    }
}

/// One turn of the live conversation with the proctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub speaker: Speaker,
    pub segments: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Options the learner may pick. Cleared once the learner replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub is_module_intro: bool,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            segments: vec![text.into()],
            created_at: Utc::now(),
            choices: None,
            is_module_intro: false,
        }
    }

    /// A proctor reply. An empty choice list is stored as `None`.
    pub fn proctor(text: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            speaker: Speaker::Proctor,
            segments: vec![text.into()],
            created_at: Utc::now(),
            choices: (!choices.is_empty()).then_some(choices),
            is_module_intro: false,
        }
    }

    pub fn into_module_intro(mut self) -> Self {
        self.is_module_intro = true;
        self
    }

    /// Full text of the message.
    pub fn text(&self) -> String {
        self.segments.join("\n")
    }
}
