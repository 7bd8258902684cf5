use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

use crate::badge::MasteryCode;
use crate::curriculum::CurriculumModule;
use crate::message::{ConversationMessage, Speaker};

/// The professional tracks a learner can enrol in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    Journalist,
    Banker,
    Lawyer,
    Executive,
    Accountant,
    Other,
}

impl Profession {
    pub const ALL: [Profession; 6] = [
        Profession::Journalist,
        Profession::Banker,
        Profession::Lawyer,
        Profession::Executive,
        Profession::Accountant,
        Profession::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profession::Journalist => "Journalist",
            Profession::Banker => "Banker",
            Profession::Lawyer => "Lawyer",
            Profession::Executive => "Executive",
            Profession::Accountant => "Accountant",
            Profession::Other => "Other",
        }
    }
}

impl fmt::Display for Profession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Standard,
    Administrator,
}

/// One line of an archived module transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// The permanent record of a mastered module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub module_id: u32,
    pub score: u32,
    pub feedback: String,
    pub completed_at: DateTime<Utc>,
    pub transcript: Vec<TranscriptEntry>,
    #[serde(default)]
    pub mastery_code: Option<String>,
}

impl ModuleResult {
    /// Score recorded for every mastered module.
    pub const MASTERY_SCORE: u32 = 100;
    /// Feedback recorded for every mastered module.
    pub const MASTERY_FEEDBACK: &'static str = "MASTERY CONFIRMED";

    /// Builds the result for a module the learner has just mastered.
    pub fn mastered(
        module: &CurriculumModule,
        profession: Profession,
        history: &[ConversationMessage],
    ) -> Self {
        Self {
            module_id: module.id,
            score: Self::MASTERY_SCORE,
            feedback: Self::MASTERY_FEEDBACK.to_string(),
            completed_at: Utc::now(),
            transcript: history
                .iter()
                .map(|msg| TranscriptEntry {
                    speaker: msg.speaker,
                    text: msg.text(),
                })
                .collect(),
            mastery_code: Some(MasteryCode::for_module(profession, module).to_string()),
        }
    }
}

/// A learner's identity and progress.
///
/// `completed_modules` keeps completion order and always holds exactly the
/// keys of `module_results`. The only way to add to either is
/// [`LearnerProfile::record_result`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profession: Profession,
    #[serde(default)]
    pub role: Role,
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    completed_modules: Vec<u32>,
    #[serde(default)]
    module_results: BTreeMap<u32, ModuleResult>,
}

impl LearnerProfile {
    pub fn new(name: String, email: String, profession: Profession, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            profession,
            role,
            last_active: Utc::now(),
            completed_modules: Vec::new(),
            module_results: BTreeMap::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Number of earned badges.
    pub fn badge_count(&self) -> usize {
        self.completed_modules.len()
    }

    /// Completed module ids in the order they were completed.
    pub fn completed_modules(&self) -> &[u32] {
        &self.completed_modules
    }

    pub fn completed_set(&self) -> BTreeSet<u32> {
        self.completed_modules.iter().copied().collect()
    }

    pub fn has_completed(&self, module_id: u32) -> bool {
        self.module_results.contains_key(&module_id)
    }

    pub fn result_for(&self, module_id: u32) -> Option<&ModuleResult> {
        self.module_results.get(&module_id)
    }

    pub fn module_results(&self) -> &BTreeMap<u32, ModuleResult> {
        &self.module_results
    }

    /// Records a module result. Results are write-once: returns `false` and
    /// leaves the profile untouched if the module is already complete.
    pub fn record_result(&mut self, result: ModuleResult) -> bool {
        if self.module_results.contains_key(&result.module_id) {
            return false;
        }
        self.completed_modules.push(result.module_id);
        self.module_results.insert(result.module_id, result);
        true
    }

    /// Repairs a profile loaded from storage so the ledger invariant holds.
    ///
    /// Ids without a stored result are dropped, duplicates removed, and
    /// results missing from the ordered list are appended in id order.
    pub fn normalize(&mut self) {
        let mut seen = BTreeSet::new();
        let results = &self.module_results;
        self.completed_modules
            .retain(|id| results.contains_key(id) && seen.insert(*id));
        for id in self.module_results.keys() {
            if !seen.contains(id) {
                self.completed_modules.push(*id);
            }
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}
