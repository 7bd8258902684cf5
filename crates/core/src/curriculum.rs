//! Curriculum Catalog
//!
//! The sixteen RISE modules, grouped into four tracks of four. The catalog is
//! static: it is consulted for lookups, progress figures and for deciding which
//! module a learner may launch next, but is never mutated at runtime.

use serde::Serialize;
use std::collections::BTreeSet;

/// Number of modules in the full certification path.
pub const TOTAL_MODULES: usize = 16;

/// Number of modules in each track.
pub const MODULES_PER_TRACK: u32 = 4;

/// A single unit of the curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurriculumModule {
    /// Globally unique id, 1 through 16, in curriculum order.
    pub id: u32,
    /// Track number, 1 through 4.
    pub track: u32,
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub topics: &'static [&'static str],
}

impl CurriculumModule {
    /// Position of this module inside its track (1 through 4).
    pub fn position_in_track(&self) -> u32 {
        (self.id - 1) % MODULES_PER_TRACK + 1
    }
}

const CATALOG: [CurriculumModule; TOTAL_MODULES] = [
    CurriculumModule {
        id: 1,
        track: 1,
        category: "Foundations",
        title: "Role Anchoring",
        description: "Assign an authoritative professional persona before asking for any output.",
        topics: &["role", "persona", "authority"],
    },
    CurriculumModule {
        id: 2,
        track: 1,
        category: "Foundations",
        title: "Input Hygiene",
        description: "Supply the right context and scrub personal data before it reaches the model.",
        topics: &["input", "context", "data protection"],
    },
    CurriculumModule {
        id: 3,
        track: 1,
        category: "Foundations",
        title: "Logical Chaining",
        description: "Break a task into atomic, ordered steps the model can follow.",
        topics: &["steps", "decomposition"],
    },
    CurriculumModule {
        id: 4,
        track: 1,
        category: "Foundations",
        title: "Output Precision",
        description: "Define the format, tone and length of the expected deliverable.",
        topics: &["expectation", "format", "tone"],
    },
    CurriculumModule {
        id: 5,
        track: 2,
        category: "Document Intelligence",
        title: "Long-Report Summaries",
        description: "Condense lengthy statutory, financial or investigative reports into briefs.",
        topics: &["summarisation", "briefing"],
    },
    CurriculumModule {
        id: 6,
        track: 2,
        category: "Document Intelligence",
        title: "Structured Extraction",
        description: "Pull figures, parties and dates out of messy documents into tables.",
        topics: &["extraction", "tables"],
    },
    CurriculumModule {
        id: 7,
        track: 2,
        category: "Document Intelligence",
        title: "Comparative Review",
        description: "Contrast two documents and surface material differences.",
        topics: &["comparison", "variance"],
    },
    CurriculumModule {
        id: 8,
        track: 2,
        category: "Document Intelligence",
        title: "Memo Drafting",
        description: "Produce board-ready memos and opinions from raw material.",
        topics: &["drafting", "memo"],
    },
    CurriculumModule {
        id: 9,
        track: 3,
        category: "Regulation & Ethics",
        title: "Data Protection in Practice",
        description: "Apply the Data Protection Act (Act 843) to every prompt you write.",
        topics: &["act 843", "privacy"],
    },
    CurriculumModule {
        id: 10,
        track: 3,
        category: "Regulation & Ethics",
        title: "Human Verification",
        description: "Build verification checkpoints before anything is filed or published.",
        topics: &["verification", "review"],
    },
    CurriculumModule {
        id: 11,
        track: 3,
        category: "Regulation & Ethics",
        title: "Hallucination Defence",
        description: "Detect fabricated citations and unsupported claims in model output.",
        topics: &["hallucination", "fact check"],
    },
    CurriculumModule {
        id: 12,
        track: 3,
        category: "Regulation & Ethics",
        title: "Confidential Workflows",
        description: "Design prompts that respect privilege, secrecy and client confidentiality.",
        topics: &["confidentiality", "privilege"],
    },
    CurriculumModule {
        id: 13,
        track: 4,
        category: "Advanced Workflows",
        title: "Multi-Stage Analysis",
        description: "Chain several RISE prompts into one analytical pipeline.",
        topics: &["pipeline", "analysis"],
    },
    CurriculumModule {
        id: 14,
        track: 4,
        category: "Advanced Workflows",
        title: "Scenario Stress-Testing",
        description: "Use the model to stress-test decisions against adverse scenarios.",
        topics: &["scenarios", "risk"],
    },
    CurriculumModule {
        id: 15,
        track: 4,
        category: "Advanced Workflows",
        title: "Team Prompt Libraries",
        description: "Standardise reusable prompts for a whole department.",
        topics: &["library", "standardisation"],
    },
    CurriculumModule {
        id: 16,
        track: 4,
        category: "Advanced Workflows",
        title: "Capstone Certification",
        description: "Solve a full real-world case end to end with the RISE framework.",
        topics: &["capstone", "certification"],
    },
];

/// Returns every module in curriculum order.
pub fn modules() -> &'static [CurriculumModule] {
    &CATALOG
}

/// Looks up a module by id.
pub fn find_module(id: u32) -> Option<&'static CurriculumModule> {
    CATALOG.iter().find(|m| m.id == id)
}

/// Returns the module a learner may launch next.
///
/// The rule is "highest completed id + 1", or module 1 when nothing has been
/// completed. Gaps are not back-filled: completing {1, 3} unlocks 4, not 2.
/// Returns `None` once the final module is complete.
pub fn next_unlocked(completed: &BTreeSet<u32>) -> Option<&'static CurriculumModule> {
    let next_id = completed.iter().next_back().map_or(1, |max| max + 1);
    find_module(next_id)
}

/// Completion percentage over the whole catalog, rounded down.
pub fn progress_percent(completed: &BTreeSet<u32>) -> u32 {
    let done = completed.iter().filter(|id| find_module(**id).is_some()).count();
    (done * 100 / TOTAL_MODULES) as u32
}

/// How a module should be presented to a given learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Completed,
    Unlocked,
    Locked,
}

/// A module paired with its availability for one learner.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleStatus {
    pub module: &'static CurriculumModule,
    pub availability: Availability,
}

/// Computes the availability of every module for the given completion set.
pub fn module_statuses(completed: &BTreeSet<u32>) -> Vec<ModuleStatus> {
    let unlocked = next_unlocked(completed).map(|m| m.id);
    CATALOG
        .iter()
        .map(|module| {
            let availability = if completed.contains(&module.id) {
                Availability::Completed
            } else if Some(module.id) == unlocked {
                Availability::Unlocked
            } else {
                Availability::Locked
            };
            ModuleStatus {
                module,
                availability,
            }
        })
        .collect()
}

/// One entry of the RISE operating procedure.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolStep {
    pub step: &'static str,
    pub letter: char,
    pub name: &'static str,
    pub guidance: &'static str,
}

/// The RISE operating procedure shown in the protocol review view.
pub const RISE_PROTOCOL: [ProtocolStep; 4] = [
    ProtocolStep {
        step: "01",
        letter: 'R',
        name: "ANCHORING PERSONA",
        guidance: "Never start without an authoritative role. A 'Counsel' response carries legal weight; a generic one carries risk.",
    },
    ProtocolStep {
        step: "02",
        letter: 'I',
        name: "INPUT HYGIENE",
        guidance: "Filter everything through Act 843. Scrub private names and personal data before it is sent.",
    },
    ProtocolStep {
        step: "03",
        letter: 'S',
        name: "LOGICAL CHAINING",
        guidance: "Break the work into atomic actions such as parse, fact-check, synthesise. Each node improves accuracy.",
    },
    ProtocolStep {
        step: "04",
        letter: 'E',
        name: "OUTPUT PRECISION",
        guidance: "Define the shape of the answer. A board briefing wants Markdown; raw data wants a table.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u32]) -> BTreeSet<u32> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_catalog_is_ordered_and_complete() {
        let ids: Vec<u32> = modules().iter().map(|m| m.id).collect();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
        for module in modules() {
            assert_eq!(module.track, (module.id - 1) / MODULES_PER_TRACK + 1);
        }
    }

    #[test]
    fn test_find_module() {
        assert_eq!(find_module(7).map(|m| m.title), Some("Comparative Review"));
        assert!(find_module(0).is_none());
        assert!(find_module(17).is_none());
    }

    #[test]
    fn test_next_unlocked_uses_highest_completed_id() {
        assert_eq!(next_unlocked(&set(&[])).map(|m| m.id), Some(1));
        assert_eq!(next_unlocked(&set(&[1, 2, 3])).map(|m| m.id), Some(4));
        assert_eq!(next_unlocked(&set(&[1, 3])).map(|m| m.id), Some(4));
        assert_eq!(next_unlocked(&set(&[5])).map(|m| m.id), Some(6));
        assert!(next_unlocked(&set(&[16])).is_none());
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(&set(&[])), 0);
        assert_eq!(progress_percent(&set(&[1, 2, 3, 4])), 25);
        assert_eq!(progress_percent(&(1..=16).collect()), 100);
    }

    #[test]
    fn test_module_statuses() {
        let statuses = module_statuses(&set(&[1, 2]));
        assert_eq!(statuses[0].availability, Availability::Completed);
        assert_eq!(statuses[1].availability, Availability::Completed);
        assert_eq!(statuses[2].availability, Availability::Unlocked);
        assert!(
            statuses[3..]
                .iter()
                .all(|s| s.availability == Availability::Locked)
        );
    }

    #[test]
    fn test_position_in_track() {
        assert_eq!(find_module(1).map(|m| m.position_in_track()), Some(1));
        assert_eq!(find_module(8).map(|m| m.position_in_track()), Some(4));
        assert_eq!(find_module(13).map(|m| m.position_in_track()), Some(1));
    }
}
