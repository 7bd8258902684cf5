//! Response Parser
//!
//! Turns the proctor's free-text replies into structured signals: the text to
//! display, the options the learner can click, and the keywords that drive the
//! module state machine.
//!
//! Keyword matching is deliberately kept behind the [`SignalDetector`] trait so
//! the controller never inspects raw text itself.

use regex::Regex;
use std::sync::LazyLock;

use crate::badge;
use crate::curriculum::CurriculumModule;
use crate::learner::Profession;

static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*OPTION\s+\d+:\s*(.*)$").expect("option pattern is valid")
});

/// Literal marker the proctor emits when a module is mastered.
pub const MASTERY_MARKER: &str = "MASTERY CONFIRMED";

/// A reply split into display text and selectable choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub display_text: String,
    pub choices: Vec<String>,
}

/// Extracts `OPTION <n>: <text>` lines from a reply.
///
/// Matching lines are removed from the body and their trimmed text is
/// collected, in order, into `choices`. Any number of options is accepted.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let mut choices = Vec::new();
    let mut body = Vec::new();
    for line in raw.split('\n') {
        match OPTION_LINE.captures(line) {
            Some(caps) => choices.push(caps[1].trim().to_string()),
            None => body.push(line),
        }
    }
    ParsedReply {
        display_text: body.join("\n").trim().to_string(),
        choices,
    }
}

/// RISE step the learner is currently working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiseStep {
    Role = 1,
    Input = 2,
    Steps = 3,
    Expectation = 4,
}

impl RiseStep {
    pub fn index(self) -> u8 {
        self as u8
    }
}

/// What a proctor reply means for the module state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySignal {
    MasteryConfirmed,
    AdvanceTo(RiseStep),
}

/// Context a detector may use when interpreting a reply.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub profession: Profession,
    pub module: &'a CurriculumModule,
}

/// Strategy for reading state-machine signals out of a raw reply.
pub trait SignalDetector: Send + Sync {
    /// Returns the single signal carried by `raw`, if any.
    fn detect(&self, raw: &str, ctx: &SignalContext<'_>) -> Option<ReplySignal>;
}

/// Case-insensitive substring matching on the raw reply.
///
/// Rules are evaluated in a fixed order and only the first match fires:
/// mastery (the marker, or the mastery code for the active module), then
/// Input (`INPUT` / `I?`), Steps (`STEPS` / `S?`), Expectation
/// (`EXPECTATION` / `E?`).
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordDetector;

impl KeywordDetector {
    const STEP_RULES: [(RiseStep, [&'static str; 2]); 3] = [
        (RiseStep::Input, ["INPUT", "I?"]),
        (RiseStep::Steps, ["STEPS", "S?"]),
        (RiseStep::Expectation, ["EXPECTATION", "E?"]),
    ];
}

impl SignalDetector for KeywordDetector {
    fn detect(&self, raw: &str, ctx: &SignalContext<'_>) -> Option<ReplySignal> {
        let upper = raw.to_uppercase();
        if upper.contains(MASTERY_MARKER)
            || badge::find_codes(raw)
                .iter()
                .any(|code| code.certifies(ctx.profession, ctx.module))
        {
            return Some(ReplySignal::MasteryConfirmed);
        }
        Self::STEP_RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| upper.contains(n)))
            .map(|(step, _)| ReplySignal::AdvanceTo(*step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::find_module;

    fn detect(raw: &str) -> Option<ReplySignal> {
        let ctx = SignalContext {
            profession: Profession::Banker,
            module: find_module(1).unwrap(),
        };
        KeywordDetector.detect(raw, &ctx)
    }

    #[test]
    fn test_parse_extracts_options() {
        let parsed = parse_reply("Body line\nOPTION 1: Alpha\nOPTION 2: Beta");
        assert_eq!(parsed.display_text, "Body line");
        assert_eq!(parsed.choices, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_parse_without_options_trims_only() {
        let raw = "  \nPick a persona for this brief.\n\nThink about authority.  \n";
        let parsed = parse_reply(raw);
        assert!(parsed.choices.is_empty());
        assert_eq!(parsed.display_text, raw.trim());
    }

    #[test]
    fn test_parse_is_case_insensitive_and_unbounded() {
        let raw = "Choose:\noption 1:  Senior Partner \nOption 2: Junior Associate\nOPTION 3: Clerk\nOPTION 4: Paralegal\nThen continue.";
        let parsed = parse_reply(raw);
        assert_eq!(
            parsed.choices,
            vec!["Senior Partner", "Junior Associate", "Clerk", "Paralegal"]
        );
        assert_eq!(parsed.display_text, "Choose:\nThen continue.");
    }

    #[test]
    fn test_parse_ignores_option_mentions_mid_line() {
        let parsed = parse_reply("Reply with OPTION 1: or type your own.");
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let samples = [
            "Body line\nOPTION 1: Alpha\nOPTION 2: Beta",
            "  OPTION 1: indented\nText",
            "\n\n  leading blank lines\nOPTION 7: x\n",
            "",
            "OPTION 1:",
        ];
        for raw in samples {
            let once = parse_reply(raw).display_text;
            let twice = parse_reply(&once);
            assert_eq!(twice.display_text, once, "input: {raw:?}");
            assert!(twice.choices.is_empty(), "input: {raw:?}");
        }
    }

    #[test]
    fn test_mastery_takes_priority_over_steps() {
        assert_eq!(
            detect("MASTERY CONFIRMED. Your INPUT was flawless."),
            Some(ReplySignal::MasteryConfirmed)
        );
    }

    #[test]
    fn test_step_keywords_in_priority_order() {
        assert_eq!(
            detect("Now define the input data."),
            Some(ReplySignal::AdvanceTo(RiseStep::Input))
        );
        assert_eq!(
            detect("Good. What are the STEPS? Also think about the EXPECTATION."),
            Some(ReplySignal::AdvanceTo(RiseStep::Steps))
        );
        assert_eq!(
            detect("Final letter: E?"),
            Some(ReplySignal::AdvanceTo(RiseStep::Expectation))
        );
        assert_eq!(detect("Well chosen role."), None);
    }

    #[test]
    fn test_mastery_code_for_active_module_counts_as_mastery() {
        assert_eq!(
            detect("Cleared. Code: PASS-BANKER-T1-M1"),
            Some(ReplySignal::MasteryConfirmed)
        );
        // A code for another module falls through to keyword rules.
        assert_eq!(detect("Code: PASS-BANKER-T1-M2"), None);
    }
}
