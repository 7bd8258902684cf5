//! Prompt Composition
//!
//! Loads the proctor's instruction templates and fills in the per-turn
//! context (learner, profession, module) before each generation request.

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::badge::MasteryCode;
use crate::generation::GenerationContext;

/// The instruction templates used by the proctor.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    /// Persona and rules for every turn (`system_prompt.md`).
    pub system: String,
    /// Instruction sent in place of user text when a module starts
    /// (`module_launch.md`).
    pub module_launch: String,
}

impl PromptTemplates {
    /// Builds the templates from a map keyed by file stem.
    ///
    /// The map must contain `"system_prompt"` and `"module_launch"`.
    pub fn from_map(prompts: &HashMap<String, String>) -> Result<Self> {
        let system = prompts
            .get("system_prompt")
            .context("Missing prompt template: 'system_prompt'")?
            .clone();
        let module_launch = prompts
            .get("module_launch")
            .context("Missing prompt template: 'module_launch'")?
            .clone();
        Ok(Self {
            system,
            module_launch,
        })
    }

    /// The system instruction with a context block for this turn.
    pub fn system_prompt(&self, ctx: &GenerationContext) -> String {
        let mut block = format!(
            "**Learner:** {}\n**Profession:** {}\n",
            ctx.learner_name, ctx.profession
        );
        match ctx.active_module {
            Some(module) => {
                block.push_str(&format!(
                    "**Active Module:** {} ({}), Track {} Module {} of 4\n**Category:** {}\n**Mastery Code:** {}\n",
                    module.id,
                    module.title,
                    module.track,
                    module.position_in_track(),
                    module.category,
                    MasteryCode::for_module(ctx.profession, module),
                ));
            }
            None => block.push_str("**Active Module:** none\n"),
        }
        format!(
            "{}\n\n# Current Context for This Turn\n\n{}",
            self.system.trim_end(),
            block
        )
    }

    /// The launch instruction for the active module, or `None` outside a module.
    pub fn launch_instruction(&self, ctx: &GenerationContext) -> Option<String> {
        let module = ctx.active_module?;
        Some(render(
            &self.module_launch,
            &[
                ("learner", ctx.learner_name.as_str()),
                ("profession", ctx.profession.as_str()),
                ("module_id", &module.id.to_string()),
                ("track", &module.track.to_string()),
                ("title", module.title),
                ("description", module.description),
                ("category", module.category),
            ],
        ))
    }
}

/// Replaces each `{name}` placeholder with its value.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}
