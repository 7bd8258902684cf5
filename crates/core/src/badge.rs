//! Mastery codes of the form `PASS-<PROFESSION>-T<track>-M<module>`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::curriculum::{CurriculumModule, MODULES_PER_TRACK};
use crate::learner::Profession;

static CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bPASS-([A-Z]+)-T(\d+)-M(\d+)\b").expect("mastery code pattern is valid")
});

/// A completion token for one module of one professional track.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MasteryCode {
    pub profession: String,
    pub track: u32,
    pub module: u32,
}

impl MasteryCode {
    pub fn for_module(profession: Profession, module: &CurriculumModule) -> Self {
        Self {
            profession: profession.as_str().to_uppercase(),
            track: module.track,
            module: module.position_in_track(),
        }
    }

    /// Catalog id of the module this code refers to, if it is in range.
    pub fn module_id(&self) -> Option<u32> {
        let in_range = (1..=4).contains(&self.track) && (1..=MODULES_PER_TRACK).contains(&self.module);
        in_range.then(|| (self.track - 1) * MODULES_PER_TRACK + self.module)
    }

    /// Whether this code certifies `module` for a learner of `profession`.
    pub fn certifies(&self, profession: Profession, module: &CurriculumModule) -> bool {
        *self == Self::for_module(profession, module)
    }
}

impl fmt::Display for MasteryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PASS-{}-T{}-M{}", self.profession, self.track, self.module)
    }
}

/// Finds every mastery code in a block of text, in order of appearance.
pub fn find_codes(text: &str) -> Vec<MasteryCode> {
    CODE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            Some(MasteryCode {
                profession: caps[1].to_uppercase(),
                track: caps[2].parse().ok()?,
                module: caps[3].parse().ok()?,
            })
        })
        .collect()
}
