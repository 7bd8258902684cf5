//! Learner standing: mastery rank, training time, and internalization
//! analytics, all derived from the badge count.

use serde::Serialize;

use crate::accreditation::cpd_points;
use crate::curriculum::{MODULES_PER_TRACK, TOTAL_MODULES};

/// Minutes of guided training credited per badge.
pub const MINUTES_PER_BADGE: u32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Analytics {
    pub framework_proficiency: u32,
    pub precision_rating: u32,
    pub case_synthesis_velocity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub badge_count: usize,
    /// Starts at 1 and rises by one per completed track's worth of badges.
    pub rank_level: u32,
    pub training_minutes: u32,
    pub cpd_points: f64,
    pub analytics: Analytics,
}

impl Standing {
    pub fn from_badges(badge_count: usize) -> Self {
        let badges = badge_count as u32;
        Self {
            badge_count,
            rank_level: badges / MODULES_PER_TRACK + 1,
            training_minutes: badges * MINUTES_PER_BADGE,
            cpd_points: cpd_points(badge_count),
            analytics: Analytics {
                framework_proficiency: ((badge_count as f64 / TOTAL_MODULES as f64) * 100.0)
                    .round() as u32,
                precision_rating: if badges > 0 { 98 } else { 0 },
                case_synthesis_velocity: match badges {
                    0 => 0,
                    1..=4 => 45,
                    _ => 92,
                },
            },
        }
    }
}
