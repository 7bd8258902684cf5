//! CPD accreditation: points, the accrediting body per profession, and
//! certificate drafts.

use chrono::{DateTime, Datelike, Utc};
use rand::{Rng, distr::Alphanumeric};
use serde::Serialize;
use uuid::Uuid;

use crate::curriculum::TOTAL_MODULES;
use crate::learner::{LearnerProfile, Profession};

/// CPD units awarded per badge.
pub const CPD_PER_BADGE: f64 = 1.5;

pub fn cpd_points(badge_count: usize) -> f64 {
    badge_count as f64 * CPD_PER_BADGE
}

/// The professional body that receives the learner's CPD submission.
pub fn accrediting_body(profession: Profession) -> &'static str {
    match profession {
        Profession::Lawyer => "General Legal Council (GLC) / GSL",
        Profession::Banker => "Chartered Institute of Bankers (CIB) Ghana",
        Profession::Accountant => "ICAG (Institute of Chartered Accountants Ghana)",
        Profession::Journalist => "Ghana Journalists Association (GJA)",
        Profession::Executive | Profession::Other => "Ghana Professional Standards Board",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccreditationSummary {
    pub profession: Profession,
    pub accrediting_body: &'static str,
    pub badge_count: usize,
    pub total_modules: usize,
    pub cpd_points: f64,
}

impl AccreditationSummary {
    pub fn for_learner(learner: &LearnerProfile) -> Self {
        let badge_count = learner.badge_count();
        Self {
            profession: learner.profession,
            accrediting_body: accrediting_body(learner.profession),
            badge_count,
            total_modules: TOTAL_MODULES,
            cpd_points: cpd_points(badge_count),
        }
    }
}

/// A drafted certificate, ready to hand to a mail client.
#[derive(Debug, Clone, Serialize)]
pub struct Certificate {
    pub learner_id: Uuid,
    pub verification_hash: String,
    pub accrediting_body: &'static str,
    pub subject: String,
    pub body: String,
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    pub fn draft(learner: &LearnerProfile, issued_at: DateTime<Utc>) -> Self {
        Self::draft_with_rng(learner, issued_at, &mut rand::rng())
    }

    pub fn draft_with_rng<R: Rng + ?Sized>(
        learner: &LearnerProfile,
        issued_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        let hash = verification_hash(rng, issued_at.year());
        let points = cpd_points(learner.badge_count());
        let subject = format!(
            "Certification Submission: {} AI Mastery - {}",
            learner.profession, hash
        );
        let body = format!(
            "CERTIFICATE OF MASTERY\n\n\
             User ID: {}\n\
             Profession: {}\n\
             Modules Completed: {}/{}\n\
             Points Earned: {:.1} CPD Units\n\
             Verification Hash: {}\n\n\
             This certifies completion of the R-I-S-E Mastery Protocol in accordance with local professional standards.",
            learner.id,
            learner.profession,
            learner.badge_count(),
            TOTAL_MODULES,
            points,
            hash,
        );
        Self {
            learner_id: learner.id,
            verification_hash: hash,
            accrediting_body: accrediting_body(learner.profession),
            subject,
            body,
            issued_at,
        }
    }
}

/// `XXXXXXXX-XXXX-YYYY`: two uppercase alphanumeric groups and the year.
fn verification_hash<R: Rng + ?Sized>(rng: &mut R, year: i32) -> String {
    format!("{}-{}-{year}", alnum_group(rng, 8), alnum_group(rng, 4))
}

fn alnum_group<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::find_module;
    use crate::learner::{ModuleResult, Role};
    use chrono::TimeZone;
    use regex::Regex;

    fn learner_with_badges(profession: Profession, badges: u32) -> LearnerProfile {
        let mut learner = LearnerProfile::new(
            "Adjoa".to_string(),
            "adjoa@example.gh".to_string(),
            profession,
            Role::Standard,
        );
        for id in 1..=badges {
            learner.record_result(ModuleResult::mastered(
                find_module(id).unwrap(),
                profession,
                &[],
            ));
        }
        learner
    }

    #[test]
    fn test_cpd_points() {
        assert_eq!(cpd_points(0), 0.0);
        assert_eq!(cpd_points(3), 4.5);
        assert_eq!(cpd_points(16), 24.0);
    }

    #[test]
    fn test_accrediting_body_falls_back_for_other_professions() {
        assert_eq!(
            accrediting_body(Profession::Banker),
            "Chartered Institute of Bankers (CIB) Ghana"
        );
        assert_eq!(
            accrediting_body(Profession::Executive),
            "Ghana Professional Standards Board"
        );
        assert_eq!(
            accrediting_body(Profession::Other),
            accrediting_body(Profession::Executive)
        );
    }

    #[test]
    fn test_summary_counts_badges() {
        let summary = AccreditationSummary::for_learner(&learner_with_badges(Profession::Lawyer, 5));
        assert_eq!(summary.badge_count, 5);
        assert_eq!(summary.cpd_points, 7.5);
        assert_eq!(summary.total_modules, 16);
        assert_eq!(summary.accrediting_body, "General Legal Council (GLC) / GSL");
    }

    #[test]
    fn test_certificate_draft() {
        let learner = learner_with_badges(Profession::Journalist, 3);
        let issued = Utc.with_ymd_and_hms(2026, 3, 6, 9, 0, 0).unwrap();
        let cert = Certificate::draft(&learner, issued);

        let pattern = Regex::new(r"^[A-Z0-9]{8}-[A-Z0-9]{4}-2026$").unwrap();
        assert!(pattern.is_match(&cert.verification_hash), "{}", cert.verification_hash);
        assert!(cert.subject.starts_with("Certification Submission: Journalist AI Mastery - "));
        assert!(cert.body.starts_with("CERTIFICATE OF MASTERY\n\n"));
        assert!(cert.body.contains("Modules Completed: 3/16"));
        assert!(cert.body.contains("Points Earned: 4.5 CPD Units"));
        assert!(cert.body.contains(&format!("User ID: {}", learner.id)));
        assert!(cert.body.contains(&cert.verification_hash));
    }
}
