//! Prompt Treasury
//!
//! Ready-made RISE prompts for each profession, searchable by title or
//! category.

use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use serde::Serialize;

use crate::learner::Profession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryPrompt {
    pub id: u32,
    pub profession: Profession,
    pub title: &'static str,
    pub category: &'static str,
    pub prompt: &'static str,
}

const PROMPTS: &[LibraryPrompt] = &[
    LibraryPrompt {
        id: 1,
        profession: Profession::Lawyer,
        title: "Adversarial Review",
        category: "Litigation",
        prompt: "Act as a Senior Litigator. Input: Attached Statement of Claim. Steps: 1. Extract 5 legal weaknesses. 2. Cross-reference Act 25. Expectation: A strategy memo.",
    },
    LibraryPrompt {
        id: 2,
        profession: Profession::Lawyer,
        title: "Contract Redlining",
        category: "Corporate",
        prompt: "Act as a Tier-1 Corporate Lawyer. Input: Commercial Lease. Steps: 1. Find liability gaps. 2. Draft GSL-compliant indemnities. Expectation: Redlined table.",
    },
    LibraryPrompt {
        id: 3,
        profession: Profession::Accountant,
        title: "IFRS Reconciliation",
        category: "Audit",
        prompt: "Act as ICAG Forensic Auditor. Input: General Ledger vs Bank Statement. Steps: 1. Flag variances over 5k. 2. Verify tax codes. Expectation: Reconciliation Report.",
    },
    LibraryPrompt {
        id: 4,
        profession: Profession::Accountant,
        title: "Tax Planning",
        category: "Tax",
        prompt: "Act as GRA Tax Specialist. Input: P&L Statement. Steps: 1. Calculate deductible expenses under Act 896. 2. Identify credits. Expectation: Tax calculation schedule.",
    },
    LibraryPrompt {
        id: 5,
        profession: Profession::Banker,
        title: "Credit Analysis",
        category: "Lending",
        prompt: "Act as Credit Risk Head. Input: SME Financials. Steps: 1. Calculate DSCR. 2. Stress test at 10% rate hike. Expectation: Decision memo.",
    },
    LibraryPrompt {
        id: 6,
        profession: Profession::Journalist,
        title: "Data Sifting",
        category: "Investigative",
        prompt: "Act as Investigative Data Journalist. Input: 200-page Auditor General Report. Steps: 1. Find \"Ghost Name\" patterns. 2. Flag procurement breaches. Expectation: Lead sheet.",
    },
    LibraryPrompt {
        id: 7,
        profession: Profession::Executive,
        title: "SWOT Synthesis",
        category: "Strategy",
        prompt: "Act as Chief Strategy Officer. Input: Annual Competitor Reports. Steps: 1. SWOT synthesis. 2. Resource pivot suggestions. Expectation: 1-page executive brief.",
    },
];

/// All prompts for a profession, in library order.
pub fn prompts_for(profession: Profession) -> Vec<&'static LibraryPrompt> {
    PROMPTS.iter().filter(|p| p.profession == profession).collect()
}

/// Searches a profession's prompts.
///
/// A blank query returns everything in library order. Otherwise prompts whose
/// title or category fuzzily matches the query are returned best match first.
pub fn search(profession: Profession, query: &str) -> Vec<&'static LibraryPrompt> {
    let query = query.trim();
    if query.is_empty() {
        return prompts_for(profession);
    }
    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, &'static LibraryPrompt)> = prompts_for(profession)
        .into_iter()
        .filter_map(|p| {
            let title = matcher.fuzzy_match(p.title, query);
            let category = matcher.fuzzy_match(p.category, query);
            title.max(category).map(|score| (score, p))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
    scored.into_iter().map(|(_, p)| p).collect()
}
