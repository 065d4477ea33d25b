//! Retrieval-budget allocation
//!
//! Keyword counts over the question decide how many documents each category
//! retriever is asked for. Shares are rounded down and floored at
//! [`MIN_SHARE`], so the total may differ from [`TOTAL_BUDGET`].

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use wws_core::RetrievalBudget;

pub const TOTAL_BUDGET: usize = 20;
pub const BALANCED_SHARE: usize = 5;
pub const MIN_SHARE: usize = 2;
/// Extra results appended for a question naming a SKU
pub const SKU_SUPPLEMENT_LIMIT: usize = 3;

pub const PRODUCT_KEYWORDS: &[&str] = &[
    "product", "products", "sku", "spec", "specs", "specification", "specifications",
    "price", "pricing", "cost", "model", "catalog", "catalogue", "feature", "features",
    "install", "installation", "warranty", "dimensions", "capacity", "pressure",
    "filter", "filters", "valve", "valves", "faucet", "faucets", "heater", "heaters",
    "sensor", "sensors", "barrel", "barrels", "bottle", "bottles", "pump", "pumps",
    "aquaflow", "purestream", "hydromax", "ecopure", "streamline", "clearwave",
    "aquaguard", "rainsaver", "thermoflow", "purewell",
];

pub const INTERNAL_KEYWORDS: &[&str] = &[
    "hr", "policy", "policies", "employee", "employees", "staff", "internal",
    "procedure", "procedures", "leave", "vacation", "holiday", "benefits", "benefit",
    "onboarding", "handbook", "training", "safety", "compliance", "payroll", "salary",
    "hiring", "overtime", "shift", "shifts", "conduct", "guideline", "guidelines",
    "supplier", "suppliers", "inventory", "warehouse", "logistics", "shipping",
];

pub const REVIEW_KEYWORDS: &[&str] = &[
    "review", "reviews", "reviewed", "customer", "customers", "rating", "ratings",
    "rated", "feedback", "complaint", "complaints", "satisfaction", "satisfied",
    "opinion", "opinions", "stars", "recommend", "recommended", "experience",
    "experiences", "liked", "disliked", "best", "worst",
];

static SKU_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsku-([1-9][0-9]?)\b").expect("SKU pattern is valid")
});

/// Per-category keyword hit counts for one question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeywordScores {
    pub internal: usize,
    pub product: usize,
    pub reviews: usize,
}

impl KeywordScores {
    pub fn total(&self) -> usize {
        self.internal + self.product + self.reviews
    }
}

/// Lower-case the question and split it into word tokens. Hyphenated
/// compounds and SKU codes split into their parts.
fn tokenize(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Count keyword hits per category. Each matching token adds one.
pub fn score_question(question: &str) -> KeywordScores {
    let mut scores = KeywordScores::default();
    for token in tokenize(question) {
        let token = token.as_str();
        if PRODUCT_KEYWORDS.contains(&token) {
            scores.product += 1;
        }
        if INTERNAL_KEYWORDS.contains(&token) {
            scores.internal += 1;
        }
        if REVIEW_KEYWORDS.contains(&token) {
            scores.reviews += 1;
        }
    }
    scores
}

fn share(score: usize, total: usize) -> usize {
    if score == 0 {
        0
    } else {
        (TOTAL_BUDGET * score / total).max(MIN_SHARE)
    }
}

/// Turn keyword scores into a budget
pub fn allocate_scores(scores: KeywordScores) -> RetrievalBudget {
    let total = scores.total();
    if total == 0 {
        return RetrievalBudget::new(BALANCED_SHARE, BALANCED_SHARE, BALANCED_SHARE);
    }

    RetrievalBudget::new(
        share(scores.internal, total),
        share(scores.product, total),
        share(scores.reviews, total),
    )
}

/// Decide how many documents to request from each category for a question
pub fn allocate(question: &str) -> RetrievalBudget {
    allocate_scores(score_question(question))
}

/// First SKU token (`SKU-1` .. `SKU-10`) in the question, normalized to
/// upper case
pub fn detect_sku(question: &str) -> Option<String> {
    SKU_PATTERN
        .captures_iter(question)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
        .find(|n| (1..=10).contains(n))
        .map(|n| format!("SKU-{}", n))
}
