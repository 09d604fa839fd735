//! Response enrichment
//!
//! Maps the engine's `(job_id, score)` pairs to presentable results and
//! attaches fallback suggestions. Kept apart from the engine so the response
//! shape can change without touching scoring; `version` tells clients which
//! shape they got.

use crate::engine::MatchOutcome;
use crate::record::JobId;
use crate::store::JobStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shape version of [`MatchResponse`]
pub const RESPONSE_VERSION: u32 = 1;

/// An upskilling pointer offered when matches are weak or missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub skill: String,
    pub link: String,
}

impl Suggestion {
    pub fn new(skill: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            skill: skill.into(),
            link: link.into(),
        }
    }
}

/// Canned suggestion lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionCatalog {
    /// Offered when there are no jobs at all
    pub empty_corpus: Vec<Suggestion>,
    /// Offered when every match is below the confidence threshold
    pub low_confidence: Vec<Suggestion>,
}

impl Default for SuggestionCatalog {
    fn default() -> Self {
        let renewable = Suggestion::new(
            "Renewable Energy Basics",
            "https://www.coursera.org/specializations/renewable-energy",
        );
        let waste = Suggestion::new(
            "Waste Management",
            "https://www.linkedin.com/learning/sustainable-waste-management",
        );
        Self {
            empty_corpus: vec![
                Suggestion::new("Python", "https://www.coursera.org/learn/python"),
                renewable.clone(),
                waste.clone(),
            ],
            low_confidence: vec![
                Suggestion::new("API design", "https://www.coursera.org/learn/api-design-apigee-gcp"),
                renewable,
                waste,
            ],
        }
    }
}

impl SuggestionCatalog {
    /// Suggestions for an outcome, if any apply
    pub fn for_outcome(&self, outcome: &MatchOutcome) -> Vec<Suggestion> {
        if outcome.corpus_size == 0 {
            self.empty_corpus.clone()
        } else if outcome.low_confidence {
            self.low_confidence.clone()
        } else {
            Vec::new()
        }
    }
}

/// A ranked job with its text copied in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub job_id: JobId,
    pub title: String,
    pub description: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub version: u32,
    pub matches: Vec<MatchResult>,
    pub suggestions: Vec<Suggestion>,
    pub low_confidence: bool,
}

/// Build the client-facing response for an outcome.
///
/// A job deleted after scoring is dropped from the list.
pub fn enrich(
    outcome: &MatchOutcome,
    store: &dyn JobStore,
    catalog: &SuggestionCatalog,
) -> Result<MatchResponse> {
    let mut matches = Vec::with_capacity(outcome.ranked.len());
    for scored in &outcome.ranked {
        match store.get(scored.job_id) {
            Ok(job) => matches.push(MatchResult {
                job_id: scored.job_id,
                title: job.title,
                description: job.description,
                score: scored.score,
            }),
            Err(Error::JobNotFound(id)) => {
                debug!(job_id = id, "Job vanished between scoring and enrichment");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(MatchResponse {
        version: RESPONSE_VERSION,
        matches,
        suggestions: catalog.for_outcome(outcome),
        low_confidence: outcome.low_confidence,
    })
}
