//! Matching engine
//!
//! Turns skill phrases into one query vector (mean of the per-phrase
//! embeddings), scores every embedded job by cosine similarity, ranks with a
//! stable sort and keeps the top `k`. The outcome carries only job ids and
//! scores; titles, descriptions and suggestions are added by
//! [`crate::enrich`].

use crate::context::MatchContext;
use crate::language::{LanguageTag, SourceLanguage};
use crate::notify::MatchEvent;
use crate::record::{JobId, JobRecord};
use crate::store::JobStore;
use crate::translate::translate_or_original;
use crate::{Error, Result, Vector};
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f32 = 0.8;
pub const DEFAULT_MAX_PHRASE_CHARS: usize = 255;
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Tunables for ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Number of results kept after ranking
    pub top_k: usize,
    /// A result set is low-confidence when every score is below this
    pub low_confidence_threshold: f32,
    /// Longest accepted phrase, in characters
    pub max_phrase_chars: usize,
    /// Corpus size from which scoring runs on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
            max_phrase_chars: DEFAULT_MAX_PHRASE_CHARS,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }
        if !self.low_confidence_threshold.is_finite() {
            return Err(Error::InvalidConfig(
                "low_confidence_threshold must be a finite number".to_string(),
            ));
        }
        if self.max_phrase_chars == 0 {
            return Err(Error::InvalidConfig(
                "max_phrase_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Skill phrases of one match request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillQuery {
    pub phrases: Vec<String>,
    #[serde(default)]
    pub lang: LanguageTag,
}

impl SkillQuery {
    pub fn new<I, S>(phrases: I, lang: LanguageTag) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
            lang,
        }
    }

    /// Reject empty phrase lists, blank phrases and over-long phrases
    pub fn validate(&self, max_phrase_chars: usize) -> Result<()> {
        if self.phrases.is_empty() {
            return Err(Error::InvalidQuery("at least one skill phrase is required".to_string()));
        }
        for (i, phrase) in self.phrases.iter().enumerate() {
            if phrase.trim().is_empty() {
                return Err(Error::InvalidQuery(format!("phrase {} is blank", i)));
            }
            let chars = phrase.chars().count();
            if chars > max_phrase_chars {
                return Err(Error::InvalidQuery(format!(
                    "phrase {} is {} characters long, limit is {}",
                    i, chars, max_phrase_chars
                )));
            }
        }
        Ok(())
    }
}

/// One ranked job
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredJob {
    pub job_id: JobId,
    pub score: f32,
}

/// Result of ranking a corpus against one query vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// At most `top_k` results, best first
    pub ranked: Vec<ScoredJob>,
    pub low_confidence: bool,
    /// Jobs handed to the ranker, embedded or not
    pub corpus_size: usize,
    /// Jobs that were actually scored
    pub candidates: usize,
}

/// Score one job against the query.
///
/// Jobs without an embedding, or with one of another dimension, are not
/// candidates at all. A zero vector on either side scores 0.0.
#[inline]
pub fn score_job(query: &Vector, job: &JobRecord) -> Option<ScoredJob> {
    let id = job.id?;
    let embedding = job.embedding.as_ref()?;
    if embedding.dim() != query.dim() {
        debug!(job_id = %id, dim = embedding.dim(), "Skipping job with foreign vector dimension");
        return None;
    }

    let score = query.cosine_similarity(embedding);
    Some(ScoredJob {
        job_id: id,
        score: if score.is_nan() { 0.0 } else { score },
    })
}

/// Rank `all_jobs` against an already aggregated query vector.
///
/// Ties keep the order of `all_jobs`. Slicing to `top_k` happens only after
/// the full ranking.
pub fn match_jobs(query: &Vector, all_jobs: &[JobRecord], config: &MatchConfig) -> MatchOutcome {
    let mut scored: Vec<ScoredJob> = if all_jobs.len() >= config.parallel_threshold {
        all_jobs
            .par_iter()
            .filter_map(|job| score_job(query, job))
            .collect()
    } else {
        all_jobs
            .iter()
            .filter_map(|job| score_job(query, job))
            .collect()
    };

    let candidates = scored.len();
    // sort_by_key is stable
    scored.sort_by_key(|s| Reverse(OrderedFloat(s.score)));
    scored.truncate(config.top_k);

    let low_confidence = scored
        .iter()
        .all(|s| s.score < config.low_confidence_threshold);

    MatchOutcome {
        ranked: scored,
        low_confidence,
        corpus_size: all_jobs.len(),
        candidates,
    }
}

/// Query pipeline: validation, translation, embedding, aggregation and
/// ranking against the job store.
///
/// Holds no mutable state, so one engine can serve concurrent requests.
pub struct MatchEngine {
    ctx: Arc<MatchContext>,
    store: Arc<dyn JobStore>,
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(ctx: Arc<MatchContext>, store: Arc<dyn JobStore>, config: MatchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { ctx, store, config })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Embed every phrase and average the vectors element-wise.
    ///
    /// Validation happens before any collaborator call. Embedding errors are
    /// returned as-is.
    pub fn aggregate_query_vector(&self, query: &SkillQuery) -> Result<Vector> {
        query.validate(self.config.max_phrase_chars)?;

        let source = SourceLanguage::Tag(query.lang);
        let mut vectors = Vec::with_capacity(query.phrases.len());
        for phrase in &query.phrases {
            let text = translate_or_original(
                self.ctx.translator(),
                phrase,
                LanguageTag::CANONICAL,
                source,
            );
            vectors.push(self.ctx.embedder().embed(&text)?);
        }

        let aggregate = Vector::mean(&vectors)?;
        let expected = self.store.vector_dim();
        if aggregate.dim() != expected {
            return Err(Error::InvalidConfig(format!(
                "embedder produces {}-d vectors but the job store holds {}-d vectors",
                aggregate.dim(),
                expected
            )));
        }
        Ok(aggregate)
    }

    pub fn match_query(&self, query: &SkillQuery) -> Result<MatchOutcome> {
        let query_vector = self.aggregate_query_vector(query)?;
        let jobs = self.store.list_all()?;
        let outcome = match_jobs(&query_vector, &jobs, &self.config);

        debug!(
            phrases = query.phrases.len(),
            corpus = outcome.corpus_size,
            candidates = outcome.candidates,
            returned = outcome.ranked.len(),
            low_confidence = outcome.low_confidence,
            "Match completed"
        );

        let strong_matches = outcome
            .ranked
            .iter()
            .filter(|s| s.score >= self.config.low_confidence_threshold)
            .count();
        self.ctx.notifier().notify(&MatchEvent {
            phrase_count: query.phrases.len(),
            match_count: outcome.ranked.len(),
            strong_matches,
            low_confidence: outcome.low_confidence,
        });

        Ok(outcome)
    }
}
