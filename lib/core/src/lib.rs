//! # greenmatch Core
//!
//! Core library for the greenmatch job-matching engine.
//!
//! This crate provides the data model and the matching pipeline:
//!
//! - [`Vector`] - Dense embedding vector with cosine similarity
//! - [`codec`] - Bit-exact little-endian byte encoding of vectors
//! - [`JobStore`] / [`MemoryStore`] - Job and skill storage
//! - [`MatchContext`] - Embedding, translation, generation and notification collaborators
//! - [`MatchEngine`] - Query aggregation, cosine ranking, top-K and the low-confidence flag
//! - [`Ingestor`] - Adding jobs and skills, bulk re-embedding
//! - [`enrich()`] - Turning ranked ids into a client-facing response
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use greenmatch_core::{
//!     HashEmbedder, Ingestor, LanguageTag, MatchConfig, MatchContext, MatchEngine,
//!     MemoryStore, SkillQuery,
//! };
//!
//! let ctx = Arc::new(MatchContext::new(Arc::new(HashEmbedder::new(64))));
//! let store = Arc::new(MemoryStore::new(64));
//!
//! let ingestor = Ingestor::new(ctx.clone(), store.clone(), store.clone());
//! ingestor
//!     .add_job("Eco Engineer", "renewable energy python", LanguageTag::En)
//!     .unwrap();
//!
//! let engine = MatchEngine::new(ctx, store, MatchConfig::default()).unwrap();
//! let outcome = engine
//!     .match_query(&SkillQuery::new(["python", "solar"], LanguageTag::En))
//!     .unwrap();
//! assert_eq!(outcome.ranked.len(), 1);
//! ```

pub mod codec;
pub mod context;
pub mod embedder;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod language;
pub mod narrative;
pub mod notify;
pub mod record;
pub mod store;
pub mod translate;
pub mod vector;

pub use context::MatchContext;
pub use embedder::{EmbeddingProvider, HashEmbedder, StaticEmbedder, DEFAULT_EMBEDDING_DIM};
pub use engine::{
    match_jobs, MatchConfig, MatchEngine, MatchOutcome, ScoredJob, SkillQuery,
};
pub use enrich::{enrich, MatchResponse, MatchResult, Suggestion, SuggestionCatalog};
pub use error::{CodecError, Error, Result};
pub use generate::{TemplateGenerator, TextGenerator};
pub use ingest::{Ingestor, ReembedReport};
pub use language::{LanguageTag, SourceLanguage};
pub use narrative::NarrativeService;
pub use notify::{MatchEvent, NoopNotifier, Notifier, TracingNotifier};
pub use record::{JobId, JobRecord, SkillId, SkillRecord};
pub use store::{JobStore, MemoryStore, SkillStore, StoreSnapshot};
pub use translate::{CachedTranslator, IdentityTranslator, Translator};
pub use vector::Vector;
