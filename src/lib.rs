//! # greenmatch
//!
//! Semantic job matching for green-economy skills.
//!
//! A job seeker describes their skills in a few free-text phrases, in any of
//! the supported Indian languages or English. greenmatch embeds the phrases,
//! averages them into one query vector, ranks stored job postings by cosine
//! similarity and returns the best five. When nothing matches well, it
//! suggests courses to close the gap.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! greenmatch --port 8000 --backend dump --data-dir ./data
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use greenmatch::prelude::*;
//! use std::sync::Arc;
//!
//! let ctx = Arc::new(MatchContext::new(Arc::new(HashEmbedder::new(128))));
//! let store = Arc::new(MemoryStore::new(128));
//!
//! let ingestor = Ingestor::new(ctx.clone(), store.clone(), store.clone());
//! ingestor.add_job("Eco Engineer", "renewable energy python", LanguageTag::En)?;
//! ingestor.add_job("Chef", "cooking", LanguageTag::En)?;
//!
//! let engine = MatchEngine::new(ctx, store.clone(), MatchConfig::default())?;
//! let outcome = engine.match_query(&SkillQuery::new(["python"], LanguageTag::En))?;
//! let response = enrich(&outcome, store.as_ref(), &SuggestionCatalog::default())?;
//! assert_eq!(response.matches.len(), 2);
//! # Ok::<(), greenmatch::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - [`greenmatch-core`](greenmatch_core) - Vectors, codec, stores, collaborators, matching engine
//! - [`greenmatch-storage`](greenmatch_storage) - LMDB store, compressed dumps, storage manager
//! - [`greenmatch-api`](greenmatch_api) - REST API

// Re-export core types
pub use greenmatch_core::{
    codec, enrich, match_jobs, CachedTranslator, EmbeddingProvider, Error, HashEmbedder,
    IdentityTranslator, Ingestor, JobId, JobRecord, JobStore, LanguageTag, MatchConfig,
    MatchContext, MatchEngine, MatchEvent, MatchOutcome, MatchResponse, MatchResult,
    MemoryStore, NarrativeService, Notifier, ReembedReport, Result, ScoredJob, SkillId,
    SkillQuery, SkillRecord, SkillStore, SourceLanguage, StaticEmbedder, Suggestion,
    SuggestionCatalog, TemplateGenerator, TextGenerator, TracingNotifier, Translator, Vector,
};

// Re-export storage
pub use greenmatch_storage::{DumpFile, LmdbStore, StorageBackend, StorageConfig, StorageManager};

// Re-export API
pub use greenmatch_api::{AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        enrich, EmbeddingProvider, Error, HashEmbedder, Ingestor, JobId, JobRecord, JobStore,
        LanguageTag, MatchConfig, MatchContext, MatchEngine, MemoryStore, Result, SkillQuery,
        SkillStore, StorageBackend, StorageConfig, StorageManager, SuggestionCatalog, Vector,
    };
}
