// Integration tests for greenmatch
use greenmatch::prelude::*;
use greenmatch::{match_jobs, MatchResponse, StaticEmbedder};
use std::sync::Arc;
use tempfile::TempDir;

/// Two-job corpus with mocked 3-d embeddings
fn scenario_engine() -> (MatchEngine, Arc<MemoryStore>) {
    let embedder = StaticEmbedder::new(3)
        .with("Eco Engineer: renewable energy python", vec![1.0, 0.0, 0.0])
        .with("Chef: cooking", vec![0.0, 1.0, 0.0])
        .with("python", vec![1.0, 0.0, 0.0])
        .with("java", vec![0.0, 1.0, 0.0])
        .with("astronomy", vec![0.0, 0.0, 1.0]);
    let ctx = Arc::new(MatchContext::new(Arc::new(embedder)));
    let store = Arc::new(MemoryStore::new(3));

    let ingestor = Ingestor::new(ctx.clone(), store.clone(), store.clone());
    ingestor
        .add_job("Eco Engineer", "renewable energy python", LanguageTag::En)
        .unwrap();
    ingestor.add_job("Chef", "cooking", LanguageTag::En).unwrap();

    let engine = MatchEngine::new(ctx, store.clone(), MatchConfig::default()).unwrap();
    (engine, store)
}

#[test]
fn test_matching_job_ranks_first() {
    let (engine, _) = scenario_engine();
    let outcome = engine
        .match_query(&SkillQuery::new(["python"], LanguageTag::En))
        .unwrap();

    assert_eq!(outcome.ranked[0].job_id, JobId(1));
    assert_eq!(outcome.ranked[0].score, 1.0);
    assert_eq!(outcome.ranked[1].score, 0.0);
    assert!(!outcome.low_confidence);
}

#[test]
fn test_orthogonal_query_is_low_confidence() {
    let (engine, _) = scenario_engine();
    let outcome = engine
        .match_query(&SkillQuery::new(["astronomy"], LanguageTag::En))
        .unwrap();

    assert_eq!(outcome.ranked.len(), 2);
    assert!(outcome.ranked.iter().all(|r| r.score == 0.0));
    assert!(outcome.low_confidence);
}

#[test]
fn test_multi_phrase_query_is_averaged() {
    let (engine, _) = scenario_engine();
    let query = SkillQuery::new(["python", "java"], LanguageTag::En);
    let vector = engine.aggregate_query_vector(&query).unwrap();
    assert_eq!(vector.as_slice(), &[0.5, 0.5, 0.0]);

    // Equidistant from both jobs: tie keeps insertion order
    let outcome = engine.match_query(&query).unwrap();
    assert_eq!(outcome.ranked[0].job_id, JobId(1));
    assert_eq!(outcome.ranked[0].score, outcome.ranked[1].score);
}

#[test]
fn test_job_without_embedding_never_ranked() {
    let jobs = vec![JobRecord::new("Chef", "cooking").with_id(JobId(1))];
    let outcome = match_jobs(&Vector::new(vec![1.0, 0.0, 0.0]), &jobs, &MatchConfig::default());
    assert!(outcome.ranked.is_empty());
    assert!(outcome.low_confidence);
}

#[test]
fn test_empty_corpus() {
    let outcome = match_jobs(&Vector::new(vec![1.0, 0.0]), &[], &MatchConfig::default());
    assert!(outcome.ranked.is_empty());
    assert!(outcome.low_confidence);
}

#[test]
fn test_top_k_cap_and_determinism() {
    let ctx = Arc::new(MatchContext::new(Arc::new(HashEmbedder::new(64))));
    let store = Arc::new(MemoryStore::new(64));
    let ingestor = Ingestor::new(ctx.clone(), store.clone(), store.clone());

    let titles = [
        "Solar Technician",
        "Wind Turbine Engineer",
        "Recycling Coordinator",
        "Data Analyst",
        "Python Developer",
        "Compost Specialist",
        "Energy Auditor",
    ];
    for title in titles {
        ingestor
            .add_job(title, &format!("{} for a green energy company", title), LanguageTag::En)
            .unwrap();
    }
    // Stored without a vector, so invisible to matching
    store.put(JobRecord::new("Unembedded", "no vector")).unwrap();

    let engine = MatchEngine::new(ctx, store.clone(), MatchConfig::default()).unwrap();
    let query = SkillQuery::new(["python", "solar panels"], LanguageTag::En);
    let first = engine.match_query(&query).unwrap();
    let second = engine.match_query(&query).unwrap();

    assert_eq!(first.ranked.len(), 5);
    assert_eq!(first.corpus_size, 8);
    assert_eq!(first.candidates, 7);
    assert_eq!(first, second);
    for pair in first.ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for scored in &first.ranked {
        assert!((-1.0 - 1e-6..=1.0 + 1e-6).contains(&scored.score));
    }
}

#[test]
fn test_enriched_response_shape() {
    let (engine, store) = scenario_engine();
    let outcome = engine
        .match_query(&SkillQuery::new(["python"], LanguageTag::En))
        .unwrap();
    let response = enrich(&outcome, store.as_ref(), &SuggestionCatalog::default()).unwrap();

    assert_eq!(response.matches[0].title, "Eco Engineer");
    assert!(response.suggestions.is_empty());

    let json = serde_json::to_value(&response).unwrap();
    let back: MatchResponse = serde_json::from_value(json).unwrap();
    assert_eq!(back, response);
}

#[test]
fn test_dump_persistence_and_reembed_after_dimension_change() {
    let dir = TempDir::new().unwrap();
    let config = |dim: usize| StorageConfig {
        data_dir: dir.path().to_path_buf(),
        backend: StorageBackend::Dump,
        vector_dim: dim,
        save_interval: None,
        ..StorageConfig::default()
    };

    {
        let storage = StorageManager::new(config(32)).unwrap();
        let ctx = Arc::new(MatchContext::new(Arc::new(HashEmbedder::new(32))));
        let ingestor = Ingestor::new(ctx, storage.job_store(), storage.skill_store());
        ingestor
            .add_job("Eco Engineer", "renewable energy python", LanguageTag::En)
            .unwrap();
        storage.save().unwrap();
    }

    // Same model: vectors come back usable
    {
        let storage = StorageManager::new(config(32)).unwrap();
        assert!(!storage.needs_reembed());
        let jobs = storage.job_store().list_all().unwrap();
        assert_eq!(jobs[0].embedding.as_ref().unwrap().dim(), 32);
    }

    // New model with another dimension: vectors dropped until re-embedded
    let storage = StorageManager::new(config(48)).unwrap();
    assert!(storage.needs_reembed());

    let ctx = Arc::new(MatchContext::new(Arc::new(HashEmbedder::new(48))));
    let engine = MatchEngine::new(ctx.clone(), storage.job_store(), MatchConfig::default()).unwrap();
    let query = SkillQuery::new(["python"], LanguageTag::En);
    assert!(engine.match_query(&query).unwrap().ranked.is_empty());

    let ingestor = Ingestor::new(ctx, storage.job_store(), storage.skill_store());
    let report = ingestor.reembed_all().unwrap();
    assert_eq!(report.updated, 1);
    assert!(!storage.needs_reembed());
    assert_eq!(engine.match_query(&query).unwrap().ranked.len(), 1);
}

#[test]
fn test_lmdb_backend_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        data_dir: dir.path().to_path_buf(),
        backend: StorageBackend::Lmdb,
        vector_dim: 16,
        save_interval: None,
        lmdb_map_size: 16 * 1024 * 1024,
    };

    let ctx = Arc::new(MatchContext::new(Arc::new(HashEmbedder::new(16))));
    {
        let storage = StorageManager::new(config.clone()).unwrap();
        let ingestor = Ingestor::new(ctx.clone(), storage.job_store(), storage.skill_store());
        ingestor.add_job("Chef", "cooking", LanguageTag::En).unwrap();
        ingestor.add_skill("python", LanguageTag::En).unwrap();
    }

    let storage = StorageManager::new(config).unwrap();
    let engine = MatchEngine::new(ctx, storage.job_store(), MatchConfig::default()).unwrap();
    let outcome = engine
        .match_query(&SkillQuery::new(["cooking"], LanguageTag::En))
        .unwrap();
    assert_eq!(outcome.ranked.len(), 1);
    assert_eq!(storage.skill_store().list_skills().unwrap().len(), 1);
}
