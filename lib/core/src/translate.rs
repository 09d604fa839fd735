//! Translation collaborators
//!
//! Matching happens in English. Phrases in other languages go through a
//! [`Translator`] first; if it fails the original text is used instead, which
//! lowers accuracy but keeps the request alive.

use crate::language::{LanguageTag, SourceLanguage};
use crate::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// Default number of cached translations
pub const DEFAULT_TRANSLATION_CACHE_SIZE: usize = 1024;

pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target: LanguageTag, source: SourceLanguage) -> Result<String>;
}

/// Returns text unchanged. Used when no translation backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, text: &str, _target: LanguageTag, _source: SourceLanguage) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Translate, falling back to the untranslated text on failure.
///
/// Text already in the target language is returned without a call.
pub fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    target: LanguageTag,
    source: SourceLanguage,
) -> String {
    if source == SourceLanguage::Tag(target) {
        return text.to_string();
    }

    match translator.translate(text, target, source) {
        Ok(translated) => translated,
        Err(e) => {
            warn!(%source, %target, error = %e, "Translation failed, using original text");
            text.to_string()
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationCacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// LRU cache in front of another translator, keyed by `(text, target)`.
///
/// Only successful translations are cached.
pub struct CachedTranslator<T> {
    inner: T,
    cache: Mutex<LruCache<(String, LanguageTag), String>>,
    stats: Mutex<TranslationCacheStats>,
}

impl<T: Translator> CachedTranslator<T> {
    pub fn new(inner: T) -> Self {
        Self::with_capacity(inner, DEFAULT_TRANSLATION_CACHE_SIZE)
    }

    /// A capacity of zero is bumped to one
    pub fn with_capacity(inner: T, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(TranslationCacheStats::default()),
        }
    }

    pub fn stats(&self) -> TranslationCacheStats {
        *self.stats.lock()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Translator> Translator for CachedTranslator<T> {
    fn translate(&self, text: &str, target: LanguageTag, source: SourceLanguage) -> Result<String> {
        let key = (text.to_string(), target);

        if let Some(hit) = self.cache.lock().get(&key).cloned() {
            self.stats.lock().hits += 1;
            return Ok(hit);
        }
        self.stats.lock().misses += 1;

        // The lock is not held across the backend call
        let translated = self.inner.translate(text, target, source)?;
        debug!(%target, "Caching translation");
        self.cache.lock().put(key, translated.clone());
        Ok(translated)
    }
}
