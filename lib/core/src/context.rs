use crate::embedder::EmbeddingProvider;
use crate::generate::{TemplateGenerator, TextGenerator};
use crate::notify::{NoopNotifier, Notifier};
use crate::translate::{IdentityTranslator, Translator};
use std::sync::Arc;

/// Handles to every external collaborator the engine talks to.
///
/// Built once at startup and shared by reference; tests swap in fakes with
/// the `with_*` setters.
#[derive(Clone)]
pub struct MatchContext {
    embedder: Arc<dyn EmbeddingProvider>,
    translator: Arc<dyn Translator>,
    generator: Arc<dyn TextGenerator>,
    notifier: Arc<dyn Notifier>,
}

impl MatchContext {
    /// Context with the given embedder, no translation, the template
    /// generator and no notifications
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            translator: Arc::new(IdentityTranslator),
            generator: Arc::new(TemplateGenerator::default()),
            notifier: Arc::new(NoopNotifier),
        }
    }

    #[must_use]
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = generator;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[inline]
    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    #[inline]
    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    #[inline]
    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    #[inline]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }
}

impl std::fmt::Debug for MatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchContext")
            .field("embedding_dim", &self.embedder.dim())
            .finish_non_exhaustive()
    }
}
