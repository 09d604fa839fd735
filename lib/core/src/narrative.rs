use crate::context::MatchContext;
use crate::engine::SkillQuery;
use crate::language::{LanguageTag, SourceLanguage};
use crate::translate::translate_or_original;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::debug;

/// Narratives are cut to this many characters
pub const DEFAULT_NARRATIVE_CHARS: usize = 150;

/// Short motivational story about a set of skills
pub struct NarrativeService {
    ctx: Arc<MatchContext>,
    max_chars: usize,
}

impl NarrativeService {
    pub fn new(ctx: Arc<MatchContext>) -> Self {
        Self {
            ctx,
            max_chars: DEFAULT_NARRATIVE_CHARS,
        }
    }

    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn prompt(skills: &[String]) -> String {
        format!(
            "In an inspiring tone, tell a 50-word story of how {} drives green jobs like renewable energy or waste reduction:",
            skills.join(", ")
        )
    }

    /// Generate in English, then translate to the query language. A failed
    /// translation returns the English text.
    pub fn generate(&self, query: &SkillQuery) -> Result<String> {
        let source = SourceLanguage::Tag(query.lang);
        let skills: Vec<String> = query
            .phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(|p| translate_or_original(self.ctx.translator(), p, LanguageTag::CANONICAL, source))
            .collect();
        if skills.is_empty() {
            return Err(Error::InvalidQuery("no skills given".to_string()));
        }

        let story = self.ctx.generator().generate(&Self::prompt(&skills))?;
        let story = truncate_chars(story.trim(), self.max_chars);
        debug!(chars = story.chars().count(), lang = %query.lang, "Narrative generated");

        Ok(translate_or_original(
            self.ctx.translator(),
            story,
            query.lang,
            SourceLanguage::Tag(LanguageTag::CANONICAL),
        ))
    }
}

/// Longest prefix of `text` with at most `max` characters
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
