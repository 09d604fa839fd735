use crate::language::LanguageTag;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a job posting, assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

/// Stable identifier of a stored skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

impl From<u64> for SkillId {
    fn from(id: u64) -> Self {
        SkillId(id)
    }
}

/// A job posting with its (optional) embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    /// `None` until the store assigns one
    pub id: Option<JobId>,
    pub title: String,
    pub description: String,
    /// Language `title` and `description` are written in
    #[serde(default)]
    pub lang: LanguageTag,
    /// Incremented by the store on each write
    #[serde(default)]
    pub version: u64,
    pub embedding: Option<Vector>,
}

impl JobRecord {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            lang: LanguageTag::default(),
            version: 0,
            embedding: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_lang(mut self, lang: LanguageTag) -> Self {
        self.lang = lang;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vector) -> Self {
        self.embedding = Some(embedding);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }

    #[inline]
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}

/// The single text unit a job is embedded from
pub fn job_encoding_text(title: &str, description: &str) -> String {
    format!("{}: {}", title, description)
}

/// A skill phrase kept for corpus bookkeeping. Never scored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillRecord {
    pub id: Option<SkillId>,
    pub text: String,
    #[serde(default)]
    pub lang: LanguageTag,
    pub embedding: Option<Vector>,
}

impl SkillRecord {
    #[must_use]
    pub fn new(text: impl Into<String>, lang: LanguageTag) -> Self {
        Self {
            id: None,
            text: text.into(),
            lang,
            embedding: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vector) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_text() {
        assert_eq!(
            job_encoding_text("Eco Engineer", "renewable energy python"),
            "Eco Engineer: renewable energy python"
        );
    }

    #[test]
    fn test_builder() {
        let job = JobRecord::new("Chef", "cooking")
            .with_lang(LanguageTag::Hi)
            .with_embedding(Vector::new(vec![0.0, 1.0, 0.0]));
        assert_eq!(job.id, None);
        assert_eq!(job.lang, LanguageTag::Hi);
        assert!(job.has_embedding());
    }
}
