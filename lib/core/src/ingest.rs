use crate::context::MatchContext;
use crate::language::{LanguageTag, SourceLanguage};
use crate::record::{job_encoding_text, JobId, JobRecord, SkillId, SkillRecord};
use crate::store::{JobStore, SkillStore};
use crate::translate::translate_or_original;
use crate::{Error, Result, Vector};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Counts from a bulk re-embedding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReembedReport {
    pub updated: usize,
    /// Deleted while the run was in progress
    pub missing: usize,
    /// Rewritten with new text while the run was in progress; the new
    /// record already carries its own embedding
    pub changed: usize,
}

/// Writes jobs and skills, computing their embeddings on the way in
pub struct Ingestor {
    ctx: Arc<MatchContext>,
    jobs: Arc<dyn JobStore>,
    skills: Arc<dyn SkillStore>,
}

impl Ingestor {
    pub fn new(ctx: Arc<MatchContext>, jobs: Arc<dyn JobStore>, skills: Arc<dyn SkillStore>) -> Self {
        Self { ctx, jobs, skills }
    }

    /// Embedding of a job's text, translated to the working language first
    fn embed_job_text(&self, title: &str, description: &str, lang: LanguageTag) -> Result<Vector> {
        let source = SourceLanguage::Tag(lang);
        let translator = self.ctx.translator();
        let title = translate_or_original(translator, title, LanguageTag::CANONICAL, source);
        let description = translate_or_original(translator, description, LanguageTag::CANONICAL, source);
        self.ctx.embedder().embed(&job_encoding_text(&title, &description))
    }

    /// Store a new job. Text is stored as given; the embedding is computed
    /// from its English translation.
    pub fn add_job(&self, title: &str, description: &str, lang: LanguageTag) -> Result<JobId> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("job title is empty".to_string()));
        }
        if description.trim().is_empty() {
            return Err(Error::InvalidInput("job description is empty".to_string()));
        }

        let embedding = self.embed_job_text(title, description, lang)?;
        let record = JobRecord::new(title, description)
            .with_lang(lang)
            .with_embedding(embedding);
        let id = self.jobs.put(record)?;
        debug!(job_id = %id, "Job added");
        Ok(id)
    }

    pub fn add_skill(&self, text: &str, lang: LanguageTag) -> Result<SkillId> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("skill text is empty".to_string()));
        }

        let translated = translate_or_original(
            self.ctx.translator(),
            text,
            LanguageTag::CANONICAL,
            SourceLanguage::Tag(lang),
        );
        let embedding = self.ctx.embedder().embed(&translated)?;
        let id = self
            .skills
            .put_skill(SkillRecord::new(text, lang).with_embedding(embedding))?;
        debug!(skill_id = %id, "Skill added");
        Ok(id)
    }

    /// Recompute every job's embedding from its current text.
    ///
    /// Each record is updated on its own; a concurrent match may see a mix of
    /// old and new vectors. An embedding failure stops the run.
    pub fn reembed_all(&self) -> Result<ReembedReport> {
        let jobs = self.jobs.list_all()?;
        let mut report = ReembedReport::default();

        for job in jobs {
            let Some(id) = job.id else {
                continue;
            };
            let embedding = self.embed_job_text(&job.title, &job.description, job.lang)?;

            // Skip records whose text was replaced after we read it
            match self.jobs.get(id) {
                Ok(current)
                    if current.title != job.title
                        || current.description != job.description
                        || current.lang != job.lang =>
                {
                    report.changed += 1;
                    continue;
                }
                Ok(_) => {}
                Err(Error::JobNotFound(_)) => {
                    report.missing += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            match self.jobs.update_embedding(id, embedding) {
                Ok(()) => report.updated += 1,
                Err(Error::JobNotFound(_)) => report.missing += 1,
                Err(e) => return Err(e),
            }
        }

        self.jobs.clear_reembed_flag()?;
        info!(
            updated = report.updated,
            missing = report.missing,
            changed = report.changed,
            "Re-embedding finished"
        );
        Ok(report)
    }
}
