use crate::record::{JobId, JobRecord, SkillId, SkillRecord};
use crate::{Error, Result, Vector};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::warn;

/// CRUD access to job postings.
///
/// Implementations must make every write atomic per record: a reader sees
/// either the whole previous record or the whole new one.
pub trait JobStore: Send + Sync {
    /// Insert a job. A record without an id gets a fresh one; a record
    /// carrying an id replaces the stored record with that id.
    fn put(&self, record: JobRecord) -> Result<JobId>;

    fn get(&self, id: JobId) -> Result<JobRecord>;

    /// Every job, in insertion order
    fn list_all(&self) -> Result<Vec<JobRecord>>;

    fn update_embedding(&self, id: JobId, embedding: Vector) -> Result<()>;

    fn delete(&self, id: JobId) -> Result<()>;

    fn count(&self) -> Result<usize>;

    /// Dimension every stored embedding must have
    fn vector_dim(&self) -> usize;

    /// True when stored vectors were found unusable on load
    fn needs_reembed(&self) -> bool {
        false
    }

    /// Called after a full re-embed has rewritten every vector. Durable
    /// stores persist the cleared flag.
    fn clear_reembed_flag(&self) -> Result<()> {
        Ok(())
    }
}

/// Skills are stored for bookkeeping only; matching never reads them.
pub trait SkillStore: Send + Sync {
    fn put_skill(&self, record: SkillRecord) -> Result<SkillId>;

    fn get_skill(&self, id: SkillId) -> Result<SkillRecord>;

    fn list_skills(&self) -> Result<Vec<SkillRecord>>;
}

/// Reject embeddings whose length differs from the store dimension
pub fn check_dimension(expected: usize, embedding: Option<&Vector>) -> Result<()> {
    match embedding {
        Some(v) if v.dim() != expected => Err(Error::InvalidDimension {
            expected,
            actual: v.dim(),
        }),
        _ => Ok(()),
    }
}

/// Plain-data image of a [`MemoryStore`], used by persistence layers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSnapshot {
    pub vector_dim: usize,
    pub next_job_id: u64,
    pub next_skill_id: u64,
    pub jobs: Vec<JobRecord>,
    pub skills: Vec<SkillRecord>,
    /// Set while a dimension change is waiting for a full re-embed
    pub needs_reembed: bool,
}

/// In-memory store. Ids grow monotonically, so ordering the tables by id
/// is ordering them by insertion.
pub struct MemoryStore {
    vector_dim: usize,
    jobs: RwLock<BTreeMap<u64, JobRecord>>,
    skills: RwLock<BTreeMap<u64, SkillRecord>>,
    next_job_id: AtomicU64,
    next_skill_id: AtomicU64,
    needs_reembed: AtomicBool,
}

impl MemoryStore {
    pub fn new(vector_dim: usize) -> Self {
        Self {
            vector_dim,
            jobs: RwLock::new(BTreeMap::new()),
            skills: RwLock::new(BTreeMap::new()),
            next_job_id: AtomicU64::new(1),
            next_skill_id: AtomicU64::new(1),
            needs_reembed: AtomicBool::new(false),
        }
    }

    /// Copy the current contents out
    pub fn snapshot(&self) -> StoreSnapshot {
        let jobs = self.jobs.read();
        let skills = self.skills.read();
        StoreSnapshot {
            vector_dim: self.vector_dim,
            next_job_id: self.next_job_id.load(Ordering::Acquire),
            next_skill_id: self.next_skill_id.load(Ordering::Acquire),
            jobs: jobs.values().cloned().collect(),
            skills: skills.values().cloned().collect(),
            needs_reembed: self.needs_reembed.load(Ordering::Acquire),
        }
    }

    /// Rebuild a store from a snapshot taken with possibly another dimension.
    ///
    /// Embeddings that do not match `vector_dim` are dropped and the store is
    /// flagged for re-embedding instead of mixing vectors of two models.
    pub fn from_snapshot(snapshot: StoreSnapshot, vector_dim: usize) -> Self {
        let store = Self::new(vector_dim);
        let mut dropped = 0usize;

        {
            let mut jobs = store.jobs.write();
            for mut job in snapshot.jobs {
                let Some(id) = job.id else {
                    warn!(title = %job.title, "Skipping job without id in snapshot");
                    continue;
                };
                if check_dimension(vector_dim, job.embedding.as_ref()).is_err() {
                    job.embedding = None;
                    dropped += 1;
                }
                jobs.insert(id.0, job);
            }
        }

        {
            let mut skills = store.skills.write();
            for mut skill in snapshot.skills {
                let Some(id) = skill.id else {
                    continue;
                };
                if check_dimension(vector_dim, skill.embedding.as_ref()).is_err() {
                    skill.embedding = None;
                }
                skills.insert(id.0, skill);
            }
        }

        let max_job = store.jobs.read().keys().next_back().copied().unwrap_or(0);
        let max_skill = store.skills.read().keys().next_back().copied().unwrap_or(0);
        store
            .next_job_id
            .store(snapshot.next_job_id.max(max_job.saturating_add(1)), Ordering::Release);
        store
            .next_skill_id
            .store(snapshot.next_skill_id.max(max_skill.saturating_add(1)), Ordering::Release);

        if snapshot.needs_reembed {
            warn!("Snapshot was saved before re-embedding finished; re-embedding required");
            store.needs_reembed.store(true, Ordering::Release);
        } else if dropped > 0 || snapshot.vector_dim != vector_dim {
            warn!(
                dropped,
                stored_dim = snapshot.vector_dim,
                vector_dim,
                "Snapshot vectors do not match the configured dimension; re-embedding required"
            );
            store.needs_reembed.store(true, Ordering::Release);
        }

        store
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("vector_dim", &self.vector_dim)
            .field("jobs", &self.jobs.read().len())
            .field("skills", &self.skills.read().len())
            .field("needs_reembed", &self.needs_reembed.load(Ordering::Acquire))
            .finish()
    }
}

impl JobStore for MemoryStore {
    fn put(&self, mut record: JobRecord) -> Result<JobId> {
        check_dimension(self.vector_dim, record.embedding.as_ref())?;

        let mut jobs = self.jobs.write();
        let id = match record.id {
            Some(id) => {
                self.next_job_id.fetch_max(id.0.saturating_add(1), Ordering::AcqRel);
                id
            }
            None => JobId(self.next_job_id.fetch_add(1, Ordering::AcqRel)),
        };

        record.id = Some(id);
        record.version = match jobs.get(&id.0) {
            Some(existing) => existing.version + 1,
            None => record.version.max(1),
        };
        jobs.insert(id.0, record);
        Ok(id)
    }

    fn get(&self, id: JobId) -> Result<JobRecord> {
        self.jobs
            .read()
            .get(&id.0)
            .cloned()
            .ok_or(Error::JobNotFound(id.0))
    }

    fn list_all(&self) -> Result<Vec<JobRecord>> {
        Ok(self.jobs.read().values().cloned().collect())
    }

    fn update_embedding(&self, id: JobId, embedding: Vector) -> Result<()> {
        check_dimension(self.vector_dim, Some(&embedding))?;

        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&id.0).ok_or(Error::JobNotFound(id.0))?;
        job.embedding = Some(embedding);
        job.version += 1;
        Ok(())
    }

    fn delete(&self, id: JobId) -> Result<()> {
        self.jobs
            .write()
            .remove(&id.0)
            .map(|_| ())
            .ok_or(Error::JobNotFound(id.0))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.jobs.read().len())
    }

    fn vector_dim(&self) -> usize {
        self.vector_dim
    }

    fn needs_reembed(&self) -> bool {
        self.needs_reembed.load(Ordering::Acquire)
    }

    fn clear_reembed_flag(&self) -> Result<()> {
        self.needs_reembed.store(false, Ordering::Release);
        Ok(())
    }
}

impl SkillStore for MemoryStore {
    fn put_skill(&self, mut record: SkillRecord) -> Result<SkillId> {
        check_dimension(self.vector_dim, record.embedding.as_ref())?;

        let mut skills = self.skills.write();
        let id = match record.id {
            Some(id) => {
                self.next_skill_id.fetch_max(id.0.saturating_add(1), Ordering::AcqRel);
                id
            }
            None => SkillId(self.next_skill_id.fetch_add(1, Ordering::AcqRel)),
        };
        record.id = Some(id);
        skills.insert(id.0, record);
        Ok(id)
    }

    fn get_skill(&self, id: SkillId) -> Result<SkillRecord> {
        self.skills
            .read()
            .get(&id.0)
            .cloned()
            .ok_or(Error::SkillNotFound(id.0))
    }

    fn list_skills(&self) -> Result<Vec<SkillRecord>> {
        Ok(self.skills.read().values().cloned().collect())
    }
}
