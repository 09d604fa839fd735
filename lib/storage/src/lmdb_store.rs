// LMDB-backed job and skill tables
use anyhow::Result as AnyResult;
use greenmatch_core::codec;
use greenmatch_core::store::check_dimension;
use greenmatch_core::{
    CodecError, Error, JobId, JobRecord, JobStore, LanguageTag, Result, SkillId, SkillRecord,
    SkillStore, Vector,
};
use heed::types::{Bytes, Str, U64};
use heed::byteorder::BE;
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const DB_JOBS: &str = "jobs";
const DB_SKILLS: &str = "skills";
const DB_META: &str = "meta";

const META_VECTOR_DIM: &str = "vector_dim";
const META_NEXT_JOB_ID: &str = "next_job_id";
const META_NEXT_SKILL_ID: &str = "next_skill_id";
/// 1 while a dimension change is waiting for a full re-embed
const META_NEEDS_REEMBED: &str = "needs_reembed";

/// Default LMDB map size (1GB)
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

/// On-disk job row. The id is the key; the embedding is a codec blob.
#[derive(Debug, Serialize, Deserialize)]
struct JobRow {
    title: String,
    description: String,
    lang: LanguageTag,
    version: u64,
    embedding: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SkillRow {
    text: String,
    lang: LanguageTag,
    embedding: Option<Vec<u8>>,
}

type IdTable = Database<U64<BE>, Bytes>;

/// Job store persisted in LMDB. Every write is its own transaction, so each
/// record is replaced atomically.
pub struct LmdbStore {
    env: Arc<Env>,
    jobs_db: IdTable,
    skills_db: IdTable,
    meta_db: Database<Str, U64<BE>>,
    vector_dim: usize,
    needs_reembed: AtomicBool,
}

impl LmdbStore {
    pub fn open<P: AsRef<Path>>(path: P, vector_dim: usize) -> Result<Self> {
        Self::open_with_map_size(path, vector_dim, DEFAULT_MAP_SIZE)
    }

    pub fn open_with_map_size<P: AsRef<Path>>(path: P, vector_dim: usize, map_size: usize) -> Result<Self> {
        Self::try_open(path.as_ref(), vector_dim, map_size).map_err(storage_err)
    }

    fn try_open(path: &Path, vector_dim: usize, map_size: usize) -> AnyResult<Self> {
        std::fs::create_dir_all(path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(4)
                .open(path)?
        });

        let mut wtxn = env.write_txn()?;
        let jobs_db = env.create_database(&mut wtxn, Some(DB_JOBS))?;
        let skills_db = env.create_database(&mut wtxn, Some(DB_SKILLS))?;
        let meta_db: Database<Str, U64<BE>> = env.create_database(&mut wtxn, Some(DB_META))?;

        let stored_dim = meta_db.get(&wtxn, META_VECTOR_DIM)?;
        let pending = meta_db.get(&wtxn, META_NEEDS_REEMBED)?.unwrap_or(0) != 0;
        let needs_reembed = match stored_dim {
            Some(dim) if dim != vector_dim as u64 => {
                warn!(
                    stored_dim = dim,
                    vector_dim,
                    "Stored vectors use another dimension; re-embedding required"
                );
                true
            }
            _ if pending => {
                warn!(vector_dim, "Previous re-embedding did not finish; re-embedding required");
                true
            }
            _ => false,
        };
        meta_db.put(&mut wtxn, META_VECTOR_DIM, &(vector_dim as u64))?;
        if needs_reembed {
            meta_db.put(&mut wtxn, META_NEEDS_REEMBED, &1)?;
        }
        wtxn.commit()?;

        info!(path = %path.display(), vector_dim, "Opened LMDB store");

        Ok(Self {
            env,
            jobs_db,
            skills_db,
            meta_db,
            vector_dim,
            needs_reembed: AtomicBool::new(needs_reembed),
        })
    }

    /// Take the next id from a meta counter
    fn allocate_id(&self, wtxn: &mut RwTxn, counter: &str) -> AnyResult<u64> {
        let next = self.meta_db.get(&*wtxn, counter)?.unwrap_or(1);
        self.meta_db.put(wtxn, counter, &next.saturating_add(1))?;
        Ok(next)
    }

    /// Make sure a counter stays above an explicitly supplied id
    fn bump_counter(&self, wtxn: &mut RwTxn, counter: &str, id: u64) -> AnyResult<()> {
        let next = self.meta_db.get(&*wtxn, counter)?.unwrap_or(1);
        if next <= id {
            self.meta_db.put(wtxn, counter, &id.saturating_add(1))?;
        }
        Ok(())
    }

    /// Decode a stored blob. Bad blobs are logged and read as no embedding.
    fn decode_embedding(&self, id: u64, blob: Option<&[u8]>) -> Option<Vector> {
        let blob = blob?;
        match codec::decode_with_dim(blob, self.vector_dim) {
            Ok(vector) => Some(vector),
            Err(CodecError::WrongDimension { expected, actual }) => {
                debug!(id, expected, actual, "Ignoring embedding of another dimension");
                None
            }
            Err(e) => {
                warn!(id, error = %e, "Corrupt embedding blob, treating as absent");
                None
            }
        }
    }

    fn job_from_row(&self, id: u64, row: JobRow) -> JobRecord {
        let embedding = self.decode_embedding(id, row.embedding.as_deref());
        JobRecord {
            id: Some(JobId(id)),
            title: row.title,
            description: row.description,
            lang: row.lang,
            version: row.version,
            embedding,
        }
    }

    fn skill_from_row(&self, id: u64, row: SkillRow) -> SkillRecord {
        let embedding = self.decode_embedding(id, row.embedding.as_deref());
        SkillRecord {
            id: Some(SkillId(id)),
            text: row.text,
            lang: row.lang,
            embedding,
        }
    }

    fn put_job(&self, record: JobRecord) -> AnyResult<u64> {
        let mut wtxn = self.env.write_txn()?;
        let id = match record.id {
            Some(id) => {
                self.bump_counter(&mut wtxn, META_NEXT_JOB_ID, id.0)?;
                id.0
            }
            None => self.allocate_id(&mut wtxn, META_NEXT_JOB_ID)?,
        };

        let version = match self.jobs_db.get(&wtxn, &id)? {
            Some(bytes) => bincode::deserialize::<JobRow>(bytes)
                .map(|existing| existing.version + 1)
                .unwrap_or(1),
            None => record.version.max(1),
        };

        let row = JobRow {
            title: record.title,
            description: record.description,
            lang: record.lang,
            version,
            embedding: record.embedding.map(|v| codec::encode(v.as_slice()).to_vec()),
        };
        self.jobs_db.put(&mut wtxn, &id, &bincode::serialize(&row)?)?;
        wtxn.commit()?;
        Ok(id)
    }

    fn read_job(&self, id: u64) -> AnyResult<Option<JobRecord>> {
        let rtxn = self.env.read_txn()?;
        match self.jobs_db.get(&rtxn, &id)? {
            Some(bytes) => {
                let row: JobRow = bincode::deserialize(bytes)?;
                Ok(Some(self.job_from_row(id, row)))
            }
            None => Ok(None),
        }
    }

    fn read_all_jobs(&self) -> AnyResult<Vec<JobRecord>> {
        let rtxn = self.env.read_txn()?;
        let mut jobs = Vec::new();
        for entry in self.jobs_db.iter(&rtxn)? {
            let (id, bytes) = entry?;
            match bincode::deserialize::<JobRow>(bytes) {
                Ok(row) => jobs.push(self.job_from_row(id, row)),
                Err(e) => warn!(id, error = %e, "Skipping unreadable job row"),
            }
        }
        Ok(jobs)
    }

    fn write_embedding(&self, id: u64, embedding: &Vector) -> AnyResult<bool> {
        let mut wtxn = self.env.write_txn()?;
        let Some(bytes) = self.jobs_db.get(&wtxn, &id)? else {
            return Ok(false);
        };
        let mut row: JobRow = bincode::deserialize(bytes)?;
        row.embedding = Some(codec::encode(embedding.as_slice()).to_vec());
        row.version += 1;
        self.jobs_db.put(&mut wtxn, &id, &bincode::serialize(&row)?)?;
        wtxn.commit()?;
        Ok(true)
    }

    fn remove_job(&self, id: u64) -> AnyResult<bool> {
        let mut wtxn = self.env.write_txn()?;
        let existed = self.jobs_db.delete(&mut wtxn, &id)?;
        wtxn.commit()?;
        Ok(existed)
    }

    fn count_jobs(&self) -> AnyResult<usize> {
        let rtxn = self.env.read_txn()?;
        Ok(self.jobs_db.len(&rtxn)? as usize)
    }

    fn put_skill_row(&self, record: SkillRecord) -> AnyResult<u64> {
        let mut wtxn = self.env.write_txn()?;
        let id = match record.id {
            Some(id) => {
                self.bump_counter(&mut wtxn, META_NEXT_SKILL_ID, id.0)?;
                id.0
            }
            None => self.allocate_id(&mut wtxn, META_NEXT_SKILL_ID)?,
        };
        let row = SkillRow {
            text: record.text,
            lang: record.lang,
            embedding: record.embedding.map(|v| codec::encode(v.as_slice()).to_vec()),
        };
        self.skills_db.put(&mut wtxn, &id, &bincode::serialize(&row)?)?;
        wtxn.commit()?;
        Ok(id)
    }

    fn read_skill(&self, id: u64) -> AnyResult<Option<SkillRecord>> {
        let rtxn = self.env.read_txn()?;
        match self.skills_db.get(&rtxn, &id)? {
            Some(bytes) => {
                let row: SkillRow = bincode::deserialize(bytes)?;
                Ok(Some(self.skill_from_row(id, row)))
            }
            None => Ok(None),
        }
    }

    fn read_all_skills(&self) -> AnyResult<Vec<SkillRecord>> {
        let rtxn = self.env.read_txn()?;
        let mut skills = Vec::new();
        for entry in self.skills_db.iter(&rtxn)? {
            let (id, bytes) = entry?;
            match bincode::deserialize::<SkillRow>(bytes) {
                Ok(row) => skills.push(self.skill_from_row(id, row)),
                Err(e) => warn!(id, error = %e, "Skipping unreadable skill row"),
            }
        }
        Ok(skills)
    }

    fn write_reembed_done(&self) -> AnyResult<()> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db.put(&mut wtxn, META_NEEDS_REEMBED, &0)?;
        wtxn.commit()?;
        Ok(())
    }

    /// Flush the environment to disk
    pub fn sync(&self) -> Result<()> {
        self.env
            .force_sync()
            .map_err(|e| Error::Storage(e.to_string()))
    }
}

fn storage_err(e: anyhow::Error) -> Error {
    Error::Storage(e.to_string())
}

impl JobStore for LmdbStore {
    fn put(&self, record: JobRecord) -> Result<JobId> {
        check_dimension(self.vector_dim, record.embedding.as_ref())?;
        self.put_job(record).map(JobId).map_err(storage_err)
    }

    fn get(&self, id: JobId) -> Result<JobRecord> {
        self.read_job(id.0)
            .map_err(storage_err)?
            .ok_or(Error::JobNotFound(id.0))
    }

    fn list_all(&self) -> Result<Vec<JobRecord>> {
        self.read_all_jobs().map_err(storage_err)
    }

    fn update_embedding(&self, id: JobId, embedding: Vector) -> Result<()> {
        check_dimension(self.vector_dim, Some(&embedding))?;
        if self.write_embedding(id.0, &embedding).map_err(storage_err)? {
            Ok(())
        } else {
            Err(Error::JobNotFound(id.0))
        }
    }

    fn delete(&self, id: JobId) -> Result<()> {
        if self.remove_job(id.0).map_err(storage_err)? {
            Ok(())
        } else {
            Err(Error::JobNotFound(id.0))
        }
    }

    fn count(&self) -> Result<usize> {
        self.count_jobs().map_err(storage_err)
    }

    fn vector_dim(&self) -> usize {
        self.vector_dim
    }

    fn needs_reembed(&self) -> bool {
        self.needs_reembed.load(Ordering::Acquire)
    }

    fn clear_reembed_flag(&self) -> Result<()> {
        self.write_reembed_done().map_err(storage_err)?;
        self.needs_reembed.store(false, Ordering::Release);
        Ok(())
    }
}

impl SkillStore for LmdbStore {
    fn put_skill(&self, record: SkillRecord) -> Result<SkillId> {
        check_dimension(self.vector_dim, record.embedding.as_ref())?;
        self.put_skill_row(record).map(SkillId).map_err(storage_err)
    }

    fn get_skill(&self, id: SkillId) -> Result<SkillRecord> {
        self.read_skill(id.0)
            .map_err(storage_err)?
            .ok_or(Error::SkillNotFound(id.0))
    }

    fn list_skills(&self) -> Result<Vec<SkillRecord>> {
        self.read_all_skills().map_err(storage_err)
    }
}
