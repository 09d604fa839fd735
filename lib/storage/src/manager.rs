use crate::dump::DumpFile;
use crate::lmdb_store::{LmdbStore, DEFAULT_MAP_SIZE};
use greenmatch_core::{Error, JobStore, MemoryStore, Result, SkillStore, DEFAULT_EMBEDDING_DIM};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info};

/// Default interval between background saves
pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(300);

/// Where jobs and skills live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Nothing survives a restart
    Memory,
    /// In memory, dumped to a compressed file periodically and on shutdown
    #[default]
    Dump,
    /// Every write goes straight to LMDB
    Lmdb,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Dump => "dump",
            StorageBackend::Lmdb => "lmdb",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "dump" => Ok(StorageBackend::Dump),
            "lmdb" => Ok(StorageBackend::Lmdb),
            other => Err(Error::InvalidConfig(format!("unknown storage backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    pub vector_dim: usize,
    /// `None` disables the background save thread
    pub save_interval: Option<Duration>,
    pub lmdb_map_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            backend: StorageBackend::default(),
            vector_dim: DEFAULT_EMBEDDING_DIM,
            save_interval: Some(DEFAULT_SAVE_INTERVAL),
            lmdb_map_size: DEFAULT_MAP_SIZE,
        }
    }
}

/// The concrete store behind the trait objects, kept for saving
enum Durable {
    Memory,
    Dump { store: Arc<MemoryStore>, file: DumpFile },
    Lmdb(Arc<LmdbStore>),
}

/// Shared between the manager and its background save thread
struct Saver {
    durable: Durable,
    last_save: AtomicU64,
    lock: Mutex<()>,
}

impl Saver {
    fn save(&self) -> Result<()> {
        let _guard = self.lock.lock();
        match &self.durable {
            Durable::Memory => return Ok(()),
            Durable::Dump { store, file } => {
                file.save(store).map_err(|e| Error::Persistence(e.to_string()))?;
            }
            Durable::Lmdb(store) => store.sync()?,
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.last_save.store(now, Ordering::Release);
        Ok(())
    }
}

/// Opens the configured backend and owns its persistence
pub struct StorageManager {
    config: StorageConfig,
    jobs: Arc<dyn JobStore>,
    skills: Arc<dyn SkillStore>,
    saver: Arc<Saver>,
    shutdown: Arc<AtomicBool>,
}

impl StorageManager {
    pub fn new(config: StorageConfig) -> Result<Self> {
        if config.vector_dim == 0 {
            return Err(Error::InvalidConfig("vector dimension must be at least 1".to_string()));
        }

        let (jobs, skills, durable) = match config.backend {
            StorageBackend::Memory => {
                let store = Arc::new(MemoryStore::new(config.vector_dim));
                let jobs: Arc<dyn JobStore> = store.clone();
                let skills: Arc<dyn SkillStore> = store;
                (jobs, skills, Durable::Memory)
            }
            StorageBackend::Dump => {
                std::fs::create_dir_all(&config.data_dir)?;
                let file = DumpFile::in_dir(&config.data_dir);
                let loaded = file
                    .load(config.vector_dim)
                    .map_err(|e| Error::Persistence(e.to_string()))?;
                let store = Arc::new(match loaded {
                    Some(store) => store,
                    None => {
                        info!(path = %file.path().display(), "No dump found, starting empty");
                        MemoryStore::new(config.vector_dim)
                    }
                });
                let jobs: Arc<dyn JobStore> = store.clone();
                let skills: Arc<dyn SkillStore> = store.clone();
                (jobs, skills, Durable::Dump { store, file })
            }
            StorageBackend::Lmdb => {
                let store = Arc::new(LmdbStore::open_with_map_size(
                    config.data_dir.join("lmdb"),
                    config.vector_dim,
                    config.lmdb_map_size,
                )?);
                let jobs: Arc<dyn JobStore> = store.clone();
                let skills: Arc<dyn SkillStore> = store.clone();
                (jobs, skills, Durable::Lmdb(store))
            }
        };

        let manager = Self {
            config,
            jobs,
            skills,
            saver: Arc::new(Saver {
                durable,
                last_save: AtomicU64::new(0),
                lock: Mutex::new(()),
            }),
            shutdown: Arc::new(AtomicBool::new(false)),
        };

        info!(
            backend = %manager.config.backend,
            jobs = manager.jobs.count()?,
            needs_reembed = manager.needs_reembed(),
            "Storage ready"
        );

        if manager.config.backend == StorageBackend::Dump {
            if let Some(interval) = manager.config.save_interval {
                manager.start_background_save(interval)?;
            }
        }

        Ok(manager)
    }

    /// Start background save thread
    fn start_background_save(&self, interval: Duration) -> Result<()> {
        let saver = self.saver.clone();
        let shutdown = self.shutdown.clone();

        std::thread::Builder::new()
            .name("greenmatch-bgsave".to_string())
            .spawn(move || loop {
                std::thread::sleep(interval);
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                if let Err(e) = saver.save() {
                    error!(error = %e, "Background save failed");
                }
            })?;
        Ok(())
    }

    #[inline]
    pub fn job_store(&self) -> Arc<dyn JobStore> {
        self.jobs.clone()
    }

    #[inline]
    pub fn skill_store(&self) -> Arc<dyn SkillStore> {
        self.skills.clone()
    }

    #[inline]
    pub fn backend(&self) -> StorageBackend {
        self.config.backend
    }

    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn needs_reembed(&self) -> bool {
        self.jobs.needs_reembed()
    }

    /// Force save
    pub fn save(&self) -> Result<()> {
        self.saver.save()
    }

    /// Unix seconds of the last successful save, 0 if none yet
    pub fn last_save_time(&self) -> u64 {
        self.saver.last_save.load(Ordering::Acquire)
    }
}

impl Drop for StorageManager {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenmatch_core::{JobRecord, Vector};
    use tempfile::TempDir;

    fn config(dir: &TempDir, backend: StorageBackend) -> StorageConfig {
        StorageConfig {
            data_dir: dir.path().to_path_buf(),
            backend,
            vector_dim: 2,
            save_interval: None,
            lmdb_map_size: 16 * 1024 * 1024,
        }
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("LMDB".parse::<StorageBackend>().unwrap(), StorageBackend::Lmdb);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!(matches!("redis".parse::<StorageBackend>(), Err(Error::InvalidConfig(_))));
        assert_eq!(StorageBackend::Dump.to_string(), "dump");
    }

    #[test]
    fn test_dump_backend_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let manager = StorageManager::new(config(&dir, StorageBackend::Dump)).unwrap();
            manager
                .job_store()
                .put(JobRecord::new("Eco Engineer", "solar").with_embedding(Vector::new(vec![1.0, 0.0])))
                .unwrap();
            assert_eq!(manager.last_save_time(), 0);
            manager.save().unwrap();
            assert!(manager.last_save_time() > 0);
        }

        let manager = StorageManager::new(config(&dir, StorageBackend::Dump)).unwrap();
        let jobs = manager.job_store().list_all().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Eco Engineer");
    }

    #[test]
    fn test_lmdb_backend_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let manager = StorageManager::new(config(&dir, StorageBackend::Lmdb)).unwrap();
            manager.job_store().put(JobRecord::new("Chef", "cooking")).unwrap();
            manager.save().unwrap();
        }

        let manager = StorageManager::new(config(&dir, StorageBackend::Lmdb)).unwrap();
        assert_eq!(manager.job_store().count().unwrap(), 1);
        assert!(!manager.needs_reembed());
    }

    #[test]
    fn test_memory_backend_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let manager = StorageManager::new(config(&dir, StorageBackend::Memory)).unwrap();
        manager.job_store().put(JobRecord::new("Chef", "cooking")).unwrap();
        manager.save().unwrap();
        assert_eq!(manager.last_save_time(), 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_dimension_change_reported() {
        let dir = TempDir::new().unwrap();
        {
            let manager = StorageManager::new(config(&dir, StorageBackend::Dump)).unwrap();
            manager
                .job_store()
                .put(JobRecord::new("a", "a").with_embedding(Vector::new(vec![1.0, 0.0])))
                .unwrap();
            manager.save().unwrap();
        }

        let mut cfg = config(&dir, StorageBackend::Dump);
        cfg.vector_dim = 3;
        let manager = StorageManager::new(cfg).unwrap();
        assert!(manager.needs_reembed());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, StorageBackend::Memory);
        cfg.vector_dim = 0;
        assert!(matches!(StorageManager::new(cfg), Err(Error::InvalidConfig(_))));
    }
}
