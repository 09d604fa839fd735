// Compressed whole-store dump of a MemoryStore
use anyhow::{anyhow, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use greenmatch_core::{MemoryStore, StoreSnapshot};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Bumped whenever the envelope layout changes
const DUMP_FORMAT_VERSION: u32 = 2;

pub const DEFAULT_DUMP_FILENAME: &str = "greenmatch.dump";

/// What is written to disk, before gzip
#[derive(Debug, Serialize, Deserialize)]
struct DumpEnvelope {
    format_version: u32,
    saved_at: DateTime<Utc>,
    /// Hex SHA-256 of `payload`
    checksum: String,
    /// bincode-encoded [`StoreSnapshot`]
    payload: Vec<u8>,
}

/// Summary of a dump on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpInfo {
    pub saved_at: DateTime<Utc>,
    pub checksum: String,
    pub size: u64,
    pub jobs: usize,
}

/// A single dump file. Writes go to a temporary file and are renamed over
/// the old dump, so a crash mid-save leaves the previous dump intact.
pub struct DumpFile {
    path: PathBuf,
}

impl DumpFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Dump file with the default name inside `data_dir`
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join(DEFAULT_DUMP_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, store: &MemoryStore) -> Result<DumpInfo> {
        self.save_snapshot(&store.snapshot())
    }

    pub fn save_snapshot(&self, snapshot: &StoreSnapshot) -> Result<DumpInfo> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let payload = bincode::serialize(snapshot)?;
        let envelope = DumpEnvelope {
            format_version: DUMP_FORMAT_VERSION,
            saved_at: Utc::now(),
            checksum: format!("{:x}", Sha256::digest(&payload)),
            payload,
        };
        let encoded = bincode::serialize(&envelope)?;

        let file = AtomicFile::new(&self.path, AllowOverwrite);
        file.write(|f| {
            let mut encoder = GzEncoder::new(f, Compression::default());
            encoder.write_all(&encoded)?;
            encoder.finish().map(|_| ())
        })
        .map_err(|e| anyhow!("Failed to write dump {}: {}", self.path.display(), e))?;

        let info = DumpInfo {
            saved_at: envelope.saved_at,
            checksum: envelope.checksum,
            size: fs::metadata(&self.path)?.len(),
            jobs: snapshot.jobs.len(),
        };
        info!(path = %self.path.display(), jobs = info.jobs, size = info.size, "Dump saved");
        Ok(info)
    }

    /// Read and verify the dump. `Ok(None)` when there is no file yet.
    pub fn load_snapshot(&self) -> Result<Option<(StoreSnapshot, DumpInfo)>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        let size = file.metadata()?.len();
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut encoded = Vec::new();
        decoder.read_to_end(&mut encoded)?;

        let envelope: DumpEnvelope = bincode::deserialize(&encoded)?;
        if envelope.format_version != DUMP_FORMAT_VERSION {
            return Err(anyhow!(
                "Unsupported dump format version {} (expected {})",
                envelope.format_version,
                DUMP_FORMAT_VERSION
            ));
        }

        let checksum = format!("{:x}", Sha256::digest(&envelope.payload));
        if checksum != envelope.checksum {
            return Err(anyhow!(
                "Dump checksum mismatch: expected {}, got {}",
                envelope.checksum,
                checksum
            ));
        }

        let snapshot: StoreSnapshot = bincode::deserialize(&envelope.payload)?;
        let info = DumpInfo {
            saved_at: envelope.saved_at,
            checksum,
            size,
            jobs: snapshot.jobs.len(),
        };
        Ok(Some((snapshot, info)))
    }

    /// Load into a store of the given dimension. Vectors of another
    /// dimension are dropped and the store is flagged for re-embedding.
    pub fn load(&self, vector_dim: usize) -> Result<Option<MemoryStore>> {
        Ok(self.load_snapshot()?.map(|(snapshot, info)| {
            info!(jobs = info.jobs, saved_at = %info.saved_at, "Loading dump");
            MemoryStore::from_snapshot(snapshot, vector_dim)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenmatch_core::{JobRecord, JobStore, Vector};
    use tempfile::TempDir;

    fn sample_store() -> MemoryStore {
        let store = MemoryStore::new(3);
        store
            .put(JobRecord::new("Eco Engineer", "solar").with_embedding(Vector::new(vec![1.0, 0.0, 0.0])))
            .unwrap();
        store.put(JobRecord::new("Chef", "cooking")).unwrap();
        store
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        assert!(!dump.exists());
        assert!(dump.load(3).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        let info = dump.save(&sample_store()).unwrap();
        assert_eq!(info.jobs, 2);
        assert_eq!(info.checksum.len(), 64);

        let restored = dump.load(3).unwrap().unwrap();
        let jobs = restored.list_all().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].embedding.as_ref().unwrap().as_slice(), &[1.0, 0.0, 0.0]);
        assert!(!restored.needs_reembed());
    }

    #[test]
    fn test_overwrite_replaces_previous_dump() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        dump.save(&sample_store()).unwrap();
        dump.save(&MemoryStore::new(3)).unwrap();
        assert_eq!(dump.load(3).unwrap().unwrap().count().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        fs::write(dump.path(), b"not a gzip stream").unwrap();
        assert!(dump.load(3).is_err());
    }

    #[test]
    fn test_checksum_is_verified() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        let payload = bincode::serialize(&MemoryStore::new(3).snapshot()).unwrap();
        let envelope = DumpEnvelope {
            format_version: DUMP_FORMAT_VERSION,
            saved_at: Utc::now(),
            checksum: "0".repeat(64),
            payload,
        };
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bincode::serialize(&envelope).unwrap()).unwrap();
        fs::write(dump.path(), encoder.finish().unwrap()).unwrap();

        let err = dump.load(3).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_dimension_change_flags_reembed() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        dump.save(&sample_store()).unwrap();

        let restored = dump.load(5).unwrap().unwrap();
        assert!(restored.needs_reembed());
        assert!(restored.list_all().unwrap().iter().all(|j| j.embedding.is_none()));
    }

    #[test]
    fn test_pending_reembed_survives_intermediate_save() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        dump.save(&sample_store()).unwrap();

        // A background save lands before the re-embed runs
        let pending = dump.load(5).unwrap().unwrap();
        dump.save(&pending).unwrap();

        let reloaded = dump.load(5).unwrap().unwrap();
        assert!(reloaded.needs_reembed());

        reloaded.clear_reembed_flag().unwrap();
        dump.save(&reloaded).unwrap();
        assert!(!dump.load(5).unwrap().unwrap().needs_reembed());
    }

    #[test]
    fn test_other_format_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let dump = DumpFile::in_dir(dir.path());
        let payload = bincode::serialize(&MemoryStore::new(3).snapshot()).unwrap();
        let envelope = DumpEnvelope {
            format_version: DUMP_FORMAT_VERSION + 1,
            saved_at: Utc::now(),
            checksum: format!("{:x}", Sha256::digest(&payload)),
            payload,
        };
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bincode::serialize(&envelope).unwrap()).unwrap();
        fs::write(dump.path(), encoder.finish().unwrap()).unwrap();

        let err = dump.load(3).unwrap_err();
        assert!(err.to_string().contains("Unsupported dump format version"));
    }
}
