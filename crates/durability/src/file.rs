//! File persistence backend
//!
//! One file per namespace, `<dir>/<namespace>.state`.
//!
//! # Format
//!
//! ```text
//! +-------+-----------+-----------+---------+
//! | magic | crc32(LE) | len (LE)  | payload |
//! | 4 B   | 4 B       | 8 B       | len B   |
//! +-------+-----------+-----------+---------+
//! ```
//!
//! The CRC covers the payload only. Writes go to a temporary sibling file
//! which is synced and then renamed over the target, so a crash mid-write
//! leaves the previous checkpoint intact.

use crate::{validate_namespace, Persistence};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use keystate_core::{StoreError, StoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"KST1";
const HEADER_LEN: usize = 16;
const EXTENSION: &str = "state";

/// Checksummed file-per-namespace persistence.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    /// Open a backend rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Root directory of this backend.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `namespace`.
    pub fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", namespace, EXTENSION))
    }

    fn encode(blob: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(HEADER_LEN + blob.len());
        out.extend_from_slice(MAGIC);
        out.write_u32::<LittleEndian>(crc32fast::hash(blob))?;
        out.write_u64::<LittleEndian>(blob.len() as u64)?;
        out.extend_from_slice(blob);
        Ok(out)
    }

    fn decode(namespace: &str, bytes: &[u8]) -> StoreResult<Vec<u8>> {
        let corrupt = |reason: String| StoreError::Corrupt {
            namespace: namespace.to_string(),
            reason,
        };

        if bytes.len() < HEADER_LEN {
            return Err(corrupt(format!("truncated header ({} bytes)", bytes.len())));
        }
        if &bytes[..4] != MAGIC {
            return Err(corrupt("bad magic".to_string()));
        }

        let mut header = Cursor::new(&bytes[4..HEADER_LEN]);
        let expected_crc = header.read_u32::<LittleEndian>()?;
        let len = header.read_u64::<LittleEndian>()?;

        let payload = &bytes[HEADER_LEN..];
        if payload.len() as u64 != len {
            return Err(corrupt(format!(
                "length mismatch: header says {}, found {}",
                len,
                payload.len()
            )));
        }

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(corrupt(format!(
                "checksum mismatch: expected {:08x}, got {:08x}",
                expected_crc, actual_crc
            )));
        }

        Ok(payload.to_vec())
    }
}

impl Persistence for FilePersistence {
    fn load(&self, namespace: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_namespace(namespace)?;
        let path = self.path_for(namespace);

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;

        Self::decode(namespace, &bytes).map(Some)
    }

    fn save(&self, namespace: &str, blob: &[u8]) -> StoreResult<()> {
        validate_namespace(namespace)?;
        let path = self.path_for(namespace);
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));

        let encoded = Self::encode(blob)?;
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        tracing::debug!(
            namespace = %namespace,
            bytes = blob.len(),
            path = %path.display(),
            "Persisted state written"
        );
        Ok(())
    }

    fn remove(&self, namespace: &str) -> StoreResult<()> {
        validate_namespace(namespace)?;
        match fs::remove_file(self.path_for(namespace)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
