//! # Hasher Module
//!
//! Cheap content fingerprints for duplicate candidacy.
//!
//! Small files are hashed in full. Large files are sampled: first and last
//! megabyte plus the decimal file size, which distinguishes same-header
//! re-encodes without reading gigabytes. xxh3 keeps accidental collisions
//! negligible at library scale while staying I/O-bound.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

use crate::error::HashError;

/// Bytes sampled from each end of a large file. Files up to twice this
/// size are hashed whole.
pub const SAMPLE_SIZE: u64 = 1024 * 1024;

/// Content fingerprint of one file.
///
/// Equal fingerprints mark exact-duplicate candidates. This is a sampled
/// digest, not a cryptographic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(u64);

impl ContentHash {
    /// Wrap a raw digest value.
    pub fn new(bits: u64) -> Self {
        Self(bits)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fingerprint a file with the default sample size.
pub fn fingerprint(path: &Path) -> Result<ContentHash, HashError> {
    fingerprint_with_sample_size(path, SAMPLE_SIZE)
}

/// Fingerprint with an explicit sample size. Exposed for tests so the
/// sampling path is exercisable with tiny files.
pub(crate) fn fingerprint_with_sample_size(
    path: &Path,
    sample_size: u64,
) -> Result<ContentHash, HashError> {
    let io = |source| HashError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io)?;
    let file_size = file.metadata().map_err(io)?.len();
    let mut hasher = Xxh3::new();

    if file_size <= sample_size * 2 {
        let mut content = Vec::with_capacity(file_size as usize);
        file.read_to_end(&mut content).map_err(io)?;
        hasher.update(&content);
    } else {
        let mut sample = vec![0u8; sample_size as usize];
        file.read_exact(&mut sample).map_err(io)?;
        hasher.update(&sample);

        file.seek(SeekFrom::End(-(sample_size as i64))).map_err(io)?;
        file.read_exact(&mut sample).map_err(io)?;
        hasher.update(&sample);

        // Size disambiguates files that share both sampled regions.
        hasher.update(file_size.to_string().as_bytes());
    }

    Ok(ContentHash(hasher.digest()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const TEST_SAMPLE: u64 = 16;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn identical_small_files_share_a_fingerprint() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.mkv", b"same bytes");
        let b = write_file(&dir, "b.mkv", b"same bytes");

        let hash_a = fingerprint_with_sample_size(&a, TEST_SAMPLE).unwrap();
        let hash_b = fingerprint_with_sample_size(&b, TEST_SAMPLE).unwrap();
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn different_content_differs() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.mkv", b"first version");
        let b = write_file(&dir, "b.mkv", b"other version");

        let hash_a = fingerprint_with_sample_size(&a, TEST_SAMPLE).unwrap();
        let hash_b = fingerprint_with_sample_size(&b, TEST_SAMPLE).unwrap();
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn boundary_size_file_is_hashed_whole() {
        let dir = TempDir::new().unwrap();
        // Exactly 2x the sample size stays on the whole-file path, so a
        // middle-byte change must alter the fingerprint.
        let mut content = vec![7u8; (TEST_SAMPLE * 2) as usize];
        let a = write_file(&dir, "a.mkv", &content);
        content[(TEST_SAMPLE as usize) - 1] = 8;
        let b = write_file(&dir, "b.mkv", &content);

        let hash_a = fingerprint_with_sample_size(&a, TEST_SAMPLE).unwrap();
        let hash_b = fingerprint_with_sample_size(&b, TEST_SAMPLE).unwrap();
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn sampled_fingerprint_ignores_middle_bytes() {
        let dir = TempDir::new().unwrap();
        let mut content = vec![1u8; (TEST_SAMPLE * 4) as usize];
        let a = write_file(&dir, "a.mkv", &content);
        content[(TEST_SAMPLE * 2) as usize] = 99;
        let b = write_file(&dir, "b.mkv", &content);

        let hash_a = fingerprint_with_sample_size(&a, TEST_SAMPLE).unwrap();
        let hash_b = fingerprint_with_sample_size(&b, TEST_SAMPLE).unwrap();
        assert_eq!(hash_a, hash_b, "sampling reads only head, tail and size");
    }

    #[test]
    fn sampled_fingerprint_sees_head_and_tail_changes() {
        let dir = TempDir::new().unwrap();
        let base = vec![1u8; (TEST_SAMPLE * 4) as usize];

        let mut head_changed = base.clone();
        head_changed[0] = 2;
        let mut tail_changed = base.clone();
        *tail_changed.last_mut().unwrap() = 2;

        let a = write_file(&dir, "a.mkv", &base);
        let b = write_file(&dir, "b.mkv", &head_changed);
        let c = write_file(&dir, "c.mkv", &tail_changed);

        let hash_a = fingerprint_with_sample_size(&a, TEST_SAMPLE).unwrap();
        let hash_b = fingerprint_with_sample_size(&b, TEST_SAMPLE).unwrap();
        let hash_c = fingerprint_with_sample_size(&c, TEST_SAMPLE).unwrap();
        assert_ne!(hash_a, hash_b);
        assert_ne!(hash_a, hash_c);
    }

    #[test]
    fn size_disambiguates_shared_head_and_tail() {
        let dir = TempDir::new().unwrap();
        let head = vec![3u8; TEST_SAMPLE as usize];
        let tail = vec![4u8; TEST_SAMPLE as usize];

        let mut short = head.clone();
        short.extend(vec![0u8; TEST_SAMPLE as usize]);
        short.extend(&tail);

        let mut long = head;
        long.extend(vec![0u8; (TEST_SAMPLE * 2) as usize]);
        long.extend(&tail);

        let a = write_file(&dir, "a.mkv", &short);
        let b = write_file(&dir, "b.mkv", &long);

        let hash_a = fingerprint_with_sample_size(&a, TEST_SAMPLE).unwrap();
        let hash_b = fingerprint_with_sample_size(&b, TEST_SAMPLE).unwrap();
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn missing_file_reports_io_error_with_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.mkv");

        let err = fingerprint(&missing).unwrap_err();
        let HashError::Io { path, .. } = err;
        assert_eq!(path, missing);
    }

    #[test]
    fn display_renders_lower_hex() {
        let rendered = ContentHash(0xABCD).to_string();
        assert_eq!(rendered, "000000000000abcd");
    }
}
