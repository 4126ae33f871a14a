//! Provenance hashing utilities (`spec.md` §6).

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

const HASH_PREFIX_LEN: usize = 16;
const STREAM_CHUNK_BYTES: usize = 8 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to read input file: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable hash of the canonically-serialized config (sorted keys), first 16
/// hex chars. `serde_json::Value`'s `Map` is a `BTreeMap` once parsed back
/// through `to_value`, which gives us deterministic key ordering regardless
/// of the input struct's field declaration order.
pub fn config_hash<T: Serialize>(config: &T) -> Result<String, HashError> {
    let value = serde_json::to_value(config)?;
    let canonical = serde_json::to_string(&sort_keys(value))?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(hex_prefix(&digest))
}

fn sort_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            serde_json::Value::Object(sorted.into_iter().collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sort_keys).collect())
        }
        other => other,
    }
}

/// `xxhash64` (XXH64) of the video file contents, streamed in 8 KiB reads,
/// first 16 hex chars. Consumers verify this before processing to detect
/// file drift; a mismatch fails the job before inference (`spec.md` §6).
pub fn input_hash(path: impl AsRef<Path>) -> Result<String, HashError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = xxhash_rust::xxh64::Xxh64::new(0);
    let mut buf = [0u8; STREAM_CHUNK_BYTES];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    let digest = hasher.digest();
    Ok(format!("{:016x}", digest)[..HASH_PREFIX_LEN].to_string())
}

fn hex_prefix(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
        .chars()
        .take(HASH_PREFIX_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::io::Write;

    #[derive(Serialize)]
    struct SampleConfig {
        b: u32,
        a: u32,
    }

    #[test]
    fn config_hash_is_stable_regardless_of_field_order() {
        #[derive(Serialize)]
        struct Reordered {
            a: u32,
            b: u32,
        }
        let h1 = config_hash(&SampleConfig { b: 2, a: 1 }).unwrap();
        let h2 = config_hash(&Reordered { a: 1, b: 2 }).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), HASH_PREFIX_LEN);
    }

    #[test]
    fn config_hash_changes_with_content() {
        let h1 = config_hash(&SampleConfig { a: 1, b: 2 }).unwrap();
        let h2 = config_hash(&SampleConfig { a: 1, b: 3 }).unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn input_hash_is_deterministic_and_detects_drift() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        let h1 = input_hash(file.path()).unwrap();
        let h2 = input_hash(file.path()).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), HASH_PREFIX_LEN);

        let mut file2 = tempfile::NamedTempFile::new().unwrap();
        file2.write_all(b"hello world!").unwrap();
        let h3 = input_hash(file2.path()).unwrap();
        assert_ne!(h1, h3);
    }

    #[test]
    fn input_hash_streams_across_multiple_chunks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let payload = vec![7u8; STREAM_CHUNK_BYTES * 3 + 17];
        file.write_all(&payload).unwrap();
        let hash = input_hash(file.path()).unwrap();
        assert_eq!(hash.len(), HASH_PREFIX_LEN);
    }
}
