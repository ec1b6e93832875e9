//! Per-file manifest and content-hash change detection

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::loader;

/// Bookkeeping for one indexed source file.
///
/// `[chunk_start, chunk_end)` is this file's half-open slice of the global
/// chunk sequence; ranges across all entries partition `[0, total_chunks)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub hash: String,
    pub chunk_start: usize,
    pub chunk_end: usize,
}

/// filename -> entry. BTreeMap keeps iteration (and the persisted JSON)
/// in a stable order.
pub type Manifest = BTreeMap<String, ManifestEntry>;

/// Files classified by comparing on-disk hashes against a manifest.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileDiff {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl FileDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.changed.len() + self.removed.len()
    }
}

/// Streaming SHA-256 over the full file bytes; any byte difference is
/// detected.
pub fn hash_file(path: &Path) -> anyhow::Result<String> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash every supported file in a docs directory, keyed by file name.
pub fn compute_file_hashes(docs_dir: &Path) -> anyhow::Result<BTreeMap<String, String>> {
    let mut hashes = BTreeMap::new();

    for path in loader::discover_files(docs_dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        hashes.insert(name, hash_file(&path)?);
    }

    Ok(hashes)
}

/// Classify current files against the manifest: added (new on disk),
/// removed (gone from disk), changed (present in both, hash differs).
/// Output lists are sorted by file name.
pub fn diff(manifest: &Manifest, current: &BTreeMap<String, String>) -> FileDiff {
    let mut out = FileDiff::default();

    for (name, hash) in current {
        match manifest.get(name) {
            None => out.added.push(name.clone()),
            Some(entry) if entry.hash != *hash => out.changed.push(name.clone()),
            Some(_) => {}
        }
    }

    for name in manifest.keys() {
        if !current.contains_key(name) {
            out.removed.push(name.clone());
        }
    }

    out
}
