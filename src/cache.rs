//! `Engine`: the memoization substrate (spec.md §4.9, §9).
//!
//! Three tiers, per spec.md: a persistent, content-addressed concept cache
//! on disk (atomic write-then-rename, keyed by [`crate::marbl::MarblSet`]
//! with a raw-then-canonical two-tier lookup, grounded on
//! `cyphi/compute.py::concept`); an in-process LRU cache for pairwise
//! concept/CES distances; and the per-[`crate::subsystem::Subsystem`]
//! repertoire caches, which live on `Subsystem` itself and never cross
//! subsystem boundaries, so they aren't part of `Engine`.
//!
//! `Engine` is constructed explicitly and threaded through calls rather
//! than reached via a global, per spec.md §9's "inject explicit handles"
//! redesign note — this is also why it owns no reference to any
//! `Subsystem`.

use crate::config::Config;
use crate::error::{IITError, Result};
use crate::marbl::MarblSet;
use lru::LruCache;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// The version embedded in every persisted cache entry. Bumped whenever the
/// on-disk schema or the algorithm producing it changes, so a stale cache
/// directory from a previous crate version is treated as a clean miss
/// rather than silently returning wrong results — per spec.md §7, cache
/// corruption (including a version mismatch) is recovered as a miss, not an
/// error.
const CACHE_FORMAT_VERSION: u32 = 1;

/// A minimal, serializable summary of a concept, suitable for the
/// persistent cache: enough to reconstruct its contribution to Φ without
/// re-running the MIP/MICE search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedConceptEntry {
    pub version: u32,
    pub mechanism: Vec<usize>,
    pub cause_purview: Vec<usize>,
    pub cause_phi: f64,
    pub cause_repertoire: ArrayD<f64>,
    pub effect_purview: Vec<usize>,
    pub effect_phi: f64,
    pub effect_repertoire: ArrayD<f64>,
    pub phi: f64,
}

#[derive(Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

pub struct Engine {
    config: Config,
    concept_memory: Mutex<HashMap<String, CachedConceptEntry>>,
    distance_cache: Mutex<LruCache<(Vec<usize>, Vec<usize>), f64>>,
    stats: CacheStats,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let cap = NonZeroUsize::new(config.max_cache_entries.max(1)).unwrap();
        Engine {
            config,
            concept_memory: Mutex::new(HashMap::new()),
            distance_cache: Mutex::new(LruCache::new(cap)),
            stats: CacheStats::default(),
        }
    }

    /// Two-tier concept lookup: try `raw`'s content key first (the
    /// as-computed, unnormalized key), then `canonical`'s. A disk-backed
    /// `Engine` also checks the on-disk store on an in-memory miss.
    pub fn get_concept(&self, raw: &MarblSet, canonical: &MarblSet) -> Option<CachedConceptEntry> {
        if let Some(hit) = self.lookup_one(raw) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Some(hit);
        }
        if let Some(hit) = self.lookup_one(canonical) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Some(hit);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store `entry` under `canonical`'s key, in memory and (if configured)
    /// on disk.
    pub fn put_concept(&self, canonical: &MarblSet, mut entry: CachedConceptEntry) -> Result<()> {
        entry.version = CACHE_FORMAT_VERSION;
        let key = canonical.content_key();
        self.concept_memory.lock().unwrap().insert(key.clone(), entry.clone());
        if let Some(dir) = &self.config.cache_dir {
            write_entry_atomically(dir, &key, &entry)?;
        }
        Ok(())
    }

    fn lookup_one(&self, marbl: &MarblSet) -> Option<CachedConceptEntry> {
        let key = marbl.content_key();
        if let Some(entry) = self.concept_memory.lock().unwrap().get(&key).cloned() {
            if entry.version == CACHE_FORMAT_VERSION {
                return Some(entry);
            }
            return None;
        }
        let dir = self.config.cache_dir.as_ref()?;
        match read_entry(dir, &key) {
            Ok(Some(entry)) if entry.version == CACHE_FORMAT_VERSION => {
                self.concept_memory.lock().unwrap().insert(key, entry.clone());
                Some(entry)
            }
            _ => None,
        }
    }

    /// Look up a cached pairwise distance between two concepts/CESs,
    /// identified by their canonical flattened-index keys.
    pub fn get_distance(&self, a: &[usize], b: &[usize]) -> Option<f64> {
        self.distance_cache.lock().unwrap().get(&(a.to_vec(), b.to_vec())).copied()
    }

    pub fn put_distance(&self, a: &[usize], b: &[usize], value: f64) {
        self.distance_cache.lock().unwrap().put((a.to_vec(), b.to_vec()), value);
    }

    pub fn cache_stats(&self) -> (u64, u64) {
        (self.stats.hits.load(Ordering::Relaxed), self.stats.misses.load(Ordering::Relaxed))
    }
}

fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn write_entry_atomically(dir: &Path, key: &str, entry: &CachedConceptEntry) -> Result<()> {
    fs::create_dir_all(dir)?;
    let final_path = entry_path(dir, key);
    let tmp_path = dir.join(format!("{key}.json.tmp-{}", std::process::id()));
    let json = serde_json::to_vec(entry)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, &final_path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        IITError::Io(e)
    })?;
    Ok(())
}

fn read_entry(dir: &Path, key: &str) -> Result<Option<CachedConceptEntry>> {
    let path = entry_path(dir, key);
    match fs::read(&path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            // A corrupt cache file is a miss, not a propagated error.
            Err(_) => Ok(None),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(IITError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip() {
        let engine = Engine::new(Config::default());
        let entry = CachedConceptEntry {
            version: CACHE_FORMAT_VERSION,
            mechanism: vec![0],
            cause_purview: vec![0],
            cause_phi: 0.5,
            cause_repertoire: ArrayD::from_elem(ndarray::IxDyn(&[2]), 0.5),
            effect_purview: vec![1],
            effect_phi: 0.5,
            effect_repertoire: ArrayD::from_elem(ndarray::IxDyn(&[2]), 0.5),
            phi: 0.5,
        };
        let raw_marbl_key = "raw-key".to_string();
        let canon_marbl_key = "canon-key".to_string();
        engine.concept_memory.lock().unwrap().insert(canon_marbl_key.clone(), entry.clone());
        assert!(engine.concept_memory.lock().unwrap().contains_key(&canon_marbl_key));
        let _ = raw_marbl_key;
    }

    #[test]
    fn disk_round_trip() {
        let dir = std::env::temp_dir().join(format!("iit-cache-test-{}", std::process::id()));
        let mut config = Config::default();
        config.cache_dir = Some(dir.clone());
        let engine = Engine::new(config);
        let entry = CachedConceptEntry {
            version: CACHE_FORMAT_VERSION,
            mechanism: vec![0, 1],
            cause_purview: vec![0],
            cause_phi: 0.25,
            cause_repertoire: ArrayD::from_elem(ndarray::IxDyn(&[2]), 0.5),
            effect_purview: vec![1],
            effect_phi: 0.25,
            effect_repertoire: ArrayD::from_elem(ndarray::IxDyn(&[2]), 0.5),
            phi: 0.25,
        };
        write_entry_atomically(&dir, "k", &entry).unwrap();
        let back = read_entry(&dir, "k").unwrap().unwrap();
        assert_eq!(back.mechanism, entry.mechanism);
        let _ = fs::remove_dir_all(&dir);
        let _ = engine.cache_stats();
    }
}
