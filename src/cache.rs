//! Content-addressed persistence of solved radiosity systems.
//!
//! Building the coefficient tensor is by far the most expensive stage of a
//! run, so a solved system can be persisted and reused when the exact same
//! scene is processed again. Entries are keyed by a [`SceneKey`], a checksum
//! of everything the system depends on, and a cache is only ever consulted
//! through an explicit [`SystemCache`] handed to the caller.
//!
//! # Entry layout
//!
//! Each entry is a single `bincode` file named after its key,
//! `system-<faces>-<checksum>.bin`, holding:
//! - the key it was written for, with the scene data it checksums
//! - the flattened coefficient tensor `A` (`n * n * 3` values)
//! - the flattened emission matrix `E` (`n * 3` values)
//! - the flattened radiosity matrix `B`, once solved
//!
//! An entry whose stored key or array sizes do not match the requested key
//! is stale: it is removed and reported as a miss.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::config::{CACHE_ENTRY_EXTENSION, CACHE_ENTRY_PREFIX};
use crate::scene::Scene;
use crate::system::{LinearSystem, NUM_CHANNELS};


/// Identity of a scene as far as the radiosity system is concerned.
///
/// `num_faces` and `checksum` address the entry on disk. The full scene
/// data is kept as well, so that two scenes whose checksums collide are
/// still told apart when an entry is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneKey {
    pub num_faces: usize,
    pub checksum: u32,
    vertices: Vec<u64>, // bit patterns of every vertex position and color, in scene order
    luminous: Vec<usize>,
}

impl SceneKey {
    /// Checksums the face count, every vertex position and color in scene
    /// order, and the luminous index set.
    pub fn from_scene(scene: &Scene) -> Self {
        let vertices: Vec<u64> = scene
            .triangles
            .iter()
            .flat_map(|triangle| triangle.vertices.iter())
            .flat_map(|vertex| vertex.position.iter().chain(vertex.color.iter()))
            .map(|value| value.to_bits())
            .collect();
        let luminous: Vec<usize> = scene.luminous_indices().collect();

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&(scene.len() as u64).to_le_bytes());
        for bits in &vertices {
            hasher.update(&bits.to_le_bytes());
        }
        hasher.update(&(luminous.len() as u64).to_le_bytes());
        for index in &luminous {
            hasher.update(&(*index as u64).to_le_bytes());
        }

        Self {
            num_faces: scene.len(),
            checksum: hasher.finalize(),
            vertices,
            luminous,
        }
    }
}

/// A cached system and, if it was solved, its radiosity.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub system: LinearSystem,
    pub radiosity: Option<Array2<f64>>,
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: SceneKey,
    a: Vec<f64>,
    e: Vec<f64>,
    b: Option<Vec<f64>>,
}

impl StoredEntry {
    fn into_entry(self, key: &SceneKey) -> Option<CacheEntry> {
        let n = key.num_faces;
        if self.key != *key {
            return None;
        }

        let a = Array3::from_shape_vec((n, n, NUM_CHANNELS), self.a).ok()?;
        let e = Array2::from_shape_vec((n, NUM_CHANNELS), self.e).ok()?;
        let radiosity = match self.b {
            Some(b) => Some(Array2::from_shape_vec((n, NUM_CHANNELS), b).ok()?),
            None => None,
        };

        Some(CacheEntry {
            system: LinearSystem { a, e },
            radiosity,
        })
    }
}

/// On-disk store of solved systems, rooted at a caller-chosen directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemCache {
    dir: PathBuf,
}

impl SystemCache {
    /// Opens (creating if needed) a cache directory.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &SceneKey) -> PathBuf {
        self.dir.join(format!(
            "{}{}-{:08x}{}",
            CACHE_ENTRY_PREFIX, key.num_faces, key.checksum, CACHE_ENTRY_EXTENSION
        ))
    }

    /// Looks up the entry for `key`. Missing and stale entries are misses.
    pub fn load(&self, key: &SceneKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        if !path.exists() {
            debug!("cache miss for {}-{:08x}", key.num_faces, key.checksum);
            return Ok(None);
        }

        let file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
        let stored: Option<StoredEntry> = bincode::deserialize_from(BufReader::new(file)).ok();

        match stored.and_then(|stored| stored.into_entry(key)) {
            Some(entry) => {
                debug!("cache hit for {}-{:08x}", key.num_faces, key.checksum);
                Ok(Some(entry))
            }
            None => {
                warn!("discarding stale cache entry {:?}", path);
                self.invalidate(key)?;
                Ok(None)
            }
        }
    }

    /// Writes (or overwrites) the entry for `key`.
    pub fn store(
        &self,
        key: &SceneKey,
        system: &LinearSystem,
        radiosity: Option<&Array2<f64>>,
    ) -> Result<()> {
        let stored = StoredEntry {
            key: key.clone(),
            a: system.a.iter().copied().collect(),
            e: system.e.iter().copied().collect(),
            b: radiosity.map(|b| b.iter().copied().collect()),
        };

        let path = self.entry_path(key);
        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        bincode::serialize_into(BufWriter::new(file), &stored)
            .with_context(|| format!("Failed to write cache entry {:?}", path))?;

        debug!("stored cache entry {:?}", path);
        Ok(())
    }

    /// Removes the entry for `key`, if any.
    pub fn invalidate(&self, key: &SceneKey) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
        }
        Ok(())
    }

    /// Removes every entry in the cache directory.
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_entry = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.starts_with(CACHE_ENTRY_PREFIX) && name.ends_with(CACHE_ENTRY_EXTENSION)
                });
            if is_entry {
                fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            }
        }
        Ok(())
    }
}
