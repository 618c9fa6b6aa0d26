//! Gaussian noise field shared by every cascade's spectrum generator.
//!
//! Generation is deterministic for a given seed. A generated field can be
//! stored in any [`BlobCache`] under `GaussianNoiseTexture{N}x{N}` so later
//! runs skip regeneration.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::error::CacheError;
use crate::grid::Grid;

/// Keyed byte-blob store with get-or-generate semantics left to the caller.
pub trait BlobCache: Send + Sync {
    /// Fetch a blob; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
}

/// One file per key inside a directory (`<dir>/<key>.bin`).
#[derive(Debug, Clone)]
pub struct DirectoryCache {
    dir: PathBuf,
}

impl DirectoryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.bin"))
    }
}

impl BlobCache for DirectoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), bytes)?;
        Ok(())
    }
}

/// In-process cache, mostly for tests and tools that build several oceans.
#[derive(Debug, Default)]
pub struct MemoryCache {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().contains_key(key)
    }
}

impl BlobCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.blobs.lock().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        self.blobs.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// N×N pairs of independent standard-normal samples
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianNoise {
    samples: Grid<[f32; 2]>,
}

impl GaussianNoise {
    /// Sample a new field from a seeded ChaCha stream
    pub fn generate(size: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let samples = Grid::from_fn(size, |_, _| {
            [rng.sample(StandardNormal), rng.sample(StandardNormal)]
        });
        Self { samples }
    }

    /// Cache key for a field of the given size
    pub fn cache_key(size: usize) -> String {
        format!("GaussianNoiseTexture{size}x{size}")
    }

    /// Load the field for `size` from `cache`, or generate and store it.
    ///
    /// Unreadable or wrong-sized blobs are regenerated; failing to store the
    /// fresh field only costs regeneration next time.
    pub fn load_or_generate(cache: &dyn BlobCache, size: usize, seed: u64) -> Self {
        let key = Self::cache_key(size);
        match cache.get(&key) {
            Ok(Some(bytes)) => match Self::from_bytes(size, &bytes) {
                Some(noise) => {
                    log::debug!("Loaded noise field {key} from cache");
                    return noise;
                }
                None => log::warn!(
                    "Cached noise field {key} is unusable ({} bytes, expected {}); regenerating",
                    bytes.len(),
                    size * size * std::mem::size_of::<[f32; 2]>()
                ),
            },
            Ok(None) => log::info!("Noise field {key} not cached, generating"),
            Err(e) => log::warn!("Failed to read noise cache for {key}: {e}"),
        }

        let noise = Self::generate(size, seed);
        if let Err(e) = cache.put(&key, &noise.to_bytes()) {
            log::warn!("Failed to store noise field {key}: {e}");
        }
        noise
    }

    /// Decode a blob of native-endian f32 pairs
    pub fn from_bytes(size: usize, bytes: &[u8]) -> Option<Self> {
        let texel = std::mem::size_of::<[f32; 2]>();
        if bytes.len() != size * size * texel {
            return None;
        }
        // The blob may not be 4-byte aligned, so copy texel by texel
        let samples: Vec<[f32; 2]> = bytes
            .chunks_exact(texel)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        let samples = Grid::from_vec(size, samples)?;
        samples
            .iter()
            .all(|s| s[0].is_finite() && s[1].is_finite())
            .then_some(Self { samples })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(self.samples.as_slice()).to_vec()
    }

    pub fn size(&self) -> usize {
        self.samples.size()
    }

    /// Noise pair at texel (x, y)
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [f32; 2] {
        *self.samples.get(x, y)
    }

    pub fn samples(&self) -> &Grid<[f32; 2]> {
        &self.samples
    }
}
