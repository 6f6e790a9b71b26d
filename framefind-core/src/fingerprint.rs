//! Perceptual fingerprint computation for video frames and query images.
//!
//! A fingerprint is a fixed 64-bit binary summary of an image's visual
//! content, robust to re-encoding, resizing, and minor color variance.
//! Frames hashed at ingestion time and images hashed at query time go
//! through the exact same normalization pipeline, so identical logical
//! frames yield bit-identical fingerprints.
//!
//! Three independent hash families are supported. Distances are only
//! meaningful within a single family; the store records which family it
//! was built with and refuses to mix them.

use std::fmt;
use std::str::FromStr;

use image::imageops::FilterType;
use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};

use crate::error::{FramefindError, Result};

/// Fingerprint width in bytes (64 bits).
pub const FINGERPRINT_BYTES: usize = 8;

/// Fingerprint width in bits.
pub const FINGERPRINT_BITS: u32 = (FINGERPRINT_BYTES * 8) as u32;

/// Edge length of the normalized image fed to the hash, in pixels.
const NORMALIZED_DIM: u32 = 64;

/// Hash grid dimensions; 8x8 cells produce exactly 64 bits.
const HASH_GRID: u32 = 8;

/// Perceptual hash family selection.
///
/// `Dct` (frequency-domain) is the recommended default; `Gradient` and
/// `Mean` are kept as independent families for corpora built with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFamily {
    /// DCT-preprocessed hash: threshold low-frequency coefficients.
    #[default]
    Dct,
    /// Gradient hash: threshold adjacent-pixel differences.
    Gradient,
    /// Mean hash: threshold each cell against the global mean.
    Mean,
}

impl HashFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashFamily::Dct => "dct",
            HashFamily::Gradient => "gradient",
            HashFamily::Mean => "mean",
        }
    }
}

impl fmt::Display for HashFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dct" => Ok(HashFamily::Dct),
            "gradient" => Ok(HashFamily::Gradient),
            "mean" => Ok(HashFamily::Mean),
            other => Err(format!(
                "unknown hash family '{}' (expected dct, gradient, or mean)",
                other
            )),
        }
    }
}

/// Immutable 64-bit perceptual fingerprint, packed into 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_BYTES]);

impl Fingerprint {
    pub fn from_bytes(bytes: [u8; FINGERPRINT_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_BYTES] {
        &self.0
    }

    /// The fingerprint as a single 64-bit word (big-endian byte order).
    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    pub fn from_u64(word: u64) -> Self {
        Self(word.to_be_bytes())
    }

    /// Count of differing bits between two fingerprints of the same family.
    pub fn hamming_distance(&self, other: &Fingerprint) -> u32 {
        (self.as_u64() ^ other.as_u64()).count_ones()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Similarity percentage for a Hamming distance: 100 means identical,
/// 0 means every bit differs.
pub fn similarity(distance: u32) -> f64 {
    100.0 * f64::from(FINGERPRINT_BITS.saturating_sub(distance)) / f64::from(FINGERPRINT_BITS)
}

/// Deterministic image-to-fingerprint encoder for one hash family.
///
/// Construction is cheap; ingestion workers build their own codec rather
/// than sharing one across threads.
pub struct FingerprintCodec {
    family: HashFamily,
    hasher: Hasher,
}

impl FingerprintCodec {
    pub fn new(family: HashFamily) -> Self {
        let config = HasherConfig::new().hash_size(HASH_GRID, HASH_GRID);
        let config = match family {
            HashFamily::Dct => config.hash_alg(HashAlg::Mean).preproc_dct(),
            HashFamily::Gradient => config.hash_alg(HashAlg::Gradient),
            HashFamily::Mean => config.hash_alg(HashAlg::Mean),
        };
        Self {
            family,
            hasher: config.to_hasher(),
        }
    }

    pub fn family(&self) -> HashFamily {
        self.family
    }

    /// Encode a decoded raster image into a fingerprint. Total: any
    /// decodable image produces exactly 64 bits.
    pub fn encode(&self, image: &DynamicImage) -> Fingerprint {
        let normalized = normalize(image);
        let hash = self.hasher.hash_image(&normalized);
        let bytes = hash.as_bytes();
        debug_assert_eq!(bytes.len(), FINGERPRINT_BYTES);
        let mut packed = [0u8; FINGERPRINT_BYTES];
        packed.copy_from_slice(bytes);
        Fingerprint(packed)
    }

    /// Decode raw image bytes (JPEG, PNG, GIF, WebP) and encode them.
    pub fn encode_bytes(&self, image_data: &[u8]) -> Result<Fingerprint> {
        let image = image::load_from_memory(image_data)
            .map_err(|e| FramefindError::Decode(e.to_string()))?;
        Ok(self.encode(&image))
    }
}

/// Shared normalization for ingestion and query paths: resize to a fixed
/// square, then reduce to luma. The order matters; changing it would make
/// stored and query fingerprints incomparable.
fn normalize(image: &DynamicImage) -> DynamicImage {
    let resized = image.resize_exact(NORMALIZED_DIM, NORMALIZED_DIM, FilterType::Triangle);
    DynamicImage::ImageLuma8(resized.to_luma8())
}
