use image::ImageReader;
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use log::debug;
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

/// An image that was opened and hashed successfully.
#[derive(Debug, Clone)]
pub struct HashedFile {
    pub path: PathBuf,
    pub hash: ImageHash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be opened or its format sniffed.
    Open,
    /// The file is not a decodable image.
    Decode,
    /// The hashing algorithm itself failed on the decoded image.
    HashPanicked,
}

#[derive(Debug, Clone)]
pub enum HashOutcome {
    Hashed(HashedFile),
    Skipped { path: PathBuf, reason: SkipReason },
}

impl HashOutcome {
    pub fn into_hashed(self) -> Option<HashedFile> {
        match self {
            HashOutcome::Hashed(file) => Some(file),
            HashOutcome::Skipped { .. } => None,
        }
    }
}

/// Average (mean) hash over an N×N grid, giving N² bits per image.
pub struct PerceptualHasher {
    hasher: Hasher,
}

impl PerceptualHasher {
    /// Returns `None` for a hash size of 0, which disables the duplicate search.
    pub fn new(hash_size: u32) -> Option<Self> {
        if hash_size == 0 {
            return None;
        }
        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Mean)
            .hash_size(hash_size, hash_size)
            .to_hasher();
        Some(Self { hasher })
    }

    /// Hash one file. Unreadable or corrupt images are reported as skipped, never as errors.
    pub fn hash_file(&self, path: &Path) -> HashOutcome {
        let skipped = |reason| HashOutcome::Skipped {
            path: path.to_path_buf(),
            reason,
        };

        let reader = match ImageReader::open(path).and_then(|r| r.with_guessed_format()) {
            Ok(reader) => reader,
            Err(e) => {
                debug!("Skipping {}: cannot open ({})", path.display(), e);
                return skipped(SkipReason::Open);
            }
        };

        let img = match reader.decode() {
            Ok(img) => img,
            Err(e) => {
                debug!("Skipping {}: cannot decode ({})", path.display(), e);
                return skipped(SkipReason::Decode);
            }
        };

        match catch_unwind(AssertUnwindSafe(|| self.hasher.hash_image(&img))) {
            Ok(hash) => HashOutcome::Hashed(HashedFile {
                path: path.to_path_buf(),
                hash,
            }),
            Err(_) => {
                debug!("Skipping {}: hashing failed", path.display());
                skipped(SkipReason::HashPanicked)
            }
        }
    }

    /// Hash many files in parallel. The output keeps the order of `paths`.
    pub fn hash_files<F>(&self, paths: &[PathBuf], on_progress: F) -> Vec<HashOutcome>
    where
        F: Fn() + Sync,
    {
        paths
            .par_iter()
            .map(|path| {
                let outcome = self.hash_file(path);
                on_progress();
                outcome
            })
            .collect()
    }
}

/// Drop the skipped outcomes, keeping input order.
pub fn hashed_files(outcomes: Vec<HashOutcome>) -> Vec<HashedFile> {
    outcomes
        .into_iter()
        .filter_map(HashOutcome::into_hashed)
        .collect()
}
