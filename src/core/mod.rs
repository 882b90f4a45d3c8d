// Near-duplicate detection and removal for a media collection:
// - scanning and extension filtering
// - perceptual hashing and similarity grouping
// - interactive resolution of each group and deletion of the redundant files

pub mod config;
pub mod deletion;
pub mod duplicate;
pub mod exif;
pub mod perceptual;
pub mod prompt;
pub mod remover;
pub mod resolver;
pub mod scanner;

#[cfg(test)]
pub(crate) mod testing;
