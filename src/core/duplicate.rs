// Similarity grouping over perceptual hashes.
//
// Every unordered pair of hashed files is compared once. Each file seeds a
// candidate group with all later files it is similar to; candidates whose
// member set is already covered by an accepted group are dropped.

use crate::core::perceptual::HashedFile;
use log::debug;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    /// Seed file first, then its matches in input order. Always at least two entries.
    pub files: Vec<PathBuf>,
    /// Percentage of differing bits for the last matching pair seen for the seed.
    ///
    /// This is not the best match of the group: a later, weaker pair overwrites
    /// an earlier, stronger one. Kept as-is so reports stay comparable between runs.
    pub score: f64,
}

impl DuplicateGroup {
    /// Similarity shown to the user, in percent.
    pub fn similarity_percent(&self) -> f64 {
        round2(100.0 - self.score)
    }

    fn member_set(&self) -> HashSet<&Path> {
        self.files.iter().map(PathBuf::as_path).collect()
    }
}

/// Maximum bit difference (exclusive) for two hashes of `hash_size`² bits to count as similar.
pub fn diff_limit(hash_size: u32, similarity: u8) -> u32 {
    let bits = f64::from(hash_size).powi(2);
    let threshold = 1.0 - f64::from(similarity.min(100)) / 100.0;
    (threshold * bits).floor() as u32
}

/// Differing bits as a percentage of the hash length, rounded to 2 decimals.
pub fn similarity_score(distance: u32, hash_size: u32) -> f64 {
    let bits = f64::from(hash_size).powi(2);
    round2(100.0 * (f64::from(distance) / bits))
}

/// Two hashes match when their difference is under the limit. Bit-identical
/// hashes always match, so a similarity of 100 still finds exact copies.
pub fn is_similar(distance: u32, limit: u32) -> bool {
    distance < limit || distance == 0
}

/// Group the files whose hashes are within `similarity` percent of each other.
///
/// Groups are returned in the order they were accepted. Zero or one file yields no groups.
pub fn find_similar_groups(
    files: &[HashedFile],
    hash_size: u32,
    similarity: u8,
) -> Vec<DuplicateGroup> {
    let limit = diff_limit(hash_size, similarity);
    debug!(
        "Grouping {} hashes (hash size {}, similarity {}%, diff limit {})",
        files.len(),
        hash_size,
        similarity,
        limit
    );

    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for (i, seed) in files.iter().enumerate() {
        let mut members: Vec<PathBuf> = Vec::new();
        let mut score = 0.0;

        for other in &files[i..] {
            if seed.path == other.path {
                continue;
            }
            let distance = seed.hash.dist(&other.hash);
            if is_similar(distance, limit) {
                if members.is_empty() {
                    members.push(seed.path.clone());
                }
                members.push(other.path.clone());
                score = similarity_score(distance, hash_size);
            }
        }

        if members.len() < 2 {
            continue;
        }

        let candidate = DuplicateGroup {
            files: members,
            score,
        };
        let candidate_set = candidate.member_set();
        let already_found = groups
            .iter()
            .any(|group| candidate_set.is_subset(&group.member_set()));

        if already_found {
            debug!(
                "Dropping group seeded by {}: covered by an earlier group",
                seed.path.display()
            );
            continue;
        }
        groups.push(candidate);
    }

    groups
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_hasher::ImageHash;

    fn file(name: &str, bits: u64) -> HashedFile {
        HashedFile {
            path: PathBuf::from(format!("/photos/{}", name)),
            hash: ImageHash::from_bytes(&bits.to_be_bytes()).unwrap(),
        }
    }

    fn member_names(groups: &[DuplicateGroup]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|g| {
                g.files
                    .iter()
                    .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_diff_limit_values() {
        assert_eq!(diff_limit(16, 96), 10);
        assert_eq!(diff_limit(8, 100), 0);
        assert_eq!(diff_limit(8, 0), 64);
        assert_eq!(diff_limit(8, 90), 6);
    }

    #[test]
    fn test_diff_limit_is_monotonic_in_similarity() {
        for hash_size in 1..=32 {
            let mut previous = diff_limit(hash_size, 0);
            for similarity in 1..=100 {
                let limit = diff_limit(hash_size, similarity);
                assert!(limit <= previous, "N={} S={}", hash_size, similarity);
                previous = limit;
            }
        }
    }

    #[test]
    fn test_no_files_no_groups() {
        assert!(find_similar_groups(&[], 8, 90).is_empty());
        assert!(find_similar_groups(&[file("a.jpg", 0)], 8, 0).is_empty());
    }

    #[test]
    fn test_full_similarity_only_matches_identical_hashes() {
        let files = vec![
            file("a.jpg", 0b1011),
            file("b.jpg", 0b1010),
            file("c.jpg", 0xF0F0_0000_0000_0000),
        ];
        assert!(find_similar_groups(&files, 8, 100).is_empty());

        let files = vec![
            file("a.jpg", 0b1011),
            file("b.jpg", 0b1011),
            file("c.jpg", 0xF0F0_0000_0000_0000),
        ];
        let groups = find_similar_groups(&files, 8, 100);
        assert_eq!(member_names(&groups), vec![vec!["a.jpg", "b.jpg"]]);
        assert_eq!(groups[0].score, 0.0);
        assert_eq!(groups[0].similarity_percent(), 100.0);
    }

    #[test]
    fn test_same_path_is_never_compared_with_itself() {
        let files = vec![file("a.jpg", 7), file("a.jpg", 7)];
        assert!(find_similar_groups(&files, 8, 90).is_empty());
    }

    #[test]
    fn test_subset_groups_are_dropped() {
        // a, b and c are all within 2 bits of each other.
        let files = vec![file("a.jpg", 0b000), file("b.jpg", 0b001), file("c.jpg", 0b011)];
        let groups = find_similar_groups(&files, 8, 90);

        assert_eq!(member_names(&groups), vec![vec!["a.jpg", "b.jpg", "c.jpg"]]);
    }

    #[test]
    fn test_chain_produces_overlapping_groups() {
        // a~b and b~c, but a and c are 8 bits apart.
        let files = vec![
            file("a.jpg", 0x00),
            file("b.jpg", 0x0F),
            file("c.jpg", 0xFF),
        ];
        let groups = find_similar_groups(&files, 8, 90);

        assert_eq!(
            member_names(&groups),
            vec![vec!["a.jpg", "b.jpg"], vec!["b.jpg", "c.jpg"]]
        );
        for (i, group) in groups.iter().enumerate() {
            for (j, other) in groups.iter().enumerate() {
                if i != j {
                    assert!(!group.member_set().is_subset(&other.member_set()));
                }
            }
        }
    }

    #[test]
    fn test_score_comes_from_last_matching_pair() {
        // b differs from a by 1 bit, c by 4 bits: the weaker match is reported.
        let files = vec![file("a.jpg", 0x00), file("b.jpg", 0x01), file("c.jpg", 0x0F)];
        let groups = find_similar_groups(&files, 8, 90);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].score, similarity_score(4, 8));
        assert_eq!(groups[0].score, 6.25);
        assert_eq!(groups[0].similarity_percent(), 93.75);
    }

    #[test]
    fn test_grouped_files_do_not_depend_on_order() {
        let files = vec![
            file("a.jpg", 0x00),
            file("b.jpg", 0x0F),
            file("c.jpg", 0xFF),
            file("d.jpg", 0xFFFF_0000_0000_0000),
            file("e.jpg", 0xFFFF_0000_0000_0001),
            file("f.jpg", 0x0F0F_0F0F_0000_0000),
        ];

        let grouped = |files: &[HashedFile]| -> HashSet<PathBuf> {
            find_similar_groups(files, 8, 90)
                .into_iter()
                .flat_map(|g| g.files)
                .collect()
        };

        let forward = grouped(&files);
        let mut reversed = files.clone();
        reversed.reverse();
        let mut rotated = files.clone();
        rotated.rotate_left(2);

        assert_eq!(forward.len(), 5);
        assert_eq!(forward, grouped(&reversed));
        assert_eq!(forward, grouped(&rotated));
    }
}
