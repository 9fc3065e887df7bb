use crate::comparators;
use crate::file::{SourceFile, DEV_NULL};
use nestdiff_common::{Config, Difference, Result};
use similar::TextDiff;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Compression suffixes stripped when matching members by base stem.
const COMPRESSED_SUFFIXES: &[&str] = &[".gz", ".xz", ".bz2"];

/// A file whose content is a named collection of other files.
///
/// Member enumeration is captured once when the container opens, so it is
/// stable for the open scope; extraction writes only inside the
/// container's own temp dir.
pub trait Container {
    /// Ordered member names, archive-relative.
    fn member_names(&self) -> &[String];

    /// Materialize one member. Idempotent.
    fn member(&self, name: &str) -> Result<SourceFile>;
}

/// Stand-in for the missing side when one input does not exist at all:
/// no members, and any requested member is the sentinel.
pub struct EmptyContainer;

impl Container for EmptyContainer {
    fn member_names(&self) -> &[String] {
        &[]
    }

    fn member(&self, _name: &str) -> Result<SourceFile> {
        Ok(SourceFile::non_existing(DEV_NULL))
    }
}

/// Member name minus one known compression suffix.
fn base_stem(name: &str) -> &str {
    for suffix in COMPRESSED_SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem;
        }
    }
    name
}

/// The synthetic member name of a single-stream archive: the basename
/// with the compression suffix stripped, or `<basename>-content` when
/// the suffix is not there to strip.
pub(crate) fn compressed_content_name(name: &str, suffix: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.strip_suffix(suffix) {
        Some(stem) => stem.to_string(),
        None => format!("{base}-content"),
    }
}

/// Resolve an archive-relative member name to a safe path under `root`,
/// dropping rooted and parent components.
pub(crate) fn member_dest(root: &Path, name: &str) -> PathBuf {
    let mut dest = root.to_path_buf();
    for component in Path::new(name).components() {
        if let Component::Normal(part) = component {
            dest.push(part);
        }
    }
    dest
}

/// Deterministically match member names across two containers.
///
/// `names1` drives in its original order: exact name match first, then a
/// unique base-stem match, then (when enabled) the closest fuzzy
/// candidate, else the sentinel. Unclaimed `names2` members trail with
/// the sentinel on the left. No member is paired twice.
pub fn pair_names(
    names1: &[String],
    names2: &[String],
    fuzzy_threshold: f32,
) -> Vec<(Option<String>, Option<String>)> {
    let mut used = vec![false; names2.len()];
    let mut pairs = Vec::with_capacity(names1.len().max(names2.len()));

    for name1 in names1 {
        let partner = find_partner(name1, names2, &used, fuzzy_threshold);
        match partner {
            Some(idx) => {
                used[idx] = true;
                pairs.push((Some(name1.clone()), Some(names2[idx].clone())));
            }
            None => pairs.push((Some(name1.clone()), None)),
        }
    }

    for (idx, name2) in names2.iter().enumerate() {
        if !used[idx] {
            pairs.push((None, Some(name2.clone())));
        }
    }

    pairs
}

fn find_partner(
    name1: &str,
    names2: &[String],
    used: &[bool],
    fuzzy_threshold: f32,
) -> Option<usize> {
    if let Some((idx, _)) = names2
        .iter()
        .enumerate()
        .find(|(idx, name2)| !used[*idx] && name2.as_str() == name1)
    {
        return Some(idx);
    }

    let stem1 = base_stem(name1);
    let stem_matches: Vec<usize> = names2
        .iter()
        .enumerate()
        .filter(|(idx, name2)| !used[*idx] && base_stem(name2.as_str()) == stem1)
        .map(|(idx, _)| idx)
        .collect();
    if stem_matches.len() == 1 {
        return Some(stem_matches[0]);
    }

    if fuzzy_threshold > 0.0 {
        let mut best: Option<(usize, f32)> = None;
        for (idx, name2) in names2.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let ratio = TextDiff::from_chars(name1, name2.as_str()).ratio();
            if ratio >= fuzzy_threshold && best.map_or(true, |(_, b)| ratio > b) {
                best = Some((idx, ratio));
            }
        }
        if let Some((idx, ratio)) = best {
            debug!("fuzzy-paired {} with {} (ratio {:.2})", name1, names2[idx], ratio);
            return Some(idx);
        }
    }

    None
}

/// Walk two containers member-by-member, recursing into `compare` for
/// each pair and collecting non-empty differences in traversal order.
pub fn compare_containers(
    container1: &dyn Container,
    container2: &dyn Container,
    config: &Config,
) -> Result<Vec<Difference>> {
    let names1 = container1.member_names();
    let names2 = container2.member_names();
    let pairs = pair_names(names1, names2, config.fuzzy_threshold);

    let mut details = Vec::new();
    for (name1, name2) in &pairs {
        let asymmetric = name1.is_none() || name2.is_none();

        let file1 = match name1 {
            Some(name) => match container1.member(name) {
                Ok(file) => file,
                Err(e) => {
                    warn!("failed to extract {}: {}", name, e);
                    details.push(error_node(name, name2.as_deref().unwrap_or(DEV_NULL), &e));
                    continue;
                }
            },
            None => SourceFile::non_existing(DEV_NULL),
        };
        let file2 = match name2 {
            Some(name) => match container2.member(name) {
                Ok(file) => file,
                Err(e) => {
                    warn!("failed to extract {}: {}", name, e);
                    details.push(error_node(name1.as_deref().unwrap_or(DEV_NULL), name, &e));
                    continue;
                }
            },
            None => SourceFile::non_existing(DEV_NULL),
        };

        match comparators::compare(&file1, &file2, None, config) {
            Ok(Some(mut difference)) => {
                if asymmetric && !config.new_file {
                    difference.comment = Some(missing_comment(name1.is_some()));
                }
                details.push(difference);
            }
            Ok(None) => {
                // An empty member against the sentinel diffs to nothing,
                // but the asymmetry itself must still surface unless the
                // new-file policy allows it.
                if asymmetric && !config.new_file {
                    details.push(
                        Difference::new(file1.name(), file2.name())
                            .with_comment(missing_comment(name1.is_some())),
                    );
                }
            }
            Err(e) => {
                details.push(error_node(file1.name(), file2.name(), &e));
            }
        }
    }

    Ok(details)
}

fn missing_comment(present_in_first: bool) -> String {
    if present_in_first {
        "member is absent from the second archive".to_string()
    } else {
        "member is absent from the first archive".to_string()
    }
}

fn error_node(
    source1: &str,
    source2: &str,
    error: &nestdiff_common::NestdiffError,
) -> Difference {
    Difference::new(source1, source2).with_comment(format!("error: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_pairing() {
        let pairs = pair_names(&names(&["a", "b"]), &names(&["b", "a"]), 0.0);
        assert_eq!(
            pairs,
            vec![
                (Some("a".into()), Some("a".into())),
                (Some("b".into()), Some("b".into())),
            ]
        );
    }

    #[test]
    fn test_stem_pairing_strips_compression_suffix() {
        let pairs = pair_names(&names(&["data.gz"]), &names(&["data.xz"]), 0.0);
        assert_eq!(pairs, vec![(Some("data.gz".into()), Some("data.xz".into()))]);
    }

    #[test]
    fn test_ambiguous_stem_is_not_paired() {
        let pairs = pair_names(&names(&["data.gz"]), &names(&["data.xz", "data.bz2"]), 0.0);
        assert_eq!(
            pairs,
            vec![
                (Some("data.gz".into()), None),
                (None, Some("data.xz".into())),
                (None, Some("data.bz2".into())),
            ]
        );
    }

    #[test]
    fn test_asymmetric_members_pair_with_sentinel() {
        let pairs = pair_names(&names(&["only1"]), &names(&["only2"]), 0.0);
        assert_eq!(
            pairs,
            vec![
                (Some("only1".into()), None),
                (None, Some("only2".into())),
            ]
        );
    }

    #[test]
    fn test_fuzzy_pairing_picks_closest() {
        let pairs = pair_names(
            &names(&["libfoo-1.2.so"]),
            &names(&["libfoo-1.3.so", "libbar-9.9.so"]),
            0.7,
        );
        assert_eq!(
            pairs[0],
            (Some("libfoo-1.2.so".into()), Some("libfoo-1.3.so".into()))
        );
    }

    #[test]
    fn test_fuzzy_disabled_by_default() {
        let pairs = pair_names(&names(&["libfoo-1.2.so"]), &names(&["libfoo-1.3.so"]), 0.0);
        // same stem (no compression suffix involved) fails exact and stem
        // matching is on full names here
        assert_eq!(
            pairs,
            vec![
                (Some("libfoo-1.2.so".into()), None),
                (None, Some("libfoo-1.3.so".into())),
            ]
        );
    }

    #[test]
    fn test_pairing_is_deterministic_and_never_reuses_members() {
        let left = names(&["a", "a.gz", "b"]);
        let right = names(&["a", "a.xz", "c"]);
        let first = pair_names(&left, &right, 0.0);
        let second = pair_names(&left, &right, 0.0);
        assert_eq!(first, second);

        let mut seen2 = Vec::new();
        for (_, name2) in &first {
            if let Some(name2) = name2 {
                assert!(!seen2.contains(name2));
                seen2.push(name2.clone());
            }
        }
    }

    #[test]
    fn test_pairing_is_idempotent() {
        let left = names(&["x", "y.gz"]);
        let right = names(&["y.xz", "z"]);
        let pairs = pair_names(&left, &right, 0.0);

        let left2: Vec<String> = pairs.iter().filter_map(|(a, _)| a.clone()).collect();
        let right2: Vec<String> = pairs.iter().filter_map(|(_, b)| b.clone()).collect();
        assert_eq!(pair_names(&left2, &right2, 0.0), pairs);
    }

    #[test]
    fn test_compressed_content_name() {
        assert_eq!(compressed_content_name("dir/test1.gz", ".gz"), "test1");
        assert_eq!(compressed_content_name("test1", ".gz"), "test1-content");
    }

    #[test]
    fn test_member_dest_sanitizes_traversal() {
        let root = Path::new("/tmp/scope");
        assert_eq!(
            member_dest(root, "../../etc/passwd"),
            root.join("etc").join("passwd")
        );
        assert_eq!(
            member_dest(root, "/abs/name"),
            root.join("abs").join("name")
        );
        assert_eq!(member_dest(root, "dir/file"), root.join("dir").join("file"));
    }
}
