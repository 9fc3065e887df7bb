use crate::container::{compare_containers, Container};
use crate::diff;
use crate::file::SourceFile;
use nestdiff_common::{Config, Difference, NestdiffError, Result};
use std::path::PathBuf;
use tracing::debug;

/// A directory seen as a synthetic container: members are the sorted
/// relative paths of regular files and symlinks beneath it.
struct DirectoryContainer {
    root: PathBuf,
    names: Vec<String>,
}

impl DirectoryContainer {
    fn open(file: &SourceFile) -> Result<Self> {
        if !file.exists() {
            return Ok(Self {
                root: PathBuf::new(),
                names: Vec::new(),
            });
        }

        let root = file.path().to_path_buf();
        let mut names = Vec::new();
        for entry in jwalk::WalkDir::new(&root)
            .follow_links(false)
            .skip_hidden(false)
        {
            let entry = entry.map_err(|e| {
                NestdiffError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("walk error under {}: {}", root.display(), e),
                ))
            })?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&root)
                .map_err(|e| NestdiffError::Internal(e.to_string()))?
                .to_string_lossy()
                .into_owned();
            names.push(relative);
        }
        names.sort();
        debug!("directory {} has {} members", root.display(), names.len());

        Ok(Self { root, names })
    }
}

impl Container for DirectoryContainer {
    fn member_names(&self) -> &[String] {
        &self.names
    }

    fn member(&self, name: &str) -> Result<SourceFile> {
        SourceFile::from_path_named(&self.root.join(name), name)
    }
}

pub(crate) fn compare_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let container1 = DirectoryContainer::open(file1)?;
    let container2 = DirectoryContainer::open(file2)?;

    let mut details = Vec::new();
    if let Some(metadata) = diff::from_text(
        &join_lines(container1.member_names()),
        &join_lines(container2.member_names()),
        file1.name(),
        file2.name(),
        Some("file list"),
        config,
    ) {
        details.push(metadata);
    }

    details.extend(compare_containers(&container1, &container2, config)?);
    Ok(details)
}

fn join_lines(names: &[String]) -> String {
    let mut text = String::new();
    for name in names {
        text.push_str(name);
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(dir: &std::path::Path, files: &[(&str, &str)]) -> SourceFile {
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
        }
        SourceFile::from_path(dir).unwrap()
    }

    #[test]
    fn test_members_are_sorted_relative_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = tree(dir.path(), &[("z/file", "z\n"), ("a/file", "a\n")]);

        let container = DirectoryContainer::open(&file).unwrap();
        assert_eq!(container.member_names(), ["a/file", "z/file"]);
    }

    #[test]
    fn test_identical_trees_have_no_details() {
        let left = tempfile::TempDir::new().unwrap();
        let right = tempfile::TempDir::new().unwrap();
        let file1 = tree(left.path(), &[("dir/a", "same\n")]);
        let file2 = tree(right.path(), &[("dir/a", "same\n")]);

        let details = compare_details(&file1, &file2, &Config::default()).unwrap();
        assert!(details.is_empty());
    }

    #[test]
    fn test_changed_member_shows_up_under_its_relative_path() {
        let left = tempfile::TempDir::new().unwrap();
        let right = tempfile::TempDir::new().unwrap();
        let file1 = tree(left.path(), &[("dir/a", "one\n")]);
        let file2 = tree(right.path(), &[("dir/a", "two\n")]);

        let details = compare_details(&file1, &file2, &Config::default()).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].source1, "dir/a");
        assert!(details[0].unified_diff.is_some());
    }

    #[test]
    fn test_missing_member_is_escalated_by_default() {
        let left = tempfile::TempDir::new().unwrap();
        let right = tempfile::TempDir::new().unwrap();
        let file1 = tree(left.path(), &[("only-here", "data\n")]);
        let file2 = SourceFile::from_path(right.path()).unwrap();

        let details = compare_details(&file1, &file2, &Config::default()).unwrap();
        // file list diff plus the orphaned member against /dev/null
        assert_eq!(details.len(), 2);
        assert_eq!(details[1].source2, "/dev/null");
        assert!(details[1].comment.is_some());
    }
}
