use crate::comparators::root_difference;
use crate::diff;
use crate::file::SourceFile;
use nestdiff_common::{Config, Difference, Result};

/// Compare two symlinks by target alone; the link is never followed.
pub(crate) fn compare_symlinks(
    file1: &SourceFile,
    file2: &SourceFile,
    source: Option<&str>,
    config: &Config,
) -> Result<Option<Difference>> {
    let dest1 = symlink_destination(file1)?;
    let dest2 = symlink_destination(file2)?;
    if dest1 == dest2 {
        return Ok(None);
    }

    let mut root = root_difference(file1, file2, source).with_comment("symlink");
    root.unified_diff = diff::unified_diff(&dest1, &dest2, config);
    Ok(Some(root))
}

fn symlink_destination(file: &SourceFile) -> Result<String> {
    if !file.exists() {
        return Ok(String::new());
    }
    let target = std::fs::read_link(file.path())?;
    Ok(format!("destination: {}\n", target.display()))
}

/// Compare two device nodes by major/minor and mode.
pub(crate) fn compare_devices(
    file1: &SourceFile,
    file2: &SourceFile,
    source: Option<&str>,
    config: &Config,
) -> Result<Option<Difference>> {
    let ident1 = device_identity(file1)?;
    let ident2 = device_identity(file2)?;
    if ident1 == ident2 {
        return Ok(None);
    }

    let mut root = root_difference(file1, file2, source).with_comment("device");
    root.unified_diff = diff::unified_diff(&ident1, &ident2, config);
    Ok(Some(root))
}

#[cfg(unix)]
fn device_identity(file: &SourceFile) -> Result<String> {
    use std::os::unix::fs::MetadataExt;

    if !file.exists() {
        return Ok(String::new());
    }
    let meta = std::fs::symlink_metadata(file.path())?;
    let rdev = meta.rdev();
    Ok(format!(
        "device:{},{} mode:{:o}\n",
        dev_major(rdev),
        dev_minor(rdev),
        meta.mode() & 0o7777,
    ))
}

#[cfg(not(unix))]
fn device_identity(_file: &SourceFile) -> Result<String> {
    Ok(String::new())
}

// Linux dev_t encoding
#[cfg(unix)]
fn dev_major(rdev: u64) -> u64 {
    ((rdev >> 8) & 0xfff) | ((rdev >> 32) & !0xfff)
}

#[cfg(unix)]
fn dev_minor(rdev: u64) -> u64 {
    (rdev & 0xff) | ((rdev >> 12) & !0xff)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn symlink_at(dir: &std::path::Path, name: &str, target: &str) -> SourceFile {
        let link = dir.join(name);
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::os::unix::fs::symlink(target, &link).unwrap();
        SourceFile::from_path_named(&link, name).unwrap()
    }

    #[test]
    fn test_identical_symlinks() {
        let dir = tempfile::TempDir::new().unwrap();
        let link1 = symlink_at(dir.path(), "l1", "target");
        let link2 = symlink_at(dir.path(), "l2", "target");
        let config = Config::default();
        assert!(compare_symlinks(&link1, &link2, None, &config)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_differing_targets_carry_symlink_comment() {
        let dir = tempfile::TempDir::new().unwrap();
        let link1 = symlink_at(dir.path(), "dir/link", "broken");
        let link2 = {
            std::fs::create_dir_all(dir.path().join("other")).unwrap();
            let link = dir.path().join("other/link");
            std::os::unix::fs::symlink("fixed", &link).unwrap();
            SourceFile::from_path_named(&link, "dir/link").unwrap()
        };

        let config = Config::default();
        let difference = compare_symlinks(&link1, &link2, None, &config)
            .unwrap()
            .unwrap();
        assert_eq!(difference.source1, "dir/link");
        assert_eq!(difference.source2, "dir/link");
        assert_eq!(difference.comment.as_deref(), Some("symlink"));
        let diff_text = difference.unified_diff.unwrap();
        assert!(diff_text.contains("-destination: broken"));
        assert!(diff_text.contains("+destination: fixed"));
    }

    #[test]
    fn test_symlink_versus_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let link = symlink_at(dir.path(), "link", "somewhere");
        let missing = SourceFile::non_existing("/dev/null");
        let config = Config::default();

        let difference = compare_symlinks(&link, &missing, None, &config)
            .unwrap()
            .unwrap();
        assert!(difference
            .unified_diff
            .unwrap()
            .contains("-destination: somewhere"));
    }
}
