//! End-to-end comparison scenarios over fixtures built in-test with the
//! same archive crates the engine decodes with.

use crate::comparators::{compare, specialize, FileKind};
use crate::file::SourceFile;
use nestdiff_common::Config;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_tar(path: &Path, link_target: &str, text: &str) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(file);

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    header.set_mode(0o777);
    header.set_mtime(1_400_000_000);
    header.set_uid(0);
    header.set_gid(0);
    builder
        .append_link(&mut header, "dir/link", link_target)
        .unwrap();

    let mut header = tar::Header::new_gnu();
    header.set_size(text.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(1_400_000_000);
    header.set_uid(0);
    header.set_gid(0);
    header.set_cksum();
    builder
        .append_data(&mut header, "dir/text", text.as_bytes())
        .unwrap();

    builder.finish().unwrap();
}

fn write_xz(path: &Path, content: &str) {
    let file = File::create(path).unwrap();
    let mut encoder = xz2::write::XzEncoder::new(file, 6);
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

fn write_tar_gz(path: &Path, inner_name: &str, text: &str) {
    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        let mut header = tar::Header::new_gnu();
        header.set_size(text.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_400_000_000);
        header.set_uid(0);
        header.set_gid(0);
        header.set_cksum();
        builder
            .append_data(&mut header, inner_name, text.as_bytes())
            .unwrap();
        builder.finish().unwrap();
    }
    let file = File::create(path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(&tar_bytes).unwrap();
    encoder.finish().unwrap();
}

fn write_zip(path: &Path, members: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, content) in members {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn source(path: &Path) -> SourceFile {
    SourceFile::from_path(path).unwrap()
}

#[test]
fn test_identical_tar_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let path1 = dir.path().join("test1.tar");
    let path2 = dir.path().join("copy-of-test1.tar");
    write_tar(&path1, "broken", "a\nb\nc\n");
    std::fs::copy(&path1, &path2).unwrap();

    let config = Config::default();
    assert!(compare(&source(&path1), &source(&path2), None, &config)
        .unwrap()
        .is_none());
}

#[test]
fn test_tar_details_come_in_order() {
    let dir = TempDir::new().unwrap();
    let path1 = dir.path().join("test1.tar");
    let path2 = dir.path().join("test2.tar");
    write_tar(&path1, "broken", "a\nb\nc\n");
    write_tar(&path2, "fixed", "a\nX\nc\n");

    let file1 = source(&path1);
    let file2 = source(&path2);
    assert_eq!(specialize(&file1), FileKind::Tar);

    let config = Config::default();
    let difference = compare(&file1, &file2, None, &config).unwrap().unwrap();
    let details = &difference.details;
    assert_eq!(details.len(), 3);

    // (a) archive listing
    assert_eq!(details[0].source1, "file list");
    assert!(details[0].unified_diff.is_some());

    // (b) symlink member, metadata-only
    assert_eq!(details[1].source1, "dir/link");
    assert_eq!(details[1].source2, "dir/link");
    assert_eq!(details[1].comment.as_deref(), Some("symlink"));
    let link_diff = details[1].unified_diff.as_ref().unwrap();
    assert!(link_diff.contains("-destination: broken"));
    assert!(link_diff.contains("+destination: fixed"));

    // (c) text member
    assert_eq!(details[2].source1, "dir/text");
    let text_diff = details[2].unified_diff.as_ref().unwrap();
    assert!(text_diff.contains("-b\n"));
    assert!(text_diff.contains("+X\n"));
}

#[test]
fn test_xz_member_named_by_stripping_suffix() {
    let dir = TempDir::new().unwrap();
    let path1 = dir.path().join("test1.xz");
    let path2 = dir.path().join("test2.xz");
    write_xz(&path1, "a\nb\nc\n");
    write_xz(&path2, "a\nX\nc\n");

    let file1 = source(&path1);
    assert_eq!(specialize(&file1), FileKind::Xz);

    let config = Config::default();
    let difference = compare(&file1, &source(&path2), None, &config)
        .unwrap()
        .unwrap();
    assert_eq!(difference.details.len(), 1);

    let content = &difference.details[0];
    assert_eq!(content.source1, "test1");
    assert_eq!(content.source2, "test2");
    let text_diff = content.unified_diff.as_ref().unwrap();
    assert!(text_diff.contains("-b\n"));
    assert!(text_diff.contains("+X\n"));
}

#[test]
fn test_gzipped_tar_recurses_to_the_text_layer() {
    let dir = TempDir::new().unwrap();
    let path1 = dir.path().join("build1.tar.gz");
    let path2 = dir.path().join("build2.tar.gz");
    write_tar_gz(&path1, "pkg/notes", "one\ntwo\n");
    write_tar_gz(&path2, "pkg/notes", "one\nthree\n");

    let file1 = source(&path1);
    assert_eq!(specialize(&file1), FileKind::Gzip);

    let config = Config::default();
    let difference = compare(&file1, &source(&path2), None, &config)
        .unwrap()
        .unwrap();

    // gzip: metadata equal, single tar member differs
    let tar_level = difference
        .details
        .iter()
        .find(|d| d.source1 == "build1.tar")
        .expect("tar member difference");
    assert_eq!(tar_level.source2, "build2.tar");

    let text_level = tar_level
        .details
        .iter()
        .find(|d| d.source1 == "pkg/notes")
        .expect("text member difference");
    let text_diff = text_level.unified_diff.as_ref().unwrap();
    assert!(text_diff.contains("-two\n"));
    assert!(text_diff.contains("+three\n"));
}

#[test]
fn test_zip_against_non_existing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test1.zip");
    write_zip(&path, &[("dir/text", "content\n")]);

    let config = Config {
        new_file: true,
        ..Default::default()
    };
    let zip1 = source(&path);
    let missing = SourceFile::non_existing("/nonexisting");

    let difference = compare(&zip1, &missing, None, &config).unwrap().unwrap();
    assert_eq!(difference.source2, "/nonexisting");
    assert_eq!(difference.details.last().unwrap().source2, "/dev/null");
}

#[test]
fn test_determinism_across_runs() {
    let dir = TempDir::new().unwrap();
    let path1 = dir.path().join("test1.tar");
    let path2 = dir.path().join("test2.tar");
    write_tar(&path1, "broken", "a\nb\nc\n");
    write_tar(&path2, "fixed", "a\nX\nc\n");

    let config = Config::default();
    let first = compare(&source(&path1), &source(&path2), None, &config)
        .unwrap()
        .unwrap();
    let second = compare(&source(&path1), &source(&path2), None, &config)
        .unwrap()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_scope_hygiene_after_compare() {
    let scratch_root = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let path1 = dir.path().join("build1.tar.gz");
    let path2 = dir.path().join("build2.tar.gz");
    write_tar_gz(&path1, "pkg/notes", "one\ntwo\n");
    write_tar_gz(&path2, "pkg/notes", "one\nthree\n");

    let config = Config {
        scratch_dir: Some(scratch_root.path().to_path_buf()),
        ..Default::default()
    };
    let difference = compare(&source(&path1), &source(&path2), None, &config).unwrap();
    assert!(difference.is_some());

    // every extraction scope must be released once the tree is built
    let leftovers: Vec<PathBuf> = std::fs::read_dir(scratch_root.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert!(leftovers.is_empty(), "leftover scopes: {leftovers:?}");
}

#[test]
fn test_containment_of_member_labels() {
    let dir = TempDir::new().unwrap();
    let path1 = dir.path().join("a.zip");
    let path2 = dir.path().join("b.zip");
    write_zip(&path1, &[("common", "1\n"), ("gone", "x\n")]);
    write_zip(&path2, &[("common", "2\n"), ("new", "y\n")]);

    let config = Config {
        new_file: true,
        ..Default::default()
    };
    let difference = compare(&source(&path1), &source(&path2), None, &config)
        .unwrap()
        .unwrap();

    let member_names = ["common", "gone", "new", "/dev/null"];
    for detail in &difference.details {
        if detail.source1 == "file list" {
            continue;
        }
        assert!(member_names.contains(&detail.source1.as_str()));
        assert!(member_names.contains(&detail.source2.as_str()));
    }
}
