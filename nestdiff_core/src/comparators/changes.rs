use crate::container::{compare_containers, Container, EmptyContainer};
use crate::diff;
use crate::file::SourceFile;
use nestdiff_common::{Config, Difference, NestdiffError, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Fields compared one by one, in the order the manifest declares them.
const DOT_CHANGES_FIELDS: &[&str] = &[
    "Format",
    "Source",
    "Binary",
    "Architecture",
    "Version",
    "Distribution",
    "Urgency",
    "Maintainer",
    "Changed-By",
    "Description",
    "Changes",
];

/// A parsed `.changes` upload manifest: RFC822-style fields plus the
/// `Files` listing of referenced artifacts.
struct ChangesManifest {
    fields: HashMap<String, String>,
    files_section: String,
    file_names: Vec<String>,
}

impl ChangesManifest {
    fn parse(file: &SourceFile, config: &Config) -> Result<Self> {
        let bytes = file.read_capped(config.max_report_size)?;
        let text = String::from_utf8_lossy(&bytes);

        let mut fields: HashMap<String, String> = HashMap::new();
        let mut current: Option<String> = None;
        for line in text.lines() {
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(name) = &current {
                    let value = fields.entry(name.clone()).or_default();
                    value.push('\n');
                    value.push_str(line);
                }
                continue;
            }
            if line.starts_with('-') || line.trim().is_empty() {
                // PGP armor and blank separators
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim().to_string();
                fields.insert(name.clone(), value.trim_start().to_string());
                current = Some(name);
            }
        }

        let files_section = fields.get("Files").cloned().unwrap_or_default();
        let file_names = files_section
            .lines()
            .filter_map(|line| line.split_whitespace().last())
            .map(str::to_string)
            .collect();

        Ok(Self {
            fields,
            files_section,
            file_names,
        })
    }

    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Members of a `.changes` manifest live next to it on disk; nothing is
/// extracted.
struct DotChangesContainer {
    dir: PathBuf,
    names: Vec<String>,
}

impl DotChangesContainer {
    fn open(file: &SourceFile, manifest: Option<&ChangesManifest>) -> Box<dyn Container> {
        match (file.exists(), manifest) {
            (true, Some(manifest)) => Box::new(Self {
                dir: file
                    .path()
                    .parent()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(".")),
                names: manifest.file_names.clone(),
            }),
            _ => Box::new(EmptyContainer),
        }
    }
}

impl Container for DotChangesContainer {
    fn member_names(&self) -> &[String] {
        &self.names
    }

    fn member(&self, name: &str) -> Result<SourceFile> {
        let path = self.dir.join(name);
        SourceFile::from_path_named(&path, name).map_err(|_| {
            NestdiffError::Archive(format!(
                "{} listed in Files is missing from {}",
                name,
                self.dir.display()
            ))
        })
    }
}

pub(crate) fn compare_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let manifest1 = ChangesManifest::parse(file1, config)?;
    let manifest2 = ChangesManifest::parse(file2, config)?;

    let mut details = Vec::new();
    for field in DOT_CHANGES_FIELDS {
        if let Some(difference) = diff::from_text(
            manifest1.field(field).trim_start(),
            manifest2.field(field).trim_start(),
            file1.name(),
            file2.name(),
            Some(field),
            config,
        ) {
            details.push(difference);
        }
    }

    if let Some(difference) = diff::from_text(
        &manifest1.files_section,
        &manifest2.files_section,
        file1.name(),
        file2.name(),
        Some("Files"),
        config,
    ) {
        details.push(difference);
    }

    let container1 = DotChangesContainer::open(file1, Some(&manifest1));
    let container2 = DotChangesContainer::open(file2, Some(&manifest2));
    details.extend(compare_containers(&*container1, &*container2, config)?);
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGES: &str = "\
Format: 1.8
Date: Thu, 01 Jan 2015 00:00:00 +0000
Source: demo
Binary: demo
Architecture: amd64
Version: 1.0-1
Distribution: unstable
Urgency: medium
Maintainer: A Person <person@example.com>
Changed-By: A Person <person@example.com>
Description:
 demo - demonstration package
Changes:
 demo (1.0-1) unstable; urgency=medium
 .
   * Initial release.
Files:
 0123456789abcdef0123456789abcdef 1234 utils optional demo_1.0-1_amd64.deb
";

    fn manifest_from(dir: &std::path::Path, name: &str, text: &str) -> SourceFile {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        SourceFile::from_path_named(&path, name).unwrap()
    }

    #[test]
    fn test_parse_fields_and_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = manifest_from(dir.path(), "demo.changes", CHANGES);
        let manifest = ChangesManifest::parse(&file, &Config::default()).unwrap();

        assert_eq!(manifest.field("Source"), "demo");
        assert_eq!(manifest.field("Version"), "1.0-1");
        assert!(manifest.field("Changes").contains("Initial release"));
        assert_eq!(manifest.file_names, ["demo_1.0-1_amd64.deb"]);
    }

    #[test]
    fn test_field_diff_is_labeled_by_field() {
        let dir = tempfile::TempDir::new().unwrap();
        let file1 = manifest_from(dir.path(), "a.changes", CHANGES);
        let file2 = manifest_from(
            dir.path(),
            "b.changes",
            &CHANGES.replace("Version: 1.0-1", "Version: 1.0-2"),
        );

        let config = Config {
            new_file: true,
            ..Default::default()
        };
        let details = compare_details(&file1, &file2, &config).unwrap();
        let version = details
            .iter()
            .find(|d| d.source1 == "Version")
            .expect("Version field difference");
        assert!(version.unified_diff.as_ref().unwrap().contains("-1.0-1"));
    }

    #[test]
    fn test_files_as_string_diff_is_labeled_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let file1 = manifest_from(dir.path(), "a.changes", CHANGES);
        let file2 = manifest_from(
            dir.path(),
            "b.changes",
            &CHANGES.replace("1234 utils", "4321 utils"),
        );

        let config = Config {
            new_file: true,
            ..Default::default()
        };
        let details = compare_details(&file1, &file2, &config).unwrap();
        assert!(details.iter().any(|d| d.source1 == "Files"));
    }

    #[test]
    fn test_missing_referenced_file_is_archive_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = manifest_from(dir.path(), "demo.changes", CHANGES);
        let manifest = ChangesManifest::parse(&file, &Config::default()).unwrap();
        let container = DotChangesContainer::open(&file, Some(&manifest));
        assert!(container.member("demo_1.0-1_amd64.deb").is_err());
    }
}
