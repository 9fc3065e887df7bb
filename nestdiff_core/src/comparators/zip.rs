use crate::container::{compare_containers, member_dest, Container, EmptyContainer};
use crate::diff;
use crate::file::SourceFile;
use crate::temp;
use nestdiff_common::{Config, Difference, NestdiffError, Result};
use std::fs::File;
use std::io;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;
use zip::ZipArchive;

struct ZipContainer {
    source: SourceFile,
    names: Vec<String>,
    scope: Arc<TempDir>,
}

impl ZipContainer {
    fn open(file: &SourceFile, config: &Config) -> Result<Box<dyn Container>> {
        if !file.exists() {
            return Ok(Box::new(EmptyContainer));
        }

        let mut archive = open_archive(file)?;
        let mut names = Vec::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| zip_error(file, &e.to_string()))?;
            if entry.is_dir() {
                continue;
            }
            names.push(entry.name().to_string());
        }

        Ok(Box::new(Self {
            source: file.clone(),
            names,
            scope: temp::scratch_dir(config)?,
        }))
    }
}

impl Container for ZipContainer {
    fn member_names(&self) -> &[String] {
        &self.names
    }

    fn member(&self, name: &str) -> Result<SourceFile> {
        let dest = member_dest(self.scope.path(), name);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("zip extracting {} to {}", name, dest.display());

        let mut archive = open_archive(&self.source)?;
        let mut entry = archive
            .by_name(name)
            .map_err(|e| zip_error(&self.source, &e.to_string()))?;
        let mut output = File::create(&dest)?;
        io::copy(&mut entry, &mut output)
            .map_err(|e| zip_error(&self.source, &e.to_string()))?;
        drop(entry);

        SourceFile::extracted(name, dest, Arc::clone(&self.scope))
    }
}

fn open_archive(file: &SourceFile) -> Result<ZipArchive<File>> {
    ZipArchive::new(File::open(file.path())?).map_err(|e| zip_error(file, &e.to_string()))
}

fn zip_error(file: &SourceFile, message: &str) -> NestdiffError {
    NestdiffError::Archive(format!("failed to read {}: {}", file.name(), message))
}

/// zipinfo-style listing generated from the central directory.
fn listing(file: &SourceFile) -> Result<String> {
    if !file.exists() {
        return Ok(String::new());
    }

    let mut archive = open_archive(file)?;
    let mut lines = String::new();
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| zip_error(file, &e.to_string()))?;
        lines.push_str(&format!(
            "{:>9} {:>9} {:08x} {:?} {}\n",
            entry.size(),
            entry.compressed_size(),
            entry.crc32(),
            entry.compression(),
            entry.name(),
        ));
    }
    Ok(lines)
}

/// Shared by `Zip` and `MozillaZip`; the two kinds differ only in
/// recognition order.
pub(crate) fn compare_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let mut details = Vec::new();
    if let Some(metadata) = diff::from_text(
        &listing(file1)?,
        &listing(file2)?,
        file1.name(),
        file2.name(),
        Some("file list"),
        config,
    ) {
        details.push(metadata);
    }

    let container1 = ZipContainer::open(file1, config)?;
    let container2 = ZipContainer::open(file2, config)?;
    details.extend(compare_containers(&*container1, &*container2, config)?);
    Ok(details)
}
