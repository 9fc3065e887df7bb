use crate::container::{compare_containers, member_dest, Container, EmptyContainer};
use crate::diff;
use crate::file::SourceFile;
use crate::temp;
use nestdiff_common::{Config, Difference, NestdiffError, Result};
use std::fs::File;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

struct TarContainer {
    source: SourceFile,
    names: Vec<String>,
    scope: Arc<TempDir>,
}

impl TarContainer {
    fn open(file: &SourceFile, config: &Config) -> Result<Box<dyn Container>> {
        if !file.exists() {
            return Ok(Box::new(EmptyContainer));
        }

        let mut archive = tar::Archive::new(File::open(file.path())?);
        let mut names = Vec::new();
        for entry in archive.entries().map_err(tar_error(file))? {
            let entry = entry.map_err(tar_error(file))?;
            if entry.header().entry_type().is_dir() {
                continue;
            }
            let path = entry.path().map_err(tar_error(file))?;
            names.push(path.to_string_lossy().into_owned());
        }

        Ok(Box::new(Self {
            source: file.clone(),
            names,
            scope: temp::scratch_dir(config)?,
        }))
    }
}

impl Container for TarContainer {
    fn member_names(&self) -> &[String] {
        &self.names
    }

    fn member(&self, name: &str) -> Result<SourceFile> {
        let dest = member_dest(self.scope.path(), name);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("tar extracting {} to {}", name, dest.display());

        let mut archive = tar::Archive::new(File::open(self.source.path())?);
        for entry in archive.entries().map_err(tar_error(&self.source))? {
            let mut entry = entry.map_err(tar_error(&self.source))?;
            let path = entry.path().map_err(tar_error(&self.source))?;
            if path.to_string_lossy() == name {
                entry.unpack(&dest).map_err(tar_error(&self.source))?;
                return SourceFile::extracted(name, dest, Arc::clone(&self.scope));
            }
        }

        Err(NestdiffError::Archive(format!(
            "{} has no member {}",
            self.source.name(),
            name
        )))
    }
}

fn tar_error(file: &SourceFile) -> impl Fn(std::io::Error) -> NestdiffError + '_ {
    move |e| NestdiffError::Archive(format!("failed to read {}: {}", file.name(), e))
}

/// `tar tv`-style listing generated from the archive headers.
fn listing(file: &SourceFile) -> Result<String> {
    if !file.exists() {
        return Ok(String::new());
    }

    let mut archive = tar::Archive::new(File::open(file.path())?);
    let mut lines = String::new();
    for entry in archive.entries().map_err(tar_error(file))? {
        let entry = entry.map_err(tar_error(file))?;
        let header = entry.header();
        let path = entry.path().map_err(tar_error(file))?.into_owned();
        let link = match entry.link_name().map_err(tar_error(file))? {
            Some(target) => format!(" -> {}", target.display()),
            None => String::new(),
        };
        lines.push_str(&format!(
            "{:o} {}/{} {:>9} {} {}{}\n",
            header.mode().map_err(tar_error(file))?,
            header.uid().map_err(tar_error(file))?,
            header.gid().map_err(tar_error(file))?,
            header.size().map_err(tar_error(file))?,
            header.mtime().map_err(tar_error(file))?,
            path.display(),
            link,
        ));
    }
    Ok(lines)
}

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

    let container1 = TarContainer::open(file1, config)?;
    let container2 = TarContainer::open(file2, config)?;
    details.extend(compare_containers(&*container1, &*container2, config)?);
    Ok(details)
}
