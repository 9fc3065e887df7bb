use crate::container::{compare_containers, member_dest, Container, EmptyContainer};
use crate::file::SourceFile;
use crate::temp;
use crate::tools::{self, ExternalCommand};
use nestdiff_common::{Config, Difference, Result};
use std::ffi::OsStr;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

const PVD: ExternalCommand = ExternalCommand::new("isoinfo", &["-d", "-i", "{}"]);
const LISTING: ExternalCommand = ExternalCommand::new("isoinfo", &["-l", "-i", "{}"]);
const LISTING_JOLIET: ExternalCommand = ExternalCommand::new("isoinfo", &["-l", "-J", "-i", "{}"]);
const LISTING_ROCKRIDGE: ExternalCommand =
    ExternalCommand::new("isoinfo", &["-l", "-R", "-i", "{}"]);
const FIND: ExternalCommand = ExternalCommand::new("isoinfo", &["-R", "-f", "-i", "{}"]);

/// ISO9660 image walked through `isoinfo`. RockRidge names are used for
/// enumeration and extraction.
struct Iso9660Container {
    source: SourceFile,
    names: Vec<String>,
    scope: Arc<TempDir>,
}

impl Iso9660Container {
    fn open(file: &SourceFile, config: &Config) -> Result<Box<dyn Container>> {
        if !file.exists() {
            return Ok(Box::new(EmptyContainer));
        }

        let index = tools::run_tool(&FIND, file.path(), config)?;
        // isoinfo -f prints rooted paths; directories have no suffix to
        // tell them apart, so member() tolerates extraction of anything
        let names = index
            .lines()
            .map(|line| line.trim_start_matches('/').to_string())
            .filter(|name| !name.is_empty())
            .collect();

        Ok(Box::new(Self {
            source: file.clone(),
            names,
            scope: temp::scratch_dir(config)?,
        }))
    }
}

impl Container for Iso9660Container {
    fn member_names(&self) -> &[String] {
        &self.names
    }

    fn member(&self, name: &str) -> Result<SourceFile> {
        let dest = member_dest(self.scope.path(), name);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("isoinfo extracting {} to {}", name, dest.display());

        let rooted = format!("/{name}");
        let stdout = tools::capture_bytes(
            "isoinfo",
            &[
                OsStr::new("-R"),
                OsStr::new("-i"),
                self.source.path().as_os_str(),
                OsStr::new("-x"),
                OsStr::new(&rooted),
            ],
        )?;
        std::fs::write(&dest, &stdout)?;

        SourceFile::extracted(name, dest, Arc::clone(&self.scope))
    }
}

pub(crate) fn compare_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let mut details = Vec::new();
    details.extend(tools::from_command(&PVD, file1, file2, config)?);
    for listing in [&LISTING, &LISTING_JOLIET, &LISTING_ROCKRIDGE] {
        details.extend(tools::from_command(listing, file1, file2, config)?);
    }

    let container1 = Iso9660Container::open(file1, config)?;
    let container2 = Iso9660Container::open(file2, config)?;
    details.extend(compare_containers(&*container1, &*container2, config)?);
    Ok(details)
}
