use crate::container::{compare_containers, member_dest, Container, EmptyContainer};
use crate::diff;
use crate::file::SourceFile;
use crate::temp;
use crate::tools::{self, ExternalCommand};
use nestdiff_common::{Config, Difference, Result};
use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

const AR_LIST: ExternalCommand = ExternalCommand::new("ar", &["t", "{}"]);
const AR_VERBOSE: ExternalCommand = ExternalCommand::new("ar", &["tv", "{}"]);

/// Unix archive walked through the external `ar` tool: `ar t` for the
/// index, `ar p` per member.
struct ArContainer {
    source: SourceFile,
    names: Vec<String>,
    scope: Arc<TempDir>,
}

impl ArContainer {
    fn open(file: &SourceFile, config: &Config) -> Result<Box<dyn Container>> {
        if !file.exists() {
            return Ok(Box::new(EmptyContainer));
        }

        let index = tools::run_tool(&AR_LIST, file.path(), config)?;
        let names = index.lines().map(str::to_string).collect();
        Ok(Box::new(Self {
            source: file.clone(),
            names,
            scope: temp::scratch_dir(config)?,
        }))
    }
}

impl Container for ArContainer {
    fn member_names(&self) -> &[String] {
        &self.names
    }

    fn member(&self, name: &str) -> Result<SourceFile> {
        let dest = member_dest(self.scope.path(), name);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("ar extracting {} to {}", name, dest.display());

        let stdout = tools::capture_bytes(
            "ar",
            &[
                OsStr::new("p"),
                self.source.path().as_os_str(),
                OsStr::new(name),
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
    details.extend(tools::from_command(&AR_VERBOSE, file1, file2, config)?);

    let container1 = ArContainer::open(file1, config)?;
    let container2 = ArContainer::open(file2, config)?;
    details.extend(compare_containers(&*container1, &*container2, config)?);
    Ok(details)
}

/// Debian packages are `ar` archives (`debian-binary`, `control.tar.*`,
/// `data.tar.*`); recognition precedes plain Ar in the registry.
///
/// A `control` metadata node comes first: the package identity read out
/// of the control member as a comment, plus a diff of the two control
/// files. The generic Ar listing and member walk follow.
pub(crate) fn deb_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let control1 = control_text(file1, config);
    let control2 = control_text(file2, config);
    let ident1 = control1.as_deref().and_then(control_ident);
    let ident2 = control2.as_deref().and_then(control_ident);

    let mut metadata = Difference::new("control", "control");
    metadata.comment = Some(match (&ident1, &ident2) {
        (Some(a), Some(b)) if a == b => format!("Debian binary package: {a}"),
        (Some(a), Some(b)) => format!("Debian binary package: {a} vs {b}"),
        (Some(a), None) | (None, Some(a)) => format!("Debian binary package: {a}"),
        (None, None) => "Debian binary package".to_string(),
    });
    if let (Some(c1), Some(c2)) = (&control1, &control2) {
        metadata.unified_diff = diff::unified_diff(c1, c2, config);
    }

    let mut details = vec![metadata];
    details.extend(compare_details(file1, file2, config)?);
    Ok(details)
}

/// Pull the `control` file out of a package's `control.tar.*` member.
/// Extraction trouble is not fatal here; the Ar pass will surface it.
fn control_text(file: &SourceFile, config: &Config) -> Option<String> {
    if !file.exists() {
        return None;
    }
    let container = ArContainer::open(file, config).ok()?;
    let member_name = container
        .member_names()
        .iter()
        .find(|name| name.starts_with("control.tar"))?
        .clone();
    let member = container.member(&member_name).ok()?;

    let input = File::open(member.path()).ok()?;
    let reader: Box<dyn Read> = if member_name.ends_with(".gz") {
        Box::new(flate2::read::GzDecoder::new(input))
    } else if member_name.ends_with(".xz") {
        Box::new(xz2::read::XzDecoder::new(input))
    } else if member_name.ends_with(".bz2") {
        Box::new(bzip2::read::BzDecoder::new(input))
    } else {
        Box::new(input)
    };

    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().ok()? {
        let mut entry = entry.ok()?;
        let path = entry.path().ok()?;
        if path.file_name() == Some(OsStr::new("control")) {
            let mut text = String::new();
            entry
                .by_ref()
                .take(config.max_report_size as u64)
                .read_to_string(&mut text)
                .ok()?;
            return Some(text);
        }
    }
    debug!("{} has no control file in {}", file.name(), member_name);
    None
}

/// `Package Version Architecture` summary of a control file.
fn control_ident(control: &str) -> Option<String> {
    let field = |name: &str| {
        control
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .map(str::trim)
    };
    let package = field("Package:")?;
    Some(format!(
        "{} {} {}",
        package,
        field("Version:").unwrap_or("?"),
        field("Architecture:").unwrap_or("?"),
    ))
}
