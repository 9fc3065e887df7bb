pub mod ar;
pub mod changes;
pub mod compressed;
pub mod directory;
pub mod exec;
pub mod iso9660;
pub mod pdf;
pub mod tar;
pub mod unix;
pub mod zip;

#[cfg(test)]
mod tests_scenarios;

use crate::diff;
use crate::file::{self, SourceFile};
use nestdiff_common::{Config, Difference, NestdiffError, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Concrete comparator selected for a file. Closed set; everything
/// unrecognized falls back to `Binary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    Symlink,
    Device,
    DotChanges,
    Deb,
    MozillaZip,
    Zip,
    Tar,
    Gzip,
    Xz,
    Bzip2,
    Ar,
    Iso9660,
    Pdf,
    Pe,
    Elf,
    Sqlite,
    Png,
    Tiff,
    Mo,
    Class,
    Text,
    Binary,
}

type Recognizer = fn(&SourceFile) -> bool;

struct FormatEntry {
    kind: FileKind,
    recognizes: Recognizer,
}

/// Ordered registry: the first matching entry wins, so more specific
/// formats must precede the general ones they overlap with (Deb before
/// Ar, MozillaZip before Zip, DotChanges before Text).
static REGISTRY: &[FormatEntry] = &[
    FormatEntry { kind: FileKind::Directory, recognizes: is_directory },
    FormatEntry { kind: FileKind::Symlink, recognizes: is_symlink },
    FormatEntry { kind: FileKind::Device, recognizes: is_device },
    FormatEntry { kind: FileKind::DotChanges, recognizes: is_dot_changes },
    FormatEntry { kind: FileKind::Deb, recognizes: is_deb },
    FormatEntry { kind: FileKind::MozillaZip, recognizes: is_mozilla_zip },
    FormatEntry { kind: FileKind::Zip, recognizes: is_zip },
    FormatEntry { kind: FileKind::Tar, recognizes: is_tar },
    FormatEntry { kind: FileKind::Gzip, recognizes: is_gzip },
    FormatEntry { kind: FileKind::Xz, recognizes: is_xz },
    FormatEntry { kind: FileKind::Bzip2, recognizes: is_bzip2 },
    FormatEntry { kind: FileKind::Ar, recognizes: is_ar },
    FormatEntry { kind: FileKind::Iso9660, recognizes: is_iso9660 },
    FormatEntry { kind: FileKind::Pdf, recognizes: is_pdf },
    FormatEntry { kind: FileKind::Pe, recognizes: is_pe },
    FormatEntry { kind: FileKind::Elf, recognizes: is_elf },
    FormatEntry { kind: FileKind::Sqlite, recognizes: is_sqlite },
    FormatEntry { kind: FileKind::Png, recognizes: is_png },
    FormatEntry { kind: FileKind::Tiff, recognizes: is_tiff },
    FormatEntry { kind: FileKind::Mo, recognizes: is_mo },
    FormatEntry { kind: FileKind::Class, recognizes: is_class },
    FormatEntry { kind: FileKind::Text, recognizes: is_text },
];

/// Pick the comparator for a file from `(name, magic)` alone.
/// Non-destructive and pure, hence trivially idempotent.
pub fn specialize(file: &SourceFile) -> FileKind {
    if !file.exists() {
        return FileKind::Binary;
    }
    REGISTRY
        .iter()
        .find(|entry| (entry.recognizes)(file))
        .map(|entry| entry.kind)
        .unwrap_or(FileKind::Binary)
}

fn is_directory(file: &SourceFile) -> bool {
    file.magic() == "inode/directory"
}

fn is_symlink(file: &SourceFile) -> bool {
    file.magic() == "inode/symlink"
}

// fifos and sockets ride along: like devices they must never be
// content-read, only described
fn is_device(file: &SourceFile) -> bool {
    matches!(
        file.magic(),
        "inode/chardevice" | "inode/blockdevice" | "inode/fifo" | "inode/socket"
    )
}

fn is_dot_changes(file: &SourceFile) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\.changes$").unwrap());
    re.is_match(file.name()) && file.magic() == "text/plain"
}

fn is_deb(file: &SourceFile) -> bool {
    file.magic() == "application/vnd.debian.binary-package"
}

fn zip_family(magic: &str) -> bool {
    magic == "application/zip" || magic == "application/jar" || magic == "application/java-archive"
}

fn is_mozilla_zip(file: &SourceFile) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\.(mozzip|ja|xpi)$").unwrap());
    re.is_match(file.name()) && zip_family(file.magic())
}

fn is_zip(file: &SourceFile) -> bool {
    zip_family(file.magic())
}

fn is_tar(file: &SourceFile) -> bool {
    file.magic() == "application/x-tar"
}

fn is_gzip(file: &SourceFile) -> bool {
    file.magic() == "application/gzip"
}

fn is_xz(file: &SourceFile) -> bool {
    file.magic() == "application/x-xz"
}

fn is_bzip2(file: &SourceFile) -> bool {
    file.magic() == "application/x-bzip2" || file.magic() == "application/x-bzip"
}

fn is_ar(file: &SourceFile) -> bool {
    file.magic() == "application/x-unix-archive"
}

fn is_iso9660(file: &SourceFile) -> bool {
    file.magic() == "application/x-iso9660-image"
}

fn is_pdf(file: &SourceFile) -> bool {
    file.magic() == "application/pdf"
}

fn is_pe(file: &SourceFile) -> bool {
    file.magic() == "application/vnd.microsoft.portable-executable"
}

fn is_elf(file: &SourceFile) -> bool {
    file.magic() == "application/x-executable"
}

fn is_sqlite(file: &SourceFile) -> bool {
    file.magic() == "application/vnd.sqlite3" || file.magic() == "application/x-sqlite3"
}

fn is_png(file: &SourceFile) -> bool {
    file.magic() == "image/png"
}

fn is_tiff(file: &SourceFile) -> bool {
    file.magic() == "image/tiff"
}

fn is_mo(file: &SourceFile) -> bool {
    file.magic() == "application/x-gettext-translation"
}

fn is_class(file: &SourceFile) -> bool {
    file.magic() == "application/java-vm"
}

fn is_text(file: &SourceFile) -> bool {
    file.magic() == "text/plain"
}

/// Compare two files, recursing through containers, and return the
/// resulting Difference subtree, or `None` when the two sides are
/// semantically identical.
pub fn compare(
    file1: &SourceFile,
    file2: &SourceFile,
    source: Option<&str>,
    config: &Config,
) -> Result<Option<Difference>> {
    if !file1.exists() && !file2.exists() {
        return Ok(None);
    }

    let kind1 = specialize(file1);
    let kind2 = specialize(file2);

    if file1.exists() && file2.exists() && kind1 != kind2 {
        return compare_mismatched(file1, file2, source, config);
    }
    let kind = if file1.exists() { kind1 } else { kind2 };
    debug!("comparing {} and {} as {:?}", file1.name(), file2.name(), kind);

    // Symlinks and devices are metadata-only; never dereferenced.
    match kind {
        FileKind::Symlink => return unix::compare_symlinks(file1, file2, source, config),
        FileKind::Device => return unix::compare_devices(file1, file2, source, config),
        _ => {}
    }

    if kind != FileKind::Directory
        && file1.exists()
        && file2.exists()
        && file::same_content(file1, file2)?
    {
        return Ok(None);
    }

    let mut root = root_difference(file1, file2, source);

    match kind {
        FileKind::Directory => {
            root.details = directory::compare_details(file1, file2, config)?;
            return Ok(root.has_content().then_some(root));
        }
        FileKind::Text => {
            let text1 = read_text(file1, config)?;
            let text2 = read_text(file2, config)?;
            root.unified_diff = diff::unified_diff(&text1, &text2, config);
        }
        FileKind::Binary => {}
        _ => match compare_details(kind, file1, file2, config) {
            Ok(details) => root.details = details,
            Err(NestdiffError::ToolMissing { tool }) => {
                root.comment = Some(format!("{tool} not available"));
            }
            Err(e @ (NestdiffError::Archive(_) | NestdiffError::ToolFailed { .. })) => {
                root.comment = Some(format!("error: {e}"));
            }
            Err(e) => return Err(e),
        },
    }

    // Downgrade to a raw byte diff when no format-specific detail
    // captured the discrepancy.
    if root.unified_diff.is_none() && root.details.is_empty() {
        root.unified_diff = diff::from_raw_reads(file1, file2, config)?;
    }

    Ok(root.has_content().then_some(root))
}

/// Format-specific detail pass, called with both sides content-resolved.
fn compare_details(
    kind: FileKind,
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    match kind {
        FileKind::Gzip => compressed::gzip_details(file1, file2, config),
        FileKind::Xz => compressed::xz_details(file1, file2, config),
        FileKind::Bzip2 => compressed::bzip2_details(file1, file2, config),
        FileKind::Tar => tar::compare_details(file1, file2, config),
        FileKind::Zip | FileKind::MozillaZip => zip::compare_details(file1, file2, config),
        FileKind::Ar => ar::compare_details(file1, file2, config),
        FileKind::Deb => ar::deb_details(file1, file2, config),
        FileKind::DotChanges => changes::compare_details(file1, file2, config),
        FileKind::Iso9660 => iso9660::compare_details(file1, file2, config),
        FileKind::Pdf => pdf::compare_details(file1, file2, config),
        FileKind::Pe
        | FileKind::Elf
        | FileKind::Sqlite
        | FileKind::Png
        | FileKind::Tiff
        | FileKind::Mo
        | FileKind::Class => exec::compare_details(kind, file1, file2, config),
        FileKind::Directory
        | FileKind::Symlink
        | FileKind::Device
        | FileKind::Text
        | FileKind::Binary => Ok(Vec::new()),
    }
}

fn compare_mismatched(
    file1: &SourceFile,
    file2: &SourceFile,
    source: Option<&str>,
    config: &Config,
) -> Result<Option<Difference>> {
    let special = |f: &SourceFile| f.is_directory() || f.is_symlink() || f.is_device();
    let comparable = !special(file1) && !special(file2);

    // Same bytes under two names can still specialize differently
    // (name-sensitive formats); that is not a difference.
    if comparable && file::same_content(file1, file2)? {
        return Ok(None);
    }

    let mut root = root_difference(file1, file2, source);
    root.comment = Some(format!(
        "File formats differ ({} vs {})",
        file1.magic(),
        file2.magic()
    ));
    if comparable {
        root.unified_diff = diff::from_raw_reads(file1, file2, config)?;
    }
    Ok(Some(root))
}

pub(crate) fn root_difference(
    file1: &SourceFile,
    file2: &SourceFile,
    source: Option<&str>,
) -> Difference {
    match source {
        Some(tag) => Difference::new(tag, tag),
        None => Difference::new(file1.name(), file2.name()),
    }
}

fn read_text(file: &SourceFile, config: &Config) -> Result<String> {
    let bytes = file.read_capped(config.max_report_size)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
