use crate::magic;
use nestdiff_common::{NestdiffError, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Sentinel path used for the missing side of an asymmetric pair.
pub const DEV_NULL: &str = "/dev/null";

/// Where a file's bytes live.
#[derive(Debug, Clone)]
enum Backing {
    /// Pre-existing filesystem path; nothing owned
    Filesystem(PathBuf),
    /// Materialized inside a temp dir owned by refcount. Cloning the
    /// `Arc` re-enters the extraction scope; dropping the last clone
    /// releases it.
    Extracted {
        path: PathBuf,
        _scope: Arc<TempDir>,
    },
    /// Sentinel for asymmetric pairs; reads as empty content
    NonExisting,
}

/// A leaf node in the containment tree: a named byte source with a
/// resolvable on-disk path and a sniffed type.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    magic: String,
    backing: Backing,
}

impl SourceFile {
    /// Wrap a pre-existing filesystem path, labeled by the path itself.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_named(path, &path.display().to_string())
    }

    /// Wrap a pre-existing filesystem path under a member-relative label.
    pub fn from_path_named(path: &Path, name: &str) -> Result<Self> {
        if std::fs::symlink_metadata(path).is_err() {
            return Err(NestdiffError::Input(format!(
                "{} does not exist",
                path.display()
            )));
        }
        let magic = magic::sniff(path)?;
        Ok(Self {
            name: name.to_string(),
            magic,
            backing: Backing::Filesystem(path.to_path_buf()),
        })
    }

    /// Wrap a path materialized inside `scope` by a container extraction.
    pub fn extracted(name: &str, path: PathBuf, scope: Arc<TempDir>) -> Result<Self> {
        let magic = magic::sniff(&path)?;
        Ok(Self {
            name: name.to_string(),
            magic,
            backing: Backing::Extracted {
                path,
                _scope: scope,
            },
        })
    }

    /// The sentinel used when one side of a pair has no counterpart.
    pub fn non_existing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            magic: String::new(),
            backing: Backing::NonExisting,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME-like kind string from content sniffing; empty for the
    /// non-existing sentinel.
    pub fn magic(&self) -> &str {
        &self.magic
    }

    pub fn exists(&self) -> bool {
        !matches!(self.backing, Backing::NonExisting)
    }

    /// On-disk path. Non-existing files resolve to `/dev/null` so diff
    /// machinery can consume them uniformly.
    pub fn path(&self) -> &Path {
        match &self.backing {
            Backing::Filesystem(path) => path,
            Backing::Extracted { path, .. } => path,
            Backing::NonExisting => Path::new(DEV_NULL),
        }
    }

    pub fn is_symlink(&self) -> bool {
        self.magic == "inode/symlink"
    }

    pub fn is_directory(&self) -> bool {
        self.magic == "inode/directory"
    }

    pub fn is_device(&self) -> bool {
        matches!(
            self.magic.as_str(),
            "inode/chardevice" | "inode/blockdevice" | "inode/fifo" | "inode/socket"
        )
    }

    /// Read up to `cap` bytes of content. The sentinel reads as empty.
    pub fn read_capped(&self, cap: usize) -> Result<Vec<u8>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(self.path())?;
        let mut buf = Vec::new();
        file.take(cap as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    pub fn size(&self) -> Result<u64> {
        if !self.exists() {
            return Ok(0);
        }
        Ok(std::fs::metadata(self.path())?.len())
    }
}

/// Cheap identity check: equal length, then streamed BLAKE3.
pub fn same_content(file1: &SourceFile, file2: &SourceFile) -> Result<bool> {
    if file1.size()? != file2.size()? {
        return Ok(false);
    }
    Ok(hash_file(file1.path())? == hash_file(file2.path())?)
}

fn hash_file(path: &Path) -> Result<blake3::Hash> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0; 64 * 1024];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}
