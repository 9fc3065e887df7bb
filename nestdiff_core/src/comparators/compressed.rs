use crate::container::{compare_containers, compressed_content_name, Container, EmptyContainer};
use crate::diff;
use crate::file::SourceFile;
use crate::temp;
use nestdiff_common::{Config, Difference, NestdiffError, Result};
use std::fs::File;
use std::io::{self, Read};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;

/// In-process single-stream codecs.
#[derive(Debug, Clone, Copy)]
enum Codec {
    Gzip,
    Xz,
    Bzip2,
}

impl Codec {
    fn suffix(self) -> &'static str {
        match self {
            Codec::Gzip => ".gz",
            Codec::Xz => ".xz",
            Codec::Bzip2 => ".bz2",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Codec::Gzip => "gzip",
            Codec::Xz => "xz",
            Codec::Bzip2 => "bzip2",
        }
    }

    fn decoder(self, input: File) -> Box<dyn Read> {
        match self {
            Codec::Gzip => Box::new(flate2::read::GzDecoder::new(input)),
            Codec::Xz => Box::new(xz2::read::XzDecoder::new(input)),
            Codec::Bzip2 => Box::new(bzip2::read::BzDecoder::new(input)),
        }
    }
}

/// A compressed stream seen as a container with exactly one synthetic
/// member, named by stripping the compression suffix.
struct CompressedContainer {
    source: SourceFile,
    codec: Codec,
    names: Vec<String>,
    scope: Arc<TempDir>,
}

impl CompressedContainer {
    fn open(file: &SourceFile, codec: Codec, config: &Config) -> Result<Box<dyn Container>> {
        if !file.exists() {
            return Ok(Box::new(EmptyContainer));
        }
        let member = compressed_content_name(file.name(), codec.suffix());
        Ok(Box::new(Self {
            source: file.clone(),
            codec,
            names: vec![member],
            scope: temp::scratch_dir(config)?,
        }))
    }
}

impl Container for CompressedContainer {
    fn member_names(&self) -> &[String] {
        &self.names
    }

    fn member(&self, name: &str) -> Result<SourceFile> {
        let dest = self.scope.path().join(name);
        debug!("{} extracting to {}", self.codec.name(), dest.display());

        let input = File::open(self.source.path())?;
        let mut decoder = self.codec.decoder(input);
        let mut output = File::create(&dest)?;
        io::copy(&mut decoder, &mut output).map_err(|e| {
            NestdiffError::Archive(format!(
                "{} failed to decompress {}: {}",
                self.codec.name(),
                self.source.name(),
                e
            ))
        })?;

        SourceFile::extracted(name, dest, Arc::clone(&self.scope))
    }
}

pub(crate) fn gzip_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let mut details = Vec::new();
    // gzip headers carry mtime and original name; surface the sniffed
    // metadata before descending
    if let Some(metadata) = diff::from_text(
        file1.magic(),
        file2.magic(),
        file1.name(),
        file2.name(),
        Some("metadata"),
        config,
    ) {
        details.push(metadata);
    }
    details.extend(stream_details(file1, file2, Codec::Gzip, config)?);
    Ok(details)
}

pub(crate) fn xz_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    stream_details(file1, file2, Codec::Xz, config)
}

pub(crate) fn bzip2_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    stream_details(file1, file2, Codec::Bzip2, config)
}

fn stream_details(
    file1: &SourceFile,
    file2: &SourceFile,
    codec: Codec,
    config: &Config,
) -> Result<Vec<Difference>> {
    let container1 = CompressedContainer::open(file1, codec, config)?;
    let container2 = CompressedContainer::open(file2, codec, config)?;

    // Both streams decompress to exactly one synthetic member whose name
    // derives from the archive name, so a 1:1 pair is forced directly;
    // name-based pairing would treat `test1` vs `test2` as asymmetric.
    let (names1, names2) = (container1.member_names(), container2.member_names());
    if let (Some(name1), Some(name2)) = (names1.first(), names2.first()) {
        let member1 = container1.member(name1)?;
        let member2 = container2.member(name2)?;
        return Ok(crate::comparators::compare(&member1, &member2, None, config)?
            .into_iter()
            .collect());
    }

    // One side is the sentinel; fall back to regular pairing against it
    compare_containers(&*container1, &*container2, config)
}
