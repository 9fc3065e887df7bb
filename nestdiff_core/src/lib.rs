//! Core comparison engine for Nestdiff.
//!
//! Nestdiff reports the semantic differences between two file trees or
//! archive artifacts produced by software builds. Given two inputs, it
//! walks their containment structure recursively and emits a
//! [`Difference`](nestdiff_common::Difference) tree that pins every
//! discrepancy to the lowest meaningful layer: a changed text line
//! inside a compressed file inside a package, rather than "the packages
//! differ".
//!
//! This crate is UI-agnostic; presenters live in the CLI crate.
//!
//! # Architecture
//!
//! - **File handles**: [`SourceFile`] abstracts a named byte source with
//!   a resolvable on-disk path; extracted members keep their temp-dir
//!   scope alive by refcount.
//! - **Identification**: [`magic`] sniffs a MIME-like kind string;
//!   [`specialize`] maps it through an ordered format registry to a
//!   concrete [`FileKind`].
//! - **Recursion**: [`compare`] dispatches to per-format comparators;
//!   container formats pair members by name via
//!   [`container::compare_containers`] and recurse.
//! - **Diff production**: [`diff`] renders unified diffs in-process with
//!   per-hunk truncation.
//! - **External tools**: [`tools`] wraps the subprocess calls used by
//!   formats without an in-process decoder (isoinfo, pdftotext, ar, ...).
//!
//! # Quick start
//!
//! ```no_run
//! use nestdiff_common::Config;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! match nestdiff_core::compare_paths(
//!     Path::new("build1/package.tar"),
//!     Path::new("build2/package.tar"),
//!     &config,
//! )? {
//!     Some(difference) => println!("{} nodes differ", difference.node_count()),
//!     None => println!("identical"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod comparators;
pub mod container;
pub mod diff;
pub mod file;
pub mod magic;
pub mod temp;
pub mod tools;

pub use comparators::{compare, specialize, FileKind};
pub use container::{compare_containers, pair_names, Container};
pub use file::SourceFile;

use nestdiff_common::{Config, Difference, Result};
use std::path::Path;
use tracing::info;

/// Compare two filesystem inputs (files, archives, or directories).
///
/// Returns `None` when the inputs are semantically identical. Missing
/// inputs are fatal before any recursion starts.
pub fn compare_paths(
    path1: &Path,
    path2: &Path,
    config: &Config,
) -> Result<Option<Difference>> {
    let file1 = SourceFile::from_path(path1)?;
    let file2 = SourceFile::from_path(path2)?;
    info!(
        "comparing {} ({}) with {} ({})",
        file1.name(),
        file1.magic(),
        file2.name(),
        file2.magic()
    );
    compare(&file1, &file2, None, config)
}
