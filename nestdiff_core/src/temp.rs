use nestdiff_common::{Config, Result};
use std::sync::Arc;
use tempfile::TempDir;

/// Create a fresh private scratch directory for one extraction scope.
///
/// The directory and everything written inside it are removed when the
/// last `Arc` clone drops, on every exit path. Containers hand clones to
/// the members they extract, so nested scopes release inner-first.
pub fn scratch_dir(config: &Config) -> Result<Arc<TempDir>> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("nestdiff-");
    let dir = match &config.scratch_dir {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };
    Ok(Arc::new(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestdiff_common::Config;

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let root = tempfile::TempDir::new().unwrap();
        let config = Config {
            scratch_dir: Some(root.path().to_path_buf()),
            ..Default::default()
        };

        let scratch = scratch_dir(&config).unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::write(path.join("member"), b"data").unwrap();
        assert!(path.exists());

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_dir_survives_while_cloned() {
        let config = Config::default();
        let scratch = scratch_dir(&config).unwrap();
        let clone = Arc::clone(&scratch);
        let path = scratch.path().to_path_buf();

        drop(scratch);
        assert!(path.exists());
        drop(clone);
        assert!(!path.exists());
    }
}
