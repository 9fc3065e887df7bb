pub mod html;
pub mod text;

use anyhow::Context;
use nestdiff_common::Difference;
use std::io::Write;
use std::path::Path;

/// Whether a presenter finished the whole tree or hit its size cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendered {
    Complete,
    Truncated,
}

/// Write presenter output to a file, or to stdout for `-`.
pub fn write_output(target: &Path, content: &str) -> anyhow::Result<()> {
    if target == Path::new("-") {
        std::io::stdout()
            .write_all(content.as_bytes())
            .context("writing to stdout")?;
    } else {
        std::fs::write(target, content)
            .with_context(|| format!("writing {}", target.display()))?;
    }
    Ok(())
}

/// Pretty JSON rendering of the whole tree.
pub fn render_json(difference: &Difference) -> anyhow::Result<String> {
    let mut rendered = serde_json::to_string_pretty(difference)?;
    rendered.push('\n');
    Ok(rendered)
}
