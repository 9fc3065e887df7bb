use crate::diff;
use crate::file::SourceFile;
use nestdiff_common::{Config, Difference, NestdiffError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// An external tool invocation template. `{}` in the argument list is
/// replaced by the target path; when absent the path is appended.
#[derive(Debug, Clone, Copy)]
pub struct ExternalCommand {
    pub tool: &'static str,
    pub args: &'static [&'static str],
    /// Feed the file on stdin instead of passing its path (sng)
    pub feed_stdin: bool,
}

impl ExternalCommand {
    pub const fn new(tool: &'static str, args: &'static [&'static str]) -> Self {
        Self {
            tool,
            args,
            feed_stdin: false,
        }
    }

    pub const fn via_stdin(tool: &'static str) -> Self {
        Self {
            tool,
            args: &[],
            feed_stdin: true,
        }
    }

    /// Shared source label for the Difference this command produces.
    pub fn label(&self) -> String {
        if self.args.is_empty() {
            self.tool.to_string()
        } else {
            format!("{} {}", self.tool, self.args.join(" "))
        }
    }

    fn build(&self, path: &Path) -> Result<Command> {
        let mut cmd = Command::new(self.tool);
        if self.feed_stdin {
            cmd.stdin(Stdio::from(std::fs::File::open(path)?));
        } else {
            let mut substituted = false;
            for arg in self.args {
                if *arg == "{}" {
                    cmd.arg(path);
                    substituted = true;
                } else {
                    cmd.arg(arg);
                }
            }
            if !substituted {
                cmd.arg(path);
            }
            cmd.stdin(Stdio::null());
        }
        cmd.env("LC_ALL", "C.UTF-8");
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        Ok(cmd)
    }
}

/// True when `tool` resolves to an executable file on PATH.
pub fn tool_exists(tool: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(tool).is_file())
}

fn require_tool(tool: &str) -> Result<()> {
    if tool_exists(tool) {
        Ok(())
    } else {
        Err(NestdiffError::ToolMissing {
            tool: tool.to_string(),
        })
    }
}

/// Run `command` against `path`, returning buffered stdout truncated at
/// `config.max_report_size`. Nonzero exit is a `ToolFailed` error
/// carrying the captured stderr.
pub fn run_tool(command: &ExternalCommand, path: &Path, config: &Config) -> Result<String> {
    require_tool(command.tool)?;
    debug!("running {} on {}", command.tool, path.display());

    let output = command.build(path)?.output()?;
    if !output.status.success() {
        return Err(NestdiffError::ToolFailed {
            tool: command.tool.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    stdout.truncate(config.max_report_size);
    Ok(stdout)
}

/// Capture the stdout bytes of an ad-hoc tool invocation whose arguments
/// vary per call (member extraction).
pub fn capture_bytes(tool: &str, args: &[&std::ffi::OsStr]) -> Result<Vec<u8>> {
    require_tool(tool)?;
    let output = Command::new(tool)
        .args(args)
        .env("LC_ALL", "C.UTF-8")
        .stdin(Stdio::null())
        .output()?;
    if !output.status.success() {
        return Err(NestdiffError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output.stdout)
}

/// Run an external tool over both sides and diff the outputs.
///
/// A missing tool propagates `ToolMissing` so the caller can degrade the
/// whole comparator; a tool failure becomes a local error node so
/// siblings keep going. The non-existing sentinel contributes empty
/// output without an invocation.
pub fn from_command(
    command: &ExternalCommand,
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Option<Difference>> {
    let label = command.label();

    let mut outputs = Vec::with_capacity(2);
    for file in [file1, file2] {
        if !file.exists() {
            outputs.push(String::new());
            continue;
        }
        match run_tool(command, file.path(), config) {
            Ok(stdout) => outputs.push(stdout),
            Err(NestdiffError::ToolFailed {
                tool,
                status,
                stderr,
            }) => {
                let mut comment = format!("{tool} exited with {status}");
                if !stderr.trim().is_empty() {
                    comment.push_str(&format!(": {}", stderr.trim()));
                }
                return Ok(Some(
                    Difference::new(label.as_str(), label.as_str()).with_comment(comment),
                ));
            }
            Err(e) => return Err(e),
        }
    }

    let (out2, out1) = (outputs.pop().unwrap_or_default(), outputs.pop().unwrap_or_default());
    Ok(diff::from_text(
        &out1,
        &out2,
        file1.name(),
        file2.name(),
        Some(&label),
        config,
    ))
}
