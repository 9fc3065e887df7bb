use crate::comparators::FileKind;
use crate::file::SourceFile;
use crate::tools::{self, ExternalCommand};
use nestdiff_common::{Config, Difference, Result};

/// Formats whose whole comparison is one external rendering tool run on
/// each side and a diff of the outputs.
fn command_for(kind: FileKind) -> ExternalCommand {
    match kind {
        FileKind::Pe => ExternalCommand::new("pedump", &["{}"]),
        FileKind::Elf => ExternalCommand::new("readelf", &["--all", "{}"]),
        FileKind::Sqlite => ExternalCommand::new("sqlite3", &["{}", ".dump"]),
        FileKind::Png => ExternalCommand::via_stdin("sng"),
        FileKind::Tiff => ExternalCommand::new("tiffinfo", &["{}"]),
        FileKind::Mo => ExternalCommand::new("msgunfmt", &["{}"]),
        FileKind::Class => {
            ExternalCommand::new("javap", &["-verbose", "-constants", "-s", "-l", "-private", "{}"])
        }
        other => unreachable!("{other:?} is not a command-rendered format"),
    }
}

pub(crate) fn compare_details(
    kind: FileKind,
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let command = command_for(kind);
    Ok(tools::from_command(&command, file1, file2, config)?
        .into_iter()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_command_kind_has_a_tool() {
        for kind in [
            FileKind::Pe,
            FileKind::Elf,
            FileKind::Sqlite,
            FileKind::Png,
            FileKind::Tiff,
            FileKind::Mo,
            FileKind::Class,
        ] {
            assert!(!command_for(kind).tool.is_empty());
        }
    }
}
