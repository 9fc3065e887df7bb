use crate::file::SourceFile;
use crate::tools::{self, ExternalCommand};
use nestdiff_common::{Config, Difference, Result};

const PDFTOTEXT: ExternalCommand = ExternalCommand::new("pdftotext", &["{}", "-"]);
const PDFTK: ExternalCommand = ExternalCommand::new("pdftk", &["{}", "output", "-", "uncompress"]);

/// Extracted text first, then the uncompressed object stream for
/// differences the text layer cannot show.
pub(crate) fn compare_details(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Vec<Difference>> {
    let mut details = Vec::new();
    details.extend(tools::from_command(&PDFTOTEXT, file1, file2, config)?);
    details.extend(tools::from_command(&PDFTK, file1, file2, config)?);
    Ok(details)
}
