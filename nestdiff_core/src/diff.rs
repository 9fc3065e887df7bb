use crate::file::SourceFile;
use nestdiff_common::{Config, Difference, Result};
use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 3;

/// Produce a unified diff between two texts, or `None` when equal.
///
/// A contiguous run of added or removed lines longer than
/// `config.max_diff_block_lines` is truncated in place: the first
/// `max_diff_block_lines` lines survive, the remainder collapses into one
/// `[ N lines removed ]` marker carrying the run's sign. Hunk headers
/// keep the true ranges so line numbering downstream stays correct.
pub fn unified_diff(text1: &str, text2: &str, config: &Config) -> Option<String> {
    if text1 == text2 {
        return None;
    }

    let diff = TextDiff::from_lines(text1, text2);
    let mut out = String::new();

    for group in diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old = first.old_range().start..last.old_range().end;
        let new = first.new_range().start..last.new_range().end;
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(old.start, old.len()),
            format_range(new.start, new.len()),
        ));

        let changes: Vec<(ChangeTag, String)> = group
            .iter()
            .flat_map(|op| diff.iter_changes(op))
            .map(|change| {
                let mut line = change.value().to_string();
                if !line.ends_with('\n') {
                    line.push('\n');
                }
                (change.tag(), line)
            })
            .collect();

        emit_capped(&mut out, &changes, config.max_diff_block_lines);
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Unified-diff range in the `start[,len]` envelope convention:
/// 1-based, the length omitted when 1, empty ranges anchored to the
/// preceding line.
fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

fn emit_capped(out: &mut String, changes: &[(ChangeTag, String)], cap: usize) {
    let mut i = 0;
    while i < changes.len() {
        let tag = changes[i].0;
        let mut end = i;
        while end < changes.len() && changes[end].0 == tag {
            end += 1;
        }
        let run = &changes[i..end];
        let sign = match tag {
            ChangeTag::Equal => ' ',
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
        };

        let truncate = tag != ChangeTag::Equal && cap > 0 && run.len() > cap;
        let shown = if truncate { cap } else { run.len() };
        for (_, line) in &run[..shown] {
            out.push(sign);
            out.push_str(line);
        }
        if truncate {
            out.push(sign);
            out.push_str(&format!("[ {} lines removed ]\n", run.len() - cap));
        }

        i = end;
    }
}

/// Diff two texts into a Difference, or `None` when equal.
///
/// When `source` is given it labels both sides (per-field diffs,
/// metadata blocks); otherwise the file labels are used.
pub fn from_text(
    text1: &str,
    text2: &str,
    label1: &str,
    label2: &str,
    source: Option<&str>,
    config: &Config,
) -> Option<Difference> {
    let unified = unified_diff(text1, text2, config)?;
    let (source1, source2) = match source {
        Some(tag) => (tag, tag),
        None => (label1, label2),
    };
    Some(Difference::new(source1, source2).with_unified_diff(unified))
}

/// Byte-capped lossy diff of two files' raw content; the final fallback
/// for anything without a smarter comparator.
pub fn from_raw_reads(
    file1: &SourceFile,
    file2: &SourceFile,
    config: &Config,
) -> Result<Option<String>> {
    let bytes1 = file1.read_capped(config.max_report_size)?;
    let bytes2 = file2.read_capped(config.max_report_size)?;
    let text1 = String::from_utf8_lossy(&bytes1);
    let text2 = String::from_utf8_lossy(&bytes2);
    Ok(unified_diff(&text1, &text2, config))
}
