use nestdiff_common::Difference;

/// Render the Difference tree as indented plain text, unified diffs
/// inline behind `│ ` gutters.
pub fn render_text(difference: &Difference) -> String {
    let mut out = String::new();
    render(difference, "", &mut out);
    out
}

fn render(difference: &Difference, prefix: &str, out: &mut String) {
    out.push_str(prefix);
    out.push_str("--- ");
    out.push_str(&difference.source1);
    out.push('\n');
    out.push_str(prefix);
    out.push_str("+++ ");
    out.push_str(&difference.source2);
    out.push('\n');

    if let Some(comment) = &difference.comment {
        for line in comment.lines() {
            out.push_str(prefix);
            out.push_str("│┄ ");
            out.push_str(line);
            out.push('\n');
        }
    }

    if let Some(diff) = &difference.unified_diff {
        for line in diff.lines() {
            out.push_str(prefix);
            out.push_str("│ ");
            out.push_str(line);
            out.push('\n');
        }
    }

    let child_prefix = format!("{prefix}  ");
    for detail in &difference.details {
        render(detail, &child_prefix, out);
    }
}
