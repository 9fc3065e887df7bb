use super::Rendered;
use nestdiff_common::{Config, Difference};

const HEADER: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>nestdiff report</title>
  <style>
    body {
      background: white;
      color: black;
    }
    .footer {
      font-size: small;
    }
    .difference {
      border: outset #888 1px;
      background-color: rgba(0,0,0,.1);
      padding: 0.5em;
      margin: 0.5em 0;
    }
    .difference pre {
      overflow: auto;
    }
    .comment {
      font-style: italic;
    }
    .source {
      font-weight: bold;
    }
    .error {
      border: solid black 1px;
      background: red;
      color: white;
      padding: 0.2em;
    }
  </style>
</head>
<body>
"#;

const FOOTER: &str = "<div class=\"footer\">Generated by nestdiff</div>\n</body>\n</html>\n";

/// Raised internally when the size cap is hit; rendering finishes the
/// document with a truncation banner instead of surfacing an error.
struct LimitReached;

struct SizedWriter {
    out: String,
    limit: usize,
}

impl SizedWriter {
    fn new(limit: usize) -> Self {
        Self {
            out: String::new(),
            limit,
        }
    }

    fn emit(&mut self, fragment: &str) -> Result<(), LimitReached> {
        self.out.push_str(fragment);
        if self.out.len() >= self.limit {
            Err(LimitReached)
        } else {
            Ok(())
        }
    }

    /// Closing markup must land even past the limit.
    fn emit_forced(&mut self, fragment: &str) {
        self.out.push_str(fragment);
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the Difference tree as a standalone HTML document. The byte
/// cap comes from `config.max_report_size`; hitting it yields a
/// truncated but well-formed document.
pub fn render_html(difference: &Difference, config: &Config) -> (String, Rendered) {
    let mut writer = SizedWriter::new(config.max_report_size);
    writer.emit_forced(HEADER);

    let rendered = match render_node(&mut writer, difference) {
        Ok(()) => Rendered::Complete,
        Err(LimitReached) => {
            writer.emit_forced("<div class=\"error\">Reached report size limit; output truncated.</div>\n");
            Rendered::Truncated
        }
    };

    writer.emit_forced(FOOTER);
    (writer.out, rendered)
}

fn render_node(writer: &mut SizedWriter, difference: &Difference) -> Result<(), LimitReached> {
    writer.emit("<div class=\"difference\">\n")?;

    // equal labels are rendered once
    if difference.source1 == difference.source2 {
        writer.emit(&format!(
            "<div class=\"source\">{}</div>\n",
            escape(&difference.source1)
        ))?;
    } else {
        writer.emit(&format!(
            "<div class=\"source\">{} vs {}</div>\n",
            escape(&difference.source1),
            escape(&difference.source2)
        ))?;
    }

    if let Some(comment) = &difference.comment {
        writer.emit(&format!(
            "<div class=\"comment\">{}</div>\n",
            escape(comment)
        ))?;
    }

    if let Some(diff) = &difference.unified_diff {
        writer.emit(&format!("<pre>{}</pre>\n", escape(diff)))?;
    }

    for detail in &difference.details {
        render_node(writer, detail)?;
    }

    writer.emit("</div>\n")?;
    Ok(())
}
