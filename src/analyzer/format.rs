//! Best-effort whitespace normalization.

/// Normalizes whitespace without touching anything else.
///
/// - `\r\n` and lone `\r` become `\n`
/// - tabs in the leading indentation become `indent_width` spaces
/// - trailing whitespace is stripped from every line
/// - leading and trailing blank lines are dropped
/// - the output ends with exactly one newline (or is empty)
///
/// Tabs after the first non-blank character are kept, so string literals are
/// never altered. The transform is idempotent.
pub fn format_code(code: &str, indent_width: usize) -> String {
    let unified = code.replace("\r\n", "\n").replace('\r', "\n");
    let tab = " ".repeat(indent_width);

    let lines: Vec<String> = unified
        .split('\n')
        .map(|line| {
            let line = line.trim_end();
            let body = line.trim_start_matches([' ', '\t']);
            let indent = &line[..line.len() - body.len()];
            format!("{}{}", indent.replace('\t', &tab), body)
        })
        .collect();

    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());

    match (first, last) {
        (Some(first), Some(last)) => {
            let mut out = lines[first..=last].join("\n");
            out.push('\n');
            out
        }
        _ => String::new(),
    }
}
