use std::path::Path;

const INDENT_BLOCK: i64 = 2;
const INDENT_SUBQUERY: i64 = 8;

/// The file name of a query shard without its directory and `.rq`/`.sparql` extension.
pub fn clean_name(name: &str) -> &str {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    file_name
        .strip_suffix(".rq")
        .or_else(|| file_name.strip_suffix(".sparql"))
        .unwrap_or(file_name)
}

/// Re-indents a composed query to make it readable.
///
/// Blocks are indented on `{`/`}`, the body of a `SELECT` whose `WHERE` is on another line is
/// indented further, and `;` continuations are aligned after their subject. Runs of blank lines
/// are collapsed into one. Comment lines never change the indentation. This only understands the
/// layout produced by the composer, not SPARQL in general.
pub fn indent(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth: i64 = 0;
    let mut blank = false;
    let mut by_semicolon: i64 = 0;

    for line in text.lines() {
        let line = line.trim();

        let previous_blank = blank;
        blank = line.is_empty();
        if previous_blank && blank {
            continue;
        }

        let is_comment = line.starts_with('#');
        if !is_comment {
            if line.ends_with('}') {
                depth -= INDENT_BLOCK;
            }
            if line.contains("WHERE") && !line.contains("SELECT") {
                depth -= INDENT_SUBQUERY;
            }
        }

        if !blank {
            let width = usize::try_from(depth).unwrap_or(0);
            out.push_str(&" ".repeat(width));
            out.push_str(line);
        }
        out.push('\n');

        if !is_comment {
            if line.ends_with('{') {
                depth += INDENT_BLOCK;
            }
            if line.contains("SELECT") && !line.contains("WHERE") {
                depth += INDENT_SUBQUERY;
            }

            if by_semicolon != 0 && line.ends_with('.') {
                depth -= by_semicolon;
                by_semicolon = 0;
            } else if line.ends_with(';') && by_semicolon == 0 {
                let subject = line.split_whitespace().next().unwrap_or_default();
                by_semicolon = i64::try_from(subject.chars().count()).unwrap_or(0) + 1;
                depth += by_semicolon;
            }
        }
    }
    out
}
