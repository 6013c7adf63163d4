//! The indented (`.sass`) dialect.
//!
//! Rather than a second stylesheet parser, indented source is rewritten to
//! SCSS ahead of parsing.  The rewrite is line-preserving: a statement
//! stays on its source line, with braces and semicolons appended in place,
//! so diagnostics and source maps keep their line numbers.

/// Converts indented-syntax source text to equivalent SCSS.
pub fn to_scss(source: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    // Indentation widths of the currently open blocks.
    let mut stack: Vec<usize> = Vec::new();

    for (i, raw) in lines.iter().enumerate() {
        let content = raw.trim_end();
        let trimmed = content.trim_start();
        if trimmed.is_empty() {
            out.push(String::new());
            continue;
        }
        let indent = indentation(content);

        // Close blocks this line has dedented out of, appending the braces
        // to the previous non-blank output line.
        let mut closers = 0;
        while let Some(&top) = stack.last() {
            if indent <= top {
                stack.pop();
                closers += 1;
            } else {
                break;
            }
        }
        if closers > 0 {
            if let Some(prev) = out.iter_mut().rev().find(|l| !l.is_empty()) {
                for _ in 0..closers {
                    prev.push_str(" }");
                }
            }
        }

        if trimmed.starts_with("//") {
            out.push(content.to_string());
            continue;
        }

        let statement = expand_shorthand(trimmed);
        let opens_block = next_content_indent(&lines, i).map_or(false, |next| next > indent);

        let mut line = String::new();
        line.push_str(&content[..content.len() - trimmed.len()]);
        line.push_str(&statement);
        if opens_block {
            stack.push(indent);
            line.push_str(" {");
        } else if trimmed.starts_with("/*") {
            if !trimmed.ends_with("*/") {
                line.push_str(" */");
            }
        } else if is_selector_like(&statement) {
            // A childless selector still needs a block.
            line.push_str(" {}");
        } else {
            line.push(';');
        }
        out.push(line);
    }

    // Close whatever is still open on the final line.
    if !stack.is_empty() {
        if let Some(prev) = out.iter_mut().rev().find(|l| !l.is_empty()) {
            for _ in 0..stack.len() {
                prev.push_str(" }");
            }
        }
    }

    let mut result = out.join("\n");
    result.push('\n');
    result
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn next_content_indent(lines: &[&str], from: usize) -> Option<usize> {
    lines[from + 1..]
        .iter()
        .find(|l| !l.trim().is_empty())
        .map(|l| indentation(l))
}

/// The indented dialect's `=name` / `+name` shorthands for `@mixin` and
/// `@include`.
fn expand_shorthand(line: &str) -> String {
    if let Some(rest) = line.strip_prefix('=') {
        return format!("@mixin {}", rest);
    }
    if let Some(rest) = line.strip_prefix('+') {
        if rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '-') {
            return format!("@include {}", rest);
        }
    }
    line.to_string()
}

/// Whether a childless statement line needs an empty block rather than a
/// semicolon.  Properties have `: `, variables start with `$`, at-rules
/// with `@`; what remains is a selector.
fn is_selector_like(line: &str) -> bool {
    if line.starts_with('@') || line.starts_with('$') || line.starts_with("/*") {
        return false;
    }
    !(line.contains(": ") || line.ends_with(':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_basic_nesting() {
        let scss = to_scss("a\n  color: red\n");
        assert_eq!(scss, "a {\n  color: red; }\n");
    }

    #[test]
    fn preserves_line_numbers() {
        let sass = "a\n  color: red\n\nb\n  width: 1px\n";
        let scss = to_scss(sass);
        assert_eq!(sass.lines().count(), scss.lines().count());
        let lines: Vec<&str> = scss.lines().collect();
        assert_eq!(lines[0], "a {");
        assert_eq!(lines[1], "  color: red; }");
        assert_eq!(lines[3], "b {");
    }

    #[test]
    fn deep_nesting_closes_in_place() {
        let scss = to_scss("a\n  b\n    x: 1\n  y: 2\n");
        let lines: Vec<&str> = scss.lines().collect();
        assert_eq!(lines[0], "a {");
        assert_eq!(lines[1], "  b {");
        assert_eq!(lines[2], "    x: 1; }");
        assert_eq!(lines[3], "  y: 2; }");
    }

    #[test]
    fn mixin_shorthands() {
        let scss = to_scss("=big\n  size: 10px\na\n  +big\n");
        assert!(scss.contains("@mixin big {"));
        assert!(scss.contains("@include big;"));
    }

    #[test]
    fn plus_selector_is_not_include() {
        let scss = to_scss("a\n  + b\n    x: 1\n");
        assert!(scss.contains("+ b {"));
        assert!(!scss.contains("@include"));
    }

    #[test]
    fn pseudo_selector_lines_keep_block() {
        let scss = to_scss("a:hover\n  x: 1\n");
        assert_eq!(scss, "a:hover {\n  x: 1; }\n");
    }

    #[test]
    fn variables_and_at_rules_get_semicolons() {
        let scss = to_scss("$x: 1\n@import \"other\"\na\n  b: $x\n");
        assert!(scss.contains("$x: 1;"));
        assert!(scss.contains("@import \"other\";"));
    }

    #[test]
    fn silent_comments_pass_through() {
        let scss = to_scss("// note\na\n  x: 1\n");
        assert!(scss.starts_with("// note\n"));
    }
}
