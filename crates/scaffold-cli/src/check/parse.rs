//! Checker output parsing.
//!
//! Turns raw compiler/checker output into structured `ErrorInfo` rows.
//! Recognizes the TypeScript compiler format and the rustc format, with
//! a generic fallback for anything else.

use scaffold_core::{ErrorInfo, Severity};

/// Which checker produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckerFormat {
    TypeScript,
    Rust,
    Unknown,
}

/// Parse checker output into structured errors, in source order.
pub fn parse_checker_output(output: &str) -> Vec<ErrorInfo> {
    let mut errors = match detect_format(output) {
        CheckerFormat::TypeScript => parse_typescript_output(output),
        CheckerFormat::Rust => parse_rust_output(output),
        CheckerFormat::Unknown => parse_generic_output(output),
    };
    errors.sort_by(|a, b| {
        (a.file_path.as_str(), a.line, a.column).cmp(&(b.file_path.as_str(), b.line, b.column))
    });
    errors
}

fn detect_format(output: &str) -> CheckerFormat {
    if output.contains("): error TS") || output.contains("): warning TS") {
        return CheckerFormat::TypeScript;
    }
    if output.contains("error[E") || output.contains("--> ") {
        return CheckerFormat::Rust;
    }
    CheckerFormat::Unknown
}

/// Parse tsc output: "src/api.ts(10,5): error TS2304: Cannot find name 'foo'."
fn parse_typescript_output(output: &str) -> Vec<ErrorInfo> {
    output.lines().filter_map(parse_typescript_line).collect()
}

fn parse_typescript_line(line: &str) -> Option<ErrorInfo> {
    let line = line.trim();
    let paren_start = line.find('(')?;
    let paren_end = line.find(')')?;
    let colon_after_paren = line[paren_end..].find(':')? + paren_end;

    let file = &line[..paren_start];
    let loc = &line[paren_start + 1..paren_end];
    let rest = line[colon_after_paren + 1..].trim();

    let mut loc_parts = loc.split(',');
    let line_num = loc_parts.next()?.trim().parse::<u32>().ok()?;
    let column = loc_parts
        .next()
        .and_then(|c| c.trim().parse::<u32>().ok())
        .unwrap_or(1);

    let (severity, message) = if let Some(tail) = rest.strip_prefix("error TS") {
        let colon = tail.find(':')?;
        (Severity::Error, tail[colon + 1..].trim())
    } else if let Some(tail) = rest.strip_prefix("warning TS") {
        let colon = tail.find(':')?;
        (Severity::Warning, tail[colon + 1..].trim())
    } else {
        return None;
    };

    if message.is_empty() || file.is_empty() {
        return None;
    }
    Some(ErrorInfo::with_severity(file, line_num, column, message, severity))
}

/// Parse rustc output: an "error[E0308]: ..." header line followed by a
/// "--> src/main.rs:10:5" location line.
fn parse_rust_output(output: &str) -> Vec<ErrorInfo> {
    let mut errors = Vec::new();
    let mut pending: Option<(Severity, String)> = None;

    for line in output.lines() {
        let trimmed = line.trim();

        if let Some(header) = parse_rust_header(trimmed) {
            pending = Some(header);
            continue;
        }

        if let Some(loc) = trimmed.strip_prefix("--> ") {
            if let Some((severity, message)) = pending.take() {
                if let Some((file, line_num, column)) = parse_rust_location(loc) {
                    errors.push(ErrorInfo::with_severity(
                        file, line_num, column, message, severity,
                    ));
                }
            }
        }
    }

    errors
}

fn parse_rust_header(line: &str) -> Option<(Severity, String)> {
    if line.starts_with("error[") || line.starts_with("error:") {
        let colon = line.find(':')?;
        let message = line[colon + 1..].trim();
        if !message.is_empty() {
            return Some((Severity::Error, message.to_string()));
        }
    }
    if let Some(rest) = line.strip_prefix("warning:") {
        let message = rest.trim();
        // Summary lines like "warning: 2 warnings emitted" carry no location.
        if !message.is_empty() && !message.ends_with("emitted") {
            return Some((Severity::Warning, message.to_string()));
        }
    }
    None
}

fn parse_rust_location(loc: &str) -> Option<(&str, u32, u32)> {
    let mut parts = loc.split(':');
    let file = parts.next()?;
    let line_num = parts.next()?.trim().parse::<u32>().ok()?;
    let column = parts
        .next()
        .and_then(|c| c.trim().parse::<u32>().ok())
        .unwrap_or(1);
    Some((file, line_num, column))
}

/// Fallback: any line mentioning "error" becomes an unlocated error row.
fn parse_generic_output(output: &str) -> Vec<ErrorInfo> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.to_lowercase().contains("error"))
        .map(|line| ErrorInfo::new("<unknown>", 0, 0, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typescript_errors() {
        let output = "\
src/api.ts(10,5): error TS2304: Cannot find name 'foo'.
src/api.ts(3,1): error TS1005: ';' expected.
";
        let errors = parse_checker_output(output);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].file_path, "src/api.ts");
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].column, 1);
        assert_eq!(errors[0].message, "';' expected.");
        assert_eq!(errors[1].line, 10);
        assert_eq!(errors[1].severity, Severity::Error);
    }

    #[test]
    fn test_parse_typescript_warning() {
        let output = "src/api.ts(2,3): warning TS6133: 'x' is declared but never used.";
        let errors = parse_checker_output(output);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Warning);
    }

    #[test]
    fn test_parse_rust_errors() {
        let output = "\
error[E0308]: mismatched types
  --> src/main.rs:10:5
   |
10 |     let x: i32 = \"hello\";
   |                  ^^^^^^^ expected `i32`, found `&str`

error: aborting due to 1 previous error
";
        let errors = parse_checker_output(output);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file_path, "src/main.rs");
        assert_eq!(errors[0].line, 10);
        assert_eq!(errors[0].column, 5);
        assert_eq!(errors[0].message, "mismatched types");
    }

    #[test]
    fn test_parse_rust_warning_with_location() {
        let output = "\
warning: unused variable: `x`
 --> lib.rs:4:9
";
        let errors = parse_checker_output(output);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Warning);
        assert_eq!(errors[0].file_path, "lib.rs");
    }

    #[test]
    fn test_rust_summary_line_is_skipped() {
        let output = "\
warning: 2 warnings emitted
";
        assert!(parse_checker_output(output).is_empty());
    }

    #[test]
    fn test_sorted_by_location() {
        let output = "\
b.ts(5,1): error TS1005: ';' expected.
a.ts(9,2): error TS2304: Cannot find name 'x'.
a.ts(1,1): error TS1005: ',' expected.
";
        let errors = parse_checker_output(output);
        let order: Vec<_> = errors
            .iter()
            .map(|e| (e.file_path.as_str(), e.line))
            .collect();
        assert_eq!(order, vec![("a.ts", 1), ("a.ts", 9), ("b.ts", 5)]);
    }

    #[test]
    fn test_generic_fallback() {
        let output = "something went wrong: error in template\nall good here\n";
        let errors = parse_checker_output(output);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].file_path, "<unknown>");
    }

    #[test]
    fn test_empty_output() {
        assert!(parse_checker_output("").is_empty());
    }
}
