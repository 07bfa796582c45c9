// cli/resolve.rs - `gocursor resolve` subcommand
//
// Resolves the cursor context at one position of a Go file and prints it,
// either as aligned text or as JSON.

use std::path::PathBuf;

use ropey::Rope;

use crate::context::ContextSummary;
use crate::resolver::Resolver;

/// Where the cursor is, as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorArg {
    /// Byte offset
    Offset(usize),
    /// 1-based line and column (column counted in characters)
    LineCol { line: usize, col: usize },
}

#[derive(Debug)]
pub struct ResolveArgs {
    pub path: PathBuf,
    pub cursor: CursorArg,
    pub json: bool,
}

fn parse_number(flag: &str, value: Option<String>) -> Result<usize, String> {
    let value = value.ok_or_else(|| format!("{} requires a value", flag))?;
    value
        .parse()
        .map_err(|_| format!("{} expects a non-negative integer, got '{}'", flag, value))
}

/// Parse `resolve` arguments from the remaining CLI args.
///
/// Expected usage: `gocursor resolve <file> (--offset N | --line L --col C) [--json]`
pub fn parse_args(args: &mut impl Iterator<Item = String>) -> Result<ResolveArgs, String> {
    let mut path: Option<PathBuf> = None;
    let mut offset: Option<usize> = None;
    let mut line: Option<usize> = None;
    let mut col: Option<usize> = None;
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--offset" => offset = Some(parse_number("--offset", args.next())?),
            "--line" => line = Some(parse_number("--line", args.next())?),
            "--col" => col = Some(parse_number("--col", args.next())?),
            other if other.starts_with('-') => {
                return Err(format!("Unknown flag: '{}'", other));
            }
            _ => {
                if path.is_some() {
                    return Err("Multiple paths provided; expected exactly one".to_string());
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    let path = path.ok_or_else(|| "Missing required <file> argument".to_string())?;
    let cursor = match (offset, line, col) {
        (Some(offset), None, None) => CursorArg::Offset(offset),
        (None, Some(line), Some(col)) if line > 0 && col > 0 => CursorArg::LineCol { line, col },
        (None, Some(_), Some(_)) => return Err("--line and --col are 1-based".to_string()),
        _ => return Err("Expected either --offset N or --line L --col C".to_string()),
    };

    Ok(ResolveArgs { path, cursor, json })
}

/// Convert a cursor argument into a byte offset within `text`.
pub fn byte_offset(text: &str, cursor: CursorArg) -> Result<usize, String> {
    match cursor {
        CursorArg::Offset(offset) => Ok(offset),
        CursorArg::LineCol { line, col } => {
            let rope = Rope::from_str(text);
            let line_idx = line - 1;
            if line_idx >= rope.len_lines() {
                return Err(format!(
                    "Line {} out of range (file has {} lines)",
                    line,
                    rope.len_lines()
                ));
            }
            let line_len = rope.line(line_idx).len_chars();
            if col - 1 > line_len {
                return Err(format!("Column {} out of range on line {}", col, line));
            }
            let char_idx = rope.line_to_char(line_idx) + col - 1;
            Ok(rope.char_to_byte(char_idx))
        }
    }
}

/// Run the resolve command and return the summary.
///
/// The file need not be valid UTF-8. Line and column are counted on its
/// lossily decoded text.
pub fn run_resolve(args: &ResolveArgs) -> anyhow::Result<ContextSummary> {
    let bytes = std::fs::read(&args.path)?;
    let offset = match args.cursor {
        CursorArg::Offset(offset) => offset,
        cursor => {
            let text = String::from_utf8_lossy(&bytes);
            byte_offset(&text, cursor).map_err(anyhow::Error::msg)?
        }
    };
    let resolver = Resolver::new();
    let cx = resolver.resolve(&bytes, offset, Some(&args.path));
    Ok(cx.summary())
}

/// Print a summary in human-readable format.
pub fn print_summary(summary: &ContextSummary) {
    println!("  {:<10} {}", "scope", summary.scope);
    println!("  {:<10} {}", "package", summary.package_name);
    println!("  {:<10} {}", "test file", summary.is_test_file);
    println!("  {:<10} {}", "position", summary.position);
    println!("  {:<10} {}", "line", summary.current_line);
    println!("  {:<10} {}", "stack", summary.node_stack.join(" > "));
    if let Some(doc) = &summary.doc {
        println!("  {:<10} {}", "doc", doc.replace('\n', " "));
    }
    if !summary.function_name.is_empty() {
        println!("  {:<10} {}", "function", summary.function_name);
    }
    if !summary.method_name.is_empty() {
        println!("  {:<10} {}", "method", summary.method_name);
    }
}

pub fn print_summary_json(summary: &ContextSummary) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}
