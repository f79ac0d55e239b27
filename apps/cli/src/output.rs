//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: could not encode output: {}", e),
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => print_json(&json!({"status": "success", "message": message})),
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", json!({"status": "error", "message": message}));
        }
    }
}

/// Print a labelled value.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<22} {}", format!("{}:", label), value);
}

pub fn print_divider(width: usize) {
    println!("{}", "-".repeat(width));
}

pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider(50);
}

/// Render a JSON scalar for a table cell.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) if s.is_empty() => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items.iter().map(|v| cell(Some(v))).collect::<Vec<_>>().join(", "),
        Some(other) => other.to_string(),
    }
}

/// Print rows of JSON objects as a fixed-width table.
pub fn print_table(columns: &[(&str, usize)], rows: &[Value]) {
    let header: Vec<String> = columns
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = *width))
        .collect();
    println!("{}", header.join(" ").trim_end());
    print_divider(columns.iter().map(|(_, w)| w + 1).sum());

    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .map(|(name, width)| {
                format!("{:<width$}", truncate(&cell(row.get(*name)), *width), width = *width)
            })
            .collect();
        println!("{}", line.join(" ").trim_end());
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_rendering() {
        assert_eq!(cell(None), "-");
        assert_eq!(cell(Some(&Value::Null)), "-");
        assert_eq!(cell(Some(&json!(""))), "-");
        assert_eq!(cell(Some(&json!("Grade 5"))), "Grade 5");
        assert_eq!(cell(Some(&json!(42))), "42");
        assert_eq!(cell(Some(&json!(["Math", "Physics"]))), "Math, Physics");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title", 6), "a ver…");
    }
}
