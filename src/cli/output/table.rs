//! Table output formatting for CLI commands using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::cli::commands::check::CheckRow;
use crate::domain::models::SourceRef;

/// Longest recipe name shown in the sources table.
const SOURCE_NAME_WIDTH: usize = 60;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Recipes an answer drew on.
    pub fn format_sources(&self, sources: &[SourceRef]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Recipe").add_attribute(Attribute::Bold),
        ]);
        for source in sources {
            table.add_row(vec![Cell::new(source.id), Cell::new(truncate(&source.name, SOURCE_NAME_WIDTH))]);
        }
        table.to_string()
    }

    /// One row per checked component.
    pub fn format_checks(&self, rows: &[CheckRow]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("Component").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Detail").add_attribute(Attribute::Bold),
        ]);
        for row in rows {
            let label = if row.ok { "ok" } else { "failed" };
            let status = if self.use_colors {
                Cell::new(label).fg(if row.ok { Color::Green } else { Color::Red })
            } else {
                Cell::new(format!("{} {}", if row.ok { "✓" } else { "✗" }, label))
            };
            table.add_row(vec![Cell::new(&row.component), status, Cell::new(&row.detail)]);
        }
        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width);
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_table() {
        let formatter = TableFormatter::with_config(false, Some(80));
        let out = formatter.format_sources(&[
            SourceRef { id: 12, name: "Honey oat bars".to_string() },
            SourceRef { id: 40, name: "Apple crumble".to_string() },
        ]);
        assert!(out.contains("Honey oat bars"));
        assert!(out.contains("40"));
    }

    #[test]
    fn test_checks_table_without_color() {
        let formatter = TableFormatter::with_config(false, None);
        let out = formatter.format_checks(&[CheckRow {
            component: "database".to_string(),
            ok: false,
            detail: "connection refused".to_string(),
        }]);
        assert!(out.contains("✗ failed"));
        assert!(out.contains("connection refused"));
    }
}
