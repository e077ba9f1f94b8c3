use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};
use serde_json::Value;

/// A table column: header text and the JSON pointer of the cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    pub pointer: &'static str,
}

pub const fn column(header: &'static str, pointer: &'static str) -> Column {
    Column { header, pointer }
}

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Renders a resource, or an array of resources, one row each.
///
/// Without explicit columns the scalar fields of the first row are used.
pub fn value_table(value: &Value, columns: &[Column]) -> Table {
    let rows: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let columns: Vec<(String, String)> = if columns.is_empty() {
        derived_columns(rows.first().copied())
    } else {
        columns
            .iter()
            .map(|c| (c.header.to_string(), c.pointer.to_string()))
            .collect()
    };

    let mut table = create_table();
    table.set_header(
        columns
            .iter()
            .map(|(header, _)| Cell::new(header).fg(TableColor::Cyan))
            .collect::<Vec<_>>(),
    );

    for row in rows {
        let cells: Vec<Cell> = columns
            .iter()
            .map(|(header, pointer)| {
                let text = cell_text(row.pointer(pointer));
                if is_status_column(header) {
                    status_cell(text)
                } else {
                    Cell::new(text)
                }
            })
            .collect();
        table.add_row(cells);
    }

    table
}

fn derived_columns(first: Option<&Value>) -> Vec<(String, String)> {
    match first {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .map(|(key, _)| (key.clone(), format!("/{key}")))
            .collect(),
        _ => vec![("value".to_string(), String::new())],
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(_)) => "{…}".to_string(),
        Some(other) => other.to_string(),
    }
}

fn is_status_column(header: &str) -> bool {
    matches!(header, "Result" | "Status" | "State")
}

/// Colors Azure DevOps result and state values.
pub fn status_cell(text: String) -> Cell {
    let color = match text.as_str() {
        "succeeded" | "completed" | "wellFormed" | "active" => Some(TableColor::Green),
        "partiallySucceeded" | "inProgress" | "notStarted" | "pending" => {
            Some(TableColor::Yellow)
        }
        "failed" | "canceled" | "abandoned" | "deleted" => Some(TableColor::Red),
        _ => None,
    };

    match color {
        Some(color) => Cell::new(text).fg(color),
        None => Cell::new(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_with_columns() {
        let value = json!([
            {"id": 1, "name": "azdo-tasks-tests", "definition": {"name": "ci"}, "result": "failed"},
            {"id": 2, "name": "other", "result": null}
        ]);
        let columns = [
            column("ID", "/id"),
            column("Name", "/name"),
            column("Definition", "/definition/name"),
            column("Result", "/result"),
        ];

        let rendered = value_table(&value, &columns).to_string();

        assert!(rendered.contains("Definition"));
        assert!(rendered.contains("azdo-tasks-tests"));
        assert!(rendered.contains("ci"));
        assert!(rendered.contains("failed"));
        assert!(rendered.contains('-'));
    }

    #[test]
    fn test_table_derives_columns_from_scalars() {
        let value = json!({"id": "p-1", "name": "labs", "links": {"web": "x"}, "tags": ["a"]});

        let rendered = value_table(&value, &[]).to_string();

        assert!(rendered.contains("name"));
        assert!(rendered.contains("labs"));
        assert!(!rendered.contains("links"));
        assert!(!rendered.contains("tags"));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(None), "-");
        assert_eq!(cell_text(Some(&json!(null))), "-");
        assert_eq!(cell_text(Some(&json!(true))), "true");
        assert_eq!(cell_text(Some(&json!(42))), "42");
        assert_eq!(cell_text(Some(&json!([1, 2]))), "[2 items]");
    }

    #[test]
    fn test_scalar_value_table() {
        let rendered = value_table(&json!(204), &[]).to_string();
        assert!(rendered.contains("204"));
    }
}
