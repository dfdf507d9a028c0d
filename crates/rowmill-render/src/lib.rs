#![forbid(unsafe_code)]
//! rowmill-render: markup rendering of materialized values.
//!
//! A pure function from a fully materialized value to markdown-ish markup.
//! Scalars render inline, a sequence of records renders as a table over the
//! union of field names (first-seen order), scalar sequences render as a
//! bulleted list. Row output is capped by `EngineConfig::render_max_rows`.

use rowmill_core::prelude::*;

pub fn render(value: &Value, caption: Option<&str>, config: &EngineConfig) -> String {
    let mut out = String::new();
    if let Some(caption) = caption {
        out.push_str("### ");
        out.push_str(caption);
        out.push_str("\n\n");
    }
    out.push_str(&render_value(value, config.render_max_rows));
    out
}

fn render_value(value: &Value, max_rows: usize) -> String {
    match value {
        Value::List(rows) if !rows.is_empty() && rows.iter().all(|r| r.as_record().is_some()) => {
            render_table(rows, max_rows)
        }
        Value::List(items) => render_list(items, max_rows),
        Value::Record(_) => render_table(std::slice::from_ref(value), max_rows),
        scalar => cell_text(scalar),
    }
}

fn render_table(rows: &[Value], max_rows: usize) -> String {
    // Header is the union of field names in first-seen order.
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        if let Some(record) = row.as_record() {
            for name in record.keys() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
        }
    }

    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&names.join(" | "));
    out.push_str(" |\n|");
    for _ in &names {
        out.push_str(" --- |");
    }
    out.push('\n');

    for row in rows.iter().take(max_rows) {
        out.push_str("| ");
        let cells: Vec<String> = names.iter().map(|name| cell_text(&row.get(name))).collect();
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }

    if rows.len() > max_rows {
        out.push_str(&format!("\n_{} more rows not shown_\n", rows.len() - max_rows));
    }
    out
}

fn render_list(items: &[Value], max_rows: usize) -> String {
    let mut out = String::new();
    for item in items.iter().take(max_rows) {
        out.push_str("- ");
        out.push_str(&cell_text(item));
        out.push('\n');
    }
    if items.len() > max_rows {
        out.push_str(&format!("\n_{} more items not shown_\n", items.len() - max_rows));
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        nested => serde_json::to_string(&serde_json::Value::from(nested.clone()))
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowmill_core::value::rows_from_json;
    use serde_json::json;

    #[test]
    fn scalars_render_inline() {
        let cfg = EngineConfig::default();
        assert_eq!(render(&Value::Int(7), None, &cfg), "7");
        assert_eq!(render(&Value::Str("ok".into()), None, &cfg), "ok");
    }

    #[test]
    fn record_rows_render_as_a_table() {
        let cfg = EngineConfig::default();
        let rows = Value::List(rows_from_json(json!([
            {"id": 1, "name": "a"},
            {"id": 2, "name": "b"},
        ])));
        let markup = render(&rows, Some("people"), &cfg);
        assert!(markup.starts_with("### people\n\n"));
        assert!(markup.contains("| id | name |"));
        assert!(markup.contains("| 2 | b |"));
    }

    #[test]
    fn scalar_lists_render_as_bullets() {
        let cfg = EngineConfig::default();
        let rows = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let markup = render(&rows, None, &cfg);
        assert_eq!(markup, "- 1\n- 2\n");
    }

    #[test]
    fn long_tables_truncate() {
        let cfg = EngineConfig {
            render_max_rows: 2,
            ..EngineConfig::default()
        };
        let rows = Value::List(rows_from_json(json!([
            {"id": 1}, {"id": 2}, {"id": 3}, {"id": 4},
        ])));
        let markup = render(&rows, None, &cfg);
        assert!(markup.contains("_2 more rows not shown_"));
    }
}
