use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use intake_model::{IntakeResponse, Issue, Severity};

pub fn print_summary(response: &IntakeResponse) {
    let meta = &response.meta;
    println!(
        "Result: {}",
        if response.success { "accepted" } else { "rejected" }
    );
    println!("Generated: {}", meta.generated_at);
    if !response.mapping_meta.unmapped_headers.is_empty() {
        println!(
            "Unmapped headers: {}",
            response.mapping_meta.unmapped_headers.join(", ")
        );
    }

    print_mapping_table(response);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rows"),
        header_cell("Blank"),
        header_cell("Truncated"),
        header_cell("Records"),
        header_cell("Confidence"),
        header_cell("Errors"),
        header_cell("Warnings"),
        header_cell("Dropped"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(meta.rows_analyzed).add_attribute(Attribute::Bold),
        count_cell(meta.blank_rows_skipped, Color::DarkGrey),
        count_cell(meta.rows_truncated, Color::Yellow),
        Cell::new(meta.records_emitted).add_attribute(Attribute::Bold),
        confidence_cell(meta.confidence_average),
        count_cell(meta.error_count, Color::Red),
        count_cell(meta.warning_count, Color::Yellow),
        count_cell(meta.issues_dropped, Color::Yellow),
    ]);
    println!("{table}");

    print_issue_table(&response.issues);
}

fn print_mapping_table(response: &IntakeResponse) {
    if response.mapping.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Header"), header_cell("Field")]);
    apply_table_style(&mut table);
    // Split fields appear under their composite "date + time" key.
    for (header, field) in response.mapping.iter() {
        table.add_row(vec![Cell::new(header), field_cell(field.as_str())]);
    }
    println!("Mapping:");
    println!("{table}");
}

fn print_issue_table(issues: &[Issue]) {
    if issues.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Column"),
        header_cell("Rows"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.code),
            issue
                .column
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            rows_cell(issue.rows.as_deref()),
            message_cell(issue),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn rows_cell(rows: Option<&[usize]>) -> Cell {
    const SHOWN: usize = 5;
    match rows {
        Some(rows) if !rows.is_empty() => {
            let mut text = rows
                .iter()
                .take(SHOWN)
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            if rows.len() > SHOWN {
                text.push_str(&format!(" (+{})", rows.len() - SHOWN));
            }
            Cell::new(text)
        }
        _ => dim_cell("-"),
    }
}

fn message_cell(issue: &Issue) -> Cell {
    match &issue.suggestion {
        Some(suggestion) => Cell::new(format!("{}\nhint: {suggestion}", issue.message)),
        None => Cell::new(&issue.message),
    }
}

fn confidence_cell(average: Option<f64>) -> Cell {
    match average {
        Some(value) => Cell::new(format!("{value:.2}")),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 5 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Fixed(26)),
            ColumnConstraint::UpperBoundary(Width::Fixed(24)),
            ColumnConstraint::UpperBoundary(Width::Fixed(22)),
            ColumnConstraint::UpperBoundary(Width::Percentage(55)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warn => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn field_cell(field: &str) -> Cell {
    Cell::new(field)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
