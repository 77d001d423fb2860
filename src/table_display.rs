use anyhow::Result;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use table_views::controllers::TableBindings;
use table_views::dom::element::TableElement;

/// Indices of the columns not hidden by the column menu
fn visible_columns(element: &TableElement) -> Vec<usize> {
    element
        .header
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.hidden)
        .map(|(i, _)| i)
        .collect()
}

/// Print the rows currently displayed, then the page controls and filter state
pub fn display_table(bindings: &TableBindings) {
    let element = bindings.table.element();
    let columns = visible_columns(&element);

    if let Some(heading) = &element.heading {
        println!("{}", heading.as_str().bold());
    }
    if columns.is_empty() {
        println!("{}", "All columns are hidden (use `show <col>` or `reset-columns`).".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        columns
            .iter()
            .map(|&i| Cell::new(element.header[i].label()).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );

    let mut shown = 0;
    for row in element.visible_rows() {
        let cells: Vec<String> = columns
            .iter()
            .map(|&i| match row.cell(i) {
                Some(cell) => match cell.status_dot {
                    Some(true) => "●".to_string(),
                    Some(false) => "○".to_string(),
                    None => cell.text.clone(),
                },
                None => String::new(),
            })
            .collect();
        table.add_row(cells);
        shown += 1;
    }
    drop(element);

    if shown == 0 {
        println!("{}", "No rows to show.".yellow());
    } else {
        println!("{table}");
    }

    match &bindings.pager {
        Some(pager) => {
            let pager = pager.borrow();
            println!("{}", pager.panel().render_line().cyan());
            println!("{}", pager.panel().summary.as_str().green());
        }
        None => println!("{}", format!("{} rows", shown).green()),
    }

    if let Some(active) = bindings.filters.as_ref().and_then(|f| f.active()) {
        println!(
            "{}",
            format!("Filter: {} = {}", active.column_name, active.label).magenta()
        );
    }
}

/// Export the effective rows in their current order, visible columns only
pub fn export_to_csv(bindings: &TableBindings, filename: &str) -> Result<usize> {
    let element = bindings.table.element();
    let columns = visible_columns(&element);
    let filter = element.filter_state();

    let mut wtr = csv::Writer::from_path(filename)?;
    wtr.write_record(columns.iter().map(|&i| element.header[i].text.trim()))?;

    let mut written = 0;
    for row in element.rows().iter().filter(|r| filter.matches(r)) {
        wtr.write_record(
            columns
                .iter()
                .map(|&i| row.cell(i).map(|c| c.text.trim()).unwrap_or("")),
        )?;
        written += 1;
    }

    wtr.flush()?;
    println!(
        "{}",
        format!("Exported {} rows to {}", written, filename).green()
    );
    Ok(written)
}
