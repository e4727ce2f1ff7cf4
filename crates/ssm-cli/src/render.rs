//! Terminal rendering of the review surface.
//!
//! Row builders return plain strings so the layout can be checked without a
//! terminal; the table builders add styling on top.

use std::collections::HashMap;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use ssm_model::{ImportedVariable, MappingId, ReferenceVariable};
use ssm_review::{ReconciledView, ReviewSummary};

pub const REFERENCE_HEADERS: [&str; 5] = ["Ref ID", "Name", "Units", "Methods", "Status"];
pub const IMPORT_HEADERS: [&str; 6] = [
    "Dataset",
    "Trait ID",
    "Description",
    "Method",
    "Unit",
    "Best score",
];
pub const LINK_HEADERS: [&str; 5] = ["Import", "Reference", "Score", "Confidence", "Why"];

/// How tables are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Rounded borders, colors when the terminal supports them.
    Terminal,
    /// Markdown borders, never styled.
    Plain,
}

pub fn reference_rows(view: &ReconciledView) -> Vec<Vec<String>> {
    let mapped = view.summary().references_mapped;
    view.ordered_references
        .iter()
        .enumerate()
        .map(|(idx, reference)| reference_row(reference, idx < mapped))
        .collect()
}

fn reference_row(reference: &ReferenceVariable, mapped: bool) -> Vec<String> {
    vec![
        reference.ref_id.to_string(),
        reference.display_label().to_string(),
        reference.units.join(", "),
        reference.methods.join(", "),
        if mapped { "mapped" } else { "unmapped" }.to_string(),
    ]
}

pub fn import_rows(imports: &[ImportedVariable], view: &ReconciledView) -> Vec<Vec<String>> {
    imports
        .iter()
        .map(|import| {
            vec![
                import.dataset_id.clone(),
                import.trait_id.clone(),
                import.description.clone(),
                import.method.clone(),
                import.unit.clone(),
                format_score(view.best_score(&import.import_id)),
            ]
        })
        .collect()
}

/// One row per drawn link, in mapping order.
pub fn link_rows(imports: &[ImportedVariable], view: &ReconciledView) -> Vec<Vec<String>> {
    let reasons: HashMap<&MappingId, &str> = view
        .valid_mappings
        .iter()
        .map(|m| (&m.mapping.id, m.mapping.why_match.as_str()))
        .collect();
    view.links
        .iter()
        .filter_map(|link| {
            let import = imports.get(link.import_row)?;
            let reference = view.ordered_references.get(link.reference_row)?;
            Some(vec![
                import.display_label().to_string(),
                reference.ref_id.to_string(),
                format_score(Some(link.score)),
                if link.above_threshold { "above" } else { "below" }.to_string(),
                reasons
                    .get(&link.mapping_id)
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
            ])
        })
        .collect()
}

pub fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{s:.2}"))
}

/// One-line summary printed above the tables.
pub fn summary_line(view: &ReconciledView) -> String {
    let ReviewSummary {
        imports,
        imports_with_mapping,
        references_mapped,
        references_unmapped,
        valid_links,
        links_above_threshold,
        dangling,
    } = view.summary();
    let mut line = format!(
        "{imports_with_mapping}/{imports} variables mapped, \
         {references_mapped}/{} references used, \
         {links_above_threshold}/{valid_links} links at or above {}",
        references_mapped + references_unmapped,
        view.threshold,
    );
    if dangling > 0 {
        line.push_str(&format!(", {dangling} stale mappings ignored"));
    }
    line
}

pub fn build_table(headers: &[&str], rows: &[Vec<String>], mode: TableMode) -> Table {
    let mut table = Table::new();
    match mode {
        TableMode::Terminal => {
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_width(120);
            table.set_header(headers.iter().map(|h| header_cell(h)));
        }
        TableMode::Plain => {
            table.load_preset(ASCII_MARKDOWN).force_no_tty();
            table.set_header(headers.iter().copied());
        }
    }
    for row in rows {
        table.add_row(
            row.iter()
                .zip(headers)
                .map(|(value, header)| body_cell(value, header, mode)),
        );
    }
    if mode == TableMode::Terminal {
        for (idx, header) in headers.iter().enumerate() {
            if matches!(*header, "Score" | "Best score")
                && let Some(column) = table.column_mut(idx)
            {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
    }
    table
}

pub fn print_references(view: &ReconciledView, mode: TableMode) {
    let rows = reference_rows(view);
    println!("{}", build_table(&REFERENCE_HEADERS, &rows, mode));
}

pub fn print_imports(imports: &[ImportedVariable], view: &ReconciledView, mode: TableMode) {
    let rows = import_rows(imports, view);
    println!("{}", build_table(&IMPORT_HEADERS, &rows, mode));
}

pub fn print_review(imports: &[ImportedVariable], view: &ReconciledView, mode: TableMode) {
    println!("{}", summary_line(view));
    println!();
    println!("Variables");
    print_imports(imports, view, mode);
    println!();
    println!("Links");
    let rows = link_rows(imports, view);
    if rows.is_empty() {
        println!("No mappings.");
    } else {
        println!("{}", build_table(&LINK_HEADERS, &rows, mode));
    }
    println!();
    println!("Reference schema");
    print_references(view, mode);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn body_cell(value: &str, header: &str, mode: TableMode) -> Cell {
    let cell = Cell::new(value);
    if mode == TableMode::Plain {
        return cell;
    }
    match (header, value) {
        ("Status", "mapped") | ("Confidence", "above") => cell.fg(Color::Green),
        ("Confidence", "below") => cell.fg(Color::Yellow),
        ("Status", "unmapped") | ("Best score", "-") => cell.add_attribute(Attribute::Dim),
        _ => cell,
    }
}
