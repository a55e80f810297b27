//! Document-tree primitives over the Trace.axd markup
//!
//! The trace viewer renders every section as its own `<table>` whose first row
//! carries an `<h3>` title, optionally followed by a header row of `<th>` cells
//! and then data rows.

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

const REQUEST_DETAILS: &str = "Request Details";
const TRACE_INFORMATION: &str = "Trace Information";
const HEADERS_COLLECTION: &str = "Headers Collection";
const REQUEST_COOKIES: &str = "Request Cookies Collection";
const SERVER_VARIABLES: &str = "Server Variables";

/// Named sections of a request detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    /// Label/value pairs of the "Request Details" block, labels without `:`
    pub request: BTreeMap<String, String>,

    /// One column-name to value mapping per "Trace Information" row
    pub trace_info: Vec<BTreeMap<String, String>>,

    pub headers: BTreeMap<String, String>,

    pub cookies: BTreeMap<String, String>,

    pub server_variables: BTreeMap<String, String>,
}

impl DetailFields {
    /// Returns true if none of the known sections were present
    pub fn is_empty(&self) -> bool {
        self.request.is_empty()
            && self.trace_info.is_empty()
            && self.headers.is_empty()
            && self.cookies.is_empty()
            && self.server_variables.is_empty()
    }
}

/// A titled table of the trace viewer
#[derive(Debug, Default)]
struct Section {
    title: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Parses HTML text into a navigable document tree
///
/// Parsing is lenient: malformed markup still yields a (possibly empty) tree.
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Extracts every table row as the ordered texts of its own `<td>` cells
///
/// Rows without data cells (header rows) come back empty. Cells of tables
/// nested inside a row belong to the nested rows, not to the outer one.
pub fn extract_rows(document: &Html) -> Vec<Vec<String>> {
    let Ok(row_selector) = Selector::parse("tr") else {
        return Vec::new();
    };

    document
        .select(&row_selector)
        .map(|row| child_cells(row, &["td"]).into_iter().map(cell_text).collect())
        .collect()
}

/// Extracts the known detail sections of a request detail page
pub fn extract_detail_fields(document: &Html) -> DetailFields {
    let mut fields = DetailFields::default();

    for section in extract_sections(document) {
        if section.title.eq_ignore_ascii_case(REQUEST_DETAILS) {
            // Label and value cells alternate along each row
            for row in &section.rows {
                for pair in row.chunks(2) {
                    if let [label, value] = pair {
                        let label = label.trim_end_matches(':').trim();
                        if !label.is_empty() {
                            fields.request.insert(label.to_string(), value.clone());
                        }
                    }
                }
            }
        } else if section.title.eq_ignore_ascii_case(TRACE_INFORMATION) {
            for row in &section.rows {
                let record = row
                    .iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let key = section
                            .columns
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("column{}", i));
                        (key, value.clone())
                    })
                    .collect();
                fields.trace_info.push(record);
            }
        } else if section.title.eq_ignore_ascii_case(HEADERS_COLLECTION) {
            fields.headers.extend(name_value_pairs(&section));
        } else if section.title.eq_ignore_ascii_case(REQUEST_COOKIES) {
            fields.cookies.extend(name_value_pairs(&section));
        } else if section.title.eq_ignore_ascii_case(SERVER_VARIABLES) {
            fields.server_variables.extend(name_value_pairs(&section));
        }
    }

    fields
}

/// Collects the titled tables of a document
fn extract_sections(document: &Html) -> Vec<Section> {
    let (Ok(table_selector), Ok(title_selector), Ok(row_selector)) = (
        Selector::parse("table"),
        Selector::parse("h3"),
        Selector::parse("tr"),
    ) else {
        return Vec::new();
    };

    let mut sections = Vec::new();

    for table in document.select(&table_selector) {
        let Some(title) = table.select(&title_selector).next().map(cell_text) else {
            continue;
        };

        let mut section = Section {
            title,
            ..Section::default()
        };

        for row in table.select(&row_selector) {
            if row.select(&title_selector).next().is_some() {
                continue;
            }

            let cells = child_cells(row, &["th", "td"]);
            if cells.is_empty() {
                continue;
            }

            let header_row = cells.iter().all(|cell| cell.value().name() == "th");
            let texts: Vec<String> = cells.into_iter().map(cell_text).collect();

            if header_row && section.columns.is_empty() {
                section.columns = texts;
            } else {
                section.rows.push(texts);
            }
        }

        sections.push(section);
    }

    sections
}

/// First two cells of each row as a name/value pair
fn name_value_pairs(section: &Section) -> impl Iterator<Item = (String, String)> + '_ {
    section.rows.iter().filter_map(|row| match row.as_slice() {
        [name, value, ..] if !name.is_empty() => Some((name.clone(), value.clone())),
        _ => None,
    })
}

/// Direct child cells of a row whose tag is one of `names`
fn child_cells<'a>(row: ElementRef<'a>, names: &[&str]) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| names.iter().any(|name| *name == cell.value().name()))
        .collect()
}

/// Text content of an element with whitespace runs collapsed
fn cell_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
