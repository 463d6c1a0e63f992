//! Labeled key/value rows
//!
//! The specification block of a detail page is a table whose rows pair a
//! label cell with a value cell. Some template revisions render the same block
//! as `div` rows carrying a label and a value child, which is read as well.

use crate::extract::text::{clean_text, element_text};
use scraper::{Html, Selector};

const TABLE_ROW_SELECTOR: &str = "tr";
const CELL_SELECTOR: &str = "th, td";
const DIV_ROW_SELECTOR: &str = r#"[class*="content-list"] > div, [data-test="specification"] > div"#;

/// Label/value pairs in document order
#[derive(Debug, Clone, Default)]
pub struct LabeledRows {
    rows: Vec<(String, String)>,
}

impl LabeledRows {
    pub fn from_document(document: &Html) -> Self {
        let mut rows = Vec::new();

        if let (Ok(row_sel), Ok(cell_sel)) = (
            Selector::parse(TABLE_ROW_SELECTOR),
            Selector::parse(CELL_SELECTOR),
        ) {
            for row in document.select(&row_sel) {
                let cells: Vec<String> = row.select(&cell_sel).map(|c| element_text(&c)).collect();
                if let [label, value, ..] = cells.as_slice() {
                    push_row(&mut rows, label, value);
                }
            }
        }

        if let Ok(div_sel) = Selector::parse(DIV_ROW_SELECTOR) {
            for row in document.select(&div_sel) {
                let parts: Vec<String> = row
                    .children()
                    .filter_map(scraper::ElementRef::wrap)
                    .map(|c| element_text(&c))
                    .collect();
                if let [label, value, ..] = parts.as_slice() {
                    push_row(&mut rows, label, value);
                }
            }
        }

        Self { rows }
    }

    /// Value of the first row whose normalized label equals `label`
    pub fn get(&self, label: &str) -> Option<&str> {
        let wanted = normalize_label(label);
        self.rows
            .iter()
            .find(|(l, _)| *l == wanted)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn push_row(rows: &mut Vec<(String, String)>, label: &str, value: &str) {
    let label = normalize_label(label);
    let value = clean_text(value);
    if !label.is_empty() && !value.is_empty() {
        rows.push((label, value));
    }
}

/// Collapses whitespace, drops a trailing colon and lower-cases the label
fn normalize_label(label: &str) -> String {
    clean_text(label)
        .trim_end_matches(':')
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows() {
        let html = Html::parse_document(
            r#"<table>
                <tr><td>Danh mục</td><td>Vitamin C</td></tr>
                <tr><th>Thành phần:</th><td>Vitamin C 500mg</td></tr>
                <tr><td>Chỉ một ô</td></tr>
            </table>"#,
        );
        let rows = LabeledRows::from_document(&html);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.get("Danh mục"), Some("Vitamin C"));
        assert_eq!(rows.get("Thành phần"), Some("Vitamin C 500mg"));
    }

    #[test]
    fn test_exact_label_match() {
        let html = Html::parse_document(
            "<table><tr><td>Nhà sản xuất</td><td>DHG</td></tr></table>",
        );
        let rows = LabeledRows::from_document(&html);
        assert_eq!(rows.get("Nhà sản"), None);
        assert_eq!(rows.get("Nước sản xuất"), None);
    }

    #[test]
    fn test_div_rows() {
        let html = Html::parse_document(
            r#"<div class="content-list">
                <div><p>Quy cách</p><div>Hộp 10 Vỉ x 10 Viên</div></div>
            </div>"#,
        );
        let rows = LabeledRows::from_document(&html);
        assert_eq!(rows.get("Quy cách"), Some("Hộp 10 Vỉ x 10 Viên"));
    }
}
