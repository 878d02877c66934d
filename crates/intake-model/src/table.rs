//! Raw tabular input as supplied by the caller.

use serde::{Deserialize, Serialize};

/// A single cell of a raw extract.
///
/// Deserializes untagged so a JSON row such as `["A1", 42, null]` maps to
/// text, number and empty cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    #[default]
    Empty,
}

impl CellValue {
    /// Text rendering of the cell; empty cells render as an empty string.
    ///
    /// Integral numbers render without a fractional part so an id of `1042`
    /// stays `"1042"` rather than `"1042.0"`.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => {
                if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            CellValue::Empty => String::new(),
        }
    }

    /// True for empty cells and for text cells holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(_) => false,
            CellValue::Empty => true,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Ordered headers plus ordered rows. Headers are not necessarily unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(1042.0).as_text(), "1042");
        assert_eq!(CellValue::Number(12.5).as_text(), "12.5");
        assert_eq!(CellValue::Empty.as_text(), "");
    }

    #[test]
    fn cells_deserialize_untagged() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"["A1", 7, null]"#).unwrap();
        assert_eq!(
            cells,
            vec![
                CellValue::Text("A1".to_string()),
                CellValue::Number(7.0),
                CellValue::Empty
            ]
        );
    }
}
