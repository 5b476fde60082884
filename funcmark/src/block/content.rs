//! Decoding of the structured text carried by `list` and `table` parameters.
//!
//! List items are separated by `|`, or by newlines when no `|` appears.
//! Table rows are separated by `|` and cells within a row by `,`; the
//! optional `align` parameter holds one `l`/`c`/`r` letter per column.

use crate::block::Params;

/// The items of a `list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItems {
    pub ordered: bool,
    pub items: Vec<String>,
}

impl ListItems {
    pub fn from_params(params: &Params) -> Self {
        let ordered = params.get("type").is_some_and(|t| t.to_string() == "ol");
        let items = params
            .get("items")
            .map(|raw| split_list_items(&raw.to_string()))
            .unwrap_or_default();
        ListItems { ordered, items }
    }
}

/// Split a raw `items` value, dropping blank entries.
pub fn split_list_items(raw: &str) -> Vec<String> {
    let pieces: Vec<&str> = if raw.contains('|') {
        raw.split('|').collect()
    } else {
        raw.split('\n').collect()
    };
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAlignment {
    None,
    Left,
    Center,
    Right,
}

impl ColumnAlignment {
    fn from_letter(letter: &str) -> Self {
        match letter {
            "l" => ColumnAlignment::Left,
            "c" => ColumnAlignment::Center,
            "r" => ColumnAlignment::Right,
            _ => ColumnAlignment::None,
        }
    }

    pub fn css(self) -> Option<&'static str> {
        match self {
            ColumnAlignment::None => None,
            ColumnAlignment::Left => Some("left"),
            ColumnAlignment::Center => Some("center"),
            ColumnAlignment::Right => Some("right"),
        }
    }
}

/// The decoded shape of a `table` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub rows: Vec<Vec<String>>,
    pub alignments: Vec<ColumnAlignment>,
    /// Whether the first row is a header row.
    pub header: bool,
}

impl TableSpec {
    pub fn from_params(params: &Params) -> Self {
        let rows = match params.get("rows").map(|r| r.to_string()) {
            Some(raw) if !raw.is_empty() => raw
                .split('|')
                .map(|row| row.split(',').map(|cell| cell.trim().to_string()).collect())
                .collect(),
            _ => Vec::new(),
        };
        let alignments = params
            .get("align")
            .map(|a| a.to_string())
            .unwrap_or_default()
            .split(',')
            .map(|a| ColumnAlignment::from_letter(a.trim()))
            .collect();
        let header = params.get("header").is_some_and(|h| h.to_string() == "true");
        TableSpec {
            rows,
            alignments,
            header,
        }
    }

    pub fn alignment(&self, column: usize) -> ColumnAlignment {
        self.alignments
            .get(column)
            .copied()
            .unwrap_or(ColumnAlignment::None)
    }

    pub fn header_row(&self) -> Option<&[String]> {
        if self.header {
            self.rows.first().map(Vec::as_slice)
        } else {
            None
        }
    }

    pub fn body_rows(&self) -> &[Vec<String>] {
        if self.header && !self.rows.is_empty() {
            &self.rows[1..]
        } else {
            &self.rows
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ParamValue;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, ParamValue)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn pipes_take_priority_over_newlines() {
        assert_eq!(split_list_items("a | b\nc | "), vec!["a", "b\nc"]);
        assert_eq!(split_list_items("a\n\n b \nc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn list_type_selects_ordering() {
        let ol = ListItems::from_params(&params(&[
            ("items", "one|two".into()),
            ("type", "ol".into()),
        ]));
        assert!(ol.ordered);
        assert_eq!(ol.items, vec!["one", "two"]);

        let ul = ListItems::from_params(&params(&[("type", "ul".into())]));
        assert!(!ul.ordered);
        assert!(ul.items.is_empty());
    }

    #[test]
    fn table_rows_cells_and_alignment() {
        let table = TableSpec::from_params(&params(&[
            ("rows", "Name, Age|Ann, 31|Bo, 7".into()),
            ("align", "l, r".into()),
            ("header", "true".into()),
        ]));
        assert_eq!(table.header_row(), Some(&["Name".to_string(), "Age".to_string()][..]));
        assert_eq!(table.body_rows().len(), 2);
        assert_eq!(table.alignment(0), ColumnAlignment::Left);
        assert_eq!(table.alignment(1), ColumnAlignment::Right);
        assert_eq!(table.alignment(5), ColumnAlignment::None);
    }

    #[test]
    fn table_without_header_keeps_every_row_in_the_body() {
        let table = TableSpec::from_params(&params(&[
            ("rows", "a,b|c,d".into()),
            ("header", "false".into()),
        ]));
        assert_eq!(table.header_row(), None);
        assert_eq!(table.body_rows().len(), 2);
    }

    #[test]
    fn empty_rows_give_an_empty_table() {
        let table = TableSpec::from_params(&params(&[("rows", "".into())]));
        assert!(table.rows.is_empty());
    }
}
