//! String-typed working table.
//!
//! Every cell is either missing or a string, so rows from different records
//! (and different pages) can be unioned without any type reconciliation.

use rustc_hash::FxHashMap;

/// Column-named table of optional string cells
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    index: FxHashMap<String, usize>,
    /// Rows may be shorter than `columns`; absent trailing cells are missing
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table with a fixed set of columns
    pub fn with_columns(columns: &[&str]) -> Self {
        let mut table = Self::new();
        for name in columns {
            table.ensure_column(name);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column position, adding the column on first sight
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Append an all-missing row and return its index
    pub fn push_row(&mut self) -> usize {
        self.rows.push(Vec::new());
        self.rows.len() - 1
    }

    /// Append a row from (column, value) pairs
    pub fn push_record<'a>(&mut self, cells: impl IntoIterator<Item = (&'a str, String)>) -> usize {
        let row = self.push_row();
        for (name, value) in cells {
            self.set(row, name, value);
        }
        row
    }

    /// Set a cell, adding the column if needed
    ///
    /// # Panics
    /// If `row` is out of bounds.
    pub fn set(&mut self, row: usize, column: &str, value: String) {
        let col = self.ensure_column(column);
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = Some(value);
    }

    /// Cell value; `None` for a missing cell, unknown column or row
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = *self.index.get(column)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// All cells of a column, top to bottom; `None` if the column is unknown
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<&str>> + '_> {
        let col = *self.index.get(name)?;
        Some(
            self.rows
                .iter()
                .map(move |cells| cells.get(col).and_then(|c| c.as_deref())),
        )
    }

    /// Union-concatenate tables: columns in first-seen order, rows in input order
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let mut out = Table::new();
        for table in tables {
            out.append(table);
        }
        out
    }

    /// Append all rows of `other`, adding its columns as needed
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.ensure_column(name))
            .collect();
        for cells in other.rows {
            let mut row = Vec::new();
            for (src, value) in cells.into_iter().enumerate() {
                if let Some(value) = value {
                    let dst = mapping[src];
                    if row.len() <= dst {
                        row.resize(dst + 1, None);
                    }
                    row[dst] = Some(value);
                }
            }
            self.rows.push(row);
        }
    }

    /// Collapse to a single row where each column takes its first non-missing
    /// value top to bottom. An empty table stays empty.
    pub fn first_valid_row(&self) -> Table {
        let mut out = Table::new();
        for name in &self.columns {
            out.ensure_column(name);
        }
        if self.rows.is_empty() {
            return out;
        }
        let row = out.push_row();
        for name in &self.columns {
            if let Some(value) = self.column(name).and_then(|mut c| c.find_map(|v| v)) {
                out.set(row, name, value.to_string());
            }
        }
        out
    }

    /// Set `column` to `value` on every row, adding the column even when empty
    pub fn fill_column(&mut self, column: &str, value: &str) {
        self.ensure_column(column);
        for row in 0..self.rows.len() {
            self.set(row, column, value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(table: &Table, column: &str) -> Vec<Option<String>> {
        table
            .column(column)
            .map(|c| c.map(|v| v.map(str::to_string)).collect())
            .unwrap_or_default()
    }

    #[test]
    fn set_and_get_grow_lazily() {
        let mut t = Table::new();
        let r0 = t.push_row();
        t.set(r0, "a", "1".to_string());
        let r1 = t.push_row();
        t.set(r1, "b", "2".to_string());

        assert_eq!(t.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(t.get(0, "a"), Some("1"));
        assert_eq!(t.get(0, "b"), None);
        assert_eq!(t.get(1, "a"), None);
        assert_eq!(t.get(1, "b"), Some("2"));
        assert_eq!(t.get(5, "b"), None);
        assert_eq!(t.get(0, "zzz"), None);
    }

    #[test]
    fn concat_unions_columns() {
        let mut a = Table::new();
        a.push_record([("x", "1".to_string())]);
        let mut b = Table::new();
        b.push_record([("y", "2".to_string()), ("x", "3".to_string())]);

        let t = Table::concat([a, b]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.columns(), &["x".to_string(), "y".to_string()]);
        assert_eq!(cells(&t, "x"), vec![Some("1".into()), Some("3".into())]);
        assert_eq!(cells(&t, "y"), vec![None, Some("2".into())]);
    }

    #[test]
    fn concat_keeps_columns_of_empty_tables() {
        let t = Table::concat([Table::with_columns(&["id"]), Table::new()]);
        assert!(t.is_empty());
        assert!(t.has_column("id"));
    }

    #[test]
    fn first_valid_row_backfills() {
        let mut t = Table::new();
        t.push_record([("issue", "4".to_string())]);
        t.push_record([("volume", "12".to_string())]);
        t.push_record([("title", "Heart".to_string()), ("issue", "9".to_string())]);

        let one = t.first_valid_row();
        assert_eq!(one.len(), 1);
        assert_eq!(one.get(0, "issue"), Some("4"));
        assert_eq!(one.get(0, "volume"), Some("12"));
        assert_eq!(one.get(0, "title"), Some("Heart"));
    }

    #[test]
    fn first_valid_row_of_empty_is_empty() {
        let t = Table::with_columns(&["a"]).first_valid_row();
        assert!(t.is_empty());
        assert!(t.has_column("a"));
    }

    #[test]
    fn fill_column_on_empty_table_adds_schema() {
        let mut t = Table::new();
        t.fill_column("id", "PMC1");
        assert!(t.is_empty());
        assert!(t.has_column("id"));
    }
}
