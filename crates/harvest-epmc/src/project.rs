//! Pivot grant and journal side tables back onto the record table.

use rustc_hash::FxHashMap;

use crate::flatten::{ID_COLUMN, JOURNAL_INFO, VALUE_SEPARATOR};
use crate::parser::ParsedPage;
use crate::table::Table;

/// Group holding one entry per funding grant
pub const GRANTS_LIST: &str = "grantsList";

/// (side table, source column, derived column)
const DERIVED: &[(&str, &str, &str)] = &[
    (GRANTS_LIST, "grantId", "grants"),
    (JOURNAL_INFO, "title", "journal_name"),
    (JOURNAL_INFO, "ISSN", "ISSN"),
    (JOURNAL_INFO, "ESSN", "ESSN"),
    (JOURNAL_INFO, "journalIssueId", "journalIssueId"),
    (JOURNAL_INFO, "printPublicationDate", "printPublicationDate"),
];

/// Names of the columns added by [`project`]
pub fn derived_columns() -> impl Iterator<Item = &'static str> {
    DERIVED.iter().map(|(_, _, name)| *name)
}

/// Stand-in for a side table whose group never appeared on the page
fn placeholder(tag: &str) -> Table {
    match tag {
        GRANTS_LIST => Table::with_columns(&["grantId", ID_COLUMN]),
        _ => Table::with_columns(&[ID_COLUMN]),
    }
}

/// identity → non-empty values of `column`, in side table order
fn values_by_id<'a>(side: &'a Table, column: &str) -> FxHashMap<&'a str, Vec<&'a str>> {
    let mut by_id: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    let (Some(ids), Some(values)) = (side.column(ID_COLUMN), side.column(column)) else {
        return by_id;
    };
    for (id, value) in ids.zip(values) {
        let (Some(id), Some(value)) = (id, value) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        by_id.entry(id).or_default().push(value);
    }
    by_id
}

/// Add the derived grant and journal columns to the page's record table.
///
/// Every derived column is present afterwards and every row has a value in
/// it: the matching side-table values joined with `"; "`, or `""` when the
/// record has none.
pub fn project(page: ParsedPage) -> Table {
    let ParsedPage {
        mut records,
        groups,
        ..
    } = page;

    let mut placeholders: FxHashMap<&str, Table> = FxHashMap::default();
    for (tag, _, _) in DERIVED {
        if !groups.contains_key(*tag) {
            placeholders.entry(tag).or_insert_with(|| placeholder(tag));
        }
    }

    for (tag, source, derived) in DERIVED {
        let side = groups
            .get(*tag)
            .or_else(|| placeholders.get(tag))
            .map(|t| values_by_id(t, source))
            .unwrap_or_default();

        let joined: Vec<String> = match records.column(ID_COLUMN) {
            Some(ids) => ids
                .map(|id| {
                    id.and_then(|id| side.get(id))
                        .map(|v| v.join(VALUE_SEPARATOR))
                        .unwrap_or_default()
                })
                .collect(),
            None => Vec::new(),
        };

        records.ensure_column(derived);
        for (row, value) in joined.into_iter().enumerate() {
            records.set(row, derived, value);
        }
    }

    records
}
