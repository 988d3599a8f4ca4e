//! Search page parser.
//!
//! Turns one XML response page into a flat record table (scalar fields),
//! one side table per nested group tag, and the continuation cursor.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::ParseError;
use crate::flatten::{ID_COLUMN, flatten_group};
use crate::table::Table;
use crate::xml::{Element, parse_document};

/// Element holding one search hit
pub const RECORD_TAG: &str = "result";

/// Element holding the cursor for the next page
pub const CURSOR_TAG: &str = "nextCursorMark";

/// One parsed search page
#[derive(Debug, Default)]
pub struct ParsedPage {
    /// One row per record: identity plus scalar fields
    pub records: Table,
    /// Group tag → concatenated flattened groups of every record on the page
    pub groups: FxHashMap<String, Table>,
    /// Cursor for the next page; `None` at the end of results
    pub cursor: Option<String>,
    /// Tags that hold text in some records and nested entries in others, sorted
    pub drifted: Vec<String>,
}

impl ParsedPage {
    /// Number of records on the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// How a record child is stored
enum Field<'a> {
    /// Text value for the record table
    Scalar(&'a str),
    /// Container of repeated entries
    Group,
}

fn classify(child: &Element) -> Field<'_> {
    if child.is_leaf() {
        return Field::Scalar(&child.text);
    }
    if child.own_text().is_some() {
        // Inline markup inside running text (e.g. <i> in an abstract)
        return Field::Scalar(&child.content);
    }
    Field::Group
}

/// Parse one search results page.
pub fn parse_page(xml: &str) -> Result<ParsedPage, ParseError> {
    let root = parse_document(xml)?;

    let cursor = root
        .find_first(CURSOR_TAG)
        .map(|e| e.text.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let mut records = Table::with_columns(&[ID_COLUMN]);
    // Filled lazily on first sight of each group tag
    let mut pending: FxHashMap<String, Vec<Table>> = FxHashMap::default();
    let mut scalar_tags: FxHashSet<&str> = FxHashSet::default();
    let mut group_tags: FxHashSet<&str> = FxHashSet::default();
    let mut seen_ids: FxHashSet<&str> = FxHashSet::default();

    for (i, result) in root.find_all(RECORD_TAG).into_iter().enumerate() {
        let first = result
            .children
            .first()
            .ok_or(ParseError::EmptyRecord { record: i })?;
        let id = first.text.trim();
        if id.is_empty() || !first.is_leaf() {
            return Err(ParseError::MissingIdentity {
                record: i,
                tag: first.name.clone(),
            });
        }
        if !seen_ids.insert(id) {
            log::warn!("Identity {id} appears more than once on this page (record #{i})");
        }

        let row = records.push_row();
        records.set(row, ID_COLUMN, id.to_string());
        if first.name != ID_COLUMN {
            records.set(row, &first.name, id.to_string());
        }

        let mut seen_in_record: FxHashSet<&str> = FxHashSet::default();
        seen_in_record.insert(first.name.as_str());
        for child in &result.children[1..] {
            let tag = child.name.as_str();
            match classify(child) {
                Field::Scalar(text) => {
                    // Blank leaves, including empty groups like <grantsList/>, carry nothing
                    if text.trim().is_empty() {
                        continue;
                    }
                    if !seen_in_record.insert(tag) {
                        log::warn!("Record {id}: field <{tag}> repeats, keeping the last value");
                    }
                    scalar_tags.insert(tag);
                    records.set(row, tag, text.to_string());
                }
                Field::Group => {
                    group_tags.insert(tag);
                    pending
                        .entry(tag.to_string())
                        .or_default()
                        .push(flatten_group(child, id));
                }
            }
        }
    }

    let mut drifted: Vec<String> = scalar_tags
        .intersection(&group_tags)
        .map(|tag| tag.to_string())
        .collect();
    drifted.sort();
    for tag in &drifted {
        log::warn!("Field <{tag}> is plain text in some records and nested in others");
    }

    let groups = pending
        .into_iter()
        .map(|(tag, tables)| (tag, Table::concat(tables)))
        .collect();

    Ok(ParsedPage {
        records,
        groups,
        cursor,
        drifted,
    })
}
