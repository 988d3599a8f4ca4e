//! Flatten one nested field group of one record into a table.
//!
//! A group such as `grantsList` holds repeated entries (`grant`), each with
//! its own sub-fields. Every entry becomes one row; the owning record's
//! identity is added as an `id` column so side tables can be joined back.

use crate::table::Table;
use crate::xml::Element;

/// Identity column shared by the record table and every side table
pub const ID_COLUMN: &str = "id";

/// Group holding journal metadata; modelled as one value per record
pub const JOURNAL_INFO: &str = "journalInfo";

/// Separator for repeated values inside one entry
pub const VALUE_SEPARATOR: &str = "; ";

/// Flatten `group` (one record's instance of a nested field) into a table.
///
/// Each entry is a direct child of `group`. Every non-blank text found in
/// the entry (the entry itself included) contributes a value under its tag
/// name; repeated tags within an entry are joined with `"; "`. Entries with
/// no text at all produce no row.
pub fn flatten_group(group: &Element, id: &str) -> Table {
    let mut table = Table::new();

    for entry in &group.children {
        // Tag order within the entry follows first appearance
        let mut fields: Vec<(&str, Vec<&str>)> = Vec::new();
        for node in entry.walk() {
            let Some(text) = node.own_text() else {
                continue;
            };
            match fields.iter_mut().find(|(tag, _)| *tag == node.name) {
                Some((_, values)) => values.push(text),
                None => fields.push((node.name.as_str(), vec![text])),
            }
        }
        if fields.is_empty() {
            continue;
        }
        table.push_record(
            fields
                .into_iter()
                .map(|(tag, values)| (tag, values.join(VALUE_SEPARATOR))),
        );
    }

    if group.name == JOURNAL_INFO {
        // Journal sub-fields are spread over sibling elements; one row per record
        table = table.first_valid_row();
    }

    table.fill_column(ID_COLUMN, id);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;
    use pretty_assertions::assert_eq;

    fn group(xml: &str) -> Element {
        parse_document(xml).unwrap()
    }

    #[test]
    fn repeated_subfield_is_joined() {
        let g = group("<list><entry><a>x</a><b>y</b><b>z</b></entry></list>");
        let t = flatten_group(&g, "PMC9");
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, "a"), Some("x"));
        assert_eq!(t.get(0, "b"), Some("y; z"));
        assert_eq!(t.get(0, "id"), Some("PMC9"));
    }

    #[test]
    fn one_row_per_entry() {
        let g = group(
            "<grantsList>\
               <grant><grantId>PG/1</grantId><agency>BHF</agency></grant>\
               <grant><agency>MRC</agency></grant>\
               <grant><grantId>RG/2</grantId><agency>BHF</agency></grant>\
             </grantsList>",
        );
        let t = flatten_group(&g, "123");
        assert_eq!(t.len(), 3);
        let ids: Vec<_> = t.column("grantId").unwrap().collect();
        assert_eq!(ids, vec![Some("PG/1"), None, Some("RG/2")]);
        let owners: Vec<_> = t.column("id").unwrap().collect();
        assert_eq!(owners, vec![Some("123"); 3]);
    }

    #[test]
    fn blank_values_are_dropped() {
        let g = group("<list><e><a>  </a><b>\n</b><c>v</c></e><e><a> </a></e></list>");
        let t = flatten_group(&g, "1");
        assert_eq!(t.len(), 1);
        assert!(!t.has_column("a"));
        assert!(!t.has_column("b"));
        assert_eq!(t.get(0, "c"), Some("v"));
    }

    #[test]
    fn leaf_entries_use_their_own_tag() {
        let g = group("<pubTypeList><pubType>Journal Article</pubType><pubType>Review</pubType></pubTypeList>");
        let t = flatten_group(&g, "1");
        let types: Vec<_> = t.column("pubType").unwrap().collect();
        assert_eq!(types, vec![Some("Journal Article"), Some("Review")]);
    }

    #[test]
    fn nested_subfields_flatten_into_entry() {
        let g = group(
            "<authorList><author><fullName>Smith J</fullName>\
               <authorAffiliationDetailsList>\
                 <authorAffiliation><affiliation>Leeds</affiliation></authorAffiliation>\
                 <authorAffiliation><affiliation>York</affiliation></authorAffiliation>\
               </authorAffiliationDetailsList></author></authorList>",
        );
        let t = flatten_group(&g, "1");
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, "affiliation"), Some("Leeds; York"));
    }

    #[test]
    fn empty_group_keeps_id_column() {
        let g = group("<grantsList><grant><grantId> </grantId></grant></grantsList>");
        let t = flatten_group(&g, "1");
        assert!(t.is_empty());
        assert!(t.has_column(ID_COLUMN));
    }

    #[test]
    fn journal_info_collapses_to_one_row() {
        let g = group(
            "<journalInfo>\
               <issue>3</issue>\
               <volume>41</volume>\
               <journalIssueId>123456</journalIssueId>\
               <printPublicationDate>2023-03-01</printPublicationDate>\
               <journal>\
                 <title>European Heart Journal</title>\
                 <ISSN>0195-668X</ISSN>\
                 <ESSN>1522-9645</ESSN>\
               </journal>\
             </journalInfo>",
        );
        let t = flatten_group(&g, "PMC1");
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, "issue"), Some("3"));
        assert_eq!(t.get(0, "volume"), Some("41"));
        assert_eq!(t.get(0, "printPublicationDate"), Some("2023-03-01"));
        assert_eq!(t.get(0, "title"), Some("European Heart Journal"));
        assert_eq!(t.get(0, "ESSN"), Some("1522-9645"));
        assert_eq!(t.get(0, "id"), Some("PMC1"));
    }
}
