//! Mapping from Europe PMC field names to the archive columns

use harvest_archive::{COLUMNS, Paper};

use crate::table::Table;

/// Archive column fed by the run date instead of a search field
pub const DATE_ADDED: &str = "Date Added";

/// (working table column, archive column)
pub const RENAMES: [(&str, &str); 11] = [
    ("source", "Source"),
    ("pmid", "PMID"),
    ("doi", "DOI"),
    ("title", "Title"),
    ("electronicPublicationDate", "Electronic Publication Date"),
    ("printPublicationDate", "Print Publication Date"),
    ("authorString", "Authors"),
    ("affiliation", "Affiliation"),
    ("journal_name", "Journal Name"),
    ("grants", "Grants"),
    ("abstractText", "Abstract"),
];

fn source_column(output: &str) -> Option<&'static str> {
    RENAMES
        .iter()
        .find(|(_, out)| *out == output)
        .map(|(src, _)| *src)
}

/// Rename and prune the harvested table into archive papers.
///
/// Columns outside the rename map are dropped; missing cells become `""`.
pub fn to_papers(table: &Table, date_added: &str) -> Vec<Paper> {
    (0..table.len())
        .map(|row| {
            let values = COLUMNS.map(|output| {
                if output == DATE_ADDED {
                    return date_added.to_string();
                }
                source_column(output)
                    .and_then(|src| table.get(row, src))
                    .unwrap_or_default()
                    .to_string()
            });
            Paper::from_values(values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn every_archive_column_has_a_source() {
        for column in COLUMNS {
            assert!(
                column == DATE_ADDED || source_column(column).is_some(),
                "{column} has no source"
            );
        }
    }

    #[test]
    fn renames_and_prunes() {
        let mut t = Table::new();
        t.push_record([
            ("id", "PMC1".to_string()),
            ("source", "PMC".to_string()),
            ("doi", "10.1/x".to_string()),
            ("authorString", "Smith J, Jones K.".to_string()),
            ("journal_name", "Heart".to_string()),
            ("grants", "PG/1; RG/2".to_string()),
            ("pubYear", "2024".to_string()),
        ]);
        t.push_record([("id", "2".to_string())]);

        let papers = to_papers(&t, "2025-01-31");
        assert_eq!(papers.len(), 2);
        assert_eq!(
            papers[0],
            Paper {
                source: "PMC".to_string(),
                doi: "10.1/x".to_string(),
                authors: "Smith J, Jones K.".to_string(),
                journal_name: "Heart".to_string(),
                grants: "PG/1; RG/2".to_string(),
                date_added: "2025-01-31".to_string(),
                ..Default::default()
            }
        );
        assert_eq!(papers[1].doi, "");
        assert_eq!(papers[1].date_added, "2025-01-31");
    }
}
