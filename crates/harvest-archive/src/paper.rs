//! The persisted paper record and its fixed column set

use serde::{Deserialize, Serialize};

/// Column headers of the persisted archive, in file order
pub const COLUMNS: [&str; 12] = [
    "Source",
    "PMID",
    "DOI",
    "Title",
    "Electronic Publication Date",
    "Print Publication Date",
    "Authors",
    "Affiliation",
    "Journal Name",
    "Grants",
    "Abstract",
    "Date Added",
];

/// One archived paper.
///
/// Every field is a string; "no data" is the empty string, never a null
/// marker, so identity comparisons behave the same for fresh and archived rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paper {
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "PMID")]
    pub pmid: String,
    #[serde(rename = "DOI")]
    pub doi: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Electronic Publication Date")]
    pub electronic_publication_date: String,
    #[serde(rename = "Print Publication Date")]
    pub print_publication_date: String,
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Affiliation")]
    pub affiliation: String,
    #[serde(rename = "Journal Name")]
    pub journal_name: String,
    #[serde(rename = "Grants")]
    pub grants: String,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
    #[serde(rename = "Date Added")]
    pub date_added: String,
}

impl Paper {
    /// Identity key; papers without a DOI have none and never merge
    pub fn identity(&self) -> Option<&str> {
        if self.doi.is_empty() {
            None
        } else {
            Some(&self.doi)
        }
    }

    /// Strip surrounding whitespace from the identity key and title
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.doi);
        trim_in_place(&mut self.title);
    }

    /// Values in [`COLUMNS`] order
    pub fn values(&self) -> [&str; 12] {
        [
            &self.source,
            &self.pmid,
            &self.doi,
            &self.title,
            &self.electronic_publication_date,
            &self.print_publication_date,
            &self.authors,
            &self.affiliation,
            &self.journal_name,
            &self.grants,
            &self.abstract_text,
            &self.date_added,
        ]
    }

    /// Rebuild from values in [`COLUMNS`] order
    pub fn from_values(values: [String; 12]) -> Self {
        let [
            source,
            pmid,
            doi,
            title,
            electronic_publication_date,
            print_publication_date,
            authors,
            affiliation,
            journal_name,
            grants,
            abstract_text,
            date_added,
        ] = values;
        Self {
            source,
            pmid,
            doi,
            title,
            electronic_publication_date,
            print_publication_date,
            authors,
            affiliation,
            journal_name,
            grants,
            abstract_text,
            date_added,
        }
    }
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_requires_doi() {
        let mut paper = Paper::default();
        assert_eq!(paper.identity(), None);
        paper.doi = "10.1/x".to_string();
        assert_eq!(paper.identity(), Some("10.1/x"));
    }

    #[test]
    fn normalize_trims_doi_and_title_only() {
        let mut paper = Paper {
            doi: " 10.1/x ".to_string(),
            title: "\tA title\n".to_string(),
            authors: " Smith J ".to_string(),
            ..Default::default()
        };
        paper.normalize();
        assert_eq!(paper.doi, "10.1/x");
        assert_eq!(paper.title, "A title");
        assert_eq!(paper.authors, " Smith J ");
    }

    #[test]
    fn values_follow_column_order() {
        let paper = Paper {
            source: "MED".to_string(),
            date_added: "2024-01-01".to_string(),
            ..Default::default()
        };
        let values = paper.values();
        assert_eq!(values.len(), COLUMNS.len());
        assert_eq!(values[0], "MED");
        assert_eq!(values[11], "2024-01-01");
        assert_eq!(Paper::from_values(values.map(String::from)), paper);
    }
}
