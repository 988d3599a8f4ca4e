//! Page parsing errors

/// A search page could not be turned into tables.
///
/// Always fatal for the page; there is no partial recovery.
#[derive(Debug)]
pub enum ParseError {
    /// The document is not well-formed XML
    Xml { position: u64, message: String },
    /// Well-formed but not shaped like a search page
    Structure { message: String },
    /// A `result` element has no child elements at all
    EmptyRecord { record: usize },
    /// A record's first child, which carries its identity, has no text
    MissingIdentity { record: usize, tag: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml { position, message } => {
                write!(f, "malformed XML at byte {position}: {message}")
            }
            Self::Structure { message } => write!(f, "unexpected page structure: {message}"),
            Self::EmptyRecord { record } => write!(f, "record #{record} has no fields"),
            Self::MissingIdentity { record, tag } => write!(
                f,
                "record #{record} has no identity (first field <{tag}> is empty)"
            ),
        }
    }
}

impl std::error::Error for ParseError {}
