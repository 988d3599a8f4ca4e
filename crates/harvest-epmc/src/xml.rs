//! Minimal element tree built with quick-xml.
//!
//! Search pages are small (a few hundred records), so each page is read
//! into a tree once and the parser then walks it freely.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

/// One XML element with its text
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Direct text nodes of this element, concatenated
    pub text: String,
    /// All text below this element in document order (inline markup dropped)
    pub content: String,
    pub children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Default::default()
        }
    }

    /// No element children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct text, `None` when empty or whitespace only
    pub fn own_text(&self) -> Option<&str> {
        if self.text.trim().is_empty() {
            None
        } else {
            Some(&self.text)
        }
    }

    /// First element named `name` in document order, including `self`
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        self.walk().find(|e| e.name == name)
    }

    /// All elements named `name`, not searching inside a match
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_named(self, name, &mut found);
        found
    }

    /// Pre-order traversal starting with `self`
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

fn collect_named<'a>(el: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    if el.name == name {
        found.push(el);
        return;
    }
    for child in &el.children {
        collect_named(child, name, found);
    }
}

/// Pre-order iterator over an element and its descendants
pub struct Walk<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let el = self.stack.pop()?;
        self.stack.extend(el.children.iter().rev());
        Some(el)
    }
}

/// Parse a whole document and return its root element.
pub fn parse_document(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| ParseError::Xml {
            position: reader.error_position() as u64,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(e) => stack.push(Element::open(&e)),
            Event::Empty(e) => attach(&mut stack, &mut root, Element::open(&e))?,
            Event::End(_) => {
                let el = stack.pop().ok_or_else(|| ParseError::Structure {
                    message: "closing tag without an open element".to_string(),
                })?;
                attach(&mut stack, &mut root, el)?;
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| ParseError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                push_text(&mut stack, &text);
            }
            Event::CData(c) => push_text(&mut stack, &String::from_utf8_lossy(&c)),
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Structure {
            message: format!("unclosed element <{}> at end of document", open.name),
        });
    }
    root.ok_or_else(|| ParseError::Structure {
        message: "document has no root element".to_string(),
    })
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(top) = stack.last_mut() {
        top.text.push_str(text);
        top.content.push_str(text);
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.content.push_str(&el.content);
            parent.children.push(el);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(el);
            Ok(())
        }
        None => Err(ParseError::Structure {
            message: format!("second root element <{}>", el.name),
        }),
    }
}
