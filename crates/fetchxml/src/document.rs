//! Owned FetchXML element tree.

use fetchkit_core::{Error, Result};

/// An element of a parsed document.
///
/// Attribute order is kept as written. Comments and processing
/// instructions are dropped; text is kept only for elements that carry it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Returns an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns an attribute value or a validation error naming it.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.attribute(name).ok_or_else(|| {
            Error::validation(format!(
                "The '{}' element requires the '{name}' attribute",
                self.name
            ))
        })
    }

    /// Iterates over children with the given name.
    pub fn children_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s XmlElement> + 's {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|child| child.name == name)
    }
}

/// A parsed FetchXML document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub root: XmlElement,
}

/// Parses FetchXML text.
///
/// Only well-formedness is checked here; see [`crate::validate`] for the
/// structural rules.
pub fn parse(xml: &str) -> Result<Document> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| Error::format(e.to_string()))?;
    Ok(Document {
        root: lower(doc.root_element()),
    })
}

fn lower(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let mut element = XmlElement::new(node.tag_name().name());
    element.attributes = node
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect();

    let mut text = String::new();
    let mut has_text = false;
    for child in node.children() {
        if child.is_element() {
            element.children.push(lower(child));
        } else if child.is_text() {
            if let Some(fragment) = child.text() {
                text.push_str(fragment);
                has_text = true;
            }
        }
    }
    if has_text && element.children.is_empty() {
        element.text = Some(text);
    }
    element
}
