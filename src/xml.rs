//! Generic XML report reader
//!
//! Builds a small element tree from `quick-xml` events and wraps every
//! format parser in the same failure envelope: a report that is missing or
//! cannot be read as XML yields `None` and a log line, never an error.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ReportError;

/// An element with its attributes, child elements and text content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, quick_xml::Error> {
        let mut element = XmlElement {
            name: String::from_utf8_lossy(start.name().as_ref()).to_string(),
            ..Default::default()
        };

        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value()?.to_string();
            element.attributes.push((key, value));
        }

        Ok(element)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value, or an empty string when the attribute is absent.
    pub fn attribute_or_empty(&self, key: &str) -> &str {
        self.attribute(key).unwrap_or("")
    }

    /// Parse an attribute value, ignoring surrounding whitespace.
    pub fn parse_attribute<T: FromStr>(&self, key: &str) -> Option<T> {
        self.attribute(key)?.trim().parse().ok()
    }

    /// Direct child elements, in document order.
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// All descendant elements named `name`, in document order.
    /// The element itself is not included.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        for child in &self.children {
            child.collect_named(name, &mut found);
        }
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(name, found);
        }
    }

    /// Text of this element followed by the text of its descendants.
    pub fn text_content(&self) -> String {
        let mut text = self.text.clone();
        for child in &self.children {
            text.push_str(&child.text_content());
        }
        text
    }
}

/// A parsed, well-formed XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Read and parse the document stored at `path`.
    pub fn read(path: &Path) -> Result<Self, ReportError> {
        if !path.exists() {
            return Err(ReportError::Missing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse_str(&content)
    }

    pub fn parse_str(xml: &str) -> Result<Self, ReportError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut open: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|source| ReportError::Xml { position, source })?;

            match event {
                Event::Start(ref e) => {
                    let element = XmlElement::from_start(e)
                        .map_err(|source| ReportError::Xml { position, source })?;
                    open.push(element);
                }
                Event::Empty(ref e) => {
                    let element = XmlElement::from_start(e)
                        .map_err(|source| ReportError::Xml { position, source })?;
                    attach(&mut open, &mut root, element)?;
                }
                Event::End(_) => {
                    // quick-xml verifies end names, so the stack cannot be empty here
                    if let Some(element) = open.pop() {
                        attach(&mut open, &mut root, element)?;
                    }
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|source| ReportError::Xml { position, source })?;
                    if let Some(current) = open.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = open.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !open.is_empty() {
            return Err(ReportError::Truncated { open: open.len() });
        }

        root.map(|root| XmlDocument { root }).ok_or(ReportError::NoRoot)
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Every element named `name` in the document, root included.
    pub fn elements_by_tag<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.root.collect_named(name, &mut found);
        found
    }
}

fn attach(
    open: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ReportError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ReportError::MultipleRoots),
    }
    Ok(())
}

/// A report format read from an XML document.
///
/// Implementors only describe how a document maps onto their model;
/// [`XmlReportParser::parse`] supplies the shared handling of missing and
/// malformed files.
pub trait XmlReportParser {
    type Report;

    fn parse_document(&self, document: &XmlDocument) -> Self::Report;

    /// Parse the report at `path`, or `None` when it is absent or not XML.
    fn parse(&self, path: &Path) -> Option<Self::Report> {
        match XmlDocument::read(path) {
            Ok(document) => Some(self.parse_document(&document)),
            Err(ReportError::Missing { path }) => {
                tracing::warn!(path = %path.display(), "no XML report exists at path");
                None
            }
            Err(err) => {
                tracing::error!(
                    path = %path.display(),
                    error = %err,
                    "unable to process XML report"
                );
                None
            }
        }
    }

    fn parse_str(&self, xml: &str) -> Result<Self::Report, ReportError> {
        XmlDocument::parse_str(xml).map(|document| self.parse_document(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct RootName;

    impl XmlReportParser for RootName {
        type Report = String;

        fn parse_document(&self, document: &XmlDocument) -> String {
            document.root().name().to_string()
        }
    }

    #[test]
    fn test_parse_tree() {
        let xml = r#"<?xml version="1.0"?>
<coverage version="1">
    <package name="a &amp; b">
        <class filename="A.m"><line number="1"/></class>
        <class filename="B.m"/>
    </package>
    <value>12</value>
</coverage>"#;

        let document = XmlDocument::parse_str(xml).unwrap();
        let root = document.root();
        assert_eq!(root.name(), "coverage");
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.attribute("version"), Some("1"));
        assert_eq!(root.attribute_or_empty("missing"), "");

        let packages = document.elements_by_tag("package");
        assert_eq!(packages[0].attribute("name"), Some("a & b"));

        let classes = root.descendants("class");
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[1].attribute("filename"), Some("B.m"));
        assert!(!classes[1].has_children());
        assert_eq!(root.descendants("value")[0].text_content(), "12");
    }

    #[test]
    fn test_elements_by_tag_includes_root() {
        let xml = r#"<testsuite name="outer"><testsuite name="inner"/></testsuite>"#;
        let document = XmlDocument::parse_str(xml).unwrap();
        let suites = document.elements_by_tag("testsuite");
        assert_eq!(suites.len(), 2);
        assert_eq!(suites[0].attribute("name"), Some("outer"));
        assert_eq!(document.root().descendants("testsuite").len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(XmlDocument::parse_str(""), Err(ReportError::NoRoot)));
        assert!(matches!(
            XmlDocument::parse_str("<coverage><package>"),
            Err(ReportError::Truncated { open: 2 })
        ));
        assert!(matches!(
            XmlDocument::parse_str("<a></b>"),
            Err(ReportError::Xml { .. })
        ));
        assert!(matches!(
            XmlDocument::parse_str("<a/><b/>"),
            Err(ReportError::MultipleRoots)
        ));
    }

    #[test]
    fn test_parse_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(RootName.parse(&temp_dir.path().join("absent.xml")), None);
    }

    #[test]
    fn test_parse_empty_and_truncated_files() {
        let temp_dir = TempDir::new().unwrap();

        let empty = temp_dir.path().join("empty.xml");
        fs::write(&empty, "").unwrap();
        assert_eq!(RootName.parse(&empty), None);

        let truncated = temp_dir.path().join("truncated.xml");
        fs::write(&truncated, "<coverage><packages><package name=\"x\">").unwrap();
        assert_eq!(RootName.parse(&truncated), None);

        let valid = temp_dir.path().join("valid.xml");
        fs::write(&valid, "<coverage/>").unwrap();
        assert_eq!(RootName.parse(&valid), Some("coverage".to_string()));
    }
}
