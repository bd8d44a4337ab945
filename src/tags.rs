//! Tag parsing: `key="value"` attributes at the head of a block tag.
//!
//! A documentation block tag such as
//!
//! ```text
//! @ant.task name="httpfetch" category="network" Fetches a resource.
//! ```
//!
//! carries attributes before its free-form content. Only the leading
//! plain-text node of the tag body is scanned; attribute values stop at
//! whitespace, commas, and quotes, and the closing quote is optional.
//! Whatever the scan does not consume remains content. Parsing never
//! fails: malformed input simply ends the attribute scan.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{plain_text, DocNode};

static ATTRIBUTE_SCAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^ *(\w+) *= *"?([^\s",]+)"? *"#).unwrap());

/// One parsed block tag: its attributes and the remaining content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    attributes: BTreeMap<String, String>,
    content: Vec<DocNode>,
}

impl TagInfo {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The content nodes left after the attribute scan.
    pub fn content(&self) -> &[DocNode] {
        &self.content
    }

    pub fn content_text(&self) -> String {
        plain_text(&self.content)
    }
}

/// Parse one block tag body. A repeated attribute key keeps the value
/// written last.
pub fn parse_tag(name: &str, body: &[DocNode]) -> TagInfo {
    let mut attributes = BTreeMap::new();
    let mut content: Vec<DocNode> = body.to_vec();

    if let Some(DocNode::Text(text)) = body.first() {
        let mut rest = text.as_str();
        while let Some(found) = ATTRIBUTE_SCAN.captures(rest) {
            let key = found.get(1).map(|m| m.as_str()).unwrap_or_default();
            let value = found.get(2).map(|m| m.as_str()).unwrap_or_default();
            attributes.insert(key.to_string(), value.to_string());
            rest = &rest[found.get(0).map(|m| m.end()).unwrap_or(0)..];
        }
        if rest.is_empty() {
            content.remove(0);
        } else if rest.len() != text.len() {
            content[0] = DocNode::Text(rest.to_string());
        }
    }

    TagInfo {
        name: name.to_string(),
        attributes,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Vec<DocNode> {
        vec![DocNode::Text(s.to_string())]
    }

    #[test]
    fn test_attributes_then_content() {
        let tag = parse_tag("ant.task", &text(r#"name="foo" type="int" trailing description text"#));
        assert_eq!(tag.attribute("name"), Some("foo"));
        assert_eq!(tag.attribute("type"), Some("int"));
        assert_eq!(tag.content_text(), "trailing description text");
    }

    #[test]
    fn test_body_without_attributes_is_all_content() {
        let tag = parse_tag("ant.task", &text("Fetches a resource over HTTP."));
        assert!(!tag.has_attribute("name"));
        assert_eq!(tag.content_text(), "Fetches a resource over HTTP.");
    }

    #[test]
    fn test_unquoted_and_half_quoted_values() {
        let tag = parse_tag("ant.type", &text(r#"name=header category="misc rest"#));
        assert_eq!(tag.attribute("name"), Some("header"));
        assert_eq!(tag.attribute("category"), Some("misc"));
        assert_eq!(tag.content_text(), "rest");
    }

    #[test]
    fn test_value_stops_at_comma() {
        let tag = parse_tag("ant.prop", &text(r#"name=first,second"#));
        assert_eq!(tag.attribute("name"), Some("first"));
        assert_eq!(tag.content_text(), ",second");
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        let tag = parse_tag("ant.task", &text(r#"name="a" name="b""#));
        assert_eq!(tag.attribute("name"), Some("b"));
    }

    #[test]
    fn test_attributes_consume_whole_node() {
        let tag = parse_tag("ant.task", &text(r#"ignore="true""#));
        assert_eq!(tag.attribute("ignore"), Some("true"));
        assert!(tag.content().is_empty());
    }

    #[test]
    fn test_markup_leading_node_is_not_scanned() {
        let body = vec![DocNode::Markup("<b>name=\"x\"</b>".to_string())];
        let tag = parse_tag("ant.task", &body);
        assert!(!tag.has_attribute("name"));
        assert_eq!(tag.content(), &body[..]);
    }

    #[test]
    fn test_empty_body() {
        let tag = parse_tag("ant.task", &[]);
        assert!(tag.content().is_empty());
        assert_eq!(tag.content_text(), "");
    }
}
