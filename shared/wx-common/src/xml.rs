//! Flat XML Field Codec
//!
//! Push payloads are shallow `<xml>` documents. Reading collapses them into a
//! name → text map; writing produces the compact form the platform expects.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::XmlError;

/// Element name → text value for every element below the root.
pub type Fields = BTreeMap<String, String>;

/// Parse a document into its fields.
///
/// The root element itself is not recorded. When a name occurs more than once
/// the first occurrence wins.
pub fn parse_fields(raw: &str) -> Result<Fields, XmlError> {
    let mut reader = Reader::from_str(raw);
    let mut fields = Fields::new();
    // (element name, accumulated direct text)
    let mut open: Vec<(String, String)> = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => {
                seen_root = true;
                open.push((element_name(start.name().as_ref()), String::new()));
            }
            Event::Empty(empty) => {
                seen_root = true;
                if !open.is_empty() {
                    fields
                        .entry(element_name(empty.name().as_ref()))
                        .or_default();
                }
            }
            Event::Text(text) => {
                if let Some((_, value)) = open.last_mut() {
                    value.push_str(&text.unescape().map_err(malformed)?);
                }
            }
            Event::CData(cdata) => {
                if let Some((_, value)) = open.last_mut() {
                    let bytes = cdata.into_inner();
                    let text = std::str::from_utf8(&bytes).map_err(|_| XmlError::InvalidUtf8)?;
                    value.push_str(text);
                }
            }
            Event::End(_) => {
                let (name, value) = open
                    .pop()
                    .ok_or_else(|| XmlError::Malformed("unexpected closing tag".into()))?;
                if !open.is_empty() {
                    fields.entry(name).or_insert(value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some((name, _)) = open.last() {
        return Err(XmlError::Malformed(format!("element <{name}> is never closed")));
    }
    if !seen_root {
        return Err(XmlError::MissingRoot);
    }

    Ok(fields)
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn malformed(err: impl std::fmt::Display) -> XmlError {
    XmlError::Malformed(err.to_string())
}

/// Compact `<xml>` document writer.
///
/// Fields are emitted in call order with no whitespace between elements.
#[derive(Debug, Default, Clone)]
pub struct XmlDocument {
    body: String,
}

impl XmlDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a CDATA-wrapped field.
    #[must_use]
    pub fn cdata(mut self, name: &str, value: &str) -> Self {
        // "]]>" would terminate the section early; split it across two sections
        let value = value.replace("]]>", "]]]]><![CDATA[>");
        self.body
            .push_str(&format!("<{name}><![CDATA[{value}]]></{name}>"));
        self
    }

    /// Append a bare text field, XML-escaped.
    #[must_use]
    pub fn text(mut self, name: &str, value: impl std::fmt::Display) -> Self {
        let value = value.to_string();
        let escaped = quick_xml::escape::escape(value.as_str());
        self.body.push_str(&format!("<{name}>{escaped}</{name}>"));
        self
    }

    /// Close the document and return it.
    #[must_use]
    pub fn finish(self) -> String {
        format!("<xml>{}</xml>", self.body)
    }
}
