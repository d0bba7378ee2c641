//! Envelope parsing: the first element of `soap:Body` as a small element tree.

use super::SoapError;
use crate::config::{EntityDef, Record};
use crate::error::AppError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;

/// One element by local name (namespace prefixes dropped).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    /// `xsi:nil="true"` was set.
    pub nil: bool,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, SoapError> {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let mut nil = false;
        for attr in e.attributes() {
            let attr = attr.map_err(|err| SoapError::Xml(err.to_string()))?;
            if attr.key.local_name().as_ref() == b"nil" {
                nil = attr.value.as_ref() == b"true" || attr.value.as_ref() == b"1";
            }
        }
        Ok(XmlElement {
            name,
            nil,
            ..Default::default()
        })
    }

    /// First child with this local name, ASCII case-insensitive.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Trimmed text of a child, `None` when absent, nil or empty.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .filter(|c| !c.nil)
            .map(|c| c.text.trim())
            .filter(|t| !t.is_empty())
    }

    /// Optional integer child (`limit`, `offset`).
    pub fn child_i64(&self, name: &str) -> Result<Option<i64>, SoapError> {
        self.child_text(name)
            .map(|t| {
                t.parse().map_err(|_| SoapError::BadValue {
                    element: name.to_string(),
                    message: "expected an integer".into(),
                })
            })
            .transpose()
    }
}

/// Parse a SOAP 1.1 request and return the operation element (first child of `Body`).
pub fn parse_envelope(xml: &str) -> Result<XmlElement, SoapError> {
    let root = parse_tree(xml)?;
    if !root.name.eq_ignore_ascii_case("Envelope") {
        return Err(SoapError::NotEnvelope);
    }
    let body = root.child("Body").ok_or(SoapError::MissingBody)?;
    body.children.first().cloned().ok_or(SoapError::EmptyBody)
}

fn parse_tree(xml: &str) -> Result<XmlElement, SoapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<XmlElement> = Vec::new();
    loop {
        match reader.read_event().map_err(|e| SoapError::Xml(e.to_string()))? {
            Event::Start(e) => stack.push(XmlElement::from_start(&e)?),
            Event::Empty(e) => {
                let el = XmlElement::from_start(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(el),
                    None => return Ok(el),
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| SoapError::Xml(e.to_string()))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let done = stack.pop().ok_or_else(|| SoapError::Xml("unbalanced end tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => return Ok(done),
                }
            }
            Event::Eof => return Err(SoapError::Xml("unexpected end of document".into())),
            _ => {}
        }
    }
}

/// Read an entity record from an `item` element: one child per column, by column name.
/// Unknown children are ignored; nil or empty non-text elements become null.
pub fn record_from_element(entity: &EntityDef, item: &XmlElement) -> Result<Record, AppError> {
    let mut record = Record::new();
    for child in &item.children {
        let Some(col) = entity.columns.iter().find(|c| c.name.eq_ignore_ascii_case(&child.name)) else {
            continue;
        };
        let v = if child.nil {
            Value::Null
        } else {
            col.ty
                .parse_text(&child.text)
                .map_err(|e| AppError::Validation(format!("{}: {}", col.name, e)))?
        };
        record.insert(col.name.to_string(), v);
    }
    Ok(record)
}
