//! XML to JSON-like tree decoding for API responses.
//!
//! Elements holding only text become strings, elements with children become
//! objects, empty elements become `null` and repeated sibling tags collapse
//! into an array. Attributes and namespace prefixes are dropped.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("XML document has no root element")]
    Empty,
}

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> Value {
        if !self.children.is_empty() {
            return Value::Object(self.children);
        }

        let text = self.text.trim();
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    }
}

pub fn to_value(xml: &str) -> Result<Value, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                stack.push(Frame::new(name));
            }

            Ok(Event::End(_)) => {
                let Some(frame) = stack.pop() else {
                    return Err(XmlError::Parse("unbalanced closing tag".to_string()));
                };
                let name = frame.name.clone();
                let value = frame.into_value();

                match stack.last_mut() {
                    Some(parent) => add_to_parent(&mut parent.children, &name, value),
                    None => return Ok(json!({ name: value })),
                }
            }

            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match stack.last_mut() {
                    Some(parent) => add_to_parent(&mut parent.children, &name, Value::Null),
                    None => return Ok(json!({ name: Value::Null })),
                }
            }

            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| XmlError::Parse(e.to_string()))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }

            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.into_inner().as_ref()).to_string();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }

            Ok(Event::Eof) => break,

            Ok(_) => {}

            Err(e) => return Err(XmlError::Parse(e.to_string())),
        }
    }

    Err(XmlError::Empty)
}

fn add_to_parent(parent: &mut Map<String, Value>, name: &str, value: Value) {
    match parent.get_mut(name) {
        Some(Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let old_value = existing.take();
            *existing = json!([old_value, value]);
        }
        None => {
            parent.insert(name.to_string(), value);
        }
    }
}

/// Looks up a slash separated element path such as
/// `"AuthorizeResponse/AuthorizeResult/AuthorizationDetails"`.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let pointer = format!("/{}", path.trim_start_matches('/'));
    value.pointer(&pointer)
}

pub fn lookup_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    lookup(value, path).and_then(Value::as_str)
}
