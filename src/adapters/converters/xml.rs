//! XML <-> JSON value mapping.
//!
//! Reading follows the xmltodict conventions: attributes become `@name`
//! keys, text next to attributes or children becomes `#text`, repeated
//! child elements collapse into an array, and empty elements are `null`.
//! Writing is the inverse in the dict2xml style with two-space indentation.
//! Documents whose top level is not a single element are wrapped in a
//! synthetic `root` element, which reading strips again.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::ports::ConverterError;

const ROOT_ELEMENT: &str = "root";
const ARRAY_ITEM: &str = "item";
const TEXT_KEY: &str = "#text";
const ATTRIBUTE_PREFIX: char = '@';
const INDENT: &str = "  ";

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

    fn into_value(self) -> (String, Value) {
        let text = self.text.trim().to_string();
        let value = if self.children.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        } else {
            let mut children = self.children;
            if !text.is_empty() {
                children.insert(TEXT_KEY.to_string(), Value::String(text));
            }
            Value::Object(children)
        };
        (self.name, value)
    }
}

fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

fn parse_error(reason: impl std::fmt::Display) -> ConverterError {
    ConverterError::parse("xml", reason)
}

fn open_frame(start: &quick_xml::events::BytesStart<'_>) -> Result<Frame, ConverterError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut frame = Frame::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(parse_error)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(parse_error)?.into_owned();
        frame
            .children
            .insert(format!("{ATTRIBUTE_PREFIX}{key}"), Value::String(value));
    }
    Ok(frame)
}

/// Parses an XML document into a JSON value.
///
/// A lone synthetic `root` element is unwrapped, so `{"root": {...}}`
/// becomes `{...}`.
pub fn read_xml(text: &str) -> Result<Value, ConverterError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut document: Option<(String, Value)> = None;

    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(start) => {
                if document.is_some() && stack.is_empty() {
                    return Err(parse_error("more than one root element"));
                }
                stack.push(open_frame(&start)?);
            }
            Event::Empty(start) => {
                if document.is_some() && stack.is_empty() {
                    return Err(parse_error("more than one root element"));
                }
                let frame = open_frame(&start)?;
                close_frame(frame, &mut stack, &mut document);
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape().map_err(parse_error)?);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| parse_error("unexpected closing tag"))?;
                close_frame(frame, &mut stack, &mut document);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(format!("element <{}> is never closed", open.name)));
    }

    let (name, value) = document.ok_or_else(|| parse_error("document has no root element"))?;
    if name == ROOT_ELEMENT {
        return Ok(value);
    }
    let mut wrapped = Map::new();
    wrapped.insert(name, value);
    Ok(Value::Object(wrapped))
}

fn close_frame(frame: Frame, stack: &mut [Frame], document: &mut Option<(String, Value)>) {
    let (name, value) = frame.into_value();
    match stack.last_mut() {
        Some(parent) => insert_child(&mut parent.children, name, value),
        None => *document = Some((name, value)),
    }
}

/// Renders a JSON value as an XML document.
pub fn write_xml(value: &Value) -> Result<String, ConverterError> {
    let mut out = String::new();
    match value {
        Value::Object(map) if is_single_element(map) => {
            for (name, child) in map {
                write_element(&mut out, name, child, 0)?;
            }
        }
        _ => write_element(&mut out, ROOT_ELEMENT, value, 0)?,
    }
    Ok(out)
}

fn is_single_element(map: &Map<String, Value>) -> bool {
    map.len() == 1
        && map
            .iter()
            .all(|(name, child)| is_element_name(name) && !child.is_array())
}

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
}

fn check_name(name: &str) -> Result<(), ConverterError> {
    if is_element_name(name) {
        Ok(())
    } else {
        Err(ConverterError::UnsupportedStructure {
            structure: format!("key '{name}'"),
        })
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn write_element(
    out: &mut String,
    name: &str,
    value: &Value,
    depth: usize,
) -> Result<(), ConverterError> {
    check_name(name)?;
    let pad = INDENT.repeat(depth);

    match value {
        Value::Array(items) => {
            for item in items {
                if item.is_array() {
                    write_element(out, name, &wrap_array(item), depth)?;
                } else {
                    write_element(out, name, item, depth)?;
                }
            }
        }
        Value::Object(map) => {
            let mut attributes = String::new();
            let mut text = None;
            let mut children = Vec::new();
            for (key, child) in map {
                if let Some(attribute) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                    check_name(attribute)?;
                    attributes.push_str(&format!(
                        " {}=\"{}\"",
                        attribute,
                        quick_xml::escape::escape(&scalar_text(child))
                    ));
                } else if key == TEXT_KEY {
                    text = Some(scalar_text(child));
                } else {
                    children.push((key, child));
                }
            }

            if children.is_empty() {
                match text {
                    Some(text) if !text.is_empty() => out.push_str(&format!(
                        "{pad}<{name}{attributes}>{}</{name}>\n",
                        quick_xml::escape::escape(&text)
                    )),
                    _ => out.push_str(&format!("{pad}<{name}{attributes}/>\n")),
                }
                return Ok(());
            }

            out.push_str(&format!("{pad}<{name}{attributes}>\n"));
            if let Some(text) = text.filter(|t| !t.is_empty()) {
                out.push_str(&format!(
                    "{pad}{INDENT}{}\n",
                    quick_xml::escape::escape(&text)
                ));
            }
            for (key, child) in children {
                write_element(out, key, child, depth + 1)?;
            }
            out.push_str(&format!("{pad}</{name}>\n"));
        }
        Value::Null => out.push_str(&format!("{pad}<{name}/>\n")),
        scalar => out.push_str(&format!(
            "{pad}<{name}>{}</{name}>\n",
            quick_xml::escape::escape(&scalar_text(scalar))
        )),
    }
    Ok(())
}

fn wrap_array(items: &Value) -> Value {
    let mut map = Map::new();
    map.insert(ARRAY_ITEM.to_string(), items.clone());
    Value::Object(map)
}
