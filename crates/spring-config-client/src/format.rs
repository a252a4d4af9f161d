//! Parsing of flat config documents (`.yml`, `.properties`, `.json`)
//!
//! The server renders the merged environment as a single document on these
//! endpoints. Nested keys are flattened with `.` and list items become `key[i]`.

use std::collections::HashMap;

use serde_json::Value;

use crate::configuration::Format;
use crate::error::{ClientError, Result};
use crate::model::ConfigServerPropertySource;

/// Parse a flat document into a single property source
pub fn parse_document(
    name: &str,
    format: Format,
    content: &str,
) -> Result<ConfigServerPropertySource> {
    let source = match format {
        Format::Properties => parse_properties(content)?,
        Format::Json => flatten(serde_json::from_str(content)?)?,
        Format::Yaml => {
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                flatten(serde_yaml::from_str(content)?)?
            }
        }
        Format::Native => {
            return Err(ClientError::InvalidDocument(
                "native format is not a flat document".to_string(),
            ));
        }
    };

    Ok(ConfigServerPropertySource::new(name, source))
}

/// Java properties: `key=value`, `key: value` or `key value`
///
/// Handles `#`/`!` comment lines, `\` line continuations and the escapes
/// `\t`, `\n`, `\r`, `\f` and `\uXXXX`; any other escaped character
/// stands for itself, so `a\:b` is the key `a:b`.
pub fn parse_properties(content: &str) -> Result<HashMap<String, String>> {
    let mut properties = HashMap::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let mut logical = line.trim_start_matches(is_blank).to_string();
        if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
            continue;
        }

        while has_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }

        let (key, value) = split_entry(&logical);
        properties.insert(unescape(key)?, unescape(value)?);
    }

    Ok(properties)
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

/// An odd number of trailing backslashes continues the line
fn has_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// The key ends at the first unescaped `=`, `:` or blank
fn split_entry(line: &str) -> (&str, &str) {
    let mut key_end = line.len();
    let mut escaped = false;

    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = index;
            break;
        }
    }

    let rest = line[key_end..].trim_start_matches(is_blank);
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);
    (&line[..key_end], rest.trim_start_matches(is_blank))
}

fn unescape(raw: &str) -> Result<String> {
    let mut unescaped = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => unescaped.push('\t'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some('f') => unescaped.push('\x0c'),
            Some('u') => unescaped.push(unicode_escape(&mut chars)?),
            Some(other) => unescaped.push(other),
            None => {}
        }
    }

    Ok(unescaped)
}

/// Decode the digits after `\u`, joining a surrogate pair written as two escapes
fn unicode_escape(chars: &mut std::str::Chars<'_>) -> Result<char> {
    let high = hex_unit(chars)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(u32::from(high)).ok_or_else(|| malformed_unicode(high));
    }

    if chars.next() != Some('\\') || chars.next() != Some('u') {
        return Err(malformed_unicode(high));
    }
    let low = hex_unit(chars)?;

    char::decode_utf16([high, low])
        .next()
        .and_then(|decoded| decoded.ok())
        .ok_or_else(|| malformed_unicode(high))
}

fn hex_unit(chars: &mut std::str::Chars<'_>) -> Result<u16> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ClientError::InvalidDocument(format!(
            "malformed \\u escape: \\u{}",
            digits
        )));
    }
    u16::from_str_radix(&digits, 16)
        .map_err(|e| ClientError::InvalidDocument(format!("malformed \\u escape: {}", e)))
}

fn malformed_unicode(unit: u16) -> ClientError {
    ClientError::InvalidDocument(format!("malformed \\u escape: \\u{:04X}", unit))
}

/// Flatten a JSON/YAML tree into dotted keys
pub fn flatten(value: Value) -> Result<HashMap<String, String>> {
    let mut properties = HashMap::new();
    match value {
        Value::Object(_) => flatten_into(&mut properties, String::new(), value),
        Value::Null => {}
        _ => {
            return Err(ClientError::InvalidDocument(
                "document root must be a mapping".to_string(),
            ));
        }
    }
    Ok(properties)
}

fn flatten_into(properties: &mut HashMap<String, String>, prefix: String, value: Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(properties, path, child);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.into_iter().enumerate() {
                flatten_into(properties, format!("{}[{}]", prefix, index), child);
            }
        }
        Value::String(s) => {
            properties.insert(prefix, s);
        }
        Value::Bool(b) => {
            properties.insert(prefix, b.to_string());
        }
        Value::Number(n) => {
            properties.insert(prefix, n.to_string());
        }
        Value::Null => {}
    }
}
