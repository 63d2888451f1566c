//! Minimal YAML codec for JSON-shaped records.
//!
//! # Responsibility
//! - Render a JSON object as human-readable block YAML.
//! - Parse back exactly the subset this module emits (plus comment lines).
//!
//! # Invariants
//! - `parse_yaml(&to_yaml(map)) == map` for every JSON object.
//! - Any string that would read back as another type is JSON-quoted.
//! - Multi-line strings are `|` blocks; a block reads back as its lines
//!   joined by `\n` with trailing whitespace trimmed, so strings ending in
//!   whitespace or a newline are JSON-quoted instead.
//! - Arbitrary YAML (anchors, tags, flow mappings with plain scalars,
//!   multi-document streams) is unsupported.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static PLAIN_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("valid yaml key regex"));

const INDICATORS: &[char] = &[
    '{', '[', '*', '&', '!', '|', '>', '%', '@', '`', '-', '?', ',',
];
const RESERVED_WORDS: &[&str] = &["true", "false", "null", "yes", "no", "~"];
const STRUCTURAL_CHARS: &[char] = &[':', '#', '"', '\'', ',', '[', ']', '{', '}'];

/// Parse failure with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlError {
    pub line: usize,
    pub message: String,
}

impl YamlError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl Display for YamlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "yaml line {}: {}", self.line, self.message)
    }
}

impl Error for YamlError {}

/// Renders `map` as block YAML. Every line ends with `\n`.
pub fn to_yaml(map: &Map<String, Value>) -> String {
    let mut out = String::new();
    if map.is_empty() {
        out.push_str("{}\n");
    } else {
        write_mapping(map, 0, &mut out);
    }
    out
}

/// Parses YAML produced by [`to_yaml`].
pub fn parse_yaml(text: &str) -> Result<Map<String, Value>, YamlError> {
    if text.trim() == "{}" {
        return Ok(Map::new());
    }
    Parser::new(text).parse_mapping(0)
}

fn write_mapping(map: &Map<String, Value>, indent: usize, out: &mut String) {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        let key = format_key(key);
        match value {
            Value::String(text) if is_block_string(text) => {
                out.push_str(&format!("{pad}{key}: |\n"));
                for line in text.split('\n') {
                    out.push_str(&format!("{pad}  {line}\n"));
                }
            }
            Value::Array(items) if is_block_sequence(items) => {
                out.push_str(&format!("{pad}{key}:\n"));
                let dash = indent + 2;
                for item in items {
                    if let Value::Object(entry) = item {
                        let mut nested = String::new();
                        write_mapping(entry, indent + 4, &mut nested);
                        // The first key line starts with indent + 4 spaces.
                        out.push_str(&nested[..dash]);
                        out.push_str("- ");
                        out.push_str(&nested[dash + 2..]);
                    }
                }
            }
            Value::Object(entry) if !entry.is_empty() => {
                out.push_str(&format!("{pad}{key}:\n"));
                write_mapping(entry, indent + 2, out);
            }
            other => out.push_str(&format!("{pad}{key}: {}\n", format_inline(other))),
        }
    }
}

fn format_inline(value: &Value) -> String {
    match value {
        Value::String(text) => format_string(text),
        Value::Array(items) if !items.is_empty() && items.iter().all(is_flow_scalar) => {
            let rendered: Vec<String> = items.iter().map(format_inline).collect();
            format!("[{}]", rendered.join(", "))
        }
        other => other.to_string(),
    }
}

fn format_string(text: &str) -> String {
    if needs_quotes(text) {
        quote(text)
    } else {
        text.to_string()
    }
}

fn format_key(key: &str) -> String {
    if PLAIN_KEY_RE.is_match(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

fn needs_quotes(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return true;
    };
    text.trim() != text
        || INDICATORS.contains(&first)
        || text
            .chars()
            .any(|ch| ch.is_control() || STRUCTURAL_CHARS.contains(&ch))
        || RESERVED_WORDS
            .iter()
            .any(|word| word.eq_ignore_ascii_case(text))
        || text.parse::<f64>().is_ok()
}

fn is_block_string(text: &str) -> bool {
    text.contains('\n')
        && text.trim_end() == text
        && text
            .chars()
            .all(|ch| !ch.is_control() || ch == '\n' || ch == '\t')
}

fn is_block_sequence(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .all(|item| item.as_object().is_some_and(|entry| !entry.is_empty()))
}

fn is_flow_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

struct Parser {
    lines: Vec<String>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        Self { lines, pos: 0 }
    }

    /// Skips blank and comment lines; returns the indent of the next line.
    fn peek_indent(&mut self) -> Option<usize> {
        while let Some(line) = self.lines.get(self.pos) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.pos += 1;
                continue;
            }
            return Some(leading_spaces(line));
        }
        None
    }

    fn parse_mapping(&mut self, indent: usize) -> Result<Map<String, Value>, YamlError> {
        let mut map = Map::new();
        while let Some(current) = self.peek_indent() {
            if current < indent {
                break;
            }
            let line_no = self.pos + 1;
            if current > indent {
                return Err(YamlError::new(line_no, "unexpected indentation"));
            }

            let line = self.lines[self.pos].clone();
            let (key, value_text) = split_key(&line[current..], line_no)?
                .ok_or_else(|| YamlError::new(line_no, "expected `key: value`"))?;
            self.pos += 1;
            let value = self.parse_value(value_text, indent, line_no)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn parse_value(&mut self, text: &str, indent: usize, line_no: usize) -> Result<Value, YamlError> {
        match text {
            "" => self.parse_nested(indent),
            "|" => Ok(Value::String(self.parse_literal_block(indent))),
            _ => parse_inline(text, line_no),
        }
    }

    fn parse_nested(&mut self, indent: usize) -> Result<Value, YamlError> {
        let Some(child) = self.peek_indent() else {
            return Ok(Value::Null);
        };
        if child <= indent {
            return Ok(Value::Null);
        }
        if is_sequence_item(&self.lines[self.pos][child..]) {
            self.parse_sequence(child).map(Value::Array)
        } else {
            self.parse_mapping(child).map(Value::Object)
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Result<Vec<Value>, YamlError> {
        let mut items = Vec::new();
        while let Some(current) = self.peek_indent() {
            if current < indent {
                break;
            }
            let line_no = self.pos + 1;
            if current > indent {
                return Err(YamlError::new(line_no, "unexpected indentation"));
            }

            let line = self.lines[self.pos].clone();
            let rest = &line[current..];
            if !is_sequence_item(rest) {
                return Err(YamlError::new(line_no, "expected sequence item"));
            }
            let item = rest.get(2..).unwrap_or("").trim();

            if item.is_empty() {
                self.pos += 1;
                items.push(self.parse_nested(indent)?);
            } else if split_key(item, line_no)?.is_some() {
                // Re-read the item as the first key of a mapping nested
                // under the dash.
                self.lines[self.pos] = format!("{}{item}", " ".repeat(indent + 2));
                items.push(Value::Object(self.parse_mapping(indent + 2)?));
            } else {
                self.pos += 1;
                items.push(parse_inline(item, line_no)?);
            }
        }
        Ok(items)
    }

    /// Reads a literal block whose lines are indented past `indent`: the
    /// lines joined by `\n`, no newline added, trailing whitespace trimmed.
    fn parse_literal_block(&mut self, indent: usize) -> String {
        let block_indent = indent + 2;
        let mut lines: Vec<String> = Vec::new();

        while let Some(line) = self.lines.get(self.pos) {
            if leading_spaces(line) >= block_indent {
                lines.push(line[block_indent..].to_string());
            } else if line.trim().is_empty() && self.block_continues(block_indent) {
                lines.push(String::new());
            } else {
                break;
            }
            self.pos += 1;
        }

        let text = lines.join("\n");
        text.trim_end().to_string()
    }

    /// Whether the next non-blank line after the current one is still part
    /// of a literal block.
    fn block_continues(&self, block_indent: usize) -> bool {
        self.lines[self.pos + 1..]
            .iter()
            .find(|line| !line.trim().is_empty())
            .is_some_and(|line| leading_spaces(line) >= block_indent)
    }
}

/// Splits `key: value` / `key:`; `Ok(None)` when the text is not a key line.
fn split_key(text: &str, line_no: usize) -> Result<Option<(String, &str)>, YamlError> {
    let (key, after) = if text.starts_with('"') {
        let Some(end) = json_string_end(text) else {
            return Ok(None);
        };
        let after = &text[end + 1..];
        if !after.starts_with(':') {
            return Ok(None);
        }
        (decode_quoted(&text[..=end], line_no)?, after)
    } else {
        let Some(colon) = text.find(':') else {
            return Ok(None);
        };
        let key = &text[..colon];
        if !PLAIN_KEY_RE.is_match(key) {
            return Ok(None);
        }
        (key.to_string(), &text[colon..])
    };

    let value = &after[1..];
    if value.is_empty() {
        return Ok(Some((key, "")));
    }
    match value.strip_prefix(' ') {
        Some(value) => Ok(Some((key, value.trim()))),
        None => Ok(None),
    }
}

fn parse_inline(text: &str, line_no: usize) -> Result<Value, YamlError> {
    if text.starts_with('"') {
        return decode_quoted(text, line_no).map(Value::String);
    }
    if text.starts_with('[') || text.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return Ok(value);
        }
        if text.starts_with('[') {
            return parse_flow_sequence(text, line_no);
        }
        return Err(YamlError::new(line_no, "invalid flow mapping"));
    }
    Ok(parse_plain_scalar(text))
}

fn parse_flow_sequence(text: &str, line_no: usize) -> Result<Value, YamlError> {
    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| YamlError::new(line_no, "unterminated flow sequence"))?
        .trim();
    if inner.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }

    let mut items = Vec::new();
    for token in split_flow_items(inner) {
        let token = token.trim();
        if token.is_empty() {
            return Err(YamlError::new(line_no, "empty flow sequence item"));
        }
        if token.starts_with('"') {
            items.push(Value::String(decode_quoted(token, line_no)?));
        } else {
            items.push(parse_plain_scalar(token));
        }
    }
    Ok(Value::Array(items))
}

/// Splits on commas outside double-quoted strings.
fn split_flow_items(inner: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (idx, ch) in inner.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            items.push(&inner[start..idx]);
            start = idx + 1;
        }
    }
    items.push(&inner[start..]);
    items
}

fn parse_plain_scalar(text: &str) -> Value {
    match text {
        "null" | "~" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => parse_number(text).unwrap_or_else(|| Value::String(text.to_string())),
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(number) = text.parse::<u64>() {
        return Some(Value::from(number));
    }
    if let Ok(number) = text.parse::<i64>() {
        return Some(Value::from(number));
    }
    let number = text.parse::<f64>().ok()?;
    Number::from_f64(number).map(Value::Number)
}

fn decode_quoted(text: &str, line_no: usize) -> Result<String, YamlError> {
    serde_json::from_str::<String>(text)
        .map_err(|err| YamlError::new(line_no, format!("invalid quoted string: {err}")))
}

/// Byte index of the closing quote of a JSON string starting at `text[0]`.
fn json_string_end(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return Some(idx);
        }
    }
    None
}

fn is_sequence_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

#[cfg(test)]
mod tests {
    use super::{parse_yaml, to_yaml};
    use serde_json::{json, Value};

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn round_trips_record_shaped_documents() {
        let original = object(json!({
            "title": "Meeting: notes",
            "plain": "hello world",
            "count": 3,
            "ratio": 0.5,
            "neg": -7,
            "flag": true,
            "nothing": null,
            "numeric_text": "42",
            "bool_text": "Yes",
            "empty": "",
            "padded": "  padded ",
            "dash": "-leading",
            "body": "line one\n\n  indented\nlast\n",
            "tags": ["a", "b, c", "true", 1, false],
            "mixed": [1, null, {"x": 1}],
            "nested": {"inner": {"deep": "value"}, "list": []},
            "empty_obj": {},
            "items": [
                {"name": "first", "meta": {"k": "v"}},
                {"name": "second", "notes": "a\nb"}
            ],
            "weird key": "x",
            "unicode": "héllo ✓",
            "date": "2024-01-15T10:30:00.000Z",
            "day": "2024-01-15",
            "control": "tab\there\r\nnext"
        }));

        let text = to_yaml(&original);
        let parsed = parse_yaml(&text).expect("parse emitted yaml");
        assert_eq!(parsed, original, "emitted:\n{text}");
    }

    #[test]
    fn emits_readable_block_shapes() {
        let text = to_yaml(&object(json!({
            "body": "one\ntwo",
            "tags": ["x", "y"],
            "meta": {"k": "v"}
        })));

        assert_eq!(
            text,
            "body: |\n  one\n  two\nmeta:\n  k: v\ntags: [x, y]\n"
        );
    }

    #[test]
    fn parses_comments_and_literal_blocks_without_trailing_newline() {
        let parsed = parse_yaml("# header\nname: x\nbody: |\n  one\n  two\n").unwrap();

        assert_eq!(parsed["name"], json!("x"));
        assert_eq!(parsed["body"], json!("one\ntwo"));
    }

    #[test]
    fn reads_literal_blocks_written_by_other_tools() {
        let parsed = parse_yaml("content: |\n  a\n  b").unwrap();
        assert_eq!(parsed["content"], json!("a\nb"));

        let padded = parse_yaml("content: |\n  a\n  b   \n\n\nnext: 1\n").unwrap();
        assert_eq!(padded["content"], json!("a\nb"));
        assert_eq!(padded["next"], json!(1));
    }

    #[test]
    fn strings_with_trailing_whitespace_are_quoted() {
        for text in ["one\ntwo\n", "one\ntwo  ", "one\n\t"] {
            let map = object(json!({ "body": text }));
            let yaml = to_yaml(&map);
            assert!(!yaml.contains('|'), "emitted:\n{yaml}");
            assert_eq!(parse_yaml(&yaml).unwrap(), map);
        }
    }

    #[test]
    fn reports_line_of_unexpected_indentation() {
        let err = parse_yaml("title: ok\n  bad: indent\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn rejects_unterminated_quoted_string() {
        let err = parse_yaml("title: ok\nother: \"open\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("quoted string"));
    }

    #[test]
    fn empty_document_round_trips() {
        let empty = serde_json::Map::new();
        assert_eq!(to_yaml(&empty), "{}\n");
        assert_eq!(parse_yaml("{}\n").unwrap(), empty);
    }
}
