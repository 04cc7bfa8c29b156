use std::collections::HashMap;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde_yaml::Value;

use crate::template::flatten::key_text;

/// Comments gathered for one key of the original document.
#[derive(Debug, Default, Clone, PartialEq)]
struct Attached {
    /// Full-line comments and blank lines directly above the key.
    before: Vec<String>,
    /// Comment on the key's own line, including the `#`.
    trailing: Option<String>,
    /// Trailing comments of the key's list items, in order.
    items: Vec<String>,
}

#[derive(Debug, Default)]
struct CommentMap {
    keys: HashMap<Vec<String>, Attached>,
    tail: Vec<String>,
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"^( *)('(?:[^']|'')*'|"(?:[^"\\]|\\.)*"|[^\s#'"][^#]*?):(?:\s|$|\{%)"#,
        )
        .expect("valid regex")
    })
}

/// The text after `-` on a block sequence item line.
fn list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed == "-" {
        Some("")
    } else {
        trimmed.strip_prefix("- ")
    }
}

/// A mapping key line: indentation, key text, and everything after the `:`.
fn parse_key_line(line: &str) -> Option<(usize, String, &str)> {
    if list_item(line).is_some() {
        return None;
    }
    let caps = key_pattern().captures(line)?;
    let indent = caps.get(1)?.as_str().len();
    let raw = caps.get(2)?;
    let rest = &line[raw.end() + 1..];
    let key = match serde_yaml::from_str::<Value>(raw.as_str()) {
        Ok(value @ (Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null)) => {
            key_text(&value)
        }
        _ => raw.as_str().trim().to_string(),
    };
    Some((indent, key, rest))
}

/// Split a value into its content and trailing `# comment`, ignoring `#`
/// inside quotes or not preceded by whitespace.
fn split_trailing_comment(rest: &str) -> (&str, Option<&str>) {
    let mut in_single = false;
    let mut in_double = false;
    let mut prev_space = true;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double && prev_space => {
                return (&rest[..idx], Some(rest[idx..].trim_end()));
            }
            _ => {}
        }
        prev_space = ch.is_whitespace();
    }
    (rest, None)
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Keeps the path of the key currently being read, by indentation.
#[derive(Default)]
struct KeyStack {
    entries: Vec<(usize, String)>,
}

impl KeyStack {
    fn enter(&mut self, indent: usize, key: String) -> Vec<String> {
        while self.entries.last().is_some_and(|(i, _)| *i >= indent) {
            self.entries.pop();
        }
        self.entries.push((indent, key));
        self.entries.iter().map(|(_, k)| k.clone()).collect()
    }
}

fn scan_original(original: &str) -> CommentMap {
    let mut map = CommentMap::default();
    let mut stack = KeyStack::default();
    let mut pending: Vec<String> = Vec::new();
    let mut block_indent: Option<usize> = None;
    let mut last_path: Option<Vec<String>> = None;

    for line in original.lines() {
        if let Some(indent) = block_indent {
            if line.trim().is_empty() || indent_of(line) > indent {
                continue;
            }
            block_indent = None;
        }

        if is_comment_or_blank(line) {
            pending.push(line.trim().to_string());
            continue;
        }

        if let Some(item) = list_item(line) {
            // Item comments go above the list's key.
            if let (Some(path), (_, Some(comment))) = (&last_path, split_trailing_comment(item)) {
                map.keys
                    .entry(path.clone())
                    .or_default()
                    .items
                    .push(comment.to_string());
            }
            continue;
        }

        let Some((indent, key, rest)) = parse_key_line(line) else {
            continue;
        };
        let path = stack.enter(indent, key);
        last_path = Some(path.clone());
        let (value, trailing) = split_trailing_comment(rest);

        let value = value.trim();
        if value.starts_with('|') || value.starts_with('>') {
            block_indent = Some(indent);
        }

        let attached = Attached {
            before: std::mem::take(&mut pending),
            trailing: trailing.map(str::to_string),
            items: Vec::new(),
        };
        if attached != Attached::default() {
            map.keys.insert(path, attached);
        }
    }

    map.tail = pending;
    map
}

fn strip_trailing(line: &str, comment: &str) -> String {
    let needle = format!(" {comment}");
    line.replacen(&needle, "", 1)
}

fn with_trailing(line: &str, comment: &str) -> String {
    match line.find("{% for") {
        Some(idx) => format!("{} {comment}{}", &line[..idx], &line[idx..]),
        None => format!("{line} {comment}"),
    }
}

/// Reinsert the comments of `original` into a serialized template.
///
/// Comments and blank lines above a key are placed above the same key path
/// in the template, trailing comments go back on their key's line, and
/// comments after the last key are appended. Running this again on its own
/// output changes nothing.
pub fn reattach_comments(template: &str, original: &str) -> String {
    let comments = scan_original(original);
    let mut stack = KeyStack::default();
    let mut out = String::with_capacity(template.len() + original.len());

    for line in template.lines() {
        if is_comment_or_blank(line) {
            continue;
        }

        let Some((indent, key, _)) = parse_key_line(line) else {
            out.push_str(line);
            out.push('\n');
            continue;
        };
        let path = stack.enter(indent, key);

        let Some(attached) = comments.keys.get(&path) else {
            out.push_str(line);
            out.push('\n');
            continue;
        };

        let pad = " ".repeat(indent);
        for before in &attached.before {
            if !before.is_empty() {
                out.push_str(&pad);
                out.push_str(before);
            }
            out.push('\n');
        }
        for item in &attached.items {
            out.push_str(&pad);
            out.push_str(item);
            out.push('\n');
        }

        match &attached.trailing {
            Some(comment) => out.push_str(&with_trailing(&strip_trailing(line, comment), comment)),
            None => out.push_str(line),
        }
        out.push('\n');
    }

    for tail in &comments.tail {
        out.push_str(tail);
        out.push('\n');
    }
    // Trailing blank lines from the original are not worth keeping.
    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}
