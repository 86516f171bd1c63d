//! Flattening template parser
//!
//! Scans wikitext for top-level `{{...}}` invocations and collapses them into a
//! mapping from template name to arguments. Repeated template names overwrite
//! each other; the last occurrence wins.

use crate::parser::ast::{Arguments, Span, TemplateMap};

/// Template parser producing a flat name -> arguments mapping
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTemplateParser {
    nested: bool,
}

impl FlatTemplateParser {
    /// Create a parser that only extracts top-level templates
    pub fn new() -> Self {
        Self::default()
    }

    /// Also extract templates nested inside the arguments of extracted templates
    pub fn with_nested_extraction(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }

    /// Parse `text` into a mapping of template name to arguments.
    ///
    /// Never fails: unbalanced or malformed markup is skipped.
    pub fn parse(&self, text: &str) -> TemplateMap {
        let mut result = TemplateMap::new();

        // Bodies still to scan, popped in source order (pre-order when nested)
        let mut pending: Vec<&str> = find_templates(text)
            .into_iter()
            .rev()
            .map(|span| &text[span])
            .collect();

        while let Some(candidate) = pending.pop() {
            let body = &candidate[2..candidate.len() - 2];
            let (name, arguments) = tokenize_template(body);
            result.insert(name, arguments);

            if self.nested {
                pending.extend(
                    find_templates(body)
                        .into_iter()
                        .rev()
                        .map(|span| &body[span]),
                );
            }
        }

        result
    }
}

/// Find the spans of all valid top-level templates in `text`.
///
/// `{{` opens and `}}` closes a nesting level; a template is complete when the
/// depth returns to zero. A `}}` with nothing open is ignored, and a template
/// still open at the end of the input is dropped.
pub fn find_templates(text: &str) -> Vec<Span> {
    // Braces are ASCII, so scanning bytes never splits a UTF-8 sequence
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        match (bytes[idx], bytes.get(idx + 1)) {
            (b'{', Some(b'{')) => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
                idx += 2;
            }
            (b'}', Some(b'}')) => {
                idx += 2;
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if depth == 0 && is_valid_template(&text[start..idx]) {
                    found.push(start..idx);
                }
            }
            _ => idx += 1,
        }
    }

    found
}

/// A candidate is a template if it is wrapped in `{{`/`}}` and is not a
/// parser function such as `{{#if:...}}`.
fn is_valid_template(candidate: &str) -> bool {
    candidate.len() >= 4
        && candidate.starts_with("{{")
        && candidate.ends_with("}}")
        && candidate.as_bytes()[2] != b'#'
}

/// Split a template body (braces stripped) into its name and arguments
pub fn tokenize_template(body: &str) -> (String, Arguments) {
    let mut tokens = split_arguments(body).into_iter();
    let name = tokens.next().unwrap_or_default().trim().to_string();

    let mut arguments = Arguments::new();
    let mut position = 1usize;
    for token in tokens {
        match token.split_once('=') {
            // A raw argument ending in `=` always has an empty value
            Some((key, _)) if token.ends_with('=') => {
                arguments.insert(key.trim().to_string(), String::new());
            }
            Some((key, value)) => {
                arguments.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => {
                arguments.insert(position.to_string(), token.trim().to_string());
                position += 1;
            }
        }
    }

    (name, arguments)
}

/// Split on `|` at nesting depth zero
fn split_arguments(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        match (bytes[idx], bytes.get(idx + 1)) {
            (b'{', Some(b'{')) => {
                depth += 1;
                idx += 2;
            }
            (b'}', Some(b'}')) if depth > 0 => {
                depth -= 1;
                idx += 2;
            }
            (b'|', _) if depth == 0 => {
                parts.push(&body[start..idx]);
                idx += 1;
                start = idx;
            }
            _ => idx += 1,
        }
    }
    parts.push(&body[start..]);

    parts
}
