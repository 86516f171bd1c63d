//! Read access to slots for adapters
//!
//! Most operations degrade to `None` when the page does not resolve, the actor
//! may not read it, or the slot is missing or not text. [`SlotReader::read_slot`]
//! reports those cases as errors instead.

use serde_json::Value;

use crate::error::ParseError;
use crate::parser::{self, ParseStrategy, ParsedTemplates};

use super::content::{Content, ContentKind};
use super::editor::get_slot_content;
use super::error::SlotError;
use super::store::{Actor, PageRef, PageResolver, PageStore, PermissionChecker, Revision};

/// Bundles the capabilities needed to read slots on behalf of an actor
pub struct SlotReader<'a> {
    store: &'a dyn PageStore,
    resolver: &'a dyn PageResolver,
    permissions: &'a dyn PermissionChecker,
}

impl<'a> SlotReader<'a> {
    pub fn new(
        store: &'a dyn PageStore,
        resolver: &'a dyn PageResolver,
        permissions: &'a dyn PermissionChecker,
    ) -> Self {
        Self {
            store,
            resolver,
            permissions,
        }
    }

    fn readable_page(&self, actor: &Actor, page_name: &str) -> Option<PageRef> {
        let Some(page) = self.resolver.resolve(page_name) else {
            tracing::debug!(page = page_name, "page name does not resolve");
            return None;
        };
        if !self.permissions.can_read(actor, &page) {
            tracing::debug!(%actor, %page, "read permission denied");
            return None;
        }
        Some(page)
    }

    fn text_content(&self, actor: &Actor, page_name: &str, slot: &str) -> Option<Content> {
        let page = self.readable_page(actor, page_name)?;
        get_slot_content(self.store, &page, slot).filter(Content::is_plain_text)
    }

    /// Serialized text of a text slot
    pub fn slot_text(&self, actor: &Actor, page_name: &str, slot: &str) -> Option<String> {
        self.text_content(actor, page_name, slot)
            .map(|c| c.serialize().to_string())
    }

    /// Content model of a text slot
    pub fn slot_content_model(&self, actor: &Actor, page_name: &str, slot: &str) -> Option<String> {
        self.text_content(actor, page_name, slot)
            .map(|c| c.model().to_string())
    }

    /// Templates in a text slot.
    ///
    /// `Ok(None)` when the slot cannot be read. A recursion failure is returned
    /// as an error for the caller to report.
    pub fn slot_templates(
        &self,
        actor: &Actor,
        page_name: &str,
        slot: &str,
        strategy: ParseStrategy,
    ) -> Result<Option<ParsedTemplates>, ParseError> {
        let Some(content) = self.text_content(actor, page_name, slot) else {
            return Ok(None);
        };
        parser::parse_with(strategy, content.serialize()).map(Some)
    }

    /// Structured data of a slot.
    ///
    /// JSON slots are decoded, wikitext slots become the JSON view of their
    /// template tree. With `search` set to `key=value`, the first object
    /// (depth first) whose `key` loosely equals `value` is returned instead.
    pub fn slot_data(
        &self,
        actor: &Actor,
        page_name: &str,
        slot: &str,
        search: Option<&str>,
    ) -> Option<Value> {
        let content = self.text_content(actor, page_name, slot)?;

        let data = match content.kind() {
            ContentKind::Json => match decode_json(content.serialize()) {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(%slot, error = %err, "slot holds invalid JSON");
                    return None;
                }
            },
            ContentKind::Wikitext => match parser::parse_tree(content.serialize()) {
                Ok(tree) => parser::templates_to_json(&tree),
                Err(err) => {
                    tracing::debug!(%slot, error = %err, "could not parse slot templates");
                    return None;
                }
            },
            ContentKind::Text | ContentKind::Binary => return None,
        };

        match search.filter(|s| !s.is_empty()) {
            None => Some(data),
            Some(search) => {
                let (key, value) = search.split_once('=')?;
                find_block_by_value(key.trim(), value.trim(), &data).cloned()
            }
        }
    }

    /// Text of a slot, or the reason it cannot be read
    pub fn read_slot(&self, actor: &Actor, page_name: &str, slot: &str) -> Result<String, SlotError> {
        let missing = || SlotError::SlotDoesNotExist {
            slot: slot.to_string(),
            page: page_name.to_string(),
        };

        let page = self.resolver.resolve(page_name).ok_or_else(missing)?;
        if !self.permissions.can_read(actor, &page) {
            return Err(SlotError::PermissionDenied {
                page: page.title.clone(),
            });
        }

        let content = get_slot_content(self.store, &page, slot).ok_or_else(missing)?;
        match content.text() {
            Some(text) => Ok(text.to_string()),
            None => Err(SlotError::NotText {
                slot: slot.to_string(),
                model: content.model().to_string(),
            }),
        }
    }
}

/// Append the text of each configured slot of `revision` to `text`.
///
/// Only wikitext and plain text slots are transcluded; missing slots are
/// skipped.
pub fn transclusion_text(revision: &Revision, text: &str, slots_to_append: &[String]) -> String {
    let mut out = text.to_string();
    for slot in slots_to_append {
        let Some(content) = revision.slot_content(slot) else {
            continue;
        };
        if matches!(content.kind(), ContentKind::Wikitext | ContentKind::Text) {
            out.push_str(content.serialize());
        }
    }
    out
}

/// Decode JSON slot text, accepting comments and trailing commas
fn decode_json(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text).or_else(|_| serde_json::from_str(&relax_json(text)))
}

/// Strip `//` and `/* */` comments and trailing commas outside of strings
fn relax_json(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            stripped.push(c);
            match c {
                '\\' => stripped.extend(chars.next()),
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (c, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                stripped.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        stripped.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                stripped.push(' ');
            }
            _ => stripped.push(c),
        }
    }

    let mut relaxed = String::with_capacity(stripped.len());
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in stripped.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = stripped[idx + 1..].trim_start().chars().next();
            if matches!(next, Some(']' | '}')) {
                continue;
            }
        }
        relaxed.push(c);
    }
    relaxed
}

/// First object, searching depth first, whose `key` loosely equals `value`
pub fn find_block_by_value<'v>(key: &str, value: &str, data: &'v Value) -> Option<&'v Value> {
    let children: Box<dyn Iterator<Item = &'v Value> + 'v> = match data {
        Value::Object(map) => {
            if map.get(key).is_some_and(|v| loosely_equals(v, value)) {
                return Some(data);
            }
            Box::new(map.values())
        }
        Value::Array(items) => Box::new(items.iter()),
        _ => return None,
    };

    children
        .filter(|child| child.is_object() || child.is_array())
        .find_map(|child| find_block_by_value(key, value, child))
}

/// Compare a JSON value with search text, treating numeric strings as numbers
fn loosely_equals(candidate: &Value, needle: &str) -> bool {
    match candidate {
        Value::String(s) => {
            s == needle
                || matches!(
                    (s.trim().parse::<f64>(), needle.trim().parse::<f64>()),
                    (Ok(a), Ok(b)) if a == b
                )
        }
        Value::Number(n) => match (n.as_f64(), needle.trim().parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        Value::Bool(b) => *b == !(needle.is_empty() || needle == "0"),
        // A null member counts as unset
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => false,
    }
}
