//! Data types produced by the template parsers

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Arguments of one template occurrence, in source order.
///
/// Anonymous arguments are keyed `"1"`, `"2"`, ... in encounter order; named
/// arguments keep their (trimmed) name. A later argument with the same key
/// replaces the earlier value.
pub type Arguments = IndexMap<String, String>;

/// Flat parse result: template name -> arguments of its last occurrence
pub type TemplateMap = IndexMap<String, Arguments>;

/// A template invocation in a parse tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateNode {
    /// Trimmed template name
    pub name: String,
    /// Arguments in source order
    pub arguments: IndexMap<String, ArgumentValue>,
    /// Location of the whole `{{...}}` invocation
    #[serde(skip)]
    pub span: Span,
}

impl TemplateNode {
    /// Look up an argument value by key
    pub fn argument(&self, key: &str) -> Option<&ArgumentValue> {
        self.arguments.get(key)
    }

    /// Collapse this node's arguments into the flat representation
    pub fn flat_arguments(&self) -> Arguments {
        self.arguments
            .iter()
            .map(|(key, value)| (key.clone(), value.text.clone()))
            .collect()
    }
}

/// The value of a single template argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentValue {
    /// Trimmed source text of the value, nested templates included
    pub text: String,
    /// Templates that appear directly inside the value
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TemplateNode>,
}

impl ArgumentValue {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            templates: Vec::new(),
        }
    }

    pub fn has_templates(&self) -> bool {
        !self.templates.is_empty()
    }
}

/// Output of either parsing strategy
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTemplates {
    Flat(TemplateMap),
    Tree(Vec<TemplateNode>),
}

impl ParsedTemplates {
    /// Convert to a JSON value suitable for templates, Lua or API output
    pub fn to_json(&self) -> Value {
        match self {
            ParsedTemplates::Flat(map) => flat_to_json(map),
            ParsedTemplates::Tree(nodes) => templates_to_json(nodes),
        }
    }

    /// Whether no template was found
    pub fn is_empty(&self) -> bool {
        match self {
            ParsedTemplates::Flat(map) => map.is_empty(),
            ParsedTemplates::Tree(nodes) => nodes.is_empty(),
        }
    }
}

/// JSON view of a flat parse result
pub fn flat_to_json(map: &TemplateMap) -> Value {
    let mut out = Map::new();
    for (name, arguments) in map {
        let args = arguments
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        out.insert(name.clone(), Value::Object(args));
    }
    Value::Object(out)
}

/// JSON view of a parse tree.
///
/// Templates are keyed by name and a later occurrence replaces an earlier one.
/// Argument values that contain templates are replaced by the JSON view of
/// those templates; all other values stay strings.
pub fn templates_to_json(nodes: &[TemplateNode]) -> Value {
    let mut out = Map::new();
    for node in nodes {
        let mut args = Map::new();
        for (key, value) in &node.arguments {
            let json = if value.has_templates() {
                templates_to_json(&value.templates)
            } else {
                Value::String(value.text.clone())
            };
            args.insert(key.clone(), json);
        }
        out.insert(node.name.clone(), Value::Object(args));
    }
    Value::Object(out)
}
