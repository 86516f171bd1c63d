//! Wikitext template parsers
//!
//! Two strategies are available and the caller picks one explicitly:
//!
//! - [`FlatTemplateParser`] collapses top-level templates into a
//!   name -> arguments mapping and never fails.
//! - [`RecursiveTemplateParser`] keeps every occurrence and nested templates as
//!   a tree, and fails on pathological nesting depth.

pub mod ast;
mod flat;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use flat::{find_templates, tokenize_template, FlatTemplateParser};
pub use grammar::{RecursiveTemplateParser, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};

use crate::error::ParseError;

/// Selects how template markup is turned into data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Flat name -> arguments mapping of top-level templates
    Flat,
    /// Tree of template occurrences, limited to `max_depth` levels
    Recursive { max_depth: usize },
}

impl Default for ParseStrategy {
    fn default() -> Self {
        ParseStrategy::Flat
    }
}

impl ParseStrategy {
    /// Recursive strategy with the default depth limit
    pub fn recursive() -> Self {
        ParseStrategy::Recursive {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parse with the flat strategy
pub fn parse(text: &str) -> TemplateMap {
    FlatTemplateParser::new().parse(text)
}

/// Parse into a tree with the default depth limit
pub fn parse_tree(text: &str) -> Result<Vec<TemplateNode>, ParseError> {
    RecursiveTemplateParser::new().parse(text)
}

/// Parse with an explicitly selected strategy
pub fn parse_with(strategy: ParseStrategy, text: &str) -> Result<ParsedTemplates, ParseError> {
    match strategy {
        ParseStrategy::Flat => Ok(ParsedTemplates::Flat(parse(text))),
        ParseStrategy::Recursive { max_depth } => RecursiveTemplateParser::new()
            .with_max_depth(max_depth)
            .parse(text)
            .map(ParsedTemplates::Tree),
    }
}
