//! Tree-building template parser using chumsky
//!
//! Top-level templates are located with the same scan as the flat parser. Each
//! candidate is lexed, checked against the nesting limit and then parsed into a
//! [`TemplateNode`] whose argument values keep their nested templates.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use indexmap::IndexMap;

use crate::error::ParseError;
use crate::parser::ast::{ArgumentValue, Span, TemplateNode};
use crate::parser::flat::find_templates;
use crate::parser::lexer::{lex_at, Token};

/// Nesting depth allowed unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Upper bound for any configured depth; the grammar recurses once per level
pub const MAX_DEPTH_LIMIT: usize = 128;

/// Template parser producing a tree of template occurrences
#[derive(Debug, Clone, Copy)]
pub struct RecursiveTemplateParser {
    max_depth: usize,
}

impl Default for RecursiveTemplateParser {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RecursiveTemplateParser {
    /// Create a parser with the default nesting limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth; a top-level template has depth 1.
    ///
    /// Values above [`MAX_DEPTH_LIMIT`] are clamped to it.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        if max_depth > MAX_DEPTH_LIMIT {
            tracing::warn!(max_depth, limit = MAX_DEPTH_LIMIT, "clamping template nesting depth");
        }
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    /// Parse `text` into the list of top-level template occurrences.
    ///
    /// Fails only when a template nests deeper than the configured limit.
    pub fn parse(&self, text: &str) -> Result<Vec<TemplateNode>, ParseError> {
        let mut nodes = Vec::new();

        for span in find_templates(text) {
            let tokens: Vec<(Token, Span)> = lex_at(text, span.clone()).collect();
            check_depth(&tokens, self.max_depth)?;

            match parse_candidate(tokens, span.end) {
                Ok(raw) => nodes.push(build_node(text, &raw)),
                Err(errors) => {
                    for error in errors {
                        tracing::debug!(%error, "skipping unparseable template");
                    }
                }
            }
        }

        Ok(nodes)
    }
}

/// Fail if any `{{` opens a level deeper than `limit`
fn check_depth(tokens: &[(Token, Span)], limit: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for (token, span) in tokens {
        match token {
            Token::Open => {
                depth += 1;
                if depth > limit {
                    return Err(ParseError::RecursionLimitExceeded {
                        limit,
                        span: span.clone(),
                    });
                }
            }
            Token::Close => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// A piece of an argument as seen by the grammar
#[derive(Debug, Clone)]
enum Part {
    Template(RawTemplate),
    Equals(Span),
    Text,
}

/// Pipe-separated section of a template body
#[derive(Debug, Clone)]
struct RawSegment {
    range: Span,
    parts: Vec<Part>,
}

#[derive(Debug, Clone)]
struct RawTemplate {
    span: Span,
    segments: Vec<RawSegment>,
}

impl RawTemplate {
    /// Derive segment ranges from the surrounding delimiters
    fn assemble(open: Span, first: Vec<Part>, rest: Vec<(Span, Vec<Part>)>, close: Span) -> Self {
        let mut segments = Vec::with_capacity(rest.len() + 1);
        let mut start = open.end;
        let mut parts = first;

        for (pipe, next) in rest {
            segments.push(RawSegment {
                range: start..pipe.start,
                parts,
            });
            start = pipe.end;
            parts = next;
        }
        segments.push(RawSegment {
            range: start..close.start,
            parts,
        });

        Self {
            span: open.start..close.end,
            segments,
        }
    }
}

/// Candidates from `find_templates` are balanced, so errors here are only logged
fn parse_candidate(tokens: Vec<(Token, Span)>, eoi: usize) -> Result<RawTemplate, Vec<String>> {
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((eoi..eoi).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| format!("{e:?}")).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn delimiter<'a, I>(token: Token) -> impl Parser<'a, I, Span, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    just(token).map_with(|_, e| span_range(&e.span()))
}

fn template_parser<'a, I>() -> impl Parser<'a, I, RawTemplate, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|template| {
        let part = choice((
            template.map(Part::Template),
            delimiter(Token::Equals).map(Part::Equals),
            select! {
                Token::Text => Part::Text,
                Token::Brace => Part::Text,
            },
        ));

        let parts = part.repeated().collect::<Vec<_>>();

        delimiter(Token::Open)
            .then(parts.clone())
            .then(
                delimiter(Token::Pipe)
                    .then(parts)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .then(delimiter(Token::Close))
            .map(|(((open, first), rest), close)| RawTemplate::assemble(open, first, rest, close))
            .boxed()
    })
}

/// Turn a raw template into a node, resolving argument keys
fn build_node(source: &str, raw: &RawTemplate) -> TemplateNode {
    let mut segments = raw.segments.iter();
    let name = segments
        .next()
        .map(|segment| source[segment.range.clone()].trim().to_string())
        .unwrap_or_default();

    let mut arguments = IndexMap::new();
    let mut position = 1usize;

    for segment in segments {
        let equals = segment
            .parts
            .iter()
            .enumerate()
            .find_map(|(idx, part)| match part {
                Part::Equals(span) => Some((idx, span.clone())),
                _ => None,
            });

        let segment_text = &source[segment.range.clone()];
        let (key, value) = match equals {
            Some((_, eq)) if segment_text.ends_with('=') => (
                source[segment.range.start..eq.start].trim().to_string(),
                ArgumentValue {
                    text: String::new(),
                    templates: Vec::new(),
                },
            ),
            Some((idx, eq)) => (
                source[segment.range.start..eq.start].trim().to_string(),
                ArgumentValue {
                    text: source[eq.end..segment.range.end].trim().to_string(),
                    templates: nested_nodes(source, &segment.parts[idx + 1..]),
                },
            ),
            None => {
                let key = position.to_string();
                position += 1;
                (
                    key,
                    ArgumentValue {
                        text: segment_text.trim().to_string(),
                        templates: nested_nodes(source, &segment.parts),
                    },
                )
            }
        };

        arguments.insert(key, value);
    }

    TemplateNode {
        name,
        arguments,
        span: raw.span.clone(),
    }
}

fn nested_nodes(source: &str, parts: &[Part]) -> Vec<TemplateNode> {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Template(raw) => Some(build_node(source, raw)),
            _ => None,
        })
        .collect()
}
