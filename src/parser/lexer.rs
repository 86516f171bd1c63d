//! Lexer for wikitext template markup using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    // Delimiters (longer patterns win over lone braces)
    #[token("{{")]
    Open,
    #[token("}}")]
    Close,
    #[token("|")]
    Pipe,
    #[token("=")]
    Equals,

    /// A single `{` or `}` that is not part of a pair
    #[token("{")]
    #[token("}")]
    Brace,

    /// Any run of characters without template markup
    #[regex(r"[^{}|=]+")]
    Text,
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

/// Lex a slice of a larger source, reporting spans relative to the full source
pub fn lex_at(source: &str, range: Span) -> impl Iterator<Item = (Token, Span)> + '_ {
    let offset = range.start;
    lex(&source[range]).map(move |(tok, span)| (tok, span.start + offset..span.end + offset))
}
