//! Pattern tokenizer
//!
//! Splits a pattern string into tokens. Whitespace only separates tokens.
//! The delimiters `[ ] ( ) * + ?` are always single-character tokens; any
//! other run of characters is an atom, an anchor, or a run of wildcards.

use once_cell::sync::Lazy;
use regex::Regex;

use ore_core::{OreError, Result};

/// `value_layer`: the layer name is everything after the last underscore.
static LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+)_([A-Za-z][A-Za-z0-9]*)$").expect("literal regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `value_layer`
    Literal { value: String, layer: String },
    /// `.`
    Wildcard,
    /// `[` or `[^`
    ClassOpen { negated: bool },
    ClassClose,
    GroupOpen,
    GroupClose,
    Star,
    Plus,
    Question,
    /// `^`
    Start,
    /// `$`
    End,
}

/// Token with its byte offset in the pattern source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '[' | ']' | '(' | ')' | '*' | '+' | '?')
}

pub(crate) fn syntax_error(pattern: &str, position: usize, message: impl Into<String>) -> OreError {
    OreError::PatternSyntax {
        pattern: pattern.to_string(),
        position,
        message: message.into(),
    }
}

/// Tokenize a pattern string
pub fn tokenize(pattern: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = pattern.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let simple = match c {
            '[' => {
                chars.next();
                let negated = matches!(chars.peek(), Some(&(_, '^')));
                if negated {
                    chars.next();
                }
                Some(TokenKind::ClassOpen { negated })
            }
            ']' => Some(TokenKind::ClassClose),
            '(' => Some(TokenKind::GroupOpen),
            ')' => Some(TokenKind::GroupClose),
            '*' => Some(TokenKind::Star),
            '+' => Some(TokenKind::Plus),
            '?' => Some(TokenKind::Question),
            _ => None,
        };

        if let Some(kind) = simple {
            if !matches!(kind, TokenKind::ClassOpen { .. }) {
                chars.next();
            }
            tokens.push(Token { kind, position });
            continue;
        }

        let mut end = position;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || is_delimiter(c) {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        lex_run(pattern, &pattern[position..end], position, &mut tokens)?;
    }

    Ok(tokens)
}

/// Classify one run of non-delimiter characters
fn lex_run(pattern: &str, run: &str, position: usize, tokens: &mut Vec<Token>) -> Result<()> {
    if let Some(rest) = run.strip_prefix('^') {
        tokens.push(Token {
            kind: TokenKind::Start,
            position,
        });
        if rest.is_empty() {
            return Ok(());
        }
        return lex_run(pattern, rest, position + 1, tokens);
    }

    if run == "$" {
        tokens.push(Token {
            kind: TokenKind::End,
            position,
        });
        return Ok(());
    }

    if run.chars().all(|c| c == '.') {
        for offset in 0..run.len() {
            tokens.push(Token {
                kind: TokenKind::Wildcard,
                position: position + offset,
            });
        }
        return Ok(());
    }

    if let Some(kind) = parse_literal(run) {
        tokens.push(Token { kind, position });
        return Ok(());
    }

    // `value_layer$` ends the sequence right after the atom.
    if let Some(atom) = run.strip_suffix('$') {
        if let Some(kind) = parse_literal(atom) {
            tokens.push(Token { kind, position });
            tokens.push(Token {
                kind: TokenKind::End,
                position: position + atom.len(),
            });
            return Ok(());
        }
    }

    Err(syntax_error(
        pattern,
        position,
        format!("atom `{run}` lacks a _layer suffix"),
    ))
}

fn parse_literal(run: &str) -> Option<TokenKind> {
    let caps = LITERAL.captures(run)?;
    Some(TokenKind::Literal {
        value: caps[1].to_string(),
        layer: caps[2].to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
