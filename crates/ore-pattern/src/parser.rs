//! Pattern parser
//!
//! Builds an [`Node`] tree from the token stream. Capture groups are numbered
//! from 1 in the order their opening parenthesis appears.

use ore_core::Result;

use crate::lexer::{syntax_error, tokenize, Token, TokenKind};

/// Test applied to the tags at a single position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// Tag of `layer` equals `value`
    Literal { layer: String, value: String },
    /// Any position
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `?`
    ZeroOrOne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Atom(Atom),
    Class { negated: bool, atoms: Vec<Atom> },
    Group { index: usize, inner: Box<Node> },
    Concat(Vec<Node>),
    Repeat { inner: Box<Node>, quantifier: Quantifier },
    Start,
    End,
}

/// Parsed pattern: the syntax tree plus the number of capture groups
#[derive(Debug, Clone)]
pub struct Ast {
    pub root: Node,
    pub group_count: usize,
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    group_count: usize,
}

/// Parse a pattern string into a syntax tree
pub fn parse(source: &str) -> Result<Ast> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(syntax_error(source, 0, "empty pattern"));
    }

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        group_count: 0,
    };
    let root = parser.parse_sequence(false)?;

    Ok(Ast {
        root,
        group_count: parser.group_count,
    })
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn end_position(&self) -> usize {
        self.source.len()
    }

    /// Parse until end of input, or until `)` when inside a group
    fn parse_sequence(&mut self, in_group: bool) -> Result<Node> {
        let mut items: Vec<Node> = Vec::new();

        while let Some(token) = self.peek().cloned() {
            match token.kind {
                TokenKind::GroupClose => {
                    if !in_group {
                        return Err(syntax_error(self.source, token.position, "unbalanced `)`"));
                    }
                    break;
                }
                TokenKind::GroupOpen => {
                    self.next();
                    self.group_count += 1;
                    let index = self.group_count;
                    let inner = self.parse_sequence(true)?;
                    match self.next() {
                        Some(Token {
                            kind: TokenKind::GroupClose,
                            ..
                        }) => {}
                        _ => {
                            return Err(syntax_error(
                                self.source,
                                token.position,
                                "unbalanced `(`",
                            ))
                        }
                    }
                    if matches!(&inner, Node::Concat(nodes) if nodes.is_empty()) {
                        return Err(syntax_error(self.source, token.position, "empty group"));
                    }
                    items.push(Node::Group {
                        index,
                        inner: Box::new(inner),
                    });
                }
                TokenKind::ClassOpen { negated } => {
                    self.next();
                    items.push(self.parse_class(negated, token.position)?);
                }
                TokenKind::ClassClose => {
                    return Err(syntax_error(self.source, token.position, "unbalanced `]`"));
                }
                TokenKind::Literal { layer, value } => {
                    self.next();
                    items.push(Node::Atom(Atom::Literal { layer, value }));
                }
                TokenKind::Wildcard => {
                    self.next();
                    items.push(Node::Atom(Atom::Wildcard));
                }
                TokenKind::Start => {
                    self.next();
                    items.push(Node::Start);
                }
                TokenKind::End => {
                    self.next();
                    items.push(Node::End);
                }
                TokenKind::Star => {
                    self.next();
                    self.quantify(&mut items, Quantifier::ZeroOrMore, token.position)?;
                }
                TokenKind::Plus => {
                    self.next();
                    self.quantify(&mut items, Quantifier::OneOrMore, token.position)?;
                }
                TokenKind::Question => {
                    self.next();
                    self.quantify(&mut items, Quantifier::ZeroOrOne, token.position)?;
                }
            }
        }

        Ok(Node::Concat(items))
    }

    /// Wrap the last parsed item in a repetition
    fn quantify(
        &self,
        items: &mut Vec<Node>,
        quantifier: Quantifier,
        position: usize,
    ) -> Result<()> {
        let target = match items.pop() {
            Some(node @ (Node::Atom(_) | Node::Class { .. } | Node::Group { .. })) => node,
            Some(Node::Repeat { .. }) => {
                return Err(syntax_error(
                    self.source,
                    position,
                    "quantifier follows another quantifier",
                ))
            }
            Some(_) => {
                return Err(syntax_error(
                    self.source,
                    position,
                    "quantifier cannot apply to an anchor",
                ))
            }
            None => {
                return Err(syntax_error(
                    self.source,
                    position,
                    "quantifier has nothing to repeat",
                ))
            }
        };
        items.push(Node::Repeat {
            inner: Box::new(target),
            quantifier,
        });
        Ok(())
    }

    fn parse_class(&mut self, negated: bool, open_position: usize) -> Result<Node> {
        let mut atoms = Vec::new();

        loop {
            let Some(token) = self.next() else {
                return Err(syntax_error(
                    self.source,
                    self.end_position(),
                    format!("class opened at {open_position} is never closed"),
                ));
            };
            match token.kind {
                TokenKind::ClassClose => break,
                TokenKind::Literal { layer, value } => atoms.push(Atom::Literal { layer, value }),
                TokenKind::Wildcard => atoms.push(Atom::Wildcard),
                TokenKind::Start | TokenKind::End => {
                    return Err(syntax_error(
                        self.source,
                        token.position,
                        "anchors are not allowed inside a class",
                    ))
                }
                _ => {
                    return Err(syntax_error(
                        self.source,
                        token.position,
                        "only atoms are allowed inside a class",
                    ))
                }
            }
        }

        if atoms.is_empty() {
            return Err(syntax_error(self.source, open_position, "empty class"));
        }
        Ok(Node::Class { negated, atoms })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ore_core::OreError;

    fn lit(value: &str, layer: &str) -> Atom {
        Atom::Literal {
            layer: layer.to_string(),
            value: value.to_string(),
        }
    }

    fn message(pattern: &str) -> String {
        match parse(pattern) {
            Err(OreError::PatternSyntax { message, .. }) => message,
            other => panic!("expected syntax error for {pattern:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_concat_with_repeat() {
        let ast = parse("B-NP_n I-NP_n*").unwrap();
        assert_eq!(ast.group_count, 0);
        assert_eq!(
            ast.root,
            Node::Concat(vec![
                Node::Atom(lit("B-NP", "n")),
                Node::Repeat {
                    inner: Box::new(Node::Atom(lit("I-NP", "n"))),
                    quantifier: Quantifier::ZeroOrMore,
                },
            ])
        );
    }

    #[test]
    fn test_group_numbering_follows_open_paren() {
        let ast = parse("((a_x) (b_x))").unwrap();
        assert_eq!(ast.group_count, 3);
        let Node::Concat(items) = ast.root else {
            panic!("expected concat");
        };
        let Node::Group { index, inner } = &items[0] else {
            panic!("expected group");
        };
        assert_eq!(*index, 1);
        let Node::Concat(inner_items) = inner.as_ref() else {
            panic!("expected concat");
        };
        assert!(matches!(inner_items[0], Node::Group { index: 2, .. }));
        assert!(matches!(inner_items[1], Node::Group { index: 3, .. }));
    }

    #[test]
    fn test_class_parsing() {
        let ast = parse("[^a_x b_y]+").unwrap();
        assert_eq!(
            ast.root,
            Node::Concat(vec![Node::Repeat {
                inner: Box::new(Node::Class {
                    negated: true,
                    atoms: vec![lit("a", "x"), lit("b", "y")],
                }),
                quantifier: Quantifier::OneOrMore,
            }])
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(message("").contains("empty pattern"));
        assert!(message("(a_x").contains("unbalanced `(`"));
        assert!(message("a_x)").contains("unbalanced `)`"));
        assert!(message("a_x]").contains("unbalanced `]`"));
        assert!(message("[a_x").contains("never closed"));
        assert!(message("[a_x $]").contains("anchors"));
        assert!(message("[a_x (b_x)]").contains("only atoms"));
        assert!(message("[]").contains("empty class"));
        assert!(message("()").contains("empty group"));
        assert!(message("* a_x").contains("nothing to repeat"));
        assert!(message("a_x*+").contains("another quantifier"));
        assert!(message("^*").contains("anchor"));
        assert!(message("mayor").contains("_layer suffix"));
    }
}
