/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Evaluates DynamoDB condition expressions against stored items.
//!
//! Covers comparisons, `BETWEEN`, `IN`, `AND`/`OR`/`NOT`, parentheses, document paths and
//! the `attribute_exists`, `attribute_not_exists`, `begins_with` and `contains`
//! functions.

use std::cmp::Ordering;
use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use ddb_mapper_core::AttributeMap;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Name(String),
    Value(String),
    Ident(String),
    Index(usize),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    Dot,
    LBracket,
    RBracket,
}

fn tokenize(expression: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let word = |start: usize| {
        let mut end = start;
        while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
            end += 1;
        }
        (chars[start..end].iter().collect::<String>(), end)
    };
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '#' | ':' => {
                let (text, end) = word(i + 1);
                if text.is_empty() {
                    return Err(format!("dangling '{}' at {}", c, i));
                }
                let placeholder = format!("{}{}", c, text);
                tokens.push(if c == '#' {
                    Tok::Name(placeholder)
                } else {
                    Tok::Value(placeholder)
                });
                i = end;
            }
            c if c.is_ascii_digit() => {
                let (text, end) = word(i);
                let index = text
                    .parse()
                    .map_err(|_| format!("invalid list index '{}'", text))?;
                tokens.push(Tok::Index(index));
                i = end;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let (text, end) = word(i);
                tokens.push(Tok::Ident(text));
                i = end;
            }
            '<' | '>' | '=' => {
                let next = chars.get(i + 1).copied();
                let (op, len) = match (c, next) {
                    ('<', Some('>')) => ("<>", 2),
                    ('<', Some('=')) => ("<=", 2),
                    ('>', Some('=')) => (">=", 2),
                    ('<', _) => ("<", 1),
                    ('>', _) => (">", 1),
                    _ => ("=", 1),
                };
                tokens.push(Tok::Op(op));
                i += len;
            }
            '(' => {
                tokens.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Tok::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Tok::Comma);
                i += 1;
            }
            '.' => {
                tokens.push(Tok::Dot);
                i += 1;
            }
            '[' => {
                tokens.push(Tok::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Tok::RBracket);
                i += 1;
            }
            other => return Err(format!("unexpected '{}' at {}", other, i)),
        }
    }
    Ok(tokens)
}

/// `ExpressionAttributeNames` and `ExpressionAttributeValues` of a request.
#[derive(Debug, Clone, Copy)]
pub(super) struct Bindings<'a> {
    pub(super) names: Option<&'a HashMap<String, String>>,
    pub(super) values: Option<&'a HashMap<String, AttributeValue>>,
}

impl Bindings<'_> {
    fn name(&self, placeholder: &str) -> Result<String, String> {
        self.names
            .and_then(|names| names.get(placeholder))
            .cloned()
            .ok_or_else(|| format!("unbound attribute name {}", placeholder))
    }

    fn value(&self, placeholder: &str) -> Result<AttributeValue, String> {
        self.values
            .and_then(|values| values.get(placeholder))
            .cloned()
            .ok_or_else(|| format!("unbound value {}", placeholder))
    }
}

/// Evaluates `expression` against `item`.
pub(super) fn evaluate(
    expression: &str,
    bindings: Bindings<'_>,
    item: &AttributeMap,
) -> Result<bool, String> {
    let mut parser = Parser {
        tokens: tokenize(expression)?,
        pos: 0,
        bindings,
        item,
    };
    let result = parser.or()?;
    match parser.peek() {
        None => Ok(result),
        Some(tok) => Err(format!("trailing {:?}", tok)),
    }
}

/// Keeps the top-level attributes named by a projection expression.
pub(super) fn project(
    item: AttributeMap,
    projection: &str,
    bindings: Bindings<'_>,
) -> Result<AttributeMap, String> {
    let mut keep = Vec::new();
    for path in projection.split(',') {
        let head = path
            .trim()
            .split(['.', '['])
            .next()
            .unwrap_or_default()
            .to_string();
        keep.push(if head.starts_with('#') {
            bindings.name(&head)?
        } else {
            head
        });
    }
    Ok(item
        .into_iter()
        .filter(|(name, _)| keep.contains(name))
        .collect())
}

/// Orders two scalar values of the same type.
pub(super) fn compare(a: &AttributeValue, b: &AttributeValue) -> Option<Ordering> {
    match (a, b) {
        (AttributeValue::N(a), AttributeValue::N(b)) => {
            let a: f64 = a.parse().ok()?;
            let b: f64 = b.parse().ok()?;
            a.partial_cmp(&b)
        }
        (AttributeValue::S(a), AttributeValue::S(b)) => Some(a.cmp(b)),
        (AttributeValue::B(a), AttributeValue::B(b)) => Some(a.as_ref().cmp(b.as_ref())),
        _ => None,
    }
}

fn equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    match compare(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

struct Parser<'a> {
    tokens: Vec<Tok>,
    pos: usize,
    bindings: Bindings<'a>,
    item: &'a AttributeMap,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Tok) -> Result<(), String> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            other => Err(format!("expected {:?}, found {:?}", expected, other)),
        }
    }

    fn keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(Tok::Ident(ident)) if ident.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn or(&mut self) -> Result<bool, String> {
        let mut result = self.and()?;
        while self.keyword("OR") {
            let rhs = self.and()?;
            result = result || rhs;
        }
        Ok(result)
    }

    fn and(&mut self) -> Result<bool, String> {
        let mut result = self.not()?;
        while self.keyword("AND") {
            let rhs = self.not()?;
            result = result && rhs;
        }
        Ok(result)
    }

    fn not(&mut self) -> Result<bool, String> {
        if self.keyword("NOT") {
            return Ok(!self.not()?);
        }
        self.condition()
    }

    fn condition(&mut self) -> Result<bool, String> {
        if self.peek() == Some(&Tok::LParen) {
            self.pos += 1;
            let result = self.or()?;
            self.expect(Tok::RParen)?;
            return Ok(result);
        }
        let function = match (self.peek(), self.tokens.get(self.pos + 1)) {
            (Some(Tok::Ident(function)), Some(Tok::LParen)) => Some(function.clone()),
            _ => None,
        };
        if let Some(function) = function {
            self.pos += 2;
            let mut args = vec![self.operand()?];
            while self.peek() == Some(&Tok::Comma) {
                self.pos += 1;
                args.push(self.operand()?);
            }
            self.expect(Tok::RParen)?;
            return call(&function, &args);
        }

        let lhs = self.operand()?;
        if self.keyword("BETWEEN") {
            let low = self.operand()?;
            if !self.keyword("AND") {
                return Err("BETWEEN without AND".to_string());
            }
            let high = self.operand()?;
            return Ok(match (&lhs, &low, &high) {
                (Some(v), Some(low), Some(high)) => {
                    matches!(compare(low, v), Some(Ordering::Less | Ordering::Equal))
                        && matches!(compare(v, high), Some(Ordering::Less | Ordering::Equal))
                }
                _ => false,
            });
        }
        if self.keyword("IN") {
            self.expect(Tok::LParen)?;
            let mut candidates = vec![self.operand()?];
            while self.peek() == Some(&Tok::Comma) {
                self.pos += 1;
                candidates.push(self.operand()?);
            }
            self.expect(Tok::RParen)?;
            return Ok(match &lhs {
                Some(v) => candidates.iter().flatten().any(|c| equal(v, c)),
                None => false,
            });
        }
        let op = match self.advance() {
            Some(Tok::Op(op)) => op,
            other => return Err(format!("expected comparator, found {:?}", other)),
        };
        let rhs = self.operand()?;
        let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
            return Ok(false);
        };
        Ok(match op {
            "=" => equal(&lhs, &rhs),
            "<>" => !equal(&lhs, &rhs),
            _ => match compare(&lhs, &rhs) {
                Some(ordering) => match op {
                    "<" => ordering == Ordering::Less,
                    "<=" => ordering != Ordering::Greater,
                    ">" => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
                None => false,
            },
        })
    }

    // Resolves a value placeholder or a document path. Missing paths are `None`.
    fn operand(&mut self) -> Result<Option<AttributeValue>, String> {
        let head = match self.advance() {
            Some(Tok::Value(placeholder)) => return self.bindings.value(&placeholder).map(Some),
            Some(Tok::Name(placeholder)) => self.bindings.name(&placeholder)?,
            Some(Tok::Ident(name)) => name,
            other => return Err(format!("expected operand, found {:?}", other)),
        };
        let mut current = self.item.get(&head).cloned();
        loop {
            match self.peek() {
                Some(Tok::Dot) => {
                    self.pos += 1;
                    let member = match self.advance() {
                        Some(Tok::Name(placeholder)) => self.bindings.name(&placeholder)?,
                        Some(Tok::Ident(name)) => name,
                        other => return Err(format!("expected member, found {:?}", other)),
                    };
                    current = match current {
                        Some(AttributeValue::M(mut map)) => map.remove(&member),
                        _ => None,
                    };
                }
                Some(Tok::LBracket) => {
                    self.pos += 1;
                    let index = match self.advance() {
                        Some(Tok::Index(index)) => index,
                        other => return Err(format!("expected index, found {:?}", other)),
                    };
                    self.expect(Tok::RBracket)?;
                    current = match current {
                        Some(AttributeValue::L(list)) => list.into_iter().nth(index),
                        _ => None,
                    };
                }
                _ => return Ok(current),
            }
        }
    }
}

fn call(function: &str, args: &[Option<AttributeValue>]) -> Result<bool, String> {
    match (function, args) {
        ("attribute_exists", [path]) => Ok(path.is_some()),
        ("attribute_not_exists", [path]) => Ok(path.is_none()),
        ("begins_with", [Some(AttributeValue::S(s)), Some(AttributeValue::S(prefix))]) => {
            Ok(s.starts_with(prefix.as_str()))
        }
        ("begins_with", [_, _]) => Ok(false),
        ("contains", [Some(haystack), Some(needle)]) => Ok(match (haystack, needle) {
            (AttributeValue::S(s), AttributeValue::S(sub)) => s.contains(sub.as_str()),
            (AttributeValue::Ss(set), AttributeValue::S(s)) => set.contains(s),
            (AttributeValue::Ns(set), AttributeValue::N(n)) => set.contains(n),
            (AttributeValue::L(list), value) => list.iter().any(|v| equal(v, value)),
            _ => false,
        }),
        ("contains", [_, _]) => Ok(false),
        _ => Err(format!(
            "unsupported function {}/{}",
            function,
            args.len()
        )),
    }
}
