/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{ExpressionError, ExpressionErrorKind};
use crate::value::ExpressionValue;

const SUFFIX_LEN: usize = 8;
const KEYWORDS: &[&str] = &["AND", "OR", "NOT", "BETWEEN", "IN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Whitespace(&'a str),
    Identifier(&'a str),
    Quoted(&'a str),
    Placeholder(&'a str),
    Number(&'a str),
    Punct(char),
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

// Condition expressions have no arithmetic, so `-` can only be part of a name.
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn unexpected(character: char, position: usize) -> ExpressionError {
    ExpressionError::new(ExpressionErrorKind::UnexpectedCharacter {
        character,
        position,
    })
}

// Consumes characters matching `pred` and returns the end offset.
fn take_while(chars: &mut Peekable<CharIndices<'_>>, len: usize, pred: fn(char) -> bool) -> usize {
    while let Some(&(_, c)) = chars.peek() {
        if !pred(c) {
            break;
        }
        chars.next();
    }
    chars.peek().map_or(len, |&(i, _)| i)
}

fn tokenize(expression: &str) -> Result<Vec<Token<'_>>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();
    let len = expression.len();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                let end = take_while(&mut chars, len, char::is_whitespace);
                tokens.push(Token::Whitespace(&expression[start..end]));
            }
            ':' => {
                chars.next();
                let end = take_while(&mut chars, len, is_ident_char);
                if end == start + 1 {
                    return Err(unexpected(':', start));
                }
                tokens.push(Token::Placeholder(&expression[start..end]));
            }
            '`' => {
                chars.next();
                let end = take_while(&mut chars, len, |c| c != '`');
                if chars.next().is_none() || end == start + 1 {
                    return Err(unexpected('`', start));
                }
                tokens.push(Token::Quoted(&expression[start + 1..end]));
            }
            '#' => {
                return Err(ExpressionError::new(ExpressionErrorKind::NamePlaceholder {
                    position: start,
                }))
            }
            c if is_ident_start(c) => {
                let end = take_while(&mut chars, len, is_ident_char);
                tokens.push(Token::Identifier(&expression[start..end]));
            }
            c if c.is_ascii_digit() => {
                let end = take_while(&mut chars, len, |c| c.is_ascii_digit());
                tokens.push(Token::Number(&expression[start..end]));
            }
            '=' | '<' | '>' | '(' | ')' | ',' | '.' | '[' | ']' => {
                chars.next();
                tokens.push(Token::Punct(c));
            }
            other => return Err(unexpected(other, start)),
        }
    }
    Ok(tokens)
}

/// Names and values referenced by compiled expressions.
///
/// Both maps are `None` when empty; DynamoDB rejects empty maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionAttributes {
    /// `ExpressionAttributeNames`: placeholder to attribute name.
    pub names: Option<HashMap<String, String>>,
    /// `ExpressionAttributeValues`: placeholder to value.
    pub values: Option<HashMap<String, AttributeValue>>,
}

/// Compiles caller expressions into DynamoDB expression syntax.
///
/// Every `:name` placeholder is bound positionally and renamed to a generated
/// `:v` + 8 random letters. Every bare attribute name is renamed to a generated `#n`
/// placeholder, so reserved words like `Value` or `Range` are safe to use. Generated
/// names never repeat within one builder, however many expressions it compiles; an
/// attribute referenced twice shares one name placeholder.
///
/// Bare names may contain letters, digits, `_` and `-`. Any other attribute name can be
/// written between backticks: `` `order:id` = :v `` refers to the attribute `order:id`
/// as a single name, dots included.
///
/// ```
/// use ddb_mapper_expressions::ExpressionBuilder;
///
/// let mut builder = ExpressionBuilder::new();
/// let filter = builder.compile("Score BETWEEN :lo AND :hi", [1, 10]).unwrap();
/// let attributes = builder.into_attributes();
/// assert_eq!(attributes.values.unwrap().len(), 2);
/// assert!(filter.contains(" BETWEEN :v"));
/// ```
#[derive(Debug)]
pub struct ExpressionBuilder {
    rng: fastrand::Rng,
    names: HashMap<String, String>,
    name_placeholders: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionBuilder {
    /// Creates a builder with a randomly seeded generator.
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Creates a builder whose placeholder names are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            rng,
            names: HashMap::new(),
            name_placeholders: HashMap::new(),
            values: HashMap::new(),
        }
    }

    fn suffix(&mut self) -> String {
        (0..SUFFIX_LEN).map(|_| self.rng.alphabetic()).collect()
    }

    /// Binds `value` to a fresh placeholder and returns it.
    pub fn value_placeholder(&mut self, value: impl Into<ExpressionValue>) -> String {
        let value = value.into().into_inner();
        loop {
            let placeholder = format!(":v{}", self.suffix());
            if !self.values.contains_key(&placeholder) {
                self.values.insert(placeholder.clone(), value);
                return placeholder;
            }
        }
    }

    /// Returns the placeholder for `attribute`, allocating one on first use.
    pub fn name_placeholder(&mut self, attribute: &str) -> String {
        if let Some(existing) = self.name_placeholders.get(attribute) {
            return existing.clone();
        }
        loop {
            let placeholder = format!("#n{}", self.suffix());
            if !self.names.contains_key(&placeholder) {
                self.names.insert(placeholder.clone(), attribute.to_string());
                self.name_placeholders
                    .insert(attribute.to_string(), placeholder.clone());
                return placeholder;
            }
        }
    }

    /// Builds `attribute = value` with both sides substituted.
    pub fn equals(&mut self, attribute: &str, value: impl Into<ExpressionValue>) -> String {
        let name = self.name_placeholder(attribute);
        let value = self.value_placeholder(value);
        format!("{} = {}", name, value)
    }

    /// Compiles `expression`, binding its placeholders to `params` in order of first
    /// appearance.
    pub fn compile<V>(
        &mut self,
        expression: &str,
        params: impl IntoIterator<Item = V>,
    ) -> Result<String, ExpressionError>
    where
        V: Into<ExpressionValue>,
    {
        if expression.trim().is_empty() {
            return Err(ExpressionError::new(ExpressionErrorKind::EmptyExpression));
        }
        let tokens = tokenize(expression)?;

        let mut positional: Vec<&str> = Vec::new();
        for token in &tokens {
            if let Token::Placeholder(name) = token {
                if !positional.contains(name) {
                    positional.push(*name);
                }
            }
        }
        let params: Vec<ExpressionValue> = params.into_iter().map(Into::into).collect();
        if params.len() != positional.len() {
            return Err(ExpressionError::new(ExpressionErrorKind::ArgumentCount {
                expected: positional.len(),
                actual: params.len(),
            }));
        }
        let bound: HashMap<&str, String> = positional
            .into_iter()
            .zip(params)
            .map(|(name, value)| (name, self.value_placeholder(value)))
            .collect();

        let mut out = String::with_capacity(expression.len() * 2);
        for (i, token) in tokens.iter().enumerate() {
            match token {
                Token::Whitespace(s) | Token::Number(s) => out.push_str(s),
                Token::Punct(c) => out.push(*c),
                Token::Placeholder(name) => out.push_str(&bound[name]),
                Token::Quoted(name) => {
                    let placeholder = self.name_placeholder(name);
                    out.push_str(&placeholder);
                }
                Token::Identifier(ident) => {
                    let is_keyword = KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(ident));
                    let is_function = tokens[i + 1..]
                        .iter()
                        .find(|t| !matches!(t, Token::Whitespace(_)))
                        .is_some_and(|t| *t == Token::Punct('('));
                    if is_keyword || is_function {
                        out.push_str(ident);
                    } else {
                        let placeholder = self.name_placeholder(ident);
                        out.push_str(&placeholder);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Builds a projection expression for `attributes`.
    ///
    /// Each attribute is a document path: segments separated by `.`, each optionally
    /// followed by list indexes such as `[0]`. Segment names are substituted as they are,
    /// whatever characters they contain.
    pub fn projection<S: AsRef<str>>(&mut self, attributes: &[S]) -> Result<String, ExpressionError> {
        if attributes.is_empty() {
            return Err(ExpressionError::new(ExpressionErrorKind::EmptyExpression));
        }
        let mut paths = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            paths.push(self.path(attribute.as_ref())?);
        }
        Ok(paths.join(", "))
    }

    fn path(&mut self, path: &str) -> Result<String, ExpressionError> {
        let mut segments = Vec::new();
        for segment in path.split('.') {
            let (name, indexes) = split_indexes(segment);
            if name.is_empty() {
                return Err(ExpressionError::new(ExpressionErrorKind::EmptyExpression));
            }
            segments.push(format!("{}{}", self.name_placeholder(name), indexes));
        }
        Ok(segments.join("."))
    }

    /// The attribute names bound so far, by placeholder.
    pub fn names(&self) -> &HashMap<String, String> {
        &self.names
    }

    /// The values bound so far, by placeholder.
    pub fn values(&self) -> &HashMap<String, AttributeValue> {
        &self.values
    }

    /// Consumes the builder, returning the bound names and values.
    pub fn into_attributes(self) -> ExpressionAttributes {
        ExpressionAttributes {
            names: Some(self.names).filter(|m| !m.is_empty()),
            values: Some(self.values).filter(|m| !m.is_empty()),
        }
    }
}

// Splits trailing list indexes such as `[0][2]` off a path segment.
fn split_indexes(segment: &str) -> (&str, &str) {
    let mut end = segment.len();
    while segment[..end].ends_with(']') {
        let Some(open) = segment[..end].rfind('[') else {
            break;
        };
        let digits = &segment[open + 1..end - 1];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        end = open;
    }
    segment.split_at(end)
}

/// Joins expressions with `AND`, parenthesizing each when there is more than one.
pub fn conjunction<I>(expressions: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    let parts: Vec<String> = expressions.into_iter().collect();
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => Some(
            parts
                .iter()
                .map(|p| format!("({})", p))
                .collect::<Vec<_>>()
                .join(" AND "),
        ),
    }
}
