/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

/// Error raised while compiling a caller-supplied expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionError {
    kind: ExpressionErrorKind,
}

/// The kind of expression error that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExpressionErrorKind {
    /// The expression was empty or only whitespace.
    EmptyExpression,
    /// The number of distinct `:placeholders` does not match the number of values.
    ArgumentCount {
        /// Distinct placeholders found in the expression.
        expected: usize,
        /// Values supplied.
        actual: usize,
    },
    /// A character outside the expression grammar.
    UnexpectedCharacter {
        /// The offending character.
        character: char,
        /// Byte offset in the expression.
        position: usize,
    },
    /// A caller-written `#name` placeholder. Attribute names are substituted automatically.
    NamePlaceholder {
        /// Byte offset in the expression.
        position: usize,
    },
    /// A query was built without a hash key condition.
    MissingKeyCondition,
}

impl ExpressionError {
    pub(crate) fn new(kind: ExpressionErrorKind) -> Self {
        Self { kind }
    }

    /// Creates the error for a query with no hash key condition.
    pub fn missing_key_condition() -> Self {
        Self::new(ExpressionErrorKind::MissingKeyCondition)
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ExpressionErrorKind {
        &self.kind
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionErrorKind::EmptyExpression => write!(f, "expression is empty"),
            ExpressionErrorKind::ArgumentCount { expected, actual } => write!(
                f,
                "expression has {} placeholder(s) but {} value(s) were supplied",
                expected, actual
            ),
            ExpressionErrorKind::UnexpectedCharacter {
                character,
                position,
            } => write!(
                f,
                "unexpected character '{}' at offset {}",
                character, position
            ),
            ExpressionErrorKind::NamePlaceholder { position } => write!(
                f,
                "attribute name placeholder at offset {}; write the attribute name directly",
                position
            ),
            ExpressionErrorKind::MissingKeyCondition => {
                write!(f, "query requires a hash key condition")
            }
        }
    }
}

impl std::error::Error for ExpressionError {}
