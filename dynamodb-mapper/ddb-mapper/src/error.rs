/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_dynamodb::error::BuildError;
use aws_smithy_runtime_api::box_error::BoxError;
use ddb_mapper_core::{ConversionError, KeyError, SchemaError};
use ddb_mapper_expressions::ExpressionError;
use std::error::Error as StdError;
use std::fmt;

/// Error returned by mapper operations.
///
/// Each variant names the stage that failed; the underlying error is available
/// through [`source`](StdError::source).
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The record type's schema declaration is invalid.
    Schema(SchemaError),
    /// No usable key could be resolved from the record.
    Key(KeyError),
    /// A record could not be encoded or an item could not be decoded.
    Conversion(ConversionError),
    /// An expression could not be compiled.
    Expression(ExpressionError),
    /// The SDK rejected the request while building it.
    Build(BuildError),
    /// [`ResultIterator::next`](crate::paginator::ResultIterator::next) was called with no
    /// items left.
    Exhausted,
    /// The transport failed. The error is passed through unchanged.
    Transport(BoxError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Schema(_) => write!(f, "invalid item schema"),
            Error::Key(_) => write!(f, "failed to resolve item key"),
            Error::Conversion(_) => write!(f, "failed to convert item"),
            Error::Expression(_) => write!(f, "failed to compile expression"),
            Error::Build(_) => write!(f, "failed to build request"),
            Error::Exhausted => write!(f, "result iterator is exhausted"),
            Error::Transport(_) => write!(f, "request failed"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Schema(e) => Some(e),
            Error::Key(e) => Some(e),
            Error::Conversion(e) => Some(e),
            Error::Expression(e) => Some(e),
            Error::Build(e) => Some(e),
            Error::Exhausted => None,
            Error::Transport(e) => Some(e.as_ref()),
        }
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<KeyError> for Error {
    fn from(err: KeyError) -> Self {
        Error::Key(err)
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Error::Conversion(err)
    }
}

impl From<ExpressionError> for Error {
    fn from(err: ExpressionError) -> Self {
        Error::Expression(err)
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::Build(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_exposes_cause() {
        let err = Error::from(ExpressionError::missing_key_condition());
        assert_eq!(err.to_string(), "failed to compile expression");
        assert_eq!(
            err.source().map(|e| e.to_string()),
            Some("query requires a hash key condition".to_string())
        );
        assert!(Error::Exhausted.source().is_none());
    }

    #[test]
    fn transport_errors_pass_through() {
        let cause: BoxError = "connection reset".into();
        let err = Error::Transport(cause);
        assert_eq!(
            err.source().map(|e| e.to_string()),
            Some("connection reset".to_string())
        );
    }
}
