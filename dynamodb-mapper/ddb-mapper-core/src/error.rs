/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Error types for schema building, key resolution and attribute conversion.

use std::fmt;

/// Error that occurs during type conversion between Rust types and DynamoDB AttributeValues.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    kind: ConversionErrorKind,
    field: Option<String>,
}

/// The kind of conversion error that occurred.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConversionErrorKind {
    /// A required attribute was missing from the item.
    MissingAttribute,
    /// The attribute value had an unexpected type.
    InvalidType {
        /// The expected DynamoDB type.
        expected: &'static str,
        /// The actual DynamoDB type found.
        actual: &'static str,
    },
    /// The attribute value could not be parsed or was invalid.
    InvalidValue {
        /// Description of why the value was invalid.
        message: String,
    },
}

impl ConversionError {
    /// Creates an error for a missing attribute.
    pub fn missing_attribute(field: impl Into<String>) -> Self {
        Self {
            kind: ConversionErrorKind::MissingAttribute,
            field: Some(field.into()),
        }
    }

    /// Creates an error for an invalid value that is not tied to a named attribute.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self {
            kind: ConversionErrorKind::InvalidValue {
                message: message.into(),
            },
            field: None,
        }
    }

    /// Creates a type error without a field name (for standalone conversions).
    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self {
            kind: ConversionErrorKind::InvalidType { expected, actual },
            field: None,
        }
    }

    /// Attaches the attribute name to an error raised by a standalone conversion.
    ///
    /// An error that already names an attribute keeps the innermost name.
    pub fn in_attribute(mut self, field: impl Into<String>) -> Self {
        if self.field.is_none() {
            self.field = Some(field.into());
        }
        self
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConversionErrorKind {
        &self.kind
    }

    /// Returns the field name if available.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.field) {
            (ConversionErrorKind::MissingAttribute, Some(field)) => {
                write!(f, "missing required attribute '{}'", field)
            }
            (ConversionErrorKind::MissingAttribute, None) => {
                write!(f, "missing required attribute")
            }
            (ConversionErrorKind::InvalidType { expected, actual }, Some(field)) => {
                write!(
                    f,
                    "invalid type for '{}': expected {}, got {}",
                    field, expected, actual
                )
            }
            (ConversionErrorKind::InvalidType { expected, actual }, None) => {
                write!(f, "invalid type: expected {}, got {}", expected, actual)
            }
            (ConversionErrorKind::InvalidValue { message }, Some(field)) => {
                write!(f, "invalid value for '{}': {}", field, message)
            }
            (ConversionErrorKind::InvalidValue { message }, None) => {
                write!(f, "invalid value: {}", message)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// Error raised while building an [`ItemSchema`](crate::ItemSchema) from a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    type_name: &'static str,
    kind: SchemaErrorKind,
}

/// The kind of schema error that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaErrorKind {
    /// No field is marked as the primary hash key.
    MissingPrimaryKey,
    /// The same key role was assigned to more than one field of a key schema.
    DuplicateKeyRole {
        /// The primary key (`None`) or the index whose key schema is ambiguous.
        index: Option<String>,
        /// The duplicated role.
        role: &'static str,
    },
    /// An index was declared but no field is part of its key.
    EmptyIndex {
        /// Name of the index.
        index: String,
    },
    /// An index declares a range component without a hash component.
    MissingIndexHash {
        /// Name of the index.
        index: String,
    },
    /// A local index declares no range component.
    MissingIndexRange {
        /// Name of the index.
        index: String,
    },
    /// A local index names a hash key other than the table's hash key.
    LocalIndexHashMismatch {
        /// Name of the index.
        index: String,
        /// The hash attribute the index declared.
        attribute: String,
    },
    /// A field refers to an index that was never declared.
    UnknownIndex {
        /// Name of the index.
        index: String,
    },
    /// Two indexes were declared with the same name.
    DuplicateIndex {
        /// Name of the index.
        index: String,
    },
    /// Two fields resolve to the same attribute name.
    DuplicateAttribute {
        /// The attribute name.
        attribute: String,
    },
    /// A key component is not a string, number or binary attribute.
    InvalidKeyType {
        /// The attribute name.
        attribute: String,
        /// The attribute's declared type.
        actual: &'static str,
    },
}

impl SchemaError {
    pub(crate) fn new(type_name: &'static str, kind: SchemaErrorKind) -> Self {
        Self { type_name, kind }
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &SchemaErrorKind {
        &self.kind
    }

    /// Returns the Rust type whose declaration is invalid.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid schema for `{}`: ", self.type_name)?;
        match &self.kind {
            SchemaErrorKind::MissingPrimaryKey => write!(f, "no primary hash key declared"),
            SchemaErrorKind::DuplicateKeyRole { index: None, role } => {
                write!(f, "primary key declares more than one {} key", role)
            }
            SchemaErrorKind::DuplicateKeyRole {
                index: Some(index),
                role,
            } => write!(f, "index '{}' declares more than one {} key", index, role),
            SchemaErrorKind::EmptyIndex { index } => {
                write!(f, "index '{}' has no key components", index)
            }
            SchemaErrorKind::MissingIndexHash { index } => {
                write!(f, "index '{}' has a range key but no hash key", index)
            }
            SchemaErrorKind::MissingIndexRange { index } => {
                write!(f, "local index '{}' has no range key", index)
            }
            SchemaErrorKind::LocalIndexHashMismatch { index, attribute } => write!(
                f,
                "local index '{}' must share the table hash key, found '{}'",
                index, attribute
            ),
            SchemaErrorKind::UnknownIndex { index } => {
                write!(f, "field refers to undeclared index '{}'", index)
            }
            SchemaErrorKind::DuplicateIndex { index } => {
                write!(f, "index '{}' is declared more than once", index)
            }
            SchemaErrorKind::DuplicateAttribute { attribute } => {
                write!(f, "attribute '{}' is mapped by more than one field", attribute)
            }
            SchemaErrorKind::InvalidKeyType { attribute, actual } => write!(
                f,
                "key attribute '{}' must be S, N or B, found {}",
                attribute, actual
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Error raised when no usable key can be resolved from an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyError {
    kind: KeyErrorKind,
}

/// The kind of key resolution error that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyErrorKind {
    /// A primary key component is absent or unset.
    IncompleteKey {
        /// The first attribute found missing.
        attribute: String,
    },
    /// Neither the primary key nor any secondary index key is fully populated.
    NoValidKey,
}

impl KeyError {
    pub(crate) fn incomplete(attribute: impl Into<String>) -> Self {
        Self {
            kind: KeyErrorKind::IncompleteKey {
                attribute: attribute.into(),
            },
        }
    }

    pub(crate) fn no_valid_key() -> Self {
        Self {
            kind: KeyErrorKind::NoValidKey,
        }
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &KeyErrorKind {
        &self.kind
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            KeyErrorKind::IncompleteKey { attribute } => {
                write!(f, "incomplete primary key: '{}' is not set", attribute)
            }
            KeyErrorKind::NoValidKey => write!(
                f,
                "no valid key: neither the primary key nor any index key is fully populated"
            ),
        }
    }
}

impl std::error::Error for KeyError {}
