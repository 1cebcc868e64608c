/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Key resolution.
//!
//! A record used for a point lookup usually has only the key relevant to that
//! lookup populated. Resolution therefore tries the primary key first and then each
//! secondary index in schema order (locals before globals), picking the first key
//! whose components are all set. An unset component means "not meant for this
//! lookup"; see [`is_set`](crate::codec::is_set).

use tracing::trace;

use crate::codec::is_set;
use crate::error::KeyError;
use crate::schema::{IndexKind, ItemSchema, KeySchema, SecondaryIndex};
use crate::AttributeMap;

/// Identifies the secondary index a [`Key`] targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRef {
    name: String,
    kind: IndexKind,
}

impl IndexRef {
    fn of(index: &SecondaryIndex) -> Self {
        Self {
            name: index.name().to_string(),
            kind: index.kind(),
        }
    }

    /// The index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local or global.
    pub fn kind(&self) -> IndexKind {
        self.kind
    }
}

/// The minimal attribute map identifying an item, plus the index it targets.
///
/// A key without an index reference is the table's primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    attributes: AttributeMap,
    index: Option<IndexRef>,
}

impl Key {
    /// Whether this key is the table's primary key.
    pub fn is_primary(&self) -> bool {
        self.index.is_none()
    }

    /// The secondary index this key targets, if any.
    pub fn index(&self) -> Option<&IndexRef> {
        self.index.as_ref()
    }

    /// Key attributes by name.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Consumes the key, returning its attributes.
    pub fn into_attributes(self) -> AttributeMap {
        self.attributes
    }

    /// Extracts the primary key from a full item, e.g. one returned by an index query.
    pub fn primary_from_item(item: &AttributeMap, schema: &ItemSchema) -> Result<Self, KeyError> {
        resolve_primary_key(item, schema)
    }
}

/// Resolves the primary key from encoded attributes.
///
/// Fails with [`IncompleteKey`](crate::KeyErrorKind::IncompleteKey) naming the first
/// component that is missing or unset.
pub fn resolve_primary_key(attributes: &AttributeMap, schema: &ItemSchema) -> Result<Key, KeyError> {
    let key = collect(attributes, schema.primary_key()).map_err(KeyError::incomplete)?;
    Ok(Key {
        attributes: key,
        index: None,
    })
}

/// Resolves the key identifying an item: the primary key if complete, else the first
/// complete secondary index key.
pub fn resolve_key(attributes: &AttributeMap, schema: &ItemSchema) -> Result<Key, KeyError> {
    match resolve_primary_key(attributes, schema) {
        Ok(key) => return Ok(key),
        Err(e) => trace!(schema = schema.type_name(), error = %e, "primary key not usable"),
    }

    for index in schema.indexes() {
        match collect(attributes, index.key()) {
            Ok(key) => {
                trace!(
                    schema = schema.type_name(),
                    index = index.name(),
                    kind = %index.kind(),
                    "resolved secondary index key"
                );
                return Ok(Key {
                    attributes: key,
                    index: Some(IndexRef::of(index)),
                });
            }
            Err(missing) => trace!(index = index.name(), missing, "index key not usable"),
        }
    }
    Err(KeyError::no_valid_key())
}

// On failure returns the first attribute that is not set.
fn collect<'a>(attributes: &AttributeMap, key: &'a KeySchema) -> Result<AttributeMap, &'a str> {
    key.components()
        .map(|component| {
            let name = component.attribute_name();
            match attributes.get(name) {
                Some(value) if is_set(value) => Ok((name.to_string(), value.clone())),
                _ => Err(name),
            }
        })
        .collect::<Result<AttributeMap, _>>()
}
