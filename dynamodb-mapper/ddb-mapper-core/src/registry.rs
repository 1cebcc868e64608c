/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Per-type cache of built schemas.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::SchemaError;
use crate::schema::ItemSchema;
use crate::traits::ProvideItemSchema;

/// Builds each record type's [`ItemSchema`] once and hands out shared references to it.
///
/// Lookups only take a read lock. When two callers race on the first use of a type,
/// both may build a schema but only the first one inserted is ever returned, so every
/// caller observes the same descriptor. Failed builds are not cached.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<ItemSchema>>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema of `T`, building and caching it on first use.
    pub fn describe<T: ProvideItemSchema>(&self) -> Result<Arc<ItemSchema>, SchemaError> {
        let id = TypeId::of::<T>();
        if let Some(schema) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(schema.clone());
        }

        let built = Arc::new(ItemSchema::of::<T>()?);
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        let schema = schemas.entry(id).or_insert_with(|| {
            debug!(
                schema = built.type_name(),
                indexes = built.indexes().len(),
                "cached item schema"
            );
            built
        });
        Ok(schema.clone())
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no schema has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("cached", &self.len())
            .finish()
    }
}
