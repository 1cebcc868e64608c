/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Conversion between records and DynamoDB items.
//!
//! [`encode`] marshals a record through its [`ItemConverter`] and then prunes
//! every empty string and `NULL` attribute, recursing into nested maps. DynamoDB
//! treats those as values distinct from "absent", so writing them would store
//! meaningless data. Numeric zero is a real value and is never pruned.
//!
//! [`decode`] is the inverse. Attributes missing from the item are filled from
//! [`AttributeValueConvert::absent_value`].

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::ConversionError;
use crate::schema::ItemSchema;
use crate::traits::{AttributeValueConvert, ItemConverter};
use crate::AttributeMap;

/// Collects the fields of a record into an item.
#[derive(Debug)]
pub struct ItemWriter<'a> {
    schema: &'a ItemSchema,
    item: AttributeMap,
}

impl<'a> ItemWriter<'a> {
    /// Creates a writer resolving names against `schema`.
    pub fn new(schema: &'a ItemSchema) -> Self {
        Self {
            schema,
            item: AttributeMap::with_capacity(schema.fields().len()),
        }
    }

    /// Writes `value` under the attribute name of `field_name`.
    pub fn field<V: AttributeValueConvert>(
        &mut self,
        field_name: &str,
        value: &V,
    ) -> Result<&mut Self, ConversionError> {
        let attribute = self.schema.attribute_name(field_name);
        let value = value
            .to_attribute_value()
            .map_err(|e| e.in_attribute(attribute))?;
        self.item.insert(attribute.to_string(), value);
        Ok(self)
    }

    /// Returns the item as written, before pruning.
    pub fn finish(self) -> AttributeMap {
        self.item
    }
}

/// Reads the fields of a record out of an item.
#[derive(Debug)]
pub struct ItemReader<'a> {
    schema: &'a ItemSchema,
    item: AttributeMap,
}

impl<'a> ItemReader<'a> {
    /// Creates a reader over `item`, resolving names against `schema`.
    pub fn new(schema: &'a ItemSchema, item: AttributeMap) -> Self {
        Self { schema, item }
    }

    /// Reads the attribute for `field_name`.
    ///
    /// A missing attribute yields the type's absent value, or a
    /// [`MissingAttribute`](crate::ConversionErrorKind::MissingAttribute) error when the
    /// type has none.
    pub fn field<V: AttributeValueConvert>(&mut self, field_name: &str) -> Result<V, ConversionError> {
        let attribute = self.schema.attribute_name(field_name);
        match self.item.remove(attribute) {
            Some(value) => V::from_attribute_value(value).map_err(|e| e.in_attribute(attribute)),
            None => V::absent_value().ok_or_else(|| ConversionError::missing_attribute(attribute)),
        }
    }
}

/// Encodes `record` into a pruned item.
pub fn encode<T: ItemConverter>(
    record: &T,
    schema: &ItemSchema,
) -> Result<AttributeMap, ConversionError> {
    let mut writer = ItemWriter::new(schema);
    record.write_item(&mut writer)?;
    Ok(prune(writer.finish()))
}

/// Decodes `item` into a record.
pub fn decode<T: ItemConverter>(
    item: AttributeMap,
    schema: &ItemSchema,
) -> Result<T, ConversionError> {
    let mut reader = ItemReader::new(schema, item);
    T::read_item(&mut reader)
}

/// Removes empty-string and `NULL` attributes, recursing into nested maps.
pub fn prune(mut item: AttributeMap) -> AttributeMap {
    item.retain(|_, value| prune_value(value));
    item
}

// Returns whether the value should be kept.
fn prune_value(value: &mut AttributeValue) -> bool {
    match value {
        AttributeValue::S(s) => !s.is_empty(),
        AttributeValue::Null(_) => false,
        AttributeValue::M(nested) => {
            nested.retain(|_, v| prune_value(v));
            true
        }
        _ => true,
    }
}

/// Whether a value may serve as a key component: present, non-null, non-empty.
pub fn is_set(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::S(s) => !s.is_empty(),
        AttributeValue::B(b) => !b.as_ref().is_empty(),
        AttributeValue::Null(_) => false,
        _ => true,
    }
}
