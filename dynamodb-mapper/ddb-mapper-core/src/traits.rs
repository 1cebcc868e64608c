/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Core traits for the DynamoDB Mapper.

use aws_sdk_dynamodb::types::AttributeValue;

use crate::codec::{ItemReader, ItemWriter};
use crate::convert::AttributeType;
use crate::error::ConversionError;
use crate::schema::SchemaDeclaration;

/// Converts individual Rust values to/from DynamoDB AttributeValues.
///
/// This trait handles conversion of single values like `String`, `i64`, `Vec<T>`, etc.
/// For converting complete structs to/from DynamoDB items, see [`ItemConverter`].
pub trait AttributeValueConvert: Clone + Send + Sync + 'static {
    /// The wire type this value is written as.
    fn attribute_type() -> AttributeType;

    /// Converts this value to a DynamoDB AttributeValue.
    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError>;

    /// Constructs a value from a DynamoDB AttributeValue.
    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError>;

    /// The value to use when the attribute is missing from an item.
    ///
    /// Types whose "unset" encoding is pruned on write (`None`, `""`, empty sets)
    /// return a value here so that decoding stays the inverse of encoding. Everything
    /// else is required and returns `None`.
    fn absent_value() -> Option<Self> {
        None
    }
}

/// Declares the attribute layout, primary key and secondary indexes of a record type.
///
/// The declaration is turned into an [`ItemSchema`](crate::ItemSchema) once per type
/// by a [`SchemaRegistry`](crate::SchemaRegistry).
pub trait ProvideItemSchema: Sized + 'static {
    /// Returns the declaration for this type.
    fn declare_schema() -> SchemaDeclaration;
}

/// Converts complete Rust structs to/from DynamoDB items.
///
/// Implementations address fields by their Rust field name; the writer and reader
/// translate those into attribute names using the type's schema.
pub trait ItemConverter: Sized {
    /// Writes every field of this object.
    fn write_item(&self, writer: &mut ItemWriter<'_>) -> Result<(), ConversionError>;

    /// Constructs an object from the fields of an item.
    fn read_item(reader: &mut ItemReader<'_>) -> Result<Self, ConversionError>;
}

/// A record that can be stored by the mapper.
pub trait Item: ProvideItemSchema + ItemConverter + Send + Sync {}

impl<T> Item for T where T: ProvideItemSchema + ItemConverter + Send + Sync {}
