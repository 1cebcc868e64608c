/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Core traits and types for the DynamoDB Mapper.
//!
//! This crate provides the foundations the mapper builds on:
//!
//! - [`AttributeValueConvert`] - Convert individual values to/from DynamoDB AttributeValues
//! - [`ProvideItemSchema`] - Declare a record's attributes, primary key and secondary indexes
//! - [`ItemConverter`] - Convert complete structs to/from DynamoDB items
//! - [`SchemaRegistry`] - Build and cache one [`ItemSchema`] per record type
//! - [`resolve_key`] - Pick the primary or secondary index key identifying a record
//!
//! # Example
//!
//! ```
//! use ddb_mapper_core::{
//!     codec, resolve_key, ConversionError, FieldSpec, ItemConverter, ItemReader, ItemWriter,
//!     ProvideItemSchema, SchemaDeclaration, SchemaRegistry,
//! };
//!
//! struct User {
//!     id: String,
//!     name: Option<String>,
//! }
//!
//! impl ProvideItemSchema for User {
//!     fn declare_schema() -> SchemaDeclaration {
//!         SchemaDeclaration::new()
//!             .field(FieldSpec::new::<String>("id").rename("Id").hash_key())
//!             .field(FieldSpec::new::<Option<String>>("name"))
//!     }
//! }
//!
//! impl ItemConverter for User {
//!     fn write_item(&self, writer: &mut ItemWriter<'_>) -> Result<(), ConversionError> {
//!         writer.field("id", &self.id)?.field("name", &self.name)?;
//!         Ok(())
//!     }
//!
//!     fn read_item(reader: &mut ItemReader<'_>) -> Result<Self, ConversionError> {
//!         Ok(Self { id: reader.field("id")?, name: reader.field("name")? })
//!     }
//! }
//!
//! let registry = SchemaRegistry::new();
//! let schema = registry.describe::<User>().unwrap();
//! let item = codec::encode(&User { id: "u1".into(), name: None }, &schema).unwrap();
//! assert!(!item.contains_key("name"));
//! assert!(resolve_key(&item, &schema).unwrap().is_primary());
//! ```

#![warn(missing_docs)]

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

pub mod codec;
mod convert;
pub mod error;
pub mod key;
mod registry;
pub mod schema;
mod traits;

/// A DynamoDB item or key: attribute name to value.
pub type AttributeMap = HashMap<String, AttributeValue>;

pub use codec::{ItemReader, ItemWriter};
pub use convert::AttributeType;
pub use error::{
    ConversionError, ConversionErrorKind, KeyError, KeyErrorKind, SchemaError, SchemaErrorKind,
};
pub use key::{resolve_key, resolve_primary_key, IndexRef, Key};
pub use registry::SchemaRegistry;
pub use schema::{
    FieldDescriptor, FieldSpec, IndexKind, ItemSchema, KeyComponent, KeyRole, KeySchema,
    Projection, SchemaDeclaration, SecondaryIndex,
};
pub use traits::{AttributeValueConvert, Item, ItemConverter, ProvideItemSchema};
