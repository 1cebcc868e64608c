/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! High-level DynamoDB mapper for the AWS SDK for Rust.
//!
//! Record types declare their attributes, primary key and secondary indexes through
//! [`ProvideItemSchema`] and convert themselves through [`ItemConverter`]. A [`Mapper`]
//! then turns records into requests:
//!
//! - `get` and `delete` resolve the key identifying a record. A complete primary key is
//!   used directly; otherwise the first complete secondary index key is looked up
//!   through a single-item index query.
//! - `put` encodes the record, dropping empty strings and nulls.
//! - `batch_get` and `batch_write` split their work into requests DynamoDB accepts.
//! - `query` and `scan` compile caller expressions with generated placeholders and
//!   return a lazily paginated [`ResultIterator`](paginator::ResultIterator).
//!
//! Requests are sent through a [`Transport`], implemented for
//! [`aws_sdk_dynamodb::Client`].
//!
//! # Example
//!
//! ```no_run
//! use ddb_mapper::{
//!     ConversionError, FieldSpec, ItemConverter, ItemReader, ItemWriter, Mapper,
//!     ProvideItemSchema, SchemaDeclaration,
//! };
//!
//! struct Pair {
//!     key: String,
//!     value: String,
//! }
//!
//! impl ProvideItemSchema for Pair {
//!     fn declare_schema() -> SchemaDeclaration {
//!         SchemaDeclaration::new()
//!             .field(FieldSpec::new::<String>("key").rename("Key").hash_key())
//!             .field(FieldSpec::new::<String>("value").rename("Value"))
//!     }
//! }
//!
//! impl ItemConverter for Pair {
//!     fn write_item(&self, writer: &mut ItemWriter<'_>) -> Result<(), ConversionError> {
//!         writer.field("key", &self.key)?.field("value", &self.value)?;
//!         Ok(())
//!     }
//!
//!     fn read_item(reader: &mut ItemReader<'_>) -> Result<Self, ConversionError> {
//!         Ok(Self { key: reader.field("key")?, value: reader.field("value")? })
//!     }
//! }
//!
//! # async fn example(client: aws_sdk_dynamodb::Client) -> Result<(), ddb_mapper::Error> {
//! let mapper = Mapper::new(client);
//! let pair = Pair { key: "k1".into(), value: "v1".into() };
//! mapper.put("Pairs", &pair).send().await?;
//!
//! let lookup = Pair { key: "k1".into(), value: String::new() };
//! let stored = mapper.get("Pairs", &lookup).send().await?;
//! assert_eq!(stored.map(|p| p.value).as_deref(), Some("v1"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub use ddb_mapper_core::*;

/// Placeholder-safe expression compilation.
pub mod expressions {
    pub use ddb_mapper_expressions::*;
}

mod client;
pub mod config;
mod error;
pub mod operation;
pub mod paginator;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use client::Mapper;
pub use config::Config;
pub use error::Error;
pub use transport::Transport;
