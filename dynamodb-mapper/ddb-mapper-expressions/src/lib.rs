/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Placeholder-safe DynamoDB expressions.
//!
//! Callers write key conditions, filters and conditions with bare attribute names and
//! `:name` value placeholders. [`ExpressionBuilder`] rewrites each into DynamoDB syntax
//! with generated `#n…` and `:v…` placeholders, collecting the matching
//! `ExpressionAttributeNames` and `ExpressionAttributeValues`. It can be used standalone
//! with the low-level AWS SDK or as part of the DynamoDB Mapper library.

#![warn(missing_docs)]

mod builder;
mod error;
mod value;

pub use builder::{conjunction, ExpressionAttributes, ExpressionBuilder};
pub use error::{ExpressionError, ExpressionErrorKind};
pub use value::ExpressionValue;
