/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;

/// A value bound to an expression placeholder.
///
/// Exists so that plain Rust literals can be passed as positional parameters:
/// `filter("Value = :v", [42])`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionValue(AttributeValue);

impl ExpressionValue {
    /// Returns the wrapped attribute value.
    pub fn into_inner(self) -> AttributeValue {
        self.0
    }
}

impl From<AttributeValue> for ExpressionValue {
    fn from(value: AttributeValue) -> Self {
        Self(value)
    }
}

impl From<&str> for ExpressionValue {
    fn from(value: &str) -> Self {
        Self(AttributeValue::S(value.to_string()))
    }
}

impl From<String> for ExpressionValue {
    fn from(value: String) -> Self {
        Self(AttributeValue::S(value))
    }
}

impl From<bool> for ExpressionValue {
    fn from(value: bool) -> Self {
        Self(AttributeValue::Bool(value))
    }
}

impl From<Vec<u8>> for ExpressionValue {
    fn from(value: Vec<u8>) -> Self {
        Self(AttributeValue::B(Blob::new(value)))
    }
}

macro_rules! from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ExpressionValue {
                fn from(value: $ty) -> Self {
                    Self(AttributeValue::N(value.to_string()))
                }
            }
        )*
    };
}

from_number!(i16, i32, i64, u16, u32, u64, f32, f64);
