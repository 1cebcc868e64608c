/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! AttributeValueConvert implementations for standard Rust types.

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::ConversionError;
use crate::traits::AttributeValueConvert;

/// The DynamoDB wire type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// `S`
    String,
    /// `N`
    Number,
    /// `B`
    Binary,
    /// `BOOL`
    Bool,
    /// `NULL`
    Null,
    /// `L`
    List,
    /// `M`
    Map,
    /// `SS`
    StringSet,
    /// `NS`
    NumberSet,
    /// `BS`
    BinarySet,
}

impl AttributeType {
    /// Returns the type of an attribute value, or `None` for variants unknown to this version.
    pub fn of(value: &AttributeValue) -> Option<Self> {
        Some(match value {
            AttributeValue::S(_) => Self::String,
            AttributeValue::N(_) => Self::Number,
            AttributeValue::B(_) => Self::Binary,
            AttributeValue::Bool(_) => Self::Bool,
            AttributeValue::Null(_) => Self::Null,
            AttributeValue::L(_) => Self::List,
            AttributeValue::M(_) => Self::Map,
            AttributeValue::Ss(_) => Self::StringSet,
            AttributeValue::Ns(_) => Self::NumberSet,
            AttributeValue::Bs(_) => Self::BinarySet,
            _ => return None,
        })
    }

    /// The DynamoDB type descriptor, e.g. `"SS"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
            Self::Bool => "BOOL",
            Self::Null => "NULL",
            Self::List => "L",
            Self::Map => "M",
            Self::StringSet => "SS",
            Self::NumberSet => "NS",
            Self::BinarySet => "BS",
        }
    }

    /// Whether attributes of this type may be part of a key schema.
    pub fn is_key_type(&self) -> bool {
        matches!(self, Self::String | Self::Number | Self::Binary)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Helper to get type name from AttributeValue
pub(crate) fn attribute_type_name(av: &AttributeValue) -> &'static str {
    AttributeType::of(av)
        .map(|t| t.as_str())
        .unwrap_or("Unknown")
}

// ============================================================================
// Primitive types
// ============================================================================

impl AttributeValueConvert for String {
    fn attribute_type() -> AttributeType {
        AttributeType::String
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::S(self.clone()))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::S(s) => Ok(s),
            other => Err(ConversionError::type_mismatch(
                "S",
                attribute_type_name(&other),
            )),
        }
    }

    // Empty strings are pruned on write.
    fn absent_value() -> Option<Self> {
        Some(String::new())
    }
}

macro_rules! impl_number {
    ($($ty:ty),*) => {
        $(
            impl AttributeValueConvert for $ty {
                fn attribute_type() -> AttributeType {
                    AttributeType::Number
                }

                fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
                    Ok(AttributeValue::N(self.to_string()))
                }

                fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
                    match value {
                        AttributeValue::N(n) => n.parse().map_err(|_| {
                            ConversionError::invalid_value(format!(
                                "cannot parse '{}' as {}",
                                n,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(ConversionError::type_mismatch(
                            "N",
                            attribute_type_name(&other),
                        )),
                    }
                }
            }
        )*
    };
}

impl_number!(i16, i32, i64, u16, u32, u64);

macro_rules! impl_float {
    ($($ty:ty),*) => {
        $(
            impl AttributeValueConvert for $ty {
                fn attribute_type() -> AttributeType {
                    AttributeType::Number
                }

                fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
                    if !self.is_finite() {
                        return Err(ConversionError::invalid_value(format!(
                            "{} cannot be stored as a DynamoDB number",
                            self
                        )));
                    }
                    Ok(AttributeValue::N(self.to_string()))
                }

                fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
                    match value {
                        AttributeValue::N(n) => n.parse().map_err(|_| {
                            ConversionError::invalid_value(format!(
                                "cannot parse '{}' as {}",
                                n,
                                stringify!($ty)
                            ))
                        }),
                        other => Err(ConversionError::type_mismatch(
                            "N",
                            attribute_type_name(&other),
                        )),
                    }
                }
            }
        )*
    };
}

impl_float!(f32, f64);

impl AttributeValueConvert for bool {
    fn attribute_type() -> AttributeType {
        AttributeType::Bool
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::Bool(*self))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::Bool(b) => Ok(b),
            other => Err(ConversionError::type_mismatch(
                "BOOL",
                attribute_type_name(&other),
            )),
        }
    }
}

impl AttributeValueConvert for Vec<u8> {
    fn attribute_type() -> AttributeType {
        AttributeType::Binary
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::B(Blob::new(self.clone())))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::B(b) => Ok(b.into_inner()),
            other => Err(ConversionError::type_mismatch(
                "B",
                attribute_type_name(&other),
            )),
        }
    }
}

impl AttributeValueConvert for Blob {
    fn attribute_type() -> AttributeType {
        AttributeType::Binary
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        Ok(AttributeValue::B(self.clone()))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::B(b) => Ok(b),
            other => Err(ConversionError::type_mismatch(
                "B",
                attribute_type_name(&other),
            )),
        }
    }
}

// ============================================================================
// Collection types
// ============================================================================

impl<T: AttributeValueConvert> AttributeValueConvert for Option<T> {
    fn attribute_type() -> AttributeType {
        T::attribute_type()
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        match self {
            Some(v) => v.to_attribute_value(),
            None => Ok(AttributeValue::Null(true)),
        }
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::Null(_) => Ok(None),
            other => T::from_attribute_value(other).map(Some),
        }
    }

    fn absent_value() -> Option<Self> {
        Some(None)
    }
}

impl<T: AttributeValueConvert> AttributeValueConvert for Vec<T> {
    fn attribute_type() -> AttributeType {
        AttributeType::List
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        let items: Result<Vec<_>, _> = self.iter().map(|v| v.to_attribute_value()).collect();
        Ok(AttributeValue::L(items?))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::L(list) => list.into_iter().map(T::from_attribute_value).collect(),
            other => Err(ConversionError::type_mismatch(
                "L",
                attribute_type_name(&other),
            )),
        }
    }
}

impl<V: AttributeValueConvert> AttributeValueConvert for HashMap<String, V> {
    fn attribute_type() -> AttributeType {
        AttributeType::Map
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        let mut map = HashMap::with_capacity(self.len());
        for (k, v) in self {
            map.insert(k.clone(), v.to_attribute_value().map_err(|e| e.in_attribute(k))?);
        }
        Ok(AttributeValue::M(map))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::M(m) => {
                let mut result = HashMap::with_capacity(m.len());
                for (k, v) in m {
                    let value = V::from_attribute_value(v).map_err(|e| e.in_attribute(&k))?;
                    result.insert(k, value);
                }
                Ok(result)
            }
            other => Err(ConversionError::type_mismatch(
                "M",
                attribute_type_name(&other),
            )),
        }
    }
}

// DynamoDB rejects empty sets, so an empty set is written as NULL and pruned.

impl AttributeValueConvert for HashSet<String> {
    fn attribute_type() -> AttributeType {
        AttributeType::StringSet
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        if self.is_empty() {
            return Ok(AttributeValue::Null(true));
        }
        let mut members: Vec<String> = self.iter().cloned().collect();
        members.sort();
        Ok(AttributeValue::Ss(members))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::Ss(members) => Ok(members.into_iter().collect()),
            AttributeValue::Null(_) => Ok(HashSet::new()),
            other => Err(ConversionError::type_mismatch(
                "SS",
                attribute_type_name(&other),
            )),
        }
    }

    fn absent_value() -> Option<Self> {
        Some(HashSet::new())
    }
}

impl AttributeValueConvert for HashSet<i64> {
    fn attribute_type() -> AttributeType {
        AttributeType::NumberSet
    }

    fn to_attribute_value(&self) -> Result<AttributeValue, ConversionError> {
        if self.is_empty() {
            return Ok(AttributeValue::Null(true));
        }
        let mut members: Vec<i64> = self.iter().copied().collect();
        members.sort_unstable();
        Ok(AttributeValue::Ns(
            members.into_iter().map(|n| n.to_string()).collect(),
        ))
    }

    fn from_attribute_value(value: AttributeValue) -> Result<Self, ConversionError> {
        match value {
            AttributeValue::Ns(members) => members
                .into_iter()
                .map(|n| {
                    n.parse().map_err(|_| {
                        ConversionError::invalid_value(format!("cannot parse '{}' as i64", n))
                    })
                })
                .collect(),
            AttributeValue::Null(_) => Ok(HashSet::new()),
            other => Err(ConversionError::type_mismatch(
                "NS",
                attribute_type_name(&other),
            )),
        }
    }

    fn absent_value() -> Option<Self> {
        Some(HashSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_roundtrip() {
        let original = "hello".to_string();
        let av = original.to_attribute_value().unwrap();
        let recovered = String::from_attribute_value(av).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_integer_roundtrip() {
        let av = (-42i64).to_attribute_value().unwrap();
        assert_eq!(av, AttributeValue::N("-42".to_string()));
        assert_eq!(i64::from_attribute_value(av).unwrap(), -42);
        assert_eq!(
            u32::from_attribute_value(AttributeValue::N("7".into())).unwrap(),
            7
        );
    }

    #[test]
    fn test_f64_roundtrip() {
        let original: f64 = 2.5;
        let av = original.to_attribute_value().unwrap();
        let recovered = f64::from_attribute_value(av).unwrap();
        assert!((original - recovered).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let err = f64::NAN.to_attribute_value().unwrap_err();
        assert!(matches!(
            err.kind(),
            crate::ConversionErrorKind::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_unparseable_number() {
        let err = i32::from_attribute_value(AttributeValue::N("1.5".into())).unwrap_err();
        assert!(err.to_string().contains("cannot parse '1.5' as i32"));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let original = vec![1u8, 2, 3, 4];
        let av = original.to_attribute_value().unwrap();
        let recovered = Vec::<u8>::from_attribute_value(av).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_option_none_is_null() {
        let original: Option<String> = None;
        let av = original.to_attribute_value().unwrap();
        assert_eq!(av, AttributeValue::Null(true));
        let recovered = Option::<String>::from_attribute_value(av).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_vec_roundtrip() {
        let original = vec!["a".to_string(), "b".to_string()];
        let av = original.to_attribute_value().unwrap();
        let recovered = Vec::<String>::from_attribute_value(av).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_string_set_is_sorted_and_empty_set_is_null() {
        let set: HashSet<String> = ["b", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            set.to_attribute_value().unwrap(),
            AttributeValue::Ss(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            HashSet::<String>::new().to_attribute_value().unwrap(),
            AttributeValue::Null(true)
        );
    }

    #[test]
    fn test_number_set_roundtrip() {
        let set: HashSet<i64> = [3, 1, 2].into_iter().collect();
        let av = set.to_attribute_value().unwrap();
        assert_eq!(
            av,
            AttributeValue::Ns(vec!["1".into(), "2".into(), "3".into()])
        );
        assert_eq!(HashSet::<i64>::from_attribute_value(av).unwrap(), set);
    }

    #[test]
    fn test_map_error_names_entry() {
        let mut m = HashMap::new();
        m.insert("count".to_string(), AttributeValue::S("x".into()));
        let err = HashMap::<String, i64>::from_attribute_value(AttributeValue::M(m)).unwrap_err();
        assert_eq!(err.field(), Some("count"));
    }

    #[test]
    fn test_type_mismatch_error() {
        let av = AttributeValue::N("42".to_string());
        let result = String::from_attribute_value(av);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("expected S"));
    }

    #[test]
    fn test_absent_values() {
        assert_eq!(String::absent_value(), Some(String::new()));
        assert_eq!(Option::<i64>::absent_value(), Some(None));
        assert_eq!(i64::absent_value(), None);
        assert_eq!(bool::absent_value(), None);
    }
}
