/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Schema declarations and the immutable [`ItemSchema`] built from them.

use std::collections::HashSet;
use std::fmt;

use crate::convert::AttributeType;
use crate::error::{SchemaError, SchemaErrorKind};
use crate::traits::{AttributeValueConvert, ProvideItemSchema};

/// The role a field plays inside a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
}

impl KeyRole {
    fn as_str(&self) -> &'static str {
        match self {
            KeyRole::Hash => "hash",
            KeyRole::Range => "range",
        }
    }
}

/// Whether a secondary index is local (shares the table hash key) or global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Local secondary index.
    Local,
    /// Global secondary index.
    Global,
}

impl IndexKind {
    /// Returns `"LOCAL"` or `"GLOBAL"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Local => "LOCAL",
            IndexKind::Global => "GLOBAL",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attributes copied into a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// Every attribute of the item.
    #[default]
    All,
    /// Only the index and table key attributes.
    KeysOnly,
    /// The key attributes plus the listed non-key attributes.
    Include(Vec<String>),
}

/// Membership of a field in a named secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMembership {
    index: String,
    role: KeyRole,
}

/// Declaration of a single record field.
///
/// The attribute type is taken from the field's Rust type, so the declaration only
/// carries the naming and key annotations.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    attribute: Option<String>,
    attribute_type: AttributeType,
    key_role: Option<KeyRole>,
    indexes: Vec<IndexMembership>,
}

impl FieldSpec {
    /// Declares a field named `name` holding values of type `T`.
    pub fn new<T: AttributeValueConvert>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: None,
            attribute_type: T::attribute_type(),
            key_role: None,
            indexes: Vec::new(),
        }
    }

    /// Stores the field under `attribute` instead of its field name.
    pub fn rename(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Marks the field as the table's hash key.
    pub fn hash_key(mut self) -> Self {
        self.key_role = Some(KeyRole::Hash);
        self
    }

    /// Marks the field as the table's range key.
    pub fn range_key(mut self) -> Self {
        self.key_role = Some(KeyRole::Range);
        self
    }

    /// Adds the field to the key of the secondary index `index`.
    pub fn index(mut self, index: impl Into<String>, role: KeyRole) -> Self {
        self.indexes.push(IndexMembership {
            index: index.into(),
            role,
        });
        self
    }
}

#[derive(Debug, Clone)]
struct IndexSpec {
    name: String,
    kind: IndexKind,
    projection: Projection,
}

/// Everything a record type declares about its storage layout.
#[derive(Debug, Clone, Default)]
pub struct SchemaDeclaration {
    fields: Vec<FieldSpec>,
    indexes: Vec<IndexSpec>,
}

impl SchemaDeclaration {
    /// Creates an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares a local secondary index.
    ///
    /// A local index shares the table hash key, so it must declare a range key.
    /// Building fails with [`MissingIndexRange`](crate::SchemaErrorKind::MissingIndexRange)
    /// when none of the fields is its range.
    pub fn local_index(mut self, name: impl Into<String>, projection: Projection) -> Self {
        self.indexes.push(IndexSpec {
            name: name.into(),
            kind: IndexKind::Local,
            projection,
        });
        self
    }

    /// Declares a global secondary index.
    pub fn global_index(mut self, name: impl Into<String>, projection: Projection) -> Self {
        self.indexes.push(IndexSpec {
            name: name.into(),
            kind: IndexKind::Global,
            projection,
        });
        self
    }
}

/// A declared field after name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    field_name: String,
    attribute_name: String,
    attribute_type: AttributeType,
}

impl FieldDescriptor {
    /// The Rust field name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The attribute name used on the wire.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// The wire type of the attribute.
    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }
}

/// One component of a key schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyComponent {
    field_name: String,
    attribute_name: String,
    attribute_type: AttributeType,
}

impl KeyComponent {
    fn from_field(field: &FieldDescriptor) -> Self {
        Self {
            field_name: field.field_name.clone(),
            attribute_name: field.attribute_name.clone(),
            attribute_type: field.attribute_type,
        }
    }

    /// The Rust field name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The attribute name used on the wire.
    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    /// The wire type of the attribute; always `S`, `N` or `B`.
    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }
}

/// A hash component plus an optional range component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    hash: KeyComponent,
    range: Option<KeyComponent>,
}

impl KeySchema {
    /// The hash (partition) component.
    pub fn hash(&self) -> &KeyComponent {
        &self.hash
    }

    /// The range (sort) component, if any.
    pub fn range(&self) -> Option<&KeyComponent> {
        self.range.as_ref()
    }

    /// Components in key order: hash first, then range.
    pub fn components(&self) -> impl Iterator<Item = &KeyComponent> {
        std::iter::once(&self.hash).chain(self.range.iter())
    }
}

/// A secondary index of an [`ItemSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    name: String,
    kind: IndexKind,
    key: KeySchema,
    projection: Projection,
}

impl SecondaryIndex {
    /// The index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local or global.
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// The index key schema.
    pub fn key(&self) -> &KeySchema {
        &self.key
    }

    /// The attributes projected into the index.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

/// Immutable description of a record type: attributes, primary key and secondary indexes.
///
/// Indexes are ordered local-first, each group in declaration order. Key resolution
/// relies on this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSchema {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    primary_key: KeySchema,
    indexes: Vec<SecondaryIndex>,
}

#[derive(Default)]
struct KeySlots {
    hash: Option<KeyComponent>,
    range: Option<KeyComponent>,
}

impl KeySlots {
    fn assign(
        &mut self,
        role: KeyRole,
        component: KeyComponent,
        index: Option<&str>,
        type_name: &'static str,
    ) -> Result<(), SchemaError> {
        let slot = match role {
            KeyRole::Hash => &mut self.hash,
            KeyRole::Range => &mut self.range,
        };
        if slot.is_some() {
            return Err(SchemaError::new(
                type_name,
                SchemaErrorKind::DuplicateKeyRole {
                    index: index.map(str::to_string),
                    role: role.as_str(),
                },
            ));
        }
        *slot = Some(component);
        Ok(())
    }
}

impl ItemSchema {
    /// Builds the schema of `T` from its declaration.
    ///
    /// Prefer [`SchemaRegistry::describe`](crate::SchemaRegistry::describe), which builds
    /// each schema once.
    pub fn of<T: ProvideItemSchema>() -> Result<Self, SchemaError> {
        Self::build(std::any::type_name::<T>(), T::declare_schema())
    }

    /// Validates `declaration` and builds the schema it describes.
    pub fn build(
        type_name: &'static str,
        declaration: SchemaDeclaration,
    ) -> Result<Self, SchemaError> {
        let err = |kind| SchemaError::new(type_name, kind);

        let mut index_names = HashSet::new();
        for index in &declaration.indexes {
            if !index_names.insert(index.name.as_str()) {
                return Err(err(SchemaErrorKind::DuplicateIndex {
                    index: index.name.clone(),
                }));
            }
        }

        let mut fields = Vec::with_capacity(declaration.fields.len());
        let mut attributes = HashSet::new();
        let mut primary = KeySlots::default();
        let mut index_slots: Vec<KeySlots> = declaration
            .indexes
            .iter()
            .map(|_| KeySlots::default())
            .collect();

        for spec in &declaration.fields {
            let descriptor = FieldDescriptor {
                field_name: spec.name.clone(),
                attribute_name: spec.attribute.clone().unwrap_or_else(|| spec.name.clone()),
                attribute_type: spec.attribute_type,
            };
            if !attributes.insert(descriptor.attribute_name.clone()) {
                return Err(err(SchemaErrorKind::DuplicateAttribute {
                    attribute: descriptor.attribute_name,
                }));
            }

            let is_key = spec.key_role.is_some() || !spec.indexes.is_empty();
            if is_key && !descriptor.attribute_type.is_key_type() {
                return Err(err(SchemaErrorKind::InvalidKeyType {
                    attribute: descriptor.attribute_name,
                    actual: descriptor.attribute_type.as_str(),
                }));
            }

            if let Some(role) = spec.key_role {
                primary.assign(role, KeyComponent::from_field(&descriptor), None, type_name)?;
            }
            for membership in &spec.indexes {
                let position = declaration
                    .indexes
                    .iter()
                    .position(|index| index.name == membership.index)
                    .ok_or_else(|| {
                        err(SchemaErrorKind::UnknownIndex {
                            index: membership.index.clone(),
                        })
                    })?;
                index_slots[position].assign(
                    membership.role,
                    KeyComponent::from_field(&descriptor),
                    Some(&membership.index),
                    type_name,
                )?;
            }
            fields.push(descriptor);
        }

        let primary_key = match primary {
            KeySlots {
                hash: Some(hash),
                range,
            } => KeySchema { hash, range },
            _ => return Err(err(SchemaErrorKind::MissingPrimaryKey)),
        };

        let mut locals = Vec::new();
        let mut globals = Vec::new();
        for (spec, slots) in declaration.indexes.into_iter().zip(index_slots) {
            let key = match (spec.kind, slots.hash, slots.range) {
                (_, None, None) => {
                    return Err(err(SchemaErrorKind::EmptyIndex { index: spec.name }))
                }
                (IndexKind::Local, _, None) => {
                    return Err(err(SchemaErrorKind::MissingIndexRange { index: spec.name }))
                }
                (IndexKind::Local, Some(hash), Some(_))
                    if hash.attribute_name != primary_key.hash.attribute_name =>
                {
                    return Err(err(SchemaErrorKind::LocalIndexHashMismatch {
                        index: spec.name,
                        attribute: hash.attribute_name,
                    }))
                }
                // A local index always shares the table hash key.
                (IndexKind::Local, _, Some(range)) => KeySchema {
                    hash: primary_key.hash.clone(),
                    range: Some(range),
                },
                (IndexKind::Global, None, Some(_)) => {
                    return Err(err(SchemaErrorKind::MissingIndexHash { index: spec.name }))
                }
                (IndexKind::Global, Some(hash), range) => KeySchema { hash, range },
            };
            let index = SecondaryIndex {
                name: spec.name,
                kind: spec.kind,
                key,
                projection: spec.projection,
            };
            match index.kind {
                IndexKind::Local => locals.push(index),
                IndexKind::Global => globals.push(index),
            }
        }
        locals.extend(globals);

        Ok(Self {
            type_name,
            fields,
            primary_key,
            indexes: locals,
        })
    }

    /// The Rust type this schema describes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by its Rust name, falling back to its attribute name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.field_name == name)
            .or_else(|| self.fields.iter().find(|f| f.attribute_name == name))
    }

    /// The attribute name for a field, resolved through [`field`](Self::field).
    ///
    /// Names that match no declared field are used as the attribute name unchanged.
    pub fn attribute_name<'a>(&'a self, field_name: &'a str) -> &'a str {
        self.field(field_name)
            .map(FieldDescriptor::attribute_name)
            .unwrap_or(field_name)
    }

    /// The primary key schema.
    pub fn primary_key(&self) -> &KeySchema {
        &self.primary_key
    }

    /// Secondary indexes, locals first.
    pub fn indexes(&self) -> &[SecondaryIndex] {
        &self.indexes
    }

    /// Looks up a secondary index by name.
    pub fn index(&self, name: &str) -> Option<&SecondaryIndex> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_of(declaration: SchemaDeclaration) -> SchemaErrorKind {
        ItemSchema::build("Test", declaration)
            .unwrap_err()
            .kind()
            .clone()
    }

    fn attribute_names(key: &KeySchema) -> Vec<&str> {
        key.components().map(|c| c.attribute_name()).collect()
    }

    #[test]
    fn primary_key_and_renames() {
        let schema = ItemSchema::build(
            "User",
            SchemaDeclaration::new()
                .field(FieldSpec::new::<String>("id").rename("Id").hash_key())
                .field(FieldSpec::new::<i64>("created").range_key())
                .field(FieldSpec::new::<Option<String>>("name")),
        )
        .unwrap();

        assert_eq!(attribute_names(schema.primary_key()), vec!["Id", "created"]);
        assert_eq!(schema.attribute_name("id"), "Id");
        assert_eq!(schema.attribute_name("Id"), "Id");
        assert_eq!(schema.attribute_name("undeclared"), "undeclared");
        assert_eq!(schema.field("Id").map(|f| f.field_name()), Some("id"));
        assert_eq!(
            schema.field("name").map(|f| f.attribute_type()),
            Some(AttributeType::String)
        );
        assert!(schema.indexes().is_empty());
    }

    #[test]
    fn locals_are_ordered_before_globals() {
        let schema = ItemSchema::build(
            "Order",
            SchemaDeclaration::new()
                .global_index("ByCustomer", Projection::KeysOnly)
                .local_index("ByDate", Projection::All)
                .global_index("ByStatus", Projection::Include(vec!["total".into()]))
                .field(FieldSpec::new::<String>("id").hash_key())
                .field(FieldSpec::new::<String>("customer").index("ByCustomer", KeyRole::Hash))
                .field(FieldSpec::new::<String>("date").index("ByDate", KeyRole::Range))
                .field(
                    FieldSpec::new::<String>("status")
                        .index("ByStatus", KeyRole::Hash)
                        .rename("Status"),
                )
                .field(
                    FieldSpec::new::<i64>("total")
                        .index("ByStatus", KeyRole::Range)
                        .index("ByCustomer", KeyRole::Range),
                ),
        )
        .unwrap();

        let names: Vec<_> = schema.indexes().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["ByDate", "ByCustomer", "ByStatus"]);

        let by_date = schema.index("ByDate").unwrap();
        assert_eq!(by_date.kind(), IndexKind::Local);
        assert_eq!(attribute_names(by_date.key()), vec!["id", "date"]);
        assert_eq!(
            attribute_names(schema.index("ByStatus").unwrap().key()),
            vec!["Status", "total"]
        );
        assert_eq!(
            schema.index("ByStatus").unwrap().projection(),
            &Projection::Include(vec!["total".to_string()])
        );
    }

    #[test]
    fn missing_primary_key() {
        assert_eq!(
            kind_of(SchemaDeclaration::new().field(FieldSpec::new::<String>("a").range_key())),
            SchemaErrorKind::MissingPrimaryKey
        );
    }

    #[test]
    fn duplicate_key_role() {
        assert_eq!(
            kind_of(
                SchemaDeclaration::new()
                    .field(FieldSpec::new::<String>("a").hash_key())
                    .field(FieldSpec::new::<String>("b").hash_key())
            ),
            SchemaErrorKind::DuplicateKeyRole {
                index: None,
                role: "hash"
            }
        );
        assert_eq!(
            kind_of(
                SchemaDeclaration::new()
                    .global_index("G", Projection::All)
                    .field(FieldSpec::new::<String>("a").hash_key())
                    .field(FieldSpec::new::<String>("b").index("G", KeyRole::Range))
                    .field(FieldSpec::new::<String>("c").index("G", KeyRole::Range))
            ),
            SchemaErrorKind::DuplicateKeyRole {
                index: Some("G".into()),
                role: "range"
            }
        );
    }

    #[test]
    fn index_without_components() {
        assert_eq!(
            kind_of(
                SchemaDeclaration::new()
                    .global_index("Unused", Projection::All)
                    .field(FieldSpec::new::<String>("a").hash_key())
            ),
            SchemaErrorKind::EmptyIndex {
                index: "Unused".into()
            }
        );
    }

    #[test]
    fn index_declaration_errors() {
        let base = || SchemaDeclaration::new().field(FieldSpec::new::<String>("a").hash_key());
        assert_eq!(
            kind_of(base().field(FieldSpec::new::<String>("b").index("Nope", KeyRole::Hash))),
            SchemaErrorKind::UnknownIndex {
                index: "Nope".into()
            }
        );
        assert_eq!(
            kind_of(
                base()
                    .global_index("G", Projection::All)
                    .field(FieldSpec::new::<String>("b").index("G", KeyRole::Range))
            ),
            SchemaErrorKind::MissingIndexHash { index: "G".into() }
        );
        assert_eq!(
            kind_of(
                base()
                    .local_index("L", Projection::All)
                    .field(FieldSpec::new::<String>("b").index("L", KeyRole::Hash))
                    .field(FieldSpec::new::<String>("c").index("L", KeyRole::Range))
            ),
            SchemaErrorKind::LocalIndexHashMismatch {
                index: "L".into(),
                attribute: "b".into()
            }
        );
        assert_eq!(
            kind_of(
                base()
                    .local_index("L", Projection::All)
                    .local_index("L", Projection::All)
            ),
            SchemaErrorKind::DuplicateIndex { index: "L".into() }
        );
        assert_eq!(
            kind_of(
                SchemaDeclaration::new()
                    .local_index("L", Projection::All)
                    .field(
                        FieldSpec::new::<String>("a")
                            .hash_key()
                            .index("L", KeyRole::Hash)
                    )
            ),
            SchemaErrorKind::MissingIndexRange { index: "L".into() }
        );
    }

    #[test]
    fn attribute_collisions_and_key_types() {
        assert_eq!(
            kind_of(
                SchemaDeclaration::new()
                    .field(FieldSpec::new::<String>("a").hash_key())
                    .field(FieldSpec::new::<String>("b").rename("a"))
            ),
            SchemaErrorKind::DuplicateAttribute {
                attribute: "a".into()
            }
        );
        assert_eq!(
            kind_of(SchemaDeclaration::new().field(FieldSpec::new::<bool>("flag").hash_key())),
            SchemaErrorKind::InvalidKeyType {
                attribute: "flag".into(),
                actual: "BOOL"
            }
        );
    }
}
