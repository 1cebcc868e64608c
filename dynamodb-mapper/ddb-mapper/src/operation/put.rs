/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Conditional item writes.

use aws_sdk_dynamodb::operation::put_item::PutItemInput;
use ddb_mapper_core::{codec, resolve_primary_key, Item};
use ddb_mapper_expressions::{ExpressionBuilder, ExpressionValue};
use tracing::debug;

use super::Template;
use crate::client::Mapper;
use crate::error::Error;
use crate::transport::Transport;

/// Builder returned by [`Mapper::put`].
#[derive(Debug)]
pub struct PutItem<'a, T, I> {
    mapper: &'a Mapper<T>,
    table: String,
    record: &'a I,
    condition: Option<Template>,
}

impl<'a, T: Transport, I: Item> PutItem<'a, T, I> {
    pub(crate) fn new(mapper: &'a Mapper<T>, table: String, record: &'a I) -> Self {
        Self {
            mapper,
            table,
            record,
            condition: None,
        }
    }

    /// Only writes when `expression` holds for the stored item, e.g.
    /// `condition("attribute_not_exists(Id)", Vec::<ExpressionValue>::new())`.
    pub fn condition<V: Into<ExpressionValue>>(
        mut self,
        expression: impl Into<String>,
        params: impl IntoIterator<Item = V>,
    ) -> Self {
        self.condition = Some(Template::new(expression, params));
        self
    }

    /// Encodes the record and builds the request.
    ///
    /// Fails with [`IncompleteKey`](ddb_mapper_core::KeyErrorKind::IncompleteKey) when
    /// the record's primary key is not fully populated.
    pub fn build(&self) -> Result<PutItemInput, Error> {
        let schema = self.mapper.schema::<I>()?;
        let item = codec::encode(self.record, &schema)?;
        resolve_primary_key(&item, &schema)?;

        let mut expressions = ExpressionBuilder::new();
        let condition = self
            .condition
            .as_ref()
            .map(|c| c.compile(&mut expressions))
            .transpose()?;
        let bound = expressions.into_attributes();
        Ok(PutItemInput::builder()
            .table_name(&self.table)
            .set_item(Some(item))
            .set_condition_expression(condition)
            .set_expression_attribute_names(bound.names)
            .set_expression_attribute_values(bound.values)
            .build()?)
    }

    /// Sends the request.
    pub async fn send(self) -> Result<(), Error> {
        let input = self.build()?;
        debug!(
            table = %self.table,
            attributes = input.item.as_ref().map_or(0, |item| item.len()),
            conditional = input.condition_expression.is_some(),
            "put item"
        );
        self.mapper
            .transport()
            .put_item(input)
            .await
            .map_err(Error::Transport)?;
        Ok(())
    }
}
