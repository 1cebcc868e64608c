/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Deletes by primary key or through a secondary index lookup.

use aws_sdk_dynamodb::operation::delete_item::DeleteItemInput;
use aws_sdk_dynamodb::operation::query::QueryInput;
use ddb_mapper_core::{codec, resolve_key, AttributeMap, Item, Key};
use ddb_mapper_expressions::{ExpressionBuilder, ExpressionValue};
use tracing::debug;

use super::{index_lookup, Template};
use crate::client::Mapper;
use crate::error::Error;
use crate::transport::Transport;

/// The first request a [`DeleteItem`] sends.
#[derive(Debug, Clone)]
pub enum DeleteRequest {
    /// The record's primary key is complete and the item is deleted directly.
    Item(DeleteItemInput),
    /// Only a secondary index key is complete. The index is queried for the item's
    /// primary key, which is then deleted.
    Lookup(QueryInput),
}

/// Builder returned by [`Mapper::delete`].
#[derive(Debug)]
pub struct DeleteItem<'a, T, I> {
    mapper: &'a Mapper<T>,
    table: String,
    record: &'a I,
    condition: Option<Template>,
}

impl<'a, T: Transport, I: Item> DeleteItem<'a, T, I> {
    pub(crate) fn new(mapper: &'a Mapper<T>, table: String, record: &'a I) -> Self {
        Self {
            mapper,
            table,
            record,
            condition: None,
        }
    }

    /// Only deletes when `expression` holds for the stored item.
    pub fn condition<V: Into<ExpressionValue>>(
        mut self,
        expression: impl Into<String>,
        params: impl IntoIterator<Item = V>,
    ) -> Self {
        self.condition = Some(Template::new(expression, params));
        self
    }

    /// Resolves the record's key and builds the first request.
    pub fn build(&self) -> Result<DeleteRequest, Error> {
        let schema = self.mapper.schema::<I>()?;
        let item = codec::encode(self.record, &schema)?;
        let key = resolve_key(&item, &schema)?;
        match key.index() {
            Some(index) => Ok(DeleteRequest::Lookup(index_lookup(
                &self.table,
                index,
                key.attributes(),
                self.mapper.config().consistent_read(),
                None,
            )?)),
            None => Ok(DeleteRequest::Item(self.delete_input(key.into_attributes())?)),
        }
    }

    fn delete_input(&self, key: AttributeMap) -> Result<DeleteItemInput, Error> {
        let mut expressions = ExpressionBuilder::new();
        let condition = self
            .condition
            .as_ref()
            .map(|c| c.compile(&mut expressions))
            .transpose()?;
        let bound = expressions.into_attributes();
        Ok(DeleteItemInput::builder()
            .table_name(&self.table)
            .set_key(Some(key))
            .set_condition_expression(condition)
            .set_expression_attribute_names(bound.names)
            .set_expression_attribute_values(bound.values)
            .build()?)
    }

    /// Sends the request. Deleting through an index that matches nothing does nothing.
    pub async fn send(self) -> Result<(), Error> {
        let input = match self.build()? {
            DeleteRequest::Item(input) => input,
            DeleteRequest::Lookup(query) => {
                let output = self
                    .mapper
                    .transport()
                    .query(query)
                    .await
                    .map_err(Error::Transport)?;
                let Some(found) = output.items.and_then(|items| items.into_iter().next()) else {
                    debug!(table = %self.table, "index lookup found nothing to delete");
                    return Ok(());
                };
                let schema = self.mapper.schema::<I>()?;
                let key = Key::primary_from_item(&found, &schema)?;
                self.delete_input(key.into_attributes())?
            }
        };
        debug!(
            table = %self.table,
            conditional = input.condition_expression.is_some(),
            "delete item"
        );
        self.mapper
            .transport()
            .delete_item(input)
            .await
            .map_err(Error::Transport)?;
        Ok(())
    }
}
