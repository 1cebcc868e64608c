/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Point lookups.

use aws_sdk_dynamodb::operation::get_item::GetItemInput;
use aws_sdk_dynamodb::operation::query::QueryInput;
use ddb_mapper_core::{codec, resolve_key, Item};
use ddb_mapper_expressions::ExpressionBuilder;
use tracing::debug;

use super::index_lookup;
use crate::client::Mapper;
use crate::error::Error;
use crate::transport::Transport;

/// The request a [`GetItem`] sends, depending on which key the record resolved to.
#[derive(Debug, Clone)]
pub enum GetRequest {
    /// The record's primary key is complete.
    Item(GetItemInput),
    /// Only a secondary index key is complete; the index is queried for one item.
    Index(QueryInput),
}

/// Builder returned by [`Mapper::get`].
#[derive(Debug)]
pub struct GetItem<'a, T, I> {
    mapper: &'a Mapper<T>,
    table: String,
    record: &'a I,
    consistent_read: Option<bool>,
    projection: Option<Vec<String>>,
}

impl<'a, T: Transport, I: Item> GetItem<'a, T, I> {
    pub(crate) fn new(mapper: &'a Mapper<T>, table: String, record: &'a I) -> Self {
        Self {
            mapper,
            table,
            record,
            consistent_read: None,
            projection: None,
        }
    }

    /// Overrides the configured read consistency. Ignored for global secondary indexes.
    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Only fetches the listed attributes. Attributes left out must decode from absence.
    pub fn projection<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Resolves the record's key and builds the request.
    pub fn build(&self) -> Result<GetRequest, Error> {
        let schema = self.mapper.schema::<I>()?;
        let item = codec::encode(self.record, &schema)?;
        let key = resolve_key(&item, &schema)?;
        let consistent_read = self
            .consistent_read
            .unwrap_or(self.mapper.config().consistent_read());

        if let Some(index) = key.index() {
            return Ok(GetRequest::Index(index_lookup(
                &self.table,
                index,
                key.attributes(),
                consistent_read,
                self.projection.as_deref(),
            )?));
        }

        let mut expressions = ExpressionBuilder::new();
        let projection = self
            .projection
            .as_deref()
            .map(|p| expressions.projection(p))
            .transpose()?;
        let bound = expressions.into_attributes();
        Ok(GetRequest::Item(
            GetItemInput::builder()
                .table_name(&self.table)
                .set_key(Some(key.into_attributes()))
                .consistent_read(consistent_read)
                .set_projection_expression(projection)
                .set_expression_attribute_names(bound.names)
                .build()?,
        ))
    }

    /// Sends the request, returning `None` when no item matches.
    pub async fn send(self) -> Result<Option<I>, Error> {
        let item = match self.build()? {
            GetRequest::Item(input) => {
                debug!(table = %self.table, "get item");
                let output = self
                    .mapper
                    .transport()
                    .get_item(input)
                    .await
                    .map_err(Error::Transport)?;
                output.item
            }
            GetRequest::Index(input) => {
                debug!(
                    table = %self.table,
                    index = input.index_name.as_deref().unwrap_or_default(),
                    "get item through index"
                );
                let output = self
                    .mapper
                    .transport()
                    .query(input)
                    .await
                    .map_err(Error::Transport)?;
                output.items.and_then(|items| items.into_iter().next())
            }
        };
        match item {
            Some(item) if !item.is_empty() => self.mapper.decode(item).map(Some),
            _ => Ok(None),
        }
    }
}
