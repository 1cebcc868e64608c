/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Queries over a table or one of its secondary indexes.

use aws_sdk_dynamodb::operation::query::QueryInput;
use ddb_mapper_expressions::{conjunction, ExpressionBuilder, ExpressionError, ExpressionValue};
use tracing::debug;

use super::Template;
use crate::client::Mapper;
use crate::error::Error;
use crate::paginator::ResultIterator;
use crate::transport::Transport;

/// Builder returned by [`Mapper::query`].
///
/// Attribute names are written as-is and `:name` placeholders are bound to the values
/// passed alongside each expression, in order of first appearance:
///
/// ```no_run
/// # async fn example<T: ddb_mapper::Transport>(mapper: ddb_mapper::Mapper<T>) -> Result<(), ddb_mapper::Error> {
/// let _results = mapper
///     .query("Messages")
///     .hash("Forum", "rust")
///     .range("Posted BETWEEN :from AND :to", [1_700_000_000, 1_800_000_000])
///     .filter("Score >= :min", [10])
///     .send()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Query<'a, T> {
    mapper: &'a Mapper<T>,
    table: String,
    index: Option<String>,
    hash: Option<(String, ExpressionValue)>,
    range: Option<Template>,
    filters: Vec<Template>,
    projection: Option<Vec<String>>,
    limit: Option<i32>,
    consistent_read: Option<bool>,
    scan_forward: Option<bool>,
}

impl<'a, T: Transport> Query<'a, T> {
    pub(crate) fn new(mapper: &'a Mapper<T>, table: String) -> Self {
        Self {
            mapper,
            table,
            index: None,
            hash: None,
            range: None,
            filters: Vec::new(),
            projection: None,
            limit: None,
            consistent_read: None,
            scan_forward: None,
        }
    }

    /// Sets the hash key condition `attribute = value`. Required.
    pub fn hash(mut self, attribute: impl Into<String>, value: impl Into<ExpressionValue>) -> Self {
        self.hash = Some((attribute.into(), value.into()));
        self
    }

    /// Sets the range key condition, e.g. `Posted BETWEEN :from AND :to`.
    pub fn range<V: Into<ExpressionValue>>(
        mut self,
        expression: impl Into<String>,
        params: impl IntoIterator<Item = V>,
    ) -> Self {
        self.range = Some(Template::new(expression, params));
        self
    }

    /// Adds a filter. Multiple filters must all hold.
    pub fn filter<V: Into<ExpressionValue>>(
        mut self,
        expression: impl Into<String>,
        params: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Template::new(expression, params));
        self
    }

    /// Queries the named secondary index instead of the table.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the page size, overriding [`Config::page_size`](crate::Config::page_size).
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets read consistency. The configured default only applies to table queries
    /// since global secondary indexes reject consistent reads.
    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Sets the range key traversal order. Ascending unless set to `false`.
    pub fn scan_forward(mut self, scan_forward: bool) -> Self {
        self.scan_forward = Some(scan_forward);
        self
    }

    /// Only fetches the listed attributes.
    pub fn projection<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Compiles the expressions and builds the first page's request.
    pub fn build(&self) -> Result<QueryInput, Error> {
        let (attribute, value) = self
            .hash
            .as_ref()
            .ok_or_else(ExpressionError::missing_key_condition)?;

        let mut expressions = ExpressionBuilder::new();
        let mut key_condition = expressions.equals(attribute, value.clone());
        if let Some(range) = &self.range {
            key_condition.push_str(" AND ");
            key_condition.push_str(&range.compile(&mut expressions)?);
        }
        let filter = conjunction(
            self.filters
                .iter()
                .map(|f| f.compile(&mut expressions))
                .collect::<Result<Vec<_>, _>>()?,
        );
        let projection = self
            .projection
            .as_deref()
            .map(|p| expressions.projection(p))
            .transpose()?;
        let consistent_read = self.consistent_read.or_else(|| {
            self.index
                .is_none()
                .then(|| self.mapper.config().consistent_read())
        });

        let bound = expressions.into_attributes();
        Ok(QueryInput::builder()
            .table_name(&self.table)
            .set_index_name(self.index.clone())
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_projection_expression(projection)
            .set_expression_attribute_names(bound.names)
            .set_expression_attribute_values(bound.values)
            .set_consistent_read(consistent_read)
            .set_scan_index_forward(self.scan_forward)
            .set_limit(self.limit.or(self.mapper.config().page_size()))
            .build()?)
    }

    /// Builds the request and returns an iterator over its results.
    ///
    /// Pages are fetched as the iterator is advanced, starting with the first call to
    /// [`has_next`](ResultIterator::has_next).
    pub async fn send(self) -> Result<ResultIterator<T>, Error> {
        let input = self.build()?;
        debug!(
            table = %self.table,
            index = self.index.as_deref().unwrap_or_default(),
            limit = ?input.limit,
            "query"
        );
        Ok(ResultIterator::query(self.mapper.clone(), input))
    }
}
