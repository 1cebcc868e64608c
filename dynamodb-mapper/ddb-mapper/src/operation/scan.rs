/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Full and segmented table scans.

use aws_sdk_dynamodb::operation::scan::ScanInput;
use ddb_mapper_expressions::{conjunction, ExpressionBuilder, ExpressionValue};
use tracing::debug;

use super::Template;
use crate::client::Mapper;
use crate::error::Error;
use crate::paginator::ResultIterator;
use crate::transport::Transport;

/// Builder returned by [`Mapper::scan`].
#[derive(Debug)]
pub struct Scan<'a, T> {
    mapper: &'a Mapper<T>,
    table: String,
    index: Option<String>,
    filters: Vec<Template>,
    projection: Option<Vec<String>>,
    limit: Option<i32>,
    consistent_read: Option<bool>,
    segment: Option<(i32, i32)>,
}

impl<'a, T: Transport> Scan<'a, T> {
    pub(crate) fn new(mapper: &'a Mapper<T>, table: String) -> Self {
        Self {
            mapper,
            table,
            index: None,
            filters: Vec::new(),
            projection: None,
            limit: None,
            consistent_read: None,
            segment: None,
        }
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

    /// Scans the named secondary index instead of the table.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the page size, overriding [`Config::page_size`](crate::Config::page_size).
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets read consistency.
    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Only scans `segment` of `total_segments`, for parallel scans.
    pub fn segment(mut self, segment: i32, total_segments: i32) -> Self {
        self.segment = Some((segment, total_segments));
        self
    }

    /// Only fetches the listed attributes.
    pub fn projection<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Compiles the expressions and builds the first page's request.
    pub fn build(&self) -> Result<ScanInput, Error> {
        let mut expressions = ExpressionBuilder::new();
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

        let bound = expressions.into_attributes();
        Ok(ScanInput::builder()
            .table_name(&self.table)
            .set_index_name(self.index.clone())
            .set_filter_expression(filter)
            .set_projection_expression(projection)
            .set_expression_attribute_names(bound.names)
            .set_expression_attribute_values(bound.values)
            .set_consistent_read(self.consistent_read)
            .set_limit(self.limit.or(self.mapper.config().page_size()))
            .set_segment(self.segment.map(|(segment, _)| segment))
            .set_total_segments(self.segment.map(|(_, total)| total))
            .build()?)
    }

    /// Builds the request and returns an iterator over its results.
    pub async fn send(self) -> Result<ResultIterator<T>, Error> {
        let input = self.build()?;
        debug!(
            table = %self.table,
            segment = ?self.segment,
            limit = ?input.limit,
            "scan"
        );
        Ok(ResultIterator::scan(self.mapper.clone(), input))
    }
}
