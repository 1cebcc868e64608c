/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Request builders returned by [`Mapper`](crate::Mapper).
//!
//! Every builder can either produce the SDK input it would send (`build`) or send it
//! through the mapper's transport (`send`).

use aws_sdk_dynamodb::operation::query::QueryInput;
use ddb_mapper_core::{AttributeMap, IndexKind, IndexRef};
use ddb_mapper_expressions::{ExpressionBuilder, ExpressionError, ExpressionValue};
use tracing::trace;

use crate::error::Error;

pub mod batch;
pub mod delete;
pub mod get;
pub mod put;
pub mod query;
pub mod scan;

pub use batch::{BatchGet, BatchGetResult, BatchWrite, BatchWriteResult};
pub use delete::{DeleteItem, DeleteRequest};
pub use get::{GetItem, GetRequest};
pub use put::PutItem;
pub use query::Query;
pub use scan::Scan;

// Expression text plus positional values, compiled when the request is built so that
// all of a request's expressions share one placeholder namespace.
#[derive(Debug, Clone)]
pub(crate) struct Template {
    expression: String,
    params: Vec<ExpressionValue>,
}

impl Template {
    pub(crate) fn new<V: Into<ExpressionValue>>(
        expression: impl Into<String>,
        params: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            expression: expression.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn compile(&self, builder: &mut ExpressionBuilder) -> Result<String, ExpressionError> {
        builder.compile(&self.expression, self.params.iter().cloned())
    }
}

// Queries `index` for the single item matching `attributes` exactly.
pub(crate) fn index_lookup(
    table: &str,
    index: &IndexRef,
    attributes: &AttributeMap,
    consistent_read: bool,
    projection: Option<&[String]>,
) -> Result<QueryInput, Error> {
    let mut names: Vec<&String> = attributes.keys().collect();
    names.sort();

    let mut expressions = ExpressionBuilder::new();
    let condition = names
        .into_iter()
        .map(|name| expressions.equals(name, attributes[name].clone()))
        .collect::<Vec<_>>()
        .join(" AND ");
    let projection = projection.map(|p| expressions.projection(p)).transpose()?;
    let consistent_read = consistent_read && index.kind() == IndexKind::Local;
    trace!(table, index = index.name(), consistent_read, "index lookup");

    let bound = expressions.into_attributes();
    Ok(QueryInput::builder()
        .table_name(table)
        .index_name(index.name())
        .key_condition_expression(condition)
        .set_projection_expression(projection)
        .set_expression_attribute_names(bound.names)
        .set_expression_attribute_values(bound.values)
        .set_consistent_read(consistent_read.then_some(true))
        .limit(1)
        .build()?)
}
