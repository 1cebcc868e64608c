/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::future::Future;

use aws_sdk_dynamodb::operation::batch_get_item::{BatchGetItemInput, BatchGetItemOutput};
use aws_sdk_dynamodb::operation::batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput};
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::scan::{ScanInput, ScanOutput};
use aws_sdk_dynamodb::Client;
use aws_smithy_runtime_api::box_error::BoxError;

/// The DynamoDB operations the mapper sends.
///
/// Implemented for [`aws_sdk_dynamodb::Client`]. Errors are boxed so the mapper can pass
/// them through without knowing the transport's error types.
pub trait Transport: Send + Sync + 'static {
    /// Sends a `GetItem` request.
    fn get_item(
        &self,
        input: GetItemInput,
    ) -> impl Future<Output = Result<GetItemOutput, BoxError>> + Send;

    /// Sends a `PutItem` request.
    fn put_item(
        &self,
        input: PutItemInput,
    ) -> impl Future<Output = Result<PutItemOutput, BoxError>> + Send;

    /// Sends a `DeleteItem` request.
    fn delete_item(
        &self,
        input: DeleteItemInput,
    ) -> impl Future<Output = Result<DeleteItemOutput, BoxError>> + Send;

    /// Sends a `BatchGetItem` request.
    fn batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> impl Future<Output = Result<BatchGetItemOutput, BoxError>> + Send;

    /// Sends a `BatchWriteItem` request.
    fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> impl Future<Output = Result<BatchWriteItemOutput, BoxError>> + Send;

    /// Sends a `Query` request.
    fn query(&self, input: QueryInput)
        -> impl Future<Output = Result<QueryOutput, BoxError>> + Send;

    /// Sends a `Scan` request.
    fn scan(&self, input: ScanInput) -> impl Future<Output = Result<ScanOutput, BoxError>> + Send;
}

fn boxed<E>(err: E) -> BoxError
where
    aws_sdk_dynamodb::Error: From<E>,
{
    aws_sdk_dynamodb::Error::from(err).into()
}

impl Transport for Client {
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, BoxError> {
        Client::get_item(self)
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_consistent_read(input.consistent_read)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .send()
            .await
            .map_err(boxed)
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, BoxError> {
        Client::put_item(self)
            .set_table_name(input.table_name)
            .set_item(input.item)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await
            .map_err(boxed)
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, BoxError> {
        Client::delete_item(self)
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await
            .map_err(boxed)
    }

    async fn batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> Result<BatchGetItemOutput, BoxError> {
        Client::batch_get_item(self)
            .set_request_items(input.request_items)
            .send()
            .await
            .map_err(boxed)
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, BoxError> {
        Client::batch_write_item(self)
            .set_request_items(input.request_items)
            .send()
            .await
            .map_err(boxed)
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, BoxError> {
        Client::query(self)
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_consistent_read(input.consistent_read)
            .set_scan_index_forward(input.scan_index_forward)
            .set_limit(input.limit)
            .set_exclusive_start_key(input.exclusive_start_key)
            .send()
            .await
            .map_err(boxed)
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, BoxError> {
        Client::scan(self)
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_consistent_read(input.consistent_read)
            .set_limit(input.limit)
            .set_segment(input.segment)
            .set_total_segments(input.total_segments)
            .set_exclusive_start_key(input.exclusive_start_key)
            .send()
            .await
            .map_err(boxed)
    }
}
