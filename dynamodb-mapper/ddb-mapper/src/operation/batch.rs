/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Batch reads and writes.
//!
//! Batches are split into requests no larger than the configured batch sizes and sent
//! one after another. Keys and writes DynamoDB leaves unprocessed are handed back to
//! the caller rather than retried.

use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemInput;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemInput;
use aws_sdk_dynamodb::types::{DeleteRequest, KeysAndAttributes, PutRequest, WriteRequest};
use ddb_mapper_core::{codec, resolve_primary_key, AttributeMap, Item};
use tracing::debug;

use crate::client::Mapper;
use crate::error::Error;
use crate::transport::Transport;

/// Outcome of a [`BatchGet`].
#[derive(Debug)]
pub struct BatchGetResult<I> {
    items: Vec<I>,
    unprocessed_keys: Vec<AttributeMap>,
}

impl<I> BatchGetResult<I> {
    /// Items found, in no particular order.
    pub fn items(&self) -> &[I] {
        &self.items
    }

    /// Consumes the result, returning the items found.
    pub fn into_items(self) -> Vec<I> {
        self.items
    }

    /// Keys DynamoDB did not process. Send them again to complete the batch.
    pub fn unprocessed_keys(&self) -> &[AttributeMap] {
        &self.unprocessed_keys
    }
}

/// Builder returned by [`Mapper::batch_get`].
#[derive(Debug)]
pub struct BatchGet<'a, T, I> {
    mapper: &'a Mapper<T>,
    table: String,
    records: &'a [I],
    consistent_read: Option<bool>,
}

impl<'a, T: Transport, I: Item> BatchGet<'a, T, I> {
    pub(crate) fn new(mapper: &'a Mapper<T>, table: String, records: &'a [I]) -> Self {
        Self {
            mapper,
            table,
            records,
            consistent_read: None,
        }
    }

    /// Overrides the configured read consistency.
    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Builds one request per chunk of at most
    /// [`batch_get_size`](crate::Config::batch_get_size) keys.
    ///
    /// Every record needs a complete primary key.
    pub fn build(&self) -> Result<Vec<BatchGetItemInput>, Error> {
        let schema = self.mapper.schema::<I>()?;
        let keys = self
            .records
            .iter()
            .map(|record| -> Result<_, Error> {
                let item = codec::encode(record, &schema)?;
                Ok(resolve_primary_key(&item, &schema)?.into_attributes())
            })
            .collect::<Result<Vec<_>, _>>()?;
        let consistent_read = self
            .consistent_read
            .unwrap_or(self.mapper.config().consistent_read());

        keys.chunks(self.mapper.config().batch_get_size())
            .map(|chunk| -> Result<_, Error> {
                let keys = KeysAndAttributes::builder()
                    .set_keys(Some(chunk.to_vec()))
                    .consistent_read(consistent_read)
                    .build()?;
                Ok(BatchGetItemInput::builder()
                    .request_items(&self.table, keys)
                    .build()?)
            })
            .collect()
    }

    /// Sends every chunk in order.
    pub async fn send(self) -> Result<BatchGetResult<I>, Error> {
        let requests = self.build()?;
        let mut result = BatchGetResult {
            items: Vec::new(),
            unprocessed_keys: Vec::new(),
        };
        let chunks = requests.len();
        for (chunk, input) in requests.into_iter().enumerate() {
            debug!(table = %self.table, chunk, chunks, "batch get");
            let output = self
                .mapper
                .transport()
                .batch_get_item(input)
                .await
                .map_err(Error::Transport)?;
            if let Some(mut responses) = output.responses {
                for item in responses.remove(&self.table).unwrap_or_default() {
                    result.items.push(self.mapper.decode(item)?);
                }
            }
            if let Some(mut unprocessed) = output.unprocessed_keys {
                if let Some(keys) = unprocessed.remove(&self.table) {
                    result.unprocessed_keys.extend(keys.keys);
                }
            }
        }
        if !result.unprocessed_keys.is_empty() {
            debug!(
                table = %self.table,
                unprocessed = result.unprocessed_keys.len(),
                "batch get left keys unprocessed"
            );
        }
        Ok(result)
    }
}

/// Outcome of a [`BatchWrite`].
#[derive(Debug, Default)]
pub struct BatchWriteResult {
    unprocessed: Vec<WriteRequest>,
}

impl BatchWriteResult {
    /// Writes DynamoDB did not process. Send them again to complete the batch.
    pub fn unprocessed(&self) -> &[WriteRequest] {
        &self.unprocessed
    }

    /// Whether every write was processed.
    pub fn is_complete(&self) -> bool {
        self.unprocessed.is_empty()
    }
}

#[derive(Debug)]
enum Write<'a, I> {
    Put(&'a I),
    Delete(&'a I),
}

/// Builder returned by [`Mapper::batch_write`].
#[derive(Debug)]
pub struct BatchWrite<'a, T, I> {
    mapper: &'a Mapper<T>,
    table: String,
    writes: Vec<Write<'a, I>>,
}

impl<'a, T: Transport, I: Item> BatchWrite<'a, T, I> {
    pub(crate) fn new(mapper: &'a Mapper<T>, table: String) -> Self {
        Self {
            mapper,
            table,
            writes: Vec::new(),
        }
    }

    /// Adds a put of `record`.
    pub fn put(mut self, record: &'a I) -> Self {
        self.writes.push(Write::Put(record));
        self
    }

    /// Adds a put of every record in `records`.
    pub fn put_all(mut self, records: &'a [I]) -> Self {
        self.writes.extend(records.iter().map(Write::Put));
        self
    }

    /// Adds a delete of the item with `record`'s primary key.
    pub fn delete(mut self, record: &'a I) -> Self {
        self.writes.push(Write::Delete(record));
        self
    }

    /// Builds one request per chunk of at most
    /// [`batch_write_size`](crate::Config::batch_write_size) writes.
    ///
    /// Every record needs a complete primary key.
    pub fn build(&self) -> Result<Vec<BatchWriteItemInput>, Error> {
        let schema = self.mapper.schema::<I>()?;
        let writes = self
            .writes
            .iter()
            .map(|write| -> Result<_, Error> {
                let request = match write {
                    Write::Put(record) => {
                        let item = codec::encode(*record, &schema)?;
                        resolve_primary_key(&item, &schema)?;
                        WriteRequest::builder()
                            .put_request(PutRequest::builder().set_item(Some(item)).build()?)
                            .build()
                    }
                    Write::Delete(record) => {
                        let item = codec::encode(*record, &schema)?;
                        let key = resolve_primary_key(&item, &schema)?.into_attributes();
                        WriteRequest::builder()
                            .delete_request(DeleteRequest::builder().set_key(Some(key)).build()?)
                            .build()
                    }
                };
                Ok(request)
            })
            .collect::<Result<Vec<_>, _>>()?;

        writes
            .chunks(self.mapper.config().batch_write_size())
            .map(|chunk| -> Result<_, Error> {
                Ok(BatchWriteItemInput::builder()
                    .request_items(&self.table, chunk.to_vec())
                    .build()?)
            })
            .collect()
    }

    /// Sends every chunk in order.
    pub async fn send(self) -> Result<BatchWriteResult, Error> {
        let requests = self.build()?;
        let mut result = BatchWriteResult::default();
        let chunks = requests.len();
        for (chunk, input) in requests.into_iter().enumerate() {
            debug!(table = %self.table, chunk, chunks, "batch write");
            let output = self
                .mapper
                .transport()
                .batch_write_item(input)
                .await
                .map_err(Error::Transport)?;
            if let Some(mut unprocessed) = output.unprocessed_items {
                result
                    .unprocessed
                    .extend(unprocessed.remove(&self.table).unwrap_or_default());
            }
        }
        if !result.is_complete() {
            debug!(
                table = %self.table,
                unprocessed = result.unprocessed.len(),
                "batch write left writes unprocessed"
            );
        }
        Ok(result)
    }
}
