/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Lazily paginated query and scan results.

use std::collections::VecDeque;

use aws_sdk_dynamodb::operation::query::QueryInput;
use aws_sdk_dynamodb::operation::scan::ScanInput;
use ddb_mapper_core::{AttributeMap, Item};
use tracing::debug;

use crate::client::Mapper;
use crate::error::Error;
use crate::transport::Transport;

#[derive(Debug)]
enum PageRequest {
    Query(QueryInput),
    Scan(ScanInput),
}

/// A cursor over the items of a query or scan.
///
/// A page is only requested once every buffered item has been consumed, and only while
/// DynamoDB reports more results through `LastEvaluatedKey`. Empty pages are skipped.
///
/// ```no_run
/// # #[derive(Debug)] struct Message;
/// # impl ddb_mapper::ProvideItemSchema for Message {
/// #     fn declare_schema() -> ddb_mapper::SchemaDeclaration { unimplemented!() }
/// # }
/// # impl ddb_mapper::ItemConverter for Message {
/// #     fn write_item(&self, _: &mut ddb_mapper::ItemWriter<'_>) -> Result<(), ddb_mapper::ConversionError> { unimplemented!() }
/// #     fn read_item(_: &mut ddb_mapper::ItemReader<'_>) -> Result<Self, ddb_mapper::ConversionError> { unimplemented!() }
/// # }
/// # async fn example<T: ddb_mapper::Transport>(mapper: ddb_mapper::Mapper<T>) -> Result<(), ddb_mapper::Error> {
/// let mut results = mapper.query("Messages").hash("Forum", "rust").send().await?;
/// while results.has_next().await? {
///     let message: Message = results.next().await?;
///     println!("{:?}", message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResultIterator<T> {
    mapper: Mapper<T>,
    request: PageRequest,
    buffer: VecDeque<AttributeMap>,
    last_evaluated_key: Option<AttributeMap>,
    started: bool,
    fetch_count: usize,
}

impl<T: Transport> ResultIterator<T> {
    pub(crate) fn query(mapper: Mapper<T>, input: QueryInput) -> Self {
        Self::new(mapper, PageRequest::Query(input))
    }

    pub(crate) fn scan(mapper: Mapper<T>, input: ScanInput) -> Self {
        Self::new(mapper, PageRequest::Scan(input))
    }

    fn new(mapper: Mapper<T>, request: PageRequest) -> Self {
        Self {
            mapper,
            request,
            buffer: VecDeque::new(),
            last_evaluated_key: None,
            started: false,
            fetch_count: 0,
        }
    }

    /// Whether another item is available, fetching pages as needed.
    pub async fn has_next(&mut self) -> Result<bool, Error> {
        while self.buffer.is_empty() {
            if self.started && self.last_evaluated_key.is_none() {
                return Ok(false);
            }
            self.fetch().await?;
        }
        Ok(true)
    }

    /// Decodes and returns the next item.
    ///
    /// Fails with [`Error::Exhausted`] once every item has been returned.
    pub async fn next<I: Item>(&mut self) -> Result<I, Error> {
        if !self.has_next().await? {
            return Err(Error::Exhausted);
        }
        let item = self.buffer.pop_front().ok_or(Error::Exhausted)?;
        self.mapper.decode(item)
    }

    /// Drains the remaining items.
    pub async fn collect<I: Item>(mut self) -> Result<Vec<I>, Error> {
        let mut items = Vec::new();
        while self.has_next().await? {
            items.push(self.next().await?);
        }
        Ok(items)
    }

    /// Number of pages requested so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    /// The continuation token of the last page, if more pages remain.
    pub fn last_evaluated_key(&self) -> Option<&AttributeMap> {
        self.last_evaluated_key.as_ref()
    }

    async fn fetch(&mut self) -> Result<(), Error> {
        let start = self.last_evaluated_key.clone();
        let (items, last_evaluated_key) = match &mut self.request {
            PageRequest::Query(input) => {
                input.exclusive_start_key = start;
                let output = self
                    .mapper
                    .transport()
                    .query(input.clone())
                    .await
                    .map_err(Error::Transport)?;
                (output.items, output.last_evaluated_key)
            }
            PageRequest::Scan(input) => {
                input.exclusive_start_key = start;
                let output = self
                    .mapper
                    .transport()
                    .scan(input.clone())
                    .await
                    .map_err(Error::Transport)?;
                (output.items, output.last_evaluated_key)
            }
        };

        self.started = true;
        self.fetch_count += 1;
        self.last_evaluated_key = last_evaluated_key.filter(|key| !key.is_empty());
        self.buffer.extend(items.unwrap_or_default());
        debug!(
            page = self.fetch_count,
            buffered = self.buffer.len(),
            more = self.last_evaluated_key.is_some(),
            "fetched page"
        );
        Ok(())
    }
}
