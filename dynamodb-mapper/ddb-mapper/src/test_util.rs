/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Test utilities. Requires the `test-util` feature.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aws_sdk_dynamodb::operation::batch_get_item::{BatchGetItemInput, BatchGetItemOutput};
use aws_sdk_dynamodb::operation::batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput};
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::scan::{ScanInput, ScanOutput};
use aws_sdk_dynamodb::types::{KeysAndAttributes, WriteRequest};
use aws_smithy_runtime_api::box_error::BoxError;
use ddb_mapper_core::{AttributeMap, IndexKind, ItemSchema, KeySchema};

use crate::config::{MAX_BATCH_GET_SIZE, MAX_BATCH_WRITE_SIZE};
use crate::transport::Transport;

mod eval;

use eval::{compare, evaluate, project, Bindings};

/// A request received by an [`InMemoryTransport`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RecordedRequest {
    /// A `GetItem` request.
    GetItem(GetItemInput),
    /// A `PutItem` request.
    PutItem(PutItemInput),
    /// A `DeleteItem` request.
    DeleteItem(DeleteItemInput),
    /// A `BatchGetItem` request.
    BatchGetItem(BatchGetItemInput),
    /// A `BatchWriteItem` request.
    BatchWriteItem(BatchWriteItemInput),
    /// A `Query` request.
    Query(QueryInput),
    /// A `Scan` request.
    Scan(ScanInput),
}

impl RecordedRequest {
    /// The DynamoDB operation name, e.g. `"Query"`.
    pub fn operation(&self) -> &'static str {
        match self {
            RecordedRequest::GetItem(_) => "GetItem",
            RecordedRequest::PutItem(_) => "PutItem",
            RecordedRequest::DeleteItem(_) => "DeleteItem",
            RecordedRequest::BatchGetItem(_) => "BatchGetItem",
            RecordedRequest::BatchWriteItem(_) => "BatchWriteItem",
            RecordedRequest::Query(_) => "Query",
            RecordedRequest::Scan(_) => "Scan",
        }
    }
}

/// Error returned by an [`InMemoryTransport`].
#[derive(Debug)]
pub struct InMemoryError {
    kind: InMemoryErrorKind,
}

/// The kind of [`InMemoryError`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InMemoryErrorKind {
    /// Failure queued with [`InMemoryTransport::fail_next`].
    Injected(String),
    /// The table was never created.
    ResourceNotFound(String),
    /// DynamoDB would have rejected the request.
    Validation(String),
    /// A condition expression did not hold.
    ConditionalCheckFailed,
}

impl InMemoryError {
    fn new(kind: InMemoryErrorKind) -> Self {
        Self { kind }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(InMemoryErrorKind::Validation(message.into()))
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &InMemoryErrorKind {
        &self.kind
    }
}

impl fmt::Display for InMemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            InMemoryErrorKind::Injected(message) => write!(f, "injected failure: {}", message),
            InMemoryErrorKind::ResourceNotFound(table) => {
                write!(f, "requested resource not found: table {}", table)
            }
            InMemoryErrorKind::Validation(message) => write!(f, "validation error: {}", message),
            InMemoryErrorKind::ConditionalCheckFailed => {
                write!(f, "the conditional request failed")
            }
        }
    }
}

impl std::error::Error for InMemoryError {}

#[derive(Debug, Clone)]
struct KeyDef {
    hash: String,
    range: Option<String>,
}

impl KeyDef {
    fn of(key: &KeySchema) -> Self {
        Self {
            hash: key.hash().attribute_name().to_string(),
            range: key.range().map(|r| r.attribute_name().to_string()),
        }
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.hash).chain(self.range.as_ref())
    }

    // `None` unless every key attribute is present.
    fn extract(&self, item: &AttributeMap) -> Option<AttributeMap> {
        self.names()
            .map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }
}

#[derive(Debug)]
struct Table {
    primary: KeyDef,
    indexes: HashMap<String, (KeyDef, IndexKind)>,
    items: Vec<AttributeMap>,
}

struct Page {
    items: Vec<AttributeMap>,
    scanned: usize,
    last_evaluated_key: Option<AttributeMap>,
}

fn matches(item: &AttributeMap, key: &AttributeMap) -> bool {
    key.iter().all(|(name, value)| item.get(name) == Some(value))
}

fn check_condition(
    condition: Option<&str>,
    bindings: Bindings<'_>,
    existing: Option<&AttributeMap>,
) -> Result<(), InMemoryError> {
    let Some(condition) = condition else {
        return Ok(());
    };
    let empty = AttributeMap::new();
    match evaluate(condition, bindings, existing.unwrap_or(&empty)) {
        Ok(true) => Ok(()),
        Ok(false) => Err(InMemoryError::new(InMemoryErrorKind::ConditionalCheckFailed)),
        Err(message) => Err(InMemoryError::validation(message)),
    }
}

fn segment_of(item: &AttributeMap, hash: &str, total_segments: i32) -> i32 {
    let digest = item
        .get(hash)
        .map(|v| format!("{:?}", v))
        .unwrap_or_default()
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    (digest % total_segments as u32) as i32
}

impl Table {
    fn position(&self, key: &AttributeMap) -> Option<usize> {
        self.items.iter().position(|item| matches(item, key))
    }

    fn check_key(&self, key: &AttributeMap) -> Result<(), InMemoryError> {
        if key.len() == self.primary.names().count() && self.primary.extract(key).is_some() {
            Ok(())
        } else {
            Err(InMemoryError::validation(
                "the provided key element does not match the schema",
            ))
        }
    }

    fn key_for(&self, index: Option<&str>, consistent_read: Option<bool>) -> Result<&KeyDef, InMemoryError> {
        let Some(index) = index else {
            return Ok(&self.primary);
        };
        match self.indexes.get(index) {
            Some((_, IndexKind::Global)) if consistent_read == Some(true) => Err(
                InMemoryError::validation("consistent reads are not supported on global secondary indexes"),
            ),
            Some((key, _)) => Ok(key),
            None => Err(InMemoryError::validation(format!(
                "the table does not have the specified index: {}",
                index
            ))),
        }
    }

    fn put(&mut self, item: AttributeMap) -> Result<(), InMemoryError> {
        let key = self
            .primary
            .extract(&item)
            .ok_or_else(|| InMemoryError::validation("missing the key in the item"))?;
        match self.position(&key) {
            Some(i) => self.items[i] = item,
            None => self.items.push(item),
        }
        Ok(())
    }

    fn remove(&mut self, key: &AttributeMap) -> Result<(), InMemoryError> {
        self.check_key(key)?;
        if let Some(i) = self.position(key) {
            self.items.remove(i);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn page(
        &self,
        candidates: Vec<&AttributeMap>,
        key: &KeyDef,
        exclusive_start_key: Option<AttributeMap>,
        limit: Option<i32>,
        filter: Option<&str>,
        projection: Option<&str>,
        bindings: Bindings<'_>,
    ) -> Result<Page, InMemoryError> {
        let skip = match exclusive_start_key {
            Some(start) => candidates
                .iter()
                .position(|item| matches(item, &start))
                .map(|i| i + 1)
                .ok_or_else(|| InMemoryError::validation("unknown ExclusiveStartKey"))?,
            None => 0,
        };
        let limit = match limit {
            Some(limit) if limit < 1 => {
                return Err(InMemoryError::validation("Limit must be at least 1"))
            }
            Some(limit) => usize::try_from(limit).unwrap_or(usize::MAX),
            None => usize::MAX,
        };
        let evaluated: Vec<&AttributeMap> = candidates[skip..].iter().copied().take(limit).collect();
        let more = skip + evaluated.len() < candidates.len();
        let last_evaluated_key = match evaluated.last() {
            Some(last) if more => {
                let mut lek = self.primary.extract(last).unwrap_or_default();
                lek.extend(key.extract(last).unwrap_or_default());
                Some(lek)
            }
            _ => None,
        };

        let mut items = Vec::new();
        for item in &evaluated {
            if let Some(filter) = filter {
                if !evaluate(filter, bindings, item).map_err(InMemoryError::validation)? {
                    continue;
                }
            }
            let item = (*item).clone();
            items.push(match projection {
                Some(projection) => {
                    project(item, projection, bindings).map_err(InMemoryError::validation)?
                }
                None => item,
            });
        }
        Ok(Page {
            items,
            scanned: evaluated.len(),
            last_evaluated_key,
        })
    }
}

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Table>,
    requests: Vec<RecordedRequest>,
    failure: Option<String>,
    unprocessed_limit: Option<usize>,
}

impl Inner {
    fn table(&self, name: Option<&str>) -> Result<&Table, InMemoryError> {
        let name = name.unwrap_or_default();
        self.tables
            .get(name)
            .ok_or_else(|| InMemoryError::new(InMemoryErrorKind::ResourceNotFound(name.to_string())))
    }

    fn table_mut(&mut self, name: Option<&str>) -> Result<&mut Table, InMemoryError> {
        let name = name.unwrap_or_default();
        self.tables
            .get_mut(name)
            .ok_or_else(|| InMemoryError::new(InMemoryErrorKind::ResourceNotFound(name.to_string())))
    }

    fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, InMemoryError> {
        let GetItemInput {
            table_name,
            key,
            projection_expression,
            expression_attribute_names,
            ..
        } = input;
        let bindings = Bindings {
            names: expression_attribute_names.as_ref(),
            values: None,
        };
        let table = self.table(table_name.as_deref())?;
        let key = key.unwrap_or_default();
        table.check_key(&key)?;
        let item = match (table.position(&key), projection_expression.as_deref()) {
            (Some(i), Some(projection)) => Some(
                project(table.items[i].clone(), projection, bindings)
                    .map_err(InMemoryError::validation)?,
            ),
            (Some(i), None) => Some(table.items[i].clone()),
            (None, _) => None,
        };
        Ok(GetItemOutput::builder().set_item(item).build())
    }

    fn put_item(&mut self, input: PutItemInput) -> Result<PutItemOutput, InMemoryError> {
        let PutItemInput {
            table_name,
            item,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            ..
        } = input;
        let bindings = Bindings {
            names: expression_attribute_names.as_ref(),
            values: expression_attribute_values.as_ref(),
        };
        let table = self.table_mut(table_name.as_deref())?;
        let item = item.unwrap_or_default();
        if let Some(key) = table.primary.extract(&item) {
            let existing = table.position(&key).map(|i| &table.items[i]);
            check_condition(condition_expression.as_deref(), bindings, existing)?;
        }
        table.put(item)?;
        Ok(PutItemOutput::builder().build())
    }

    fn delete_item(&mut self, input: DeleteItemInput) -> Result<DeleteItemOutput, InMemoryError> {
        let DeleteItemInput {
            table_name,
            key,
            condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            ..
        } = input;
        let bindings = Bindings {
            names: expression_attribute_names.as_ref(),
            values: expression_attribute_values.as_ref(),
        };
        let table = self.table_mut(table_name.as_deref())?;
        let key = key.unwrap_or_default();
        table.check_key(&key)?;
        let existing = table.position(&key).map(|i| &table.items[i]);
        check_condition(condition_expression.as_deref(), bindings, existing)?;
        table.remove(&key)?;
        Ok(DeleteItemOutput::builder().build())
    }

    fn query(&self, input: QueryInput) -> Result<QueryOutput, InMemoryError> {
        let QueryInput {
            table_name,
            index_name,
            key_condition_expression,
            filter_expression,
            projection_expression,
            expression_attribute_names,
            expression_attribute_values,
            consistent_read,
            scan_index_forward,
            limit,
            exclusive_start_key,
            ..
        } = input;
        let bindings = Bindings {
            names: expression_attribute_names.as_ref(),
            values: expression_attribute_values.as_ref(),
        };
        let table = self.table(table_name.as_deref())?;
        let key = table.key_for(index_name.as_deref(), consistent_read)?;
        let condition = key_condition_expression
            .ok_or_else(|| InMemoryError::validation("KeyConditionExpression is required"))?;

        let mut candidates = Vec::new();
        for item in &table.items {
            if key.extract(item).is_none() {
                continue;
            }
            if evaluate(&condition, bindings, item).map_err(InMemoryError::validation)? {
                candidates.push(item);
            }
        }
        if let Some(range) = &key.range {
            candidates.sort_by(|a, b| match (a.get(range), b.get(range)) {
                (Some(a), Some(b)) => compare(a, b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            });
        }
        if scan_index_forward == Some(false) {
            candidates.reverse();
        }

        let page = table.page(
            candidates,
            key,
            exclusive_start_key,
            limit,
            filter_expression.as_deref(),
            projection_expression.as_deref(),
            bindings,
        )?;
        Ok(QueryOutput::builder()
            .count(page.items.len() as i32)
            .scanned_count(page.scanned as i32)
            .set_items(Some(page.items))
            .set_last_evaluated_key(page.last_evaluated_key)
            .build())
    }

    fn scan(&self, input: ScanInput) -> Result<ScanOutput, InMemoryError> {
        let ScanInput {
            table_name,
            index_name,
            filter_expression,
            projection_expression,
            expression_attribute_names,
            expression_attribute_values,
            consistent_read,
            limit,
            segment,
            total_segments,
            exclusive_start_key,
            ..
        } = input;
        let bindings = Bindings {
            names: expression_attribute_names.as_ref(),
            values: expression_attribute_values.as_ref(),
        };
        let table = self.table(table_name.as_deref())?;
        let key = table.key_for(index_name.as_deref(), consistent_read)?;
        let segment = match (segment, total_segments) {
            (None, None) => None,
            (Some(segment), Some(total)) if total >= 1 && (0..total).contains(&segment) => {
                Some((segment, total))
            }
            _ => {
                return Err(InMemoryError::validation(
                    "Segment must be in 0..TotalSegments and both must be set together",
                ))
            }
        };

        let candidates = table
            .items
            .iter()
            .filter(|item| key.extract(item).is_some())
            .filter(|item| match segment {
                Some((segment, total)) => segment_of(item, &table.primary.hash, total) == segment,
                None => true,
            })
            .collect();
        let page = table.page(
            candidates,
            key,
            exclusive_start_key,
            limit,
            filter_expression.as_deref(),
            projection_expression.as_deref(),
            bindings,
        )?;
        Ok(ScanOutput::builder()
            .count(page.items.len() as i32)
            .scanned_count(page.scanned as i32)
            .set_items(Some(page.items))
            .set_last_evaluated_key(page.last_evaluated_key)
            .build())
    }

    fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, InMemoryError> {
        let request_items = input.request_items.unwrap_or_default();
        let total: usize = request_items.values().map(|k| k.keys.len()).sum();
        if total == 0 || total > MAX_BATCH_GET_SIZE {
            return Err(InMemoryError::validation(format!(
                "BatchGetItem accepts 1 to {} keys, got {}",
                MAX_BATCH_GET_SIZE, total
            )));
        }

        let mut budget = self.unprocessed_limit.unwrap_or(usize::MAX);
        let mut responses = HashMap::new();
        let mut unprocessed = HashMap::new();
        for (table_name, keys) in request_items {
            let table = self.table(Some(table_name.as_str()))?;
            let consistent_read = keys.consistent_read;
            let mut found = Vec::new();
            let mut left = Vec::new();
            for key in keys.keys {
                if budget == 0 {
                    left.push(key);
                    continue;
                }
                budget -= 1;
                table.check_key(&key)?;
                if let Some(i) = table.position(&key) {
                    found.push(table.items[i].clone());
                }
            }
            if !left.is_empty() {
                let keys = KeysAndAttributes::builder()
                    .set_keys(Some(left))
                    .set_consistent_read(consistent_read)
                    .build()
                    .map_err(|e| InMemoryError::validation(e.to_string()))?;
                unprocessed.insert(table_name.clone(), keys);
            }
            responses.insert(table_name, found);
        }
        Ok(BatchGetItemOutput::builder()
            .set_responses(Some(responses))
            .set_unprocessed_keys(Some(unprocessed))
            .build())
    }

    fn batch_write_item(
        &mut self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, InMemoryError> {
        let request_items = input.request_items.unwrap_or_default();
        let total: usize = request_items.values().map(Vec::len).sum();
        if total == 0 || total > MAX_BATCH_WRITE_SIZE {
            return Err(InMemoryError::validation(format!(
                "BatchWriteItem accepts 1 to {} writes, got {}",
                MAX_BATCH_WRITE_SIZE, total
            )));
        }

        let mut budget = self.unprocessed_limit.unwrap_or(usize::MAX);
        let mut unprocessed: HashMap<String, Vec<WriteRequest>> = HashMap::new();
        for (table_name, writes) in request_items {
            let table = self.table_mut(Some(table_name.as_str()))?;
            for write in writes {
                if budget == 0 {
                    unprocessed.entry(table_name.clone()).or_default().push(write);
                    continue;
                }
                budget -= 1;
                if let Some(put) = write.put_request {
                    table.put(put.item)?;
                } else if let Some(delete) = write.delete_request {
                    table.remove(&delete.key)?;
                } else {
                    return Err(InMemoryError::validation("empty WriteRequest"));
                }
            }
        }
        Ok(BatchWriteItemOutput::builder()
            .set_unprocessed_items(Some(unprocessed))
            .build())
    }
}

/// A [`Transport`] that keeps tables in memory.
///
/// Tables are created from an [`ItemSchema`], which supplies the primary key and
/// secondary index layout. Key conditions, filters, conditions and projections are
/// evaluated the way DynamoDB would; `Limit` counts evaluated items before filtering and
/// `LastEvaluatedKey` is only returned while more items remain. Batch requests over the
/// DynamoDB size limits are rejected.
///
/// Clones share state, so a clone can be handed to a [`Mapper`](crate::Mapper) while
/// the test keeps one for assertions:
///
/// ```
/// use ddb_mapper::test_util::InMemoryTransport;
/// use ddb_mapper::Mapper;
///
/// let transport = InMemoryTransport::new();
/// let mapper = Mapper::new(transport.clone());
/// assert!(transport.requests().is_empty());
/// # drop(mapper);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTransport {
    /// Creates a transport with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates an empty table keyed like `schema`, replacing any table of that name.
    pub fn create_table(&self, name: impl Into<String>, schema: &ItemSchema) {
        let table = Table {
            primary: KeyDef::of(schema.primary_key()),
            indexes: schema
                .indexes()
                .iter()
                .map(|index| {
                    (
                        index.name().to_string(),
                        (KeyDef::of(index.key()), index.kind()),
                    )
                })
                .collect(),
            items: Vec::new(),
        };
        self.lock().tables.insert(name.into(), table);
    }

    /// Stores `item` directly, bypassing request recording.
    pub fn insert(&self, table: &str, item: AttributeMap) -> Result<(), InMemoryError> {
        self.lock().table_mut(Some(table))?.put(item)
    }

    /// Items stored in `table`, in insertion order.
    pub fn items(&self, table: &str) -> Vec<AttributeMap> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.items.clone())
            .unwrap_or_default()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Forgets the recorded requests.
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    /// Fails the next request with [`InMemoryErrorKind::Injected`]. The request is still
    /// recorded.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().failure = Some(message.into());
    }

    /// Processes at most `limit` keys or writes per batch request and reports the rest
    /// as unprocessed. `None` processes everything.
    pub fn set_unprocessed_limit(&self, limit: Option<usize>) {
        self.lock().unprocessed_limit = limit;
    }

    fn call<O>(
        &self,
        request: RecordedRequest,
        op: impl FnOnce(&mut Inner) -> Result<O, InMemoryError>,
    ) -> Result<O, BoxError> {
        let mut inner = self.lock();
        inner.requests.push(request);
        if let Some(message) = inner.failure.take() {
            return Err(InMemoryError::new(InMemoryErrorKind::Injected(message)).into());
        }
        op(&mut inner).map_err(BoxError::from)
    }
}

impl Transport for InMemoryTransport {
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, BoxError> {
        self.call(RecordedRequest::GetItem(input.clone()), |inner| {
            inner.get_item(input)
        })
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, BoxError> {
        self.call(RecordedRequest::PutItem(input.clone()), |inner| {
            inner.put_item(input)
        })
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, BoxError> {
        self.call(RecordedRequest::DeleteItem(input.clone()), |inner| {
            inner.delete_item(input)
        })
    }

    async fn batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> Result<BatchGetItemOutput, BoxError> {
        self.call(RecordedRequest::BatchGetItem(input.clone()), |inner| {
            inner.batch_get_item(input)
        })
    }

    async fn batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, BoxError> {
        self.call(RecordedRequest::BatchWriteItem(input.clone()), |inner| {
            inner.batch_write_item(input)
        })
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, BoxError> {
        self.call(RecordedRequest::Query(input.clone()), |inner| inner.query(input))
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, BoxError> {
        self.call(RecordedRequest::Scan(input.clone()), |inner| inner.scan(input))
    }
}
