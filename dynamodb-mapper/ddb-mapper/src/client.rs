/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::sync::Arc;

use ddb_mapper_core::{
    codec, resolve_key, AttributeMap, Item, ItemSchema, Key, ProvideItemSchema, SchemaRegistry,
};

use crate::config::Config;
use crate::error::Error;
use crate::operation::{BatchGet, BatchWrite, DeleteItem, GetItem, PutItem, Query, Scan};
use crate::transport::Transport;

/// Maps record types onto DynamoDB requests.
///
/// Cloning is cheap: the transport and schema registry are shared.
pub struct Mapper<T> {
    transport: Arc<T>,
    registry: Arc<SchemaRegistry>,
    config: Config,
}

impl<T> Clone for Mapper<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> fmt::Debug for Mapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Mapper<T> {
    /// Creates a mapper with the default [`Config`].
    pub fn new(transport: T) -> Self {
        Self::from_conf(transport, Config::default())
    }

    /// Creates a mapper with the given [`Config`] and a fresh schema registry.
    pub fn from_conf(transport: T, config: Config) -> Self {
        Self {
            transport: Arc::new(transport),
            registry: Arc::new(SchemaRegistry::new()),
            config,
        }
    }

    /// Replaces the schema registry, e.g. to share one between mappers.
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// The schema registry.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// The mapper's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the schema of `I`, building it on first use.
    pub fn schema<I: ProvideItemSchema>(&self) -> Result<Arc<ItemSchema>, Error> {
        Ok(self.registry.describe::<I>()?)
    }

    /// Resolves the key identifying `record`: its primary key if complete, else the first
    /// complete secondary index key.
    pub fn key_of<I: Item>(&self, record: &I) -> Result<Key, Error> {
        let schema = self.schema::<I>()?;
        let item = codec::encode(record, &schema)?;
        Ok(resolve_key(&item, &schema)?)
    }

    /// Encodes `record` into a pruned DynamoDB item.
    pub fn encode<I: Item>(&self, record: &I) -> Result<AttributeMap, Error> {
        let schema = self.schema::<I>()?;
        Ok(codec::encode(record, &schema)?)
    }

    /// Decodes a DynamoDB item into a record.
    pub fn decode<I: Item>(&self, item: AttributeMap) -> Result<I, Error> {
        let schema = self.schema::<I>()?;
        Ok(codec::decode(item, &schema)?)
    }

    /// Fetches the stored version of `record`, identified by its resolved key.
    pub fn get<'a, I: Item>(&'a self, table: impl Into<String>, record: &'a I) -> GetItem<'a, T, I> {
        GetItem::new(self, table.into(), record)
    }

    /// Stores `record`, replacing any item with the same primary key.
    pub fn put<'a, I: Item>(&'a self, table: impl Into<String>, record: &'a I) -> PutItem<'a, T, I> {
        PutItem::new(self, table.into(), record)
    }

    /// Deletes the item identified by `record`'s resolved key.
    pub fn delete<'a, I: Item>(
        &'a self,
        table: impl Into<String>,
        record: &'a I,
    ) -> DeleteItem<'a, T, I> {
        DeleteItem::new(self, table.into(), record)
    }

    /// Fetches the stored versions of `records` by primary key.
    pub fn batch_get<'a, I: Item>(
        &'a self,
        table: impl Into<String>,
        records: &'a [I],
    ) -> BatchGet<'a, T, I> {
        BatchGet::new(self, table.into(), records)
    }

    /// Starts a batch of puts and deletes against one table.
    pub fn batch_write<'a, I: Item>(&'a self, table: impl Into<String>) -> BatchWrite<'a, T, I> {
        BatchWrite::new(self, table.into())
    }

    /// Starts a query against `table`.
    pub fn query(&self, table: impl Into<String>) -> Query<'_, T> {
        Query::new(self, table.into())
    }

    /// Starts a scan of `table`.
    pub fn scan(&self, table: impl Into<String>) -> Scan<'_, T> {
        Scan::new(self, table.into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ddb_mapper_core::{
        ConversionError, FieldSpec, ItemConverter, ItemReader, ItemSchema, ItemWriter,
        ProvideItemSchema, SchemaDeclaration, SchemaRegistry,
    };
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::Mapper;
    use crate::test_util::InMemoryTransport;
    use crate::Config;

    const NOTES: &str = "Notes";

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Note {
        id: String,
        text: String,
    }

    impl Note {
        fn new(id: &str, text: &str) -> Self {
            Self {
                id: id.into(),
                text: text.into(),
            }
        }
    }

    impl ProvideItemSchema for Note {
        fn declare_schema() -> SchemaDeclaration {
            SchemaDeclaration::new()
                .field(FieldSpec::new::<String>("id").rename("Id").hash_key())
                .field(FieldSpec::new::<String>("text").rename("Text"))
        }
    }

    impl ItemConverter for Note {
        fn write_item(&self, writer: &mut ItemWriter<'_>) -> Result<(), ConversionError> {
            writer.field("id", &self.id)?.field("text", &self.text)?;
            Ok(())
        }

        fn read_item(reader: &mut ItemReader<'_>) -> Result<Self, ConversionError> {
            Ok(Self {
                id: reader.field("id")?,
                text: reader.field("text")?,
            })
        }
    }

    fn mapper() -> Mapper<InMemoryTransport> {
        let transport = InMemoryTransport::new();
        transport.create_table(NOTES, &ItemSchema::of::<Note>().unwrap());
        Mapper::new(transport)
    }

    #[tokio::test]
    #[traced_test]
    async fn operations_are_logged() {
        let mapper = mapper();
        mapper.put(NOTES, &Note::new("n1", "hello")).send().await.unwrap();
        assert!(logs_contain("put item"));
        assert!(logs_contain("table=Notes"));

        mapper.get(NOTES, &Note::new("n1", "")).send().await.unwrap();
        assert!(logs_contain("get item"));

        let notes: Vec<Note> = mapper
            .scan(NOTES)
            .limit(1)
            .send()
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(notes, vec![Note::new("n1", "hello")]);
        assert!(logs_contain("fetched page"));
    }

    #[tokio::test]
    #[traced_test]
    async fn unprocessed_batches_are_logged() {
        let mapper = mapper();
        mapper.transport().set_unprocessed_limit(Some(1));
        let notes = [Note::new("n1", "a"), Note::new("n2", "b")];
        let result = mapper.batch_write(NOTES).put_all(&notes).send().await.unwrap();
        assert_eq!(result.unprocessed().len(), 1);
        assert!(logs_contain("batch write left writes unprocessed"));
    }

    #[test]
    fn clones_share_transport_and_registry() {
        let mapper = mapper();
        let clone = mapper.clone();
        clone.schema::<Note>().unwrap();
        assert_eq!(mapper.registry().len(), 1);

        let item = mapper.encode(&Note::new("n1", "hello")).unwrap();
        clone.transport().insert(NOTES, item).unwrap();
        assert_eq!(mapper.transport().items(NOTES).len(), 1);
    }

    #[test]
    fn registry_can_be_shared_between_mappers() {
        let registry = Arc::new(SchemaRegistry::new());
        let first = Mapper::new(InMemoryTransport::new()).with_registry(registry.clone());
        let second = Mapper::from_conf(
            InMemoryTransport::new(),
            Config::builder().consistent_read(true).build(),
        )
        .with_registry(registry.clone());

        let schema = first.schema::<Note>().unwrap();
        assert!(Arc::ptr_eq(&schema, &second.schema::<Note>().unwrap()));
        assert_eq!(registry.len(), 1);
        assert!(second.config().consistent_read());
    }

    #[test]
    fn key_of_resolves_primary_key() {
        let mapper = mapper();
        let key = mapper.key_of(&Note::new("n1", "ignored")).unwrap();
        assert!(key.index().is_none());
        assert_eq!(key.attributes().len(), 1);

        let decoded: Note = mapper
            .decode(mapper.encode(&Note::new("n1", "hello")).unwrap())
            .unwrap();
        assert_eq!(decoded, Note::new("n1", "hello"));
    }
}
