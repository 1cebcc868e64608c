/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![allow(dead_code)]

use ddb_mapper::test_util::InMemoryTransport;
use ddb_mapper::{
    ConversionError, FieldSpec, ItemConverter, ItemReader, ItemSchema, ItemWriter, KeyRole,
    Mapper, Projection, ProvideItemSchema, SchemaDeclaration,
};

pub const PAIRS: &str = "Pairs";
pub const MESSAGES: &str = "Messages";
pub const READINGS: &str = "Readings";

/// A key/value record stored under the reserved words `Key` and `Value`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

impl Pair {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl ProvideItemSchema for Pair {
    fn declare_schema() -> SchemaDeclaration {
        SchemaDeclaration::new()
            .field(FieldSpec::new::<String>("key").rename("Key").hash_key())
            .field(FieldSpec::new::<String>("value").rename("Value"))
    }
}

impl ItemConverter for Pair {
    fn write_item(&self, writer: &mut ItemWriter<'_>) -> Result<(), ConversionError> {
        writer.field("key", &self.key)?.field("value", &self.value)?;
        Ok(())
    }

    fn read_item(reader: &mut ItemReader<'_>) -> Result<Self, ConversionError> {
        Ok(Self {
            key: reader.field("key")?,
            value: reader.field("value")?,
        })
    }
}

/// A forum message with a local index on topic and a global index on author.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub forum: String,
    pub id: String,
    pub topic: String,
    pub author: String,
    pub score: i64,
    pub body: Option<String>,
}

impl Message {
    pub fn new(forum: &str, id: &str, topic: &str, author: &str, score: i64) -> Self {
        Self {
            forum: forum.into(),
            id: id.into(),
            topic: topic.into(),
            author: author.into(),
            score,
            body: None,
        }
    }
}

impl ProvideItemSchema for Message {
    fn declare_schema() -> SchemaDeclaration {
        SchemaDeclaration::new()
            .local_index("ByTopic", Projection::All)
            .global_index("ByAuthor", Projection::All)
            .field(FieldSpec::new::<String>("forum").rename("Forum").hash_key())
            .field(FieldSpec::new::<String>("id").rename("Id").range_key())
            .field(
                FieldSpec::new::<String>("topic")
                    .rename("Topic")
                    .index("ByTopic", KeyRole::Range),
            )
            .field(
                FieldSpec::new::<String>("author")
                    .rename("Author")
                    .index("ByAuthor", KeyRole::Hash),
            )
            .field(FieldSpec::new::<i64>("score").rename("Score"))
            .field(FieldSpec::new::<Option<String>>("body").rename("Body"))
    }
}

impl ItemConverter for Message {
    fn write_item(&self, writer: &mut ItemWriter<'_>) -> Result<(), ConversionError> {
        writer
            .field("forum", &self.forum)?
            .field("id", &self.id)?
            .field("topic", &self.topic)?
            .field("author", &self.author)?
            .field("score", &self.score)?
            .field("body", &self.body)?;
        Ok(())
    }

    fn read_item(reader: &mut ItemReader<'_>) -> Result<Self, ConversionError> {
        Ok(Self {
            forum: reader.field("forum")?,
            id: reader.field("id")?,
            topic: reader.field("topic")?,
            author: reader.field("author")?,
            score: reader.field("score")?,
            body: reader.field("body")?,
        })
    }
}

/// A numeric-range record with attributes named after reserved words.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reading {
    pub hash: String,
    pub range: i64,
    pub value: i64,
}

impl ProvideItemSchema for Reading {
    fn declare_schema() -> SchemaDeclaration {
        SchemaDeclaration::new()
            .field(FieldSpec::new::<String>("hash").rename("Hash").hash_key())
            .field(FieldSpec::new::<i64>("range").rename("Range").range_key())
            .field(FieldSpec::new::<i64>("value").rename("Value"))
    }
}

impl ItemConverter for Reading {
    fn write_item(&self, writer: &mut ItemWriter<'_>) -> Result<(), ConversionError> {
        writer
            .field("hash", &self.hash)?
            .field("range", &self.range)?
            .field("value", &self.value)?;
        Ok(())
    }

    fn read_item(reader: &mut ItemReader<'_>) -> Result<Self, ConversionError> {
        Ok(Self {
            hash: reader.field("hash")?,
            range: reader.field("range")?,
            value: reader.field("value")?,
        })
    }
}

/// A transport with the `Pairs`, `Messages` and `Readings` tables, plus a mapper over it.
pub fn setup() -> (InMemoryTransport, Mapper<InMemoryTransport>) {
    setup_with(ddb_mapper::Config::default())
}

pub fn setup_with(config: ddb_mapper::Config) -> (InMemoryTransport, Mapper<InMemoryTransport>) {
    let transport = InMemoryTransport::new();
    transport.create_table(PAIRS, &ItemSchema::of::<Pair>().unwrap());
    transport.create_table(MESSAGES, &ItemSchema::of::<Message>().unwrap());
    transport.create_table(READINGS, &ItemSchema::of::<Reading>().unwrap());
    let mapper = Mapper::from_conf(transport.clone(), config);
    (transport, mapper)
}
