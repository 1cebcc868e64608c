/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

mod common;

use aws_sdk_dynamodb::types::AttributeValue;
use common::{setup, Message, Pair, MESSAGES, PAIRS};
use ddb_mapper::expressions::ExpressionValue;
use ddb_mapper::operation::{DeleteRequest, GetRequest};
use ddb_mapper::test_util::{InMemoryError, InMemoryErrorKind, RecordedRequest};
use ddb_mapper::{Error, KeyErrorKind};
use pretty_assertions::assert_eq;

fn s(v: &str) -> AttributeValue {
    AttributeValue::S(v.to_string())
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let (transport, mapper) = setup();
    mapper.put(PAIRS, &Pair::new("k1", "v1")).send().await.unwrap();

    let stored = transport.items(PAIRS);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get("Key"), Some(&s("k1")));
    assert_eq!(stored[0].get("Value"), Some(&s("v1")));

    let found = mapper
        .get(PAIRS, &Pair::new("k1", ""))
        .send()
        .await
        .unwrap();
    assert_eq!(found, Some(Pair::new("k1", "v1")));

    let missing = mapper
        .get(PAIRS, &Pair::new("k2", ""))
        .send()
        .await
        .unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn put_prunes_empty_attributes() {
    let (transport, mapper) = setup();
    mapper.put(PAIRS, &Pair::new("k1", "")).send().await.unwrap();
    let stored = transport.items(PAIRS);
    assert!(!stored[0].contains_key("Value"));

    // Absent strings decode as empty.
    let found = mapper.get(PAIRS, &Pair::new("k1", "")).send().await.unwrap();
    assert_eq!(found, Some(Pair::new("k1", "")));
}

#[tokio::test]
async fn put_requires_complete_primary_key() {
    let (transport, mapper) = setup();
    let orphan = Message::new("rust", "", "async", "ann", 1);
    let err = mapper.put(MESSAGES, &orphan).send().await.unwrap_err();
    match err {
        Error::Key(err) => assert_eq!(
            err.kind(),
            &KeyErrorKind::IncompleteKey {
                attribute: "Id".into()
            }
        ),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn conditional_put_rejects_existing_item() {
    let (_transport, mapper) = setup();
    let pair = Pair::new("k1", "v1");
    let none = Vec::<ExpressionValue>::new();
    mapper
        .put(PAIRS, &pair)
        .condition("attribute_not_exists(Key)", none.clone())
        .send()
        .await
        .unwrap();

    let err = mapper
        .put(PAIRS, &Pair::new("k1", "v2"))
        .condition("attribute_not_exists(Key)", none)
        .send()
        .await
        .unwrap_err();
    let Error::Transport(cause) = err else {
        panic!("expected a transport error");
    };
    let cause = cause.downcast_ref::<InMemoryError>().unwrap();
    assert_eq!(cause.kind(), &InMemoryErrorKind::ConditionalCheckFailed);
}

#[tokio::test]
async fn get_through_global_index_queries_one_item() {
    let (transport, mapper) = setup();
    let message = Message::new("rust", "m1", "async", "ann", 3);
    mapper.put(MESSAGES, &message).send().await.unwrap();
    transport.clear_requests();

    let lookup = Message {
        author: "ann".into(),
        ..Default::default()
    };
    let request = mapper
        .get(MESSAGES, &lookup)
        .consistent_read(true)
        .build()
        .unwrap();
    let GetRequest::Index(query) = request else {
        panic!("expected an index query");
    };
    assert_eq!(query.index_name.as_deref(), Some("ByAuthor"));
    assert_eq!(query.limit, Some(1));
    // Global indexes only support eventually consistent reads.
    assert_eq!(query.consistent_read, None);

    let found = mapper.get(MESSAGES, &lookup).send().await.unwrap();
    assert_eq!(found, Some(message));
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].operation(), "Query");
}

#[tokio::test]
async fn get_through_local_index_keeps_consistent_read() {
    let (_transport, mapper) = setup();
    let lookup = Message {
        forum: "rust".into(),
        topic: "async".into(),
        ..Default::default()
    };
    let GetRequest::Index(query) = mapper
        .get(MESSAGES, &lookup)
        .consistent_read(true)
        .build()
        .unwrap()
    else {
        panic!("expected an index query");
    };
    assert_eq!(query.index_name.as_deref(), Some("ByTopic"));
    assert_eq!(query.consistent_read, Some(true));
    assert_eq!(query.expression_attribute_values.map(|v| v.len()), Some(2));
}

#[tokio::test]
async fn get_without_any_key_fails() {
    let (_transport, mapper) = setup();
    let err = mapper
        .get(MESSAGES, &Message::default())
        .send()
        .await
        .unwrap_err();
    match err {
        Error::Key(err) => assert_eq!(err.kind(), &KeyErrorKind::NoValidKey),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delete_by_primary_key() {
    let (transport, mapper) = setup();
    mapper.put(PAIRS, &Pair::new("k1", "v1")).send().await.unwrap();
    let request = mapper.delete(PAIRS, &Pair::new("k1", "")).build().unwrap();
    assert!(matches!(request, DeleteRequest::Item(_)));

    mapper
        .delete(PAIRS, &Pair::new("k1", ""))
        .send()
        .await
        .unwrap();
    assert!(transport.items(PAIRS).is_empty());
}

#[tokio::test]
async fn delete_through_index_looks_up_primary_key() {
    let (transport, mapper) = setup();
    mapper
        .put(MESSAGES, &Message::new("rust", "m1", "async", "ann", 3))
        .send()
        .await
        .unwrap();
    mapper
        .put(MESSAGES, &Message::new("rust", "m2", "traits", "bob", 5))
        .send()
        .await
        .unwrap();
    transport.clear_requests();

    let lookup = Message {
        author: "bob".into(),
        ..Default::default()
    };
    mapper.delete(MESSAGES, &lookup).send().await.unwrap();

    let operations: Vec<_> = transport
        .requests()
        .iter()
        .map(RecordedRequest::operation)
        .collect();
    assert_eq!(operations, vec!["Query", "DeleteItem"]);
    let remaining = transport.items(MESSAGES);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get("Id"), Some(&s("m1")));
}

#[tokio::test]
async fn delete_through_index_without_match_is_a_no_op() {
    let (transport, mapper) = setup();
    let lookup = Message {
        author: "nobody".into(),
        ..Default::default()
    };
    mapper.delete(MESSAGES, &lookup).send().await.unwrap();
    let operations: Vec<_> = transport
        .requests()
        .iter()
        .map(RecordedRequest::operation)
        .collect();
    assert_eq!(operations, vec!["Query"]);
}

#[tokio::test]
async fn conditional_delete() {
    let (transport, mapper) = setup();
    mapper
        .put(MESSAGES, &Message::new("rust", "m1", "async", "ann", 3))
        .send()
        .await
        .unwrap();
    let key = Message::new("rust", "m1", "", "", 0);

    let err = mapper
        .delete(MESSAGES, &key)
        .condition("Score > :min", [10])
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(transport.items(MESSAGES).len(), 1);

    mapper
        .delete(MESSAGES, &key)
        .condition("Score > :min", [1])
        .send()
        .await
        .unwrap();
    assert!(transport.items(MESSAGES).is_empty());
}

#[tokio::test]
async fn transport_errors_pass_through() {
    let (transport, mapper) = setup();
    transport.fail_next("service unavailable");
    let err = mapper
        .put(PAIRS, &Pair::new("k1", "v1"))
        .send()
        .await
        .unwrap_err();
    let Error::Transport(cause) = err else {
        panic!("expected a transport error");
    };
    assert_eq!(cause.to_string(), "injected failure: service unavailable");
    assert!(transport.items(PAIRS).is_empty());
}

#[tokio::test]
async fn get_projection_substitutes_reserved_names() {
    let (transport, mapper) = setup();
    mapper.put(PAIRS, &Pair::new("k1", "v1")).send().await.unwrap();

    let GetRequest::Item(input) = mapper
        .get(PAIRS, &Pair::new("k1", ""))
        .projection(["Key"])
        .build()
        .unwrap()
    else {
        panic!("expected a primary key lookup");
    };
    let projection = input.projection_expression.clone().unwrap();
    assert!(projection.starts_with("#n"));
    let names = input.expression_attribute_names.clone().unwrap();
    assert_eq!(names.get(&projection), Some(&"Key".to_string()));

    transport.clear_requests();
    let found = mapper
        .get(PAIRS, &Pair::new("k1", ""))
        .projection(["Key"])
        .send()
        .await
        .unwrap();
    assert_eq!(found, Some(Pair::new("k1", "")));
}

#[tokio::test]
async fn projection_accepts_any_attribute_name() {
    let (_transport, mapper) = setup();
    let GetRequest::Item(input) = mapper
        .get(PAIRS, &Pair::new("k1", ""))
        .projection(["my-attr", "Größe", "meta.owner:id"])
        .build()
        .unwrap()
    else {
        panic!("expected a primary key lookup");
    };
    let mut names: Vec<_> = input
        .expression_attribute_names
        .unwrap()
        .into_values()
        .collect();
    names.sort();
    assert_eq!(names, vec!["Größe", "meta", "my-attr", "owner:id"]);
    assert_eq!(input.projection_expression.unwrap().matches(", ").count(), 2);
}
