/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The mapper over a real `aws_sdk_dynamodb::Client` with mocked responses.

mod common;

use std::collections::HashMap;

use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemOutput;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemOutput;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemOutput;
use aws_sdk_dynamodb::operation::get_item::{GetItemError, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
use aws_sdk_dynamodb::operation::query::QueryOutput;
use aws_sdk_dynamodb::operation::scan::ScanOutput;
use aws_sdk_dynamodb::types::error::ResourceNotFoundException;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use aws_smithy_mocks::{mock, mock_client};
use common::{Pair, Reading, PAIRS, READINGS};
use ddb_mapper::{Config, Error, Mapper};
use pretty_assertions::assert_eq;

fn s(v: &str) -> AttributeValue {
    AttributeValue::S(v.to_string())
}

fn n(v: i64) -> AttributeValue {
    AttributeValue::N(v.to_string())
}

fn pair_item(key: &str, value: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([("Key".to_string(), s(key)), ("Value".to_string(), s(value))])
}

fn reading_item(range: i64) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("Hash".to_string(), s("h1")),
        ("Range".to_string(), n(range)),
        ("Value".to_string(), n(range * 10)),
    ])
}

// Whether `names` binds `attribute` to some placeholder.
fn names_attribute(names: Option<&HashMap<String, String>>, attribute: &str) -> bool {
    names.is_some_and(|names| names.values().any(|name| name == attribute))
}

#[tokio::test]
async fn put_sends_item_and_condition() {
    let rule = mock!(Client::put_item)
        .match_requests(|req| {
            req.table_name() == Some(PAIRS)
                && req.item() == Some(&pair_item("k1", "v1"))
                && req
                    .condition_expression()
                    .is_some_and(|c| c.starts_with("attribute_not_exists(#n"))
                && names_attribute(req.expression_attribute_names(), "Key")
        })
        .then_output(|| PutItemOutput::builder().build());
    let client = mock_client!(aws_sdk_dynamodb, [&rule]);
    let mapper = Mapper::new(client);

    mapper
        .put(PAIRS, &Pair::new("k1", "v1"))
        .condition("attribute_not_exists(Key)", Vec::<i32>::new())
        .send()
        .await
        .unwrap();
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn get_sends_key_consistency_and_projection() {
    let rule = mock!(Client::get_item)
        .match_requests(|req| {
            req.table_name() == Some(PAIRS)
                && req.key() == Some(&HashMap::from([("Key".to_string(), s("k1"))]))
                && req.consistent_read() == Some(true)
                && req.projection_expression().is_some()
                && names_attribute(req.expression_attribute_names(), "Value")
        })
        .then_output(|| {
            GetItemOutput::builder()
                .set_item(Some(pair_item("k1", "v1")))
                .build()
        });
    let client = mock_client!(aws_sdk_dynamodb, [&rule]);
    let mapper = Mapper::from_conf(client, Config::builder().consistent_read(true).build());

    let found = mapper
        .get(PAIRS, &Pair::new("k1", ""))
        .projection(["Key", "Value"])
        .send()
        .await
        .unwrap();
    assert_eq!(found, Some(Pair::new("k1", "v1")));
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn query_pages_forward_the_continuation_key() {
    let continuation = HashMap::from([("Hash".to_string(), s("h1")), ("Range".to_string(), n(2))]);
    let start = continuation.clone();
    let first = mock!(Client::query)
        .match_requests(|req| {
            req.table_name() == Some(READINGS)
                && req.exclusive_start_key().is_none()
                && req.scan_index_forward() == Some(false)
                && req.limit() == Some(2)
                && req.key_condition_expression().is_some_and(|c| c.contains(" AND "))
                && req.filter_expression().is_some()
                && req.expression_attribute_values().map(HashMap::len) == Some(4)
                && names_attribute(req.expression_attribute_names(), "Range")
        })
        .then_output(move || {
            QueryOutput::builder()
                .set_items(Some(vec![reading_item(1), reading_item(2)]))
                .set_last_evaluated_key(Some(continuation.clone()))
                .build()
        });
    let second = mock!(Client::query)
        .match_requests(move |req| req.exclusive_start_key() == Some(&start))
        .then_output(|| {
            QueryOutput::builder()
                .set_items(Some(vec![reading_item(3)]))
                .build()
        });
    let client = mock_client!(aws_sdk_dynamodb, [&first, &second]);
    let mapper = Mapper::new(client);

    let readings: Vec<Reading> = mapper
        .query(READINGS)
        .hash("Hash", "h1")
        .range("Range BETWEEN :lo AND :hi", [1, 10])
        .filter("Value > :v", [0])
        .scan_forward(false)
        .limit(2)
        .send()
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(
        readings.iter().map(|r| r.range).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(first.num_calls(), 1);
    assert_eq!(second.num_calls(), 1);
}

#[tokio::test]
async fn scan_sends_segment_index_and_filter() {
    let rule = mock!(Client::scan)
        .match_requests(|req| {
            req.table_name() == Some(READINGS)
                && req.index_name() == Some("ByValue")
                && req.segment() == Some(1)
                && req.total_segments() == Some(3)
                && req.limit() == Some(5)
                && req.filter_expression().is_some()
                && req.expression_attribute_values().map(HashMap::len) == Some(1)
        })
        .then_output(|| {
            ScanOutput::builder()
                .set_items(Some(vec![reading_item(7)]))
                .build()
        });
    let client = mock_client!(aws_sdk_dynamodb, [&rule]);
    let mapper = Mapper::from_conf(client, Config::builder().page_size(5).build());

    let readings: Vec<Reading> = mapper
        .scan(READINGS)
        .index("ByValue")
        .segment(1, 3)
        .filter("Value >= :min", [70])
        .send()
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn delete_sends_key_and_condition_values() {
    let rule = mock!(Client::delete_item)
        .match_requests(|req| {
            req.table_name() == Some(PAIRS)
                && req.key() == Some(&HashMap::from([("Key".to_string(), s("k1"))]))
                && req.condition_expression().is_some()
                && req
                    .expression_attribute_values()
                    .is_some_and(|values| values.values().any(|v| *v == s("v1")))
        })
        .then_output(|| DeleteItemOutput::builder().build());
    let client = mock_client!(aws_sdk_dynamodb, [&rule]);
    let mapper = Mapper::new(client);

    mapper
        .delete(PAIRS, &Pair::new("k1", ""))
        .condition("Value = :expected", ["v1"])
        .send()
        .await
        .unwrap();
    assert_eq!(rule.num_calls(), 1);
}

#[tokio::test]
async fn batch_requests_carry_their_items() {
    let get = mock!(Client::batch_get_item)
        .match_requests(|req| {
            req.request_items()
                .and_then(|items| items.get(PAIRS))
                .is_some_and(|keys| keys.keys().len() == 2)
        })
        .then_output(|| {
            BatchGetItemOutput::builder()
                .responses(PAIRS, vec![pair_item("k1", "v1")])
                .build()
        });
    let write = mock!(Client::batch_write_item)
        .match_requests(|req| {
            req.request_items()
                .and_then(|items| items.get(PAIRS))
                .is_some_and(|writes| {
                    writes.len() == 2
                        && writes[0].put_request().is_some()
                        && writes[1].delete_request().is_some()
                })
        })
        .then_output(|| BatchWriteItemOutput::builder().build());
    let client = mock_client!(aws_sdk_dynamodb, [&get, &write]);
    let mapper = Mapper::new(client);

    let lookups = [Pair::new("k1", ""), Pair::new("k2", "")];
    let result = mapper.batch_get(PAIRS, &lookups).send().await.unwrap();
    assert_eq!(result.items(), &[Pair::new("k1", "v1")]);

    let put = Pair::new("k3", "v3");
    let result = mapper
        .batch_write(PAIRS)
        .put(&put)
        .delete(&lookups[1])
        .send()
        .await
        .unwrap();
    assert!(result.is_complete());
    assert_eq!(get.num_calls(), 1);
    assert_eq!(write.num_calls(), 1);
}

#[tokio::test]
async fn service_errors_pass_through_unchanged() {
    let rule = mock!(Client::get_item).then_error(|| {
        GetItemError::ResourceNotFoundException(
            ResourceNotFoundException::builder()
                .message("table Pairs not found")
                .build(),
        )
    });
    let client = mock_client!(aws_sdk_dynamodb, [&rule]);
    let mapper = Mapper::new(client);

    let err = mapper
        .get(PAIRS, &Pair::new("k1", ""))
        .send()
        .await
        .unwrap_err();
    let Error::Transport(cause) = err else {
        panic!("expected a transport error");
    };
    match cause.downcast_ref::<aws_sdk_dynamodb::Error>() {
        Some(aws_sdk_dynamodb::Error::ResourceNotFoundException(e)) => {
            assert_eq!(e.message(), Some("table Pairs not found"))
        }
        other => panic!("unexpected cause: {other:?}"),
    }
}
