/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Mapper configuration.

/// DynamoDB rejects `BatchGetItem` requests with more keys than this.
pub const MAX_BATCH_GET_SIZE: usize = 100;

/// DynamoDB rejects `BatchWriteItem` requests with more writes than this.
pub const MAX_BATCH_WRITE_SIZE: usize = 25;

/// Defaults applied to every request a [`Mapper`](crate::Mapper) builds.
///
/// Per-request settings on the operation builders take precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    consistent_read: bool,
    page_size: Option<i32>,
    batch_get_size: usize,
    batch_write_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Builder::default().build()
    }
}

impl Config {
    /// Creates a new [`Builder`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Converts this config back into a builder.
    pub fn to_builder(&self) -> Builder {
        Builder {
            consistent_read: Some(self.consistent_read),
            page_size: self.page_size,
            batch_get_size: Some(self.batch_get_size),
            batch_write_size: Some(self.batch_write_size),
        }
    }

    /// Whether gets, queries and batch gets read consistently by default.
    pub fn consistent_read(&self) -> bool {
        self.consistent_read
    }

    /// Default `Limit` for query and scan pages.
    pub fn page_size(&self) -> Option<i32> {
        self.page_size
    }

    /// Keys per `BatchGetItem` request.
    pub fn batch_get_size(&self) -> usize {
        self.batch_get_size
    }

    /// Writes per `BatchWriteItem` request.
    pub fn batch_write_size(&self) -> usize {
        self.batch_write_size
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Builder {
    consistent_read: Option<bool>,
    page_size: Option<i32>,
    batch_get_size: Option<usize>,
    batch_write_size: Option<usize>,
}

impl Builder {
    /// Sets whether reads are strongly consistent by default.
    ///
    /// Never applied to queries against global secondary indexes, which only support
    /// eventually consistent reads.
    pub fn consistent_read(mut self, consistent_read: bool) -> Self {
        self.set_consistent_read(Some(consistent_read));
        self
    }

    /// Sets whether reads are strongly consistent by default.
    pub fn set_consistent_read(&mut self, consistent_read: Option<bool>) -> &mut Self {
        self.consistent_read = consistent_read;
        self
    }

    /// Sets the default `Limit` for query and scan pages.
    pub fn page_size(mut self, page_size: i32) -> Self {
        self.set_page_size(Some(page_size));
        self
    }

    /// Sets the default `Limit` for query and scan pages. `None` leaves pages unbounded.
    pub fn set_page_size(&mut self, page_size: Option<i32>) -> &mut Self {
        self.page_size = page_size;
        self
    }

    /// Sets the number of keys per `BatchGetItem` request, clamped to `1..=100`.
    pub fn batch_get_size(mut self, size: usize) -> Self {
        self.set_batch_get_size(Some(size));
        self
    }

    /// Sets the number of keys per `BatchGetItem` request, clamped to `1..=100`.
    pub fn set_batch_get_size(&mut self, size: Option<usize>) -> &mut Self {
        self.batch_get_size = size;
        self
    }

    /// Sets the number of writes per `BatchWriteItem` request, clamped to `1..=25`.
    pub fn batch_write_size(mut self, size: usize) -> Self {
        self.set_batch_write_size(Some(size));
        self
    }

    /// Sets the number of writes per `BatchWriteItem` request, clamped to `1..=25`.
    pub fn set_batch_write_size(&mut self, size: Option<usize>) -> &mut Self {
        self.batch_write_size = size;
        self
    }

    /// Builds the [`Config`].
    pub fn build(self) -> Config {
        Config {
            consistent_read: self.consistent_read.unwrap_or(false),
            page_size: self.page_size,
            batch_get_size: self
                .batch_get_size
                .unwrap_or(MAX_BATCH_GET_SIZE)
                .clamp(1, MAX_BATCH_GET_SIZE),
            batch_write_size: self
                .batch_write_size
                .unwrap_or(MAX_BATCH_WRITE_SIZE)
                .clamp(1, MAX_BATCH_WRITE_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(!config.consistent_read());
        assert_eq!(config.page_size(), None);
        assert_eq!(config.batch_get_size(), 100);
        assert_eq!(config.batch_write_size(), 25);
    }

    #[test]
    fn batch_sizes_are_clamped() {
        let config = Config::builder()
            .batch_get_size(500)
            .batch_write_size(0)
            .build();
        assert_eq!(config.batch_get_size(), 100);
        assert_eq!(config.batch_write_size(), 1);
    }

    #[test]
    fn round_trips_through_builder() {
        let config = Config::builder()
            .consistent_read(true)
            .page_size(10)
            .batch_write_size(5)
            .build();
        let mut builder = config.to_builder();
        builder.set_page_size(None);
        let rebuilt = builder.build();
        assert!(rebuilt.consistent_read());
        assert_eq!(rebuilt.page_size(), None);
        assert_eq!(rebuilt.batch_write_size(), 5);
    }
}
