// Copyright 2024 KV Client API Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides a simple in-memory implementation of the cluster execution core.
//!
//! [`MemCluster`] keeps bucket contents in a [`BTreeMap`] and resolves every
//! dispatched operation inline, on the dispatching thread. It is primarily
//! intended for testing and demonstration purposes, not for production use.

use std::collections::BTreeMap;
use std::io;

use log::debug;
use log::warn;

use crate::cluster::Execute;
use crate::future::ExecFuture;
use crate::location::Location;
use crate::ops::list_keys::ListKeysOpResponse;
use crate::ops::list_keys::ListKeysOperation;

/// An in-memory cluster execution core backed by a BTreeMap.
///
/// Buckets are identified by `(bucket_type, bucket)`; listing a bucket that
/// was never populated yields an empty key batch, matching what a real
/// cluster reports for an empty bucket.
///
/// # Examples
///
/// ```
/// use kv_client_api::impls::mem_cluster::MemCluster;
/// use kv_client_api::ops::list_keys::ListKeysOperation;
/// use kv_client_api::Execute;
/// use kv_client_api::Location;
///
/// #[tokio::main]
/// async fn main() {
///     let mut cluster = MemCluster::new();
///     cluster.insert_bucket("default", "users", ["a", "b"]);
///
///     let op = ListKeysOperation::builder(Location::in_default_type("users")).build();
///     let outcome = cluster.execute(op).await;
///
///     assert_eq!(outcome.response().unwrap().keys(), ["a", "b"]);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemCluster {
    buckets: BTreeMap<(String, String), Vec<String>>,
    fail_dispatch: Option<String>,
}

impl MemCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cluster core that rejects every dispatch with
    /// [`io::ErrorKind::ConnectionRefused`], for exercising failure paths.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            buckets: BTreeMap::new(),
            fail_dispatch: Some(message.into()),
        }
    }

    /// Replace the contents of one bucket.
    pub fn insert_bucket<I, S>(&mut self, bucket_type: impl Into<String>, bucket: impl Into<String>, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.buckets.insert(
            (bucket_type.into(), bucket.into()),
            keys.into_iter().map(Into::into).collect(),
        );
    }

    /// Append one key to a bucket, creating the bucket if needed.
    pub fn add_key(
        &mut self,
        bucket_type: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) {
        self.buckets
            .entry((bucket_type.into(), bucket.into()))
            .or_default()
            .push(key.into());
    }
}

impl Execute<ListKeysOperation> for MemCluster {
    fn execute(&self, op: ListKeysOperation) -> ExecFuture<ListKeysOpResponse, Location> {
        let (fut, completer) = ExecFuture::new();
        let location = op.location().clone();

        if let Some(message) = &self.fail_dispatch {
            completer.fail(
                io::Error::new(io::ErrorKind::ConnectionRefused, message.clone()),
                location,
            );
            return fut;
        }

        let bucket_id = (
            location.bucket_type().to_string(),
            location.bucket().to_string(),
        );
        let keys = self.buckets.get(&bucket_id).cloned().unwrap_or_default();

        if keys.len() > 1000 {
            warn!(
                "MemCluster::execute() returns big key batch of len={} for {}/{}",
                keys.len(),
                location.bucket_type(),
                location.bucket()
            );
        }
        debug!(
            "MemCluster: listing {} keys in {}/{}",
            keys.len(),
            location.bucket_type(),
            location.bucket()
        );

        completer.complete(ListKeysOpResponse::new(keys), location);
        fut
    }
}
