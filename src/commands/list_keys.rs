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

//! The list-keys command: enumerate every key in one bucket.
//!
//! [`ListKeys`] is bound to a target bucket at construction and dispatches a
//! [`ListKeysOperation`] when executed. The transport hands back a flat batch
//! of raw keys; [`ListKeysResponse`] keeps that batch together with the
//! addressing context and derives one fully-qualified [`Location`] per key
//! lazily, so a caller that stops early never pays for the rest.
//!
//! # Examples
//!
//! ```rust,no_run
//! use kv_client_api::commands::list_keys::ListKeys;
//! use kv_client_api::impls::mem_cluster::MemCluster;
//! use kv_client_api::Command;
//! use kv_client_api::Location;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut cluster = MemCluster::new();
//!     cluster.insert_bucket("default", "users", ["a", "b", "c"]);
//!
//!     let cmd = ListKeys::builder(Location::in_default_type("users")).build();
//!     let outcome = cmd.execute_async(&cluster).await;
//!
//!     for location in outcome.response().unwrap() {
//!         println!("{:?}", location);
//!     }
//! }
//! ```

use std::io;
use std::iter::FusedIterator;
use std::time::Duration;

use futures_util::StreamExt;
use log::debug;
use serde::Deserialize;
use serde::Serialize;

use crate::adapter::adapt;
use crate::adapter::ResponseConverter;
use crate::cluster::Execute;
use crate::command::Command;
use crate::future::ExecFuture;
use crate::location::Location;
use crate::ops::list_keys::ListKeysOpResponse;
use crate::ops::list_keys::ListKeysOperation;
use crate::LocationStream;

/// Command that lists all keys in a bucket.
///
/// Immutable once built; executing it any number of times issues that many
/// independent dispatches. Note that enumerating a whole bucket is an
/// expensive operation for the remote cluster, so production callers usually
/// bound it with [`ListKeysBuilder::with_timeout`].
#[derive(Debug, Clone)]
pub struct ListKeys {
    location: Location,
    timeout: Option<Duration>,
}

impl ListKeys {
    /// Start building a list-keys command for the given bucket.
    ///
    /// The location is the only mandatory input, so it is taken here rather
    /// than validated later in `build()`.
    pub fn builder(location: Location) -> ListKeysBuilder {
        ListKeysBuilder {
            location,
            timeout: None,
        }
    }

    /// The bucket this command enumerates.
    pub fn location(&self) -> &Location {
        &self.location
    }

    fn build_core_operation(&self) -> ListKeysOperation {
        let mut builder = ListKeysOperation::builder(self.location.clone());
        if let Some(timeout) = self.timeout {
            builder = builder.with_timeout(timeout);
        }
        builder.build()
    }
}

impl<C> Command<C> for ListKeys
where C: Execute<ListKeysOperation>
{
    type Response = ListKeysResponse;
    type QueryInfo = Location;

    fn execute_async(&self, cluster: &C) -> ExecFuture<ListKeysResponse, Location> {
        debug!(
            "dispatching list-keys for bucket {}/{}",
            self.location.bucket_type(),
            self.location.bucket()
        );

        let core_future = cluster.execute(self.build_core_operation());
        adapt(core_future, ListKeysConverter {
            location: self.location.clone(),
        })
    }
}

/// Builder for [`ListKeys`].
///
/// The builder itself is not meant to be shared between threads; the built
/// command is.
#[derive(Debug, Clone)]
pub struct ListKeysBuilder {
    location: Location,
    timeout: Option<Duration>,
}

impl ListKeysBuilder {
    /// Bound the operation with an explicit timeout.
    ///
    /// A zero timeout is equivalent to not calling this at all: the transport
    /// layer applies its own default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ListKeys {
        ListKeys {
            location: self.location,
            timeout: self.timeout,
        }
    }
}

/// Converts the raw transport batch into a [`ListKeysResponse`], re-deriving
/// the addressing context from the command's own location.
struct ListKeysConverter {
    location: Location,
}

impl ResponseConverter for ListKeysConverter {
    type CoreResponse = ListKeysOpResponse;
    type CoreQueryInfo = Location;
    type Response = ListKeysResponse;
    type QueryInfo = Location;

    fn convert_response(&self, core: &ListKeysOpResponse) -> Result<ListKeysResponse, io::Error> {
        Ok(ListKeysResponse::new(
            self.location.bucket_type(),
            self.location.bucket(),
            core.keys().to_vec(),
        ))
    }

    fn convert_query_info(&self, core: &Location) -> Location {
        core.clone()
    }
}

/// The keys of one bucket, iterable as fully-qualified [`Location`]s.
///
/// The response is an immutable snapshot: the raw key batch is stored once,
/// flat, next to the shared `(bucket_type, bucket)` context, and a fresh
/// `Location` is derived per key only when iteration reaches it. Any number
/// of independent iterators may be created; each starts from the beginning
/// and observes the same keys in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListKeysResponse {
    bucket_type: String,
    bucket: String,
    keys: Vec<String>,
}

impl ListKeysResponse {
    pub fn new(
        bucket_type: impl Into<String>,
        bucket: impl Into<String>,
        keys: Vec<String>,
    ) -> Self {
        Self {
            bucket_type: bucket_type.into(),
            bucket: bucket.into(),
            keys,
        }
    }

    pub fn bucket_type(&self) -> &str {
        &self.bucket_type
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The raw keys as returned by the transport layer, in arrival order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate the keys as [`Location`]s without consuming the response.
    pub fn iter(&self) -> LocationIter<'_> {
        LocationIter {
            bucket_type: &self.bucket_type,
            bucket: &self.bucket,
            keys: self.keys.iter(),
        }
    }

    /// Turn the response into a boxed stream of [`Location`]s.
    pub fn into_stream(self) -> LocationStream {
        futures::stream::iter(self).boxed()
    }
}

impl<'a> IntoIterator for &'a ListKeysResponse {
    type Item = Location;
    type IntoIter = LocationIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for ListKeysResponse {
    type Item = Location;
    type IntoIter = IntoLocationIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoLocationIter {
            bucket_type: self.bucket_type,
            bucket: self.bucket,
            keys: self.keys.into_iter(),
        }
    }
}

/// Borrowing iterator over a [`ListKeysResponse`].
///
/// Each `next()` builds a distinct `Location` from the shared addressing
/// context plus the next raw key, so callers may retain any number of yielded
/// locations concurrently. Exhaustion yields `None`, per the standard
/// iterator contract.
#[derive(Debug, Clone)]
pub struct LocationIter<'a> {
    bucket_type: &'a str,
    bucket: &'a str,
    keys: std::slice::Iter<'a, String>,
}

impl Iterator for LocationIter<'_> {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        let key = self.keys.next()?;
        Some(Location::new(self.bucket_type, self.bucket).with_key(key.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for LocationIter<'_> {}

impl FusedIterator for LocationIter<'_> {}

/// Owning iterator over a [`ListKeysResponse`].
#[derive(Debug, Clone)]
pub struct IntoLocationIter {
    bucket_type: String,
    bucket: String,
    keys: std::vec::IntoIter<String>,
}

impl Iterator for IntoLocationIter {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        let key = self.keys.next()?;
        Some(Location::new(&*self.bucket_type, &*self.bucket).with_key(key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for IntoLocationIter {}

impl FusedIterator for IntoLocationIter {}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::sync::Mutex;

    use futures_util::StreamExt;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::future::Completer;
    use crate::impls::mem_cluster::MemCluster;

    fn users_response() -> ListKeysResponse {
        ListKeysResponse::new(
            "default",
            "users",
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )
    }

    #[test]
    fn test_response_yields_locations_in_order() {
        let resp = users_response();
        let mut it = resp.iter();

        assert_eq!(
            it.next(),
            Some(Location::new("default", "users").with_key("a"))
        );
        assert_eq!(
            it.next(),
            Some(Location::new("default", "users").with_key("b"))
        );
        assert_eq!(
            it.next(),
            Some(Location::new("default", "users").with_key("c"))
        );
        assert_eq!(it.next(), None);
        // Fused: stays exhausted.
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_empty_response() {
        let resp = ListKeysResponse::new("t", "b", vec![]);

        assert!(resp.is_empty());
        assert_eq!(resp.len(), 0);
        assert_eq!(resp.iter().next(), None);
    }

    #[test]
    fn test_iterator_len_tracks_remaining() {
        let resp = users_response();
        let mut it = resp.iter();

        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
        it.by_ref().for_each(drop);
        assert_eq!(it.len(), 0);
    }

    #[test]
    fn test_independent_iterators_start_fresh() {
        let resp = users_response();

        let first: Vec<_> = resp.iter().collect();
        let second: Vec<_> = resp.iter().collect();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        // The response itself is untouched.
        assert_eq!(resp.keys(), ["a", "b", "c"]);
    }

    #[test]
    fn test_yielded_locations_are_distinct_values() {
        let resp = users_response();
        let locations: Vec<_> = resp.iter().collect();

        for (loc, key) in locations.iter().zip(["a", "b", "c"]) {
            assert_eq!(loc.bucket_type(), "default");
            assert_eq!(loc.bucket(), "users");
            assert_eq!(loc.key(), Some(key));
        }
    }

    #[test]
    fn test_owned_iterator() {
        let locations: Vec<_> = users_response().into_iter().collect();

        assert_eq!(locations.len(), 3);
        assert_eq!(locations[2], Location::new("default", "users").with_key("c"));
    }

    #[tokio::test]
    async fn test_into_stream() {
        let locations: Vec<_> = users_response().into_stream().collect().await;

        assert_eq!(locations.len(), 3);
        assert_eq!(locations[0], Location::new("default", "users").with_key("a"));
    }

    #[test]
    fn test_command_without_timeout_builds_default_operation() {
        let cmd = ListKeys::builder(Location::new("t", "b")).build();
        let op = cmd.build_core_operation();

        assert_eq!(op.location(), &Location::new("t", "b"));
        assert_eq!(op.timeout(), None);
    }

    #[test]
    fn test_command_timeout_is_carried_into_operation() {
        let cmd = ListKeys::builder(Location::new("t", "b"))
            .with_timeout(Duration::from_millis(5000))
            .build();

        assert_eq!(
            cmd.build_core_operation().timeout(),
            Some(Duration::from_millis(5000))
        );
    }

    #[test]
    fn test_command_zero_timeout_means_default() {
        let cmd = ListKeys::builder(Location::new("t", "b"))
            .with_timeout(Duration::ZERO)
            .build();

        assert_eq!(cmd.build_core_operation().timeout(), None);
    }

    #[tokio::test]
    async fn test_execute_against_mem_cluster() -> anyhow::Result<()> {
        let mut cluster = MemCluster::new();
        cluster.insert_bucket("default", "users", ["a", "b", "c"]);

        let cmd = ListKeys::builder(Location::in_default_type("users")).build();
        let outcome = cmd.execute_async(&cluster).await;

        let resp = outcome
            .response()
            .ok_or_else(|| anyhow::anyhow!("expected a completed outcome, got {:?}", outcome))?;
        assert_eq!(resp.bucket_type(), "default");
        assert_eq!(resp.bucket(), "users");
        assert_eq!(resp.keys(), ["a", "b", "c"]);
        assert_eq!(outcome.query_info(), Some(&Location::in_default_type("users")));
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_against_empty_bucket() {
        let cluster = MemCluster::new();

        let cmd = ListKeys::builder(Location::in_default_type("nothing-here")).build();
        let outcome = cmd.execute_async(&cluster).await;

        assert!(outcome.response().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_surfaces_through_future() {
        let cluster = MemCluster::unreachable("no reachable nodes");

        let cmd = ListKeys::builder(Location::in_default_type("users")).build();
        let outcome = cmd.execute_async(&cluster).await;

        assert!(outcome.is_failed());
        let err = outcome.error().unwrap();
        assert_eq!(err.kind(), ErrorKind::ConnectionRefused);
        assert_eq!(err.to_string(), "no reachable nodes");
        // The failure still tells which request it belongs to.
        assert_eq!(outcome.query_info(), Some(&Location::in_default_type("users")));
    }

    /// Accepts dispatches but never resolves them, keeping both ends visible.
    #[derive(Default)]
    struct HoldCluster {
        pending: Mutex<Vec<(ExecFuture<ListKeysOpResponse, Location>, Completer<ListKeysOpResponse, Location>)>>,
    }

    impl Execute<ListKeysOperation> for HoldCluster {
        fn execute(&self, _op: ListKeysOperation) -> ExecFuture<ListKeysOpResponse, Location> {
            let (fut, completer) = ExecFuture::new();
            self.pending.lock().unwrap().push((fut.clone(), completer));
            fut
        }
    }

    #[test]
    fn test_each_execute_is_an_independent_dispatch() {
        let cluster = HoldCluster::default();
        let cmd = ListKeys::builder(Location::in_default_type("users")).build();

        let first = cmd.execute_async(&cluster);
        let second = cmd.execute_async(&cluster);

        let mut pending = cluster.pending.lock().unwrap();
        assert_eq!(pending.len(), 2);

        // Resolving one leaves the other untouched.
        let (_, completer) = pending.remove(0);
        completer.complete(
            ListKeysOpResponse::new(vec!["k".to_string()]),
            Location::in_default_type("users"),
        );
        drop(pending);

        assert!(first.is_done());
        assert!(!second.is_done());
    }

    #[test]
    fn test_cancelling_command_future_reaches_transport() {
        let cluster = HoldCluster::default();
        let cmd = ListKeys::builder(Location::in_default_type("users")).build();

        let fut = cmd.execute_async(&cluster);
        fut.cancel();

        assert!(fut.try_outcome().unwrap().is_cancelled());

        let mut pending = cluster.pending.lock().unwrap();
        let (core_fut, completer) = pending.remove(0);
        assert!(core_fut.try_outcome().unwrap().is_cancelled());

        // The transport racing in afterwards changes nothing.
        completer.complete(ListKeysOpResponse::default(), Location::in_default_type("users"));
        drop(pending);
        assert!(fut.try_outcome().unwrap().is_cancelled());
    }
}
