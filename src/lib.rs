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

//! # KV Client API
//!
//! The asynchronous command layer of a client for a distributed key-value
//! store. It turns typed commands into transport operations, dispatches them
//! through a cluster execution core, and adapts the transport-level result
//! back into the typed, lazily-iterable responses exposed to callers.
//!
//! The transport itself, wire protocol, connection pooling, node routing and
//! retries, sits behind the [`Execute`] boundary and is not part of this
//! crate.
//!
//! ## Core Components
//!
//! - [`Command`]: a typed, immutable, reusable store operation
//! - [`ExecFuture`]: the exactly-once asynchronous result handle, awaitable
//!   and listenable, used at both the transport and the command level
//! - [`adapter::adapt`]: bridges a transport future to a command future via a
//!   per-command [`adapter::ResponseConverter`]
//! - [`commands::list_keys::ListKeys`]: enumerate a bucket, yielding
//!   fully-qualified [`Location`]s lazily
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use kv_client_api::commands::list_keys::ListKeys;
//! use kv_client_api::impls::mem_cluster::MemCluster;
//! use kv_client_api::Command;
//! use kv_client_api::Location;
//!
//! #[tokio::main]
//! async fn main() {
//!     // An in-memory stand-in for the real cluster execution core.
//!     let mut cluster = MemCluster::new();
//!     cluster.insert_bucket("default", "users", ["alice", "bob"]);
//!
//!     // Build an immutable command; the target bucket is mandatory.
//!     let cmd = ListKeys::builder(Location::in_default_type("users")).build();
//!
//!     // One dispatch per call; the returned future resolves asynchronously.
//!     let outcome = cmd.execute_async(&cluster).await;
//!
//!     for location in outcome.response().unwrap() {
//!         println!("found record at {:?}", location);
//!     }
//! }
//! ```

use futures_util::stream::BoxStream;

pub mod adapter;
pub mod cluster;
pub mod command;
pub mod commands;
pub mod future;
pub mod impls;
pub mod location;
pub mod ops;

pub use crate::adapter::ResponseConverter;
pub use crate::cluster::ClusterOperation;
pub use crate::cluster::Execute;
pub use crate::command::Command;
pub use crate::future::Completer;
pub use crate::future::ExecFuture;
pub use crate::future::Outcome;
pub use crate::location::Location;
pub use crate::location::DEFAULT_BUCKET_TYPE;

/// The transport-level future the cluster execution core resolves for an
/// operation type.
pub type CoreFutureOf<Op> =
    ExecFuture<<Op as ClusterOperation>::Response, <Op as ClusterOperation>::QueryInfo>;

/// A boxed stream of record locations, produced by a streaming response.
pub type LocationStream = BoxStream<'static, Location>;
