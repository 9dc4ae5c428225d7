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

//! The boundary with the cluster execution core.
//!
//! Everything below this boundary, such as the wire protocol, connection
//! pooling, node routing and retries, lives in the transport layer and is out
//! of scope for this crate. Commands only rely on [`Execute`]: hand the core a
//! transport operation, get back a transport-level [`ExecFuture`] that the
//! core resolves on its own execution context.

use std::sync::Arc;

use crate::future::ExecFuture;

/// A transport-level operation understood by the cluster execution core.
///
/// Binds an operation type to the transport response it yields and the query
/// info echoed back with every outcome. Query info typically restates the
/// request's addressing so callers can correlate outcomes to requests.
pub trait ClusterOperation: Send + 'static {
    /// The transport-level response the core resolves the future with.
    type Response: Send + 'static;

    /// The value echoed alongside both success and failure outcomes.
    type QueryInfo: Send + 'static;
}

/// A cluster execution core able to dispatch operations of type `Op`.
///
/// `execute` must return immediately; the returned future resolves later on
/// the core's own context. Dispatch failures, such as no reachable node, are
/// reported through the future's failure channel, never by blocking or
/// panicking here.
///
/// The core is a shared resource: implementations are `Send + Sync` and may
/// be driven concurrently from many tasks.
pub trait Execute<Op>: Send + Sync
where Op: ClusterOperation
{
    fn execute(&self, op: Op) -> ExecFuture<Op::Response, Op::QueryInfo>;
}

impl<Op, T> Execute<Op> for &T
where
    Op: ClusterOperation,
    T: Execute<Op>,
{
    fn execute(&self, op: Op) -> ExecFuture<Op::Response, Op::QueryInfo> {
        (**self).execute(op)
    }
}

impl<Op, T> Execute<Op> for Arc<T>
where
    Op: ClusterOperation,
    T: Execute<Op>,
{
    fn execute(&self, op: Op) -> ExecFuture<Op::Response, Op::QueryInfo> {
        (**self).execute(op)
    }
}
