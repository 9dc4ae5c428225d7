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

//! Defines the command contract shared by every high-level operation.
//!
//! A command is an immutable description of one store operation, bound at
//! construction time through its builder. Executing it translates the bound
//! configuration into a transport operation, dispatches that through the
//! cluster execution core, and adapts the transport future into the
//! command-level future returned to the caller.

use crate::future::ExecFuture;

/// A typed, asynchronous store operation executable against a cluster core.
///
/// `C` is the cluster-execution-core type the command dispatches through,
/// usually any `Execute<Op>` for the command's transport operation `Op`.
///
/// Implementations hold no mutable state: one command value may be executed
/// any number of times, from any thread, and every call performs exactly one
/// independent dispatch. Expected failures, network errors and remote errors
/// alike, surface through the returned future's failure channel; `execute_async`
/// itself never blocks and never fails synchronously.
pub trait Command<C> {
    /// The domain-level response the returned future resolves with.
    type Response: Send + 'static;

    /// The domain-level query info echoed with every outcome.
    type QueryInfo: Send + 'static;

    /// Dispatch this command once and return its command-level future.
    fn execute_async(&self, cluster: &C) -> ExecFuture<Self::Response, Self::QueryInfo>;
}
