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

//! Bridges a transport-level future to a command-level future.
//!
//! Each command supplies a [`ResponseConverter`] that turns the transport
//! response and query info into their domain-level shapes. [`adapt`] wires a
//! converter to a transport future and returns the command-level future:
//!
//! - upstream success runs both conversions and completes the adapted future;
//!   a conversion error fails it with that cause instead,
//! - upstream failure is forwarded with the original cause untouched, with
//!   the query info converted when present,
//! - cancellation propagates in both directions, best-effort.
//!
//! The adapted future resolves exactly once, on the context that resolves the
//! transport future. No thread is blocked in between.

use std::io;

use crate::future::ExecFuture;
use crate::future::Outcome;

/// Converts transport-level completion values into command-level ones.
///
/// Both conversions must be pure. Failures belong in the `Result` channel of
/// [`ResponseConverter::convert_response`]; query-info conversion is
/// infallible because query info typically restates request addressing that
/// the command already validated.
pub trait ResponseConverter: Send + 'static {
    type CoreResponse: Send + Sync + 'static;
    type CoreQueryInfo: Send + Sync + 'static;
    type Response: Send + Sync + 'static;
    type QueryInfo: Send + Sync + 'static;

    fn convert_response(&self, core: &Self::CoreResponse) -> Result<Self::Response, io::Error>;

    fn convert_query_info(&self, core: &Self::CoreQueryInfo) -> Self::QueryInfo;
}

/// Wrap a transport-level future into a command-level future.
///
/// The returned future satisfies the same contract as the one it wraps:
/// exactly-once resolution, listener replay for late subscribers, and
/// native `.await` support.
pub fn adapt<C>(
    core: ExecFuture<C::CoreResponse, C::CoreQueryInfo>,
    converter: C,
) -> ExecFuture<C::Response, C::QueryInfo>
where
    C: ResponseConverter,
{
    let (fut, completer) = ExecFuture::new();

    // Cancelling the command-level future forwards to the transport future.
    // The transport's own cancellation path then resolves this one through
    // the listener below, which by then is a no-op.
    let upstream = core.clone();
    fut.set_cancel_hook(move || upstream.cancel());

    core.add_listener(move |outcome| match outcome {
        Outcome::Completed {
            response,
            query_info,
        } => {
            let query_info = converter.convert_query_info(query_info);
            match converter.convert_response(response) {
                Ok(converted) => completer.complete(converted, query_info),
                Err(e) => completer.fail(e, query_info),
            }
        }
        Outcome::Failed { error, query_info } => {
            let query_info = query_info.as_ref().map(|q| converter.convert_query_info(q));
            completer.fail_shared(error.clone(), query_info);
        }
        Outcome::Cancelled => completer.cancel(),
    });

    fut
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::sync::Arc;

    use super::*;

    /// Parses a transport payload of comma separated numbers into a sum.
    struct SumConverter;

    impl ResponseConverter for SumConverter {
        type CoreResponse = String;
        type CoreQueryInfo = u32;
        type Response = u64;
        type QueryInfo = String;

        fn convert_response(&self, core: &String) -> Result<u64, io::Error> {
            let mut sum = 0u64;
            for part in core.split(',').filter(|p| !p.is_empty()) {
                let n: u64 = part.parse().map_err(|e| {
                    io::Error::new(ErrorKind::InvalidData, format!("bad payload {:?}: {}", part, e))
                })?;
                sum += n;
            }
            Ok(sum)
        }

        fn convert_query_info(&self, core: &u32) -> String {
            format!("req-{}", core)
        }
    }

    #[tokio::test]
    async fn test_success_converts_both_values() {
        let (core, completer) = ExecFuture::<String, u32>::new();
        let fut = adapt(core, SumConverter);

        completer.complete("1,2,3".to_string(), 7);

        let outcome = fut.await;
        assert_eq!(outcome.response(), Some(&6));
        assert_eq!(outcome.query_info(), Some(&"req-7".to_string()));
    }

    #[tokio::test]
    async fn test_conversion_error_fails_adapted_future() {
        let (core, completer) = ExecFuture::<String, u32>::new();
        let fut = adapt(core, SumConverter);

        completer.complete("1,x".to_string(), 7);

        let outcome = fut.await;
        assert!(outcome.is_failed());
        assert_eq!(outcome.error().unwrap().kind(), ErrorKind::InvalidData);
        // Query info still describes which request failed.
        assert_eq!(outcome.query_info(), Some(&"req-7".to_string()));
    }

    #[tokio::test]
    async fn test_failure_forwards_original_cause() {
        let (core, completer) = ExecFuture::<String, u32>::new();
        let fut = adapt(core, SumConverter);

        completer.fail(io::Error::new(ErrorKind::ConnectionRefused, "no nodes"), 3);

        let core_err;
        {
            // The cause on the adapted future is the very same error value,
            // not a re-wrapped copy.
            let outcome = fut.clone().await;
            core_err = outcome.error().unwrap().clone();
        }
        let outcome = fut.await;
        assert!(Arc::ptr_eq(outcome.error().unwrap(), &core_err));
        assert_eq!(outcome.error().unwrap().kind(), ErrorKind::ConnectionRefused);
        assert_eq!(outcome.query_info(), Some(&"req-3".to_string()));
    }

    #[tokio::test]
    async fn test_failure_without_query_info() {
        let (core, completer) = ExecFuture::<String, u32>::new();
        let fut = adapt(core, SumConverter);

        completer.fail(io::Error::new(ErrorKind::BrokenPipe, "torn down"), None);

        let outcome = fut.await;
        assert!(outcome.is_failed());
        assert_eq!(outcome.query_info(), None);
    }

    #[tokio::test]
    async fn test_upstream_cancellation_propagates_down() {
        let (core, _completer) = ExecFuture::<String, u32>::new();
        let fut = adapt(core.clone(), SumConverter);

        core.cancel();

        assert!(fut.await.is_cancelled());
    }

    #[test]
    fn test_downstream_cancellation_propagates_up() {
        let (core, _completer) = ExecFuture::<String, u32>::new();
        let fut = adapt(core.clone(), SumConverter);

        fut.cancel();

        assert!(fut.try_outcome().unwrap().is_cancelled());
        assert!(core.try_outcome().unwrap().is_cancelled());
    }

    #[test]
    fn test_late_listener_on_adapted_future() {
        let (core, completer) = ExecFuture::<String, u32>::new();
        let fut = adapt(core, SumConverter);

        completer.complete("10".to_string(), 1);

        let mut seen = None;
        let (tx, rx) = std::sync::mpsc::channel();
        fut.add_listener(move |outcome| {
            tx.send(*outcome.response().unwrap()).unwrap();
        });
        if let Ok(v) = rx.try_recv() {
            seen = Some(v);
        }
        assert_eq!(seen, Some(10));
    }
}
