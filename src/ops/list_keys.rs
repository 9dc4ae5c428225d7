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

//! The transport-level list-keys operation.
//!
//! This is the request shape handed to the cluster execution core. How it is
//! encoded on the wire is the transport layer's business; at this level it is
//! just the target bucket plus an optional timeout.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::cluster::ClusterOperation;
use crate::location::Location;

/// Transport request to enumerate every key in one bucket.
///
/// Built through [`ListKeysOperation::builder`]. A missing or zero timeout
/// means the transport layer applies its own default deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListKeysOperation {
    location: Location,
    timeout: Option<Duration>,
}

impl ListKeysOperation {
    pub fn builder(location: Location) -> ListKeysOperationBuilder {
        ListKeysOperationBuilder {
            location,
            timeout: None,
        }
    }

    /// The bucket this operation enumerates.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The explicit timeout, or `None` to use the transport default.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl ClusterOperation for ListKeysOperation {
    type Response = ListKeysOpResponse;
    type QueryInfo = Location;
}

/// Builder for [`ListKeysOperation`]. The target location is mandatory and
/// fixed at construction.
#[derive(Debug, Clone)]
pub struct ListKeysOperationBuilder {
    location: Location,
    timeout: Option<Duration>,
}

impl ListKeysOperationBuilder {
    /// Set an explicit timeout. A zero timeout is treated as unset.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    pub fn build(self) -> ListKeysOperation {
        ListKeysOperation {
            location: self.location,
            timeout: self.timeout,
        }
    }
}

/// Raw transport response: the decoded key batch, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListKeysOpResponse {
    keys: Vec<String>,
}

impl ListKeysOpResponse {
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_without_timeout() {
        let op = ListKeysOperation::builder(Location::new("t", "b")).build();

        assert_eq!(op.location(), &Location::new("t", "b"));
        assert_eq!(op.timeout(), None);
    }

    #[test]
    fn test_builder_with_timeout() {
        let op = ListKeysOperation::builder(Location::new("t", "b"))
            .with_timeout(Duration::from_millis(5000))
            .build();

        assert_eq!(op.timeout(), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_zero_timeout_means_transport_default() {
        let op = ListKeysOperation::builder(Location::new("t", "b"))
            .with_timeout(Duration::ZERO)
            .build();

        assert_eq!(op.timeout(), None);
    }
}
