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

//! Defines [`Location`], the fully-qualified address of a record.
//!
//! A record in the store is addressed by a bucket type (namespace), a bucket,
//! and a key. Commands that target a whole bucket leave the key unset.

use serde::Deserialize;
use serde::Serialize;

/// The bucket type a [`Location`] belongs to when none is given explicitly.
pub const DEFAULT_BUCKET_TYPE: &str = "default";

/// Fully-qualified address of a record: `(bucket_type, bucket, key)`.
///
/// A `Location` is an immutable value. Equality and hashing cover the full
/// tuple, so two locations that differ only in the key address two distinct
/// records. Methods that "modify" a location, such as [`Location::with_key`],
/// return a new value and leave the original untouched.
///
/// # Examples
///
/// ```
/// use kv_client_api::Location;
///
/// let bucket = Location::in_default_type("users");
/// let record = bucket.with_key("alice");
///
/// assert_eq!(record.bucket_type(), "default");
/// assert_eq!(record.bucket(), "users");
/// assert_eq!(record.key(), Some("alice"));
/// assert_ne!(bucket, record);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    bucket_type: String,
    bucket: String,
    key: Option<String>,
}

impl Location {
    /// Create a location addressing a whole bucket in the given bucket type.
    pub fn new(bucket_type: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            bucket_type: bucket_type.into(),
            bucket: bucket.into(),
            key: None,
        }
    }

    /// Create a location addressing a whole bucket in the
    /// [`DEFAULT_BUCKET_TYPE`].
    pub fn in_default_type(bucket: impl Into<String>) -> Self {
        Self::new(DEFAULT_BUCKET_TYPE, bucket)
    }

    /// Return a new location with the same bucket type and bucket but with the
    /// given key set.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            bucket_type: self.bucket_type.clone(),
            bucket: self.bucket.clone(),
            key: Some(key.into()),
        }
    }

    pub fn bucket_type(&self) -> &str {
        &self.bucket_type
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key, or `None` if this location addresses a whole bucket.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}
