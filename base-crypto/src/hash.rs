// This file is part of upgrade-ledger.
// Copyright (C) 2025 Midnight Foundation
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Hashing functions for use across the upgrade ledger.
//!
//! Everything here is built on SHA-256 and is guaranteed for long-term
//! support: changing any of these functions changes every transaction
//! identifier ever computed.

use const_hex::ToHexExt;
#[cfg(feature = "proptest")]
use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};
use serialize::{Deserializable, Serializable, Tagged};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt::{self, Debug, Display, Formatter};
use std::io;
use zeroize::Zeroize;

/// The number of bytes output by [`persistent_hash`].
pub const PERSISTENT_HASH_BYTES: usize = 32;

/// A wrapper around hash outputs.
#[derive(
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Serializable,
    Zeroize,
)]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct HashOutput(pub [u8; PERSISTENT_HASH_BYTES]);

impl Tagged for HashOutput {
    fn tag() -> Cow<'static, str> {
        <[u8; PERSISTENT_HASH_BYTES]>::tag()
    }
}

/// A zeroed [`HashOutput`].
pub const BLANK_HASH: HashOutput = HashOutput([0u8; PERSISTENT_HASH_BYTES]);

impl rand::distributions::Distribution<HashOutput> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> HashOutput {
        HashOutput(rng.r#gen())
    }
}

impl Debug for HashOutput {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0.encode_hex())
    }
}

impl Display for HashOutput {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", &self.0.encode_hex()[..10])
    }
}

impl AsRef<[u8]> for HashOutput {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A hash function that is guaranteed for long-term support.
pub fn persistent_hash(a: &[u8]) -> HashOutput {
    HashOutput(Sha256::digest(a).into())
}

/// [`persistent_hash`] applied to its own output.
pub fn persistent_hash_twice(a: &[u8]) -> HashOutput {
    let inner = Sha256::digest(a);
    HashOutput(Sha256::digest(inner).into())
}

/// Chains two hashes with a single [`persistent_hash`] pass over their
/// concatenation. No length or position prefix is mixed in.
pub fn hash_concat(left: &HashOutput, right: &HashOutput) -> HashOutput {
    let mut writer = PersistentHashWriter::new();
    writer.update(&left.0);
    writer.update(&right.0);
    writer.finalize()
}

/// A writer object for building large persistent commitments of data.
pub struct PersistentHashWriter(Sha256);

impl io::Write for PersistentHashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for PersistentHashWriter {
    fn default() -> Self {
        PersistentHashWriter(Sha256::new())
    }
}

impl PersistentHashWriter {
    /// Initializes a blank hasher.
    pub fn new() -> Self {
        Default::default()
    }

    /// Feeds more data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    /// Finalizes the hasher, and returns the result.
    pub fn finalize(self) -> HashOutput {
        HashOutput(self.0.finalize().into())
    }

    /// Finalizes the hasher, and returns the hash of the result.
    pub fn finalize_twice(self) -> HashOutput {
        HashOutput(Sha256::digest(self.0.finalize()).into())
    }
}
