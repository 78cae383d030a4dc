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

//! Content-addressed attachments carrying contract code.

use crate::state::ContractName;
use base_crypto::hash::{HashOutput, persistent_hash};
use base_crypto::signatures::VerifyingKey;
use serde::{Deserialize, Serialize};
use serialize::{Deserializable, Serializable, Tagged};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};
use std::io::{self, Read, Write};
use std::sync::Arc;

/// The identifier of an attachment: the hash of its contents.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Serializable,
)]
#[tag = "attachment-id[v1]"]
pub struct AttachmentId(pub HashOutput);

impl Display for AttachmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A bundle of contract code or data, addressed by its content hash.
///
/// The identifier is always derived from `data`, including on decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    id: AttachmentId,
    data: Arc<[u8]>,
    signers: BTreeSet<VerifyingKey>,
}

impl Attachment {
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        signers: impl IntoIterator<Item = VerifyingKey>,
    ) -> Self {
        let data = data.into();
        Attachment {
            id: AttachmentId(persistent_hash(&data)),
            data,
            signers: signers.into_iter().collect(),
        }
    }

    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The keys that signed this attachment.
    pub fn signers(&self) -> &BTreeSet<VerifyingKey> {
        &self.signers
    }
}

impl Tagged for Attachment {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("attachment[v1]")
    }
}

impl Serializable for Attachment {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        Serializable::serialize(&self.data, writer)?;
        Serializable::serialize(&self.signers, writer)
    }

    fn serialized_size(&self) -> usize {
        self.data.serialized_size() + self.signers.serialized_size()
    }
}

impl Deserializable for Attachment {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let data = <Vec<u8> as Deserializable>::deserialize(reader, recursion_depth)?;
        let signers: BTreeSet<VerifyingKey> =
            Deserializable::deserialize(reader, recursion_depth)?;
        Ok(Attachment::new(data, signers))
    }
}

/// The approved contract implementations of a network, by contract.
pub type ContractWhitelist = BTreeMap<ContractName, Vec<AttachmentId>>;

/// An attachment as seen by a constraint: together with the contract of the
/// state being checked and the network's implementation whitelist.
#[derive(Clone, Copy, Debug)]
pub struct AttachmentContext<'a> {
    pub attachment: &'a Attachment,
    pub state_contract: &'a ContractName,
    pub whitelist: &'a ContractWhitelist,
}

impl<'a> AttachmentContext<'a> {
    pub fn new(
        attachment: &'a Attachment,
        state_contract: &'a ContractName,
        whitelist: &'a ContractWhitelist,
    ) -> Self {
        AttachmentContext {
            attachment,
            state_contract,
            whitelist,
        }
    }

    pub fn id(&self) -> AttachmentId {
        self.attachment.id()
    }

    /// Whether the network whitelists this attachment as an implementation
    /// of the state's contract.
    pub fn is_whitelisted(&self) -> bool {
        self.whitelist
            .get(self.state_contract)
            .is_some_and(|ids| ids.contains(&self.attachment.id()))
    }
}
