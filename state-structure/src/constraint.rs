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

//! Attachment constraints: what a state demands of the attachment that
//! governs it.

use crate::attachment::{AttachmentContext, AttachmentId};
use base_crypto::signatures::VerifyingKey;
use serde::{Deserialize, Serialize};
use serialize::{Deserializable, Serializable, Tagged};
use std::fmt::{self, Display, Formatter};

/// A predicate over an [`AttachmentContext`].
///
/// The set of kinds is closed; code that depends on the kind matches on it
/// exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Serializable)]
#[tag = "attachment-constraint[v1]"]
#[repr(u8)]
pub enum AttachmentConstraint {
    /// Accepts any attachment.
    AlwaysAccept = 0,
    /// Accepts exactly the attachment with this identifier.
    HashPinned(AttachmentId) = 1,
    /// Accepts any attachment the network whitelists for the state's contract.
    WhitelistedByZone = 2,
    /// Accepts any attachment signed by this key.
    Signature(VerifyingKey) = 3,
}

impl AttachmentConstraint {
    pub fn is_satisfied_by(&self, attachment: &AttachmentContext<'_>) -> bool {
        use AttachmentConstraint::*;
        match self {
            AlwaysAccept => true,
            HashPinned(id) => attachment.id() == *id,
            WhitelistedByZone => attachment.is_whitelisted(),
            Signature(key) => attachment.attachment.signers().contains(key),
        }
    }

    /// A short, stable name for the kind of this constraint.
    pub fn kind(&self) -> &'static str {
        use AttachmentConstraint::*;
        match self {
            AlwaysAccept => "always-accept",
            HashPinned(_) => "hash-pinned",
            WhitelistedByZone => "whitelisted-by-zone",
            Signature(_) => "signature",
        }
    }
}

impl Display for AttachmentConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use AttachmentConstraint::*;
        match self {
            HashPinned(id) => write!(f, "{}({id})", self.kind()),
            Signature(key) => write!(f, "{}({key:?})", self.kind()),
            AlwaysAccept | WhitelistedByZone => f.write_str(self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::{Attachment, ContractWhitelist};
    use crate::state::ContractName;
    use base_crypto::signatures::SigningKey;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serialize::{tagged_deserialize, tagged_vec};

    struct Fixture {
        attachment: Attachment,
        signer: VerifyingKey,
        stranger: VerifyingKey,
        contract: ContractName,
        whitelist: ContractWhitelist,
    }

    fn fixture() -> Fixture {
        let mut rng = StdRng::seed_from_u64(0x42);
        let signer = SigningKey::sample(&mut rng).verifying_key();
        let stranger = SigningKey::sample(&mut rng).verifying_key();
        let attachment = Attachment::new(b"legacy cash contract".to_vec(), [signer.clone()]);
        let contract = ContractName::from("LegacyCash");
        let mut whitelist = ContractWhitelist::new();
        whitelist.insert(contract.clone(), vec![attachment.id()]);
        Fixture {
            attachment,
            signer,
            stranger,
            contract,
            whitelist,
        }
    }

    #[test]
    fn satisfaction_table() {
        let f = fixture();
        let ctx = AttachmentContext::new(&f.attachment, &f.contract, &f.whitelist);
        let other = Attachment::new(b"something else".to_vec(), []);

        assert!(AttachmentConstraint::AlwaysAccept.is_satisfied_by(&ctx));
        assert!(AttachmentConstraint::HashPinned(f.attachment.id()).is_satisfied_by(&ctx));
        assert!(!AttachmentConstraint::HashPinned(other.id()).is_satisfied_by(&ctx));
        assert!(AttachmentConstraint::WhitelistedByZone.is_satisfied_by(&ctx));
        assert!(AttachmentConstraint::Signature(f.signer.clone()).is_satisfied_by(&ctx));
        assert!(!AttachmentConstraint::Signature(f.stranger.clone()).is_satisfied_by(&ctx));
    }

    #[test]
    fn zone_whitelist_rejects_unlisted_contract() {
        let f = fixture();
        let bond = ContractName::from("Bond");
        let ctx = AttachmentContext::new(&f.attachment, &bond, &f.whitelist);
        assert!(!AttachmentConstraint::WhitelistedByZone.is_satisfied_by(&ctx));
    }

    #[test]
    fn constraints_survive_serialization() {
        let f = fixture();
        for (discriminant, constraint) in [
            AttachmentConstraint::AlwaysAccept,
            AttachmentConstraint::HashPinned(f.attachment.id()),
            AttachmentConstraint::WhitelistedByZone,
            AttachmentConstraint::Signature(f.signer.clone()),
        ]
        .into_iter()
        .enumerate()
        {
            let mut raw = Vec::new();
            Serializable::serialize(&constraint, &mut raw).unwrap();
            assert_eq!(raw[0] as usize, discriminant);
            assert_eq!(raw.len(), constraint.serialized_size());

            let bytes = tagged_vec(&constraint);
            let decoded: AttachmentConstraint = tagged_deserialize(&bytes[..]).unwrap();
            assert_eq!(decoded, constraint);
        }
    }

    #[test]
    fn unknown_discriminant_rejected() {
        for bytes in [[4u8], [9u8]] {
            let result = <AttachmentConstraint as Deserializable>::deserialize(&mut &bytes[..], 0);
            assert!(result.is_err());
        }
    }
}
