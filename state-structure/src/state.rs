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

//! States and the references that point at them.

use crate::constraint::AttachmentConstraint;
use base_crypto::hash::HashOutput;
use base_crypto::signatures::VerifyingKey;
#[cfg(feature = "proptest")]
use proptest_derive::Arbitrary;
use serde::{Deserialize, Serialize};
use serialize::{Deserializable, Serializable, Tagged};
use std::fmt::{self, Display, Formatter};

/// The identifier of a transaction.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Serializable,
)]
#[tag = "transaction-id[v1]"]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct TransactionId(pub HashOutput);

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl rand::distributions::Distribution<TransactionId> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> TransactionId {
        TransactionId(rng.r#gen())
    }
}

/// A pointer to the `index`th output of transaction `txhash`.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Serializable,
)]
#[tag = "state-ref[v1]"]
#[cfg_attr(feature = "proptest", derive(Arbitrary))]
pub struct StateRef {
    pub txhash: TransactionId,
    pub index: u32,
}

impl Display for StateRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.txhash, self.index)
    }
}

impl rand::distributions::Distribution<StateRef> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> StateRef {
        StateRef {
            txhash: rng.r#gen(),
            index: rng.gen_range(0..16),
        }
    }
}

/// The name a contract implementation is registered under.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Serializable)]
#[tag = "contract-name[v1]"]
#[serde(transparent)]
pub struct ContractName(pub String);

impl ContractName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContractName {
    fn from(name: &str) -> Self {
        ContractName(name.to_owned())
    }
}

impl Display for ContractName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A well-known network identity.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Serializable)]
#[tag = "party[v1]"]
pub struct Party {
    pub name: String,
    pub owning_key: VerifyingKey,
}

impl Display for Party {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The contract-specific payload of a state.
///
/// `data` is opaque to the ledger; only the contract governing the state
/// interprets it. `participants` are the parties whose keys must sign any
/// transaction consuming the state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Serializable)]
#[tag = "contract-state[v1]"]
pub struct ContractState {
    pub participants: Vec<Party>,
    pub data: Vec<u8>,
}

/// A state together with its ledger envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Serializable)]
#[tag = "transaction-state[v1]"]
pub struct TransactionState {
    pub data: ContractState,
    pub contract: ContractName,
    pub notary: Party,
    /// Index of another output of the same transaction that must be consumed
    /// alongside this one.
    pub encumbrance: Option<u32>,
    pub constraint: AttachmentConstraint,
}

/// A resolved state, and where on the ledger it came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Serializable)]
#[tag = "state-and-ref[v1]"]
pub struct StateAndRef {
    pub state: TransactionState,
    pub reference: StateRef,
}

#[cfg(test)]
mod tests {
    use super::*;
    use base_crypto::signatures::SigningKey;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serialize::{tagged_deserialize, tagged_vec};

    #[test]
    fn state_refs_order_by_hash_then_index() {
        let txhash = TransactionId(HashOutput([1u8; 32]));
        let a = StateRef { txhash, index: 7 };
        let b = StateRef { txhash, index: 2 };
        let c = StateRef {
            txhash: TransactionId(HashOutput([2u8; 32])),
            index: 0,
        };
        let mut refs = vec![a, c, b];
        refs.sort();
        assert_eq!(refs, vec![b, a, c]);
    }

    #[test]
    fn state_and_ref_survives_serialization() {
        let mut rng = StdRng::seed_from_u64(0x42);
        let alice = Party {
            name: "Alice".into(),
            owning_key: SigningKey::sample(&mut rng).verifying_key(),
        };
        let notary = Party {
            name: "Notary".into(),
            owning_key: SigningKey::sample(&mut rng).verifying_key(),
        };
        let value = StateAndRef {
            state: TransactionState {
                data: ContractState {
                    participants: vec![alice],
                    data: vec![1, 2, 3],
                },
                contract: "LegacyCash".into(),
                notary,
                encumbrance: Some(1),
                constraint: AttachmentConstraint::WhitelistedByZone,
            },
            reference: rng.r#gen(),
        };
        let bytes = tagged_vec(&value);
        assert!(bytes.starts_with(b"upgrade:state-and-ref[v1]:"));
        assert_eq!(value, tagged_deserialize(&bytes[..]).unwrap());
    }

    #[test]
    fn contract_name_is_a_plain_json_string() {
        let name = ContractName::from("CashV2");
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"CashV2\"");
    }
}
