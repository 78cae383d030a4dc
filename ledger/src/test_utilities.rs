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

//! Fixtures for exercising contract upgrades: an in-memory resolution
//! service and a `LegacyCash` to `CashV2` upgrade.

use crate::construct::UpgradeComponents;
use crate::error::MalformedTransaction;
use crate::resolve::ResolutionService;
use crate::structure::{NetworkParameters, NotaryInfo, TransactionSignature};
use crate::upgrade::{ContractRegistry, UpgradedContract};
use anyhow::Context;
use base_crypto::signatures::SigningKey;
use rand::{CryptoRng, Rng};
use serialize::{Deserializable, Serializable, Tagged, tagged_deserialize, tagged_vec};
use state_structure::attachment::{Attachment, AttachmentId};
use state_structure::constraint::AttachmentConstraint;
use state_structure::state::{
    ContractName, ContractState, Party, StateAndRef, StateRef, TransactionId, TransactionState,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io;

pub const LEGACY_CASH: &str = "LegacyCash";
pub const CASH_V2: &str = "CashV2";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serializable)]
#[tag = "legacy-cash[v1]"]
pub struct LegacyCashBody {
    pub amount: u64,
}

/// `CashV2` names its currency and counts in minor units.
#[derive(Clone, Debug, PartialEq, Eq, Serializable)]
#[tag = "cash[v2]"]
pub struct CashV2Body {
    pub minor_units: u128,
    pub currency: String,
}

#[derive(Clone, Debug)]
pub struct CashV2Upgrade {
    legacy: ContractName,
    legacy_constraint: Option<AttachmentConstraint>,
}

impl Default for CashV2Upgrade {
    fn default() -> Self {
        CashV2Upgrade {
            legacy: LEGACY_CASH.into(),
            legacy_constraint: None,
        }
    }
}

impl CashV2Upgrade {
    pub fn from_legacy(legacy: impl Into<ContractName>) -> Self {
        CashV2Upgrade {
            legacy: legacy.into(),
            legacy_constraint: None,
        }
    }

    pub fn requiring(mut self, constraint: AttachmentConstraint) -> Self {
        self.legacy_constraint = Some(constraint);
        self
    }
}

impl UpgradedContract for CashV2Upgrade {
    fn legacy_contract(&self) -> &ContractName {
        &self.legacy
    }

    fn legacy_contract_constraint(&self) -> Option<AttachmentConstraint> {
        self.legacy_constraint.clone()
    }

    fn upgrade(&self, state: &ContractState) -> anyhow::Result<ContractState> {
        let legacy: LegacyCashBody =
            tagged_deserialize(&state.data[..]).context("not a LegacyCash state")?;
        let upgraded = CashV2Body {
            minor_units: u128::from(legacy.amount) * 100,
            currency: "USD".into(),
        };
        Ok(ContractState {
            participants: state.participants.clone(),
            data: tagged_vec(&upgraded),
        })
    }
}

#[derive(Clone, Debug)]
pub struct InMemoryResolver {
    pub states: BTreeMap<StateRef, StateAndRef>,
    pub attachments: BTreeMap<AttachmentId, Attachment>,
    pub network_parameters: NetworkParameters,
    /// Makes every lookup fail with an I/O error.
    pub unavailable: bool,
}

impl InMemoryResolver {
    pub fn new(network_parameters: NetworkParameters) -> Self {
        InMemoryResolver {
            states: BTreeMap::new(),
            attachments: BTreeMap::new(),
            network_parameters,
            unavailable: false,
        }
    }

    pub fn add_state(&mut self, state: StateAndRef) {
        self.states.insert(state.reference, state);
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.insert(attachment.id(), attachment);
    }

    fn check_available(&self) -> io::Result<()> {
        if self.unavailable {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "store unavailable"));
        }
        Ok(())
    }
}

impl ResolutionService for InMemoryResolver {
    async fn load_states(&self, refs: &BTreeSet<StateRef>) -> io::Result<Vec<StateAndRef>> {
        self.check_available()?;
        // Reverse order, so callers cannot rely on it.
        Ok(refs
            .iter()
            .rev()
            .filter_map(|r| self.states.get(r).cloned())
            .collect())
    }

    async fn open_attachment(&self, id: AttachmentId) -> io::Result<Option<Attachment>> {
        self.check_available()?;
        Ok(self.attachments.get(&id).cloned())
    }

    fn network_parameters(&self) -> NetworkParameters {
        self.network_parameters.clone()
    }
}

/// A network with one notary, one cash holder and both cash contract
/// attachments whitelisted.
pub struct UpgradeFixture {
    pub owner_key: SigningKey,
    pub owner: Party,
    pub notary_key: SigningKey,
    pub notary: Party,
    pub developer_key: SigningKey,
    pub legacy_attachment: Attachment,
    pub upgraded_attachment: Attachment,
    pub resolver: InMemoryResolver,
    pub registry: ContractRegistry,
}

impl UpgradeFixture {
    pub fn new<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let owner_key = SigningKey::sample(&mut *rng);
        let notary_key = SigningKey::sample(&mut *rng);
        let developer_key = SigningKey::sample(&mut *rng);
        let owner = Party {
            name: "Alice".into(),
            owning_key: owner_key.verifying_key(),
        };
        let notary = Party {
            name: "Notary".into(),
            owning_key: notary_key.verifying_key(),
        };
        let legacy_attachment = Attachment::new(
            b"LegacyCash contract v1".to_vec(),
            [developer_key.verifying_key()],
        );
        let upgraded_attachment = Attachment::new(
            b"CashV2 contract v2".to_vec(),
            [developer_key.verifying_key()],
        );

        let network_parameters = NetworkParameters {
            notaries: vec![NotaryInfo {
                identity: notary.clone(),
                validating: true,
            }],
            whitelisted_contract_implementations: [
                (ContractName::from(LEGACY_CASH), vec![legacy_attachment.id()]),
                (ContractName::from(CASH_V2), vec![upgraded_attachment.id()]),
            ]
            .into_iter()
            .collect(),
        };
        let mut resolver = InMemoryResolver::new(network_parameters);
        resolver.add_attachment(legacy_attachment.clone());
        resolver.add_attachment(upgraded_attachment.clone());

        UpgradeFixture {
            owner_key,
            owner,
            notary_key,
            notary,
            developer_key,
            legacy_attachment,
            upgraded_attachment,
            resolver,
            registry: ContractRegistry::new().with(CASH_V2, CashV2Upgrade::default()),
        }
    }

    /// Records a new `LegacyCash` state owned by the fixture's owner.
    pub fn issue<R: Rng + CryptoRng>(
        &mut self,
        rng: &mut R,
        amount: u64,
        constraint: AttachmentConstraint,
    ) -> StateAndRef {
        self.issue_under(rng, LEGACY_CASH.into(), amount, constraint)
    }

    pub fn issue_under<R: Rng + CryptoRng>(
        &mut self,
        rng: &mut R,
        contract: ContractName,
        amount: u64,
        constraint: AttachmentConstraint,
    ) -> StateAndRef {
        let state = StateAndRef {
            state: TransactionState {
                data: ContractState {
                    participants: vec![self.owner.clone()],
                    data: tagged_vec(&LegacyCashBody { amount }),
                },
                contract,
                notary: self.notary.clone(),
                encumbrance: None,
                constraint,
            },
            reference: rng.r#gen(),
        };
        self.resolver.add_state(state.clone());
        state
    }

    pub fn upgrade_to_cash_v2(
        &self,
        inputs: &[StateAndRef],
    ) -> Result<UpgradeComponents, MalformedTransaction> {
        UpgradeComponents::upgrading(
            inputs,
            self.legacy_attachment.id(),
            CASH_V2.into(),
            self.upgraded_attachment.id(),
        )
    }

    /// Signatures by the owner and the notary.
    pub fn sign<R: Rng + CryptoRng>(
        &self,
        rng: &mut R,
        id: &TransactionId,
    ) -> Vec<TransactionSignature> {
        vec![
            TransactionSignature::sign(&self.owner_key, rng, id),
            TransactionSignature::sign(&self.notary_key, rng, id),
        ]
    }
}
