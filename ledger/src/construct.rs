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

use crate::error::MalformedTransaction;
use crate::structure::{PrivacySalt, WireTransaction};
use rand::{CryptoRng, Rng};
use serialize::tagged_vec;
use state_structure::attachment::AttachmentId;
use state_structure::state::{ContractName, Party, StateAndRef, StateRef};

/// The typed fields of a contract upgrade transaction, before serialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeComponents {
    pub inputs: Vec<StateRef>,
    pub notary: Party,
    pub legacy_contract_attachment_id: AttachmentId,
    pub upgraded_contract_name: ContractName,
    pub upgraded_contract_attachment_id: AttachmentId,
}

impl UpgradeComponents {
    /// Upgrades `states`, ordered by the notary of the first of them.
    pub fn upgrading(
        states: &[StateAndRef],
        legacy_contract_attachment_id: AttachmentId,
        upgraded_contract_name: ContractName,
        upgraded_contract_attachment_id: AttachmentId,
    ) -> Result<Self, MalformedTransaction> {
        let notary = states
            .first()
            .map(|s| s.state.notary.clone())
            .ok_or(MalformedTransaction::EmptyInputs)?;
        Ok(UpgradeComponents {
            inputs: states.iter().map(|s| s.reference).collect(),
            notary,
            legacy_contract_attachment_id,
            upgraded_contract_name,
            upgraded_contract_attachment_id,
        })
    }

    pub fn serialize_components(&self) -> Vec<Vec<u8>> {
        vec![
            tagged_vec(&self.inputs),
            tagged_vec(&self.notary),
            tagged_vec(&self.legacy_contract_attachment_id),
            tagged_vec(&self.upgraded_contract_name),
            tagged_vec(&self.upgraded_contract_attachment_id),
        ]
    }

    pub fn with_salt(
        &self,
        privacy_salt: PrivacySalt,
    ) -> Result<WireTransaction, MalformedTransaction> {
        WireTransaction::new(self.serialize_components(), privacy_salt)
    }

    pub fn assemble<R: Rng + CryptoRng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<WireTransaction, MalformedTransaction> {
        self.with_salt(PrivacySalt::random(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::ComponentGroup;
    use base_crypto::signatures::SigningKey;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use state_structure::constraint::AttachmentConstraint;
    use state_structure::state::{ContractState, TransactionState};

    fn components(rng: &mut StdRng) -> UpgradeComponents {
        UpgradeComponents {
            inputs: vec![rng.r#gen(), rng.r#gen()],
            notary: Party {
                name: "Notary".into(),
                owning_key: SigningKey::sample(&mut *rng).verifying_key(),
            },
            legacy_contract_attachment_id: AttachmentId(rng.r#gen()),
            upgraded_contract_name: "CashV2".into(),
            upgraded_contract_attachment_id: AttachmentId(rng.r#gen()),
        }
    }

    #[test]
    fn assembled_transaction_decodes_its_components() {
        let mut rng = StdRng::seed_from_u64(0x42);
        let parts = components(&mut rng);
        let tx = parts.assemble(&mut rng).unwrap();
        assert_eq!(tx.inputs(), &parts.inputs[..]);
        assert_eq!(tx.notary(), &parts.notary);
        assert_eq!(
            tx.legacy_contract_attachment_id(),
            parts.legacy_contract_attachment_id
        );
        assert_eq!(tx.upgraded_contract_name(), &parts.upgraded_contract_name);
        assert_eq!(
            tx.upgraded_contract_attachment_id(),
            parts.upgraded_contract_attachment_id
        );
        assert_eq!(
            tx.component(ComponentGroup::Notary),
            &tagged_vec(&parts.notary)[..]
        );
    }

    #[test]
    fn same_salt_gives_same_id() {
        let mut rng = StdRng::seed_from_u64(0x42);
        let parts = components(&mut rng);
        let salt = PrivacySalt::random(&mut rng);
        assert_eq!(
            parts.with_salt(salt).unwrap().id(),
            parts.with_salt(salt).unwrap().id()
        );
        let other = PrivacySalt::random(&mut rng);
        assert_ne!(
            parts.with_salt(salt).unwrap().id(),
            parts.with_salt(other).unwrap().id()
        );
    }

    #[test]
    fn empty_and_duplicate_inputs_rejected() {
        let mut rng = StdRng::seed_from_u64(0x42);
        let mut parts = components(&mut rng);
        let first = parts.inputs[0];
        parts.inputs.push(first);
        assert_eq!(
            parts.assemble(&mut rng),
            Err(MalformedTransaction::DuplicateInput(first))
        );
        parts.inputs.clear();
        assert_eq!(
            parts.assemble(&mut rng),
            Err(MalformedTransaction::EmptyInputs)
        );
    }

    #[test]
    fn upgrading_takes_notary_from_first_state() {
        let mut rng = StdRng::seed_from_u64(0x42);
        let template = components(&mut rng);
        let state = StateAndRef {
            state: TransactionState {
                data: ContractState {
                    participants: Vec::new(),
                    data: Vec::new(),
                },
                contract: "LegacyCash".into(),
                notary: template.notary.clone(),
                encumbrance: None,
                constraint: AttachmentConstraint::WhitelistedByZone,
            },
            reference: rng.r#gen(),
        };
        let parts = UpgradeComponents::upgrading(
            &[state.clone()],
            template.legacy_contract_attachment_id,
            "CashV2".into(),
            template.upgraded_contract_attachment_id,
        )
        .unwrap();
        assert_eq!(parts.notary, template.notary);
        assert_eq!(parts.inputs, vec![state.reference]);
        assert_eq!(
            UpgradeComponents::upgrading(
                &[],
                template.legacy_contract_attachment_id,
                "CashV2".into(),
                template.upgraded_contract_attachment_id,
            ),
            Err(MalformedTransaction::EmptyInputs)
        );
    }
}
