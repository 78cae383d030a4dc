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

use crate::commitment::{component_hash, compute_nonce, transaction_id};
use crate::error::{MalformedTransaction, TransactionInvalid};
use base_crypto::hash::{BLANK_HASH, HashOutput};
use base_crypto::signatures::{Signature, SigningKey, VerifyingKey};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use serialize::{Deserializable, Serializable, Tagged, tagged_deserialize};
use state_structure::attachment::{AttachmentId, ContractWhitelist};
use state_structure::state::{ContractName, Party, StateRef, TransactionId};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug, Display, Formatter};
use std::io::{self, Read, Write};

pub const COMPONENT_COUNT: usize = 5;

/// The fields of a contract upgrade transaction, in commitment order.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Serializable,
)]
#[tag = "component-group[v1]"]
pub enum ComponentGroup {
    Inputs = 0,
    Notary = 1,
    LegacyAttachmentRef = 2,
    UpgradedContractName = 3,
    UpgradedAttachmentRef = 4,
}

impl ComponentGroup {
    pub const ALL: [ComponentGroup; COMPONENT_COUNT] = [
        ComponentGroup::Inputs,
        ComponentGroup::Notary,
        ComponentGroup::LegacyAttachmentRef,
        ComponentGroup::UpgradedContractName,
        ComponentGroup::UpgradedAttachmentRef,
    ];

    /// The groups a filtered transaction reveals.
    pub const VISIBLE: [ComponentGroup; 2] = [ComponentGroup::Inputs, ComponentGroup::Notary];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn is_visible(self) -> bool {
        Self::VISIBLE.contains(&self)
    }
}

impl Display for ComponentGroup {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentGroup::Inputs => "inputs",
            ComponentGroup::Notary => "notary",
            ComponentGroup::LegacyAttachmentRef => "legacy attachment",
            ComponentGroup::UpgradedContractName => "upgraded contract name",
            ComponentGroup::UpgradedAttachmentRef => "upgraded attachment",
        };
        write!(f, "{name}")
    }
}

/// Per-transaction randomness every component nonce is derived from.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PrivacySalt([u8; 32]);

impl PrivacySalt {
    pub fn new(bytes: [u8; 32]) -> Result<Self, MalformedTransaction> {
        if bytes == [0u8; 32] {
            return Err(MalformedTransaction::ZeroPrivacySalt);
        }
        Ok(PrivacySalt(bytes))
    }

    pub fn random<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        loop {
            if let Ok(salt) = PrivacySalt::new(rng.r#gen()) {
                return salt;
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Debug for PrivacySalt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<salt {}>", const_hex::encode(&self.0[..8]))
    }
}

impl Tagged for PrivacySalt {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("privacy-salt[v1]")
    }
}

impl Serializable for PrivacySalt {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        Serializable::serialize(&self.0, writer)
    }

    fn serialized_size(&self) -> usize {
        32
    }
}

impl Deserializable for PrivacySalt {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        let bytes = <[u8; 32] as Deserializable>::deserialize(reader, recursion_depth)?;
        Ok(PrivacySalt::new(bytes)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Serializable)]
#[tag = "notary-info[v1]"]
pub struct NotaryInfo {
    pub identity: Party,
    pub validating: bool,
}

/// The network-wide settings a transaction is verified against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Serializable)]
#[tag = "network-parameters[v1]"]
pub struct NetworkParameters {
    pub notaries: Vec<NotaryInfo>,
    pub whitelisted_contract_implementations: ContractWhitelist,
}

impl NetworkParameters {
    pub fn notary_info(&self, party: &Party) -> Option<&NotaryInfo> {
        self.notaries.iter().find(|notary| notary.identity == *party)
    }

    pub fn is_notary(&self, party: &Party) -> bool {
        self.notary_info(party).is_some()
    }
}

/// A revealed component together with the nonce that blinds it.
#[derive(Clone, Debug, PartialEq, Eq, Serializable)]
#[tag = "filtered-component[v1]"]
pub struct FilteredComponent {
    pub component: Vec<u8>,
    pub nonce: HashOutput,
}

impl FilteredComponent {
    pub fn component_hash(&self) -> HashOutput {
        component_hash(&self.component, &self.nonce)
    }
}

fn decode_component<T: Deserializable + Tagged>(
    group: ComponentGroup,
    bytes: &[u8],
) -> Result<T, MalformedTransaction> {
    tagged_deserialize(bytes).map_err(|e| MalformedTransaction::ComponentDecode {
        group,
        reason: e.to_string(),
    })
}

fn check_inputs(inputs: &[StateRef]) -> Result<(), MalformedTransaction> {
    if inputs.is_empty() {
        return Err(MalformedTransaction::EmptyInputs);
    }
    let mut seen = BTreeSet::new();
    for input in inputs {
        if !seen.insert(input) {
            return Err(MalformedTransaction::DuplicateInput(*input));
        }
    }
    Ok(())
}

/// A fully populated but unresolved contract upgrade transaction.
///
/// Components are kept exactly as they were serialized; the typed fields and
/// the id are decoded and computed once, on construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireTransaction {
    serialized_components: Vec<Vec<u8>>,
    privacy_salt: PrivacySalt,
    inputs: Vec<StateRef>,
    notary: Party,
    legacy_contract_attachment_id: AttachmentId,
    upgraded_contract_name: ContractName,
    upgraded_contract_attachment_id: AttachmentId,
    component_hashes: [HashOutput; COMPONENT_COUNT],
    id: TransactionId,
}

impl WireTransaction {
    pub fn new(
        serialized_components: Vec<Vec<u8>>,
        privacy_salt: PrivacySalt,
    ) -> Result<Self, MalformedTransaction> {
        if serialized_components.len() != COMPONENT_COUNT {
            return Err(MalformedTransaction::ComponentCount {
                expected: COMPONENT_COUNT,
                found: serialized_components.len(),
            });
        }
        let component = |group: ComponentGroup| &serialized_components[group.index() as usize][..];

        let inputs: Vec<StateRef> =
            decode_component(ComponentGroup::Inputs, component(ComponentGroup::Inputs))?;
        check_inputs(&inputs)?;
        let notary = decode_component(ComponentGroup::Notary, component(ComponentGroup::Notary))?;
        let legacy_contract_attachment_id = decode_component(
            ComponentGroup::LegacyAttachmentRef,
            component(ComponentGroup::LegacyAttachmentRef),
        )?;
        let upgraded_contract_name = decode_component(
            ComponentGroup::UpgradedContractName,
            component(ComponentGroup::UpgradedContractName),
        )?;
        let upgraded_contract_attachment_id = decode_component(
            ComponentGroup::UpgradedAttachmentRef,
            component(ComponentGroup::UpgradedAttachmentRef),
        )?;

        let component_hashes = ComponentGroup::ALL
            .map(|group| component_hash(component(group), &compute_nonce(&privacy_salt, group)));
        let id = transaction_id(&component_hashes);
        trace!(%id, inputs = inputs.len(), "decoded contract upgrade transaction");

        Ok(WireTransaction {
            serialized_components,
            privacy_salt,
            inputs,
            notary,
            legacy_contract_attachment_id,
            upgraded_contract_name,
            upgraded_contract_attachment_id,
            component_hashes,
            id,
        })
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn privacy_salt(&self) -> &PrivacySalt {
        &self.privacy_salt
    }

    pub fn serialized_components(&self) -> &[Vec<u8>] {
        &self.serialized_components
    }

    pub fn component(&self, group: ComponentGroup) -> &[u8] {
        &self.serialized_components[group.index() as usize]
    }

    pub fn nonce(&self, group: ComponentGroup) -> HashOutput {
        compute_nonce(&self.privacy_salt, group)
    }

    pub fn component_hash(&self, group: ComponentGroup) -> HashOutput {
        self.component_hashes[group.index() as usize]
    }

    pub fn inputs(&self) -> &[StateRef] {
        &self.inputs
    }

    pub fn notary(&self) -> &Party {
        &self.notary
    }

    pub fn legacy_contract_attachment_id(&self) -> AttachmentId {
        self.legacy_contract_attachment_id
    }

    pub fn upgraded_contract_name(&self) -> &ContractName {
        &self.upgraded_contract_name
    }

    pub fn upgraded_contract_attachment_id(&self) -> AttachmentId {
        self.upgraded_contract_attachment_id
    }

    /// Reveals the inputs and notary and nothing else.
    pub fn build_filtered_view(&self) -> FilteredTransaction {
        let mut visible_components = BTreeMap::new();
        let mut hidden_components = BTreeMap::new();
        for group in ComponentGroup::ALL {
            if group.is_visible() {
                visible_components.insert(
                    group,
                    FilteredComponent {
                        component: self.component(group).to_vec(),
                        nonce: self.nonce(group),
                    },
                );
            } else {
                hidden_components.insert(group, self.component_hash(group));
            }
        }
        debug!(id = %self.id, "built filtered view");
        FilteredTransaction {
            visible_components,
            hidden_components,
            inputs: self.inputs.clone(),
            notary: self.notary.clone(),
            id: self.id,
        }
    }

    /// What to send this transaction's notary, depending on whether the
    /// network lists it as validating.
    pub fn notarisation_payload(
        &self,
        parameters: &NetworkParameters,
    ) -> Result<NotarisationPayload, TransactionInvalid> {
        let info = parameters
            .notary_info(&self.notary)
            .ok_or_else(|| TransactionInvalid::NotaryNotWhitelisted(self.notary.clone()))?;
        if info.validating {
            Ok(NotarisationPayload::Full(self.clone()))
        } else {
            Ok(NotarisationPayload::Filtered(self.build_filtered_view()))
        }
    }
}

/// A transaction as disclosed to its notary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotarisationPayload {
    /// A validating notary resolves and verifies the whole transaction.
    Full(WireTransaction),
    /// A non-validating notary only checks the inputs it is asked to consume.
    Filtered(FilteredTransaction),
}

impl NotarisationPayload {
    pub fn id(&self) -> TransactionId {
        match self {
            NotarisationPayload::Full(tx) => tx.id(),
            NotarisationPayload::Filtered(tx) => tx.id(),
        }
    }
}

impl Tagged for WireTransaction {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("contract-upgrade-wire-transaction[v1]")
    }
}

impl Serializable for WireTransaction {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        Serializable::serialize(&self.serialized_components, writer)?;
        Serializable::serialize(&self.privacy_salt, writer)
    }

    fn serialized_size(&self) -> usize {
        self.serialized_components.serialized_size() + self.privacy_salt.serialized_size()
    }
}

impl Deserializable for WireTransaction {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let serialized_components =
            <Vec<Vec<u8>> as Deserializable>::deserialize(reader, recursion_depth)?;
        let privacy_salt = <PrivacySalt as Deserializable>::deserialize(reader, recursion_depth)?;
        Ok(WireTransaction::new(serialized_components, privacy_salt)?)
    }
}

/// A view of a contract upgrade transaction for parties that may only learn
/// which states it consumes and which notary orders it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilteredTransaction {
    visible_components: BTreeMap<ComponentGroup, FilteredComponent>,
    hidden_components: BTreeMap<ComponentGroup, HashOutput>,
    inputs: Vec<StateRef>,
    notary: Party,
    id: TransactionId,
}

impl FilteredTransaction {
    pub fn new(
        visible_components: BTreeMap<ComponentGroup, FilteredComponent>,
        hidden_components: BTreeMap<ComponentGroup, HashOutput>,
    ) -> Result<Self, MalformedTransaction> {
        let mut component_hashes = [BLANK_HASH; COMPONENT_COUNT];
        let mut missing = Vec::new();
        let mut overlapping = Vec::new();
        for group in ComponentGroup::ALL {
            let slot = &mut component_hashes[group.index() as usize];
            match (visible_components.get(&group), hidden_components.get(&group)) {
                (Some(_), Some(_)) => overlapping.push(group),
                (None, None) => missing.push(group),
                (Some(visible), None) => *slot = visible.component_hash(),
                (None, Some(hidden)) => *slot = *hidden,
            }
        }
        if !missing.is_empty() || !overlapping.is_empty() {
            return Err(MalformedTransaction::ComponentsNotPartitioned {
                missing,
                overlapping,
            });
        }
        if !visible_components.keys().copied().eq(ComponentGroup::VISIBLE) {
            return Err(MalformedTransaction::UnexpectedVisibleComponents(
                visible_components.keys().copied().collect(),
            ));
        }

        let visible = |group: ComponentGroup| {
            visible_components
                .get(&group)
                .map(|c| &c.component[..])
                .ok_or_else(|| {
                    MalformedTransaction::UnexpectedVisibleComponents(
                        visible_components.keys().copied().collect(),
                    )
                })
        };
        let inputs: Vec<StateRef> =
            decode_component(ComponentGroup::Inputs, visible(ComponentGroup::Inputs)?)?;
        check_inputs(&inputs)?;
        let notary = decode_component(ComponentGroup::Notary, visible(ComponentGroup::Notary)?)?;
        let id = transaction_id(&component_hashes);

        Ok(FilteredTransaction {
            visible_components,
            hidden_components,
            inputs,
            notary,
            id,
        })
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn inputs(&self) -> &[StateRef] {
        &self.inputs
    }

    pub fn notary(&self) -> &Party {
        &self.notary
    }

    pub fn visible_components(&self) -> &BTreeMap<ComponentGroup, FilteredComponent> {
        &self.visible_components
    }

    pub fn hidden_components(&self) -> &BTreeMap<ComponentGroup, HashOutput> {
        &self.hidden_components
    }
}

impl Tagged for FilteredTransaction {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("contract-upgrade-filtered-transaction[v1]")
    }
}

impl Serializable for FilteredTransaction {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        Serializable::serialize(&self.visible_components, writer)?;
        Serializable::serialize(&self.hidden_components, writer)
    }

    fn serialized_size(&self) -> usize {
        self.visible_components.serialized_size() + self.hidden_components.serialized_size()
    }
}

impl Deserializable for FilteredTransaction {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let visible_components: BTreeMap<ComponentGroup, FilteredComponent> =
            Deserializable::deserialize(reader, recursion_depth)?;
        let hidden_components: BTreeMap<ComponentGroup, HashOutput> =
            Deserializable::deserialize(reader, recursion_depth)?;
        Ok(FilteredTransaction::new(visible_components, hidden_components)?)
    }
}

/// A signature over a transaction id.
#[derive(Clone, Debug, PartialEq, Eq, Serializable)]
#[tag = "transaction-signature[v1]"]
pub struct TransactionSignature {
    pub by: VerifyingKey,
    pub signature: Signature,
}

impl TransactionSignature {
    pub fn sign<R: Rng + CryptoRng>(key: &SigningKey, rng: &mut R, id: &TransactionId) -> Self {
        TransactionSignature {
            by: key.verifying_key(),
            signature: key.sign(rng, &id.0.0),
        }
    }

    pub fn verify(&self, id: &TransactionId) -> bool {
        self.by.verify(&id.0.0, &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialize::tagged_vec;

    #[test]
    fn component_groups_follow_schema_order() {
        for (i, group) in ComponentGroup::ALL.into_iter().enumerate() {
            assert_eq!(group.index() as usize, i);
            assert_eq!(ComponentGroup::from_index(i as u32), Some(group));
        }
        assert_eq!(ComponentGroup::from_index(5), None);
    }

    #[test]
    fn component_group_encodes_as_its_index() {
        for group in ComponentGroup::ALL {
            let mut bytes = Vec::new();
            Serializable::serialize(&group, &mut bytes).unwrap();
            assert_eq!(bytes, vec![group.index() as u8]);
            let decoded = <ComponentGroup as Deserializable>::deserialize(&mut bytes.as_slice(), 0);
            assert_eq!(decoded.unwrap(), group);
        }
    }

    #[test]
    fn unknown_component_group_rejected() {
        let mut bytes = Vec::new();
        Serializable::serialize(&9u8, &mut bytes).unwrap();
        let result = <ComponentGroup as Deserializable>::deserialize(&mut bytes.as_slice(), 0);
        assert!(result.is_err());
    }

    #[test]
    fn zero_salt_rejected() {
        assert_eq!(
            PrivacySalt::new([0u8; 32]),
            Err(MalformedTransaction::ZeroPrivacySalt)
        );
        let mut bytes = tagged_vec(&PrivacySalt::new([1u8; 32]).unwrap());
        let len = bytes.len();
        bytes[len - 32..].fill(0);
        assert!(tagged_deserialize::<PrivacySalt>(bytes.as_slice()).is_err());
    }

    #[test]
    fn wrong_component_count_rejected() {
        let salt = PrivacySalt::new([1u8; 32]).unwrap();
        assert_eq!(
            WireTransaction::new(vec![Vec::new(); 4], salt),
            Err(MalformedTransaction::ComponentCount {
                expected: 5,
                found: 4
            })
        );
    }

    #[test]
    fn undecodable_component_reported_by_group() {
        let salt = PrivacySalt::new([1u8; 32]).unwrap();
        match WireTransaction::new(vec![b"junk".to_vec(); 5], salt) {
            Err(MalformedTransaction::ComponentDecode { group, .. }) => {
                assert_eq!(group, ComponentGroup::Inputs)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
