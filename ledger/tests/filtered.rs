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

use base_crypto::hash::HashOutput;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serialize::{GLOBAL_TAG, Serializable, Tagged, tagged_deserialize, tagged_vec};
use state_structure::constraint::AttachmentConstraint;
use upgrade_ledger::error::{MalformedTransaction, TransactionInvalid};
use upgrade_ledger::structure::{
    ComponentGroup, FilteredTransaction, NotarisationPayload, PrivacySalt, WireTransaction,
};
use upgrade_ledger::test_utilities::UpgradeFixture;

fn wire_tx(inputs: usize) -> WireTransaction {
    let mut rng = StdRng::seed_from_u64(0x42);
    let mut fixture = UpgradeFixture::new(&mut rng);
    let states: Vec<_> = (0..inputs)
        .map(|i| fixture.issue(&mut rng, i as u64, AttachmentConstraint::WhitelistedByZone))
        .collect();
    fixture
        .upgrade_to_cash_v2(&states)
        .unwrap()
        .assemble(&mut rng)
        .unwrap()
}

#[test]
fn filtered_view_reveals_only_inputs_and_notary() {
    let tx = wire_tx(2);
    let filtered = tx.build_filtered_view();

    assert_eq!(filtered.id(), tx.id());
    assert_eq!(filtered.inputs(), tx.inputs());
    assert_eq!(filtered.notary(), tx.notary());
    assert_eq!(
        filtered.visible_components().keys().copied().collect::<Vec<_>>(),
        vec![ComponentGroup::Inputs, ComponentGroup::Notary]
    );
    assert_eq!(
        filtered.hidden_components().keys().copied().collect::<Vec<_>>(),
        vec![
            ComponentGroup::LegacyAttachmentRef,
            ComponentGroup::UpgradedContractName,
            ComponentGroup::UpgradedAttachmentRef,
        ]
    );
    for (group, visible) in filtered.visible_components() {
        assert_eq!(visible.component, tx.component(*group));
        assert_eq!(visible.nonce, tx.nonce(*group));
    }
    for (group, hash) in filtered.hidden_components() {
        assert_eq!(*hash, tx.component_hash(*group));
    }
}

#[test]
fn filtered_transaction_survives_serialization() {
    let filtered = wire_tx(3).build_filtered_view();
    let decoded: FilteredTransaction =
        tagged_deserialize(&tagged_vec(&filtered)[..]).unwrap();
    assert_eq!(decoded, filtered);
}

#[test]
fn tampered_hidden_hash_changes_id() {
    let mut rng = StdRng::seed_from_u64(0x42);
    let filtered = wire_tx(1).build_filtered_view();
    let mut hidden = filtered.hidden_components().clone();
    hidden.insert(ComponentGroup::UpgradedContractName, HashOutput(rng.r#gen()));
    let tampered =
        FilteredTransaction::new(filtered.visible_components().clone(), hidden).unwrap();
    assert_ne!(tampered.id(), filtered.id());
}

#[test]
fn filtered_components_must_partition_the_schema() {
    let filtered = wire_tx(1).build_filtered_view();
    let visible = filtered.visible_components().clone();

    let mut gap = filtered.hidden_components().clone();
    gap.remove(&ComponentGroup::UpgradedAttachmentRef);
    assert_eq!(
        FilteredTransaction::new(visible.clone(), gap),
        Err(MalformedTransaction::ComponentsNotPartitioned {
            missing: vec![ComponentGroup::UpgradedAttachmentRef],
            overlapping: vec![],
        })
    );

    let mut overlap = filtered.hidden_components().clone();
    overlap.insert(ComponentGroup::Notary, HashOutput([1; 32]));
    assert_eq!(
        FilteredTransaction::new(visible, overlap),
        Err(MalformedTransaction::ComponentsNotPartitioned {
            missing: vec![],
            overlapping: vec![ComponentGroup::Notary],
        })
    );
}

#[test]
fn notary_cannot_be_hidden() {
    let tx = wire_tx(1);
    let filtered = tx.build_filtered_view();
    let mut visible = filtered.visible_components().clone();
    let mut hidden = filtered.hidden_components().clone();
    visible.remove(&ComponentGroup::Notary);
    hidden.insert(
        ComponentGroup::Notary,
        tx.component_hash(ComponentGroup::Notary),
    );
    assert_eq!(
        FilteredTransaction::new(visible, hidden),
        Err(MalformedTransaction::UnexpectedVisibleComponents(vec![
            ComponentGroup::Inputs
        ]))
    );
}

#[test]
fn wire_transaction_decoding_revalidates() {
    let tx = wire_tx(2);
    let decoded: WireTransaction = tagged_deserialize(&tagged_vec(&tx)[..]).unwrap();
    assert_eq!(decoded.id(), tx.id());

    // The same encoding with the inputs component replaced by an empty list.
    let mut components = tx.serialized_components().to_vec();
    components[0] = tagged_vec(&Vec::<state_structure::state::StateRef>::new());
    let mut bytes = format!("{GLOBAL_TAG}{}:", WireTransaction::tag()).into_bytes();
    components.serialize(&mut bytes).unwrap();
    tx.privacy_salt().serialize(&mut bytes).unwrap();
    let err = tagged_deserialize::<WireTransaction>(&bytes[..]).unwrap_err();
    assert!(err.to_string().contains("at least one input"), "{err}");

    assert_eq!(
        WireTransaction::new(components, *tx.privacy_salt()),
        Err(MalformedTransaction::EmptyInputs)
    );
}

#[test]
fn components_are_hashed_as_given() {
    let tx = wire_tx(1);
    let salt = PrivacySalt::new([9; 32]).unwrap();
    let rebuilt = WireTransaction::new(tx.serialized_components().to_vec(), *tx.privacy_salt())
        .unwrap();
    let resalted = WireTransaction::new(tx.serialized_components().to_vec(), salt).unwrap();
    assert_eq!(rebuilt.id(), tx.id());
    assert_ne!(resalted.id(), tx.id());
    assert_eq!(resalted.build_filtered_view().id(), resalted.id());
}

#[test]
fn notary_validation_mode_picks_the_payload() {
    let mut rng = StdRng::seed_from_u64(0x42);
    let mut fixture = UpgradeFixture::new(&mut rng);
    let state = fixture.issue(&mut rng, 10, AttachmentConstraint::WhitelistedByZone);
    let tx = fixture
        .upgrade_to_cash_v2(&[state])
        .unwrap()
        .assemble(&mut rng)
        .unwrap();

    let mut parameters = fixture.resolver.network_parameters.clone();
    assert_eq!(
        tx.notarisation_payload(&parameters).unwrap(),
        NotarisationPayload::Full(tx.clone())
    );

    parameters.notaries[0].validating = false;
    let payload = tx.notarisation_payload(&parameters).unwrap();
    assert_eq!(payload, NotarisationPayload::Filtered(tx.build_filtered_view()));
    assert_eq!(payload.id(), tx.id());

    parameters.notaries.clear();
    assert_eq!(
        tx.notarisation_payload(&parameters),
        Err(TransactionInvalid::NotaryNotWhitelisted(tx.notary().clone()))
    );
}
