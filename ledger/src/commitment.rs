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

//! The identifier commitment.
//!
//! Every component is blinded with a nonce derived from the transaction's
//! privacy salt and its index, hashed twice, and the five resulting hashes
//! are folded left to right into the transaction id. A filtered view that
//! only knows some component hashes arrives at the same id.

use crate::structure::{COMPONENT_COUNT, ComponentGroup, PrivacySalt};
use base_crypto::hash::{HashOutput, PersistentHashWriter, hash_concat};
use state_structure::state::TransactionId;

/// `SHA256(BE32(index) ++ salt)`.
pub fn compute_nonce(privacy_salt: &PrivacySalt, group: ComponentGroup) -> HashOutput {
    let mut writer = PersistentHashWriter::new();
    writer.update(&group.index().to_be_bytes());
    writer.update(privacy_salt.as_bytes());
    writer.finalize()
}

/// `SHA256(SHA256(component ++ nonce))`.
pub fn component_hash(component: &[u8], nonce: &HashOutput) -> HashOutput {
    let mut writer = PersistentHashWriter::new();
    writer.update(component);
    writer.update(&nonce.0);
    writer.finalize_twice()
}

/// Folds the component hashes, given in component order, into the id.
pub fn transaction_id(component_hashes: &[HashOutput; COMPONENT_COUNT]) -> TransactionId {
    let id = component_hashes[1..]
        .iter()
        .fold(component_hashes[0], |acc, hash| hash_concat(&acc, hash));
    TransactionId(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base_crypto::hash::{persistent_hash, persistent_hash_twice};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn salt() -> PrivacySalt {
        PrivacySalt::new([7u8; 32]).unwrap()
    }

    #[test]
    fn nonce_is_hash_of_big_endian_index_and_salt() {
        let mut preimage = vec![0, 0, 0, 3];
        preimage.extend_from_slice(&[7u8; 32]);
        assert_eq!(
            compute_nonce(&salt(), ComponentGroup::UpgradedContractName),
            persistent_hash(&preimage)
        );
    }

    #[test]
    fn nonces_differ_per_index() {
        let nonces = ComponentGroup::ALL.map(|group| compute_nonce(&salt(), group));
        for (i, a) in nonces.iter().enumerate() {
            for b in &nonces[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn component_hash_is_double_sha256() {
        let nonce = compute_nonce(&salt(), ComponentGroup::Inputs);
        let mut preimage = b"component".to_vec();
        preimage.extend_from_slice(&nonce.0);
        assert_eq!(
            component_hash(b"component", &nonce),
            persistent_hash_twice(&preimage)
        );
    }

    #[test]
    fn id_folds_in_component_order() {
        let mut rng = StdRng::seed_from_u64(0x42);
        let hashes: [HashOutput; COMPONENT_COUNT] = rng.r#gen();
        let expected = hash_concat(
            &hash_concat(
                &hash_concat(&hash_concat(&hashes[0], &hashes[1]), &hashes[2]),
                &hashes[3],
            ),
            &hashes[4],
        );
        assert_eq!(transaction_id(&hashes), TransactionId(expected));

        let mut swapped = hashes;
        swapped.swap(0, 1);
        assert_ne!(transaction_id(&swapped), transaction_id(&hashes));
    }
}
