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

use rand::SeedableRng;
use rand::rngs::StdRng;
use serialize::{tagged_deserialize, tagged_vec};
use state_structure::state::ContractName;
use upgrade_ledger::structure::NetworkParameters;
use upgrade_ledger::test_utilities::{LEGACY_CASH, UpgradeFixture};

#[test]
fn network_parameters_load_from_json() {
    let mut rng = StdRng::seed_from_u64(0x42);
    let fixture = UpgradeFixture::new(&mut rng);
    let parameters = &fixture.resolver.network_parameters;

    let json = serde_json::to_value(parameters).unwrap();
    assert_eq!(json["notaries"][0]["identity"]["name"], "Notary");
    assert_eq!(json["notaries"][0]["validating"], true);
    assert!(json["whitelisted_contract_implementations"][LEGACY_CASH].is_array());

    let loaded: NetworkParameters = serde_json::from_str(&json.to_string()).unwrap();
    assert_eq!(&loaded, parameters);
    assert!(loaded.is_notary(&fixture.notary));
    assert!(!loaded.is_notary(&fixture.owner));
    assert!(loaded.notary_info(&fixture.notary).unwrap().validating);
    assert_eq!(loaded.notary_info(&fixture.owner), None);
    assert_eq!(
        loaded.whitelisted_contract_implementations[&ContractName::from(LEGACY_CASH)],
        vec![fixture.legacy_attachment.id()]
    );
}

#[test]
fn network_parameters_have_a_binary_encoding() {
    let mut rng = StdRng::seed_from_u64(0x42);
    let fixture = UpgradeFixture::new(&mut rng);
    let bytes = tagged_vec(&fixture.resolver.network_parameters);
    assert!(bytes.starts_with(b"upgrade:network-parameters[v1]:"));
    let decoded: NetworkParameters = tagged_deserialize(&bytes[..]).unwrap();
    assert_eq!(decoded, fixture.resolver.network_parameters);
}
