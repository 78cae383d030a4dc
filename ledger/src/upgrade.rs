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

//! Contract upgrade capabilities.
//!
//! An upgraded contract names the contract it replaces and knows how to
//! translate that contract's states. Capabilities are registered explicitly,
//! by upgraded contract name, in a [`ContractRegistry`].

use state_structure::constraint::AttachmentConstraint;
use state_structure::state::{ContractName, ContractState};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub trait UpgradedContract: Send + Sync {
    /// The contract whose states this contract upgrades.
    fn legacy_contract(&self) -> &ContractName;

    /// The constraint the legacy contract attachment must satisfy for the
    /// upgrade to be allowed. Without one, the legacy attachment must be
    /// whitelisted by the zone.
    fn legacy_contract_constraint(&self) -> Option<AttachmentConstraint> {
        None
    }

    /// Translates a legacy state into a state of this contract.
    fn upgrade(&self, state: &ContractState) -> anyhow::Result<ContractState>;
}

#[derive(Clone, Default)]
pub struct ContractRegistry {
    contracts: BTreeMap<ContractName, Arc<dyn UpgradedContract>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: ContractName, contract: Arc<dyn UpgradedContract>) {
        if self.contracts.insert(name.clone(), contract).is_some() {
            debug!(%name, "replaced registered upgrade");
        }
    }

    pub fn with(
        mut self,
        name: impl Into<ContractName>,
        contract: impl UpgradedContract + 'static,
    ) -> Self {
        self.register(name.into(), Arc::new(contract));
        self
    }

    pub fn get(&self, name: &ContractName) -> Option<&Arc<dyn UpgradedContract>> {
        self.contracts.get(name)
    }
}

impl Debug for ContractRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.contracts
                    .iter()
                    .map(|(name, contract)| (name, contract.legacy_contract())),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rename(ContractName);

    impl UpgradedContract for Rename {
        fn legacy_contract(&self) -> &ContractName {
            &self.0
        }

        fn upgrade(&self, state: &ContractState) -> anyhow::Result<ContractState> {
            Ok(state.clone())
        }
    }

    #[test]
    fn registry_looks_up_by_upgraded_name() {
        let registry = ContractRegistry::new().with("B", Rename("A".into()));
        let contract = registry.get(&"B".into()).unwrap();
        assert_eq!(contract.legacy_contract(), &ContractName::from("A"));
        assert_eq!(contract.legacy_contract_constraint(), None);
        assert!(registry.get(&"A".into()).is_none());
    }

    #[test]
    fn later_registration_wins() {
        let registry = ContractRegistry::new()
            .with("B", Rename("A".into()))
            .with("B", Rename("Z".into()));
        assert_eq!(
            registry.get(&"B".into()).unwrap().legacy_contract(),
            &ContractName::from("Z")
        );
        assert_eq!(format!("{registry:?}"), r#"{ContractName("B"): ContractName("Z")}"#);
    }
}
