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

use crate::error::ResolutionError;
use crate::structure::{NetworkParameters, TransactionSignature, WireTransaction};
use crate::upgrade::ContractRegistry;
use crate::verify::{LedgerTransaction, ResolvedComponents};
use state_structure::attachment::{Attachment, AttachmentId};
use state_structure::state::{StateAndRef, StateRef};
use std::collections::{BTreeMap, BTreeSet};
use std::io;

/// Looks up the ledger data a transaction refers to.
#[allow(async_fn_in_trait)]
pub trait ResolutionService {
    /// Returns the states known for `refs`, in any order. Unknown references
    /// are omitted rather than reported.
    async fn load_states(&self, refs: &BTreeSet<StateRef>) -> io::Result<Vec<StateAndRef>>;

    async fn open_attachment(&self, id: AttachmentId) -> io::Result<Option<Attachment>>;

    fn network_parameters(&self) -> NetworkParameters;
}

impl WireTransaction {
    /// Looks up everything this transaction refers to, then verifies it.
    #[instrument(skip_all, fields(id = %self.id()))]
    pub async fn resolve(
        &self,
        resolution_service: &impl ResolutionService,
        contract_registry: &ContractRegistry,
        signatures: Vec<TransactionSignature>,
    ) -> Result<LedgerTransaction, ResolutionError> {
        let resolved = self.resolve_components(resolution_service, signatures).await?;
        Ok(LedgerTransaction::new(resolved, contract_registry)?)
    }

    /// Performs the lookups of [`WireTransaction::resolve`] without verifying.
    pub async fn resolve_components(
        &self,
        resolution_service: &impl ResolutionService,
        signatures: Vec<TransactionSignature>,
    ) -> Result<ResolvedComponents, ResolutionError> {
        let refs: BTreeSet<StateRef> = self.inputs().iter().copied().collect();
        let (states, legacy_contract_attachment, upgraded_contract_attachment) = futures::join!(
            resolution_service.load_states(&refs),
            open_attachment(resolution_service, self.legacy_contract_attachment_id()),
            open_attachment(resolution_service, self.upgraded_contract_attachment_id()),
        );

        let mut by_ref: BTreeMap<StateRef, StateAndRef> = states?
            .into_iter()
            .map(|state| (state.reference, state))
            .collect();
        let inputs = self
            .inputs()
            .iter()
            .map(|input| {
                by_ref
                    .remove(input)
                    .ok_or(ResolutionError::UnresolvedInput(*input))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let legacy_contract_attachment = legacy_contract_attachment?;
        let upgraded_contract_attachment = upgraded_contract_attachment?;
        debug!(inputs = inputs.len(), "resolved transaction components");

        Ok(ResolvedComponents {
            inputs,
            notary: self.notary().clone(),
            legacy_contract_attachment,
            upgraded_contract_name: self.upgraded_contract_name().clone(),
            upgraded_contract_attachment,
            id: self.id(),
            privacy_salt: *self.privacy_salt(),
            signatures,
            network_parameters: resolution_service.network_parameters(),
        })
    }
}

async fn open_attachment(
    resolution_service: &impl ResolutionService,
    id: AttachmentId,
) -> Result<Attachment, ResolutionError> {
    resolution_service
        .open_attachment(id)
        .await?
        .ok_or(ResolutionError::AttachmentResolution(id))
}
