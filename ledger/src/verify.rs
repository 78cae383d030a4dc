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

use crate::error::{ConstraintViolation, MalformedTransaction, SignatureError, TransactionInvalid};
use crate::structure::{NetworkParameters, PrivacySalt, TransactionSignature};
use crate::upgrade::{ContractRegistry, UpgradedContract};
use base_crypto::signatures::VerifyingKey;
use state_structure::attachment::{Attachment, AttachmentContext};
use state_structure::constraint::AttachmentConstraint;
use state_structure::state::{ContractName, Party, StateAndRef, TransactionId, TransactionState};
use std::collections::BTreeSet;

/// Everything a contract upgrade transaction refers to, looked up but not yet
/// checked.
#[derive(Clone, Debug)]
pub struct ResolvedComponents {
    pub inputs: Vec<StateAndRef>,
    pub notary: Party,
    pub legacy_contract_attachment: Attachment,
    pub upgraded_contract_name: ContractName,
    pub upgraded_contract_attachment: Attachment,
    pub id: TransactionId,
    pub privacy_salt: PrivacySalt,
    pub signatures: Vec<TransactionSignature>,
    pub network_parameters: NetworkParameters,
}

/// A resolved contract upgrade transaction. Holding one means every upgrade
/// rule has been checked and the output states have been computed.
#[derive(Clone, Debug)]
pub struct LedgerTransaction {
    inputs: Vec<StateAndRef>,
    notary: Party,
    legacy_contract_attachment: Attachment,
    upgraded_contract_name: ContractName,
    upgraded_contract_attachment: Attachment,
    id: TransactionId,
    privacy_salt: PrivacySalt,
    signatures: Vec<TransactionSignature>,
    network_parameters: NetworkParameters,
    outputs: Vec<TransactionState>,
}

impl LedgerTransaction {
    pub fn new(
        resolved: ResolvedComponents,
        registry: &ContractRegistry,
    ) -> Result<Self, TransactionInvalid> {
        let outputs = verify_upgrade(&resolved, registry).inspect_err(|err| {
            warn!(id = %resolved.id, %err, "rejected contract upgrade transaction")
        })?;
        debug!(id = %resolved.id, outputs = outputs.len(), "verified contract upgrade transaction");
        let ResolvedComponents {
            inputs,
            notary,
            legacy_contract_attachment,
            upgraded_contract_name,
            upgraded_contract_attachment,
            id,
            privacy_salt,
            signatures,
            network_parameters,
        } = resolved;
        Ok(LedgerTransaction {
            inputs,
            notary,
            legacy_contract_attachment,
            upgraded_contract_name,
            upgraded_contract_attachment,
            id,
            privacy_salt,
            signatures,
            network_parameters,
            outputs,
        })
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn inputs(&self) -> &[StateAndRef] {
        &self.inputs
    }

    /// The upgraded states, one per input and in input order.
    pub fn outputs(&self) -> &[TransactionState] {
        &self.outputs
    }

    pub fn notary(&self) -> &Party {
        &self.notary
    }

    pub fn legacy_contract_attachment(&self) -> &Attachment {
        &self.legacy_contract_attachment
    }

    pub fn upgraded_contract_name(&self) -> &ContractName {
        &self.upgraded_contract_name
    }

    pub fn upgraded_contract_attachment(&self) -> &Attachment {
        &self.upgraded_contract_attachment
    }

    pub fn privacy_salt(&self) -> &PrivacySalt {
        &self.privacy_salt
    }

    pub fn signatures(&self) -> &[TransactionSignature] {
        &self.signatures
    }

    pub fn network_parameters(&self) -> &NetworkParameters {
        &self.network_parameters
    }

    /// The owning keys of every participant of every input, and the notary's.
    pub fn required_signing_keys(&self) -> BTreeSet<VerifyingKey> {
        self.inputs
            .iter()
            .flat_map(|input| input.state.data.participants.iter())
            .chain(std::iter::once(&self.notary))
            .map(|party| party.owning_key.clone())
            .collect()
    }

    pub fn verify_signatures(&self) -> Result<(), SignatureError> {
        self.verify_signatures_except(&BTreeSet::new())
    }

    /// Checks every collected signature, and that each required key has
    /// signed unless it is in `allowed_to_be_missing`.
    pub fn verify_signatures_except(
        &self,
        allowed_to_be_missing: &BTreeSet<VerifyingKey>,
    ) -> Result<(), SignatureError> {
        let mut signed = BTreeSet::new();
        for signature in &self.signatures {
            if !signature.verify(&self.id) {
                return Err(SignatureError::InvalidSignature(signature.by.clone()));
            }
            signed.insert(signature.by.clone());
        }
        let missing: BTreeSet<_> = self
            .required_signing_keys()
            .into_iter()
            .filter(|key| !signed.contains(key) && !allowed_to_be_missing.contains(key))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SignatureError::MissingSignatures(missing))
        }
    }
}

fn verify_upgrade(
    resolved: &ResolvedComponents,
    registry: &ContractRegistry,
) -> Result<Vec<TransactionState>, TransactionInvalid> {
    if !resolved.network_parameters.is_notary(&resolved.notary) {
        return Err(TransactionInvalid::NotaryNotWhitelisted(resolved.notary.clone()));
    }

    let legacy_contract = &resolved
        .inputs
        .first()
        .ok_or(MalformedTransaction::EmptyInputs)?
        .state
        .contract;
    if let Some(stray) = resolved
        .inputs
        .iter()
        .find(|input| input.state.contract != *legacy_contract)
    {
        return Err(TransactionInvalid::HeterogeneousInputs {
            input: stray.reference,
            expected: legacy_contract.clone(),
            found: stray.state.contract.clone(),
        });
    }

    let upgraded_contract = registry
        .get(&resolved.upgraded_contract_name)
        .ok_or_else(|| {
            TransactionInvalid::UnknownUpgradedContract(resolved.upgraded_contract_name.clone())
        })?;
    if upgraded_contract.legacy_contract() != legacy_contract {
        return Err(TransactionInvalid::ContractLineageMismatch {
            upgraded_contract: resolved.upgraded_contract_name.clone(),
            declared_legacy: upgraded_contract.legacy_contract().clone(),
            input_contract: legacy_contract.clone(),
        });
    }

    let context = AttachmentContext::new(
        &resolved.legacy_contract_attachment,
        legacy_contract,
        &resolved.network_parameters.whitelisted_contract_implementations,
    );
    for input in &resolved.inputs {
        if !input.state.constraint.is_satisfied_by(&context) {
            return Err(ConstraintViolation::LegacyAttachmentRejected {
                input: input.reference,
                constraint: input.state.constraint.clone(),
                attachment: context.id(),
            }
            .into());
        }
    }
    let prerequisite = upgraded_contract
        .legacy_contract_constraint()
        .unwrap_or(AttachmentConstraint::WhitelistedByZone);
    if !prerequisite.is_satisfied_by(&context) {
        return Err(ConstraintViolation::UpgradePrerequisiteUnmet {
            upgraded_contract: resolved.upgraded_contract_name.clone(),
            constraint: prerequisite,
            attachment: context.id(),
        }
        .into());
    }

    resolved
        .inputs
        .iter()
        .map(|input| upgrade_state(input, &**upgraded_contract, resolved))
        .collect()
}

fn upgrade_state(
    input: &StateAndRef,
    upgraded_contract: &dyn UpgradedContract,
    resolved: &ResolvedComponents,
) -> Result<TransactionState, TransactionInvalid> {
    let data = upgraded_contract
        .upgrade(&input.state.data)
        .map_err(|err| TransactionInvalid::UpgradeFailed {
            input: input.reference,
            reason: format!("{err:#}"),
        })?;
    let constraint = match &input.state.constraint {
        AttachmentConstraint::HashPinned(_) => {
            AttachmentConstraint::HashPinned(resolved.upgraded_contract_attachment.id())
        }
        AttachmentConstraint::WhitelistedByZone => AttachmentConstraint::WhitelistedByZone,
        unsupported @ (AttachmentConstraint::AlwaysAccept | AttachmentConstraint::Signature(_)) => {
            return Err(TransactionInvalid::UnsupportedConstraintKind {
                input: input.reference,
                constraint: unsupported.clone(),
            });
        }
    };
    trace!(input = %input.reference, %constraint, "upgraded state");
    Ok(TransactionState {
        data,
        contract: resolved.upgraded_contract_name.clone(),
        notary: input.state.notary.clone(),
        encumbrance: input.state.encumbrance,
        constraint,
    })
}
