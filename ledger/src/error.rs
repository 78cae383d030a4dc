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

use crate::structure::ComponentGroup;
use base_crypto::signatures::VerifyingKey;
use state_structure::attachment::AttachmentId;
use state_structure::constraint::AttachmentConstraint;
use state_structure::state::{ContractName, Party, StateRef};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

/// A transaction whose shape is invalid before anything is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedTransaction {
    EmptyInputs,
    DuplicateInput(StateRef),
    ComponentCount {
        expected: usize,
        found: usize,
    },
    ComponentDecode {
        group: ComponentGroup,
        reason: String,
    },
    ZeroPrivacySalt,
    ComponentsNotPartitioned {
        missing: Vec<ComponentGroup>,
        overlapping: Vec<ComponentGroup>,
    },
    UnexpectedVisibleComponents(Vec<ComponentGroup>),
}

impl Display for MalformedTransaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use MalformedTransaction::*;
        match self {
            EmptyInputs => write!(f, "a contract upgrade transaction must have at least one input"),
            DuplicateInput(input) => write!(f, "input {input} is spent more than once"),
            ComponentCount { expected, found } => write!(
                f,
                "expected {expected} serialized components, but found {found}"
            ),
            ComponentDecode { group, reason } => {
                write!(f, "failed to decode the {group} component: {reason}")
            }
            ZeroPrivacySalt => write!(f, "the privacy salt must not be all zero bytes"),
            ComponentsNotPartitioned {
                missing,
                overlapping,
            } => write!(
                f,
                "visible and hidden components must partition the component groups (missing: {missing:?}, both visible and hidden: {overlapping:?})"
            ),
            UnexpectedVisibleComponents(visible) => write!(
                f,
                "a filtered transaction must reveal exactly the inputs and notary, but revealed {visible:?}"
            ),
        }
    }
}

impl Error for MalformedTransaction {}

impl From<MalformedTransaction> for io::Error {
    fn from(err: MalformedTransaction) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// An input's own constraint rejects the legacy attachment.
    LegacyAttachmentRejected {
        input: StateRef,
        constraint: AttachmentConstraint,
        attachment: AttachmentId,
    },
    /// The upgraded contract's precondition on the legacy attachment is not met.
    UpgradePrerequisiteUnmet {
        upgraded_contract: ContractName,
        constraint: AttachmentConstraint,
        attachment: AttachmentId,
    },
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintViolation::LegacyAttachmentRejected {
                input,
                constraint,
                attachment,
            } => write!(
                f,
                "legacy contract attachment {attachment} does not satisfy the {constraint} constraint of input {input}"
            ),
            ConstraintViolation::UpgradePrerequisiteUnmet {
                upgraded_contract,
                constraint,
                attachment,
            } => write!(
                f,
                "legacy contract attachment {attachment} does not satisfy the {constraint} constraint required by upgraded contract {upgraded_contract}"
            ),
        }
    }
}

impl Error for ConstraintViolation {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionInvalid {
    Malformed(MalformedTransaction),
    NotaryNotWhitelisted(Party),
    HeterogeneousInputs {
        input: StateRef,
        expected: ContractName,
        found: ContractName,
    },
    UnknownUpgradedContract(ContractName),
    ContractLineageMismatch {
        upgraded_contract: ContractName,
        declared_legacy: ContractName,
        input_contract: ContractName,
    },
    ConstraintViolation(ConstraintViolation),
    UnsupportedConstraintKind {
        input: StateRef,
        constraint: AttachmentConstraint,
    },
    UpgradeFailed {
        input: StateRef,
        reason: String,
    },
}

impl Display for TransactionInvalid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use TransactionInvalid::*;
        match self {
            Malformed(err) => write!(f, "malformed transaction: {err}"),
            NotaryNotWhitelisted(notary) => {
                write!(f, "notary {notary} is not in the network parameters")
            }
            HeterogeneousInputs {
                input,
                expected,
                found,
            } => write!(
                f,
                "all inputs must belong to the same contract; expected {expected}, but input {input} belongs to {found}"
            ),
            UnknownUpgradedContract(name) => {
                write!(f, "no upgrade is registered for contract {name}")
            }
            ContractLineageMismatch {
                upgraded_contract,
                declared_legacy,
                input_contract,
            } => write!(
                f,
                "{upgraded_contract} upgrades {declared_legacy}, but the inputs belong to {input_contract}"
            ),
            ConstraintViolation(err) => write!(f, "constraint violation: {err}"),
            UnsupportedConstraintKind { input, constraint } => write!(
                f,
                "cannot carry the {} constraint of input {input} over to the upgraded contract",
                constraint.kind()
            ),
            UpgradeFailed { input, reason } => {
                write!(f, "failed to upgrade the state of input {input}: {reason}")
            }
        }
    }
}

impl Error for TransactionInvalid {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransactionInvalid::Malformed(err) => Some(err),
            TransactionInvalid::ConstraintViolation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MalformedTransaction> for TransactionInvalid {
    fn from(err: MalformedTransaction) -> Self {
        TransactionInvalid::Malformed(err)
    }
}

impl From<ConstraintViolation> for TransactionInvalid {
    fn from(err: ConstraintViolation) -> Self {
        TransactionInvalid::ConstraintViolation(err)
    }
}

#[derive(Debug)]
pub enum ResolutionError {
    UnresolvedInput(StateRef),
    AttachmentResolution(AttachmentId),
    Io(io::Error),
    Invalid(TransactionInvalid),
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionError::UnresolvedInput(input) => {
                write!(f, "input state {input} could not be resolved")
            }
            ResolutionError::AttachmentResolution(id) => {
                write!(f, "attachment {id} could not be resolved")
            }
            ResolutionError::Io(err) => write!(f, "resolution service failure: {err}"),
            ResolutionError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolutionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ResolutionError::Io(err) => Some(err),
            ResolutionError::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ResolutionError {
    fn from(err: io::Error) -> Self {
        ResolutionError::Io(err)
    }
}

impl From<TransactionInvalid> for ResolutionError {
    fn from(err: TransactionInvalid) -> Self {
        ResolutionError::Invalid(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    InvalidSignature(VerifyingKey),
    MissingSignatures(BTreeSet<VerifyingKey>),
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::InvalidSignature(key) => {
                write!(f, "signature by {key:?} does not verify against the transaction id")
            }
            SignatureError::MissingSignatures(keys) => {
                write!(f, "missing signatures from: {keys:?}")
            }
        }
    }
}

impl Error for SignatureError {}
