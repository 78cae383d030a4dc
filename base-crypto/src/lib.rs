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

#![deny(unreachable_pub)]
//#![deny(warnings)]
#![deny(missing_docs)]
// Proptest derive triggers this.
#![allow(non_local_definitions)]

//! This crate collects the cryptographic primitives used by contract upgrade
//! transactions: the long-term SHA-256 hash and its derived constructions,
//! and the Schnorr signature scheme used for transaction signing keys.

pub mod hash;
pub mod signatures;
