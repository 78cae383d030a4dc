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

//! This crate implements contract upgrade transactions: their wire and
//! filtered forms, the identifier commitment shared by both, and resolution
//! into a verified ledger transaction.

#[macro_use]
extern crate tracing;

pub mod commitment;
pub mod construct;
pub mod error;
#[path = "tracing.rs"]
mod ledger_tracing;
pub mod resolve;
pub mod structure;
pub mod upgrade;
pub mod verify;

pub use ledger_tracing::{LogLevel, init_logger};

#[cfg(feature = "test-utilities")]
pub mod test_utilities;
