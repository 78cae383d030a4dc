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
// Proptest derive triggers this.
#![allow(non_local_definitions)]

//! The ledger data formats that contract upgrade transactions consume and
//! produce: references to prior transaction outputs, the states behind them,
//! the attachments that carry contract code, and the constraints tying the
//! two together.

pub mod attachment;
pub mod constraint;
pub mod state;
