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

use upgrade_ledger::structure::{FilteredTransaction, NotarisationPayload, WireTransaction};
use upgrade_ledger::upgrade::ContractRegistry;
use upgrade_ledger::verify::LedgerTransaction;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn transactions_are_send_and_sync() {
    assert_send_sync::<WireTransaction>();
    assert_send_sync::<FilteredTransaction>();
    assert_send_sync::<LedgerTransaction>();
    assert_send_sync::<NotarisationPayload>();
    assert_send_sync::<ContractRegistry>();
}
