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

//! A small, canonical binary codec.
//!
//! Every value has exactly one encoding: integers are fixed-width little
//! endian, collections are length-prefixed, and ordered collections must be
//! written (and are only accepted) in ascending key order. This matters
//! because transaction components are hashed as the bytes they were encoded
//! to, and a decoder that accepted two encodings for one value would make the
//! identifier of a transaction depend on who encoded it.

mod deserializable;
mod serializable;
mod tagged;
mod util;

pub use crate::deserializable::{Deserializable, RECURSION_LIMIT, tagged_deserialize};
pub use crate::serializable::{GLOBAL_TAG, Serializable, tagged_serialize, tagged_serialized_size};
pub use crate::tagged::Tagged;
pub use crate::util::{ReadExt, VecExt, tagged_vec};
pub use macros::Serializable;
