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

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A type that implements `Tagged` can be described by a fixed type string.
///
/// This string should be uniquely determined by the type, and uniquely determine the type. A tag
/// should never change its meaning: when a type's encoding changes, its tag's version suffix
/// changes with it.
///
/// ## Conventions
///
/// Tags are kebab case, limited to alphanumeric characters, dashes, square brackets (for
/// versions), and (for generic arguments only) parentheses and commas.
///
/// - `u32` <-> `"u32"`
/// - `StateRef` <-> `"state-ref[v1]"`
/// - `Vec<StateRef>` <-> `"vec(state-ref[v1])"`
/// - `Option<Foo>` <-> `"option(foo)"`
pub trait Tagged {
    /// Retrieves the tag of `Self`.
    fn tag() -> Cow<'static, str>;
}

impl<T: Tagged + ?Sized> Tagged for &T {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
}

impl<T: Tagged> Tagged for Arc<T> {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
}

impl<T: Tagged> Tagged for Box<T> {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
}

impl<T: Tagged> Tagged for Option<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("option({})", T::tag()))
    }
}

impl<T: Tagged> Tagged for Vec<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("vec({})", T::tag()))
    }
}

impl<T: Tagged> Tagged for BTreeSet<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("set({})", T::tag()))
    }
}

impl<K: Tagged, V: Tagged> Tagged for BTreeMap<K, V> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("map({},{})", K::tag(), V::tag()))
    }
}

impl<const N: usize> Tagged for [u8; N] {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("array(u8,{N})"))
    }
}

impl Tagged for String {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("string")
    }
}

impl Tagged for str {
    fn tag() -> Cow<'static, str> {
        Cow::Borrowed("string")
    }
}
