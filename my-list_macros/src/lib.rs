// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

mod helpers;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `::my_list::AllocPolicy` for an allocator type.
///
/// The propagation flags are all `false` unless named in an `#[alloc_policy(...)]` attribute:
///
/// ```ignore
/// #[derive(AllocPolicy, Clone, PartialEq)]
/// #[alloc_policy(propagate_on_move_assignment, propagate_on_swap)]
/// struct ArenaAlloc { /* ... */ }
/// ```
///
/// Supported flags are `propagate_on_copy_assignment`, `propagate_on_move_assignment`,
/// `propagate_on_swap` and `always_equal`.
/// Without `always_equal`, the derived `equals` compares the allocators through `PartialEq`.
#[proc_macro_derive(AllocPolicy, attributes(alloc_policy))]
pub fn derive_alloc_policy(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    helpers::derive_alloc_policy_trait(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
