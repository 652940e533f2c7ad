// Copyright 2022 The my-list developers
// SPDX-License-Identifier: MIT OR Apache-2.0

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Result};

/// The flags collected from all `#[alloc_policy(...)]` attributes of an allocator type.
#[derive(Default)]
pub(crate) struct PolicyFlags {
    pub(crate) propagate_on_copy_assignment: bool,
    pub(crate) propagate_on_move_assignment: bool,
    pub(crate) propagate_on_swap: bool,
    pub(crate) always_equal: bool,
}

/// Helper function to derive AllocPolicy.
pub(crate) fn derive_alloc_policy_trait(input: DeriveInput) -> Result<TokenStream> {
    if let Data::Union(_) = &input.data {
        return Err(Error::new_spanned(
            input,
            "AllocPolicy can only be derived for structs and enums",
        ));
    }

    let flags = parse_policy_flags(&input)?;
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let propagate_on_copy_assignment = flags.propagate_on_copy_assignment;
    let propagate_on_move_assignment = flags.propagate_on_move_assignment;
    let propagate_on_swap = flags.propagate_on_swap;
    let always_equal = flags.always_equal;

    // Always-equal allocators never need a runtime comparison, so they don't have to implement `PartialEq`.
    let equals_body = if always_equal {
        quote! { true }
    } else {
        quote! { ::core::cmp::PartialEq::eq(self, other) }
    };

    Ok(quote! {
        impl #impl_generics ::my_list::AllocPolicy for #ident #ty_generics #where_clause {
            const PROPAGATE_ON_COPY_ASSIGNMENT: bool = #propagate_on_copy_assignment;
            const PROPAGATE_ON_MOVE_ASSIGNMENT: bool = #propagate_on_move_assignment;
            const PROPAGATE_ON_SWAP: bool = #propagate_on_swap;
            const IS_ALWAYS_EQUAL: bool = #always_equal;

            #[allow(unused_variables)]
            fn equals(&self, other: &Self) -> bool {
                #equals_body
            }
        }
    })
}

/// Collects the flags of every `#[alloc_policy(...)]` attribute.
///
/// Multiple attributes are merged, and a flag may be named more than once.
fn parse_policy_flags(input: &DeriveInput) -> Result<PolicyFlags> {
    let mut flags = PolicyFlags::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("alloc_policy") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("propagate_on_copy_assignment") {
                flags.propagate_on_copy_assignment = true;
            } else if meta.path.is_ident("propagate_on_move_assignment") {
                flags.propagate_on_move_assignment = true;
            } else if meta.path.is_ident("propagate_on_swap") {
                flags.propagate_on_swap = true;
            } else if meta.path.is_ident("always_equal") {
                flags.always_equal = true;
            } else {
                return Err(meta.error(
                    "unknown allocator policy flag, expected one of `propagate_on_copy_assignment`, \
                     `propagate_on_move_assignment`, `propagate_on_swap`, `always_equal`",
                ));
            }

            Ok(())
        })?;
    }

    Ok(flags)
}
