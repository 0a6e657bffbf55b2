//! FromRow derive macro implementation

use crate::attrs::{FieldAttr, field_ident, named_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = named_fields(&input, "FromRow")?;

    let attrs = fields
        .iter()
        .map(FieldAttr::parse)
        .collect::<Result<Vec<_>>>()?;
    // Non-preload reads select only the summary columns; the rest fall back to Default.
    let narrowed = attrs.iter().any(|attr| attr.summary);

    let field_extracts = fields
        .iter()
        .zip(&attrs)
        .map(|(field, attr)| {
            let field_name = field_ident(field)?;
            let column_name = &attr.column;
            Ok(if narrowed && !attr.summary {
                quote! { #field_name: row.try_get_column_or_default(#column_name)? }
            } else {
                quote! { #field_name: row.try_get_column(#column_name)? }
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics ::pgrepo::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &::pgrepo::tokio_postgres::Row) -> ::pgrepo::RepoResult<Self> {
                use ::pgrepo::RowExt;
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
