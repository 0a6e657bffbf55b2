//! Table derive macro implementation

use crate::attrs::{FieldAttr, named_fields, table_name};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let table = table_name(&input)?;

    let mut summary = Vec::new();
    for field in named_fields(&input, "Table")? {
        let attr = FieldAttr::parse(field)?;
        if attr.summary {
            summary.push(attr.column);
        }
    }

    Ok(quote! {
        impl #impl_generics ::pgrepo::Table for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table;

            fn summary_columns() -> &'static [&'static str] {
                &[#(#summary),*]
            }
        }
    })
}
