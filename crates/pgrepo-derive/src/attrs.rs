//! Parsing of `#[repo(...)]` attributes.

use crate::sql_ident::{parse_column_ident, parse_table_ident};
use syn::{Data, DeriveInput, Field, Fields, LitStr, Result, punctuated::Punctuated, token::Comma};

/// Field-level `#[repo(column = "...", summary)]`.
pub(crate) struct FieldAttr {
    pub column: String,
    pub summary: bool,
}

impl FieldAttr {
    pub(crate) fn parse(field: &Field) -> Result<Self> {
        let mut column = None;
        let mut summary = false;

        for attr in &field.attrs {
            if !attr.path().is_ident("repo") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("column") {
                    let lit: LitStr = meta.value()?.parse()?;
                    column = Some(parse_column_ident(&lit.value(), lit.span())?);
                    Ok(())
                } else if meta.path.is_ident("summary") {
                    summary = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown field attribute, expected `column` or `summary`"))
                }
            })?;
        }

        let column = match column {
            Some(column) => column,
            None => field_ident(field)?.to_string(),
        };
        Ok(Self { column, summary })
    }
}

/// Struct-level `#[repo(table = "...")]`.
pub(crate) fn table_name(input: &DeriveInput) -> Result<String> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("repo") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                table = Some(parse_table_ident(&lit.value(), lit.span())?);
                Ok(())
            } else {
                Err(meta.error("unknown struct attribute, expected `table`"))
            }
        })?;
    }
    table.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "Table requires #[repo(table = \"table_name\")] attribute",
        )
    })
}

pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> Result<&'a Punctuated<Field, Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs"),
        )),
    }
}

pub(crate) fn field_ident(field: &Field) -> Result<&syn::Ident> {
    field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))
}
