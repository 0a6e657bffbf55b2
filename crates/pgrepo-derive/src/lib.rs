//! Derive macros for pgrepo
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Table)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod from_row;
mod sql_ident;
mod table;

/// Derive `FromRow` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use pgrepo::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     email: String,
///     #[repo(column = "password_hash")]
///     password: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[repo(column = "name")]` - Map field to a different column name
/// - `#[repo(summary)]` - See `Table`; once any field is a summary field, every other field
///   must implement `Default` and is defaulted when its column is absent from the row
#[proc_macro_derive(FromRow, attributes(repo))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Table` for a struct, binding it to a table for `Repository::new`.
///
/// # Example
///
/// ```ignore
/// use pgrepo::{FromRow, Table};
///
/// #[derive(FromRow, Table)]
/// #[repo(table = "users")]
/// struct User {
///     #[repo(summary)]
///     id: i64,
///     #[repo(summary)]
///     email: String,
///     password: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[repo(table = "name")]` - Table name (required)
/// - `#[repo(summary)]` - Include the field's column in non-preload reads; the other fields
///   decode as `Default::default()` there
/// - `#[repo(column = "name")]` - Map field to a different column name
#[proc_macro_derive(Table, attributes(repo))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    table::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
