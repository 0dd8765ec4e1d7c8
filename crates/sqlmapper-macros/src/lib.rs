//! Procedural macros for sqlmapper.
//!
//! Provides `#[derive(Entity)]`, which turns a plain struct with
//! `#[entity(...)]` annotations into a static table descriptor:
//!
//! ```ignore
//! use sqlmapper::prelude::*;
//!
//! #[derive(Entity, Debug, Clone, PartialEq)]
//! #[entity(table = "users", schema = "app")]
//! struct User {
//!     #[entity(primary_key)]
//!     id: i64,
//!     #[entity(column = "user_name")]
//!     name: String,
//!     nickname: Option<String>,
//! }
//! ```
//!
//! The generated implementation supplies `TABLE`, `SCHEMA`, `fields()`,
//! `to_row()`, `from_row()` and `primary_key_value()`. Field types must
//! convert to and from `Value`; `Option<T>` fields are marked nullable and
//! map `None` to SQL NULL.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity_derive;

/// Derive an `Entity` implementation from `#[entity(...)]` annotations.
///
/// Struct-level attributes: `table = "name"`, `schema = "name"`.
/// Field-level attributes: `primary_key`, `column = "name"`.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity_derive::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
