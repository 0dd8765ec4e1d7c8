//! Implementation of the Entity derive macro.
//!
//! Parses `#[entity(...)]` annotations into a table definition and generates
//! the static descriptor plus row conversions.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, Ident, Lit, Result, Type};

/// Parsed table definition from a struct with `#[derive(Entity)]`.
#[derive(Debug)]
struct EntityDef {
    /// The struct name.
    name: Ident,
    /// Declared table name, if any.
    table: Option<String>,
    /// Declared schema, if any.
    schema: Option<String>,
    /// Parsed field definitions, in declaration order.
    fields: Vec<EntityFieldDef>,
    /// Generics from the struct.
    generics: syn::Generics,
}

/// Parsed mapping for a single field.
#[derive(Debug)]
struct EntityFieldDef {
    /// The field name.
    name: Ident,
    /// The column name (defaults to the field name).
    column: String,
    /// Whether this field is part of the primary key.
    primary_key: bool,
    /// Whether the field type is `Option<T>`.
    nullable: bool,
}

/// Expand `#[derive(Entity)]` into an `Entity` implementation.
pub fn expand(input: &DeriveInput) -> Result<TokenStream> {
    let def = parse_entity(input)?;
    Ok(generate(&def))
}

fn parse_entity(input: &DeriveInput) -> Result<EntityDef> {
    let name = input.ident.clone();
    let generics = input.generics.clone();

    let mut table = None;
    let mut schema = None;

    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                table = Some(parse_str_lit(&meta.value()?.parse()?)?);
            } else if meta.path.is_ident("schema") {
                schema = Some(parse_str_lit(&meta.value()?.parse()?)?);
            } else {
                return Err(Error::new_spanned(
                    &meta.path,
                    "unknown entity attribute. Valid struct attributes are: table, schema",
                ));
            }
            Ok(())
        })?;
    }

    let fields = match &input.data {
        Data::Struct(data) => parse_entity_fields(&data.fields)?,
        Data::Enum(_) | Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Entity can only be derived for structs with named fields",
            ));
        }
    };

    if fields.is_empty() {
        return Err(Error::new_spanned(
            input,
            "Entity requires at least one field",
        ));
    }

    Ok(EntityDef {
        name,
        table,
        schema,
        fields,
        generics,
    })
}

fn parse_entity_fields(fields: &Fields) -> Result<Vec<EntityFieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_entity_field).collect(),
        Fields::Unnamed(_) | Fields::Unit => Err(Error::new_spanned(
            fields,
            "Entity requires a struct with named fields",
        )),
    }
}

fn parse_entity_field(field: &Field) -> Result<EntityFieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut column = name.to_string();
    let mut primary_key = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                primary_key = true;
            } else if meta.path.is_ident("column") {
                column = parse_str_lit(&meta.value()?.parse()?)?;
            } else {
                return Err(Error::new_spanned(
                    &meta.path,
                    "unknown entity attribute. Valid field attributes are: primary_key, column",
                ));
            }
            Ok(())
        })?;
    }

    Ok(EntityFieldDef {
        name,
        column,
        primary_key,
        nullable: is_option_type(&field.ty),
    })
}

fn parse_str_lit(lit: &Lit) -> Result<String> {
    match lit {
        Lit::Str(s) => Ok(s.value()),
        other => Err(Error::new_spanned(other, "expected string literal")),
    }
}

/// Whether a type is `Option<T>` (by path inspection).
fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

fn generate(def: &EntityDef) -> TokenStream {
    let name = &def.name;
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();

    let table = match &def.table {
        Some(t) => quote! { Some(#t) },
        None => quote! { None },
    };
    let schema = match &def.schema {
        Some(s) => quote! { Some(#s) },
        None => quote! { None },
    };

    let field_infos = def.fields.iter().map(|f| {
        let field_name = f.name.to_string();
        let mut tokens = quote! { ::sqlmapper_core::FieldInfo::new(#field_name) };
        if f.column != field_name {
            let column = &f.column;
            tokens = quote! { #tokens.column(#column) };
        }
        if f.primary_key {
            tokens = quote! { #tokens.primary_key(true) };
        }
        if f.nullable {
            tokens = quote! { #tokens.nullable(true) };
        }
        tokens
    });

    let to_row_pairs = def.fields.iter().map(|f| {
        let ident = &f.name;
        let column = &f.column;
        quote! { (#column, ::sqlmapper_core::Value::from(self.#ident.clone())) }
    });

    let from_row_fields = def.fields.iter().map(|f| {
        let ident = &f.name;
        let column = &f.column;
        quote! { #ident: row.try_get(#column)? }
    });

    let pk_values = def.fields.iter().filter(|f| f.primary_key).map(|f| {
        let ident = &f.name;
        quote! { ::sqlmapper_core::Value::from(self.#ident.clone()) }
    });

    quote! {
        impl #impl_generics ::sqlmapper_core::Entity for #name #ty_generics #where_clause {
            const TABLE: ::core::option::Option<&'static str> = #table;
            const SCHEMA: ::core::option::Option<&'static str> = #schema;

            fn fields() -> &'static [::sqlmapper_core::FieldInfo] {
                static FIELDS: &[::sqlmapper_core::FieldInfo] = &[
                    #(#field_infos,)*
                ];
                FIELDS
            }

            fn to_row(&self) -> ::std::vec::Vec<(&'static str, ::sqlmapper_core::Value)> {
                vec![
                    #(#to_row_pairs,)*
                ]
            }

            fn from_row(row: &::sqlmapper_core::Row) -> ::sqlmapper_core::Result<Self> {
                Ok(Self {
                    #(#from_row_fields,)*
                })
            }

            fn primary_key_value(&self) -> ::std::vec::Vec<::sqlmapper_core::Value> {
                vec![
                    #(#pk_values,)*
                ]
            }
        }
    }
}
