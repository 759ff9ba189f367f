//! Attribute parsing for the Overlay derive macro

use darling::{FromDeriveInput, FromField};
use syn::{DeriveInput, Generics, Ident, Type};

/// Parsed #[overlay(...)] attributes on the struct
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(overlay), supports(struct_named))]
pub struct OverlayArgs {
    /// Struct identifier
    pub ident: Ident,

    /// Struct generics; one lifetime is required for the `sdk` borrow
    pub generics: Generics,

    /// Struct fields
    pub data: darling::ast::Data<(), OverlayFieldArgs>,

    /// Property table that `netvar` fields resolve against (e.g. "DT_BasePlayer")
    #[darling(default)]
    pub table: Option<String>,

    /// Offset-table structure that `offset` fields resolve against
    #[darling(default)]
    pub structure: Option<String>,
}

/// Parsed #[overlay(...)] attributes on a field
#[derive(Debug, FromField)]
#[darling(attributes(overlay))]
pub struct OverlayFieldArgs {
    /// Field identifier
    pub ident: Option<Ident>,

    /// Field type
    pub ty: Type,

    /// Networked field path, dotted for nested tables (e.g. "m_Local.m_vecPunchAngle")
    #[darling(default)]
    pub netvar: Option<String>,

    /// Offset-table field name (e.g. "Health")
    #[darling(default)]
    pub offset: Option<String>,

    /// Whether this field is read-only (no setter generated)
    #[darling(default)]
    pub readonly: bool,
}

/// Where an accessor gets its offset from
pub enum FieldSource<'a> {
    Netvar(&'a str),
    Offset(&'a str),
}

impl OverlayFieldArgs {
    /// Offset source of an accessor field, `None` for plain fields
    pub fn source(&self) -> Option<FieldSource<'_>> {
        match (&self.netvar, &self.offset) {
            (Some(path), _) => Some(FieldSource::Netvar(path)),
            (None, Some(field)) => Some(FieldSource::Offset(field)),
            (None, None) => None,
        }
    }

    /// Check if this is an accessor field
    pub fn is_accessor(&self) -> bool {
        self.netvar.is_some() || self.offset.is_some()
    }

    /// Check if this field is named `name`
    pub fn is_named(&self, name: &str) -> bool {
        self.ident.as_ref().map(|i| i == name).unwrap_or(false)
    }
}

/// Parse a DeriveInput into OverlayArgs
///
/// A field takes its offset from exactly one lookup; naming both `netvar`
/// and `offset` is rejected here.
pub fn parse_overlay(input: &DeriveInput) -> darling::Result<OverlayArgs> {
    let args = OverlayArgs::from_derive_input(input)?;

    if let darling::ast::Data::Struct(fields) = &args.data {
        let mut errors = darling::Error::accumulator();
        for field in fields.iter().filter(|f| f.netvar.is_some() && f.offset.is_some()) {
            let error = darling::Error::custom("use either `netvar` or `offset`, not both");
            errors.push(match &field.ident {
                Some(ident) => error.with_span(ident),
                None => error,
            });
        }
        errors.finish()?;
    }

    Ok(args)
}
