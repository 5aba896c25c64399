//! Parsing of `#[derive(ToParams)]` input.

use proc_macro2::Span;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Generics, Ident, Lit, Result};

/// A struct accepted by `#[derive(ToParams)]`.
pub struct ParamsDef {
    pub name: Ident,
    pub generics: Generics,
    pub fields: Vec<ParamField>,
}

impl ParamsDef {
    /// Fields that become parameters.
    pub fn bound_fields(&self) -> impl Iterator<Item = &ParamField> {
        self.fields.iter().filter(|f| !f.skip)
    }
}

/// One named field of the struct.
pub struct ParamField {
    pub ident: Ident,
    /// Parameter name; the field name unless renamed.
    pub param_name: String,
    pub skip: bool,
}

pub fn parse_params(input: &DeriveInput) -> Result<ParamsDef> {
    let fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "ToParams can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "ToParams can only be derived for structs, not unions",
            ));
        }
    };

    let mut seen: Vec<&str> = Vec::new();
    for field in fields.iter().filter(|f| !f.skip) {
        let folded = field.param_name.to_lowercase();
        if seen.iter().any(|name| name.to_lowercase() == folded) {
            return Err(Error::new_spanned(
                &field.ident,
                format!("duplicate parameter name: {}", field.param_name),
            ));
        }
        seen.push(&field.param_name);
    }

    Ok(ParamsDef {
        name: input.ident.clone(),
        generics: input.generics.clone(),
        fields,
    })
}

fn parse_fields(fields: &Fields) -> Result<Vec<ParamField>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_field).collect(),
        Fields::Unnamed(_) => Err(Error::new(
            Span::call_site(),
            "ToParams requires a struct with named fields, not a tuple struct",
        )),
        Fields::Unit => Ok(Vec::new()),
    }
}

fn parse_field(field: &Field) -> Result<ParamField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;
    let (rename, skip) = parse_field_attrs(&field.attrs)?;
    let param_name = rename.unwrap_or_else(|| unraw(&ident));

    Ok(ParamField {
        ident,
        param_name,
        skip,
    })
}

/// `r#type` binds as `type`.
fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// Parse all `#[params(...)]` attributes on a field.
fn parse_field_attrs(attrs: &[Attribute]) -> Result<(Option<String>, bool)> {
    let mut rename: Option<String> = None;
    let mut skip = false;

    for attr in attrs {
        if !attr.path().is_ident("params") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: Lit = meta.value()?.parse()?;
                match value {
                    Lit::Str(lit_str) if lit_str.value().is_empty() => Err(Error::new_spanned(
                        lit_str,
                        "parameter name cannot be empty",
                    )),
                    Lit::Str(lit_str) => {
                        if rename.is_some() {
                            return Err(Error::new_spanned(
                                &meta.path,
                                "duplicate params attribute: rename",
                            ));
                        }
                        rename = Some(lit_str.value());
                        Ok(())
                    }
                    other => Err(Error::new_spanned(
                        other,
                        "expected string literal for parameter name",
                    )),
                }
            } else {
                Err(meta.error("unknown params attribute, expected `rename` or `skip`"))
            }
        })?;
    }

    Ok((rename, skip))
}
