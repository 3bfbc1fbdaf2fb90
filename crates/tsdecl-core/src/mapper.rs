//! Field type mapping.
//!
//! Maps a protobuf field (type plus cardinality) to a TypeScript type
//! expression. Rules are applied in priority order: map, repeated, scalar,
//! enum reference, message reference.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::index::TypeKind;
use crate::resolver::NameResolver;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FieldDescriptorProto;
use std::fmt;

/// A TypeScript type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `number`
    Number,
    /// `string`
    String,
    /// `boolean`
    Boolean,
    /// `Uint8Array`
    Bytes,
    /// A resolved message or enum path
    Reference(String),
    /// `Array<T>`
    Array(Box<TypeExpr>),
    /// `{ [key: string]: V }`
    Map(Box<TypeExpr>),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Number => f.write_str("number"),
            TypeExpr::String => f.write_str("string"),
            TypeExpr::Boolean => f.write_str("boolean"),
            TypeExpr::Bytes => f.write_str("Uint8Array"),
            TypeExpr::Reference(path) => f.write_str(path),
            TypeExpr::Array(inner) => write!(f, "Array<{}>", inner),
            TypeExpr::Map(value) => write!(f, "{{ [key: string]: {} }}", value),
        }
    }
}

/// How many values a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// A single optional value
    Singular,
    /// A repeated (non-map) field
    Repeated,
    /// A `map<K, V>` field
    Map,
    /// A member of a real (non-synthetic) oneof
    OneofMember,
}

/// Result of mapping one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    /// The member's type expression
    pub expr: TypeExpr,
    /// The field's cardinality
    pub cardinality: Cardinality,
    /// Fully-qualified name of the synthetic entry message, for map fields
    pub map_entry: Option<String>,
}

/// Where a field lives, for scoped lookups and error context
#[derive(Debug, Clone, Copy)]
pub struct FieldScope<'s> {
    /// Fully-qualified name of the message declaring the field
    pub message: &'s str,
    /// File declaring the message
    pub file: &'s str,
}

/// Maps a field to its type expression.
///
/// Every mapped member is emitted as optional, so the expression never
/// includes `undefined` itself.
pub fn map_field(
    field: &FieldDescriptorProto,
    scope: FieldScope<'_>,
    resolver: &mut NameResolver<'_, '_>,
    config: &Config,
) -> Result<MappedField> {
    let context = format!("field {}.{}", scope.message, field.name());

    if field.label() == Label::Repeated && field_type(field, scope, resolver)? == Type::Message {
        let index = resolver.index();
        let target = index.resolve(field.type_name(), scope.message, scope.file, &context)?;
        if target.is_map_entry() {
            let entry = target.message().ok_or_else(|| unsupported(field, scope, "map entry is not a message"))?;
            let value = entry
                .field
                .iter()
                .find(|f| f.number() == 2)
                .ok_or_else(|| unsupported(field, scope, "map entry has no value field"))?;
            if !entry.field.iter().any(|f| f.number() == 1) {
                return Err(unsupported(field, scope, "map entry has no key field"));
            }

            // The value is rendered inline in the owning message
            let value_expr = map_element(value, scope, resolver, config)?;
            return Ok(MappedField {
                expr: TypeExpr::Map(Box::new(value_expr)),
                cardinality: Cardinality::Map,
                map_entry: Some(target.full_name.clone()),
            });
        }
    }

    let element = map_element(field, scope, resolver, config)?;
    let (expr, cardinality) = if field.label() == Label::Repeated {
        (TypeExpr::Array(Box::new(element)), Cardinality::Repeated)
    } else if field.oneof_index.is_some() && !field.proto3_optional() {
        (element, Cardinality::OneofMember)
    } else {
        (element, Cardinality::Singular)
    };

    Ok(MappedField {
        expr,
        cardinality,
        map_entry: None,
    })
}

/// Maps a single value of a field, ignoring its cardinality
fn map_element(
    field: &FieldDescriptorProto,
    scope: FieldScope<'_>,
    resolver: &mut NameResolver<'_, '_>,
    config: &Config,
) -> Result<TypeExpr> {
    let expr = match field_type(field, scope, resolver)? {
        Type::Double
        | Type::Float
        | Type::Int32
        | Type::Uint32
        | Type::Sint32
        | Type::Fixed32
        | Type::Sfixed32 => TypeExpr::Number,
        Type::Int64 | Type::Uint64 | Type::Sint64 | Type::Fixed64 | Type::Sfixed64 => {
            if config.int64_as_string {
                TypeExpr::String
            } else {
                TypeExpr::Number
            }
        }
        Type::Bool => TypeExpr::Boolean,
        Type::String => TypeExpr::String,
        Type::Bytes => TypeExpr::Bytes,
        Type::Enum | Type::Message | Type::Group => {
            if field.type_name().is_empty() {
                return Err(unsupported(field, scope, "reference field has no type name"));
            }
            let context = format!("field {}.{}", scope.message, field.name());
            let resolved = resolver.resolve(field.type_name(), scope.message, &context)?;
            TypeExpr::Reference(resolved.path)
        }
    };
    Ok(expr)
}

/// Determines the declared type of a field.
///
/// A reference without an explicit type code is classified by looking the
/// name up in the index.
fn field_type(
    field: &FieldDescriptorProto,
    scope: FieldScope<'_>,
    resolver: &NameResolver<'_, '_>,
) -> Result<Type> {
    match field.r#type {
        Some(code) => Type::try_from(code)
            .map_err(|_| unsupported(field, scope, format!("unknown field type code {}", code))),
        None if !field.type_name().is_empty() => {
            let context = format!("field {}.{}", scope.message, field.name());
            let entry =
                resolver
                    .index()
                    .resolve(field.type_name(), scope.message, scope.file, &context)?;
            Ok(match entry.kind() {
                TypeKind::Message => Type::Message,
                TypeKind::Enum => Type::Enum,
            })
        }
        None => Err(unsupported(field, scope, "field has neither a type nor a type name")),
    }
}

fn unsupported(
    field: &FieldDescriptorProto,
    scope: FieldScope<'_>,
    details: impl Into<String>,
) -> Error {
    Error::unsupported_field_shape(scope.message, field.name(), scope.file, details)
}
