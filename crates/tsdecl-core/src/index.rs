//! Descriptor index.
//!
//! Flattens every file descriptor of a request into a lookup table from
//! fully-qualified type name to its declaration. The index is built in full
//! before any reference is resolved, so import cycles between files are
//! just lookups over a complete graph.

use crate::error::{Error, Result};
use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Whether an indexed name is a message or an enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A message type (including synthetic map entries)
    Message,
    /// An enum type
    Enum,
}

/// The descriptor behind an indexed name
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    /// A message declaration
    Message(&'a DescriptorProto),
    /// An enum declaration
    Enum(&'a EnumDescriptorProto),
}

/// A single indexed type
#[derive(Debug, Clone)]
pub struct TypeEntry<'a> {
    /// Fully-qualified name without leading dot (`pkg.Outer.Inner`)
    pub full_name: String,
    /// Name of the file that declares the type
    pub file: &'a str,
    /// Package of the declaring file
    pub package: &'a str,
    /// Package-relative nesting path (`Outer.Inner`)
    pub local_name: String,
    /// The declaration itself
    pub declaration: Declaration<'a>,
}

impl<'a> TypeEntry<'a> {
    /// Returns the kind of this type
    pub fn kind(&self) -> TypeKind {
        match self.declaration {
            Declaration::Message(_) => TypeKind::Message,
            Declaration::Enum(_) => TypeKind::Enum,
        }
    }

    /// Returns true if this is a synthetic map-entry message
    pub fn is_map_entry(&self) -> bool {
        match self.declaration {
            Declaration::Message(m) => is_map_entry(m),
            Declaration::Enum(_) => false,
        }
    }

    /// Returns the message descriptor, if this is a message
    pub fn message(&self) -> Option<&'a DescriptorProto> {
        match self.declaration {
            Declaration::Message(m) => Some(m),
            Declaration::Enum(_) => None,
        }
    }
}

/// Read-only lookup table over every descriptor in a request
#[derive(Debug)]
pub struct DescriptorIndex<'a> {
    files: HashMap<&'a str, &'a FileDescriptorProto>,
    types: HashMap<String, TypeEntry<'a>>,
}

impl<'a> DescriptorIndex<'a> {
    /// Builds the index over a set of file descriptors.
    ///
    /// Fails with [`Error::UnknownImport`] if a file imports a path outside
    /// the set, and with [`Error::DuplicateTypeName`] if two declarations
    /// share a fully-qualified name.
    pub fn build(files: &'a [FileDescriptorProto]) -> Result<Self> {
        let mut index = Self {
            files: HashMap::with_capacity(files.len()),
            types: HashMap::new(),
        };

        for file in files {
            index.files.entry(file.name()).or_insert(file);
        }

        for file in files {
            for dep in &file.dependency {
                if !index.files.contains_key(dep.as_str()) {
                    return Err(Error::unknown_import(file.name(), dep));
                }
            }
        }

        for file in files {
            let package = file.package();
            for message in &file.message_type {
                index.insert_message(file, package, "", message)?;
            }
            for enum_type in &file.enum_type {
                index.insert_enum(file, package, "", enum_type)?;
            }
        }

        debug!(
            "Indexed {} types across {} files",
            index.types.len(),
            index.files.len()
        );

        Ok(index)
    }

    fn insert_message(
        &mut self,
        file: &'a FileDescriptorProto,
        package: &'a str,
        parent: &str,
        message: &'a DescriptorProto,
    ) -> Result<()> {
        let local_name = join(parent, message.name());
        self.insert(file, package, local_name.clone(), Declaration::Message(message))?;

        for nested in &message.nested_type {
            self.insert_message(file, package, &local_name, nested)?;
        }
        for enum_type in &message.enum_type {
            self.insert_enum(file, package, &local_name, enum_type)?;
        }
        Ok(())
    }

    fn insert_enum(
        &mut self,
        file: &'a FileDescriptorProto,
        package: &'a str,
        parent: &str,
        enum_type: &'a EnumDescriptorProto,
    ) -> Result<()> {
        let local_name = join(parent, enum_type.name());
        self.insert(file, package, local_name, Declaration::Enum(enum_type))
    }

    fn insert(
        &mut self,
        file: &'a FileDescriptorProto,
        package: &'a str,
        local_name: String,
        declaration: Declaration<'a>,
    ) -> Result<()> {
        let full_name = join(package, &local_name);
        if let Some(existing) = self.types.get(&full_name) {
            return Err(Error::duplicate_type_name(
                full_name,
                existing.file,
                file.name(),
            ));
        }

        trace!("Indexing {} from {}", full_name, file.name());
        self.types.insert(
            full_name.clone(),
            TypeEntry {
                full_name,
                file: file.name(),
                package,
                local_name,
                declaration,
            },
        );
        Ok(())
    }

    /// Looks up a fully-qualified name; a leading dot is accepted
    pub fn get(&self, name: &str) -> Option<&TypeEntry<'a>> {
        self.types.get(name.strip_prefix('.').unwrap_or(name))
    }

    /// Resolves a type reference as it appears in a field or method.
    ///
    /// References with a leading dot are fully qualified. Others are looked
    /// up relative to `scope` (the fully-qualified name of the enclosing
    /// message or package), walking outwards the way protoc does.
    pub fn resolve(
        &self,
        reference: &str,
        scope: &str,
        file: &str,
        context: &str,
    ) -> Result<&TypeEntry<'a>> {
        let found = if reference.starts_with('.') {
            self.get(reference)
        } else {
            let mut scope = scope;
            loop {
                let candidate = join(scope, reference);
                if let Some(entry) = self.types.get(&candidate) {
                    break Some(entry);
                }
                if scope.is_empty() {
                    break None;
                }
                scope = scope.rsplit_once('.').map_or("", |(parent, _)| parent);
            }
        };

        found.ok_or_else(|| Error::unresolved_type(reference, file, context))
    }

    /// Returns the descriptor for a file name
    pub fn file(&self, name: &str) -> Option<&'a FileDescriptorProto> {
        self.files.get(name).copied()
    }

    /// Number of indexed types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are indexed
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Returns true if a message is a synthetic map entry
pub fn is_map_entry(message: &DescriptorProto) -> bool {
    message
        .options
        .as_ref()
        .map_or(false, |o| o.map_entry.unwrap_or(false))
}

/// Joins two dotted name components, skipping an empty prefix
pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{enum_type, file, message};

    #[test]
    fn test_index_nested_types() {
        let mut outer = message("Outer", vec![]);
        outer.nested_type.push(message("Inner", vec![]));
        outer.enum_type.push(enum_type("Kind", &[("A", 0)]));
        let files = vec![file("a.proto", "pkg.sub", vec![outer], vec![], &[])];

        let index = DescriptorIndex::build(&files).unwrap();
        assert_eq!(index.len(), 3);

        let inner = index.get(".pkg.sub.Outer.Inner").unwrap();
        assert_eq!(inner.kind(), TypeKind::Message);
        assert_eq!(inner.local_name, "Outer.Inner");
        assert_eq!(inner.file, "a.proto");

        let kind = index.get("pkg.sub.Outer.Kind").unwrap();
        assert_eq!(kind.kind(), TypeKind::Enum);
    }

    #[test]
    fn test_duplicate_type_name() {
        let files = vec![
            file("a.proto", "pkg", vec![message("Dup", vec![])], vec![], &[]),
            file("b.proto", "pkg", vec![message("Dup", vec![])], vec![], &[]),
        ];
        let err = DescriptorIndex::build(&files).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateTypeName { ref name, ref first_file, ref second_file }
                if name == "pkg.Dup" && first_file == "a.proto" && second_file == "b.proto"
        ));
    }

    #[test]
    fn test_enum_and_message_collide() {
        let files = vec![file(
            "a.proto",
            "",
            vec![message("Same", vec![])],
            vec![enum_type("Same", &[("X", 0)])],
            &[],
        )];
        assert!(matches!(
            DescriptorIndex::build(&files),
            Err(Error::DuplicateTypeName { .. })
        ));
    }

    #[test]
    fn test_unknown_import() {
        let files = vec![file("a.proto", "pkg", vec![], vec![], &["missing.proto"])];
        let err = DescriptorIndex::build(&files).unwrap_err();
        assert!(matches!(err, Error::UnknownImport { ref import, .. } if import == "missing.proto"));
    }

    #[test]
    fn test_resolve_relative_reference() {
        let mut outer = message("Outer", vec![]);
        outer.nested_type.push(message("Inner", vec![]));
        let files = vec![file(
            "a.proto",
            "pkg",
            vec![outer, message("Top", vec![])],
            vec![],
            &[],
        )];
        let index = DescriptorIndex::build(&files).unwrap();

        let inner = index.resolve("Inner", "pkg.Outer", "a.proto", "test").unwrap();
        assert_eq!(inner.full_name, "pkg.Outer.Inner");

        let top = index.resolve("Top", "pkg.Outer", "a.proto", "test").unwrap();
        assert_eq!(top.full_name, "pkg.Top");

        let err = index.resolve(".pkg.Nope", "pkg", "a.proto", "field X.y").unwrap_err();
        assert!(matches!(err, Error::UnresolvedType { ref context, .. } if context == "field X.y"));
    }
}
