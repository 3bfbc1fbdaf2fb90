//! Name resolution across file boundaries.
//!
//! A [`NameResolver`] is created per output file. It turns protobuf type
//! references into paths in the declaration namespace, allocating an import
//! alias whenever a reference points into another file. The alias table and
//! the resolution cache are owned by the resolver, so independent output
//! files never share mutable state.

use crate::error::Result;
use crate::index::{join, DescriptorIndex, TypeEntry, TypeKind};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// A type reference resolved for one consuming file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Path to use in the output, e.g. `SearchRequest.Corpus` or `dep_types.Foo`
    pub path: String,
    /// Import alias the path goes through, if the type lives in another file
    pub alias: Option<String>,
}

/// One import of the generated module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Local alias (`import * as <alias>`)
    pub alias: String,
    /// Proto file the alias stands for
    pub file: String,
    /// Module specifier (`from "<specifier>"`)
    pub specifier: String,
    /// Whether any emitted reference goes through this alias
    pub used: bool,
}

/// Per-file import alias table.
///
/// Aliases are derived from the imported file's path. When two paths derive
/// the same alias, later ones get a numeric suffix in first-seen order.
#[derive(Debug, Default)]
pub struct ImportTable {
    imports: Vec<Import>,
    by_file: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl ImportTable {
    /// Creates an empty table that will never hand out the given names
    pub fn with_reserved<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: reserved.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns the alias for a file, allocating one if needed
    pub fn alias_for(&mut self, file: &str) -> &str {
        let idx = match self.by_file.get(file) {
            Some(&idx) => idx,
            None => {
                let base = alias_base(file);
                let mut alias = base.clone();
                let mut n = 1;
                while self.taken.contains(&alias) {
                    n += 1;
                    alias = format!("{}_{}", base, n);
                }

                trace!("Allocated alias {} for {}", alias, file);
                self.taken.insert(alias.clone());
                self.imports.push(Import {
                    alias,
                    file: file.to_string(),
                    specifier: module_specifier(file),
                    used: false,
                });
                self.by_file.insert(file.to_string(), self.imports.len() - 1);
                self.imports.len() - 1
            }
        };
        &self.imports[idx].alias
    }

    fn mark_used(&mut self, file: &str) {
        if let Some(&idx) = self.by_file.get(file) {
            self.imports[idx].used = true;
        }
    }

    /// Imports in allocation order
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Consumes the table, returning imports in allocation order
    pub fn into_imports(self) -> Vec<Import> {
        self.imports
    }
}

/// Resolves type references for a single consuming file
#[derive(Debug)]
pub struct NameResolver<'i, 'a> {
    index: &'i DescriptorIndex<'a>,
    file: String,
    imports: ImportTable,
    cache: HashMap<String, ResolvedReference>,
}

impl<'i, 'a> NameResolver<'i, 'a> {
    /// Creates a resolver for `file`.
    ///
    /// The file's direct dependencies get aliases up front, in declaration
    /// order, so alias numbering does not depend on which types are used.
    /// The first segment of the file's own package is reserved so an alias
    /// never shadows the namespace the declarations live in.
    pub fn new(index: &'i DescriptorIndex<'a>, file: &str) -> Self {
        let descriptor = index.file(file);
        let reserved = descriptor
            .map(|d| d.package())
            .and_then(|p| p.split('.').next())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut imports = ImportTable::with_reserved(reserved);
        if let Some(descriptor) = descriptor {
            for dep in &descriptor.dependency {
                imports.alias_for(dep);
            }
        }

        Self {
            index,
            file: file.to_string(),
            imports,
            cache: HashMap::new(),
        }
    }

    /// The file this resolver produces references for
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The index this resolver looks types up in
    pub fn index(&self) -> &'i DescriptorIndex<'a> {
        self.index
    }

    /// Resolves a reference found in scope `scope` of the consuming file.
    ///
    /// `context` names the field or method holding the reference and is only
    /// used for error reporting.
    pub fn resolve(
        &mut self,
        reference: &str,
        scope: &str,
        context: &str,
    ) -> Result<ResolvedReference> {
        let key = format!("{}\u{0}{}", scope, reference);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let index = self.index;
        let entry = index.resolve(reference, scope, &self.file, context)?;
        let resolved = self.reference_to(entry, scope);
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Builds the reference to an already looked-up entry, as seen from
    /// declarations of `scope`.
    ///
    /// Same-file references use the package-relative name, unless a message
    /// namespace enclosing `scope` declares a type with the same first
    /// segment. The path is then qualified with the package.
    pub fn reference_to(&mut self, entry: &TypeEntry<'a>, scope: &str) -> ResolvedReference {
        if entry.file == self.file {
            let path = if !entry.package.is_empty() && self.is_shadowed(&entry.local_name, scope) {
                trace!("{} is shadowed in {}, qualifying", entry.local_name, scope);
                format!("{}.{}", entry.package, entry.local_name)
            } else {
                entry.local_name.clone()
            };
            return ResolvedReference { path, alias: None };
        }

        let alias = self.imports.alias_for(entry.file).to_string();
        self.imports.mark_used(entry.file);
        ResolvedReference {
            path: format!("{}.{}", alias, entry.local_name),
            alias: Some(alias),
        }
    }

    /// Whether the first segment of `local_name` is hidden by a nested type of
    /// a message namespace enclosing the declarations of `scope`
    fn is_shadowed(&self, local_name: &str, scope: &str) -> bool {
        let head = local_name.split('.').next().unwrap_or(local_name);
        let mut enclosing = scope.rsplit_once('.').map_or("", |(parent, _)| parent);

        while let Some(owner) = self
            .index
            .get(enclosing)
            .filter(|e| e.kind() == TypeKind::Message)
        {
            if self.index.get(&join(&owner.full_name, head)).is_some() {
                return true;
            }
            enclosing = enclosing.rsplit_once('.').map_or("", |(parent, _)| parent);
        }
        false
    }

    /// Imports allocated so far
    pub fn imports(&self) -> &[Import] {
        self.imports.imports()
    }

    /// Consumes the resolver, returning its imports
    pub fn into_imports(self) -> Vec<Import> {
        self.imports.into_imports()
    }
}

/// Derives an identifier-safe alias from a proto file path
fn alias_base(file: &str) -> String {
    let stem = file.strip_suffix(".proto").unwrap_or(file);
    let mut alias: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if alias.is_empty() || alias.starts_with(|c: char| c.is_ascii_digit()) {
        alias.insert(0, '_');
    }
    alias
}

/// Module specifier for an imported proto file
fn module_specifier(file: &str) -> String {
    file.strip_suffix(".proto").unwrap_or(file).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{file, message};

    #[test]
    fn test_alias_base() {
        assert_eq!(alias_base("google/protobuf/timestamp.proto"), "google_protobuf_timestamp");
        assert_eq!(alias_base("common-types.proto"), "common_types");
        assert_eq!(alias_base("3d/mesh.proto"), "_3d_mesh");
    }

    #[test]
    fn test_alias_collision_suffix() {
        let mut table = ImportTable::default();
        assert_eq!(table.alias_for("a/b.proto"), "a_b");
        assert_eq!(table.alias_for("a_b.proto"), "a_b_2");
        assert_eq!(table.alias_for("a-b.proto"), "a_b_3");
        // Stable on repeat lookups
        assert_eq!(table.alias_for("a_b.proto"), "a_b_2");
        assert_eq!(table.imports().len(), 3);
        assert_eq!(table.imports()[1].specifier, "a_b");
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let mut table = ImportTable::with_reserved(["example"]);
        assert_eq!(table.alias_for("example.proto"), "example_2");
    }

    #[test]
    fn test_same_file_reference_is_local() {
        let mut outer = message("Outer", vec![]);
        outer.nested_type.push(message("Inner", vec![]));
        let files = vec![file("a.proto", "pkg", vec![outer], vec![], &[])];
        let index = DescriptorIndex::build(&files).unwrap();

        let mut resolver = NameResolver::new(&index, "a.proto");
        let r = resolver.resolve(".pkg.Outer.Inner", "pkg", "test").unwrap();
        assert_eq!(r.path, "Outer.Inner");
        assert_eq!(r.alias, None);
        assert!(resolver.imports().is_empty());
    }

    #[test]
    fn test_nested_namespace_shadowing_qualifies_path() {
        let mut outer = message("Outer", vec![]);
        outer.nested_type.push(message("Point", vec![]));
        outer.nested_type.push(message("Inner", vec![]));
        let files = vec![file("a.proto", "pkg", vec![message("Point", vec![]), outer], vec![], &[])];
        let index = DescriptorIndex::build(&files).unwrap();
        let mut resolver = NameResolver::new(&index, "a.proto");

        // Inner is declared inside namespace Outer, which has its own Point
        let r = resolver.resolve(".pkg.Point", "pkg.Outer.Inner", "test").unwrap();
        assert_eq!(r.path, "pkg.Point");
        let r = resolver.resolve(".pkg.Outer.Point", "pkg.Outer.Inner", "test").unwrap();
        assert_eq!(r.path, "Outer.Point");

        // Outer itself is declared at package level
        let r = resolver.resolve(".pkg.Point", "pkg.Outer", "test").unwrap();
        assert_eq!(r.path, "Point");
    }

    #[test]
    fn test_cross_file_reference_uses_alias() {
        let mut shared = message("Shared", vec![]);
        shared.nested_type.push(message("Part", vec![]));
        let files = vec![
            file("dep/types.proto", "other", vec![shared], vec![], &[]),
            file("unused.proto", "other", vec![message("Unused", vec![])], vec![], &[]),
            file(
                "main.proto",
                "pkg",
                vec![message("Main", vec![])],
                vec![],
                &["unused.proto", "dep/types.proto"],
            ),
        ];
        let index = DescriptorIndex::build(&files).unwrap();

        let mut resolver = NameResolver::new(&index, "main.proto");
        let r = resolver.resolve(".other.Shared.Part", "pkg.Main", "test").unwrap();
        assert_eq!(r.path, "dep_types.Shared.Part");
        assert_eq!(r.alias.as_deref(), Some("dep_types"));

        let imports = resolver.into_imports();
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].alias, "unused");
        assert!(!imports[0].used);
        assert_eq!(imports[1].alias, "dep_types");
        assert_eq!(imports[1].specifier, "dep/types");
        assert!(imports[1].used);
    }

    #[test]
    fn test_distinct_files_get_distinct_aliases() {
        let files = vec![
            file("a/b.proto", "x", vec![message("One", vec![])], vec![], &[]),
            file("a_b.proto", "y", vec![message("Two", vec![])], vec![], &[]),
            file("main.proto", "pkg", vec![], vec![], &["a/b.proto", "a_b.proto"]),
        ];
        let index = DescriptorIndex::build(&files).unwrap();
        let mut resolver = NameResolver::new(&index, "main.proto");

        let one = resolver.resolve(".x.One", "pkg", "test").unwrap();
        let two = resolver.resolve(".y.Two", "pkg", "test").unwrap();
        assert_eq!(one.path, "a_b.One");
        assert_eq!(two.path, "a_b_2.Two");
    }
}
