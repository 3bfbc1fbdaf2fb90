//! Request-level generation.
//!
//! [`Generator`] indexes every descriptor of a request once, then produces
//! one declaration file per requested input. Each output file is lowered
//! with its own [`NameResolver`], so files are generated in parallel and
//! only share the read-only index.

use crate::comments::{self, CommentMap};
use crate::config::Config;
use crate::emit::{self, DeclarationFile};
use crate::error::{Error, Result};
use crate::index::{is_map_entry, join, DescriptorIndex};
use crate::mapper::{self, FieldScope};
use crate::naming::{transform, NameKind};
use crate::resolver::NameResolver;
use crate::service;
use crate::tree::{self, EnumDecl, EnumMember, Member, MessageDecl, MethodDecl, ServiceDecl};
use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto, ServiceDescriptorProto};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One generated declaration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Proto file the declarations were generated from
    pub source: String,
    /// Output path (`dir/name.d.ts`)
    pub name: String,
    /// File content
    pub content: String,
}

/// Generates declaration files from file descriptors
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: Config,
}

impl Generator {
    /// Creates a generator with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generates one declaration file per name in `to_generate`.
    ///
    /// Outputs are returned sorted by source name. The run fails as a whole
    /// on the first error (in that order); no partial output is returned.
    pub fn generate(
        &self,
        files: &[FileDescriptorProto],
        to_generate: &[String],
    ) -> Result<Vec<GeneratedFile>> {
        let index = DescriptorIndex::build(files)?;

        let mut names: Vec<&str> = to_generate.iter().map(String::as_str).collect();
        names.sort_unstable();
        names.dedup();

        for name in &names {
            if index.file(name).is_none() {
                return Err(Error::UnknownFileToGenerate {
                    file: name.to_string(),
                });
            }
        }

        let results: Vec<Result<GeneratedFile>> = names
            .par_iter()
            .map(|name| self.generate_file(&index, name))
            .collect();

        results.into_iter().collect()
    }

    /// Generates the declaration file for a single proto file
    pub fn generate_file(&self, index: &DescriptorIndex<'_>, name: &str) -> Result<GeneratedFile> {
        let file = index
            .file(name)
            .ok_or_else(|| Error::UnknownFileToGenerate {
                file: name.to_string(),
            })?;

        let mut lowering = FileLowering {
            file,
            comments: CommentMap::from_file(file),
            resolver: NameResolver::new(index, name),
            config: &self.config,
        };

        let package = file.package();
        let mut enums = Vec::with_capacity(file.enum_type.len());
        for (i, enum_type) in file.enum_type.iter().enumerate() {
            let path = vec![comments::FILE_ENUM, i as i32];
            enums.push(lowering.lower_enum(enum_type, package, &path));
        }

        let mut messages = Vec::with_capacity(file.message_type.len());
        for (i, message) in file.message_type.iter().enumerate() {
            let path = vec![comments::FILE_MESSAGE, i as i32];
            messages.push(lowering.lower_message(message, package, &path)?);
        }

        let mut services = Vec::with_capacity(file.service.len());
        for (i, service) in file.service.iter().enumerate() {
            let path = vec![comments::FILE_SERVICE, i as i32];
            services.push(lowering.lower_service(service, package, &path)?);
        }

        let tree = tree::build(package, name, enums, messages, services)?;
        let declarations = DeclarationFile {
            imports: lowering.resolver.into_imports(),
            tree,
        };
        let content = emit::render(&declarations, &self.config);

        let output = output_name(name);
        debug!("Generated {} from {} ({} bytes)", output, name, content.len());

        Ok(GeneratedFile {
            source: name.to_string(),
            name: output,
            content,
        })
    }
}

/// Output path for a proto file: same base name, `.d.ts` extension
pub fn output_name(proto_file: &str) -> String {
    let stem = proto_file.strip_suffix(".proto").unwrap_or(proto_file);
    format!("{}.d.ts", stem)
}

/// Turns one file's descriptors into resolved declarations
struct FileLowering<'g, 'i, 'a> {
    file: &'a FileDescriptorProto,
    comments: CommentMap,
    resolver: NameResolver<'i, 'a>,
    config: &'g Config,
}

impl<'g, 'i, 'a> FileLowering<'g, 'i, 'a> {
    fn lower_message(
        &mut self,
        message: &DescriptorProto,
        parent: &str,
        path: &[i32],
    ) -> Result<MessageDecl> {
        let full_name = join(parent, message.name());
        let scope = FieldScope {
            message: &full_name,
            file: self.file.name(),
        };

        let mut members = Vec::with_capacity(message.field.len());
        let mut entry_order = Vec::new();
        for (k, field) in message.field.iter().enumerate() {
            let mapped = mapper::map_field(field, scope, &mut self.resolver, self.config)?;
            if let Some(entry) = mapped.map_entry {
                entry_order.push(entry);
            }

            let comments = self.comments.get(&comments::child(path, comments::MESSAGE_FIELD, k));
            members.push(Member {
                name: transform(field.name(), NameKind::Field, self.config.naming),
                expr: mapped.expr,
                leading: comments.leading,
                trailing: comments.trailing,
            });
        }

        let mut enums = Vec::with_capacity(message.enum_type.len());
        for (j, enum_type) in message.enum_type.iter().enumerate() {
            let enum_path = comments::child(path, comments::MESSAGE_ENUM, j);
            enums.push(self.lower_enum(enum_type, &full_name, &enum_path));
        }

        let mut messages = Vec::new();
        let mut entries: HashMap<String, MessageDecl> = HashMap::new();
        let mut unreferenced_entries = Vec::new();
        for (j, nested) in message.nested_type.iter().enumerate() {
            let nested_path = comments::child(path, comments::MESSAGE_NESTED, j);
            let decl = self.lower_message(nested, &full_name, &nested_path)?;
            if is_map_entry(nested) {
                unreferenced_entries.push(decl.full_name.clone());
                entries.insert(decl.full_name.clone(), decl);
            } else {
                messages.push(decl);
            }
        }

        let mut map_entries = Vec::with_capacity(entries.len());
        let mut placed = HashSet::new();
        for entry in entry_order.iter().chain(unreferenced_entries.iter()) {
            if !placed.insert(entry.clone()) {
                continue;
            }
            if let Some(decl) = entries.remove(entry) {
                map_entries.push(decl);
            }
        }

        let comments = self.comments.get(path);
        Ok(MessageDecl {
            name: transform(message.name(), NameKind::Message, self.config.naming),
            full_name,
            leading: comments.leading,
            members,
            enums,
            messages,
            map_entries,
        })
    }

    fn lower_enum(&self, enum_type: &EnumDescriptorProto, parent: &str, path: &[i32]) -> EnumDecl {
        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(enum_type.value.len());

        for (k, value) in enum_type.value.iter().enumerate() {
            // Aliases share a number; the first-declared name wins.
            if !seen.insert(value.number()) {
                continue;
            }
            let comments = self.comments.get(&comments::child(path, comments::ENUM_VALUE, k));
            members.push(EnumMember {
                name: transform(value.name(), NameKind::EnumValue, self.config.naming),
                number: value.number(),
                leading: comments.leading,
                trailing: comments.trailing,
            });
        }

        EnumDecl {
            name: transform(enum_type.name(), NameKind::Enum, self.config.naming),
            full_name: join(parent, enum_type.name()),
            leading: self.comments.get(path).leading,
            members,
        }
    }

    fn lower_service(
        &mut self,
        service: &ServiceDescriptorProto,
        package: &str,
        path: &[i32],
    ) -> Result<ServiceDecl> {
        let full_name = join(package, service.name());

        let mut methods = Vec::with_capacity(service.method.len());
        for (k, method) in service.method.iter().enumerate() {
            let signature = service::map_method(method, &full_name, &mut self.resolver, self.config)?;
            let comments = self.comments.get(&comments::child(path, comments::SERVICE_METHOD, k));
            methods.push(MethodDecl {
                name: transform(method.name(), NameKind::Method, self.config.naming),
                signature,
                leading: comments.leading,
                trailing: comments.trailing,
            });
        }

        Ok(ServiceDecl {
            name: format!(
                "{}Service",
                transform(service.name(), NameKind::Service, self.config.naming)
            ),
            full_name,
            leading: self.comments.get(path).leading,
            methods,
        })
    }
}
