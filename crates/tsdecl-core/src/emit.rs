//! Declaration file rendering.
//!
//! Rendering is a pure function of the namespace tree, the import list and
//! the configuration: same input, same bytes.

use crate::config::{Config, EnumRepresentation};
use crate::resolver::Import;
use crate::tree::{EnumDecl, InterfaceNode, NamespaceNode, NamespaceTree, Node, ServiceDecl};
use std::fmt::Write as FmtWrite;

/// First line of every generated file
pub const GENERATED_HEADER: &str = "// Code generated by protoc-gen-tsdecl. DO NOT EDIT.";

/// Everything needed to render one output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationFile {
    /// Imports in allocation order
    pub imports: Vec<Import>,
    /// The namespace tree
    pub tree: NamespaceTree,
}

/// Renders a declaration file to text
pub fn render(file: &DeclarationFile, config: &Config) -> String {
    let mut output = String::new();
    Emitter::new(&mut output, config)
        .write_file(file)
        .expect("String write cannot fail");
    output
}

/// Writes declarations with indentation tracking
struct Emitter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a Config,
    indent_level: usize,
}

impl<'a, W: FmtWrite> Emitter<'a, W> {
    fn new(writer: &'a mut W, config: &'a Config) -> Self {
        Self {
            writer,
            config,
            indent_level: 0,
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) -> std::fmt::Result {
        for _ in 0..self.indent_level {
            write!(self.writer, "{}", self.config.indent_str)?;
        }
        Ok(())
    }

    fn writeln(&mut self, s: &str) -> std::fmt::Result {
        self.write_indent()?;
        writeln!(self.writer, "{}", s)
    }

    fn blank(&mut self) -> std::fmt::Result {
        writeln!(self.writer)
    }

    fn write_file(&mut self, file: &DeclarationFile) -> std::fmt::Result {
        writeln!(self.writer, "{}", GENERATED_HEADER)?;
        self.blank()?;

        self.write_imports(&file.imports)?;

        let tree = &file.tree;
        if tree.package.is_empty() {
            return self.write_children(&tree.children, "declare");
        }

        let keyword = if self.config.declare_namespace {
            "declare"
        } else {
            "export"
        };
        writeln!(self.writer, "{} namespace {} {{", keyword, tree.package_name())?;
        self.blank()?;
        self.indent();
        self.write_children(&tree.children, "export")?;
        self.dedent();
        writeln!(self.writer, "}}")
    }

    fn write_imports(&mut self, imports: &[Import]) -> std::fmt::Result {
        if imports.is_empty() {
            return Ok(());
        }

        for import in imports {
            let line = format!("import * as {} from \"{}\"", import.alias, import.specifier);
            if import.used {
                writeln!(self.writer, "{}", line)?;
            } else {
                writeln!(self.writer, "// {} // imported but not used", line)?;
            }
        }

        self.blank()
    }

    fn write_children(&mut self, children: &[Node], keyword: &str) -> std::fmt::Result {
        for node in children {
            match node {
                Node::Interface(i) => self.write_interface(i, keyword)?,
                Node::Enum(e) => self.write_enum(e, keyword)?,
                Node::Service(s) => self.write_service(s, keyword)?,
                Node::Namespace(n) => self.write_namespace(n, keyword)?,
            }
        }
        Ok(())
    }

    fn write_comment(&mut self, comment: Option<&str>) -> std::fmt::Result {
        let Some(comment) = comment else {
            return Ok(());
        };
        for line in comment.strip_suffix('\n').unwrap_or(comment).split('\n') {
            self.write_indent()?;
            writeln!(self.writer, "//{}", line)?;
        }
        Ok(())
    }

    /// Writes one member line. The first line of a trailing comment goes
    /// after the member, any further lines follow on their own.
    fn write_member(&mut self, text: &str, trailing: Option<&str>) -> std::fmt::Result {
        let mut lines = trailing
            .into_iter()
            .flat_map(str::lines)
            .map(str::trim)
            .filter(|l| !l.is_empty());

        self.write_indent()?;
        match lines.next() {
            Some(first) => writeln!(self.writer, "{} // {}", text, first)?,
            None => writeln!(self.writer, "{}", text)?,
        }
        for line in lines {
            self.write_indent()?;
            writeln!(self.writer, "// {}", line)?;
        }
        Ok(())
    }

    fn write_interface(&mut self, interface: &InterfaceNode, keyword: &str) -> std::fmt::Result {
        self.write_comment(interface.leading.as_deref())?;
        self.writeln(&format!("{} interface {} {{", keyword, interface.name))?;
        self.indent();

        for member in &interface.members {
            self.write_comment(member.leading.as_deref())?;
            self.write_member(
                &format!("{}?: {};", member.name, member.expr),
                member.trailing.as_deref(),
            )?;
        }

        self.dedent();
        self.writeln("}")?;
        self.blank()
    }

    fn write_enum(&mut self, enum_decl: &EnumDecl, keyword: &str) -> std::fmt::Result {
        self.write_comment(enum_decl.leading.as_deref())?;
        self.writeln(&format!("{} enum {} {{", keyword, enum_decl.name))?;
        self.indent();

        for member in &enum_decl.members {
            self.write_comment(member.leading.as_deref())?;
            let text = match self.config.enum_representation {
                EnumRepresentation::Numeric => format!("{} = {},", member.name, member.number),
                EnumRepresentation::String => format!("{} = \"{}\",", member.name, member.name),
            };
            self.write_member(&text, member.trailing.as_deref())?;
        }

        self.dedent();
        self.writeln("}")
    }

    fn write_service(&mut self, service: &ServiceDecl, keyword: &str) -> std::fmt::Result {
        self.write_comment(service.leading.as_deref())?;
        self.writeln(&format!("{} interface {} {{", keyword, service.name))?;
        self.indent();

        for method in &service.methods {
            self.write_comment(method.leading.as_deref())?;
            self.write_member(
                &format!("{}: {};", method.name, method.signature),
                method.trailing.as_deref(),
            )?;
        }

        self.dedent();
        self.writeln("}")
    }

    fn write_namespace(&mut self, namespace: &NamespaceNode, keyword: &str) -> std::fmt::Result {
        self.writeln(&format!("{} namespace {} {{", keyword, namespace.name))?;
        self.indent();
        self.write_children(&namespace.children, "export")?;
        self.dedent();
        self.writeln("}")?;
        self.blank()
    }
}
