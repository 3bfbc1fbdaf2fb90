//! Namespace tree assembly.
//!
//! Resolved declarations are arranged into the tree the emitter walks: one
//! package namespace holding top-level enums, messages and services, with
//! each message that has nested types followed by a namespace of the same
//! name (TypeScript declaration merging) that holds them.

use crate::error::{Error, Result};
use crate::index::join;
use crate::mapper::TypeExpr;
use crate::service::Signature;
use std::collections::HashMap;
use tracing::trace;

/// A message interface member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Member name after casing
    pub name: String,
    /// Member type
    pub expr: TypeExpr,
    /// Leading comment, verbatim
    pub leading: Option<String>,
    /// Trailing comment, verbatim
    pub trailing: Option<String>,
}

/// A resolved message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDecl {
    /// Interface name
    pub name: String,
    /// Fully-qualified protobuf name
    pub full_name: String,
    /// Leading comment, verbatim
    pub leading: Option<String>,
    /// Members in field declaration order
    pub members: Vec<Member>,
    /// Nested enums in declaration order
    pub enums: Vec<EnumDecl>,
    /// Nested messages in declaration order, map entries excluded
    pub messages: Vec<MessageDecl>,
    /// Synthetic map entries in the order of their map fields
    pub map_entries: Vec<MessageDecl>,
}

impl MessageDecl {
    fn has_nested(&self) -> bool {
        !(self.enums.is_empty() && self.messages.is_empty() && self.map_entries.is_empty())
    }
}

/// A resolved enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    /// Enum name
    pub name: String,
    /// Fully-qualified protobuf name
    pub full_name: String,
    /// Leading comment, verbatim
    pub leading: Option<String>,
    /// Members, one per distinct number, first-declared name kept
    pub members: Vec<EnumMember>,
}

/// One enum member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Member name
    pub name: String,
    /// Declared number
    pub number: i32,
    /// Leading comment, verbatim
    pub leading: Option<String>,
    /// Trailing comment, verbatim
    pub trailing: Option<String>,
}

/// A resolved service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDecl {
    /// Interface name (`<Service>Service`)
    pub name: String,
    /// Fully-qualified protobuf name
    pub full_name: String,
    /// Leading comment, verbatim
    pub leading: Option<String>,
    /// Methods in declaration order
    pub methods: Vec<MethodDecl>,
}

/// One service method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    /// Method name after casing
    pub name: String,
    /// Call signature
    pub signature: Signature,
    /// Leading comment, verbatim
    pub leading: Option<String>,
    /// Trailing comment, verbatim
    pub trailing: Option<String>,
}

/// An interface node (message shape)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceNode {
    /// Interface name
    pub name: String,
    /// Leading comment
    pub leading: Option<String>,
    /// Members
    pub members: Vec<Member>,
}

/// A namespace node holding nested declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNode {
    /// Namespace name
    pub name: String,
    /// Children in emission order
    pub children: Vec<Node>,
}

/// A node of the namespace tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A message interface
    Interface(InterfaceNode),
    /// An enum
    Enum(EnumDecl),
    /// A service interface
    Service(ServiceDecl),
    /// A message namespace
    Namespace(NamespaceNode),
}

impl Node {
    fn declared_name(&self) -> &str {
        match self {
            Node::Interface(i) => &i.name,
            Node::Enum(e) => &e.name,
            Node::Service(s) => &s.name,
            Node::Namespace(n) => &n.name,
        }
    }
}

/// The declarations of one output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTree {
    /// Package segments (`["grpc", "testing"]`); empty for no package
    pub package: Vec<String>,
    /// Top-level children in emission order
    pub children: Vec<Node>,
}

impl NamespaceTree {
    /// The dotted package chain
    pub fn package_name(&self) -> String {
        self.package.join(".")
    }
}

/// Assembles resolved declarations of one file into a namespace tree.
///
/// Top-level enums come first, then messages, then services, each group in
/// declaration order. Fails with [`Error::PackageConflict`] if two
/// declarations would claim the same name in one scope.
pub fn build(
    package: &str,
    file: &str,
    enums: Vec<EnumDecl>,
    messages: Vec<MessageDecl>,
    services: Vec<ServiceDecl>,
) -> Result<NamespaceTree> {
    let mut children = Vec::new();
    children.extend(enums.into_iter().map(Node::Enum));
    for message in messages {
        push_message(&mut children, message);
    }
    children.extend(services.into_iter().map(Node::Service));

    check_scope(package, file, &children)?;

    let package = package
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok(NamespaceTree { package, children })
}

fn push_message(out: &mut Vec<Node>, message: MessageDecl) {
    let has_nested = message.has_nested();
    let MessageDecl {
        name,
        leading,
        members,
        enums,
        messages,
        map_entries,
        ..
    } = message;

    out.push(Node::Interface(InterfaceNode {
        name: name.clone(),
        leading,
        members,
    }));

    if has_nested {
        let mut children = Vec::new();
        children.extend(enums.into_iter().map(Node::Enum));
        for nested in messages.into_iter().chain(map_entries) {
            push_message(&mut children, nested);
        }
        out.push(Node::Namespace(NamespaceNode { name, children }));
    }
}

/// Checks that names are unique per scope, recursing into namespaces.
///
/// An interface and the namespace right after it share a name on purpose;
/// any other repeat is a conflict.
fn check_scope(scope: &str, file: &str, children: &[Node]) -> Result<()> {
    let mut seen: HashMap<&str, &Node> = HashMap::new();

    for node in children {
        let name = node.declared_name();
        if let Some(previous) = seen.insert(name, node) {
            let merges = matches!(
                (previous, node),
                (Node::Interface(_), Node::Namespace(_))
            );
            if !merges {
                return Err(Error::package_conflict(join(scope, name), file));
            }
        }

        if let Node::Namespace(ns) = node {
            trace!("Checking scope {}", join(scope, &ns.name));
            check_scope(&join(scope, &ns.name), file, &ns.children)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CallShape;

    fn msg(name: &str) -> MessageDecl {
        MessageDecl {
            name: name.to_string(),
            full_name: format!("pkg.{}", name),
            leading: None,
            members: vec![],
            enums: vec![],
            messages: vec![],
            map_entries: vec![],
        }
    }

    fn enm(name: &str) -> EnumDecl {
        EnumDecl {
            name: name.to_string(),
            full_name: format!("pkg.{}", name),
            leading: None,
            members: vec![],
        }
    }

    fn svc(name: &str) -> ServiceDecl {
        ServiceDecl {
            name: name.to_string(),
            full_name: format!("pkg.{}", name),
            leading: None,
            methods: vec![MethodDecl {
                name: "Call".to_string(),
                signature: Signature {
                    shape: CallShape::Unary,
                    input: "A".to_string(),
                    output: "B".to_string(),
                    async_iterators: false,
                },
                leading: None,
                trailing: None,
            }],
        }
    }

    #[test]
    fn test_top_level_order() {
        let tree = build(
            "grpc.testing",
            "a.proto",
            vec![enm("Color")],
            vec![msg("Request"), msg("Response")],
            vec![svc("TestServiceService")],
        )
        .unwrap();

        assert_eq!(tree.package, vec!["grpc", "testing"]);
        assert_eq!(tree.package_name(), "grpc.testing");
        let names: Vec<_> = tree.children.iter().map(Node::declared_name).collect();
        assert_eq!(names, vec!["Color", "Request", "Response", "TestServiceService"]);
    }

    #[test]
    fn test_nested_types_stay_inside_parent_namespace() {
        let mut parent = msg("SearchRequest");
        parent.enums.push(enm("Corpus"));
        let mut child = msg("Inner");
        child.enums.push(enm("Deep"));
        parent.messages.push(child);
        parent.map_entries.push(msg("XyzEntry"));

        let tree = build("example", "a.proto", vec![], vec![parent], vec![]).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert!(matches!(&tree.children[0], Node::Interface(i) if i.name == "SearchRequest"));

        let Node::Namespace(ns) = &tree.children[1] else {
            panic!("expected namespace");
        };
        assert_eq!(ns.name, "SearchRequest");
        let names: Vec<_> = ns.children.iter().map(Node::declared_name).collect();
        assert_eq!(names, vec!["Corpus", "Inner", "Inner", "XyzEntry"]);
        assert!(matches!(&ns.children[2], Node::Namespace(inner) if inner.children.len() == 1));
    }

    #[test]
    fn test_message_without_nested_has_no_namespace() {
        let tree = build("", "a.proto", vec![], vec![msg("Plain")], vec![]).unwrap();
        assert!(tree.package.is_empty());
        assert_eq!(tree.children.len(), 1);
    }

    #[test]
    fn test_service_interface_conflict() {
        let err = build(
            "pkg",
            "a.proto",
            vec![],
            vec![msg("GreeterService")],
            vec![svc("GreeterService")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::PackageConflict { ref path, .. } if path == "pkg.GreeterService"));
    }

    #[test]
    fn test_nested_conflict_is_detected() {
        let mut parent = msg("Outer");
        parent.messages.push(msg("Twice"));
        parent.map_entries.push(msg("Twice"));
        let err = build("pkg", "a.proto", vec![], vec![parent], vec![]).unwrap_err();
        assert!(matches!(err, Error::PackageConflict { ref path, .. } if path == "pkg.Outer.Twice"));
    }
}
