//! Comment lookup from `source_code_info`.
//!
//! protoc identifies each declaration by a path of descriptor field numbers
//! and element indices, e.g. `[4, 0, 2, 1]` is the second field of the first
//! top-level message.

use prost_types::FileDescriptorProto;
use std::collections::HashMap;

/// `FileDescriptorProto.message_type`
pub const FILE_MESSAGE: i32 = 4;
/// `FileDescriptorProto.enum_type`
pub const FILE_ENUM: i32 = 5;
/// `FileDescriptorProto.service`
pub const FILE_SERVICE: i32 = 6;
/// `DescriptorProto.field`
pub const MESSAGE_FIELD: i32 = 2;
/// `DescriptorProto.nested_type`
pub const MESSAGE_NESTED: i32 = 3;
/// `DescriptorProto.enum_type`
pub const MESSAGE_ENUM: i32 = 4;
/// `EnumDescriptorProto.value`
pub const ENUM_VALUE: i32 = 2;
/// `ServiceDescriptorProto.method`
pub const SERVICE_METHOD: i32 = 2;

/// Comments attached to one declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    /// Comment block immediately above the declaration
    pub leading: Option<String>,
    /// Comment on the same line (or the line after)
    pub trailing: Option<String>,
}

/// Comments of a file, keyed by location path
#[derive(Debug, Default)]
pub struct CommentMap {
    by_path: HashMap<Vec<i32>, Comments>,
}

impl CommentMap {
    /// Collects comments from a file's source code info
    pub fn from_file(file: &FileDescriptorProto) -> Self {
        let mut by_path = HashMap::new();
        if let Some(info) = &file.source_code_info {
            for location in &info.location {
                let leading = location.leading_comments.clone().filter(|c| !c.is_empty());
                let trailing = location.trailing_comments.clone().filter(|c| !c.is_empty());
                if leading.is_none() && trailing.is_none() {
                    continue;
                }
                by_path
                    .entry(location.path.clone())
                    .or_insert(Comments { leading, trailing });
            }
        }
        Self { by_path }
    }

    /// Comments for a path, if any
    pub fn get(&self, path: &[i32]) -> Comments {
        self.by_path.get(path).cloned().unwrap_or_default()
    }
}

/// Appends `(kind, index)` to a location path
pub fn child(path: &[i32], kind: i32, index: usize) -> Vec<i32> {
    let mut path = path.to_vec();
    path.push(kind);
    path.push(index as i32);
    path
}
