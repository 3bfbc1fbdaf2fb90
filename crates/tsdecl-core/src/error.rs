//! Error types for the tsdecl-core library.
//!
//! Every failure is fatal to the output file (or run) that triggered it. The
//! core never logs errors itself; it returns them with enough context
//! (qualified name, file, field) for the caller to report them.

use thiserror::Error;

/// Result type alias for tsdecl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all tsdecl operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Two descriptors declare the same fully-qualified type name
    #[error("duplicate type name '{name}': declared in '{first_file}' and '{second_file}'")]
    DuplicateTypeName {
        /// Fully-qualified type name, without leading dot
        name: String,
        /// File that declared the name first
        first_file: String,
        /// File that declared it again
        second_file: String,
    },

    /// A file imports a path that is not part of the request
    #[error("file '{file}' imports '{import}', which is not present in the request")]
    UnknownImport {
        /// Importing file
        file: String,
        /// Missing import path
        import: String,
    },

    /// A type reference does not name any indexed message or enum
    #[error("unresolved type '{name}' referenced from '{file}' ({context})")]
    UnresolvedType {
        /// The reference as written in the descriptor
        name: String,
        /// File containing the reference
        file: String,
        /// Field or method holding the reference
        context: String,
    },

    /// Two declarations claim incompatible nesting for the same path
    #[error("package conflict at '{path}' in '{file}'")]
    PackageConflict {
        /// Conflicting qualified path
        path: String,
        /// File being assembled
        file: String,
    },

    /// A field construct the type mapper has no rule for
    #[error("unsupported field shape for '{message}.{field}' in '{file}': {details}")]
    UnsupportedFieldShape {
        /// Qualified name of the owning message
        message: String,
        /// Field name
        field: String,
        /// File declaring the message
        file: String,
        /// What is wrong with the field
        details: String,
    },

    /// A plugin parameter key or value was not recognized
    #[error("invalid parameter '{key}={value}'")]
    InvalidParameter {
        /// Parameter key
        key: String,
        /// Parameter value as given
        value: String,
    },

    /// A file listed for generation has no descriptor in the request
    #[error("file to generate '{file}' has no descriptor in the request")]
    UnknownFileToGenerate {
        /// The requested file name
        file: String,
    },

    /// Failed to decode the serialized request
    #[error("failed to decode request: {0}")]
    RequestDecode(#[from] prost::DecodeError),
}

impl Error {
    /// Creates a new duplicate type name error
    pub fn duplicate_type_name(
        name: impl Into<String>,
        first_file: impl Into<String>,
        second_file: impl Into<String>,
    ) -> Self {
        Self::DuplicateTypeName {
            name: name.into(),
            first_file: first_file.into(),
            second_file: second_file.into(),
        }
    }

    /// Creates a new unknown import error
    pub fn unknown_import(file: impl Into<String>, import: impl Into<String>) -> Self {
        Self::UnknownImport {
            file: file.into(),
            import: import.into(),
        }
    }

    /// Creates a new unresolved type error
    pub fn unresolved_type(
        name: impl Into<String>,
        file: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::UnresolvedType {
            name: name.into(),
            file: file.into(),
            context: context.into(),
        }
    }

    /// Creates a new package conflict error
    pub fn package_conflict(path: impl Into<String>, file: impl Into<String>) -> Self {
        Self::PackageConflict {
            path: path.into(),
            file: file.into(),
        }
    }

    /// Creates a new unsupported field shape error
    pub fn unsupported_field_shape(
        message: impl Into<String>,
        field: impl Into<String>,
        file: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::UnsupportedFieldShape {
            message: message.into(),
            field: field.into(),
            file: file.into(),
            details: details.into(),
        }
    }

    /// Creates a new invalid parameter error
    pub fn invalid_parameter(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateTypeName { .. } => "DuplicateTypeName",
            Self::UnknownImport { .. } => "UnknownImport",
            Self::UnresolvedType { .. } => "UnresolvedType",
            Self::PackageConflict { .. } => "PackageConflict",
            Self::UnsupportedFieldShape { .. } => "UnsupportedFieldShape",
            Self::InvalidParameter { .. } => "InvalidParameter",
            Self::UnknownFileToGenerate { .. } => "UnknownFileToGenerate",
            Self::RequestDecode(_) => "RequestDecode",
        }
    }
}
