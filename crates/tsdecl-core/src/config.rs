//! Run-wide generation configuration.
//!
//! A [`Config`] is built once per run (usually from the plugin parameter
//! string protoc passes along) and threaded by reference through every
//! component. It is never mutated after generation starts.

use crate::error::{Error, Result};

/// How protobuf identifiers are cased in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    /// Identifiers are emitted exactly as declared
    Verbatim,
    /// Field and method names are converted to lowerCamelCase
    #[default]
    CamelCase,
}

/// How enum members are assigned values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumRepresentation {
    /// Each member's value is its own name as a string literal
    #[default]
    String,
    /// Each member's value is its declared number
    Numeric,
}

/// Configuration for declaration generation
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier casing policy
    pub naming: NamingMode,
    /// Enum member value policy
    pub enum_representation: EnumRepresentation,
    /// Map 64-bit integer kinds to `string` instead of `number`
    pub int64_as_string: bool,
    /// Use `AsyncIterator` types for streaming methods
    pub async_iterators: bool,
    /// Wrap each package in `declare namespace` (otherwise `export namespace`)
    pub declare_namespace: bool,
    /// Indentation string (default: 4 spaces)
    pub indent_str: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming: NamingMode::default(),
            enum_representation: EnumRepresentation::default(),
            int64_as_string: false,
            async_iterators: false,
            declare_namespace: true,
            indent_str: "    ".to_string(),
        }
    }
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the naming mode
    pub fn naming(mut self, naming: NamingMode) -> Self {
        self.naming = naming;
        self
    }

    /// Sets the enum representation
    pub fn enum_representation(mut self, repr: EnumRepresentation) -> Self {
        self.enum_representation = repr;
        self
    }

    /// Sets whether 64-bit integers are emitted as strings
    pub fn int64_as_string(mut self, enabled: bool) -> Self {
        self.int64_as_string = enabled;
        self
    }

    /// Sets whether streaming methods use async iterators
    pub fn async_iterators(mut self, enabled: bool) -> Self {
        self.async_iterators = enabled;
        self
    }

    /// Sets whether packages are wrapped in `declare namespace`
    pub fn declare_namespace(mut self, enabled: bool) -> Self {
        self.declare_namespace = enabled;
        self
    }

    /// Sets the indentation string
    pub fn indent_str(mut self, s: impl Into<String>) -> Self {
        self.indent_str = s.into();
        self
    }

    /// Parses a protoc plugin parameter string.
    ///
    /// The format is a comma-separated list of `key=value` pairs; a bare key
    /// is shorthand for `key=true`. An empty string yields the defaults.
    ///
    /// ```
    /// use tsdecl_core::{Config, EnumRepresentation, NamingMode};
    ///
    /// let config = Config::from_parameter("naming=verbatim,int_enums").unwrap();
    /// assert_eq!(config.naming, NamingMode::Verbatim);
    /// assert_eq!(config.enum_representation, EnumRepresentation::Numeric);
    /// ```
    pub fn from_parameter(parameter: &str) -> Result<Self> {
        let mut config = Self::default();

        for part in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (part, "true"),
            };

            match key {
                "naming" => {
                    config.naming = match value {
                        "verbatim" | "original" => NamingMode::Verbatim,
                        "camelCase" | "camel_case" | "camel" => NamingMode::CamelCase,
                        _ => return Err(Error::invalid_parameter(key, value)),
                    };
                }
                "original_names" => {
                    config.naming = if parse_bool(key, value)? {
                        NamingMode::Verbatim
                    } else {
                        NamingMode::CamelCase
                    };
                }
                "enum_representation" | "enumRepresentation" => {
                    config.enum_representation = match value {
                        "string" => EnumRepresentation::String,
                        "numeric" | "int" => EnumRepresentation::Numeric,
                        _ => return Err(Error::invalid_parameter(key, value)),
                    };
                }
                "int_enums" => {
                    config.enum_representation = if parse_bool(key, value)? {
                        EnumRepresentation::Numeric
                    } else {
                        EnumRepresentation::String
                    };
                }
                "int64_string" => config.int64_as_string = parse_bool(key, value)?,
                "async_iterators" => config.async_iterators = parse_bool(key, value)?,
                "declare_namespace" => config.declare_namespace = parse_bool(key, value)?,
                _ => return Err(Error::invalid_parameter(key, value)),
            }
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::invalid_parameter(key, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_parameter("").unwrap();
        assert_eq!(config.naming, NamingMode::CamelCase);
        assert_eq!(config.enum_representation, EnumRepresentation::String);
        assert!(config.declare_namespace);
        assert!(!config.async_iterators);
        assert!(!config.int64_as_string);
    }

    #[test]
    fn test_parse_all_keys() {
        let config = Config::from_parameter(
            "naming=verbatim, enumRepresentation=numeric,int64_string,async_iterators=true,declare_namespace=false",
        )
        .unwrap();
        assert_eq!(config.naming, NamingMode::Verbatim);
        assert_eq!(config.enum_representation, EnumRepresentation::Numeric);
        assert!(config.int64_as_string);
        assert!(config.async_iterators);
        assert!(!config.declare_namespace);
    }

    #[test]
    fn test_legacy_aliases() {
        let config = Config::from_parameter("original_names=true,int_enums=true").unwrap();
        assert_eq!(config.naming, NamingMode::Verbatim);
        assert_eq!(config.enum_representation, EnumRepresentation::Numeric);

        let config = Config::from_parameter("original_names=false").unwrap();
        assert_eq!(config.naming, NamingMode::CamelCase);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            Config::from_parameter("naming=kebab"),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            Config::from_parameter("int_enums=maybe"),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            Config::from_parameter("outpattern=x"),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
