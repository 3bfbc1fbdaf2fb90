//! Identifier casing.

use crate::config::NamingMode;

/// What an identifier names, which decides whether casing applies to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// A message interface name
    Message,
    /// An enum type name
    Enum,
    /// An enum member name
    EnumValue,
    /// A message field (interface member) name
    Field,
    /// A service interface name
    Service,
    /// An RPC method name
    Method,
}

/// Applies the run's naming mode to an identifier.
///
/// Type identifiers and enum members are always kept verbatim, since other
/// declarations refer to them by their protobuf name.
pub fn transform(identifier: &str, kind: NameKind, mode: NamingMode) -> String {
    match (mode, kind) {
        (NamingMode::CamelCase, NameKind::Field | NameKind::Method) => {
            to_lower_camel_case(identifier)
        }
        _ => identifier.to_string(),
    }
}

/// Convert a snake_case name to lowerCamelCase.
///
/// Empty segments (leading, trailing or doubled underscores) are dropped.
/// Only the first character of each segment is touched.
pub fn to_lower_camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for (i, segment) in s.split('_').filter(|seg| !seg.is_empty()).enumerate() {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                result.push(first.to_ascii_lowercase());
            } else {
                result.push(first.to_ascii_uppercase());
            }
            result.push_str(chars.as_str());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_lower_camel_case() {
        assert_eq!(to_lower_camel_case("hello_world"), "helloWorld");
        assert_eq!(to_lower_camel_case("fill_oauth_scope"), "fillOauthScope");
        assert_eq!(to_lower_camel_case("simple"), "simple");
        assert_eq!(to_lower_camel_case("GetFeature"), "getFeature");
    }

    #[test]
    fn test_preserves_internal_capitals() {
        assert_eq!(to_lower_camel_case("user_ID_value"), "userIDValue");
        assert_eq!(to_lower_camel_case("httpURL"), "httpURL");
    }

    #[test]
    fn test_empty_segments() {
        assert_eq!(to_lower_camel_case("_private_name"), "privateName");
        assert_eq!(to_lower_camel_case("a__b_"), "aB");
        assert_eq!(to_lower_camel_case(""), "");
    }

    #[test]
    fn test_transform_by_kind() {
        let camel = NamingMode::CamelCase;
        assert_eq!(transform("page_number", NameKind::Field, camel), "pageNumber");
        assert_eq!(transform("ListFeatures", NameKind::Method, camel), "listFeatures");
        assert_eq!(transform("Search_Request", NameKind::Message, camel), "Search_Request");
        assert_eq!(transform("NOT_SET", NameKind::EnumValue, camel), "NOT_SET");

        let verbatim = NamingMode::Verbatim;
        assert_eq!(transform("page_number", NameKind::Field, verbatim), "page_number");
        assert_eq!(transform("ListFeatures", NameKind::Method, verbatim), "ListFeatures");
    }
}
