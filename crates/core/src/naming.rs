//! Naming-case conversion and identifier escaping shared by the pipeline.
//!
//! Wire names are kept verbatim in the IR; every target derives its own
//! identifiers from them with the helpers below.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// TypeScript reserved words that cannot be used as identifiers.
pub static TS_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "import",
        "in",
        "instanceof",
        "new",
        "null",
        "return",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "let",
        "static",
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "await",
        "async",
    ]
    .into_iter()
    .collect()
});

/// Dart keywords and built-in identifiers.
pub static DART_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "abstract",
        "as",
        "assert",
        "async",
        "await",
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "covariant",
        "default",
        "deferred",
        "do",
        "dynamic",
        "else",
        "enum",
        "export",
        "extends",
        "extension",
        "external",
        "factory",
        "false",
        "final",
        "finally",
        "for",
        "function",
        "get",
        "hide",
        "if",
        "implements",
        "import",
        "in",
        "interface",
        "is",
        "late",
        "library",
        "mixin",
        "new",
        "null",
        "on",
        "operator",
        "part",
        "required",
        "rethrow",
        "return",
        "set",
        "show",
        "static",
        "super",
        "switch",
        "sync",
        "this",
        "throw",
        "true",
        "try",
        "typedef",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "values",
        "index",
        "hashCode",
        "toString",
        "runtimeType",
    ]
    .into_iter()
    .collect()
});

/// Go keywords and predeclared identifiers that would be shadowed.
pub static GO_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break",
        "case",
        "chan",
        "const",
        "continue",
        "default",
        "defer",
        "else",
        "fallthrough",
        "for",
        "func",
        "go",
        "goto",
        "if",
        "import",
        "interface",
        "map",
        "package",
        "range",
        "return",
        "select",
        "struct",
        "switch",
        "type",
        "var",
        "params",
        "writer",
        "request",
        "error",
    ]
    .into_iter()
    .collect()
});

/// Split a name into words on separators and case boundaries.
///
/// `"X-Request-ID"` yields `["X", "Request", "ID"]`, `"carColor"` yields
/// `["car", "Color"]` and `"HTTPServer"` yields `["HTTP", "Server"]`.
pub fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}

/// `car_color` / `car-color` / `carColor` -> `CarColor`.
pub fn to_pascal_case(name: &str) -> String {
    split_words(name).iter().map(|w| capitalize_word(w)).collect()
}

/// `car_color` / `CarColor` -> `carColor`.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::new();
    for (i, word) in split_words(name).iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize_word(word));
        }
    }
    out
}

/// `CarColor` -> `car_color`.
pub fn to_snake_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `CarColor` -> `car-color`.
pub fn to_kebab_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Make `candidate` a usable identifier: empty names get a placeholder,
/// leading digits get a prefix and reserved words get `suffix` appended.
pub fn escape_identifier(candidate: &str, reserved: &HashSet<&'static str>, suffix: &str) -> String {
    let mut result = if candidate.is_empty() {
        "value".to_string()
    } else {
        candidate.to_string()
    };
    if result.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        result = format!("n{result}");
    }
    if reserved.contains(result.as_str()) {
        result.push_str(suffix);
    }
    result
}

/// Check if an identifier needs bracket notation (or quoting) for property/key access.
///
/// Returns true if the name:
/// - Is empty
/// - Doesn't start with a letter, underscore, or dollar sign
/// - Contains characters other than alphanumeric, underscore, or dollar sign
pub fn needs_bracket_notation(name: &str) -> bool {
    name.is_empty()
        || !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape a string for use in JavaScript/TypeScript double-quoted literals.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a string for use in Dart single-quoted literals.
pub fn escape_dart_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'").replace('$', "\\$")
}

/// Escape a string for use in Go interpreted string literals.
pub fn escape_go_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a string if needed for use as a TypeScript property key.
pub fn quote_if_needed(name: &str) -> String {
    if needs_bracket_notation(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}

/// Suffix repeated names with their occurrence count (`Red`, `Red2`).
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_default();
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{name}{count}")
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("carColor"), vec!["car", "Color"]);
        assert_eq!(split_words("X-Request-ID"), vec!["X", "Request", "ID"]);
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("order_id"), vec!["order", "id"]);
        assert_eq!(split_words("v2Items"), vec!["v2", "Items"]);
        assert!(split_words("--").is_empty());
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_pascal_case("color"), "Color");
        assert_eq!(to_pascal_case("car_color"), "CarColor");
        assert_eq!(to_pascal_case("tenant-id"), "TenantId");
        assert_eq!(to_camel_case("X-Request-ID"), "xRequestId");
        assert_eq!(to_camel_case("OrderId"), "orderId");
        assert_eq!(to_snake_case("CarColor"), "car_color");
        assert_eq!(to_kebab_case("GetUser200Response"), "get-user200-response");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("foo"), "Foo");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("ABC"), "ABC");
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("class", &DART_RESERVED_WORDS, "_"), "class_");
        assert_eq!(escape_identifier("type", &GO_RESERVED_WORDS, "Value"), "typeValue");
        assert_eq!(escape_identifier("1st", &TS_RESERVED_WORDS, "_"), "n1st");
        assert_eq!(escape_identifier("", &TS_RESERVED_WORDS, "_"), "value");
        assert_eq!(escape_identifier("name", &DART_RESERVED_WORDS, "_"), "name");
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("foo"), "foo");
        assert_eq!(quote_if_needed("foo-bar"), "\"foo-bar\"");
        assert_eq!(quote_if_needed("123"), "\"123\"");
    }

    #[test]
    fn test_dedupe_names() {
        assert_eq!(
            dedupe_names(vec!["Red".into(), "Red".into(), "Blue".into()]),
            vec!["Red", "Red2", "Blue"]
        );
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(escape_js_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_dart_string("it's $5"), "it\\'s \\$5");
        assert_eq!(escape_go_string("a\\b"), "a\\\\b");
    }
}
