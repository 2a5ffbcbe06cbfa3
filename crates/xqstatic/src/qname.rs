//
// qname.rs
//
// Qualified names: lexical QNames (`p:local`) and URI-qualified names (`Q{uri}local`)
//

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A qualified name as written, optionally with its expanded namespace.
///
/// `namespace` is `None` when the name has not been expanded (or is in no
/// namespace); it is always set for URI-qualified names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace: Option<String>,
}

fn lexical_qname_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:([\p{L}_][\p{L}\p{N}_.\-]*):)?([\p{L}_][\p{L}\p{N}_.\-]*)$")
            .expect("lexical QName pattern is valid")
    })
}

fn uri_qualified_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Q\{([^{}]*)\}([\p{L}_][\p{L}\p{N}_.\-]*)$")
            .expect("URI-qualified name pattern is valid")
    })
}

impl QualifiedName {
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local_name: local_name.into(),
            namespace: None,
        }
    }

    pub fn expanded(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: Some(namespace.into()),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Parse a name token.
    ///
    /// Returns `None` for lexemes that are not a valid EQName, such as
    /// `:true`, `fn:` or the empty string.
    ///
    /// # Examples
    ///
    /// ```
    /// use xqstatic::qname::QualifiedName;
    ///
    /// let name = QualifiedName::parse("fn:true").unwrap();
    /// assert_eq!(name.prefix.as_deref(), Some("fn"));
    /// assert_eq!(name.local_name, "true");
    ///
    /// let name = QualifiedName::parse("Q{http://www.w3.org/2005/xpath-functions}false").unwrap();
    /// assert_eq!(name.namespace.as_deref(), Some("http://www.w3.org/2005/xpath-functions"));
    ///
    /// assert!(QualifiedName::parse(":true").is_none());
    /// ```
    pub fn parse(lexeme: &str) -> Option<Self> {
        let lexeme = lexeme.trim();
        if let Some(caps) = uri_qualified_regex().captures(lexeme) {
            return Some(Self::expanded(caps[1].trim(), &caps[2]));
        }
        let caps = lexical_qname_regex().captures(lexeme)?;
        Some(Self {
            prefix: caps.get(1).map(|m| m.as_str().to_string()),
            local_name: caps[2].to_string(),
            namespace: None,
        })
    }

    /// True for `Q{uri}local` names, whose namespace needs no resolution.
    pub fn is_uri_qualified(&self) -> bool {
        self.prefix.is_none() && self.namespace.is_some()
    }

    /// Compare expanded names (namespace + local name), ignoring prefixes.
    pub fn matches_expanded(&self, other: &QualifiedName) -> bool {
        self.local_name == other.local_name
            && self.namespace.as_deref().unwrap_or("") == other.namespace.as_deref().unwrap_or("")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, &self.namespace) {
            (Some(prefix), _) => write!(f, "{}:{}", prefix, self.local_name),
            (None, Some(ns)) => write!(f, "Q{{{}}}{}", ns, self.local_name),
            (None, None) => f.write_str(&self.local_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unprefixed() {
        let name = QualifiedName::parse("test").unwrap();
        assert_eq!(name, QualifiedName::local("test"));
    }

    #[test]
    fn test_parse_prefixed_with_hyphens() {
        let name = QualifiedName::parse("json:transform-to-json").unwrap();
        assert_eq!(name, QualifiedName::prefixed("json", "transform-to-json"));
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        for lexeme in ["", ":true", "fn:", "a:b:c", "1abc", "Q{unterminated"] {
            assert!(QualifiedName::parse(lexeme).is_none(), "{lexeme:?} should not parse");
        }
    }

    #[test]
    fn test_uri_qualified_name_with_empty_namespace() {
        let name = QualifiedName::parse("Q{}local").unwrap();
        assert!(name.is_uri_qualified());
        assert_eq!(name.namespace.as_deref(), Some(""));
    }

    #[test]
    fn test_matches_expanded_ignores_prefix() {
        let a = QualifiedName::prefixed("fn", "true").with_namespace("urn:x");
        let b = QualifiedName::prefixed("other", "true").with_namespace("urn:x");
        assert!(a.matches_expanded(&b));
        assert!(!a.matches_expanded(&QualifiedName::expanded("urn:y", "true")));
        assert!(QualifiedName::local("x").matches_expanded(&QualifiedName::expanded("", "x")));
    }

    #[test]
    fn test_display() {
        assert_eq!(QualifiedName::prefixed("xs", "string").to_string(), "xs:string");
        assert_eq!(QualifiedName::expanded("urn:a", "f").to_string(), "Q{urn:a}f");
        assert_eq!(QualifiedName::local("x").to_string(), "x");
    }
}
