//! Sensitive-field declarations
//!
//! An allowlist names the fields of one entity shape that carry sensitive
//! text. Nested rules apply to a nested object or to every object inside a
//! list, to any depth. Anything not named here is never encrypted.

use std::fmt;

/// How a named field is treated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Text leaf (or list of text leaves) that is always encrypted
    Text,
    /// Text leaf encrypted only when at least this many characters long
    TextMinLength(usize),
    /// Object, or list of objects, with its own allowlist
    Nested(FieldAllowlist),
}

/// The sensitive fields of one record shape
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldAllowlist {
    rules: Vec<(String, FieldRule)>,
}

impl FieldAllowlist {
    /// Create an empty allowlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a text field as sensitive
    pub fn text(self, name: impl Into<String>) -> Self {
        self.rule(name, FieldRule::Text)
    }

    /// Mark a text field as sensitive once it reaches `min_len` characters
    pub fn text_min_length(self, name: impl Into<String>, min_len: usize) -> Self {
        self.rule(name, FieldRule::TextMinLength(min_len))
    }

    /// Declare sensitive fields inside a nested object or list of objects
    pub fn nested(self, name: impl Into<String>, inner: FieldAllowlist) -> Self {
        self.rule(name, FieldRule::Nested(inner))
    }

    fn rule(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        match self.rules.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = rule,
            None => self.rules.push((name, rule)),
        }
        self
    }

    /// Look up the rule for a field
    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|(k, _)| k == name).map(|(_, r)| r)
    }

    /// Check if no field is sensitive
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every sensitive leaf as a dotted path, e.g. `sessions.exercises.notes`
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, rule) in &self.rules {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            match rule {
                FieldRule::Text => out.push(path),
                FieldRule::TextMinLength(n) => out.push(format!("{} (>= {} chars)", path, n)),
                FieldRule::Nested(inner) => inner.collect_paths(&path, out),
            }
        }
    }
}

impl fmt::Display for FieldAllowlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.paths().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_lookup() {
        let allowlist = FieldAllowlist::new()
            .text("description")
            .text_min_length("referenceNumber", 10);

        assert_eq!(allowlist.get("description"), Some(&FieldRule::Text));
        assert_eq!(
            allowlist.get("referenceNumber"),
            Some(&FieldRule::TextMinLength(10))
        );
        assert!(allowlist.get("amount").is_none());
    }

    #[test]
    fn test_redeclaring_replaces_rule() {
        let allowlist = FieldAllowlist::new().text("name").text_min_length("name", 4);
        assert_eq!(allowlist.get("name"), Some(&FieldRule::TextMinLength(4)));
        assert_eq!(allowlist.paths().len(), 1);
    }

    #[test]
    fn test_nested_paths() {
        let allowlist = FieldAllowlist::new().text("name").nested(
            "sessions",
            FieldAllowlist::new().nested("exercises", FieldAllowlist::new().text("notes")),
        );

        assert_eq!(
            allowlist.paths(),
            vec!["name".to_string(), "sessions.exercises.notes".to_string()]
        );
        assert_eq!(allowlist.to_string(), "name, sessions.exercises.notes");
    }

    #[test]
    fn test_empty() {
        assert!(FieldAllowlist::new().is_empty());
        assert!(FieldAllowlist::new().paths().is_empty());
    }
}
