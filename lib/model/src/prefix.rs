use crate::ModelError;
use oxiri::Iri;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

static PREFIX_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+$").expect("valid regex"));

/// An RDF prefix declaration, e.g. `@prefix geo: <http://www.opengis.net/ont/geosparql#> .`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix {
    prefix: String,
    iri: String,
}

impl Prefix {
    /// Creates a new prefix declaration.
    ///
    /// The prefix name must consist of alphanumerics and underscores only. The IRI must be an
    /// `http` or `https` URL with a hostname and at least `/` as its path.
    pub fn new(prefix: impl Into<String>, iri: impl Into<String>) -> Result<Self, ModelError> {
        let prefix = prefix.into();
        let iri = iri.into();
        if !PREFIX_NAME.is_match(&prefix) {
            return Err(ModelError::InvalidPrefixName(prefix));
        }

        let parsed = Iri::parse(iri.as_str()).map_err(|source| ModelError::InvalidIri {
            iri: iri.clone(),
            source,
        })?;
        let has_host = parsed.authority().is_some_and(|a| !a.is_empty());
        if !matches!(parsed.scheme(), "http" | "https") || !has_host || !parsed.path().starts_with('/')
        {
            return Err(ModelError::UnsupportedIri(iri));
        }

        Ok(Self { prefix, iri })
    }

    /// Creates a prefix that is known to be valid at compile time.
    pub(crate) fn new_unchecked(prefix: &str, iri: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            iri: iri.to_owned(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }
}

impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "@prefix {}: <{}> .", self.prefix, self.iri)
    }
}

/// The set of prefixes that are declared at the top of an output file.
///
/// A registry starts with the prefixes every converter relies on (`rdfs`, `geo`, `xsd`, `dct`).
/// Further prefixes should be added before the first triple is written.
#[derive(Clone, Debug)]
pub struct PrefixRegistry {
    prefixes: BTreeMap<String, Prefix>,
}

impl PrefixRegistry {
    /// Creates a registry that only contains the default prefixes.
    pub fn new() -> Self {
        let mut prefixes = BTreeMap::new();
        for prefix in crate::vocab::default_prefixes() {
            prefixes.insert(prefix.prefix.clone(), prefix);
        }
        Self { prefixes }
    }

    /// Creates a registry without any prefixes.
    pub fn empty() -> Self {
        Self {
            prefixes: BTreeMap::new(),
        }
    }

    /// Adds a prefix. Adding an identical declaration twice is a no-op, re-declaring a prefix
    /// with a different IRI fails.
    pub fn add(&mut self, prefix: Prefix) -> Result<(), ModelError> {
        match self.prefixes.get(&prefix.prefix) {
            Some(existing) if existing.iri != prefix.iri => Err(ModelError::ConflictingPrefix {
                prefix: prefix.prefix,
                existing: existing.iri.clone(),
                new: prefix.iri,
            }),
            Some(_) => Ok(()),
            None => {
                self.prefixes.insert(prefix.prefix.clone(), prefix);
                Ok(())
            }
        }
    }

    /// Parses and adds a prefix.
    pub fn declare(&mut self, prefix: &str, iri: &str) -> Result<(), ModelError> {
        self.add(Prefix::new(prefix, iri)?)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prefix> {
        self.prefixes.values()
    }

    /// Returns the Turtle declarations of all prefixes, sorted by their textual representation.
    pub fn declarations(&self) -> Vec<String> {
        let mut result = self
            .prefixes
            .values()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        result.sort();
        result
    }
}

impl Default for PrefixRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefix() {
        let prefix = Prefix::new("abc", "http://example.com/abc#").unwrap();
        assert_eq!(prefix.to_string(), "@prefix abc: <http://example.com/abc#> .\n");
    }

    #[test]
    fn rejects_invalid_prefixes() {
        assert!(Prefix::new("", "").is_err());
        assert!(Prefix::new("abc:", "http://example.com/").is_err());
        assert!(Prefix::new("abc", "http://example.com").is_err());
        assert!(Prefix::new("abc", "http://").is_err());
        assert!(Prefix::new("abc", "ftp://example.com/").is_err());
        assert!(Prefix::new("abc", "**!!%$").is_err());
    }

    #[test]
    fn equal_prefixes() {
        let p1 = Prefix::new("xyz", "http://example.com/xyz#").unwrap();
        let p2 = Prefix::new("xyz", "http://example.com/xyz#").unwrap();
        let p3 = Prefix::new("abc", "http://example.com/xyz#").unwrap();
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
    }

    #[test]
    fn registry_rejects_conflicting_iri() {
        let mut registry = PrefixRegistry::new();
        registry.declare("abc", "http://example.com/abc#").unwrap();
        registry.declare("abc", "http://example.com/abc#").unwrap();
        let err = registry
            .declare("abc", "http://example.com/xyz#")
            .unwrap_err();
        assert!(matches!(err, ModelError::ConflictingPrefix { .. }));
    }

    #[test]
    fn registry_declarations_are_sorted() {
        let mut registry = PrefixRegistry::empty();
        registry.declare("xyz", "http://example.com/xyz#").unwrap();
        registry.declare("abc", "http://example.com/abc#").unwrap();
        assert_eq!(
            registry.declarations(),
            vec![
                "@prefix abc: <http://example.com/abc#> .\n",
                "@prefix xyz: <http://example.com/xyz#> .\n"
            ]
        );
    }

    #[test]
    fn registry_has_default_prefixes() {
        let registry = PrefixRegistry::new();
        for prefix in ["rdfs", "geo", "xsd", "dct"] {
            assert!(registry.contains(prefix), "missing {prefix}");
        }
    }
}
