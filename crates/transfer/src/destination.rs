//! Destination resolution.
//!
//! Two textual forms resolve to a [`Destination`]:
//!
//! - an instance URL such as `https://ci.example/view/all/job/build/configure`,
//!   matched against `^(.*?/)(?:view/[^/]+/)*<kind>/([^/]+).*`
//! - a library-relative reference `<base>::<entity>`, where the part after
//!   `::` names the entity regardless of what `<base>` looks like

use crate::error::{Error, Result};
use crate::kind::Kind;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Separator of the library-relative address form
pub const LIBRARY_SEPARATOR: &str = "::";

/// Resolved location of one entity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    host: String,
    entity: String,
}

impl Destination {
    /// Build a destination, normalizing `host` to end in `/`.
    pub fn new(host: impl Into<String>, entity: impl Into<String>) -> Self {
        let mut host = host.into();
        if !host.ends_with('/') {
            host.push('/');
        }
        Self {
            host,
            entity: entity.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Entity name; empty when resolved leniently from an unmatched address.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn has_entity(&self) -> bool {
        !self.entity.is_empty()
    }

    /// Canonical URL of the entity, e.g. `https://ci.example/job/build`.
    pub fn url(&self, kind: Kind) -> String {
        format!("{}{}/{}", self.host, kind.url_segment(), self.entity)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entity.is_empty() {
            write!(f, "{}", self.host)
        } else {
            write!(f, "{} on {}", self.entity, self.host)
        }
    }
}

/// Kind-specific address resolver.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    kind: Kind,
    lenient: bool,
}

impl Resolver {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            lenient: false,
        }
    }

    /// Lenient resolution accepts addresses without an entity, yielding an
    /// empty entity instead of [`Error::UnresolvedAddress`].
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Resolve one address.
    pub fn resolve(&self, address: &str) -> Result<Destination> {
        let resolved = match address.split_once(LIBRARY_SEPARATOR) {
            Some((base, segment)) => {
                let matched = self.match_grammar(base);
                let host = matched
                    .as_ref()
                    .map_or_else(|| base.to_string(), |(host, _)| host.clone());
                let entity = if segment.is_empty() {
                    matched.map(|(_, entity)| entity).unwrap_or_default()
                } else {
                    segment.to_string()
                };
                Destination::new(host, entity)
            }
            None => match self.match_grammar(address) {
                Some((host, entity)) => Destination::new(host, entity),
                None => Destination::new(address, ""),
            },
        };

        if !resolved.has_entity() && !self.lenient {
            return Err(Error::UnresolvedAddress(address.to_string()));
        }

        log::trace!("Resolved '{}' to {}", address, resolved);
        Ok(resolved)
    }

    /// Resolve every address, failing on the first unresolvable one.
    pub fn resolve_all<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Vec<Destination>> {
        addresses.iter().map(|a| self.resolve(a.as_ref())).collect()
    }

    fn match_grammar(&self, address: &str) -> Option<(String, String)> {
        let captures = pattern(self.kind).captures(address)?;
        let host = captures.get(1)?.as_str().to_string();
        let entity = captures.get(2)?.as_str().to_string();
        Some((host, entity))
    }
}

fn pattern(kind: Kind) -> &'static Regex {
    static JOB: OnceLock<Regex> = OnceLock::new();
    static VIEW: OnceLock<Regex> = OnceLock::new();
    static NODE: OnceLock<Regex> = OnceLock::new();

    let cell = match kind {
        Kind::Job => &JOB,
        Kind::View => &VIEW,
        Kind::Node => &NODE,
    };

    cell.get_or_init(|| {
        Regex::new(&format!(
            r"^(.*?/)(?:view/[^/]+/)*{}/([^/]+).*$",
            kind.grammar()
        ))
        .expect("valid regex")
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Resolver {
        Resolver::new(Kind::Job)
    }

    #[test]
    fn test_resolve_plain_job_url() {
        let dst = job().resolve("https://ci.example/job/build").unwrap();
        assert_eq!(dst.host(), "https://ci.example/");
        assert_eq!(dst.entity(), "build");
    }

    #[test]
    fn test_resolve_discards_views_and_trailing_path() {
        let dst = job()
            .resolve("https://ci.example/jenkins/view/all/view/nested/job/build/configure")
            .unwrap();
        assert_eq!(dst.host(), "https://ci.example/jenkins/");
        assert_eq!(dst.entity(), "build");
    }

    #[test]
    fn test_resolved_url_is_prefix_of_address() {
        let addresses = [
            "https://ci.example/job/build",
            "https://ci.example/job/build/",
            "http://host:8080/prefix/job/deploy-prod/lastBuild/console",
            "https://ci.example/job/folder/job/inner",
        ];
        for address in addresses {
            let dst = job().resolve(address).unwrap();
            assert!(
                address.starts_with(&dst.url(Kind::Job)),
                "{} is not a prefix of {}",
                dst.url(Kind::Job),
                address
            );
        }
    }

    #[test]
    fn test_resolve_view_takes_last_view_segment() {
        let dst = Resolver::new(Kind::View)
            .resolve("https://ci.example/view/outer/view/inner/")
            .unwrap();
        assert_eq!(dst.host(), "https://ci.example/");
        assert_eq!(dst.entity(), "inner");
    }

    #[test]
    fn test_resolve_node_accepts_computer_and_node() {
        let resolver = Resolver::new(Kind::Node);
        let a = resolver.resolve("https://ci.example/computer/agent-1/").unwrap();
        let b = resolver.resolve("https://ci.example/node/agent-1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.url(Kind::Node), "https://ci.example/computer/agent-1");
    }

    #[test]
    fn test_strict_resolution_rejects_unmatched_address() {
        let err = job().resolve("https://ci.example/").unwrap_err();
        assert!(matches!(err, Error::UnresolvedAddress(a) if a == "https://ci.example/"));
    }

    #[test]
    fn test_lenient_resolution_keeps_address_as_host() {
        let dst = job().lenient(true).resolve("https://ci.example").unwrap();
        assert_eq!(dst.host(), "https://ci.example/");
        assert!(!dst.has_entity());
    }

    #[test]
    fn test_library_relative_entity_is_segment() {
        for base in ["https://ci.example/", "https://ci.example/job/other", "staging", ""] {
            let dst = job().resolve(&format!("{base}::my job")).unwrap();
            assert_eq!(dst.entity(), "my job");
        }
    }

    #[test]
    fn test_library_relative_host() {
        let dst = job().resolve("https://ci.example::build").unwrap();
        assert_eq!(dst.host(), "https://ci.example/");

        let dst = job().resolve("https://ci.example/job/x/::build").unwrap();
        assert_eq!(dst.host(), "https://ci.example/");
        assert_eq!(dst.entity(), "build");
    }

    #[test]
    fn test_library_relative_empty_segment_uses_grammar() {
        let dst = job().resolve("https://ci.example/job/x::").unwrap();
        assert_eq!(dst.entity(), "x");

        assert!(job().resolve("https://ci.example/::").is_err());
        assert!(job().lenient(true).resolve("https://ci.example/::").is_ok());
    }

    #[test]
    fn test_resolve_all_fails_on_first_bad_address() {
        let result = job().resolve_all(&["https://a.example/job/x", "nonsense"]);
        assert!(matches!(result, Err(Error::UnresolvedAddress(a)) if a == "nonsense"));
    }

    #[test]
    fn test_display() {
        let dst = Destination::new("https://ci.example", "build");
        assert_eq!(dst.to_string(), "build on https://ci.example/");
    }
}
