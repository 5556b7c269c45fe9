//! Parameter sources.
//!
//! Routing layers store path and query parameters in their own bag types.
//! The pipeline never names those types: it hands an opaque `&dyn Any` to the
//! [`SourceRegistry`], which finds the adapter registered for the concrete
//! type and asks it for a value through the [`ParamSource`] capability.
//!
//! Supporting a new router means implementing [`ParamSource`] for its bag
//! type and registering it:
//!
//! ```rust
//! use hrr::{ParamSource, SourceRegistry};
//! use std::borrow::Cow;
//!
//! struct LegacyParams(Vec<String>);
//!
//! impl ParamSource for LegacyParams {
//!     fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
//!         self.0
//!             .iter()
//!             .find_map(|kv| kv.strip_prefix(name)?.strip_prefix('='))
//!             .map(Cow::Borrowed)
//!     }
//! }
//!
//! let mut registry = SourceRegistry::default();
//! registry.register::<LegacyParams>();
//!
//! let params = LegacyParams(vec!["id=9".to_string()]);
//! let value = registry.resolve(&params, "LegacyParams", "id").unwrap();
//! assert_eq!(value.as_deref(), Some("9"));
//! ```

use crate::PathParams;
use http::Uri;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Capability to look up a named string value.
pub trait ParamSource: Any {
    /// Returns the value stored under `name`, if present.
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl ParamSource for PathParams {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(Cow::Borrowed)
    }
}

impl ParamSource for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl ParamSource for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|v| Cow::Borrowed(v.as_str()))
    }
}

impl ParamSource for Vec<(String, String)> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| Cow::Borrowed(v.as_str()))
    }
}

impl ParamSource for Uri {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        let query = self.query()?;
        QueryParams::parse(query)
            .ok()?
            .get(name)
            .map(|v| Cow::Owned(v.to_string()))
    }
}

/// Decoded `application/x-www-form-urlencoded` query string.
///
/// # Example
///
/// ```rust
/// use hrr::QueryParams;
/// use http::Uri;
///
/// let uri: Uri = "/v0/monsters?sorted_by=name&limit=10".parse().unwrap();
/// let query = QueryParams::from_uri(&uri).unwrap();
///
/// assert_eq!(query.get("limit"), Some("10"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parses a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Result<Self, serde_urlencoded::de::Error> {
        serde_urlencoded::from_str(query).map(Self)
    }

    /// Parses the query string of `uri`; an absent query yields no parameters.
    pub fn from_uri(uri: &Uri) -> Result<Self, serde_urlencoded::de::Error> {
        uri.query().map_or_else(|| Ok(Self::default()), Self::parse)
    }

    /// Returns the first value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl ParamSource for QueryParams {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(Cow::Borrowed)
    }
}

/// No adapter is registered for the concrete type of a parameter source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no parameter adapter registered for `{type_name}`")]
pub struct UnsupportedSource {
    /// Type name of the rejected source.
    pub type_name: &'static str,
}

/// A recognized source holds no value for the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parameter `{name}` not present")]
pub struct MissingParameter {
    /// Name that was looked up.
    pub name: String,
}

type Resolver = Arc<dyn Fn(&dyn Any, &str) -> Option<String> + Send + Sync>;

/// Registry mapping concrete source types to [`ParamSource`] adapters.
///
/// [`SourceRegistry::default`] knows the built-in bags: [`PathParams`],
/// [`QueryParams`], [`Uri`], `HashMap<String, String>`,
/// `BTreeMap<String, String>` and `Vec<(String, String)>`.
#[derive(Clone)]
pub struct SourceRegistry {
    adapters: HashMap<TypeId, (&'static str, Resolver)>,
}

impl SourceRegistry {
    /// Creates a registry without any adapters.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registers the adapter for `T`, replacing any previous one.
    pub fn register<T: ParamSource>(&mut self) -> &mut Self {
        let resolve: Resolver = Arc::new(|source: &dyn Any, name: &str| {
            source
                .downcast_ref::<T>()
                .and_then(|s| s.lookup(name))
                .map(Cow::into_owned)
        });
        self.adapters
            .insert(TypeId::of::<T>(), (std::any::type_name::<T>(), resolve));
        self
    }

    /// Returns true if an adapter exists for `T`.
    #[must_use]
    pub fn supports<T: Any>(&self) -> bool {
        self.adapters.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns true if no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Resolves `name` against `source`.
    ///
    /// `type_name` is only used to describe the source when it is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedSource`] if no adapter matches the concrete type of
    /// `source`.
    pub fn resolve(
        &self,
        source: &dyn Any,
        type_name: &'static str,
        name: &str,
    ) -> Result<Option<String>, UnsupportedSource> {
        let (_, resolve) = self
            .adapters
            .get(&source.type_id())
            .ok_or(UnsupportedSource { type_name })?;
        Ok(resolve(source, name))
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register::<PathParams>()
            .register::<QueryParams>()
            .register::<Uri>()
            .register::<HashMap<String, String>>()
            .register::<BTreeMap<String, String>>()
            .register::<Vec<(String, String)>>();
        registry
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.adapters.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("SourceRegistry")
            .field("adapters", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve<T: Any>(registry: &SourceRegistry, source: &T, name: &str) -> Option<String> {
        registry
            .resolve(source, std::any::type_name::<T>(), name)
            .unwrap()
    }

    #[test]
    fn test_default_adapters() {
        let registry = SourceRegistry::default();

        let mut path = PathParams::new();
        path.push("id", "1");
        assert_eq!(resolve(&registry, &path, "id").as_deref(), Some("1"));

        let map: HashMap<String, String> = [("id".to_string(), "2".to_string())].into();
        assert_eq!(resolve(&registry, &map, "id").as_deref(), Some("2"));

        let tree: BTreeMap<String, String> = [("id".to_string(), "3".to_string())].into();
        assert_eq!(resolve(&registry, &tree, "id").as_deref(), Some("3"));

        let pairs = vec![("id".to_string(), "4".to_string())];
        assert_eq!(resolve(&registry, &pairs, "id").as_deref(), Some("4"));

        let uri: Uri = "/monsters?id=5".parse().unwrap();
        assert_eq!(resolve(&registry, &uri, "id").as_deref(), Some("5"));

        let query = QueryParams::parse("id=6&x=y").unwrap();
        assert_eq!(resolve(&registry, &query, "id").as_deref(), Some("6"));
    }

    #[test]
    fn test_missing_name_is_none() {
        let registry = SourceRegistry::default();
        let path = PathParams::new();

        assert_eq!(resolve(&registry, &path, "id"), None);
    }

    #[test]
    fn test_uri_without_query() {
        let registry = SourceRegistry::default();
        let uri: Uri = "/monsters".parse().unwrap();

        assert_eq!(resolve(&registry, &uri, "id"), None);
    }

    #[test]
    fn test_unsupported_source() {
        let registry = SourceRegistry::default();
        let source = 42_u32;

        let err = registry.resolve(&source, "u32", "id").unwrap_err();
        assert_eq!(err.type_name, "u32");
        assert!(err.to_string().contains("u32"));
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = SourceRegistry::empty();
        let path = PathParams::new();

        assert!(registry.is_empty());
        assert!(registry.resolve(&path, "PathParams", "id").is_err());
    }

    #[test]
    fn test_register_custom_adapter() {
        struct Fixed;

        impl ParamSource for Fixed {
            fn lookup(&self, _name: &str) -> Option<Cow<'_, str>> {
                Some(Cow::Borrowed("11"))
            }
        }

        let mut registry = SourceRegistry::default();
        assert!(!registry.supports::<Fixed>());
        registry.register::<Fixed>();

        assert!(registry.supports::<Fixed>());
        assert_eq!(resolve(&registry, &Fixed, "anything").as_deref(), Some("11"));
    }

    #[test]
    fn test_query_params_decoding() {
        let query = QueryParams::parse("name=Little%20Monster&id=3").unwrap();
        assert_eq!(query.get("name"), Some("Little Monster"));
    }
}
