//! Host-side collaborators consulted when no override matches.

use url::Url;

/// The host's normal (non-overlay) resource lookup.
///
/// Implemented for any `Fn(&str) -> Option<Url>`.
pub trait FallbackResolver: Send + Sync {
    /// Resolve a resource name to its location, if the host knows it.
    fn resolve(&self, name: &str) -> Option<Url>;
}

/// The host's own list of resource roots.
///
/// Implemented for any `Fn() -> Vec<Url>`. The list is assumed to be static;
/// it is requested at most once.
pub trait FallbackRoots: Send + Sync {
    /// List the host's resource roots, in the host's order.
    fn roots(&self) -> Vec<Url>;
}

impl<F> FallbackResolver for F
where
    F: Fn(&str) -> Option<Url> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<Url> {
        self(name)
    }
}

impl<F> FallbackRoots for F
where
    F: Fn() -> Vec<Url> + Send + Sync,
{
    fn roots(&self) -> Vec<Url> {
        self()
    }
}

/// A fallback that knows no resources and no roots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl FallbackResolver for NoFallback {
    fn resolve(&self, _name: &str) -> Option<Url> {
        None
    }
}

impl FallbackRoots for NoFallback {
    fn roots(&self) -> Vec<Url> {
        Vec::new()
    }
}

/// A fixed list of fallback roots.
#[derive(Debug, Clone, Default)]
pub struct StaticRoots(pub Vec<Url>);

impl FallbackRoots for StaticRoots {
    fn roots(&self) -> Vec<Url> {
        self.0.clone()
    }
}
