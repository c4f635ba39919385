//! Navigation URLs.

use std::fmt;
use std::sync::Arc;

use actionkit_core::Record;

/// Resolves a URL from a record.
pub type UrlResolver = Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub enum UrlSource {
    Static(String),
    Resolver(UrlResolver),
}

impl fmt::Debug for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlSource::Static(url) => write!(f, "Static({:?})", url),
            UrlSource::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionUrl {
    pub source: Option<UrlSource>,
    pub open_in_new_tab: bool,
}

impl ActionUrl {
    /// Resolve the URL. A resolver is never called without a record.
    pub fn resolve(&self, record: Option<&Record>) -> Option<String> {
        match (&self.source, record) {
            (Some(UrlSource::Static(url)), _) => Some(url.clone()),
            (Some(UrlSource::Resolver(resolver)), Some(record)) => resolver(record),
            _ => None,
        }
    }
}
