//! Bootstrap list of known store addresses

use std::collections::BTreeMap;
use std::path::Path;

use crate::common::{host_of, Result};
use crate::status::store::Store;

/// Every store the operator expects to exist, all initially Down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRegistry {
    stores: BTreeMap<String, Store>,
}

impl StoreRegistry {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stores = addresses
            .into_iter()
            .map(|addr| host_of(addr.as_ref()).to_string())
            .filter(|ip| !ip.is_empty())
            .map(|ip| (ip.clone(), Store::down(ip)))
            .collect();
        Self { stores }
    }

    /// Parse a store list: one address per line, `#` starts a comment.
    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(|line| line.split('#').next().unwrap_or_default().trim())
                .filter(|line| !line.is_empty()),
        )
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let registry = Self::parse(&text);
        tracing::info!(
            "Loaded {} known stores from {:?}",
            registry.len(),
            path.as_ref()
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.stores.contains_key(ip)
    }

    pub fn stores(&self) -> &BTreeMap<String, Store> {
        &self.stores
    }

    pub fn into_stores(self) -> BTreeMap<String, Store> {
        self.stores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::store::{RwStatus, StoreStatus};

    #[test]
    fn test_all_down() {
        let registry = StoreRegistry::new(["10.0.0.1", "10.0.0.2"]);
        assert_eq!(registry.len(), 2);
        for store in registry.stores().values() {
            assert_eq!(store.status, StoreStatus::Down);
            assert_eq!(store.rw_status, RwStatus::Other);
            assert!(store.metrics.is_none());
        }
    }

    #[test]
    fn test_empty() {
        let registry = StoreRegistry::new(Vec::<String>::new());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parse_file_format() {
        let registry = StoreRegistry::parse(
            "# rack 1\n10.0.0.1\n\n  10.0.0.2:6062  \n10.0.0.1 # again\n",
        );
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("10.0.0.1"));
        assert!(registry.contains("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = StoreRegistry::load(dir.path().join("store.txt")).await;
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }
}
