use std::sync::{Arc, PoisonError, RwLock};

use super::ProviderService;

/// Ordered, append-only list of registered providers.
///
/// Clones share the same list, so the authenticator holding a clone sees every
/// provider the service registers later. Names are not unique; lookups return
/// the first match in registration order.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<RwLock<Vec<ProviderService>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, provider: ProviderService) {
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(provider);
    }

    pub fn find(&self, name: &str) -> Option<ProviderService> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    /// The first registered provider, if any.
    pub fn first(&self) -> Option<ProviderService> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .cloned()
    }

    /// Provider names in registration order, duplicates included.
    pub fn names(&self) -> Vec<String> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
