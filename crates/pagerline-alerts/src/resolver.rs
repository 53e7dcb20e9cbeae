//! Escalation chain resolution.

use async_trait::async_trait;

use pagerline_core::ChainLink;
use pagerline_storage::DirectoryStore;

use crate::Result;

/// Produces the ordered on-call list for a service.
#[async_trait]
pub trait ChainResolver: Send + Sync {
    /// Links ascending by level; empty when nothing is configured.
    async fn resolve(&self, service_id: &str) -> Result<Vec<ChainLink>>;
}

/// Joins chain entries with users from the directory.
#[derive(Clone)]
pub struct DirectoryChainResolver {
    directory: DirectoryStore,
}

impl DirectoryChainResolver {
    pub fn new(directory: DirectoryStore) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl ChainResolver for DirectoryChainResolver {
    async fn resolve(&self, service_id: &str) -> Result<Vec<ChainLink>> {
        let entries = self.directory.escalation_chain(service_id)?;
        let mut links = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.directory.get_user(&entry.user_id)? {
                Some(user) => links.push(ChainLink {
                    level: entry.level,
                    user,
                }),
                None => tracing::warn!(
                    service_id,
                    level = entry.level,
                    user_id = %entry.user_id,
                    "Escalation entry refers to a missing user, skipping"
                ),
            }
        }
        links.sort_by_key(|link| link.level);
        Ok(links)
    }
}
