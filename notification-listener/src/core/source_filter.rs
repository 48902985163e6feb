/*!
Allow-list of notification sources
*/

use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::info;

/// Decides which sources are retained. An empty allow-list accepts every source.
#[derive(Debug, Default)]
pub struct SourceFilter {
    allowed: RwLock<HashSet<String>>,
}

impl SourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn accepts(&self, source_id: &str) -> bool {
        let allowed = self.allowed.read().await;
        allowed.is_empty() || allowed.contains(source_id)
    }

    /// Replace the whole allow-list. The new set is built before the lock is
    /// taken so readers see either the old set or the new one.
    pub async fn set_allow_list<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let next: HashSet<String> = ids.into_iter().map(Into::into).collect();
        let count = next.len();
        *self.allowed.write().await = next;

        if count == 0 {
            info!("Source allow-list cleared, accepting all sources");
        } else {
            info!("Source allow-list set to {} source(s)", count);
        }
    }

    pub async fn allow_list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.allowed.read().await.iter().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_list_accepts_everything() {
        let filter = SourceFilter::new();
        assert!(filter.accepts("anything").await);

        filter.set_allow_list(Vec::<String>::new()).await;
        assert!(filter.accepts("org.example.A").await);
        assert!(filter.accepts("").await);
    }

    #[tokio::test]
    async fn non_empty_list_is_membership() {
        let filter = SourceFilter::new();
        filter.set_allow_list(["a"]).await;

        assert!(filter.accepts("a").await);
        assert!(!filter.accepts("b").await);
    }

    #[tokio::test]
    async fn set_replaces_wholesale() {
        let filter = SourceFilter::new();
        filter.set_allow_list(["a", "b"]).await;
        filter.set_allow_list(["c"]).await;

        assert!(!filter.accepts("a").await);
        assert!(filter.accepts("c").await);
        assert_eq!(filter.allow_list().await, vec!["c".to_string()]);
    }
}
