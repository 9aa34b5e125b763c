use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};

use crate::eolink::{Api, Project, Upstream};

type ApiSlot = Arc<OnceCell<Vec<Api>>>;

/// Memoizing cache in front of an [`Upstream`].
pub struct CatalogCache {
    upstream: Arc<dyn Upstream>,
    /// Held across the fetch so concurrent loads serialise.
    projects: Mutex<Vec<Project>>,
    /// One cell per project id; never held across an await.
    apis: std::sync::Mutex<HashMap<String, ApiSlot>>,
}

impl CatalogCache {
    /// Creates an empty cache over `upstream`.
    #[must_use]
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            projects: Mutex::new(Vec::new()),
            apis: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Returns all projects, fetching them if none are cached.
    pub async fn projects(&self) -> Vec<Project> {
        let mut projects = self.projects.lock().await;

        if projects.is_empty() {
            let fetched = self.upstream.list_projects().await;
            if fetched.is_degraded() {
                warn!("Project list unavailable, serving empty catalog");
            }
            *projects = fetched.into_inner();
            info!(count = projects.len(), "Loaded projects from Eolink");
        }

        projects.clone()
    }

    /// Returns the APIs of `project_id`, fetching them on first access only.
    pub async fn apis(&self, project_id: &str) -> Vec<Api> {
        let slot = self.slot(project_id);

        slot.get_or_init(|| async {
            let fetched = self.upstream.list_apis(project_id).await;
            if fetched.is_degraded() {
                warn!(
                    project_id,
                    "API list unavailable, caching empty list for this project"
                );
            }
            let apis = fetched.into_inner();
            info!(project_id, count = apis.len(), "Loaded APIs for project");
            apis
        })
        .await
        .clone()
    }

    /// Returns `true` if the API list of `project_id` has been loaded.
    #[must_use]
    pub fn has_apis(&self, project_id: &str) -> bool {
        self.apis
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project_id)
            .is_some_and(|slot| slot.initialized())
    }

    /// Loads the project list at startup, doubling as a connectivity check.
    ///
    /// Returns `false` when the upstream could not be read; the server still
    /// starts and later calls retry. Never fails.
    pub async fn warm_up(&self) -> bool {
        let mut projects = self.projects.lock().await;
        let fetched = self.upstream.list_projects().await;
        let reachable = !fetched.is_degraded();
        *projects = fetched.into_inner();

        if reachable {
            info!(count = projects.len(), "Connected to Eolink, catalog warm-up complete");
        } else {
            warn!("Failed to connect to Eolink; the catalog will be fetched on demand");
        }
        reachable
    }

    /// Forgets all cached projects and API lists.
    pub async fn clear(&self) {
        self.projects.lock().await.clear();
        self.apis
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!("Catalog cache cleared");
    }

    fn slot(&self, project_id: &str) -> ApiSlot {
        let mut apis = self.apis.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(apis.entry(project_id.to_string()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockUpstream;

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {id}"),
            description: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[tokio::test]
    async fn projects_are_fetched_once_when_present() {
        let upstream = Arc::new(MockUpstream::with_projects(vec![project("p1")]));
        let cache = CatalogCache::new(upstream.clone());

        assert_eq!(cache.projects().await.len(), 1);
        assert_eq!(cache.projects().await.len(), 1);
        assert_eq!(upstream.calls("list_projects"), 1);
    }

    #[tokio::test]
    async fn empty_project_list_is_refetched() {
        let upstream = Arc::new(MockUpstream::default());
        let cache = CatalogCache::new(upstream.clone());

        assert!(cache.projects().await.is_empty());
        assert!(cache.projects().await.is_empty());
        assert_eq!(upstream.calls("list_projects"), 2);
    }

    #[tokio::test]
    async fn empty_api_list_is_memoized_forever() {
        let upstream = Arc::new(MockUpstream::default().failing_reads());
        let cache = CatalogCache::new(upstream.clone());

        assert!(!cache.has_apis("p1"));
        assert!(cache.apis("p1").await.is_empty());
        assert!(cache.has_apis("p1"));
        assert!(cache.apis("p1").await.is_empty());
        assert_eq!(upstream.calls("list_apis"), 1);
    }

    #[tokio::test]
    async fn api_lists_are_cached_per_project() {
        let upstream = Arc::new(MockUpstream::default().with_api("p1", "a1", "/users/{id}"));
        let cache = CatalogCache::new(upstream.clone());

        assert_eq!(cache.apis("p1").await.len(), 1);
        assert!(cache.apis("p2").await.is_empty());
        assert_eq!(cache.apis("p1").await.len(), 1);
        assert_eq!(upstream.calls("list_apis"), 2);
    }

    #[tokio::test]
    async fn concurrent_api_loads_share_one_fetch() {
        let upstream = Arc::new(
            MockUpstream::default()
                .with_api("p1", "a1", "/ping")
                .with_delay(std::time::Duration::from_millis(20)),
        );
        let cache = CatalogCache::new(upstream.clone());

        let (first, second, third) = tokio::join!(cache.apis("p1"), cache.apis("p1"), cache.apis("p1"));
        assert_eq!(first.len(), 1);
        assert_eq!(second, first);
        assert_eq!(third, first);
        assert_eq!(upstream.calls("list_apis"), 1);
    }

    #[tokio::test]
    async fn concurrent_project_loads_share_one_fetch() {
        let upstream = Arc::new(
            MockUpstream::with_projects(vec![project("p1")])
                .with_delay(std::time::Duration::from_millis(20)),
        );
        let cache = CatalogCache::new(upstream.clone());

        let (first, second) = tokio::join!(cache.projects(), cache.projects());
        assert_eq!(first, second);
        assert_eq!(upstream.calls("list_projects"), 1);
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let upstream = Arc::new(MockUpstream::with_projects(vec![project("p1")]));
        let cache = CatalogCache::new(upstream.clone());

        cache.projects().await;
        cache.apis("p1").await;
        cache.clear().await;
        assert!(!cache.has_apis("p1"));

        cache.projects().await;
        cache.apis("p1").await;
        assert_eq!(upstream.calls("list_projects"), 2);
        assert_eq!(upstream.calls("list_apis"), 2);
    }

    #[tokio::test]
    async fn warm_up_loads_projects() {
        let upstream = Arc::new(MockUpstream::with_projects(vec![project("p1")]));
        let cache = CatalogCache::new(upstream.clone());

        assert!(cache.warm_up().await);
        cache.projects().await;
        assert_eq!(upstream.calls("list_projects"), 1);
    }

    #[tokio::test]
    async fn warm_up_reports_unreachable_upstream() {
        let upstream = Arc::new(
            MockUpstream::with_projects(vec![project("p1")]).failing_reads(),
        );
        let cache = CatalogCache::new(upstream.clone());

        assert!(!cache.warm_up().await);
        assert!(cache.projects().await.is_empty());
        assert_eq!(upstream.calls("list_projects"), 2);
    }
}
