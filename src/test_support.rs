//! In-memory [`Upstream`] used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::eolink::{
    Api, ApiTestRequest, ApiTestResponse, Fetched, Project, TestApiError, Upstream, UpstreamError,
};

/// Counts calls per operation and serves canned data.
#[derive(Default)]
pub struct MockUpstream {
    projects: Vec<Project>,
    apis: Vec<Api>,
    fail_reads: bool,
    delay: Option<Duration>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl MockUpstream {
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects,
            ..Self::default()
        }
    }

    pub fn with_api(mut self, project_id: &str, api_id: &str, path: &str) -> Self {
        let api: Api = serde_json::from_value(json!({
            "id": api_id,
            "name": format!("API {api_id}"),
            "projectId": project_id,
            "path": path,
            "method": "GET"
        }))
        .unwrap();
        self.apis.push(api);
        self
    }

    pub fn with_full_api(mut self, api: Api) -> Self {
        self.apis.push(api);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    async fn record(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn read<T: Default>(&self, value: T, operation: &str) -> Fetched<T> {
        if self.fail_reads {
            Fetched::from_result(Err(UpstreamError::Status { status: 500 }), operation)
        } else {
            Fetched::Fresh(value)
        }
    }

    fn find_api(&self, project_id: &str, api_id: &str) -> Option<Api> {
        self.apis
            .iter()
            .find(|a| a.project_id == project_id && a.id == api_id)
            .cloned()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn list_projects(&self) -> Fetched<Vec<Project>> {
        self.record("list_projects").await;
        self.read(self.projects.clone(), "list_projects")
    }

    async fn get_project(&self, project_id: &str) -> Fetched<Option<Project>> {
        self.record("get_project").await;
        let project = self.projects.iter().find(|p| p.id == project_id).cloned();
        self.read(project, "get_project")
    }

    async fn list_apis(&self, project_id: &str) -> Fetched<Vec<Api>> {
        self.record("list_apis").await;
        let apis = self
            .apis
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect();
        self.read(apis, "list_apis")
    }

    async fn get_api(&self, project_id: &str, api_id: &str) -> Fetched<Option<Api>> {
        self.record("get_api").await;
        self.read(self.find_api(project_id, api_id), "get_api")
    }

    async fn search_apis(&self, query: &str) -> Fetched<Vec<Api>> {
        self.record("search_apis").await;
        let apis = self
            .apis
            .iter()
            .filter(|a| a.name.contains(query) || a.path.contains(query))
            .cloned()
            .collect();
        self.read(apis, "search_apis")
    }

    async fn test_api(&self, request: &ApiTestRequest) -> Result<ApiTestResponse, TestApiError> {
        self.record("test_api").await;
        let api = self
            .find_api(&request.project_id, &request.api_id)
            .ok_or_else(|| TestApiError::NotFound {
                project_id: request.project_id.clone(),
                api_id: request.api_id.clone(),
            })?;

        // Absolute paths are really sent so transport failures are genuine.
        if api.path.starts_with("http://") {
            reqwest::get(api.path.as_str())
                .await
                .map_err(TestApiError::Transport)?;
        }

        Ok(ApiTestResponse {
            status_code: 200,
            headers: std::collections::BTreeMap::new(),
            body: json!({ "path": api.path }),
            response_time: 1,
        })
    }
}
