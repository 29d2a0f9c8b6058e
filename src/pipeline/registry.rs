use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{PipelineInstance, RunClaim};
use crate::config::DuplicatePolicy;
use crate::errors::{AppError, AppResult};
use crate::models::PipelineDefinition;

#[derive(Debug, Default)]
struct RegistryState {
    by_name: HashMap<String, Arc<PipelineInstance>>,
    /// Names in registration order, for stable listing
    order: Vec<String>,
}

/// Owns every pipeline instance for the lifetime of the process.
///
/// Cloning the registry is cheap and every clone shares the same collection.
#[derive(Debug, Clone)]
pub struct PipelineRegistry {
    state: Arc<RwLock<RegistryState>>,
    on_duplicate: DuplicatePolicy,
}

impl PipelineRegistry {
    pub fn new(on_duplicate: DuplicatePolicy) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::default())),
            on_duplicate,
        }
    }

    /// Register a new pipeline with an empty status map.
    ///
    /// Under [`DuplicatePolicy::Replace`] an existing pipeline with the same
    /// name is swapped for a fresh instance, unless it is currently running.
    pub async fn create(
        &self,
        name: impl Into<String>,
        stages: Vec<String>,
    ) -> AppResult<Arc<PipelineInstance>> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::validation("pipeline name must not be empty"));
        }

        let mut state = self.state.write().await;

        match state.by_name.get(&name).map(|existing| existing.is_running()) {
            Some(_) if self.on_duplicate == DuplicatePolicy::Reject => {
                debug!(pipeline = %name, "Rejected duplicate pipeline");
                return Err(AppError::duplicate_pipeline(name));
            }
            Some(true) => return Err(AppError::already_running(name)),
            Some(false) => info!(pipeline = %name, "Replacing existing pipeline"),
            None => state.order.push(name.clone()),
        }

        let instance = Arc::new(PipelineInstance::new(PipelineDefinition {
            name: name.clone(),
            stages,
        }));
        state.by_name.insert(name.clone(), Arc::clone(&instance));

        info!(
            pipeline = %name,
            stages = ?instance.stages(),
            "Pipeline created"
        );
        Ok(instance)
    }

    pub async fn lookup(&self, name: &str) -> AppResult<Arc<PipelineInstance>> {
        self.state
            .read()
            .await
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::pipeline_not_found(name))
    }

    /// Look up `name` and claim it for an execution.
    ///
    /// Both happen under the registry read lock, so a concurrent `create`
    /// cannot swap the instance out between the lookup and the claim.
    pub async fn claim(&self, name: &str) -> AppResult<RunClaim> {
        let state = self.state.read().await;
        let instance = state
            .by_name
            .get(name)
            .ok_or_else(|| AppError::pipeline_not_found(name))?;
        instance
            .try_claim()
            .ok_or_else(|| AppError::already_running(name))
    }

    /// All pipelines in registration order
    pub async fn list(&self) -> Vec<Arc<PipelineInstance>> {
        let state = self.state.read().await;
        state
            .order
            .iter()
            .filter_map(|name| state.by_name.get(name).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.by_name.len()
    }
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageStatus;
    use tokio_test::{assert_err, assert_ok};

    fn stages(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let registry = PipelineRegistry::default();
        assert_eq!(registry.len().await, 0);

        assert_ok!(
            registry
                .create("web-app", stages(&["build", "test", "deploy"]))
                .await
        );

        let instance = assert_ok!(registry.lookup("web-app").await);
        assert_eq!(instance.name(), "web-app");
        assert_eq!(instance.stages(), &stages(&["build", "test", "deploy"])[..]);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_missing_is_not_found() {
        let registry = PipelineRegistry::default();
        let err = registry.lookup("nope").await.unwrap_err();
        assert_eq!(err, AppError::pipeline_not_found("nope"));
    }

    #[tokio::test]
    async fn test_duplicate_rejected_by_default() {
        let registry = PipelineRegistry::default();
        registry.create("api", stages(&["build"])).await.unwrap();

        let err = registry.create("api", stages(&["test"])).await.unwrap_err();
        assert_eq!(err, AppError::duplicate_pipeline("api"));

        let instance = registry.lookup("api").await.unwrap();
        assert_eq!(instance.stages(), &stages(&["build"])[..]);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_replace_resets_status() {
        let registry = PipelineRegistry::new(DuplicatePolicy::Replace);
        let first = registry.create("api", stages(&["build"])).await.unwrap();
        {
            let claim = first.try_claim().unwrap();
            claim.set_status("build", StageStatus::Success).await;
        }

        registry.create("api", stages(&["test"])).await.unwrap();

        let replaced = registry.lookup("api").await.unwrap();
        assert_eq!(replaced.stages(), &stages(&["test"])[..]);
        assert!(replaced.statuses().await.is_empty());
        assert_eq!(registry.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_refused_while_running() {
        let registry = PipelineRegistry::new(DuplicatePolicy::Replace);
        let first = registry.create("api", stages(&["build"])).await.unwrap();
        let _claim = first.try_claim().unwrap();

        let err = registry.create("api", stages(&["test"])).await.unwrap_err();
        assert_eq!(err, AppError::already_running("api"));
    }

    #[tokio::test]
    async fn test_claim_blocks_replace_until_released() {
        let registry = PipelineRegistry::new(DuplicatePolicy::Replace);
        registry.create("api", stages(&["build"])).await.unwrap();

        let claim = assert_ok!(registry.claim("api").await);
        let err = assert_err!(registry.create("api", stages(&["deploy"])).await);
        assert_eq!(err, AppError::already_running("api"));
        assert_eq!(
            assert_err!(registry.claim("api").await),
            AppError::already_running("api")
        );

        let current = registry.lookup("api").await.unwrap();
        assert!(Arc::ptr_eq(claim.instance(), &current));

        drop(claim);
        registry.create("api", stages(&["deploy"])).await.unwrap();
        let claim = assert_ok!(registry.claim("api").await);
        assert_eq!(claim.instance().stages(), &stages(&["deploy"])[..]);
    }

    #[tokio::test]
    async fn test_claim_missing_is_not_found() {
        let registry = PipelineRegistry::default();
        assert_eq!(
            assert_err!(registry.claim("ghost").await),
            AppError::pipeline_not_found("ghost")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_claimed_instance_stays_registered_under_concurrent_replace() {
        let registry = PipelineRegistry::new(DuplicatePolicy::Replace);
        registry.create("api", stages(&["build"])).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..200 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let _ = registry.create("api", stages(&["deploy"])).await;
                } else if let Ok(claim) = registry.claim("api").await {
                    tokio::task::yield_now().await;
                    let current = registry.lookup("api").await.unwrap();
                    assert!(Arc::ptr_eq(claim.instance(), &current));
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let registry = PipelineRegistry::default();
        let err = assert_err!(registry.create("  ", stages(&["build"])).await);
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_list_preserves_registration_order() {
        let registry = PipelineRegistry::default();
        for name in ["zeta", "alpha", "mid"] {
            registry.create(name, stages(&["build"])).await.unwrap();
        }

        let names: Vec<String> = registry
            .list()
            .await
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }
}
