#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use pipeline_controller::config::Config;
use pipeline_controller::errors::{StageError, StageResult};
use pipeline_controller::models::{PipelineCreateRequest, StageKind, StatusEvent, StatusMap};
use pipeline_controller::pipeline::{StageContext, StageRunner};
use pipeline_controller::services::PipelineService;

/// Stage runner whose behaviour is set per stage by the test
#[derive(Default)]
pub struct ScriptedRunner {
    failures: Mutex<HashSet<StageKind>>,
    fail_after: Mutex<HashMap<StageKind, usize>>,
    panics: Mutex<HashSet<StageKind>>,
    delays: Mutex<HashMap<StageKind, Duration>>,
    calls: Mutex<Vec<(String, StageKind)>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stage waits for a permit on `gate` before finishing
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn fail(&self, stage: StageKind) {
        self.failures.lock().unwrap().insert(stage);
    }

    /// Let `stage` succeed `successes` times, then fail every later run
    pub fn fail_after(&self, stage: StageKind, successes: usize) {
        self.fail_after.lock().unwrap().insert(stage, successes);
    }

    pub fn succeed(&self, stage: StageKind) {
        self.failures.lock().unwrap().remove(&stage);
    }

    pub fn panic_on(&self, stage: StageKind) {
        self.panics.lock().unwrap().insert(stage);
    }

    pub fn delay(&self, stage: StageKind, duration: Duration) {
        self.delays.lock().unwrap().insert(stage, duration);
    }

    /// (pipeline, stage) pairs in the order the runner was invoked
    pub fn calls(&self) -> Vec<(String, StageKind)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StageRunner for ScriptedRunner {
    async fn run(&self, stage: StageKind, context: &StageContext) -> StageResult {
        let runs = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((context.pipeline.clone(), stage));
            calls.iter().filter(|(_, called)| *called == stage).count()
        };

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let delay = self.delays.lock().unwrap().get(&stage).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.panics.lock().unwrap().contains(&stage) {
            panic!("scripted panic in {}", stage);
        }

        let exhausted = matches!(
            self.fail_after.lock().unwrap().get(&stage),
            Some(successes) if runs > *successes
        );
        if exhausted || self.failures.lock().unwrap().contains(&stage) {
            return Err(StageError::failed(stage.as_str(), "scripted failure"));
        }
        Ok(())
    }
}

pub fn service_with(config: &Config, runner: Arc<ScriptedRunner>) -> PipelineService {
    PipelineService::with_runner(config, runner)
}

pub fn service(runner: Arc<ScriptedRunner>) -> PipelineService {
    service_with(&Config::default(), runner)
}

pub fn create_request(name: &str, stages: &[&str]) -> PipelineCreateRequest {
    PipelineCreateRequest {
        name: name.to_string(),
        stages: stages.iter().map(|s| s.to_string()).collect(),
    }
}

/// Stage status transitions implied by a sequence of full-map events
pub fn transitions(events: &[StatusEvent]) -> Vec<(String, String)> {
    let mut previous = StatusMap::new();
    let mut changes = Vec::new();
    for event in events {
        for (stage, status) in &event.statuses {
            if previous.get(stage) != Some(status) {
                changes.push((stage.clone(), status.to_string()));
            }
        }
        previous = event.statuses.clone();
    }
    changes
}
