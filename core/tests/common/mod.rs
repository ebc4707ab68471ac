#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use plancraft_core::api::{
    ContextStore, Decomposer, Decomposition, ErrorClassifier, ExecutionError, FixedBackoff,
    MemoryContextStore, OutputRendererPlugin, RenderEvent, ScriptedPrompt, Services, SubtaskSpec,
    TaskExecutor, TodoListManager,
};

/// Decomposer returning a fixed plan (or a fixed failure).
pub struct StaticDecomposer {
    result: Result<Decomposition, String>,
}

impl StaticDecomposer {
    pub fn new(subtasks: Vec<SubtaskSpec>, rationale: Option<&str>) -> Self {
        Self {
            result: Ok(Decomposition {
                subtasks,
                rationale: rationale.map(str::to_string),
            }),
        }
    }

    pub fn tasks(descriptions: &[&str]) -> Self {
        Self::new(descriptions.iter().map(|d| SubtaskSpec::new(*d)).collect(), None)
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Decomposer for StaticDecomposer {
    fn name(&self) -> &str {
        "static"
    }

    async fn decompose(&self, _requirement: &str) -> anyhow::Result<Decomposition> {
        match &self.result {
            Ok(d) => Ok(d.clone()),
            Err(msg) => Err(anyhow::anyhow!("{msg}")),
        }
    }
}

/// One recorded executor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: &'static str,
    pub target: String,
    pub description: String,
    pub context: String,
}

/// Executor answering from per-description scripts; unscripted calls succeed.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, String>>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue failures (by message) for a task description.
    pub fn fail(self, description: &str, messages: &[&str]) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            let queue = scripts.entry(description.to_string()).or_default();
            for m in messages {
                queue.push_back(Err(m.to_string()));
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts(&self, description: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.description == description)
            .count()
    }

    fn answer(
        &self,
        kind: &'static str,
        target: &str,
        description: &str,
        context: &str,
    ) -> Result<String, ExecutionError> {
        self.calls.lock().unwrap().push(Call {
            kind,
            target: target.to_string(),
            description: description.to_string(),
            context: context.to_string(),
        });
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(description)
            .and_then(|q| q.pop_front());
        match next {
            Some(Err(msg)) => Err(ExecutionError::Failed(msg)),
            Some(Ok(out)) => Ok(out),
            None => Ok(format!("done: {description}")),
        }
    }
}

#[async_trait::async_trait]
impl TaskExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute_role(
        &self,
        role: &str,
        description: &str,
        context: &str,
    ) -> Result<String, ExecutionError> {
        self.answer("role", role, description, context)
    }

    async fn execute_local_tool(
        &self,
        tool: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        self.answer("tool", tool, description, "")
    }

    async fn execute_remote_tool(
        &self,
        tool: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        self.answer("remote", tool, description, "")
    }

    async fn execute_command(
        &self,
        command: &str,
        description: &str,
    ) -> Result<String, ExecutionError> {
        self.answer("command", command, description, "")
    }
}

/// Renderer keeping every event for assertions.
#[derive(Default)]
pub struct RecordingRenderer {
    events: Mutex<Vec<RenderEvent>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn failed_counts(&self, task_id: u32) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::TaskFailed {
                    task_id: id,
                    failure_count,
                    ..
                } if id == task_id => Some(failure_count),
                _ => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<(u32, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::TaskSkipped {
                    task_id, reason, ..
                } => Some((task_id, reason)),
                _ => None,
            })
            .collect()
    }
}

impl OutputRendererPlugin for RecordingRenderer {
    fn name(&self) -> &str {
        "recording"
    }

    fn format(&self) -> &str {
        "test"
    }

    fn render(&self, event: &RenderEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct Harness {
    pub executor: Arc<ScriptedExecutor>,
    pub prompt: Arc<ScriptedPrompt>,
    pub renderer: Arc<RecordingRenderer>,
    pub store: Arc<MemoryContextStore>,
}

impl Harness {
    pub fn new(executor: ScriptedExecutor, answers: &[&str]) -> Self {
        Self::with_store(executor, answers, Arc::new(MemoryContextStore::new()))
    }

    /// Harness reusing an existing store, as a later run of the binary would.
    pub fn with_store(
        executor: ScriptedExecutor,
        answers: &[&str],
        store: Arc<MemoryContextStore>,
    ) -> Self {
        Self {
            executor: Arc::new(executor),
            prompt: Arc::new(ScriptedPrompt::new(answers.iter().copied())),
            renderer: Arc::new(RecordingRenderer::default()),
            store,
        }
    }

    pub fn manager(&self, decomposer: StaticDecomposer) -> TodoListManager {
        TodoListManager::new(self.services(decomposer), ErrorClassifier::default())
    }

    /// Services wired to the fakes, with zero retry delay.
    pub fn services(&self, decomposer: StaticDecomposer) -> Services {
        let store: Arc<dyn ContextStore> = self.store.clone();
        Services {
            decomposer: Arc::new(decomposer),
            executor: self.executor.clone(),
            store,
            prompt: self.prompt.clone(),
            renderer: self.renderer.clone(),
            backoff: Arc::new(FixedBackoff::from_millis(0)),
        }
    }
}
