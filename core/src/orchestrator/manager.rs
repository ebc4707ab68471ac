use std::sync::Arc;

use uuid::Uuid;

use super::report::{RunOutcome, StepOutcome};
use super::session::PlanSession;
use crate::backend;
use crate::config::AppConfig;
use crate::context::{CacheStats, ExecutionContext, TaskContextCache};
use crate::error::PlanError;
use crate::failure::{ErrorClassifier, RetryPolicy};
use crate::graph::DependencyResolver;
use crate::interactive::{FailureDecision, FailureHandler};
use crate::render::{OutputRendererPlugin, RenderEvent};
use crate::router::TaskRouter;
use crate::services::Services;
use crate::task::{TaskId, TaskList};

/// How the task under the cursor was dealt with in one step.
enum Resolution {
    /// Completed or skipped; the cursor moved.
    Resolved,
    Finished,
    Aborted(TaskId),
    Blocked(Vec<TaskId>),
}

/// Drives one plan at a time from requirement to completion.
pub struct TodoListManager {
    services: Services,
    classifier: ErrorClassifier,
    handler: FailureHandler,
    active: Option<PlanSession>,
}

impl TodoListManager {
    pub fn new(services: Services, classifier: ErrorClassifier) -> Self {
        let handler = FailureHandler::new(
            classifier,
            services.prompt.clone(),
            services.renderer.clone(),
        );
        Self {
            services,
            classifier,
            handler,
            active: None,
        }
    }

    pub fn from_config(services: Services, cfg: &AppConfig) -> Self {
        Self::new(services, ErrorClassifier::from_config(&cfg.retry))
    }

    fn renderer(&self) -> &Arc<dyn OutputRendererPlugin> {
        &self.services.renderer
    }

    pub fn has_active_plan(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_plan(&self) -> Option<&TaskList> {
        self.active.as_ref().map(|s| &s.list)
    }

    pub fn active_session(&self) -> Option<&PlanSession> {
        self.active.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.session_id())
    }

    /// Decompose `requirement` into a validated task list and make it active.
    ///
    /// Fails without side effects when a plan is already active, the
    /// decomposer fails or returns nothing, or the dependency graph is invalid.
    #[tracing::instrument(name = "create_plan", skip(self))]
    pub async fn create_plan(&mut self, requirement: &str) -> Result<&TaskList, PlanError> {
        if let Some(session) = &self.active {
            return Err(PlanError::PlanAlreadyActive {
                completed: session.list.completed_count(),
                total: session.list.total_count(),
            });
        }

        let decomposition = self
            .services
            .decomposer
            .decompose(requirement)
            .await
            .map_err(|e| PlanError::DecompositionFailed(format!("{e:#}")))?;
        if decomposition.subtasks.is_empty() {
            return Err(PlanError::EmptyDecomposition);
        }

        let rationale = decomposition.rationale.filter(|r| !r.trim().is_empty());
        let mut list = TaskList::from_specs(requirement, decomposition.subtasks, rationale.clone())?;
        let stats = DependencyResolver::new(list.tasks())?.stats();

        let session_id = Uuid::new_v4().to_string();
        let cache = TaskContextCache::new(self.services.store.clone(), session_id.clone());
        let context = ExecutionContext::new(requirement, rationale.clone(), cache);
        let retry = RetryPolicy::new(self.classifier, self.services.backoff.clone());

        start_next(&mut list)?;
        context.persist_plan(&list).await;

        tracing::info!(
            session_id = %session_id,
            tasks = list.total_count(),
            "plan created"
        );
        self.renderer().render(&RenderEvent::PlanCreated {
            session_id,
            requirement: requirement.to_string(),
            rationale,
            tasks: list.tasks().iter().map(|t| t.summary()).collect(),
        });
        self.renderer().render(&RenderEvent::info(stats.to_string()));

        let session = self.active.insert(PlanSession::new(list, retry, context));
        Ok(&session.list)
    }

    /// Rebuild a plan session from the context cache.
    #[tracing::instrument(name = "resume_plan", skip(self))]
    pub async fn resume(&mut self, session_id: &str) -> Result<&TaskList, PlanError> {
        if let Some(session) = &self.active {
            return Err(PlanError::PlanAlreadyActive {
                completed: session.list.completed_count(),
                total: session.list.total_count(),
            });
        }

        let cache = TaskContextCache::new(self.services.store.clone(), session_id);
        let mut list = cache
            .task_list()
            .await?
            .ok_or_else(|| PlanError::SessionNotFound(session_id.to_string()))?;
        DependencyResolver::new(list.tasks())?.validate()?;

        let snapshot = cache.context().await?;
        let context = match snapshot {
            Some(snapshot) => ExecutionContext::restore(snapshot, cache).await,
            None => ExecutionContext::new(
                list.requirement(),
                list.rationale().map(str::to_string),
                cache,
            ),
        };

        let mut retry = RetryPolicy::new(self.classifier, self.services.backoff.clone());
        for task in list.skipped_tasks() {
            retry.mark_skipped(task.id, "skipped in an earlier run");
        }

        start_next(&mut list)?;
        context.persist_task_list(&list).await;

        tracing::info!(session_id, cursor = list.cursor(), "plan resumed");
        self.renderer().render(&RenderEvent::PlanCreated {
            session_id: session_id.to_string(),
            requirement: list.requirement().to_string(),
            rationale: list.rationale().map(str::to_string),
            tasks: list.tasks().iter().map(|t| t.summary()).collect(),
        });
        self.renderer().render(&RenderEvent::info(format!(
            "Resumed session {session_id}: {}/{} tasks completed",
            list.completed_count(),
            list.total_count()
        )));

        let session = self.active.insert(PlanSession::new(list, retry, context));
        Ok(&session.list)
    }

    /// Resolve at most one task.
    pub async fn step(&mut self) -> Result<StepOutcome, PlanError> {
        let Some(session) = self.active.as_mut() else {
            return Err(PlanError::NoActivePlan);
        };

        let resolution = resolve_current(session, &self.services, &self.handler).await?;
        let resolution = match resolution {
            Resolution::Resolved if session.list.is_finished() => Resolution::Finished,
            other => other,
        };

        match resolution {
            Resolution::Resolved => Ok(StepOutcome::Continue),
            Resolution::Finished => {
                let report = session.completion_report();
                tracing::info!(
                    session_id = %report.session_id,
                    completed = report.completed,
                    skipped = report.skipped.len(),
                    "plan finished"
                );
                self.active = None;
                self.renderer().render(&RenderEvent::PlanCompleted {
                    report: report.clone(),
                });
                Ok(StepOutcome::Done(RunOutcome::Completed(report)))
            }
            Resolution::Aborted(task_id) => {
                let session_id = session.session_id().to_string();
                tracing::warn!(session_id = %session_id, task_id, "plan aborted by operator");
                self.active = None;
                self.renderer().render(&RenderEvent::PlanAborted {
                    session_id: session_id.clone(),
                    task_id,
                });
                Ok(StepOutcome::Done(RunOutcome::Aborted {
                    session_id,
                    task_id,
                }))
            }
            Resolution::Blocked(waiting) => {
                let session_id = session.session_id().to_string();
                tracing::warn!(session_id = %session_id, ?waiting, "plan blocked on dependencies");
                self.renderer().render(&RenderEvent::PlanBlocked {
                    session_id: session_id.clone(),
                    waiting: waiting.clone(),
                });
                Ok(StepOutcome::Done(RunOutcome::Blocked {
                    session_id,
                    waiting,
                }))
            }
        }
    }

    /// Step until the plan completes, aborts or blocks.
    pub async fn run(&mut self) -> Result<RunOutcome, PlanError> {
        loop {
            if let StepOutcome::Done(outcome) = self.step().await? {
                return Ok(outcome);
            }
        }
    }

    /// Drop the active plan. Returns whether there was one.
    pub fn clear(&mut self) -> bool {
        let had = self.active.take().is_some();
        if had {
            self.renderer().render(&RenderEvent::info("Todo list cleared."));
        }
        had
    }

    pub fn progress_summary(&self) -> String {
        match &self.active {
            Some(s) => format!(
                "{}/{} tasks completed ({}%)",
                s.list.completed_count(),
                s.list.total_count(),
                s.list.progress_percentage()
            ),
            None => "No active tasks".to_string(),
        }
    }

    pub fn display(&self, show_all: bool) -> String {
        match &self.active {
            Some(s) => s.list.display(show_all),
            None => "No active todo list.".to_string(),
        }
    }

    pub async fn cache_stats(&self) -> Option<CacheStats> {
        match &self.active {
            Some(s) => Some(s.context.cache().stats().await),
            None => None,
        }
    }

    /// Execution context, cache statistics and the cached session summary.
    pub async fn context_report(&self) -> Option<String> {
        let session = self.active.as_ref()?;
        let mut out = session.context.context_report();
        out.push('\n');
        out.push_str(&session.context.cache().stats().await.to_string());
        out.push_str("\n\n");
        out.push_str(&session.context.cache().build_session_summary().await);
        Some(out)
    }
}

async fn resolve_current(
    session: &mut PlanSession,
    services: &Services,
    handler: &FailureHandler,
) -> Result<Resolution, PlanError> {
    let renderer = services.renderer.as_ref();
    let Some(task) = session.list.current_task() else {
        return Ok(Resolution::Finished);
    };
    let task_id = task.id;
    let description = task.description.clone();

    if session.retry.is_skipped(task_id) {
        let reason = session.retry.failure_reason(task_id).to_string();
        skip_current(session, renderer, reason).await?;
        return Ok(Resolution::Resolved);
    }

    let unmet = {
        let resolver = DependencyResolver::new(session.list.tasks())?;
        if resolver.can_execute(task) {
            None
        } else if let Some(dep) = resolver.unsatisfiable_dependency(task) {
            Some(match resolver.get(dep) {
                Some(_) => format!("cannot run: dependency task {dep} was not completed"),
                None => format!("cannot run: dependency task {dep} does not exist"),
            })
        } else if resolver.ready_tasks().is_empty() {
            // Prerequisites are still open but nothing else can move.
            return Ok(Resolution::Blocked(session.unresolved()));
        } else {
            let dep = resolver.first_unmet_dependency(task).unwrap_or(task_id);
            Some(format!("cannot run: dependency task {dep} was not completed"))
        }
    };
    if let Some(reason) = unmet {
        session.retry.mark_skipped(task_id, reason.clone());
        skip_current(session, renderer, reason).await?;
        return Ok(Resolution::Resolved);
    }

    session.list.start_current()?;
    renderer.render(&RenderEvent::TaskStarted {
        task_id,
        description: description.clone(),
        position: session.list.cursor() + 1,
        total: session.list.total_count(),
    });

    let classifier = *session.retry.classifier();
    loop {
        let context_text = session.context.build_prompt_context(&session.list).await;
        let route = TaskRouter::plan(&description);
        renderer.render(&RenderEvent::TaskRouted {
            task_id,
            execution_type: route.execution_type,
            target: route.target.clone(),
            rationale: route.rationale.clone(),
        });

        let result = backend::dispatch(
            services.executor.as_ref(),
            &route.target,
            &description,
            &context_text,
        )
        .await;

        let message = match result {
            Ok(output) => {
                let failures_before = session
                    .list
                    .current_task()
                    .map(|t| t.failure_count())
                    .unwrap_or(0);
                session.list.complete_current(output.clone())?;
                session.retry.record_success(task_id);
                session
                    .context
                    .record_task_result(task_id, &description, &output, true)
                    .await;
                tracing::info!(task_id, "task completed");
                renderer.render(&RenderEvent::TaskCompleted {
                    task_id,
                    description: description.clone(),
                    output,
                    recovered_after: failures_before,
                });
                if failures_before > 0 {
                    renderer.render(&RenderEvent::info(format!(
                        "TASK RECOVERED - Task {task_id} succeeded after {failures_before} retry attempt(s)"
                    )));
                }
                start_next(&mut session.list)?;
                session.context.persist_task_list(&session.list).await;
                return Ok(Resolution::Resolved);
            }
            Err(err) => err.to_string(),
        };

        let failure_count = match session.list.current_task_mut() {
            Some(task) => task.record_failure(message.clone()),
            None => return Ok(Resolution::Finished),
        };
        session.context.persist_task_list(&session.list).await;
        let kind = classifier.classify(&message);
        let budget = classifier.max_retries(kind);
        renderer.render(&RenderEvent::TaskFailed {
            task_id,
            description: description.clone(),
            kind,
            failure_count,
            budget,
            message: ErrorClassifier::describe(&message).to_string(),
        });

        let should_retry = session.retry.record_failure(task_id, &message);
        if should_retry && failure_count < budget {
            renderer.render(&RenderEvent::RetryScheduled {
                task_id,
                attempt: failure_count + 1,
                delay_ms: session.retry.next_delay(task_id).as_millis() as u64,
            });
            session.retry.wait_before_retry(task_id).await;
            continue;
        }

        let decision = {
            let Some(task) = session.list.current_task() else {
                return Ok(Resolution::Finished);
            };
            match handler.handle_failure(task, &message, failure_count).await {
                Ok(decision) => decision,
                Err(err) => {
                    tracing::warn!(task_id, error = %err, "operator prompt failed");
                    renderer.render(&RenderEvent::warn(format!(
                        "No operator decision ({err}); aborting plan"
                    )));
                    FailureDecision::AbortPlan
                }
            }
        };

        session
            .context
            .add_decision(format!("Task {task_id}: {}", decision.label()), message.clone());
        match decision {
            FailureDecision::RetryOnce => {
                if let Some(task) = session.list.current_task_mut() {
                    task.grant_grace();
                }
                session.retry.grant_grace(task_id);
                session.context.persist_task_list(&session.list).await;
                renderer.render(&RenderEvent::info("Retrying task..."));
            }
            FailureDecision::SkipTask => {
                session.retry.mark_skipped(task_id, message);
                let reason = session.retry.failure_reason(task_id).to_string();
                skip_current(session, renderer, reason).await?;
                return Ok(Resolution::Resolved);
            }
            FailureDecision::AbortPlan => {
                session
                    .context
                    .record_task_result(task_id, &description, &message, false)
                    .await;
                session.context.persist_context().await;
                session.context.persist_task_list(&session.list).await;
                return Ok(Resolution::Aborted(task_id));
            }
        }
    }
}

async fn skip_current(
    session: &mut PlanSession,
    renderer: &dyn OutputRendererPlugin,
    reason: String,
) -> Result<(), PlanError> {
    let Some(task) = session.list.current_task() else {
        return Ok(());
    };
    let task_id = task.id;
    let description = task.description.clone();

    session.list.skip_current()?;
    tracing::warn!(task_id, reason = %reason, "task skipped");
    session
        .context
        .record_task_result(task_id, &description, &reason, false)
        .await;
    start_next(&mut session.list)?;
    session.context.persist_context().await;
    session.context.persist_task_list(&session.list).await;
    renderer.render(&RenderEvent::TaskSkipped {
        task_id,
        description,
        reason,
    });
    Ok(())
}

/// Mark the task under the cursor in progress once the resolver reports it
/// ready; otherwise it stays pending until the next step checks it.
fn start_next(list: &mut TaskList) -> Result<(), PlanError> {
    let ready = match list.current_task() {
        Some(task) => DependencyResolver::new(list.tasks())?.can_execute(task),
        None => false,
    };
    if ready {
        list.start_current()?;
    }
    Ok(())
}
