use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use plancraft_core::api::{NoticeLevel, OutputRendererPlugin, RenderEvent, TaskStatus};

const OUTPUT_PREVIEW_CHARS: usize = 120;

pub struct TextRendererPlugin {
    ascii_only: bool,
    progress_bar: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool, progress_bar: bool) -> Self {
        Self {
            ascii_only,
            progress_bar,
            bar: Mutex::new(None),
        }
    }

    fn marker(&self, event: &RenderEvent) -> &'static str {
        match (event, self.ascii_only) {
            (RenderEvent::TaskCompleted { .. }, true) => "OK",
            (RenderEvent::TaskCompleted { .. }, false) => "✔",
            (RenderEvent::TaskFailed { .. }, true) => "FAIL",
            (RenderEvent::TaskFailed { .. }, false) => "✘",
            (RenderEvent::TaskSkipped { .. }, true) => "SKIP",
            (RenderEvent::TaskSkipped { .. }, false) => "⤼",
            _ => "",
        }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::PlanCreated {
                session_id,
                requirement,
                rationale,
                tasks,
            } => {
                let mut out = format!("PLAN {session_id}\nRequirement: {requirement}");
                if let Some(r) = rationale {
                    out.push_str(&format!("\nRationale: {r}"));
                }
                out.push_str(&format!("\nTasks ({}):", tasks.len()));
                for t in tasks {
                    out.push_str(&format!("\n  {} {}. {}", t.status.marker(), t.id, t.description));
                    if !t.dependencies.is_empty() {
                        let deps: Vec<String> =
                            t.dependencies.iter().map(|d| d.to_string()).collect();
                        out.push_str(&format!(" (depends on: {})", deps.join(", ")));
                    }
                }
                out
            }
            RenderEvent::TaskStarted {
                task_id,
                description,
                position,
                total,
            } => format!("TASK START [{position}/{total}] Task {task_id}: {description}"),
            RenderEvent::TaskRouted {
                execution_type,
                target,
                rationale,
                ..
            } => format!("  -> {execution_type} {target} ({rationale})"),
            RenderEvent::TaskCompleted {
                task_id, output, ..
            } => {
                let mut line = format!("{} Task {task_id} completed", self.marker(event));
                let preview = preview(output);
                if !preview.is_empty() {
                    line.push_str(&format!(": {preview}"));
                }
                line
            }
            RenderEvent::TaskFailed {
                task_id,
                description,
                kind,
                failure_count,
                budget,
                message,
            } => format!(
                "{} Task {task_id} ({description}) failed [{kind}, failure {failure_count}, budget {budget}]: {message}",
                self.marker(event)
            ),
            RenderEvent::RetryScheduled {
                task_id,
                attempt,
                delay_ms,
            } => format!("  retrying task {task_id} (attempt {attempt}) in {delay_ms}ms"),
            RenderEvent::TaskSkipped {
                task_id,
                description,
                reason,
            } => format!(
                "{} Task {task_id} ({description}) skipped: {reason}",
                self.marker(event)
            ),
            RenderEvent::Notice { level, message } => match level {
                NoticeLevel::Info => message.clone(),
                NoticeLevel::Warn => format!("WARNING: {message}"),
            },
            RenderEvent::PlanCompleted { report } => report.to_string(),
            RenderEvent::PlanAborted {
                session_id,
                task_id,
            } => format!("PLAN ABORTED {session_id} at task {task_id}"),
            RenderEvent::PlanBlocked {
                session_id,
                waiting,
            } => {
                let ids: Vec<String> = waiting.iter().map(|id| id.to_string()).collect();
                format!(
                    "PLAN BLOCKED {session_id}: tasks {} wait on dependencies that did not complete",
                    ids.join(", ")
                )
            }
        }
    }

    fn update_bar(&self, event: &RenderEvent) {
        if !self.progress_bar {
            return;
        }
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        match event {
            RenderEvent::PlanCreated { tasks, .. } => {
                let done = tasks
                    .iter()
                    .filter(|t| matches!(t.status, TaskStatus::Completed | TaskStatus::Skipped))
                    .count() as u64;
                let bar = ProgressBar::new(tasks.len() as u64);
                let style = ProgressStyle::with_template("{bar:30} {pos}/{len} tasks {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar());
                bar.set_style(style);
                bar.set_position(done);
                *guard = Some(bar);
            }
            RenderEvent::TaskStarted { description, .. } => {
                if let Some(bar) = guard.as_ref() {
                    bar.set_message(description.clone());
                }
            }
            RenderEvent::TaskCompleted { .. } | RenderEvent::TaskSkipped { .. } => {
                if let Some(bar) = guard.as_ref() {
                    bar.inc(1);
                }
            }
            RenderEvent::PlanCompleted { .. }
            | RenderEvent::PlanAborted { .. }
            | RenderEvent::PlanBlocked { .. } => {
                if let Some(bar) = guard.take() {
                    bar.finish_and_clear();
                }
            }
            _ => {}
        }
    }

    fn print(&self, line: &str) {
        let bar = self.bar.lock().ok().and_then(|g| g.clone());
        match bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }
}

fn preview(output: &str) -> String {
    let first = output.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if first.chars().count() > OUTPUT_PREVIEW_CHARS {
        let cut: String = first.chars().take(OUTPUT_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        let line = self.format_event(event);
        self.print(&line);
        self.update_bar(event);
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}
