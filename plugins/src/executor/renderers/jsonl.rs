use chrono::Local;
use plancraft_core::api::{OutputRendererPlugin, RenderEvent};
use serde_json::{json, Value};

pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_type(event: &RenderEvent) -> &'static str {
        match event {
            RenderEvent::PlanCreated { .. } => "plan.start",
            RenderEvent::TaskStarted { .. } => "task.start",
            RenderEvent::TaskRouted { .. } => "task.route",
            RenderEvent::TaskCompleted { .. } => "task.end",
            RenderEvent::TaskFailed { .. } => "task.failure",
            RenderEvent::RetryScheduled { .. } => "task.retry",
            RenderEvent::TaskSkipped { .. } => "task.skip",
            RenderEvent::Notice { .. } => "notice",
            RenderEvent::PlanCompleted { .. } => "plan.end",
            RenderEvent::PlanAborted { .. } => "plan.abort",
            RenderEvent::PlanBlocked { .. } => "plan.blocked",
        }
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        let mut metadata = serde_json::to_value(event).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut metadata {
            map.remove("event");
        }
        let task_id = match event {
            RenderEvent::TaskStarted { task_id, .. }
            | RenderEvent::TaskRouted { task_id, .. }
            | RenderEvent::TaskCompleted { task_id, .. }
            | RenderEvent::TaskFailed { task_id, .. }
            | RenderEvent::RetryScheduled { task_id, .. }
            | RenderEvent::TaskSkipped { task_id, .. } => Some(*task_id),
            _ => None,
        };

        let mut value = json!({
            "v": 1,
            "event_type": Self::event_type(event),
            "ts": ts,
            "metadata": metadata,
        });
        if let (Some(id), Value::Object(map)) = (task_id, &mut value) {
            map.insert("task_id".to_string(), json!(id));
        }
        value
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}
