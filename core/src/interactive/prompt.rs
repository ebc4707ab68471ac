use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::PromptError;

/// Source of operator decisions.
///
/// One call reads one raw line of input; validating it against the offered
/// options is the caller's job.
#[async_trait::async_trait]
pub trait OperatorPrompt: Send + Sync {
    fn name(&self) -> &str;

    async fn choose(&self, title: &str, options: &[&str]) -> Result<String, PromptError>;
}

/// Prompt fed from a fixed list of answers.
///
/// Used for non-interactive runs and tests; once the answers run out every
/// further call fails with [`PromptError::Closed`].
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Titles of every prompt shown so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl OperatorPrompt for ScriptedPrompt {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn choose(&self, title: &str, _options: &[&str]) -> Result<String, PromptError> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(title.to_string());
        }
        let mut answers = self.answers.lock().map_err(|_| PromptError::Closed)?;
        answers.pop_front().ok_or(PromptError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_prompt_runs_dry() {
        let p = ScriptedPrompt::new(["2"]);
        assert_eq!(p.choose("pick", &["a", "b"]).await.unwrap(), "2");
        assert!(matches!(
            p.choose("pick", &["a", "b"]).await,
            Err(PromptError::Closed)
        ));
        assert_eq!(p.asked().len(), 2);
    }
}
