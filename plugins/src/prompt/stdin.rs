use std::time::Duration;

use async_trait::async_trait;
use plancraft_core::api::{OperatorPrompt, PromptError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stderr, Stdin};
use tokio::sync::Mutex;

/// Operator prompt over a line-based reader/writer pair.
///
/// The menu is written to `out`, one answer line is read from `input`.
pub struct LinePrompt<R, W> {
    io: Mutex<(R, W)>,
    timeout_ms: u64,
}

/// Menu on stderr, answers from stdin, so stdout stays clean for JSONL.
pub type StdinPrompt = LinePrompt<BufReader<Stdin>, Stderr>;

impl StdinPrompt {
    pub fn stdio(timeout_ms: u64) -> Self {
        LinePrompt::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr(), timeout_ms)
    }
}

impl<R, W> LinePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// `timeout_ms == 0` waits forever.
    pub fn new(input: R, out: W, timeout_ms: u64) -> Self {
        Self {
            io: Mutex::new((input, out)),
            timeout_ms,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }
}

fn render_menu(title: &str, options: &[&str]) -> String {
    let mut menu = format!("\n{title}\n");
    for (i, option) in options.iter().enumerate() {
        menu.push_str(&format!("  {}. {option}\n", i + 1));
    }
    menu.push_str(&format!("Your choice (1-{}): ", options.len()));
    menu
}

#[async_trait]
impl<R, W> OperatorPrompt for LinePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        "stdin"
    }

    async fn choose(&self, title: &str, options: &[&str]) -> Result<String, PromptError> {
        let mut guard = self.io.lock().await;
        let (input, out) = &mut *guard;

        out.write_all(render_menu(title, options).as_bytes()).await?;
        out.flush().await?;

        let mut line = String::new();
        let read = input.read_line(&mut line);
        let n = if self.timeout_ms == 0 {
            read.await?
        } else {
            tokio::time::timeout(Duration::from_millis(self.timeout_ms), read)
                .await
                .map_err(|_| PromptError::Timeout(self.timeout_ms))??
        };
        if n == 0 {
            return Err(PromptError::Closed);
        }
        Ok(line.trim().to_string())
    }
}
