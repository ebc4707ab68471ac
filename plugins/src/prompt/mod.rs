pub mod stdin;

pub use stdin::{LinePrompt, StdinPrompt};
