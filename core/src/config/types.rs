use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub decomposer: DecomposerConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "plancraft_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// "fixed", "linear" or "exponential-backoff".
    #[serde(default = "default_retry_strategy")]
    pub strategy: String,

    /// Base delay between automatic retries.
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,

    /// Upper bound for growing strategies.
    #[serde(default = "default_retry_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_transient_max_retries")]
    pub transient_max_retries: u32,

    #[serde(default)]
    pub permanent_max_retries: u32,
}

fn default_retry_strategy() -> String {
    "fixed".to_string()
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_transient_max_retries() -> u32 {
    3
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: default_retry_strategy(),
            delay_ms: default_retry_delay_ms(),
            max_delay_ms: default_retry_max_delay_ms(),
            transient_max_retries: default_transient_max_retries(),
            permanent_max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// 0 waits forever.
    #[serde(default)]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false the context cache lives in memory only.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Defaults to `~/.plancraft/cache`.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposerConfig {
    #[serde(default = "default_decomposer_provider")]
    #[serde(flatten)]
    pub provider: DecomposerProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum DecomposerProvider {
    /// Keyword rules; needs no external planner.
    #[serde(rename = "builtin")]
    Builtin(BuiltinDecomposerConfig),
    #[serde(rename = "command")]
    Command(CommandDecomposerConfig),
    #[serde(rename = "plan-file")]
    PlanFile(PlanFileDecomposerConfig),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuiltinDecomposerConfig {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDecomposerConfig {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_command_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFileDecomposerConfig {
    #[serde(default = "default_plan_file")]
    pub path: String,
}

fn default_plan_file() -> String {
    "plan.toml".to_string()
}

impl Default for PlanFileDecomposerConfig {
    fn default() -> Self {
        Self {
            path: default_plan_file(),
        }
    }
}

fn default_decomposer_provider() -> DecomposerProvider {
    DecomposerProvider::Builtin(BuiltinDecomposerConfig::default())
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self {
            provider: default_decomposer_provider(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_executor_provider")]
    #[serde(flatten)]
    pub provider: ExecutorProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum ExecutorProvider {
    /// Dry run: every task succeeds with a description of what would run.
    #[serde(rename = "echo")]
    Echo(EchoExecutorConfig),
    #[serde(rename = "command")]
    Command(CommandExecutorConfig),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EchoExecutorConfig {}

/// Shell command templates per route target.
///
/// Templates may use `{role}`, `{tool}`, `{command}` and `{description}`;
/// the shell-quoted description is substituted, the context goes to stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandExecutorConfig {
    #[serde(default = "default_command_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub roles: BTreeMap<String, String>,

    #[serde(default)]
    pub tools: BTreeMap<String, String>,

    #[serde(default)]
    pub remote_tools: BTreeMap<String, String>,

    #[serde(default)]
    pub commands: BTreeMap<String, String>,
}

impl Default for CommandExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_command_timeout_ms(),
            roles: BTreeMap::new(),
            tools: BTreeMap::new(),
            remote_tools: BTreeMap::new(),
            commands: BTreeMap::new(),
        }
    }
}

fn default_command_timeout_ms() -> u64 {
    600_000
}

fn default_executor_provider() -> ExecutorProvider {
    ExecutorProvider::Echo(EchoExecutorConfig::default())
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            provider: default_executor_provider(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// "text" or "jsonl".
    #[serde(default = "default_output_format")]
    pub format: String,

    #[serde(default)]
    pub ascii_only: bool,

    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,
}

fn default_output_format() -> String {
    "text".to_string()
}

fn default_progress_bar() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            ascii_only: false,
            progress_bar: default_progress_bar(),
        }
    }
}
