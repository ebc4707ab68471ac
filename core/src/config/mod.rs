pub mod load;
pub mod types;

pub use load::{apply_env_overrides, expand_path, get_plancraft_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, BuiltinDecomposerConfig, CacheConfig, CommandDecomposerConfig,
    CommandExecutorConfig, DecomposerConfig, DecomposerProvider, EchoExecutorConfig,
    ExecutorConfig, ExecutorProvider, LoggingConfig, OutputConfig, PlanFileDecomposerConfig,
    PromptConfig, RetryConfig,
};
