use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "plancraft", version, about = "Decompose a requirement into tasks and drive them to completion")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; overrides $PLANCRAFT_CONFIG and the default locations.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

/// Options shared by commands that drive a plan.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct DriveArgs {
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Answers for the failure menu, comma separated (e.g. "1,2").
    /// The plan aborts when they run out instead of reading stdin.
    #[arg(long)]
    pub answers: Option<String>,

    /// Delay between automatic retries, in milliseconds.
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Print plain ASCII markers.
    #[arg(long)]
    pub ascii: bool,

    /// Keep the context cache in memory only.
    #[arg(long)]
    pub no_cache: bool,

    /// Route every task to the dry-run executor.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// The requirement to decompose.
    pub requirement: String,

    /// Read the task breakdown from a TOML, JSON or numbered-list file.
    #[arg(long)]
    pub plan_file: Option<String>,

    #[command(flatten)]
    pub drive: DriveArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ResumeArgs {
    pub session_id: String,

    #[command(flatten)]
    pub drive: DriveArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RouteArgs {
    pub description: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ClassifyArgs {
    pub message: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GraphArgs {
    #[arg(long)]
    pub plan_file: String,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CacheArgs {
    pub session_id: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decompose a requirement and execute its tasks.
    Run(RunArgs),
    /// Continue a cached session.
    Resume(ResumeArgs),
    /// Show where a task description would be routed.
    Route(RouteArgs),
    /// Classify an error message.
    Classify(ClassifyArgs),
    /// Validate a plan file and print its dependency graph.
    Graph(GraphArgs),
    /// Show what the context cache holds for a session.
    Cache(CacheArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::try_parse_from([
            "plancraft",
            "run",
            "Harden module X",
            "--plan-file",
            "plan.toml",
            "--format",
            "jsonl",
            "--answers",
            "1,2",
        ])
        .unwrap();
        match args.command {
            Commands::Run(r) => {
                assert_eq!(r.requirement, "Harden module X");
                assert_eq!(r.plan_file.as_deref(), Some("plan.toml"));
                assert_eq!(r.drive.format, Some(OutputFormat::Jsonl));
                assert_eq!(r.drive.answers.as_deref(), Some("1,2"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_graph_requires_plan_file() {
        assert!(Args::try_parse_from(["plancraft", "graph"]).is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args =
            Args::try_parse_from(["plancraft", "classify", "503", "--config", "c.toml"]).unwrap();
        assert_eq!(args.config.as_deref(), Some("c.toml"));
    }
}
