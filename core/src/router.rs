//! Content-based task routing.
//!
//! Routing is a pure, ordered first-match over lower-cased keywords. It never
//! executes anything; the orchestrator dispatches on the returned decision.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteDecision {
    LlmPlanner,
    LlmCoder,
    LlmReviewer,
    LlmAnalyzer,
    ToolCompile,
    ToolTest,
    ToolAnalyze,
    McpSearch,
    McpFileRead,
    CmdAnalyze,
    CmdReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    Role,
    LocalTool,
    McpTool,
    Command,
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionType::Role => "ROLE",
            ExecutionType::LocalTool => "LOCAL_TOOL",
            ExecutionType::McpTool => "MCP_TOOL",
            ExecutionType::Command => "COMMAND",
        };
        f.write_str(s)
    }
}

/// Where a routed task goes, with the name the executor is called with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum RouteTarget {
    Role(String),
    LocalTool(String),
    RemoteTool(String),
    Command(String),
}

impl RouteTarget {
    pub fn name(&self) -> &str {
        match self {
            RouteTarget::Role(n)
            | RouteTarget::LocalTool(n)
            | RouteTarget::RemoteTool(n)
            | RouteTarget::Command(n) => n,
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Role(n) => write!(f, "role:{n}"),
            RouteTarget::LocalTool(n) => write!(f, "tool:{n}"),
            RouteTarget::RemoteTool(n) => write!(f, "mcp:{n}"),
            RouteTarget::Command(n) => write!(f, "command:{n}"),
        }
    }
}

/// Explicit command directives, matched as a prefix before any keyword rule.
const DIRECTIVES: &[(&str, RouteDecision)] = &[
    ("/analyze", RouteDecision::CmdAnalyze),
    ("/review", RouteDecision::CmdReview),
];

/// Keyword rules in priority order; the first rule with any hit wins.
const RULES: &[(RouteDecision, &[&str])] = &[
    (
        RouteDecision::LlmPlanner,
        &["design", "plan", "architect", "strategy", "设计", "规划", "架构"],
    ),
    (
        RouteDecision::LlmCoder,
        &["implement", "write code", "develop", "create", "编写", "实现", "开发"],
    ),
    (
        RouteDecision::LlmReviewer,
        &["review", "verify", "check", "audit", "审查", "验证"],
    ),
    (
        RouteDecision::LlmAnalyzer,
        &["analyze", "identify", "find", "detect", "分析", "识别"],
    ),
    (RouteDecision::ToolCompile, &["compile", "build", "编译", "构建"]),
    (RouteDecision::ToolTest, &["test", "run test", "验证功能", "测试"]),
    (RouteDecision::ToolAnalyze, &["static analyze", "lint", "静态分析"]),
    (
        RouteDecision::McpSearch,
        &["web search", "search the web", "搜索"],
    ),
    (RouteDecision::McpFileRead, &["read file", "读取文件"]),
];

impl RouteDecision {
    pub fn execution_type(self) -> ExecutionType {
        match self {
            RouteDecision::LlmPlanner
            | RouteDecision::LlmCoder
            | RouteDecision::LlmReviewer
            | RouteDecision::LlmAnalyzer => ExecutionType::Role,
            RouteDecision::ToolCompile | RouteDecision::ToolTest | RouteDecision::ToolAnalyze => {
                ExecutionType::LocalTool
            }
            RouteDecision::McpSearch | RouteDecision::McpFileRead => ExecutionType::McpTool,
            RouteDecision::CmdAnalyze | RouteDecision::CmdReview => ExecutionType::Command,
        }
    }

    pub fn role(self) -> Option<&'static str> {
        match self {
            RouteDecision::LlmPlanner => Some("planner"),
            RouteDecision::LlmCoder => Some("coder"),
            RouteDecision::LlmReviewer => Some("reviewer"),
            RouteDecision::LlmAnalyzer => Some("analyzer"),
            _ => None,
        }
    }

    pub fn local_tool(self) -> Option<&'static str> {
        match self {
            RouteDecision::ToolCompile => Some("compile"),
            RouteDecision::ToolTest => Some("test"),
            RouteDecision::ToolAnalyze => Some("analyze"),
            _ => None,
        }
    }

    pub fn mcp_tool(self) -> Option<&'static str> {
        match self {
            RouteDecision::McpSearch => Some("web_search"),
            RouteDecision::McpFileRead => Some("file_read"),
            _ => None,
        }
    }

    pub fn cli_command(self) -> Option<&'static str> {
        match self {
            RouteDecision::CmdAnalyze => Some("/analyze"),
            RouteDecision::CmdReview => Some("/review"),
            _ => None,
        }
    }

    pub fn target(self) -> RouteTarget {
        if let Some(role) = self.role() {
            RouteTarget::Role(role.to_string())
        } else if let Some(tool) = self.local_tool() {
            RouteTarget::LocalTool(tool.to_string())
        } else if let Some(tool) = self.mcp_tool() {
            RouteTarget::RemoteTool(tool.to_string())
        } else {
            RouteTarget::Command(self.cli_command().unwrap_or("/analyze").to_string())
        }
    }

    pub fn rationale(self) -> &'static str {
        match self {
            RouteDecision::LlmPlanner => "Routing to Planner role (LLM) for design/planning",
            RouteDecision::LlmCoder => "Routing to Coder role (LLM) for implementation",
            RouteDecision::LlmReviewer => "Routing to Reviewer role (LLM) for code review",
            RouteDecision::LlmAnalyzer => "Routing to Analyzer role (LLM) for analysis",
            RouteDecision::ToolCompile => "Routing to local compile tool",
            RouteDecision::ToolTest => "Routing to local test tool",
            RouteDecision::ToolAnalyze => "Routing to local analysis tool",
            RouteDecision::McpSearch => "Routing to MCP web search tool",
            RouteDecision::McpFileRead => "Routing to MCP file read tool",
            RouteDecision::CmdAnalyze => "Routing to /analyze command",
            RouteDecision::CmdReview => "Routing to /review command",
        }
    }

    pub fn requires_local_tools(self) -> bool {
        self.execution_type() == ExecutionType::LocalTool
    }

    pub fn requires_external_tools(self) -> bool {
        self.execution_type() == ExecutionType::McpTool
    }
}

/// Resolved route for one task description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub decision: RouteDecision,
    pub execution_type: ExecutionType,
    pub target: RouteTarget,
    pub rationale: String,
}

pub struct TaskRouter;

impl TaskRouter {
    pub fn route(description: &str) -> RouteDecision {
        let lower = description.trim().to_lowercase();

        for (prefix, decision) in DIRECTIVES {
            if lower.starts_with(prefix) {
                return *decision;
            }
        }

        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(decision, _)| *decision)
            .unwrap_or(RouteDecision::LlmAnalyzer)
    }

    pub fn plan(description: &str) -> RoutePlan {
        let decision = Self::route(description);
        let plan = RoutePlan {
            decision,
            execution_type: decision.execution_type(),
            target: decision.target(),
            rationale: decision.rationale().to_string(),
        };
        tracing::debug!(
            decision = ?plan.decision,
            target = %plan.target,
            "task routed"
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_routes_to_local_tool() {
        let plan = TaskRouter::plan("compile the project");
        assert_eq!(plan.decision, RouteDecision::ToolCompile);
        assert_eq!(plan.execution_type, ExecutionType::LocalTool);
        assert_eq!(plan.target, RouteTarget::LocalTool("compile".into()));
        assert_eq!(plan.rationale, "Routing to local compile tool");
    }

    #[test]
    fn test_design_routes_to_planner() {
        let plan = TaskRouter::plan("Design the schema");
        assert_eq!(plan.execution_type, ExecutionType::Role);
        assert_eq!(plan.target.name(), "planner");
    }

    #[test]
    fn test_rule_priority() {
        // planner outranks coder
        assert_eq!(TaskRouter::route("implement the plan"), RouteDecision::LlmPlanner);
        // reviewer outranks the test tool
        assert_eq!(TaskRouter::route("verify the test suite"), RouteDecision::LlmReviewer);
        assert_eq!(TaskRouter::route("run unit tests"), RouteDecision::ToolTest);
        assert_eq!(TaskRouter::route("lint the crate"), RouteDecision::ToolAnalyze);
    }

    #[test]
    fn test_chinese_keywords() {
        assert_eq!(TaskRouter::route("设计数据库结构"), RouteDecision::LlmPlanner);
        assert_eq!(TaskRouter::route("编译项目"), RouteDecision::ToolCompile);
        assert_eq!(TaskRouter::route("运行测试"), RouteDecision::ToolTest);
    }

    #[test]
    fn test_default_is_analyzer() {
        assert_eq!(TaskRouter::route("summarize the logs"), RouteDecision::LlmAnalyzer);
    }

    #[test]
    fn test_remote_tools_and_commands() {
        assert_eq!(TaskRouter::route("web search for tokio docs"), RouteDecision::McpSearch);
        assert_eq!(TaskRouter::route("read file Cargo.toml"), RouteDecision::McpFileRead);
        assert!(RouteDecision::McpSearch.requires_external_tools());
        assert_eq!(RouteDecision::McpFileRead.mcp_tool(), Some("file_read"));

        let plan = TaskRouter::plan("/review src/lib.rs");
        assert_eq!(plan.decision, RouteDecision::CmdReview);
        assert_eq!(plan.target, RouteTarget::Command("/review".into()));
        assert_eq!(TaskRouter::route("/analyze the crash"), RouteDecision::CmdAnalyze);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(RouteDecision::LlmCoder.role(), Some("coder"));
        assert_eq!(RouteDecision::LlmCoder.local_tool(), None);
        assert_eq!(RouteDecision::ToolAnalyze.local_tool(), Some("analyze"));
        assert!(RouteDecision::ToolTest.requires_local_tools());
        assert!(!RouteDecision::ToolTest.requires_external_tools());
        assert_eq!(RouteDecision::CmdAnalyze.cli_command(), Some("/analyze"));
    }
}
