//! Command templates for the command executor.
//!
//! A template is a shell command line with `{role}`, `{tool}`, `{command}`
//! and `{description}` placeholders. Substituted values are single-quoted for
//! POSIX shells so task descriptions never reach the shell unescaped.
//!
//! # Example
//!
//! ```rust
//! use plancraft_plugins::backend::template::render_template;
//!
//! let line = render_template("coder-agent --role {role} {description}", "coder", "fix the 'lexer'");
//! assert_eq!(line, r#"coder-agent --role 'coder' 'fix the '\''lexer'\'''"#);
//! ```

/// Quote `arg` as one POSIX shell word.
///
/// ```rust
/// use plancraft_plugins::backend::template::shell_quote;
///
/// assert_eq!(shell_quote("plain"), "'plain'");
/// assert_eq!(shell_quote("it's"), r#"'it'\''s'"#);
/// ```
pub fn shell_quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Fill a template for `target` (role, tool or command name) and `description`.
pub fn render_template(template: &str, target: &str, description: &str) -> String {
    let target = shell_quote(target);
    template
        .replace("{role}", &target)
        .replace("{tool}", &target)
        .replace("{command}", &target)
        .replace("{description}", &shell_quote(description))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_empty() {
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_metacharacters_stay_inside_quotes() {
        let line = render_template("run {description}", "x", "a && rm -rf / | cat");
        assert_eq!(line, "run 'a && rm -rf / | cat'");
    }

    #[test]
    fn test_template_without_placeholders() {
        assert_eq!(render_template("cargo build", "compile", "build it"), "cargo build");
    }

    #[test]
    fn test_cjk_description() {
        assert_eq!(render_template("{description}", "r", "实现解析器"), "'实现解析器'");
    }
}
