//! Placeholder substitution for backend command templates.
//!
//! # Syntax
//!
//! - `{name}` - Substitutes the value of variable `name`
//! - `{{` - Renders as literal `{`
//! - `}}` - Renders as literal `}`
//!
//! Undefined variables are an error rather than an empty substitution.
//! Templates are split into arguments with shell-words *before* rendering, so
//! a prompt containing quotes or spaces always stays a single argument.

use crate::error::{ForklineError, Result};
use std::collections::HashMap;
use std::fmt;

/// Error type for template rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A variable was referenced but not provided.
    UndefinedVariable { name: String, position: usize },
    /// A `{` was found without a matching `}`.
    UnmatchedBrace { position: usize },
    /// An empty variable name was found (e.g., `{}`).
    EmptyVariableName { position: usize },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UndefinedVariable { name, position } => write!(
                f,
                "undefined variable '{}' at position {} in template",
                name, position
            ),
            TemplateError::UnmatchedBrace { position } => {
                write!(f, "unmatched '{{' at position {} in template", position)
            }
            TemplateError::EmptyVariableName { position } => write!(
                f,
                "empty variable name '{{}}' at position {} in template",
                position
            ),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Render a template string by substituting variables.
///
/// ```
/// use std::collections::HashMap;
/// use forkline::backend::render_template;
///
/// let mut vars = HashMap::new();
/// vars.insert("prompt".to_string(), "fix the build".to_string());
///
/// assert_eq!(render_template("--task={prompt}", &vars).unwrap(), "--task=fix the build");
/// assert_eq!(render_template("{{literal}}", &vars).unwrap(), "{literal}");
/// ```
pub fn render_template(
    template: &str,
    variables: &HashMap<String, String>,
) -> std::result::Result<String, TemplateError> {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                if let Some((_, '{')) = chars.peek() {
                    chars.next();
                    result.push('{');
                    continue;
                }

                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, '}')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(TemplateError::UnmatchedBrace { position: pos }),
                    }
                }

                let name = name.trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyVariableName { position: pos });
                }

                match variables.get(name) {
                    Some(value) => result.push_str(value),
                    None => {
                        return Err(TemplateError::UndefinedVariable {
                            name: name.to_string(),
                            position: pos,
                        });
                    }
                }
            }
            '}' => {
                // `}}` collapses to one brace; a lone `}` is literal.
                if let Some((_, '}')) = chars.peek() {
                    chars.next();
                }
                result.push('}');
            }
            _ => result.push(ch),
        }
    }

    Ok(result)
}

/// Split a command template into program arguments and render each one.
pub fn render_command(template: &str, variables: &HashMap<String, String>) -> Result<Vec<String>> {
    let words = shell_words::split(template).map_err(|e| {
        ForklineError::ConfigError(format!(
            "failed to parse backend command '{}': {}\n\
             Fix: check for unmatched quotes or invalid escape sequences.",
            template, e
        ))
    })?;

    if words.is_empty() {
        return Err(ForklineError::ConfigError(format!(
            "backend command is empty after parsing: '{}'",
            template
        )));
    }

    words
        .iter()
        .map(|word| {
            render_template(word, variables).map_err(|e| {
                ForklineError::ConfigError(format!(
                    "backend command '{}': {}\nAvailable variables: {}",
                    template,
                    e,
                    format_vars(variables)
                ))
            })
        })
        .collect()
}

/// Helper to create a variables map from a list of key-value pairs.
pub fn vars<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn format_vars(variables: &HashMap<String, String>) -> String {
    let mut names: Vec<_> = variables.keys().map(String::as_str).collect();
    names.sort_unstable();
    names.join(", ")
}
