//! Command line flags.

use quill_lexer::HighlightSupport;
use quill_parse::SessionConfig;

use crate::CliError;

/// Flags shared by every command, plus the positional arguments left over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    pub config: SessionConfig,
    pub positional: Vec<String>,
}

impl Options {
    /// Split `args` (everything after the command name) into flags and
    /// positionals.
    ///
    /// Recognised flags: `--highlights=all|basic` and `--stats`.
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut options = Options::default();
        for arg in args {
            if let Some(level) = arg.strip_prefix("--highlights=") {
                options.config.support = match level {
                    "all" => HighlightSupport::all(),
                    "basic" => HighlightSupport::BASIC,
                    _ => {
                        return Err(CliError::Usage(format!(
                            "unknown highlight level '{level}' (expected all or basic)"
                        )))
                    }
                };
            } else if arg == "--stats" {
                options.config.stats = true;
            } else if arg.starts_with("--") {
                return Err(CliError::UnknownOption(arg.clone()));
            } else {
                options.positional.push(arg.clone());
            }
        }
        Ok(options)
    }

    /// The positional at `index`, or a usage error naming it.
    pub fn positional(&self, index: usize, name: &str) -> Result<&str, CliError> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CliError::Usage(format!("missing {name}")))
    }
}

#[cfg(test)]
mod tests;
