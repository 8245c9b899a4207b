use std::io;

use quill_parse::{GrammarError, SessionError};

/// Everything that can stop a `quill` command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("{0}")]
    Usage(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("line {line} of the edit script: {message}")]
    Script { line: usize, message: String },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

impl CliError {
    pub fn read(path: &str, source: io::Error) -> Self {
        CliError::Read {
            path: path.to_owned(),
            source,
        }
    }
}
