use std::io;

use thiserror::Error;

use crate::job::JobId;

/// Every locally recoverable failure the shell reports before re-prompting.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("syntax error: multiple input files")]
    MultipleInputs,
    #[error("syntax error: multiple output files")]
    MultipleOutputs,
    #[error("must specify input file")]
    MissingInput,
    #[error("must specify output file")]
    MissingOutput,
    #[error("cannot have two redirect symbols next to each other")]
    AdjacentRedirects,
    #[error("syntax error: empty command")]
    EmptyCommand,
    #[error("input is too long")]
    LineTooLong,
    #[error("{0}: syntax error")]
    Syntax(&'static str),
    #[error("job not found")]
    JobNotFound(JobId),
    #[error("{0}: command not found")]
    CommandNotFound(String),
    #[error("job table is full")]
    JobTableFull,
    #[error("{context}: {source}")]
    Os {
        context: &'static str,
        #[source]
        source: nix::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    pub fn os(context: &'static str) -> impl FnOnce(nix::Error) -> Self {
        move |source| ShellError::Os { context, source }
    }

    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| ShellError::Io { context, source }
    }
}
