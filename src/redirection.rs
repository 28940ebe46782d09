use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;

use nix::unistd;

use crate::error::ShellError;
use crate::tokenize::display_name;

/// Target of an output redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub file: String,
    pub append: bool,
}

/// A parsed command line with redirections and the background marker removed.
///
/// `args[0]` is the program word in its path form. `None` for either target
/// means the child inherits the shell's descriptor.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub args: Vec<String>,
    pub redirect_stdin: Option<String>,
    pub redirect_stdout: Option<Redirection>,
    pub background: bool,
}

impl ParsedCommand {
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    /// Final path component of the program word, used as argument 0 and
    /// as the job label.
    pub fn label(&self) -> &str {
        display_name(self.program())
    }

    /// The argument vector handed to the new program image.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.args.clone();
        argv[0] = self.label().to_string();
        argv
    }
}

fn is_operator(token: &str) -> bool {
    matches!(token, "<" | ">" | ">>")
}

/// Strips `<`, `>`, `>>` and a trailing `&` from the token list.
///
/// Rejects a second input or output target, an operator without a file
/// name, two operators in a row, and a line with no command word left.
pub fn parse_command(tokens: Vec<String>) -> Result<ParsedCommand, ShellError> {
    let mut parsed = ParsedCommand::default();
    let last = tokens.len().saturating_sub(1);
    let mut tokens = tokens.into_iter().enumerate().peekable();

    while let Some((i, token)) = tokens.next() {
        if is_operator(&token) {
            let file = match tokens.next_if(|(_, next)| !is_operator(next)) {
                Some((_, file)) => file,
                None if tokens.peek().is_some() => return Err(ShellError::AdjacentRedirects),
                None if token == "<" => return Err(ShellError::MissingInput),
                None => return Err(ShellError::MissingOutput),
            };
            if token == "<" {
                if parsed.redirect_stdin.replace(file).is_some() {
                    return Err(ShellError::MultipleInputs);
                }
            } else {
                let redirection = Redirection {
                    file,
                    append: token == ">>",
                };
                if parsed.redirect_stdout.replace(redirection).is_some() {
                    return Err(ShellError::MultipleOutputs);
                }
            }
        } else if token == "&" && i == last {
            parsed.background = true;
        } else {
            parsed.args.push(token);
        }
    }

    if parsed.args.is_empty() {
        return Err(ShellError::EmptyCommand);
    }
    Ok(parsed)
}

/// Opens the redirection targets and installs them as descriptors 0 and 1.
/// Runs in the child between fork and exec.
pub fn apply(parsed: &ParsedCommand) -> Result<(), ShellError> {
    if let Some(ref input) = parsed.redirect_stdin {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(input)
            .map_err(ShellError::io(format!("input error: {input}")))?;
        install(&file, 0)?;
    }

    if let Some(ref redirection) = parsed.redirect_stdout {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).mode(0o700);
        let context = if redirection.append {
            options.append(true);
            "append error"
        } else {
            options.truncate(true);
            "output error"
        };
        let file = options
            .open(&redirection.file)
            .map_err(ShellError::io(format!("{context}: {}", redirection.file)))?;
        install(&file, 1)?;
    }
    Ok(())
}

fn install(file: &File, fd: i32) -> Result<(), ShellError> {
    unistd::dup2(file.as_raw_fd(), fd)
        .map(|_| ())
        .map_err(ShellError::os("dup2"))
}
