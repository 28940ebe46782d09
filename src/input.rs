use std::fs::File;
use std::io::{self, IsTerminal, Read, Write};
use std::os::fd::AsFd;

use bytes::BytesMut;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use crate::completion::ShellCompleter;
use crate::error::ShellError;

/// Largest accepted line, counting its terminating newline.
pub const MAX_LINE: usize = 1024;

pub enum Line {
    Text(String),
    Eof,
}

/// Where input lines come from: a line editor on a terminal, raw bytes
/// otherwise.
enum Source {
    Editor(Box<Editor<ShellCompleter, DefaultHistory>>),
    Raw(RawLines),
}

pub struct LineReader {
    source: Source,
    prompt: Option<String>,
}

impl LineReader {
    pub fn new(prompt: Option<String>) -> Result<Self, ShellError> {
        let stdin = io::stdin();
        let source = if stdin.is_terminal() {
            let mut editor = Editor::new().map_err(|e| ShellError::Io {
                context: "line editor".to_string(),
                source: io::Error::other(e),
            })?;
            editor.set_helper(Some(ShellCompleter::new()));
            Source::Editor(Box::new(editor))
        } else {
            let fd = stdin
                .as_fd()
                .try_clone_to_owned()
                .map_err(ShellError::io("stdin"))?;
            Source::Raw(RawLines::new(File::from(fd)))
        };
        Ok(Self { source, prompt })
    }

    /// Prompts and reads the next line, without its newline.
    pub fn read_line(&mut self) -> Result<Line, ShellError> {
        let prompt = self.prompt.as_deref().unwrap_or("");
        match self.source {
            Source::Editor(ref mut editor) => match editor.readline(prompt) {
                Ok(line) => {
                    if line.len() >= MAX_LINE {
                        return Err(ShellError::LineTooLong);
                    }
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    Ok(Line::Text(line))
                }
                Err(ReadlineError::Interrupted) => Ok(Line::Text(String::new())),
                Err(ReadlineError::Eof) => Ok(Line::Eof),
                Err(ReadlineError::Io(e)) => Err(ShellError::io("reading input failed")(e)),
                Err(e) => Err(ShellError::io("reading input failed")(io::Error::other(e))),
            },
            Source::Raw(ref mut raw) => {
                if !prompt.is_empty() {
                    let mut stdout = io::stdout();
                    let _ = stdout.write_all(prompt.as_bytes());
                    let _ = stdout.flush();
                }
                raw.next_line()
            }
        }
    }
}

/// Reads standard input one byte at a time so nothing past the current
/// newline is taken from a child that shares the descriptor.
struct RawLines<R = File> {
    reader: R,
    buf: BytesMut,
}

impl<R: Read> RawLines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(MAX_LINE),
        }
    }

    fn next_line(&mut self) -> Result<Line, ShellError> {
        self.buf.clear();
        let mut overflowed = false;
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) if self.buf.is_empty() && !overflowed => return Ok(Line::Eof),
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => {
                    if self.buf.len() + 1 >= MAX_LINE {
                        overflowed = true;
                        self.buf.clear();
                    } else if !overflowed {
                        self.buf.extend_from_slice(&byte);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ShellError::io("reading input failed")(e)),
            }
        }
        if overflowed {
            return Err(ShellError::LineTooLong);
        }
        let line = self.buf.split().freeze();
        Ok(Line::Text(String::from_utf8_lossy(&line).into_owned()))
    }
}
