use rustyline::Helper;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;

use crate::commands::{BUILTINS, path_dirs};

/// Tab completion for the prompt: builtins and executables on `PATH` for
/// the command word, file names everywhere else.
pub struct ShellCompleter {
    filename_completer: FilenameCompleter,
}

impl ShellCompleter {
    pub fn new() -> Self {
        Self {
            filename_completer: FilenameCompleter::new(),
        }
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        let (start, word) = current_word(line, pos);
        if is_command_position(&line[..start]) && !word.contains('/') {
            Ok((start, command_candidates(word)))
        } else {
            self.filename_completer.complete(line, pos, ctx)
        }
    }
}

/// The word under the cursor and where it starts.
fn current_word(line: &str, pos: usize) -> (usize, &str) {
    let before = &line[..pos];
    let start = before.rfind(char::is_whitespace).map_or(0, |i| i + 1);
    (start, &line[start..pos])
}

/// True when the text before the current word holds no command word yet.
/// Redirection operators and their file names do not count.
fn is_command_position(before: &str) -> bool {
    let mut words = before.split_whitespace();
    while let Some(word) = words.next() {
        if matches!(word, "<" | ">" | ">>") {
            words.next();
        } else {
            return false;
        }
    }
    // A trailing operator means a file name comes next.
    !matches!(before.split_whitespace().last(), Some("<" | ">" | ">>"))
}

fn command_candidates(prefix: &str) -> Vec<Pair> {
    let mut names: Vec<String> = BUILTINS
        .iter()
        .filter(|b| b.starts_with(prefix))
        .map(|b| b.to_string())
        .collect();

    for dir in path_dirs() {
        if let Ok(entries) = std::fs::read_dir(dir) {
            names.extend(
                entries
                    .flatten()
                    .filter_map(|e| e.file_name().into_string().ok())
                    .filter(|name| name.starts_with(prefix)),
            );
        }
    }

    names.sort();
    names.dedup();
    names
        .into_iter()
        .map(|name| Pair {
            replacement: format!("{name} "),
            display: name,
        })
        .collect()
}

impl Helper for ShellCompleter {}
impl Hinter for ShellCompleter {
    type Hint = String;
}
impl Highlighter for ShellCompleter {}
impl Validator for ShellCompleter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_word() {
        assert_eq!(current_word("sle", 3), (0, "sle"));
        assert_eq!(current_word("cat /tm", 7), (4, "/tm"));
        assert_eq!(current_word("cat ", 4), (4, ""));
    }

    #[test]
    fn test_command_position() {
        assert!(is_command_position(""));
        assert!(is_command_position("< in.txt "));
        assert!(!is_command_position("cat "));
        assert!(!is_command_position("cat > "));
        assert!(!is_command_position("< "));
    }

    #[test]
    fn test_builtins_complete() {
        let names: Vec<String> = command_candidates("jo").into_iter().map(|p| p.display).collect();
        assert!(names.contains(&"jobs".to_string()));
        assert!(names.iter().all(|n| n.starts_with("jo")));
    }
}
