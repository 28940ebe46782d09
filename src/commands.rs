use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;

use nix::sys::signal::{self, Signal};

use crate::error::ShellError;
use crate::job::{JobId, JobStatus};
use crate::scheduler;
use crate::session::{Flow, Session};

/// List of builtin commands
pub const BUILTINS: &[&str] = &["cd", "rm", "ln", "jobs", "fg", "bg", "exit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Rm,
    Ln,
    Jobs,
    Fg,
    Bg,
    Exit,
}

impl Builtin {
    /// Only a bare word names a builtin; `/bin/rm` always runs the program.
    pub fn lookup(word: &str) -> Option<Self> {
        Some(match word {
            "cd" => Builtin::Cd,
            "rm" => Builtin::Rm,
            "ln" => Builtin::Ln,
            "jobs" => Builtin::Jobs,
            "fg" => Builtin::Fg,
            "bg" => Builtin::Bg,
            "exit" => Builtin::Exit,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Rm => "rm",
            Builtin::Ln => "ln",
            Builtin::Jobs => "jobs",
            Builtin::Fg => "fg",
            Builtin::Bg => "bg",
            Builtin::Exit => "exit",
        }
    }
}

/// Runs a builtin against the session. `args[0]` is the builtin's name.
pub fn execute_builtin(
    session: &mut Session,
    builtin: Builtin,
    args: &[String],
) -> Result<Flow, ShellError> {
    let name = builtin.name();
    match builtin {
        Builtin::Cd => {
            let [_, dir, ..] = args else {
                return Err(ShellError::Syntax(name));
            };
            env::set_current_dir(dir).map_err(ShellError::io(name))?;
        }
        Builtin::Rm => {
            let [_, file, ..] = args else {
                return Err(ShellError::Syntax(name));
            };
            fs::remove_file(file).map_err(ShellError::io(name))?;
        }
        Builtin::Ln => {
            let [_, src, dst, ..] = args else {
                return Err(ShellError::Syntax(name));
            };
            fs::hard_link(src, dst).map_err(ShellError::io(name))?;
        }
        Builtin::Jobs => {
            if args.len() != 1 {
                return Err(ShellError::Syntax(name));
            }
            print!("{}", session.jobs().listing());
        }
        Builtin::Fg => foreground(session, parse_job_id(name, args)?)?,
        Builtin::Bg => background(session, parse_job_id(name, args)?)?,
        Builtin::Exit => return Ok(Flow::Exit),
    }
    Ok(Flow::Continue)
}

/// Accepts exactly one argument of the form `N` or `%N`.
fn parse_job_id(name: &'static str, args: &[String]) -> Result<JobId, ShellError> {
    let [_, arg] = args else {
        return Err(ShellError::Syntax(name));
    };
    let digits = arg.strip_prefix('%').unwrap_or(arg);
    digits.parse().map_err(|_| ShellError::Syntax(name))
}

/// Hands the terminal to a job, continues its group and waits on it as if
/// it had just been launched in the foreground.
fn foreground(session: &mut Session, id: JobId) -> Result<(), ShellError> {
    let job = session.jobs().get(id).ok_or(ShellError::JobNotFound(id))?;
    let (pid, label) = (job.pid, job.label.clone());

    session.give_terminal_to(pid)?;
    if let Err(e) = signal::killpg(pid, Signal::SIGCONT) {
        session.reclaim_terminal();
        return Err(ShellError::os("kill")(e));
    }
    session.jobs_mut().update_status(id, JobStatus::Running);
    tracing::debug!(id, %pid, "job continued in foreground");

    scheduler::run_foreground(session, pid, &label, Some(id));
    Ok(())
}

/// Continues a job's group and returns to the prompt at once.
fn background(session: &mut Session, id: JobId) -> Result<(), ShellError> {
    let pid = session
        .jobs()
        .find_pid_by_id(id)
        .ok_or(ShellError::JobNotFound(id))?;
    signal::killpg(pid, Signal::SIGCONT).map_err(ShellError::os("kill"))?;
    session.jobs_mut().update_status(id, JobStatus::Running);
    tracing::debug!(id, %pid, "job continued in background");
    Ok(())
}

/// Turns the program word into something `execv` can run: paths are used
/// as given, bare names are searched for on `PATH`.
pub fn resolve_program(word: &str) -> Result<String, ShellError> {
    if word.contains('/') {
        return Ok(word.to_string());
    }
    full_path(word).ok_or_else(|| ShellError::CommandNotFound(word.to_string()))
}

/// Finds the full path of a command by searching PATH.
pub fn full_path(command: &str) -> Option<String> {
    path_dirs().into_iter().find_map(|dir| {
        let full = format!("{}/{}", dir, command);
        is_executable(&full).then_some(full)
    })
}

/// The directories listed in `PATH`, in search order.
pub fn path_dirs() -> Vec<String> {
    env::var("PATH")
        .unwrap_or_default()
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_executable(path: &str) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::Pid;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_lookup_requires_bare_word() {
        assert_eq!(Builtin::lookup("fg"), Some(Builtin::Fg));
        assert_eq!(Builtin::lookup("/bin/rm"), None);
        assert_eq!(Builtin::lookup("ls"), None);
        for name in BUILTINS {
            assert_eq!(Builtin::lookup(name).map(Builtin::name), Some(*name));
        }
    }

    #[test]
    fn test_job_id_syntax() {
        assert_eq!(parse_job_id("fg", &args("fg 3")).unwrap(), 3);
        assert_eq!(parse_job_id("fg", &args("fg %12")).unwrap(), 12);
        assert!(matches!(parse_job_id("fg", &args("fg")), Err(ShellError::Syntax("fg"))));
        assert!(matches!(parse_job_id("bg", &args("bg x")), Err(ShellError::Syntax("bg"))));
        assert!(matches!(parse_job_id("bg", &args("bg 1 2")), Err(ShellError::Syntax("bg"))));
        assert!(matches!(parse_job_id("bg", &args("bg -1")), Err(ShellError::Syntax("bg"))));
    }

    #[test]
    fn test_unknown_job_is_reported() {
        let mut session = Session::detached(4);
        session.register(Pid::from_raw(40), JobStatus::Stopped, "vim").unwrap();
        assert!(matches!(
            execute_builtin(&mut session, Builtin::Fg, &args("fg 7")),
            Err(ShellError::JobNotFound(7))
        ));
        assert!(matches!(
            execute_builtin(&mut session, Builtin::Bg, &args("bg %2")),
            Err(ShellError::JobNotFound(2))
        ));
        assert_eq!(session.jobs().len(), 1);
    }

    #[test]
    fn test_jobs_takes_no_arguments() {
        let mut session = Session::detached(4);
        assert!(matches!(
            execute_builtin(&mut session, Builtin::Jobs, &args("jobs -l")),
            Err(ShellError::Syntax("jobs"))
        ));
        assert_eq!(
            execute_builtin(&mut session, Builtin::Jobs, &args("jobs")).unwrap(),
            Flow::Continue
        );
    }

    #[test]
    fn test_exit_ends_loop() {
        let mut session = Session::detached(4);
        assert_eq!(
            execute_builtin(&mut session, Builtin::Exit, &args("exit")).unwrap(),
            Flow::Exit
        );
    }

    #[test]
    fn test_file_builtins_need_operands() {
        let mut session = Session::detached(4);
        for line in ["cd", "rm", "ln only-one"] {
            let words = args(line);
            let builtin = Builtin::lookup(&words[0]).unwrap();
            assert!(matches!(
                execute_builtin(&mut session, builtin, &words),
                Err(ShellError::Syntax(_))
            ));
        }
    }

    #[test]
    fn test_ln_and_rm_ignore_extra_operands() {
        let dir = env::temp_dir().join(format!("jobsh-ln-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let src = dir.join("src.txt");
        let dst = dir.join("dst.txt");
        fs::write(&src, "data").unwrap();

        let mut session = Session::detached(4);
        let ln = vec![
            "ln".to_string(),
            src.display().to_string(),
            dst.display().to_string(),
            "ignored".to_string(),
        ];
        execute_builtin(&mut session, Builtin::Ln, &ln).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "data");

        let rm = vec!["rm".to_string(), dst.display().to_string(), "ignored".to_string()];
        execute_builtin(&mut session, Builtin::Rm, &rm).unwrap();
        assert!(!dst.exists());
        assert!(matches!(
            execute_builtin(&mut session, Builtin::Rm, &rm),
            Err(ShellError::Io { .. })
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_resolve_program() {
        assert_eq!(resolve_program("./local.sh").unwrap(), "./local.sh");
        assert!(resolve_program("sh").unwrap().ends_with("/sh"));
        assert!(matches!(
            resolve_program("no-such-program-jobsh"),
            Err(ShellError::CommandNotFound(_))
        ));
    }
}
