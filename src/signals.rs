use nix::sys::signal::{self, SigHandler, SigSet, SigmaskHow, Signal};

/// Keyboard signals the interactive shell must survive. Children get the
/// default disposition back before exec.
const JOB_CONTROL_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTSTP, Signal::SIGTTOU];

pub fn ignore_job_control() -> nix::Result<()> {
    set_dispositions(SigHandler::SigIgn)
}

pub fn restore_defaults() -> nix::Result<()> {
    set_dispositions(SigHandler::SigDfl)
}

/// Installs `handler` for every job control signal with all signals
/// blocked, then restores the previous mask.
fn set_dispositions(handler: SigHandler) -> nix::Result<()> {
    let mut old = SigSet::empty();
    signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::all()), Some(&mut old))?;

    // SAFETY: SigIgn and SigDfl carry no handler function.
    let installed = JOB_CONTROL_SIGNALS
        .iter()
        .try_for_each(|&sig| unsafe { signal::signal(sig, handler) }.map(|_| ()));

    signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&old), None)?;
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads the current disposition of `sig` by swapping it out and back.
    fn disposition(sig: Signal) -> SigHandler {
        // SAFETY: only SigIgn and SigDfl are ever installed here.
        unsafe {
            let current = signal::signal(sig, SigHandler::SigIgn).unwrap();
            signal::signal(sig, current).unwrap();
            current
        }
    }

    #[test]
    fn test_ignore_then_restore() {
        ignore_job_control().unwrap();
        for sig in JOB_CONTROL_SIGNALS {
            assert_eq!(disposition(sig), SigHandler::SigIgn, "{sig}");
        }

        restore_defaults().unwrap();
        for sig in JOB_CONTROL_SIGNALS {
            assert_eq!(disposition(sig), SigHandler::SigDfl, "{sig}");
        }
    }
}
