use anyhow::{Context, Result, bail};

pub const DEFAULT_PROMPT: &str = "jobsh> ";
pub const DEFAULT_MAX_JOBS: usize = 64;

pub const USAGE: &str = "\
Usage: jobsh [options]
  -p, --no-prompt      do not print a prompt
      --prompt <text>  prompt text (default \"jobsh> \")
      --max-jobs <n>   job table capacity (default 64)
  -h, --help           print this message

Set RUST_LOG=jobsh=debug to trace job control on standard error.";

/// Session settings taken from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: Option<String>,
    pub max_jobs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: Some(DEFAULT_PROMPT.to_string()),
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Invocation {
    Run(Config),
    Help,
}

impl Config {
    /// Parses the arguments after the program name.
    pub fn from_args<I>(args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Invocation::Help),
                "-p" | "--no-prompt" => config.prompt = None,
                "--prompt" => {
                    config.prompt = Some(args.next().context("--prompt requires a value")?);
                }
                "--max-jobs" => {
                    let value = args.next().context("--max-jobs requires a value")?;
                    config.max_jobs = value
                        .parse()
                        .with_context(|| format!("invalid --max-jobs value: {value}"))?;
                    if config.max_jobs == 0 {
                        bail!("--max-jobs must be at least 1");
                    }
                }
                other => bail!("unknown option: {other}"),
            }
        }
        Ok(Invocation::Run(config))
    }
}
