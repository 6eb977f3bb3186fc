//! Command-line argument parser for the `arbor` harness.
//!
//! Hand-rolled: the flag set is small and fixed. Options take their value
//! either as the next argument (`--seed 7`) or inline (`--seed=7`).

use std::ffi::OsString;

// =============================================================================
// Action
// =============================================================================

/// What the harness should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Build, simulate and check a kernel.
    Run,
    /// Print version and exit: `arbor -V` or `arbor --version`
    PrintVersion,
    /// Print help and exit: `arbor -h` or `arbor --help`
    PrintHelp,
}

// =============================================================================
// Parsed Arguments
// =============================================================================

/// Complete set of parsed CLI arguments.
///
/// Workload parameters are `None` when not given on the command line so the
/// configuration layer can fall back to the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArborArgs {
    /// What to do.
    pub action: Action,

    /// `--height <n>`: forest height.
    pub forest_height: Option<usize>,

    /// `--rounds <n>`: rounds of the walk.
    pub rounds: Option<usize>,

    /// `--batch <n>`: lanes in the batch.
    pub batch_size: Option<usize>,

    /// `--seed <n>`: workload generator seed.
    pub seed: Option<u64>,

    /// `--unit`: one operation per bundle.
    pub unit: bool,

    /// `--dump-program`: print the packed program.
    pub dump_program: bool,

    /// `--dump-scratch`: print the scratch map.
    pub dump_scratch: bool,

    /// `-E`: ignore `ARBOR_*` environment variables.
    pub ignore_environment: bool,

    /// `-q`: only report failures.
    pub quiet: bool,
}

impl Default for ArborArgs {
    fn default() -> Self {
        Self {
            action: Action::Run,
            forest_height: None,
            rounds: None,
            batch_size: None,
            seed: None,
            unit: false,
            dump_program: false,
            dump_scratch: false,
            ignore_environment: false,
            quiet: false,
        }
    }
}

// =============================================================================
// Parse Error
// =============================================================================

/// Error during argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    /// Missing value for an option that takes one.
    MissingValue(&'static str),
    /// Value that does not parse as a number.
    InvalidValue { flag: &'static str, value: String },
    /// Unknown flag.
    UnknownFlag(String),
    /// Positional argument; the harness takes none.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArgError::MissingValue(flag) => {
                write!(f, "Argument expected for the {} option", flag)
            }
            ArgError::InvalidValue { flag, value } => {
                write!(f, "Invalid value for {}: {:?}", flag, value)
            }
            ArgError::UnknownFlag(flag) => {
                write!(f, "Unknown option: {}", flag)
            }
            ArgError::UnexpectedArgument(arg) => {
                write!(f, "Unexpected argument: {}", arg)
            }
        }
    }
}

impl std::error::Error for ArgError {}

// =============================================================================
// Parser Entry Point
// =============================================================================

/// Parse command-line arguments into `ArborArgs`.
///
/// Options are parsed left to right; `-h` and `-V` stop parsing at once.
pub fn parse_args<I, S>(args: I) -> Result<ArborArgs, ArgError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let args: Vec<String> = args
        .into_iter()
        .map(|s| s.into().to_string_lossy().into_owned())
        .collect();

    parse_args_vec(&args)
}

/// Parse from a pre-collected `Vec<String>`.
///
/// The first element is the first argument, not the program name.
pub fn parse_args_vec(args: &[String]) -> Result<ArborArgs, ArgError> {
    let mut result = ArborArgs::default();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();
        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (arg, None),
        };

        match name {
            "-h" | "--help" => {
                result.action = Action::PrintHelp;
                return Ok(result);
            }
            "-V" | "--version" => {
                result.action = Action::PrintVersion;
                return Ok(result);
            }
            "-E" => result.ignore_environment = true,
            "-q" | "--quiet" => result.quiet = true,
            "--unit" => result.unit = true,
            "--dump-program" => result.dump_program = true,
            "--dump-scratch" => result.dump_scratch = true,
            "--height" => {
                let value = take_value(args, &mut i, inline, "--height")?;
                result.forest_height = Some(parse_number("--height", value)?);
            }
            "--rounds" => {
                let value = take_value(args, &mut i, inline, "--rounds")?;
                result.rounds = Some(parse_number("--rounds", value)?);
            }
            "--batch" => {
                let value = take_value(args, &mut i, inline, "--batch")?;
                result.batch_size = Some(parse_number("--batch", value)?);
            }
            "--seed" => {
                let value = take_value(args, &mut i, inline, "--seed")?;
                result.seed = Some(parse_number("--seed", value)?);
            }
            _ if arg.starts_with('-') => return Err(ArgError::UnknownFlag(arg.to_string())),
            _ => return Err(ArgError::UnexpectedArgument(arg.to_string())),
        }
        i += 1;
    }

    Ok(result)
}

/// Value of the option at `args[*i]`, advancing past it when separate.
fn take_value<'a>(
    args: &'a [String],
    i: &mut usize,
    inline: Option<&'a str>,
    flag: &'static str,
) -> Result<&'a str, ArgError> {
    if let Some(value) = inline {
        return Ok(value);
    }
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or(ArgError::MissingValue(flag))
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, value: &str) -> Result<T, ArgError> {
    value.parse().map_err(|_| ArgError::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

/// Help text printed by `-h`.
pub const HELP: &str = "\
usage: arbor [option] ...

Builds the tree-walk kernel, runs it on the simulated machine and checks it
against the reference at every pause.

Options:
  --height <n>      forest height (default 10)
  --rounds <n>      rounds of the walk (default 16)
  --batch <n>       lanes in the batch, a multiple of 8 (default 256)
  --seed <n>        workload seed (default 123)
  --unit            one operation per bundle
  --dump-program    print the packed program
  --dump-scratch    print the scratch map
  -q, --quiet       only report failures
  -E                ignore ARBOR_* environment variables
  -h, --help        print this help and exit
  -V, --version     print the version and exit

Environment:
  ARBOR_HEIGHT, ARBOR_ROUNDS, ARBOR_BATCH, ARBOR_SEED, ARBOR_UNIT
                    defaults for the options above
  ARBOR_LOG         log filter (default info)
";

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ArborArgs, ArgError> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_args_vec(&owned)
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_args_runs_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args, ArborArgs::default());
        assert_eq!(args.action, Action::Run);
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&["-h"]).unwrap().action, Action::PrintHelp);
        assert_eq!(parse(&["--help"]).unwrap().action, Action::PrintHelp);
    }

    #[test]
    fn test_version_stops_parsing() {
        let args = parse(&["-V", "--bogus"]).unwrap();
        assert_eq!(args.action, Action::PrintVersion);
    }

    // -------------------------------------------------------------------------
    // Options
    // -------------------------------------------------------------------------

    #[test]
    fn test_separate_values() {
        let args = parse(&["--height", "4", "--rounds", "6"]).unwrap();
        assert_eq!(args.forest_height, Some(4));
        assert_eq!(args.rounds, Some(6));
        let args = parse(&["--batch", "16", "--seed", "9"]).unwrap();
        assert_eq!(args.batch_size, Some(16));
        assert_eq!(args.seed, Some(9));
    }

    #[test]
    fn test_inline_values() {
        let args = parse(&["--height=3", "--seed=18446744073709551615"]).unwrap();
        assert_eq!(args.forest_height, Some(3));
        assert_eq!(args.seed, Some(u64::MAX));
    }

    #[test]
    fn test_switches() {
        let args = parse(&["--unit", "--dump-program", "--dump-scratch", "-E", "-q"]).unwrap();
        assert!(args.unit);
        assert!(args.dump_program);
        assert!(args.dump_scratch);
        assert!(args.ignore_environment);
        assert!(args.quiet);
    }

    #[test]
    fn test_last_value_wins() {
        let args = parse(&["--seed", "1", "--seed", "2"]).unwrap();
        assert_eq!(args.seed, Some(2));
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    #[test]
    fn test_missing_value() {
        assert_eq!(
            parse(&["--rounds"]),
            Err(ArgError::MissingValue("--rounds"))
        );
    }

    #[test]
    fn test_invalid_value() {
        assert_eq!(
            parse(&["--batch", "many"]),
            Err(ArgError::InvalidValue {
                flag: "--batch",
                value: "many".to_string()
            })
        );
        assert!(parse(&["--height", "-1"]).is_err());
    }

    #[test]
    fn test_unknown_flag() {
        assert_eq!(
            parse(&["--fast"]),
            Err(ArgError::UnknownFlag("--fast".to_string()))
        );
    }

    #[test]
    fn test_positional_rejected() {
        assert_eq!(
            parse(&["kernel.bin"]),
            Err(ArgError::UnexpectedArgument("kernel.bin".to_string()))
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ArgError::MissingValue("--seed").to_string(),
            "Argument expected for the --seed option"
        );
        assert_eq!(
            ArgError::UnknownFlag("-x".to_string()).to_string(),
            "Unknown option: -x"
        );
    }
}
