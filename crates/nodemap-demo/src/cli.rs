#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Arguments are parsed by hand. `NODEMAP_DEMO_*` environment variables
//! supply defaults that explicit flags override.

use std::env;
use std::path::PathBuf;
use std::process;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
nodemap demo: a scripted session on the 2D canvas

USAGE:
    nodemap-demo [OPTIONS]

OPTIONS:
    --state=PATH     Persist the graph to a JSON file (default: in memory)
    --width=N        Viewport width in points (default: 800)
    --height=N       Viewport height in points (default: 600)
    --scale=N        Points per meter (default: 150)
    --final-only     Print only the last frame
    --help, -h       Show this help message
    --version, -V    Show version

ENVIRONMENT VARIABLES:
    NODEMAP_DEMO_STATE    Override --state
    NODEMAP_LOG           Log filter directives (default: info)
    NODEMAP_LOG_FORMAT    Set to 'json' for JSON log lines";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// JSON state file; `None` keeps the graph in memory.
    pub state: Option<PathBuf>,
    pub width: f32,
    pub height: f32,
    /// View points per world meter.
    pub points_per_meter: f32,
    pub final_only: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            state: None,
            width: 800.0,
            height: 600.0,
            points_per_meter: 150.0,
            final_only: false,
        }
    }
}

impl Opts {
    /// Parse the process arguments and environment. Exits on bad input.
    pub fn parse() -> Self {
        let mut opts = Self::default();
        if let Ok(val) = env::var("NODEMAP_DEMO_STATE")
            && !val.trim().is_empty()
        {
            opts.state = Some(PathBuf::from(val));
        }

        let args: Vec<String> = env::args().skip(1).collect();
        match opts.apply_args(&args) {
            Ok(Flow::Run) => opts,
            Ok(Flow::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Flow::Version) => {
                println!("nodemap-demo {VERSION}");
                process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn apply_args(&mut self, args: &[String]) -> Result<Flow, String> {
        for arg in args {
            match arg.as_str() {
                "--help" | "-h" => return Ok(Flow::Help),
                "--version" | "-V" => return Ok(Flow::Version),
                "--final-only" => self.final_only = true,
                other => {
                    if let Some(val) = other.strip_prefix("--state=") {
                        self.state = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--width=") {
                        self.width = positive(val, "--width")?;
                    } else if let Some(val) = other.strip_prefix("--height=") {
                        self.height = positive(val, "--height")?;
                    } else if let Some(val) = other.strip_prefix("--scale=") {
                        self.points_per_meter = positive(val, "--scale")?;
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }
        Ok(Flow::Run)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Run,
    Help,
    Version,
}

fn positive(val: &str, flag: &str) -> Result<f32, String> {
    match val.parse::<f32>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        _ => Err(format!("Invalid {flag} value: {val}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn default_opts() {
        let opts = Opts::default();
        assert_eq!(opts.state, None);
        assert_eq!(opts.points_per_meter, 150.0);
        assert!(!opts.final_only);
    }

    #[test]
    fn flags_override_defaults() {
        let mut opts = Opts::default();
        let flow = opts.apply_args(&args(&["--state=/tmp/g.json", "--scale=200", "--final-only"]));
        assert_eq!(flow, Ok(Flow::Run));
        assert_eq!(opts.state, Some(PathBuf::from("/tmp/g.json")));
        assert_eq!(opts.points_per_meter, 200.0);
        assert!(opts.final_only);
    }

    #[test]
    fn rejects_bad_numbers_and_unknown_flags() {
        let mut opts = Opts::default();
        assert!(opts.apply_args(&args(&["--width=-3"])).is_err());
        assert!(opts.apply_args(&args(&["--height=abc"])).is_err());
        assert!(opts.apply_args(&args(&["--bogus"])).is_err());
        assert_eq!(opts.apply_args(&args(&["-h"])), Ok(Flow::Help));
    }

    #[test]
    fn help_mentions_env_vars() {
        assert!(HELP_TEXT.contains("NODEMAP_DEMO_STATE"));
        assert!(HELP_TEXT.contains("NODEMAP_LOG"));
    }
}
