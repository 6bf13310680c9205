//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use live_ipc::Orientation;

pub const USAGE: &str = "\
Usage: live [options]

Options:
  --key <KEY|URL>        Stream key, or a full rtmp:// URL
  --provision            Create a new stream key through the API
  --settings <PATH>      JSON settings file
  --orientation <NAME>   portrait, portrait-upside-down, landscape-left, landscape-right
  --duration <SECS>      Stop after this many seconds
  --paused               Start with capture paused
  --json                 Print state changes as JSON lines
  -h, --help             Show this help

Credentials for --provision are read from MUX_TOKEN_ID and MUX_TOKEN_SECRET.
Log filtering follows RUST_LOG.";

#[derive(Debug, Error, PartialEq)]
pub enum ArgsError {
    #[error("Missing value for {0}")]
    MissingValue(&'static str),

    #[error("Invalid value for {flag}: {value}")]
    InvalidValue { flag: &'static str, value: String },

    #[error("Unknown argument: {0}")]
    Unknown(String),

    #[error("Use either --key or --provision")]
    ConflictingSource,

    #[error("A stream key is required: pass --key or --provision")]
    NoSource,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub stream_key: Option<String>,
    pub provision: bool,
    pub settings: Option<PathBuf>,
    pub orientation: Option<Orientation>,
    pub duration: Option<Duration>,
    pub paused: bool,
    pub json: bool,
}

impl Args {
    /// Parse arguments, excluding the program name. `Ok(None)` means help
    /// was requested.
    pub fn parse(argv: &[String]) -> Result<Option<Self>, ArgsError> {
        let mut args = Args {
            stream_key: None,
            provision: false,
            settings: None,
            orientation: None,
            duration: None,
            paused: false,
            json: false,
        };

        let mut iter = argv.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(None),
                "--key" => {
                    let value = iter.next().ok_or(ArgsError::MissingValue("--key"))?;
                    args.stream_key = Some(value.clone());
                }
                "--provision" => args.provision = true,
                "--settings" => {
                    let value = iter.next().ok_or(ArgsError::MissingValue("--settings"))?;
                    args.settings = Some(PathBuf::from(value));
                }
                "--orientation" => {
                    let value = iter
                        .next()
                        .ok_or(ArgsError::MissingValue("--orientation"))?;
                    args.orientation = Some(parse_orientation(value)?);
                }
                "--duration" => {
                    let value = iter.next().ok_or(ArgsError::MissingValue("--duration"))?;
                    let secs: u64 = value.parse().map_err(|_| ArgsError::InvalidValue {
                        flag: "--duration",
                        value: value.clone(),
                    })?;
                    args.duration = Some(Duration::from_secs(secs));
                }
                "--paused" => args.paused = true,
                "--json" => args.json = true,
                other => return Err(ArgsError::Unknown(other.to_string())),
            }
        }

        match (&args.stream_key, args.provision) {
            (Some(_), true) => Err(ArgsError::ConflictingSource),
            (None, false) => Err(ArgsError::NoSource),
            _ => Ok(Some(args)),
        }
    }
}

fn parse_orientation(value: &str) -> Result<Orientation, ArgsError> {
    match value {
        "portrait" => Ok(Orientation::Portrait),
        "portrait-upside-down" => Ok(Orientation::PortraitUpsideDown),
        "landscape-left" => Ok(Orientation::LandscapeLeft),
        "landscape-right" => Ok(Orientation::LandscapeRight),
        _ => Err(ArgsError::InvalidValue {
            flag: "--orientation",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_key_and_options() {
        let args = Args::parse(&argv(&[
            "--key",
            "abc123",
            "--orientation",
            "landscape-left",
            "--duration",
            "30",
            "--paused",
            "--json",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(args.stream_key.as_deref(), Some("abc123"));
        assert_eq!(args.orientation, Some(Orientation::LandscapeLeft));
        assert_eq!(args.duration, Some(Duration::from_secs(30)));
        assert!(args.paused);
        assert!(args.json);
        assert!(!args.provision);
    }

    #[test]
    fn test_help() {
        assert_eq!(Args::parse(&argv(&["--help"])), Ok(None));
    }

    #[test]
    fn test_source_required() {
        assert_eq!(Args::parse(&argv(&[])), Err(ArgsError::NoSource));
        assert_eq!(
            Args::parse(&argv(&["--key", "k", "--provision"])),
            Err(ArgsError::ConflictingSource)
        );
    }

    #[test]
    fn test_bad_values() {
        assert_eq!(
            Args::parse(&argv(&["--key"])),
            Err(ArgsError::MissingValue("--key"))
        );
        assert!(matches!(
            Args::parse(&argv(&["--provision", "--duration", "soon"])),
            Err(ArgsError::InvalidValue { flag: "--duration", .. })
        ));
        assert!(matches!(
            Args::parse(&argv(&["--provision", "--orientation", "sideways"])),
            Err(ArgsError::InvalidValue { .. })
        ));
        assert_eq!(
            Args::parse(&argv(&["--provision", "--verbose"])),
            Err(ArgsError::Unknown("--verbose".into()))
        );
    }
}
