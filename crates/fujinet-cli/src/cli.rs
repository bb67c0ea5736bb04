use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use fujinet_core::ChannelMode;

#[derive(Debug, Parser)]
#[command(
    name = "fujinet",
    version,
    about = "Drive the FujiNet network device from the command line, or serve it on the host bus"
)]
pub struct Cli {
    /// TOML configuration file, layered over defaults and under FUJINET_* variables
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a resource and write the body to stdout
    Get {
        /// Device specifier, e.g. N1:http://host/path
        specifier: String,

        /// Largest body accepted, in bytes
        #[arg(long, default_value_t = 4096)]
        capacity: u16,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Send a text body
    Post {
        specifier: String,

        data: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Send a binary body read from a file, or from stdin when the path is `-`
    PostBin {
        specifier: String,

        file: PathBuf,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Delete a resource
    Delete {
        specifier: String,

        /// Transaction flag passed through to the device
        #[arg(long, default_value_t = 0)]
        flag: u8,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Open a unit and print its status as JSON
    Status { specifier: String },

    /// Answer SIO command frames from the host until interrupted
    Serve {
        /// TCP address to listen on for the host
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,

        /// Serial device to use instead of TCP
        #[arg(long, value_name = "PATH")]
        serial: Option<String>,

        #[arg(long)]
        baud: Option<u32>,
    },
}

/// Options shared by the transfer commands.
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Channel mode for the transfer
    #[arg(short, long, value_enum, default_value_t = Mode::Text)]
    pub mode: Mode,

    /// Extra request header as `Name: value`; repeatable
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Text,
    Binary,
    Json,
}

impl From<Mode> for ChannelMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Text => ChannelMode::Text,
            Mode::Binary => ChannelMode::Binary,
            Mode::Json => ChannelMode::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_get_defaults() {
        let cli = parse(&["fujinet", "get", "N1:http://x/"]);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
        match cli.command {
            Command::Get {
                specifier,
                capacity,
                request,
            } => {
                assert_eq!(specifier, "N1:http://x/");
                assert_eq!(capacity, 4096);
                assert_eq!(request.mode, Mode::Text);
                assert!(request.headers.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_post_with_headers_and_mode() {
        let cli = parse(&[
            "fujinet",
            "-vv",
            "post",
            "N2:http://x/api",
            "{}",
            "--mode",
            "json",
            "-H",
            "Authorization: Bearer t",
            "-H",
            "X-Trace: 1",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Post { data, request, .. } = cli.command else {
            panic!("expected post");
        };
        assert_eq!(data, "{}");
        assert_eq!(ChannelMode::from(request.mode), ChannelMode::Json);
        assert_eq!(request.headers.len(), 2);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = parse(&["fujinet", "delete", "N1:http://x/", "--config", "hal.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("hal.toml")));
    }

    #[test]
    fn test_serve_overrides() {
        let cli = parse(&["fujinet", "serve", "--listen", "0.0.0.0:7000"]);
        let Command::Serve {
            listen,
            serial,
            baud,
        } = cli.command
        else {
            panic!("expected serve");
        };
        assert_eq!(listen.as_deref(), Some("0.0.0.0:7000"));
        assert!(serial.is_none());
        assert!(baud.is_none());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["fujinet"]).is_err());
        assert!(Cli::try_parse_from(["fujinet", "get", "N1:x", "--capacity", "70000"]).is_err());
        assert!(Cli::try_parse_from(["fujinet", "get", "N1:x", "--mode", "xml"]).is_err());
    }
}
