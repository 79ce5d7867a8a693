//! Command line definition.

use cardlink_core::constants::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RESPONSE_TIMEOUT_MS};
use cardlink_network::ReaderConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "cardlink")]
#[command(version, about = "Smart card reader service client")]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read one card and print the decoded profile
    Read {
        #[command(flatten)]
        service: ServiceArgs,

        /// Time to wait for card data, in milliseconds
        #[arg(long, default_value_t = DEFAULT_RESPONSE_TIMEOUT_MS)]
        timeout_ms: u64,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print raw messages from the passive feed
    Listen {
        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Decode a saved card message
    Decode {
        /// Message file, or `-` for stdin
        input: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Run a local reader service emulator
    Emulate {
        #[arg(long, default_value = "127.0.0.1:8081")]
        bind: SocketAddr,

        /// Message file pushed to every client, a sample card by default
        #[arg(long)]
        message: Option<PathBuf>,

        /// Pause before pushing the message, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Keep connections open after the message
        #[arg(long, default_value_t = false)]
        hold_open: bool,
    },
}

/// Location of the reader service.
#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    #[arg(long, env = "CARDLINK_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "CARDLINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ServiceArgs {
    pub fn reader_config(&self) -> cardlink_core::Result<ReaderConfig> {
        let endpoint = cardlink_core::Endpoint::read_card(&self.host, self.port)?;
        Ok(ReaderConfig::new(endpoint))
    }

    pub fn reader_config_with_timeout(
        &self,
        timeout_ms: u64,
    ) -> cardlink_core::Result<ReaderConfig> {
        Ok(self
            .reader_config()?
            .with_response_timeout(Duration::from_millis(timeout_ms)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_read_defaults() {
        let cli = Cli::try_parse_from(["cardlink", "read"]).unwrap();
        let Command::Read {
            service,
            timeout_ms,
            format,
        } = cli.command
        else {
            panic!("expected read command");
        };

        assert_eq!(timeout_ms, 15_000);
        assert_eq!(format, OutputFormat::Text);
        let env_unset = ["CARDLINK_HOST", "CARDLINK_PORT"]
            .iter()
            .all(|name| std::env::var_os(name).is_none());
        if env_unset {
            let config = service.reader_config().unwrap();
            assert_eq!(config.endpoint.url(), "ws://127.0.0.1:8081/read-card");
        }
    }

    #[test]
    fn test_read_with_service_and_timeout() {
        let cli = Cli::try_parse_from([
            "cardlink",
            "read",
            "--host",
            "192.168.56.1",
            "--port",
            "9000",
            "--timeout-ms",
            "500",
            "--format",
            "json",
        ])
        .unwrap();

        let Command::Read {
            service,
            timeout_ms,
            format,
        } = cli.command
        else {
            panic!("expected read command");
        };

        let config = service.reader_config_with_timeout(timeout_ms).unwrap();
        assert_eq!(config.endpoint.url(), "ws://192.168.56.1:9000/read-card");
        assert_eq!(config.response_timeout, Duration::from_millis(500));
        assert_eq!(config.passive_endpoint().url(), "ws://192.168.56.1:9000/ws");
        assert_eq!(format, OutputFormat::Json);
    }

    #[rstest]
    #[case(&["cardlink", "decode", "card.json"], false)]
    #[case(&["cardlink", "--log-json", "listen"], true)]
    #[case(&["cardlink", "emulate", "--log-json", "--delay-ms", "250"], true)]
    fn test_global_log_json(#[case] args: &[&str], #[case] log_json: bool) {
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.log_json, log_json);
    }

    #[test]
    fn test_emulate_options() {
        let cli = Cli::try_parse_from([
            "cardlink",
            "emulate",
            "--bind",
            "0.0.0.0:9001",
            "--message",
            "card.json",
            "--hold-open",
        ])
        .unwrap();

        let Command::Emulate {
            bind,
            message,
            delay_ms,
            hold_open,
        } = cli.command
        else {
            panic!("expected emulate command");
        };
        assert_eq!(bind.port(), 9001);
        assert_eq!(message, Some(PathBuf::from("card.json")));
        assert_eq!(delay_ms, 0);
        assert!(hold_open);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["cardlink", "read", "--port", "70000"]).is_err());
    }

    #[test]
    fn test_empty_host_rejected() {
        let service = ServiceArgs {
            host: String::new(),
            port: 8081,
        };
        assert!(service.reader_config().is_err());
    }
}
