use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::classifier::ThresholdPolicy;
use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "posturewatch")]
#[command(about = "Posture sensor relay, CSV logger and live monitor", long_about = None)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, global = true, env = "POSTUREWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the backend: device proxy, baseline store and CSV logs
    Serve {
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Sensor board base URL
        #[arg(long)]
        device_url: Option<String>,

        /// Seconds per aggregation window
        #[arg(long)]
        flush_secs: Option<u64>,
    },

    /// Watch the sensor live and forward readings to the backend
    Monitor {
        /// Sensor board base URL (polling mode)
        #[arg(long)]
        device_url: Option<String>,

        /// Backend base URL readings are forwarded to
        #[arg(long)]
        backend_url: Option<String>,

        /// Do not forward readings anywhere
        #[arg(long, default_value_t = false)]
        no_forward: bool,

        /// Polling period in milliseconds
        #[arg(long)]
        poll_ms: Option<u64>,

        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Use BLE notifications instead of HTTP polling
        #[arg(long, default_value_t = false)]
        ble: bool,
    },

    /// Print the effective settings as JSON, or write them to a file
    Config {
        /// Write the settings here instead of printing them
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Configure the on-device threshold
    SetThreshold {
        value: i64,

        #[arg(long)]
        device_url: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Compare against the captured baseline
    Delta,
    /// Compare raw readings against fixed limits
    Absolute,
}

impl From<PolicyArg> for ThresholdPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Delta => ThresholdPolicy::BaselineDelta,
            PolicyArg::Absolute => ThresholdPolicy::Absolute,
        }
    }
}

impl Command {
    /// Fold command-line flags over loaded settings. Flags win.
    pub fn apply(&self, settings: &mut Settings) {
        match self {
            Command::Serve {
                bind,
                device_url,
                flush_secs,
            } => {
                if let Some(bind) = bind {
                    settings.server.bind_addr = *bind;
                }
                if let Some(url) = device_url {
                    settings.server.device_url = url.clone();
                }
                if let Some(secs) = flush_secs {
                    settings.server.flush_interval_secs = *secs;
                }
            }
            Command::Monitor {
                device_url,
                backend_url,
                no_forward,
                poll_ms,
                policy,
                ..
            } => {
                if let Some(url) = device_url {
                    settings.monitor.device_url = url.clone();
                }
                if let Some(url) = backend_url {
                    settings.monitor.backend_url = Some(url.clone());
                }
                if *no_forward {
                    settings.monitor.backend_url = None;
                }
                if let Some(ms) = poll_ms {
                    settings.monitor.poll_interval_ms = *ms;
                }
                if let Some(policy) = policy {
                    settings.monitor.policy = (*policy).into();
                }
            }
            Command::Config { .. } => {}
            Command::SetThreshold { device_url, .. } => {
                if let Some(url) = device_url {
                    settings.monitor.device_url = url.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_override_settings() {
        let cli = Cli::parse_from([
            "posturewatch",
            "serve",
            "--bind",
            "127.0.0.1:8080",
            "--flush-secs",
            "10",
        ]);
        let mut settings = Settings::default();
        cli.command.apply(&mut settings);

        assert_eq!(settings.server.bind_addr.port(), 8080);
        assert_eq!(settings.server.flush_interval_secs, 10);
        assert_eq!(settings.server.device_url, Settings::default().server.device_url);
    }

    #[test]
    fn monitor_no_forward_wins_over_backend_url() {
        let cli = Cli::parse_from([
            "posturewatch",
            "monitor",
            "--backend-url",
            "http://localhost:3000",
            "--no-forward",
            "--policy",
            "absolute",
        ]);
        let mut settings = Settings::default();
        cli.command.apply(&mut settings);

        assert_eq!(settings.monitor.backend_url, None);
        assert_eq!(settings.monitor.policy, ThresholdPolicy::Absolute);
    }

    #[test]
    fn set_threshold_takes_positional_value() {
        let cli = Cli::parse_from(["posturewatch", "set-threshold", "25"]);
        assert!(matches!(cli.command, Command::SetThreshold { value: 25, .. }));
    }

    #[test]
    fn config_output_is_optional() {
        let cli = Cli::parse_from(["posturewatch", "config"]);
        assert!(matches!(cli.command, Command::Config { output: None }));

        let cli = Cli::parse_from(["posturewatch", "config", "--output", "pw.json"]);
        assert!(matches!(
            cli.command,
            Command::Config { output: Some(ref path) } if path == &PathBuf::from("pw.json")
        ));
    }
}
