use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::classifier::Classifier;
use crate::device::DeviceClient;
use crate::presentation::render_dashboard;
use crate::relay::{BackendForwarder, MonitorSession, RelayController, RelayEvent, RelayTargets};
use crate::settings::Settings;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "monitor";

use crate::{log_info, log_warn};

/// One line typed into the terminal while monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    CaptureBaseline,
    ClearBaseline,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "b" | "baseline" => Some(Self::CaptureBaseline),
            "c" | "clear" => Some(Self::ClearBaseline),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Apply a console command to the session; returns the line to show the user.
pub async fn execute(session: &MonitorSession, command: ConsoleCommand) -> String {
    match command {
        ConsoleCommand::CaptureBaseline => match session.capture_baseline().await {
            Ok(baseline) => format!(
                "Baseline captured: flex {:.1}°, Y {:.2}°, Z {:.2}°",
                baseline.flex_angle, baseline.angle_y, baseline.angle_z
            ),
            Err(err) => err.to_string(),
        },
        ConsoleCommand::ClearBaseline => {
            session.clear_baseline().await;
            "Baseline cleared.".to_string()
        }
        ConsoleCommand::Quit => "Stopping...".to_string(),
    }
}

/// Run the live monitor until `q`, end of input plus Ctrl-C, or Ctrl-C.
pub async fn run(settings: &Settings, use_ble: bool) -> Result<()> {
    let session = MonitorSession::new(Classifier::new(settings.monitor.policy));
    let forwarder = settings
        .monitor
        .backend_url
        .as_deref()
        .map(BackendForwarder::new);
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let targets = RelayTargets {
        session: session.clone(),
        forwarder,
        events: events_tx,
    };

    let mut relay = RelayController::new();

    #[cfg(feature = "ble")]
    let link = if use_ble {
        let link = crate::ble::BleLink::connect(&settings.ble).await?;
        relay.start_notifications(link.subscribe().await?, targets)?;
        Some(link)
    } else {
        start_polling(&mut relay, settings, targets)?;
        None
    };

    #[cfg(not(feature = "ble"))]
    {
        if use_ble {
            anyhow::bail!("built without BLE support; rebuild with `--features ble`");
        }
        start_polling(&mut relay, settings, targets)?;
    }

    println!("Loading data...");
    println!("Commands: b = capture baseline, c = clear baseline, q = quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                RelayEvent::Sample { .. } => {
                    println!("\n{}", render_dashboard(&session.snapshot().await));
                }
                RelayEvent::Alert(message) => println!("\n⚠ {message}"),
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match ConsoleCommand::parse(&line) {
                    Some(ConsoleCommand::Quit) => {
                        println!("{}", execute(&session, ConsoleCommand::Quit).await);
                        break;
                    }
                    Some(command) => println!("{}", execute(&session, command).await),
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command {:?} (b, c or q)", line.trim()),
                },
                Ok(None) => {
                    log_info!("stdin closed; Ctrl-C to stop");
                    stdin_open = false;
                }
                Err(err) => {
                    log_warn!("failed to read stdin: {err}");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    relay.stop().await?;

    #[cfg(feature = "ble")]
    {
        if let Some(link) = link {
            link.disconnect().await?;
        }
    }

    log_info!("session {} ended", session.id());
    Ok(())
}

fn start_polling(
    relay: &mut RelayController,
    settings: &Settings,
    targets: RelayTargets,
) -> Result<()> {
    let device = DeviceClient::new(&settings.monitor.device_url);
    relay.start_polling(
        device,
        targets,
        settings.monitor.poll_interval(),
        settings.monitor.read_timeout(),
    )
}

/// One-shot `set-threshold`: returns the device's reply body.
pub async fn set_threshold(settings: &Settings, value: i64) -> Result<String> {
    DeviceClient::new(&settings.monitor.device_url)
        .set_threshold(value)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ThresholdPolicy;
    use crate::models::Reading;

    #[test]
    fn parses_console_commands() {
        assert_eq!(ConsoleCommand::parse("b"), Some(ConsoleCommand::CaptureBaseline));
        assert_eq!(ConsoleCommand::parse(" B \n"), Some(ConsoleCommand::CaptureBaseline));
        assert_eq!(ConsoleCommand::parse("clear"), Some(ConsoleCommand::ClearBaseline));
        assert_eq!(ConsoleCommand::parse("q"), Some(ConsoleCommand::Quit));
        assert_eq!(ConsoleCommand::parse("x"), None);
        assert_eq!(ConsoleCommand::parse(""), None);
    }

    #[tokio::test]
    async fn baseline_capture_needs_a_reading_first() {
        let session = MonitorSession::new(Classifier::new(ThresholdPolicy::BaselineDelta));

        let reply = execute(&session, ConsoleCommand::CaptureBaseline).await;
        assert_eq!(reply, "No sensor data yet.");

        session.record(Reading::new(3.0, 4.0, 20.0), None).await;
        let reply = execute(&session, ConsoleCommand::CaptureBaseline).await;
        assert!(reply.starts_with("Baseline captured: flex 20.0°"));
        assert!(session.snapshot().await.baseline.is_some());

        execute(&session, ConsoleCommand::ClearBaseline).await;
        assert!(session.snapshot().await.baseline.is_none());
    }
}
