use std::{path::PathBuf, sync::Arc, time::Duration};

use ansi_term::Colour;
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use crate::{
    config::TrackerConfig,
    events::{emitter::Listener, key::EventKey, Event, STATUS_AWAY, STATUS_CHANGE, STATUS_ONLINE},
    idle::GenericIdleSource,
    status::Status,
    tracker::PresenceTracker,
};

const DEFAULT_INACTIVITY: Duration = Duration::from_secs(60 * 2);

#[derive(Debug, Parser)]
pub struct WatchCommand {
    #[arg(long, help = "JSON file with inactivity_ms, poll_interval_ms and initial_status")]
    config: Option<PathBuf>,
    #[arg(long = "inactivity-ms", help = "Idle time after which you count as away. Defaults to 2 minutes")]
    inactivity_ms: Option<u64>,
    #[arg(long = "poll-ms", help = "How often idle time is sampled. Defaults to 1000")]
    poll_ms: Option<u64>,
    #[arg(long = "initial-status", help = "Status to start in, online or away")]
    initial_status: Option<Status>,
    #[arg(
        long = "on",
        help = "Event to print, e.g. status-change, status:away or away:5000. Can be repeated. Defaults to status-change"
    )]
    on: Vec<String>,
    #[arg(long, help = "Print events as JSON lines")]
    json: bool,
}

impl WatchCommand {
    /// Flags win over the config file, the config file wins over defaults.
    fn tracker_config(&self) -> Result<TrackerConfig> {
        let mut config = match &self.config {
            Some(path) => TrackerConfig::from_json_file(path)?,
            None => TrackerConfig::new(DEFAULT_INACTIVITY),
        };
        if let Some(inactivity) = self.inactivity_ms {
            config.inactivity_duration = Duration::from_millis(inactivity);
        }
        if let Some(poll) = self.poll_ms {
            config = config.with_poll_interval(Duration::from_millis(poll));
        }
        if let Some(status) = self.initial_status {
            config = config.with_initial_status(status)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn subscriptions(&self) -> Vec<String> {
        if self.on.is_empty() {
            vec![STATUS_CHANGE.to_string()]
        } else {
            self.on.clone()
        }
    }
}

fn format_event(event: &Event, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(event)?);
    }

    let time = Local::now().format("%H:%M:%S");
    let text = match (&*event.name, event.change) {
        (_, Some(change)) => format!("{} -> {}", change.previous_status, change.current_status),
        (STATUS_ONLINE, None) => Colour::Green.paint("online").to_string(),
        (STATUS_AWAY, None) => Colour::Yellow.paint("away").to_string(),
        (name, None) => match EventKey::parse(name) {
            EventKey::Timed { status, threshold } => Colour::Cyan
                .paint(format!("{status} for {}s", threshold.as_secs_f64()))
                .to_string(),
            EventKey::Plain(name) => name.to_string(),
        },
    };
    Ok(format!("[{time}] {text}"))
}

fn printer(json: bool) -> Listener {
    Arc::new(move |event: &Event| match format_event(event, json) {
        Ok(line) => println!("{line}"),
        Err(e) => error!("Failed to format event {e:?}"),
    })
}

pub async fn process_watch_command(command: WatchCommand) -> Result<()> {
    let config = command.tracker_config()?;
    let tracker = PresenceTracker::new(config, GenericIdleSource::new()?)?;

    let listener = printer(command.json);
    for name in command.subscriptions() {
        tracker.on(&name, listener.clone());
    }

    tracker.init()?;
    info!("Watching presence with {:?}", tracker.config());

    tokio::signal::ctrl_c().await?;
    tracker.destroy();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use clap::Parser;

    use crate::{
        events::{Event, StatusChange},
        status::Status,
    };

    use super::{format_event, WatchCommand};

    #[test]
    fn flags_build_config() -> Result<()> {
        let command = WatchCommand::try_parse_from([
            "watch",
            "--inactivity-ms",
            "5000",
            "--poll-ms",
            "250",
            "--initial-status",
            "away",
            "--on",
            "away:3000",
            "--on",
            "status-change",
        ])?;

        let config = command.tracker_config()?;

        assert_eq!(config.inactivity_duration, Duration::from_millis(5000));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.initial_status, Status::Away);
        assert_eq!(command.subscriptions(), vec!["away:3000", "status-change"]);
        Ok(())
    }

    #[test]
    fn defaults_to_status_change() -> Result<()> {
        let command = WatchCommand::try_parse_from(["watch"])?;
        assert_eq!(command.subscriptions(), vec!["status-change"]);
        assert_eq!(
            command.tracker_config()?.inactivity_duration,
            Duration::from_secs(120)
        );
        Ok(())
    }

    #[test]
    fn rejects_invalid_status_flag() {
        assert!(WatchCommand::try_parse_from(["watch", "--initial-status", "busy"]).is_err());
    }

    #[test]
    fn rejects_zero_poll() -> Result<()> {
        let command = WatchCommand::try_parse_from(["watch", "--poll-ms", "0"])?;
        assert!(command.tracker_config().is_err());
        Ok(())
    }

    #[test]
    fn json_output() -> Result<()> {
        let event = Event::status_change(StatusChange {
            previous_status: Status::Online,
            current_status: Status::Away,
        });
        assert_eq!(
            format_event(&event, true)?,
            r#"{"name":"status-change","change":{"previous_status":"online","current_status":"away"}}"#
        );
        assert_eq!(format_event(&Event::named("away:0"), true)?, r#"{"name":"away:0"}"#);
        Ok(())
    }

    #[test]
    fn text_output() -> Result<()> {
        let line = format_event(&Event::named("online:90000"), false)?;
        assert!(line.ends_with(&format!(
            "{}",
            ansi_term::Colour::Cyan.paint("online for 90s")
        )));
        let line = format_event(&Event::named("lunch"), false)?;
        assert!(line.ends_with("] lunch"));
        Ok(())
    }
}
