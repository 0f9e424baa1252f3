use std::collections::HashSet;

use anyhow::Result;
use colored::Colorize;

use pulsewatch_engine::AlertWatcher;

use super::helpers;
use crate::output::{print_alert, print_dim, print_header, print_json, OutputMode};

#[derive(clap::Args)]
pub struct WatchArgs {
    #[arg(long, default_value = "demo-channel", help = "Channel to watch")]
    channel: String,
    #[arg(long, help = "Override the polling interval in milliseconds")]
    interval_ms: Option<u64>,
}

pub async fn execute(args: WatchArgs, mode: OutputMode, config_path: Option<String>) -> Result<()> {
    let mut config = helpers::load_config(config_path.as_deref())?;
    if let Some(ms) = args.interval_ms {
        config.check_interval_ms = ms;
    }

    let mut watcher = AlertWatcher::new(config, &args.channel);
    watcher.seed().await;
    let mut rx = watcher.subscribe();
    watcher.start();

    if mode == OutputMode::Human {
        print_header(&format!("Watching {}", args.channel));
        print_dim("ctrl-c to stop");
        println!();
    }

    let mut seen: HashSet<String> = HashSet::new();

    // Alerts seeded from the backend are already in the channel's initial
    // value; show them before streaming changes.
    for alert in watcher.alerts().iter().rev() {
        seen.insert(alert.id.clone());
        match mode {
            OutputMode::Json => print_json(alert)?,
            OutputMode::Human => print_alert(alert),
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let alerts = rx.borrow_and_update().clone();
                // Oldest first so the stream reads chronologically.
                for alert in alerts.iter().rev() {
                    if !seen.insert(alert.id.clone()) {
                        continue;
                    }
                    match mode {
                        OutputMode::Json => print_json(alert)?,
                        OutputMode::Human => print_alert(alert),
                    }
                }
            }
        }
    }

    watcher.stop();
    if mode == OutputMode::Human {
        println!();
        println!(
            "  {} {} alerts, {} unread",
            "stopped.".dimmed(),
            watcher.alerts().len(),
            watcher.unread_count()
        );
    }
    Ok(())
}
