use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use pulsewatch_engine::evaluator::{self, RandomSurge};
use pulsewatch_engine::ruleset::default_rules;
use pulsewatch_engine::source::{simulated_snapshot, HttpMetricSource, MetricSource, SimulatedSource};

use super::helpers;
use crate::output::{print_alert, print_dim, print_header, print_json, print_kv, OutputMode};

#[derive(clap::Args)]
pub struct CheckArgs {
    #[arg(long, default_value = "demo-channel", help = "Channel to sample")]
    channel: String,
}

pub async fn execute(args: CheckArgs, mode: OutputMode, config_path: Option<String>) -> Result<()> {
    let config = helpers::load_config(config_path.as_deref())?;

    let source: Box<dyn MetricSource> = match config.metrics_url.as_deref() {
        Some(url) => Box::new(HttpMetricSource::new(url)),
        None => Box::new(SimulatedSource),
    };

    let timeout = Duration::from_millis(config.fetch_timeout_ms);
    let snapshot = match tokio::time::timeout(timeout, source.fetch(&args.channel)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "metric fetch failed, using simulated snapshot");
            simulated_snapshot()
        }
        Err(_) => {
            tracing::warn!("metric fetch timed out, using simulated snapshot");
            simulated_snapshot()
        }
    };

    let rules = default_rules();
    let candidates = evaluator::evaluate(&snapshot, &rules, &RandomSurge::default(), Utc::now());
    let alerts: Vec<_> = candidates
        .into_iter()
        .map(|c| c.into_alert())
        .collect();

    match mode {
        OutputMode::Json => {
            print_json(&serde_json::json!({
                "snapshot": snapshot,
                "alerts": alerts,
            }))?;
        }
        OutputMode::Human => {
            print_header(&format!("Check {}", args.channel));
            print_kv("growth rate", &format!("{:.1}%", snapshot.growth_rate));
            print_kv(
                "engagement rate",
                &format!("{:.1}%", snapshot.engagement_rate),
            );
            print_kv("subscribers", &snapshot.subscribers.to_string());
            print_kv("views", &snapshot.views.to_string());
            print_kv(
                "source",
                if snapshot.is_fallback {
                    "simulated"
                } else {
                    "live"
                },
            );
            println!();
            if alerts.is_empty() {
                print_dim("nothing would fire");
            } else {
                for alert in &alerts {
                    print_alert(alert);
                }
            }
            println!();
        }
    }

    Ok(())
}
