use anyhow::Result;
use colored::Colorize;

use pulsewatch_common::types::AlertRule;
use pulsewatch_engine::backend::AlertBackend;
use pulsewatch_engine::ruleset::default_rules;
use pulsewatch_engine::HttpAlertBackend;

use super::helpers;
use crate::output::{print_header, print_json, OutputMode};

#[derive(clap::Args)]
pub struct RulesArgs {
    #[arg(long, default_value = "demo-channel", help = "Channel to list rules for")]
    channel: String,
}

pub async fn execute(args: RulesArgs, mode: OutputMode, config_path: Option<String>) -> Result<()> {
    let config = helpers::load_config(config_path.as_deref())?;

    let rules = match config.backend_url.as_deref() {
        Some(url) => match HttpAlertBackend::new(url).fetch_rules(&args.channel).await {
            Ok(rules) if !rules.is_empty() => rules,
            Ok(_) => default_rules(),
            Err(e) => {
                tracing::warn!(error = %e, "rule fetch failed, showing defaults");
                default_rules()
            }
        },
        None => default_rules(),
    };

    match mode {
        OutputMode::Json => print_json(&rules)?,
        OutputMode::Human => {
            print_header("Alert Rules");
            for rule in &rules {
                print_rule(rule);
            }
            println!();
        }
    }

    Ok(())
}

fn print_rule(rule: &AlertRule) {
    let status = if rule.enabled {
        "on ".green()
    } else {
        "off".dimmed()
    };
    println!(
        "  {} {}  {}  {} {} {}",
        status,
        format!("{:<22}", rule.id).dimmed(),
        format!("{:<20}", rule.name).bold(),
        rule.kind,
        rule.condition,
        rule.threshold
    );
}
