use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use pulsewatch_common::types::Alert;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_header(title: &str) {
    let width = title.len() + 6;
    let border = "─".repeat(width);
    println!();
    println!("  ╭{}╮", border.cyan());
    println!("  │   {}   │", title.bright_cyan().bold());
    println!("  ╰{}╯", border.cyan());
    println!();
}

pub fn print_kv(label: &str, value: &str) {
    println!(
        "    {} {}",
        format!("{:<18}", label).dimmed(),
        value.bright_white()
    );
}

pub fn print_dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

pub fn print_alert(alert: &Alert) {
    let when = alert.timestamp.format("%H:%M:%S");
    let marker = if alert.read {
        "•".dimmed()
    } else {
        "●".bright_yellow()
    };
    println!(
        "  {} {} {}  {}",
        marker,
        format!("[{when}]").dimmed(),
        alert.title.bold(),
        alert.message
    );
}
