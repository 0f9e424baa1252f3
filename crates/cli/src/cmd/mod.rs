mod check;
pub(crate) mod helpers;
mod rules;
mod watch;

use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Poll channel metrics and stream alerts until interrupted
    Watch(watch::WatchArgs),
    /// Print the effective alert rule set
    Rules(rules::RulesArgs),
    /// Run a single sample/evaluate pass and show what would fire
    Check(check::CheckArgs),
}

pub async fn run(opts: crate::Opts) -> Result<()> {
    let mode = opts.output_mode();
    match opts.cmd {
        Commands::Watch(args) => watch::execute(args, mode, opts.config).await,
        Commands::Rules(args) => rules::execute(args, mode, opts.config).await,
        Commands::Check(args) => check::execute(args, mode, opts.config).await,
    }
}
