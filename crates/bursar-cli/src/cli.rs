use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bursar", disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the automation sweep (alerts, suggestions).
    Sweep {
        #[command(subcommand)]
        command: SweepCommand,
    },
    /// Inspect alerts produced by the sweep.
    Alerts {
        #[command(subcommand)]
        command: AlertsCommand,
    },
    /// Inspect suggestions produced by the sweep.
    Suggestions {
        #[command(subcommand)]
        command: SuggestionsCommand,
    },
    /// Post purchases into the double-sided ledger.
    Purchase {
        #[command(subcommand)]
        command: PurchaseCommand,
    },
    /// Explore bursar against a bundled sample household.
    Demo {
        #[command(subcommand)]
        command: DemoCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SweepCommand {
    /// Execute one sweep for one user.
    Run {
        /// Trigger cadence: hourly, monthly, or manual.
        #[arg(long, default_value = "manual")]
        mode: String,
        /// User identity to sweep (defaults to the local identity).
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts, optionally filtered by status.
    List {
        /// open, snoozed, or resolved.
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum SuggestionsCommand {
    /// List suggestions, optionally filtered by status.
    List {
        /// open, accepted, dismissed, or snoozed.
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum PurchaseCommand {
    /// Post one purchase with optional proportional splits.
    Create {
        #[arg(long)]
        merchant: String,
        /// Total in major currency units, e.g. 42.15.
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Payment account funding the purchase.
        #[arg(long)]
        account: String,
        /// Repeatable: `label=amount` or `label=amount:account_id`.
        #[arg(long = "split")]
        splits: Vec<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum DemoCommand {
    /// Seed the sample household and run a sweep over it.
    Sweep,
    /// Seed the sample household and post a sample purchase.
    Purchase,
}

pub fn parse_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::{Commands, SweepCommand, parse_from};

    #[test]
    fn sweep_run_parses_mode_and_user() {
        let parsed = parse_from([
            "bursar", "sweep", "run", "--mode", "monthly", "--user", "usr_abc",
        ]);
        assert!(parsed.is_ok());
        let mut matched = false;
        if let Ok(cli) = parsed
            && let Commands::Sweep {
                command: SweepCommand::Run { mode, user, json },
            } = cli.command
        {
            matched = true;
            assert_eq!(mode, "monthly");
            assert_eq!(user.as_deref(), Some("usr_abc"));
            assert!(!json);
        }
        assert!(matched);
    }

    #[test]
    fn purchase_create_accepts_repeated_splits() {
        let parsed = parse_from([
            "bursar",
            "purchase",
            "create",
            "--merchant",
            "Corner Market",
            "--amount",
            "120.00",
            "--account",
            "acct_checking",
            "--split",
            "groceries=80",
            "--split",
            "household=40:acct_savings",
        ]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn unknown_subcommands_fail_to_parse() {
        assert!(parse_from(["bursar", "imports", "list"]).is_err());
    }
}
