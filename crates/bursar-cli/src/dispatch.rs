use bursar_client::commands;
use bursar_client::{ClientResult, SuccessEnvelope};

use crate::cli::{
    AlertsCommand, Cli, Commands, DemoCommand, PurchaseCommand, SuggestionsCommand, SweepCommand,
};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Sweep { command } => match command {
            SweepCommand::Run { mode, user, .. } => {
                commands::sweep::run(Some(mode.as_str()), user.as_deref())
            }
        },
        Commands::Alerts { command } => match command {
            AlertsCommand::List { status, user, .. } => {
                commands::alerts::list(status.as_deref(), user.as_deref())
            }
        },
        Commands::Suggestions { command } => match command {
            SuggestionsCommand::List { status, user, .. } => {
                commands::suggestions::list(status.as_deref(), user.as_deref())
            }
        },
        Commands::Purchase { command } => match command {
            PurchaseCommand::Create {
                merchant,
                amount,
                currency,
                account,
                splits,
                user,
                ..
            } => commands::purchase::create(
                merchant,
                *amount,
                currency,
                account,
                splits,
                user.as_deref(),
            ),
        },
        Commands::Demo { command } => {
            let topic = match command {
                DemoCommand::Sweep => "sweep",
                DemoCommand::Purchase => "purchase",
            };
            commands::demo::run(topic)
        }
    }
}
