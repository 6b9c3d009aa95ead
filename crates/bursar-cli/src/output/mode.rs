use crate::cli::{AlertsCommand, Commands, PurchaseCommand, SuggestionsCommand, SweepCommand};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Sweep {
            command: SweepCommand::Run { json, .. },
        } => *json,
        Commands::Alerts {
            command: AlertsCommand::List { json, .. },
        } => *json,
        Commands::Suggestions {
            command: SuggestionsCommand::List { json, .. },
        } => *json,
        Commands::Purchase {
            command: PurchaseCommand::Create { json, .. },
        } => *json,
        Commands::Demo { .. } => false,
    };

    if json { OutputMode::Json } else { OutputMode::Text }
}
