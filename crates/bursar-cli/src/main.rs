mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use bursar_client::ClientError;
use clap::{Parser, error::ErrorKind};
use stdout_io::write_stdout_line;

const ROOT_HELP: &str = "Bursar — household finance automation

USAGE: bursar <command>

Try it on sample data:
  bursar demo sweep                                   Seed a sample household and sweep it
  bursar demo purchase                                Seed and post a sample split purchase

Run the automation against your ledger:
  bursar sweep run [--mode hourly|monthly|manual]     Recompute alerts and suggestions
  bursar alerts list [--status open]                  Inspect sweep alerts
  bursar suggestions list [--status open]             Inspect sweep suggestions

Post purchases:
  bursar purchase create --merchant <m> --amount <a> --account <id> \\
      [--currency USD] [--split label=amount[:account]]...

Add --json to any list/run command for machine-readable output.
Run `bursar <command> --help` for command usage.
";

fn main() -> ExitCode {
    let _logger = init_logging_best_effort();
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 || is_top_level_help_request(&raw_args) {
        if write_stdout_line(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let parsed = cli::Cli::try_parse();
    let cli = match parsed {
        Ok(value) => value,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                if write_stdout_line(&err.to_string()).is_err() {
                    return Err(ExitCode::from(2));
                }
                return Ok(ExitCode::SUCCESS);
            }

            let parse_error = ClientError::invalid_argument_for_command(
                &strip_clap_boilerplate(&err.to_string()),
                command_path_from_args(&raw_args).as_deref(),
            );
            let mode = infer_requested_output_mode(&raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            return Err(ExitCode::from(1));
        }
    };
    let mode = output::mode_for_command(&cli.command);

    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

// Diagnostics stay quiet rather than blocking the command; a logger that
// fails to start is simply absent.
fn init_logging_best_effort() -> Option<flexi_logger::LoggerHandle> {
    flexi_logger::Logger::try_with_env_or_str("warn")
        .ok()
        .and_then(|logger| logger.start().ok())
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Strips clap's trailing boilerplate (Usage line, "For more information"
/// hint) so the failure envelope's recovery steps are the single source of
/// guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

fn command_path_from_args(raw_args: &[String]) -> Option<String> {
    let non_flags: Vec<&str> = raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .map(String::as_str)
        .collect();

    let hint = match non_flags.as_slice() {
        ["sweep", "run", ..] => Some("sweep run"),
        ["sweep", ..] => Some("sweep"),
        ["alerts", "list", ..] => Some("alerts list"),
        ["alerts", ..] => Some("alerts"),
        ["suggestions", "list", ..] => Some("suggestions list"),
        ["suggestions", ..] => Some("suggestions"),
        ["purchase", "create", ..] => Some("purchase create"),
        ["purchase", ..] => Some("purchase"),
        ["demo", ..] => Some("demo"),
        _ => None,
    };
    hint.map(std::string::ToString::to_string)
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if is_internal_error(error) {
        ExitCode::from(2)
    } else {
        ExitCode::from(1)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}

fn is_internal_error(error: &ClientError) -> bool {
    error.code.starts_with("internal_")
        || matches!(
            error.code.as_str(),
            "ledger_init_permission_denied"
                | "ledger_locked"
                | "ledger_corrupt"
                | "migration_failed"
                | "ledger_init_failed"
        )
}

#[cfg(test)]
mod tests {
    use super::{command_path_from_args, strip_clap_boilerplate};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn command_hints_follow_the_subcommand_path() {
        assert_eq!(
            command_path_from_args(&args(&["bursar", "sweep", "run", "--mode", "bad"])),
            Some("sweep run".to_string())
        );
        assert_eq!(
            command_path_from_args(&args(&["bursar", "purchase"])),
            Some("purchase".to_string())
        );
        assert_eq!(command_path_from_args(&args(&["bursar"])), None);
    }

    #[test]
    fn clap_boilerplate_is_stripped_from_parse_errors() {
        let cleaned = strip_clap_boilerplate(
            "error: unexpected argument\n\nUsage: bursar sweep run\n",
        );
        assert_eq!(cleaned, "error: unexpected argument");
    }
}
