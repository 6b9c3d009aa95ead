mod error_text;
mod format;
mod json;
mod mode;
mod purchase_text;
mod records_text;
mod sweep_text;

use std::io;

use bursar_client::{ClientError, SuccessEnvelope};

pub use mode::{OutputMode, mode_for_command};

use crate::stdout_io::write_stdout_line;

pub fn print_success(success: &SuccessEnvelope, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Text => render_text_success(success)?,
        OutputMode::Json => json::render_success_json(success)?,
    };
    write_stdout_line(&body)
}

pub fn print_failure(error: &ClientError, mode: OutputMode) -> io::Result<()> {
    let body = match mode {
        OutputMode::Json => json::render_error_json(error)?,
        OutputMode::Text => error_text::render_error(error),
    };
    write_stdout_line(&body)
}

fn render_text_success(success: &SuccessEnvelope) -> io::Result<String> {
    match success.command.as_str() {
        "sweep run" => Ok(sweep_text::render_sweep(&success.data)),
        "alerts list" => Ok(records_text::render_alerts(&success.data)),
        "suggestions list" => Ok(records_text::render_suggestions(&success.data)),
        "purchase create" => Ok(purchase_text::render_purchase(&success.data)),
        "demo" => Ok(sweep_text::render_demo(&success.data)),
        _ => Err(io::Error::other(format!(
            "unsupported text output command `{}`",
            success.command
        ))),
    }
}
