use std::path::Path;

use crate::ClientResult;
use crate::commands::common::{load_setup, resolve_user};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::SweepData;
use crate::state::open_connection;
use crate::sweep::policy::SWEEP_POLICY_VERSION;
use crate::sweep::run::{SweepOptions, run_sweep};
use crate::sweep::types::SweepMode;

#[derive(Debug, Default)]
pub struct SweepRunOptions<'a> {
    pub mode: Option<String>,
    pub user: Option<String>,
    pub now_ms: Option<i64>,
    pub home_override: Option<&'a Path>,
}

pub fn run(mode: Option<&str>, user: Option<&str>) -> ClientResult<SuccessEnvelope> {
    run_with_options(SweepRunOptions {
        mode: mode.map(std::string::ToString::to_string),
        user: user.map(std::string::ToString::to_string),
        now_ms: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: SweepRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let mut connection = open_connection(&setup.db_path)?;

    let sweep_options = SweepOptions {
        user_id: resolve_user(options.user.as_deref()),
        mode: SweepMode::parse_or_default(options.mode.as_deref().unwrap_or("manual")),
        now_ms: options.now_ms,
    };
    let summary = run_sweep(&mut connection, &setup.db_path, &sweep_options)?;

    let data = SweepData {
        mode: summary.mode.as_str().to_string(),
        user_id: summary.user_id,
        cycle_key: summary.cycle_key,
        policy_version: SWEEP_POLICY_VERSION.to_string(),
        alerts_created: summary.alerts_created,
        alerts_updated: summary.alerts_updated,
        alerts_resolved: summary.alerts_resolved,
        suggestions_created: summary.suggestions_created,
        skipped: summary.skipped,
        skip_reason: summary.skip_reason,
    };

    success("sweep run", data)
}
