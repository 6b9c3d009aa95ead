use std::path::{Path, PathBuf};

use serde_json::json;

use crate::ClientResult;
use crate::commands::common::{load_setup, resolve_user};
use crate::commands::{purchase, sweep};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::DemoData;
use crate::demo::seed_sample_household;
use crate::state::open_connection;

#[derive(Debug, Default)]
pub struct DemoRunOptions<'a> {
    pub topic: String,
    pub user: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn run(topic: &str) -> ClientResult<SuccessEnvelope> {
    run_with_options(DemoRunOptions {
        topic: topic.to_string(),
        user: None,
        home_override: None,
    })
}

/// Seeds the bundled sample household into a scratch ledger home and runs
/// the requested pipeline over it, leaving the real ledger untouched.
#[doc(hidden)]
pub fn run_with_options(options: DemoRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let demo_home = match options.home_override {
        Some(home) => home.to_path_buf(),
        None => default_demo_home(),
    };
    let setup = load_setup(Some(&demo_home))?;
    let user_id = resolve_user(options.user.as_deref());

    {
        let connection = open_connection(&setup.db_path)?;
        seed_sample_household(&connection, &setup.db_path, &user_id)?;
    }

    let detail = match options.topic.as_str() {
        "purchase" => {
            let envelope = purchase::create_with_options(purchase::PurchaseCreateOptions {
                merchant: "Corner Market".to_string(),
                amount: 120.00,
                currency: "USD".to_string(),
                payment_account_id: "acct_checking".to_string(),
                splits: vec![
                    "groceries=80".to_string(),
                    "household=40:acct_savings".to_string(),
                ],
                user: Some(user_id.clone()),
                now_ms: None,
                home_override: Some(&demo_home),
            })?;
            envelope.data
        }
        _ => {
            let envelope = sweep::run_with_options(sweep::SweepRunOptions {
                mode: Some("manual".to_string()),
                user: Some(user_id.clone()),
                now_ms: None,
                home_override: Some(&demo_home),
            })?;
            envelope.data
        }
    };

    let data = DemoData {
        topic: if options.topic == "purchase" {
            "purchase".to_string()
        } else {
            "sweep".to_string()
        },
        seeded: true,
        home: demo_home.display().to_string(),
        detail: json!({ "result": detail }),
    };
    success("demo", data)
}

fn default_demo_home() -> PathBuf {
    std::env::temp_dir().join("bursar-demo")
}
