//! keys command - Show the dedup baseline
//!
//! Lists every key already stored under the destination prefix.

use clap::Args;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List keys already present under the destination prefix
#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Print only the number of keys
    #[arg(long)]
    pub count: bool,
}

#[derive(Debug, Serialize)]
struct KeysOutput {
    bucket: String,
    prefix: String,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    keys: Option<Vec<String>>,
}

/// Execute the keys command
pub async fn execute(args: KeysArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let engine = match super::build_engine(&formatter).await {
        Ok(engine) => engine,
        Err(code) => return code,
    };

    let existing = match engine.existing_keys().await {
        Ok(keys) => keys,
        Err(e) => {
            formatter.error(&format!("Failed to list destination: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let count = existing.len();
    let keys = (!args.count).then(|| {
        let mut keys: Vec<String> = existing.into_iter().collect();
        keys.sort();
        keys
    });

    if formatter.is_json() {
        formatter.json(&KeysOutput {
            bucket: engine.bucket().to_string(),
            prefix: engine.prefix().to_string(),
            count,
            keys,
        });
        return ExitCode::Success;
    }

    for key in keys.iter().flatten() {
        formatter.println(&formatter.style_key(key));
    }
    formatter.println(&format!(
        "{count} object(s) under {}/{}",
        formatter.style_name(engine.bucket()),
        engine.prefix()
    ));

    ExitCode::Success
}
