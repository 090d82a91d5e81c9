//! Command implementations

pub mod import;
pub mod keys;

use std::sync::Arc;

use photosync_core::{ConfigManager, SyncEngine};
use photosync_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Build a sync engine for the configured bucket and prefix
///
/// Configuration problems are reported here, before any storage call.
pub async fn build_engine(formatter: &Formatter) -> Result<SyncEngine, ExitCode> {
    let config = match ConfigManager::new().and_then(|manager| manager.resolve()) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return Err(ExitCode::from_error(&e));
        }
    };

    let Some(bucket) = config.bucket().map(str::to_string) else {
        formatter.error("PHOTO_BUCKET not configured");
        return Err(ExitCode::ConfigError);
    };

    let client = match S3Client::new(&config.storage).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create storage client: {e}"));
            return Err(ExitCode::NetworkError);
        }
    };

    Ok(SyncEngine::new(Arc::new(client), bucket, &config.prefix()))
}
