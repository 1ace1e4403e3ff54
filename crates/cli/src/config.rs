use crate::{commands::StoreArgs, env::EnvManager, error::CliError};
use engine_config::settings::{
    ScanSettings, UnavailableRangePolicy, validated::ValidatedSettings,
    validator::SettingsValidator,
};
use std::path::PathBuf;
use tracing::info;

/// Flags of the `scan` command that override settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanOverrides {
    pub concurrency: Option<usize>,
    pub strict: bool,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".feedscan/config.json"))
        .filter(|path| path.exists())
}

/// Settings file, then environment, then command line flags.
pub async fn load_settings(
    args: &StoreArgs,
    overrides: ScanOverrides,
) -> Result<ValidatedSettings, CliError> {
    let settings = match args.config.clone().or_else(default_config_path) {
        Some(path) => ScanSettings::load(&path).await?,
        None => {
            info!("No settings file found, using defaults");
            ScanSettings::default()
        }
    };

    let mut env = EnvManager::from_process();
    if let Some(path) = &args.env_file {
        env.load_from_file(path)?;
    }

    resolve(settings, &env, args, overrides)
}

fn resolve(
    mut settings: ScanSettings,
    env: &EnvManager,
    args: &StoreArgs,
    overrides: ScanOverrides,
) -> Result<ValidatedSettings, CliError> {
    settings.apply_env(env.all())?;

    if let Some(database) = &args.database {
        settings.database_id = Some(database.clone());
    }
    if let Some(collection) = &args.collection {
        settings.collection_id = Some(collection.clone());
    }
    if let Some(concurrency) = overrides.concurrency {
        settings.concurrency = concurrency;
    }
    if overrides.strict {
        settings.unavailable_range_policy = UnavailableRangePolicy::Abort;
    }

    let validated = SettingsValidator::validate(&settings)?;
    validated.log();
    Ok(validated)
}
