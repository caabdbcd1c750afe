use std::path::Path;

const COMMON_ENV: &str = "config/common.env";
const SECRETS_ENV: &str = ".secrets.env";

/// Outcome of layering the env files, reported once logging is up.
#[derive(Debug, Default)]
pub struct EnvReport {
    pub loaded: Vec<&'static str>,
    pub missing: Vec<&'static str>,
}

/// Env files for a Rocket profile, lowest precedence first.
pub fn env_files(profile: &str) -> [&'static str; 3] {
    let profile_env = if profile == "production" {
        "config/prod.env"
    } else {
        "config/dev.env"
    };
    [COMMON_ENV, profile_env, SECRETS_ENV]
}

/// Loads the env files for `ROCKET_PROFILE`. Variables already set in the
/// process win over every file, and earlier files win over later ones.
pub fn load_environment() -> Result<EnvReport, dotenvy::Error> {
    let profile = dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

    let mut report = EnvReport::default();
    for path in env_files(&profile) {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)?;
            report.loaded.push(path);
        } else {
            report.missing.push(path);
        }
    }

    Ok(report)
}
