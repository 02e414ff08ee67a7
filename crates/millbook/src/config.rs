//! CLI configuration: thin wrapper around `millbook_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--api-url, --mill, etc.).

use std::time::Duration;

use clap::ValueEnum;

use millbook_core::{ClientConfig, TlsVerification};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use millbook_config::{Config, Profile, config_path, load_config_or_default};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// `defaults.output` from config, falling back to a table.
pub fn default_output(config: &Config) -> OutputFormat {
    OutputFormat::from_str(&config.defaults.output, true).unwrap_or(OutputFormat::Table)
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
pub fn build_client_config(global: &GlobalOpts, config: &Config) -> Result<ClientConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    if let Some(profile) = config.profiles.get(&profile_name) {
        return resolve_profile(profile, global, config);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(config),
        });
    }

    // No profile: build from flags / env vars alone
    let (Some(api_url), Some(mill)) = (global.api_url.as_deref(), global.mill.as_deref()) else {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    };

    let profile = Profile {
        api_url: api_url.to_owned(),
        mill_id: mill.to_owned(),
        ca_cert: None,
        insecure: None,
        timeout: None,
    };
    resolve_profile(&profile, global, config)
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    global: &GlobalOpts,
    config: &Config,
) -> Result<ClientConfig, CliError> {
    let overridden = Profile {
        api_url: global
            .api_url
            .clone()
            .unwrap_or_else(|| profile.api_url.clone()),
        mill_id: global.mill.clone().unwrap_or_else(|| profile.mill_id.clone()),
        ..profile.clone()
    };
    let mut client = millbook_config::profile_to_client_config(&overridden, &config.defaults)?;

    if global.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }
    Ok(client)
}

fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["millbook"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["parties", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_profile() -> Config {
        let mut config = Config::default();
        config.profiles.insert(
            "default".into(),
            Profile {
                api_url: "https://erp.example.com/api/v1".into(),
                mill_id: "sri-lakshmi".into(),
                ca_cert: None,
                insecure: None,
                timeout: Some(12),
            },
        );
        config
    }

    #[test]
    fn flags_override_profile() {
        let client = build_client_config(
            &global(&["--mill", "annapurna", "--timeout", "3", "-k"]),
            &config_with_profile(),
        )
        .unwrap();
        assert_eq!(client.mill_id, "annapurna");
        assert_eq!(client.base_url.as_str(), "https://erp.example.com/api/v1");
        assert_eq!(client.timeout, Duration::from_secs(3));
        assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn profile_timeout_applies_without_flag() {
        let client = build_client_config(&global(&[]), &config_with_profile()).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(12));
    }

    #[test]
    fn flags_alone_are_enough() {
        let client = build_client_config(
            &global(&["--api-url", "http://127.0.0.1:9000", "--mill", "m1"]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(client.mill_id, "m1");
    }

    #[test]
    fn missing_everything_is_no_config() {
        let err = build_client_config(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_explicit_profile_is_reported() {
        let err =
            build_client_config(&global(&["--profile", "north"]), &config_with_profile()).unwrap_err();
        assert!(matches!(
            err,
            CliError::ProfileNotFound { ref available, .. } if available == "default"
        ));
    }

    #[test]
    fn output_default_comes_from_config() {
        let mut config = Config::default();
        config.defaults.output = "yaml".into();
        assert_eq!(default_output(&config), OutputFormat::Yaml);
        config.defaults.output = "sparkles".into();
        assert_eq!(default_output(&config), OutputFormat::Table);
    }
}
