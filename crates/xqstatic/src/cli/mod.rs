//
// cli/mod.rs
//
// Command-line subcommands
//

pub mod analysis_stats;
pub mod query;

use anyhow::Context;

use crate::config::ResolverConfig;
use crate::dialect::{LanguageVersion, VendorProfile};
use crate::modules::ModuleRegistry;

/// Dialect and module options shared by the subcommands.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CommonArgs {
    pub config: Option<std::path::PathBuf>,
    pub implementation: Option<VendorProfile>,
    pub version: Option<LanguageVersion>,
    pub modules: Vec<std::path::PathBuf>,
}

impl CommonArgs {
    /// Consume `arg` (and its value) if it is a shared option.
    ///
    /// Returns `Ok(false)` when `arg` is not one of ours.
    pub fn parse_flag(
        &mut self,
        arg: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, String> {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg {
            "--config" => self.config = Some(value(arg)?.into()),
            "--module" => self.modules.push(value(arg)?.into()),
            "--implementation" => {
                let v = value(arg)?;
                self.implementation = Some(v.parse().map_err(|e| format!("{e}"))?);
            }
            "--xquery-version" => {
                let v = value(arg)?;
                self.version = Some(v.parse().map_err(|e| format!("{e}"))?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Settings from `--config`, overridden by the command-line flags.
    pub fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::from_file(path)?,
            None => ResolverConfig::default(),
        };

        if let Some(profile) = self.implementation {
            config.dialect.vendor_profile = profile;
            if self.version.is_none() && matches!(profile, VendorProfile::MarkLogic { .. }) {
                config.dialect.language_version = LanguageVersion::MarkLogic10;
            }
        }
        if let Some(version) = self.version {
            config.dialect.language_version = version;
        }
        config.module_paths.extend(self.modules.iter().cloned());
        Ok(config)
    }
}

/// Register every library module named in `config`.
pub fn load_modules(config: &ResolverConfig) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    for path in &config.module_paths {
        registry
            .register_file(path)
            .with_context(|| format!("Failed to load library module {}", path.display()))?;
    }
    log::debug!("Loaded {} library modules", registry.len());
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<CommonArgs, String> {
        let mut common = CommonArgs::default();
        let mut args = argv.iter().map(|s| s.to_string());
        while let Some(arg) = args.next() {
            if !common.parse_flag(&arg, &mut args)? {
                return Err(format!("unexpected {arg}"));
            }
        }
        Ok(common)
    }

    #[test]
    fn test_marklogic_implementation_implies_ml_dialect() {
        let common = parse(&["--implementation", "marklogic/v9"]).unwrap();
        let config = common.resolver_config().unwrap();
        assert_eq!(config.dialect.language_version, LanguageVersion::MarkLogic10);
        assert_eq!(config.dialect.vendor_profile, VendorProfile::MarkLogic { version: 9 });
    }

    #[test]
    fn test_explicit_version_wins() {
        let common =
            parse(&["--implementation", "marklogic", "--xquery-version", "0.9-ml"]).unwrap();
        let config = common.resolver_config().unwrap();
        assert_eq!(config.dialect.language_version, LanguageVersion::MarkLogic09);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(parse(&["--xquery-version", "2.0"]).unwrap_err().contains("Unknown XQuery version"));
        assert!(parse(&["--implementation", "zorba"]).is_err());
        assert!(parse(&["--module"]).unwrap_err().contains("requires a value"));
    }

    #[test]
    fn test_config_file_is_overridden_by_flags() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("xqstatic.json");
        std::fs::write(&path, r#"{"xquery": {"version": "3.0"}, "cacheCapacity": 8}"#).unwrap();

        let common = parse(&["--config", path.to_str().unwrap(), "--xquery-version", "1.0"]).unwrap();
        let config = common.resolver_config().unwrap();
        assert_eq!(config.dialect.language_version, LanguageVersion::XQuery10);
        assert_eq!(config.cache_capacity, 8);
    }

    #[test]
    fn test_missing_module_file_is_an_error() {
        let config = ResolverConfig {
            module_paths: vec!["/nonexistent/module.json".into()],
            ..ResolverConfig::default()
        };
        let err = load_modules(&config).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to load library module"));
    }
}
