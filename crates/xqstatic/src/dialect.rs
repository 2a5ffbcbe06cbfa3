//
// dialect.rs
//
// Language version and vendor profile selection
//

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// XQuery language version, including the MarkLogic extension dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LanguageVersion {
    #[serde(rename = "1.0")]
    XQuery10,
    #[serde(rename = "3.0")]
    XQuery30,
    #[default]
    #[serde(rename = "3.1")]
    XQuery31,
    #[serde(rename = "4.0")]
    XQuery40,
    #[serde(rename = "0.9-ml")]
    MarkLogic09,
    #[serde(rename = "1.0-ml")]
    MarkLogic10,
}

impl LanguageVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageVersion::XQuery10 => "1.0",
            LanguageVersion::XQuery30 => "3.0",
            LanguageVersion::XQuery31 => "3.1",
            LanguageVersion::XQuery40 => "4.0",
            LanguageVersion::MarkLogic09 => "0.9-ml",
            LanguageVersion::MarkLogic10 => "1.0-ml",
        }
    }

    /// Position on the W3C version line. `1.0-ml` carries the 3.0 function
    /// library, `0.9-ml` the 1.0 one.
    pub fn level(self) -> u8 {
        match self {
            LanguageVersion::XQuery10 | LanguageVersion::MarkLogic09 => 10,
            LanguageVersion::XQuery30 | LanguageVersion::MarkLogic10 => 30,
            LanguageVersion::XQuery31 => 31,
            LanguageVersion::XQuery40 => 40,
        }
    }

    /// True when features introduced in `since` are available.
    pub fn supports(self, since: LanguageVersion) -> bool {
        self.level() >= since.level()
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" => Ok(LanguageVersion::XQuery10),
            "3.0" => Ok(LanguageVersion::XQuery30),
            "3.1" => Ok(LanguageVersion::XQuery31),
            "4.0" => Ok(LanguageVersion::XQuery40),
            "0.9-ml" => Ok(LanguageVersion::MarkLogic09),
            "1.0-ml" => Ok(LanguageVersion::MarkLogic10),
            other => Err(anyhow!("Unknown XQuery version: '{other}'")),
        }
    }
}

/// Query processor whose predefined namespaces and built-in functions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "vendor", rename_all = "lowercase")]
pub enum VendorProfile {
    #[default]
    W3C,
    /// MarkLogic server major version (6 through 10).
    MarkLogic { version: u8 },
    BaseX,
    Saxon,
    #[serde(rename = "exist-db")]
    ExistDb,
}

pub const MARKLOGIC_MIN_VERSION: u8 = 6;
pub const MARKLOGIC_MAX_VERSION: u8 = 10;

impl VendorProfile {
    pub fn marklogic(version: u8) -> Self {
        VendorProfile::MarkLogic {
            version: version.clamp(MARKLOGIC_MIN_VERSION, MARKLOGIC_MAX_VERSION),
        }
    }
}

impl fmt::Display for VendorProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorProfile::W3C => f.write_str("w3c"),
            VendorProfile::MarkLogic { version } => write!(f, "marklogic/v{version}"),
            VendorProfile::BaseX => f.write_str("basex"),
            VendorProfile::Saxon => f.write_str("saxon"),
            VendorProfile::ExistDb => f.write_str("exist-db"),
        }
    }
}

impl FromStr for VendorProfile {
    type Err = anyhow::Error;

    /// Accepts implementation identifiers such as `w3c`, `basex`,
    /// `marklogic` or `marklogic/v9`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (vendor, version) = match s.split_once('/') {
            Some((vendor, version)) => (vendor, Some(version)),
            None => (s.as_str(), None),
        };
        match vendor {
            "w3c" | "w3" => Ok(VendorProfile::W3C),
            "basex" => Ok(VendorProfile::BaseX),
            "saxon" => Ok(VendorProfile::Saxon),
            "exist-db" | "existdb" => Ok(VendorProfile::ExistDb),
            "marklogic" => {
                let version = match version {
                    Some(v) => v
                        .trim_start_matches('v')
                        .parse::<u8>()
                        .map_err(|_| anyhow!("Invalid MarkLogic version: '{v}'"))?,
                    None => MARKLOGIC_MAX_VERSION,
                };
                Ok(VendorProfile::marklogic(version))
            }
            other => Err(anyhow!("Unknown XQuery implementation: '{other}'")),
        }
    }
}

/// Version and vendor selection for a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DialectConfig {
    pub language_version: LanguageVersion,
    pub vendor_profile: VendorProfile,
}

impl DialectConfig {
    pub fn new(language_version: LanguageVersion, vendor_profile: VendorProfile) -> Self {
        Self {
            language_version,
            vendor_profile,
        }
    }

    /// MarkLogic profile with the `1.0-ml` dialect.
    pub fn marklogic(version: u8) -> Self {
        Self::new(LanguageVersion::MarkLogic10, VendorProfile::marklogic(version))
    }

    /// Read `{"version": "3.1", "implementation": "marklogic/v9"}` style
    /// settings. Missing or unrecognised keys keep their defaults.
    pub fn from_settings(settings: &serde_json::Value) -> Self {
        let mut config = Self::default();

        if let Some(v) = settings.get("implementation").and_then(|v| v.as_str()) {
            match v.parse() {
                Ok(profile) => config.vendor_profile = profile,
                Err(e) => log::warn!("Ignoring implementation setting: {e}"),
            }
        }
        if let Some(v) = settings.get("version").and_then(|v| v.as_str()) {
            match v.parse() {
                Ok(version) => config.language_version = version,
                Err(e) => log::warn!("Ignoring version setting: {e}"),
            }
        } else if matches!(config.vendor_profile, VendorProfile::MarkLogic { .. }) {
            config.language_version = LanguageVersion::MarkLogic10;
        }

        config
    }
}

impl fmt::Display for DialectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.vendor_profile, self.language_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_w3c_31() {
        let config = DialectConfig::default();
        assert_eq!(config.language_version, LanguageVersion::XQuery31);
        assert_eq!(config.vendor_profile, VendorProfile::W3C);
    }

    #[test]
    fn test_parse_implementation_strings() {
        assert_eq!("marklogic/v6".parse::<VendorProfile>().unwrap(), VendorProfile::MarkLogic { version: 6 });
        assert_eq!("MarkLogic".parse::<VendorProfile>().unwrap(), VendorProfile::MarkLogic { version: 10 });
        assert_eq!("marklogic/v99".parse::<VendorProfile>().unwrap(), VendorProfile::MarkLogic { version: 10 });
        assert_eq!("basex".parse::<VendorProfile>().unwrap(), VendorProfile::BaseX);
        assert!("marklogic/vX".parse::<VendorProfile>().is_err());
        assert!("zorba".parse::<VendorProfile>().is_err());
    }

    #[test]
    fn test_parse_versions() {
        assert_eq!("1.0-ml".parse::<LanguageVersion>().unwrap(), LanguageVersion::MarkLogic10);
        assert_eq!(" 4.0 ".parse::<LanguageVersion>().unwrap(), LanguageVersion::XQuery40);
        assert!("2.0".parse::<LanguageVersion>().is_err());
    }

    #[test]
    fn test_supports_orders_versions() {
        assert!(LanguageVersion::XQuery31.supports(LanguageVersion::XQuery30));
        assert!(!LanguageVersion::XQuery10.supports(LanguageVersion::XQuery30));
        assert!(LanguageVersion::MarkLogic10.supports(LanguageVersion::XQuery30));
        assert!(!LanguageVersion::MarkLogic09.supports(LanguageVersion::XQuery30));
    }

    #[test]
    fn test_from_settings_applies_present_keys() {
        let config = DialectConfig::from_settings(&json!({ "implementation": "marklogic/v8" }));
        assert_eq!(config, DialectConfig::marklogic(8));

        let config = DialectConfig::from_settings(&json!({ "version": "4.0" }));
        assert_eq!(config.language_version, LanguageVersion::XQuery40);
        assert_eq!(config.vendor_profile, VendorProfile::W3C);
    }

    #[test]
    fn test_from_settings_ignores_bad_values() {
        let config = DialectConfig::from_settings(&json!({ "version": 3, "implementation": "zorba" }));
        assert_eq!(config, DialectConfig::default());
    }

    #[test]
    fn test_display() {
        assert_eq!(DialectConfig::marklogic(9).to_string(), "marklogic/v9 (1.0-ml)");
    }
}
