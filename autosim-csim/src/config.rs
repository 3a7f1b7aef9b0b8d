use std::path::PathBuf;

use autosim::{Configurable, GlobalConfig, SimConfig};
use serde::Deserialize;

/// Configuration file layout.
///
/// The simulation sections sit at the top level next to the daemon sections.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(flatten)]
    pub sim: SimConfig,
    pub codes: CodeSourceConfig,
    pub publish: PublishConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CodeSourceConfig {
    /// File listing the known diagnostic trouble codes.
    pub catalog: PathBuf,
    /// File with code descriptions.
    pub descriptions: Option<PathBuf>,
}

impl Default for CodeSourceConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("dtc_codes.csv"),
            descriptions: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Collector address to stream readings to.
    pub collector: Option<String>,
    /// ThingSpeak write API key.
    pub thingspeak_key: Option<String>,
    /// ThingSpeak API base address.
    pub thingspeak_url: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            collector: None,
            thingspeak_key: None,
            thingspeak_url: crate::thingspeak::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CsimConfig {
    /// Simulation configuration.
    pub sim: SimConfig,
    /// Code sources.
    pub codes: CodeSourceConfig,
    /// Reading sinks.
    pub publish: PublishConfig,
    /// Global configuration.
    pub global: GlobalConfig,
}

impl From<FileConfig> for CsimConfig {
    fn from(file: FileConfig) -> Self {
        Self {
            sim: file.sim,
            codes: file.codes,
            publish: file.publish,
            global: GlobalConfig::default(),
        }
    }
}

impl Configurable for CsimConfig {
    fn global(&self) -> &GlobalConfig {
        &self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file() {
        let config: FileConfig = toml::from_str("").unwrap();

        assert_eq!(config.sim, SimConfig::default());
        assert_eq!(config.codes.catalog, PathBuf::from("dtc_codes.csv"));
        assert_eq!(config.publish.collector, None);
        assert_eq!(config.publish.thingspeak_url, "https://api.thingspeak.com");
    }

    #[test]
    fn test_full_file() {
        let config: FileConfig = toml::from_str(
            r#"
            [trip]
            interval = 1000
            realtime = false

            [fault]
            probability = 0.0

            [codes]
            catalog = "/etc/autosim/codes.csv"
            descriptions = "/etc/autosim/descriptions.csv"

            [publish]
            collector = "127.0.0.1:30061"
            "#,
        )
        .unwrap();

        let config = CsimConfig::from(config);

        assert_eq!(config.sim.trip.interval, 1_000);
        assert!(!config.sim.trip.realtime);
        assert_eq!(config.sim.fault.probability, 0.0);
        assert_eq!(
            config.codes.descriptions,
            Some(PathBuf::from("/etc/autosim/descriptions.csv"))
        );
        assert_eq!(config.publish.collector.as_deref(), Some("127.0.0.1:30061"));
        assert!(!config.global.daemon);
    }
}
