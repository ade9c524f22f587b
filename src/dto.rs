use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
    pub text: String,
}

/// Which member of a near-duplicate cluster survives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// Lowest insertion index in the cluster.
    First,
    /// Uniform choice drawn from the run-seeded generator.
    #[default]
    Random,
}

impl FromStr for KeepPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(KeepPolicy::First),
            "random" => Ok(KeepPolicy::Random),
            other => Err(format!("unknown keep policy '{other}' (expected 'first' or 'random')")),
        }
    }
}

impl fmt::Display for KeepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeepPolicy::First => f.write_str("first"),
            KeepPolicy::Random => f.write_str("random"),
        }
    }
}

fn default_seed() -> u64 {
    42
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyDedupConfig {
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub num_hashes: usize,
    pub num_bands: usize,
    pub ngram_length: usize,
    pub threshold: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub keep_policy: KeepPolicy,
    /// Drop documents failing the Gopher quality rules before deduplication
    #[serde(default)]
    pub gopher_filter: bool,
    /// Mask emails, phone numbers and IPv4 addresses before deduplication
    #[serde(default)]
    pub redact_pii: bool,
}

impl FuzzyDedupConfig {
    /// Rejects parameter combinations that would make the run meaningless.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.num_hashes == 0 {
            return Err(ServiceError::bad_config("num_hashes must be positive"));
        }
        if self.num_bands == 0 {
            return Err(ServiceError::bad_config("num_bands must be positive"));
        }
        if self.num_hashes % self.num_bands != 0 {
            return Err(ServiceError::bad_config(format!(
                "num_hashes ({}) must be divisible by num_bands ({})",
                self.num_hashes, self.num_bands
            )));
        }
        if self.ngram_length == 0 {
            return Err(ServiceError::bad_config("ngram_length must be positive"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ServiceError::bad_config(format!(
                "threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        if self.inputs.is_empty() {
            return Err(ServiceError::bad_config("no input documents given"));
        }
        Ok(())
    }

    pub fn band_size(&self) -> usize {
        self.num_hashes / self.num_bands
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDedupConfig {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

impl LineDedupConfig {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.inputs.is_empty() {
            return Err(ServiceError::bad_config("no input documents given"));
        }
        Ok(())
    }
}

/// One row of the cluster report.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClusterAssignment {
    pub id: String,
    pub cluster: usize,
    pub kept: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(num_hashes: usize, num_bands: usize, threshold: f64) -> FuzzyDedupConfig {
        FuzzyDedupConfig {
            inputs: vec![PathBuf::from("a.txt")],
            output_dir: PathBuf::from("out"),
            num_hashes,
            num_bands,
            ngram_length: 5,
            threshold,
            seed: 42,
            keep_policy: KeepPolicy::Random,
            gopher_filter: false,
            redact_pii: false,
        }
    }

    #[test]
    fn test_bands_must_divide_hashes() {
        let err = config(10, 3, 0.8).validate().unwrap_err();
        assert!(err.msg.contains("divisible"), "{}", err.msg);
        assert!(config(10, 5, 0.8).validate().is_ok());
    }

    #[test]
    fn test_threshold_range() {
        assert!(config(10, 5, 1.5).validate().is_err());
        assert!(config(10, 5, -0.1).validate().is_err());
        assert!(config(10, 5, f64::NAN).validate().is_err());
        assert!(config(10, 5, 0.0).validate().is_ok());
        assert!(config(10, 5, 1.0).validate().is_ok());
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let mut cfg = config(10, 5, 0.8);
        cfg.inputs.clear();
        assert!(cfg.validate().is_err());

        let lines = LineDedupConfig {
            inputs: vec![],
            output_dir: PathBuf::from("out"),
        };
        assert!(lines.validate().is_err());
    }

    #[test]
    fn test_config_file_defaults() {
        let cfg: FuzzyDedupConfig = serde_json::from_str(
            r#"{"outputDir": "out", "numHashes": 100, "numBands": 10, "ngramLength": 5, "threshold": 0.8}"#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.keep_policy, KeepPolicy::Random);
        assert_eq!(cfg.band_size(), 10);
        assert!(cfg.inputs.is_empty());
        assert!(!cfg.gopher_filter);
        assert!(!cfg.redact_pii);
    }

    #[test]
    fn test_keep_policy_parse() {
        assert_eq!("first".parse::<KeepPolicy>(), Ok(KeepPolicy::First));
        assert_eq!("random".parse::<KeepPolicy>(), Ok(KeepPolicy::Random));
        assert!("oldest".parse::<KeepPolicy>().is_err());
    }
}
