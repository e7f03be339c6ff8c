use super::types::{
    RawAbTestConfig, RawAdspendConfig, RawAttributionConfig, RawJourneyConfig, RawMetricsConfig,
    RawOptimizerConfig, RawWeights,
};
use adspend_core::PipelineConfig;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project), with an explicit file
    /// layered on top
    pub fn load_with(explicit: Option<&Path>) -> Result<PipelineConfig> {
        let mut raw = RawAdspendConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        // Layer 3: --config file
        if let Some(path) = explicit {
            raw = Self::merge_raw(raw, Self::read_raw(path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "adspend").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with ADSPEND_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("ADSPEND_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".adspend/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawAdspendConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawAdspendConfig, overlay: RawAdspendConfig) -> RawAdspendConfig {
        RawAdspendConfig {
            journey: RawJourneyConfig {
                lookback_days: overlay.journey.lookback_days.or(base.journey.lookback_days),
            },
            attribution: RawAttributionConfig {
                models: overlay.attribution.models.or(base.attribution.models),
                primary: overlay.attribution.primary.or(base.attribution.primary),
                half_life_days: overlay
                    .attribution
                    .half_life_days
                    .or(base.attribution.half_life_days),
            },
            metrics: RawMetricsConfig {
                weights: RawWeights {
                    roas: overlay.metrics.weights.roas.or(base.metrics.weights.roas),
                    conversion_rate: overlay
                        .metrics
                        .weights
                        .conversion_rate
                        .or(base.metrics.weights.conversion_rate),
                    ctr: overlay.metrics.weights.ctr.or(base.metrics.weights.ctr),
                    cost_efficiency: overlay
                        .metrics
                        .weights
                        .cost_efficiency
                        .or(base.metrics.weights.cost_efficiency),
                },
                window: overlay.metrics.window.or(base.metrics.window),
            },
            optimizer: RawOptimizerConfig {
                low_efficiency_threshold: overlay
                    .optimizer
                    .low_efficiency_threshold
                    .or(base.optimizer.low_efficiency_threshold),
                opportunity_threshold: overlay
                    .optimizer
                    .opportunity_threshold
                    .or(base.optimizer.opportunity_threshold),
                max_shift_pct: overlay
                    .optimizer
                    .max_shift_pct
                    .or(base.optimizer.max_shift_pct),
                recommendation_band_pct: overlay
                    .optimizer
                    .recommendation_band_pct
                    .or(base.optimizer.recommendation_band_pct),
            },
            abtest: RawAbTestConfig {
                significance_level: overlay
                    .abtest
                    .significance_level
                    .or(base.abtest.significance_level),
                power: overlay.abtest.power.or(base.abtest.power),
                minimum_detectable_effect: overlay
                    .abtest
                    .minimum_detectable_effect
                    .or(base.abtest.minimum_detectable_effect),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawAdspendConfig) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Some(days) = raw.journey.lookback_days {
            config.journey.lookback_days = days;
        }

        if let Some(models) = raw.attribution.models {
            config.attribution.models = models;
        }
        if let Some(primary) = raw.attribution.primary {
            config.attribution.primary = primary;
        }
        if let Some(half_life) = raw.attribution.half_life_days {
            config.attribution.half_life_days = half_life;
        }

        let weights = &mut config.metrics.weights;
        weights.roas = raw.metrics.weights.roas.unwrap_or(weights.roas);
        weights.conversion_rate = raw
            .metrics
            .weights
            .conversion_rate
            .unwrap_or(weights.conversion_rate);
        weights.ctr = raw.metrics.weights.ctr.unwrap_or(weights.ctr);
        weights.cost_efficiency = raw
            .metrics
            .weights
            .cost_efficiency
            .unwrap_or(weights.cost_efficiency);
        config.metrics.window = raw.metrics.window;

        let optimizer = &mut config.optimizer;
        let opt = raw.optimizer;
        optimizer.low_efficiency_threshold = opt
            .low_efficiency_threshold
            .unwrap_or(optimizer.low_efficiency_threshold);
        optimizer.opportunity_threshold = opt
            .opportunity_threshold
            .unwrap_or(optimizer.opportunity_threshold);
        optimizer.max_shift_pct = opt.max_shift_pct.unwrap_or(optimizer.max_shift_pct);
        optimizer.recommendation_band_pct = opt
            .recommendation_band_pct
            .unwrap_or(optimizer.recommendation_band_pct);

        let abtest = &mut config.abtest;
        abtest.significance_level = raw
            .abtest
            .significance_level
            .unwrap_or(abtest.significance_level);
        abtest.power = raw.abtest.power.unwrap_or(abtest.power);
        abtest.minimum_detectable_effect = raw
            .abtest
            .minimum_detectable_effect
            .unwrap_or(abtest.minimum_detectable_effect);

        config
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<PipelineConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(PipelineConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn raw(toml_str: &str) -> RawAdspendConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.toml");

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_from_valid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[journey]
lookback_days = 14

[metrics.weights]
roas = 0.6
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.journey.lookback_days, 14);
        assert_eq!(config.metrics.weights.roas, 0.6);
        assert_eq!(config.metrics.weights.ctr, 0.3);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.toml");

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let result = ConfigLoader::load_from_path(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_raw_overlay_overrides_base() {
        let base = raw(r#"
[optimizer]
max_shift_pct = 0.2
low_efficiency_threshold = 0.25

[attribution]
models = ["linear"]
"#);
        let overlay = raw(r#"
[optimizer]
max_shift_pct = 0.3

[attribution]
primary = "last_touch"
"#);

        let merged = ConfigLoader::merge_raw(base, overlay);

        assert_eq!(merged.optimizer.max_shift_pct, Some(0.3));
        // overlay's None falls through to base value via .or()
        assert_eq!(merged.optimizer.low_efficiency_threshold, Some(0.25));
        assert_eq!(merged.attribution.models, Some(vec!["linear".to_string()]));
        assert_eq!(merged.attribution.primary.as_deref(), Some("last_touch"));
    }

    #[test]
    fn test_finalize_applies_defaults() {
        let config = ConfigLoader::finalize(raw("[abtest]\npower = 0.9\n"));

        assert_eq!(config.abtest.power, 0.9);
        assert_eq!(config.abtest.significance_level, 0.05);
        assert_eq!(config.optimizer, PipelineConfig::default().optimizer);
    }

    #[test]
    fn test_user_config_path_returns_some() {
        let path = ConfigLoader::user_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("adspend"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_project_config_path() {
        let path = ConfigLoader::project_config_path();
        assert_eq!(path, PathBuf::from(".adspend/config.toml"));
    }
}
