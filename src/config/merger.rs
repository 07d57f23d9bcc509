// In-place overrides applied by `pipeline(options)`

use crate::config::loader::{PipelineConfig, MAX_DEBUG_LEVEL};
use crate::models::{ErrorMode, ProviderKind};
use serde::{Deserialize, Serialize};

/// Partial pipeline configuration
/// Uses Option<T> for all fields so unset values leave the live config untouched
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    pub debug: Option<u8>,
    pub retries: Option<u32>,
    #[serde(rename = "budgetUSD", alias = "budget")]
    pub budget_usd: Option<f64>,
    pub session_id: Option<String>,
    pub cache: Option<bool>,
    #[serde(alias = "timeout")]
    pub timeout_ms: Option<u64>,
    #[serde(alias = "rateLimit")]
    pub rate_limit_ms: Option<u64>,
    pub fallback: Option<ProviderKind>,
    pub on_error: Option<ErrorMode>,
    pub dry_run: Option<bool>,
    pub keep_temp: Option<bool>,
    pub model: Option<String>,
}

impl PipelineOptions {
    /// Apply every set field onto `config`
    pub fn apply_to(&self, config: &mut PipelineConfig) {
        if let Some(level) = self.debug {
            config.debug_level = level.min(MAX_DEBUG_LEVEL);
        }
        if let Some(retries) = self.retries {
            config.retries = retries;
        }
        if let Some(budget) = self.budget_usd {
            config.budget_usd = budget;
        }
        if let Some(ref session_id) = self.session_id {
            config.session_id = session_id.clone();
        }
        if let Some(cache) = self.cache {
            config.cache_enabled = cache;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(rate_limit_ms) = self.rate_limit_ms {
            config.rate_limit_ms = rate_limit_ms;
        }
        if let Some(fallback) = self.fallback {
            config.fallback_provider = Some(fallback);
        }
        if let Some(on_error) = self.on_error {
            config.on_error = on_error;
        }
        if let Some(dry_run) = self.dry_run {
            config.dry_run = dry_run;
        }
        if let Some(keep_temp) = self.keep_temp {
            config.keep_temp = keep_temp;
        }
        if let Some(ref model) = self.model {
            config.default_model = Some(model.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_touches_set_fields() {
        let mut config = PipelineConfig::default();
        let session_id = config.session_id.clone();

        let options = PipelineOptions {
            retries: Some(1),
            cache: Some(true),
            ..Default::default()
        };
        options.apply_to(&mut config);

        assert_eq!(config.retries, 1);
        assert!(config.cache_enabled);
        assert_eq!(config.session_id, session_id);
        assert_eq!(config.timeout_ms, 300_000);
        assert_eq!(config.on_error, ErrorMode::Throw);
    }

    #[test]
    fn test_debug_level_is_clamped() {
        let mut config = PipelineConfig::default();
        PipelineOptions {
            debug: Some(10),
            ..Default::default()
        }
        .apply_to(&mut config);
        assert_eq!(config.debug_level, MAX_DEBUG_LEVEL);
    }

    #[test]
    fn test_deserialize_from_json_option_bag() {
        let options: PipelineOptions = serde_json::from_str(
            r#"{"retries": 3, "fallback": "codex", "onError": "fallback", "rateLimit": 500}"#,
        )
        .unwrap();
        assert_eq!(options.retries, Some(3));
        assert_eq!(options.fallback, Some(ProviderKind::Codex));
        assert_eq!(options.on_error, Some(ErrorMode::Fallback));
        assert_eq!(options.rate_limit_ms, Some(500));
    }
}
