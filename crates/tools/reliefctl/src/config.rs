use relief_map::google::DEFAULT_ENDPOINT;
use relief_map::{HeightmapOptions, SamplerConfig};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for the reliefctl binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Google Maps API key used for elevation lookups.
    pub api_key: Option<String>,
    /// Elevation service endpoint.
    pub endpoint: String,
    /// Grid spacing, batch cap and pacing.
    pub sampler: SamplerConfig,
    /// Vertical scale and sea-level handling for meshes.
    pub heightmap: HeightmapOptions,
}

impl AppConfig {
    /// Builds a configuration from environment variables (and `.env`),
    /// falling back to the defaults the sampler ships with.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_key = lookup("GOOGLE_MAPS_API_KEY").filter(|k| !k.is_empty());
        let endpoint =
            lookup("RELIEF_ELEVATION_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let defaults = SamplerConfig::default();
        let sampler = SamplerConfig {
            spacing_km: parse_with(&lookup, "RELIEF_SAMPLE_SPACING_KM")
                .unwrap_or(defaults.spacing_km),
            max_batch_samples: parse_with(&lookup, "RELIEF_MAX_BATCH_SAMPLES")
                .unwrap_or(defaults.max_batch_samples),
            pacing: parse_with::<u64>(&lookup, "RELIEF_PACING_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing),
        };

        let defaults = HeightmapOptions::default();
        let heightmap = HeightmapOptions {
            scale: parse_with(&lookup, "RELIEF_SCALE").unwrap_or(defaults.scale),
            include_below_sea_level: lookup("RELIEF_INCLUDE_OCEAN_FLOOR")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.include_below_sea_level),
        };

        anyhow::ensure!(
            sampler.spacing_km > 0.0,
            "sample spacing must be > 0 km (got {})",
            sampler.spacing_km
        );
        anyhow::ensure!(sampler.max_batch_samples >= 1, "batch size must be >= 1");

        Ok(Self {
            api_key,
            endpoint,
            sampler,
            heightmap,
        })
    }
}

fn parse_with<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
