// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use avaluo_app::{FetchFilters, ListingId, ListingStatus, PropertyCondition, RoadType, SubjectProperty};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "30s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub config_version: i64,
    #[serde(default)]
    pub gateway: Gateway,
    pub subject: Option<Subject>,
    #[serde(default)]
    pub filters: Filters,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            gateway: Gateway::default(),
            subject: None,
            filters: Filters::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Gateway {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub listing_id: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub beds: u32,
    pub baths: f64,
    pub sqft: u32,
    pub year_built: Option<i32>,
    pub garage_spaces: Option<u32>,
    pub pool: Option<bool>,
    pub road_type: Option<String>,
    pub condition: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filters {
    pub radius_miles: Option<f64>,
    pub price_tolerance_pct: Option<f64>,
    pub sqft_tolerance_pct: Option<f64>,
    pub year_tolerance_pct: Option<f64>,
    pub beds_min: Option<u32>,
    pub beds_max: Option<u32>,
    pub baths_min: Option<f64>,
    pub baths_max: Option<f64>,
    pub statuses: Option<Vec<String>>,
    pub months_back: Option<u32>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("AVALUO_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set AVALUO_CONFIG to the config file")
        })?;

        let app_dir = config_root.join("avaluo");
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("config_version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned; add `config_version = 1` and keep values under [gateway], [subject], and [filters]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected config_version = 1. Run `avaluo --init-config` for a fresh template",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.gateway.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "gateway.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(subject) = &self.subject {
            if subject.listing_id.trim().is_empty() {
                bail!("subject.listing_id in {} must not be empty", path.display());
            }
            if subject.sqft == 0 {
                bail!("subject.sqft in {} must be positive", path.display());
            }
            if let Some(raw) = &subject.road_type
                && RoadType::parse(raw).is_none()
            {
                bail!(
                    "subject.road_type {:?} in {} is not one of: busy, moderate, neighborhood, cul_de_sac, unknown",
                    raw,
                    path.display()
                );
            }
            if let Some(raw) = &subject.condition
                && PropertyCondition::parse(raw).is_none()
            {
                bail!(
                    "subject.condition {:?} in {} is not one of: distressed, dated, average, updated, renovated, unknown",
                    raw,
                    path.display()
                );
            }
        }

        if let Some(radius) = self.filters.radius_miles
            && radius <= 0.0
        {
            bail!(
                "filters.radius_miles in {} must be positive, got {}",
                path.display(),
                radius
            );
        }
        if let Some(months) = self.filters.months_back
            && months == 0
        {
            bail!("filters.months_back in {} must be at least 1", path.display());
        }
        if let Some(statuses) = &self.filters.statuses {
            for raw in statuses {
                if ListingStatus::parse(raw).is_none() {
                    bail!(
                        "filters.statuses entry {:?} in {} is not one of: closed, active, pending",
                        raw,
                        path.display()
                    );
                }
            }
        }

        Ok(())
    }

    pub fn gateway_endpoint(&self) -> Result<String> {
        if let Ok(value) = env::var("AVALUO_ENDPOINT")
            && !value.trim().is_empty()
        {
            return Ok(value);
        }
        self.gateway.endpoint.clone().ok_or_else(|| {
            anyhow!("no gateway endpoint configured; set gateway.endpoint or AVALUO_ENDPOINT, or run with --demo")
        })
    }

    pub fn gateway_token(&self) -> Result<String> {
        if let Ok(value) = env::var("AVALUO_TOKEN")
            && !value.trim().is_empty()
        {
            return Ok(value);
        }
        self.gateway.token.clone().ok_or_else(|| {
            anyhow!("no gateway token configured; set gateway.token or AVALUO_TOKEN, or run with --demo")
        })
    }

    pub fn gateway_timeout(&self) -> Result<Duration> {
        parse_duration(self.gateway.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn subject_property(&self) -> Result<SubjectProperty> {
        let subject = self.subject.as_ref().ok_or_else(|| {
            anyhow!("no [subject] section configured; add one (see --init-config) or run with --demo")
        })?;
        Ok(SubjectProperty {
            listing_id: ListingId::new(subject.listing_id.clone()),
            address: subject.address.clone(),
            city: subject.city.clone(),
            state: subject.state.clone(),
            beds: subject.beds,
            baths: subject.baths,
            sqft: subject.sqft,
            year_built: subject.year_built,
            garage_spaces: subject.garage_spaces.unwrap_or(0),
            pool: subject.pool.unwrap_or(false),
            road_type: subject
                .road_type
                .as_deref()
                .and_then(RoadType::parse)
                .unwrap_or(RoadType::Unknown),
            condition: subject
                .condition
                .as_deref()
                .and_then(PropertyCondition::parse)
                .unwrap_or(PropertyCondition::Unknown),
            latitude: subject.latitude,
            longitude: subject.longitude,
        })
    }

    pub fn fetch_filters(&self) -> FetchFilters {
        let defaults = FetchFilters::default();
        FetchFilters {
            radius_miles: self.filters.radius_miles.unwrap_or(defaults.radius_miles),
            price_tolerance_pct: self
                .filters
                .price_tolerance_pct
                .unwrap_or(defaults.price_tolerance_pct),
            sqft_tolerance_pct: self
                .filters
                .sqft_tolerance_pct
                .unwrap_or(defaults.sqft_tolerance_pct),
            year_tolerance_pct: self
                .filters
                .year_tolerance_pct
                .unwrap_or(defaults.year_tolerance_pct),
            beds_min: self.filters.beds_min,
            beds_max: self.filters.beds_max,
            baths_min: self.filters.baths_min,
            baths_max: self.filters.baths_max,
            statuses: match &self.filters.statuses {
                Some(raw) => raw
                    .iter()
                    .filter_map(|status| ListingStatus::parse(status))
                    .collect(),
                None => defaults.statuses,
            },
            months_back: self.filters.months_back.unwrap_or(defaults.months_back),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# avaluo config\n# Place this file at: {}\n\nconfig_version = 1\n\n[gateway]\n# The analysis service endpoint and shared token. Both may also come from\n# the AVALUO_ENDPOINT and AVALUO_TOKEN environment variables.\n# endpoint = \"https://example.test/wp-admin/admin-ajax.php\"\n# token = \"secret\"\ntimeout = \"{}\"\n\n[subject]\n# The property being valued.\nlisting_id = \"100001\"\naddress = \"123 Elm St\"\ncity = \"Austin\"\nstate = \"TX\"\nbeds = 3\nbaths = 2.0\nsqft = 1800\nyear_built = 1995\ngarage_spaces = 2\npool = false\n# One of: busy, moderate, neighborhood, cul_de_sac, unknown\nroad_type = \"neighborhood\"\n# One of: distressed, dated, average, updated, renovated, unknown\ncondition = \"average\"\n\n[filters]\nradius_miles = 1.0\nprice_tolerance_pct = 20.0\nsqft_tolerance_pct = 20.0\nyear_tolerance_pct = 10.0\n# statuses accepts: closed, active, pending\nstatuses = [\"closed\"]\nmonths_back = 6\n",
            path.display(),
            DEFAULT_TIMEOUT,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
