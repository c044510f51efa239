// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::format::{
    parse_optional_float, parse_optional_int, parse_optional_year, parse_required_float,
    parse_required_int,
};
use crate::model::{FetchFilters, ListingStatus, PropertyCondition, SubjectProperty};
use crate::workspace::ArvOverrides;

/// Editable text buffers for the fetch-filter form. Parsing happens on
/// submit; the buffers themselves accept anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterForm {
    pub radius: String,
    pub price_tolerance: String,
    pub sqft_tolerance: String,
    pub year_tolerance: String,
    pub beds_min: String,
    pub beds_max: String,
    pub baths_min: String,
    pub baths_max: String,
    pub months_back: String,
    pub statuses: Vec<ListingStatus>,
}

impl FilterForm {
    pub fn from_filters(filters: &FetchFilters) -> Self {
        Self {
            radius: trim_float(filters.radius_miles),
            price_tolerance: trim_float(filters.price_tolerance_pct),
            sqft_tolerance: trim_float(filters.sqft_tolerance_pct),
            year_tolerance: trim_float(filters.year_tolerance_pct),
            beds_min: filters.beds_min.map(|v| v.to_string()).unwrap_or_default(),
            beds_max: filters.beds_max.map(|v| v.to_string()).unwrap_or_default(),
            baths_min: filters.baths_min.map(trim_float).unwrap_or_default(),
            baths_max: filters.baths_max.map(trim_float).unwrap_or_default(),
            months_back: filters.months_back.to_string(),
            statuses: filters.statuses.clone(),
        }
    }

    pub fn toggle_status(&mut self, status: ListingStatus) {
        if let Some(position) = self.statuses.iter().position(|s| *s == status) {
            self.statuses.remove(position);
        } else {
            self.statuses.push(status);
        }
    }

    pub fn parse(&self) -> Result<FetchFilters> {
        let Ok(radius) = parse_required_float(&self.radius) else {
            bail!("search radius is invalid -- enter miles like 1.0 and retry");
        };
        if radius <= 0.0 {
            bail!("search radius must be positive -- enter miles like 1.0 and retry");
        }
        let Ok(price_tolerance) = parse_required_float(&self.price_tolerance) else {
            bail!("price tolerance is invalid -- enter a percentage like 20 and retry");
        };
        let Ok(sqft_tolerance) = parse_required_float(&self.sqft_tolerance) else {
            bail!("sqft tolerance is invalid -- enter a percentage like 20 and retry");
        };
        let Ok(year_tolerance) = parse_required_float(&self.year_tolerance) else {
            bail!("year tolerance is invalid -- enter a percentage like 10 and retry");
        };
        let Ok(beds_min) = parse_optional_int(&self.beds_min) else {
            bail!("minimum beds is invalid -- enter a whole number or leave blank");
        };
        let Ok(beds_max) = parse_optional_int(&self.beds_max) else {
            bail!("maximum beds is invalid -- enter a whole number or leave blank");
        };
        if let (Some(min), Some(max)) = (beds_min, beds_max)
            && min > max
        {
            bail!("bed range is inverted -- minimum beds must not exceed maximum");
        }
        let Ok(baths_min) = parse_optional_float(&self.baths_min) else {
            bail!("minimum baths is invalid -- enter a number or leave blank");
        };
        let Ok(baths_max) = parse_optional_float(&self.baths_max) else {
            bail!("maximum baths is invalid -- enter a number or leave blank");
        };
        if let (Some(min), Some(max)) = (baths_min, baths_max)
            && min > max
        {
            bail!("bath range is inverted -- minimum baths must not exceed maximum");
        }
        let Ok(months_back) = parse_required_int(&self.months_back) else {
            bail!("months back is invalid -- enter a whole number like 6 and retry");
        };
        if !(1..=60).contains(&months_back) {
            bail!("months back is out of range -- use a value between 1 and 60");
        }
        if self.statuses.is_empty() {
            bail!("no listing statuses chosen -- enable at least one status and retry");
        }

        Ok(FetchFilters {
            radius_miles: radius,
            price_tolerance_pct: price_tolerance,
            sqft_tolerance_pct: sqft_tolerance,
            year_tolerance_pct: year_tolerance,
            beds_min,
            beds_max,
            baths_min,
            baths_max,
            statuses: self.statuses.clone(),
            months_back,
        })
    }
}

/// Text buffers for the After-Repair-Value editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArvForm {
    pub beds: String,
    pub baths: String,
    pub sqft: String,
    pub year_built: String,
    pub garage_spaces: String,
    pub pool: bool,
    pub condition: PropertyCondition,
}

impl ArvForm {
    pub fn from_subject(subject: &SubjectProperty) -> Self {
        Self {
            beds: subject.beds.to_string(),
            baths: trim_float(subject.baths),
            sqft: subject.sqft.to_string(),
            year_built: subject
                .year_built
                .map(|v| v.to_string())
                .unwrap_or_default(),
            garage_spaces: subject.garage_spaces.to_string(),
            pool: subject.pool,
            condition: subject.condition,
        }
    }

    pub fn parse(&self) -> Result<ArvOverrides> {
        let Ok(beds) = parse_required_int(&self.beds) else {
            bail!("beds is invalid -- enter a whole number and retry");
        };
        let Ok(baths) = parse_required_float(&self.baths) else {
            bail!("baths is invalid -- enter a number like 2.5 and retry");
        };
        let Ok(sqft) = parse_required_int(&self.sqft) else {
            bail!("square footage is invalid -- enter a whole number and retry");
        };
        if sqft == 0 {
            bail!("square footage must be positive -- enter the finished area and retry");
        }
        let Ok(year_built) = parse_optional_year(&self.year_built) else {
            bail!("year built is invalid -- enter a year like 1994 or leave blank");
        };
        let Ok(garage_spaces) = parse_required_int(&self.garage_spaces) else {
            bail!("garage spaces is invalid -- enter a whole number and retry");
        };

        Ok(ArvOverrides {
            beds,
            baths,
            sqft,
            year_built,
            garage_spaces,
            pool: self.pool,
            condition: self.condition,
        })
    }
}

/// Buffers for the save-session form. An empty name is rejected before any
/// request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaveSessionForm {
    pub name: String,
    pub description: String,
    pub standalone: bool,
    pub update_current: bool,
}

impl SaveSessionForm {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("session name is required -- enter a name and retry");
        }
        if self.name.trim().len() > 120 {
            bail!("session name is too long -- keep it under 120 characters");
        }
        Ok(())
    }

    pub fn clean_name(&self) -> String {
        self.name.trim().to_owned()
    }

    pub fn clean_description(&self) -> String {
        self.description.trim().to_owned()
    }
}

fn trim_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
