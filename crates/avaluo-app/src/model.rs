// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadType {
    Busy,
    Moderate,
    Neighborhood,
    CulDeSac,
    Unknown,
}

impl RoadType {
    pub const ALL: [Self; 5] = [
        Self::Busy,
        Self::Moderate,
        Self::Neighborhood,
        Self::CulDeSac,
        Self::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::Moderate => "moderate",
            Self::Neighborhood => "neighborhood",
            Self::CulDeSac => "cul_de_sac",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "busy" => Some(Self::Busy),
            "moderate" => Some(Self::Moderate),
            "neighborhood" => Some(Self::Neighborhood),
            "cul_de_sac" => Some(Self::CulDeSac),
            "unknown" | "" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Busy => "busy road",
            Self::Moderate => "moderate traffic",
            Self::Neighborhood => "neighborhood road",
            Self::CulDeSac => "cul-de-sac",
            Self::Unknown => "unknown",
        }
    }

    // Percentage-point offset used by the adjustment delta. Unknown carries
    // no value and always contributes zero.
    pub const fn value_offset(self) -> Option<f64> {
        match self {
            Self::Busy => Some(-5.0),
            Self::Moderate => Some(-2.0),
            Self::Neighborhood => Some(0.0),
            Self::CulDeSac => Some(3.0),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyCondition {
    Distressed,
    Dated,
    Average,
    Updated,
    Renovated,
    Unknown,
}

impl PropertyCondition {
    pub const ALL: [Self; 6] = [
        Self::Distressed,
        Self::Dated,
        Self::Average,
        Self::Updated,
        Self::Renovated,
        Self::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distressed => "distressed",
            Self::Dated => "dated",
            Self::Average => "average",
            Self::Updated => "updated",
            Self::Renovated => "renovated",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "distressed" => Some(Self::Distressed),
            "dated" => Some(Self::Dated),
            "average" => Some(Self::Average),
            "updated" => Some(Self::Updated),
            "renovated" => Some(Self::Renovated),
            "unknown" | "" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Distressed => "distressed",
            Self::Dated => "dated",
            Self::Average => "average",
            Self::Updated => "updated",
            Self::Renovated => "renovated",
            Self::Unknown => "unknown",
        }
    }

    pub const fn value_offset(self) -> Option<f64> {
        match self {
            Self::Distressed => Some(-12.0),
            Self::Dated => Some(-6.0),
            Self::Average => Some(0.0),
            Self::Updated => Some(6.0),
            Self::Renovated => Some(12.0),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Self; 5] = [Self::A, Self::B, Self::C, Self::D, Self::F];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            "C" | "c" => Some(Self::C),
            "D" | "d" => Some(Self::D),
            "F" | "f" => Some(Self::F),
            _ => None,
        }
    }

    pub const fn base_weight(self) -> f64 {
        match self {
            Self::A => 1.0,
            Self::B => 0.85,
            Self::C => 0.7,
            Self::D => 0.55,
            Self::F => 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Closed,
    Active,
    Pending,
}

impl ListingStatus {
    pub const ALL: [Self; 3] = [Self::Closed, Self::Active, Self::Pending];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Active => "active",
            Self::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "closed" | "sold" => Some(Self::Closed),
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuickFilter {
    GradeA,
    Nearby,
    Recent,
    Pool,
}

impl QuickFilter {
    pub const ALL: [Self; 4] = [Self::GradeA, Self::Nearby, Self::Recent, Self::Pool];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GradeA => "grade-a",
            Self::Nearby => "nearby",
            Self::Recent => "recent",
            Self::Pool => "pool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "grade-a" => Some(Self::GradeA),
            "nearby" => Some(Self::Nearby),
            "recent" => Some(Self::Recent),
            "pool" => Some(Self::Pool),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::GradeA => "grade A",
            Self::Nearby => "within 1 mi",
            Self::Recent => "closed 90d",
            Self::Pool => "pool",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    Similarity,
    PriceAsc,
    PriceDesc,
    Distance,
    DateDesc,
}

impl SortKey {
    pub const ALL: [Self; 5] = [
        Self::Similarity,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Distance,
        Self::DateDesc,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Distance => "distance",
            Self::DateDesc => "date_desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "similarity" => Some(Self::Similarity),
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "distance" => Some(Self::Distance),
            "date_desc" => Some(Self::DateDesc),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Similarity => "similarity",
            Self::PriceAsc => "price \u{2191}",
            Self::PriceDesc => "price \u{2193}",
            Self::Distance => "distance",
            Self::DateDesc => "newest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    High,
    Medium,
    #[default]
    Low,
}

impl ConfidenceLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "High" | "high" => Some(Self::High),
            "Medium" | "medium" => Some(Self::Medium),
            "Low" | "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacteristicField {
    RoadType,
    Condition,
}

impl CharacteristicField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RoadType => "road_type",
            Self::Condition => "property_condition",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "road_type" => Some(Self::RoadType),
            "property_condition" => Some(Self::Condition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharacteristicValue {
    Road(RoadType),
    Condition(PropertyCondition),
}

impl CharacteristicValue {
    pub const fn field(self) -> CharacteristicField {
        match self {
            Self::Road(_) => CharacteristicField::RoadType,
            Self::Condition(_) => CharacteristicField::Condition,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Road(value) => value.as_str(),
            Self::Condition(value) => value.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProperty {
    pub listing_id: ListingId,
    pub address: String,
    pub city: String,
    pub state: String,
    pub beds: u32,
    pub baths: f64,
    pub sqft: u32,
    pub year_built: Option<i32>,
    pub garage_spaces: u32,
    pub pool: bool,
    pub road_type: RoadType,
    pub condition: PropertyCondition,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SubjectProperty {
    // The fields an ARV scenario may override.
    pub fn same_arv_fields(&self, other: &Self) -> bool {
        self.beds == other.beds
            && self.baths == other.baths
            && self.sqft == other.sqft
            && self.year_built == other.year_built
            && self.garage_spaces == other.garage_spaces
            && self.pool == other.pool
            && self.condition == other.condition
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentLine {
    pub feature: String,
    pub delta_cents: i64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableProperty {
    pub listing_id: ListingId,
    pub address: String,
    pub raw_price_cents: i64,
    pub adjusted_price_cents: i64,
    pub baseline_adjusted_cents: i64,
    pub adjustments: Vec<AdjustmentLine>,
    pub grade: Grade,
    pub score: f64,
    pub distance_miles: f64,
    pub weight: f64,
    pub weight_override: Option<f64>,
    pub road_type: RoadType,
    pub condition: PropertyCondition,
    pub beds: u32,
    pub baths: f64,
    pub sqft: u32,
    pub close_date: Option<Date>,
    pub status: ListingStatus,
    pub pool: bool,
}

impl ComparableProperty {
    pub fn effective_weight(&self) -> f64 {
        self.weight_override.unwrap_or(self.weight)
    }

    pub fn price_per_sqft_cents(&self) -> Option<i64> {
        if self.sqft == 0 {
            return None;
        }
        Some(self.adjusted_price_cents / i64::from(self.sqft))
    }

    pub fn closed_within_days(&self, today: Date, days: i64) -> bool {
        let Some(close) = self.close_date else {
            return false;
        };
        let elapsed = today.to_julian_day() - close.to_julian_day();
        (0..=days).contains(&i64::from(elapsed))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFilters {
    pub radius_miles: f64,
    pub price_tolerance_pct: f64,
    pub sqft_tolerance_pct: f64,
    pub year_tolerance_pct: f64,
    pub beds_min: Option<u32>,
    pub beds_max: Option<u32>,
    pub baths_min: Option<f64>,
    pub baths_max: Option<f64>,
    pub statuses: Vec<ListingStatus>,
    pub months_back: u32,
}

impl Default for FetchFilters {
    fn default() -> Self {
        Self {
            radius_miles: 1.0,
            price_tolerance_pct: 20.0,
            sqft_tolerance_pct: 20.0,
            year_tolerance_pct: 10.0,
            beds_min: None,
            beds_max: None,
            baths_min: None,
            baths_max: None,
            statuses: vec![ListingStatus::Closed],
            months_back: 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub estimate_low_cents: i64,
    pub estimate_mid_cents: i64,
    pub estimate_high_cents: i64,
    pub confidence: ConfidenceLabel,
    pub confidence_score: f64,
    pub weighted_mean_cents: i64,
    pub unweighted_mean_cents: i64,
    pub median_raw_cents: i64,
    pub mean_raw_cents: i64,
    pub std_dev_cents: i64,
    pub ppsf_mean_cents: i64,
    pub ppsf_median_cents: i64,
    pub recent_sales: usize,
    pub selected_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedComparable {
    pub comparable: ComparableProperty,
    pub selected: bool,
    pub weight_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmaSession {
    pub id: SessionId,
    pub name: String,
    pub description: String,
    pub saved_on: Option<Date>,
    pub favorite: bool,
    pub standalone: bool,
    pub subject: SubjectProperty,
    pub arv_active: bool,
    pub arv_original: Option<SubjectProperty>,
    pub filters: FetchFilters,
    pub comparables: Vec<SavedComparable>,
    pub summary: SummaryStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummaryRow {
    pub id: SessionId,
    pub name: String,
    pub description: String,
    pub saved_on: Option<Date>,
    pub favorite: bool,
    pub mid_estimate_cents: i64,
    pub comparable_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub estimate_low_cents: i64,
    pub estimate_mid_cents: i64,
    pub estimate_high_cents: i64,
    pub confidence: ConfidenceLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: Date,
    pub median_price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConditions {
    pub inventory: u32,
    pub avg_days_on_market: f64,
    pub list_to_sale_ratio: f64,
    pub trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub avg_days_on_market: Option<f64>,
    pub median_sale_price_cents: Option<i64>,
    pub trend_direction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTrendPoint {
    pub on: Date,
    pub estimate_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparablesPayload {
    pub comparables: Vec<ComparableProperty>,
    pub server_summary: Option<ServerSummary>,
    pub market_context: Option<MarketContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableAdjustment {
    pub listing_id: ListingId,
    pub adjusted_price_cents: i64,
    pub adjustments: Vec<AdjustmentLine>,
    pub score: f64,
    pub grade: Grade,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn enum_round_trips() {
        for road in RoadType::ALL {
            assert_eq!(RoadType::parse(road.as_str()), Some(road));
        }
        for condition in PropertyCondition::ALL {
            assert_eq!(PropertyCondition::parse(condition.as_str()), Some(condition));
        }
        for grade in Grade::ALL {
            assert_eq!(Grade::parse(grade.as_str()), Some(grade));
        }
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_str()), Some(key));
        }
        for tag in QuickFilter::ALL {
            assert_eq!(QuickFilter::parse(tag.as_str()), Some(tag));
        }
    }

    #[test]
    fn unknown_characteristics_have_no_offset() {
        assert_eq!(RoadType::Unknown.value_offset(), None);
        assert_eq!(PropertyCondition::Unknown.value_offset(), None);
        assert_eq!(RoadType::Neighborhood.value_offset(), Some(0.0));
    }

    #[test]
    fn grade_weights_descend() {
        let weights: Vec<f64> = Grade::ALL.iter().map(|g| g.base_weight()).collect();
        for pair in weights.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn effective_weight_prefers_override() {
        let mut comp = sample_comparable();
        assert_eq!(comp.effective_weight(), comp.weight);
        comp.weight_override = Some(1.5);
        assert_eq!(comp.effective_weight(), 1.5);
        comp.weight_override = None;
        assert_eq!(comp.effective_weight(), comp.weight);
    }

    #[test]
    fn recency_window_is_ninety_days() {
        let mut comp = sample_comparable();
        let today = date!(2026 - 04 - 15);
        comp.close_date = Some(date!(2026 - 01 - 16));
        assert!(comp.closed_within_days(today, 90));
        comp.close_date = Some(date!(2026 - 01 - 14));
        assert!(!comp.closed_within_days(today, 90));
        comp.close_date = None;
        assert!(!comp.closed_within_days(today, 90));
    }

    fn sample_comparable() -> ComparableProperty {
        ComparableProperty {
            listing_id: ListingId::from(101),
            address: "12 Elm St".to_owned(),
            raw_price_cents: 50_000_000,
            adjusted_price_cents: 50_000_000,
            baseline_adjusted_cents: 50_000_000,
            adjustments: Vec::new(),
            grade: Grade::B,
            score: 88.0,
            distance_miles: 0.4,
            weight: Grade::B.base_weight(),
            weight_override: None,
            road_type: RoadType::Neighborhood,
            condition: PropertyCondition::Average,
            beds: 3,
            baths: 2.0,
            sqft: 1600,
            close_date: None,
            status: ListingStatus::Closed,
            pool: false,
        }
    }
}
