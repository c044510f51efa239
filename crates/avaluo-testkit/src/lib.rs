// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{Date, Month};

use avaluo_app::valuation::compute_summary;
use avaluo_app::{
    AdjustmentLine, CmaSession, ComparableProperty, ComparablesPayload, ConfidenceLabel,
    FetchFilters, Grade, ListingId, ListingStatus, MarketConditions, MarketContext,
    PropertyCondition, RoadType, SavedComparable, ServerSummary, SessionId, SessionSummaryRow,
    SubjectProperty, TrendPoint, ValueTrendPoint,
};

const STREET_NAMES: [&str; 16] = [
    "Cedar", "Maple", "Oak", "Pine", "Willow", "Elm", "Birch", "Juniper", "Sunset", "Ridge",
    "Valley", "Lakeview", "Hillcrest", "Brookside", "Meadow", "Aspen",
];
const STREET_SUFFIXES: [&str; 5] = ["St", "Ave", "Ln", "Dr", "Ct"];

const MARKETS: [(&str, &str); 10] = [
    ("Austin", "TX"),
    ("Seattle", "WA"),
    ("Denver", "CO"),
    ("Madison", "WI"),
    ("Raleigh", "NC"),
    ("Pittsburgh", "PA"),
    ("Boise", "ID"),
    ("Nashville", "TN"),
    ("Columbus", "OH"),
    ("Tucson", "AZ"),
];

const SESSION_NAMES: [&str; 6] = [
    "spring flip",
    "oak street refi",
    "pre-listing check",
    "investor packet",
    "estate review",
    "summer comp set",
];

const ADJUSTMENT_FEATURES: [&str; 5] = ["garage", "sqft", "lot size", "age", "bath count"];
const TREND_DIRECTIONS: [&str; 3] = ["rising", "flat", "cooling"];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Deterministic fixture generator for comparable-sales data. The same seed
/// always produces the same subjects, comparables, and sessions.
#[derive(Debug, Clone)]
pub struct MarketFaker {
    rng: DeterministicRng,
}

impl MarketFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn subject(&mut self) -> SubjectProperty {
        let (city, state) = MARKETS[self.rng.int_n(MARKETS.len())];
        SubjectProperty {
            listing_id: ListingId::from(self.int_range_i64(1_000, 9_999)),
            address: self.street_address(),
            city: city.to_owned(),
            state: state.to_owned(),
            beds: self.int_range_i32(2, 5) as u32,
            baths: (self.int_range_i32(3, 8) as f64) / 2.0,
            sqft: self.int_range_i32(1_100, 3_200) as u32,
            year_built: Some(self.int_range_i32(1950, 2020)),
            garage_spaces: self.int_range_i32(0, 3) as u32,
            pool: self.int_range_i32(1, 10) <= 2,
            road_type: self.road_type(),
            condition: self.condition(),
            latitude: None,
            longitude: None,
        }
    }

    /// One comparable priced around the subject. Baseline and adjusted
    /// prices start equal; characteristic deltas are layered on later by
    /// the workspace.
    pub fn comparable(&mut self, subject: &SubjectProperty) -> ComparableProperty {
        let sqft = self.jitter_u32(subject.sqft, 20);
        let ppsf_cents = self.int_range_i64(18_000, 32_000);
        let raw_cents = ppsf_cents * i64::from(sqft);

        let score = self.int_range_i32(58, 98) as f64;
        let grade = grade_for_score(score);

        let mut adjustments = Vec::new();
        let mut adjusted_cents = raw_cents;
        for _ in 0..self.rng.int_n(4) {
            let feature = ADJUSTMENT_FEATURES[self.rng.int_n(ADJUSTMENT_FEATURES.len())];
            let magnitude = raw_cents / 100 * self.int_range_i64(1, 3);
            let delta = if self.rng.bool() { magnitude } else { -magnitude };
            adjusted_cents += delta;
            adjustments.push(AdjustmentLine {
                feature: feature.to_owned(),
                delta_cents: delta,
                explanation: format!("{feature} vs subject"),
            });
        }

        let status = if self.int_range_i32(1, 10) <= 8 {
            ListingStatus::Closed
        } else {
            ListingStatus::Pending
        };
        let close_date = if status == ListingStatus::Closed {
            Some(self.date_within_days(270))
        } else {
            None
        };

        ComparableProperty {
            listing_id: ListingId::from(self.int_range_i64(4_000, 9_999)),
            address: self.street_address(),
            raw_price_cents: raw_cents,
            adjusted_price_cents: adjusted_cents,
            baseline_adjusted_cents: adjusted_cents,
            adjustments,
            grade,
            score,
            distance_miles: (self.int_range_i32(1, 25) as f64) / 10.0,
            weight: grade.base_weight(),
            weight_override: None,
            road_type: self.road_type(),
            condition: self.condition(),
            beds: self.jitter_u32(subject.beds, 34).max(1),
            baths: (self.int_range_i32(3, 8) as f64) / 2.0,
            sqft,
            close_date,
            status,
            pool: self.int_range_i32(1, 10) <= 2,
        }
    }

    /// A batch with unique sequential listing ids.
    pub fn comparables(&mut self, subject: &SubjectProperty, count: usize) -> Vec<ComparableProperty> {
        (0..count)
            .map(|index| {
                let mut comp = self.comparable(subject);
                comp.listing_id = ListingId::from(4_200 + index as i64);
                comp
            })
            .collect()
    }

    /// A full fetch payload: comparables plus a server summary derived from
    /// them and a market context blurb.
    pub fn payload(&mut self, subject: &SubjectProperty, count: usize) -> ComparablesPayload {
        let comparables = self.comparables(subject, count);
        let server_summary = server_summary_for(&comparables);
        let market_context = MarketContext {
            avg_days_on_market: Some(self.int_range_i32(12, 60) as f64),
            median_sale_price_cents: server_summary.map(|summary| summary.estimate_mid_cents),
            trend_direction: Some(
                TREND_DIRECTIONS[self.rng.int_n(TREND_DIRECTIONS.len())].to_owned(),
            ),
        };
        ComparablesPayload {
            comparables,
            server_summary,
            market_context: Some(market_context),
        }
    }

    pub fn market_conditions(&mut self, months: u32) -> MarketConditions {
        let mut median_cents = self.int_range_i64(35_000_000, 55_000_000);
        let mut trend = Vec::with_capacity(months as usize);
        for age in (0..months).rev() {
            let drift = median_cents / 100 * self.int_range_i64(-2, 3);
            median_cents = (median_cents + drift).max(10_000_000);
            trend.push(TrendPoint {
                month: month_start(age),
                median_price_cents: median_cents,
            });
        }
        MarketConditions {
            inventory: self.int_range_i32(40, 220) as u32,
            avg_days_on_market: self.int_range_i32(12, 60) as f64,
            list_to_sale_ratio: (self.int_range_i32(93, 104) as f64) / 100.0,
            trend,
        }
    }

    pub fn value_trend(&mut self, months: u32) -> Vec<ValueTrendPoint> {
        let mut estimate_cents = self.int_range_i64(30_000_000, 60_000_000);
        let mut points = Vec::with_capacity(months as usize);
        for age in (0..months).rev() {
            let drift = estimate_cents / 1_000 * self.int_range_i64(-15, 15);
            estimate_cents = (estimate_cents + drift).max(5_000_000);
            points.push(ValueTrendPoint {
                on: month_start(age),
                estimate_cents,
            });
        }
        points
    }

    /// A saved session with grade A/B comparables selected and a summary
    /// computed from that selection.
    pub fn saved_session(&mut self, id: i64) -> CmaSession {
        let subject = self.subject();
        let comparables = self.comparables(&subject, 8);

        let saved: Vec<SavedComparable> = comparables
            .into_iter()
            .map(|comparable| {
                let selected = matches!(comparable.grade, Grade::A | Grade::B);
                SavedComparable {
                    comparable,
                    selected,
                    weight_override: None,
                }
            })
            .collect();

        let selected: Vec<&ComparableProperty> = saved
            .iter()
            .filter(|entry| entry.selected)
            .map(|entry| &entry.comparable)
            .collect();
        let summary = compute_summary(&selected, reference_today());

        let name = SESSION_NAMES[self.rng.int_n(SESSION_NAMES.len())];
        CmaSession {
            id: SessionId::new(id),
            name: name.to_owned(),
            description: format!("comp set for {}", subject.address),
            saved_on: Some(self.date_within_days(120)),
            favorite: self.int_range_i32(1, 10) <= 3,
            standalone: self.rng.bool(),
            subject,
            arv_active: false,
            arv_original: None,
            filters: FetchFilters::default(),
            comparables: saved,
            summary,
        }
    }

    pub fn session_rows(&mut self, count: usize) -> Vec<SessionSummaryRow> {
        (0..count)
            .map(|index| {
                let session = self.saved_session(index as i64 + 1);
                SessionSummaryRow {
                    id: session.id,
                    name: session.name,
                    description: session.description,
                    saved_on: session.saved_on,
                    favorite: session.favorite,
                    mid_estimate_cents: session.summary.estimate_mid_cents,
                    comparable_count: session.comparables.len(),
                }
            })
            .collect()
    }

    fn street_address(&mut self) -> String {
        format!(
            "{} {} {}",
            self.int_range_i32(100, 9_999),
            STREET_NAMES[self.rng.int_n(STREET_NAMES.len())],
            STREET_SUFFIXES[self.rng.int_n(STREET_SUFFIXES.len())],
        )
    }

    fn road_type(&mut self) -> RoadType {
        match self.int_range_i32(1, 10) {
            1 => RoadType::Busy,
            2 => RoadType::Moderate,
            3 => RoadType::CulDeSac,
            4 => RoadType::Unknown,
            _ => RoadType::Neighborhood,
        }
    }

    fn condition(&mut self) -> PropertyCondition {
        match self.int_range_i32(1, 10) {
            1 => PropertyCondition::Distressed,
            2 => PropertyCondition::Dated,
            3 => PropertyCondition::Updated,
            4 => PropertyCondition::Renovated,
            5 => PropertyCondition::Unknown,
            _ => PropertyCondition::Average,
        }
    }

    fn jitter_u32(&mut self, base: u32, percent: i32) -> u32 {
        let delta = self.int_range_i32(-percent, percent);
        let shifted = base as i64 + (i64::from(base) * i64::from(delta)) / 100;
        shifted.max(1) as u32
    }

    fn int_range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = i64::from(max) - i64::from(min) + 1;
        let offset = (self.rng.next_u64() % (span as u64)) as i64;
        (i64::from(min) + offset) as i32
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn date_within_days(&mut self, back: i64) -> Date {
        let today = reference_today();
        let offset = (self.rng.next_u64() % (back as u64 + 1)) as i64;
        Date::from_julian_day(today.to_julian_day() - offset as i32)
            .expect("offset date stays in range")
    }
}

pub fn grade_for_score(score: f64) -> Grade {
    if score >= 90.0 {
        Grade::A
    } else if score >= 80.0 {
        Grade::B
    } else if score >= 70.0 {
        Grade::C
    } else if score >= 60.0 {
        Grade::D
    } else {
        Grade::F
    }
}

pub fn reference_today() -> Date {
    Date::from_calendar_date(REFERENCE_YEAR, Month::August, 1).expect("valid reference date")
}

fn month_start(months_back: u32) -> Date {
    let total = (REFERENCE_YEAR * 12 + 7) - months_back as i32;
    let year = total.div_euclid(12);
    let month = Month::try_from((total.rem_euclid(12) + 1) as u8).expect("month index in range");
    Date::from_calendar_date(year, month, 1).expect("first of month is valid")
}

fn server_summary_for(comparables: &[ComparableProperty]) -> Option<ServerSummary> {
    if comparables.is_empty() {
        return None;
    }
    let mut prices: Vec<i64> = comparables
        .iter()
        .map(|comp| comp.adjusted_price_cents)
        .collect();
    prices.sort_unstable();
    let low = prices[0];
    let high = prices[prices.len() - 1];
    let mid = prices[prices.len() / 2];
    let spread = (high - low) as f64 / mid.max(1) as f64;
    let confidence = if spread < 0.15 {
        ConfidenceLabel::High
    } else if spread < 0.3 {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    };
    Some(ServerSummary {
        estimate_low_cents: low,
        estimate_mid_cents: mid,
        estimate_high_cents: high,
        confidence,
    })
}
