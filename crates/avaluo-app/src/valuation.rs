// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::Date;

use crate::model::*;

pub const RECENT_SALE_WINDOW_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacteristicDelta {
    pub road_cents: i64,
    pub condition_cents: i64,
}

impl CharacteristicDelta {
    pub const fn total(self) -> i64 {
        self.road_cents + self.condition_cents
    }
}

/// Signed delta moving a comparable's price toward what it would have sold
/// for with the subject's characteristics: a comparable better than the
/// subject adjusts downward. A characteristic contributes nothing unless
/// both sides carry a known classification.
pub fn characteristic_delta(
    comp: &ComparableProperty,
    subject: &SubjectProperty,
) -> CharacteristicDelta {
    CharacteristicDelta {
        road_cents: single_delta(
            comp.road_type.value_offset(),
            subject.road_type.value_offset(),
            comp.raw_price_cents,
        ),
        condition_cents: single_delta(
            comp.condition.value_offset(),
            subject.condition.value_offset(),
            comp.raw_price_cents,
        ),
    }
}

fn single_delta(comp_offset: Option<f64>, subject_offset: Option<f64>, base_cents: i64) -> i64 {
    let (Some(comp), Some(subject)) = (comp_offset, subject_offset) else {
        return 0;
    };
    (-((base_cents as f64) * (comp - subject) / 100.0)).round() as i64
}

/// Re-derives the adjusted price from the first-seen baseline and the
/// current characteristics, then rewrites the road/condition lines of the
/// breakdown. Always relative to the baseline, so repeated edits never
/// compound.
pub fn recompute_adjusted_price(comp: &mut ComparableProperty, subject: &SubjectProperty) {
    let delta = characteristic_delta(comp, subject);
    comp.adjusted_price_cents = comp.baseline_adjusted_cents + delta.total();

    comp.adjustments.retain(|line| {
        line.feature != CharacteristicField::RoadType.as_str()
            && line.feature != CharacteristicField::Condition.as_str()
    });
    if delta.road_cents != 0 {
        comp.adjustments.push(AdjustmentLine {
            feature: CharacteristicField::RoadType.as_str().to_owned(),
            delta_cents: delta.road_cents,
            explanation: format!(
                "{} vs {}",
                comp.road_type.label(),
                subject.road_type.label()
            ),
        });
    }
    if delta.condition_cents != 0 {
        comp.adjustments.push(AdjustmentLine {
            feature: CharacteristicField::Condition.as_str().to_owned(),
            delta_cents: delta.condition_cents,
            explanation: format!(
                "{} vs {}",
                comp.condition.label(),
                subject.condition.label()
            ),
        });
    }
}

/// Summary statistics over the selected subset. An empty subset is the
/// defined zero result, never an error.
pub fn compute_summary(selected: &[&ComparableProperty], today: Date) -> SummaryStatistics {
    if selected.is_empty() {
        return SummaryStatistics::default();
    }

    let count = selected.len();
    let adjusted: Vec<i64> = selected.iter().map(|c| c.adjusted_price_cents).collect();
    let raw: Vec<i64> = selected.iter().map(|c| c.raw_price_cents).collect();

    let unweighted_mean = mean(&adjusted);
    let mean_raw = mean(&raw);

    let total_weight: f64 = selected.iter().map(|c| c.effective_weight()).sum();
    let weighted_mean = if total_weight > 0.0 {
        let weighted_sum: f64 = selected
            .iter()
            .map(|c| (c.adjusted_price_cents as f64) * c.effective_weight())
            .sum();
        weighted_sum / total_weight
    } else {
        unweighted_mean
    };

    let median_adjusted = lower_median(&adjusted);
    let median_raw = lower_median(&raw);

    // Population deviation around the unweighted mean; the estimate band is
    // centered on the median with this width.
    let variance: f64 = adjusted
        .iter()
        .map(|&value| {
            let diff = (value as f64) - unweighted_mean;
            diff * diff
        })
        .sum::<f64>()
        / (count as f64);
    let std_dev = variance.sqrt();

    let confidence_score = if unweighted_mean > 0.0 {
        (100.0 - std_dev / unweighted_mean * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let confidence = if confidence_score >= 80.0 {
        ConfidenceLabel::High
    } else if confidence_score >= 60.0 {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    };

    let ppsf: Vec<i64> = selected
        .iter()
        .filter_map(|c| c.price_per_sqft_cents())
        .collect();
    let (ppsf_mean, ppsf_median) = if ppsf.is_empty() {
        (0, 0)
    } else {
        (mean(&ppsf).round() as i64, lower_median(&ppsf))
    };

    let recent_sales = selected
        .iter()
        .filter(|c| c.closed_within_days(today, RECENT_SALE_WINDOW_DAYS))
        .count();

    let std_dev_cents = std_dev.round() as i64;
    SummaryStatistics {
        estimate_low_cents: median_adjusted - std_dev_cents,
        estimate_mid_cents: median_adjusted,
        estimate_high_cents: median_adjusted + std_dev_cents,
        confidence,
        confidence_score,
        weighted_mean_cents: weighted_mean.round() as i64,
        unweighted_mean_cents: unweighted_mean.round() as i64,
        median_raw_cents: median_raw,
        mean_raw_cents: mean_raw.round() as i64,
        std_dev_cents,
        ppsf_mean_cents: ppsf_mean,
        ppsf_median_cents: ppsf_median,
        recent_sales,
        selected_count: count,
    }
}

fn mean(values: &[i64]) -> f64 {
    let sum: i64 = values.iter().sum();
    (sum as f64) / (values.len() as f64)
}

/// Lower median: element at index `n / 2` after an ascending sort. The two
/// middle values of an even-length list are never averaged.
fn lower_median(values: &[i64]) -> i64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ListingId;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 04 - 15);

    fn subject(road: RoadType, condition: PropertyCondition) -> SubjectProperty {
        SubjectProperty {
            listing_id: ListingId::from("S-1"),
            address: "400 Oak Ave".to_owned(),
            city: "Springfield".to_owned(),
            state: "IL".to_owned(),
            beds: 3,
            baths: 2.0,
            sqft: 1800,
            year_built: Some(1994),
            garage_spaces: 2,
            pool: false,
            road_type: road,
            condition,
            latitude: None,
            longitude: None,
        }
    }

    fn comparable(id: i64, adjusted: i64) -> ComparableProperty {
        ComparableProperty {
            listing_id: ListingId::from(id),
            address: format!("{id} Elm St"),
            raw_price_cents: adjusted,
            adjusted_price_cents: adjusted,
            baseline_adjusted_cents: adjusted,
            adjustments: Vec::new(),
            grade: Grade::A,
            score: 90.0,
            distance_miles: 0.5,
            weight: Grade::A.base_weight(),
            weight_override: None,
            road_type: RoadType::Neighborhood,
            condition: PropertyCondition::Average,
            beds: 3,
            baths: 2.0,
            sqft: 1800,
            close_date: Some(date!(2026 - 02 - 01)),
            status: ListingStatus::Closed,
            pool: false,
        }
    }

    #[test]
    fn unknown_subject_contributes_nothing() {
        let subject = subject(RoadType::Unknown, PropertyCondition::Unknown);
        let mut comp = comparable(101, 50_000_000);
        comp.road_type = RoadType::Busy;
        comp.condition = PropertyCondition::Renovated;

        recompute_adjusted_price(&mut comp, &subject);
        assert_eq!(comp.adjusted_price_cents, comp.baseline_adjusted_cents);
        assert!(comp.adjustments.is_empty());

        comp.road_type = RoadType::CulDeSac;
        recompute_adjusted_price(&mut comp, &subject);
        assert_eq!(comp.adjusted_price_cents, comp.baseline_adjusted_cents);
    }

    #[test]
    fn unknown_comparable_side_also_contributes_nothing() {
        let subject = subject(RoadType::Neighborhood, PropertyCondition::Average);
        let mut comp = comparable(101, 50_000_000);
        comp.road_type = RoadType::Unknown;
        comp.condition = PropertyCondition::Unknown;

        recompute_adjusted_price(&mut comp, &subject);
        assert_eq!(comp.adjusted_price_cents, comp.baseline_adjusted_cents);
    }

    #[test]
    fn better_comparable_adjusts_downward() {
        let subject = subject(RoadType::Neighborhood, PropertyCondition::Average);
        let mut comp = comparable(101, 50_000_000);
        comp.condition = PropertyCondition::Renovated;

        recompute_adjusted_price(&mut comp, &subject);
        // 12 points better on a $500,000 base.
        assert_eq!(comp.adjusted_price_cents, 50_000_000 - 6_000_000);
        assert_eq!(comp.adjustments.len(), 1);
        assert_eq!(comp.adjustments[0].feature, "property_condition");
        assert_eq!(comp.adjustments[0].delta_cents, -6_000_000);
    }

    #[test]
    fn repeated_recomputation_never_compounds() {
        let subject = subject(RoadType::Neighborhood, PropertyCondition::Average);
        let mut comp = comparable(101, 50_000_000);
        comp.road_type = RoadType::Busy;

        for _ in 0..5 {
            recompute_adjusted_price(&mut comp, &subject);
        }
        // 5 points worse: adjusted up once, not five times.
        assert_eq!(comp.adjusted_price_cents, 50_000_000 + 2_500_000);
        assert_eq!(comp.adjustments.len(), 1);
    }

    #[test]
    fn empty_selection_is_the_defined_zero_result() {
        let summary = compute_summary(&[], TODAY);
        assert_eq!(summary.estimate_low_cents, 0);
        assert_eq!(summary.estimate_mid_cents, 0);
        assert_eq!(summary.estimate_high_cents, 0);
        assert_eq!(summary.confidence, ConfidenceLabel::Low);
        assert_eq!(summary.confidence_score, 0.0);
        assert_eq!(summary.selected_count, 0);
    }

    #[test]
    fn median_is_the_lower_middle_element() {
        let comps = [
            comparable(1, 40_000_000),
            comparable(2, 30_000_000),
            comparable(3, 35_000_000),
            comparable(4, 32_000_000),
        ];
        let refs: Vec<&ComparableProperty> = comps.iter().collect();
        let summary = compute_summary(&refs, TODAY);
        assert_eq!(summary.estimate_mid_cents, 35_000_000);
    }

    #[test]
    fn estimate_band_is_centered_on_the_median() {
        let comps = [
            comparable(1, 49_500_000),
            comparable(2, 50_000_000),
            comparable(3, 51_000_000),
        ];
        let refs: Vec<&ComparableProperty> = comps.iter().collect();
        let summary = compute_summary(&refs, TODAY);
        assert_eq!(summary.estimate_mid_cents, 50_000_000);
        assert_eq!(
            summary.estimate_high_cents - summary.estimate_mid_cents,
            summary.std_dev_cents
        );
        assert_eq!(
            summary.estimate_mid_cents - summary.estimate_low_cents,
            summary.std_dev_cents
        );
    }

    #[test]
    fn clearing_an_override_restores_prior_summary() {
        let mut comps = [
            comparable(1, 48_000_000),
            comparable(2, 50_000_000),
            comparable(3, 53_000_000),
        ];
        let before = {
            let refs: Vec<&ComparableProperty> = comps.iter().collect();
            compute_summary(&refs, TODAY)
        };

        comps[1].weight_override = Some(2.5);
        let overridden = {
            let refs: Vec<&ComparableProperty> = comps.iter().collect();
            compute_summary(&refs, TODAY)
        };
        assert_ne!(overridden.weighted_mean_cents, before.weighted_mean_cents);

        comps[1].weight_override = None;
        let after = {
            let refs: Vec<&ComparableProperty> = comps.iter().collect();
            compute_summary(&refs, TODAY)
        };
        assert_eq!(after, before);
    }

    #[test]
    fn weighted_mean_tracks_effective_weights() {
        let mut heavy = comparable(1, 60_000_000);
        heavy.weight_override = Some(3.0);
        let light = comparable(2, 30_000_000);
        let refs: Vec<&ComparableProperty> = vec![&heavy, &light];
        let summary = compute_summary(&refs, TODAY);
        // (600k * 3 + 300k * 1) / 4 = 525k
        assert_eq!(summary.weighted_mean_cents, 52_500_000);
        assert_eq!(summary.unweighted_mean_cents, 45_000_000);
    }

    #[test]
    fn ppsf_ignores_missing_square_footage() {
        let mut no_sqft = comparable(1, 50_000_000);
        no_sqft.sqft = 0;
        let with_sqft = comparable(2, 36_000_000);
        let refs: Vec<&ComparableProperty> = vec![&no_sqft, &with_sqft];
        let summary = compute_summary(&refs, TODAY);
        assert_eq!(summary.ppsf_mean_cents, 20_000);
        assert_eq!(summary.ppsf_median_cents, 20_000);
    }

    #[test]
    fn recent_sales_span_ninety_days() {
        let mut fresh = comparable(1, 50_000_000);
        fresh.close_date = Some(date!(2026 - 03 - 01));
        let mut stale = comparable(2, 50_000_000);
        stale.close_date = Some(date!(2025 - 11 - 01));
        let mut unknown = comparable(3, 50_000_000);
        unknown.close_date = None;
        let refs: Vec<&ComparableProperty> = vec![&fresh, &stale, &unknown];
        let summary = compute_summary(&refs, TODAY);
        assert_eq!(summary.recent_sales, 1);
    }

    #[test]
    fn identical_prices_have_full_confidence() {
        let comps = [comparable(1, 50_000_000), comparable(2, 50_000_000)];
        let refs: Vec<&ComparableProperty> = comps.iter().collect();
        let summary = compute_summary(&refs, TODAY);
        assert_eq!(summary.confidence_score, 100.0);
        assert_eq!(summary.confidence, ConfidenceLabel::High);
        assert_eq!(summary.std_dev_cents, 0);
    }
}
