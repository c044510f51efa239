// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use url::Url;

use avaluo_app::format::{parse_date, sanitize_text};
use avaluo_app::{
    AdjustmentLine, CharacteristicValue, CmaSession, ComparableAdjustment, ComparableProperty,
    ComparablesPayload, ConfidenceLabel, FetchFilters, Grade, ListingId, ListingStatus,
    MarketConditions, MarketContext, PropertyCondition, RoadType, ServerSummary, SessionDraft,
    SessionId, SessionSummaryRow, SubjectProperty, TrendPoint, ValueTrendPoint,
};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote failure classes, one per distinct recovery message. No call is
/// retried automatically; the user re-triggers the owning action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    RateLimited { retry_after: Option<u64> },
    SessionExpired,
    ServerUnavailable { status: u16 },
    Timeout,
    Network { detail: String },
    Rejected { message: String },
    Payload { detail: String },
}

impl GatewayError {
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited {
                retry_after: Some(seconds),
            } => format!("rate limited -- wait {seconds}s and try again"),
            Self::RateLimited { retry_after: None } => {
                "rate limited -- wait a moment and try again".to_owned()
            }
            Self::SessionExpired => "session expired -- sign in again and retry".to_owned(),
            Self::ServerUnavailable { status } => {
                format!("analysis service unavailable ({status}) -- try again shortly")
            }
            Self::Timeout => "request timed out -- narrow your filters and retry".to_owned(),
            Self::Network { .. } => {
                "cannot reach the analysis service -- check connectivity and retry".to_owned()
            }
            Self::Rejected { message } => message.clone(),
            Self::Payload { .. } => "unexpected response from the analysis service".to_owned(),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited {
                retry_after: Some(seconds),
            } => write!(f, "rate limited, retry after {seconds}s"),
            Self::RateLimited { retry_after: None } => f.write_str("rate limited"),
            Self::SessionExpired => f.write_str("session expired"),
            Self::ServerUnavailable { status } => write!(f, "server unavailable ({status})"),
            Self::Timeout => f.write_str("request timed out"),
            Self::Network { detail } => write!(f, "network failure: {detail}"),
            Self::Rejected { message } => write!(f, "request rejected: {message}"),
            Self::Payload { detail } => write!(f, "bad response payload: {detail}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Blocking client for the comparable-sales analysis service. Every call is
/// a form-encoded POST carrying an `action` name and the shared token, and
/// every response is a `{success, data}` envelope.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Url,
    token: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> anyhow::Result<Self> {
        if endpoint.trim().is_empty() {
            bail!("gateway.endpoint must not be empty");
        }
        if token.trim().is_empty() {
            bail!("gateway.token must not be empty");
        }
        let endpoint = Url::parse(endpoint.trim()).context("parse gateway endpoint")?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            endpoint,
            token: token.trim().to_owned(),
            timeout,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn fetch_comparables(
        &self,
        subject: &SubjectProperty,
        filters: &FetchFilters,
    ) -> GatewayResult<ComparablesPayload> {
        let mut params = vec![
            ("listing_id", subject.listing_id.as_str().to_owned()),
            ("address", subject.address.clone()),
            ("city", subject.city.clone()),
            ("state", subject.state.clone()),
            ("beds", subject.beds.to_string()),
            ("baths", subject.baths.to_string()),
            ("sqft", subject.sqft.to_string()),
            ("garage_spaces", subject.garage_spaces.to_string()),
            ("pool", subject.pool.to_string()),
            ("road_type", subject.road_type.as_str().to_owned()),
            ("property_condition", subject.condition.as_str().to_owned()),
            ("radius", float_param(filters.radius_miles)),
            ("price_tolerance", float_param(filters.price_tolerance_pct)),
            ("sqft_tolerance", float_param(filters.sqft_tolerance_pct)),
            ("year_tolerance", float_param(filters.year_tolerance_pct)),
            ("months_back", filters.months_back.to_string()),
            ("statuses", encode_statuses(&filters.statuses)),
        ];
        if let Some(year) = subject.year_built {
            params.push(("year_built", year.to_string()));
        }
        if let (Some(lat), Some(lon)) = (subject.latitude, subject.longitude) {
            params.push(("latitude", lat.to_string()));
            params.push(("longitude", lon.to_string()));
        }
        if let Some(value) = filters.beds_min {
            params.push(("beds_min", value.to_string()));
        }
        if let Some(value) = filters.beds_max {
            params.push(("beds_max", value.to_string()));
        }
        if let Some(value) = filters.baths_min {
            params.push(("baths_min", value.to_string()));
        }
        if let Some(value) = filters.baths_max {
            params.push(("baths_max", value.to_string()));
        }

        let payload: WireComparablesPayload = self.post_action("get_enhanced_comparables", params)?;
        Ok(payload.into_model())
    }

    pub fn fetch_single_adjustment(
        &self,
        listing_id: &ListingId,
        subject: &SubjectProperty,
    ) -> GatewayResult<ComparableAdjustment> {
        let subject_json = encode_json(subject)?;
        let params = vec![
            ("listing_id", listing_id.as_str().to_owned()),
            ("subject", subject_json),
        ];
        let wire: WireAdjustmentResult =
            self.post_action("get_single_comparable_adjustments", params)?;
        Ok(wire.into_model())
    }

    pub fn save_session(&self, draft: &SessionDraft) -> GatewayResult<SessionId> {
        let payload = encode_json(draft)?;
        let ack: WireSaveAck = self.post_action("mld_save_cma_session", vec![("payload", payload)])?;
        Ok(SessionId::new(ack.session_id))
    }

    pub fn load_session(&self, id: SessionId) -> GatewayResult<CmaSession> {
        let record: WireSessionRecord = self.post_action(
            "mld_load_cma_session",
            vec![("session_id", id.get().to_string())],
        )?;
        Ok(record.into_model())
    }

    pub fn list_sessions(&self, limit: u32) -> GatewayResult<Vec<SessionSummaryRow>> {
        let rows: Vec<WireSessionRow> =
            self.post_action("mld_list_cma_sessions", vec![("limit", limit.to_string())])?;
        Ok(rows.into_iter().map(WireSessionRow::into_model).collect())
    }

    pub fn delete_session(&self, id: SessionId) -> GatewayResult<()> {
        let _ack: serde_json::Value = self.post_action(
            "mld_delete_cma_session",
            vec![("session_id", id.get().to_string())],
        )?;
        Ok(())
    }

    pub fn toggle_favorite(&self, id: SessionId) -> GatewayResult<bool> {
        let data: serde_json::Value = self.post_action(
            "mld_toggle_cma_favorite",
            vec![("session_id", id.get().to_string())],
        )?;
        // The flag arrives bare from older deployments and nested from
        // newer ones.
        data.as_bool()
            .or_else(|| data.get("favorite").and_then(serde_json::Value::as_bool))
            .ok_or_else(|| GatewayError::Payload {
                detail: "favorite flag missing from response".to_owned(),
            })
    }

    pub fn market_conditions(
        &self,
        subject: &SubjectProperty,
        months: u32,
    ) -> GatewayResult<MarketConditions> {
        let params = vec![
            ("city", subject.city.clone()),
            ("state", subject.state.clone()),
            ("months", months.to_string()),
        ];
        let wire: WireMarketConditions = self.post_action("mld_get_market_conditions", params)?;
        Ok(wire.into_model())
    }

    pub fn value_trend(
        &self,
        listing_id: &ListingId,
        months: u32,
    ) -> GatewayResult<Vec<ValueTrendPoint>> {
        let params = vec![
            ("listing_id", listing_id.as_str().to_owned()),
            ("months", months.to_string()),
        ];
        let points: Vec<WireValuePoint> = self.post_action("mld_get_cma_value_trend", params)?;
        Ok(points
            .into_iter()
            .filter_map(WireValuePoint::into_model)
            .collect())
    }

    pub fn export_report(&self, draft: &SessionDraft) -> GatewayResult<String> {
        let payload = encode_json(draft)?;
        let data: serde_json::Value =
            self.post_action("mld_generate_cma_pdf", vec![("payload", payload)])?;
        data.as_str()
            .or_else(|| data.get("url").and_then(serde_json::Value::as_str))
            .map(str::to_owned)
            .ok_or_else(|| GatewayError::Payload {
                detail: "artifact url missing from response".to_owned(),
            })
    }

    pub fn push_characteristic(
        &self,
        listing_id: &ListingId,
        value: CharacteristicValue,
    ) -> GatewayResult<()> {
        let params = vec![
            ("listing_id", listing_id.as_str().to_owned()),
            ("field", value.field().as_str().to_owned()),
            ("value", value.as_str().to_owned()),
        ];
        let _ack: serde_json::Value = self.post_action("mld_update_characteristic", params)?;
        Ok(())
    }

    fn post_action<T: DeserializeOwned>(
        &self,
        action: &'static str,
        params: Vec<(&'static str, String)>,
    ) -> GatewayResult<T> {
        let mut form: Vec<(&'static str, String)> = Vec::with_capacity(params.len() + 2);
        form.push(("action", action.to_owned()));
        form.push(("token", self.token.clone()));
        form.extend(params);

        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .map_err(transport_error)?;

        let retry_after = retry_after_seconds(&response);
        if let Some(error) = status_error(response.status(), retry_after) {
            return Err(error);
        }

        let body = response.text().map_err(transport_error)?;
        decode_envelope(&body)
    }
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network {
            detail: error.to_string(),
        }
    }
}

fn status_error(status: StatusCode, retry_after: Option<u64>) -> Option<GatewayError> {
    match status.as_u16() {
        429 => Some(GatewayError::RateLimited { retry_after }),
        403 => Some(GatewayError::SessionExpired),
        504 => Some(GatewayError::Timeout),
        code if !status.is_success() => Some(GatewayError::ServerUnavailable { status: code }),
        _ => None,
    }
}

fn retry_after_seconds(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> GatewayResult<T> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|error| GatewayError::Payload {
        detail: error.to_string(),
    })?;
    if !envelope.success {
        return Err(GatewayError::Rejected {
            message: rejection_message(&envelope.data),
        });
    }
    serde_json::from_value(envelope.data).map_err(|error| GatewayError::Payload {
        detail: error.to_string(),
    })
}

// The failure payload is a bare string from some handlers and a
// `{message}` object from others. Both shapes are part of the contract.
fn rejection_message(data: &serde_json::Value) -> String {
    let raw = data
        .as_str()
        .or_else(|| data.get("message").and_then(serde_json::Value::as_str))
        .unwrap_or("");
    let cleaned = sanitize_text(raw);
    if cleaned.is_empty() {
        "the analysis service rejected the request".to_owned()
    } else {
        cleaned
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> GatewayResult<String> {
    serde_json::to_string(value).map_err(|error| GatewayError::Payload {
        detail: error.to_string(),
    })
}

fn encode_statuses(statuses: &[ListingStatus]) -> String {
    let names: Vec<&str> = statuses.iter().map(|status| status.as_str()).collect();
    serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_owned())
}

fn float_param(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn dollars_to_cents(dollars: f64) -> i64 {
    (dollars * 100.0).round() as i64
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireComparablesPayload {
    #[serde(default)]
    comparables: Vec<WireComparable>,
    summary: Option<WireServerSummary>,
    market_context: Option<WireMarketContext>,
}

impl WireComparablesPayload {
    fn into_model(self) -> ComparablesPayload {
        ComparablesPayload {
            comparables: self
                .comparables
                .into_iter()
                .map(WireComparable::into_model)
                .collect(),
            server_summary: self.summary.map(WireServerSummary::into_model),
            market_context: self.market_context.map(WireMarketContext::into_model),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireComparable {
    listing_id: ListingId,
    #[serde(default)]
    address: String,
    #[serde(default)]
    price: f64,
    adjusted_price: Option<f64>,
    #[serde(default)]
    adjustments: Vec<WireAdjustment>,
    grade: Option<String>,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    distance: f64,
    road_type: Option<String>,
    property_condition: Option<String>,
    #[serde(default)]
    beds: u32,
    #[serde(default)]
    baths: f64,
    #[serde(default)]
    sqft: u32,
    close_date: Option<String>,
    status: Option<String>,
    #[serde(default)]
    pool: bool,
}

impl WireComparable {
    fn into_model(self) -> ComparableProperty {
        let raw_cents = dollars_to_cents(self.price);
        let baseline_cents = self.adjusted_price.map(dollars_to_cents).unwrap_or(raw_cents);
        let grade = self
            .grade
            .as_deref()
            .and_then(Grade::parse)
            .unwrap_or(Grade::C);
        ComparableProperty {
            listing_id: self.listing_id,
            address: sanitize_text(&self.address),
            raw_price_cents: raw_cents,
            adjusted_price_cents: baseline_cents,
            baseline_adjusted_cents: baseline_cents,
            adjustments: self
                .adjustments
                .into_iter()
                .map(WireAdjustment::into_line)
                .collect(),
            grade,
            score: self.score,
            distance_miles: self.distance,
            weight: grade.base_weight(),
            weight_override: None,
            road_type: self
                .road_type
                .as_deref()
                .and_then(RoadType::parse)
                .unwrap_or(RoadType::Unknown),
            condition: self
                .property_condition
                .as_deref()
                .and_then(PropertyCondition::parse)
                .unwrap_or(PropertyCondition::Unknown),
            beds: self.beds,
            baths: self.baths,
            sqft: self.sqft,
            close_date: self.close_date.as_deref().and_then(|raw| parse_date(raw).ok()),
            status: self
                .status
                .as_deref()
                .and_then(ListingStatus::parse)
                .unwrap_or(ListingStatus::Closed),
            pool: self.pool,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAdjustment {
    #[serde(default)]
    feature: String,
    #[serde(default)]
    amount: f64,
    note: Option<String>,
}

impl WireAdjustment {
    fn into_line(self) -> AdjustmentLine {
        AdjustmentLine {
            feature: sanitize_text(&self.feature),
            delta_cents: dollars_to_cents(self.amount),
            explanation: sanitize_text(&self.note.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireServerSummary {
    #[serde(default)]
    low: f64,
    #[serde(default)]
    mid: f64,
    #[serde(default)]
    high: f64,
    confidence: Option<String>,
}

impl WireServerSummary {
    fn into_model(self) -> ServerSummary {
        ServerSummary {
            estimate_low_cents: dollars_to_cents(self.low),
            estimate_mid_cents: dollars_to_cents(self.mid),
            estimate_high_cents: dollars_to_cents(self.high),
            confidence: self
                .confidence
                .as_deref()
                .and_then(ConfidenceLabel::parse)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMarketContext {
    avg_days_on_market: Option<f64>,
    median_sale_price: Option<f64>,
    trend_direction: Option<String>,
}

impl WireMarketContext {
    fn into_model(self) -> MarketContext {
        MarketContext {
            avg_days_on_market: self.avg_days_on_market,
            median_sale_price_cents: self.median_sale_price.map(dollars_to_cents),
            trend_direction: self.trend_direction.map(|raw| sanitize_text(&raw)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireAdjustmentResult {
    listing_id: ListingId,
    #[serde(default)]
    adjusted_price: f64,
    #[serde(default)]
    adjustments: Vec<WireAdjustment>,
    #[serde(default)]
    score: f64,
    grade: Option<String>,
}

impl WireAdjustmentResult {
    fn into_model(self) -> ComparableAdjustment {
        ComparableAdjustment {
            listing_id: self.listing_id,
            adjusted_price_cents: dollars_to_cents(self.adjusted_price),
            adjustments: self
                .adjustments
                .into_iter()
                .map(WireAdjustment::into_line)
                .collect(),
            score: self.score,
            grade: self
                .grade
                .as_deref()
                .and_then(Grade::parse)
                .unwrap_or(Grade::C),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSaveAck {
    session_id: i64,
}

#[derive(Debug, Deserialize)]
struct WireSessionRecord {
    id: i64,
    name: String,
    #[serde(default)]
    description: String,
    saved_on: Option<String>,
    #[serde(default)]
    favorite: bool,
    payload: SessionDraft,
}

impl WireSessionRecord {
    fn into_model(self) -> CmaSession {
        CmaSession {
            id: SessionId::new(self.id),
            name: self.name,
            description: self.description,
            saved_on: self.saved_on.as_deref().and_then(|raw| parse_date(raw).ok()),
            favorite: self.favorite,
            standalone: self.payload.standalone,
            subject: self.payload.subject,
            arv_active: self.payload.arv_active,
            arv_original: self.payload.arv_original,
            filters: self.payload.filters,
            comparables: self.payload.comparables,
            summary: self.payload.summary,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSessionRow {
    id: i64,
    name: String,
    #[serde(default)]
    description: String,
    saved_on: Option<String>,
    #[serde(default)]
    favorite: bool,
    #[serde(default)]
    mid_estimate: f64,
    #[serde(default)]
    comparable_count: usize,
}

impl WireSessionRow {
    fn into_model(self) -> SessionSummaryRow {
        SessionSummaryRow {
            id: SessionId::new(self.id),
            name: sanitize_text(&self.name),
            description: sanitize_text(&self.description),
            saved_on: self.saved_on.as_deref().and_then(|raw| parse_date(raw).ok()),
            favorite: self.favorite,
            mid_estimate_cents: dollars_to_cents(self.mid_estimate),
            comparable_count: self.comparable_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMarketConditions {
    #[serde(default)]
    inventory: u32,
    #[serde(default)]
    avg_days_on_market: f64,
    #[serde(default)]
    list_to_sale_ratio: f64,
    #[serde(default)]
    trend: Vec<WireTrendPoint>,
}

impl WireMarketConditions {
    fn into_model(self) -> MarketConditions {
        MarketConditions {
            inventory: self.inventory,
            avg_days_on_market: self.avg_days_on_market,
            list_to_sale_ratio: self.list_to_sale_ratio,
            trend: self
                .trend
                .into_iter()
                .filter_map(WireTrendPoint::into_model)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireTrendPoint {
    month: String,
    #[serde(default)]
    median_price: f64,
}

impl WireTrendPoint {
    fn into_model(self) -> Option<TrendPoint> {
        let month = parse_date(&self.month).ok()?;
        Some(TrendPoint {
            month,
            median_price_cents: dollars_to_cents(self.median_price),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireValuePoint {
    date: String,
    #[serde(default)]
    estimate: f64,
}

impl WireValuePoint {
    fn into_model(self) -> Option<ValueTrendPoint> {
        let on = parse_date(&self.date).ok()?;
        Some(ValueTrendPoint {
            on,
            estimate_cents: dollars_to_cents(self.estimate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn envelope_success_decodes_payload() {
        let ack: WireSaveAck =
            decode_envelope(r#"{"success":true,"data":{"session_id":42}}"#).unwrap();
        assert_eq!(ack.session_id, 42);
    }

    #[test]
    fn envelope_failure_handles_string_shape() {
        let result: GatewayResult<WireSaveAck> =
            decode_envelope(r#"{"success":false,"data":"no comparables matched"}"#);
        assert_eq!(
            result.unwrap_err(),
            GatewayError::Rejected {
                message: "no comparables matched".to_owned()
            }
        );
    }

    #[test]
    fn envelope_failure_handles_object_shape() {
        let result: GatewayResult<WireSaveAck> =
            decode_envelope(r#"{"success":false,"data":{"message":"session not found"}}"#);
        assert_eq!(
            result.unwrap_err(),
            GatewayError::Rejected {
                message: "session not found".to_owned()
            }
        );
    }

    #[test]
    fn envelope_failure_without_message_gets_a_generic_line() {
        let result: GatewayResult<WireSaveAck> =
            decode_envelope(r#"{"success":false,"data":{"code":7}}"#);
        let GatewayError::Rejected { message } = result.unwrap_err() else {
            panic!("expected a rejection");
        };
        assert!(message.contains("rejected"));
    }

    #[test]
    fn envelope_garbage_is_a_payload_error() {
        let result: GatewayResult<WireSaveAck> = decode_envelope("<html>504</html>");
        assert!(matches!(result, Err(GatewayError::Payload { .. })));
    }

    #[test]
    fn dollars_convert_to_rounded_cents() {
        assert_eq!(dollars_to_cents(425_000.0), 42_500_000);
        assert_eq!(dollars_to_cents(99.99), 9_999);
        assert_eq!(dollars_to_cents(-5.5), -550);
        assert_eq!(dollars_to_cents(0.0), 0);
    }

    #[test]
    fn wire_comparable_converts_to_model() {
        let raw = r#"{
            "listing_id": 4207,
            "address": "12 Elm St",
            "price": 425000,
            "adjusted_price": 430500.5,
            "adjustments": [{"feature": "garage", "amount": 5500.5, "note": "one extra bay"}],
            "grade": "B",
            "score": 88.5,
            "distance": 0.4,
            "road_type": "busy",
            "property_condition": "dated",
            "beds": 3,
            "baths": 2.5,
            "sqft": 1710,
            "close_date": "2026-03-02",
            "status": "sold",
            "pool": true
        }"#;
        let wire: WireComparable = serde_json::from_str(raw).unwrap();
        let comp = wire.into_model();
        assert_eq!(comp.listing_id, ListingId::from("4207"));
        assert_eq!(comp.raw_price_cents, 42_500_000);
        assert_eq!(comp.adjusted_price_cents, 43_050_050);
        assert_eq!(comp.baseline_adjusted_cents, 43_050_050);
        assert_eq!(comp.adjustments[0].delta_cents, 550_050);
        assert_eq!(comp.grade, Grade::B);
        assert_eq!(comp.weight, Grade::B.base_weight());
        assert_eq!(comp.road_type, RoadType::Busy);
        assert_eq!(comp.condition, PropertyCondition::Dated);
        assert_eq!(comp.close_date, Some(date!(2026 - 03 - 02)));
        assert_eq!(comp.status, ListingStatus::Closed);
        assert!(comp.pool);
    }

    #[test]
    fn wire_comparable_defaults_odd_fields() {
        let raw = r#"{"listing_id": "A-9", "price": 100000, "close_date": "03/02/2026"}"#;
        let wire: WireComparable = serde_json::from_str(raw).unwrap();
        let comp = wire.into_model();
        assert_eq!(comp.grade, Grade::C);
        assert_eq!(comp.adjusted_price_cents, comp.raw_price_cents);
        assert_eq!(comp.road_type, RoadType::Unknown);
        assert_eq!(comp.condition, PropertyCondition::Unknown);
        assert_eq!(comp.close_date, None);
        assert_eq!(comp.status, ListingStatus::Closed);
    }

    #[test]
    fn statuses_encode_as_a_json_array() {
        assert_eq!(
            encode_statuses(&[ListingStatus::Closed, ListingStatus::Pending]),
            r#"["closed","pending"]"#
        );
        assert_eq!(encode_statuses(&[]), "[]");
    }

    #[test]
    fn status_codes_map_to_error_classes() {
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, Some(30)),
            Some(GatewayError::RateLimited {
                retry_after: Some(30)
            })
        );
        assert_eq!(
            status_error(StatusCode::FORBIDDEN, None),
            Some(GatewayError::SessionExpired)
        );
        assert_eq!(
            status_error(StatusCode::GATEWAY_TIMEOUT, None),
            Some(GatewayError::Timeout)
        );
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, None),
            Some(GatewayError::ServerUnavailable { status: 502 })
        );
        assert_eq!(status_error(StatusCode::OK, None), None);
    }

    #[test]
    fn user_messages_carry_the_remediation() {
        let limited = GatewayError::RateLimited {
            retry_after: Some(30),
        };
        assert!(limited.user_message().contains("30s"));
        assert!(GatewayError::Timeout.user_message().contains("narrow your filters"));
        assert!(
            GatewayError::SessionExpired
                .user_message()
                .contains("sign in again")
        );
        let network = GatewayError::Network {
            detail: "connection refused".to_owned(),
        };
        assert!(network.user_message().contains("connectivity"));
    }

    #[test]
    fn client_rejects_blank_configuration() {
        let timeout = Duration::from_secs(1);
        assert!(Client::new("", "secret", timeout).is_err());
        assert!(Client::new("http://example.test/gateway", " ", timeout).is_err());
        assert!(Client::new("not a url", "secret", timeout).is_err());
    }
}
