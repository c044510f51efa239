// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::collections::BTreeSet;

use time::Date;

use crate::ids::*;
use crate::model::*;
use crate::valuation::{RECENT_SALE_WINDOW_DAYS, compute_summary, recompute_adjusted_price};

pub const PAGE_SIZE: usize = 20;
pub const NEARBY_RADIUS_MILES: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoSession,
    Loaded(SessionId),
    Modified(SessionId),
    Saved(SessionId),
    RerunInProgress(SessionId),
}

impl SessionPhase {
    pub const fn session_id(self) -> Option<SessionId> {
        match self {
            Self::NoSession => None,
            Self::Loaded(id)
            | Self::Modified(id)
            | Self::Saved(id)
            | Self::RerunInProgress(id) => Some(id),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NoSession => "no session",
            Self::Loaded(_) => "loaded",
            Self::Modified(_) => "modified",
            Self::Saved(_) => "saved",
            Self::RerunInProgress(_) => "rerun…",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacteristicTarget {
    Subject,
    Comparable(ListingId),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArvState {
    pub active: bool,
    pub original: Option<SubjectProperty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArvOverrides {
    pub beds: u32,
    pub baths: f64,
    pub sqft: u32,
    pub year_built: Option<i32>,
    pub garage_spaces: u32,
    pub pool: bool,
    pub condition: PropertyCondition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    pub id: SessionId,
    pub name: String,
    pub saved_mid_cents: i64,
    pub filters: FetchFilters,
}

/// What to do with selection and overrides when a fresh comparable list
/// arrives.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectionPlan {
    /// Select every grade A/B comparable; overrides start empty.
    #[default]
    GradeDefault,
    /// Re-match the current selection and overrides by id; absentees drop
    /// silently.
    Preserve,
    /// Re-match a saved session's selection and overrides by id.
    Restore {
        selected: Vec<ListingId>,
        overrides: Vec<(ListingId, f64)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceCommand {
    ToggleSelection(ListingId),
    SetWeightOverride(ListingId, Option<f64>),
    SetCharacteristic(CharacteristicTarget, CharacteristicValue),
    ToggleQuickFilter(QuickFilter),
    ApplySort(SortKey),
    NextPage,
    PrevPage,
    ApplyArv(ArvOverrides),
    ResetArv,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceEvent {
    SelectionChanged(ListingId),
    SummaryChanged,
    ComparisonChanged,
    CardChanged(ListingId),
    ComparablesChanged,
    FilterChanged,
    SortChanged(SortKey),
    PageChanged(usize),
    PersistCharacteristic(CharacteristicTarget, CharacteristicValue),
    ArvChanged(bool),
    SessionPhaseChanged(SessionPhase),
    StatusUpdated(String),
    StatusCleared,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceState {
    pub subject: SubjectProperty,
    pub filters: FetchFilters,
    pub comparables: Vec<ComparableProperty>,
    pub selection: BTreeSet<ListingId>,
    pub active_filters: BTreeSet<QuickFilter>,
    pub sort: SortKey,
    pub page: usize,
    pub summary: SummaryStatistics,
    pub market_context: Option<MarketContext>,
    pub server_summary: Option<ServerSummary>,
    pub phase: SessionPhase,
    pub loaded: Option<LoadedSession>,
    pub rerun_delta_cents: Option<i64>,
    pub arv: ArvState,
    pub today: Date,
    pub status_line: Option<String>,
    in_flight: Option<u64>,
    next_fetch_token: u64,
    pending_plan: SelectionPlan,
}

impl WorkspaceState {
    pub fn new(subject: SubjectProperty, filters: FetchFilters, today: Date) -> Self {
        Self {
            subject,
            filters,
            comparables: Vec::new(),
            selection: BTreeSet::new(),
            active_filters: BTreeSet::new(),
            sort: SortKey::Similarity,
            page: 0,
            summary: SummaryStatistics::default(),
            market_context: None,
            server_summary: None,
            phase: SessionPhase::NoSession,
            loaded: None,
            rerun_delta_cents: None,
            arv: ArvState::default(),
            today,
            status_line: None,
            in_flight: None,
            next_fetch_token: 0,
            pending_plan: SelectionPlan::GradeDefault,
        }
    }

    pub fn dispatch(&mut self, command: WorkspaceCommand) -> Vec<WorkspaceEvent> {
        match command {
            WorkspaceCommand::ToggleSelection(id) => self.toggle_selection(id),
            WorkspaceCommand::SetWeightOverride(id, value) => self.set_weight_override(id, value),
            WorkspaceCommand::SetCharacteristic(target, value) => {
                self.set_characteristic(target, value)
            }
            WorkspaceCommand::ToggleQuickFilter(tag) => {
                if !self.active_filters.remove(&tag) {
                    self.active_filters.insert(tag);
                }
                self.page = 0;
                vec![WorkspaceEvent::FilterChanged, WorkspaceEvent::PageChanged(0)]
            }
            WorkspaceCommand::ApplySort(key) => {
                self.sort = key;
                self.page = 0;
                vec![
                    WorkspaceEvent::SortChanged(key),
                    WorkspaceEvent::PageChanged(0),
                ]
            }
            WorkspaceCommand::NextPage => {
                if self.page + 1 < self.page_count() {
                    self.page += 1;
                    vec![WorkspaceEvent::PageChanged(self.page)]
                } else {
                    Vec::new()
                }
            }
            WorkspaceCommand::PrevPage => {
                if self.page > 0 {
                    self.page -= 1;
                    vec![WorkspaceEvent::PageChanged(self.page)]
                } else {
                    Vec::new()
                }
            }
            WorkspaceCommand::ApplyArv(overrides) => self.apply_arv(overrides),
            WorkspaceCommand::ResetArv => self.reset_arv(),
            WorkspaceCommand::SetStatus(message) => vec![self.set_status(&message)],
            WorkspaceCommand::ClearStatus => {
                self.status_line = None;
                vec![WorkspaceEvent::StatusCleared]
            }
        }
    }

    // ---- fetch guard ----------------------------------------------------

    /// Claims the single fetch slot. Returns the token to tag the fetch
    /// with, or None when a fetch is already outstanding (the request is
    /// dropped, not queued).
    pub fn begin_fetch(&mut self, plan: SelectionPlan) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        self.next_fetch_token = self.next_fetch_token.saturating_add(1);
        if self.next_fetch_token == 0 {
            self.next_fetch_token = 1;
        }
        self.in_flight = Some(self.next_fetch_token);
        self.pending_plan = plan;
        Some(self.next_fetch_token)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replaces the comparable pool from a completed fetch. A token that is
    /// not the outstanding one identifies a stale response and is ignored.
    pub fn ingest_comparables(
        &mut self,
        token: u64,
        payload: ComparablesPayload,
    ) -> Vec<WorkspaceEvent> {
        if self.in_flight != Some(token) {
            return Vec::new();
        }
        self.in_flight = None;

        let plan = std::mem::take(&mut self.pending_plan);
        let (keep_selected, keep_overrides) = match plan {
            SelectionPlan::GradeDefault => (None, Vec::new()),
            SelectionPlan::Preserve => {
                let selected: Vec<ListingId> = self.selection.iter().cloned().collect();
                let overrides: Vec<(ListingId, f64)> = self
                    .comparables
                    .iter()
                    .filter_map(|c| c.weight_override.map(|w| (c.listing_id.clone(), w)))
                    .collect();
                (Some(selected), overrides)
            }
            SelectionPlan::Restore {
                selected,
                overrides,
            } => (Some(selected), overrides),
        };

        self.comparables = payload.comparables;
        self.market_context = payload.market_context;
        self.server_summary = payload.server_summary;

        self.selection = match keep_selected {
            None => self
                .comparables
                .iter()
                .filter(|c| matches!(c.grade, Grade::A | Grade::B))
                .map(|c| c.listing_id.clone())
                .collect(),
            Some(saved) => {
                let live: BTreeSet<&ListingId> =
                    self.comparables.iter().map(|c| &c.listing_id).collect();
                saved
                    .into_iter()
                    .filter(|id| live.contains(id))
                    .collect()
            }
        };
        for (id, weight) in keep_overrides {
            if let Some(comp) = self.comparables.iter_mut().find(|c| c.listing_id == id) {
                comp.weight_override = Some(weight);
            }
        }

        for comp in &mut self.comparables {
            recompute_adjusted_price(comp, &self.subject);
        }
        self.recompute_summary();
        self.page = 0;

        let mut events = vec![
            WorkspaceEvent::ComparablesChanged,
            WorkspaceEvent::SummaryChanged,
        ];
        if let SessionPhase::RerunInProgress(id) = self.phase {
            let saved_mid = self.loaded.as_ref().map_or(0, |s| s.saved_mid_cents);
            let delta = self.summary.estimate_mid_cents - saved_mid;
            self.rerun_delta_cents = Some(delta);
            self.phase = SessionPhase::Modified(id);
            events.push(WorkspaceEvent::SessionPhaseChanged(self.phase));
            events.push(self.set_status(&format!(
                "rerun complete: estimate moved {}",
                crate::format::format_signed_dollars(delta)
            )));
        } else {
            events.push(self.set_status(&format!(
                "{} comparables loaded",
                self.comparables.len()
            )));
        }
        events
    }

    /// Records a failed fetch. Stale failures are ignored the same way as
    /// stale completions.
    pub fn fail_fetch(&mut self, token: u64, message: &str) -> Vec<WorkspaceEvent> {
        if self.in_flight != Some(token) {
            return Vec::new();
        }
        self.in_flight = None;
        self.pending_plan = SelectionPlan::GradeDefault;
        let mut events = Vec::new();
        if let SessionPhase::RerunInProgress(id) = self.phase {
            self.phase = SessionPhase::Modified(id);
            events.push(WorkspaceEvent::SessionPhaseChanged(self.phase));
        }
        events.push(self.set_status(message));
        events
    }

    // ---- session phase --------------------------------------------------

    pub fn session_loaded(
        &mut self,
        id: SessionId,
        name: &str,
        saved_mid_cents: i64,
        filters: FetchFilters,
    ) -> Vec<WorkspaceEvent> {
        self.phase = SessionPhase::Loaded(id);
        self.loaded = Some(LoadedSession {
            id,
            name: name.to_owned(),
            saved_mid_cents,
            filters,
        });
        self.rerun_delta_cents = None;
        vec![
            WorkspaceEvent::SessionPhaseChanged(self.phase),
            self.set_status(&format!("session '{name}' loaded")),
        ]
    }

    pub fn session_saved(&mut self, id: SessionId, name: &str) -> Vec<WorkspaceEvent> {
        self.phase = SessionPhase::Saved(id);
        self.loaded = Some(LoadedSession {
            id,
            name: name.to_owned(),
            saved_mid_cents: self.summary.estimate_mid_cents,
            filters: self.filters.clone(),
        });
        vec![
            WorkspaceEvent::SessionPhaseChanged(self.phase),
            self.set_status(&format!("session '{name}' saved")),
        ]
    }

    /// Starts a rerun of the loaded session: clears curation, restores the
    /// saved filters, and hands back the filters for the fresh fetch. The
    /// caller claims the fetch slot itself.
    pub fn start_rerun(&mut self) -> Option<(FetchFilters, Vec<WorkspaceEvent>)> {
        let id = self.phase.session_id()?;
        let saved = self.loaded.as_ref()?;
        let filters = saved.filters.clone();
        self.filters = filters.clone();
        self.selection.clear();
        for comp in &mut self.comparables {
            comp.weight_override = None;
        }
        self.recompute_summary();
        self.phase = SessionPhase::RerunInProgress(id);
        let events = vec![
            WorkspaceEvent::SessionPhaseChanged(self.phase),
            WorkspaceEvent::SummaryChanged,
            self.set_status("rerunning saved analysis"),
        ];
        Some((filters, events))
    }

    // ---- derived views --------------------------------------------------

    /// Full comparable list under the active quick filters (AND-composed)
    /// and current sort. Selection and summary are untouched by filtering.
    pub fn visible_comparables(&self) -> Vec<&ComparableProperty> {
        let mut visible: Vec<&ComparableProperty> = self
            .comparables
            .iter()
            .filter(|c| self.passes_filters(c))
            .collect();
        match self.sort {
            SortKey::Similarity => {
                visible.sort_by(|a, b| {
                    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
                });
            }
            SortKey::PriceAsc => {
                visible.sort_by_key(|c| c.adjusted_price_cents);
            }
            SortKey::PriceDesc => {
                visible.sort_by_key(|c| std::cmp::Reverse(c.adjusted_price_cents));
            }
            SortKey::Distance => {
                visible.sort_by(|a, b| {
                    a.distance_miles
                        .partial_cmp(&b.distance_miles)
                        .unwrap_or(Ordering::Equal)
                });
            }
            SortKey::DateDesc => {
                // Missing close dates sort as earliest possible.
                visible.sort_by_key(|c| {
                    std::cmp::Reverse(c.close_date.map_or(i32::MIN, Date::to_julian_day))
                });
            }
        }
        visible
    }

    pub fn page_comparables(&self) -> Vec<&ComparableProperty> {
        self.visible_comparables()
            .into_iter()
            .skip(self.page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    pub fn page_count(&self) -> usize {
        let visible = self
            .comparables
            .iter()
            .filter(|c| self.passes_filters(c))
            .count();
        visible.div_ceil(PAGE_SIZE).max(1)
    }

    pub fn selected_comparables(&self) -> Vec<&ComparableProperty> {
        self.comparables
            .iter()
            .filter(|c| self.selection.contains(&c.listing_id))
            .collect()
    }

    pub fn is_selected(&self, id: &ListingId) -> bool {
        self.selection.contains(id)
    }

    pub fn comparable(&self, id: &ListingId) -> Option<&ComparableProperty> {
        self.comparables.iter().find(|c| &c.listing_id == id)
    }

    fn passes_filters(&self, comp: &ComparableProperty) -> bool {
        self.active_filters.iter().all(|tag| match tag {
            QuickFilter::GradeA => comp.grade == Grade::A,
            QuickFilter::Nearby => comp.distance_miles <= NEARBY_RADIUS_MILES,
            QuickFilter::Recent => comp.closed_within_days(self.today, RECENT_SALE_WINDOW_DAYS),
            QuickFilter::Pool => comp.pool,
        })
    }

    // ---- transitions ----------------------------------------------------

    fn toggle_selection(&mut self, id: ListingId) -> Vec<WorkspaceEvent> {
        if self.comparable(&id).is_none() {
            return self.stale_reference(&id);
        }
        if !self.selection.remove(&id) {
            self.selection.insert(id.clone());
        }
        // Adjustments are comparable-vs-subject and cannot change here, but
        // reapplying on every toggle is part of the contract.
        self.reapply_all_adjustments();
        self.recompute_summary();
        let mut events = vec![
            WorkspaceEvent::SelectionChanged(id),
            WorkspaceEvent::SummaryChanged,
        ];
        events.extend(self.mark_modified());
        events
    }

    fn set_weight_override(&mut self, id: ListingId, value: Option<f64>) -> Vec<WorkspaceEvent> {
        let Some(index) = self.comparables.iter().position(|c| c.listing_id == id) else {
            return self.stale_reference(&id);
        };
        self.comparables[index].weight_override = value;
        self.recompute_summary();
        let mut events = vec![
            WorkspaceEvent::ComparisonChanged,
            WorkspaceEvent::SummaryChanged,
        ];
        events.extend(self.mark_modified());
        events
    }

    fn set_characteristic(
        &mut self,
        target: CharacteristicTarget,
        value: CharacteristicValue,
    ) -> Vec<WorkspaceEvent> {
        let mut events = vec![WorkspaceEvent::PersistCharacteristic(
            target.clone(),
            value,
        )];
        match target {
            CharacteristicTarget::Subject => {
                match value {
                    CharacteristicValue::Road(road) => self.subject.road_type = road,
                    CharacteristicValue::Condition(condition) => {
                        self.subject.condition = condition;
                    }
                }
                // Subject characteristics feed every comparable's delta.
                self.reapply_all_adjustments();
                self.recompute_summary();
                events.push(WorkspaceEvent::ComparablesChanged);
                events.push(WorkspaceEvent::SummaryChanged);
            }
            CharacteristicTarget::Comparable(id) => {
                let Some(index) = self
                    .comparables
                    .iter()
                    .position(|c| c.listing_id == id)
                else {
                    return self.stale_reference(&id);
                };
                let comp = &mut self.comparables[index];
                match value {
                    CharacteristicValue::Road(road) => comp.road_type = road,
                    CharacteristicValue::Condition(condition) => comp.condition = condition,
                }
                recompute_adjusted_price(comp, &self.subject);
                self.recompute_summary();
                events.push(WorkspaceEvent::CardChanged(id));
                events.push(WorkspaceEvent::SummaryChanged);
            }
        }
        events.extend(self.mark_modified());
        events
    }

    fn apply_arv(&mut self, overrides: ArvOverrides) -> Vec<WorkspaceEvent> {
        if self.arv.original.is_none() {
            self.arv.original = Some(self.subject.clone());
        }
        self.subject.beds = overrides.beds;
        self.subject.baths = overrides.baths;
        self.subject.sqft = overrides.sqft;
        self.subject.year_built = overrides.year_built;
        self.subject.garage_spaces = overrides.garage_spaces;
        self.subject.pool = overrides.pool;
        self.subject.condition = overrides.condition;

        let active = match &self.arv.original {
            Some(original) => !self.subject.same_arv_fields(original),
            None => false,
        };
        self.arv.active = active;
        let label = if active {
            "arv scenario applied"
        } else {
            "arv matches the original subject"
        };
        let mut events = vec![WorkspaceEvent::ArvChanged(active), self.set_status(label)];
        events.extend(self.mark_modified());
        events
    }

    fn reset_arv(&mut self) -> Vec<WorkspaceEvent> {
        let Some(original) = self.arv.original.clone() else {
            return Vec::new();
        };
        self.subject = original;
        self.arv.active = false;
        let mut events = vec![
            WorkspaceEvent::ArvChanged(false),
            self.set_status("arv reset to original subject"),
        ];
        events.extend(self.mark_modified());
        events
    }

    /// First modal entry snapshots the original subject; later entries keep
    /// the existing snapshot.
    pub fn ensure_arv_snapshot(&mut self) {
        if self.arv.original.is_none() {
            self.arv.original = Some(self.subject.clone());
        }
    }

    // ---- internals ------------------------------------------------------

    fn reapply_all_adjustments(&mut self) {
        for comp in &mut self.comparables {
            recompute_adjusted_price(comp, &self.subject);
        }
    }

    fn recompute_summary(&mut self) {
        let summary = {
            let selected = self.selected_comparables();
            compute_summary(&selected, self.today)
        };
        self.summary = summary;
    }

    fn mark_modified(&mut self) -> Vec<WorkspaceEvent> {
        match self.phase {
            SessionPhase::Loaded(id) | SessionPhase::Saved(id) => {
                self.phase = SessionPhase::Modified(id);
                vec![WorkspaceEvent::SessionPhaseChanged(self.phase)]
            }
            _ => Vec::new(),
        }
    }

    fn stale_reference(&mut self, id: &ListingId) -> Vec<WorkspaceEvent> {
        vec![
            WorkspaceEvent::ComparablesChanged,
            self.set_status(&format!("listing {id} is no longer in the pool")),
        ]
    }

    fn set_status(&mut self, message: &str) -> WorkspaceEvent {
        self.status_line = Some(message.to_owned());
        WorkspaceEvent::StatusUpdated(message.to_owned())
    }
}
