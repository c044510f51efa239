// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use avaluo_app::format::{
    format_compact_dollars, format_date, format_dollars, format_percent, format_ratio_percent,
    format_signed_dollars, format_weight, parse_weight_override,
};
use avaluo_app::forms::{ArvForm, FilterForm, SaveSessionForm};
use avaluo_app::{
    CharacteristicTarget, CharacteristicValue, CmaSession, ComparablesPayload, FetchFilters,
    ListingId, ListingStatus, MarketConditions, PropertyCondition, QuickFilter, RoadType,
    SelectionPlan, SessionDraft, SessionId, SessionSummaryRow, SortKey, SubjectProperty,
    ValueTrendPoint, WorkspaceCommand, WorkspaceEvent, WorkspaceState, session,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table};
use std::collections::BTreeSet;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const STATUS_CLEAR_SECS: u64 = 4;
const ACTIVITY_CAP: usize = 50;
const SESSION_LIST_LIMIT: u32 = 20;
const MARKET_MONTHS: u32 = 6;
const TREND_MONTHS: u32 = 12;
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Outcome of a comparables fetch, tagged with the token handed out by
/// `WorkspaceState::begin_fetch`. Stale tokens are dropped on arrival.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Completed { token: u64, payload: ComparablesPayload },
    Failed { token: u64, message: String },
}

impl FetchEvent {
    pub const fn token(&self) -> u64 {
        match self {
            Self::Completed { token, .. } | Self::Failed { token, .. } => *token,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Fetch(FetchEvent),
}

/// Everything the workspace needs from the outside world. The gateway
/// client implements this against the live site; tests and demo mode
/// swap in canned implementations.
pub trait WorkspaceRuntime {
    fn fetch_comparables(
        &mut self,
        subject: &SubjectProperty,
        filters: &FetchFilters,
    ) -> Result<ComparablesPayload>;
    fn save_session(&mut self, draft: &SessionDraft) -> Result<SessionId>;
    fn load_session(&mut self, id: SessionId) -> Result<CmaSession>;
    fn list_sessions(&mut self, limit: u32) -> Result<Vec<SessionSummaryRow>>;
    fn delete_session(&mut self, id: SessionId) -> Result<()>;
    fn toggle_session_favorite(&mut self, id: SessionId) -> Result<bool>;
    fn market_conditions(
        &mut self,
        subject: &SubjectProperty,
        months: u32,
    ) -> Result<MarketConditions>;
    fn value_trend(&mut self, listing_id: &ListingId, months: u32)
    -> Result<Vec<ValueTrendPoint>>;
    fn export_report(&mut self, draft: &SessionDraft) -> Result<String>;
    fn persist_characteristic(
        &mut self,
        listing_id: &ListingId,
        value: CharacteristicValue,
    ) -> Result<()>;
    fn comparable_favorites(&mut self) -> Result<BTreeSet<ListingId>>;
    fn toggle_comparable_favorite(&mut self, listing_id: &ListingId) -> Result<bool>;

    /// Runs the fetch and delivers the outcome through the internal
    /// channel. The default runs synchronously; a live runtime may
    /// override this to move the request onto a thread.
    fn spawn_fetch(
        &mut self,
        token: u64,
        subject: &SubjectProperty,
        filters: &FetchFilters,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let event = match self.fetch_comparables(subject, filters) {
            Ok(payload) => InternalEvent::Fetch(FetchEvent::Completed { token, payload }),
            Err(error) => InternalEvent::Fetch(FetchEvent::Failed {
                token,
                message: error.to_string(),
            }),
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("fetch event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormFieldKind {
    Text,
    Toggle,
    Choice,
    Statuses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormFieldSpec {
    label: &'static str,
    kind: FormFieldKind,
}

const FILTER_FIELDS: [FormFieldSpec; 10] = [
    FormFieldSpec { label: "radius (mi)", kind: FormFieldKind::Text },
    FormFieldSpec { label: "price tolerance (%)", kind: FormFieldKind::Text },
    FormFieldSpec { label: "sqft tolerance (%)", kind: FormFieldKind::Text },
    FormFieldSpec { label: "year tolerance (%)", kind: FormFieldKind::Text },
    FormFieldSpec { label: "beds min", kind: FormFieldKind::Text },
    FormFieldSpec { label: "beds max", kind: FormFieldKind::Text },
    FormFieldSpec { label: "baths min", kind: FormFieldKind::Text },
    FormFieldSpec { label: "baths max", kind: FormFieldKind::Text },
    FormFieldSpec { label: "months back", kind: FormFieldKind::Text },
    FormFieldSpec { label: "statuses (c/a/p)", kind: FormFieldKind::Statuses },
];

const ARV_FIELDS: [FormFieldSpec; 7] = [
    FormFieldSpec { label: "beds", kind: FormFieldKind::Text },
    FormFieldSpec { label: "baths", kind: FormFieldKind::Text },
    FormFieldSpec { label: "sqft", kind: FormFieldKind::Text },
    FormFieldSpec { label: "year built", kind: FormFieldKind::Text },
    FormFieldSpec { label: "garage spaces", kind: FormFieldKind::Text },
    FormFieldSpec { label: "pool (space)", kind: FormFieldKind::Toggle },
    FormFieldSpec { label: "condition (space)", kind: FormFieldKind::Choice },
];

const SAVE_FIELDS: [FormFieldSpec; 4] = [
    FormFieldSpec { label: "name", kind: FormFieldKind::Text },
    FormFieldSpec { label: "description", kind: FormFieldKind::Text },
    FormFieldSpec { label: "standalone (space)", kind: FormFieldKind::Toggle },
    FormFieldSpec { label: "update current (space)", kind: FormFieldKind::Toggle },
];

#[derive(Debug, Clone, PartialEq)]
struct FilterFormUi {
    visible: bool,
    form: FilterForm,
    field: usize,
    error: Option<String>,
}

impl Default for FilterFormUi {
    fn default() -> Self {
        Self {
            visible: false,
            form: FilterForm::from_filters(&FetchFilters::default()),
            field: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ArvFormUi {
    visible: bool,
    form: ArvForm,
    field: usize,
    error: Option<String>,
}

impl Default for ArvFormUi {
    fn default() -> Self {
        Self {
            visible: false,
            form: ArvForm {
                beds: String::new(),
                baths: String::new(),
                sqft: String::new(),
                year_built: String::new(),
                garage_spaces: String::new(),
                pool: false,
                condition: PropertyCondition::Unknown,
            },
            field: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct SaveFormUi {
    visible: bool,
    form: SaveSessionForm,
    field: usize,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct SessionBrowserUi {
    visible: bool,
    rows: Vec<SessionSummaryRow>,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct BreakdownUi {
    visible: bool,
    listing_id: Option<ListingId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct WeightEditUi {
    visible: bool,
    listing_id: Option<ListingId>,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ActivityLog {
    entries: Vec<String>,
}

impl ActivityLog {
    fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
        if self.entries.len() > ACTIVITY_CAP {
            let excess = self.entries.len() - ACTIVITY_CAP;
            self.entries.drain(..excess);
        }
    }

    fn latest(&self) -> &str {
        self.entries.last().map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    cursor: usize,
    filter_form: FilterFormUi,
    arv_form: ArvFormUi,
    save_form: SaveFormUi,
    session_browser: SessionBrowserUi,
    breakdown: BreakdownUi,
    weight_edit: WeightEditUi,
    help_visible: bool,
    market: Option<MarketConditions>,
    trend: Vec<ValueTrendPoint>,
    favorites: BTreeSet<ListingId>,
    activity: ActivityLog,
    status_token: u64,
}

pub fn run_app<R: WorkspaceRuntime>(state: &mut WorkspaceState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    match runtime.comparable_favorites() {
        Ok(favorites) => view_data.favorites = favorites,
        Err(error) => view_data.activity.push(format!("favorites unavailable: {error}")),
    }
    start_fetch(state, runtime, &mut view_data, &internal_tx, SelectionPlan::GradeDefault);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut WorkspaceState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(WorkspaceCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Fetch(fetch) => {
                handle_fetch_event(state, view_data, tx, fetch);
            }
        }
    }
}

fn handle_fetch_event(
    state: &mut WorkspaceState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: FetchEvent,
) {
    match event {
        FetchEvent::Completed { token, payload } => {
            let events = state.ingest_comparables(token, payload);
            if events.is_empty() {
                view_data.activity.push(format!("fetch #{token} superseded; response dropped"));
                return;
            }
            view_data.cursor = 0;
            view_data
                .activity
                .push(format!("fetch #{token} delivered {} comparables", state.comparables.len()));
            note_status_events(view_data, tx, &events);
        }
        FetchEvent::Failed { token, message } => {
            let events = state.fail_fetch(token, &message);
            if events.is_empty() {
                view_data.activity.push(format!("fetch #{token} superseded; failure dropped"));
                return;
            }
            view_data.activity.push(format!("fetch #{token} failed: {message}"));
            note_status_events(view_data, tx, &events);
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(STATUS_CLEAR_SECS));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut WorkspaceState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(WorkspaceCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// The workspace sets its own status lines for fetch and session
/// transitions; every one of them still needs a scheduled clear.
fn note_status_events(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[WorkspaceEvent],
) {
    if events.iter().any(|event| matches!(event, WorkspaceEvent::StatusUpdated(_))) {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn handle_key_event<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        view_data.help_visible = false;
        return false;
    }
    if view_data.weight_edit.visible {
        handle_weight_edit_key(state, runtime, view_data, internal_tx, key);
        return false;
    }
    if view_data.filter_form.visible {
        handle_filter_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }
    if view_data.arv_form.visible {
        handle_arv_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }
    if view_data.save_form.visible {
        handle_save_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }
    if view_data.session_browser.visible {
        handle_session_browser_key(state, runtime, view_data, internal_tx, key);
        return false;
    }
    if view_data.breakdown.visible {
        view_data.breakdown = BreakdownUi::default();
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('j') | KeyCode::Down, KeyModifiers::NONE) => {
            move_cursor(state, view_data, 1);
        }
        (KeyCode::Char('k') | KeyCode::Up, KeyModifiers::NONE) => {
            move_cursor(state, view_data, -1);
        }
        (KeyCode::Char('h') | KeyCode::Left, KeyModifiers::NONE) => {
            dispatch_workspace(state, runtime, view_data, internal_tx, WorkspaceCommand::PrevPage);
        }
        (KeyCode::Char('l') | KeyCode::Right, KeyModifiers::NONE) => {
            dispatch_workspace(state, runtime, view_data, internal_tx, WorkspaceCommand::NextPage);
        }
        (KeyCode::Char(' ') | KeyCode::Enter, _) => {
            toggle_cursor_selection(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('w'), KeyModifiers::NONE) => {
            open_weight_editor(state, view_data);
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            cycle_comparable_road(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            cycle_comparable_condition(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('R'), _) => {
            cycle_subject_road(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('C'), _) => {
            cycle_subject_condition(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            cycle_sort(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('1'), _) => {
            toggle_quick_filter(state, runtime, view_data, internal_tx, QuickFilter::GradeA);
        }
        (KeyCode::Char('2'), _) => {
            toggle_quick_filter(state, runtime, view_data, internal_tx, QuickFilter::Nearby);
        }
        (KeyCode::Char('3'), _) => {
            toggle_quick_filter(state, runtime, view_data, internal_tx, QuickFilter::Recent);
        }
        (KeyCode::Char('4'), _) => {
            toggle_quick_filter(state, runtime, view_data, internal_tx, QuickFilter::Pool);
        }
        (KeyCode::Char('g'), KeyModifiers::NONE) => {
            start_fetch(state, runtime, view_data, internal_tx, SelectionPlan::GradeDefault);
        }
        (KeyCode::Char('G'), _) => {
            start_fetch(state, runtime, view_data, internal_tx, SelectionPlan::Preserve);
        }
        (KeyCode::Char('F'), _) => {
            open_filter_form(state, view_data);
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            open_arv_form(state, view_data);
        }
        (KeyCode::Char('A'), _) => {
            reset_arv(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('S'), _) => {
            open_save_form(state, view_data);
        }
        (KeyCode::Char('o'), KeyModifiers::NONE) => {
            open_session_browser(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('u'), KeyModifiers::NONE) => {
            rerun_saved_analysis(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            export_current_report(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('m'), KeyModifiers::NONE) => {
            refresh_market(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('v'), KeyModifiers::NONE) => {
            toggle_cursor_favorite(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            open_breakdown(state, view_data);
        }
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        _ => {}
    }
    false
}

// ---- workspace command plumbing -----------------------------------------

/// Dispatches a command and runs the side effects its events ask for:
/// characteristic pushes to the runtime, cursor clamping when the table
/// shape changed, and status-clear scheduling.
fn dispatch_workspace<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: WorkspaceCommand,
) {
    let events = state.dispatch(command);
    for event in &events {
        if let WorkspaceEvent::PersistCharacteristic(target, value) = event {
            let listing_id = match target {
                CharacteristicTarget::Subject => state.subject.listing_id.clone(),
                CharacteristicTarget::Comparable(id) => id.clone(),
            };
            if let Err(error) = runtime.persist_characteristic(&listing_id, *value) {
                view_data.activity.push(format!("characteristic push failed: {error}"));
            }
        }
    }
    if events.iter().any(|event| {
        matches!(
            event,
            WorkspaceEvent::ComparablesChanged
                | WorkspaceEvent::FilterChanged
                | WorkspaceEvent::SortChanged(_)
                | WorkspaceEvent::PageChanged(_)
        )
    }) {
        clamp_cursor(state, view_data);
    }
    note_status_events(view_data, internal_tx, &events);
}

fn start_fetch<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    plan: SelectionPlan,
) {
    let Some(token) = state.begin_fetch(plan) else {
        emit_status(
            state,
            view_data,
            internal_tx,
            "a fetch is already running -- wait for it to finish",
        );
        return;
    };
    view_data.activity.push(format!("fetch #{token} started"));
    let subject = state.subject.clone();
    let filters = state.filters.clone();
    if let Err(error) = runtime.spawn_fetch(token, &subject, &filters, internal_tx.clone()) {
        view_data.activity.push(format!("fetch #{token} could not start: {error}"));
        let events = state.fail_fetch(token, &format!("fetch failed: {error}"));
        note_status_events(view_data, internal_tx, &events);
    }
}

fn clamp_cursor(state: &WorkspaceState, view_data: &mut ViewData) {
    let len = state.page_comparables().len();
    view_data.cursor = if len == 0 { 0 } else { view_data.cursor.min(len - 1) };
}

fn move_cursor(state: &WorkspaceState, view_data: &mut ViewData, delta: isize) {
    let len = state.page_comparables().len();
    if len == 0 {
        view_data.cursor = 0;
        return;
    }
    view_data.cursor = if delta.is_negative() {
        view_data.cursor.saturating_sub(delta.unsigned_abs())
    } else {
        (view_data.cursor + delta.unsigned_abs()).min(len - 1)
    };
}

fn cursor_listing_id(state: &WorkspaceState, view_data: &ViewData) -> Option<ListingId> {
    state
        .page_comparables()
        .get(view_data.cursor)
        .map(|comp| comp.listing_id.clone())
}

fn next_in_cycle<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    match all.iter().position(|candidate| *candidate == current) {
        Some(index) => all[(index + 1) % all.len()],
        None => all[0],
    }
}

// ---- main-screen actions ------------------------------------------------

fn toggle_cursor_selection<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = cursor_listing_id(state, view_data) else {
        return;
    };
    dispatch_workspace(
        state,
        runtime,
        view_data,
        internal_tx,
        WorkspaceCommand::ToggleSelection(id.clone()),
    );
    let verb = if state.is_selected(&id) { "included" } else { "excluded" };
    emit_status(state, view_data, internal_tx, format!("{id} {verb}"));
}

fn open_weight_editor(state: &WorkspaceState, view_data: &mut ViewData) {
    let Some(id) = cursor_listing_id(state, view_data) else {
        return;
    };
    let current = state.comparable(&id).and_then(|comp| comp.weight_override);
    view_data.weight_edit = WeightEditUi {
        visible: true,
        listing_id: Some(id),
        buffer: current.map(|weight| weight.to_string()).unwrap_or_default(),
    };
}

fn cycle_comparable_road<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = cursor_listing_id(state, view_data) else {
        return;
    };
    let Some(comp) = state.comparable(&id) else {
        return;
    };
    let next = next_in_cycle(&RoadType::ALL, comp.road_type);
    dispatch_workspace(
        state,
        runtime,
        view_data,
        internal_tx,
        WorkspaceCommand::SetCharacteristic(
            CharacteristicTarget::Comparable(id),
            CharacteristicValue::Road(next),
        ),
    );
    emit_status(state, view_data, internal_tx, format!("road: {}", next.label()));
}

fn cycle_comparable_condition<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = cursor_listing_id(state, view_data) else {
        return;
    };
    let Some(comp) = state.comparable(&id) else {
        return;
    };
    let next = next_in_cycle(&PropertyCondition::ALL, comp.condition);
    dispatch_workspace(
        state,
        runtime,
        view_data,
        internal_tx,
        WorkspaceCommand::SetCharacteristic(
            CharacteristicTarget::Comparable(id),
            CharacteristicValue::Condition(next),
        ),
    );
    emit_status(state, view_data, internal_tx, format!("condition: {}", next.label()));
}

fn cycle_subject_road<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let next = next_in_cycle(&RoadType::ALL, state.subject.road_type);
    dispatch_workspace(
        state,
        runtime,
        view_data,
        internal_tx,
        WorkspaceCommand::SetCharacteristic(
            CharacteristicTarget::Subject,
            CharacteristicValue::Road(next),
        ),
    );
    emit_status(state, view_data, internal_tx, format!("subject road: {}", next.label()));
}

fn cycle_subject_condition<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let next = next_in_cycle(&PropertyCondition::ALL, state.subject.condition);
    dispatch_workspace(
        state,
        runtime,
        view_data,
        internal_tx,
        WorkspaceCommand::SetCharacteristic(
            CharacteristicTarget::Subject,
            CharacteristicValue::Condition(next),
        ),
    );
    emit_status(state, view_data, internal_tx, format!("subject condition: {}", next.label()));
}

fn cycle_sort<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let next = next_in_cycle(&SortKey::ALL, state.sort);
    dispatch_workspace(state, runtime, view_data, internal_tx, WorkspaceCommand::ApplySort(next));
    emit_status(state, view_data, internal_tx, format!("sort: {}", next.label()));
}

fn toggle_quick_filter<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    filter: QuickFilter,
) {
    dispatch_workspace(
        state,
        runtime,
        view_data,
        internal_tx,
        WorkspaceCommand::ToggleQuickFilter(filter),
    );
    let flag = if state.active_filters.contains(&filter) { "on" } else { "off" };
    emit_status(state, view_data, internal_tx, format!("filter {}: {flag}", filter.label()));
}

fn reset_arv<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(WorkspaceCommand::ResetArv);
    if events.is_empty() {
        emit_status(state, view_data, internal_tx, "no arv scenario to reset");
        return;
    }
    note_status_events(view_data, internal_tx, &events);
    start_fetch(state, runtime, view_data, internal_tx, SelectionPlan::Preserve);
}

fn rerun_saved_analysis<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some((_, events)) = state.start_rerun() else {
        emit_status(
            state,
            view_data,
            internal_tx,
            "no session loaded -- open the session browser and load one",
        );
        return;
    };
    note_status_events(view_data, internal_tx, &events);
    start_fetch(state, runtime, view_data, internal_tx, SelectionPlan::GradeDefault);
}

fn export_current_report<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if state.comparables.is_empty() {
        emit_status(state, view_data, internal_tx, "nothing to export -- fetch comparables first");
        return;
    }
    let name = state
        .loaded
        .as_ref()
        .map_or_else(|| "cma report".to_owned(), |loaded| loaded.name.clone());
    let draft = session::capture(state, state.phase.session_id(), &name, "", false);
    match runtime.export_report(&draft) {
        Ok(url) => {
            view_data.activity.push(format!("report ready: {url}"));
            emit_status(state, view_data, internal_tx, format!("report ready: {url}"));
        }
        Err(error) => {
            view_data.activity.push(format!("export failed: {error}"));
            emit_status(state, view_data, internal_tx, format!("export failed: {error}"));
        }
    }
}

fn refresh_market<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.market_conditions(&state.subject, MARKET_MONTHS) {
        Ok(conditions) => {
            view_data.market = Some(conditions);
            emit_status(state, view_data, internal_tx, "market conditions refreshed");
        }
        Err(error) => {
            view_data.activity.push(format!("market refresh failed: {error}"));
            emit_status(state, view_data, internal_tx, format!("market refresh failed: {error}"));
        }
    }
    let listing_id = state.subject.listing_id.clone();
    match runtime.value_trend(&listing_id, TREND_MONTHS) {
        Ok(points) => view_data.trend = points,
        Err(error) => view_data.activity.push(format!("value trend failed: {error}")),
    }
}

fn toggle_cursor_favorite<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = cursor_listing_id(state, view_data) else {
        return;
    };
    match runtime.toggle_comparable_favorite(&id) {
        Ok(true) => {
            view_data.favorites.insert(id.clone());
            emit_status(state, view_data, internal_tx, format!("{id} marked favorite"));
        }
        Ok(false) => {
            view_data.favorites.remove(&id);
            emit_status(state, view_data, internal_tx, format!("{id} unmarked"));
        }
        Err(error) => {
            view_data.activity.push(format!("favorite toggle failed: {error}"));
            emit_status(state, view_data, internal_tx, format!("favorite toggle failed: {error}"));
        }
    }
}

fn open_breakdown(state: &WorkspaceState, view_data: &mut ViewData) {
    let Some(id) = cursor_listing_id(state, view_data) else {
        return;
    };
    view_data.breakdown = BreakdownUi { visible: true, listing_id: Some(id) };
}

fn open_filter_form(state: &WorkspaceState, view_data: &mut ViewData) {
    view_data.filter_form = FilterFormUi {
        visible: true,
        form: FilterForm::from_filters(&state.filters),
        field: 0,
        error: None,
    };
}

fn open_arv_form(state: &mut WorkspaceState, view_data: &mut ViewData) {
    state.ensure_arv_snapshot();
    view_data.arv_form = ArvFormUi {
        visible: true,
        form: ArvForm::from_subject(&state.subject),
        field: 0,
        error: None,
    };
}

fn open_save_form(state: &WorkspaceState, view_data: &mut ViewData) {
    let mut form = SaveSessionForm::default();
    if let Some(loaded) = &state.loaded {
        form.name = loaded.name.clone();
        form.update_current = true;
    }
    view_data.save_form = SaveFormUi { visible: true, form, field: 0, error: None };
}

fn open_session_browser<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.list_sessions(SESSION_LIST_LIMIT) {
        Ok(rows) => {
            view_data.session_browser = SessionBrowserUi { visible: true, rows, cursor: 0 };
        }
        Err(error) => {
            view_data.activity.push(format!("session list failed: {error}"));
            emit_status(state, view_data, internal_tx, format!("session list failed: {error}"));
        }
    }
}

// ---- overlay key handlers -----------------------------------------------

fn handle_weight_edit_key<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.weight_edit = WeightEditUi::default();
        }
        KeyCode::Enter => {
            let Some(id) = view_data.weight_edit.listing_id.clone() else {
                view_data.weight_edit = WeightEditUi::default();
                return;
            };
            match parse_weight_override(&view_data.weight_edit.buffer) {
                Ok(weight) => {
                    view_data.weight_edit = WeightEditUi::default();
                    dispatch_workspace(
                        state,
                        runtime,
                        view_data,
                        internal_tx,
                        WorkspaceCommand::SetWeightOverride(id, weight),
                    );
                }
                Err(error) => {
                    emit_status(state, view_data, internal_tx, error.to_string());
                }
            }
        }
        KeyCode::Backspace => {
            view_data.weight_edit.buffer.pop();
        }
        KeyCode::Char(ch) if ch.is_ascii_digit() || ch == '.' => {
            view_data.weight_edit.buffer.push(ch);
        }
        _ => {}
    }
}

fn handle_filter_form_key<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let fields = FILTER_FIELDS.len();
    match key.code {
        KeyCode::Esc => {
            view_data.filter_form = FilterFormUi::default();
        }
        KeyCode::Tab | KeyCode::Down => {
            view_data.filter_form.field = (view_data.filter_form.field + 1) % fields;
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_data.filter_form.field = (view_data.filter_form.field + fields - 1) % fields;
        }
        KeyCode::Enter => match view_data.filter_form.form.parse() {
            Ok(filters) => {
                state.filters = filters;
                view_data.filter_form = FilterFormUi::default();
                start_fetch(state, runtime, view_data, internal_tx, SelectionPlan::GradeDefault);
            }
            Err(error) => {
                view_data.filter_form.error = Some(error.to_string());
            }
        },
        KeyCode::Backspace => {
            let field = view_data.filter_form.field;
            if let Some(buffer) = filter_buffer_mut(&mut view_data.filter_form.form, field) {
                buffer.pop();
            }
        }
        KeyCode::Char(ch) => {
            let field = view_data.filter_form.field;
            if FILTER_FIELDS[field].kind == FormFieldKind::Statuses {
                match ch {
                    'c' => view_data.filter_form.form.toggle_status(ListingStatus::Closed),
                    'a' => view_data.filter_form.form.toggle_status(ListingStatus::Active),
                    'p' => view_data.filter_form.form.toggle_status(ListingStatus::Pending),
                    _ => {}
                }
            } else if let Some(buffer) = filter_buffer_mut(&mut view_data.filter_form.form, field) {
                buffer.push(ch);
            }
        }
        _ => {}
    }
}

fn handle_arv_form_key<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let fields = ARV_FIELDS.len();
    match key.code {
        KeyCode::Esc => {
            view_data.arv_form = ArvFormUi::default();
        }
        KeyCode::Tab | KeyCode::Down => {
            view_data.arv_form.field = (view_data.arv_form.field + 1) % fields;
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_data.arv_form.field = (view_data.arv_form.field + fields - 1) % fields;
        }
        KeyCode::Enter => match view_data.arv_form.form.parse() {
            Ok(overrides) => {
                view_data.arv_form = ArvFormUi::default();
                dispatch_workspace(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    WorkspaceCommand::ApplyArv(overrides),
                );
                start_fetch(state, runtime, view_data, internal_tx, SelectionPlan::Preserve);
            }
            Err(error) => {
                view_data.arv_form.error = Some(error.to_string());
            }
        },
        KeyCode::Backspace => {
            let field = view_data.arv_form.field;
            if let Some(buffer) = arv_buffer_mut(&mut view_data.arv_form.form, field) {
                buffer.pop();
            }
        }
        KeyCode::Char(ch) => {
            let field = view_data.arv_form.field;
            match ARV_FIELDS[field].kind {
                FormFieldKind::Text => {
                    if let Some(buffer) = arv_buffer_mut(&mut view_data.arv_form.form, field) {
                        buffer.push(ch);
                    }
                }
                FormFieldKind::Toggle => {
                    if ch == ' ' {
                        view_data.arv_form.form.pool = !view_data.arv_form.form.pool;
                    }
                }
                FormFieldKind::Choice => {
                    if ch == ' ' {
                        let current = view_data.arv_form.form.condition;
                        view_data.arv_form.form.condition =
                            next_in_cycle(&PropertyCondition::ALL, current);
                    }
                }
                FormFieldKind::Statuses => {}
            }
        }
        _ => {}
    }
}

fn handle_save_form_key<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let fields = SAVE_FIELDS.len();
    match key.code {
        KeyCode::Esc => {
            view_data.save_form = SaveFormUi::default();
        }
        KeyCode::Tab | KeyCode::Down => {
            view_data.save_form.field = (view_data.save_form.field + 1) % fields;
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_data.save_form.field = (view_data.save_form.field + fields - 1) % fields;
        }
        KeyCode::Enter => {
            submit_save_form(state, runtime, view_data, internal_tx);
        }
        KeyCode::Backspace => {
            let field = view_data.save_form.field;
            if let Some(buffer) = save_buffer_mut(&mut view_data.save_form.form, field) {
                buffer.pop();
            }
        }
        KeyCode::Char(ch) => {
            let field = view_data.save_form.field;
            match SAVE_FIELDS[field].kind {
                FormFieldKind::Text => {
                    if let Some(buffer) = save_buffer_mut(&mut view_data.save_form.form, field) {
                        buffer.push(ch);
                    }
                }
                FormFieldKind::Toggle => {
                    if ch == ' ' {
                        match field {
                            2 => {
                                view_data.save_form.form.standalone =
                                    !view_data.save_form.form.standalone;
                            }
                            3 => {
                                view_data.save_form.form.update_current =
                                    !view_data.save_form.form.update_current;
                            }
                            _ => {}
                        }
                    }
                }
                FormFieldKind::Choice | FormFieldKind::Statuses => {}
            }
        }
        _ => {}
    }
}

fn submit_save_form<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = view_data.save_form.form.validate() {
        view_data.save_form.error = Some(error.to_string());
        return;
    }
    let form = view_data.save_form.form.clone();
    let update_id = if form.update_current { state.phase.session_id() } else { None };
    let draft = session::capture(
        state,
        update_id,
        &form.clean_name(),
        &form.clean_description(),
        form.standalone,
    );
    match runtime.save_session(&draft) {
        Ok(id) => {
            view_data.save_form = SaveFormUi::default();
            view_data.activity.push(format!("session '{}' saved as #{}", draft.name, id.get()));
            let events = state.session_saved(id, &draft.name);
            note_status_events(view_data, internal_tx, &events);
        }
        Err(error) => {
            view_data.save_form.error = Some(error.to_string());
        }
    }
}

fn handle_session_browser_key<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.session_browser = SessionBrowserUi::default();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let len = view_data.session_browser.rows.len();
            if len > 0 {
                let cursor = &mut view_data.session_browser.cursor;
                *cursor = (*cursor + 1).min(len - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.session_browser.cursor = view_data.session_browser.cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            load_selected_session(state, runtime, view_data, internal_tx);
        }
        KeyCode::Char('d') => {
            delete_selected_session(state, runtime, view_data, internal_tx);
        }
        KeyCode::Char('f') => {
            favorite_selected_session(state, runtime, view_data, internal_tx);
        }
        _ => {}
    }
}

fn load_selected_session<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(row) = view_data.session_browser.rows.get(view_data.session_browser.cursor) else {
        return;
    };
    let id = row.id;
    match runtime.load_session(id) {
        Ok(loaded) => {
            let plan = session::restore_plan(&loaded);
            let events = session::restore_into(state, &loaded);
            note_status_events(view_data, internal_tx, &events);
            view_data.session_browser = SessionBrowserUi::default();
            view_data.activity.push(format!("session #{} loaded", id.get()));
            start_fetch(state, runtime, view_data, internal_tx, plan);
        }
        Err(error) => {
            view_data.activity.push(format!("session load failed: {error}"));
            emit_status(state, view_data, internal_tx, format!("session load failed: {error}"));
        }
    }
}

fn delete_selected_session<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(row) = view_data.session_browser.rows.get(view_data.session_browser.cursor) else {
        return;
    };
    let id = row.id;
    match runtime.delete_session(id) {
        Ok(()) => {
            let cursor = view_data.session_browser.cursor;
            view_data.session_browser.rows.remove(cursor);
            let len = view_data.session_browser.rows.len();
            view_data.session_browser.cursor = if len == 0 { 0 } else { cursor.min(len - 1) };
            emit_status(state, view_data, internal_tx, format!("session #{} deleted", id.get()));
        }
        Err(error) => {
            view_data.activity.push(format!("session delete failed: {error}"));
            emit_status(state, view_data, internal_tx, format!("session delete failed: {error}"));
        }
    }
}

fn favorite_selected_session<R: WorkspaceRuntime>(
    state: &mut WorkspaceState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let cursor = view_data.session_browser.cursor;
    let Some(row) = view_data.session_browser.rows.get(cursor) else {
        return;
    };
    let id = row.id;
    match runtime.toggle_session_favorite(id) {
        Ok(flag) => {
            if let Some(row) = view_data.session_browser.rows.get_mut(cursor) {
                row.favorite = flag;
            }
        }
        Err(error) => {
            view_data.activity.push(format!("favorite toggle failed: {error}"));
            emit_status(state, view_data, internal_tx, format!("favorite toggle failed: {error}"));
        }
    }
}

// ---- form buffers -------------------------------------------------------

fn filter_buffer_mut(form: &mut FilterForm, index: usize) -> Option<&mut String> {
    match index {
        0 => Some(&mut form.radius),
        1 => Some(&mut form.price_tolerance),
        2 => Some(&mut form.sqft_tolerance),
        3 => Some(&mut form.year_tolerance),
        4 => Some(&mut form.beds_min),
        5 => Some(&mut form.beds_max),
        6 => Some(&mut form.baths_min),
        7 => Some(&mut form.baths_max),
        8 => Some(&mut form.months_back),
        _ => None,
    }
}

fn arv_buffer_mut(form: &mut ArvForm, index: usize) -> Option<&mut String> {
    match index {
        0 => Some(&mut form.beds),
        1 => Some(&mut form.baths),
        2 => Some(&mut form.sqft),
        3 => Some(&mut form.year_built),
        4 => Some(&mut form.garage_spaces),
        _ => None,
    }
}

fn save_buffer_mut(form: &mut SaveSessionForm, index: usize) -> Option<&mut String> {
    match index {
        0 => Some(&mut form.name),
        1 => Some(&mut form.description),
        _ => None,
    }
}

fn filter_field_value(form: &FilterForm, index: usize) -> String {
    match index {
        0 => form.radius.clone(),
        1 => form.price_tolerance.clone(),
        2 => form.sqft_tolerance.clone(),
        3 => form.year_tolerance.clone(),
        4 => form.beds_min.clone(),
        5 => form.beds_max.clone(),
        6 => form.baths_min.clone(),
        7 => form.baths_max.clone(),
        8 => form.months_back.clone(),
        _ => form
            .statuses
            .iter()
            .map(|status| status.as_str())
            .collect::<Vec<_>>()
            .join(","),
    }
}

fn arv_field_value(form: &ArvForm, index: usize) -> String {
    match index {
        0 => form.beds.clone(),
        1 => form.baths.clone(),
        2 => form.sqft.clone(),
        3 => form.year_built.clone(),
        4 => form.garage_spaces.clone(),
        5 => yes_no(form.pool).to_owned(),
        _ => form.condition.label().to_owned(),
    }
}

fn save_field_value(form: &SaveSessionForm, index: usize) -> String {
    match index {
        0 => form.name.clone(),
        1 => form.description.clone(),
        2 => yes_no(form.standalone).to_owned(),
        _ => yes_no(form.update_current).to_owned(),
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

// ---- rendering ----------------------------------------------------------

fn render(frame: &mut ratatui::Frame<'_>, state: &WorkspaceState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let subject = Paragraph::new(render_subject_text(state, view_data))
        .block(Block::default().title("subject").borders(Borders::ALL));
    frame.render_widget(subject, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(38)])
        .split(layout[1]);
    render_comparable_table(frame, body[0], state, view_data);
    let summary = Paragraph::new(render_summary_text(state, view_data))
        .block(Block::default().title("estimate").borders(Borders::ALL));
    frame.render_widget(summary, body[1]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    let activity = Paragraph::new(view_data.activity.latest().to_owned())
        .block(Block::default().title("activity").borders(Borders::ALL));
    frame.render_widget(activity, layout[3]);

    if view_data.session_browser.visible {
        render_overlay(
            frame,
            "saved sessions",
            render_session_browser_text(&view_data.session_browser),
            74,
            62,
        );
    }
    if view_data.breakdown.visible {
        render_overlay(
            frame,
            "adjustment breakdown",
            render_breakdown_text(state, &view_data.breakdown),
            62,
            54,
        );
    }
    if view_data.filter_form.visible {
        render_overlay(
            frame,
            "fetch filters",
            render_filter_form_text(&view_data.filter_form),
            46,
            58,
        );
    }
    if view_data.arv_form.visible {
        render_overlay(frame, "arv scenario", render_arv_form_text(&view_data.arv_form), 44, 50);
    }
    if view_data.save_form.visible {
        render_overlay(frame, "save session", render_save_form_text(&view_data.save_form), 48, 38);
    }
    if view_data.weight_edit.visible {
        render_overlay(
            frame,
            "weight override",
            render_weight_edit_text(state, &view_data.weight_edit),
            38,
            24,
        );
    }
    if view_data.help_visible {
        render_overlay(frame, "help", help_overlay_text(), 66, 74);
    }
}

fn render_overlay(
    frame: &mut ratatui::Frame<'_>,
    title: &str,
    text: String,
    percent_x: u16,
    percent_y: u16,
) {
    let area = centered_rect(percent_x, percent_y, frame.area());
    frame.render_widget(Clear, area);
    let overlay = Paragraph::new(text)
        .block(Block::default().title(title.to_owned()).borders(Borders::ALL));
    frame.render_widget(overlay, area);
}

fn render_subject_text(state: &WorkspaceState, view_data: &ViewData) -> String {
    let subject = &state.subject;
    let year = subject
        .year_built
        .map_or_else(|| "year n/a".to_owned(), |year| format!("built {year}"));
    let pool = if subject.pool { "pool" } else { "no pool" };
    let arv = if state.arv.active { "arv scenario ON" } else { "arv off" };
    let session = match &state.loaded {
        Some(loaded) => format!("session '{}'", loaded.name),
        None => "no session".to_owned(),
    };
    let spark = if view_data.trend.is_empty() {
        String::new()
    } else {
        format!(" | trend {}", sparkline(&view_data.trend))
    };
    let filters = &state.filters;
    let statuses: Vec<&str> = filters.statuses.iter().map(|status| status.as_str()).collect();

    let mut lines = vec![
        format!(
            "{}, {} {} | {}bd/{}ba {} sqft | {} | garage {} | {}",
            subject.address,
            subject.city,
            subject.state,
            subject.beds,
            subject.baths,
            subject.sqft,
            year,
            subject.garage_spaces,
            pool,
        ),
        format!(
            "road {} | condition {} | {} | {} ({}){}",
            subject.road_type.label(),
            subject.condition.label(),
            arv,
            state.phase.label(),
            session,
            spark,
        ),
        format!(
            "filters: {} mi | ±{}% price | ±{}% sqft | {} mo | [{}]",
            filters.radius_miles,
            filters.price_tolerance_pct,
            filters.sqft_tolerance_pct,
            filters.months_back,
            statuses.join(","),
        ),
    ];
    if let Some(delta) = state.rerun_delta_cents {
        lines.push(format!("rerun moved the estimate {}", format_signed_dollars(delta)));
    }
    lines.join("\n")
}

fn table_title(state: &WorkspaceState) -> String {
    let mut title = format!(
        "comparables {}/{} | page {}/{} | sort {}",
        state.visible_comparables().len(),
        state.comparables.len(),
        state.page + 1,
        state.page_count(),
        state.sort.label(),
    );
    if !state.active_filters.is_empty() {
        let tags: Vec<&str> = state.active_filters.iter().map(|filter| filter.label()).collect();
        title.push_str(" | ");
        title.push_str(&tags.join("+"));
    }
    title
}

fn render_comparable_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &WorkspaceState,
    view_data: &ViewData,
) {
    let header = Row::new(vec![
        "", "", "id", "address", "gr", "score", "adjusted", "raw", "mi", "closed", "status", "wt",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row<'_>> = state
        .page_comparables()
        .iter()
        .enumerate()
        .map(|(index, comp)| {
            let selected = state.is_selected(&comp.listing_id);
            let favorite = view_data.favorites.contains(&comp.listing_id);
            let mut weight = format_weight(comp.effective_weight());
            if comp.weight_override.is_some() {
                weight.push('*');
            }
            let cells = vec![
                if selected { "✓" } else { " " }.to_owned(),
                if favorite { "★" } else { " " }.to_owned(),
                comp.listing_id.to_string(),
                comp.address.clone(),
                comp.grade.as_str().to_owned(),
                format!("{:.0}", comp.score),
                format_dollars(comp.adjusted_price_cents),
                format_dollars(comp.raw_price_cents),
                format!("{:.1}", comp.distance_miles),
                format_date(comp.close_date),
                comp.status.as_str().to_owned(),
                weight,
            ];
            let row = Row::new(cells);
            if index == view_data.cursor {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Length(7),
        Constraint::Min(18),
        Constraint::Length(2),
        Constraint::Length(5),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(5),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(table_title(state)).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_summary_text(state: &WorkspaceState, view_data: &ViewData) -> String {
    let summary = &state.summary;
    let mut lines = vec![
        format!("selected {} of {}", summary.selected_count, state.comparables.len()),
        String::new(),
        format!("low   {}", format_dollars(summary.estimate_low_cents)),
        format!("mid   {}", format_dollars(summary.estimate_mid_cents)),
        format!("high  {}", format_dollars(summary.estimate_high_cents)),
        format!(
            "confidence {} ({})",
            summary.confidence.as_str(),
            format_percent(summary.confidence_score),
        ),
        String::new(),
        format!("weighted mean {}", format_dollars(summary.weighted_mean_cents)),
        format!("plain mean    {}", format_dollars(summary.unweighted_mean_cents)),
        format!("raw median    {}", format_dollars(summary.median_raw_cents)),
        format!("std dev       {}", format_dollars(summary.std_dev_cents)),
        format!("ppsf mean     {}", format_dollars(summary.ppsf_mean_cents)),
        format!("recent sales  {}", summary.recent_sales),
    ];
    if let Some(delta) = state.rerun_delta_cents {
        lines.push(format!("rerun delta   {}", format_signed_dollars(delta)));
    }
    if let Some(server) = &state.server_summary {
        lines.push(String::new());
        lines.push(format!(
            "server {} / {} / {} ({})",
            format_compact_dollars(server.estimate_low_cents),
            format_compact_dollars(server.estimate_mid_cents),
            format_compact_dollars(server.estimate_high_cents),
            server.confidence.as_str(),
        ));
    }
    if let Some(context) = &state.market_context {
        if let Some(dom) = context.avg_days_on_market {
            lines.push(format!("area dom      {dom:.0}"));
        }
        if let Some(median) = context.median_sale_price_cents {
            lines.push(format!("area median   {}", format_compact_dollars(median)));
        }
        if let Some(trend) = &context.trend_direction {
            lines.push(format!("area trend    {trend}"));
        }
    }
    if let Some(market) = &view_data.market {
        lines.push(String::new());
        lines.push(format!(
            "inventory {} | dom {:.0}",
            market.inventory, market.avg_days_on_market,
        ));
        lines.push(format!("list-to-sale  {}", format_ratio_percent(market.list_to_sale_ratio)));
        if let Some(point) = market.trend.last() {
            lines.push(format!("month median  {}", format_compact_dollars(point.median_price_cents)));
        }
    }
    lines.join("\n")
}

fn render_breakdown_text(state: &WorkspaceState, breakdown: &BreakdownUi) -> String {
    let Some(id) = &breakdown.listing_id else {
        return String::new();
    };
    let Some(comp) = state.comparable(id) else {
        return format!("listing {id} is no longer in the pool");
    };
    let mut lines = vec![
        format!("{} | {}", comp.listing_id, comp.address),
        format!("baseline {}", format_dollars(comp.baseline_adjusted_cents)),
        String::new(),
    ];
    if comp.adjustments.is_empty() {
        lines.push("no characteristic adjustments".to_owned());
    }
    for line in &comp.adjustments {
        lines.push(format!(
            "{:<14} {:>12}  {}",
            line.feature,
            format_signed_dollars(line.delta_cents),
            line.explanation,
        ));
    }
    lines.push(String::new());
    lines.push(format!("adjusted {}", format_dollars(comp.adjusted_price_cents)));
    lines.push("press any key to close".to_owned());
    lines.join("\n")
}

fn render_session_browser_text(browser: &SessionBrowserUi) -> String {
    if browser.rows.is_empty() {
        return "no saved sessions\n\nesc close".to_owned();
    }
    let mut lines = Vec::with_capacity(browser.rows.len() + 2);
    for (index, row) in browser.rows.iter().enumerate() {
        let marker = if index == browser.cursor { ">" } else { " " };
        let star = if row.favorite { "★" } else { " " };
        lines.push(format!(
            "{marker} {star} #{:<4} {:<28} {:>9} {:>3} comps  {}",
            row.id.get(),
            truncate_label(&row.name, 28),
            format_compact_dollars(row.mid_estimate_cents),
            row.comparable_count,
            format_date(row.saved_on),
        ));
    }
    lines.push(String::new());
    lines.push("enter load | d delete | f favorite | esc close".to_owned());
    lines.join("\n")
}

fn render_filter_form_text(ui: &FilterFormUi) -> String {
    render_form_lines(&FILTER_FIELDS, ui.field, ui.error.as_ref(), |index| {
        filter_field_value(&ui.form, index)
    })
}

fn render_arv_form_text(ui: &ArvFormUi) -> String {
    render_form_lines(&ARV_FIELDS, ui.field, ui.error.as_ref(), |index| {
        arv_field_value(&ui.form, index)
    })
}

fn render_save_form_text(ui: &SaveFormUi) -> String {
    render_form_lines(&SAVE_FIELDS, ui.field, ui.error.as_ref(), |index| {
        save_field_value(&ui.form, index)
    })
}

fn render_form_lines(
    specs: &[FormFieldSpec],
    active: usize,
    error: Option<&String>,
    value_for: impl Fn(usize) -> String,
) -> String {
    let mut lines: Vec<String> = specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let marker = if index == active { ">" } else { " " };
            format!("{marker} {:<24} {}", spec.label, value_for(index))
        })
        .collect();
    lines.push(String::new());
    lines.push(match error {
        Some(error) => format!("!! {error}"),
        None => "enter apply | tab/shift-tab move | esc cancel".to_owned(),
    });
    lines.join("\n")
}

fn render_weight_edit_text(state: &WorkspaceState, ui: &WeightEditUi) -> String {
    let target = ui
        .listing_id
        .as_ref()
        .and_then(|id| state.comparable(id))
        .map_or_else(String::new, |comp| {
            format!("{} (grade {})", comp.address, comp.grade.as_str())
        });
    [
        target,
        format!("> {}_", ui.buffer),
        String::new(),
        "enter apply | empty clears | esc cancel".to_owned(),
    ]
    .join("\n")
}

fn help_overlay_text() -> String {
    [
        "j/k or arrows   move the cursor      h/l  previous/next page",
        "space/enter     include or exclude the comparable",
        "w               weight override      d    adjustment breakdown",
        "r/c             comparable road/condition",
        "R/C             subject road/condition",
        "s               cycle sort           1-4  grade A/near/recent/pool",
        "g               fetch comparables    G    re-fetch keeping curation",
        "F               fetch filters        a/A  arv scenario / reset",
        "S               save session         o    session browser",
        "u               rerun saved analysis x    export report",
        "m               market conditions    v    favorite comparable",
        "?               toggle help          ctrl+q quit",
    ]
    .join("\n")
}

fn status_text(state: &WorkspaceState, view_data: &ViewData) -> String {
    if status_hidden_by_overlay(view_data) {
        return String::new();
    }
    let phase = state.phase.label();
    let loading = if state.is_loading() { " | fetching" } else { "" };
    let hints = "space select | g fetch | F filters | S save | o sessions | ? help";
    match &state.status_line {
        Some(status) => format!("{phase}{loading} | {status} | {hints}"),
        None => format!("{phase}{loading} | {hints}"),
    }
}

fn status_hidden_by_overlay(view_data: &ViewData) -> bool {
    view_data.help_visible
        || view_data.weight_edit.visible
        || view_data.filter_form.visible
        || view_data.arv_form.visible
        || view_data.save_form.visible
        || view_data.session_browser.visible
        || view_data.breakdown.visible
}

fn sparkline(points: &[ValueTrendPoint]) -> String {
    let values: Vec<i64> = points.iter().map(|point| point.estimate_cents).collect();
    let (Some(min), Some(max)) =
        (values.iter().min().copied(), values.iter().max().copied())
    else {
        return String::new();
    };
    let span = (max - min).max(1);
    values
        .iter()
        .map(|value| {
            let level = ((value - min) * (SPARK_LEVELS.len() as i64 - 1) / span) as usize;
            SPARK_LEVELS[level]
        })
        .collect()
}

fn truncate_label(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }
    let kept: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use avaluo_app::{
        AdjustmentLine, ComparableProperty, Grade, SavedComparable, SessionPhase,
        SummaryStatistics, TrendPoint,
    };
    use time::Date;
    use time::macros::date;

    const TODAY: Date = date!(2026 - 04 - 15);

    fn subject() -> SubjectProperty {
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
            road_type: RoadType::Neighborhood,
            condition: PropertyCondition::Average,
            latitude: None,
            longitude: None,
        }
    }

    fn comp(id: i64, grade: Grade, adjusted: i64) -> ComparableProperty {
        ComparableProperty {
            listing_id: ListingId::from(id),
            address: format!("{id} Elm St"),
            raw_price_cents: adjusted,
            adjusted_price_cents: adjusted,
            baseline_adjusted_cents: adjusted,
            adjustments: Vec::new(),
            grade,
            score: 90.0,
            distance_miles: 0.4,
            weight: grade.base_weight(),
            weight_override: None,
            road_type: RoadType::Neighborhood,
            condition: PropertyCondition::Average,
            beds: 3,
            baths: 2.0,
            sqft: 1800,
            close_date: Some(date!(2026 - 03 - 20)),
            status: ListingStatus::Closed,
            pool: false,
        }
    }

    fn payload(comparables: Vec<ComparableProperty>) -> ComparablesPayload {
        ComparablesPayload { comparables, server_summary: None, market_context: None }
    }

    fn saved_session(
        id: i64,
        comparables: Vec<ComparableProperty>,
        selected: &[i64],
        overrides: &[(i64, f64)],
    ) -> CmaSession {
        let comparables = comparables
            .into_iter()
            .map(|comparable| {
                let number: i64 = comparable.listing_id.as_str().parse().unwrap();
                SavedComparable {
                    selected: selected.contains(&number),
                    weight_override: overrides
                        .iter()
                        .find(|(candidate, _)| *candidate == number)
                        .map(|(_, weight)| *weight),
                    comparable,
                }
            })
            .collect();
        CmaSession {
            id: SessionId::new(id),
            name: format!("session {id}"),
            description: String::new(),
            saved_on: Some(date!(2026 - 04 - 01)),
            favorite: false,
            standalone: false,
            subject: subject(),
            arv_active: false,
            arv_original: None,
            filters: FetchFilters::default(),
            comparables,
            summary: SummaryStatistics::default(),
        }
    }

    fn session_row(id: i64, name: &str) -> SessionSummaryRow {
        SessionSummaryRow {
            id: SessionId::new(id),
            name: name.to_owned(),
            description: String::new(),
            saved_on: Some(date!(2026 - 04 - 01)),
            favorite: false,
            mid_estimate_cents: 48_000_000,
            comparable_count: 2,
        }
    }

    #[derive(Debug, Default)]
    struct TestRuntime {
        payload: Option<ComparablesPayload>,
        fail_with: Option<String>,
        fetch_count: usize,
        saved: Vec<SessionDraft>,
        next_session_id: i64,
        sessions: Vec<CmaSession>,
        rows: Vec<SessionSummaryRow>,
        deleted: Vec<SessionId>,
        session_favorites: Vec<SessionId>,
        comp_favorites: BTreeSet<ListingId>,
        persisted: Vec<(ListingId, CharacteristicValue)>,
        exports: Vec<SessionDraft>,
        export_url: Option<String>,
        market: Option<MarketConditions>,
        trend: Vec<ValueTrendPoint>,
    }

    impl WorkspaceRuntime for TestRuntime {
        fn fetch_comparables(
            &mut self,
            _subject: &SubjectProperty,
            _filters: &FetchFilters,
        ) -> Result<ComparablesPayload> {
            self.fetch_count += 1;
            if let Some(message) = &self.fail_with {
                anyhow::bail!("{message}");
            }
            Ok(self.payload.clone().unwrap_or_else(|| payload(Vec::new())))
        }

        fn save_session(&mut self, draft: &SessionDraft) -> Result<SessionId> {
            self.saved.push(draft.clone());
            let id = match draft.id {
                Some(id) => id,
                None => {
                    self.next_session_id += 1;
                    SessionId::new(self.next_session_id)
                }
            };
            Ok(id)
        }

        fn load_session(&mut self, id: SessionId) -> Result<CmaSession> {
            self.sessions
                .iter()
                .find(|session| session.id == id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("session not found"))
        }

        fn list_sessions(&mut self, _limit: u32) -> Result<Vec<SessionSummaryRow>> {
            Ok(self.rows.clone())
        }

        fn delete_session(&mut self, id: SessionId) -> Result<()> {
            self.deleted.push(id);
            Ok(())
        }

        fn toggle_session_favorite(&mut self, id: SessionId) -> Result<bool> {
            if let Some(position) = self.session_favorites.iter().position(|fav| *fav == id) {
                self.session_favorites.remove(position);
                Ok(false)
            } else {
                self.session_favorites.push(id);
                Ok(true)
            }
        }

        fn market_conditions(
            &mut self,
            _subject: &SubjectProperty,
            _months: u32,
        ) -> Result<MarketConditions> {
            self.market.clone().ok_or_else(|| anyhow::anyhow!("market unavailable"))
        }

        fn value_trend(
            &mut self,
            _listing_id: &ListingId,
            _months: u32,
        ) -> Result<Vec<ValueTrendPoint>> {
            Ok(self.trend.clone())
        }

        fn export_report(&mut self, draft: &SessionDraft) -> Result<String> {
            self.exports.push(draft.clone());
            self.export_url.clone().ok_or_else(|| anyhow::anyhow!("export unavailable"))
        }

        fn persist_characteristic(
            &mut self,
            listing_id: &ListingId,
            value: CharacteristicValue,
        ) -> Result<()> {
            self.persisted.push((listing_id.clone(), value));
            Ok(())
        }

        fn comparable_favorites(&mut self) -> Result<BTreeSet<ListingId>> {
            Ok(self.comp_favorites.clone())
        }

        fn toggle_comparable_favorite(&mut self, listing_id: &ListingId) -> Result<bool> {
            if self.comp_favorites.remove(listing_id) {
                Ok(false)
            } else {
                self.comp_favorites.insert(listing_id.clone());
                Ok(true)
            }
        }
    }

    fn workspace() -> WorkspaceState {
        WorkspaceState::new(subject(), FetchFilters::default(), TODAY)
    }

    fn internal_channel() -> (Sender<InternalEvent>, Receiver<InternalEvent>) {
        mpsc::channel()
    }

    fn press(
        state: &mut WorkspaceState,
        runtime: &mut TestRuntime,
        view: &mut ViewData,
        tx: &Sender<InternalEvent>,
        code: KeyCode,
    ) -> bool {
        press_mod(state, runtime, view, tx, code, KeyModifiers::NONE)
    }

    fn press_mod(
        state: &mut WorkspaceState,
        runtime: &mut TestRuntime,
        view: &mut ViewData,
        tx: &Sender<InternalEvent>,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> bool {
        handle_key_event(state, runtime, view, tx, KeyEvent::new(code, modifiers))
    }

    fn type_text(
        state: &mut WorkspaceState,
        runtime: &mut TestRuntime,
        view: &mut ViewData,
        tx: &Sender<InternalEvent>,
        text: &str,
    ) {
        for ch in text.chars() {
            press(state, runtime, view, tx, KeyCode::Char(ch));
        }
    }

    fn pump(
        state: &mut WorkspaceState,
        view: &mut ViewData,
        tx: &Sender<InternalEvent>,
        rx: &Receiver<InternalEvent>,
    ) {
        process_internal_events(state, view, tx, rx);
    }

    fn loaded(
        comparables: Vec<ComparableProperty>,
    ) -> (WorkspaceState, TestRuntime, ViewData, Sender<InternalEvent>, Receiver<InternalEvent>)
    {
        let mut state = workspace();
        let mut runtime = TestRuntime { payload: Some(payload(comparables)), ..Default::default() };
        let mut view = ViewData::default();
        let (tx, rx) = internal_channel();
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('g'));
        pump(&mut state, &mut view, &tx, &rx);
        (state, runtime, view, tx, rx)
    }

    #[test]
    fn fetch_key_loads_comparables_and_defaults_selection() {
        let (state, runtime, _view, _tx, _rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::B, 48_000_000),
            comp(3, Grade::C, 46_000_000),
        ]);
        assert_eq!(runtime.fetch_count, 1);
        assert_eq!(state.comparables.len(), 3);
        assert!(state.is_selected(&ListingId::from(1)));
        assert!(state.is_selected(&ListingId::from(2)));
        assert!(!state.is_selected(&ListingId::from(3)));
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("3 comparables")));
    }

    #[test]
    fn second_fetch_while_loading_is_rejected() {
        let mut state = workspace();
        let mut runtime = TestRuntime {
            payload: Some(payload(vec![comp(1, Grade::A, 50_000_000)])),
            ..Default::default()
        };
        let mut view = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('g'));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('g'));
        assert_eq!(runtime.fetch_count, 1);
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("already running")));

        pump(&mut state, &mut view, &tx, &rx);
        assert_eq!(state.comparables.len(), 1);
        assert!(!state.is_loading());
    }

    #[test]
    fn failed_fetch_surfaces_the_message_and_frees_the_slot() {
        let mut state = workspace();
        let mut runtime =
            TestRuntime { fail_with: Some("gateway timed out".to_owned()), ..Default::default() };
        let mut view = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('g'));
        pump(&mut state, &mut view, &tx, &rx);
        assert!(state.comparables.is_empty());
        assert!(!state.is_loading());
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("gateway timed out")));

        runtime.fail_with = None;
        runtime.payload = Some(payload(vec![comp(1, Grade::A, 50_000_000)]));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('g'));
        pump(&mut state, &mut view, &tx, &rx);
        assert_eq!(runtime.fetch_count, 2);
        assert_eq!(state.comparables.len(), 1);
    }

    #[test]
    fn stale_fetch_completion_is_dropped() {
        let mut state = workspace();
        let mut view = ViewData::default();
        let (tx, rx) = internal_channel();

        tx.send(InternalEvent::Fetch(FetchEvent::Completed {
            token: 99,
            payload: payload(vec![comp(1, Grade::A, 50_000_000)]),
        }))
        .unwrap();
        pump(&mut state, &mut view, &tx, &rx);
        assert!(state.comparables.is_empty());
        assert!(view.activity.latest().contains("superseded"));
    }

    #[test]
    fn stale_status_clear_token_is_ignored() {
        let (mut state, _runtime, mut view, tx, rx) = loaded(vec![comp(1, Grade::A, 50_000_000)]);
        assert!(state.status_line.is_some());

        tx.send(InternalEvent::ClearStatus { token: view.status_token.wrapping_sub(1) }).unwrap();
        pump(&mut state, &mut view, &tx, &rx);
        assert!(state.status_line.is_some());

        tx.send(InternalEvent::ClearStatus { token: view.status_token }).unwrap();
        pump(&mut state, &mut view, &tx, &rx);
        assert!(state.status_line.is_none());
    }

    #[test]
    fn space_toggles_the_cursor_comparable() {
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::A, 48_000_000),
        ]);
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char(' '));
        assert!(!state.is_selected(&ListingId::from(1)));
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("excluded")));

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char(' '));
        assert!(state.is_selected(&ListingId::from(1)));
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("included")));
    }

    #[test]
    fn weight_editor_sets_and_clears_the_override() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('w'));
        assert!(view.weight_edit.visible);
        assert_eq!(view.weight_edit.buffer, "");
        type_text(&mut state, &mut runtime, &mut view, &tx, "1.5");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        assert!(!view.weight_edit.visible);
        assert_eq!(
            state.comparable(&ListingId::from(1)).and_then(|c| c.weight_override),
            Some(1.5),
        );

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('w'));
        assert_eq!(view.weight_edit.buffer, "1.5");
        for _ in 0..3 {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Backspace);
        }
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        assert_eq!(state.comparable(&ListingId::from(1)).and_then(|c| c.weight_override), None);
    }

    #[test]
    fn weight_editor_rejects_a_bad_multiplier() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('w'));
        type_text(&mut state, &mut runtime, &mut view, &tx, "99");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        assert!(view.weight_edit.visible);
        assert_eq!(state.comparable(&ListingId::from(1)).and_then(|c| c.weight_override), None);
        assert!(state.status_line.is_some());
    }

    #[test]
    fn road_cycle_on_a_comparable_recomputes_and_persists() {
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::A, 40_000_000),
        ]);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('r'));
        let first = state.comparable(&ListingId::from(1)).unwrap();
        assert_eq!(first.road_type, RoadType::CulDeSac);
        assert_eq!(first.adjusted_price_cents, 48_500_000);
        let second = state.comparable(&ListingId::from(2)).unwrap();
        assert_eq!(second.adjusted_price_cents, 40_000_000);

        assert_eq!(runtime.persisted.len(), 1);
        assert_eq!(runtime.persisted[0].0.as_str(), "1");
        assert!(matches!(runtime.persisted[0].1, CharacteristicValue::Road(RoadType::CulDeSac)));
    }

    #[test]
    fn subject_condition_cycle_recomputes_every_comparable() {
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::A, 40_000_000),
        ]);

        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('C'),
            KeyModifiers::SHIFT,
        );
        assert_eq!(state.subject.condition, PropertyCondition::Updated);
        assert_eq!(
            state.comparable(&ListingId::from(1)).unwrap().adjusted_price_cents,
            53_000_000,
        );
        assert_eq!(
            state.comparable(&ListingId::from(2)).unwrap().adjusted_price_cents,
            42_400_000,
        );
        assert_eq!(runtime.persisted.len(), 1);
        assert_eq!(runtime.persisted[0].0.as_str(), "S-1");
    }

    #[test]
    fn quick_filter_keys_narrow_the_table() {
        let mut comparables: Vec<ComparableProperty> =
            (1..=30).map(|id| comp(id, Grade::A, 50_000_000 + id * 10_000)).collect();
        comparables.extend((31..=45).map(|id| comp(id, Grade::C, 40_000_000 + id * 10_000)));
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(comparables);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('l'));
        assert_eq!(state.page, 1);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('1'));
        assert!(state.active_filters.contains(&QuickFilter::GradeA));
        assert_eq!(state.visible_comparables().len(), 30);
        assert_eq!(state.page, 0);
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("grade A")));

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('1'));
        assert_eq!(state.visible_comparables().len(), 45);
    }

    #[test]
    fn sort_key_cycles_the_order() {
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::A, 40_000_000),
        ]);
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('s'));
        assert_eq!(state.sort, SortKey::PriceAsc);
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("price")));
        assert_eq!(state.page_comparables()[0].listing_id.as_str(), "2");
    }

    #[test]
    fn page_keys_stay_in_bounds() {
        let comparables: Vec<ComparableProperty> =
            (1..=45).map(|id| comp(id, Grade::A, 50_000_000 + id * 10_000)).collect();
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(comparables);
        assert_eq!(state.page_count(), 3);

        for _ in 0..4 {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('l'));
        }
        assert_eq!(state.page, 2);
        for _ in 0..4 {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('h'));
        }
        assert_eq!(state.page, 0);
    }

    #[test]
    fn page_change_clamps_the_cursor() {
        let comparables: Vec<ComparableProperty> =
            (1..=45).map(|id| comp(id, Grade::A, 50_000_000 + id * 10_000)).collect();
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(comparables);

        for _ in 0..10 {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('j'));
        }
        assert_eq!(view.cursor, 10);
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('l'));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('l'));
        assert_eq!(state.page, 2);
        assert_eq!(state.page_comparables().len(), 5);
        assert_eq!(view.cursor, 4);
    }

    #[test]
    fn filter_form_applies_and_triggers_a_fresh_fetch() {
        let (mut state, mut runtime, mut view, tx, rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);

        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('F'),
            KeyModifiers::SHIFT,
        );
        assert!(view.filter_form.visible);
        for _ in 0..5 {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Backspace);
        }
        type_text(&mut state, &mut runtime, &mut view, &tx, "2.5");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        pump(&mut state, &mut view, &tx, &rx);

        assert!(!view.filter_form.visible);
        assert_eq!(state.filters.radius_miles, 2.5);
        assert_eq!(runtime.fetch_count, 2);
    }

    #[test]
    fn filter_form_keeps_bad_input_inline() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);

        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('F'),
            KeyModifiers::SHIFT,
        );
        for _ in 0..5 {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Backspace);
        }
        type_text(&mut state, &mut runtime, &mut view, &tx, "zz");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);

        assert!(view.filter_form.visible);
        assert!(view.filter_form.error.is_some());
        assert_eq!(state.filters.radius_miles, 1.0);
        assert_eq!(runtime.fetch_count, 1);
    }

    #[test]
    fn filter_form_toggles_statuses() {
        let (mut state, mut runtime, mut view, tx, rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);

        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('F'),
            KeyModifiers::SHIFT,
        );
        for _ in 0..9 {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Tab);
        }
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        pump(&mut state, &mut view, &tx, &rx);

        assert!(state.filters.statuses.contains(&ListingStatus::Active));
        assert!(state.filters.statuses.contains(&ListingStatus::Closed));
    }

    #[test]
    fn arv_apply_refetches_preserving_curation() {
        let (mut state, mut runtime, mut view, tx, rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::C, 48_000_000),
        ]);
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('j'));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char(' '));
        assert!(state.is_selected(&ListingId::from(2)));

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('a'));
        assert!(view.arv_form.visible);
        assert_eq!(view.arv_form.form.beds, "3");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Backspace);
        type_text(&mut state, &mut runtime, &mut view, &tx, "4");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        pump(&mut state, &mut view, &tx, &rx);

        assert!(state.arv.active);
        assert_eq!(state.subject.beds, 4);
        assert!(state.is_selected(&ListingId::from(1)));
        assert!(state.is_selected(&ListingId::from(2)));
        assert_eq!(runtime.fetch_count, 2);
    }

    #[test]
    fn arv_reset_restores_the_subject() {
        let (mut state, mut runtime, mut view, tx, rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::C, 48_000_000),
        ]);
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('a'));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Backspace);
        type_text(&mut state, &mut runtime, &mut view, &tx, "5");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        pump(&mut state, &mut view, &tx, &rx);
        assert_eq!(state.subject.beds, 5);

        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('A'),
            KeyModifiers::SHIFT,
        );
        pump(&mut state, &mut view, &tx, &rx);
        assert_eq!(state.subject.beds, 3);
        assert!(!state.arv.active);
        assert_eq!(runtime.fetch_count, 3);
    }

    #[test]
    fn arv_reset_without_a_scenario_is_inert() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('A'),
            KeyModifiers::SHIFT,
        );
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("no arv scenario")));
        assert_eq!(runtime.fetch_count, 1);
    }

    #[test]
    fn save_form_requires_a_name() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('S'),
            KeyModifiers::SHIFT,
        );
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        assert!(view.save_form.visible);
        assert!(view.save_form.error.as_deref().is_some_and(|e| e.contains("name")));
        assert!(runtime.saved.is_empty());
    }

    #[test]
    fn save_form_captures_the_live_workspace() {
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(vec![
            comp(1, Grade::A, 50_000_000),
            comp(2, Grade::C, 48_000_000),
        ]);
        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('S'),
            KeyModifiers::SHIFT,
        );
        type_text(&mut state, &mut runtime, &mut view, &tx, "spring flip");
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);

        assert!(!view.save_form.visible);
        assert_eq!(runtime.saved.len(), 1);
        let draft = &runtime.saved[0];
        assert_eq!(draft.name, "spring flip");
        assert_eq!(draft.id, None);
        assert_eq!(draft.comparables.len(), 2);
        let first = draft.comparables.iter().find(|c| c.comparable.listing_id.as_str() == "1");
        assert!(first.is_some_and(|c| c.selected));
        let second = draft.comparables.iter().find(|c| c.comparable.listing_id.as_str() == "2");
        assert!(second.is_some_and(|c| !c.selected));
        assert_eq!(state.phase, SessionPhase::Saved(SessionId::new(1)));
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("saved")));
    }

    #[test]
    fn save_form_updates_the_loaded_session() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        state.session_loaded(SessionId::new(9), "baseline", 48_000_000, FetchFilters::default());

        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('S'),
            KeyModifiers::SHIFT,
        );
        assert_eq!(view.save_form.form.name, "baseline");
        assert!(view.save_form.form.update_current);
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);

        assert_eq!(runtime.saved[0].id, Some(SessionId::new(9)));
        assert_eq!(state.phase, SessionPhase::Saved(SessionId::new(9)));
    }

    #[test]
    fn session_browser_loads_and_restores_curation() {
        let mut state = workspace();
        let mut runtime = TestRuntime {
            payload: Some(payload(vec![
                comp(101, Grade::A, 50_000_000),
                comp(102, Grade::A, 48_000_000),
            ])),
            sessions: vec![saved_session(
                7,
                vec![comp(101, Grade::A, 50_000_000), comp(102, Grade::A, 48_000_000)],
                &[101],
                &[(101, 1.5)],
            )],
            rows: vec![session_row(7, "session 7")],
            ..Default::default()
        };
        let mut view = ViewData::default();
        let (tx, rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('o'));
        assert!(view.session_browser.visible);
        assert_eq!(view.session_browser.rows.len(), 1);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Enter);
        pump(&mut state, &mut view, &tx, &rx);

        assert!(!view.session_browser.visible);
        assert_eq!(state.phase, SessionPhase::Loaded(SessionId::new(7)));
        assert!(state.is_selected(&ListingId::from(101)));
        assert!(!state.is_selected(&ListingId::from(102)));
        assert_eq!(
            state.comparable(&ListingId::from(101)).and_then(|c| c.weight_override),
            Some(1.5),
        );
        assert_eq!(state.loaded.as_ref().map(|l| l.name.as_str()), Some("session 7"));
    }

    #[test]
    fn session_browser_deletes_the_selected_row() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        runtime.rows = vec![session_row(7, "first"), session_row(8, "second")];

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('o'));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('d'));
        assert_eq!(runtime.deleted, vec![SessionId::new(7)]);
        assert_eq!(view.session_browser.rows.len(), 1);
        assert_eq!(view.session_browser.rows[0].name, "second");
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("deleted")));
    }

    #[test]
    fn session_browser_toggles_the_favorite_flag() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        runtime.rows = vec![session_row(7, "first")];

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('o'));
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('f'));
        assert!(view.session_browser.rows[0].favorite);
        assert_eq!(runtime.session_favorites, vec![SessionId::new(7)]);
    }

    #[test]
    fn rerun_restores_saved_filters_and_reports_the_delta() {
        let (mut state, mut runtime, mut view, tx, rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        let saved_filters = FetchFilters { radius_miles: 2.0, ..FetchFilters::default() };
        state.session_loaded(SessionId::new(3), "baseline", 48_000_000, saved_filters);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('u'));
        assert_eq!(state.phase, SessionPhase::RerunInProgress(SessionId::new(3)));
        pump(&mut state, &mut view, &tx, &rx);

        assert_eq!(state.filters.radius_miles, 2.0);
        assert_eq!(state.rerun_delta_cents, Some(2_000_000));
        assert_eq!(state.phase, SessionPhase::Modified(SessionId::new(3)));
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("rerun complete")));
    }

    #[test]
    fn rerun_without_a_session_is_rejected() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('u'));
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("no session loaded")));
        assert_eq!(runtime.fetch_count, 1);
    }

    #[test]
    fn export_reports_the_artifact_url() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        runtime.export_url = Some("https://files.example.com/cma-7.pdf".to_owned());

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('x'));
        assert_eq!(runtime.exports.len(), 1);
        assert_eq!(runtime.exports[0].name, "cma report");
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("cma-7.pdf")));
    }

    #[test]
    fn export_requires_comparables() {
        let mut state = workspace();
        let mut runtime = TestRuntime::default();
        let mut view = ViewData::default();
        let (tx, _rx) = internal_channel();

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('x'));
        assert!(runtime.exports.is_empty());
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("nothing to export")));
    }

    #[test]
    fn market_key_fills_the_panel() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        runtime.market = Some(MarketConditions {
            inventory: 120,
            avg_days_on_market: 28.0,
            list_to_sale_ratio: 0.98,
            trend: vec![TrendPoint { month: date!(2026 - 03 - 01), median_price_cents: 41_000_000 }],
        });
        runtime.trend = vec![
            ValueTrendPoint { on: date!(2026 - 02 - 01), estimate_cents: 49_000_000 },
            ValueTrendPoint { on: date!(2026 - 03 - 01), estimate_cents: 49_500_000 },
            ValueTrendPoint { on: date!(2026 - 04 - 01), estimate_cents: 50_000_000 },
        ];

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('m'));
        assert!(view.market.is_some());
        assert_eq!(view.trend.len(), 3);
        assert!(state.status_line.as_deref().is_some_and(|s| s.contains("market")));
    }

    #[test]
    fn favorite_key_marks_the_cursor_comparable() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('v'));
        assert!(view.favorites.contains(&ListingId::from(1)));
        assert!(runtime.comp_favorites.contains(&ListingId::from(1)));

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('v'));
        assert!(!view.favorites.contains(&ListingId::from(1)));
        assert!(runtime.comp_favorites.is_empty());
    }

    #[test]
    fn breakdown_overlay_shows_adjustment_lines() {
        let mut one = comp(1, Grade::A, 48_500_000);
        one.baseline_adjusted_cents = 50_000_000;
        one.adjustments = vec![AdjustmentLine {
            feature: "road".to_owned(),
            delta_cents: -1_500_000,
            explanation: "busy road vs neighborhood".to_owned(),
        }];
        let (mut state, mut runtime, mut view, tx, _rx) = loaded(vec![one]);

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('d'));
        assert!(view.breakdown.visible);
        let text = render_breakdown_text(&state, &view.breakdown);
        assert!(text.contains("busy road vs neighborhood"));
        assert!(text.contains("-$15,000"));
        assert!(text.contains("$500,000"));

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('j'));
        assert!(!view.breakdown.visible);
        assert_eq!(view.cursor, 0);
    }

    #[test]
    fn help_overlay_hides_the_status_line() {
        let (mut state, mut runtime, mut view, tx, _rx) =
            loaded(vec![comp(1, Grade::A, 50_000_000)]);
        press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('?'),
            KeyModifiers::SHIFT,
        );
        assert!(view.help_visible);
        assert_eq!(status_text(&state, &view), "");

        press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char('j'));
        assert!(!view.help_visible);
        assert!(status_text(&state, &view).contains("no session"));
    }

    #[test]
    fn empty_pool_keys_are_inert() {
        let mut state = workspace();
        let mut runtime = TestRuntime::default();
        let mut view = ViewData::default();
        let (tx, _rx) = internal_channel();

        for code in ['j', 'k', ' ', 'w', 'r', 'c', 'v', 'd'] {
            press(&mut state, &mut runtime, &mut view, &tx, KeyCode::Char(code));
        }
        assert_eq!(view.cursor, 0);
        assert!(!view.weight_edit.visible);
        assert!(!view.breakdown.visible);
        assert!(runtime.persisted.is_empty());
    }

    #[test]
    fn activity_log_is_bounded() {
        let mut log = ActivityLog::default();
        for index in 0..60 {
            log.push(format!("entry {index}"));
        }
        assert_eq!(log.entries.len(), ACTIVITY_CAP);
        assert_eq!(log.latest(), "entry 59");
    }

    #[test]
    fn sparkline_scales_between_min_and_max() {
        let points = vec![
            ValueTrendPoint { on: date!(2026 - 01 - 01), estimate_cents: 100 },
            ValueTrendPoint { on: date!(2026 - 02 - 01), estimate_cents: 200 },
            ValueTrendPoint { on: date!(2026 - 03 - 01), estimate_cents: 300 },
        ];
        assert_eq!(sparkline(&points), "▁▄█");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn status_text_shows_phase_and_fetch_marker() {
        let mut state = workspace();
        let view = ViewData::default();
        assert!(status_text(&state, &view).starts_with("no session"));

        state.begin_fetch(SelectionPlan::GradeDefault);
        assert!(status_text(&state, &view).contains("fetching"));
    }

    #[test]
    fn ctrl_q_quits() {
        let mut state = workspace();
        let mut runtime = TestRuntime::default();
        let mut view = ViewData::default();
        let (tx, _rx) = internal_channel();

        let quit = press_mod(
            &mut state,
            &mut runtime,
            &mut view,
            &tx,
            KeyCode::Char('q'),
            KeyModifiers::CONTROL,
        );
        assert!(quit);
    }
}
