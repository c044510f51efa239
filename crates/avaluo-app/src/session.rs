// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;
use crate::model::*;
use crate::valuation::compute_summary;
use crate::workspace::{SelectionPlan, WorkspaceEvent, WorkspaceState};

/// A session snapshot ready to save. `id` present means "update that
/// session"; absent means the store assigns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub id: Option<SessionId>,
    pub name: String,
    pub description: String,
    pub standalone: bool,
    pub subject: SubjectProperty,
    pub arv_active: bool,
    pub arv_original: Option<SubjectProperty>,
    pub filters: FetchFilters,
    pub comparables: Vec<SavedComparable>,
    pub summary: SummaryStatistics,
}

/// Captures the live workspace. Every comparable is annotated from the
/// current selection and overrides, and the summary is recomputed fresh
/// from the selected subset so the saved summary always matches the saved
/// selection.
pub fn capture(
    state: &WorkspaceState,
    id: Option<SessionId>,
    name: &str,
    description: &str,
    standalone: bool,
) -> SessionDraft {
    let comparables: Vec<SavedComparable> = state
        .comparables
        .iter()
        .map(|comp| SavedComparable {
            selected: state.is_selected(&comp.listing_id),
            weight_override: comp.weight_override,
            comparable: comp.clone(),
        })
        .collect();

    let summary = {
        let selected = state.selected_comparables();
        compute_summary(&selected, state.today)
    };

    SessionDraft {
        id,
        name: name.to_owned(),
        description: description.to_owned(),
        standalone,
        subject: state.subject.clone(),
        arv_active: state.arv.active,
        arv_original: state.arv.original.clone(),
        filters: state.filters.clone(),
        comparables,
        summary,
    }
}

/// The selection plan a loaded session implies: annotated ids re-matched
/// against whatever the follow-up fetch returns.
pub fn restore_plan(session: &CmaSession) -> SelectionPlan {
    let selected: Vec<_> = session
        .comparables
        .iter()
        .filter(|entry| entry.selected)
        .map(|entry| entry.comparable.listing_id.clone())
        .collect();
    let overrides: Vec<_> = session
        .comparables
        .iter()
        .filter_map(|entry| {
            entry
                .weight_override
                .map(|weight| (entry.comparable.listing_id.clone(), weight))
        })
        .collect();
    SelectionPlan::Restore {
        selected,
        overrides,
    }
}

/// First half of a session load: subject (with saved ARV state reapplied)
/// and filters. The caller then claims the fetch slot with
/// [`restore_plan`] and runs the fetch; selection and overrides re-match
/// once the fresh comparables arrive.
pub fn restore_into(state: &mut WorkspaceState, session: &CmaSession) -> Vec<WorkspaceEvent> {
    state.subject = session.subject.clone();
    state.arv.active = session.arv_active;
    state.arv.original = session.arv_original.clone();
    state.filters = session.filters.clone();
    state.session_loaded(
        session.id,
        &session.name,
        session.summary.estimate_mid_cents,
        session.filters.clone(),
    )
}
