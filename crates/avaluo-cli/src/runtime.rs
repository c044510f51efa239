// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use avaluo_app::{
    CharacteristicValue, CmaSession, ComparablesPayload, FetchFilters, ListingId,
    MarketConditions, SessionDraft, SessionId, SessionSummaryRow, SubjectProperty,
    ValueTrendPoint,
};
use avaluo_gateway::{Client, GatewayError};
use avaluo_testkit::MarketFaker;
use avaluo_tui::{FetchEvent, InternalEvent, WorkspaceRuntime};
use std::collections::BTreeSet;
use std::sync::mpsc::Sender;
use std::thread;

use crate::favorites::FavoritesStore;

const DEMO_COMPARABLE_COUNT: usize = 24;
const DEMO_SEED_SESSIONS: i64 = 3;

/// Live runtime: every workspace intent goes through the blocking gateway
/// client; comparable favorites live in the local JSON store.
pub struct GatewayRuntime {
    client: Client,
    favorites: FavoritesStore,
}

impl GatewayRuntime {
    pub fn new(client: Client, favorites: FavoritesStore) -> Self {
        Self { client, favorites }
    }
}

// The status line shows `Error::to_string()`, so the user-facing message
// becomes the outermost context and the wire detail stays in the chain.
fn surface(error: GatewayError) -> anyhow::Error {
    let message = error.user_message();
    anyhow::Error::new(error).context(message)
}

impl WorkspaceRuntime for GatewayRuntime {
    fn fetch_comparables(
        &mut self,
        subject: &SubjectProperty,
        filters: &FetchFilters,
    ) -> Result<ComparablesPayload> {
        self.client
            .fetch_comparables(subject, filters)
            .map_err(surface)
    }

    fn save_session(&mut self, draft: &SessionDraft) -> Result<SessionId> {
        self.client.save_session(draft).map_err(surface)
    }

    fn load_session(&mut self, id: SessionId) -> Result<CmaSession> {
        self.client.load_session(id).map_err(surface)
    }

    fn list_sessions(&mut self, limit: u32) -> Result<Vec<SessionSummaryRow>> {
        self.client.list_sessions(limit).map_err(surface)
    }

    fn delete_session(&mut self, id: SessionId) -> Result<()> {
        self.client.delete_session(id).map_err(surface)
    }

    fn toggle_session_favorite(&mut self, id: SessionId) -> Result<bool> {
        self.client.toggle_favorite(id).map_err(surface)
    }

    fn market_conditions(
        &mut self,
        subject: &SubjectProperty,
        months: u32,
    ) -> Result<MarketConditions> {
        self.client
            .market_conditions(subject, months)
            .map_err(surface)
    }

    fn value_trend(
        &mut self,
        listing_id: &ListingId,
        months: u32,
    ) -> Result<Vec<ValueTrendPoint>> {
        self.client.value_trend(listing_id, months).map_err(surface)
    }

    fn export_report(&mut self, draft: &SessionDraft) -> Result<String> {
        self.client.export_report(draft).map_err(surface)
    }

    fn persist_characteristic(
        &mut self,
        listing_id: &ListingId,
        value: CharacteristicValue,
    ) -> Result<()> {
        self.client
            .push_characteristic(listing_id, value)
            .map_err(surface)
    }

    fn comparable_favorites(&mut self) -> Result<BTreeSet<ListingId>> {
        Ok(self.favorites.ids().clone())
    }

    fn toggle_comparable_favorite(&mut self, listing_id: &ListingId) -> Result<bool> {
        self.favorites.toggle(listing_id)
    }

    /// Moves the comparables fetch onto a short-lived thread so the event
    /// loop keeps painting. The outcome arrives tagged with the fetch token;
    /// a stale token is dropped at the event boundary.
    fn spawn_fetch(
        &mut self,
        token: u64,
        subject: &SubjectProperty,
        filters: &FetchFilters,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let subject = subject.clone();
        let filters = filters.clone();
        thread::spawn(move || {
            let event = match client.fetch_comparables(&subject, &filters) {
                Ok(payload) => FetchEvent::Completed { token, payload },
                Err(error) => FetchEvent::Failed {
                    token,
                    message: error.user_message(),
                },
            };
            // The receiver is gone only when the app is shutting down.
            let _ = tx.send(InternalEvent::Fetch(event));
        });
        Ok(())
    }
}

/// Offline runtime for `--demo`: deterministic fixtures, an in-memory
/// session store seeded with a few saved analyses, and in-memory favorites.
/// Same code paths as the live runtime, no network.
pub struct DemoRuntime {
    faker: MarketFaker,
    sessions: Vec<CmaSession>,
    next_session_id: i64,
    favorites: BTreeSet<ListingId>,
    exports: usize,
}

impl DemoRuntime {
    pub fn new(mut faker: MarketFaker) -> Self {
        let sessions = (1..=DEMO_SEED_SESSIONS)
            .map(|id| faker.saved_session(id))
            .collect();
        Self {
            faker,
            sessions,
            next_session_id: DEMO_SEED_SESSIONS,
            favorites: BTreeSet::new(),
            exports: 0,
        }
    }

    fn session_from_draft(draft: &SessionDraft, id: SessionId, favorite: bool) -> CmaSession {
        CmaSession {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            saved_on: Some(avaluo_testkit::reference_today()),
            favorite,
            standalone: draft.standalone,
            subject: draft.subject.clone(),
            arv_active: draft.arv_active,
            arv_original: draft.arv_original.clone(),
            filters: draft.filters.clone(),
            comparables: draft.comparables.clone(),
            summary: draft.summary,
        }
    }
}

impl WorkspaceRuntime for DemoRuntime {
    fn fetch_comparables(
        &mut self,
        subject: &SubjectProperty,
        _filters: &FetchFilters,
    ) -> Result<ComparablesPayload> {
        Ok(self.faker.payload(subject, DEMO_COMPARABLE_COUNT))
    }

    fn save_session(&mut self, draft: &SessionDraft) -> Result<SessionId> {
        match draft.id {
            Some(id) => {
                let favorite = self
                    .sessions
                    .iter()
                    .find(|session| session.id == id)
                    .is_some_and(|session| session.favorite);
                let record = Self::session_from_draft(draft, id, favorite);
                match self.sessions.iter_mut().find(|session| session.id == id) {
                    Some(existing) => *existing = record,
                    None => self.sessions.push(record),
                }
                Ok(id)
            }
            None => {
                self.next_session_id += 1;
                let id = SessionId::new(self.next_session_id);
                self.sessions.push(Self::session_from_draft(draft, id, false));
                Ok(id)
            }
        }
    }

    fn load_session(&mut self, id: SessionId) -> Result<CmaSession> {
        self.sessions
            .iter()
            .find(|session| session.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("session {} not found", id.get()))
    }

    fn list_sessions(&mut self, limit: u32) -> Result<Vec<SessionSummaryRow>> {
        Ok(self
            .sessions
            .iter()
            .take(limit as usize)
            .map(|session| SessionSummaryRow {
                id: session.id,
                name: session.name.clone(),
                description: session.description.clone(),
                saved_on: session.saved_on,
                favorite: session.favorite,
                mid_estimate_cents: session.summary.estimate_mid_cents,
                comparable_count: session.comparables.len(),
            })
            .collect())
    }

    fn delete_session(&mut self, id: SessionId) -> Result<()> {
        self.sessions.retain(|session| session.id != id);
        Ok(())
    }

    fn toggle_session_favorite(&mut self, id: SessionId) -> Result<bool> {
        let session = self
            .sessions
            .iter_mut()
            .find(|session| session.id == id)
            .ok_or_else(|| anyhow::anyhow!("session {} not found", id.get()))?;
        session.favorite = !session.favorite;
        Ok(session.favorite)
    }

    fn market_conditions(
        &mut self,
        _subject: &SubjectProperty,
        months: u32,
    ) -> Result<MarketConditions> {
        Ok(self.faker.market_conditions(months))
    }

    fn value_trend(
        &mut self,
        _listing_id: &ListingId,
        months: u32,
    ) -> Result<Vec<ValueTrendPoint>> {
        Ok(self.faker.value_trend(months))
    }

    fn export_report(&mut self, _draft: &SessionDraft) -> Result<String> {
        self.exports += 1;
        Ok(format!(
            "https://demo.avaluo.invalid/cma-report-{}.pdf",
            self.exports
        ))
    }

    fn persist_characteristic(
        &mut self,
        _listing_id: &ListingId,
        _value: CharacteristicValue,
    ) -> Result<()> {
        Ok(())
    }

    fn comparable_favorites(&mut self) -> Result<BTreeSet<ListingId>> {
        Ok(self.favorites.clone())
    }

    fn toggle_comparable_favorite(&mut self, listing_id: &ListingId) -> Result<bool> {
        if self.favorites.remove(listing_id) {
            Ok(false)
        } else {
            self.favorites.insert(listing_id.clone());
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEMO_SEED_SESSIONS, DemoRuntime};
    use anyhow::Result;
    use avaluo_app::{FetchFilters, SessionDraft, SessionId, SummaryStatistics};
    use avaluo_testkit::MarketFaker;
    use avaluo_tui::WorkspaceRuntime;

    fn demo() -> DemoRuntime {
        DemoRuntime::new(MarketFaker::new(42))
    }

    fn draft(runtime: &mut DemoRuntime, name: &str) -> SessionDraft {
        let mut faker = MarketFaker::new(7);
        let subject = faker.subject();
        let payload = runtime
            .fetch_comparables(&subject, &FetchFilters::default())
            .expect("demo fetch cannot fail");
        SessionDraft {
            id: None,
            name: name.to_owned(),
            description: String::new(),
            standalone: true,
            subject,
            arv_active: false,
            arv_original: None,
            filters: FetchFilters::default(),
            comparables: payload
                .comparables
                .into_iter()
                .map(|comparable| avaluo_app::SavedComparable {
                    comparable,
                    selected: true,
                    weight_override: None,
                })
                .collect(),
            summary: SummaryStatistics::default(),
        }
    }

    #[test]
    fn demo_fetch_is_deterministic_per_seed() -> Result<()> {
        let mut faker = MarketFaker::new(9);
        let subject = faker.subject();
        let left = demo().fetch_comparables(&subject, &FetchFilters::default())?;
        let right = demo().fetch_comparables(&subject, &FetchFilters::default())?;
        assert_eq!(left.comparables, right.comparables);
        assert!(!left.comparables.is_empty());
        Ok(())
    }

    #[test]
    fn demo_starts_with_seeded_sessions() -> Result<()> {
        let mut runtime = demo();
        let rows = runtime.list_sessions(20)?;
        assert_eq!(rows.len(), DEMO_SEED_SESSIONS as usize);
        assert_eq!(runtime.list_sessions(1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn save_then_load_round_trips_a_new_session() -> Result<()> {
        let mut runtime = demo();
        let saved_draft = draft(&mut runtime, "round trip");

        let id = runtime.save_session(&saved_draft)?;
        assert_eq!(id, SessionId::new(DEMO_SEED_SESSIONS + 1));

        let loaded = runtime.load_session(id)?;
        assert_eq!(loaded.name, "round trip");
        assert_eq!(loaded.comparables.len(), saved_draft.comparables.len());
        Ok(())
    }

    #[test]
    fn saving_with_an_existing_id_updates_in_place() -> Result<()> {
        let mut runtime = demo();
        let mut saved_draft = draft(&mut runtime, "first name");
        let id = runtime.save_session(&saved_draft)?;

        assert!(runtime.toggle_session_favorite(id)?);

        saved_draft.id = Some(id);
        saved_draft.name = "second name".to_owned();
        assert_eq!(runtime.save_session(&saved_draft)?, id);

        let loaded = runtime.load_session(id)?;
        assert_eq!(loaded.name, "second name");
        assert!(loaded.favorite, "update keeps the favorite flag");
        assert_eq!(
            runtime.list_sessions(20)?.len(),
            DEMO_SEED_SESSIONS as usize + 1
        );
        Ok(())
    }

    #[test]
    fn delete_removes_the_session() -> Result<()> {
        let mut runtime = demo();
        let id = runtime.list_sessions(20)?[0].id;
        runtime.delete_session(id)?;
        assert!(runtime.load_session(id).is_err());
        assert_eq!(
            runtime.list_sessions(20)?.len(),
            DEMO_SEED_SESSIONS as usize - 1
        );
        Ok(())
    }

    #[test]
    fn comparable_favorites_toggle_in_memory() -> Result<()> {
        let mut runtime = demo();
        let id = avaluo_app::ListingId::from("4200");
        assert!(runtime.toggle_comparable_favorite(&id)?);
        assert!(runtime.comparable_favorites()?.contains(&id));
        assert!(!runtime.toggle_comparable_favorite(&id)?);
        assert!(runtime.comparable_favorites()?.is_empty());
        Ok(())
    }

    #[test]
    fn export_urls_are_distinct_per_report() -> Result<()> {
        let mut runtime = demo();
        let saved_draft = draft(&mut runtime, "export");
        let first = runtime.export_report(&saved_draft)?;
        let second = runtime.export_report(&saved_draft)?;
        assert_ne!(first, second);
        assert!(first.ends_with(".pdf"));
        Ok(())
    }
}
