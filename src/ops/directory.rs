use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::io::source::{FetchError, MentionSource};
use crate::model::candidate::{Candidate, CandidateId, StaffRecord};
use crate::parse::MentionPattern;

/// Liveness flag shared across the async boundary of a refresh.
///
/// The engine kills it on unmount; directory data arriving afterwards is
/// dropped instead of being applied to a dead session.
#[derive(Debug, Clone)]
pub struct SessionGuard(Arc<AtomicBool>);

impl SessionGuard {
    fn new() -> Self {
        SessionGuard(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn kill(&self) {
        self.0.store(false, Ordering::Release);
    }

    fn same_session(&self, other: &SessionGuard) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Issued when a refresh starts; must accompany its result.
#[derive(Debug, Clone)]
pub struct RefreshTicket {
    guard: SessionGuard,
    generation: u64,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once the session that issued this ticket has been unmounted.
    pub fn is_alive(&self) -> bool {
        self.guard.is_alive()
    }
}

/// A cached candidate plus its compiled `@name` matcher.
#[derive(Debug)]
pub struct DirectoryEntry {
    pub candidate: Candidate,
    pattern: Option<MentionPattern>,
}

impl DirectoryEntry {
    fn new(candidate: Candidate) -> Self {
        let pattern = match MentionPattern::for_name(&candidate.display_name) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(id = %candidate.id, error = %e, "cannot build mention matcher");
                None
            }
        };
        DirectoryEntry { candidate, pattern }
    }

    /// Whether `@<display_name>` already appears as a whole mention in `text`.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.occurs_in(text))
    }
}

/// Immutable view of the directory at one point in time.
///
/// Cloning shares the underlying entries; a refresh swaps in a new set rather
/// than touching this one.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    entries: Arc<[DirectoryEntry]>,
}

impl DirectorySnapshot {
    /// Build a snapshot, keeping the first occurrence of each id in input order.
    pub fn new(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let mut by_id: IndexMap<CandidateId, Candidate> = IndexMap::new();
        for c in candidates {
            by_id.entry(c.id.clone()).or_insert(c);
        }
        DirectorySnapshot {
            entries: by_id.into_values().map(DirectoryEntry::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter()
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter().map(|e| &e.candidate)
    }

    pub fn same_as(&self, other: &DirectorySnapshot) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

/// Why a refresh result was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The issuing session was unmounted before the result arrived.
    SessionEnded,
    /// A newer refresh has already been applied.
    Superseded,
    /// The ticket was issued by a different directory.
    ForeignTicket,
}

/// What happened to a completed refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced; `count` candidates are now cached.
    Applied { count: usize },
    /// The fetch failed; the previous snapshot is still served.
    Failed { message: String },
    Discarded(DiscardReason),
}

/// Cache of mentionable users for one editing session.
#[derive(Debug)]
pub struct CandidateDirectory {
    excluded_id: Option<CandidateId>,
    fallback_role: String,
    snapshot: DirectorySnapshot,
    guard: SessionGuard,
    issued: u64,
    applied: u64,
}

impl CandidateDirectory {
    /// `excluded_id` is the authoring user, who is never offered as a candidate.
    pub fn new(excluded_id: Option<CandidateId>) -> Self {
        CandidateDirectory {
            excluded_id,
            fallback_role: "STAFF".to_string(),
            snapshot: DirectorySnapshot::default(),
            guard: SessionGuard::new(),
            issued: 0,
            applied: 0,
        }
    }

    pub fn with_fallback_role(mut self, role: impl Into<String>) -> Self {
        self.fallback_role = role.into();
        self
    }

    pub fn excluded_id(&self) -> Option<&CandidateId> {
        self.excluded_id.as_ref()
    }

    /// The last successfully fetched set; empty before the first success.
    pub fn snapshot(&self) -> DirectorySnapshot {
        self.snapshot.clone()
    }

    pub fn guard(&self) -> SessionGuard {
        self.guard.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.guard.is_alive()
    }

    /// Mark the session dead. Outstanding tickets will be discarded.
    pub fn unmount(&self) {
        self.guard.kill();
    }

    /// Start a refresh. The caller performs the fetch and hands the result to
    /// [`complete_refresh`](Self::complete_refresh) together with this ticket.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        debug!(generation = self.issued, "mention directory refresh started");
        RefreshTicket {
            guard: self.guard.clone(),
            generation: self.issued,
        }
    }

    /// Apply the result of a fetch started with `ticket`.
    pub fn complete_refresh(
        &mut self,
        ticket: &RefreshTicket,
        result: Result<Vec<StaffRecord>, FetchError>,
    ) -> RefreshOutcome {
        if !ticket.guard.same_session(&self.guard) {
            debug!(generation = ticket.generation, "ignoring refresh from another session");
            return RefreshOutcome::Discarded(DiscardReason::ForeignTicket);
        }
        if !ticket.is_alive() {
            debug!(generation = ticket.generation, "session unmounted, dropping directory data");
            return RefreshOutcome::Discarded(DiscardReason::SessionEnded);
        }
        if ticket.generation <= self.applied {
            debug!(
                generation = ticket.generation,
                applied = self.applied,
                "dropping superseded directory data"
            );
            return RefreshOutcome::Discarded(DiscardReason::Superseded);
        }

        match result {
            Ok(records) => {
                let received = records.len();
                let candidates: Vec<Candidate> = records
                    .into_iter()
                    .filter_map(|r| {
                        if !r.is_usable() {
                            debug!(
                                id = ?r.record_id(),
                                name = %r.name,
                                "skipping staff record without id or name"
                            );
                        }
                        r.into_candidate(&self.fallback_role)
                    })
                    .collect();
                if candidates.len() < received {
                    debug!(received, usable = candidates.len(), "dropped unusable staff records");
                }
                let count = self.install(candidates);
                self.applied = ticket.generation;
                RefreshOutcome::Applied { count }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    cached = self.snapshot.len(),
                    "mention directory refresh failed, keeping cached candidates"
                );
                RefreshOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Fetch synchronously from `source` and apply the result.
    pub fn refresh(&mut self, source: &dyn MentionSource) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        let result = source.fetch_mentionable_users();
        self.complete_refresh(&ticket, result)
    }

    fn install(&mut self, candidates: impl IntoIterator<Item = Candidate>) -> usize {
        let excluded = self.excluded_id.clone();
        let snapshot = DirectorySnapshot::new(
            candidates
                .into_iter()
                .filter(|c| excluded.as_ref() != Some(&c.id)),
        );
        let count = snapshot.len();
        debug!(count, "mention directory replaced");
        self.snapshot = snapshot;
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::{StaticSource, parse_staff_payload};

    fn record(id: &str, name: &str) -> StaffRecord {
        StaffRecord {
            email: Some(format!("{}@example.com", name.to_lowercase())),
            ..StaffRecord::new(id, name)
        }
    }

    fn staff() -> Vec<StaffRecord> {
        vec![record("u1", "Me"), record("u2", "Ann"), record("u3", "John")]
    }

    fn names(snapshot: &DirectorySnapshot) -> Vec<String> {
        snapshot.candidates().map(|c| c.display_name.clone()).collect()
    }

    #[test]
    fn snapshot_empty_before_first_refresh() {
        let dir = CandidateDirectory::new(None);
        assert!(dir.snapshot().is_empty());
    }

    #[test]
    fn refresh_excludes_current_user() {
        let mut dir = CandidateDirectory::new(Some("u1".into()));
        let outcome = dir.refresh(&StaticSource::new(staff()));
        assert_eq!(outcome, RefreshOutcome::Applied { count: 2 });
        assert_eq!(names(&dir.snapshot()), vec!["Ann", "John"]);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let mut dir = CandidateDirectory::new(None);
        let ticket = dir.begin_refresh();
        let records = vec![record("u2", "Ann"), record("u3", "John"), record("u2", "Annie")];
        dir.complete_refresh(&ticket, Ok(records));
        assert_eq!(names(&dir.snapshot()), vec!["Ann", "John"]);
    }

    #[test]
    fn records_without_id_are_skipped_not_fatal() {
        let mut dir = CandidateDirectory::new(None);
        let records = parse_staff_payload(
            r#"[{"_id": "u2", "id": "u2", "name": "Ann"}, {"name": "Drifter"}]"#,
        )
        .unwrap();
        let ticket = dir.begin_refresh();
        let outcome = dir.complete_refresh(&ticket, Ok(records));
        assert_eq!(outcome, RefreshOutcome::Applied { count: 1 });
        assert_eq!(names(&dir.snapshot()), vec!["Ann"]);
    }

    #[test]
    fn failure_keeps_stale_snapshot() {
        let mut dir = CandidateDirectory::new(Some("u1".into()));
        dir.refresh(&StaticSource::new(staff()));
        let before = dir.snapshot();

        let ticket = dir.begin_refresh();
        let outcome =
            dir.complete_refresh(&ticket, Err(FetchError::Unavailable("503".into())));
        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert!(dir.snapshot().same_as(&before));
    }

    #[test]
    fn refresh_replaces_wholesale() {
        let mut dir = CandidateDirectory::new(None);
        dir.refresh(&StaticSource::new(staff()));
        let old = dir.snapshot();
        dir.refresh(&StaticSource::new(vec![record("u9", "Zed")]));

        assert_eq!(names(&dir.snapshot()), vec!["Zed"]);
        // Earlier snapshots are untouched
        assert_eq!(names(&old), vec!["Me", "Ann", "John"]);
    }

    #[test]
    fn late_result_after_unmount_is_dropped() {
        let mut dir = CandidateDirectory::new(None);
        let ticket = dir.begin_refresh();
        dir.unmount();
        assert!(!ticket.is_alive());

        let outcome = dir.complete_refresh(&ticket, Ok(staff()));
        assert_eq!(outcome, RefreshOutcome::Discarded(DiscardReason::SessionEnded));
        assert!(dir.snapshot().is_empty());
    }

    #[test]
    fn older_generation_does_not_overwrite_newer() {
        let mut dir = CandidateDirectory::new(None);
        let first = dir.begin_refresh();
        let second = dir.begin_refresh();

        dir.complete_refresh(&second, Ok(vec![record("u3", "John")]));
        let outcome = dir.complete_refresh(&first, Ok(staff()));

        assert_eq!(outcome, RefreshOutcome::Discarded(DiscardReason::Superseded));
        assert_eq!(names(&dir.snapshot()), vec!["John"]);
    }

    #[test]
    fn ticket_from_other_directory_is_rejected() {
        let mut a = CandidateDirectory::new(None);
        let mut b = CandidateDirectory::new(None);
        let ticket = a.begin_refresh();
        let _ = b.begin_refresh();

        let outcome = b.complete_refresh(&ticket, Ok(staff()));
        assert_eq!(outcome, RefreshOutcome::Discarded(DiscardReason::ForeignTicket));
        assert!(b.snapshot().is_empty());
    }

    #[test]
    fn fallback_role_applies_to_records_without_role() {
        let mut dir = CandidateDirectory::new(None).with_fallback_role("MEMBER");
        dir.refresh(&StaticSource::new(vec![record("u2", "Ann")]));
        let snap = dir.snapshot();
        let ann = snap.candidates().next().unwrap();
        assert_eq!(ann.role_label, "MEMBER");
    }

    #[test]
    fn entry_detects_existing_mention() {
        let snap = DirectorySnapshot::new(vec![Candidate::new("u3", "John", "", "Dev")]);
        let entry = snap.entries().next().unwrap();
        assert!(entry.is_mentioned_in("thanks @john!"));
        assert!(!entry.is_mentioned_in("thanks @johnny"));
    }
}
