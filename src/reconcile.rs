//! The reconciliation engine: compare a fresh snapshot of boards against
//! the stored one, persist the new state and decide whether to alert.
//!
//! Classification is a pure function of one observed record and what the
//! store last knew about it; the run-level notify decision is a fold over
//! the per-board outcomes.

use crate::db::{BoardStore, StoreError};
use crate::model::BoardRecord;
use tracing::{debug, instrument};

/// Field-level differences between an observed board and its stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardDelta {
    pub date_changed: bool,
    pub phase_changed: bool,
    pub mail_arrived: bool,
}

impl BoardDelta {
    /// True when any signal warrants an alert.
    pub fn is_notable(&self) -> bool {
        self.date_changed || self.phase_changed || self.mail_arrived
    }
}

/// Outcome of matching one observed board against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Never seen before. Always alert-worthy: there is nothing to compare
    /// against.
    New,
    /// Already stored, with the computed field deltas.
    Known(BoardDelta),
}

impl Classification {
    pub fn is_notable(&self) -> bool {
        match self {
            Classification::New => true,
            Classification::Known(delta) => delta.is_notable(),
        }
    }
}

/// Compare an observed board with what the store last knew about it.
///
/// `date` and `phase` are compared by exact string equality; an empty
/// string is just another value. The mail signal fires only on the
/// transition from no unread mail to unread mail; mail staying present or
/// going away is not alert-worthy.
pub fn classify(seen: &BoardRecord, known: Option<&BoardRecord>) -> Classification {
    let Some(known) = known else {
        return Classification::New;
    };
    Classification::Known(BoardDelta {
        date_changed: seen.date != known.date,
        phase_changed: seen.phase != known.phase,
        mail_arrived: seen.has_mail && !known.has_mail,
    })
}

/// Per-run reconciliation result. `notify` is the single decision the rest
/// of the pipeline acts on; the counts exist for the run log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub observed: usize,
    pub new_boards: usize,
    pub changed_boards: usize,
    pub notify: bool,
}

/// Reconcile one snapshot against the store.
///
/// Boards are processed in input order. New boards are inserted as-is;
/// known boards are updated unconditionally so the store always reflects
/// the latest observation, whether or not anything notable changed. Boards
/// in the store but absent from `observed` are left alone. A store failure
/// aborts the batch; boards processed before it stay committed.
#[instrument(skip_all, fields(observed = observed.len()))]
pub async fn reconcile(
    observed: &[BoardRecord],
    store: &dyn BoardStore,
) -> Result<ReconcileSummary, StoreError> {
    let mut outcomes = Vec::with_capacity(observed.len());
    for seen in observed {
        let known = store.get(seen.id).await?;
        let outcome = classify(seen, known.as_ref());
        match outcome {
            Classification::New => store.insert(seen).await?,
            Classification::Known(_) => store.update(seen).await?,
        }
        debug!(id = seen.id, ?outcome, "board reconciled");
        outcomes.push(outcome);
    }

    Ok(ReconcileSummary {
        observed: observed.len(),
        new_boards: outcomes
            .iter()
            .filter(|o| matches!(o, Classification::New))
            .count(),
        changed_boards: outcomes
            .iter()
            .filter(|o| matches!(o, Classification::Known(d) if d.is_notable()))
            .count(),
        notify: outcomes.iter().any(Classification::is_notable),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::hash_map::Entry;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in with the same field-level update semantics as the
    /// SQLite store.
    #[derive(Default)]
    struct MemoryBoards {
        inner: Mutex<HashMap<i64, BoardRecord>>,
    }

    impl MemoryBoards {
        fn with(records: Vec<BoardRecord>) -> Self {
            Self {
                inner: Mutex::new(records.into_iter().map(|r| (r.id, r)).collect()),
            }
        }

        fn stored(&self, id: i64) -> Option<BoardRecord> {
            self.inner.lock().unwrap().get(&id).cloned()
        }

        fn len(&self) -> usize {
            self.inner.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl BoardStore for MemoryBoards {
        async fn get(&self, id: i64) -> Result<Option<BoardRecord>, StoreError> {
            Ok(self.inner.lock().unwrap().get(&id).cloned())
        }

        async fn insert(&self, record: &BoardRecord) -> Result<(), StoreError> {
            match self.inner.lock().unwrap().entry(record.id) {
                Entry::Occupied(_) => Err(StoreError::DuplicateKey(record.id)),
                Entry::Vacant(slot) => {
                    slot.insert(record.clone());
                    Ok(())
                }
            }
        }

        async fn update(&self, record: &BoardRecord) -> Result<(), StoreError> {
            let mut inner = self.inner.lock().unwrap();
            let stored = inner
                .get_mut(&record.id)
                .ok_or(StoreError::NotFound(record.id))?;
            stored.date = record.date.clone();
            stored.phase = record.phase.clone();
            stored.order_status = record.order_status.clone();
            stored.has_mail = record.has_mail;
            Ok(())
        }
    }

    fn board(id: i64, phase: &str, date: &str, has_mail: bool) -> BoardRecord {
        BoardRecord {
            id,
            name: format!("Game {id}"),
            my_country: "France".into(),
            date: date.into(),
            phase: phase.into(),
            order_status: "Saved".into(),
            has_mail,
        }
    }

    #[test]
    fn first_sight_is_new_and_notable() {
        let seen = board(1, "Builds", "1901 Spring", false);
        let outcome = classify(&seen, None);
        assert_eq!(outcome, Classification::New);
        assert!(outcome.is_notable());
    }

    #[test]
    fn identical_fields_are_quiet() {
        let seen = board(1, "Builds", "1901 Spring", false);
        let outcome = classify(&seen, Some(&seen));
        assert!(!outcome.is_notable());
    }

    #[test]
    fn date_and_phase_changes_are_notable() {
        let known = board(1, "Builds", "1901 Spring", false);

        let outcome = classify(&board(1, "Retreats", "1901 Spring", false), Some(&known));
        assert_eq!(
            outcome,
            Classification::Known(BoardDelta {
                date_changed: false,
                phase_changed: true,
                mail_arrived: false,
            })
        );

        let outcome = classify(&board(1, "Builds", "1901 Autumn", false), Some(&known));
        assert!(outcome.is_notable());
    }

    #[test]
    fn mail_signal_is_one_directional() {
        let no_mail = board(1, "Builds", "1901 Spring", false);
        let with_mail = board(1, "Builds", "1901 Spring", true);

        assert!(classify(&with_mail, Some(&no_mail)).is_notable());
        assert!(!classify(&no_mail, Some(&with_mail)).is_notable());
        assert!(!classify(&with_mail, Some(&with_mail)).is_notable());
    }

    #[test]
    fn empty_string_is_its_own_value() {
        let known = board(1, "", "1901 Spring", false);
        assert!(!classify(&board(1, "", "1901 Spring", false), Some(&known)).is_notable());
        assert!(classify(&board(1, "Builds", "1901 Spring", false), Some(&known)).is_notable());
    }

    #[tokio::test]
    async fn new_board_is_inserted_and_notifies() {
        let store = MemoryBoards::default();
        let observed = vec![board(1, "Builds", "1901 Spring", false)];

        let summary = reconcile(&observed, &store).await.unwrap();
        assert!(summary.notify);
        assert_eq!(summary.new_boards, 1);
        assert_eq!(store.stored(1), Some(observed[0].clone()));
    }

    #[tokio::test]
    async fn unchanged_board_is_quiet_but_still_updated() {
        let store = MemoryBoards::with(vec![board(1, "Builds", "1901 Spring", false)]);
        let mut seen = board(1, "Builds", "1901 Spring", false);
        seen.order_status = "Completed".into();

        let summary = reconcile(&[seen], &store).await.unwrap();
        assert!(!summary.notify);
        assert_eq!(summary.changed_boards, 0);
        // Order status alone never alerts, but the store must reflect it.
        assert_eq!(store.stored(1).unwrap().order_status, "Completed");
    }

    #[tokio::test]
    async fn phase_change_notifies_and_updates() {
        let store = MemoryBoards::with(vec![board(1, "Builds", "1901 Spring", false)]);

        let summary = reconcile(&[board(1, "Retreats", "1901 Spring", false)], &store)
            .await
            .unwrap();
        assert!(summary.notify);
        assert_eq!(summary.changed_boards, 1);
        assert_eq!(store.stored(1).unwrap().phase, "Retreats");
    }

    #[tokio::test]
    async fn mail_cleared_externally_is_quiet() {
        let store = MemoryBoards::with(vec![board(1, "Builds", "1901 Spring", true)]);

        let summary = reconcile(&[board(1, "Builds", "1901 Spring", false)], &store)
            .await
            .unwrap();
        assert!(!summary.notify);
        assert!(!store.stored(1).unwrap().has_mail);
    }

    #[tokio::test]
    async fn second_run_with_same_snapshot_is_quiet() {
        let store = MemoryBoards::default();
        let observed = vec![
            board(1, "Builds", "1901 Spring", false),
            board(2, "Diplomacy", "1902 Autumn", true),
        ];

        let first = reconcile(&observed, &store).await.unwrap();
        assert!(first.notify);

        let second = reconcile(&observed, &store).await.unwrap();
        assert!(!second.notify);
        assert_eq!(second.new_boards, 0);
        assert_eq!(second.changed_boards, 0);
    }

    #[tokio::test]
    async fn empty_batch_is_quiet_and_touches_nothing() {
        let store = MemoryBoards::with(vec![board(1, "Builds", "1901 Spring", false)]);

        let summary = reconcile(&[], &store).await.unwrap();
        assert_eq!(summary, ReconcileSummary::default());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn disappeared_boards_are_left_alone() {
        let store = MemoryBoards::with(vec![
            board(1, "Builds", "1901 Spring", false),
            board(2, "Diplomacy", "1902 Autumn", false),
        ]);

        let summary = reconcile(&[board(1, "Builds", "1901 Spring", false)], &store)
            .await
            .unwrap();
        assert!(!summary.notify);
        assert_eq!(store.stored(2), Some(board(2, "Diplomacy", "1902 Autumn", false)));
    }

    #[tokio::test]
    async fn mixed_batch_aggregates_across_boards() {
        let store = MemoryBoards::with(vec![board(1, "Builds", "1901 Spring", false)]);
        let observed = vec![
            board(1, "Builds", "1901 Spring", false),
            board(9, "Diplomacy", "1901 Spring", false),
        ];

        let summary = reconcile(&observed, &store).await.unwrap();
        assert!(summary.notify);
        assert_eq!(summary.observed, 2);
        assert_eq!(summary.new_boards, 1);
        assert_eq!(summary.changed_boards, 0);
    }
}
