//! The punch ledger is the append-only history of [PunchEvent]s.
//!  - The head of the sequence is always the most recent punch. Order is insertion order, the
//!    list is never re-sorted by timestamp.
//!  - Every committed state is written to the [KeyValueStore] as a whole document.
//!  - Persistence failures never reach the caller, they are kept as a [StorageNotice] instead.
//!  - When the store could not be read, or a corrupted value could not be backed up, nothing is
//!    written back for the rest of the session, so history that could not be seen is never
//!    overwritten.

pub mod entities;

use std::sync::Arc;

use anyhow::Result;
use entities::{parse_snapshot, serialize_snapshot, PunchEvent, PunchKind};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{storage::KeyValueStore, utils::clock::Clock};

/// Immutable view of one ledger version. Each commit produces a new snapshot, existing ones are
/// never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub version: u64,
    pub events: Arc<[PunchEvent]>,
}

/// What [PunchLedger::hydrate] found in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// Nothing stored yet, or a blank value.
    Absent,
    Loaded(usize),
    /// Stored value could not be parsed. It was copied under [corrupted_key] before being
    /// replaced with an empty ledger. If the copy failed, write-through is disabled instead.
    Corrupted,
    /// Store could not be read at all. Write-through is disabled for this ledger.
    Unreadable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    CorruptedHistory,
    ReadFailed,
    /// Cleared by the next successful write.
    WriteFailed,
}

/// Storage problem worth showing to the user next to the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageNotice {
    pub kind: NoticeKind,
    pub message: String,
}

pub fn corrupted_key(key: &str) -> String {
    format!("{key}.corrupted")
}

pub struct PunchLedger {
    store: Box<dyn KeyValueStore>,
    key: String,
    clock: Arc<dyn Clock>,
    state: watch::Sender<LedgerSnapshot>,
    notice: Option<StorageNotice>,
    outcome: HydrateOutcome,
    write_through: bool,
}

impl PunchLedger {
    /// Loads the ledger stored under `key` and writes the loaded state straight back, unless the
    /// store could not be read. Never fails: a missing, unreadable or corrupted value all result
    /// in an empty ledger.
    #[instrument(skip(store, clock))]
    pub async fn hydrate(
        store: Box<dyn KeyValueStore>,
        key: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut write_through = true;
        let (events, outcome, notice) = match store.get(key).await {
            Ok(None) => (vec![], HydrateOutcome::Absent, None),
            Ok(Some(raw)) if raw.trim().is_empty() => (vec![], HydrateOutcome::Absent, None),
            Ok(Some(raw)) => match parse_snapshot(&raw) {
                Ok(events) => {
                    let count = events.len();
                    (events, HydrateOutcome::Loaded(count), None)
                }
                Err(e) => {
                    warn!("Stored punch history under {key:?} is corrupted, starting empty: {e}");
                    let kept = preserve_corrupted(store.as_ref(), key, &raw, clock.as_ref()).await;
                    let message = match kept {
                        Ok(backup) => {
                            format!("Saved punches were unreadable and were moved to {backup:?}")
                        }
                        Err(e) => {
                            warn!("Failed to keep unreadable history under {key:?}: {e:?}");
                            // The stored text is the only copy left.
                            write_through = false;
                            format!(
                                "Saved punches were unreadable and could not be kept, \
                                 new punches are not saved: {e}"
                            )
                        }
                    };
                    let notice = StorageNotice {
                        kind: NoticeKind::CorruptedHistory,
                        message,
                    };
                    (vec![], HydrateOutcome::Corrupted, Some(notice))
                }
            },
            Err(e) => {
                warn!("Failed to read punch history under {key:?}: {e:?}");
                write_through = false;
                let notice = StorageNotice {
                    kind: NoticeKind::ReadFailed,
                    message: format!("Could not read saved punches, new punches are not saved: {e}"),
                };
                (vec![], HydrateOutcome::Unreadable, Some(notice))
            }
        };
        info!("Hydrated {} punch events ({outcome:?})", events.len());

        let (state, _) = watch::channel(LedgerSnapshot {
            version: 0,
            events: events.into(),
        });

        let mut ledger = Self {
            store,
            key: key.to_owned(),
            clock,
            state,
            notice,
            outcome,
            write_through,
        };
        ledger.persist().await;
        ledger
    }

    /// Records a punch at the current instant and writes the new history through to the store.
    /// Always succeeds; see [PunchLedger::notice] for persistence problems.
    #[instrument(skip(self))]
    pub async fn append(&mut self, kind: PunchKind) -> PunchEvent {
        let current = self.snapshot();
        let event = PunchEvent::new_after(current.events.first(), kind, self.clock.time());

        let mut events = Vec::with_capacity(current.events.len() + 1);
        events.push(event.clone());
        events.extend(current.events.iter().cloned());

        self.state.send_replace(LedgerSnapshot {
            version: current.version + 1,
            events: events.into(),
        });
        debug!("Committed {event:?}");

        self.persist().await;
        event
    }

    async fn persist(&mut self) {
        if !self.write_through {
            return;
        }
        let snapshot = self.snapshot();
        let result = match serialize_snapshot(&snapshot.events) {
            Ok(raw) => self.store.set(&self.key, &raw).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(()) => {
                if let Some(NoticeKind::WriteFailed) = self.notice.as_ref().map(|v| v.kind) {
                    info!("Persistence recovered");
                    self.notice = None;
                }
                debug!(
                    "Persisted version {} with {} events",
                    snapshot.version,
                    snapshot.events.len()
                );
            }
            Err(e) => {
                warn!("Failed to persist version {}: {e:?}", snapshot.version);
                self.notice = Some(StorageNotice {
                    kind: NoticeKind::WriteFailed,
                    message: format!("Punches are not being saved: {e}"),
                });
            }
        }
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.borrow().clone()
    }

    /// Newest first.
    pub fn events(&self) -> Arc<[PunchEvent]> {
        self.state.borrow().events.clone()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receiver that observes every committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        self.state.subscribe()
    }

    pub fn notice(&self) -> Option<&StorageNotice> {
        self.notice.as_ref()
    }

    pub fn hydrate_outcome(&self) -> HydrateOutcome {
        self.outcome
    }
}

/// Copies `raw` under [corrupted_key] and returns the key it ended up under. An older backup is
/// never replaced: when one exists, the copy gets the current epoch millis as a suffix.
async fn preserve_corrupted(
    store: &dyn KeyValueStore,
    key: &str,
    raw: &str,
    clock: &dyn Clock,
) -> Result<String> {
    let mut backup = corrupted_key(key);
    if store.get(&backup).await?.is_some() {
        backup = format!("{backup}.{}", clock.time().timestamp_millis());
        debug!("Earlier backup exists, keeping this one under {backup:?}");
    }
    store.set(&backup, raw).await?;
    info!("Unreadable history kept under {backup:?}");
    Ok(backup)
}
