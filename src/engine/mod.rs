mod conflict;
mod error;
mod mutations;
mod queries;
mod slots;
mod store;

pub use error::EngineError;
pub use slots::{clip_before, compute_slots, merge_overlapping, pack_slots, subtract_intervals};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, oneshot};
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::wal::Wal;

use store::TenantStore;

pub type SharedInspectorState = Arc<RwLock<InspectorState>>;

// ── Group-commit WAL channel ─────────────────────────────

enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group
/// commit: block for the first append, drain whatever else is already
/// queued, then a single fsync for the whole batch.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WalCommand::Append { event, response } => {
                let mut batch = vec![(event, response)];

                loop {
                    match rx.try_recv() {
                        Ok(WalCommand::Append { event, response }) => {
                            batch.push((event, response));
                        }
                        Ok(other) => {
                            // Flush the batch before the non-append command.
                            flush_and_respond(&mut wal, &mut batch);
                            handle_non_append(&mut wal, other);
                            break;
                        }
                        Err(_) => break, // channel empty — flush batch
                    }
                }

                if !batch.is_empty() {
                    flush_and_respond(&mut wal, &mut batch);
                }
            }
            other => handle_non_append(&mut wal, other),
        }
    }
}

fn flush_and_respond(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let flush_start = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
        .record(flush_start.elapsed().as_secs_f64());

    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush, even on append error, so partially buffered bytes
    // don't leak into the next batch (these callers were told the batch
    // failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// One tenant's scheduling engine: per-inspector state behind
/// `RwLock`s, a WAL for durability, and a notify hub observing the
/// booking lifecycle.
pub struct Engine {
    store: TenantStore,
    wal_tx: mpsc::Sender<WalCommand>,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    pub fn new(wal_path: PathBuf, notify: Arc<NotifyHub>) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            store: TenantStore::new(),
            wal_tx,
            notify,
        };

        // Replay. We are the sole owner of these Arcs, so try_read /
        // try_write always succeed instantly; never use the blocking
        // variants here because this may run inside an async context
        // (lazy tenant creation).
        for event in &events {
            match event {
                Event::InspectorCreated { id, name } => {
                    let ins = InspectorState::new(*id, name.clone());
                    engine.store.insert(*id, Arc::new(RwLock::new(ins)));
                }
                Event::InspectorDeleted { id } => {
                    if let Some(state) = engine.store.remove(id) {
                        let guard = state.try_read().expect("replay: uncontended read");
                        engine.store.forget_inspector_entities(&guard);
                    }
                }
                other => {
                    if let Some(inspector_id) = event_inspector_id(other)
                        && let Some(state) = engine.store.get(&inspector_id)
                    {
                        let mut guard = state.try_write().expect("replay: uncontended write");
                        engine.store.apply_event(&mut guard, other);
                    }
                }
            }
        }

        Ok(engine)
    }

    /// Write an event to the WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_inspector(&self, id: &Ulid) -> Option<SharedInspectorState> {
        self.store.get(id)
    }

    /// WAL-append + apply + notify in one call, in that order: nothing
    /// mutates in-memory state before it is durable, and the notify is
    /// fire-and-forget after both.
    pub(super) async fn persist_and_apply(
        &self,
        inspector_id: Ulid,
        ins: &mut InspectorState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.store.apply_event(ins, event);
        self.notify.send(inspector_id, event);
        Ok(())
    }

    /// Entity id → owning inspector → write lock.
    pub(super) async fn resolve_entity_write(
        &self,
        entity_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<InspectorState>), EngineError> {
        let inspector_id = self
            .store
            .owner_of(entity_id)
            .ok_or(EngineError::NotFound(Some(*entity_id)))?;
        let state = self
            .store
            .get(&inspector_id)
            .ok_or(EngineError::NotFound(Some(inspector_id)))?;
        let guard = state.write_owned().await;
        Ok((inspector_id, guard))
    }

    /// Rewrite the WAL with only the events needed to recreate current
    /// state.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let mut events = Vec::new();

        for state in self.store.iter_inspectors() {
            let guard = state.try_read().expect("compact: uncontended read");
            events.push(Event::InspectorCreated {
                id: guard.id,
                name: guard.name.clone(),
            });
            if !guard.windows.is_empty() {
                events.push(Event::AvailabilityReplaced {
                    inspector_id: guard.id,
                    windows: guard.windows.clone(),
                });
            }
            if let Some(settings) = guard.settings {
                events.push(Event::SettingsUpdated {
                    inspector_id: guard.id,
                    settings,
                });
            }
            for blackout in &guard.blackouts {
                events.push(Event::BlackoutUpserted {
                    inspector_id: guard.id,
                    blackout: blackout.clone(),
                });
            }
            for booking in &guard.bookings {
                events.push(Event::BookingCreated {
                    inspector_id: guard.id,
                    booking: booking.clone(),
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

/// Extract the inspector id from an event (for non-Create/Delete events).
fn event_inspector_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::AvailabilityReplaced { inspector_id, .. }
        | Event::BlackoutUpserted { inspector_id, .. }
        | Event::BlackoutRemoved { inspector_id, .. }
        | Event::SettingsUpdated { inspector_id, .. }
        | Event::BookingCreated { inspector_id, .. }
        | Event::BookingStatusChanged { inspector_id, .. }
        | Event::TokenRevoked { inspector_id, .. } => Some(*inspector_id),
        Event::InspectorCreated { .. } | Event::InspectorDeleted { .. } => None,
    }
}
