//! Journal de eventos en JSON Lines.
//!
//! Append-only: cada evento es una línea JSON autodescriptiva dentro del run
//! directory. Reabrirlo continúa la secuencia, de modo que una corrida
//! reanudada comparte journal con la original.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use fab_core::{EventStore, FlowEvent, FlowEventKind, StoreError};

pub const EVENTS_FILE: &str = "events.jsonl";
pub const ERROR_LOG_FILE: &str = "error.log";

pub struct JsonlEventStore {
    path: PathBuf,
    error_log: PathBuf,
    next_seq: u64,
}

impl JsonlEventStore {
    /// Journal en `<run root>/events.jsonl`; si ya existe, continúa la
    /// numeración.
    pub fn at(run_root: &Path) -> Result<Self, StoreError> {
        let path = run_root.join(EVENTS_FILE);
        let next_seq = match std::fs::read_to_string(&path) {
            Ok(text) => text.lines().filter(|l| !l.trim().is_empty()).count() as u64,
            Err(_) => 0,
        };
        Ok(Self { path, error_log: run_root.join(ERROR_LOG_FILE), next_seq })
    }

    fn read_all(&self) -> Vec<FlowEvent> {
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<FlowEvent>(line) {
                Ok(ev) => Some(ev),
                Err(e) => {
                    log::error!("corrupt journal line skipped: {e}");
                    None
                }
            })
            .collect()
    }
}

impl EventStore for JsonlEventStore {
    fn append_kind(&mut self, run_id: Uuid, kind: FlowEventKind) -> FlowEvent {
        // los fallos también van al log de errores del nivel del run
        if let FlowEventKind::StepFailed { ordinal, step_id, error } = &kind {
            let line = format!("{} step '{step_id}' (ordinal {ordinal}): {error}\n", Utc::now().to_rfc3339());
            let appended = OpenOptions::new().create(true)
                                             .append(true)
                                             .open(&self.error_log)
                                             .and_then(|mut f| f.write_all(line.as_bytes()));
            if let Err(e) = appended {
                log::error!("cannot append to {}: {e}", self.error_log.display());
            }
        }
        let ev = FlowEvent { seq: self.next_seq, run_id, kind, ts: Utc::now() };
        self.next_seq += 1;
        match serde_json::to_string(&ev) {
            Ok(line) => {
                let written = OpenOptions::new().create(true)
                                               .append(true)
                                               .open(&self.path)
                                               .and_then(|mut f| writeln!(f, "{line}"));
                if let Err(e) = written {
                    log::error!("cannot append to {}: {e}", self.path.display());
                }
            }
            Err(e) => log::error!("cannot encode event: {e}"),
        }
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<FlowEvent> {
        self.read_all().into_iter().filter(|e| e.run_id == run_id).collect()
    }
}
