use crate::engine::{ConflictEngine, EngineConfig};
use crate::model::{Employee, ShiftAssignment, ShiftSchedule, ShiftSwapRequest};
use crate::notification::NotificationSink;
use crate::schedule::ScheduleManager;
use crate::store::AssignmentStore;
use crate::swap::SwapWorkflow;
use crate::template::{ShiftTemplate, TemplateCatalog};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// État complet du planning, tel que persisté.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Planning {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub templates: Vec<ShiftTemplate>,
    #[serde(default)]
    pub assignments: Vec<ShiftAssignment>,
    #[serde(default)]
    pub schedules: Vec<ShiftSchedule>,
    #[serde(default)]
    pub swap_requests: Vec<ShiftSwapRequest>,
}

pub trait Storage {
    /// Charge un planning depuis un support.
    fn load(&self) -> anyhow::Result<Planning>;
    /// Sauvegarde de manière atomique.
    fn save(&self, planning: &Planning) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Planning> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let planning: Planning =
            serde_json::from_slice(&data).with_context(|| "parsing planning.json")?;
        Ok(planning)
    }

    fn save(&self, planning: &Planning) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(planning)?;
        let mut tmp =
            NamedTempFile::new_in(self.path.parent().unwrap_or_else(|| Path::new(".")))
                .with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

/// Graphe d'objets vivant reconstruit depuis un [`Planning`].
///
/// Regroupe le catalogue, le dépôt, le workflow d'échanges et le gestionnaire
/// de plannings, tous câblés sur le même moteur et le même sink.
pub struct Workspace {
    pub catalog: Arc<TemplateCatalog>,
    pub store: Arc<AssignmentStore>,
    pub swaps: SwapWorkflow,
    pub schedules: ScheduleManager,
}

impl Workspace {
    pub fn from_planning(
        planning: Planning,
        cfg: EngineConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let catalog = Arc::new(TemplateCatalog::from_templates(planning.templates));
        let store = Arc::new(AssignmentStore::from_parts(
            planning.employees,
            planning.assignments,
            Arc::clone(&catalog),
            ConflictEngine::new(cfg),
            Arc::clone(&sink),
        ));
        let swaps =
            SwapWorkflow::from_parts(planning.swap_requests, Arc::clone(&store), Arc::clone(&sink));
        let schedules =
            ScheduleManager::from_parts(planning.schedules, Arc::clone(&store), Arc::clone(&sink));
        Self {
            catalog,
            store,
            swaps,
            schedules,
        }
    }

    pub fn empty(cfg: EngineConfig, sink: Arc<dyn NotificationSink>) -> Self {
        Self::from_planning(Planning::default(), cfg, sink)
    }

    /// Instantané sérialisable de l'état courant.
    pub fn to_planning(&self) -> Planning {
        Planning {
            employees: self.store.employees(),
            templates: self.catalog.snapshot(),
            assignments: self.store.snapshot(),
            schedules: self.schedules.snapshot(),
            swap_requests: self.swaps.snapshot(),
        }
    }
}
