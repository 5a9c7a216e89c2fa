use crate::models::{BudgetState, ExpenseEntry, PLACEHOLDER, Profile, Tracker};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_FILE_NAME: &str = "expense_data.json";

/// On-disk shape of the whole tracker. Missing keys fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Snapshot {
    name: String,
    phone: String,
    records: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    monthly_target: Decimal,
    notes: String,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER.into(),
            phone: PLACEHOLDER.into(),
            records: Vec::new(),
            monthly_target: Decimal::ZERO,
            notes: String::new(),
        }
    }
}

impl From<&Tracker> for Snapshot {
    fn from(tracker: &Tracker) -> Self {
        Self {
            name: tracker.profile.name.clone(),
            phone: tracker.profile.phone.clone(),
            records: tracker.entries().iter().map(ExpenseEntry::to_string).collect(),
            monthly_target: tracker.budget.monthly_target,
            notes: tracker.budget.notes.clone(),
        }
    }
}

impl TryFrom<Snapshot> for Tracker {
    type Error = anyhow::Error;

    fn try_from(snapshot: Snapshot) -> Result<Self> {
        let ledger = snapshot
            .records
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                raw.parse::<ExpenseEntry>()
                    .with_context(|| format!("record {} ({raw:?}) is unreadable", idx + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Tracker::from_parts(
            Profile {
                name: snapshot.name,
                phone: snapshot.phone,
            },
            ledger,
            BudgetState {
                monthly_target: snapshot.monthly_target,
                notes: snapshot.notes,
            },
        ))
    }
}

pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file inside the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "expense-tracker", "expense-tracker")
            .context("unable to locate a data directory")?;
        Ok(dirs.data_dir().join(DATA_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Tracker> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no snapshot yet, starting empty");
            return Ok(Tracker::default());
        }

        let content =
            fs::read_to_string(&self.path).with_context(|| format!("reading {:?}", self.path))?;
        let snapshot = serde_json::from_str::<Snapshot>(&content)
            .with_context(|| format!("parsing expense data in {:?} failed", self.path))?;
        let tracker = Tracker::try_from(snapshot)
            .with_context(|| format!("loading records from {:?} failed", self.path))?;
        tracing::info!(
            path = %self.path.display(),
            entries = tracker.count(),
            "loaded snapshot"
        );
        Ok(tracker)
    }

    /// Replaces the snapshot on disk. The data is written to a sibling temp
    /// file first and renamed into place.
    pub fn save(&self, tracker: &Tracker) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }

        let json =
            serde_json::to_string(&Snapshot::from(tracker)).context("serializing data failed")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {:?}", tmp))?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err).with_context(|| format!("replacing {:?}", self.path));
        }

        tracing::info!(
            path = %self.path.display(),
            entries = tracker.count(),
            "saved snapshot"
        );
        Ok(())
    }

    /// Clears `tracker` and persists the empty state.
    pub fn reset(&self, tracker: &mut Tracker) -> Result<()> {
        tracker.reset();
        self.save(tracker)?;
        tracing::info!(path = %self.path.display(), "reset all data");
        Ok(())
    }
}
