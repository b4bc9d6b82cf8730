use crate::error::PersistError;
use crate::models::{Database, WorkoutRecord};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where finished workouts go. Durability and format belong to the implementor.
pub trait PersistenceGateway {
    fn save(&self, record: &WorkoutRecord) -> Result<(), PersistError>;
    fn load_all(&self) -> Result<Vec<WorkoutRecord>, PersistError>;
}

/// Keeps every record in one JSON document, rewritten atomically on save.
#[derive(Clone, Debug)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn base_dir() -> anyhow::Result<PathBuf> {
        let mut path =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        path.push(".groundhog");
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn new() -> anyhow::Result<Self> {
        let path = Self::base_dir()?;
        Ok(Self::from_path(path.join("db.json")))
    }

    pub fn from_path(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Database, PersistError> {
        if !self.path.exists() {
            return Ok(Database::default());
        }
        let data = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn write(&self, db: &Database) -> Result<(), PersistError> {
        let data = serde_json::to_string_pretty(db)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl PersistenceGateway for JsonStorage {
    fn save(&self, record: &WorkoutRecord) -> Result<(), PersistError> {
        let mut db = self.read()?;
        db.records.push(record.clone());
        self.write(&db)?;
        tracing::info!(record = %record.id(), path = %self.path.display(), "workout saved");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<WorkoutRecord>, PersistError> {
        Ok(self.read()?.records)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<Vec<WorkoutRecord>>,
}

impl PersistenceGateway for MemoryStorage {
    fn save(&self, record: &WorkoutRecord) -> Result<(), PersistError> {
        let mut records = self.records.lock().map_err(|_| PersistError::Poisoned)?;
        records.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<WorkoutRecord>, PersistError> {
        let records = self.records.lock().map_err(|_| PersistError::Poisoned)?;
        Ok(records.clone())
    }
}
