use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use crate::errors::ConfigResult;

/// Persisted per-sensor calibration, opaque to this crate's core
pub trait CalibrationStore: Send + Sync {
    fn load(&self, sensor_id: u8) -> ConfigResult<Option<Vec<u8>>>;

    fn save(&self, sensor_id: u8, blob: &[u8]) -> ConfigResult<()>;

    fn erase(&self, sensor_id: u8) -> ConfigResult<()>;
}

/// Keeps blobs for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryCalibrationStore {
    blobs: Mutex<HashMap<u8, Vec<u8>>>,
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&self, sensor_id: u8) -> ConfigResult<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(blobs.get(&sensor_id).cloned())
    }

    fn save(&self, sensor_id: u8, blob: &[u8]) -> ConfigResult<()> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.insert(sensor_id, blob.to_vec());
        Ok(())
    }

    fn erase(&self, sensor_id: u8) -> ConfigResult<()> {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        blobs.remove(&sensor_id);
        Ok(())
    }
}

/// One file per sensor: `<dir>/sensor_<id>.json`
#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    dir: PathBuf,
}

impl FileCalibrationStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, sensor_id: u8) -> PathBuf {
        self.dir.join(format!("sensor_{}.json", sensor_id))
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn load(&self, sensor_id: u8) -> ConfigResult<Option<Vec<u8>>> {
        match fs::read(self.path(sensor_id)) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, sensor_id: u8, blob: &[u8]) -> ConfigResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(sensor_id);
        fs::write(&path, blob)?;
        debug!("calibration written to {}", path.display());
        Ok(())
    }

    fn erase(&self, sensor_id: u8) -> ConfigResult<()> {
        match fs::remove_file(self.path(sensor_id)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn CalibrationStore) {
        assert_eq!(store.load(4).unwrap(), None);
        store.save(4, b"{\"buckets\":[]}").unwrap();
        assert_eq!(store.load(4).unwrap().as_deref(), Some(&b"{\"buckets\":[]}"[..]));
        assert_eq!(store.load(5).unwrap(), None);

        store.erase(4).unwrap();
        assert_eq!(store.load(4).unwrap(), None);
        // erasing twice is fine
        store.erase(4).unwrap();
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryCalibrationStore::default());
    }

    #[test]
    fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCalibrationStore::new(dir.path().join("calibration"));
        exercise(&store);
    }
}
