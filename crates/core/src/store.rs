//! Vehicle roster backed by a line-oriented file.

use std::{
    collections::HashMap,
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    codec,
    error::{FleetError, FleetResult},
    models::Vehicle,
};

/// Default file name of the roster inside the data directory.
pub const DEFAULT_STORE_FILE: &str = "cars.csv";

/// In-memory roster that mirrors its backing file after every mutation.
///
/// Every mutation rewrites the whole file. The new roster is persisted
/// first and only swapped into memory once the write has succeeded.
#[derive(Debug)]
pub struct VehicleStore {
    path: PathBuf,
    vehicles: Vec<Vehicle>,
    index: HashMap<String, usize>,
}

impl VehicleStore {
    /// Open the store at `path`, loading the roster if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> FleetResult<Self> {
        let path = path.into();
        let vehicles = Self::load(&path)?;
        let index = build_index(&vehicles)?;
        info!(path = %path.display(), vehicles = vehicles.len(), "Roster loaded");
        Ok(Self {
            path,
            vehicles,
            index,
        })
    }

    /// Read every vehicle from `path` in file order.
    ///
    /// A missing file yields an empty roster. Blank lines are skipped; any
    /// other undecodable line aborts the load with its line number.
    pub fn load(path: impl AsRef<Path>) -> FleetResult<Vec<Vehicle>> {
        let path = path.as_ref();
        let Some(content) = read_backing_file(path)? else {
            debug!(path = %path.display(), "No roster file; starting empty");
            return Ok(Vec::new());
        };

        let mut vehicles = Vec::new();
        for (number, line) in numbered(&content) {
            let vehicle = codec::decode(line).map_err(|err| err.at_line(number))?;
            vehicles.push(vehicle);
        }
        Ok(vehicles)
    }

    /// Overwrite `path` with the encoded roster, in order.
    pub fn save(path: impl AsRef<Path>, vehicles: &[Vehicle]) -> FleetResult<()> {
        let path = path.as_ref();
        write_atomic(path, vehicles.iter().map(codec::encode))?;
        debug!(path = %path.display(), vehicles = vehicles.len(), "Roster saved");
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Vehicles in roster order.
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    /// Look a vehicle up by id.
    pub fn get(&self, id: &str) -> Option<&Vehicle> {
        self.index.get(id).map(|&slot| &self.vehicles[slot])
    }

    /// Append a vehicle and persist. Fails with `DuplicateId` on collision.
    pub fn add(&mut self, vehicle: Vehicle) -> FleetResult<()> {
        if self.index.contains_key(&vehicle.id) {
            return Err(FleetError::DuplicateId(vehicle.id));
        }

        let mut next = self.vehicles.clone();
        next.push(vehicle);
        Self::save(&self.path, &next)?;

        let slot = next.len() - 1;
        self.index.insert(next[slot].id.clone(), slot);
        self.vehicles = next;
        Ok(())
    }

    /// Set the availability flag of `id` and persist.
    pub fn set_available(&mut self, id: &str, available: bool) -> FleetResult<()> {
        let slot = *self
            .index
            .get(id)
            .ok_or_else(|| FleetError::UnknownVehicle(id.to_string()))?;
        if self.vehicles[slot].available == available {
            return Ok(());
        }

        let mut next = self.vehicles.clone();
        next[slot].available = available;
        Self::save(&self.path, &next)?;
        self.vehicles = next;
        Ok(())
    }
}

fn build_index(vehicles: &[Vehicle]) -> FleetResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(vehicles.len());
    for (slot, vehicle) in vehicles.iter().enumerate() {
        if index.insert(vehicle.id.clone(), slot).is_some() {
            return Err(FleetError::DuplicateId(vehicle.id.clone()));
        }
    }
    Ok(index)
}

/// Read a backing file, returning `None` when it does not exist.
pub(crate) fn read_backing_file(path: &Path) -> FleetResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(FleetError::io(path, err)),
    }
}

/// Non-blank lines paired with their 1-based line numbers.
pub(crate) fn numbered(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Replace `path` with `lines` via a synced temporary file in the same directory.
pub(crate) fn write_atomic<I>(path: &Path, lines: I) -> FleetResult<()>
where
    I: IntoIterator<Item = String>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|err| FleetError::io(&dir, err))?;

    let tmp = NamedTempFile::new_in(&dir).map_err(|err| FleetError::io(&dir, err))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        for line in lines {
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(LINE_ENDING.as_bytes()))
                .map_err(|err| FleetError::io(tmp.path(), err))?;
        }
        writer.flush().map_err(|err| FleetError::io(tmp.path(), err))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|err| FleetError::io(tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| FleetError::io(path, err.error))?;
    Ok(())
}

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn sample() -> Vec<Vehicle> {
        let mut civic = Vehicle::new("C002", "Honda", "Civic", 45.5);
        civic.available = false;
        vec![
            Vehicle::new("C001", "Toyota", "Corolla", 30.0),
            civic,
            Vehicle::new("C003", "Ford", "Focus", 60.0),
        ]
    }

    #[test]
    fn missing_file_is_an_empty_roster() -> Result<()> {
        let dir = tempdir()?;
        let store = VehicleStore::open(dir.path().join(DEFAULT_STORE_FILE))?;
        assert!(store.vehicles().is_empty());
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn save_then_load_preserves_order_and_state() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_STORE_FILE);
        VehicleStore::save(&path, &sample())?;

        let text = fs::read_to_string(&path)?;
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "C001,Toyota,Corolla,30.0,true",
                "C002,Honda,Civic,45.5,false",
                "C003,Ford,Focus,60.0,true",
            ]
        );
        assert_eq!(VehicleStore::load(&path)?, sample());
        Ok(())
    }

    #[test]
    fn save_fully_rewrites_the_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_STORE_FILE);
        VehicleStore::save(&path, &sample())?;
        VehicleStore::save(&path, &sample()[..1])?;
        assert_eq!(VehicleStore::load(&path)?.len(), 1);

        let leftovers = fs::read_dir(dir.path())?.count();
        assert_eq!(leftovers, 1, "temporary files must not be left behind");
        Ok(())
    }

    #[test]
    fn malformed_line_aborts_load_with_line_number() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_STORE_FILE);
        fs::write(
            &path,
            "C001,Toyota,Corolla,30.0,true\n\nC002,Honda,Civic,cheap,true\n",
        )?;

        match VehicleStore::open(&path) {
            Err(FleetError::MalformedRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed record, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn duplicate_ids_in_file_abort_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_STORE_FILE);
        fs::write(
            &path,
            "C001,Toyota,Corolla,30.0,true\nC001,Honda,Civic,45.0,true\n",
        )?;
        assert!(matches!(
            VehicleStore::open(&path),
            Err(FleetError::DuplicateId(id)) if id == "C001"
        ));
        Ok(())
    }

    #[test]
    fn add_persists_and_rejects_duplicates() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_STORE_FILE);
        let mut store = VehicleStore::open(&path)?;

        store.add(Vehicle::new("C001", "Toyota", "Corolla", 30.0))?;
        let before = fs::read(&path)?;

        let err = store
            .add(Vehicle::new("C001", "Honda", "Civic", 45.0))
            .unwrap_err();
        assert!(matches!(err, FleetError::DuplicateId(id) if id == "C001"));
        assert_eq!(store.vehicles().len(), 1);
        assert_eq!(fs::read(&path)?, before);
        assert_eq!(store.get("C001").map(|v| v.brand.as_str()), Some("Toyota"));
        Ok(())
    }

    #[test]
    fn set_available_persists_the_flag() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_STORE_FILE);
        let mut store = VehicleStore::open(&path)?;
        store.add(Vehicle::new("C001", "Toyota", "Corolla", 30.0))?;

        store.set_available("C001", false)?;
        assert!(!VehicleStore::load(&path)?[0].available);
        assert!(matches!(
            store.set_available("C404", true),
            Err(FleetError::UnknownVehicle(_))
        ));
        Ok(())
    }

    #[test]
    fn failed_persist_leaves_memory_untouched() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(DEFAULT_STORE_FILE);
        let mut store = VehicleStore::open(&path)?;
        store.add(Vehicle::new("C001", "Toyota", "Corolla", 30.0))?;

        // A non-empty directory where the file should be makes the rename fail.
        fs::remove_file(&path)?;
        fs::create_dir(&path)?;
        fs::write(path.join("blocker"), b"x")?;

        assert!(matches!(
            store.set_available("C001", false),
            Err(FleetError::Io { .. })
        ));
        assert!(store.get("C001").map(|v| v.available).unwrap_or(false));
        assert!(store.add(Vehicle::new("C002", "Honda", "Civic", 45.0)).is_err());
        assert!(store.get("C002").is_none());
        Ok(())
    }
}
