//! File persistence for election snapshots.

use std::io::ErrorKind;
use std::path::Path;

use tally_election::{Election, ElectionSnapshot};

use crate::NodeError;

/// Load an election from `path`. `Ok(None)` if the file does not exist.
pub fn load(path: &Path) -> Result<Option<Election>, NodeError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let snapshot = ElectionSnapshot::decode(&bytes)?;
    Ok(Some(Election::restore(snapshot)?))
}

/// Write `snapshot` to `path`, replacing any previous file.
///
/// Writes a sibling temp file first and renames it into place, so a crash
/// mid-write leaves the previous snapshot intact.
pub fn save(path: &Path, snapshot: &ElectionSnapshot) -> Result<(), NodeError> {
    let bytes = snapshot.encode()?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
