//! Persistent memory: 256 slots of 32-bit state that survive `reset()`
//!
//! Backed directly by [`crate::mem::Ram`]'s persistent region; this
//! module only adds the save/load-to-disk half (spec §4.1, "Persistent
//! memory"), matching the byte layout the cartridge codec's save
//! format expects so a `.tic` and its sidecar save file agree on size.

use std::io::{Read, Write};

use crate::error::PersistError;
use crate::mem::{Ram, PERSISTENT_SLOTS};

const PERSIST_FILE_BYTES: usize = PERSISTENT_SLOTS * 4;

/// Serialize persistent memory to a flat little-endian byte blob.
pub fn save(ram: &Ram) -> Vec<u8> {
    ram.persistent_bytes().to_vec()
}

/// Write persistent memory to `writer` as a flat little-endian blob.
pub fn save_to<W: Write>(ram: &Ram, mut writer: W) -> Result<(), PersistError> {
    writer.write_all(ram.persistent_bytes())?;
    Ok(())
}

/// Load persistent memory from an exact-sized byte blob, as produced by
/// [`save`].
pub fn load(ram: &mut Ram, bytes: &[u8]) -> Result<(), PersistError> {
    if bytes.len() != PERSIST_FILE_BYTES {
        return Err(PersistError::WrongSize { expected: PERSIST_FILE_BYTES, got: bytes.len() });
    }
    ram.persistent_bytes_mut().copy_from_slice(bytes);
    Ok(())
}

/// Load persistent memory from a reader, as produced by [`save_to`].
pub fn load_from<R: Read>(ram: &mut Ram, mut reader: R) -> Result<(), PersistError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    load(ram, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_flat_blob() {
        let mut ram = Ram::new();
        ram.set_persistent(0, 1);
        ram.set_persistent(255, 0xCAFEBABE);

        let blob = save(&ram);
        assert_eq!(blob.len(), PERSIST_FILE_BYTES);

        let mut restored = Ram::new();
        load(&mut restored, &blob).unwrap();
        assert_eq!(restored.persistent(0), 1);
        assert_eq!(restored.persistent(255), 0xCAFEBABE);
    }

    #[test]
    fn rejects_wrong_sized_blob() {
        let mut ram = Ram::new();
        let err = load(&mut ram, &[0u8; 4]).unwrap_err();
        assert!(matches!(err, PersistError::WrongSize { expected, got: 4 } if expected == PERSIST_FILE_BYTES));
    }

    #[test]
    fn writer_reader_round_trip() {
        let mut ram = Ram::new();
        ram.set_persistent(10, 42);
        let mut buf = Vec::new();
        save_to(&ram, &mut buf).unwrap();

        let mut restored = Ram::new();
        load_from(&mut restored, &buf[..]).unwrap();
        assert_eq!(restored.persistent(10), 42);
    }
}
