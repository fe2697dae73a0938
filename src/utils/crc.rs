//! Utilities for checksums.

use crc::{Crc, CRC_32_ISCSI};

/// The CRC-32C calculator used for file payloads.
const CRC_CALCULATOR: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/**
Return the CRC-32C checksum of the provided payload.

The checksum is computed once when a snapshot is created and is carried along with its metadata so
that two snapshots can be compared without touching their bytes.
*/
pub(crate) fn checksum(payload: &[u8]) -> u32 {
    CRC_CALCULATOR.checksum(payload)
}
