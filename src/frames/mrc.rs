//! MRC stack header.
//!
//! The first three 32-bit words of the 1024-byte header are the dimensions
//! (nx, ny, nz); for a movie, nz is the frame count. MRC2014 files declare
//! their byte order in the machine stamp at byte 212.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::ScanError;

const HEADER_LEN: usize = 1024;
const MACHINE_STAMP: usize = 212;

/// Frame count (nz) of an MRC stack
pub fn section_count<R: Read>(mut reader: R) -> Result<u32, ScanError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;

    let big_endian = header[MACHINE_STAMP] == 0x11 && header[MACHINE_STAMP + 1] == 0x11;
    let (nx, ny, nz) = if big_endian {
        read_dims::<BigEndian>(&header)
    } else {
        read_dims::<LittleEndian>(&header)
    };

    if nx <= 0 || ny <= 0 || nz < 0 {
        return Err(ScanError::InvalidContainer(format!(
            "implausible MRC dimensions {nx} x {ny} x {nz}"
        )));
    }
    Ok(nz as u32)
}

fn read_dims<B: ByteOrder>(header: &[u8]) -> (i32, i32, i32) {
    (
        B::read_i32(&header[0..4]),
        B::read_i32(&header[4..8]),
        B::read_i32(&header[8..12]),
    )
}
