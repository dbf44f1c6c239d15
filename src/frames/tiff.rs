//! TIFF/BigTIFF directory walking.
//!
//! EER movies and `_Fractions.tiff` stacks store one image file directory
//! (IFD) per frame. Counting frames only needs the IFD chain: the header
//! points at the first IFD, each IFD starts with its entry count and ends with
//! the offset of the next one. Pixel strips are never touched.

use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use super::ScanError;

/// Upper bound on the IFD chain length
const MAX_DIRECTORIES: u32 = 10_000_000;

#[derive(Debug, Clone, Copy)]
enum Endian {
    Little,
    Big,
}

struct TiffReader<R> {
    inner: R,
    endian: Endian,
    big_tiff: bool,
}

impl<R: Read + Seek> TiffReader<R> {
    fn u16(&mut self) -> std::io::Result<u16> {
        match self.endian {
            Endian::Little => self.inner.read_u16::<LittleEndian>(),
            Endian::Big => self.inner.read_u16::<BigEndian>(),
        }
    }

    fn u32(&mut self) -> std::io::Result<u32> {
        match self.endian {
            Endian::Little => self.inner.read_u32::<LittleEndian>(),
            Endian::Big => self.inner.read_u32::<BigEndian>(),
        }
    }

    fn u64(&mut self) -> std::io::Result<u64> {
        match self.endian {
            Endian::Little => self.inner.read_u64::<LittleEndian>(),
            Endian::Big => self.inner.read_u64::<BigEndian>(),
        }
    }

    /// IFD offsets are 4 bytes in classic TIFF, 8 in BigTIFF
    fn offset(&mut self) -> std::io::Result<u64> {
        if self.big_tiff {
            self.u64()
        } else {
            self.u32().map(u64::from)
        }
    }

    /// Skip one IFD body, returning the offset of the next IFD
    fn skip_directory(&mut self) -> Result<u64, ScanError> {
        let (entries, entry_size) = if self.big_tiff {
            (self.u64()?, 20u64)
        } else {
            (u64::from(self.u16()?), 12u64)
        };
        let skip = entries
            .checked_mul(entry_size)
            .and_then(|n| i64::try_from(n).ok())
            .ok_or_else(|| ScanError::InvalidContainer(format!("IFD entry count {entries} overflows")))?;
        self.inner.seek(SeekFrom::Current(skip))?;
        Ok(self.offset()?)
    }
}

/// Count the image file directories of a TIFF container of `len` bytes
pub fn count_directories<R: Read + Seek>(mut reader: R, len: u64) -> Result<u32, ScanError> {
    let mut byte_order = [0u8; 2];
    reader.read_exact(&mut byte_order)?;
    let endian = match &byte_order {
        b"II" => Endian::Little,
        b"MM" => Endian::Big,
        other => {
            return Err(ScanError::InvalidContainer(format!(
                "unknown TIFF byte order marker {other:?}"
            )))
        }
    };

    let mut tiff = TiffReader {
        inner: reader,
        endian,
        big_tiff: false,
    };

    match tiff.u16()? {
        42 => {}
        43 => {
            let offset_size = tiff.u16()?;
            let reserved = tiff.u16()?;
            if offset_size != 8 || reserved != 0 {
                return Err(ScanError::InvalidContainer(format!(
                    "unsupported BigTIFF offset size {offset_size}"
                )));
            }
            tiff.big_tiff = true;
        }
        version => {
            return Err(ScanError::InvalidContainer(format!(
                "unsupported TIFF version {version}"
            )))
        }
    }

    let mut offset = tiff.offset()?;
    let mut visited = HashSet::new();
    let mut count = 0u32;

    while offset != 0 {
        if offset >= len {
            return Err(ScanError::InvalidContainer(format!(
                "IFD offset {offset} beyond end of file ({len} bytes)"
            )));
        }
        if !visited.insert(offset) {
            return Err(ScanError::InvalidContainer(format!(
                "IFD chain loops back to offset {offset}"
            )));
        }
        if count >= MAX_DIRECTORIES {
            return Err(ScanError::InvalidContainer(format!(
                "more than {MAX_DIRECTORIES} IFDs"
            )));
        }
        tiff.inner.seek(SeekFrom::Start(offset))?;
        offset = tiff.skip_directory()?;
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use byteorder::{ByteOrder, WriteBytesExt};
    use std::io::Cursor;

    /// Classic TIFF with `frames` single-entry IFDs
    pub(crate) fn classic_tiff<B: ByteOrder>(marker: &[u8; 2], frames: u32) -> Vec<u8> {
        const IFD_SIZE: u32 = 2 + 12 + 4;
        let mut out = marker.to_vec();
        out.write_u16::<B>(42).unwrap();
        out.write_u32::<B>(if frames == 0 { 0 } else { 8 }).unwrap();
        for i in 0..frames {
            out.write_u16::<B>(1).unwrap();
            out.extend_from_slice(&[0u8; 12]);
            let next = if i + 1 == frames { 0 } else { 8 + IFD_SIZE * (i + 1) };
            out.write_u32::<B>(next).unwrap();
        }
        out
    }

    fn count(bytes: &[u8]) -> Result<u32, ScanError> {
        count_directories(Cursor::new(bytes), bytes.len() as u64)
    }

    #[test]
    fn test_little_endian_chain() {
        let bytes = classic_tiff::<LittleEndian>(b"II", 40);
        assert_eq!(count(&bytes).unwrap(), 40);
    }

    #[test]
    fn test_big_endian_chain() {
        let bytes = classic_tiff::<BigEndian>(b"MM", 7);
        assert_eq!(count(&bytes).unwrap(), 7);
    }

    #[test]
    fn test_big_tiff_chain() {
        const IFD_SIZE: u64 = 8 + 20 + 8;
        let mut bytes = b"II".to_vec();
        bytes.write_u16::<LittleEndian>(43).unwrap();
        bytes.write_u16::<LittleEndian>(8).unwrap();
        bytes.write_u16::<LittleEndian>(0).unwrap();
        bytes.write_u64::<LittleEndian>(16).unwrap();
        for i in 0..3u64 {
            bytes.write_u64::<LittleEndian>(1).unwrap();
            bytes.extend_from_slice(&[0u8; 20]);
            let next = if i == 2 { 0 } else { 16 + IFD_SIZE * (i + 1) };
            bytes.write_u64::<LittleEndian>(next).unwrap();
        }
        assert_eq!(count(&bytes).unwrap(), 3);
    }

    #[test]
    fn test_loop_detected() {
        let mut bytes = classic_tiff::<LittleEndian>(b"II", 2);
        // Point the second IFD back at the first
        let len = bytes.len();
        bytes[len - 4..].copy_from_slice(&8u32.to_le_bytes());
        assert!(matches!(count(&bytes), Err(ScanError::InvalidContainer(_))));
    }

    #[test]
    fn test_truncated_chain() {
        let bytes = classic_tiff::<LittleEndian>(b"II", 3);
        assert!(count(&bytes[..bytes.len() - 10]).is_err());
    }

    #[test]
    fn test_not_a_tiff() {
        assert!(matches!(count(b"GIF89a.."), Err(ScanError::InvalidContainer(_))));
        assert!(matches!(count(b"I"), Err(ScanError::Io(_))));
    }

    #[test]
    fn test_empty_chain() {
        let bytes = classic_tiff::<LittleEndian>(b"II", 0);
        assert_eq!(count(&bytes).unwrap(), 0);
    }
}
