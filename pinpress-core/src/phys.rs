//! PNG Physical Density Chunk
//!
//! Splices a `pHYs` chunk directly after IHDR so print software reads the
//! file at the intended dots per inch. Producer side, plus a reader used to
//! check what was written.

use thiserror::Error;

use crate::print::{self, METERS_PER_INCH};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
pub const PHYS_TAG: [u8; 4] = *b"pHYs";
/// Signature (8) + IHDR chunk (4 length + 4 type + 13 data + 4 crc).
pub const HEADER_END: usize = 33;
/// Length (4) + type (4) + payload (9) + crc (4).
pub const PHYS_CHUNK_LEN: usize = 21;
pub const UNIT_METER: u8 = 1;

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// CRC-32 (IEEE, reflected) as used by PNG chunks.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut c = 0xFFFF_FFFFu32;
    for &b in bytes {
        c = CRC_TABLE[((c ^ b as u32) & 0xFF) as usize] ^ (c >> 8);
    }
    c ^ 0xFFFF_FFFF
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhysError {
    #[error("Not a PNG stream")]
    NotPng,

    #[error("Expected IHDR of 13 bytes right after the signature")]
    MissingHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysChunk {
    pub ppm_x: u32,
    pub ppm_y: u32,
    pub unit: u8,
}

impl PhysChunk {
    pub fn for_dpi(dpi: u32) -> Self {
        let ppm = print::pixels_per_meter(dpi);
        Self {
            ppm_x: ppm,
            ppm_y: ppm,
            unit: UNIT_METER,
        }
    }

    /// Dots per inch implied by the horizontal density.
    pub fn dpi(&self) -> f64 {
        self.ppm_x as f64 * METERS_PER_INCH
    }

    pub fn to_bytes(&self) -> [u8; PHYS_CHUNK_LEN] {
        let mut out = [0u8; PHYS_CHUNK_LEN];
        out[0..4].copy_from_slice(&9u32.to_be_bytes());
        out[4..8].copy_from_slice(&PHYS_TAG);
        out[8..12].copy_from_slice(&self.ppm_x.to_be_bytes());
        out[12..16].copy_from_slice(&self.ppm_y.to_be_bytes());
        out[16] = self.unit;
        let crc = crc32(&out[4..17]);
        out[17..21].copy_from_slice(&crc.to_be_bytes());
        out
    }
}

fn check_header(png: &[u8]) -> Result<(), PhysError> {
    if png.len() < PNG_SIGNATURE.len() || png[..8] != PNG_SIGNATURE {
        return Err(PhysError::NotPng);
    }
    if png.len() < HEADER_END || png[8..12] != 13u32.to_be_bytes() || &png[12..16] != b"IHDR" {
        return Err(PhysError::MissingHeader);
    }
    Ok(())
}

/// Insert `chunk` between IHDR and the rest of the stream.
pub fn inject(png: &[u8], chunk: &PhysChunk) -> Result<Vec<u8>, PhysError> {
    check_header(png)?;
    let mut out = Vec::with_capacity(png.len() + PHYS_CHUNK_LEN);
    out.extend_from_slice(&png[..HEADER_END]);
    out.extend_from_slice(&chunk.to_bytes());
    out.extend_from_slice(&png[HEADER_END..]);
    Ok(out)
}

/// Find the first `pHYs` chunk with a valid CRC.
pub fn read(png: &[u8]) -> Option<PhysChunk> {
    check_header(png).ok()?;
    let mut pos = PNG_SIGNATURE.len();
    while pos + 12 <= png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().ok()?) as usize;
        let end = pos.checked_add(12)?.checked_add(len)?;
        if end > png.len() {
            return None;
        }
        let tag = &png[pos + 4..pos + 8];
        if tag == b"IEND" {
            return None;
        }
        if tag == PHYS_TAG && len == 9 {
            let body = &png[pos + 4..pos + 17];
            let stored = u32::from_be_bytes(png[pos + 17..pos + 21].try_into().ok()?);
            if crc32(body) != stored {
                return None;
            }
            let data = &png[pos + 8..pos + 17];
            return Some(PhysChunk {
                ppm_x: u32::from_be_bytes(data[0..4].try_into().ok()?),
                ppm_y: u32::from_be_bytes(data[4..8].try_into().ok()?),
                unit: data[8],
            });
        }
        pos = end;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_vectors() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b"IEND"), 0xAE42_6082);
    }

    #[test]
    fn test_300_dpi_is_11811_ppm() {
        let chunk = PhysChunk::for_dpi(300);
        assert_eq!(chunk.ppm_x, 11811);
        assert_eq!(chunk.ppm_y, 11811);
        assert_eq!(chunk.unit, UNIT_METER);
    }

    #[test]
    fn test_chunk_layout() {
        let bytes = PhysChunk::for_dpi(300).to_bytes();
        assert_eq!(&bytes[0..4], &[0, 0, 0, 9]);
        assert_eq!(&bytes[4..8], b"pHYs");
        assert_eq!(&bytes[8..12], &11811u32.to_be_bytes());
        assert_eq!(bytes[16], 1);
        let crc = u32::from_be_bytes(bytes[17..21].try_into().unwrap());
        assert_eq!(crc, crc32(&bytes[4..17]));
    }

    #[test]
    fn test_inject_rejects_non_png() {
        let chunk = PhysChunk::for_dpi(300);
        assert_eq!(inject(b"GIF89a", &chunk), Err(PhysError::NotPng));
        let mut short = PNG_SIGNATURE.to_vec();
        short.extend_from_slice(&[0, 0, 0, 13]);
        assert_eq!(inject(&short, &chunk), Err(PhysError::MissingHeader));
    }
}
