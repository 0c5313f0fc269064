//! QFS/RefPack compression, the LZ77 variant used for SC4 DBPF entry payloads.
//!
//! Stream layout:
//!
//! | offset | size | field |
//! |--------|------|-------|
//! | 0      | 4    | compressed size, little-endian (informational) |
//! | 4      | 2    | magic `0xFB10`, little-endian |
//! | 6      | 3    | decompressed size, big-endian |
//! | 9      | ..   | opcode stream, closed by a `0xFC..=0xFF` opcode |

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::{debug, warn};
use std::collections::HashMap;

pub const MAGIC: u16 = 0xFB10;
pub const HEADER_SIZE: usize = 9;

const MAX_ITER: usize = 0x80;
const MAX_OFFSET: usize = 0x20000;
const MAX_COPY_COUNT: usize = 0x404;
const MAX_LITERAL_BLOCKS: usize = 0x1B;
// The decompressed size field is 24 bits wide.
const MAX_INPUT_SIZE: usize = 0xFF_FFFF;

/// Outcome of a single compress or decompress call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackagerInfo {
    pub compressed: bool,
    pub compressed_size: usize,
    pub decompressed_size: usize,
}

impl PackagerInfo {
    fn stored(len: usize) -> Self {
        Self { compressed: false, compressed_size: len, decompressed_size: len }
    }
}

pub fn is_compressed(data: &[u8]) -> bool {
    data.len() >= 7 && LittleEndian::read_u16(&data[4..6]) == MAGIC
}

/// Decompressed size declared by a QFS header, or `None` for stored data.
pub fn declared_size(data: &[u8]) -> Option<usize> {
    if is_compressed(data) && data.len() >= HEADER_SIZE {
        Some(BigEndian::read_u24(&data[6..9]) as usize)
    } else {
        None
    }
}

/// Decompresses `data`, returning it unchanged when it carries no QFS header.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    decompress_with_info(data).map(|(out, _)| out)
}

pub fn decompress_with_info(data: &[u8]) -> Result<(Vec<u8>, PackagerInfo)> {
    if !is_compressed(data) {
        return Ok((data.to_vec(), PackagerInfo::stored(data.len())));
    }
    if data.len() < HEADER_SIZE {
        return Err(Error::Decompression(format!(
            "header needs {} bytes, got {}",
            HEADER_SIZE,
            data.len()
        )));
    }

    let declared = LittleEndian::read_u32(&data[0..4]) as usize;
    let memsize = BigEndian::read_u24(&data[6..9]) as usize;
    if declared != data.len() {
        warn!(
            "QFS header declares {} compressed bytes but {} are available",
            declared,
            data.len()
        );
    }

    let decompressed = decode_stream(data, memsize)?;
    if decompressed.len() != memsize {
        warn!(
            "QFS decompressed size mismatch: header says {}, got {}",
            memsize,
            decompressed.len()
        );
    }

    let info = PackagerInfo {
        compressed: true,
        compressed_size: data.len(),
        decompressed_size: decompressed.len(),
    };
    Ok((decompressed, info))
}

fn decode_stream(data: &[u8], memsize: usize) -> Result<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(memsize);
    let mut r_pos = HEADER_SIZE;

    while r_pos < data.len() {
        let byte0 = data[r_pos];
        r_pos += 1;

        if byte0 <= 0x7F {
            if r_pos >= data.len() {
                break;
            }
            let byte1 = data[r_pos];
            r_pos += 1;

            let num_plain = (byte0 & 0x03) as usize;
            let num_copy = (((byte0 & 0x1C) >> 2) + 3) as usize;
            let copy_offset = ((byte0 as usize & 0x60) << 3) + byte1 as usize + 1;

            copy_plain(data, &mut r_pos, &mut decompressed, num_plain)?;
            copy_ref(&mut decompressed, num_copy, copy_offset)?;
        } else if byte0 <= 0xBF {
            if r_pos + 1 >= data.len() {
                break;
            }
            let byte1 = data[r_pos];
            let byte2 = data[r_pos + 1];
            r_pos += 2;

            let num_plain = ((byte1 >> 6) & 0x03) as usize;
            let num_copy = ((byte0 & 0x3F) + 4) as usize;
            let copy_offset = ((byte1 as usize & 0x3F) << 8) + byte2 as usize + 1;

            copy_plain(data, &mut r_pos, &mut decompressed, num_plain)?;
            copy_ref(&mut decompressed, num_copy, copy_offset)?;
        } else if byte0 <= 0xDF {
            if r_pos + 2 >= data.len() {
                break;
            }
            let byte1 = data[r_pos];
            let byte2 = data[r_pos + 1];
            let byte3 = data[r_pos + 2];
            r_pos += 3;

            let num_plain = (byte0 & 0x03) as usize;
            let num_copy = ((byte0 as usize & 0x0C) << 6) + byte3 as usize + 5;
            let copy_offset =
                ((byte0 as usize & 0x10) << 12) + ((byte1 as usize) << 8) + byte2 as usize + 1;

            copy_plain(data, &mut r_pos, &mut decompressed, num_plain)?;
            copy_ref(&mut decompressed, num_copy, copy_offset)?;
        } else if byte0 <= 0xFB {
            let num_plain = (((byte0 & 0x1F) as usize) << 2) + 4;
            copy_plain(data, &mut r_pos, &mut decompressed, num_plain)?;
        } else {
            let num_plain = (byte0 & 0x03) as usize;
            copy_plain(data, &mut r_pos, &mut decompressed, num_plain)?;
            return Ok(decompressed);
        }
    }

    warn!("QFS stream ended without a stop opcode");
    Ok(decompressed)
}

fn copy_plain(src: &[u8], src_pos: &mut usize, dest: &mut Vec<u8>, count: usize) -> Result<()> {
    if *src_pos + count > src.len() {
        return Err(Error::Decompression(format!(
            "plain copy of {} bytes at {} runs past input ({} bytes)",
            count,
            *src_pos,
            src.len()
        )));
    }
    dest.extend_from_slice(&src[*src_pos..*src_pos + count]);
    *src_pos += count;
    Ok(())
}

fn copy_ref(dest: &mut Vec<u8>, count: usize, offset: usize) -> Result<()> {
    if offset > dest.len() {
        return Err(Error::Decompression(format!(
            "reference copy offset {} exceeds output position {}",
            offset,
            dest.len()
        )));
    }
    // Source and destination may overlap, so copy one byte at a time.
    for _ in 0..count {
        let byte = dest[dest.len() - offset];
        dest.push(byte);
    }
    Ok(())
}

/// Compresses `data`. Returns the input unchanged when it is already QFS
/// data or when compression would not make it smaller.
pub fn compress(data: &[u8]) -> Vec<u8> {
    compress_with_info(data).0
}

pub fn compress_with_info(data: &[u8]) -> (Vec<u8>, PackagerInfo) {
    if is_compressed(data) {
        let info = PackagerInfo {
            compressed: true,
            compressed_size: data.len(),
            decompressed_size: declared_size(data).unwrap_or(data.len()),
        };
        return (data.to_vec(), info);
    }
    if data.len() > MAX_INPUT_SIZE {
        debug!("{} bytes exceeds the QFS size field, storing uncompressed", data.len());
        return (data.to_vec(), PackagerInfo::stored(data.len()));
    }

    let packed = encode_stream(data);
    if packed.len() >= data.len() {
        debug!(
            "QFS output ({} bytes) not smaller than input ({} bytes), storing uncompressed",
            packed.len(),
            data.len()
        );
        return (data.to_vec(), PackagerInfo::stored(data.len()));
    }

    let info = PackagerInfo {
        compressed: true,
        compressed_size: packed.len(),
        decompressed_size: data.len(),
    };
    (packed, info)
}

fn key3(data: &[u8], pos: usize) -> u32 {
    (data[pos] as u32) | ((data[pos + 1] as u32) << 8) | ((data[pos + 2] as u32) << 16)
}

/// Always produces a complete stream, even when it is larger than `data`.
fn encode_stream(data: &[u8]) -> Vec<u8> {
    let len = data.len();
    // Worst case: one 0xE0 opcode per 112 literal bytes plus the stop opcode.
    let mut out = Vec::with_capacity(HEADER_SIZE + len + len / 112 + 2);
    out.resize(HEADER_SIZE, 0);

    let mut occurrences: HashMap<u32, Vec<usize>> = HashMap::new();
    let mut last_written = 0;
    let mut pos = 0;

    while pos + 3 <= len {
        let candidates = occurrences.entry(key3(data, pos)).or_default();

        let mut best_len = 0;
        let mut best_offset = 0;
        for &found in candidates.iter().rev().take(MAX_ITER) {
            let offset = pos - found;
            if offset > MAX_OFFSET {
                break;
            }
            let mut n = 3;
            while pos + n < len && n < MAX_COPY_COUNT && data[pos + n] == data[found + n] {
                n += 1;
            }
            if n > best_len {
                best_len = n;
                best_offset = offset;
            }
        }
        candidates.push(pos);

        let encodable = match best_len {
            0..=2 => false,
            3 => best_offset <= 0x400,
            4 => best_offset <= 0x4000,
            _ => true,
        };
        if !encodable {
            pos += 1;
            continue;
        }

        flush_literals(&mut out, data, &mut last_written, pos);
        emit_match(&mut out, data, &mut last_written, pos, best_len, best_offset);

        for skipped in pos + 1..pos + best_len {
            if skipped + 3 > len {
                break;
            }
            occurrences.entry(key3(data, skipped)).or_default().push(skipped);
        }
        pos += best_len;
    }

    flush_literals(&mut out, data, &mut last_written, len);
    let remaining = len - last_written;
    out.push(0xFC + remaining as u8);
    out.extend_from_slice(&data[last_written..]);

    let total = out.len() as u32;
    LittleEndian::write_u32(&mut out[0..4], total);
    LittleEndian::write_u16(&mut out[4..6], MAGIC);
    BigEndian::write_u24(&mut out[6..9], len as u32);
    out
}

/// Emits 0xE0-class literal blocks until fewer than four bytes remain before `to`.
fn flush_literals(out: &mut Vec<u8>, data: &[u8], last_written: &mut usize, to: usize) {
    while to - *last_written >= 4 {
        let blocks = ((to - *last_written) / 4 - 1).min(MAX_LITERAL_BLOCKS);
        out.push(0xE0 + blocks as u8);
        let count = blocks * 4 + 4;
        out.extend_from_slice(&data[*last_written..*last_written + count]);
        *last_written += count;
    }
}

fn emit_match(
    out: &mut Vec<u8>,
    data: &[u8],
    last_written: &mut usize,
    pos: usize,
    copy_len: usize,
    offset: usize,
) {
    let literals = pos - *last_written;
    let o = offset - 1;

    if copy_len <= 0x0A && o < 0x400 {
        out.push((((o >> 8) << 5) + ((copy_len - 3) << 2) + literals) as u8);
        out.push((o & 0xFF) as u8);
    } else if copy_len <= 0x43 && o < 0x4000 {
        out.push((0x80 + (copy_len - 4)) as u8);
        out.push(((literals << 6) + (o >> 8)) as u8);
        out.push((o & 0xFF) as u8);
    } else {
        out.push((0xC0 + ((o >> 12) & 0x10) + (((copy_len - 5) >> 6) & 0x0C) + literals) as u8);
        out.push(((o >> 8) & 0xFF) as u8);
        out.push((o & 0xFF) as u8);
        out.push(((copy_len - 5) & 0xFF) as u8);
    }

    out.extend_from_slice(&data[*last_written..pos]);
    *last_written = pos + copy_len;
}
