//! Typed exemplar properties and their binary and text encodings.
//!
//! Binary record:
//!
//! ```text
//! id:u32 type:u16 count_flag:u8 reserved:u16 [count:u32] values...
//! ```
//!
//! `count` is present when `count_flag == 0x80` and always for strings.
//!
//! Text record, one CRLF-terminated line:
//!
//! ```text
//! 0x00000010:{"Exemplar Type"}=Uint32:0:{0x00000002}
//! ```

use crate::error::{Error, Result};
use crate::package::names::{display_name, PropertyNameTable};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::warn;
use std::io::{Cursor, Read};

const HAS_COUNT_FLAG: u8 = 0x80;
const FIXED_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Uint8,
    Uint16,
    Uint32,
    Sint32,
    Sint64,
    Float32,
    Bool,
    String,
}

impl PropertyType {
    pub const ALL: [PropertyType; 8] = [
        PropertyType::Uint8,
        PropertyType::Uint16,
        PropertyType::Uint32,
        PropertyType::Sint32,
        PropertyType::Sint64,
        PropertyType::Float32,
        PropertyType::Bool,
        PropertyType::String,
    ];

    pub fn id(self) -> u16 {
        match self {
            PropertyType::Uint8 => 0x0100,
            PropertyType::Uint16 => 0x0200,
            PropertyType::Uint32 => 0x0300,
            PropertyType::Sint32 => 0x0700,
            PropertyType::Sint64 => 0x0800,
            PropertyType::Float32 => 0x0900,
            PropertyType::Bool => 0x0B00,
            PropertyType::String => 0x0C00,
        }
    }

    pub fn from_id(id: u16) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or(Error::UnknownPropertyType(id))
    }

    /// Bytes per element; strings use one byte per character.
    pub fn byte_len(self) -> usize {
        match self {
            PropertyType::Uint8 | PropertyType::Bool | PropertyType::String => 1,
            PropertyType::Uint16 => 2,
            PropertyType::Uint32 | PropertyType::Sint32 | PropertyType::Float32 => 4,
            PropertyType::Sint64 => 8,
        }
    }

    pub fn text_name(self) -> &'static str {
        match self {
            PropertyType::Uint8 => "Uint8",
            PropertyType::Uint16 => "Uint16",
            PropertyType::Uint32 => "Uint32",
            PropertyType::Sint32 => "Sint32",
            PropertyType::Sint64 => "Sint64",
            PropertyType::Float32 => "Float32",
            PropertyType::Bool => "Bool",
            PropertyType::String => "String",
        }
    }

    pub fn from_text_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.text_name().eq_ignore_ascii_case(name))
    }
}

/// Values of one property. Signed 32-bit values are held as `i64` so that the
/// signed decode rule (see [`signed_from_bits`]) is represented exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValues {
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Sint32(Vec<i64>),
    Sint64(Vec<i64>),
    Float32(Vec<f32>),
    Bool(Vec<bool>),
    String(String),
}

impl PropertyValues {
    pub fn element_type(&self) -> PropertyType {
        match self {
            PropertyValues::Uint8(_) => PropertyType::Uint8,
            PropertyValues::Uint16(_) => PropertyType::Uint16,
            PropertyValues::Uint32(_) => PropertyType::Uint32,
            PropertyValues::Sint32(_) => PropertyType::Sint32,
            PropertyValues::Sint64(_) => PropertyType::Sint64,
            PropertyValues::Float32(_) => PropertyType::Float32,
            PropertyValues::Bool(_) => PropertyType::Bool,
            PropertyValues::String(_) => PropertyType::String,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            PropertyValues::Uint8(v) => v.len(),
            PropertyValues::Uint16(v) => v.len(),
            PropertyValues::Uint32(v) => v.len(),
            PropertyValues::Sint32(v) => v.len(),
            PropertyValues::Sint64(v) => v.len(),
            PropertyValues::Float32(v) => v.len(),
            PropertyValues::Bool(v) => v.len(),
            PropertyValues::String(s) => s.chars().count(),
        }
    }

    fn requires_count(&self) -> bool {
        matches!(self, PropertyValues::String(_)) || self.count() != 1
    }
}

/// Interprets the low `width` bytes of `bits` as a signed value. For widths
/// below 8 the value is negative only when its most significant stored byte is
/// 0xF0 or above, in which case it equals `-(16^(2*width) - bits)`. A 64-bit
/// value is plain two's complement, so top bytes 0x80..=0xEF are negative too.
pub fn signed_from_bits(bits: u64, width: usize) -> i64 {
    let top = (bits >> ((width - 1) * 8)) as u8;
    if top >= 0xF0 && width < 8 {
        bits as i64 - (1i64 << (8 * width))
    } else {
        bits as i64
    }
}

/// One exemplar property.
///
/// Binary decoding keeps values, not bytes. A bool byte other than 0x01 reads
/// as `false` and is written back as 0x00, a count flag other than 0x80 is
/// written back as 0x00, and the reserved field is always written as zero.
/// Each of these logs a warning when read.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    id: u32,
    has_count: bool,
    values: PropertyValues,
}

impl Property {
    /// Creates a property in canonical form: scalars carry no explicit count.
    pub fn new(id: u32, values: PropertyValues) -> Self {
        let has_count = values.requires_count();
        Self { id, has_count, values }
    }

    /// Sets the explicit-count flag. Ignored (kept `true`) for strings and
    /// for any value list whose length is not one.
    pub fn with_has_count(mut self, has_count: bool) -> Self {
        self.has_count = has_count || self.values.requires_count();
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn element_type(&self) -> PropertyType {
        self.values.element_type()
    }

    pub fn count(&self) -> usize {
        self.values.count()
    }

    pub fn has_count(&self) -> bool {
        self.has_count
    }

    pub fn values(&self) -> &PropertyValues {
        &self.values
    }

    pub fn set_values(&mut self, values: PropertyValues) {
        self.has_count = self.has_count || values.requires_count();
        self.values = values;
    }

    /// Length of the binary record.
    pub fn binary_len(&self) -> usize {
        let count_len = if self.has_count { 4 } else { 0 };
        FIXED_LEN + count_len + self.count() * self.element_type().byte_len()
    }

    pub fn decode_binary(data: &[u8], offset: usize) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        cursor.set_position(offset as u64);
        Self::read_binary(&mut cursor)
    }

    pub(crate) fn read_binary(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let id = cursor.read_u32::<LittleEndian>()?;
        let element_type = PropertyType::from_id(cursor.read_u16::<LittleEndian>()?)?;
        let flag = cursor.read_u8()?;
        let reserved = cursor.read_u16::<LittleEndian>()?;
        if flag != 0 && flag != HAS_COUNT_FLAG {
            warn!("Property 0x{:08X} has count flag 0x{:02X}, it is written back as 0x00", id, flag);
        }
        if reserved != 0 {
            warn!("Property 0x{:08X} has reserved bytes 0x{:04X}, they are written back as zero", id, reserved);
        }

        let has_count = flag == HAS_COUNT_FLAG || element_type == PropertyType::String;
        let count = if has_count {
            cursor.read_u32::<LittleEndian>()? as usize
        } else {
            1
        };

        let remaining = (cursor.get_ref().len() as u64).saturating_sub(cursor.position());
        let needed = count as u64 * element_type.byte_len() as u64;
        if needed > remaining {
            return Err(Error::Truncated(format!(
                "property 0x{:08X} needs {} value bytes, {} left",
                id, needed, remaining
            )));
        }

        let values = match element_type {
            PropertyType::Uint8 => {
                let mut buf = vec![0u8; count];
                cursor.read_exact(&mut buf)?;
                PropertyValues::Uint8(buf)
            }
            PropertyType::Uint16 => PropertyValues::Uint16(
                (0..count)
                    .map(|_| cursor.read_u16::<LittleEndian>())
                    .collect::<std::io::Result<_>>()?,
            ),
            PropertyType::Uint32 => PropertyValues::Uint32(
                (0..count)
                    .map(|_| cursor.read_u32::<LittleEndian>())
                    .collect::<std::io::Result<_>>()?,
            ),
            PropertyType::Sint32 => PropertyValues::Sint32(
                (0..count)
                    .map(|_| cursor.read_u32::<LittleEndian>().map(|b| signed_from_bits(b as u64, 4)))
                    .collect::<std::io::Result<_>>()?,
            ),
            PropertyType::Sint64 => PropertyValues::Sint64(
                (0..count)
                    .map(|_| cursor.read_u64::<LittleEndian>().map(|b| signed_from_bits(b, 8)))
                    .collect::<std::io::Result<_>>()?,
            ),
            PropertyType::Float32 => PropertyValues::Float32(
                (0..count)
                    .map(|_| cursor.read_f32::<LittleEndian>())
                    .collect::<std::io::Result<_>>()?,
            ),
            PropertyType::Bool => {
                let mut buf = vec![0u8; count];
                cursor.read_exact(&mut buf)?;
                if buf.iter().any(|&b| b > 0x01) {
                    warn!("Property 0x{:08X} has bool bytes other than 0/1, reading them as false", id);
                }
                PropertyValues::Bool(buf.into_iter().map(|b| b == 0x01).collect())
            }
            PropertyType::String => {
                let mut buf = vec![0u8; count];
                cursor.read_exact(&mut buf)?;
                PropertyValues::String(decode_latin1(&buf))
            }
        };

        Ok(Self { id, has_count, values })
    }

    pub fn encode_binary(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.binary_len());
        self.write_binary(&mut out)?;
        Ok(out)
    }

    pub(crate) fn write_binary(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u32::<LittleEndian>(self.id)?;
        out.write_u16::<LittleEndian>(self.element_type().id())?;
        out.write_u8(if self.has_count { HAS_COUNT_FLAG } else { 0 })?;
        out.write_u16::<LittleEndian>(0)?;
        if self.has_count {
            out.write_u32::<LittleEndian>(self.count() as u32)?;
        }

        match &self.values {
            PropertyValues::Uint8(v) => out.extend_from_slice(v),
            PropertyValues::Uint16(v) => {
                for x in v {
                    out.write_u16::<LittleEndian>(*x)?;
                }
            }
            PropertyValues::Uint32(v) => {
                for x in v {
                    out.write_u32::<LittleEndian>(*x)?;
                }
            }
            PropertyValues::Sint32(v) => {
                for x in v {
                    out.write_u32::<LittleEndian>(*x as u32)?;
                }
            }
            PropertyValues::Sint64(v) => {
                for x in v {
                    out.write_i64::<LittleEndian>(*x)?;
                }
            }
            PropertyValues::Float32(v) => {
                for x in v {
                    out.write_f32::<LittleEndian>(*x)?;
                }
            }
            PropertyValues::Bool(v) => out.extend(v.iter().map(|b| u8::from(*b))),
            PropertyValues::String(s) => out.extend(encode_latin1(s)),
        }
        Ok(())
    }

    /// Renders the CRLF-terminated text line.
    pub fn encode_text(&self, names: Option<&PropertyNameTable>) -> String {
        let element_type = self.element_type();
        let count = if self.has_count && element_type != PropertyType::String {
            self.count()
        } else {
            0
        };

        let values = match &self.values {
            PropertyValues::Uint8(v) => join(v.iter().map(|x| format!("0x{:02X}", x))),
            PropertyValues::Uint16(v) => join(v.iter().map(|x| format!("0x{:04X}", x))),
            PropertyValues::Uint32(v) => join(v.iter().map(|x| format!("0x{:08X}", x))),
            PropertyValues::Sint32(v) => join(v.iter().map(|x| format!("0x{:08X}", *x as u32))),
            PropertyValues::Sint64(v) => join(v.iter().map(|x| format!("0x{:016X}", *x as u64))),
            PropertyValues::Float32(v) => join(v.iter().map(|x| format!("0x{:08X}", x.to_bits()))),
            PropertyValues::Bool(v) => join(v.iter().map(|b| if *b { "True" } else { "False" }.to_string())),
            PropertyValues::String(s) => format!("\"{}\"", s),
        };

        format!(
            "0x{:08X}:{{\"{}\"}}={}:{}:{{{}}}\r\n",
            self.id,
            display_name(names, self.id),
            element_type.text_name(),
            count,
            values
        )
    }

    /// Parses one text line. `names` supplies the element type when the line's
    /// type token is not recognised.
    pub fn decode_text(line: &str, names: Option<&PropertyNameTable>) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let malformed = |what: &str| Error::MalformedTextProperty(format!("{}: {}", what, line));

        let (id_part, rest) = line.split_once(':').ok_or_else(|| malformed("missing ':' after id"))?;
        let id = parse_hex(id_part.trim())
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| malformed("id is not a 0x hex number"))?;

        let (name_part, rest) = rest.split_once("}=").ok_or_else(|| malformed("missing '='"))?;
        if !name_part.trim_start().starts_with('{') {
            return Err(malformed("missing '{' before name"));
        }

        let (type_part, rest) = rest.split_once(':').ok_or_else(|| malformed("missing ':' after type"))?;
        let element_type = PropertyType::from_text_name(type_part.trim())
            .or_else(|| names.and_then(|n| n.element_type(id)))
            .ok_or_else(|| malformed("unknown type"))?;

        let (count_part, values_part) = rest.split_once(':').ok_or_else(|| malformed("missing ':' after count"))?;
        let count = count_part
            .trim()
            .parse::<usize>()
            .map_err(|_| malformed("count is not a number"))?;

        let inner = values_part
            .trim()
            .strip_prefix('{')
            .and_then(|v| v.strip_suffix('}'))
            .ok_or_else(|| malformed("values not enclosed in braces"))?;

        let tokens: Vec<&str> = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };

        let bad_value = |tok: &str| malformed(&format!("bad {} value '{}'", element_type.text_name(), tok));
        let values = match element_type {
            PropertyType::Uint8 => PropertyValues::Uint8(
                tokens
                    .iter()
                    .map(|t| parse_unsigned(t).and_then(|v| u8::try_from(v).ok()).ok_or_else(|| bad_value(t)))
                    .collect::<Result<_>>()?,
            ),
            PropertyType::Uint16 => PropertyValues::Uint16(
                tokens
                    .iter()
                    .map(|t| parse_unsigned(t).and_then(|v| u16::try_from(v).ok()).ok_or_else(|| bad_value(t)))
                    .collect::<Result<_>>()?,
            ),
            PropertyType::Uint32 => PropertyValues::Uint32(
                tokens
                    .iter()
                    .map(|t| parse_unsigned(t).and_then(|v| u32::try_from(v).ok()).ok_or_else(|| bad_value(t)))
                    .collect::<Result<_>>()?,
            ),
            PropertyType::Sint32 => PropertyValues::Sint32(
                tokens
                    .iter()
                    .map(|t| parse_signed(t, 4).ok_or_else(|| bad_value(t)))
                    .collect::<Result<_>>()?,
            ),
            PropertyType::Sint64 => PropertyValues::Sint64(
                tokens
                    .iter()
                    .map(|t| parse_signed(t, 8).ok_or_else(|| bad_value(t)))
                    .collect::<Result<_>>()?,
            ),
            PropertyType::Float32 => PropertyValues::Float32(
                tokens
                    .iter()
                    .map(|t| parse_float(t).ok_or_else(|| bad_value(t)))
                    .collect::<Result<_>>()?,
            ),
            // "0x01" counts as true for files written by older tools.
            PropertyType::Bool => PropertyValues::Bool(
                tokens
                    .iter()
                    .map(|t| *t == "0x01" || t.eq_ignore_ascii_case("true"))
                    .collect(),
            ),
            PropertyType::String => {
                let text = inner
                    .trim()
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .ok_or_else(|| malformed("string value not quoted"))?;
                PropertyValues::String(text.to_string())
            }
        };

        if count != 0 && element_type != PropertyType::String && count != values.count() {
            warn!(
                "Property 0x{:08X} declares {} values but lists {}",
                id,
                count,
                values.count()
            );
        }

        Ok(Self::new(id, values).with_has_count(count != 0))
    }
}

/// One byte per character.
pub(crate) fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}

/// One byte per character; characters above U+00FF become `?`.
pub(crate) fn encode_latin1(text: &str) -> Vec<u8> {
    let out: Vec<u8> = text.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect();
    let lost = text.chars().filter(|&c| u32::from(c) > 0xFF).count();
    if lost > 0 {
        warn!("{} characters outside Latin-1 written as '?'", lost);
    }
    out
}

fn join<I: Iterator<Item = String>>(items: I) -> String {
    items.collect::<Vec<_>>().join(",")
}

fn parse_hex(s: &str) -> Option<u64> {
    let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    u64::from_str_radix(hex, 16).ok()
}

fn parse_unsigned(s: &str) -> Option<u64> {
    parse_hex(s).or_else(|| s.parse::<u64>().ok())
}

fn parse_signed(s: &str, width: usize) -> Option<i64> {
    match parse_hex(s) {
        Some(bits) if width == 8 || bits >> (8 * width) == 0 => Some(signed_from_bits(bits, width)),
        Some(_) => None,
        None => s.parse::<i64>().ok(),
    }
}

fn parse_float(s: &str) -> Option<f32> {
    match parse_hex(s) {
        Some(bits) => u32::try_from(bits).ok().map(f32::from_bits),
        None => s.parse::<f32>().ok(),
    }
}
