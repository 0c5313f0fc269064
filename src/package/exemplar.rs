//! Exemplar and Cohort resources.
//!
//! Both share one layout and differ only in their 3-byte magic (`EQZ` or
//! `CQZ`) and their registry entry. The payload is either binary
//! (`EQZB1###`) or CRLF-separated text (`EQZT1###`).

use crate::error::{Error, Result};
use crate::package::index::TGI;
use crate::package::names::PropertyNameTable;
use crate::package::property::{decode_latin1, encode_latin1, Property};
use crate::package::resource::Resource;
use binrw::{binrw, BinReaderExt, BinWriterExt};
use log::warn;
use std::io::Cursor;
use std::ops::{Deref, DerefMut};

/// Fixed bytes before the first binary property.
pub const BINARY_HEADER_LEN: usize = 24;

const VERSION_BYTE: u8 = b'1';
const RESERVED: [u8; 3] = *b"###";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemplarFormat {
    Binary,
    Text,
}

impl ExemplarFormat {
    pub fn tag(self) -> u8 {
        match self {
            ExemplarFormat::Binary => b'B',
            ExemplarFormat::Text => b'T',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'B' => Some(ExemplarFormat::Binary),
            b'T' => Some(ExemplarFormat::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemplarKind {
    Exemplar,
    Cohort,
}

impl ExemplarKind {
    pub fn magic(self) -> &'static [u8; 3] {
        match self {
            ExemplarKind::Exemplar => b"EQZ",
            ExemplarKind::Cohort => b"CQZ",
        }
    }

    fn magic_str(self) -> &'static str {
        match self {
            ExemplarKind::Exemplar => "EQZ",
            ExemplarKind::Cohort => "CQZ",
        }
    }
}

#[binrw]
#[derive(Debug)]
#[br(little)]
#[bw(little)]
struct BinaryHeader {
    magic: [u8; 3],
    format: u8,
    version: u8,
    reserved: [u8; 3],
    cohort: TGI,
    property_count: u32,
}

/// Contents shared by exemplars and cohorts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExemplarData {
    pub cohort: TGI,
    pub format: ExemplarFormat,
    properties: Vec<Property>,
}

impl ExemplarData {
    pub fn new(cohort: TGI, format: ExemplarFormat) -> Self {
        Self { cohort, format, properties: Vec::new() }
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn set_properties(&mut self, properties: Vec<Property>) {
        self.properties = properties;
    }

    pub fn property(&self, id: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.id() == id)
    }

    /// Replaces the property with the same ID, or appends it.
    pub fn set_property(&mut self, property: Property) {
        match self.properties.iter_mut().find(|p| p.id() == property.id()) {
            Some(existing) => *existing = property,
            None => self.properties.push(property),
        }
    }

    pub fn remove_property(&mut self, id: u32) -> Option<Property> {
        let pos = self.properties.iter().position(|p| p.id() == id)?;
        Some(self.properties.remove(pos))
    }

    /// Binary-form length of the current property list.
    pub fn decompressed_size(&self) -> usize {
        BINARY_HEADER_LEN + self.properties.iter().map(Property::binary_len).sum::<usize>()
    }

    pub fn decode(data: &[u8], kind: ExemplarKind, names: Option<&PropertyNameTable>) -> Result<Self> {
        if data.len() < 5 {
            return Err(Error::UnsupportedEntryFormat(format!(
                "{} payload of {} bytes is too short",
                kind.magic_str(),
                data.len()
            )));
        }
        if &data[0..3] != kind.magic() {
            return Err(Error::UnsupportedEntryFormat(format!(
                "expected {} magic, found {:02X?}",
                kind.magic_str(),
                &data[0..3]
            )));
        }

        match ExemplarFormat::from_tag(data[3]) {
            Some(ExemplarFormat::Binary) => Self::decode_binary(data),
            Some(ExemplarFormat::Text) => Self::decode_text(data, names),
            None => Err(Error::UnsupportedEntryFormat(format!(
                "unknown {} format byte 0x{:02X}",
                kind.magic_str(),
                data[3]
            ))),
        }
    }

    fn decode_binary(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let header: BinaryHeader = cursor.read_le()?;

        let mut properties = Vec::with_capacity((header.property_count as usize).min(data.len() / 9));
        for _ in 0..header.property_count {
            properties.push(Property::read_binary(&mut cursor)?);
        }

        Ok(Self { cohort: header.cohort, format: ExemplarFormat::Binary, properties })
    }

    fn decode_text(data: &[u8], names: Option<&PropertyNameTable>) -> Result<Self> {
        let text = decode_latin1(data);
        let mut lines = text.lines().filter(|l| !l.trim().is_empty()).skip(1);

        let cohort_line = lines.next().unwrap_or_default();
        let cohort = cohort_line
            .trim()
            .strip_prefix("ParentCohort=")
            .and_then(TGI::parse_key_string)
            .ok_or_else(|| Error::MalformedTextProperty(format!("bad ParentCohort line: {}", cohort_line)))?;

        let count_line = lines.next().unwrap_or_default();
        let declared = count_line
            .trim()
            .strip_prefix("PropCount=")
            .and_then(|v| v.strip_prefix("0x").or_else(|| v.strip_prefix("0X")))
            .and_then(|v| u32::from_str_radix(v, 16).ok())
            .ok_or_else(|| Error::MalformedTextProperty(format!("bad PropCount line: {}", count_line)))?;

        let properties = lines
            .map(|line| Property::decode_text(line, names))
            .collect::<Result<Vec<_>>>()?;

        if properties.len() != declared as usize {
            warn!(
                "Text exemplar declares {} properties but contains {}",
                declared,
                properties.len()
            );
        }

        Ok(Self { cohort, format: ExemplarFormat::Text, properties })
    }

    pub fn encode(&self, kind: ExemplarKind, names: Option<&PropertyNameTable>) -> Result<Vec<u8>> {
        match self.format {
            ExemplarFormat::Binary => self.to_binary(kind),
            ExemplarFormat::Text => Ok(encode_latin1(&self.to_text(kind, names))),
        }
    }

    pub fn to_binary(&self, kind: ExemplarKind) -> Result<Vec<u8>> {
        let header = BinaryHeader {
            magic: *kind.magic(),
            format: ExemplarFormat::Binary.tag(),
            version: VERSION_BYTE,
            reserved: RESERVED,
            cohort: self.cohort,
            property_count: self.properties.len() as u32,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(self.decompressed_size()));
        cursor.write_le(&header)?;
        let mut data = cursor.into_inner();
        for property in &self.properties {
            property.write_binary(&mut data)?;
        }
        Ok(data)
    }

    pub fn to_text(&self, kind: ExemplarKind, names: Option<&PropertyNameTable>) -> String {
        let mut out = format!(
            "{}T1###\r\nParentCohort={}\r\nPropCount=0x{:08X}\r\n",
            kind.magic_str(),
            self.cohort.to_key_string(),
            self.properties.len()
        );
        for property in &self.properties {
            out.push_str(&property.encode_text(names));
        }
        out
    }
}

macro_rules! exemplar_wrapper {
    ($name:ident, $kind:expr) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub ExemplarData);

        impl $name {
            pub const KIND: ExemplarKind = $kind;

            pub fn new(cohort: TGI, format: ExemplarFormat) -> Self {
                Self(ExemplarData::new(cohort, format))
            }

            pub fn decode_with_names(data: &[u8], names: Option<&PropertyNameTable>) -> Result<Self> {
                ExemplarData::decode(data, Self::KIND, names).map(Self)
            }

            pub fn to_bytes_with_names(&self, names: Option<&PropertyNameTable>) -> Result<Vec<u8>> {
                self.0.encode(Self::KIND, names)
            }

            /// Payload in the requested form, without changing `self.format`.
            pub fn encode_as(&self, format: ExemplarFormat, names: Option<&PropertyNameTable>) -> Result<Vec<u8>> {
                match format {
                    ExemplarFormat::Binary => self.0.to_binary(Self::KIND),
                    ExemplarFormat::Text => Ok(encode_latin1(&self.0.to_text(Self::KIND, names))),
                }
            }
        }

        impl Deref for $name {
            type Target = ExemplarData;

            fn deref(&self) -> &ExemplarData {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut ExemplarData {
                &mut self.0
            }
        }

        impl Resource for $name {
            fn from_bytes(data: &[u8]) -> Result<Self> {
                Self::decode_with_names(data, None)
            }

            fn to_bytes(&self) -> Result<Vec<u8>> {
                self.to_bytes_with_names(None)
            }
        }
    };
}

exemplar_wrapper!(Exemplar, ExemplarKind::Exemplar);
exemplar_wrapper!(Cohort, ExemplarKind::Cohort);

impl From<Cohort> for Exemplar {
    fn from(cohort: Cohort) -> Self {
        Exemplar(cohort.0)
    }
}

impl From<Exemplar> for Cohort {
    fn from(exemplar: Exemplar) -> Self {
        Cohort(exemplar.0)
    }
}
