use crate::error::{Error, Result};
use crate::package::directory::DirectoryResource;
use crate::package::exemplar::{Cohort, Exemplar};
use crate::package::format::{ResourceFormat, TGIKeys};
use crate::package::index::TGI;
use crate::package::names::PropertyNameTable;
use crate::package::qfs;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

pub trait Resource: std::fmt::Debug {
    fn from_bytes(data: &[u8]) -> Result<Self> where Self: Sized;
    fn to_bytes(&self) -> Result<Vec<u8>>;
}

/// Payload kept as bytes. For `TypedResource::Raw` these are the stored bytes
/// (possibly QFS compressed); for `TypedResource::Opaque` they are decompressed
/// and left to an external sub-codec (PNG, FSH, S3D, WAV).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericResource {
    pub format: ResourceFormat,
    pub data: Vec<u8>,
}

impl GenericResource {
    pub fn from_bytes_with_format(format: ResourceFormat, data: &[u8]) -> Self {
        Self { format, data: data.to_vec() }
    }
}

impl Resource for GenericResource {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::from_bytes_with_format(ResourceFormat::Raw, data))
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.data.clone())
    }
}

/// Text resource (LUA 0xCA63E2A3, RUL 0x0A5BCF4B)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResource {
    pub content: String,
}

impl Resource for TextResource {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let content = String::from_utf8(data.to_vec())
            .map_err(|e| Error::UnsupportedEntryFormat(format!("text resource is not UTF-8: {}", e)))?;
        Ok(Self { content })
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.content.as_bytes().to_vec())
    }
}

/// Localised text resource (0x2026960B)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LTextResource {
    pub text: String,
}

impl LTextResource {
    const MARKER: u16 = 0x1000;
}

impl Resource for LTextResource {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let char_count = cursor.read_u16::<LittleEndian>()? as usize;
        let marker = cursor.read_u16::<LittleEndian>()?;
        if marker != Self::MARKER {
            return Err(Error::UnsupportedEntryFormat(format!(
                "LTEXT marker 0x{:04X}, expected 0x{:04X}",
                marker,
                Self::MARKER
            )));
        }
        if 4 + char_count * 2 > data.len() {
            return Err(Error::Truncated(format!(
                "LTEXT declares {} characters in {} bytes",
                char_count,
                data.len()
            )));
        }
        let units = (0..char_count)
            .map(|_| cursor.read_u16::<LittleEndian>())
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self { text: String::from_utf16_lossy(&units) })
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let units: Vec<u16> = self.text.encode_utf16().collect();
        let mut data = Vec::with_capacity(4 + units.len() * 2);
        data.write_u16::<LittleEndian>(units.len() as u16)?;
        data.write_u16::<LittleEndian>(Self::MARKER)?;
        for unit in units {
            data.write_u16::<LittleEndian>(unit)?;
        }
        Ok(data)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedResource {
    Exemplar(Exemplar),
    Cohort(Cohort),
    Directory(DirectoryResource),
    Text(TextResource),
    LText(LTextResource),
    Opaque(GenericResource),
    Raw(GenericResource),
}

impl TypedResource {
    /// Decodes an uncompressed payload with the decoder registered for `format`.
    pub fn from_bytes(format: ResourceFormat, data: &[u8], names: Option<&PropertyNameTable>) -> Result<Self> {
        match format {
            ResourceFormat::Exemplar => Ok(TypedResource::Exemplar(Exemplar::decode_with_names(data, names)?)),
            ResourceFormat::Cohort => Ok(TypedResource::Cohort(Cohort::decode_with_names(data, names)?)),
            ResourceFormat::Directory => Ok(TypedResource::Directory(DirectoryResource::from_bytes(data)?)),
            ResourceFormat::Lua | ResourceFormat::Rul => Ok(TypedResource::Text(TextResource::from_bytes(data)?)),
            ResourceFormat::LText => Ok(TypedResource::LText(LTextResource::from_bytes(data)?)),
            ResourceFormat::Png | ResourceFormat::Fsh | ResourceFormat::S3d | ResourceFormat::Wav => Ok(
                TypedResource::Opaque(GenericResource::from_bytes_with_format(format, data)),
            ),
            ResourceFormat::Raw => Ok(TypedResource::Raw(GenericResource::from_bytes_with_format(format, data))),
        }
    }

    /// Uncompressed payload; `Raw` returns its stored bytes unchanged.
    pub fn to_bytes(&self, names: Option<&PropertyNameTable>) -> Result<Vec<u8>> {
        match self {
            TypedResource::Exemplar(r) => r.to_bytes_with_names(names),
            TypedResource::Cohort(r) => r.to_bytes_with_names(names),
            TypedResource::Directory(r) => r.to_bytes(),
            TypedResource::Text(r) => r.to_bytes(),
            TypedResource::LText(r) => r.to_bytes(),
            TypedResource::Opaque(r) | TypedResource::Raw(r) => r.to_bytes(),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, TypedResource::Raw(_))
    }
}

/// A resource as held in, or bound for, an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageResource {
    pub tgi: TGI,
    /// Whether the payload is stored QFS compressed.
    pub compressed: bool,
    pub resource: TypedResource,
}

impl PackageResource {
    pub fn new(tgi: TGI, resource: TypedResource) -> Self {
        let compressed = match &resource {
            TypedResource::Raw(r) => qfs::is_compressed(&r.data),
            _ => false,
        };
        Self { tgi, compressed, resource }
    }

    pub fn with_compression(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Registry format of the TGI; may differ from the resource's own format
    /// when an entry fell back to RAW.
    pub fn format(&self) -> ResourceFormat {
        TGIKeys::format_of(&self.tgi)
    }

    pub fn label(&self) -> &'static str {
        TGIKeys::label_of(&self.tgi)
    }

    /// Length of the uncompressed payload. Exemplars and cohorts report their
    /// binary-form length.
    pub fn decompressed_size(&self) -> usize {
        match &self.resource {
            TypedResource::Exemplar(r) => r.decompressed_size(),
            TypedResource::Cohort(r) => r.decompressed_size(),
            TypedResource::Directory(r) => r.entries.len() * DirectoryResource::RECORD_SIZE,
            TypedResource::Text(r) => r.content.len(),
            TypedResource::LText(r) => 4 + r.text.encode_utf16().count() * 2,
            TypedResource::Opaque(r) => r.data.len(),
            TypedResource::Raw(r) => qfs::declared_size(&r.data).unwrap_or(r.data.len()),
        }
    }

    /// Reclassifies an exemplar as a cohort, keeping TGI, compression and contents.
    pub fn into_cohort(self) -> Self {
        match self.resource {
            TypedResource::Exemplar(e) => Self { resource: TypedResource::Cohort(e.into()), ..self },
            _ => self,
        }
    }

    pub fn into_exemplar(self) -> Self {
        match self.resource {
            TypedResource::Cohort(c) => Self { resource: TypedResource::Exemplar(c.into()), ..self },
            _ => self,
        }
    }
}
