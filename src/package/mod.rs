pub mod directory;
pub mod exemplar;
pub mod format;
pub mod header;
pub mod index;
pub mod names;
pub mod property;
pub mod qfs;
pub mod resource;

use crate::error::{Error, Result};
use binrw::{BinRead, BinWrite};
use directory::{apply_directory, DirectoryEntry, DirectoryResource};
use format::{ResourceFormat, TGIKeys};
use header::PackageHeader;
use index::{IndexEntry, TGI};
use log::{debug, info, warn};
use memmap2::Mmap;
use names::PropertyNameTable;
use qfs::PackagerInfo;
use resource::{GenericResource, PackageResource, TypedResource};
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// An opened DBPF archive. Entry payloads are served from a read-only memory map.
pub struct Package {
    pub header: PackageHeader,
    pub entries: Vec<IndexEntry>,
    mmap: Mmap,
}

impl Package {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // The map is read-only; writers must not rewrite this file while it is open.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_mmap(mmap)
    }

    fn from_mmap(mmap: Mmap) -> Result<Self> {
        let file_len = mmap.len() as u64;
        if file_len < 4 {
            return Err(Error::Truncated(format!("file is only {} bytes", file_len)));
        }
        if mmap[0..4] != PackageHeader::MAGIC {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&mmap[0..4]);
            return Err(Error::NotAnArchive(magic));
        }

        let mut cursor = Cursor::new(&mmap[..]);
        let header = PackageHeader::read(&mut cursor)?;

        let index_start = header.index_position as u64;
        let index_len = header.index_count as u64 * IndexEntry::SIZE as u64;
        if index_start + index_len > file_len {
            return Err(Error::Truncated(format!(
                "index of {} entries at 0x{:08X} runs past end of file ({} bytes)",
                header.index_count, header.index_position, file_len
            )));
        }

        cursor.seek(SeekFrom::Start(index_start))?;
        let mut entries = Vec::with_capacity(header.index_count as usize);
        for _ in 0..header.index_count {
            entries.push(IndexEntry::read(&mut cursor)?);
        }

        Ok(Self { header, entries, mmap })
    }

    /// Stored bytes of `entry`, borrowed from the mapped file.
    pub fn entry_bytes(&self, entry: &IndexEntry) -> Result<&[u8]> {
        if entry.end() > self.mmap.len() as u64 {
            return Err(Error::Truncated(format!(
                "entry {} spans 0x{:08X}..0x{:08X} past end of file ({} bytes)",
                entry.tgi,
                entry.offset,
                entry.end(),
                self.mmap.len()
            )));
        }
        Ok(&self.mmap[entry.offset as usize..entry.end() as usize])
    }

    /// Decompressed payload of `entry`.
    pub fn read_entry_data(&self, entry: &IndexEntry) -> Result<(Vec<u8>, PackagerInfo)> {
        qfs::decompress_with_info(self.entry_bytes(entry)?)
    }

    pub fn read_resource(&self, entry: &IndexEntry) -> Result<PackageResource> {
        self.read_resource_with_names(entry, None)
    }

    /// Decodes `entry` with the decoder registered for its TGI. Payloads that
    /// fail to decode come back as RAW; only I/O failures are errors.
    pub fn read_resource_with_names(
        &self,
        entry: &IndexEntry,
        names: Option<&PropertyNameTable>,
    ) -> Result<PackageResource> {
        let stored = self.entry_bytes(entry)?;
        let format = TGIKeys::format_of(&entry.tgi);

        if format == ResourceFormat::Raw {
            return Ok(PackageResource::new(entry.tgi, raw(stored)));
        }

        let decoded = qfs::decompress_with_info(stored)
            .and_then(|(data, info)| TypedResource::from_bytes(format, &data, names).map(|r| (r, info)));
        match decoded {
            Ok((resource, info)) => Ok(PackageResource::new(entry.tgi, resource).with_compression(info.compressed)),
            Err(Error::Io(e)) => Err(Error::Io(e)),
            Err(e) => {
                warn!(
                    "Entry {} ({}) could not be decoded, keeping it as RAW: {}",
                    entry.tgi,
                    TGIKeys::label_of(&entry.tgi),
                    e
                );
                Ok(PackageResource::new(entry.tgi, raw(stored)))
            }
        }
    }

    /// Decodes every entry in index order.
    pub fn read_all(&self) -> Result<Vec<PackageResource>> {
        self.read_all_with_names(None)
    }

    pub fn read_all_with_names(&self, names: Option<&PropertyNameTable>) -> Result<Vec<PackageResource>> {
        self.entries
            .iter()
            .map(|entry| self.read_resource_with_names(entry, names))
            .collect()
    }

    /// Entries whose TGI matches `pattern`, honouring wildcard fields.
    pub fn find<'a>(&'a self, pattern: &'a TGI) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.entries.iter().filter(move |e| e.tgi.matches(pattern))
    }

    pub fn directory(&self) -> Result<Option<DirectoryResource>> {
        match self.find(&DirectoryResource::TGI).next() {
            Some(entry) => match self.read_resource(entry)?.resource {
                TypedResource::Directory(dir) => Ok(Some(dir)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Writes `resources` as a new archive at `path`, replacing any existing file.
    ///
    /// Resources flagged `compressed` are QFS compressed unless that would not
    /// shrink them, in which case the flag is cleared. The directory resource
    /// is then rebuilt from the final flags before anything is written.
    pub fn write<P: AsRef<Path>>(
        path: P,
        resources: &mut Vec<PackageResource>,
        names: Option<&PropertyNameTable>,
    ) -> Result<()> {
        let mut payloads = Vec::with_capacity(resources.len() + 1);
        let mut records = Vec::new();

        for resource in resources.iter_mut() {
            if resource.tgi == DirectoryResource::TGI {
                continue;
            }
            let (data, decompressed_size) = encode_payload(resource, names)?;
            if resource.compressed {
                records.push(DirectoryEntry { tgi: resource.tgi, decompressed_size: decompressed_size as u32 });
            }
            payloads.push((resource.tgi, data));
        }

        apply_directory(resources, records);
        if let Some(dir) = resources.iter().find(|r| r.tgi == DirectoryResource::TGI) {
            payloads.push((dir.tgi, dir.resource.to_bytes(None)?));
        }

        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let mut header = PackageHeader {
            created: now,
            modified: now,
            index_count: payloads.len() as u32,
            index_size: payloads.len() as u32 * IndexEntry::SIZE,
            ..PackageHeader::default()
        };
        header.write(&mut writer)?;

        let mut entries = Vec::with_capacity(payloads.len());
        let mut offset = PackageHeader::SIZE as u32;
        for (tgi, data) in &payloads {
            writer.write_all(data)?;
            entries.push(IndexEntry { tgi: *tgi, offset, size: data.len() as u32 });
            offset += data.len() as u32;
        }

        header.index_position = offset;
        for entry in &entries {
            entry.write(&mut writer)?;
        }

        writer.seek(SeekFrom::Start(PackageHeader::INDEX_POSITION_OFFSET))?;
        writer.write_all(&header.index_position.to_le_bytes())?;
        writer.flush()?;

        info!(
            "Wrote {} entries ({} compressed) to {:?}",
            entries.len(),
            resources.iter().filter(|r| r.compressed).count(),
            path.as_ref()
        );
        Ok(())
    }
}

fn raw(stored: &[u8]) -> TypedResource {
    TypedResource::Raw(GenericResource::from_bytes_with_format(ResourceFormat::Raw, stored))
}

/// Bytes to store for `resource` plus its decompressed length. Clears the
/// `compressed` flag when compression does not pay off.
fn encode_payload(
    resource: &mut PackageResource,
    names: Option<&PropertyNameTable>,
) -> Result<(Vec<u8>, usize)> {
    if let TypedResource::Raw(raw) = &resource.resource {
        resource.compressed = qfs::is_compressed(&raw.data);
        return Ok((raw.data.clone(), resource.decompressed_size()));
    }

    let data = resource.resource.to_bytes(names)?;
    let decompressed_size = data.len();
    if !resource.compressed {
        return Ok((data, decompressed_size));
    }

    let (packed, info) = qfs::compress_with_info(&data);
    if info.compressed && packed.len() < data.len() {
        debug!("{}: compressed {} -> {} bytes", resource.tgi, data.len(), packed.len());
        Ok((packed, decompressed_size))
    } else {
        debug!("{}: compression does not shrink {} bytes, storing as is", resource.tgi, data.len());
        resource.compressed = false;
        Ok((data, decompressed_size))
    }
}
