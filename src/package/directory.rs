use crate::error::Result;
use crate::package::index::TGI;
use crate::package::resource::{PackageResource, Resource, TypedResource};
use binrw::helpers::until_eof;
use binrw::{binrw, BinRead, BinWrite};
use std::io::Cursor;

/// One 16-byte record: a compressed entry and its decompressed size.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[br(little)]
#[bw(little)]
pub struct DirectoryEntry {
    pub tgi: TGI,
    pub decompressed_size: u32,
}

/// Directory resource (0xE86B1EEF, 0xE86B1EEF, 0x286B1F03)
#[binrw]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[br(little)]
#[bw(little)]
pub struct DirectoryResource {
    #[br(parse_with = until_eof)]
    pub entries: Vec<DirectoryEntry>,
}

impl DirectoryResource {
    pub const TGI: TGI = TGI::new(0xE86B1EEF, 0xE86B1EEF, 0x286B1F03);
    pub const RECORD_SIZE: usize = 16;

    pub fn decompressed_size_of(&self, tgi: &TGI) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.tgi == *tgi)
            .map(|e| e.decompressed_size)
    }
}

impl Resource for DirectoryResource {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        Ok(Self::read(&mut cursor)?)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.entries.len() * Self::RECORD_SIZE);
        let mut cursor = Cursor::new(&mut data);
        self.write(&mut cursor)?;
        Ok(data)
    }
}

fn is_directory(resource: &PackageResource) -> bool {
    resource.tgi == DirectoryResource::TGI
}

/// Rebuilds the directory from the `compressed` flags of `resources`: removes
/// it when nothing is compressed, otherwise replaces or creates it.
pub fn update_directory(resources: &mut Vec<PackageResource>) {
    let records = resources
        .iter()
        .filter(|r| r.compressed && !is_directory(r))
        .map(|r| DirectoryEntry { tgi: r.tgi, decompressed_size: r.decompressed_size() as u32 })
        .collect();
    apply_directory(resources, records);
}

pub(crate) fn apply_directory(resources: &mut Vec<PackageResource>, records: Vec<DirectoryEntry>) {
    let existing = resources.iter().position(is_directory);

    if records.is_empty() {
        resources.retain(|r| !is_directory(r));
        return;
    }

    let directory = PackageResource::new(
        DirectoryResource::TGI,
        TypedResource::Directory(DirectoryResource { entries: records }),
    );
    match existing {
        Some(pos) => {
            resources[pos] = directory;
            // Drop any duplicates after the first.
            let mut seen = false;
            resources.retain(|r| {
                if !is_directory(r) {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None => resources.push(directory),
    }
}
