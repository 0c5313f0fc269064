use binrw::binrw;

#[binrw]
#[derive(Debug, Clone)]
#[br(little)]
#[bw(little)]
pub struct PackageHeader {
    pub magic: [u8; 4],      // "DBPF"
    pub major: u32,          // Always 1 for SC4
    pub minor: u32,
    pub reserved1: [u32; 3],
    pub created: u32,        // Unix seconds
    pub modified: u32,
    pub index_type: u32,     // Usually 7
    pub index_count: u32,
    pub index_position: u32,
    pub index_size: u32,
    pub reserved2: [u32; 12],
}

impl Default for PackageHeader {
    fn default() -> Self {
        Self {
            magic: Self::MAGIC,
            major: 1,
            minor: 0,
            reserved1: [0; 3],
            created: 0,
            modified: 0,
            index_type: 7,
            index_count: 0,
            index_position: 0,
            index_size: 0,
            reserved2: [0; 12],
        }
    }
}

impl PackageHeader {
    pub const SIZE: u64 = 0x60;
    pub const MAGIC: [u8; 4] = *b"DBPF";
    /// Byte offset of `index_position`, patched after the payloads are written.
    pub const INDEX_POSITION_OFFSET: u64 = 0x28;

    pub fn is_valid(&self) -> bool {
        self.magic == Self::MAGIC
    }

    pub fn read<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self, binrw::Error> {
        use binrw::BinReaderExt;
        reader.read_le()
    }

    pub fn write<W: std::io::Write + std::io::Seek>(&self, writer: &mut W) -> Result<(), binrw::Error> {
        use binrw::BinWriterExt;
        writer.write_le(self)
    }
}
