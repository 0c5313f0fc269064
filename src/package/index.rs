use binrw::binrw;
use std::fmt;

/// Type/Group/Instance key. A field holding `TGI::ANY` is a wildcard when
/// compared with [`TGI::matches`].
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[br(little)]
#[bw(little)]
pub struct TGI {
    pub res_type: u32,
    pub res_group: u32,
    pub instance: u32,
}

impl TGI {
    pub const ANY: u32 = 0xFFFF_FFFF;
    pub const BLANK: TGI = TGI::new(0, 0, 0);
    pub const NULL: TGI = TGI::new(Self::ANY, Self::ANY, Self::ANY);

    pub const fn new(res_type: u32, res_group: u32, instance: u32) -> Self {
        Self { res_type, res_group, instance }
    }

    pub fn with_type(self, res_type: u32) -> Self {
        Self { res_type, ..self }
    }

    pub fn with_group(self, res_group: u32) -> Self {
        Self { res_group, ..self }
    }

    pub fn with_instance(self, instance: u32) -> Self {
        Self { instance, ..self }
    }

    /// Wildcard equality: each field must be equal unless either side holds `ANY`.
    pub fn matches(&self, other: &TGI) -> bool {
        fn field(a: u32, b: u32) -> bool {
            a == b || a == TGI::ANY || b == TGI::ANY
        }
        field(self.res_type, other.res_type)
            && field(self.res_group, other.res_group)
            && field(self.instance, other.instance)
    }

    /// `Key:{0xT,0xG,0xI}` as used by text exemplars.
    pub fn to_key_string(&self) -> String {
        format!(
            "Key:{{0x{:08X},0x{:08X},0x{:08X}}}",
            self.res_type, self.res_group, self.instance
        )
    }

    pub fn parse_key_string(s: &str) -> Option<Self> {
        let inner = s.trim().strip_prefix("Key:{")?.strip_suffix('}')?;
        let mut parts = inner.split(',').map(|p| {
            let p = p.trim();
            let hex = p.strip_prefix("0x").or_else(|| p.strip_prefix("0X"))?;
            u32::from_str_radix(hex, 16).ok()
        });
        let tgi = TGI::new(parts.next()??, parts.next()??, parts.next()??);
        if parts.next().is_some() {
            return None;
        }
        Some(tgi)
    }
}

impl fmt::Display for TGI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08X}, 0x{:08X}, 0x{:08X}",
            self.res_type, self.res_group, self.instance
        )
    }
}

/// One 20-byte index record.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[br(little)]
#[bw(little)]
pub struct IndexEntry {
    pub tgi: TGI,
    pub offset: u32,
    pub size: u32,
}

impl IndexEntry {
    pub const SIZE: u32 = 20;

    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }
}
