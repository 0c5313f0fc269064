use crate::package::index::TGI;

const ANY: u32 = TGI::ANY;

/// Decoder selector for an entry, keyed by TGI through [`TGIKeys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFormat {
    Raw,
    Directory,
    Exemplar,
    Cohort,
    Png,
    Fsh,
    S3d,
    Lua,
    Rul,
    LText,
    Wav,
}

impl ResourceFormat {
    pub fn id(self) -> u32 {
        match self {
            ResourceFormat::Raw => 0,
            ResourceFormat::Directory => 1,
            ResourceFormat::Exemplar => 3,
            ResourceFormat::Cohort => 4,
            ResourceFormat::Png => 11,
            ResourceFormat::Fsh => 13,
            ResourceFormat::S3d => 14,
            ResourceFormat::Lua => 21,
            ResourceFormat::Rul => 22,
            ResourceFormat::LText => 23,
            ResourceFormat::Wav => 31,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            0 => ResourceFormat::Raw,
            1 => ResourceFormat::Directory,
            3 => ResourceFormat::Exemplar,
            4 => ResourceFormat::Cohort,
            11 => ResourceFormat::Png,
            13 => ResourceFormat::Fsh,
            14 => ResourceFormat::S3d,
            21 => ResourceFormat::Lua,
            22 => ResourceFormat::Rul,
            23 => ResourceFormat::LText,
            31 => ResourceFormat::Wav,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceFormat::Raw => "RAW",
            ResourceFormat::Directory => "DIRECTORY",
            ResourceFormat::Exemplar => "EXEMPLAR",
            ResourceFormat::Cohort => "COHORT",
            ResourceFormat::Png => "PNG",
            ResourceFormat::Fsh => "FSH",
            ResourceFormat::S3d => "S3D",
            ResourceFormat::Lua => "LUA",
            ResourceFormat::Rul => "RUL",
            ResourceFormat::LText => "LTEXT",
            ResourceFormat::Wav => "WAV",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TGIKeyEntry {
    pub key: TGI,
    pub format: ResourceFormat,
    pub label: &'static str,
}

const fn key(label: &'static str, t: u32, g: u32, i: u32, format: ResourceFormat) -> TGIKeyEntry {
    TGIKeyEntry { key: TGI::new(t, g, i), format, label }
}

static RAW_ENTRY: TGIKeyEntry = key("RAW", ANY, ANY, ANY, ResourceFormat::Raw);

// Ordered most specific first; lookup returns the first match.
static KNOWN_KEYS: &[TGIKeyEntry] = &[
    key("DIRECTORY", 0xE86B1EEF, 0xE86B1EEF, 0x286B1F03, ResourceFormat::Directory),
    key("LD", 0x6BE74C60, 0x6BE74C60, ANY, ResourceFormat::Raw),
    key("S3D_MAXIS", 0x5AD0E817, 0xBADB57F1, ANY, ResourceFormat::S3d),
    key("S3D", 0x5AD0E817, ANY, ANY, ResourceFormat::S3d),
    key("COHORT", 0x05342861, ANY, ANY, ResourceFormat::Cohort),
    key("EXEMPLAR_ROAD", 0x6534284A, 0x2821ED93, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_STREET", 0x6534284A, 0xA92A02EA, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_ONEWAYROAD", 0x6534284A, 0xCBE084CB, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_AVENUE", 0x6534284A, 0xCB730FAC, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_HIGHWAY", 0x6534284A, 0xA8434037, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_GROUNDHIGHWAY", 0x6534284A, 0xEBE084D1, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_DIRTROAD", 0x6534284A, 0x6BE08658, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_RAIL", 0x6534284A, 0xE8347989, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_LIGHTRAIL", 0x6534284A, 0x2B79DFFB, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_MONORAIL", 0x6534284A, 0xEBE084C2, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_POWERPOLE", 0x6534284A, 0x088E1962, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR_T21", 0x6534284A, 0x89AC5643, ANY, ResourceFormat::Exemplar),
    key("EXEMPLAR", 0x6534284A, ANY, ANY, ResourceFormat::Exemplar),
    key("FSH_MISC", 0x7AB50E44, 0x1ABE787D, ANY, ResourceFormat::Fsh),
    key("FSH_BASE_OVERLAY", 0x7AB50E44, 0x0986135E, ANY, ResourceFormat::Fsh),
    key("FSH_SHADOW", 0x7AB50E44, 0x2BC2759A, ANY, ResourceFormat::Fsh),
    key("FSH_ANIM_PROPS", 0x7AB50E44, 0x2A2458F9, ANY, ResourceFormat::Fsh),
    key("FSH_ANIM_NONPROPS", 0x7AB50E44, 0x49A593E7, ANY, ResourceFormat::Fsh),
    key("FSH_TERRAIN_FOUNDATION", 0x7AB50E44, 0x891B0E1A, ANY, ResourceFormat::Fsh),
    key("FSH_UI", 0x7AB50E44, 0x46A006B0, ANY, ResourceFormat::Fsh),
    key("FSH", 0x7AB50E44, ANY, ANY, ResourceFormat::Fsh),
    key("SC4PATH_2D", 0x296678F7, 0x69668828, ANY, ResourceFormat::Raw),
    key("SC4PATH_3D", 0x296678F7, 0xA966883F, ANY, ResourceFormat::Raw),
    key("SC4PATH", 0x296678F7, ANY, ANY, ResourceFormat::Raw),
    key("PNG_ICON", 0x856DDBAC, 0x6A386D26, ANY, ResourceFormat::Png),
    key("PNG", 0x856DDBAC, ANY, ANY, ResourceFormat::Png),
    key("LUA", 0xCA63E2A3, 0x4A5E8EF6, ANY, ResourceFormat::Lua),
    key("LUA_GEN", 0xCA63E2A3, 0x4A5E8F3F, ANY, ResourceFormat::Lua),
    key("WAV", 0x2026960B, 0xAA4D1933, ANY, ResourceFormat::Wav),
    key("LTEXT", 0x2026960B, ANY, ANY, ResourceFormat::LText),
    key("INI_FONT", 0x00000000, 0x4A87BFE8, 0x2A87BFFC, ResourceFormat::Raw),
    key("INI_NETWORK", 0x00000000, 0x8A5971C5, 0x8A5993B9, ResourceFormat::Raw),
    key("INI", 0x00000000, 0x8A5971C5, ANY, ResourceFormat::Raw),
    key("RUL", 0x0A5BCF4B, 0xAA5BCF57, ANY, ResourceFormat::Rul),
    key("EFFDIR", 0xEA5118B0, ANY, ANY, ResourceFormat::Raw),
];

/// Static registry of well-known (partial) TGI keys.
pub struct TGIKeys;

impl TGIKeys {
    pub fn all() -> &'static [TGIKeyEntry] {
        KNOWN_KEYS
    }

    pub fn lookup(tgi: &TGI) -> &'static TGIKeyEntry {
        KNOWN_KEYS
            .iter()
            .find(|entry| entry.key.matches(tgi))
            .unwrap_or(&RAW_ENTRY)
    }

    pub fn format_of(tgi: &TGI) -> ResourceFormat {
        Self::lookup(tgi).format
    }

    pub fn label_of(tgi: &TGI) -> &'static str {
        Self::lookup(tgi).label
    }
}
