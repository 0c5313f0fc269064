use sc4dbpf::{ResourceFormat, TGIKeys, TGI};
use std::collections::HashSet;

#[test]
fn test_wildcard_matching() {
    let key = TGI::new(0x6534284A, 0x2821ED93, 0x00001234);

    assert!(key.matches(&TGI::NULL));
    assert!(key.matches(&TGI::new(0x6534284A, TGI::ANY, TGI::ANY)));
    assert!(key.matches(&TGI::new(TGI::ANY, 0x2821ED93, 0x00001234)));
    assert!(!key.matches(&TGI::new(0x6534284A, 0x00000000, TGI::ANY)));
    assert!(!key.matches(&TGI::BLANK));

    // A wildcard field behaves as if it held the other key's value.
    for pattern in [
        TGI::new(TGI::ANY, 1, 2),
        TGI::new(0x6534284A, TGI::ANY, 7),
        TGI::new(3, 4, TGI::ANY),
    ] {
        let filled = TGI::new(
            if pattern.res_type == TGI::ANY { key.res_type } else { pattern.res_type },
            if pattern.res_group == TGI::ANY { key.res_group } else { pattern.res_group },
            if pattern.instance == TGI::ANY { key.instance } else { pattern.instance },
        );
        assert_eq!(key.matches(&pattern), key.matches(&filled));
    }
}

#[test]
fn test_equality_is_exact() {
    let key = TGI::new(1, 2, 3);
    assert_ne!(key, TGI::new(1, 2, TGI::ANY));
    assert!(key.matches(&TGI::new(1, 2, TGI::ANY)));

    let set: HashSet<TGI> = [key, TGI::new(1, 2, 3), key.with_instance(4)].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_with_overrides() {
    let key = TGI::new(1, 2, 3);
    assert_eq!(key.with_type(9), TGI::new(9, 2, 3));
    assert_eq!(key.with_group(9), TGI::new(1, 9, 3));
    assert_eq!(key.with_instance(9), TGI::new(1, 2, 9));
}

#[test]
fn test_display_and_key_string() {
    let key = TGI::new(0x05342861, 0, 0xABCDEF01);
    assert_eq!(key.to_string(), "0x05342861, 0x00000000, 0xABCDEF01");
    assert_eq!(key.to_key_string(), "Key:{0x05342861,0x00000000,0xABCDEF01}");
    assert_eq!(TGI::parse_key_string(&key.to_key_string()), Some(key));
    assert_eq!(TGI::parse_key_string("Key:{0x1,0x2}"), None);
    assert_eq!(TGI::parse_key_string("{0x1,0x2,0x3}"), None);
}

#[test]
fn test_registry_most_specific_first() {
    let road = TGI::new(0x6534284A, 0x2821ED93, 0x10);
    assert_eq!(TGIKeys::label_of(&road), "EXEMPLAR_ROAD");
    assert_eq!(TGIKeys::format_of(&road), ResourceFormat::Exemplar);

    let plain = TGI::new(0x6534284A, 0x12345678, 0x10);
    assert_eq!(TGIKeys::label_of(&plain), "EXEMPLAR");

    let maxis = TGI::new(0x5AD0E817, 0xBADB57F1, 0x1);
    assert_eq!(TGIKeys::label_of(&maxis), "S3D_MAXIS");
    assert_eq!(TGIKeys::format_of(&maxis), ResourceFormat::S3d);

    let wav = TGI::new(0x2026960B, 0xAA4D1933, 0x1);
    assert_eq!(TGIKeys::format_of(&wav), ResourceFormat::Wav);
    let ltext = TGI::new(0x2026960B, 0x6A231EAA, 0x1);
    assert_eq!(TGIKeys::format_of(&ltext), ResourceFormat::LText);
}

#[test]
fn test_registry_known_keys() {
    let cases = [
        (TGI::new(0xE86B1EEF, 0xE86B1EEF, 0x286B1F03), "DIRECTORY", ResourceFormat::Directory),
        (TGI::new(0x05342861, 0x1, 0x2), "COHORT", ResourceFormat::Cohort),
        (TGI::new(0x7AB50E44, 0x1ABE787D, 0x2), "FSH_MISC", ResourceFormat::Fsh),
        (TGI::new(0x856DDBAC, 0x6A386D26, 0x2), "PNG_ICON", ResourceFormat::Png),
        (TGI::new(0xCA63E2A3, 0x4A5E8F3F, 0x2), "LUA_GEN", ResourceFormat::Lua),
        (TGI::new(0x0A5BCF4B, 0xAA5BCF57, 0x2), "RUL", ResourceFormat::Rul),
        (TGI::new(0x6BE74C60, 0x6BE74C60, 0x2), "LD", ResourceFormat::Raw),
        (TGI::new(0x00000000, 0x8A5971C5, 0x8A5993B9), "INI_NETWORK", ResourceFormat::Raw),
    ];
    for (tgi, label, format) in cases {
        let entry = TGIKeys::lookup(&tgi);
        assert_eq!(entry.label, label, "{}", tgi);
        assert_eq!(entry.format, format, "{}", tgi);
        assert_eq!(format.id(), ResourceFormat::from_id(format.id()).map(|f| f.id()).unwrap());
    }
}

#[test]
fn test_registry_defaults_to_raw() {
    let unknown = TGI::new(0x12345678, 0x9ABCDEF0, 0x1);
    assert_eq!(TGIKeys::label_of(&unknown), "RAW");
    assert_eq!(TGIKeys::format_of(&unknown), ResourceFormat::Raw);
    assert_eq!(ResourceFormat::Raw.id(), 0);
    assert_eq!(ResourceFormat::Wav.id(), 31);
    assert!(TGIKeys::all().iter().all(|e| e.label != "RAW"));
}
