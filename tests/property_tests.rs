use sc4dbpf::package::property::signed_from_bits;
use sc4dbpf::{Error, Property, PropertyNameTable, PropertyType, PropertyValues};

fn names() -> PropertyNameTable {
    [
        (0x10u32, "Exemplar Type", Some(PropertyType::Uint32)),
        (0x20, "Exemplar Name", Some(PropertyType::String)),
        (0x30, "Custom Width", Some(PropertyType::Uint16)),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_text_line_scalar() {
    let line = "0x00000010:{\"Exemplar Type\"}=Uint32:0:{0x00000002}";
    let prop = Property::decode_text(line, None).unwrap();

    assert_eq!(prop.id(), 0x10);
    assert_eq!(prop.element_type(), PropertyType::Uint32);
    assert_eq!(prop.count(), 1);
    assert!(!prop.has_count());
    assert_eq!(prop.values(), &PropertyValues::Uint32(vec![2]));
}

#[test]
fn test_text_encode_uses_names() {
    let names = names();
    let prop = Property::new(0x10, PropertyValues::Uint32(vec![2]));
    assert_eq!(
        prop.encode_text(Some(&names)),
        "0x00000010:{\"Exemplar Type\"}=Uint32:0:{0x00000002}\r\n"
    );
    assert_eq!(
        prop.encode_text(None),
        "0x00000010:{\"UNKNOWN\"}=Uint32:0:{0x00000002}\r\n"
    );

    let list = Property::new(0x11, PropertyValues::Uint8(vec![1, 0xFF]));
    assert_eq!(list.encode_text(None), "0x00000011:{\"UNKNOWN\"}=Uint8:2:{0x01,0xFF}\r\n");

    let name = Property::new(0x20, PropertyValues::String("Park".to_string()));
    assert_eq!(name.encode_text(Some(&names)), "0x00000020:{\"Exemplar Name\"}=String:0:{\"Park\"}\r\n");
}

#[test]
fn test_text_roundtrip_all_types() {
    let props = vec![
        Property::new(1, PropertyValues::Uint8(vec![7])),
        Property::new(2, PropertyValues::Uint16(vec![1, 2, 65535])),
        Property::new(3, PropertyValues::Uint32(vec![0xDEADBEEF])).with_has_count(true),
        Property::new(4, PropertyValues::Sint32(vec![-1, 5, -268_435_456])),
        Property::new(5, PropertyValues::Sint64(vec![-2, 1 << 40])),
        Property::new(6, PropertyValues::Float32(vec![1.5, -0.25])),
        Property::new(7, PropertyValues::Bool(vec![true, false])),
        Property::new(8, PropertyValues::String("Residential, low".to_string())),
        Property::new(9, PropertyValues::Uint32(vec![])),
    ];
    for prop in props {
        let line = prop.encode_text(None);
        assert!(line.ends_with("\r\n"));
        assert_eq!(Property::decode_text(&line, None).unwrap(), prop, "{}", line);
    }
}

#[test]
fn test_text_decimal_and_float_forms() {
    let prop = Property::decode_text("0x00000001:{\"x\"}=Float32:1:{1.5}", None).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Float32(vec![1.5]));
    assert!(prop.has_count());

    let prop = Property::decode_text("0x00000001:{\"x\"}=Float32:0:{0x3FC00000}", None).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Float32(vec![1.5]));

    let prop = Property::decode_text("0x00000001:{\"x\"}=Sint32:2:{-7,12}", None).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Sint32(vec![-7, 12]));

    let prop = Property::decode_text("0x00000001:{\"x\"}=uint16:0:{300}", None).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Uint16(vec![300]));
}

#[test]
fn test_text_bool_quirk() {
    let prop = Property::decode_text("0x00000001:{\"x\"}=Bool:4:{0x01,TRUE,1,False}", None).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Bool(vec![true, true, false, false]));
}

#[test]
fn test_text_unknown_type_uses_name_table() {
    let names = names();
    let line = "0x00000030:{\"Custom Width\"}=Custom:0:{0x0010}";
    let prop = Property::decode_text(line, Some(&names)).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Uint16(vec![16]));

    match Property::decode_text(line, None) {
        Err(Error::MalformedTextProperty(_)) => {}
        other => panic!("Expected MalformedTextProperty, got {:?}", other),
    }
}

#[test]
fn test_text_malformed_lines() {
    let lines = [
        "garbage",
        "0x00000010{\"x\"}=Uint32:0:{0x2}",
        "16:{\"x\"}=Uint32:0:{0x2}",
        "0x00000010:{\"x\"}=Uint32:zero:{0x2}",
        "0x00000010:{\"x\"}=Uint32:0:0x2",
        "0x00000010:{\"x\"}=Uint8:0:{0x100}",
        "0x00000010:{\"x\"}=String:0:{unquoted}",
    ];
    for line in lines {
        match Property::decode_text(line, None) {
            Err(Error::MalformedTextProperty(_)) => {}
            other => panic!("Expected MalformedTextProperty for {:?}, got {:?}", line, other),
        }
    }
}

#[test]
fn test_binary_layout_scalar() {
    let prop = Property::new(0x10, PropertyValues::Uint32(vec![2]));
    let data = prop.encode_binary().unwrap();

    let mut expected = Vec::new();
    expected.extend_from_slice(&0x10u32.to_le_bytes());
    expected.extend_from_slice(&0x0300u16.to_le_bytes());
    expected.push(0x00);
    expected.extend_from_slice(&[0, 0]);
    expected.extend_from_slice(&2u32.to_le_bytes());

    assert_eq!(data, expected);
    assert_eq!(prop.binary_len(), 13);
}

#[test]
fn test_binary_layout_string() {
    let prop = Property::new(0x20, PropertyValues::String("Café".to_string()));
    let data = prop.encode_binary().unwrap();

    assert_eq!(&data[4..6], &0x0C00u16.to_le_bytes());
    assert_eq!(data[6], 0x80);
    assert_eq!(&data[9..13], &4u32.to_le_bytes());
    assert_eq!(&data[13..], &[b'C', b'a', b'f', 0xE9]);
    assert_eq!(prop.binary_len(), data.len());

    let unmappable = Property::new(0x20, PropertyValues::String("Ωx".to_string()));
    assert_eq!(&unmappable.encode_binary().unwrap()[13..], b"?x");
}

#[test]
fn test_binary_roundtrip_all_types() {
    let props = vec![
        Property::new(1, PropertyValues::Uint8(vec![0, 200])),
        Property::new(2, PropertyValues::Uint16(vec![0xBEEF])),
        Property::new(3, PropertyValues::Uint32(vec![1, 2, 3])),
        Property::new(4, PropertyValues::Sint32(vec![-1, 0x7FFF_FFFF])),
        Property::new(5, PropertyValues::Sint64(vec![-5])),
        Property::new(6, PropertyValues::Float32(vec![3.25])),
        Property::new(7, PropertyValues::Bool(vec![true])),
        Property::new(8, PropertyValues::String("Café".to_string())),
        Property::new(9, PropertyValues::Uint32(vec![9])).with_has_count(true),
    ];

    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for prop in &props {
        offsets.push(data.len());
        data.extend(prop.encode_binary().unwrap());
    }
    for (prop, offset) in props.iter().zip(offsets) {
        assert_eq!(&Property::decode_binary(&data, offset).unwrap(), prop);
    }
}

#[test]
fn test_has_count_is_normalised() {
    let scalar = Property::new(1, PropertyValues::Uint32(vec![1]));
    assert!(!scalar.has_count());
    assert!(scalar.clone().with_has_count(true).has_count());

    let list = Property::new(1, PropertyValues::Uint32(vec![1, 2])).with_has_count(false);
    assert!(list.has_count());

    let text = Property::new(1, PropertyValues::String("a".to_string())).with_has_count(false);
    assert!(text.has_count());
}

#[test]
fn test_signed_decode_rule() {
    assert_eq!(signed_from_bits(0xFFFF_FFFF, 4), -1);
    assert_eq!(signed_from_bits(0xF000_0000, 4), -268_435_456);
    assert_eq!(signed_from_bits(0xEFFF_FFFF, 4), 0xEFFF_FFFF);
    assert_eq!(signed_from_bits(0x8000_0000, 4), 0x8000_0000);
    assert_eq!(signed_from_bits(0xFFFF_FFFF_FFFF_FFFE, 8), -2);
    assert_eq!(signed_from_bits(0x8000_0000_0000_0000, 8), i64::MIN);
    assert!(signed_from_bits(0xEFFF_FFFF_FFFF_FFFF, 8) < 0);
    assert_eq!(signed_from_bits(0x7FFF_FFFF_FFFF_FFFF, 8), i64::MAX);

    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&0x0700u16.to_le_bytes());
    data.extend_from_slice(&[0x80, 0, 0]);
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&0x8000_0000u32.to_le_bytes());
    data.extend_from_slice(&0xFFFF_FFF6u32.to_le_bytes());

    let prop = Property::decode_binary(&data, 0).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Sint32(vec![0x8000_0000, -10]));
    assert_eq!(prop.encode_binary().unwrap(), data);
}

#[test]
fn test_binary_bool_only_one_is_true() {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&0x0B00u16.to_le_bytes());
    data.extend_from_slice(&[0x80, 0, 0]);
    data.extend_from_slice(&3u32.to_le_bytes());
    data.extend_from_slice(&[1, 2, 0]);

    let prop = Property::decode_binary(&data, 0).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Bool(vec![true, false, false]));
}

#[test]
fn test_binary_non_canonical_bytes_are_normalised() {
    let data = [0x01, 0x00, 0x00, 0x00, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x02];
    let prop = Property::decode_binary(&data, 0).unwrap();
    assert_eq!(prop.values(), &PropertyValues::Bool(vec![false]));
    let written = prop.encode_binary().unwrap();
    assert_eq!(&written[..9], &data[..9]);
    assert_eq!(written[9], 0x00);

    let mut data = Vec::new();
    data.extend_from_slice(&0x10u32.to_le_bytes());
    data.extend_from_slice(&0x0300u16.to_le_bytes());
    data.push(0x01);
    data.extend_from_slice(&0x1234u16.to_le_bytes());
    data.extend_from_slice(&7u32.to_le_bytes());

    let prop = Property::decode_binary(&data, 0).unwrap();
    assert!(!prop.has_count());
    assert_eq!(prop.values(), &PropertyValues::Uint32(vec![7]));
    let written = prop.encode_binary().unwrap();
    assert_eq!(written.len(), data.len());
    assert_eq!(&written[6..9], &[0x00, 0x00, 0x00]);
    assert_eq!(&written[9..], &7u32.to_le_bytes());
}

#[test]
fn test_binary_unknown_type() {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&0x0400u16.to_le_bytes());
    data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0]);

    match Property::decode_binary(&data, 0) {
        Err(Error::UnknownPropertyType(0x0400)) => {}
        other => panic!("Expected UnknownPropertyType, got {:?}", other),
    }
}

#[test]
fn test_binary_truncated_values() {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&0x0300u16.to_le_bytes());
    data.extend_from_slice(&[0x80, 0, 0]);
    data.extend_from_slice(&1_000_000u32.to_le_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]);

    match Property::decode_binary(&data, 0) {
        Err(Error::Truncated(_)) => {}
        other => panic!("Expected Truncated, got {:?}", other),
    }
    assert!(matches!(Property::decode_binary(&data[..5], 0), Err(Error::Truncated(_))));
}

#[test]
fn test_type_ids() {
    for ty in PropertyType::ALL {
        assert_eq!(PropertyType::from_id(ty.id()).unwrap(), ty);
        assert_eq!(PropertyType::from_text_name(ty.text_name()), Some(ty));
    }
    assert_eq!(PropertyType::Sint64.id(), 0x0800);
    assert_eq!(PropertyType::Float32.byte_len(), 4);
    assert_eq!(PropertyType::String.byte_len(), 1);
}
