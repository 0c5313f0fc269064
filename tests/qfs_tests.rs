use sc4dbpf::{qfs, Error};

fn lcg_bytes(seed: u32, len: usize) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

fn qfs_header(body_len: usize, decompressed: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&((9 + body_len) as u32).to_le_bytes());
    data.extend_from_slice(&0xFB10u16.to_le_bytes());
    data.extend_from_slice(&decompressed.to_be_bytes()[1..]);
    data
}

#[test]
fn test_sixteen_zeros() {
    let input = [0u8; 16];
    let packed = qfs::compress(&input);

    assert!(qfs::is_compressed(&packed));
    assert!(packed.len() < input.len());
    assert_eq!(&packed[0..4], &(packed.len() as u32).to_le_bytes());
    assert_eq!(&packed[6..9], &[0, 0, 16]);

    assert_eq!(qfs::decompress(&packed).unwrap(), input.to_vec());
}

#[test]
fn test_handcrafted_stream() {
    // Three literals, then copy six bytes from three back, then stop.
    let body = [0x0F, 0x02, b'a', b'b', b'c', 0xFC];
    let mut data = qfs_header(body.len(), 9);
    data.extend_from_slice(&body);

    let (out, info) = qfs::decompress_with_info(&data).unwrap();
    assert_eq!(out, b"abcabcabc");
    assert!(info.compressed);
    assert_eq!(info.compressed_size, 15);
    assert_eq!(info.decompressed_size, 9);
}

#[test]
fn test_stop_opcode_trailing_literals() {
    // A literal block of four bytes, then a stop opcode carrying two more.
    let body = [0xE0, b'D', b'B', b'P', b'F', 0xFE, b'!', b'?'];
    let mut data = qfs_header(body.len(), 6);
    data.extend_from_slice(&body);

    assert_eq!(qfs::decompress(&data).unwrap(), b"DBPF!?");
}

#[test]
fn test_foreign_data_is_identity() {
    let data = b"EQZB1###not compressed at all";
    let (out, info) = qfs::decompress_with_info(data).unwrap();
    assert_eq!(out, data.to_vec());
    assert!(!info.compressed);
    assert_eq!(qfs::declared_size(data), None);
}

#[test]
fn test_roundtrip_text() {
    let text = "ParentCohort=Key:{0x05342861,0x00000000,0x00000000}\r\n".repeat(40);
    let packed = qfs::compress(text.as_bytes());
    assert!(packed.len() < text.len());
    assert_eq!(qfs::declared_size(&packed), Some(text.len()));
    assert_eq!(qfs::decompress(&packed).unwrap(), text.as_bytes());
}

#[test]
fn test_roundtrip_long_distance_matches() {
    // Repeats sit far enough apart to need the four-byte opcode.
    let block = lcg_bytes(7, 0x6000);
    let mut input = block.clone();
    input.extend_from_slice(&lcg_bytes(99, 0x9000));
    input.extend_from_slice(&block);
    input.extend(std::iter::repeat(0xAB).take(3000));

    let packed = qfs::compress(&input);
    assert!(qfs::is_compressed(&packed));
    assert!(packed.len() < input.len());
    assert_eq!(qfs::decompress(&packed).unwrap(), input);
}

#[test]
fn test_roundtrip_various_lengths() {
    for len in [0usize, 1, 3, 4, 5, 27, 112, 113, 1027, 4096] {
        let mut input = lcg_bytes(len as u32, len);
        input.extend(input.clone());
        let packed = qfs::compress(&input);
        assert_eq!(qfs::decompress(&packed).unwrap(), input, "length {}", len * 2);
    }
}

#[test]
fn test_incompressible_input_is_returned_unchanged() {
    let input = lcg_bytes(1234, 64);
    let (out, info) = qfs::compress_with_info(&input);
    assert_eq!(out, input);
    assert!(!info.compressed);
    assert_eq!(info.compressed_size, 64);
}

#[test]
fn test_already_compressed_input_is_returned_unchanged() {
    let packed = qfs::compress(&[0u8; 256]);
    assert!(qfs::is_compressed(&packed));
    assert_eq!(qfs::compress(&packed), packed);
}

#[test]
fn test_reference_before_start_is_rejected() {
    // Copy three bytes from six back into an empty output.
    let body = [0x00, 0x05, 0xFC];
    let mut data = qfs_header(body.len(), 3);
    data.extend_from_slice(&body);

    match qfs::decompress(&data) {
        Err(Error::Decompression(_)) => {}
        other => panic!("Expected Decompression error, got {:?}", other),
    }
}
