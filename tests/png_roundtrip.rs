use pngbin::png::{PngReader, PngWriter, Source};

#[test]
fn round_trips_arbitrary_payload() {
    let width = 32;
    let height = 32;
    let capacity = pngbin::png::layout::capacity(width, height) as usize;

    let payload: Vec<u8> = (0..capacity).map(|i| (i * 7 % 251) as u8).collect();

    let mut writer = PngWriter::new(Vec::new(), width, height).unwrap();
    writer.write_payload(&payload).unwrap();
    let bytes = writer.finish().unwrap();

    assert_eq!(
        bytes.len() as u64,
        pngbin::png::layout::total_file_len(width, height)
    );

    let mut reader = PngReader::open(Source::Memory(bytes)).unwrap();
    assert_eq!(reader.width(), width);
    assert_eq!(reader.height(), height);

    let mut got = vec![0u8; capacity];
    reader.read_at(0, &mut got).unwrap();
    assert_eq!(got, payload);
}

#[test]
fn seek_equivalence_matches_sequential_read() {
    let width = 16;
    let height = 16;
    let capacity = pngbin::png::layout::capacity(width, height) as usize;

    let payload: Vec<u8> = (0..capacity).map(|i| (i * 13 % 256) as u8).collect();

    let mut writer = PngWriter::new(Vec::new(), width, height).unwrap();
    writer.write_payload(&payload).unwrap();
    let bytes = writer.finish().unwrap();

    let mut full_reader = PngReader::open(Source::Memory(bytes.clone())).unwrap();
    let mut sequential = vec![0u8; capacity];
    full_reader.read_at(0, &mut sequential).unwrap();

    let mut scattered_reader = PngReader::open(Source::Memory(bytes)).unwrap();
    for &(offset, len) in &[(0usize, 10usize), (100, 37), (capacity - 50, 50), (500, 1)] {
        let mut chunk = vec![0u8; len];
        scattered_reader.read_at(offset as u64, &mut chunk).unwrap();
        assert_eq!(chunk, sequential[offset..offset + len]);
    }
}

#[test]
fn finish_pads_short_payload_to_full_capacity() {
    let width = 8;
    let height = 8;
    let capacity = pngbin::png::layout::capacity(width, height) as usize;

    let mut writer = PngWriter::new(Vec::new(), width, height).unwrap();
    writer.write_payload(b"short payload").unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader = PngReader::open(Source::Memory(bytes)).unwrap();
    let mut got = vec![0u8; capacity];
    reader.read_at(0, &mut got).unwrap();
    assert_eq!(&got[..13], b"short payload");
    assert!(got[13..].iter().all(|&b| b == 0));
}

#[test]
fn rejects_truncated_file() {
    let mut writer = PngWriter::new(Vec::new(), 8, 8).unwrap();
    writer.write_payload(&[1, 2, 3]).unwrap();
    let mut bytes = writer.finish().unwrap();
    bytes.truncate(bytes.len() - 5);
    assert!(PngReader::open(Source::Memory(bytes)).is_err());
}
