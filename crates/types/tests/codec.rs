//! Tests for the record decoder.

use parley_types::{RecordDecoder, StreamRecord};

const TURN: &str = concat!(
    "data: {\"type\":\"start\",\"chat_id\":\"c-1\"}\n",
    "\n",
    "data: {\"type\":\"chunk\",\"content\":\"Hel\"}\n",
    "data: {\"type\":\"chunk\",\"content\":\"lo, wörld\"}\n",
    "data: {\"type\":\"end\"}\n",
);

fn decode_in_pieces(bytes: &[u8], size: usize) -> Vec<StreamRecord> {
    let mut decoder = RecordDecoder::new();
    let mut records = Vec::new();
    for piece in bytes.chunks(size) {
        records.extend(decoder.push(piece));
    }
    records.extend(decoder.finish());
    records
}

#[test]
fn decodes_full_turn() {
    let records = decode_in_pieces(TURN.as_bytes(), TURN.len());
    assert_eq!(
        records,
        vec![
            StreamRecord::Start {
                chat_id: Some("c-1".into())
            },
            StreamRecord::Chunk {
                content: "Hel".into()
            },
            StreamRecord::Chunk {
                content: "lo, wörld".into()
            },
            StreamRecord::End,
        ]
    );
}

#[test]
fn transport_chunking_does_not_change_records() {
    let whole = decode_in_pieces(TURN.as_bytes(), TURN.len());
    for size in [1, 2, 3, 7, 16, 33] {
        assert_eq!(decode_in_pieces(TURN.as_bytes(), size), whole, "size {size}");
    }
}

#[test]
fn record_split_across_reads_waits_for_newline() {
    let mut decoder = RecordDecoder::new();
    assert!(decoder.push(b"data: {\"type\":\"chu").is_empty());
    assert!(decoder.pending() > 0);
    let records = decoder.push(b"nk\",\"content\":\"x\"}\n");
    assert_eq!(
        records,
        vec![StreamRecord::Chunk {
            content: "x".into()
        }]
    );
    assert_eq!(decoder.pending(), 0);
}

#[test]
fn malformed_lines_are_skipped() {
    let input = concat!(
        "data: {\"type\":\"chunk\",\"content\":\"a\"}\n",
        "data: {not json}\n",
        "event: ping\n",
        "data: {\"type\":\"mystery\",\"x\":1}\n",
        "data: {\"type\":\"chunk\",\"content\":\"b\"}\n",
    );
    let mut decoder = RecordDecoder::new();
    let records = decoder.push(input.as_bytes());
    assert_eq!(
        records,
        vec![
            StreamRecord::Chunk {
                content: "a".into()
            },
            StreamRecord::Chunk {
                content: "b".into()
            },
        ]
    );
    assert_eq!(decoder.skipped(), 3);
}

#[test]
fn crlf_and_missing_space_are_tolerated() {
    let mut decoder = RecordDecoder::new();
    let records = decoder.push(b"data:{\"type\":\"end\"}\r\n");
    assert_eq!(records, vec![StreamRecord::End]);
}

#[test]
fn trailing_record_without_newline_is_flushed() {
    let mut decoder = RecordDecoder::new();
    assert!(decoder.push(b"data: {\"type\":\"end\"}").is_empty());
    assert_eq!(decoder.finish(), Some(StreamRecord::End));
    assert_eq!(decoder.finish(), None);
}

#[test]
fn done_sentinel_is_ignored() {
    let mut decoder = RecordDecoder::new();
    assert!(decoder.push(b"data: [DONE]\n").is_empty());
    assert_eq!(decoder.skipped(), 0);
}
