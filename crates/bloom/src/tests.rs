use super::*;
use std::io::Cursor;

#[test]
fn no_false_negatives() {
    let mut bf = Bloom::with_fpr(1000, 0.01);
    let keys: Vec<Vec<u8>> = (0..1000).map(|i| format!("key-{i}").into_bytes()).collect();

    for key in &keys {
        bf.insert(key);
    }
    for key in &keys {
        assert!(bf.may_contain(key), "inserted key must always report maybe");
    }
}

#[test]
fn absent_keys_mostly_rejected() {
    let mut bf = Bloom::with_fpr(1000, 0.01);
    for i in 0..1000 {
        bf.insert(format!("present-{i}").as_bytes());
    }

    let trials = 10_000;
    let false_positives = (0..trials)
        .filter(|i| bf.may_contain(format!("absent-{i}").as_bytes()))
        .count();

    // 1% target; allow generous slack so the test is not flaky.
    assert!(
        false_positives < trials / 20,
        "false positive rate too high: {false_positives}/{trials}"
    );
}

#[test]
fn empty_filter_rejects_everything() {
    let bf = Bloom::with_fpr(10, 0.01);
    assert!(!bf.may_contain(b"anything"));
}

#[test]
fn serialization_roundtrip() {
    let mut bf = Bloom::with_fpr(64, 0.01);
    bf.insert(b"apple");
    bf.insert(b"banana");

    let mut buf = Vec::new();
    bf.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), bf.region_len());

    let restored = Bloom::read_from(&mut Cursor::new(buf)).unwrap();
    assert_eq!(restored, bf);
    assert!(restored.may_contain(b"apple"));
    assert!(restored.may_contain(b"banana"));
}

#[test]
fn sizing_scales_with_fpr() {
    let loose = Bloom::with_fpr(1000, 0.1);
    let tight = Bloom::with_fpr(1000, 0.001);
    assert!(
        tight.num_bits() > loose.num_bits(),
        "lower fpr must buy more bits"
    );
    assert!(tight.num_hashes() >= loose.num_hashes());
}

#[test]
fn read_rejects_implausible_geometry() {
    // k = 0 is never produced by the writer.
    let mut buf = Vec::new();
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&64u32.to_le_bytes());
    buf.extend_from_slice(&[0u8; 8]);
    assert!(Bloom::read_from(&mut Cursor::new(buf)).is_err());
}

#[test]
#[should_panic(expected = "expected_items")]
fn zero_items_panics() {
    let _ = Bloom::with_fpr(0, 0.01);
}
