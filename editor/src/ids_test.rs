use super::*;

#[test]
fn sequential_ids_count_in_base36() {
    let mut ids = SequentialIds::new();
    assert_eq!(ids.next_id("block"), "block_1");
    assert_eq!(ids.next_id("timeline"), "timeline_2");
}

#[test]
fn sequential_ids_roll_over_to_letters() {
    let mut ids = SequentialIds::starting_after(9);
    assert_eq!(ids.next_id("b"), "b_a");
    let mut ids = SequentialIds::starting_after(35);
    assert_eq!(ids.next_id("b"), "b_10");
}

#[test]
fn independent_generators_do_not_share_state() {
    let mut a = SequentialIds::new();
    let mut b = SequentialIds::new();
    a.next_id("x");
    assert_eq!(b.next_id("x"), "x_1");
}

#[test]
fn uuid_ids_are_unique_and_prefixed() {
    let mut ids = UuidIds;
    let first = ids.next_id("block");
    let second = ids.next_id("block");
    assert!(first.starts_with("block_"));
    assert_ne!(first, second);
    assert_eq!(first.len(), "block_".len() + 32);
}

#[test]
fn base36_zero() {
    assert_eq!(to_base36(0), "0");
    assert_eq!(to_base36(36 * 36), "100");
}

#[test]
fn now_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn now_tracks_the_calendar_clock() {
    let calendar = time::OffsetDateTime::now_utc().unix_timestamp() * 1000;
    assert!((now_ms() - calendar).abs() < 5_000);
}
