use ink_ask::typewriter::{RevealState, Typewriter};
use std::time::{Duration, Instant};

fn drain(tw: &mut Typewriter) -> usize {
    let mut ticks = 0;
    while tw.tick() {
        ticks += 1;
    }
    ticks
}

#[test]
fn reveals_fragments_in_delivery_order() {
    let fragments = ["# Ti", "tle\n\nSome ", "", "`code` and ", "ünïcödé ✓", "\n"];
    let now = Instant::now();
    let mut tw = Typewriter::new(Duration::from_millis(10));

    // Interleave arrivals with partial reveals.
    for (i, f) in fragments.iter().enumerate() {
        tw.append(f, now);
        for _ in 0..i {
            tw.tick();
        }
    }
    drain(&mut tw);

    assert_eq!(tw.revealed(), fragments.concat());
    assert_eq!(tw.pending_len(), 0);
    assert_eq!(tw.state(), RevealState::Idle);
}

#[test]
fn revealed_plus_pending_is_always_the_full_text() {
    let now = Instant::now();
    let mut tw = Typewriter::default();
    let mut received = String::new();
    for f in ["alpha ", "beta ", "gamma"] {
        tw.append(f, now);
        received.push_str(f);
        tw.tick();
        tw.tick();
        assert_eq!(format!("{}{}", tw.revealed(), tw.pending_text()), received);
    }
}

#[test]
fn n_pending_characters_take_n_ticks() {
    let mut tw = Typewriter::default();
    tw.append("héllo", Instant::now());
    assert_eq!(tw.pending_len(), 5);
    for expected in 1..=5 {
        assert!(tw.tick());
        assert_eq!(tw.revealed().chars().count(), expected);
    }
    assert!(tw.is_revealing());
    // The tick that finds nothing pending stops the timer.
    assert!(!tw.tick());
    assert!(!tw.is_revealing());
    assert_eq!(tw.revealed(), "héllo");
}

#[test]
fn clear_resets_from_any_state() {
    let now = Instant::now();

    let mut idle = Typewriter::default();
    idle.clear();
    assert_eq!(idle.revealed(), "");
    assert_eq!(idle.state(), RevealState::Idle);

    let mut receiving = Typewriter::default();
    receiving.append("abc", now);
    receiving.clear();
    assert_eq!(receiving.pending_len(), 0);
    assert_eq!(receiving.state(), RevealState::Idle);
    assert_eq!(receiving.next_deadline(), None);

    let mut mid = Typewriter::default();
    mid.append("abcdef", now);
    mid.tick();
    mid.tick();
    mid.clear();
    assert_eq!(mid.revealed(), "");
    assert_eq!(mid.html(), "");
    assert_eq!(mid.pending_len(), 0);
    assert!(!mid.is_revealing());
    assert!(!mid.take_scroll_request());
}

#[test]
fn empty_fragment_never_starts_the_timer() {
    let mut tw = Typewriter::default();
    tw.append("", Instant::now());
    assert_eq!(tw.state(), RevealState::Idle);
    assert_eq!(tw.next_deadline(), None);
}

#[test]
fn timer_restarts_when_new_text_arrives_after_drain() {
    let start = Instant::now();
    let mut tw = Typewriter::new(Duration::from_millis(10));
    tw.append("ab", start);
    tw.advance(start + Duration::from_millis(100));
    assert_eq!(tw.revealed(), "ab");
    assert!(!tw.is_revealing());

    let later = start + Duration::from_millis(500);
    tw.append("c", later);
    assert_eq!(tw.next_deadline(), Some(later + Duration::from_millis(10)));
    tw.advance(later + Duration::from_millis(10));
    assert_eq!(tw.revealed(), "abc");
}

#[test]
fn every_reveal_rerenders_the_whole_text() {
    let mut tw = Typewriter::default();
    tw.append("**bold**", Instant::now());
    drain(&mut tw);
    assert_eq!(tw.html(), "<p><strong>bold</strong></p>\n");

    let mut partial = Typewriter::default();
    partial.append("**bo", Instant::now());
    drain(&mut partial);
    assert_eq!(partial.html(), "<p>**bo</p>\n");
}
