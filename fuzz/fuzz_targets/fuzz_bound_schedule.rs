#![no_main]
use libfuzzer_sys::fuzz_target;
use smtplan_engine::search::SearchBounds;

fuzz_target!(|data: &[u8]| {
    if data.len() < 24 {
        return;
    }
    let word = |i: usize| {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&data[i * 8..i * 8 + 8]);
        u64::from_le_bytes(buf)
    };
    let upper = (data.len() > 24 && data[24] & 1 == 1).then(|| word(1));
    let bounds = SearchBounds {
        start: word(0),
        upper,
        step: word(2).max(1),
    };
    // Attempted bounds are strictly increasing and never pass the upper bound.
    let mut previous = None;
    for bound in bounds.schedule().take(256) {
        assert!(bounds.admits(bound));
        if let Some(prev) = previous {
            assert!(bound > prev);
        }
        previous = Some(bound);
    }
});
