#![no_main]

//! Save-file fuzzer: arbitrary text through the loader and line replay.

use libfuzzer_sys::fuzz_target;
use mars_miners::GameConfig;
use mars_miners::game::check_invariants;
use mars_miners::protocol::{load_save, replay_lines};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let config = GameConfig::default();

    let (game, report) = replay_lines(text.lines(), config).expect("default config is valid");
    assert_eq!(report.lines.len(), text.lines().count());
    let violations = check_invariants(&game);
    assert!(violations.is_empty(), "invariants violated: {violations:?}");

    // JSON or log, loading must fail cleanly rather than panic.
    if let Ok(loaded) = load_save(text, config) {
        assert!(check_invariants(&loaded.game).is_empty());
    }
});
