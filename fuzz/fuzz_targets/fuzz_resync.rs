#![no_main]

//! Battle-log fuzzer: semicolon-joined text through network resync.

use libfuzzer_sys::fuzz_target;
use mars_miners::GameConfig;
use mars_miners::game::check_invariants;
use mars_miners::protocol::{replay_lines, resync};

fuzz_target!(|data: &[u8]| {
    let Ok(log) = std::str::from_utf8(data) else {
        return;
    };
    let config = GameConfig {
        width: 6,
        height: 6,
        weapon_req: 2,
        ..GameConfig::default()
    };

    let (game, _) = resync(log, config).expect("config is valid");
    let violations = check_invariants(&game);
    assert!(violations.is_empty(), "invariants violated: {violations:?}");

    // Line replay of the accepted commands never panics either.
    let lines = game.log_lines();
    let (replayed, report) = replay_lines(&lines, config).expect("config is valid");
    assert_eq!(report.lines.len(), lines.len());
    assert!(check_invariants(&replayed).is_empty());
});
