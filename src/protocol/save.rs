//! Save files.
//!
//! Games are saved as their command log, one command per line. Loading also
//! accepts the JSON saves written by older clients: a snapshot carrying a
//! `battleLog` array, or a bare snapshot of roles and weapon requirement
//! that is rebuilt as a fresh game.

use std::fs;
use std::path::Path;

use log::{info, warn};

use crate::config::GameConfig;
use crate::error::SaveError;
use crate::game::{Game, Role, SeatId, Snapshot};
use crate::protocol::replay::{ReplayReport, replay_lines};

/// Which form a loaded save was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveFormat {
    /// Newline-separated command log.
    CommandLog,
    /// JSON snapshot with a `battleLog` array.
    SnapshotLog,
    /// JSON snapshot with roles only.
    LegacySnapshot,
}

/// A game restored from a save file.
#[derive(Debug, Clone)]
pub struct LoadedSave {
    /// The rebuilt game.
    pub game: Game,
    /// Per-line replay results. Empty for legacy snapshots.
    pub report: ReplayReport,
    /// Detected format.
    pub format: SaveFormat,
}

/// Whether `text` looks like a command log rather than JSON.
///
/// Some line must open with `WEAPON_REQ ` and some line with `JOIN `; a JSON
/// snapshot quoting those commands inside its `battleLog` does not count.
#[must_use]
pub fn is_command_log(text: &str) -> bool {
    let opens_with = |prefix: &str| text.lines().any(|line| line.trim_start().starts_with(prefix));
    opens_with("WEAPON_REQ ") && opens_with("JOIN ")
}

/// Rebuild a game from save-file contents.
///
/// `config` supplies the attack rules and any value the save leaves out.
///
/// # Errors
///
/// Returns [`SaveError::Format`] if the text is neither a command log nor
/// JSON, and [`SaveError::Config`] if the saved dimensions are unusable.
pub fn load_save(text: &str, config: GameConfig) -> Result<LoadedSave, SaveError> {
    if is_command_log(text) {
        let (game, report) = replay_lines(text.lines(), config)?;
        return Ok(LoadedSave {
            game,
            report,
            format: SaveFormat::CommandLog,
        });
    }

    let snapshot: Snapshot = serde_json::from_str(text)?;
    let config = snapshot_config(&snapshot, config);

    if !snapshot.battle_log.is_empty() {
        let (game, report) = replay_lines(&snapshot.battle_log, config)?;
        return Ok(LoadedSave {
            game,
            report,
            format: SaveFormat::SnapshotLog,
        });
    }

    warn!("save has no command log; rebuilding from roles");
    let roles = SeatId::ALL.map(|id| snapshot.roles.get(&id.get()).copied().unwrap_or(Role::None));
    let game = Game::new(roles, config)?;
    Ok(LoadedSave {
        game,
        report: ReplayReport::default(),
        format: SaveFormat::LegacySnapshot,
    })
}

fn snapshot_config(snapshot: &Snapshot, base: GameConfig) -> GameConfig {
    let pick_side = |saved: u16, default: u16| if saved == 0 { default } else { saved };
    GameConfig {
        width: pick_side(snapshot.width, base.width),
        height: pick_side(snapshot.height, base.height),
        weapon_req: if snapshot.weapon_req == 0 {
            base.weapon_req
        } else {
            snapshot.weapon_req
        },
        rules: base.rules,
    }
}

/// Load a save file from disk.
///
/// # Errors
///
/// Returns a [`SaveError`] if the file cannot be read or is not a save.
pub fn load_save_file(path: &Path, config: GameConfig) -> Result<LoadedSave, SaveError> {
    let text = fs::read_to_string(path)?;
    let loaded = load_save(&text, config)?;
    info!(
        "loaded {} ({:?}, {} commands)",
        path.display(),
        loaded.format,
        loaded.game.log().len()
    );
    Ok(loaded)
}

/// Command log of `game` in save-file form.
#[must_use]
pub fn save_text(game: &Game) -> String {
    let mut text = game.log_lines().join("\n");
    text.push('\n');
    text
}

/// Write the command log of `game` to `path`.
///
/// # Errors
///
/// Returns [`SaveError::Io`] if the file cannot be written.
pub fn save_file(game: &Game, path: &Path) -> Result<(), SaveError> {
    fs::write(path, save_text(game))?;
    Ok(())
}
