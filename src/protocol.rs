//! Command log protocol.
//!
//! Every state change is a text command. A game is fully described by its
//! ordered log, which is what saves hold and what peers exchange.

mod command;
mod replay;
mod save;
mod socket;

pub use command::Command;
pub use replay::{
    LineReport, LineStatus, ReplayReport, START_SENTINEL, join_battle_log, replay, replay_lines,
    resync, split_battle_log,
};
pub use save::{
    LoadedSave, SaveFormat, is_command_log, load_save, load_save_file, save_file, save_text,
};
pub use socket::{ERROR_PREFIX, FULLLOG_PREFIX, Frame, SocketVerb, UPDATE_PREFIX, encode_message};
