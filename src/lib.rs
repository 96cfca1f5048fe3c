pub mod bitboard;
pub mod config;
pub mod coordinates;
pub mod r#move;
pub mod move_gen;
pub mod notation;
pub mod perft;
pub mod piece;
pub mod position;

use move_gen::magic::MagicError;

/// Initialize the library by building the attack tables with the configured magic search settings.
///
/// Calling it is optional: the tables are otherwise built on first use, and a failed magic search then panics instead
/// of returning an error. Initialize the configuration first for its settings to be used.
pub fn initialize() -> Result<(), MagicError> {
    move_gen::attacks::initialize(&config::get_config().magic_settings())?;
    Ok(())
}
