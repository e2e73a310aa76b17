//! nec-deck: YAML antenna decks, their validation, and replay into a context.

pub mod apply;
pub mod schema;
pub mod validate;

pub use apply::apply_deck;
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_deck};

use nec_context::NecError;

pub type DeckResult<T> = Result<T, DeckError>;

#[derive(thiserror::Error, Debug)]
pub enum DeckError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Card {index} ({card}): {source}")]
    Card {
        index: usize,
        card: &'static str,
        source: NecError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn from_yaml_str(content: &str) -> DeckResult<Deck> {
    let deck: Deck = serde_yaml::from_str(content)?;
    validate_deck(&deck)?;
    Ok(deck)
}

pub fn load_yaml(path: &std::path::Path) -> DeckResult<Deck> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, deck: &Deck) -> DeckResult<()> {
    validate_deck(deck)?;
    let content = serde_yaml::to_string(deck)?;
    std::fs::write(path, content)?;
    Ok(())
}
