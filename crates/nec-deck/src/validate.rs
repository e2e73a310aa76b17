//! Structural deck validation.
//!
//! Only card order is checked here; parameter ranges and references are
//! validated by the context when the deck is applied.

use crate::schema::{CardDef, Deck};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Deck has no cards")]
    Empty,

    #[error("Deck has no geometry_end card")]
    MissingGeometryEnd,

    #[error("Card {index}: second geometry_end card")]
    DuplicateGeometryEnd { index: usize },

    #[error("Card {index}: {card} must follow geometry_end")]
    BeforeGeometryEnd { index: usize, card: &'static str },

    #[error("Card {index}: {card} must precede geometry_end")]
    AfterGeometryEnd { index: usize, card: &'static str },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_deck(deck: &Deck) -> Result<(), ValidationError> {
    if deck.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: deck.version,
        });
    }
    if deck.cards.is_empty() {
        return Err(ValidationError::Empty);
    }

    let mut sealed = false;
    for (index, card) in deck.cards.iter().enumerate() {
        match card {
            CardDef::GeometryEnd { .. } if sealed => {
                return Err(ValidationError::DuplicateGeometryEnd { index });
            }
            CardDef::GeometryEnd { .. } => sealed = true,
            c if c.is_geometry() && sealed => {
                return Err(ValidationError::AfterGeometryEnd {
                    index,
                    card: c.name(),
                });
            }
            c if !c.is_geometry() && !sealed => {
                return Err(ValidationError::BeforeGeometryEnd {
                    index,
                    card: c.name(),
                });
            }
            _ => {}
        }
    }
    if sealed {
        Ok(())
    } else {
        Err(ValidationError::MissingGeometryEnd)
    }
}
