// ── Display theme ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CommandError;

/// One of the two colours an e-paper pixel can take.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Ink {
    Black,
    White,
}

/// Named themes offered by the console.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ThemePreset {
    /// Black ink on white paper.
    Black,
    /// White ink on black paper.
    White,
}

/// Foreground/background pair used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Theme {
    pub foreground: Ink,
    pub background: Ink,
}

impl Theme {
    pub const BLACK: Self = Self {
        foreground: Ink::Black,
        background: Ink::White,
    };

    pub const WHITE: Self = Self {
        foreground: Ink::White,
        background: Ink::Black,
    };

    pub fn preset(preset: ThemePreset) -> Self {
        match preset {
            ThemePreset::Black => Self::BLACK,
            ThemePreset::White => Self::WHITE,
        }
    }

    /// The preset this theme corresponds to, if any.
    pub fn preset_name(&self) -> Option<ThemePreset> {
        match *self {
            Self::BLACK => Some(ThemePreset::Black),
            Self::WHITE => Some(ThemePreset::White),
            _ => None,
        }
    }

    /// A theme whose inks match would draw nothing visible.
    pub fn validate(&self) -> Result<(), CommandError> {
        if self.foreground == self.background {
            return Err(CommandError::InvalidTheme {
                reason: format!("foreground and background are both {}", self.foreground),
            });
        }
        Ok(())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<ThemePreset> for Theme {
    fn from(preset: ThemePreset) -> Self {
        Self::preset(preset)
    }
}
