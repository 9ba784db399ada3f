//! Picture categories that select a prompt catalog.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tag attached to every profile and image. Stored as its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PictureCategory {
    Female,
    Male,
    Pets,
    Random,
}

impl PictureCategory {
    /// Every category, in catalog order.
    pub const ALL: [PictureCategory; 4] = [Self::Female, Self::Male, Self::Pets, Self::Random];

    /// Parse from the database / query-string name.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            "pets" => Ok(Self::Pets),
            "random" => Ok(Self::Random),
            other => Err(CoreError::Validation(format!(
                "Unknown picture category '{other}'. Must be one of: female, male, pets, random"
            ))),
        }
    }

    /// Lowercase name used in storage, file names and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
            Self::Pets => "pets",
            Self::Random => "random",
        }
    }
}

impl std::fmt::Display for PictureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
