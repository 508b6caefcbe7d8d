//! Persona tags selectable per chat session.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// The assistant personality a session talks with.
///
/// Unknown tags parse to `Friendly` through [`PersonaTag::parse_lossy`];
/// strict parsing via `FromStr` is kept for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaTag {
    #[default]
    Friendly,
    Strict,
    Funny,
    Grumpy,
}

impl PersonaTag {
    pub const ALL: [PersonaTag; 4] = [
        PersonaTag::Friendly,
        PersonaTag::Strict,
        PersonaTag::Funny,
        PersonaTag::Grumpy,
    ];

    /// Parse a stored or user-supplied tag, falling back to the default persona.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for PersonaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonaTag::Friendly => write!(f, "friendly"),
            PersonaTag::Strict => write!(f, "strict"),
            PersonaTag::Funny => write!(f, "funny"),
            PersonaTag::Grumpy => write!(f, "grumpy"),
        }
    }
}

impl FromStr for PersonaTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "friendly" => Ok(PersonaTag::Friendly),
            "strict" => Ok(PersonaTag::Strict),
            "funny" => Ok(PersonaTag::Funny),
            "grumpy" => Ok(PersonaTag::Grumpy),
            other => Err(format!("invalid persona: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_display_roundtrip() {
        for tag in PersonaTag::ALL {
            assert_eq!(tag.to_string().parse::<PersonaTag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_unknown_persona_falls_back_to_friendly() {
        assert_eq!(PersonaTag::parse_lossy("sarcastic"), PersonaTag::Friendly);
        assert_eq!(PersonaTag::parse_lossy(" GRUMPY "), PersonaTag::Grumpy);
    }

    #[test]
    fn test_persona_serde_lowercase() {
        let json = serde_json::to_string(&PersonaTag::Funny).unwrap();
        assert_eq!(json, "\"funny\"");
    }
}
