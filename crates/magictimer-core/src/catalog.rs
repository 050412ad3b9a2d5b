//! Activities and companion characters offered on the configuration screen.
//!
//! Reference data only. Sessions point at entries by id and never change
//! them.

use serde::{Deserialize, Serialize};

use crate::error::TimerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub label: String,
    pub icon: String,
    /// Visual theme token for the presentation layer (e.g. "blue").
    pub theme: String,
    /// Spoken and shown when the countdown for this activity ends.
    pub end_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub label: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    activities: Vec<Activity>,
    characters: Vec<Character>,
}

impl Catalog {
    /// Build a catalog from custom lists. Returns `None` if either is empty,
    /// since a session always needs a default selection.
    pub fn new(activities: Vec<Activity>, characters: Vec<Character>) -> Option<Self> {
        if activities.is_empty() || characters.is_empty() {
            return None;
        }
        Some(Self {
            activities,
            characters,
        })
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn activity(&self, id: &str) -> Result<&Activity, TimerError> {
        self.activities
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| TimerError::UnknownActivity(id.to_string()))
    }

    pub fn character(&self, id: &str) -> Result<&Character, TimerError> {
        self.characters
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| TimerError::UnknownCharacter(id.to_string()))
    }

    pub fn default_activity(&self) -> &Activity {
        &self.activities[0]
    }

    pub fn default_character(&self) -> &Character {
        &self.characters[0]
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            activities: vec![
                activity(
                    "tv",
                    "TV / Desenho",
                    "📺",
                    "blue",
                    "A TV vai descansar agora. Vamos brincar de outra coisa?",
                ),
                activity(
                    "play",
                    "Brincar",
                    "🧸",
                    "green",
                    "Hora de guardar os brinquedos! O amiguinho quer dormir.",
                ),
                activity(
                    "tablet",
                    "Celular / Tablet",
                    "📱",
                    "purple",
                    "O tablet está com sono. Tchau tchau tablet!",
                ),
                activity(
                    "eat",
                    "Comer",
                    "🥣",
                    "orange",
                    "Hummm! Barriguinha cheia, hora de limpar as mãos.",
                ),
                activity(
                    "sleep",
                    "Soneca",
                    "🌙",
                    "indigo",
                    "Bom dia! Hora de acordar com um sorriso.",
                ),
            ],
            characters: vec![
                character("dino", "Dino", "🦖"),
                character("car", "Carrinho", "🚗"),
                character("doll", "Boneca", "🪆"),
                character("mouse", "Ratinho", "🐭"),
                character("rabbit", "Coelhinho", "🐰"),
                character("rocket", "Foguete", "🚀"),
                character("unicorn", "Unicórnio", "🦄"),
            ],
        }
    }
}

fn activity(id: &str, label: &str, icon: &str, theme: &str, end_message: &str) -> Activity {
    Activity {
        id: id.into(),
        label: label.into(),
        icon: icon.into(),
        theme: theme.into(),
        end_message: end_message.into(),
    }
}

fn character(id: &str, label: &str, icon: &str) -> Character {
    Character {
        id: id.into(),
        label: label.into(),
        icon: icon.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_contents() {
        let catalog = Catalog::default();
        assert_eq!(catalog.activities().len(), 5);
        assert_eq!(catalog.characters().len(), 7);
        assert_eq!(catalog.default_activity().id, "tv");
        assert_eq!(catalog.default_character().id, "dino");
    }

    #[test]
    fn lookup_by_id() {
        let catalog = Catalog::default();
        assert_eq!(catalog.activity("sleep").unwrap().icon, "🌙");
        assert_eq!(catalog.character("unicorn").unwrap().label, "Unicórnio");
        assert_eq!(
            catalog.activity("bath").unwrap_err(),
            TimerError::UnknownActivity("bath".into())
        );
        assert_eq!(
            catalog.character("cat").unwrap_err(),
            TimerError::UnknownCharacter("cat".into())
        );
    }

    #[test]
    fn empty_catalog_rejected() {
        let characters = Catalog::default().characters().to_vec();
        assert!(Catalog::new(Vec::new(), characters).is_none());
    }
}
