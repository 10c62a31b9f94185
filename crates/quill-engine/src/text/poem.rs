use serde::{Deserialize, Serialize};

/// Poem manifest describing the text a game spells out, one stanza per
/// entry. Loaded from a JSON file at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoemManifest {
    /// Poem title, for display and logging.
    pub title: String,
    /// Attribution line.
    #[serde(default)]
    pub author: Option<String>,
    /// Stanza texts in play order. Whitespace layout inside a stanza is
    /// preserved; tokenization happens later.
    pub stanzas: Vec<String>,
    /// Tile speed for the first stanza, px/sec.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
}

fn default_base_speed() -> f32 {
    300.0
}

impl PoemManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_manifest() {
        let json = r#"{
            "title": "Test Poem",
            "stanzas": ["one two three", "four five"]
        }"#;
        let poem = PoemManifest::from_json(json).unwrap();
        assert_eq!(poem.title, "Test Poem");
        assert_eq!(poem.stanzas.len(), 2);
        assert_eq!(poem.author, None);
        assert_eq!(poem.base_speed, 300.0);
    }

    #[test]
    fn parse_manifest_with_speed_and_author() {
        let json = r#"{
            "title": "T",
            "author": "E. D.",
            "stanzas": ["a b"],
            "base_speed": 120.5
        }"#;
        let poem = PoemManifest::from_json(json).unwrap();
        assert_eq!(poem.author.as_deref(), Some("E. D."));
        assert_eq!(poem.base_speed, 120.5);
    }
}
