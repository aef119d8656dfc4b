use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RecetteError, RecetteResult};

/// The closed word lists of the recipe language.
///
/// Lists keep their configured order: completion proposes words in exactly
/// this order. Fields missing from a JSON file keep their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vocabulary {
    /// Every recognised verb.
    pub verbs: Vec<String>,
    /// The verbs that must be followed by ingredient names.
    pub ingredient_verbs: Vec<String>,
    /// Adverbs, each followed by exactly one tool.
    pub adverbs: Vec<String>,
    /// Tools an adverb may name.
    pub tools: Vec<String>,
    /// Title of the section declaring ingredients.
    pub ingredients_section: String,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            verbs: words(&[
                "verser",
                "touiller",
                "malaxer",
                "mélanger",
                "incorporer",
                "étaler",
                "fondre",
                "cuire",
            ]),
            ingredient_verbs: words(&["verser", "mélanger", "incorporer", "étaler", "fondre"]),
            adverbs: words(&["avec", "dans"]),
            tools: words(&["saladier", "cuillère", "plat", "mixeur", "four"]),
            ingredients_section: "ingrédients".to_string(),
        }
    }
}

impl Vocabulary {
    /// Parse and check a JSON vocabulary.
    pub fn from_json(json: &str) -> RecetteResult<Self> {
        let vocabulary: Vocabulary = serde_json::from_str(json)?;
        vocabulary.validate()
    }

    /// Read a JSON vocabulary file.
    pub fn load(path: &Path) -> RecetteResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| RecetteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check the rules a JSON file could break: words are single, non-empty
    /// tokens, and every ingredient verb is also a verb.
    pub fn validate(self) -> RecetteResult<Self> {
        let all = self
            .verbs
            .iter()
            .chain(&self.ingredient_verbs)
            .chain(&self.adverbs)
            .chain(&self.tools);
        for word in all {
            if word.is_empty() || word.chars().any(char::is_whitespace) {
                return Err(RecetteError::InvalidVocabulary(format!(
                    "\"{word}\" is not a single word"
                )));
            }
        }
        if let Some(stray) = self.ingredient_verbs.iter().find(|v| !self.is_verb(v)) {
            return Err(RecetteError::InvalidVocabulary(format!(
                "ingredient verb \"{stray}\" is not listed in verbs"
            )));
        }
        if self.ingredients_section.trim().is_empty() {
            return Err(RecetteError::InvalidVocabulary(
                "ingredients section name is empty".to_string(),
            ));
        }
        Ok(self)
    }

    /// Whether `word` is a verb.
    pub fn is_verb(&self, word: &str) -> bool {
        self.verbs.iter().any(|v| v == word)
    }

    /// Whether `word` is a verb that takes ingredients.
    pub fn needs_ingredients(&self, word: &str) -> bool {
        self.ingredient_verbs.iter().any(|v| v == word)
    }

    /// Whether `word` is an adverb.
    pub fn is_adverb(&self, word: &str) -> bool {
        self.adverbs.iter().any(|a| a == word)
    }

    /// Whether `word` is a tool.
    pub fn is_tool(&self, word: &str) -> bool {
        self.tools.iter().any(|t| t == word)
    }

    /// Whether a section title names the ingredients section.
    pub fn is_ingredients_section(&self, title: &str) -> bool {
        title.trim() == self.ingredients_section
    }
}
