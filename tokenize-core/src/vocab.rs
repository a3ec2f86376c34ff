//! # Vocabulário de Unidades
//!
//! Mapeia cada unidade de entrada do modelo (um caractere, ou um chunk no
//! caso do vietnamita) para um id inteiro. Unidades desconhecidas viram `<UNK>`.
//!
//! O vocabulário é carregado junto com o modelo e só é lido durante o
//! processamento; pode ser compartilhado entre threads.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const PAD: &str = "<PAD>";
pub const UNK: &str = "<UNK>";
pub const PAD_ID: u32 = 0;
pub const UNK_ID: u32 = 1;

/// Vocabulário unidade → id. Serializado como a lista ordenada de unidades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocab {
    unit_to_id: HashMap<String, u32>,
    id_to_unit: Vec<String>,
}

impl Vocab {
    /// Vocabulário apenas com os símbolos especiais.
    pub fn new() -> Self {
        Self::from_units(std::iter::empty::<String>())
    }

    /// Constrói a partir de uma sequência de unidades (duplicatas ignoradas).
    pub fn from_units<I, S>(units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self {
            unit_to_id: HashMap::new(),
            id_to_unit: Vec::new(),
        };
        vocab.insert(PAD.to_string());
        vocab.insert(UNK.to_string());
        for unit in units {
            vocab.insert(unit.into());
        }
        vocab
    }

    /// Vocabulário de caracteres a partir de um texto de exemplo.
    pub fn from_text(text: &str) -> Self {
        Self::from_units(text.chars().map(|c| c.to_string()))
    }

    /// Carrega de um arquivo JSON (lista de unidades).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn insert(&mut self, unit: String) {
        if !self.unit_to_id.contains_key(&unit) {
            let id = self.id_to_unit.len() as u32;
            self.unit_to_id.insert(unit.clone(), id);
            self.id_to_unit.push(unit);
        }
    }

    pub fn id(&self, unit: &str) -> u32 {
        self.unit_to_id.get(unit).copied().unwrap_or(UNK_ID)
    }

    pub fn len(&self) -> usize {
        self.id_to_unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_unit.is_empty()
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<String>> for Vocab {
    fn from(units: Vec<String>) -> Self {
        Self::from_units(units)
    }
}

impl From<Vocab> for Vec<String> {
    fn from(vocab: Vocab) -> Self {
        vocab.id_to_unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_ids() {
        let vocab = Vocab::new();
        assert_eq!(vocab.id(PAD), PAD_ID);
        assert_eq!(vocab.id(UNK), UNK_ID);
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_unknown_maps_to_unk() {
        let vocab = Vocab::from_text("abc");
        assert_eq!(vocab.id("a"), 2);
        assert_eq!(vocab.id("z"), UNK_ID);
        assert_eq!(vocab.id("c"), 4);
    }

    #[test]
    fn test_duplicates_ignored() {
        let vocab = Vocab::from_text("aaab");
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_json_roundtrip_keeps_ids() {
        let vocab = Vocab::from_units(["Hà", " Nội"]);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["<PAD>","<UNK>","Hà"," Nội"]"#);
        let back: Vocab = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(" Nội"), 3);
    }
}
