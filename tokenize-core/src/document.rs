//! # Documento Canônico
//!
//! Todas as estratégias de tokenização convergem para o mesmo formato:
//! uma lista de sentenças, cada uma com tokens que carregam offsets de
//! **caracteres** (não bytes) no texto cru do documento.
//!
//! ```text
//! raw_text:  "Hello world Foo"
//!             0    5 6   11 12 15
//! sentença 1: Hello(0,5) world(6,11)
//! sentença 2: Foo(12,15)
//! ```
//!
//! Os offsets não são decorativos: `raw_text[start_char..end_char]` (em
//! caracteres) precisa devolver o texto do token.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenizeError};

/// Um token de uma sentença.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Posição 1-based dentro da sentença.
    pub id: usize,
    /// Texto do token (nunca vazio).
    pub text: String,
    /// Offset inicial em caracteres no texto cru (inclusive).
    pub start_char: usize,
    /// Offset final em caracteres no texto cru (exclusivo).
    pub end_char: usize,
    /// Probabilidade atribuída pelo modelo. Só existe no caminho com modelo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// O modelo marcou este token como multi-palavra (ex: contrações).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multi_word: bool,
}

impl Token {
    pub fn new(id: usize, text: impl Into<String>, start_char: usize, end_char: usize) -> Self {
        Self {
            id,
            text: text.into(),
            start_char,
            end_char,
            confidence: None,
            multi_word: false,
        }
    }

    /// Comprimento do intervalo em caracteres (zero se invertido).
    pub fn char_len(&self) -> usize {
        self.end_char.saturating_sub(self.start_char)
    }
}

/// Sequência ordenada e não vazia de tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Documento produzido pelo estágio: sentenças + texto cru + probabilidades opcionais.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub sentences: Vec<Sentence>,
    pub raw_text: String,
    /// Estrutura paralela às sentenças: uma probabilidade por token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<Vec<f64>>>,
}

impl Document {
    /// Ponto de convergência de todas as estratégias.
    ///
    /// Recebe as sentenças já montadas, o texto cru e, opcionalmente, as
    /// probabilidades (mesmo formato das sentenças). Cada probabilidade é
    /// copiada para o `confidence` do token correspondente. Sentenças vazias
    /// não entram no documento; a linha de probabilidades delas também sai.
    ///
    /// Probabilidades com número de linhas ou de colunas diferente das
    /// sentenças são [`TokenizeError::InconsistentPrediction`].
    pub fn new(
        sentences: Vec<Vec<Token>>,
        raw_text: impl Into<String>,
        probabilities: Option<Vec<Vec<f64>>>,
    ) -> Result<Self> {
        if let Some(probs) = &probabilities {
            if probs.len() != sentences.len() {
                return Err(misaligned(format!(
                    "{} sentenças e {} linhas de probabilidades",
                    sentences.len(),
                    probs.len()
                )));
            }
        }

        let mut kept_probs = probabilities.as_ref().map(|_| Vec::new());
        let mut rows = probabilities.map(Vec::into_iter);
        let mut out = Vec::with_capacity(sentences.len());

        for (i, mut tokens) in sentences.into_iter().enumerate() {
            let row = rows.as_mut().and_then(|r| r.next());
            if let Some(row) = &row {
                if row.len() != tokens.len() {
                    return Err(misaligned(format!(
                        "sentença {i}: {} tokens e {} probabilidades",
                        tokens.len(),
                        row.len()
                    )));
                }
            }
            if tokens.is_empty() {
                continue;
            }
            if let (Some(row), Some(kept)) = (row, kept_probs.as_mut()) {
                for (token, p) in tokens.iter_mut().zip(&row) {
                    token.confidence = Some(*p);
                }
                kept.push(row);
            }
            out.push(Sentence { tokens });
        }

        Ok(Self {
            sentences: out,
            raw_text: raw_text.into(),
            probabilities: kept_probs,
        })
    }

    pub fn num_tokens(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }

    /// Itera sobre todos os tokens, na ordem do documento.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }

    /// Recorta do texto cru o trecho apontado pelos offsets do token.
    pub fn token_text(&self, token: &Token) -> Option<&str> {
        char_slice(&self.raw_text, token.start_char, token.end_char)
    }

    /// Confere os invariantes do documento:
    /// - nenhuma sentença vazia;
    /// - ids contíguos a partir de 1;
    /// - intervalos não vazios, do tamanho do texto do token, crescentes e sem sobreposição;
    /// - offsets dentro do texto cru;
    /// - probabilidades (se houver) alinhadas aos tokens e em [0, 1].
    pub fn check_invariants(&self) -> Result<()> {
        let total_chars = self.raw_text.chars().count();
        let mut last_end = 0usize;

        for (s_idx, sentence) in self.sentences.iter().enumerate() {
            if sentence.is_empty() {
                return Err(violation(format!("sentença {s_idx} está vazia")));
            }
            for (t_idx, token) in sentence.tokens.iter().enumerate() {
                if token.id != t_idx + 1 {
                    return Err(violation(format!(
                        "sentença {s_idx}: token '{}' tem id {} e deveria ter {}",
                        token.text,
                        token.id,
                        t_idx + 1
                    )));
                }
                if token.text.is_empty() || token.char_len() == 0 {
                    return Err(violation(format!("sentença {s_idx}: token {} vazio", token.id)));
                }
                if token.text.chars().count() != token.char_len() {
                    return Err(violation(format!(
                        "sentença {s_idx}: token '{}' tem {} chars e intervalo de {}",
                        token.text,
                        token.text.chars().count(),
                        token.char_len()
                    )));
                }
                if token.start_char < last_end {
                    return Err(violation(format!(
                        "sentença {s_idx}: token '{}' começa em {} antes do fim anterior {}",
                        token.text, token.start_char, last_end
                    )));
                }
                if token.end_char > total_chars {
                    return Err(violation(format!(
                        "token '{}' termina em {} além do texto ({total_chars} chars)",
                        token.text, token.end_char
                    )));
                }
                last_end = token.end_char;
            }
        }

        if let Some(probs) = &self.probabilities {
            if probs.len() != self.sentences.len() {
                return Err(violation("probabilidades com número de sentenças diferente".to_string()));
            }
            for (row, sentence) in probs.iter().zip(&self.sentences) {
                if row.len() != sentence.len() {
                    return Err(violation("probabilidades com número de tokens diferente".to_string()));
                }
                if row.iter().any(|p| !(0.0..=1.0).contains(p)) {
                    return Err(violation("probabilidade fora de [0, 1]".to_string()));
                }
            }
        }
        Ok(())
    }
}

fn violation(msg: String) -> TokenizeError {
    TokenizeError::InvariantViolation(msg)
}

fn misaligned(reason: String) -> TokenizeError {
    TokenizeError::InconsistentPrediction { reason }
}

/// Fatia `text` por offsets de caracteres `[start, end)`.
///
/// Retorna `None` se o intervalo estiver fora do texto ou invertido.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let start_byte = indices.nth(start)?;
    let end_byte = if end == start {
        start_byte
    } else {
        indices.nth(end - start - 1)?
    };
    Some(&text[start_byte..end_byte])
}
