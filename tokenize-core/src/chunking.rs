//! # Pré-processamento de Chunks por Idioma
//!
//! Em alguns idiomas a unidade natural do modelo não é o caractere. No
//! vietnamita, por exemplo, o espaço separa **sílabas** e uma palavra pode ter
//! várias sílabas ("Hà Nội"): o modelo decide, sílaba a sílaba, onde termina
//! cada token. Antes de montar os batches o texto é reescrito em chunks.
//!
//! O registro [`ChunkerRegistry`] associa um código de idioma a um
//! pré-processador. Idiomas sem entrada usam o carregamento padrão por
//! caractere (ver [`crate::batch::char_paragraphs`]); adicionar um idioma não
//! exige mexer no processador.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::batch::{normalize_space, Paragraph, Unit};
use crate::error::{Result, TokenizeError};
use crate::input::PARAGRAPH_SEPARATOR;

/// Reescreve o texto cru em parágrafos de unidades prontas para o modelo.
pub trait ChunkPreprocessor: Send + Sync {
    /// Nome curto (para logs).
    fn name(&self) -> &'static str;

    fn preprocess(&self, text: &str) -> Result<Vec<Paragraph>>;
}

/// Pré-processador do vietnamita: uma unidade por sílaba.
///
/// - sequências de caracteres de palavra formam um chunk, levando junto os
///   espaços que as precedem (assim "2 , 2" e "2,2" continuam distinguíveis);
/// - cada caractere de pontuação é um chunk próprio (também com os espaços
///   que o precedem);
/// - parágrafos são separados por `"\n\n"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VietnameseChunker;

impl ChunkPreprocessor for VietnameseChunker {
    fn name(&self) -> &'static str {
        "vi"
    }

    fn preprocess(&self, text: &str) -> Result<Vec<Paragraph>> {
        let rewritten = text.trim_end();
        let labels = rewritten
            .split(PARAGRAPH_SEPARATOR)
            .map(|p| "0".repeat(p.chars().count()))
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR);
        paragraphs_to_chunks(rewritten, &labels)
    }
}

fn word_char() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\A\w\z").expect("regex de caractere de palavra válida"))
}

fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    word_char().is_match(c.encode_utf8(&mut buf))
}

/// Divide texto e rótulos (mesmo formato, parágrafos por `"\n\n"`) em chunks.
///
/// Os rótulos servem só de molde: cada parágrafo de rótulos precisa ter o
/// mesmo comprimento do parágrafo de texto. Qualquer divergência é erro,
/// nunca truncamento.
pub fn paragraphs_to_chunks(text: &str, labels: &str) -> Result<Vec<Paragraph>> {
    let text_paras: Vec<&str> = text.split(PARAGRAPH_SEPARATOR).collect();
    let label_paras: Vec<&str> = labels.split(PARAGRAPH_SEPARATOR).collect();
    if text_paras.len() != label_paras.len() {
        return Err(TokenizeError::MalformedChunkingResult {
            reason: format!(
                "{} parágrafos de texto para {} parágrafos de rótulos",
                text_paras.len(),
                label_paras.len()
            ),
        });
    }

    let separator_len = PARAGRAPH_SEPARATOR.chars().count();
    let mut offset = 0usize;
    let mut paragraphs = Vec::with_capacity(text_paras.len());

    for (idx, (para, para_labels)) in text_paras.iter().zip(&label_paras).enumerate() {
        let para_len = para.chars().count();
        let label_len = para_labels.chars().count();
        if para_len != label_len {
            return Err(TokenizeError::MalformedChunkingResult {
                reason: format!("parágrafo {idx}: {para_len} caracteres para {label_len} rótulos"),
            });
        }
        if let Some(bad) = para_labels.chars().find(|c| !c.is_ascii_digit()) {
            return Err(TokenizeError::MalformedChunkingResult {
                reason: format!("parágrafo {idx}: rótulo {bad:?} não é dígito"),
            });
        }

        let trimmed = para.trim_end();
        if !trimmed.is_empty() {
            let units = paragraph_to_chunks(trimmed, offset);
            let covered: usize = units.iter().map(Unit::char_len).sum();
            let expected = trimmed.chars().count();
            if covered != expected {
                return Err(TokenizeError::MalformedChunkingResult {
                    reason: format!("parágrafo {idx}: chunks cobrem {covered} de {expected} caracteres"),
                });
            }
            paragraphs.push(Paragraph { units });
        }
        offset += para_len + separator_len;
    }
    Ok(paragraphs)
}

/// Chunks de um parágrafo que começa no offset `base` do texto original.
fn paragraph_to_chunks(paragraph: &str, base: usize) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut pending = String::new();
    let mut pending_start = base;
    let mut pending_has_word = false;

    for (i, raw) in paragraph.chars().enumerate() {
        let c = normalize_space(raw);
        if pending.is_empty() {
            pending_start = base + i;
        }
        if is_word_char(c) {
            pending.push(c);
            pending_has_word = true;
        } else if c == ' ' {
            if pending_has_word {
                units.push(Unit::new(std::mem::take(&mut pending), pending_start));
                pending_has_word = false;
                pending_start = base + i;
            }
            pending.push(c);
        } else {
            // pontuação: fecha a palavra pendente; espaços pendentes vão junto
            if pending_has_word {
                units.push(Unit::new(std::mem::take(&mut pending), pending_start));
                pending_has_word = false;
                pending_start = base + i;
            }
            pending.push(c);
            units.push(Unit::new(std::mem::take(&mut pending), pending_start));
        }
    }
    if !pending.is_empty() {
        units.push(Unit::new(pending, pending_start));
    }
    units
}

/// Registro idioma → pré-processador de chunks.
#[derive(Clone)]
pub struct ChunkerRegistry {
    chunkers: HashMap<String, Arc<dyn ChunkPreprocessor>>,
}

impl ChunkerRegistry {
    /// Registro vazio: todos os idiomas usam o carregamento por caractere.
    pub fn empty() -> Self {
        Self { chunkers: HashMap::new() }
    }

    /// Registro com os idiomas conhecidos (hoje, só `vi`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("vi", Arc::new(VietnameseChunker));
        registry
    }

    pub fn register(&mut self, lang: impl Into<String>, chunker: Arc<dyn ChunkPreprocessor>) {
        self.chunkers.insert(lang.into(), chunker);
    }

    pub fn get(&self, lang: &str) -> Option<&dyn ChunkPreprocessor> {
        self.chunkers.get(lang).map(|c| c.as_ref())
    }

    /// Idiomas registrados, em ordem alfabética.
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self.chunkers.keys().cloned().collect();
        langs.sort();
        langs
    }
}

impl Default for ChunkerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ChunkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkerRegistry").field("languages", &self.languages()).finish()
    }
}
