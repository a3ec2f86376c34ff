//! # Montagem de Batches para o Modelo
//!
//! O modelo não vê o texto inteiro de uma vez. O texto é dividido em
//! **parágrafos** (separados por linha em branco), cada parágrafo em
//! **unidades** (caracteres, ou chunks quando há pré-processamento de idioma),
//! e as unidades são cortadas em **segmentos** de no máximo `max_seqlen`.
//!
//! ```text
//! texto ──► parágrafos ──► unidades ──► segmentos (≤ max_seqlen) ──► batches (≤ batch_size)
//! ```
//!
//! Nada aqui altera o conteúdo: cada unidade guarda seu offset de caractere
//! no texto original para que os tokens possam ser localizados depois.
//! A ordem é sempre preservada (modo de avaliação: sem embaralhar, sem descartar).

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::TokenizeConfig;
use crate::vocab::Vocab;

/// Menor pedaço de texto que recebe um rótulo do modelo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Texto da unidade com espaços em branco normalizados para `' '`.
    pub text: String,
    /// Offset, em caracteres, do início da unidade no texto original.
    pub start_char: usize,
}

impl Unit {
    pub fn new(text: impl Into<String>, start_char: usize) -> Self {
        Self { text: text.into(), start_char }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn end_char(&self) -> usize {
        self.start_char + self.char_len()
    }
}

/// Parágrafo já dividido em unidades.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub units: Vec<Unit>,
}

impl Paragraph {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Trecho contíguo de um parágrafo, já codificado pelo vocabulário.
///
/// `context` guarda as unidades do parágrafo inteiro, compartilhadas entre
/// todos os seus segmentos. Um modelo que precise enxergar além do corte
/// usa `context[offset..]`; `units` é sempre `context[offset..offset + units.len()]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Índice do parágrafo de origem.
    pub paragraph: usize,
    /// Posição da primeira unidade dentro do parágrafo.
    pub offset: usize,
    pub units: Vec<Unit>,
    pub ids: Vec<u32>,
    /// Último segmento do parágrafo (o parágrafo termina aqui).
    pub ends_paragraph: bool,
    pub context: Arc<[Unit]>,
}

/// Grupo de segmentos enviado ao modelo numa única chamada.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub segments: Vec<Segment>,
}

impl Batch {
    pub fn num_units(&self) -> usize {
        self.segments.iter().map(|s| s.units.len()).sum()
    }
}

/// Fonte de batches de uma única chamada de `process`.
///
/// Não é compartilhada: cada chamada monta a sua.
#[derive(Debug, Clone, Default)]
pub struct BatchSource {
    batches: Vec<Batch>,
    total_units: usize,
}

impl BatchSource {
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total de unidades em todos os batches.
    pub fn total_units(&self) -> usize {
        self.total_units
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }
}

impl IntoIterator for BatchSource {
    type Item = Batch;
    type IntoIter = std::vec::IntoIter<Batch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.into_iter()
    }
}

fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("regex de parágrafo válida"))
}

/// Carregamento padrão: parágrafos por linha em branco, um caractere por unidade.
///
/// O texto é cortado à direita; parágrafos só com espaços são ignorados e cada
/// parágrafo perde os espaços finais. Espaços viram `' '`.
pub fn char_paragraphs(text: &str) -> Vec<Paragraph> {
    let text = text.trim_end();
    let mut paragraphs = Vec::new();

    // Cursor byte → char para converter offsets da regex sem recontar tudo
    let mut cursor_byte = 0usize;
    let mut cursor_char = 0usize;
    let mut start_byte = 0usize;

    let mut bounds: Vec<(usize, usize)> = paragraph_break()
        .find_iter(text)
        .map(|m| {
            let span = (start_byte, m.start());
            start_byte = m.end();
            span
        })
        .collect();
    bounds.push((start_byte, text.len()));

    for (start, end) in bounds {
        cursor_char += text[cursor_byte..start].chars().count();
        cursor_byte = start;

        let piece = text[start..end].trim_end();
        if piece.trim().is_empty() {
            continue;
        }
        let units = piece
            .chars()
            .enumerate()
            .map(|(i, c)| Unit::new(normalize_space(c), cursor_char + i))
            .collect();
        paragraphs.push(Paragraph { units });
    }
    paragraphs
}

pub(crate) fn normalize_space(c: char) -> char {
    if c.is_whitespace() {
        ' '
    } else {
        c
    }
}

/// Traduz a configuração na montagem de batches de avaliação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAssembler {
    pub max_seqlen: usize,
    pub batch_size: usize,
}

impl BatchAssembler {
    pub fn new(max_seqlen: usize, batch_size: usize) -> Self {
        Self {
            max_seqlen: max_seqlen.max(1),
            batch_size: batch_size.max(1),
        }
    }

    pub fn from_config(config: &TokenizeConfig) -> Self {
        Self::new(config.max_seqlen, config.batch_size)
    }

    /// Corta os parágrafos em segmentos, codifica e agrupa em batches.
    pub fn assemble(&self, paragraphs: Vec<Paragraph>, vocab: &Vocab) -> BatchSource {
        let mut segments = Vec::new();
        let mut total_units = 0usize;

        for (p_idx, paragraph) in paragraphs.into_iter().enumerate() {
            if paragraph.is_empty() {
                continue;
            }
            total_units += paragraph.units.len();
            let n_chunks = paragraph.units.len().div_ceil(self.max_seqlen);
            let context: Arc<[Unit]> = paragraph.units.into();
            for (c_idx, window) in context.chunks(self.max_seqlen).enumerate() {
                segments.push(Segment {
                    paragraph: p_idx,
                    offset: c_idx * self.max_seqlen,
                    ids: window.iter().map(|u| vocab.id(&u.text)).collect(),
                    units: window.to_vec(),
                    ends_paragraph: c_idx + 1 == n_chunks,
                    context: Arc::clone(&context),
                });
            }
        }

        let mut batches = Vec::with_capacity(segments.len().div_ceil(self.batch_size));
        let mut current = Batch::default();
        for segment in segments {
            current.segments.push(segment);
            if current.segments.len() == self.batch_size {
                batches.push(std::mem::take(&mut current));
            }
        }
        if !current.segments.is_empty() {
            batches.push(current);
        }

        BatchSource { batches, total_units }
    }
}
