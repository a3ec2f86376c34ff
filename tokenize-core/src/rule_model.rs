//! # Modelo de Segmentação por Regras
//!
//! Um [`SegmentationModel`] determinístico, sem pesos, que rotula unidades com
//! as mesmas heurísticas de um tokenizador clássico:
//!
//! - espaço em branco separa tokens;
//! - pontuação vira token próprio;
//! - `.`, `!`, `?` e `…` fecham a sentença;
//! - abreviações conhecidas ("Dr.", "Sra.", "etc.") mantêm o ponto e não
//!   fecham a sentença;
//! - números com separador ("1.234", "2,5") e palavras com hífen
//!   ("curou-se") ficam num token só.
//!
//! Serve para rodar o estágio de ponta a ponta sem um modelo neural (servidor
//! web, testes). As probabilidades são fixas por regra.
//!
//! Os rótulos são calculados sobre o parágrafo inteiro ([`Segment::context`])
//! e recortados para cada segmento, então o resultado não depende de onde
//! `max_seqlen` corta o texto.

use std::collections::HashSet;

use crate::batch::{Batch, Segment, Unit};
use crate::error::ExternalError;
use crate::model::{BatchPrediction, BoundaryLabel, SegmentationModel, UnitPrediction};

/// Abreviações que não devem ter o ponto tratado como fim de sentença
const ABBREVIATIONS: &[&str] = &[
    "Dr", "Dra", "Sr", "Sra", "Prof", "Profa", "Gov", "Dep", "Sen", "Min",
    "Gen", "Cap", "Sgt", "Cel", "Brig", "Adm", "Des", "Pres", "Eng", "Arq",
    "km", "cm", "mm", "kg", "mg", "ml", "dl", "ha", "etc", "vol", "núm",
    "art", "pág", "pag", "cap", "tel", "fax", "av", "pg", "ibid", "op",
    "Mr", "Mrs", "Ms", "St", "vs", "Jr", "Inc", "Ltd", "Co",
];

const SENTENCE_TERMINALS: &[&str] = &[".", "!", "?", "…"];

// Probabilidades por regra
const CONF_SPACE: f64 = 0.99;
const CONF_SPACE_BOUNDARY: f64 = 0.98;
const CONF_INSIDE: f64 = 0.95;
const CONF_PUNCT: f64 = 0.9;
const CONF_SENTENCE: f64 = 0.85;
const CONF_ABBREV: f64 = 0.7;

/// Modelo por regras, configurável com uma lista de abreviações.
#[derive(Debug, Clone)]
pub struct RuleBasedModel {
    abbreviations: HashSet<String>,
}

impl RuleBasedModel {
    /// Modelo com a lista padrão de abreviações (PT-BR e algumas do inglês).
    pub fn new() -> Self {
        Self::with_abbreviations(ABBREVIATIONS.iter().copied())
    }

    pub fn with_abbreviations<I, S>(abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            abbreviations: abbreviations.into_iter().map(Into::into).collect(),
        }
    }

    fn is_abbreviation(&self, word: &str) -> bool {
        !word.is_empty() && self.abbreviations.contains(word)
    }

    /// Rotula um parágrafo inteiro, unidade por unidade.
    pub fn label_paragraph(&self, units: &[Unit]) -> Vec<UnitPrediction> {
        // Texto do token em construção (sem espaços), incluindo a unidade atual
        let mut word = String::new();
        let mut out = Vec::with_capacity(units.len());

        for (i, unit) in units.iter().enumerate() {
            let core = unit.text.trim();
            let next = units.get(i + 1).map(|u| u.text.as_str());
            let after_next = units.get(i + 2).map(|u| u.text.as_str());

            let (label, prob) = if core.is_empty() {
                (BoundaryLabel::None, CONF_SPACE)
            } else {
                word.push_str(core);
                if is_word_piece(core) {
                    self.label_word_piece(&word, next, after_next)
                } else {
                    let before = &word[..word.len() - core.len()];
                    self.label_punct(before, core, next)
                }
            };

            if label.ends_token() {
                word.clear();
            }
            out.push(UnitPrediction::new(label, prob));
        }
        out
    }

    fn label_word_piece(&self, word: &str, next: Option<&str>, after_next: Option<&str>) -> (BoundaryLabel, f64) {
        // fim do parágrafo
        let Some(next) = next else {
            return (BoundaryLabel::TokenEnd, CONF_SPACE_BOUNDARY);
        };

        if starts_with_space(next) {
            (BoundaryLabel::TokenEnd, CONF_SPACE_BOUNDARY)
        } else if is_word_piece(next) {
            (BoundaryLabel::None, CONF_INSIDE)
        } else if next == "-" && after_next.is_some_and(starts_alphanumeric) {
            (BoundaryLabel::None, CONF_INSIDE)
        } else if next == "." && self.is_abbreviation(word) {
            (BoundaryLabel::None, CONF_ABBREV)
        } else if (next == "." || next == ",") && is_numeric(word) && after_next.is_some_and(starts_digit) {
            (BoundaryLabel::None, CONF_INSIDE)
        } else {
            (BoundaryLabel::TokenEnd, CONF_PUNCT)
        }
    }

    /// `before` é o token em construção antes desta pontuação.
    fn label_punct(&self, before: &str, core: &str, next: Option<&str>) -> (BoundaryLabel, f64) {
        let next_tight = next.filter(|n| !starts_with_space(n));

        if core == "-" && !before.is_empty() && next_tight.is_some_and(starts_alphanumeric) {
            return (BoundaryLabel::None, CONF_INSIDE);
        }
        if (core == "." || core == ",")
            && before.chars().last().is_some_and(|c| c.is_ascii_digit())
            && next_tight.is_some_and(starts_digit)
        {
            return (BoundaryLabel::None, CONF_INSIDE);
        }
        if core == "." && self.is_abbreviation(before) {
            return (BoundaryLabel::TokenEnd, CONF_ABBREV);
        }
        if SENTENCE_TERMINALS.contains(&core) {
            // "..." e "?!" ficam juntos
            if next_tight.is_some_and(|n| SENTENCE_TERMINALS.contains(&n)) {
                return (BoundaryLabel::None, CONF_PUNCT);
            }
            return (BoundaryLabel::SentenceEnd, CONF_SENTENCE);
        }
        (BoundaryLabel::TokenEnd, CONF_PUNCT)
    }
}

impl Default for RuleBasedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationModel for RuleBasedModel {
    fn predict(&self, batch: &Batch) -> Result<BatchPrediction, ExternalError> {
        // segmentos consecutivos do mesmo parágrafo reaproveitam os rótulos
        let mut cached: Option<(usize, Vec<UnitPrediction>)> = None;
        let mut out = Vec::with_capacity(batch.segments.len());

        for segment in &batch.segments {
            let labels = match cached.take() {
                Some((paragraph, labels)) if paragraph == segment.paragraph => labels,
                _ => self.label_paragraph(&segment.context),
            };
            out.push(slice_segment(&labels, segment)?);
            cached = Some((segment.paragraph, labels));
        }
        Ok(out)
    }
}

fn slice_segment(labels: &[UnitPrediction], segment: &Segment) -> Result<Vec<UnitPrediction>, ExternalError> {
    labels
        .get(segment.offset..segment.offset + segment.units.len())
        .map(<[UnitPrediction]>::to_vec)
        .ok_or_else(|| {
            format!(
                "segmento fora do parágrafo: offset {} + {} unidades, parágrafo com {}",
                segment.offset,
                segment.units.len(),
                labels.len()
            )
            .into()
        })
}

fn is_word_piece(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '\'' || c == '\u{2019}')
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

fn starts_with_space(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_whitespace)
}

fn starts_alphanumeric(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_alphanumeric)
}

fn starts_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}
