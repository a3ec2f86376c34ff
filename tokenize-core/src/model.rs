//! # Interface do Modelo de Segmentação
//!
//! O modelo é uma caixa-preta: recebe um [`Batch`] codificado e devolve, para
//! cada unidade de cada segmento, um rótulo de fronteira e a probabilidade
//! desse rótulo. Carregamento de pesos, dispositivo e arquitetura ficam fora
//! deste crate.
//!
//! ## Rótulos
//!
//! | valor | rótulo              | significado                                |
//! |-------|---------------------|--------------------------------------------|
//! | 0     | `None`              | a unidade continua o token atual           |
//! | 1     | `TokenEnd`          | a unidade fecha um token                   |
//! | 2     | `SentenceEnd`       | fecha um token e a sentença                |
//! | 3     | `MultiWordTokenEnd` | fecha um token multi-palavra               |
//! | 4     | `MultiWordSentenceEnd` | fecha um token multi-palavra e a sentença |

use serde::{Deserialize, Serialize};

use crate::batch::Batch;
use crate::error::ExternalError;

/// Rótulo de fronteira previsto para uma unidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryLabel {
    None,
    TokenEnd,
    SentenceEnd,
    MultiWordTokenEnd,
    MultiWordSentenceEnd,
}

impl BoundaryLabel {
    /// Converte o valor numérico do modelo (0..=4).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(BoundaryLabel::None),
            1 => Some(BoundaryLabel::TokenEnd),
            2 => Some(BoundaryLabel::SentenceEnd),
            3 => Some(BoundaryLabel::MultiWordTokenEnd),
            4 => Some(BoundaryLabel::MultiWordSentenceEnd),
            _ => None,
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            BoundaryLabel::None => 0,
            BoundaryLabel::TokenEnd => 1,
            BoundaryLabel::SentenceEnd => 2,
            BoundaryLabel::MultiWordTokenEnd => 3,
            BoundaryLabel::MultiWordSentenceEnd => 4,
        }
    }

    pub fn ends_token(&self) -> bool {
        !matches!(self, BoundaryLabel::None)
    }

    pub fn ends_sentence(&self) -> bool {
        matches!(self, BoundaryLabel::SentenceEnd | BoundaryLabel::MultiWordSentenceEnd)
    }

    pub fn is_multi_word(&self) -> bool {
        matches!(self, BoundaryLabel::MultiWordTokenEnd | BoundaryLabel::MultiWordSentenceEnd)
    }

    /// Mesmo rótulo sem o fim de sentença (usado com `no_ssplit`).
    pub fn without_sentence_end(self) -> Self {
        match self {
            BoundaryLabel::SentenceEnd => BoundaryLabel::TokenEnd,
            BoundaryLabel::MultiWordSentenceEnd => BoundaryLabel::MultiWordTokenEnd,
            other => other,
        }
    }
}

/// Predição para uma unidade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPrediction {
    /// Valor numérico do rótulo (0..=4). Valores fora disso são inconsistência.
    pub label: u8,
    /// Probabilidade do rótulo escolhido, em [0, 1].
    pub prob: f64,
}

impl UnitPrediction {
    pub fn new(label: BoundaryLabel, prob: f64) -> Self {
        Self { label: label.index(), prob }
    }
}

/// Predições de um batch: uma lista por segmento, uma entrada por unidade.
pub type BatchPrediction = Vec<Vec<UnitPrediction>>;

/// Modelo de segmentação de tokens e sentenças.
///
/// Implementações precisam ser `Send + Sync`: o mesmo modelo é lido por
/// várias chamadas concorrentes, cada uma com seus próprios batches.
pub trait SegmentationModel: Send + Sync {
    /// Rotula todas as unidades do batch.
    fn predict(&self, batch: &Batch) -> Result<BatchPrediction, ExternalError>;
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for std::sync::Arc<M> {
    fn predict(&self, batch: &Batch) -> Result<BatchPrediction, ExternalError> {
        (**self).predict(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_index_roundtrip() {
        for i in 0..=4u8 {
            assert_eq!(BoundaryLabel::from_index(i).map(|l| l.index()), Some(i));
        }
        assert_eq!(BoundaryLabel::from_index(5), None);
    }

    #[test]
    fn test_without_sentence_end() {
        assert_eq!(BoundaryLabel::SentenceEnd.without_sentence_end(), BoundaryLabel::TokenEnd);
        assert_eq!(
            BoundaryLabel::MultiWordSentenceEnd.without_sentence_end(),
            BoundaryLabel::MultiWordTokenEnd
        );
        assert_eq!(BoundaryLabel::None.without_sentence_end(), BoundaryLabel::None);
    }

    #[test]
    fn test_label_predicates() {
        assert!(!BoundaryLabel::None.ends_token());
        assert!(BoundaryLabel::MultiWordTokenEnd.is_multi_word());
        assert!(BoundaryLabel::SentenceEnd.ends_sentence());
        assert!(!BoundaryLabel::TokenEnd.ends_sentence());
    }
}
