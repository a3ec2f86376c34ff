//! # Montagem do Documento a partir das Predições
//!
//! Percorre todas as unidades na ordem do texto, acumulando caracteres num
//! token pendente. Cada rótulo de fim de token fecha o pendente (sem os
//! espaços das bordas); fim de sentença fecha também a sentença. O fim de um
//! parágrafo fecha o token e a sentença abertos.
//!
//! Com `no_ssplit`, nenhum sinal de sentença é respeitado: nem do modelo, nem
//! de parágrafo. A entrada inteira vira uma única sentença.
//!
//! A probabilidade de um token é a da unidade que o fechou.

use tracing::trace;

use crate::batch::{Batch, BatchSource, Unit};
use crate::document::Token;
use crate::error::{Result, TokenizeError};
use crate::model::{BoundaryLabel, SegmentationModel, UnitPrediction};

/// Sentenças canônicas e probabilidades paralelas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assembled {
    pub sentences: Vec<Vec<Token>>,
    pub probabilities: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PredictionAssembler {
    pub no_ssplit: bool,
}

impl PredictionAssembler {
    pub fn new(no_ssplit: bool) -> Self {
        Self { no_ssplit }
    }

    /// Chama o modelo batch a batch e monta as sentenças.
    ///
    /// Uma falha do modelo interrompe tudo: não há documento parcial.
    pub fn assemble(&self, model: &dyn SegmentationModel, batches: BatchSource) -> Result<Assembled> {
        let mut state = AssemblyState::new(self.no_ssplit);

        for (b_idx, batch) in batches.into_iter().enumerate() {
            let prediction = model.predict(&batch).map_err(TokenizeError::ExternalDependency)?;
            check_shape(b_idx, &batch, &prediction)?;
            trace!(batch = b_idx, units = batch.num_units(), "batch rotulado");

            for (segment, preds) in batch.segments.iter().zip(&prediction) {
                for (unit, pred) in segment.units.iter().zip(preds) {
                    state.push_unit(unit, decode(b_idx, pred)?, pred.prob);
                }
                if segment.ends_paragraph {
                    state.end_paragraph();
                }
            }
        }

        Ok(state.finish())
    }
}

fn check_shape(b_idx: usize, batch: &Batch, prediction: &[Vec<UnitPrediction>]) -> Result<()> {
    if batch.num_units() > 0 && prediction.is_empty() {
        return Err(inconsistent(format!("batch {b_idx}: nenhuma predição para entrada não vazia")));
    }
    if prediction.len() != batch.segments.len() {
        return Err(inconsistent(format!(
            "batch {b_idx}: {} segmentos enviados, {} devolvidos",
            batch.segments.len(),
            prediction.len()
        )));
    }
    for (s_idx, (segment, preds)) in batch.segments.iter().zip(prediction).enumerate() {
        if segment.units.len() != preds.len() {
            return Err(inconsistent(format!(
                "batch {b_idx}, segmento {s_idx}: {} unidades, {} rótulos",
                segment.units.len(),
                preds.len()
            )));
        }
    }
    Ok(())
}

fn decode(b_idx: usize, pred: &UnitPrediction) -> Result<BoundaryLabel> {
    if !(0.0..=1.0).contains(&pred.prob) {
        return Err(inconsistent(format!("batch {b_idx}: probabilidade {} fora de [0, 1]", pred.prob)));
    }
    BoundaryLabel::from_index(pred.label)
        .ok_or_else(|| inconsistent(format!("batch {b_idx}: rótulo desconhecido {}", pred.label)))
}

fn inconsistent(reason: String) -> TokenizeError {
    TokenizeError::InconsistentPrediction { reason }
}

/// Estado da varredura: token pendente, sentença aberta e documento.
struct AssemblyState {
    no_ssplit: bool,
    pending: Vec<(usize, char)>,
    last_prob: f64,
    sentence: Vec<Token>,
    sentence_probs: Vec<f64>,
    out: Assembled,
}

impl AssemblyState {
    fn new(no_ssplit: bool) -> Self {
        Self {
            no_ssplit,
            pending: Vec::new(),
            last_prob: 1.0,
            sentence: Vec::new(),
            sentence_probs: Vec::new(),
            out: Assembled::default(),
        }
    }

    fn push_unit(&mut self, unit: &Unit, label: BoundaryLabel, prob: f64) {
        let label = if self.no_ssplit { label.without_sentence_end() } else { label };
        self.pending
            .extend(unit.text.chars().enumerate().map(|(i, c)| (unit.start_char + i, c)));
        self.last_prob = prob;

        if label.ends_token() {
            self.close_token(label.is_multi_word());
        }
        if label.ends_sentence() {
            self.close_sentence();
        }
    }

    fn end_paragraph(&mut self) {
        self.close_token(false);
        if !self.no_ssplit {
            self.close_sentence();
        }
    }

    fn close_token(&mut self, multi_word: bool) {
        let pending = std::mem::take(&mut self.pending);
        let Some(first) = pending.iter().position(|(_, c)| !c.is_whitespace()) else {
            return;
        };
        let last = pending.iter().rposition(|(_, c)| !c.is_whitespace()).unwrap_or(first);
        let chars = &pending[first..=last];
        let text: String = chars.iter().map(|(_, c)| *c).collect();

        let mut token = Token::new(self.sentence.len() + 1, text, chars[0].0, chars[chars.len() - 1].0 + 1);
        token.multi_word = multi_word;
        self.sentence.push(token);
        self.sentence_probs.push(self.last_prob);
    }

    fn close_sentence(&mut self) {
        if self.sentence.is_empty() {
            return;
        }
        self.out.sentences.push(std::mem::take(&mut self.sentence));
        self.out.probabilities.push(std::mem::take(&mut self.sentence_probs));
    }

    fn finish(mut self) -> Assembled {
        self.close_token(false);
        self.close_sentence();
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{char_paragraphs, BatchAssembler};
    use crate::error::ExternalError;
    use crate::model::BatchPrediction;
    use crate::vocab::Vocab;

    /// `.` fecha sentença; unidade antes de espaço ou `.` fecha token.
    struct ScriptedModel;

    impl SegmentationModel for ScriptedModel {
        fn predict(&self, batch: &Batch) -> std::result::Result<BatchPrediction, ExternalError> {
            Ok(batch
                .segments
                .iter()
                .map(|seg| {
                    seg.units
                        .iter()
                        .enumerate()
                        .map(|(i, u)| {
                            let next_breaks = seg
                                .units
                                .get(i + 1)
                                .map(|n| n.text == " " || n.text == ".")
                                .unwrap_or(false);
                            let label = if u.text == "." {
                                BoundaryLabel::SentenceEnd
                            } else if next_breaks && u.text != " " {
                                BoundaryLabel::TokenEnd
                            } else {
                                BoundaryLabel::None
                            };
                            UnitPrediction::new(label, 0.75)
                        })
                        .collect()
                })
                .collect())
        }
    }

    struct FailingModel;

    impl SegmentationModel for FailingModel {
        fn predict(&self, _batch: &Batch) -> std::result::Result<BatchPrediction, ExternalError> {
            Err("sem memória".into())
        }
    }

    struct EmptyModel;

    impl SegmentationModel for EmptyModel {
        fn predict(&self, _batch: &Batch) -> std::result::Result<BatchPrediction, ExternalError> {
            Ok(Vec::new())
        }
    }

    fn source(text: &str, max_seqlen: usize) -> BatchSource {
        BatchAssembler::new(max_seqlen, 2).assemble(char_paragraphs(text), &Vocab::new())
    }

    fn texts(out: &Assembled) -> Vec<Vec<&str>> {
        out.sentences.iter().map(|s| s.iter().map(|t| t.text.as_str()).collect()).collect()
    }

    #[test]
    fn test_sentences_and_offsets() {
        let text = "Oi mundo. Tudo bem";
        let out = PredictionAssembler::new(false).assemble(&ScriptedModel, source(text, 1000)).unwrap();
        assert_eq!(texts(&out), vec![vec!["Oi", "mundo", "."], vec!["Tudo", "bem"]]);
        let mundo = &out.sentences[0][1];
        assert_eq!((mundo.start_char, mundo.end_char), (3, 8));
        let tudo = &out.sentences[1][0];
        assert_eq!((tudo.id, tudo.start_char, tudo.end_char), (1, 10, 14));
        assert_eq!(out.probabilities, vec![vec![0.75; 3], vec![0.75; 2]]);
    }

    #[test]
    fn test_paragraph_closes_sentence() {
        let out = PredictionAssembler::new(false).assemble(&ScriptedModel, source("um\n\ndois", 1000)).unwrap();
        assert_eq!(texts(&out), vec![vec!["um"], vec!["dois"]]);
        assert_eq!(out.sentences[1][0].start_char, 4);
    }

    #[test]
    fn test_no_ssplit_yields_one_sentence() {
        let out = PredictionAssembler::new(true)
            .assemble(&ScriptedModel, source("A. B.\n\nC. D", 1000))
            .unwrap();
        assert_eq!(out.sentences.len(), 1);
        let ids: Vec<usize> = out.sentences[0].iter().map(|t| t.id).collect();
        assert_eq!(ids, (1..=ids.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_token_continues_across_segments() {
        // max_seqlen 3 corta "palavra" em vários segmentos
        let out = PredictionAssembler::new(false).assemble(&ScriptedModel, source("palavra", 3)).unwrap();
        assert_eq!(texts(&out), vec![vec!["palavra"]]);
    }

    #[test]
    fn test_model_error_propagates_unchanged() {
        let err = PredictionAssembler::new(false).assemble(&FailingModel, source("abc", 10)).unwrap_err();
        assert!(matches!(err, TokenizeError::ExternalDependency(_)));
        assert_eq!(err.to_string(), "sem memória");
    }

    #[test]
    fn test_empty_prediction_is_inconsistent() {
        let err = PredictionAssembler::new(false).assemble(&EmptyModel, source("abc", 10)).unwrap_err();
        assert!(matches!(err, TokenizeError::InconsistentPrediction { .. }));
    }

    #[test]
    fn test_empty_input_never_calls_model() {
        let out = PredictionAssembler::new(true).assemble(&FailingModel, source("", 10)).unwrap();
        assert!(out.sentences.is_empty());
    }

    #[test]
    fn test_multi_word_flag_and_bad_label() {
        struct Mwt(u8);
        impl SegmentationModel for Mwt {
            fn predict(&self, batch: &Batch) -> std::result::Result<BatchPrediction, ExternalError> {
                Ok(batch
                    .segments
                    .iter()
                    .map(|s| s.units.iter().map(|_| UnitPrediction { label: self.0, prob: 0.5 }).collect())
                    .collect())
            }
        }
        let out = PredictionAssembler::new(false).assemble(&Mwt(3), source("do", 10)).unwrap();
        assert!(out.sentences[0].iter().all(|t| t.multi_word));
        let err = PredictionAssembler::new(false).assemble(&Mwt(9), source("do", 10)).unwrap_err();
        assert!(err.to_string().contains("rótulo desconhecido"));
    }
}
