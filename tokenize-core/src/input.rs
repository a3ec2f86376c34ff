//! # Classificação da Entrada
//!
//! A entrada pode chegar em três formas e a configuração decide qual
//! estratégia atende a chamada. A escolha é feita **uma vez**, aqui, e o
//! resto do processamento não volta a inspecionar o tipo da entrada.

use serde::{Deserialize, Serialize};

use crate::config::TokenizeConfig;
use crate::error::{Result, TokenizeError};

/// Formas de entrada aceitas pelo estágio.
///
/// Em JSON: uma string, uma lista de strings ou uma lista de listas de strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    /// Texto cru (ou, com `pretokenized`, tokens por espaço e sentenças por quebra de linha).
    Raw(String),
    /// Trechos de texto cru, unidos por linha em branco antes do modelo.
    Spans(Vec<String>),
    /// Sentenças já tokenizadas.
    Sentences(Vec<Vec<String>>),
}

impl TextInput {
    /// Nome curto da forma (para mensagens de erro e logs).
    pub fn kind(&self) -> &'static str {
        match self {
            TextInput::Raw(_) => "raw",
            TextInput::Spans(_) => "spans",
            TextInput::Sentences(_) => "sentences",
        }
    }
}

impl From<&str> for TextInput {
    fn from(text: &str) -> Self {
        TextInput::Raw(text.to_string())
    }
}

impl From<String> for TextInput {
    fn from(text: String) -> Self {
        TextInput::Raw(text)
    }
}

impl From<Vec<Vec<String>>> for TextInput {
    fn from(sentences: Vec<Vec<String>>) -> Self {
        TextInput::Sentences(sentences)
    }
}

/// Entrada já segmentada, nas duas formas aceitas.
#[derive(Debug, Clone, PartialEq)]
pub enum Pretokenized {
    /// Tokens separados por espaço, sentenças por `\n`.
    Text(String),
    /// Lista de sentenças, cada uma uma lista de tokens.
    Sentences(Vec<Vec<String>>),
}

/// Estratégia escolhida para uma chamada, já com a entrada resolvida.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Sem modelo: os limites vêm da própria entrada.
    Pretokenized(Pretokenized),
    /// Delegação completa ao tokenizador externo.
    ExternalTokenizer(String),
    /// Modelo de segmentação. O texto já vem com os trechos unidos.
    ModelDriven(String),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Pretokenized(_) => "Pretokenized",
            Strategy::ExternalTokenizer(_) => "ExternalTokenizer",
            Strategy::ModelDriven(_) => "ModelDriven",
        }
    }
}

/// Separador de parágrafos usado ao unir trechos de texto.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Escolhe a estratégia a partir da configuração e da forma da entrada.
///
/// Precedência: `pretokenized` > `with_spacy` > modelo. Se nem `pretokenized`
/// nem `no_ssplit` estiverem ativos, a entrada tem que ser texto cru.
pub fn classify(config: &TokenizeConfig, input: TextInput) -> Result<Strategy> {
    let found = input.kind();
    if !(config.pretokenized || config.no_ssplit) && !matches!(input, TextInput::Raw(_)) {
        return Err(TokenizeError::InvalidInputKind {
            strategy: if config.external_tokenizer { "ExternalTokenizer" } else { "ModelDriven" },
            found,
        });
    }

    if config.pretokenized {
        return match input {
            TextInput::Raw(text) => Ok(Strategy::Pretokenized(Pretokenized::Text(text))),
            TextInput::Sentences(sentences) => Ok(Strategy::Pretokenized(Pretokenized::Sentences(sentences))),
            // `[]` chega como lista de trechos; é só um documento vazio
            TextInput::Spans(spans) if spans.is_empty() => {
                Ok(Strategy::Pretokenized(Pretokenized::Sentences(Vec::new())))
            }
            TextInput::Spans(_) => Err(TokenizeError::InvalidInputKind { strategy: "Pretokenized", found }),
        };
    }

    if config.external_tokenizer {
        return match input {
            TextInput::Raw(text) => Ok(Strategy::ExternalTokenizer(text)),
            _ => Err(TokenizeError::InvalidInputKind { strategy: "ExternalTokenizer", found }),
        };
    }

    match input {
        TextInput::Raw(text) => Ok(Strategy::ModelDriven(text)),
        TextInput::Spans(spans) => Ok(Strategy::ModelDriven(spans.join(PARAGRAPH_SEPARATOR))),
        TextInput::Sentences(_) => Err(TokenizeError::InvalidInputKind { strategy: "ModelDriven", found }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pretokenized: bool, external: bool, no_ssplit: bool) -> TokenizeConfig {
        TokenizeConfig {
            pretokenized,
            external_tokenizer: external,
            no_ssplit,
            ..Default::default()
        }
    }

    fn sentences() -> TextInput {
        TextInput::Sentences(vec![vec!["A".into(), "B".into()], vec!["C".into()]])
    }

    #[test]
    fn test_untagged_deserialization() {
        let raw: TextInput = serde_json::from_str(r#""oi mundo""#).unwrap();
        assert_eq!(raw, TextInput::Raw("oi mundo".into()));
        let spans: TextInput = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(spans.kind(), "spans");
        let sents: TextInput = serde_json::from_str(r#"[["A","B"],["C"]]"#).unwrap();
        assert_eq!(sents, sentences());
    }

    #[test]
    fn test_pretokenized_takes_precedence() {
        let strategy = classify(&config(true, true, false), "A B".into()).unwrap();
        assert_eq!(strategy, Strategy::Pretokenized(Pretokenized::Text("A B".into())));
        let strategy = classify(&config(true, false, false), sentences()).unwrap();
        assert_eq!(strategy.name(), "Pretokenized");
    }

    #[test]
    fn test_external_tokenizer_selected() {
        let strategy = classify(&config(false, true, false), "texto".into()).unwrap();
        assert_eq!(strategy, Strategy::ExternalTokenizer("texto".into()));
    }

    #[test]
    fn test_non_string_without_flags_fails() {
        let err = classify(&config(false, false, false), sentences()).unwrap_err();
        assert!(matches!(err, TokenizeError::InvalidInputKind { strategy: "ModelDriven", .. }));
        let spans = TextInput::Spans(vec!["a".into()]);
        assert!(classify(&config(false, true, false), spans).is_err());
    }

    #[test]
    fn test_spans_joined_with_blank_line_under_no_ssplit() {
        let spans = TextInput::Spans(vec!["Primeiro.".into(), "Segundo.".into()]);
        let strategy = classify(&config(false, false, true), spans).unwrap();
        assert_eq!(strategy, Strategy::ModelDriven("Primeiro.\n\nSegundo.".into()));
    }

    #[test]
    fn test_sentences_rejected_on_model_path() {
        let err = classify(&config(false, false, true), sentences()).unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_empty_list_is_empty_pretokenized_document() {
        let strategy = classify(&config(true, false, false), TextInput::Spans(vec![])).unwrap();
        assert_eq!(strategy, Strategy::Pretokenized(Pretokenized::Sentences(vec![])));
    }
}
