//! # Tokenizador Externo
//!
//! Com `with_spacy`, o estágio não tokeniza nada: entrega o texto a um
//! tokenizador de propósito geral e devolve **exatamente** o documento que ele
//! produzir, sem nenhuma transformação.
//!
//! [`UnicodeTokenizer`] é a implementação de referência, baseada nas regras de
//! segmentação de palavras e sentenças do Unicode (UAX #29).

use unicode_segmentation::UnicodeSegmentation;

use crate::document::{Document, Token};
use crate::error::ExternalError;

/// Tokenizador de propósito geral que já devolve o documento final.
pub trait ExternalTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Document, ExternalError>;
}

impl<T: ExternalTokenizer + ?Sized> ExternalTokenizer for std::sync::Arc<T> {
    fn tokenize(&self, text: &str) -> Result<Document, ExternalError> {
        (**self).tokenize(text)
    }
}

/// Tokenizador por fronteiras Unicode: sentenças por UAX #29, palavras por UAX #29,
/// descartando os trechos só de espaço.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeTokenizer;

impl ExternalTokenizer for UnicodeTokenizer {
    fn tokenize(&self, text: &str) -> Result<Document, ExternalError> {
        let mut cursor = CharCursor::default();
        let mut sentences = Vec::new();

        for (sent_start, sentence) in text.split_sentence_bound_indices() {
            let mut tokens = Vec::new();
            for (word_start, word) in sentence.split_word_bound_indices() {
                if word.trim().is_empty() {
                    continue;
                }
                let start = cursor.advance_to(text, sent_start + word_start);
                let len = word.chars().count();
                tokens.push(Token::new(tokens.len() + 1, word, start, start + len));
            }
            if !tokens.is_empty() {
                sentences.push(tokens);
            }
        }

        Ok(Document::new(sentences, text, None)?)
    }
}

/// Converte offsets de byte crescentes em offsets de caractere.
#[derive(Debug, Default)]
struct CharCursor {
    byte: usize,
    chars: usize,
}

impl CharCursor {
    fn advance_to(&mut self, text: &str, byte: usize) -> usize {
        self.chars += text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}
