//! # Entrada Pré-tokenizada
//!
//! Quando o usuário já conhece os limites de tokens e sentenças, não há
//! modelo envolvido: basta numerar os tokens e calcular os offsets.
//!
//! A entrada pode vir de duas formas:
//! 1. Texto com tokens separados por espaço e sentenças por quebra de linha.
//! 2. Lista de sentenças, cada uma uma lista de tokens.
//!
//! O texto cru é **reconstruído** unindo todos os tokens com um espaço. O
//! espaçamento original da forma (1) não é preservado; apenas os limites de
//! token valem.
//!
//! ```text
//! "Hello world\nFoo"  →  raw_text "Hello world Foo"
//!                         [Hello(0,5) world(6,11)] [Foo(12,15)]
//! ```

use crate::document::Token;
use crate::input::Pretokenized;

/// Resultado do builder: texto cru reconstruído + sentenças canônicas.
#[derive(Debug, Clone, PartialEq)]
pub struct PretokenizedDocument {
    pub raw_text: String,
    pub sentences: Vec<Vec<Token>>,
}

/// Divide o texto em sentenças (linhas) e tokens (espaços).
///
/// Linhas finais vazias e linhas sem nenhum token são descartadas.
pub fn split_pretokenized_text(text: &str) -> Vec<Vec<String>> {
    text.trim_end_matches('\n')
        .split('\n')
        .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

/// Monta o documento canônico a partir da entrada já segmentada.
pub fn build(input: Pretokenized) -> PretokenizedDocument {
    let sentences = match input {
        Pretokenized::Text(text) => split_pretokenized_text(&text),
        Pretokenized::Sentences(sentences) => sentences,
    };
    build_from_sentences(sentences)
}

/// Numera os tokens e calcula offsets sobre o texto unido por espaços.
///
/// Cada token avança o cursor em `len + 1`; o espaço depois do último token
/// de uma sentença é o separador de sentença. Tokens vazios e sentenças
/// vazias são descartados antes de qualquer cálculo.
pub fn build_from_sentences(sentences: Vec<Vec<String>>) -> PretokenizedDocument {
    let sentences: Vec<Vec<String>> = sentences
        .into_iter()
        .map(|s| s.into_iter().filter(|t| !t.is_empty()).collect::<Vec<_>>())
        .filter(|s| !s.is_empty())
        .collect();

    let mut offset = 0usize;
    let mut document = Vec::with_capacity(sentences.len());
    for sentence in &sentences {
        let mut tokens = Vec::with_capacity(sentence.len());
        for (i, text) in sentence.iter().enumerate() {
            let len = text.chars().count();
            tokens.push(Token::new(i + 1, text.clone(), offset, offset + len));
            offset += len + 1;
        }
        document.push(tokens);
    }

    let raw_text = sentences
        .iter()
        .map(|s| s.join(" "))
        .collect::<Vec<_>>()
        .join(" ");

    PretokenizedDocument { raw_text, sentences: document }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::char_slice;

    fn spans(doc: &PretokenizedDocument) -> Vec<Vec<(String, usize, usize)>> {
        doc.sentences
            .iter()
            .map(|s| s.iter().map(|t| (t.text.clone(), t.start_char, t.end_char)).collect())
            .collect()
    }

    fn owned(sentences: &[&[&str]]) -> Vec<Vec<String>> {
        sentences.iter().map(|s| s.iter().map(|t| t.to_string()).collect()).collect()
    }

    #[test]
    fn test_string_form_scenario() {
        let doc = build(Pretokenized::Text("Hello world\nFoo".into()));
        assert_eq!(doc.raw_text, "Hello world Foo");
        assert_eq!(
            spans(&doc),
            vec![
                vec![("Hello".into(), 0, 5), ("world".into(), 6, 11)],
                vec![("Foo".into(), 12, 15)],
            ]
        );
    }

    #[test]
    fn test_list_form_scenario() {
        let doc = build(Pretokenized::Sentences(owned(&[&["A", "B"], &["C"]])));
        assert_eq!(doc.raw_text, "A B C");
        assert_eq!(
            spans(&doc),
            vec![vec![("A".into(), 0, 1), ("B".into(), 2, 3)], vec![("C".into(), 4, 5)]]
        );
    }

    #[test]
    fn test_ids_start_at_one_per_sentence() {
        let doc = build(Pretokenized::Text("a b c\nd e".into()));
        let ids: Vec<Vec<usize>> = doc.sentences.iter().map(|s| s.iter().map(|t| t.id).collect()).collect();
        assert_eq!(ids, vec![vec![1, 2, 3], vec![1, 2]]);
    }

    #[test]
    fn test_blank_lines_and_extra_spaces_dropped() {
        let doc = build(Pretokenized::Text("  um   dois \n\n   \ntrês\n\n\n".into()));
        assert_eq!(doc.raw_text, "um dois três");
        assert_eq!(doc.sentences.len(), 2);
        assert_eq!(doc.sentences[1][0].text, "três");
        assert_eq!(doc.sentences[1][0].start_char, 8);
    }

    #[test]
    fn test_empty_sentence_records_dropped() {
        let doc = build(Pretokenized::Sentences(owned(&[&[], &["x"], &[""], &["y", ""]])));
        assert_eq!(doc.raw_text, "x y");
        assert_eq!(spans(&doc), vec![vec![("x".into(), 0, 1)], vec![("y".into(), 2, 3)]]);
    }

    #[test]
    fn test_empty_input() {
        let doc = build(Pretokenized::Text(String::new()));
        assert_eq!(doc.raw_text, "");
        assert!(doc.sentences.is_empty());
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let doc = build(Pretokenized::Text("São Paulo\né".into()));
        for token in doc.sentences.iter().flatten() {
            assert_eq!(char_slice(&doc.raw_text, token.start_char, token.end_char), Some(token.text.as_str()));
        }
        assert_eq!(doc.sentences[1][0].start_char, 10);
    }

    #[test]
    fn test_no_confidence_without_model() {
        let doc = build(Pretokenized::Text("sem modelo".into()));
        assert!(doc.sentences.iter().flatten().all(|t| t.confidence.is_none()));
    }
}
