//! Propriedades do documento canônico em todos os caminhos do estágio.
//!
//! Offsets precisam apontar para o texto cru, ids precisam ser contíguos e
//! `no_ssplit` precisa produzir uma única sentença, para qualquer entrada.

use std::sync::Arc;

use proptest::prelude::*;
use tokenize_core::{
    Document, RuleBasedModel, TextInput, TokenizeConfig, TokenizeProcessor, UnicodeTokenizer,
};

fn pretokenized() -> TokenizeProcessor {
    let config = TokenizeConfig { pretokenized: true, ..Default::default() };
    TokenizeProcessor::builder(config).build().unwrap()
}

fn model(config: TokenizeConfig) -> TokenizeProcessor {
    TokenizeProcessor::builder(config)
        .model(Arc::new(RuleBasedModel::new()))
        .build()
        .unwrap()
}

fn triples(doc: &Document) -> Vec<(String, usize, usize)> {
    doc.tokens().map(|t| (t.text.clone(), t.start_char, t.end_char)).collect()
}

fn assert_dereferenceable(doc: &Document) {
    for token in doc.tokens() {
        assert_eq!(doc.token_text(token), Some(token.text.as_str()), "token {:?}", token);
    }
}

fn token_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9çãéíóú.,!?'-]{1,8}"
}

fn sentences_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(token_strategy(), 0..6), 0..6)
}

fn free_text_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Zãéç0-9 .,!?\n\t-]{0,120}"
}

proptest! {
    #[test]
    fn pretokenized_offsets_dereference(sentences in sentences_strategy()) {
        let doc = pretokenized().process(TextInput::Sentences(sentences)).unwrap();
        assert_dereferenceable(&doc);
        prop_assert!(doc.check_invariants().is_ok());
    }

    #[test]
    fn pretokenized_ids_are_contiguous(sentences in sentences_strategy()) {
        let doc = pretokenized().process(TextInput::Sentences(sentences)).unwrap();
        for sentence in &doc.sentences {
            let ids: Vec<usize> = sentence.tokens.iter().map(|t| t.id).collect();
            prop_assert_eq!(ids, (1..=sentence.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn pretokenized_string_and_list_forms_agree(sentences in sentences_strategy()) {
        let text = sentences
            .iter()
            .map(|s| s.join(" "))
            .collect::<Vec<_>>()
            .join("\n");
        let from_text = pretokenized().process(TextInput::Raw(text)).unwrap();
        let from_list = pretokenized().process(TextInput::Sentences(sentences)).unwrap();
        prop_assert_eq!(from_text, from_list);
    }

    #[test]
    fn pretokenized_is_idempotent_on_raw_text(sentences in sentences_strategy()) {
        let processor = pretokenized();
        let first = processor.process(TextInput::Sentences(sentences)).unwrap();
        let second = processor.process(TextInput::Raw(first.raw_text.clone())).unwrap();
        prop_assert_eq!(triples(&first), triples(&second));
        prop_assert_eq!(first.raw_text, second.raw_text);
    }

    #[test]
    fn model_documents_hold_invariants(text in free_text_strategy(), max_seqlen in 1usize..12) {
        let config = TokenizeConfig { max_seqlen, batch_size: 3, ..Default::default() };
        let doc = model(config).process(TextInput::Raw(text.clone())).unwrap();
        prop_assert!(doc.check_invariants().is_ok());
        prop_assert_eq!(&doc.raw_text, &text);
        assert_dereferenceable(&doc);
        prop_assert!(doc.tokens().all(|t| t.confidence.is_some()));
    }

    #[test]
    fn no_ssplit_yields_exactly_one_sentence(text in free_text_strategy()) {
        let config = TokenizeConfig { no_ssplit: true, ..Default::default() };
        let doc = model(config).process(TextInput::Raw(text.clone())).unwrap();
        let expected = if text.trim().is_empty() { 0 } else { 1 };
        prop_assert_eq!(doc.sentences.len(), expected);
    }

    #[test]
    fn external_documents_hold_invariants(text in free_text_strategy()) {
        let config = TokenizeConfig { external_tokenizer: true, ..Default::default() };
        let processor = TokenizeProcessor::builder(config)
            .external(Arc::new(UnicodeTokenizer))
            .build()
            .unwrap();
        let doc = processor.process(TextInput::Raw(text)).unwrap();
        prop_assert!(doc.check_invariants().is_ok());
        assert_dereferenceable(&doc);
    }
}
