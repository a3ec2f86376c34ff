//! # Processador de Tokenização: Orquestrador
//!
//! Conecta todos os módulos do estágio:
//!
//! ```text
//!                ┌─► Pretokenized ─► pretokenized::build ──────────────┐
//! TextInput ─► classify ─► ExternalTokenizer ─► tokenize (retorna direto)│
//!                └─► ModelDriven ─► chunking? ─► batches ─► modelo ─► prediction ─► Document::new
//! ```
//!
//! O processador é montado uma vez por configuração e pode ser chamado de
//! várias threads: modelo, vocabulário e tokenizador externo são só leitura, e
//! cada chamada de [`TokenizeProcessor::process`] monta seus próprios batches.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use tokenize_core::{RuleBasedModel, TextInput, TokenizeConfig, TokenizeProcessor};
//!
//! let processor = TokenizeProcessor::builder(TokenizeConfig::default())
//!     .model(Arc::new(RuleBasedModel::new()))
//!     .build()
//!     .unwrap();
//!
//! let doc = processor.process(TextInput::from("O Dr. Silva chegou. Já era tarde.")).unwrap();
//! assert_eq!(doc.sentences.len(), 2);
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, info_span, Span};

use crate::batch::{char_paragraphs, BatchAssembler};
use crate::chunking::ChunkerRegistry;
use crate::config::TokenizeConfig;
use crate::document::Document;
use crate::error::{Result, TokenizeError};
use crate::external::ExternalTokenizer;
use crate::input::{classify, Strategy, TextInput};
use crate::model::SegmentationModel;
use crate::prediction::PredictionAssembler;
use crate::pretokenized;
use crate::vocab::Vocab;

/// Requisito de pipeline atendido por este estágio.
pub const TOKENIZE: &str = "tokenize";

/// Montagem do processador com os colaboradores que a configuração exige.
pub struct TokenizeProcessorBuilder {
    config: TokenizeConfig,
    model: Option<Arc<dyn SegmentationModel>>,
    vocab: Option<Arc<Vocab>>,
    external: Option<Arc<dyn ExternalTokenizer>>,
    chunkers: ChunkerRegistry,
    span: Option<Span>,
}

impl TokenizeProcessorBuilder {
    pub fn model(mut self, model: Arc<dyn SegmentationModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn vocab(mut self, vocab: Arc<Vocab>) -> Self {
        self.vocab = Some(vocab);
        self
    }

    pub fn external(mut self, tokenizer: Arc<dyn ExternalTokenizer>) -> Self {
        self.external = Some(tokenizer);
        self
    }

    pub fn chunkers(mut self, chunkers: ChunkerRegistry) -> Self {
        self.chunkers = chunkers;
        self
    }

    /// Contexto de log do hospedeiro. Todos os eventos do processador saem
    /// como filhos deste span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Valida a configuração e confere os colaboradores:
    /// - `pretokenized`: nenhum;
    /// - `with_spacy`: tokenizador externo;
    /// - caso contrário: modelo (o vocabulário, se ausente, fica só com `<PAD>`/`<UNK>`).
    pub fn build(self) -> Result<TokenizeProcessor> {
        self.config.validate()?;
        let span = self.span.unwrap_or_else(|| info_span!("tokenize"));

        if self.config.pretokenized {
            // nada a carregar
        } else if self.config.external_tokenizer {
            if self.external.is_none() {
                return Err(TokenizeError::MissingCollaborator("tokenizador externo"));
            }
            info!(parent: &span, lang = %self.config.lang, "usando tokenizador externo");
        } else if self.model.is_none() {
            return Err(TokenizeError::MissingCollaborator("modelo de segmentação"));
        }

        Ok(TokenizeProcessor {
            config: self.config,
            model: self.model,
            vocab: self.vocab.unwrap_or_default(),
            external: self.external,
            chunkers: self.chunkers,
            span,
        })
    }
}

/// O estágio de tokenização.
pub struct TokenizeProcessor {
    config: TokenizeConfig,
    model: Option<Arc<dyn SegmentationModel>>,
    vocab: Arc<Vocab>,
    external: Option<Arc<dyn ExternalTokenizer>>,
    chunkers: ChunkerRegistry,
    span: Span,
}

impl TokenizeProcessor {
    pub fn builder(config: TokenizeConfig) -> TokenizeProcessorBuilder {
        TokenizeProcessorBuilder {
            config,
            model: None,
            vocab: None,
            external: None,
            chunkers: ChunkerRegistry::with_defaults(),
            span: None,
        }
    }

    /// Requisitos que este estágio atende.
    pub fn provides(&self) -> BTreeSet<&'static str> {
        BTreeSet::from([TOKENIZE])
    }

    /// Requisitos de estágios anteriores (nenhum).
    pub fn requires(&self) -> BTreeSet<&'static str> {
        BTreeSet::new()
    }

    /// Processa uma entrada e devolve o documento.
    ///
    /// Com `with_spacy`, o documento do tokenizador externo é devolvido sem
    /// alteração. Qualquer falha interrompe a chamada.
    pub fn process(&self, input: TextInput) -> Result<Document> {
        let _guard = self.span.enter();
        let strategy = classify(&self.config, input)?;
        debug!(strategy = strategy.name(), "estratégia selecionada");

        match strategy {
            Strategy::Pretokenized(pre) => {
                let built = pretokenized::build(pre);
                Document::new(built.sentences, built.raw_text, None)
            }
            Strategy::ExternalTokenizer(text) => {
                let tokenizer = self
                    .external
                    .as_ref()
                    .ok_or(TokenizeError::MissingCollaborator("tokenizador externo"))?;
                tokenizer.tokenize(&text).map_err(TokenizeError::ExternalDependency)
            }
            Strategy::ModelDriven(text) => self.process_with_model(text),
        }
    }

    fn process_with_model(&self, text: String) -> Result<Document> {
        let model = self
            .model
            .as_ref()
            .ok_or(TokenizeError::MissingCollaborator("modelo de segmentação"))?;

        let paragraphs = match self.chunkers.get(&self.config.lang) {
            Some(chunker) => {
                debug!(chunker = chunker.name(), "pré-processamento de chunks");
                chunker.preprocess(&text)?
            }
            None => char_paragraphs(&text),
        };

        let batches = BatchAssembler::from_config(&self.config).assemble(paragraphs, &self.vocab);
        debug!(batches = batches.len(), units = batches.total_units(), "batches montados");

        let assembled = PredictionAssembler::new(self.config.no_ssplit).assemble(model.as_ref(), batches)?;
        let doc = Document::new(assembled.sentences, text, Some(assembled.probabilities))?;
        debug!(sentences = doc.sentences.len(), tokens = doc.num_tokens(), "documento montado");
        Ok(doc)
    }

    /// Processa vários documentos em paralelo, um resultado por entrada, na mesma ordem.
    pub fn process_many(&self, inputs: Vec<TextInput>) -> Vec<Result<Document>> {
        let span = self.span.clone();
        info!(parent: &span, documents = inputs.len(), "processando lote de documentos");
        inputs.into_par_iter().map(|input| self.process(input)).collect()
    }
}

impl std::fmt::Debug for TokenizeProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizeProcessor")
            .field("config", &self.config)
            .field("has_model", &self.model.is_some())
            .field("has_external", &self.external.is_some())
            .field("vocab_size", &self.vocab.len())
            .field("chunkers", &self.chunkers)
            .finish()
    }
}
