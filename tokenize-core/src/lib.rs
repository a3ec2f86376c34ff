//! # tokenize-core: Estágio de Tokenização e Segmentação de Sentenças
//!
//! Este crate transforma uma unidade de texto (texto cru, trechos de texto ou
//! texto já tokenizado) num [`Document`] de sentenças e tokens com offsets de
//! caracteres e, quando há modelo, a probabilidade de cada token.
//!
//! ## Arquitetura do Estágio
//!
//! Três caminhos diferentes convergem para o mesmo documento:
//!
//! 1.  **Classificação** ([`input`]): configuração + forma da entrada escolhem a estratégia.
//! 2.  **Pré-tokenizado** ([`pretokenized`]): limites já conhecidos, só numeração e offsets.
//! 3.  **Tokenizador externo** ([`external`]): delegação completa, documento devolvido intacto.
//! 4.  **Modelo**:
//!     *   **Chunks por idioma** ([`chunking`]): reescrita do texto para idiomas como o vietnamita.
//!     *   **Batches** ([`batch`]): parágrafos → unidades → segmentos → batches.
//!     *   **Predições** ([`prediction`]): rótulos do modelo ([`model`]) → sentenças + probabilidades.
//! 5.  **Documento** ([`document`]): ponto final comum a todos os caminhos.
//!
//! O orquestrador é o [`TokenizeProcessor`] ([`processor`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use tokenize_core::{TextInput, TokenizeConfig, TokenizeProcessor};
//!
//! let config = TokenizeConfig { pretokenized: true, ..Default::default() };
//! let processor = TokenizeProcessor::builder(config).build().unwrap();
//!
//! let doc = processor.process(TextInput::from("Hello world\nFoo")).unwrap();
//! assert_eq!(doc.raw_text, "Hello world Foo");
//! assert_eq!(doc.sentences[1].tokens[0].start_char, 12);
//! ```

pub mod batch;
pub mod chunking;
pub mod config;
pub mod document;
pub mod error;
pub mod external;
pub mod input;
pub mod model;
pub mod prediction;
pub mod pretokenized;
pub mod processor;
pub mod rule_model;
pub mod vocab;

pub use chunking::{ChunkPreprocessor, ChunkerRegistry, VietnameseChunker};
pub use config::TokenizeConfig;
pub use document::{Document, Sentence, Token};
pub use error::{Result, TokenizeError};
pub use external::{ExternalTokenizer, UnicodeTokenizer};
pub use input::{Strategy, TextInput};
pub use model::{BoundaryLabel, SegmentationModel, UnitPrediction};
pub use processor::TokenizeProcessor;
pub use rule_model::RuleBasedModel;
pub use vocab::Vocab;
