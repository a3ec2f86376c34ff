//! # Configuração do Estágio
//!
//! As opções chegam como JSON (arquivo ou corpo de requisição) e são lidas
//! com `serde`. Campos ausentes assumem o valor padrão.
//!
//! | opção          | padrão | efeito                                         |
//! |----------------|--------|------------------------------------------------|
//! | `pretokenized` | false  | entrada já segmentada, sem modelo              |
//! | `with_spacy`   | false  | delega tudo ao tokenizador externo             |
//! | `no_ssplit`    | false  | saída com exatamente uma sentença              |
//! | `lang`         | ""     | seleciona o pré-processamento de chunks        |
//! | `max_seqlen`   | 1000   | unidades por segmento enviado ao modelo        |
//! | `batch_size`   | 32     | segmentos por batch                            |
//! | `model_path`   | nenhum | local dos pesos (opaco para este crate)        |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenizeError};

/// Comprimento máximo padrão de um segmento (em unidades).
pub const MAX_SEQ_LENGTH_DEFAULT: usize = 1000;

/// Quantidade padrão de segmentos por batch.
pub const BATCH_SIZE_DEFAULT: usize = 32;

/// Opções reconhecidas pelo processador de tokenização.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizeConfig {
    /// Entrada já tokenizada: não usa modelo.
    pub pretokenized: bool,
    /// Delega a tokenização inteira ao tokenizador externo.
    #[serde(rename = "with_spacy")]
    pub external_tokenizer: bool,
    /// Suprime a divisão em sentenças.
    pub no_ssplit: bool,
    /// Código do idioma (ex: "pt", "vi").
    pub lang: String,
    pub max_seqlen: usize,
    pub batch_size: usize,
    pub model_path: Option<String>,
}

impl Default for TokenizeConfig {
    fn default() -> Self {
        Self {
            pretokenized: false,
            external_tokenizer: false,
            no_ssplit: false,
            lang: String::new(),
            max_seqlen: MAX_SEQ_LENGTH_DEFAULT,
            batch_size: BATCH_SIZE_DEFAULT,
            model_path: None,
        }
    }
}

impl TokenizeConfig {
    /// Lê a configuração de uma string JSON e valida.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: TokenizeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Lê a configuração de um arquivo JSON e valida.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Sobrepõe as chaves presentes em `overrides` (objeto JSON) a esta configuração.
    ///
    /// Usado pelo servidor web: cada requisição ajusta apenas o que precisa.
    pub fn merged_with(&self, overrides: &serde_json::Value) -> Result<Self> {
        let mut base = serde_json::to_value(self)?;
        if let (Some(base_map), Some(extra)) = (base.as_object_mut(), overrides.as_object()) {
            for (key, value) in extra {
                base_map.insert(key.clone(), value.clone());
            }
        } else if !overrides.is_null() {
            return Err(TokenizeError::InvalidConfig(
                "sobreposição de configuração deve ser um objeto JSON".to_string(),
            ));
        }
        let merged: TokenizeConfig = serde_json::from_value(base)?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_seqlen == 0 {
            return Err(TokenizeError::InvalidConfig("max_seqlen deve ser > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(TokenizeError::InvalidConfig("batch_size deve ser > 0".to_string()));
        }
        if self.pretokenized && self.external_tokenizer {
            tracing::warn!("pretokenized e with_spacy ativos ao mesmo tempo; pretokenized tem precedência");
        }
        Ok(())
    }
}
