//! Servidor web Axum que expõe o estágio de tokenização via HTTP

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokenize_core::{
    ChunkerRegistry, RuleBasedModel, TextInput, TokenizeConfig, TokenizeError, TokenizeProcessor,
    UnicodeTokenizer, Vocab,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, warn};

/// Estado compartilhado da aplicação: colaboradores só leitura
struct AppState {
    defaults: TokenizeConfig,
    model: Arc<RuleBasedModel>,
    vocab: Arc<Vocab>,
    external: Arc<UnicodeTokenizer>,
    chunkers: ChunkerRegistry,
}

impl AppState {
    /// Monta um processador para a configuração da requisição.
    fn processor(&self, config: TokenizeConfig) -> Result<TokenizeProcessor, TokenizeError> {
        TokenizeProcessor::builder(config)
            .model(self.model.clone())
            .vocab(self.vocab.clone())
            .external(self.external.clone())
            .chunkers(self.chunkers.clone())
            .span(info_span!("tokenize_request"))
            .build()
    }
}

#[derive(Deserialize)]
struct TokenizeRequest {
    input: TextInput,
    /// Sobreposição parcial da configuração padrão do servidor
    #[serde(default)]
    config: serde_json::Value,
}

#[derive(Serialize)]
struct LanguagesResponse {
    chunked: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Configuração padrão: arquivo JSON opcional em TOKENIZE_CONFIG
    let defaults = match std::env::var("TOKENIZE_CONFIG") {
        Ok(path) => TokenizeConfig::from_file(&path).expect("configuração inválida"),
        Err(_) => TokenizeConfig::default(),
    };
    let vocab = match defaults.model_path.as_deref() {
        Some(dir) => {
            let path = std::path::Path::new(dir).join("vocab.json");
            Vocab::load(&path).unwrap_or_else(|err| {
                warn!("vocabulário não carregado de {}: {err}", path.display());
                Vocab::new()
            })
        }
        None => Vocab::new(),
    };

    let state = Arc::new(AppState {
        defaults,
        model: Arc::new(RuleBasedModel::new()),
        vocab: Arc::new(vocab),
        external: Arc::new(UnicodeTokenizer),
        chunkers: ChunkerRegistry::with_defaults(),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tokenize", post(tokenize_handler))
        .route("/languages", get(languages_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(state);

    let addr = std::env::var("TOKENIZE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Servidor de tokenização iniciado em http://{addr}");
    axum::serve(listener, app).await.unwrap();
}

/// Tokeniza uma entrada (HTTP POST)
async fn tokenize_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenizeRequest>,
) -> Response {
    let config = match state.defaults.merged_with(&req.config) {
        Ok(config) => config,
        Err(err) => return error_response(err),
    };
    let processor = match state.processor(config) {
        Ok(processor) => processor,
        Err(err) => return error_response(err),
    };

    info!("Tokenizando entrada do tipo {}", req.input.kind());

    // O processamento é síncrono: roda fora do runtime
    let result = tokio::task::spawn_blocking(move || processor.process(req.input)).await;

    match result {
        Ok(Ok(doc)) => Json(doc).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(join_err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": join_err.to_string() })),
        )
            .into_response(),
    }
}

/// Idiomas com pré-processamento de chunks
async fn languages_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(LanguagesResponse { chunked: state.chunkers.languages() })
}

fn error_response(err: TokenizeError) -> Response {
    let status = if err.is_caller_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    warn!("Falha na tokenização: {err}");
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}
