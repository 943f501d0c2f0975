use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Budgetlens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info".to_string()
}

/// Get the application data directory (~/Budgetlens/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(APP_NAME)
}

/// Which inference backend generates summaries and explanations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Local Ollama instance.
    Local,
    /// Hugging Face Inference API.
    Remote,
}

/// Runtime configuration, resolved once at startup from `BUDGETLENS_*`
/// environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub backend: BackendKind,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub hf_model: String,
    pub hf_token: String,
    pub worker_count: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BUDGETLENS_BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8600)));

        let database_path = std::env::var("BUDGETLENS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_data_dir().join("budgetlens.db"));

        let backend = match std::env::var("BUDGETLENS_BACKEND").as_deref() {
            Ok("remote") => BackendKind::Remote,
            _ => BackendKind::Local,
        };

        let ollama_base_url = std::env::var("BUDGETLENS_OLLAMA_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let ollama_model =
            std::env::var("BUDGETLENS_OLLAMA_MODEL").unwrap_or_else(|_| "gemma2:2b".to_string());

        let hf_model = std::env::var("BUDGETLENS_HF_MODEL")
            .unwrap_or_else(|_| "facebook/bart-large-cnn".to_string());
        let hf_token = std::env::var("HF_TOKEN").unwrap_or_default();

        let worker_count = std::env::var("BUDGETLENS_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(2);

        Self {
            bind_addr,
            database_path,
            backend,
            ollama_base_url,
            ollama_model,
            hf_model,
            hf_token,
            worker_count,
        }
    }
}
