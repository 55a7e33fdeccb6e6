//! Runtime configuration, read from the environment once at startup.

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WORDS_FILE: &str = "assets/words.txt";

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Path to the newline-separated word file.
    pub words_file: String,
}

impl Config {
    /// Load config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let words_file =
            std::env::var("WORDS_FILE").unwrap_or_else(|_| DEFAULT_WORDS_FILE.to_string());

        Self { port, words_file }
    }
}
