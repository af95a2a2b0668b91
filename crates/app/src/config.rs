use std::path::PathBuf;

use storage::{InMemoryRepository, Storage};

/// Settings shared by every subcommand. Environment first, flags override.
#[derive(Debug, Clone)]
pub struct Config {
    pub questions_path: PathBuf,
    pub students_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub ai_url: Option<String>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        let questions_path = std::env::var("CLASSROOM_QUESTIONS")
            .map_or_else(|_| PathBuf::from("quizdata.json"), PathBuf::from);
        let log_level = std::env::var("CLASSROOM_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            questions_path,
            students_path: non_blank("CLASSROOM_STUDENTS").map(PathBuf::from),
            api_url: non_blank("CLASSROOM_API_URL"),
            ai_url: non_blank("CLASSROOM_AI_URL"),
            log_level,
        }
    }

    /// Backend API when configured, else a local students file, else an empty store.
    pub fn storage(&self) -> Result<Storage, Box<dyn std::error::Error>> {
        if let Some(url) = &self.api_url {
            tracing::info!(%url, "using school backend");
            return Ok(Storage::http(url));
        }
        if let Some(path) = &self.students_path {
            let raw = std::fs::read_to_string(path)?;
            let repo = InMemoryRepository::from_students_json(&raw)?;
            tracing::info!(path = %path.display(), "using local students file");
            return Ok(Storage::from_in_memory(repo));
        }
        tracing::warn!("no backend or students file configured; nothing will be saved");
        Ok(Storage::in_memory())
    }
}

fn non_blank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
