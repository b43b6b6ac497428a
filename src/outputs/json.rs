//! JSON output of the run's [`Payload`].
//!
//! The file is pretty-printed UTF-8 with non-ASCII characters left as they
//! are, and is replaced as a whole on every run:
//! ```text
//! data/
//! └── news.json
//! ```

use crate::models::Payload;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `payload` to `path`, creating the parent directory when missing.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_payload(payload: &Payload, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(payload)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }

    fs::write(path, json).await?;
    info!(items = payload.items.len(), "Wrote JSON payload");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Item, Stats};

    fn payload() -> Payload {
        Payload {
            generated_at: "2025-05-06T10:00:00Z".into(),
            items: vec![Item {
                id: "Cidade:42".into(),
                title: "Mutirão de vacinação".into(),
                summary: "Postos abertos no sábado".into(),
                source: "Cidade".into(),
                published_at: "2025-05-06T09:00:00Z".into(),
                url: "http://x/1".into(),
                image: Some("http://x/1.jpg".into()),
                score: 2,
            }],
            stats: Stats {
                sources: 1,
                items_before_limit: 1,
                ..Stats::default()
            },
        }
    }

    #[tokio::test]
    async fn test_writes_pretty_unescaped_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("news.json");

        write_payload(&payload(), &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Mutirão de vacinação"));
        assert!(text.contains("\n  \"items\": ["));

        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["generatedAt"], "2025-05-06T10:00:00Z");
        assert_eq!(v["items"][0]["publishedAt"], "2025-05-06T09:00:00Z");
        assert_eq!(v["items"][0]["image"], "http://x/1.jpg");
        assert!(v["items"][0].get("score").is_none());
        assert_eq!(v["stats"]["items_before_limit"], 1);
        assert_eq!(v["stats"]["per_source"], serde_json::json!([]));
        assert!(v["stats"].get("error").is_none());
    }

    #[tokio::test]
    async fn test_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.json");
        std::fs::write(&path, "old").unwrap();

        write_payload(&payload(), &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with('{'));
    }
}
