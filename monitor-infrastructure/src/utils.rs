use std::path::Path;

use anyhow::Result;
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Json,
    JsonLines,
    Xlsx,
}

impl FileFormat {
    pub fn from_path(path: &str) -> Option<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())?;
        match extension.as_str() {
            "csv" => Some(FileFormat::Csv),
            "json" => Some(FileFormat::Json),
            "jsonl" | "ndjson" => Some(FileFormat::JsonLines),
            "xlsx" => Some(FileFormat::Xlsx),
            _ => None,
        }
    }
}

pub async fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_by_extension() {
        assert_eq!(FileFormat::from_path("data/tx.CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_path("tx.json"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path("tx.ndjson"), Some(FileFormat::JsonLines));
        assert_eq!(FileFormat::from_path("transactions.xlsx"), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_path("tx.parquet"), None);
        assert_eq!(FileFormat::from_path("transactions"), None);
    }
}
