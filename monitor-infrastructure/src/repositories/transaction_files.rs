use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use monitor_domain::{Transaction, TransactionSource, TransactionWriter};

use crate::repositories::xlsx_codec::{parse_xlsx, render_xlsx};
use crate::utils::{ensure_parent_dir, FileFormat};

/// Reads and writes transaction datasets as CSV, a JSON array, JSON lines or
/// an xlsx workbook, picked by file extension.
pub struct FileTransactionRepository;

impl FileTransactionRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileTransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn format_for(path: &str) -> Result<FileFormat> {
    FileFormat::from_path(path)
        .ok_or_else(|| anyhow!("unsupported transaction file format: {}", path))
}

fn as_text<'a>(bytes: &'a [u8], path: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", path))
}

pub fn parse_csv(content: &str) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut transactions = Vec::new();
    for (index, record) in reader.deserialize::<Transaction>().enumerate() {
        // header is line 1
        let transaction = record.with_context(|| format!("invalid CSV record on line {}", index + 2))?;
        transactions.push(transaction);
    }
    Ok(transactions)
}

pub fn parse_json_lines(content: &str) -> Result<Vec<Transaction>> {
    let mut transactions = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let transaction: Transaction = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON record on line {}", index + 1))?;
        transactions.push(transaction);
    }
    Ok(transactions)
}

pub fn render_csv(transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for transaction in transactions {
        writer.serialize(transaction)?;
    }
    writer
        .into_inner()
        .map_err(|err| anyhow!("failed to flush CSV buffer: {}", err.error()))
}

pub fn render_json_lines(transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    for transaction in transactions {
        serde_json::to_writer(&mut buffer, transaction)?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

#[async_trait]
impl TransactionSource for FileTransactionRepository {
    async fn load_transactions(&self, path: &str) -> anyhow::Result<Vec<Transaction>> {
        let format = format_for(path)?;
        let bytes = fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path))?;
        let transactions = match format {
            FileFormat::Csv => parse_csv(as_text(&bytes, path)?)?,
            FileFormat::Json => serde_json::from_slice(&bytes)
                .with_context(|| format!("invalid JSON array in {}", path))?,
            FileFormat::JsonLines => parse_json_lines(as_text(&bytes, path)?)?,
            FileFormat::Xlsx => {
                parse_xlsx(&bytes).with_context(|| format!("invalid workbook {}", path))?
            }
        };
        debug!(path, rows = transactions.len(), "transactions loaded");
        Ok(transactions)
    }
}

#[async_trait]
impl TransactionWriter for FileTransactionRepository {
    async fn write_transactions(&self, path: &str, transactions: &[Transaction]) -> anyhow::Result<()> {
        let format = format_for(path)?;
        let content = match format {
            FileFormat::Csv => render_csv(transactions)?,
            FileFormat::Json => serde_json::to_vec_pretty(transactions)?,
            FileFormat::JsonLines => render_json_lines(transactions)?,
            FileFormat::Xlsx => render_xlsx(transactions)?,
        };
        ensure_parent_dir(path).await?;
        fs::write(path, content)
            .await
            .with_context(|| format!("failed to write {}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_domain::Category;

    const SAMPLE: &str = "\
transaction_id,timestamp,user_id,amount,merchant,category,country,device,ip,is_fraud
TX00000001,2024-01-01 10:00:00,user_1,50.0,Acme Inc,Retail,US,Desktop,10.0.0.1,0
TX00000002,2024-01-03 02:10:00,user_1, 500 ,Skyways,travel,BR,Android,10.0.0.2,1
";

    #[test]
    fn parses_csv_rows() {
        let rows = parse_csv(SAMPLE).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].transaction_id, "TX00000001");
        assert_eq!(rows[1].amount, 500.0);
        assert_eq!(rows[1].category, Category::Travel);
        assert_eq!(rows[1].hour(), 2);
        assert!(!rows[0].is_fraud);
        assert!(rows[1].is_fraud);
    }

    #[test]
    fn csv_error_reports_line_number() {
        let broken = "\
transaction_id,timestamp,user_id,amount,category,country,device
TX1,2024-01-01 10:00:00,user_1,50.0,Retail,US,Desktop
TX2,2024-01-01 11:00:00,user_1,lots,Retail,US,Desktop
";
        let err = parse_csv(broken).expect_err("bad amount");
        assert!(err.to_string().contains("line 3"), "{}", err);
    }

    #[test]
    fn json_lines_skip_blank_lines() {
        let content = r#"
{"transaction_id":"TX1","timestamp":"2024-01-01T10:00:00","user_id":"u","amount":5.0,"category":"Retail","country":"US","device":"Desktop","is_fraud":false}

{"transaction_id":"TX2","timestamp":"2024-01-01 11:00:00","user_id":"u","amount":7.5,"category":"Gaming","country":"US","device":"Desktop"}
"#;
        let rows = parse_json_lines(content).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].category, Category::Other("Gaming".to_string()));
    }

    #[tokio::test]
    async fn writes_and_reads_back_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out.csv");
        let path = path.to_string_lossy().to_string();
        let rows = parse_csv(SAMPLE).expect("parse");

        let repository = FileTransactionRepository::new();
        repository
            .write_transactions(&path, &rows)
            .await
            .expect("write");
        let loaded = repository.load_transactions(&path).await.expect("load");
        assert_eq!(loaded, rows);

        let content = std::fs::read_to_string(&path).expect("read");
        assert!(content.starts_with("transaction_id,timestamp,user_id,amount"));
        assert!(content.contains("2024-01-03 02:10:00"));
    }

    #[tokio::test]
    async fn writes_and_reads_back_xlsx() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("transactions.xlsx");
        let path = path.to_string_lossy().to_string();
        let rows = parse_csv(SAMPLE).expect("parse");

        let repository = FileTransactionRepository::new();
        repository
            .write_transactions(&path, &rows)
            .await
            .expect("write");
        let loaded = repository.load_transactions(&path).await.expect("load");
        assert_eq!(loaded, rows);
    }

    #[tokio::test]
    async fn rejects_unknown_extension() {
        let repository = FileTransactionRepository::new();
        let err = repository
            .load_transactions("transactions.parquet")
            .await
            .expect_err("unsupported");
        assert!(err.to_string().contains("unsupported"));
    }
}
