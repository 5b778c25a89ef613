use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use backend_domain::ports::ContestStore;
use backend_domain::ContestEntry;

const LOG_FILE: &str = "contest_entries.jsonl";

/// Append-only JSONL log of contest entries, replayed on startup to rebuild
/// the in-memory claim index. Same write discipline as the scan event log.
pub struct FileContestStore {
    path: PathBuf,
    writer: Mutex<File>,
}

impl FileContestStore {
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("create data dir {}", data_dir.display()))?;
        let path = data_dir.join(LOG_FILE);

        repair_torn_tail(&path).await?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("open contest log {}", path.display()))?;

        Ok(Self {
            path,
            writer: Mutex::new(file),
        })
    }
}

#[async_trait]
impl ContestStore for FileContestStore {
    async fn append_entry(&self, entry: &ContestEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry).context("encode contest entry")?;
        line.push('\n');

        let mut file = self.writer.lock().await;
        file.write_all(line.as_bytes())
            .await
            .context("append contest entry")?;
        file.flush().await.context("flush contest log")?;
        file.sync_data().await.context("sync contest log")?;
        Ok(())
    }

    async fn load_entries(&self) -> Result<Vec<ContestEntry>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).context("read contest log"),
        };

        let total_lines = content.lines().count();
        let mut out = Vec::new();
        for (index, line) in content.lines().enumerate() {
            match serde_json::from_str::<ContestEntry>(line) {
                Ok(entry) => out.push(entry),
                Err(err) if index + 1 == total_lines => {
                    warn!("skipping torn tail line in contest log: {}", err);
                    break;
                }
                Err(err) => {
                    return Err(anyhow::anyhow!(
                        "corrupt contest log line {}: {}",
                        index,
                        err
                    ));
                }
            }
        }
        Ok(out)
    }
}

async fn repair_torn_tail(path: &Path) -> Result<()> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err).context("read contest log"),
    };
    if content.is_empty() {
        return Ok(());
    }
    let complete_len = match content.iter().rposition(|byte| *byte == b'\n') {
        Some(last_newline) => last_newline + 1,
        None => 0,
    };
    if complete_len < content.len() {
        warn!(
            "truncating {} torn bytes from {}",
            content.len() - complete_len,
            path.display()
        );
        let file = OpenOptions::new().write(true).open(path).await?;
        file.set_len(complete_len as u64).await?;
        file.sync_data().await?;
    }
    Ok(())
}
