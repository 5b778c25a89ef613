use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::warn;

use backend_domain::ports::EventStore;
use backend_domain::{ScanEvent, StoredScanEvent};

const LOG_FILE: &str = "scan_events.jsonl";

struct Writer {
    file: File,
    next_cursor: u64,
}

/// Append-only JSONL log of scans. One line per event, cursor = line index.
/// All appends go through one mutex-held writer and end with flush + sync,
/// so a reader either sees a complete line or (after a crash) a torn tail
/// that open() truncates away before the next append.
pub struct FileEventStore {
    path: PathBuf,
    writer: Mutex<Writer>,
    /// Cursor and byte offset just past the last complete line a reader
    /// consumed. Sequential batched reads (replay) resume here instead of
    /// rescanning the file from the start on every call.
    read_hint: Mutex<(u64, u64)>,
}

impl FileEventStore {
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("create data dir {}", data_dir.display()))?;
        let path = data_dir.join(LOG_FILE);

        let next_cursor = repair_and_count(&path).await?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("open event log {}", path.display()))?;

        Ok(Self {
            path,
            writer: Mutex::new(Writer { file, next_cursor }),
            read_hint: Mutex::new((0, 0)),
        })
    }
}

#[async_trait]
impl EventStore for FileEventStore {
    async fn append(&self, event: &ScanEvent) -> Result<u64> {
        let mut line = serde_json::to_string(event).context("encode scan event")?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .file
            .write_all(line.as_bytes())
            .await
            .context("append scan event")?;
        writer.file.flush().await.context("flush event log")?;
        writer.file.sync_data().await.context("sync event log")?;

        let cursor = writer.next_cursor;
        writer.next_cursor += 1;
        Ok(cursor)
    }

    async fn read_since(&self, cursor: u64, limit: usize) -> Result<Vec<StoredScanEvent>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).context("open event log for read"),
        };

        let mut index = 0u64;
        let mut offset = 0u64;
        {
            let hint = self.read_hint.lock().await;
            if hint.0 == cursor {
                index = hint.0;
                offset = hint.1;
            }
        }
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .await
                .context("seek event log")?;
        }

        let mut reader = BufReader::new(file);
        let mut out = Vec::new();
        let mut line = String::new();
        while out.len() < limit {
            line.clear();
            let read = reader.read_line(&mut line).await.context("read event log")?;
            if read == 0 {
                break;
            }
            if !line.ends_with('\n') {
                // Torn tail from an interrupted append; open() removes it
                // before the next write.
                warn!("skipping torn tail line in event log");
                break;
            }
            offset += read as u64;
            if index < cursor {
                index += 1;
                continue;
            }
            let event: ScanEvent = serde_json::from_str(line.trim_end())
                .map_err(|err| anyhow!("corrupt event log line {}: {}", index, err))?;
            out.push(StoredScanEvent {
                cursor: index,
                event,
            });
            index += 1;
        }

        let mut hint = self.read_hint.lock().await;
        if index > hint.0 {
            *hint = (index, offset);
        }
        Ok(out)
    }

    async fn ping(&self) -> Result<()> {
        fs::metadata(&self.path).await.context("event log missing")?;
        Ok(())
    }
}

/// Truncates a torn (newline-less) tail left by an interrupted write and
/// returns the number of complete lines.
async fn repair_and_count(path: &Path) -> Result<u64> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(err).context("read event log"),
    };
    if content.is_empty() {
        return Ok(0);
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

    Ok(content[..complete_len]
        .iter()
        .filter(|byte| **byte == b'\n')
        .count() as u64)
}
