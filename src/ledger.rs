use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger {path:?} is not a JSON id map: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Ids already announced to the chat channel.
///
/// On disk this is a JSON object of stringified id to `true`, e.g. `{"3": true}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedLedger {
    ids: BTreeMap<i64, bool>,
}

impl NotifiedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// A missing or empty file is an empty ledger.
    pub async fn load(path: &Path) -> Result<Self, LedgerError> {
        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(LedgerError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        let ids = serde_json::from_slice(&data).map_err(|source| LedgerError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { ids })
    }

    /// Writes to a sibling temp file first so a crash mid-write never truncates the ledger.
    pub async fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let io_err = |source: std::io::Error| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        };

        let data = serde_json::to_vec_pretty(&self.ids).map_err(|source| LedgerError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_string());
        let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

        let mut file = fs::File::create(&temp_path).await.map_err(io_err)?;
        file.write_all(&data).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        drop(file);

        if let Err(source) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_err(source));
        }
        Ok(())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.get(&id).copied().unwrap_or(false)
    }

    pub fn mark(&mut self, id: i64) {
        self.ids.insert(id, true);
    }

    pub fn len(&self) -> usize {
        self.ids.values().filter(|sent| **sent).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.ids.values().any(|sent| *sent)
    }
}

impl FromIterator<i64> for NotifiedLedger {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(|id| (id, true)).collect(),
        }
    }
}
