//! CSV directory backend: `<dir>/<table>.csv`, one line per appended row

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{SheetStore, StoreError, TableHandle};

pub struct CsvDirectoryStore {
    dir: PathBuf,
    // Serialises appends so rows from concurrent submissions never interleave
    write_lock: Arc<Mutex<()>>,
}

impl CsvDirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

#[async_trait]
impl SheetStore for CsvDirectoryStore {
    fn describe(&self) -> String {
        format!("CSV directory {}", self.dir.display())
    }

    async fn ensure_table(&self, name: &str) -> Result<TableHandle, StoreError> {
        let path = self.table_path(name);
        let dir = self.dir.clone();

        let _guard = self.write_lock.lock().await;
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            std::fs::create_dir_all(&dir)?;
            OpenOptions::new().create(true).append(true).open(&path)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::TableCreation {
            table: name.to_string(),
            cause: e.to_string(),
        })?
        .map_err(|e| StoreError::TableCreation {
            table: name.to_string(),
            cause: e.to_string(),
        })?;

        Ok(TableHandle {
            name: name.to_string(),
        })
    }

    async fn append_row(&self, table: &TableHandle, row: &[String]) -> Result<(), StoreError> {
        let path = self.table_path(&table.name);
        let row = row.to_vec();

        let _guard = self.write_lock.lock().await;
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let file = OpenOptions::new().append(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file);
            writer.write_record(&row)?;
            writer.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Internal(format!("append task failed: {}", e)))??;

        debug!(table = %table.name, "Row appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_ensure_table_creates_directory_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CsvDirectoryStore::new(tmp.path().join("nested"));

        let table = store.ensure_table("existing_songs").await.unwrap();

        assert_eq!(table.name, "existing_songs");
        assert!(store.table_path("existing_songs").exists());
    }

    #[tokio::test]
    async fn test_ensure_table_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CsvDirectoryStore::new(tmp.path());

        let table = store.ensure_table("new_songs").await.unwrap();
        store.append_row(&table, &row(&["a", "b"])).await.unwrap();
        store.ensure_table("new_songs").await.unwrap();

        let content = std::fs::read_to_string(store.table_path("new_songs")).unwrap();
        assert_eq!(content, "a,b\n");
    }

    #[tokio::test]
    async fn test_append_quotes_fields_with_commas() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CsvDirectoryStore::new(tmp.path());
        let table = store.ensure_table("existing_songs").await.unwrap();

        store
            .append_row(&table, &row(&["2024-03-10", "Resta Con Noi", "bello, adatto"]))
            .await
            .unwrap();
        store
            .append_row(&table, &row(&["2024-03-17", "Ave Maria", ""]))
            .await
            .unwrap();

        let content = std::fs::read_to_string(store.table_path("existing_songs")).unwrap();
        assert_eq!(
            content,
            "2024-03-10,Resta Con Noi,\"bello, adatto\"\n2024-03-17,Ave Maria,\n"
        );
    }

    #[tokio::test]
    async fn test_append_without_table_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CsvDirectoryStore::new(tmp.path());
        let missing = TableHandle {
            name: "missing".to_string(),
        };

        assert!(store.append_row(&missing, &row(&["x"])).await.is_err());
    }
}
