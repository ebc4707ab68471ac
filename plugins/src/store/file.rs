use std::borrow::Cow;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use plancraft_core::api::{CacheError, ContextStore};

const EXT: &str = "json";

/// One file per key under a cache directory.
///
/// Keys are percent-encoded into file names so `:` and friends survive on
/// every platform. Writes go through a temp file and a rename.
pub struct FileContextStore {
    dir: PathBuf,
}

impl FileContextStore {
    /// Create the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "context store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{EXT}", encode_key(key)))
    }
}

fn encode_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

fn decode_key(name: &str) -> Option<String> {
    urlencoding::decode(name).ok().map(Cow::into_owned)
}

#[async_trait]
impl ContextStore for FileContextStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXT) {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(decode_key)
            else {
                tracing::warn!(path = %path.display(), "ignoring unreadable cache file name");
                continue;
            };
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_encoding_round_trips() {
        let key = "task-ctx:result:0b6e-4f:12";
        let encoded = encode_key(key);
        assert!(!encoded.contains(':'));
        assert_eq!(decode_key(&encoded).as_deref(), Some(key));
        assert_eq!(decode_key("bad%FF"), None);
    }

    #[tokio::test]
    async fn test_put_get_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContextStore::open(dir.path().join("cache")).await.unwrap();

        store.put("task-ctx:result:s1:2", "{\"ok\":true}").await.unwrap();
        store.put("task-ctx:result:s1:1", "{}").await.unwrap();
        store.put("task-ctx:tasks:s1", "[]").await.unwrap();
        store.put("task-ctx:result:s2:1", "{}").await.unwrap();

        assert_eq!(
            store.get("task-ctx:result:s1:2").await.unwrap().as_deref(),
            Some("{\"ok\":true}")
        );
        assert_eq!(store.get("task-ctx:missing").await.unwrap(), None);
        assert_eq!(
            store.keys("task-ctx:result:s1:").await.unwrap(),
            vec!["task-ctx:result:s1:1", "task-ctx:result:s1:2"]
        );
    }

    #[tokio::test]
    async fn test_unusual_keys_list_back_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileContextStore::open(dir.path()).await.unwrap();

        let keys = ["ctx:a/b:1", "ctx:sp ace", "ctx:dot.ted~", "ctx:ünï"];
        for key in keys {
            store.put(key, key).await.unwrap();
        }
        for key in keys {
            assert_eq!(store.get(key).await.unwrap().as_deref(), Some(key));
        }
        let mut expected: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        expected.sort();
        assert_eq!(store.keys("ctx:").await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_overwrite_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileContextStore::open(dir.path()).await.unwrap();
            store.put("k", "1").await.unwrap();
            store.put("k", "2").await.unwrap();
        }
        let store = FileContextStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("2"));
    }
}
