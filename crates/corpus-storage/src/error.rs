use corpus_types::CorpusError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database failure: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// The database was opened without one of the expected column families.
    #[error("missing column family '{0}'")]
    ColumnFamilyNotFound(String),

    /// A stored key could not be decoded back into its parts.
    #[error("malformed key: {0}")]
    Key(String),

    #[error("cannot encode or decode stored value: {0}")]
    Serialization(String),

    #[error("lease lock poisoned: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<CorpusError> for StorageError {
    fn from(err: CorpusError) -> Self {
        match err {
            CorpusError::Serialization(inner) => inner.into(),
            other => Self::Serialization(other.to_string()),
        }
    }
}
