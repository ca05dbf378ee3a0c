use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Session storage I/O failed for {key}: {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AuthError {
    pub(crate) fn storage(key: &str, source: std::io::Error) -> Self {
        AuthError::Storage {
            key: key.to_string(),
            source,
        }
    }
}
