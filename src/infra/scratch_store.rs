use {
    crate::domain::registration::{RegId, RegistrationContext},
    std::path::PathBuf,
};

/// File-per-registration store: one JSON document per registration id,
/// last writer wins.
///
/// Reads never fail. The webhook and the user redirect race each other, so
/// "no record yet" is a normal state and any unreadable record degrades to
/// the empty default. Writes log and swallow their errors, since losing
/// the scratch record must not abort the caller's HTTP response.
#[derive(Debug, Clone)]
pub struct ScratchStore {
    dir: PathBuf,
}

impl ScratchStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &RegId) -> PathBuf {
        self.dir.join(format!("{}.json", id.file_key()))
    }

    pub async fn put(&self, id: &RegId, record: &RegistrationContext) {
        let json = match serde_json::to_vec_pretty(record) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(reg_id = %id, error = %e, "failed to serialize scratch record");
                return;
            }
        };
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            tracing::warn!(error = %e, "failed to create scratch directory");
            return;
        }
        if let Err(e) = tokio::fs::write(self.path_for(id), json).await {
            tracing::warn!(reg_id = %id, error = %e, "failed to write scratch record");
        }
    }

    pub async fn get(&self, id: &RegId) -> RegistrationContext {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(reg_id = %id, error = %e, "unreadable scratch record, treating as empty");
                    RegistrationContext::default()
                }
            },
            // Not written yet, expected while the session is in flight.
            Err(_) => RegistrationContext::default(),
        }
    }
}
