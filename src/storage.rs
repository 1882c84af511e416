use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Local-disk media store. Objects are written under a root directory and
/// served back through `/media`; stored names embed a timestamp and a
/// sequence number, so a name is never reused and existing objects are
/// never overwritten.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_base: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> MediaStore {
        MediaStore {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    /// Stored name for an uploaded product image:
    /// `products/{product_id}_{millis}_{seq}.{ext}`. The extension comes
    /// from the client's filename, lowercased, defaulting to `bin`.
    pub fn object_name(
        product_id: i32,
        timestamp_millis: i64,
        seq: usize,
        original_filename: &str,
    ) -> String {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        format!("products/{}_{}_{}.{}", product_id, timestamp_millis, seq, ext)
    }

    pub fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("object {} already exists", name),
            ));
        }
        fs::write(path, bytes)
    }

    pub fn public_url(&self, name: &str) -> String {
        format!("{}/media/{}", self.public_base.trim_end_matches('/'), name)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
