//! Saving downloaded codes to disk.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use ticketer_core::DataUri;
use ticketer_core::environment::FileSaver;
use ticketer_core::error::SaveError;

/// Writes downloaded images into a fixed directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryFileSaver {
    dir: PathBuf,
}

impl DirectoryFileSaver {
    /// Saver writing into `dir`, which is created on first save
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory files are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Reject anything but a single plain path component
fn validate_file_name(file_name: &str) -> Result<&Path, SaveError> {
    let path = Path::new(file_name);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path),
        _ => Err(SaveError::InvalidFileName(file_name.to_string())),
    }
}

impl FileSaver for DirectoryFileSaver {
    fn save(
        &self,
        image: DataUri,
        file_name: String,
    ) -> Pin<Box<dyn Future<Output = Result<PathBuf, SaveError>> + Send + '_>> {
        Box::pin(async move {
            let target = self.dir.join(validate_file_name(&file_name)?);
            let bytes = image.decode()?;

            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| SaveError::Io(format!("{}: {e}", self.dir.display())))?;
            tokio::fs::write(&target, &bytes)
                .await
                .map_err(|e| SaveError::Io(format!("{}: {e}", target.display())))?;

            tracing::debug!(path = %target.display(), bytes = bytes.len(), "Wrote image");
            Ok(target)
        })
    }
}
