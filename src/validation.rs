use std::io;
use std::path::Path;
use thiserror::Error;

/// FIT files smaller than this cannot hold a header plus any real data.
pub const MIN_FIT_FILE_BYTES: u64 = 100;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("File path is required")]
    MissingPath,
    #[error("file does not exist: {0}")]
    NotFound(String),
    #[error("not a regular file: {0}")]
    NotAFile(String),
    #[error("expected a .fit extension: {0}")]
    WrongExtension(String),
    #[error("file is too small to be a FIT file ({size} bytes)")]
    TooSmall { size: u64 },
    #[error("request body is empty")]
    EmptyBody,
    #[error("unable to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Check that `path` names an existing `.fit` file large enough to decode.
pub fn validate_fit_path(path: &Path) -> Result<(), ValidationError> {
    let display = path.display().to_string();
    if display.trim().is_empty() {
        return Err(ValidationError::MissingPath);
    }

    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ValidationError::NotFound(display));
        }
        Err(source) => {
            return Err(ValidationError::Io {
                path: display,
                source,
            });
        }
    };

    if !metadata.is_file() {
        return Err(ValidationError::NotAFile(display));
    }

    let has_fit_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("fit"));
    if !has_fit_extension {
        return Err(ValidationError::WrongExtension(display));
    }

    if metadata.len() <= MIN_FIT_FILE_BYTES {
        return Err(ValidationError::TooSmall {
            size: metadata.len(),
        });
    }

    Ok(())
}

/// Validate then read a FIT file from disk.
pub fn read_fit_file(path: &Path) -> Result<Vec<u8>, ValidationError> {
    validate_fit_path(path)?;
    std::fs::read(path).map_err(|source| ValidationError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Reject an upload with nothing in it.
pub fn validate_upload(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.is_empty() {
        Err(ValidationError::EmptyBody)
    } else {
        Ok(())
    }
}
