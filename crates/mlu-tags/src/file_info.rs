use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::{
    DateTime, Local,
    format::{Item, StrftimeItems},
};

use crate::error::{Error, Result};

/// Rechaza formatos con especificadores que `chrono` no reconoce.
pub fn validate_timestamp_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidTimestampFormat(format.to_string()));
    }
    Ok(())
}

/// Tamaño y fecha de modificación de un archivo.
#[derive(Debug, Clone)]
pub struct FileInfo {
    path: PathBuf,
    file_size: u64,
    modified_date: SystemTime,
}

impl FileInfo {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let metadata = fs::metadata(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::InvalidPath(path.clone())
            } else {
                Error::io(&path, e)
            }
        })?;

        let modified_date = metadata.modified().map_err(|e| Error::io(&path, e))?;

        Ok(Self {
            path,
            file_size: metadata.len(),
            modified_date,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn modified_date(&self) -> SystemTime {
        self.modified_date
    }

    /// Fecha de modificación en hora local con el formato `chrono` dado.
    pub fn formatted_modified(&self, format: &str) -> Result<String> {
        validate_timestamp_format(format)?;
        let local: DateTime<Local> = self.modified_date.into();
        let mut out = String::new();
        write!(out, "{}", local.format(format))
            .map_err(|_| Error::InvalidTimestampFormat(format.to_string()))?;
        Ok(out)
    }
}
