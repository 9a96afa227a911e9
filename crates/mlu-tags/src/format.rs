use std::path::Path;

use serde::{Deserialize, Serialize};

/// Formatos de audio soportados por el handler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AudioFormat {
    #[serde(rename = "FLAC")]
    Flac,
    #[serde(rename = "MP3")]
    Mp3,
    #[serde(rename = "M4A")]
    M4a,
}

impl AudioFormat {
    pub const ALL: &'static [AudioFormat] = &[AudioFormat::Flac, AudioFormat::Mp3, AudioFormat::M4a];

    /// Extensión en minúsculas, sin el punto.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Flac => "flac",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
        }
    }

    /// Etiqueta usada en `CanonicalProperties::format`.
    pub fn label(&self) -> &'static str {
        match self {
            AudioFormat::Flac => "FLAC",
            AudioFormat::Mp3 => "MP3",
            AudioFormat::M4a => "M4A",
        }
    }

    pub fn supports_write(&self) -> bool {
        !matches!(self, AudioFormat::M4a)
    }

    /// Extensión de `path` en minúsculas (vacía si no tiene).
    pub fn extension_of(path: &Path) -> String {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim_start_matches('.').to_ascii_lowercase();
        AudioFormat::ALL
            .iter()
            .find(|fmt| fmt.extension() == lower)
            .copied()
            .ok_or_else(|| format!("Extension not supported: {}", s))
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
