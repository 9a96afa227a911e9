use std::path::Path;

use ::config::{Config, File, FileFormat};
use derive_builder::Builder;
use lofty::config::{ParseOptions, ParsingMode};
use serde::{Deserialize, Serialize};

use crate::{error::Result, file_info::validate_timestamp_format};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_MPEG_SCAN_BYTES: usize = 64 * 1024;

/// Tolerancia del parser ante contenedores mal formados.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagParsingMode {
    Strict,
    #[default]
    BestAttempt,
    Relaxed,
}

impl From<TagParsingMode> for ParsingMode {
    fn from(mode: TagParsingMode) -> Self {
        match mode {
            TagParsingMode::Strict => ParsingMode::Strict,
            TagParsingMode::BestAttempt => ParsingMode::BestAttempt,
            TagParsingMode::Relaxed => ParsingMode::Relaxed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct HandlerConfig {
    pub parsing_mode: TagParsingMode,
    /// Formato `chrono` de `fileDateModified`.
    pub timestamp_format: String,
    /// Guardar los tags de MP3 como ID3v2.3.
    pub id3v23_on_write: bool,
    /// Bytes leídos tras el tag ID3v2 al buscar la cabecera Xing/VBRI.
    pub mpeg_scan_bytes: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig {
            parsing_mode: TagParsingMode::default(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            id3v23_on_write: true,
            mpeg_scan_bytes: DEFAULT_MPEG_SCAN_BYTES,
        }
    }
}

impl HandlerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let cfg = Config::builder()
            .add_source(File::new(&path, FileFormat::Toml))
            .build()?;
        let hc = cfg.try_deserialize::<HandlerConfig>()?;
        validate_timestamp_format(&hc.timestamp_format)?;
        Ok(hc)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Opciones de lectura de lofty. Siempre lee las carátulas para que una
    /// escritura posterior no las pierda.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new()
            .parsing_mode(self.parsing_mode.into())
            .read_cover_art(true)
    }
}
