//! Lectura y escritura normalizada de metadatos para FLAC, MP3 y M4A.
//!
//! Cada formato tiene su propio esquema de claves (comentarios Vorbis, frames
//! ID3v2, átomos `ilst`); los traductores los llevan a un único
//! [`CanonicalTags`] y a un [`CanonicalProperties`].

pub mod codec;
pub mod config;
pub mod error;
pub mod file_info;
pub mod format;
pub mod handler;
pub mod model;
pub mod native;
pub mod translator;

pub use crate::config::{HandlerConfig, HandlerConfigBuilder, TagParsingMode};
pub use error::{Error, Result};
pub use format::AudioFormat;
pub use handler::MetadataHandler;
pub use model::{BitRateMode, CanonicalProperties, CanonicalTags, ReplayGain, TagField};
pub use translator::{FormatTranslator, Translator};
