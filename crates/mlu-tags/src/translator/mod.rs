//! Traductores por formato: tabla nativa ↔ registro canónico.

pub mod flac;
pub mod m4a;
pub mod mp3;

use std::{fs::File, path::Path, sync::Arc};

use crate::{
    config::HandlerConfig,
    error::{Error, Result},
    file_info::FileInfo,
    format::AudioFormat,
    model::{CanonicalProperties, CanonicalTags, ReplayGain},
};

pub use flac::FlacTranslator;
pub use m4a::M4aTranslator;
pub use mp3::Mp3Translator;

/// Operaciones que todo formato debe ofrecer.
pub trait FormatTranslator {
    fn format(&self) -> AudioFormat;

    fn read_tags(&self, path: &Path) -> Result<CanonicalTags>;

    fn read_properties(&self, path: &Path) -> Result<CanonicalProperties>;

    /// Bytes crudos de cada imagen embebida, en orden de almacenamiento.
    fn read_artwork(&self, path: &Path) -> Result<Vec<Vec<u8>>>;

    /// Persiste los cinco campos dinámicos de `tags`.
    fn write_tags(&self, _path: &Path, _tags: &CanonicalTags) -> Result<()> {
        Err(Error::UnsupportedWrite(self.format()))
    }
}

/// Traductor ligado a un formato concreto.
#[derive(Debug, Clone)]
pub enum Translator {
    Flac(FlacTranslator),
    Mp3(Mp3Translator),
    M4a(M4aTranslator),
}

impl Translator {
    pub fn for_format(format: AudioFormat, config: Arc<HandlerConfig>) -> Self {
        match format {
            AudioFormat::Flac => Translator::Flac(FlacTranslator::new(config)),
            AudioFormat::Mp3 => Translator::Mp3(Mp3Translator::new(config)),
            AudioFormat::M4a => Translator::M4a(M4aTranslator::new(config)),
        }
    }

    fn inner(&self) -> &dyn FormatTranslator {
        match self {
            Translator::Flac(t) => t,
            Translator::Mp3(t) => t,
            Translator::M4a(t) => t,
        }
    }
}

impl FormatTranslator for Translator {
    fn format(&self) -> AudioFormat {
        self.inner().format()
    }

    fn read_tags(&self, path: &Path) -> Result<CanonicalTags> {
        self.inner().read_tags(path)
    }

    fn read_properties(&self, path: &Path) -> Result<CanonicalProperties> {
        self.inner().read_properties(path)
    }

    fn read_artwork(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        self.inner().read_artwork(path)
    }

    fn write_tags(&self, path: &Path, tags: &CanonicalTags) -> Result<()> {
        self.inner().write_tags(path, tags)
    }
}

pub(crate) fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::io(path, e))
}

/// Propiedades comunes a todos los formatos; cada traductor completa el resto.
pub(crate) fn base_properties(path: &Path, format: AudioFormat, config: &HandlerConfig) -> Result<CanonicalProperties> {
    let info = FileInfo::new(path)?;
    Ok(CanonicalProperties {
        file_size: info.file_size(),
        file_date_modified: info.formatted_modified(&config.timestamp_format)?,
        duration: 0.0,
        format,
        bit_rate: 0,
        bit_depth: None,
        num_channels: 0,
        sample_rate: 0,
        encoder: String::new(),
        bit_rate_mode: Default::default(),
        codec: String::new(),
        replay_gain: ReplayGain::default(),
    })
}

/// Arma `ReplayGain` a partir de cuatro claves nativas
/// (album gain, album peak, track gain, track peak).
pub(crate) fn replay_gain_from<F>(keys: [&str; 4], mut decode: F) -> ReplayGain
where
    F: FnMut(&str) -> String,
{
    let [album_gain, album_peak, track_gain, track_peak] = keys;
    ReplayGain {
        album_gain: decode(album_gain),
        album_peak: decode(album_peak),
        track_gain: decode(track_gain),
        track_peak: decode(track_peak),
    }
}

#[cfg(test)]
pub(crate) mod fixtures;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translator_reports_its_format() {
        let config = Arc::new(HandlerConfig::default());
        for format in AudioFormat::ALL {
            assert_eq!(Translator::for_format(*format, config.clone()).format(), *format);
        }
    }

    #[test]
    fn replay_gain_keeps_key_order() {
        let rg = replay_gain_from(["a", "b", "c", "d"], |k| k.to_uppercase());
        assert_eq!(rg.album_gain, "A");
        assert_eq!(rg.album_peak, "B");
        assert_eq!(rg.track_gain, "C");
        assert_eq!(rg.track_peak, "D");
    }
}
