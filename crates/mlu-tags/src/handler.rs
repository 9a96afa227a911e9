use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use tracing::{Level, debug, instrument};

use crate::{
    config::HandlerConfig,
    error::{Error, Result},
    format::AudioFormat,
    model::{CanonicalProperties, CanonicalTags},
    translator::{FormatTranslator, Translator},
};

/// Punto de entrada: un archivo de audio y el traductor de su formato.
///
/// ```no_run
/// use mlu_tags::MetadataHandler;
///
/// let handler = MetadataHandler::new("/music/song.flac")?;
/// let mut tags = handler.read_tags()?;
/// tags.play_count = "1".into();
/// handler.write_tags(&tags)?;
/// # Ok::<(), mlu_tags::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MetadataHandler {
    path: PathBuf,
    translator: Translator,
}

impl MetadataHandler {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(path, Arc::new(HandlerConfig::default()))
    }

    #[instrument(level = Level::TRACE, skip_all, err)]
    pub fn with_config(path: impl Into<PathBuf>, config: Arc<HandlerConfig>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(Error::InvalidPath(path));
        }

        let extension = AudioFormat::extension_of(&path);
        let format = AudioFormat::from_str(&extension).map_err(|_| Error::UnsupportedFormat {
            path: path.clone(),
            extension,
        })?;
        debug!(path = %path.display(), %format, "Translator selected");

        Ok(Self {
            translator: Translator::for_format(format, config),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> AudioFormat {
        self.translator.format()
    }

    pub fn read_tags(&self) -> Result<CanonicalTags> {
        self.translator.read_tags(&self.path)
    }

    pub fn read_properties(&self) -> Result<CanonicalProperties> {
        self.translator.read_properties(&self.path)
    }

    pub fn read_artwork(&self) -> Result<Vec<Vec<u8>>> {
        self.translator.read_artwork(&self.path)
    }

    /// Solo FLAC y MP3; en M4A devuelve `Error::UnsupportedWrite`.
    pub fn write_tags(&self, tags: &CanonicalTags) -> Result<()> {
        self.translator.write_tags(&self.path, tags)
    }
}
