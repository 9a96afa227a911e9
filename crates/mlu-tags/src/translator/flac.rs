use std::{fs, path::Path, sync::Arc};

use lofty::{
    config::WriteOptions,
    file::AudioFile,
    flac::FlacFile,
    ogg::{OggPictureStorage, VorbisComments},
};
use tracing::{Level, debug, info, instrument};

use super::{FormatTranslator, base_properties, mp3::vbr, open_file, replay_gain_from};
use crate::{
    config::HandlerConfig,
    error::{Error, Result},
    format::AudioFormat,
    model::{CanonicalProperties, CanonicalTags, ReplayGain, TagField},
    native::NativeTable,
};

/// Clave Vorbis (en minúsculas) de cada campo fijo.
pub const FIELD_KEYS: [(TagField, &str); 21] = [
    (TagField::Title, "title"),
    (TagField::Artist, "artist"),
    (TagField::Album, "album"),
    (TagField::AlbumArtist, "albumartist"),
    (TagField::Composer, "composer"),
    (TagField::Date, "date"),
    (TagField::Genre, "genre"),
    (TagField::TrackNumber, "tracknumber"),
    (TagField::TotalTracks, "tracktotal"),
    (TagField::DiscNumber, "discnumber"),
    (TagField::TotalDiscs, "disctotal"),
    (TagField::Bpm, "bpm"),
    (TagField::Key, "key"),
    (TagField::Lyrics, "lyrics"),
    (TagField::Comment, "comment"),
    (TagField::DateAdded, "date_added"),
    (TagField::DateAllPlays, "date_all_plays"),
    (TagField::DateLastPlayed, "date_last_played"),
    (TagField::PlayCount, "play_count"),
    (TagField::Votes, "votes"),
    (TagField::Rating, "rating"),
];

pub const REPLAY_GAIN_KEYS: [&str; 4] = [
    "replaygain_album_gain",
    "replaygain_album_peak",
    "replaygain_track_gain",
    "replaygain_track_peak",
];

pub fn field_key(field: TagField) -> &'static str {
    FIELD_KEYS
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, key)| *key)
        .unwrap_or_default()
}

/// Comentarios Vorbis → tabla nativa con claves en minúsculas.
pub fn comments_table(comments: &VorbisComments) -> NativeTable<String> {
    comments
        .items()
        .map(|(key, value)| (key.to_lowercase(), value.to_string()))
        .collect()
}

pub fn decode_tags(table: &NativeTable<String>) -> CanonicalTags {
    let mut tags = CanonicalTags::default();
    for (field, key) in FIELD_KEYS {
        tags.set(field, table.decode(key));
    }

    for (key, _) in table.iter() {
        let known = FIELD_KEYS.iter().any(|(_, k)| *k == key.as_str()) || REPLAY_GAIN_KEYS.contains(&key.as_str());
        if !known {
            tags.other_tags.insert(key.to_lowercase(), table.decode(key.as_str()));
        }
    }
    tags
}

pub fn decode_replay_gain(table: &NativeTable<String>) -> ReplayGain {
    replay_gain_from(REPLAY_GAIN_KEYS, |key| table.decode(key))
}

/// Reemplaza en `comments` los cinco campos dinámicos.
pub fn encode_dynamic(tags: &CanonicalTags, comments: &mut VorbisComments) {
    for (field, value) in tags.dynamic_fields() {
        let key = field_key(field);
        let _ = comments.remove(key).count();
        comments.push(key.to_string(), value.to_string());
    }
}

const FLAC_MARKER: &[u8; 4] = b"fLaC";
const LAST_BLOCK_FLAG: u8 = 0x80;
/// Cabecera de un bloque PADDING vacío marcado como último.
const EMPTY_LAST_PADDING: [u8; 4] = [LAST_BLOCK_FLAG | 1, 0, 0, 0];

/// Si STREAMINFO es el último bloque de metadatos, le quita la marca y añade
/// detrás un PADDING vacío que pasa a cerrar la cadena. lofty inserta el
/// bloque de comentarios nuevo justo después de STREAMINFO sin tocar esa
/// marca. Devuelve `true` si `bytes` cambió.
pub fn reopen_metadata_chain(bytes: &mut Vec<u8>) -> bool {
    let marker = vbr::id3v2_size(bytes);
    let header = marker + FLAC_MARKER.len();
    if bytes.get(marker..header) != Some(FLAC_MARKER.as_slice()) {
        return false;
    }
    let Some(&[flags, a, b, c]) = bytes.get(header..header + 4) else {
        return false;
    };
    if flags & LAST_BLOCK_FLAG == 0 {
        return false;
    }

    let end = header + 4 + u32::from_be_bytes([0, a, b, c]) as usize;
    if end > bytes.len() {
        return false;
    }
    bytes[header] = flags & !LAST_BLOCK_FLAG;
    bytes.splice(end..end, EMPTY_LAST_PADDING);
    true
}

#[derive(Debug, Clone)]
pub struct FlacTranslator {
    config: Arc<HandlerConfig>,
}

impl FlacTranslator {
    pub fn new(config: Arc<HandlerConfig>) -> Self {
        Self { config }
    }

    fn open(&self, path: &Path) -> Result<FlacFile> {
        let mut file = open_file(path)?;
        Ok(FlacFile::read_from(&mut file, self.config.parse_options())?)
    }

    fn table(&self, flac: &FlacFile) -> NativeTable<String> {
        flac.vorbis_comments().map(comments_table).unwrap_or_default()
    }
}

impl FormatTranslator for FlacTranslator {
    fn format(&self) -> AudioFormat {
        AudioFormat::Flac
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_tags(&self, path: &Path) -> Result<CanonicalTags> {
        let flac = self.open(path)?;
        let table = self.table(&flac);
        debug!(keys = table.len(), "Vorbis comments read");
        Ok(decode_tags(&table))
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_properties(&self, path: &Path) -> Result<CanonicalProperties> {
        let flac = self.open(path)?;
        let props = flac.properties();

        let mut out = base_properties(path, AudioFormat::Flac, &self.config)?;
        out.duration = props.duration().as_secs_f64();
        out.bit_rate = props.audio_bitrate();
        out.bit_depth = Some(props.bit_depth());
        out.num_channels = props.channels();
        out.sample_rate = props.sample_rate();
        out.replay_gain = decode_replay_gain(&self.table(&flac));
        Ok(out)
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_artwork(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        let flac = self.open(path)?;
        let blocks = flac.pictures().iter().map(|(pic, _)| pic.data().to_vec());
        let embedded = flac
            .vorbis_comments()
            .into_iter()
            .flat_map(|vc| vc.pictures().iter().map(|(pic, _)| pic.data().to_vec()));
        Ok(blocks.chain(embedded).collect())
    }

    #[instrument(level = Level::TRACE, skip(self, tags), err)]
    fn write_tags(&self, path: &Path, tags: &CanonicalTags) -> Result<()> {
        let mut flac = self.open(path)?;
        if flac.vorbis_comments().is_none() {
            debug!("No comment block, creating one");
            let mut bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
            if reopen_metadata_chain(&mut bytes) {
                fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
            }
            flac.set_vorbis_comments(VorbisComments::default());
        }
        if let Some(comments) = flac.vorbis_comments_mut() {
            encode_dynamic(tags, comments);
        }
        flac.save_to_path(path, WriteOptions::default())?;
        info!(path = %path.display(), "FLAC tags saved");
        Ok(())
    }
}
