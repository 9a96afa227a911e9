pub mod vbr;

use std::{path::Path, sync::Arc};

use lofty::{
    config::WriteOptions,
    file::AudioFile,
    id3::v2::{Frame, Id3v2Tag},
    mpeg::MpegFile,
    tag::TagExt,
};
use tracing::{Level, debug, info, instrument};

use super::{FormatTranslator, base_properties, open_file, replay_gain_from};
use crate::{
    codec,
    config::HandlerConfig,
    error::Result,
    format::AudioFormat,
    model::{CanonicalProperties, CanonicalTags, ReplayGain, TagField},
    native::NativeTable,
};

/// Clave nativa de cada campo fijo, salvo los pares número/total.
pub const FIELD_KEYS: [(TagField, &str); 17] = [
    (TagField::Title, "TIT2"),
    (TagField::Artist, "TPE1"),
    (TagField::Album, "TALB"),
    (TagField::AlbumArtist, "TPE2"),
    (TagField::Composer, "TCOM"),
    (TagField::Date, "TDRC"),
    (TagField::Genre, "TCON"),
    (TagField::Bpm, "TBPM"),
    (TagField::Key, "TXXX:Key"),
    (TagField::Lyrics, "TXXX:LYRICS"),
    (TagField::Comment, "COMM::eng"),
    (TagField::DateAdded, "TXXX:DATE_ADDED"),
    (TagField::DateAllPlays, "TXXX:DATE_ALL_PLAYS"),
    (TagField::DateLastPlayed, "TXXX:DATE_LAST_PLAYED"),
    (TagField::PlayCount, "TXXX:PLAY_COUNT"),
    (TagField::Votes, "TXXX:VOTES"),
    (TagField::Rating, "TXXX:RATING"),
];

/// `TRCK` → trackNumber/totalTracks.
pub const TRACK_KEY: &str = "TRCK";
/// `TPOS` → discNumber/totalDiscs.
pub const DISC_KEY: &str = "TPOS";

pub const REPLAY_GAIN_KEYS: [&str; 4] = [
    "TXXX:replaygain_album_gain",
    "TXXX:replaygain_album_peak",
    "TXXX:replaygain_track_gain",
    "TXXX:replaygain_track_peak",
];

pub const ID3V1_COMMENT_KEY: &str = "COMM:ID3v1 Comment:eng";
pub const PICTURE_PREFIX: &str = "APIC:";
pub const USER_TEXT_PREFIX: &str = "TXXX:";

/// Separador de valores múltiples en los frames de texto ID3v2.4.
const ID3_VALUE_SEPARATOR: char = '\0';

/// Une rol y nombre en los frames `TIPL`/`TMCL`/`IPLS`.
const KEY_VALUE_SEPARATOR: char = ':';

pub fn field_key(field: TagField) -> Option<&'static str> {
    FIELD_KEYS.iter().find(|(f, _)| *f == field).map(|(_, key)| *key)
}

fn split_text(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(ID3_VALUE_SEPARATOR).map(str::to_string)
}

/// Clave nativa y valores de un frame. `None` para frames binarios sin
/// representación de texto.
pub fn frame_entry(frame: &Frame<'_>) -> Option<(String, Vec<String>)> {
    let id = frame.id().as_str();
    let entry = match frame {
        Frame::Text(f) => (id.to_string(), split_text(&f.value).collect()),
        Frame::UserText(f) => (format!("{USER_TEXT_PREFIX}{}", f.description), split_text(&f.content).collect()),
        Frame::Comment(f) => (
            format!("{id}:{}:{}", f.description, String::from_utf8_lossy(&f.language)),
            vec![f.content.to_string()],
        ),
        Frame::UnsynchronizedText(f) => (
            format!("{id}:{}:{}", f.description, String::from_utf8_lossy(&f.language)),
            vec![f.content.to_string()],
        ),
        Frame::Url(f) => (id.to_string(), vec![f.url().to_string()]),
        Frame::UserUrl(f) => (format!("{id}:{}", f.description), vec![f.content.to_string()]),
        Frame::Picture(f) => (
            format!("{PICTURE_PREFIX}{}", f.picture.description().unwrap_or_default()),
            vec![String::new()],
        ),
        Frame::Timestamp(f) => (id.to_string(), vec![f.timestamp.to_string()]),
        Frame::Popularimeter(f) => (format!("{id}:{}", f.email), vec![f.rating.to_string()]),
        Frame::KeyValue(f) => (
            id.to_string(),
            f.key_value_pairs
                .iter()
                .map(|(key, value)| format!("{key}{KEY_VALUE_SEPARATOR}{value}"))
                .collect(),
        ),
        _ => {
            debug!(frame = id, "Skipping binary frame");
            return None;
        }
    };
    Some(entry)
}

pub fn tag_table(tag: &Id3v2Tag) -> NativeTable<String> {
    let mut table = NativeTable::new();
    for frame in tag {
        if let Some((key, values)) = frame_entry(frame) {
            for value in values {
                table.push(key.clone(), value);
            }
        }
    }
    table
}

fn is_replay_gain_key(key: &str) -> bool {
    REPLAY_GAIN_KEYS.iter().any(|rg| rg.eq_ignore_ascii_case(key))
}

fn is_excluded(key: &str) -> bool {
    key.contains(PICTURE_PREFIX) || key == ID3V1_COMMENT_KEY || is_replay_gain_key(key)
}

/// Nombre en `otherTags`: sin el prefijo `TXXX:` y en minúsculas.
pub fn other_tag_name(key: &str) -> String {
    key.strip_prefix(USER_TEXT_PREFIX).unwrap_or(key).to_lowercase()
}

pub fn decode_tags(table: &NativeTable<String>) -> CanonicalTags {
    let mut tags = CanonicalTags::default();
    for (field, key) in FIELD_KEYS {
        tags.set(field, table.decode(key));
    }

    let (track, total_tracks) = codec::split_slash_pair(&table.decode(TRACK_KEY));
    tags.track_number = track;
    tags.total_tracks = total_tracks;
    let (disc, total_discs) = codec::split_slash_pair(&table.decode(DISC_KEY));
    tags.disc_number = disc;
    tags.total_discs = total_discs;

    for (key, values) in table.iter() {
        let fixed = key == TRACK_KEY || key == DISC_KEY || FIELD_KEYS.iter().any(|(_, k)| *k == key.as_str());
        if !fixed && !is_excluded(key) {
            tags.other_tags.insert(other_tag_name(key), codec::decode_values(Some(values)));
        }
    }
    tags
}

pub fn decode_replay_gain(table: &NativeTable<String>) -> ReplayGain {
    replay_gain_from(REPLAY_GAIN_KEYS, |key| table.decode_ignore_ascii_case(key))
}

/// Escribe los cinco campos dinámicos como frames `TXXX`.
pub fn encode_dynamic(tags: &CanonicalTags, tag: &mut Id3v2Tag) {
    for (field, value) in tags.dynamic_fields() {
        let Some(description) = field_key(field).and_then(|k| k.strip_prefix(USER_TEXT_PREFIX)) else {
            continue;
        };
        tag.insert_user_text(description.to_string(), value.to_string());
    }
}

/// Cualquier frame `APIC`, en orden.
pub fn tag_pictures(tag: &Id3v2Tag) -> Vec<Vec<u8>> {
    tag.into_iter()
        .filter_map(|frame| match frame {
            Frame::Picture(f) => Some(f.picture.data().to_vec()),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Mp3Translator {
    config: Arc<HandlerConfig>,
}

impl Mp3Translator {
    pub fn new(config: Arc<HandlerConfig>) -> Self {
        Self { config }
    }

    fn open(&self, path: &Path) -> Result<MpegFile> {
        let mut file = open_file(path)?;
        Ok(MpegFile::read_from(&mut file, self.config.parse_options())?)
    }

    fn table(&self, mpeg: &MpegFile) -> NativeTable<String> {
        mpeg.id3v2().map(tag_table).unwrap_or_default()
    }
}

impl FormatTranslator for Mp3Translator {
    fn format(&self) -> AudioFormat {
        AudioFormat::Mp3
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_tags(&self, path: &Path) -> Result<CanonicalTags> {
        let mpeg = self.open(path)?;
        let table = self.table(&mpeg);
        debug!(keys = table.len(), "ID3v2 frames read");
        Ok(decode_tags(&table))
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_properties(&self, path: &Path) -> Result<CanonicalProperties> {
        let mpeg = self.open(path)?;
        let props = mpeg.properties();
        let vbr = vbr::read_vbr_info(path, self.config.mpeg_scan_bytes)?;

        let mut out = base_properties(path, AudioFormat::Mp3, &self.config)?;
        out.duration = props.duration().as_secs_f64();
        out.bit_rate = props.audio_bitrate();
        out.num_channels = props.channels();
        out.sample_rate = props.sample_rate();
        out.encoder = vbr.encoder();
        out.bit_rate_mode = vbr.mode;
        out.replay_gain = decode_replay_gain(&self.table(&mpeg));
        Ok(out)
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_artwork(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        let mpeg = self.open(path)?;
        Ok(mpeg.id3v2().map(tag_pictures).unwrap_or_default())
    }

    /// Solo se guarda el tag ID3v2; el resto del archivo no se reescribe.
    #[instrument(level = Level::TRACE, skip(self, tags), err)]
    fn write_tags(&self, path: &Path, tags: &CanonicalTags) -> Result<()> {
        let mut tag = self.open(path)?.id3v2().cloned().unwrap_or_else(|| {
            debug!("No ID3v2 tag, creating one");
            Id3v2Tag::new()
        });
        encode_dynamic(tags, &mut tag);

        let options = WriteOptions::new().use_id3v23(self.config.id3v23_on_write);
        tag.save_to_path(path, options)?;
        info!(path = %path.display(), id3v23 = self.config.id3v23_on_write, "MP3 tags saved");
        Ok(())
    }
}
