use std::{borrow::Cow, fmt, path::Path, sync::Arc};

use lofty::{
    file::AudioFile,
    mp4::{AtomData, AtomIdent, Ilst, Mp4Codec, Mp4File},
};
use tracing::{Level, debug, instrument, warn};

use super::{FormatTranslator, base_properties, open_file, replay_gain_from};
use crate::{
    codec,
    config::HandlerConfig,
    error::Result,
    format::AudioFormat,
    model::{CanonicalProperties, CanonicalTags, ReplayGain, TagField},
    native::{NativeTable, NativeValue, decode_slice},
};

pub const ITUNES_MEAN: &str = "com.apple.iTunes";

pub const FOURCC_FIELDS: [(TagField, [u8; 4]); 9] = [
    (TagField::Title, *b"\xa9nam"),
    (TagField::Artist, *b"\xa9ART"),
    (TagField::Album, *b"\xa9alb"),
    (TagField::AlbumArtist, *b"aART"),
    (TagField::Composer, *b"\xa9wrt"),
    (TagField::Date, *b"\xa9day"),
    (TagField::Genre, *b"\xa9gen"),
    (TagField::Lyrics, *b"\xa9lyr"),
    (TagField::Comment, *b"\xa9cmt"),
];

/// Átomos libres `----:com.apple.iTunes:<name>`; el nombre se compara sin
/// distinguir mayúsculas.
pub const FREEFORM_FIELDS: [(TagField, &str); 8] = [
    (TagField::Key, "key"),
    (TagField::Bpm, "BPM"),
    (TagField::DateAdded, "DATE_ADDED"),
    (TagField::DateAllPlays, "DATE_ALL_PLAYS"),
    (TagField::DateLastPlayed, "DATE_LAST_PLAYED"),
    (TagField::PlayCount, "PLAY_COUNT"),
    (TagField::Votes, "VOTES"),
    (TagField::Rating, "RATING"),
];

pub const TRACK_ATOM: [u8; 4] = *b"trkn";
pub const DISC_ATOM: [u8; 4] = *b"disk";
pub const COVER_ATOM: [u8; 4] = *b"covr";

pub const REPLAY_GAIN_NAMES: [&str; 4] = [
    "replaygain_album_gain",
    "replaygain_album_peak",
    "replaygain_track_gain",
    "replaygain_track_peak",
];

/// Datos del encoder (gapless, normalización) que no son tags.
pub const ENCODER_METADATA_NAMES: [&str; 2] = ["itunsmpb", "itunnorm"];

/// Identificador de átomo; los códigos se comparan byte a byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomKey {
    Fourcc([u8; 4]),
    Freeform { mean: String, name: String },
}

impl AtomKey {
    pub fn itunes(name: impl Into<String>) -> Self {
        AtomKey::Freeform {
            mean: ITUNES_MEAN.to_string(),
            name: name.into(),
        }
    }

    fn itunes_name(&self) -> Option<&str> {
        match self {
            AtomKey::Freeform { mean, name } if mean == ITUNES_MEAN => Some(name),
            _ => None,
        }
    }

    pub fn is_itunes(&self, name: &str) -> bool {
        self.itunes_name().is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    /// Nombre en `otherTags`. Los códigos se leen como Latin-1 (`©` = 0xA9).
    pub fn other_tag_name(&self) -> String {
        match self {
            AtomKey::Fourcc(code) => code.iter().map(|b| char::from(*b)).collect::<String>().to_lowercase(),
            AtomKey::Freeform { mean, name } if mean == ITUNES_MEAN => name.to_lowercase(),
            AtomKey::Freeform { mean, name } => format!("----:{mean}:{name}").to_lowercase(),
        }
    }
}

impl fmt::Display for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtomKey::Fourcc(code) => write!(f, "{}", code.iter().map(|b| char::from(*b)).collect::<String>()),
            AtomKey::Freeform { mean, name } => write!(f, "----:{mean}:{name}"),
        }
    }
}

impl From<&AtomIdent<'_>> for AtomKey {
    fn from(ident: &AtomIdent<'_>) -> Self {
        match ident {
            AtomIdent::Fourcc(code) => AtomKey::Fourcc(*code),
            AtomIdent::Freeform { mean, name } => AtomKey::Freeform {
                mean: mean.to_string(),
                name: name.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomValue {
    Text(String),
    /// `trkn`/`disk`: (número, total).
    Pair(u16, u16),
    Integer(i64),
    Bool(bool),
    /// Carga binaria; se decodifica como UTF-8 con pérdida.
    Bytes(Vec<u8>),
    Picture(Vec<u8>),
}

impl NativeValue for AtomValue {
    fn to_text(&self) -> Cow<'_, str> {
        match self {
            AtomValue::Text(s) => Cow::Borrowed(s),
            AtomValue::Pair(n, t) => Cow::Owned(format!("{n}/{t}")),
            AtomValue::Integer(i) => Cow::Owned(i.to_string()),
            AtomValue::Bool(b) => Cow::Borrowed(if *b { "1" } else { "0" }),
            AtomValue::Bytes(data) => String::from_utf8_lossy(data),
            AtomValue::Picture(_) => Cow::Borrowed(""),
        }
    }
}

fn is_pair_atom(key: &AtomKey) -> bool {
    matches!(key, AtomKey::Fourcc(code) if *code == TRACK_ATOM || *code == DISC_ATOM)
}

fn atom_value(key: &AtomKey, data: &AtomData) -> AtomValue {
    match data {
        AtomData::UTF8(s) | AtomData::UTF16(s) => AtomValue::Text(s.clone()),
        AtomData::Picture(pic) => AtomValue::Picture(pic.data().to_vec()),
        AtomData::SignedInteger(i) => AtomValue::Integer(i64::from(*i)),
        AtomData::UnsignedInteger(u) => AtomValue::Integer(i64::from(*u)),
        AtomData::Bool(b) => AtomValue::Bool(*b),
        AtomData::Unknown { data, .. } if is_pair_atom(key) && data.len() >= 6 => {
            AtomValue::Pair(u16::from_be_bytes([data[2], data[3]]), u16::from_be_bytes([data[4], data[5]]))
        }
        AtomData::Unknown { data, .. } => AtomValue::Bytes(data.clone()),
        #[allow(unreachable_patterns)]
        _ => AtomValue::Bytes(Vec::new()),
    }
}

pub fn ilst_table(ilst: &Ilst) -> NativeTable<AtomKey, AtomValue> {
    let mut table = NativeTable::new();
    for atom in ilst {
        let key = AtomKey::from(atom.ident());
        for data in atom.data() {
            let value = atom_value(&key, data);
            table.push(key.clone(), value);
        }
    }
    table
}

fn decode_pair(table: &NativeTable<AtomKey, AtomValue>, atom: [u8; 4]) -> (String, String) {
    let key = AtomKey::Fourcc(atom);
    match table.get(&key) {
        None => (String::new(), String::new()),
        Some([AtomValue::Pair(number, total), ..]) => codec::format_number_pair(u32::from(*number), u32::from(*total)),
        Some(other) => {
            warn!(atom = %key, value = ?other, "Atom is not a number pair, ignoring");
            (String::new(), String::new())
        }
    }
}

fn is_excluded(key: &AtomKey) -> bool {
    match key {
        AtomKey::Fourcc(code) => *code == COVER_ATOM,
        AtomKey::Freeform { .. } => {
            let name = key.other_tag_name();
            REPLAY_GAIN_NAMES.contains(&name.as_str()) || ENCODER_METADATA_NAMES.contains(&name.as_str())
        }
    }
}

fn is_fixed(key: &AtomKey) -> bool {
    match key {
        AtomKey::Fourcc(code) => {
            *code == TRACK_ATOM || *code == DISC_ATOM || FOURCC_FIELDS.iter().any(|(_, c)| c == code)
        }
        AtomKey::Freeform { .. } => FREEFORM_FIELDS.iter().any(|(_, name)| key.is_itunes(name)),
    }
}

pub fn decode_tags(table: &NativeTable<AtomKey, AtomValue>) -> CanonicalTags {
    let mut tags = CanonicalTags::default();
    for (field, code) in FOURCC_FIELDS {
        tags.set(field, table.decode(&AtomKey::Fourcc(code)));
    }
    for (field, name) in FREEFORM_FIELDS {
        tags.set(field, decode_slice(table.find(|k| k.is_itunes(name))));
    }

    let (track, total_tracks) = decode_pair(table, TRACK_ATOM);
    tags.track_number = track;
    tags.total_tracks = total_tracks;
    let (disc, total_discs) = decode_pair(table, DISC_ATOM);
    tags.disc_number = disc;
    tags.total_discs = total_discs;

    for (key, values) in table.iter() {
        if !is_fixed(key) && !is_excluded(key) {
            tags.other_tags.insert(key.other_tag_name(), decode_slice(Some(values)));
        }
    }
    tags
}

pub fn decode_replay_gain(table: &NativeTable<AtomKey, AtomValue>) -> ReplayGain {
    replay_gain_from(REPLAY_GAIN_NAMES, |name| decode_slice(table.find(|k| k.is_itunes(name))))
}

pub fn cover_art(table: &NativeTable<AtomKey, AtomValue>) -> Vec<Vec<u8>> {
    table
        .get(&AtomKey::Fourcc(COVER_ATOM))
        .unwrap_or_default()
        .iter()
        .filter_map(|value| match value {
            AtomValue::Picture(data) => Some(data.clone()),
            _ => None,
        })
        .collect()
}

pub fn codec_name(codec: &Mp4Codec) -> String {
    match codec {
        Mp4Codec::AAC => "AAC".to_string(),
        Mp4Codec::ALAC => "ALAC".to_string(),
        Mp4Codec::MP3 => "MP3".to_string(),
        Mp4Codec::FLAC => "FLAC".to_string(),
        _ => String::new(),
    }
}

/// Solo lectura: no hay escritura de tags para MP4.
#[derive(Debug, Clone)]
pub struct M4aTranslator {
    config: Arc<HandlerConfig>,
}

impl M4aTranslator {
    pub fn new(config: Arc<HandlerConfig>) -> Self {
        Self { config }
    }

    fn open(&self, path: &Path) -> Result<Mp4File> {
        let mut file = open_file(path)?;
        Ok(Mp4File::read_from(&mut file, self.config.parse_options())?)
    }

    fn table(&self, mp4: &Mp4File) -> NativeTable<AtomKey, AtomValue> {
        mp4.ilst().map(ilst_table).unwrap_or_default()
    }
}

impl FormatTranslator for M4aTranslator {
    fn format(&self) -> AudioFormat {
        AudioFormat::M4a
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_tags(&self, path: &Path) -> Result<CanonicalTags> {
        let mp4 = self.open(path)?;
        let table = self.table(&mp4);
        debug!(atoms = table.len(), "ilst atoms read");
        Ok(decode_tags(&table))
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_properties(&self, path: &Path) -> Result<CanonicalProperties> {
        let mp4 = self.open(path)?;
        let props = mp4.properties();

        let mut out = base_properties(path, AudioFormat::M4a, &self.config)?;
        out.duration = props.duration().as_secs_f64();
        out.bit_rate = props.audio_bitrate();
        out.bit_depth = props.bit_depth();
        out.num_channels = props.channels();
        out.sample_rate = props.sample_rate();
        out.codec = codec_name(props.codec());
        out.replay_gain = decode_replay_gain(&self.table(&mp4));
        Ok(out)
    }

    #[instrument(level = Level::TRACE, skip(self), err)]
    fn read_artwork(&self, path: &Path) -> Result<Vec<Vec<u8>>> {
        let mp4 = self.open(path)?;
        Ok(cover_art(&self.table(&mp4)))
    }
}
