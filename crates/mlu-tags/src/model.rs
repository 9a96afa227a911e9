use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::format::AudioFormat;

/// Campos fijos del registro canónico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagField {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Composer,
    Date,
    Genre,
    TrackNumber,
    TotalTracks,
    DiscNumber,
    TotalDiscs,
    Bpm,
    Key,
    Lyrics,
    Comment,
    DateAdded,
    DateAllPlays,
    DateLastPlayed,
    PlayCount,
    Votes,
    Rating,
}

impl TagField {
    pub const ALL: [TagField; 21] = [
        TagField::Title,
        TagField::Artist,
        TagField::Album,
        TagField::AlbumArtist,
        TagField::Composer,
        TagField::Date,
        TagField::Genre,
        TagField::TrackNumber,
        TagField::TotalTracks,
        TagField::DiscNumber,
        TagField::TotalDiscs,
        TagField::Bpm,
        TagField::Key,
        TagField::Lyrics,
        TagField::Comment,
        TagField::DateAdded,
        TagField::DateAllPlays,
        TagField::DateLastPlayed,
        TagField::PlayCount,
        TagField::Votes,
        TagField::Rating,
    ];

    /// Campos que el reproductor actualiza y que `write_tags` persiste.
    pub const DYNAMIC: [TagField; 5] = [
        TagField::DateAllPlays,
        TagField::DateLastPlayed,
        TagField::PlayCount,
        TagField::Votes,
        TagField::Rating,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TagField::Title => "title",
            TagField::Artist => "artist",
            TagField::Album => "album",
            TagField::AlbumArtist => "albumArtist",
            TagField::Composer => "composer",
            TagField::Date => "date",
            TagField::Genre => "genre",
            TagField::TrackNumber => "trackNumber",
            TagField::TotalTracks => "totalTracks",
            TagField::DiscNumber => "discNumber",
            TagField::TotalDiscs => "totalDiscs",
            TagField::Bpm => "bpm",
            TagField::Key => "key",
            TagField::Lyrics => "lyrics",
            TagField::Comment => "comment",
            TagField::DateAdded => "dateAdded",
            TagField::DateAllPlays => "dateAllPlays",
            TagField::DateLastPlayed => "dateLastPlayed",
            TagField::PlayCount => "playCount",
            TagField::Votes => "votes",
            TagField::Rating => "rating",
        }
    }

    pub fn is_dynamic(&self) -> bool {
        Self::DYNAMIC.contains(self)
    }
}

impl std::fmt::Display for TagField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Registro de tags independiente del formato.
///
/// Todo campo ausente en el archivo vale `""`. Las claves nativas sin campo
/// fijo terminan en `other_tags`, en minúsculas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub composer: String,
    pub date: String,
    pub genre: String,
    pub track_number: String,
    pub total_tracks: String,
    pub disc_number: String,
    pub total_discs: String,
    pub bpm: String,
    pub key: String,
    pub lyrics: String,
    pub comment: String,
    pub date_added: String,
    pub date_all_plays: String,
    pub date_last_played: String,
    pub play_count: String,
    pub votes: String,
    pub rating: String,
    pub other_tags: BTreeMap<String, String>,
}

impl CanonicalTags {
    pub fn get(&self, field: TagField) -> &str {
        match field {
            TagField::Title => &self.title,
            TagField::Artist => &self.artist,
            TagField::Album => &self.album,
            TagField::AlbumArtist => &self.album_artist,
            TagField::Composer => &self.composer,
            TagField::Date => &self.date,
            TagField::Genre => &self.genre,
            TagField::TrackNumber => &self.track_number,
            TagField::TotalTracks => &self.total_tracks,
            TagField::DiscNumber => &self.disc_number,
            TagField::TotalDiscs => &self.total_discs,
            TagField::Bpm => &self.bpm,
            TagField::Key => &self.key,
            TagField::Lyrics => &self.lyrics,
            TagField::Comment => &self.comment,
            TagField::DateAdded => &self.date_added,
            TagField::DateAllPlays => &self.date_all_plays,
            TagField::DateLastPlayed => &self.date_last_played,
            TagField::PlayCount => &self.play_count,
            TagField::Votes => &self.votes,
            TagField::Rating => &self.rating,
        }
    }

    fn slot(&mut self, field: TagField) -> &mut String {
        match field {
            TagField::Title => &mut self.title,
            TagField::Artist => &mut self.artist,
            TagField::Album => &mut self.album,
            TagField::AlbumArtist => &mut self.album_artist,
            TagField::Composer => &mut self.composer,
            TagField::Date => &mut self.date,
            TagField::Genre => &mut self.genre,
            TagField::TrackNumber => &mut self.track_number,
            TagField::TotalTracks => &mut self.total_tracks,
            TagField::DiscNumber => &mut self.disc_number,
            TagField::TotalDiscs => &mut self.total_discs,
            TagField::Bpm => &mut self.bpm,
            TagField::Key => &mut self.key,
            TagField::Lyrics => &mut self.lyrics,
            TagField::Comment => &mut self.comment,
            TagField::DateAdded => &mut self.date_added,
            TagField::DateAllPlays => &mut self.date_all_plays,
            TagField::DateLastPlayed => &mut self.date_last_played,
            TagField::PlayCount => &mut self.play_count,
            TagField::Votes => &mut self.votes,
            TagField::Rating => &mut self.rating,
        }
    }

    pub fn set(&mut self, field: TagField, value: impl Into<String>) {
        *self.slot(field) = value.into();
    }

    /// Pares `(campo, valor)` de los cinco campos dinámicos.
    pub fn dynamic_fields(&self) -> impl Iterator<Item = (TagField, &str)> + '_ {
        TagField::DYNAMIC.iter().map(move |f| (*f, self.get(*f)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayGain {
    pub album_gain: String,
    pub album_peak: String,
    pub track_gain: String,
    pub track_peak: String,
}

/// Modo de bitrate detectado en el flujo. `Unknown` se serializa como `""`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitRateMode {
    #[serde(rename = "CBR")]
    Cbr,
    #[serde(rename = "VBR")]
    Vbr,
    #[serde(rename = "ABR")]
    Abr,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

impl BitRateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BitRateMode::Cbr => "CBR",
            BitRateMode::Vbr => "VBR",
            BitRateMode::Abr => "ABR",
            BitRateMode::Unknown => "",
        }
    }
}

impl std::fmt::Display for BitRateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Propiedades técnicas del archivo y del flujo de audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProperties {
    pub file_size: u64,
    pub file_date_modified: String,
    /// Segundos.
    pub duration: f64,
    pub format: AudioFormat,
    /// kbps.
    pub bit_rate: u32,
    pub bit_depth: Option<u8>,
    pub num_channels: u8,
    pub sample_rate: u32,
    pub encoder: String,
    pub bit_rate_mode: BitRateMode,
    pub codec: String,
    pub replay_gain: ReplayGain,
}
