//! Inspección de la cabecera Xing/Info/VBRI y de la extensión LAME del primer
//! frame MPEG. lofty no expone el modo de bitrate ni el encoder.
//!
//! Disposición de la cabecera Xing (big-endian):
//! - `Xing` | `Info` (4 bytes)
//! - flags (4): frames (0x1), bytes (0x2), TOC (0x4), calidad (0x8)
//! - campos presentes según flags, TOC de 100 bytes
//! - extensión LAME: versión (9), revisión/método (1), lowpass (1),
//!   replay gain (8), flags/ATH (1), bitrate ABR o mínimo (1), ...

use std::{
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use tracing::{Level, debug, instrument};

use crate::{
    error::{Error, Result},
    model::BitRateMode,
    translator::open_file,
};

const ID3V2_HEADER_LEN: usize = 10;
const ID3V2_FOOTER_FLAG: u8 = 0x10;

const XING_FLAG_FRAMES: u32 = 0x1;
const XING_FLAG_BYTES: u32 = 0x2;
const XING_FLAG_TOC: u32 = 0x4;
const XING_FLAG_QUALITY: u32 = 0x8;
const XING_TOC_LEN: usize = 100;

/// VBRI siempre está 32 bytes después de la cabecera de 4 bytes.
const VBRI_OFFSET: usize = 36;

const LAME_VERSION_LEN: usize = 9;
const LAME_METHOD_OFFSET: usize = 9;
const LAME_ABR_OFFSET: usize = 20;

/// kbps para MPEG-1 Layer III, índice 1..=14.
const BITRATES_V1_L3: [u32; 16] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0];
/// kbps para MPEG-2/2.5 Layer III.
const BITRATES_V2_L3: [u32; 16] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub mono: bool,
    /// kbps según la tabla de Layer III.
    pub bitrate: u32,
}

impl FrameHeader {
    /// Solo acepta Layer III con índices válidos.
    pub fn parse(bytes: [u8; 4]) -> Option<Self> {
        if bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (bytes[1] >> 3) & 0x3 {
            0 => MpegVersion::V25,
            2 => MpegVersion::V2,
            3 => MpegVersion::V1,
            _ => return None,
        };
        if (bytes[1] >> 1) & 0x3 != 0x1 {
            return None;
        }

        let bitrate_index = (bytes[2] >> 4) as usize;
        let sample_rate_index = (bytes[2] >> 2) & 0x3;
        if bitrate_index == 0xF || sample_rate_index == 0x3 {
            return None;
        }

        let bitrate = match version {
            MpegVersion::V1 => BITRATES_V1_L3[bitrate_index],
            MpegVersion::V2 | MpegVersion::V25 => BITRATES_V2_L3[bitrate_index],
        };

        Some(Self {
            version,
            mono: (bytes[3] >> 6) == 0x3,
            bitrate,
        })
    }

    /// Desplazamiento de la cabecera Xing/Info desde el inicio del frame.
    pub fn xing_offset(&self) -> usize {
        match (self.version, self.mono) {
            (MpegVersion::V1, true) => 21,
            (MpegVersion::V1, false) => 36,
            (_, true) => 13,
            (_, false) => 21,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbrHeaderKind {
    Xing,
    Info,
    Vbri,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LameHeader {
    /// Versión tal como aparece en el archivo, p. ej. `LAME3.99r`.
    pub version: String,
    pub vbr_method: u8,
    /// Bitrate ABR (o mínimo) en kbps; 0 si no está indicado.
    pub abr_bitrate: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VbrHeader {
    pub kind: VbrHeaderKind,
    pub frame: FrameHeader,
    pub frames: Option<u32>,
    pub bytes: Option<u32>,
    pub quality: Option<u32>,
    pub lame: Option<LameHeader>,
}

/// Resultado de la inspección.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VbrInfo {
    pub mode: BitRateMode,
    pub encoder_info: String,
    pub encoder_settings: String,
}

impl VbrInfo {
    /// `"<info> (<settings>)"` siempre, aunque alguna parte esté vacía.
    pub fn encoder(&self) -> String {
        format!("{} ({})", self.encoder_info, self.encoder_settings)
    }
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let b = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Tamaño total del tag ID3v2 al inicio de `header`, o 0 si no hay.
pub fn id3v2_size(header: &[u8]) -> usize {
    if header.len() < ID3V2_HEADER_LEN || &header[0..3] != b"ID3" {
        return 0;
    }
    let size = header[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | (*b & 0x7F) as usize);
    let footer = if header[5] & ID3V2_FOOTER_FLAG != 0 { ID3V2_HEADER_LEN } else { 0 };
    ID3V2_HEADER_LEN + size + footer
}

/// Primer frame MPEG Layer III válido en `data`.
pub fn find_frame(data: &[u8]) -> Option<(usize, FrameHeader)> {
    data.windows(4).enumerate().find_map(|(i, w)| {
        FrameHeader::parse([w[0], w[1], w[2], w[3]]).map(|header| (i, header))
    })
}

fn parse_lame(data: &[u8]) -> Option<LameHeader> {
    let raw = data.get(..LAME_VERSION_LEN)?;
    if !raw.starts_with(b"LAME") {
        return None;
    }
    let version = String::from_utf8_lossy(raw)
        .trim_end_matches(['\0', ' '])
        .to_string();
    Some(LameHeader {
        version,
        vbr_method: data.get(LAME_METHOD_OFFSET).map(|b| b & 0x0F).unwrap_or(0),
        abr_bitrate: data.get(LAME_ABR_OFFSET).copied().unwrap_or(0),
    })
}

/// Busca la cabecera VBR en el primer frame de `data` (datos posteriores al
/// tag ID3v2).
pub fn parse_vbr_header(data: &[u8]) -> Option<VbrHeader> {
    let (start, frame) = find_frame(data)?;
    let frame_data = &data[start..];

    let xing_at = frame.xing_offset();
    if let Some(tag) = frame_data.get(xing_at..xing_at + 4) {
        let kind = match tag {
            b"Xing" => Some(VbrHeaderKind::Xing),
            b"Info" => Some(VbrHeaderKind::Info),
            _ => None,
        };

        if let Some(kind) = kind {
            let flags = be_u32(frame_data, xing_at + 4).unwrap_or(0);
            let mut pos = xing_at + 8;

            let mut read_field = |flag: u32| {
                if flags & flag == 0 {
                    return None;
                }
                let value = be_u32(frame_data, pos);
                pos += 4;
                value
            };
            let frames = read_field(XING_FLAG_FRAMES);
            let bytes = read_field(XING_FLAG_BYTES);
            if flags & XING_FLAG_TOC != 0 {
                pos += XING_TOC_LEN;
            }
            let quality = if flags & XING_FLAG_QUALITY != 0 {
                let q = be_u32(frame_data, pos);
                pos += 4;
                q
            } else {
                None
            };

            let lame = frame_data.get(pos..).and_then(parse_lame);
            return Some(VbrHeader {
                kind,
                frame,
                frames,
                bytes,
                quality,
                lame,
            });
        }
    }

    if frame_data.get(VBRI_OFFSET..VBRI_OFFSET + 4) == Some(b"VBRI".as_slice()) {
        return Some(VbrHeader {
            kind: VbrHeaderKind::Vbri,
            frame,
            frames: be_u32(frame_data, VBRI_OFFSET + 14),
            bytes: be_u32(frame_data, VBRI_OFFSET + 10),
            quality: None,
            lame: None,
        });
    }

    None
}

fn lame_version_desc(version: &str) -> String {
    match version.strip_prefix("LAME") {
        Some(rest) if !rest.is_empty() => format!("LAME {}", rest.trim()),
        _ => version.to_string(),
    }
}

impl VbrHeader {
    pub fn mode(&self) -> BitRateMode {
        let from_method = self.lame.as_ref().and_then(|lame| match lame.vbr_method {
            1 | 8 => Some(BitRateMode::Cbr),
            2 | 9 => Some(BitRateMode::Abr),
            3..=6 => Some(BitRateMode::Vbr),
            _ => None,
        });

        from_method.unwrap_or(match self.kind {
            VbrHeaderKind::Info => BitRateMode::Cbr,
            VbrHeaderKind::Vbri => BitRateMode::Vbr,
            // Un `Xing` sin escala de calidad ni versión LAME no dice nada.
            VbrHeaderKind::Xing if self.quality.is_some() || self.lame.is_some() => BitRateMode::Vbr,
            VbrHeaderKind::Xing => BitRateMode::Unknown,
        })
    }

    fn settings(&self, mode: BitRateMode) -> String {
        let Some(lame) = &self.lame else {
            return String::new();
        };
        let bitrate = match lame.abr_bitrate {
            0 => self.frame.bitrate,
            b => u32::from(b),
        };

        match mode {
            BitRateMode::Cbr if bitrate > 0 => format!("-b {bitrate}"),
            BitRateMode::Abr if bitrate > 0 => format!("--abr {bitrate}"),
            BitRateMode::Vbr => match self.quality {
                Some(q) if q <= 100 => format!("-V {}", ((100 - q) / 10).min(9)),
                _ => String::new(),
            },
            _ => String::new(),
        }
    }

    pub fn info(&self) -> VbrInfo {
        let mode = self.mode();
        VbrInfo {
            mode,
            encoder_info: self
                .lame
                .as_ref()
                .map(|lame| lame_version_desc(&lame.version))
                .unwrap_or_default(),
            encoder_settings: self.settings(mode),
        }
    }
}

/// Lee hasta `scan_bytes` bytes tras el tag ID3v2 de `path` e inspecciona el
/// primer frame.
#[instrument(level = Level::TRACE, err)]
pub fn read_vbr_info(path: &Path, scan_bytes: usize) -> Result<VbrInfo> {
    let mut file = open_file(path)?;

    let mut header = [0u8; ID3V2_HEADER_LEN];
    let read = file.read(&mut header).map_err(|e| Error::io(path, e))?;
    let skip = id3v2_size(&header[..read]);

    file.seek(SeekFrom::Start(skip as u64)).map_err(|e| Error::io(path, e))?;
    let mut window = Vec::with_capacity(scan_bytes);
    file.take(scan_bytes as u64)
        .read_to_end(&mut window)
        .map_err(|e| Error::io(path, e))?;

    let info = parse_vbr_header(&window).map(|h| h.info()).unwrap_or_default();
    debug!(mode = %info.mode, encoder = %info.encoder(), "MPEG header inspected");
    Ok(info)
}
