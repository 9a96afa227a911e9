//! Archivos sintéticos para los tests: FLAC, MP3 y M4A armados byte a byte.

use std::{
    fs,
    path::{Path, PathBuf},
};

pub const SAMPLE_RATE: u32 = 44_100;

const FLAC_BLOCK_STREAMINFO: u8 = 0;
const FLAC_BLOCK_VORBIS_COMMENT: u8 = 4;
const FLAC_BLOCK_PICTURE: u8 = 6;

fn flac_block(kind: u8, last: bool, body: &[u8]) -> Vec<u8> {
    let len = body.len() as u32;
    let mut out = vec![if last { 0x80 | kind } else { kind }];
    out.extend_from_slice(&len.to_be_bytes()[1..]);
    out.extend_from_slice(body);
    out
}

/// 44.1 kHz, estéreo, 16 bits, un segundo de muestras.
fn streaminfo() -> Vec<u8> {
    let mut body = Vec::with_capacity(34);
    body.extend_from_slice(&4096u16.to_be_bytes());
    body.extend_from_slice(&4096u16.to_be_bytes());
    body.extend_from_slice(&[0; 6]);
    let packed: u64 = (u64::from(SAMPLE_RATE) << 44) | (1 << 41) | (15 << 36) | u64::from(SAMPLE_RATE);
    body.extend_from_slice(&packed.to_be_bytes());
    body.extend_from_slice(&[0; 16]);
    body
}

fn vorbis_comment(comments: &[(&str, &str)]) -> Vec<u8> {
    let vendor = b"mlu-tags fixture";
    let mut body = Vec::new();
    body.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    body.extend_from_slice(vendor);
    body.extend_from_slice(&(comments.len() as u32).to_le_bytes());
    for (key, value) in comments {
        let entry = format!("{key}={value}");
        body.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        body.extend_from_slice(entry.as_bytes());
    }
    body
}

fn flac_picture(data: &[u8]) -> Vec<u8> {
    let mime = b"image/jpeg";
    let mut body = Vec::new();
    body.extend_from_slice(&3u32.to_be_bytes());
    body.extend_from_slice(&(mime.len() as u32).to_be_bytes());
    body.extend_from_slice(mime);
    body.extend_from_slice(&0u32.to_be_bytes());
    for dim in [1u32, 1, 24, 0] {
        body.extend_from_slice(&dim.to_be_bytes());
    }
    body.extend_from_slice(&(data.len() as u32).to_be_bytes());
    body.extend_from_slice(data);
    body
}

fn flac_bytes(comments: Option<&[(&str, &str)]>, picture: Option<&[u8]>) -> Vec<u8> {
    let mut blocks = vec![(FLAC_BLOCK_STREAMINFO, streaminfo())];
    if let Some(comments) = comments {
        blocks.push((FLAC_BLOCK_VORBIS_COMMENT, vorbis_comment(comments)));
    }
    if let Some(data) = picture {
        blocks.push((FLAC_BLOCK_PICTURE, flac_picture(data)));
    }

    let mut out = b"fLaC".to_vec();
    let count = blocks.len();
    for (i, (kind, body)) in blocks.iter().enumerate() {
        out.extend(flac_block(*kind, i + 1 == count, body));
    }
    out.extend(flac_audio());
    out
}

/// Bytes de "audio" tras los metadatos; no son ceros para detectar escrituras
/// fuera de sitio.
pub fn flac_audio() -> Vec<u8> {
    (1..=64).collect()
}

pub fn write_flac<P: AsRef<[u8]>>(dir: &Path, comments: &[(&str, &str)], picture: Option<P>) -> PathBuf {
    let path = dir.join("fixture.flac");
    let picture = picture.as_ref().map(|p| p.as_ref());
    fs::write(&path, flac_bytes(Some(comments), picture)).unwrap();
    path
}

pub fn write_flac_without_comments(dir: &Path) -> PathBuf {
    let path = dir.join("bare.flac");
    fs::write(&path, flac_bytes(None, None)).unwrap();
    path
}

/// Frame ID3v2.3 con texto Latin-1.
pub struct Id3Frame {
    id: [u8; 4],
    body: Vec<u8>,
}

impl Id3Frame {
    pub fn text(id: &str, value: &str) -> Self {
        let mut body = vec![0u8];
        body.extend_from_slice(value.as_bytes());
        Self::raw(id, body)
    }

    pub fn user_text(description: &str, value: &str) -> Self {
        let mut body = vec![0u8];
        body.extend_from_slice(description.as_bytes());
        body.push(0);
        body.extend_from_slice(value.as_bytes());
        Self::raw("TXXX", body)
    }

    pub fn comment(description: &str, language: &[u8; 3], text: &str) -> Self {
        let mut body = vec![0u8];
        body.extend_from_slice(language);
        body.extend_from_slice(description.as_bytes());
        body.push(0);
        body.extend_from_slice(text.as_bytes());
        Self::raw("COMM", body)
    }

    pub fn picture(data: &[u8]) -> Self {
        let mut body = vec![0u8];
        body.extend_from_slice(b"image/jpeg\0");
        body.push(3);
        body.push(0);
        body.extend_from_slice(data);
        Self::raw("APIC", body)
    }

    fn raw(id: &str, body: Vec<u8>) -> Self {
        let mut code = [0u8; 4];
        code.copy_from_slice(&id.as_bytes()[..4]);
        Self { id: code, body }
    }
}

fn syncsafe(n: u32) -> [u8; 4] {
    [
        ((n >> 21) & 0x7F) as u8,
        ((n >> 14) & 0x7F) as u8,
        ((n >> 7) & 0x7F) as u8,
        (n & 0x7F) as u8,
    ]
}

pub fn id3v23_tag(frames: &[Id3Frame]) -> Vec<u8> {
    let mut body = Vec::new();
    for frame in frames {
        body.extend_from_slice(&frame.id);
        body.extend_from_slice(&(frame.body.len() as u32).to_be_bytes());
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&frame.body);
    }

    let mut out = b"ID3".to_vec();
    out.extend_from_slice(&[3, 0, 0]);
    out.extend_from_slice(&syncsafe(body.len() as u32));
    out.extend(body);
    out
}

/// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo, sin padding.
pub const MPEG_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
pub const MPEG_FRAME_LEN: usize = 417;
pub const MPEG_FRAME_COUNT: usize = 10;

pub struct LameFields {
    pub vbr_method: u8,
    pub abr_bitrate: u8,
}

pub struct XingFields {
    pub tag: [u8; 4],
    pub quality: Option<u32>,
    pub lame: Option<LameFields>,
}

/// Un frame MPEG; el primero de un archivo puede llevar la cabecera Xing.
pub fn mpeg_frame(xing: Option<&XingFields>) -> Vec<u8> {
    let mut frame = vec![0u8; MPEG_FRAME_LEN];
    frame[..4].copy_from_slice(&MPEG_HEADER);

    if let Some(header) = xing {
        let mut x = header.tag.to_vec();
        let flags: u32 = 0x1 | 0x2 | 0x4 | if header.quality.is_some() { 0x8 } else { 0 };
        x.extend_from_slice(&flags.to_be_bytes());
        x.extend_from_slice(&(MPEG_FRAME_COUNT as u32).to_be_bytes());
        x.extend_from_slice(&((MPEG_FRAME_COUNT * MPEG_FRAME_LEN) as u32).to_be_bytes());
        x.extend((0..100u8).map(|i| (i as u16 * 255 / 100) as u8));
        if let Some(q) = header.quality {
            x.extend_from_slice(&q.to_be_bytes());
        }
        if let Some(lame) = &header.lame {
            let mut ext = [0u8; 36];
            ext[..9].copy_from_slice(b"LAME3.99r");
            ext[9] = 0x10 | (lame.vbr_method & 0x0F);
            ext[20] = lame.abr_bitrate;
            x.extend_from_slice(&ext);
        }
        frame[36..36 + x.len()].copy_from_slice(&x);
    }
    frame
}

pub fn write_mp3(dir: &Path, frames: &[Id3Frame], xing: Option<&XingFields>) -> PathBuf {
    let path = dir.join("fixture.mp3");
    let mut bytes = if frames.is_empty() { Vec::new() } else { id3v23_tag(frames) };
    bytes.extend(mpeg_frame(xing));
    for _ in 1..MPEG_FRAME_COUNT {
        bytes.extend(mpeg_frame(None));
    }
    fs::write(&path, bytes).unwrap();
    path
}

fn atom(code: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(code);
    out.extend_from_slice(body);
    out
}

/// Átomo con versión y flags a cero antes del contenido.
fn full_atom(code: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut content = vec![0u8; 4];
    content.extend_from_slice(body);
    atom(code, &content)
}

const DATA_IMPLICIT: u32 = 0;
const DATA_UTF8: u32 = 1;
const DATA_JPEG: u32 = 13;

fn data_atom(kind: u32, payload: &[u8]) -> Vec<u8> {
    let mut body = kind.to_be_bytes().to_vec();
    body.extend_from_slice(&[0; 4]);
    body.extend_from_slice(payload);
    atom(b"data", &body)
}

/// Un elemento de `ilst` ya serializado.
pub struct IlstItem(Vec<u8>);

impl IlstItem {
    pub fn text(code: &[u8; 4], value: &str) -> Self {
        IlstItem(atom(code, &data_atom(DATA_UTF8, value.as_bytes())))
    }

    /// `trkn`/`disk`: dos bytes de relleno, número, total y relleno final.
    pub fn pair(code: &[u8; 4], number: u16, total: u16) -> Self {
        let mut payload = vec![0u8, 0];
        payload.extend_from_slice(&number.to_be_bytes());
        payload.extend_from_slice(&total.to_be_bytes());
        payload.extend_from_slice(&[0, 0]);
        IlstItem(atom(code, &data_atom(DATA_IMPLICIT, &payload)))
    }

    pub fn freeform(mean: &str, name: &str, value: &str) -> Self {
        let mut body = full_atom(b"mean", mean.as_bytes());
        body.extend(full_atom(b"name", name.as_bytes()));
        body.extend(data_atom(DATA_UTF8, value.as_bytes()));
        IlstItem(atom(b"----", &body))
    }

    pub fn cover(images: &[&[u8]]) -> Self {
        let body: Vec<u8> = images.iter().flat_map(|img| data_atom(DATA_JPEG, img)).collect();
        IlstItem(atom(b"covr", &body))
    }
}

/// Pista AAC de un segundo: `mdhd`, `hdlr` de sonido y un `mp4a` sin `esds`.
fn audio_trak() -> Vec<u8> {
    let mut mdhd = Vec::new();
    for value in [0u32, 0, SAMPLE_RATE, SAMPLE_RATE] {
        mdhd.extend_from_slice(&value.to_be_bytes());
    }
    mdhd.extend_from_slice(&[0x55, 0xC4, 0, 0]);

    let mut hdlr = vec![0u8; 4];
    hdlr.extend_from_slice(b"soun");
    hdlr.extend_from_slice(&[0; 13]);

    let mut mp4a = vec![0u8; 6];
    mp4a.extend_from_slice(&1u16.to_be_bytes());
    mp4a.extend_from_slice(&[0; 8]);
    mp4a.extend_from_slice(&2u16.to_be_bytes());
    mp4a.extend_from_slice(&16u16.to_be_bytes());
    mp4a.extend_from_slice(&[0; 4]);
    mp4a.extend_from_slice(&(SAMPLE_RATE << 16).to_be_bytes());

    let mut stsd = 1u32.to_be_bytes().to_vec();
    stsd.extend(atom(b"mp4a", &mp4a));
    let minf = atom(b"minf", &atom(b"stbl", &full_atom(b"stsd", &stsd)));

    let mut mdia = full_atom(b"mdhd", &mdhd);
    mdia.extend(full_atom(b"hdlr", &hdlr));
    mdia.extend(minf);
    atom(b"trak", &atom(b"mdia", &mdia))
}

fn m4a_bytes(items: &[IlstItem]) -> Vec<u8> {
    let mut ftyp = b"M4A ".to_vec();
    ftyp.extend_from_slice(&0u32.to_be_bytes());
    ftyp.extend_from_slice(b"M4A mp42isom");

    let ilst: Vec<u8> = items.iter().flat_map(|item| item.0.iter().copied()).collect();
    let mut meta_hdlr = vec![0u8; 4];
    meta_hdlr.extend_from_slice(b"mdirappl");
    meta_hdlr.extend_from_slice(&[0; 9]);
    let mut meta = full_atom(b"hdlr", &meta_hdlr);
    meta.extend(atom(b"ilst", &ilst));

    let mut moov = audio_trak();
    moov.extend(atom(b"udta", &full_atom(b"meta", &meta)));

    let mut out = atom(b"ftyp", &ftyp);
    out.extend(atom(b"moov", &moov));
    out.extend(atom(b"mdat", &[0xAA; 1000]));
    out
}

pub fn write_m4a(dir: &Path, items: &[IlstItem]) -> PathBuf {
    let path = dir.join("fixture.m4a");
    fs::write(&path, m4a_bytes(items)).unwrap();
    path
}
