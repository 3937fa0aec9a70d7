//! Content-type detection from leading bytes.
//!
//! Declared types and file extensions are never consulted; the outbound
//! composer picks the WhatsApp message variant from what the bytes say.

/// Fallback when nothing matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Detect a MIME type from the leading bytes of `data`.
pub fn detect_mime(data: &[u8]) -> &'static str {
    if data.is_empty() {
        return OCTET_STREAM;
    }
    if let Ok(format) = image::guess_format(data) {
        return format.to_mime_type();
    }
    if let Some(mime) = detect_av(data) {
        return mime;
    }
    if let Some(mime) = detect_container(data) {
        return mime;
    }
    if is_text(data) {
        return "text/plain";
    }
    OCTET_STREAM
}

fn detect_av(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"OggS") {
        return Some("audio/ogg");
    }
    if data.starts_with(b"#!AMR") {
        return Some("audio/amr");
    }
    if data.starts_with(b"ID3") {
        return Some("audio/mpeg");
    }
    // Bare MPEG audio frame sync: 11 set bits.
    if data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0 {
        return Some("audio/mpeg");
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WAVE" {
        return Some("audio/wav");
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return Some(iso_bmff_brand(&data[8..12]));
    }
    None
}

/// Major brand of an ISO base media file. Unknown brands are not guessed.
fn iso_bmff_brand(brand: &[u8]) -> &'static str {
    match brand {
        b"M4A " | b"M4B " | b"M4P " | b"F4A " | b"F4B " => "audio/mp4",
        b"isom" | b"iso2" | b"iso3" | b"iso4" | b"iso5" | b"iso6" | b"mp41" | b"mp42"
        | b"mp71" | b"avc1" | b"dash" | b"M4V " | b"M4VH" | b"M4VP" | b"F4V " | b"F4P "
        | b"MSNV" | b"NDAS" | b"mmp4" => "video/mp4",
        b"qt  " => "video/quicktime",
        b"heic" | b"heix" | b"heim" | b"heis" | b"mif1" | b"msf1" => "image/heic",
        b"avif" | b"avis" => "image/avif",
        b if b.starts_with(b"3gp") || b.starts_with(b"3g2") => "video/3gpp",
        _ => OCTET_STREAM,
    }
}

fn detect_container(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
        return Some("application/zip");
    }
    None
}

fn is_text(data: &[u8]) -> bool {
    !data.contains(&0) && std::str::from_utf8(data).is_ok()
}
