//! JPEG APPn segment codec for metadata profiles.
//!
//! Reads profiles out of an existing JPEG and splices profiles into a freshly
//! encoded one. Pixel data is never touched: the encoder's output is kept
//! byte-for-byte and new segments are inserted after `SOI` (and after a
//! leading JFIF `APP0`, if the encoder wrote one).
//!
//! Segment layouts:
//!
//! ```text
//! APP1  FF E1 len "Exif\0\0" <TIFF block>
//! APP1  FF E1 len "http://ns.adobe.com/xap/1.0/\0" <XMP packet>
//! APP2  FF E2 len "ICC_PROFILE\0" seq count <ICC chunk>   (seq is 1-based)
//! APP13 FF ED len "Photoshop 3.0\0" <8BIM resources>
//! ```
//!
//! `len` is big-endian and counts itself, so a segment carries at most
//! 65533 bytes of payload.

use super::profiles::{Profile, ProfileName, ProfileSet};
use thiserror::Error;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const APP2: u8 = 0xE2;
const APP13: u8 = 0xED;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const ICC_HEADER: &[u8] = b"ICC_PROFILE\0";
const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";

const MAX_SEGMENT_PAYLOAD: usize = 0xFFFF - 2;
/// ICC data per APP2 chunk once the header, sequence and count bytes are paid for.
const MAX_ICC_CHUNK: usize = MAX_SEGMENT_PAYLOAD - ICC_HEADER.len() - 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SegmentError {
    #[error("not a JPEG stream (missing SOI marker)")]
    NotJpeg,
    #[error("{name} profile is {size} bytes, larger than the {max} bytes a JPEG segment can hold")]
    TooLarge {
        name: &'static str,
        size: usize,
        max: usize,
    },
    #[error("ICC profile needs {0} chunks; JPEG allows at most 255")]
    TooManyIccChunks(usize),
}

/// A raw marker segment: marker byte (after `FF`) and its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<'a> {
    marker: u8,
    payload: &'a [u8],
}

/// Walk the header segments of a JPEG, stopping at `SOS` or `EOI`.
///
/// Truncated segments end the walk instead of erroring; metadata reading
/// is best effort.
fn header_segments(data: &[u8]) -> Result<Vec<Segment<'_>>, SegmentError> {
    if !data.starts_with(&SOI) {
        return Err(SegmentError::NotJpeg);
    }

    let mut segments = Vec::new();
    let mut pos = SOI.len();
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        // Fill bytes
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == SOS || marker == EOI {
            break;
        }
        // Standalone markers carry no length
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if len < 2 || pos + 2 + len > data.len() {
            break;
        }
        segments.push(Segment {
            marker,
            payload: &data[pos + 4..pos + 2 + len],
        });
        pos += 2 + len;
    }
    Ok(segments)
}

/// Extract every metadata profile from a JPEG byte stream.
///
/// ICC chunks are reassembled in sequence order. A later EXIF/XMP/IPTC
/// segment replaces an earlier one of the same kind.
pub fn read_profiles(data: &[u8]) -> Result<ProfileSet, SegmentError> {
    let mut profiles = ProfileSet::new();
    let mut icc_chunks: Vec<(u8, &[u8])> = Vec::new();

    for segment in header_segments(data)? {
        let payload = segment.payload;
        match segment.marker {
            APP1 if payload.starts_with(EXIF_HEADER) => {
                profiles.set(Profile::new(
                    ProfileName::Exif,
                    &payload[EXIF_HEADER.len()..],
                ));
            }
            APP1 if payload.starts_with(XMP_HEADER) => {
                profiles.set(Profile::new(ProfileName::Xmp, &payload[XMP_HEADER.len()..]));
            }
            APP2 if payload.starts_with(ICC_HEADER) && payload.len() >= ICC_HEADER.len() + 2 => {
                let seq = payload[ICC_HEADER.len()];
                icc_chunks.push((seq, &payload[ICC_HEADER.len() + 2..]));
            }
            APP13 if payload.starts_with(PHOTOSHOP_HEADER) => {
                profiles.set(Profile::new(
                    ProfileName::Iptc,
                    &payload[PHOTOSHOP_HEADER.len()..],
                ));
            }
            _ => {}
        }
    }

    if !icc_chunks.is_empty() {
        icc_chunks.sort_by_key(|(seq, _)| *seq);
        let icc: Vec<u8> = icc_chunks
            .into_iter()
            .flat_map(|(_, chunk)| chunk.iter().copied())
            .collect();
        profiles.set(Profile::new(ProfileName::Icc, icc));
    }

    Ok(profiles)
}

fn push_segment(out: &mut Vec<u8>, marker: u8, parts: &[&[u8]]) {
    let payload_len: usize = parts.iter().map(|p| p.len()).sum();
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    for part in parts {
        out.extend_from_slice(part);
    }
}

fn check_size(name: &'static str, size: usize, header: &[u8]) -> Result<(), SegmentError> {
    let max = MAX_SEGMENT_PAYLOAD - header.len();
    if size > max {
        return Err(SegmentError::TooLarge { name, size, max });
    }
    Ok(())
}

/// Encode profiles as APPn segments, in the order EXIF, XMP, ICC, IPTC.
///
/// Empty profiles and names without a JPEG carrier are skipped; the
/// returned list names the skipped `Other` profiles so the caller can
/// report them.
fn encode_segments(profiles: &[Profile]) -> Result<(Vec<u8>, Vec<String>), SegmentError> {
    let mut out = Vec::new();
    let mut skipped = Vec::new();
    let find = |name: ProfileName| profiles.iter().find(|p| p.name == name && !p.is_empty());

    if let Some(exif) = find(ProfileName::Exif) {
        check_size("exif", exif.len(), EXIF_HEADER)?;
        push_segment(&mut out, APP1, &[EXIF_HEADER, &exif.data[..]]);
    }
    if let Some(xmp) = find(ProfileName::Xmp) {
        check_size("xmp", xmp.len(), XMP_HEADER)?;
        push_segment(&mut out, APP1, &[XMP_HEADER, &xmp.data[..]]);
    }
    if let Some(icc) = find(ProfileName::Icc) {
        let chunks: Vec<&[u8]> = icc.data.chunks(MAX_ICC_CHUNK).collect();
        if chunks.len() > 255 {
            return Err(SegmentError::TooManyIccChunks(chunks.len()));
        }
        let count = chunks.len() as u8;
        for (i, chunk) in chunks.iter().enumerate() {
            push_segment(&mut out, APP2, &[ICC_HEADER, &[i as u8 + 1, count][..], *chunk]);
        }
    }
    if let Some(iptc) = find(ProfileName::Iptc) {
        check_size("iptc", iptc.len(), PHOTOSHOP_HEADER)?;
        push_segment(&mut out, APP13, &[PHOTOSHOP_HEADER, &iptc.data[..]]);
    }

    for profile in profiles {
        if let ProfileName::Other(name) = &profile.name {
            skipped.push(name.clone());
        }
    }
    Ok((out, skipped))
}

/// Insert profile segments into an encoded JPEG.
///
/// Returns the new stream and the names of profiles that could not be
/// carried by JPEG.
pub fn embed_profiles(
    jpeg: &[u8],
    profiles: &[Profile],
) -> Result<(Vec<u8>, Vec<String>), SegmentError> {
    if !jpeg.starts_with(&SOI) {
        return Err(SegmentError::NotJpeg);
    }
    let (segments, skipped) = encode_segments(profiles)?;

    // Keep a leading JFIF APP0 first so JFIF readers still recognise the file
    let mut insert_at = SOI.len();
    if jpeg.len() >= insert_at + 4 && jpeg[insert_at] == 0xFF && jpeg[insert_at + 1] == APP0 {
        let len = u16::from_be_bytes([jpeg[insert_at + 2], jpeg[insert_at + 3]]) as usize;
        if insert_at + 2 + len <= jpeg.len() {
            insert_at += 2 + len;
        }
    }

    let mut out = Vec::with_capacity(jpeg.len() + segments.len());
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(&segments);
    out.extend_from_slice(&jpeg[insert_at..]);
    Ok((out, skipped))
}
