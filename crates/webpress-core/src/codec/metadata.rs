//! EXIF preservation for encoded WebP output.
//!
//! libwebp's simple output is a bare `VP8 `/`VP8L` chunk; carrying EXIF
//! requires the extended container layout: a leading `VP8X` chunk with the
//! EXIF flag set, followed by the image chunk and a trailing `EXIF` chunk.
//! This module performs only that RIFF container surgery — the EXIF payload
//! itself comes straight from the source image.

const RIFF_HEADER_LEN: usize = 12;

const FLAG_ALPHA: u8 = 0x10;
const FLAG_EXIF: u8 = 0x08;

/// Attach an EXIF payload to an encoded WebP byte stream.
///
/// Input that is not a valid WebP container is returned unchanged — failing
/// to preserve metadata must never fail the conversion.
pub fn embed_exif(
    webp: Vec<u8>,
    exif_payload: &[u8],
    width: u32,
    height: u32,
    has_alpha: bool,
) -> Vec<u8> {
    if exif_payload.is_empty() || !is_webp(&webp) {
        return webp;
    }

    let mut out = Vec::with_capacity(webp.len() + exif_payload.len() + 40);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&[0, 0, 0, 0]); // riff size, patched below
    out.extend_from_slice(b"WEBP");

    if webp.len() > RIFF_HEADER_LEN + 8 && &webp[RIFF_HEADER_LEN..RIFF_HEADER_LEN + 4] == b"VP8X" {
        // Already extended: copy the chunks and set the EXIF flag in place.
        out.extend_from_slice(&webp[RIFF_HEADER_LEN..]);
        out[RIFF_HEADER_LEN + 8] |= FLAG_EXIF;
    } else {
        push_chunk(&mut out, b"VP8X", &vp8x_payload(width, height, has_alpha));
        out.extend_from_slice(&webp[RIFF_HEADER_LEN..]);
    }

    push_chunk(&mut out, b"EXIF", exif_payload);

    let riff_size = (out.len() - 8) as u32;
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());
    out
}

fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() > RIFF_HEADER_LEN && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

/// VP8X payload: flags byte, 3 reserved bytes, then canvas width-1 and
/// height-1 as 24-bit little-endian values.
fn vp8x_payload(width: u32, height: u32, has_alpha: bool) -> [u8; 10] {
    let mut payload = [0u8; 10];
    payload[0] = FLAG_EXIF | if has_alpha { FLAG_ALPHA } else { 0 };
    let w = (width.saturating_sub(1)).min(0x00FF_FFFF);
    let h = (height.saturating_sub(1)).min(0x00FF_FFFF);
    payload[4..7].copy_from_slice(&w.to_le_bytes()[0..3]);
    payload[7..10].copy_from_slice(&h.to_le_bytes()[0..3]);
    payload
}

/// Append a RIFF chunk: fourcc, little-endian size, payload, pad to even.
fn push_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal fake simple-format WebP: RIFF header plus one VP8 chunk.
    fn fake_simple_webp(image_payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(b"WEBP");
        push_chunk(&mut bytes, b"VP8 ", image_payload);
        let riff_size = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());
        bytes
    }

    #[test]
    fn test_simple_webp_gains_vp8x_and_exif_chunks() {
        let src = fake_simple_webp(&[1, 2, 3, 4]);
        let exif = b"II*\0fake-tiff-data";
        let out = embed_exif(src, exif, 100, 50, false);

        // Still a valid RIFF/WEBP header with a correct size field
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");
        let declared = u32::from_le_bytes(out[4..8].try_into().unwrap()) as usize;
        assert_eq!(declared, out.len() - 8);

        // First chunk is VP8X with the EXIF flag and correct canvas dims
        assert_eq!(&out[12..16], b"VP8X");
        let flags = out[20];
        assert_eq!(flags & FLAG_EXIF, FLAG_EXIF);
        assert_eq!(flags & FLAG_ALPHA, 0);
        let w = u32::from_le_bytes([out[24], out[25], out[26], 0]);
        let h = u32::from_le_bytes([out[27], out[28], out[29], 0]);
        assert_eq!((w + 1, h + 1), (100, 50));

        // The EXIF chunk is present with the payload intact
        let pos = out
            .windows(4)
            .position(|w| w == b"EXIF")
            .expect("EXIF chunk present");
        let size = u32::from_le_bytes(out[pos + 4..pos + 8].try_into().unwrap()) as usize;
        assert_eq!(size, exif.len());
        assert_eq!(&out[pos + 8..pos + 8 + size], exif);
    }

    #[test]
    fn test_alpha_flag_set_when_source_has_alpha() {
        let src = fake_simple_webp(&[1, 2]);
        let out = embed_exif(src, b"II*\0x", 10, 10, true);
        assert_eq!(out[20] & FLAG_ALPHA, FLAG_ALPHA);
    }

    #[test]
    fn test_existing_vp8x_is_reused_not_duplicated() {
        let mut src = Vec::new();
        src.extend_from_slice(b"RIFF");
        src.extend_from_slice(&[0, 0, 0, 0]);
        src.extend_from_slice(b"WEBP");
        push_chunk(&mut src, b"VP8X", &vp8x_payload(10, 10, true));
        push_chunk(&mut src, b"VP8L", &[9, 9, 9, 9]);
        let riff_size = (src.len() - 8) as u32;
        src[4..8].copy_from_slice(&riff_size.to_le_bytes());

        let out = embed_exif(src, b"II*\0x", 10, 10, true);
        let vp8x_count = out.windows(4).filter(|w| *w == b"VP8X").count();
        assert_eq!(vp8x_count, 1);
        assert_eq!(out[20] & FLAG_EXIF, FLAG_EXIF);
        assert_eq!(out[20] & FLAG_ALPHA, FLAG_ALPHA);
    }

    #[test]
    fn test_odd_payload_is_padded() {
        let src = fake_simple_webp(&[1]);
        let out = embed_exif(src, b"odd", 4, 4, false);
        // Total RIFF payload stays even after padding
        assert_eq!((out.len() - 8) % 2, 0);
        let declared = u32::from_le_bytes(out[4..8].try_into().unwrap()) as usize;
        assert_eq!(declared, out.len() - 8);
    }

    #[test]
    fn test_non_webp_input_passes_through() {
        let bogus = b"not a riff container".to_vec();
        let out = embed_exif(bogus.clone(), b"II*\0x", 4, 4, false);
        assert_eq!(out, bogus);
    }

    #[test]
    fn test_empty_exif_passes_through() {
        let src = fake_simple_webp(&[1, 2, 3, 4]);
        let out = embed_exif(src.clone(), b"", 4, 4, false);
        assert_eq!(out, src);
    }
}
