//! Cartridge binary chunk format: parse, load, save, and read-only PNG
//! unwrapping
//!
//! A cartridge file is a stream of 4-byte-header chunks (spec §4.4).
//! `load` never partially populates a `Cartridge` on malformed input —
//! per the error-handling design, a cartridge-format violation leaves
//! the cartridge in its clean default state and the caller is told why.

use flate2::read::ZlibDecoder;
use std::io::Read;

use crate::cartridge::{Cartridge, DEFAULT_PALETTE, default_waveforms};
use crate::error::CartError;
use crate::mem::BANK_COUNT;

const BANK_SIZE: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
enum ChunkType {
    Tiles = 1,
    Sprites = 2,
    CoverDeprecated = 3,
    Map = 4,
    Code = 5,
    Flags = 6,
    Samples = 9,
    Waveform = 10,
    Palette = 12,
    PatternsDeprecated = 13,
    Music = 14,
    Patterns = 15,
    CodeZip = 16,
    Default = 17,
    Screen = 18,
    Binary = 19,
    Lang = 20,
}

impl ChunkType {
    fn from_u8(v: u8) -> Option<ChunkType> {
        use ChunkType::*;
        Some(match v {
            1 => Tiles,
            2 => Sprites,
            3 => CoverDeprecated,
            4 => Map,
            5 => Code,
            6 => Flags,
            9 => Samples,
            10 => Waveform,
            12 => Palette,
            13 => PatternsDeprecated,
            14 => Music,
            15 => Patterns,
            16 => CodeZip,
            17 => Default,
            18 => Screen,
            19 => Binary,
            20 => Lang,
            _ => return None,
        })
    }
}

struct ChunkHeader {
    chunk_type: u8,
    bank: u8,
    size: usize,
}

fn parse_header(bytes: &[u8]) -> Result<ChunkHeader, CartError> {
    if bytes.len() < 4 {
        return Err(CartError::TruncatedHeader);
    }
    let chunk_type = bytes[0] & 0x1F;
    let bank = (bytes[0] >> 5) | ((bytes[1] & 0x01) << 3);
    let declared = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
    Ok(ChunkHeader { chunk_type, bank, size: declared })
}

/// Load a raw (non-PNG) or PNG-wrapped cartridge byte stream.
pub fn load(buffer: &[u8]) -> Result<Cartridge, CartError> {
    let owned;
    let payload: &[u8] = if buffer.starts_with(b"\x89PNG") {
        owned = unwrap_png(buffer)?;
        &owned
    } else {
        buffer
    };

    let mut cart = Cartridge::empty();

    // First pass: palette + default markers, so defaults land before
    // anything that might override them.
    walk_chunks(payload, |header, body| {
        if header.bank as usize >= BANK_COUNT {
            return Err(CartError::BankOutOfRange(header.bank));
        }
        let bank = cart.bank_mut(header.bank as usize);
        match ChunkType::from_u8(header.chunk_type) {
            Some(ChunkType::Palette) => copy_into(&mut bank.palette, body),
            Some(ChunkType::Default) => {
                bank.palette = DEFAULT_PALETTE.to_vec();
                bank.waveforms = default_waveforms();
                bank.uses_default_assets = true;
            }
            _ => {}
        }
        Ok(())
    })?;

    let mut code_segments: Vec<(u8, Vec<u8>)> = Vec::new();
    let mut binary_segments: Vec<(u8, Vec<u8>)> = Vec::new();

    // Second pass: everything else.
    walk_chunks(payload, |header, body| {
        if header.bank as usize >= BANK_COUNT {
            return Err(CartError::BankOutOfRange(header.bank));
        }
        match ChunkType::from_u8(header.chunk_type) {
            Some(ChunkType::Tiles) => copy_into(&mut cart.bank_mut(header.bank as usize).tiles, body),
            Some(ChunkType::Sprites) => copy_into(&mut cart.bank_mut(header.bank as usize).sprites, body),
            Some(ChunkType::Map) => copy_into(&mut cart.bank_mut(header.bank as usize).map, body),
            Some(ChunkType::Samples) => copy_into(&mut cart.bank_mut(header.bank as usize).sfx, body),
            Some(ChunkType::Waveform) => {
                let bank = cart.bank_mut(header.bank as usize);
                copy_into(&mut bank.waveforms, body);
                bank.uses_default_assets = false;
            }
            Some(ChunkType::Music) => copy_into(&mut cart.bank_mut(header.bank as usize).music_tracks, body),
            Some(ChunkType::Patterns) => copy_into(&mut cart.bank_mut(header.bank as usize).music_patterns, body),
            Some(ChunkType::Flags) => copy_into(&mut cart.bank_mut(header.bank as usize).flags, body),
            Some(ChunkType::Screen) => copy_into(&mut cart.bank_mut(header.bank as usize).screen, body),
            Some(ChunkType::Lang) => cart.language = String::from_utf8_lossy(body).trim_end_matches('\0').to_string(),
            Some(ChunkType::Binary) => binary_segments.push((header.bank, body.to_vec())),
            Some(ChunkType::Code) => code_segments.push((header.bank, body.to_vec())),
            Some(ChunkType::CodeZip) => {
                let mut decoder = ZlibDecoder::new(body);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out).map_err(|e| CartError::Inflate(e.to_string()))?;
                code_segments.push((header.bank, out));
            }
            // Deprecated formats are read-compatible only when their
            // bytes don't need translating into current bank fields;
            // per the format's own notes neither is worth resurrecting
            // here, so they're accepted (chunk consumed) and discarded.
            Some(ChunkType::CoverDeprecated) => log::debug!("dropping deprecated cover-gif chunk (bank {})", header.bank),
            Some(ChunkType::PatternsDeprecated) => {
                log::debug!("dropping deprecated old-patterns chunk (bank {})", header.bank)
            }
            Some(ChunkType::Palette) | Some(ChunkType::Default) => {}
            None => log::warn!("unknown chunk type {} in bank {}, skipping", header.chunk_type, header.bank),
        }
        Ok(())
    })?;

    // Binary/code chunks across banks concatenate in reverse bank order.
    binary_segments.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, seg) in binary_segments {
        cart.binary.extend(seg);
    }
    code_segments.sort_by(|a, b| b.0.cmp(&a.0));
    let mut code_bytes = Vec::new();
    for (_, seg) in code_segments {
        code_bytes.extend(seg);
    }
    cart.code = String::from_utf8_lossy(&code_bytes).trim_end_matches('\0').to_string();

    Ok(cart)
}

fn walk_chunks(
    bytes: &[u8],
    mut visit: impl FnMut(&ChunkHeader, &[u8]) -> Result<(), CartError>,
) -> Result<(), CartError> {
    let mut pos = 0;
    while pos < bytes.len() {
        let header = parse_header(&bytes[pos..])?;
        pos += 4;
        let size = if header.size == 0
            && matches!(ChunkType::from_u8(header.chunk_type), Some(ChunkType::Code) | Some(ChunkType::Binary))
        {
            BANK_SIZE
        } else {
            header.size
        };
        if pos + size > bytes.len() {
            return Err(CartError::TruncatedPayload);
        }
        visit(&header, &bytes[pos..pos + size])?;
        pos += size;
    }
    Ok(())
}

fn copy_into(dest: &mut Vec<u8>, body: &[u8]) {
    let n = body.len().min(dest.len());
    dest[..n].copy_from_slice(&body[..n]);
}

/// Scan a PNG's ancillary chunk stream for a `caRt` chunk and inflate
/// its payload. Implemented as a direct chunk walk (length, type, data,
/// crc) rather than a full PNG decode — the core never needs pixel
/// data, only this one non-standard ancillary chunk.
fn unwrap_png(png_bytes: &[u8]) -> Result<Vec<u8>, CartError> {
    let mut pos = 8usize; // past the 8-byte PNG signature
    while pos + 8 <= png_bytes.len() {
        let len = u32::from_be_bytes(png_bytes[pos..pos + 4].try_into().unwrap()) as usize;
        let chunk_type = &png_bytes[pos + 4..pos + 8];
        let data_start = pos + 8;
        if data_start + len + 4 > png_bytes.len() {
            break;
        }
        if chunk_type == b"caRt" && len > 0 {
            let data = &png_bytes[data_start..data_start + len];
            let mut decoder = ZlibDecoder::new(data);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).map_err(|e| CartError::Inflate(e.to_string()))?;
            return Ok(out);
        }
        pos = data_start + len + 4; // skip past the trailing CRC
    }
    Err(CartError::MissingPngPayload)
}

/// Serialize a cartridge to the raw (non-PNG) chunk stream.
pub fn save(cart: &Cartridge) -> Vec<u8> {
    let mut out = Vec::new();

    for (i, bank) in cart.banks.iter().enumerate() {
        let i = i as u8;
        if bank.is_default_assets() {
            push_chunk(&mut out, ChunkType::Default as u8, i, &[]);
        } else {
            push_trimmed(&mut out, ChunkType::Palette as u8, i, &bank.palette);
            push_trimmed(&mut out, ChunkType::Waveform as u8, i, &bank.waveforms);
        }
        push_trimmed(&mut out, ChunkType::Tiles as u8, i, &bank.tiles);
        push_trimmed(&mut out, ChunkType::Sprites as u8, i, &bank.sprites);
        push_trimmed(&mut out, ChunkType::Map as u8, i, &bank.map);
        push_trimmed(&mut out, ChunkType::Samples as u8, i, &bank.sfx);
        push_trimmed(&mut out, ChunkType::Patterns as u8, i, &bank.music_patterns);
        push_trimmed(&mut out, ChunkType::Music as u8, i, &bank.music_tracks);
        push_trimmed(&mut out, ChunkType::Flags as u8, i, &bank.flags);
        push_trimmed(&mut out, ChunkType::Screen as u8, i, &bank.screen);
    }

    // Binary/code as one chunk per bank-sized segment, highest bank first.
    emit_segmented(&mut out, ChunkType::Binary as u8, &cart.binary);
    emit_segmented(&mut out, ChunkType::Code as u8, cart.code.as_bytes());

    if !cart.language.is_empty() {
        push_chunk(&mut out, ChunkType::Lang as u8, 0, cart.language.as_bytes());
    }

    out
}

fn emit_segmented(out: &mut Vec<u8>, chunk_type: u8, bytes: &[u8]) {
    if bytes.is_empty() {
        return;
    }
    let segments = bytes.chunks(BANK_SIZE).collect::<Vec<_>>();
    let bank_count = segments.len().min(BANK_COUNT);
    for (i, seg) in segments.iter().take(bank_count).enumerate() {
        let bank = (bank_count - 1 - i) as u8;
        push_chunk(out, chunk_type, bank, seg);
    }
}

fn push_trimmed(out: &mut Vec<u8>, chunk_type: u8, bank: u8, payload: &[u8]) {
    let trimmed = trim_trailing_zeros(payload);
    if trimmed.is_empty() {
        return;
    }
    push_chunk(out, chunk_type, bank, trimmed);
}

fn trim_trailing_zeros(bytes: &[u8]) -> &[u8] {
    let len = bytes.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0);
    &bytes[..len]
}

fn push_chunk(out: &mut Vec<u8>, chunk_type: u8, bank: u8, payload: &[u8]) {
    let size = payload.len().min(u16::MAX as usize) as u16;
    let byte0 = (chunk_type & 0x1F) | ((bank & 0x07) << 5);
    let byte1 = (bank >> 3) & 0x01;
    out.push(byte0);
    out.push(byte1);
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&payload[..size as usize]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cartridge_round_trips_to_all_default_markers() {
        let cart = Cartridge::empty();
        let bytes = save(&cart);
        let loaded = load(&bytes).unwrap();
        assert!(loaded.bank(0).is_default_assets());
        assert_eq!(loaded.code, "");
    }

    #[test]
    fn tiles_and_code_round_trip() {
        let mut cart = Cartridge::empty();
        cart.bank_mut(0).tiles[0] = 0xAB;
        cart.bank_mut(0).uses_default_assets = false;
        cart.bank_mut(0).waveforms[0] = 1; // not the default seed anymore
        cart.code = "function TIC() end".to_string();

        let bytes = save(&cart);
        let loaded = load(&bytes).unwrap();
        assert_eq!(loaded.bank(0).tiles[0], 0xAB);
        assert_eq!(loaded.code, "function TIC() end");
    }

    #[test]
    fn truncated_header_is_rejected() {
        let err = load(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CartError::TruncatedHeader));
    }

    #[test]
    fn bank_out_of_range_is_rejected() {
        // bank field = 0b1111 (15), well past BANK_COUNT (8).
        let bytes = vec![(ChunkType::Tiles as u8) | (0b111 << 5), 0b1, 0, 0];
        let err = load(&bytes).unwrap_err();
        assert!(matches!(err, CartError::BankOutOfRange(_)));
    }

    #[test]
    fn png_without_cart_chunk_is_rejected() {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(b"IEND");
        bytes.extend_from_slice(&0u32.to_be_bytes());
        let err = load(&bytes).unwrap_err();
        assert!(matches!(err, CartError::MissingPngPayload));
    }
}
