//! Cartridge data model
//!
//! A cartridge is `BANK_COUNT` banks of graphics/sound assets plus one
//! shared code string, binary blob, and language tag (spec §4.4). Byte
//! widths mirror the corresponding regions of [`crate::mem::Ram`] so a
//! bank can be copied straight into the RAM working set.

use crate::mem::{
    BANK_COUNT, FONT_GLYPHS, FONT_GLYPH_BYTES, MUSIC_PATTERN_COUNT, MUSIC_PATTERN_ROWS,
    MUSIC_ROW_BYTES, MUSIC_TRACK_BYTES, MUSIC_TRACK_COUNT, SCREEN_H, SCREEN_W, SFX_COUNT,
    SFX_ENTRY_BYTES, SOUND_CHANNELS, SPRITE_FLAG_COUNT, TILES_PER_BANK, TILE_BYTES,
    WAVEFORM_ENTRIES, WAVEFORM_TABLE_COUNT,
};

pub const TILE_BANK_BYTES: usize = TILE_BYTES * TILES_PER_BANK;
pub const MAP_BYTES: usize = SCREEN_W * SCREEN_H;
pub const WAVEFORM_TABLE_BYTES: usize = (WAVEFORM_ENTRIES / 2) * WAVEFORM_TABLE_COUNT;
pub const SFX_TABLE_BYTES: usize = SFX_ENTRY_BYTES * SFX_COUNT;
pub const MUSIC_PATTERN_BYTES: usize = MUSIC_ROW_BYTES * MUSIC_PATTERN_ROWS * SOUND_CHANNELS;
pub const MUSIC_PATTERNS_BYTES: usize = MUSIC_PATTERN_BYTES * MUSIC_PATTERN_COUNT;
pub const MUSIC_TRACKS_BYTES: usize = MUSIC_TRACK_BYTES * MUSIC_TRACK_COUNT;
pub const SCREEN_BYTES: usize = SCREEN_W * SCREEN_H / 2;
pub const PALETTE_BYTES: usize = 16 * 3;
pub const FLAGS_BYTES: usize = SPRITE_FLAG_COUNT;
pub const FONT_BYTES: usize = FONT_GLYPHS * FONT_GLYPH_BYTES;

/// Sweetie16, the console's built-in default palette.
pub const DEFAULT_PALETTE: [u8; PALETTE_BYTES] = [
    0x1a, 0x1c, 0x2c, 0x5d, 0x27, 0x5d, 0xb1, 0x3e, 0x53, 0xef, 0x7d, 0x57, 0xff, 0xcd, 0x75,
    0xa7, 0xf0, 0x70, 0x38, 0xb7, 0x64, 0x25, 0x71, 0x79, 0x29, 0x36, 0x6f, 0x3b, 0x5d, 0xc9,
    0x41, 0xa6, 0xf6, 0x73, 0xef, 0xf7, 0xf4, 0xf4, 0xf4, 0x94, 0xb0, 0xc2, 0x56, 0x6c, 0x86,
    0x33, 0x3c, 0x57,
];

/// Built-in default waveform tables: a square, a sawtooth-ish ramp, and
/// a couple of variations, zero-padded out to `WAVEFORM_TABLE_COUNT`.
const DEFAULT_WAVEFORMS_SEED: [u8; 48] = [
    0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff,
    0xff, 0x10, 0x32, 0x54, 0x76, 0x98, 0xba, 0xdc, 0xfe, 0xef, 0xcd, 0xab, 0x89, 0x67, 0x45,
    0x23, 0x01, 0x10, 0x32, 0x54, 0x76, 0x98, 0xba, 0xdc, 0xfe, 0x10, 0x32, 0x54, 0x76, 0x98,
    0xba, 0xdc, 0xfe,
];

pub fn default_waveforms() -> Vec<u8> {
    let mut out = vec![0u8; WAVEFORM_TABLE_BYTES];
    let n = DEFAULT_WAVEFORMS_SEED.len().min(out.len());
    out[..n].copy_from_slice(&DEFAULT_WAVEFORMS_SEED[..n]);
    out
}

/// One cartridge bank. `tiles`/`sprites` share the 256-tile-per-bank
/// layout `Ram` uses for its two combined banks; the cartridge just
/// keeps them bank-separated until load copies bank 0 into `Ram`.
#[derive(Clone)]
pub struct Bank {
    pub tiles: Vec<u8>,
    pub sprites: Vec<u8>,
    pub map: Vec<u8>,
    pub palette: Vec<u8>,
    pub waveforms: Vec<u8>,
    pub sfx: Vec<u8>,
    pub music_patterns: Vec<u8>,
    pub music_tracks: Vec<u8>,
    pub flags: Vec<u8>,
    pub screen: Vec<u8>,
    /// `true` once a `default` chunk marks this bank's palette/waveforms
    /// as equal to the built-ins, so save can re-emit the marker instead
    /// of the full payload.
    pub uses_default_assets: bool,
}

impl Bank {
    pub fn empty() -> Self {
        Bank {
            tiles: vec![0; TILE_BANK_BYTES],
            sprites: vec![0; TILE_BANK_BYTES],
            map: vec![0; MAP_BYTES],
            palette: DEFAULT_PALETTE.to_vec(),
            waveforms: default_waveforms(),
            sfx: vec![0; SFX_TABLE_BYTES],
            music_patterns: vec![0; MUSIC_PATTERNS_BYTES],
            music_tracks: vec![0; MUSIC_TRACKS_BYTES],
            flags: vec![0; FLAGS_BYTES],
            screen: vec![0; SCREEN_BYTES],
            uses_default_assets: true,
        }
    }

    pub fn is_default_assets(&self) -> bool {
        self.palette == DEFAULT_PALETTE.to_vec() && self.waveforms == default_waveforms()
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::empty()
    }
}

/// A complete cartridge: `BANK_COUNT` banks plus cross-bank code,
/// binary blob, and language tag.
#[derive(Clone)]
pub struct Cartridge {
    pub banks: Vec<Bank>,
    pub code: String,
    pub binary: Vec<u8>,
    pub language: String,
}

impl Cartridge {
    pub fn empty() -> Self {
        Cartridge {
            banks: (0..BANK_COUNT).map(|_| Bank::empty()).collect(),
            code: String::new(),
            binary: Vec::new(),
            language: String::new(),
        }
    }

    pub fn bank(&self, index: usize) -> &Bank {
        &self.banks[index % BANK_COUNT]
    }

    pub fn bank_mut(&mut self, index: usize) -> &mut Bank {
        let index = index % BANK_COUNT;
        &mut self.banks[index]
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cartridge_has_all_banks_on_defaults() {
        let cart = Cartridge::empty();
        assert_eq!(cart.banks.len(), BANK_COUNT);
        assert!(cart.bank(0).is_default_assets());
    }

    #[test]
    fn default_waveforms_are_zero_padded_to_full_table() {
        let waveforms = default_waveforms();
        assert_eq!(waveforms.len(), WAVEFORM_TABLE_BYTES);
    }
}
