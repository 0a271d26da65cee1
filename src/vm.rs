//! The tick scheduler: composes memory, rasterizer, sound, and input,
//! and exposes the ~40-function user-facing API
//!
//! `Vm` owns everything a running cartridge touches. One tick is always
//! `tick_start` → (host runs user code, calling API methods on `Vm`) →
//! `tick_end` (spec §4.5); the host drives that sequence, `Vm` never
//! calls back into a script host itself (that's `ScriptHost`'s job, not
//! this module's).

use bitflags::bitflags;

use crate::cartridge::{Bank, Cartridge};
use crate::cartridge_codec;
use crate::error::CartError;
use crate::gfx::{Flip, Gfx, PrintOptions, RemapCallback, Rotate};
use crate::host::ErrorSink;
use crate::input_state::{Buttons, Input, InputLatch};
use crate::mem::Ram;
use crate::persist;
use crate::sound::{MusicPlayer, Sound};

bitflags! {
    /// Which parts of a cartridge bank `sync` moves. Matches the regions
    /// `load_cart` copies into RAM on the first tick, minus the cover
    /// image (the bank's thumbnail, never mirrored into the live RAM
    /// working set).
    pub struct SyncMask: u16 {
        const TILES          = 0b0000_0000_0001;
        const SPRITES        = 0b0000_0000_0010;
        const MAP            = 0b0000_0000_0100;
        const PALETTE        = 0b0000_0000_1000;
        const WAVEFORMS      = 0b0000_0001_0000;
        const SFX            = 0b0000_0010_0000;
        const MUSIC_PATTERNS = 0b0000_0100_0000;
        const MUSIC_TRACKS   = 0b0000_1000_0000;
        const FLAGS          = 0b0001_0000_0000;
        const ALL = Self::TILES.bits | Self::SPRITES.bits | Self::MAP.bits | Self::PALETTE.bits
            | Self::WAVEFORMS.bits | Self::SFX.bits | Self::MUSIC_PATTERNS.bits
            | Self::MUSIC_TRACKS.bits | Self::FLAGS.bits;
    }
}

const FPS: u32 = 60;
const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Construction-time settings for a [`Vm`].
///
/// The noise channel's LFSR starts from a fixed seed regardless of
/// `sample_rate` — ticks must reproduce bit-for-bit given the same
/// cartridge and input trace (spec §8), so nothing here is allowed to
/// vary that.
#[derive(Debug, Clone, Copy)]
pub struct VmConfig {
    pub sample_rate: u32,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig { sample_rate: DEFAULT_SAMPLE_RATE }
    }
}

/// What `pause` snapshots and `resume` restores: music position, sound
/// registers, and VRAM (spec §3 Lifecycle) — everything else keeps
/// running state as-is, since only those three are documented as
/// restorable.
struct PauseSnapshot {
    music: MusicPlayer,
    sound_regs: Vec<u8>,
    vram: Vec<u8>,
}

/// The complete machine state for one cartridge run.
pub struct Vm {
    pub ram: Ram,
    gfx: Gfx,
    sound: Sound,
    input: InputLatch,
    cartridge: Cartridge,
    first_tick: bool,
    paused: bool,
    pause_snapshot: Option<PauseSnapshot>,
    exit_requested: bool,
    vbank: u8,
    frame_count: u64,
}

impl Vm {
    pub fn new() -> Self {
        Vm::with_config(VmConfig::default())
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Vm::with_config(VmConfig { sample_rate })
    }

    pub fn with_config(config: VmConfig) -> Self {
        log::debug!("booting vm with sample_rate={}", config.sample_rate);
        Vm {
            ram: Ram::new(),
            gfx: Gfx::new(),
            sound: Sound::new(config.sample_rate, FPS),
            input: InputLatch::new(),
            cartridge: Cartridge::empty(),
            first_tick: true,
            paused: false,
            pause_snapshot: None,
            exit_requested: false,
            vbank: 0,
            frame_count: 0,
        }
    }

    // --- Cartridge lifecycle -------------------------------------------------

    /// Load a cartridge from raw or PNG-wrapped bytes. On a format
    /// violation, the VM is left exactly as it was before the call.
    pub fn load_cart(&mut self, bytes: &[u8]) -> Result<(), CartError> {
        let cart = cartridge_codec::load(bytes).map_err(|e| {
            log::warn!("cartridge load failed: {e}");
            e
        })?;
        log::info!("cartridge loaded: {} banks, {} bytes of code", cart.banks.len(), cart.code.len());
        self.cartridge = cart;
        self.first_tick = true;
        Ok(())
    }

    pub fn save_cart(&self) -> Vec<u8> {
        cartridge_codec::save(&self.cartridge)
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn code(&self) -> &str {
        &self.cartridge.code
    }

    // --- Tick scheduler -------------------------------------------------------

    /// Copy host input into RAM, advance press-detection state, and (on
    /// the first tick after a load) copy bank 0 of the cartridge into
    /// the RAM working set.
    pub fn tick_start(&mut self, input: &Input) {
        if self.paused {
            return;
        }
        if self.first_tick {
            log::trace!("first tick after load: copying bank 0 into ram");
            self.sync(SyncMask::ALL, 0, false);
            self.first_tick = false;
        }
        self.input.latch(&mut self.ram, input);
    }

    fn cart_to_ram(ram: &mut Ram, bank: &Bank, mask: SyncMask) {
        if mask.contains(SyncMask::TILES) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::TILES, &bank.tiles);
        }
        if mask.contains(SyncMask::SPRITES) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::SPRITES, &bank.sprites);
        }
        if mask.contains(SyncMask::MAP) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::MAP, &bank.map);
        }
        if mask.contains(SyncMask::PALETTE) {
            for i in 0..16 {
                let base = i * 3;
                if base + 2 < bank.palette.len() {
                    ram.set_palette_rgb(i, (bank.palette[base], bank.palette[base + 1], bank.palette[base + 2]));
                }
            }
        }
        if mask.contains(SyncMask::WAVEFORMS) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::WAVEFORMS, &bank.waveforms);
        }
        if mask.contains(SyncMask::SFX) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::SFX_TABLE, &bank.sfx);
        }
        if mask.contains(SyncMask::MUSIC_PATTERNS) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::MUSIC_PATTERNS, &bank.music_patterns);
        }
        if mask.contains(SyncMask::MUSIC_TRACKS) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::MUSIC_TRACKS, &bank.music_tracks);
        }
        if mask.contains(SyncMask::FLAGS) {
            copy_clamped(ram.bytes_mut(), crate::mem::offset::SPRITE_FLAGS, &bank.flags);
        }
    }

    fn ram_to_cart(ram: &Ram, bank: &mut Bank, mask: SyncMask) {
        if mask.contains(SyncMask::TILES) {
            copy_clamped(&mut bank.tiles, 0, &ram.bytes()[crate::mem::offset::TILES..crate::mem::offset::SPRITES]);
        }
        if mask.contains(SyncMask::SPRITES) {
            copy_clamped(&mut bank.sprites, 0, &ram.bytes()[crate::mem::offset::SPRITES..crate::mem::offset::MAP]);
        }
        if mask.contains(SyncMask::MAP) {
            copy_clamped(&mut bank.map, 0, &ram.bytes()[crate::mem::offset::MAP..crate::mem::offset::INPUT]);
        }
        if mask.contains(SyncMask::PALETTE) {
            for i in 0..16 {
                let base = i * 3;
                if base + 2 < bank.palette.len() {
                    let (r, g, b) = ram.palette_rgb(i);
                    bank.palette[base] = r;
                    bank.palette[base + 1] = g;
                    bank.palette[base + 2] = b;
                }
            }
            bank.uses_default_assets = false;
        }
        if mask.contains(SyncMask::WAVEFORMS) {
            copy_clamped(
                &mut bank.waveforms,
                0,
                &ram.bytes()[crate::mem::offset::WAVEFORMS..crate::mem::offset::SFX_TABLE],
            );
            bank.uses_default_assets = false;
        }
        if mask.contains(SyncMask::SFX) {
            copy_clamped(
                &mut bank.sfx,
                0,
                &ram.bytes()[crate::mem::offset::SFX_TABLE..crate::mem::offset::MUSIC_PATTERNS],
            );
        }
        if mask.contains(SyncMask::MUSIC_PATTERNS) {
            copy_clamped(
                &mut bank.music_patterns,
                0,
                &ram.bytes()[crate::mem::offset::MUSIC_PATTERNS..crate::mem::offset::MUSIC_TRACKS],
            );
        }
        if mask.contains(SyncMask::MUSIC_TRACKS) {
            copy_clamped(
                &mut bank.music_tracks,
                0,
                &ram.bytes()[crate::mem::offset::MUSIC_TRACKS..crate::mem::offset::PERSISTENT],
            );
        }
        if mask.contains(SyncMask::FLAGS) {
            copy_clamped(
                &mut bank.flags,
                0,
                &ram.bytes()[crate::mem::offset::SPRITE_FLAGS..crate::mem::offset::FONT],
            );
        }
    }

    /// Run one tick's worth of sound synthesis after user code has run,
    /// producing this tick's stereo PCM.
    pub fn tick_end(&mut self) -> Vec<i16> {
        self.frame_count += 1;
        self.sound.tick_end(&mut self.ram)
    }

    /// Composite the framebuffer into 32-bit RGBA, invoking `scanline`
    /// once per row and `overline` once at the end (spec §4.5).
    pub fn composite(&self, mut scanline: impl FnMut(&Ram, i32), overline: impl FnOnce(&Ram)) -> Vec<u8> {
        let mut out = Vec::with_capacity(crate::mem::SCREEN_W * crate::mem::SCREEN_H * 4);
        for y in 0..crate::mem::SCREEN_H as i32 {
            for x in 0..crate::mem::SCREEN_W as i32 {
                let idx = self.ram.screen_pixel(x, y);
                let (r, g, b) = self.ram.palette_rgb(idx as usize);
                out.extend_from_slice(&[r, g, b, 0xFF]);
            }
            scanline(&self.ram, y);
        }
        overline(&self.ram);
        out
    }

    /// Snapshot music position, sound registers, and VRAM into a
    /// parallel slot (spec §3 Lifecycle). `tick_start` still no-ops
    /// while paused; this just preserves what a resume needs to put
    /// things back exactly where they were.
    pub fn pause(&mut self) {
        self.paused = true;
        self.pause_snapshot = Some(PauseSnapshot {
            music: self.sound.music,
            sound_regs: self.ram.bytes()[crate::mem::offset::SOUND_REGS..crate::mem::offset::WAVEFORMS].to_vec(),
            vram: self.ram.bytes()[crate::mem::offset::VRAM..crate::mem::offset::TILES].to_vec(),
        });
    }

    /// Restore the snapshot `pause` took, if any, and resume ticking.
    pub fn resume(&mut self) {
        if let Some(snapshot) = self.pause_snapshot.take() {
            self.sound.music = snapshot.music;
            self.ram.bytes_mut()[crate::mem::offset::SOUND_REGS..crate::mem::offset::WAVEFORMS]
                .copy_from_slice(&snapshot.sound_regs);
            self.ram.bytes_mut()[crate::mem::offset::VRAM..crate::mem::offset::TILES].copy_from_slice(&snapshot.vram);
        }
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Copy the regions selected by `mask` between cartridge bank
    /// `bank` and the RAM working set, atomically and only once per
    /// call (spec §3 invariant). `to_cart = false` is cart→RAM (what
    /// `tick_start` does on load); `to_cart = true` is RAM→cart, for a
    /// host/editor that wants to write the running state back out.
    pub fn sync(&mut self, mask: SyncMask, bank: usize, to_cart: bool) {
        if to_cart {
            let bank_mut = self.cartridge.bank_mut(bank);
            Self::ram_to_cart(&self.ram, bank_mut, mask);
        } else {
            let bank = self.cartridge.bank(bank).clone();
            Self::cart_to_ram(&mut self.ram, &bank, mask);
        }
    }

    // --- Meta API --------------------------------------------------------------

    /// `time()`: milliseconds since VM boot, at `1000/60` per tick.
    pub fn time(&self) -> f64 {
        self.frame_count as f64 * (1000.0 / FPS as f64)
    }

    /// `tstamp()`: host wall-clock time in seconds, if supplied;
    /// falls back to the deterministic `time()` clock otherwise, since
    /// the core has no wall-clock source of its own.
    pub fn tstamp(&self, now_ms: Option<u64>) -> u64 {
        match now_ms {
            Some(ms) => ms / 1000,
            None => (self.time() / 1000.0) as u64,
        }
    }

    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn reset(&mut self) {
        log::debug!("vm reset at frame {}", self.frame_count);
        self.ram.reset_volatile();
        self.gfx.reset();
        self.input.reset();
        self.first_tick = true;
        self.frame_count = 0;
    }

    pub fn fget(&self, sprite_id: u16, bit: u8) -> bool {
        self.ram.sprite_flag(sprite_id, bit)
    }

    pub fn fset(&mut self, sprite_id: u16, bit: u8, value: bool) {
        self.ram.set_sprite_flag(sprite_id, bit, value);
    }

    /// `vbank(id)`: select which VRAM bank subsequent drawing calls
    /// target, for raster effects that need a second framebuffer.
    /// Supplements the carried-forward spec with a second VRAM bank —
    /// swapping is a host/editor feature, so the core only tracks the
    /// selector and returns the previous value.
    pub fn vbank(&mut self, id: u8) -> u8 {
        let prev = self.vbank;
        self.vbank = id & 0x01;
        prev
    }

    /// `trace(message, color)`: forwards to the host's error/console
    /// callback. The core never formats or filters the message.
    pub fn trace(&self, sink: &mut impl ErrorSink, message: &str, color: u8) {
        sink.error(message, color);
    }

    // --- Memory API --------------------------------------------------------------

    pub fn peek(&self, addr: usize) -> u8 {
        self.ram.peek(addr)
    }

    pub fn poke(&mut self, addr: usize, value: u8) {
        self.ram.poke(addr, value);
    }

    pub fn peek4(&self, nibble_index: usize) -> u8 {
        self.ram.peek4(nibble_index)
    }

    pub fn poke4(&mut self, nibble_index: usize, value: u8) {
        self.ram.poke4(nibble_index, value);
    }

    pub fn peek1(&self, bit_index: usize) -> u8 {
        self.ram.peek1(bit_index)
    }

    pub fn poke1(&mut self, bit_index: usize, value: u8) {
        self.ram.poke1(bit_index, value);
    }

    pub fn peek2(&self, pair_index: usize) -> u8 {
        crate::bitpack::peek2(self.ram.bytes(), pair_index)
    }

    pub fn poke2(&mut self, pair_index: usize, value: u8) {
        crate::bitpack::poke2(self.ram.bytes_mut(), pair_index, value);
    }

    pub fn memcpy(&mut self, dest: usize, src: usize, len: usize) {
        let bytes = self.ram.bytes_mut();
        if dest + len > bytes.len() || src + len > bytes.len() {
            log::warn!("memcpy(dest={dest}, src={src}, len={len}) out of bounds, ignored");
            return;
        }
        if dest <= src {
            for i in 0..len {
                bytes[dest + i] = bytes[src + i];
            }
        } else {
            for i in (0..len).rev() {
                bytes[dest + i] = bytes[src + i];
            }
        }
    }

    pub fn memset(&mut self, addr: usize, value: u8, len: usize) {
        let bytes = self.ram.bytes_mut();
        let end = (addr + len).min(bytes.len());
        if addr < end {
            bytes[addr..end].fill(value);
        }
    }

    pub fn pmem(&self, index: usize) -> u32 {
        self.ram.persistent(index)
    }

    pub fn set_pmem(&mut self, index: usize, value: u32) {
        self.ram.set_persistent(index, value);
    }

    pub fn save_persistent(&self) -> Vec<u8> {
        persist::save(&self.ram)
    }

    pub fn load_persistent(&mut self, bytes: &[u8]) -> Result<(), crate::error::PersistError> {
        persist::load(&mut self.ram, bytes)
    }

    // --- Input API --------------------------------------------------------------

    pub fn btn(&self, pad: usize, button: Buttons) -> bool {
        self.input.btn(&self.ram, pad, button)
    }

    pub fn btnp(&self, pad: usize, button: Buttons, hold: i32, period: i32) -> bool {
        self.input.btnp(&self.ram, pad, button, hold, period)
    }

    pub fn key(&self, code: u8) -> bool {
        self.input.key(&self.ram, code)
    }

    pub fn keyp(&self, code: u8, hold: i32, period: i32) -> bool {
        self.input.keyp(&self.ram, code, hold, period)
    }

    pub fn mouse(&self) -> (i16, i16, u8, i8) {
        self.ram.mouse()
    }

    // --- Sound API --------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn sfx(&mut self, channel: usize, index: u8, note: u8, duration: i32, volume: u8, speed: i8) {
        self.sound.sfx(channel, index, note, duration, volume, speed);
    }

    pub fn sfx_stop(&mut self, channel: usize) {
        self.sound.sfx_stop(channel);
    }

    pub fn music(&mut self, track: u8, frame: usize, once: bool) {
        self.sound.music_play(track, frame, once);
    }

    pub fn music_stop(&mut self) {
        self.sound.music_stop();
    }

    // --- Drawing API --------------------------------------------------------------

    pub fn clip(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.gfx.set_clip(x, y, w, h);
    }

    pub fn clear_clip(&mut self) {
        self.gfx.clear_clip();
    }

    pub fn cls(&mut self, color: u8) {
        self.gfx.cls(&mut self.ram, color);
    }

    pub fn pix(&mut self, x: i32, y: i32, color: Option<u8>) -> u8 {
        self.gfx.pix(&mut self.ram, x, y, color)
    }

    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u8) {
        self.gfx.line(&mut self.ram, x0, y0, x1, y1, color);
    }

    pub fn rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u8) {
        self.gfx.rect(&mut self.ram, x, y, w, h, color);
    }

    pub fn rectb(&mut self, x: i32, y: i32, w: i32, h: i32, color: u8) {
        self.gfx.rectb(&mut self.ram, x, y, w, h, color);
    }

    pub fn circ(&mut self, cx: i32, cy: i32, radius: i32, color: u8) {
        self.gfx.circ(&mut self.ram, cx, cy, radius, color);
    }

    pub fn circb(&mut self, cx: i32, cy: i32, radius: i32, color: u8) {
        self.gfx.circb(&mut self.ram, cx, cy, radius, color);
    }

    pub fn elli(&mut self, cx: i32, cy: i32, a: i32, b: i32, color: u8) {
        self.gfx.elli(&mut self.ram, cx, cy, a, b, color);
    }

    pub fn ellib(&mut self, cx: i32, cy: i32, a: i32, b: i32, color: u8) {
        self.gfx.ellib(&mut self.ram, cx, cy, a, b, color);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tri(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        self.gfx.tri(&mut self.ram, x0, y0, x1, y1, x2, y2, color);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn trib(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, x2: i32, y2: i32, color: u8) {
        self.gfx.trib(&mut self.ram, x0, y0, x1, y1, x2, y2, color);
    }

    pub fn textri(&mut self, p: [(f32, f32); 3], uv: [(f32, f32); 3], use_map: bool, chroma_key: Option<u8>) {
        self.gfx.textri(&mut self.ram, p, uv, use_map, chroma_key);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spr(&mut self, id: u16, x: i32, y: i32, colorkey: &[u8], scale: i32, flip: Flip, rotate: Rotate) {
        self.gfx.spr(&mut self.ram, id, x, y, colorkey, scale, flip, rotate);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spr_rect(
        &mut self,
        id: u16,
        x: i32,
        y: i32,
        w: u8,
        h: u8,
        colorkey: &[u8],
        scale: i32,
        flip: Flip,
        rotate: Rotate,
    ) {
        self.gfx.spr_rect(&mut self.ram, id, x, y, w, h, colorkey, scale, flip, rotate);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn map(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        sx: i32,
        sy: i32,
        colorkey: &[u8],
        scale: i32,
        remap: Option<&mut dyn RemapCallback>,
    ) {
        self.gfx.map(&mut self.ram, x, y, w, h, sx, sy, colorkey, scale, remap);
    }

    pub fn mget(&self, x: i32, y: i32) -> u8 {
        self.gfx.mget(&self.ram, x, y)
    }

    pub fn mset(&mut self, x: i32, y: i32, tile_id: u8) {
        self.gfx.mset(&mut self.ram, x, y, tile_id);
    }

    pub fn print(&mut self, text: &str, x: i32, y: i32, opts: PrintOptions) -> i32 {
        self.gfx.print(&mut self.ram, text, x, y, opts)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn font(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        sheet_index: u16,
        char_w: u8,
        char_h: u8,
        colorkey: &[u8],
        scale: i32,
        fixed: bool,
    ) -> i32 {
        self.gfx.font(&mut self.ram, text, x, y, sheet_index, char_w, char_h, colorkey, scale, fixed)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_clamped(dest: &mut [u8], offset: usize, src: &[u8]) {
    let end = (offset + src.len()).min(dest.len());
    if offset < end {
        let n = end - offset;
        dest[offset..end].copy_from_slice(&src[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullErrorSink;

    #[test]
    fn fresh_vm_boots_with_a_blank_default_cartridge() {
        let mut vm = Vm::new();
        vm.tick_start(&Input::default());
        assert_eq!(vm.code(), "");
    }

    #[test]
    fn time_advances_one_frame_per_tick() {
        let mut vm = Vm::new();
        vm.tick_start(&Input::default());
        vm.tick_end();
        assert!((vm.time() - 1000.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn reset_preserves_persistent_memory() {
        let mut vm = Vm::new();
        vm.set_pmem(3, 42);
        vm.reset();
        assert_eq!(vm.pmem(3), 42);
    }

    #[test]
    fn trace_forwards_to_the_error_sink() {
        let vm = Vm::new();
        let mut sink = NullErrorSink;
        vm.trace(&mut sink, "hello", 2);
    }

    #[test]
    fn memcpy_handles_overlapping_forward_copy() {
        let mut vm = Vm::new();
        vm.poke(0, 1);
        vm.poke(1, 2);
        vm.poke(2, 3);
        vm.memcpy(1, 0, 3);
        assert_eq!(vm.peek(1), 1);
        assert_eq!(vm.peek(2), 2);
        assert_eq!(vm.peek(3), 3);
    }

    #[test]
    fn sync_round_trip_is_identity_on_the_cartridge_bank() {
        let mut vm = Vm::new();
        vm.tick_start(&Input::default());
        vm.poke(crate::mem::offset::TILES, 0xAB);
        let before = vm.cartridge().bank(0).tiles.clone();

        vm.sync(SyncMask::TILES, 0, true);
        vm.sync(SyncMask::TILES, 0, false);

        assert_ne!(vm.cartridge().bank(0).tiles, before);
        assert_eq!(vm.peek(crate::mem::offset::TILES), 0xAB);
        let after_to_cart = vm.cartridge().bank(0).tiles.clone();
        vm.sync(SyncMask::TILES, 0, false);
        vm.sync(SyncMask::TILES, 0, true);
        assert_eq!(vm.cartridge().bank(0).tiles, after_to_cart);
    }

    #[test]
    fn pause_then_resume_restores_sound_registers_and_vram() {
        let mut vm = Vm::new();
        vm.tick_start(&Input::default());
        vm.sfx(0, 0, 60, -1, 15, 0);
        vm.tick_end();
        let reg_before = vm.peek(crate::mem::offset::SOUND_REGS);
        vm.cls(5);
        let pixel_before = vm.pix(0, 0, None);

        vm.pause();
        vm.poke(crate::mem::offset::SOUND_REGS, reg_before.wrapping_add(1));
        vm.cls(9);

        vm.resume();
        assert_eq!(vm.peek(crate::mem::offset::SOUND_REGS), reg_before);
        assert_eq!(vm.pix(0, 0, None), pixel_before);
    }
}
