//! Music tracker: patterns, tracks, and the playback state machine
//!
//! A pattern is a fixed-length column of rows, one row per game tick
//! group; a track assembles up to four channels' worth of pattern
//! indices per frame. Row advance is driven by tempo/speed the same way
//! a tracker clocks rows off a BPM (spec §4.3, "Music (tracker)").

/// One cell of a pattern: note, volume/effect, effect parameter, and an
/// optional sfx override — serialized with an explicit byte layout
/// rather than a reinterpret-cast struct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct MusicRow {
    pub note: u8,
    pub volume: u8,
    pub effect: u8,
    pub param: u8,
    pub sfx: u8,
}

pub const MUSIC_ROW_BYTES: usize = 4;

impl MusicRow {
    pub fn encode(&self) -> [u8; MUSIC_ROW_BYTES] {
        [
            self.note,
            (self.volume << 4) | (self.effect & 0x0F),
            self.param,
            self.sfx,
        ]
    }

    pub fn decode(bytes: &[u8]) -> MusicRow {
        MusicRow {
            note: bytes[0],
            volume: bytes[1] >> 4,
            effect: bytes[1] & 0x0F,
            param: bytes[2],
            sfx: bytes[3],
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == MusicRow::default()
    }
}

pub const PATTERN_ROWS: usize = 64;
pub const PATTERN_CHANNELS: usize = 4;
pub const TRACK_FRAMES: usize = 16;

/// One pattern: `PATTERN_ROWS` rows for a single channel.
pub struct Pattern<'a> {
    bytes: &'a [u8],
}

impl<'a> Pattern<'a> {
    pub const SIZE_BYTES: usize = PATTERN_ROWS * MUSIC_ROW_BYTES;

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Pattern { bytes }
    }

    pub fn row(&self, index: usize) -> MusicRow {
        let base = index.min(PATTERN_ROWS - 1) * MUSIC_ROW_BYTES;
        MusicRow::decode(&self.bytes[base..base + MUSIC_ROW_BYTES])
    }
}

/// A track: for each of `TRACK_FRAMES` frames, a pattern index per
/// channel (0 = empty pattern), plus the track's own tempo/speed.
pub struct Track<'a> {
    bytes: &'a [u8],
}

impl<'a> Track<'a> {
    const FRAME_TABLE_BYTES: usize = TRACK_FRAMES * PATTERN_CHANNELS;
    pub const SIZE_BYTES: usize = Self::FRAME_TABLE_BYTES + 2 + 1 + 1;

    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Track { bytes }
    }

    pub fn pattern_index(&self, frame: usize, channel: usize) -> u8 {
        self.bytes[frame.min(TRACK_FRAMES - 1) * PATTERN_CHANNELS + channel]
    }

    pub fn tempo(&self) -> i16 {
        let b = Self::FRAME_TABLE_BYTES;
        i16::from_le_bytes([self.bytes[b], self.bytes[b + 1]])
    }

    pub fn rows(&self) -> u8 {
        self.bytes[Self::FRAME_TABLE_BYTES + 2]
    }

    pub fn speed(&self) -> i8 {
        self.bytes[Self::FRAME_TABLE_BYTES + 3] as i8
    }
}

/// Tracker transport state, mirroring the four states real tracker
/// hardware exposes: fully stopped, play-through-once, a single held
/// frame (for editors scrubbing), and normal looping playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    PlayingOnce,
    PlayFrame,
    Playing,
}

/// Drives row/frame advance for one playing track.
#[derive(Clone, Copy)]
pub struct MusicPlayer {
    pub state: PlayState,
    pub track_index: u8,
    pub frame: usize,
    pub row: usize,
    pub tempo: i32,
    pub speed: i32,
    row_progress: f64,
}

impl MusicPlayer {
    pub fn new() -> Self {
        MusicPlayer {
            state: PlayState::Stopped,
            track_index: 0,
            frame: 0,
            row: 0,
            tempo: 150,
            speed: 6,
            row_progress: 0.0,
        }
    }

    pub fn play(&mut self, track_index: u8, frame: usize, once: bool) {
        self.track_index = track_index;
        self.frame = frame.min(TRACK_FRAMES - 1);
        self.row = 0;
        self.row_progress = 0.0;
        self.state = if once { PlayState::PlayingOnce } else { PlayState::Playing };
    }

    pub fn play_single_frame(&mut self, frame: usize) {
        self.frame = frame.min(TRACK_FRAMES - 1);
        self.row = 0;
        self.row_progress = 0.0;
        self.state = PlayState::PlayFrame;
    }

    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
        self.row = 0;
        self.row_progress = 0.0;
    }

    /// Advance by one game tick at `fps`; returns `true` when a new row
    /// boundary was crossed this tick (callers should (re)trigger
    /// channels from the new row).
    ///
    /// Row rate per spec §4.3: `row = ticks * (tempo+150) * 6 /
    /// ((speed+6) * fps * notes_per_beat)`.
    pub fn advance(&mut self, fps: u32, notes_per_beat: u32) -> bool {
        if self.state == PlayState::Stopped {
            return false;
        }
        let denom = (self.speed + 6).max(1) as f64 * fps as f64 * notes_per_beat.max(1) as f64;
        let rows_per_tick = (self.tempo + 150) as f64 * 6.0 / denom;
        self.row_progress += rows_per_tick;

        if self.row_progress < 1.0 {
            return false;
        }
        self.row_progress -= 1.0;
        self.row += 1;

        if self.row >= PATTERN_ROWS {
            self.row = 0;
            match self.state {
                PlayState::PlayFrame => {
                    // Hold on the same frame indefinitely.
                }
                PlayState::PlayingOnce => {
                    if self.frame + 1 >= TRACK_FRAMES {
                        self.stop();
                    } else {
                        self.frame += 1;
                    }
                }
                PlayState::Playing => {
                    self.frame = (self.frame + 1) % TRACK_FRAMES;
                }
                PlayState::Stopped => {}
            }
        }
        true
    }
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_round_trips_through_bytes() {
        let row = MusicRow { note: 40, volume: 12, effect: 3, param: 7, sfx: 2 };
        let bytes = row.encode();
        assert_eq!(MusicRow::decode(&bytes), row);
    }

    #[test]
    fn default_tempo_speed_advances_rows_over_time() {
        let mut player = MusicPlayer::new();
        player.play(0, 0, false);
        let mut row_changes = 0;
        for _ in 0..120 {
            if player.advance(60, 4) {
                row_changes += 1;
            }
        }
        assert!(row_changes > 0);
    }

    #[test]
    fn play_once_stops_after_last_frame() {
        let mut player = MusicPlayer::new();
        player.play(0, (TRACK_FRAMES - 1) as u8, true);
        player.row = PATTERN_ROWS - 1;
        player.row_progress = 0.99;
        player.advance(60, 4);
        assert_eq!(player.state, PlayState::Stopped);
    }

    #[test]
    fn play_frame_holds_forever() {
        let mut player = MusicPlayer::new();
        player.play_single_frame(3);
        for _ in 0..1000 {
            player.advance(60, 4);
        }
        assert_eq!(player.state, PlayState::PlayFrame);
        assert_eq!(player.frame, 3);
    }
}
