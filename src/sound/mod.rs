//! Sound engine facade
//!
//! Ties the per-channel oscillators ([`channel`]), the sfx lane cursors
//! ([`sfx`]), and the tracker ([`music`]) together into one `tick_end`
//! pass: advance the tracker by one tick, let any active sfx (explicit
//! or music-driven) compute this tick's register target, load the
//! registers, then synthesize `samples_per_tick` of PCM per channel and
//! mix down to stereo. A channel under an explicit `sfx()` call ignores
//! the tracker until that call's duration elapses (spec §4.3, "sfx vs
//! music priority").

mod blip;
mod channel;
mod music;
pub mod note;
mod sfx;

pub use blip::BlipBuffer;
pub use channel::ChannelState;
pub use music::{MusicPlayer, MusicRow, PlayState, Pattern, Track};
pub use sfx::{ChannelTarget, SfxChannel, SfxEntry, SfxEntryMut};

use crate::mem::{Ram, MUSIC_PATTERN_ROWS, SOUND_CHANNELS, WAVEFORM_ENTRIES};

const NOTES_PER_BEAT: u32 = 4;

/// The full sound engine: oscillator state, sfx cursors, and the
/// tracker, independent of `Ram` (which only stores the registers and
/// cartridge-authored tables).
pub struct Sound {
    oscillators: [ChannelState; SOUND_CHANNELS],
    explicit_sfx: [SfxChannel; SOUND_CHANNELS],
    music_sfx: [SfxChannel; SOUND_CHANNELS],
    pub music: MusicPlayer,
    blips_left: Vec<BlipBuffer>,
    blips_right: Vec<BlipBuffer>,
    sample_rate: u32,
    samples_per_tick: usize,
    fps: u32,
}

impl Sound {
    pub fn new(sample_rate: u32, fps: u32) -> Self {
        let samples_per_tick = (sample_rate / fps.max(1)) as usize;
        Sound {
            oscillators: [ChannelState::new(); SOUND_CHANNELS],
            explicit_sfx: new_sfx_channels(),
            music_sfx: new_sfx_channels(),
            music: MusicPlayer::new(),
            blips_left: (0..SOUND_CHANNELS).map(|_| BlipBuffer::new(samples_per_tick)).collect(),
            blips_right: (0..SOUND_CHANNELS).map(|_| BlipBuffer::new(samples_per_tick)).collect(),
            sample_rate,
            samples_per_tick,
            fps,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.samples_per_tick = (sample_rate / self.fps.max(1)) as usize;
        for blip in self.blips_left.iter_mut().chain(self.blips_right.iter_mut()) {
            blip.resize(self.samples_per_tick);
        }
    }

    /// `sfx(index, note, duration, channel, volume, speed)`: starts an
    /// explicit effect on `channel`, pre-empting the tracker there.
    #[allow(clippy::too_many_arguments)]
    pub fn sfx(&mut self, channel: usize, index: u8, note: u8, duration: i32, volume: u8, speed: i8) {
        if channel >= SOUND_CHANNELS {
            return;
        }
        self.explicit_sfx[channel].start(index, note, duration, volume, speed);
    }

    pub fn sfx_stop(&mut self, channel: usize) {
        if channel < SOUND_CHANNELS {
            self.explicit_sfx[channel].stop();
        }
    }

    pub fn music_play(&mut self, track: u8, frame: usize, once: bool) {
        self.music.play(track, frame, once);
    }

    pub fn music_stop(&mut self) {
        self.music.stop();
        for ch in self.music_sfx.iter_mut() {
            ch.stop();
        }
    }

    pub fn music_playing(&self) -> bool {
        self.music.state != PlayState::Stopped
    }

    /// Advance the tracker and every active channel by one tick, load
    /// the resulting registers into `ram`, and synthesize this tick's
    /// audio. Returns interleaved stereo `i16` PCM.
    pub fn tick_end(&mut self, ram: &mut Ram) -> Vec<i16> {
        let row_advanced = self.music.advance(self.fps, NOTES_PER_BEAT);
        if row_advanced && self.music.state != PlayState::Stopped {
            self.trigger_music_row(ram);
        }

        for ch in 0..SOUND_CHANNELS {
            let target = if self.explicit_sfx[ch].active {
                let entry_bytes = ram.sfx_entry_bytes(self.explicit_sfx[ch].sfx_index() as usize).to_vec();
                let entry = SfxEntry::from_bytes(&entry_bytes);
                self.explicit_sfx[ch].tick(&entry)
            } else if self.music_sfx[ch].active {
                let entry_bytes = ram.sfx_entry_bytes(self.music_sfx[ch].sfx_index() as usize).to_vec();
                let entry = SfxEntry::from_bytes(&entry_bytes);
                self.music_sfx[ch].tick(&entry)
            } else {
                None
            };

            match target {
                Some(ChannelTarget { freq, volume, waveform_id }) => {
                    ram.set_sound_reg(ch, freq, volume);
                    let waveform = ram.waveform_table(waveform_id as usize);
                    ram.set_channel_waveform(ch, &waveform);
                }
                None => ram.set_sound_reg(ch, ram.sound_reg(ch).0, 0),
            }
        }

        for ch in 0..SOUND_CHANNELS {
            let (freq, volume) = ram.sound_reg(ch);
            let waveform = expand_waveform(&ram.channel_waveform(ch));
            self.oscillators[ch].synthesize(
                freq,
                volume,
                &waveform,
                self.sample_rate,
                self.samples_per_tick,
                &mut self.blips_left[ch],
                &mut self.blips_right[ch],
                (1.0, 1.0),
            );
        }

        self.mix()
    }

    fn trigger_music_row(&mut self, ram: &mut Ram) {
        let track_bytes = ram.track_bytes(self.music.track_index as usize).to_vec();
        let track = Track::from_bytes(&track_bytes);
        let speed = track.speed();
        self.music.speed = speed as i32;
        self.music.tempo = track.tempo() as i32;

        for ch in 0..SOUND_CHANNELS {
            let pattern_idx = track.pattern_index(self.music.frame, ch);
            if pattern_idx == 0 {
                continue;
            }
            let row_bytes = ram
                .pattern_row_bytes((pattern_idx - 1) as usize, self.music.row % MUSIC_PATTERN_ROWS, ch)
                .to_vec();
            let row = MusicRow::decode(&row_bytes);
            if row.is_empty() {
                continue;
            }
            self.music_sfx[ch].start(row.sfx, row.note, -1, row.volume.min(15), speed);
        }
    }

    fn mix(&mut self) -> Vec<i16> {
        let mut left = vec![0i32; self.samples_per_tick];
        let mut right = vec![0i32; self.samples_per_tick];
        for ch in 0..SOUND_CHANNELS {
            for (i, s) in self.blips_left[ch].read_samples(self.samples_per_tick).into_iter().enumerate() {
                left[i] += s as i32;
            }
            for (i, s) in self.blips_right[ch].read_samples(self.samples_per_tick).into_iter().enumerate() {
                right[i] += s as i32;
            }
        }
        let mut out = Vec::with_capacity(self.samples_per_tick * 2);
        for i in 0..self.samples_per_tick {
            out.push(left[i].clamp(i16::MIN as i32, i16::MAX as i32) as i16);
            out.push(right[i].clamp(i16::MIN as i32, i16::MAX as i32) as i16);
        }
        out
    }
}

fn expand_waveform(packed: &[u8; WAVEFORM_ENTRIES / 2]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(packed);
    out
}

fn new_sfx_channels() -> [SfxChannel; SOUND_CHANNELS] {
    [SfxChannel::new(), SfxChannel::new(), SfxChannel::new(), SfxChannel::new()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_end_produces_stereo_samples_sized_to_sample_rate() {
        let mut ram = Ram::new();
        let mut sound = Sound::new(44100, 60);
        sound.sfx(0, 0, 4 * 12, -1, 15, 0);
        let mut bytes = vec![0u8; crate::mem::SFX_ENTRY_BYTES];
        {
            let mut entry = SfxEntryMut::from_bytes(&mut bytes);
            for t in 0..crate::mem::SFX_TICKS {
                entry.set_lane_value(sfx::LANE_WAVE, t, 1);
                entry.set_lane_value(sfx::LANE_VOLUME, t, 15);
            }
        }
        ram.sfx_entry_bytes_mut(0).copy_from_slice(&bytes);
        ram.set_waveform_table(1, &[0xFF; WAVEFORM_ENTRIES / 2]);

        let samples = sound.tick_end(&mut ram);
        assert_eq!(samples.len(), sound.samples_per_tick * 2);
    }

    #[test]
    fn explicit_sfx_takes_priority_over_music() {
        let mut sound = Sound::new(44100, 60);
        sound.music_sfx[0].start(5, 40, -1, 10, 0);
        sound.sfx(0, 9, 40, -1, 10, 0);
        assert!(sound.explicit_sfx[0].active);
        assert_eq!(sound.explicit_sfx[0].sfx_index(), 9);
    }
}
