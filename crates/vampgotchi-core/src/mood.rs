// ── Mood engine ──
//
// Pure functions only. The coordinator calls `derive_mood` on every mode
// transition and `idle_decay` from its heartbeat; renderers just display
// whatever mood is in the snapshot.

use crate::model::{Mode, Mood};

/// Mood for a freshly entered `mode`.
///
/// | mode        | devices found | had error | mood      |
/// |-------------|---------------|-----------|-----------|
/// | `Scanning`  | any           | any       | `Excited` |
/// | `Attacking` | any           | any       | `Angry`   |
/// | `Idle`/`Error` | any        | `true`    | `Sad`     |
/// | `Idle`      | `> 0`         | `false`   | `Happy`   |
/// | `Idle`      | `0`           | `false`   | `Bored`   |
///
/// `Error` without an error keeps `previous`.
pub fn derive_mood(previous: Mood, mode: Mode, devices_found_last_scan: usize, had_error: bool) -> Mood {
    match mode {
        Mode::Scanning => Mood::Excited,
        Mode::Attacking => Mood::Angry,
        Mode::Idle | Mode::Error if had_error => Mood::Sad,
        Mode::Idle if devices_found_last_scan > 0 => Mood::Happy,
        Mode::Idle => Mood::Bored,
        Mode::Error => previous,
    }
}

/// Mood after `idle_ticks` heartbeats without a completed operation.
///
/// Upbeat moods fade to `Bored` once `idle_ticks >= threshold`; `Sad` and
/// `Angry` persist until the next operation. A zero threshold disables decay.
pub fn idle_decay(mood: Mood, idle_ticks: u32, threshold: u32) -> Mood {
    match mood {
        Mood::Happy | Mood::Excited if threshold > 0 && idle_ticks >= threshold => Mood::Bored,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MOODS: [Mood; 5] = [Mood::Bored, Mood::Happy, Mood::Excited, Mood::Sad, Mood::Angry];

    #[test]
    fn scanning_is_always_excited() {
        for prev in ALL_MOODS {
            for had_error in [false, true] {
                assert_eq!(derive_mood(prev, Mode::Scanning, 0, had_error), Mood::Excited);
                assert_eq!(derive_mood(prev, Mode::Scanning, 9, had_error), Mood::Excited);
            }
        }
    }

    #[test]
    fn attacking_is_always_angry() {
        for prev in ALL_MOODS {
            assert_eq!(derive_mood(prev, Mode::Attacking, 3, true), Mood::Angry);
        }
    }

    #[test]
    fn idle_depends_on_devices_found() {
        assert_eq!(derive_mood(Mood::Excited, Mode::Idle, 0, false), Mood::Bored);
        assert_eq!(derive_mood(Mood::Excited, Mode::Idle, 2, false), Mood::Happy);
    }

    #[test]
    fn errors_are_sad() {
        assert_eq!(derive_mood(Mood::Excited, Mode::Error, 4, true), Mood::Sad);
        assert_eq!(derive_mood(Mood::Happy, Mode::Idle, 4, true), Mood::Sad);
    }

    #[test]
    fn error_without_error_keeps_previous() {
        assert_eq!(derive_mood(Mood::Angry, Mode::Error, 0, false), Mood::Angry);
    }

    #[test]
    fn idle_decay_thresholds() {
        assert_eq!(idle_decay(Mood::Happy, 9, 10), Mood::Happy);
        assert_eq!(idle_decay(Mood::Happy, 10, 10), Mood::Bored);
        assert_eq!(idle_decay(Mood::Excited, 11, 10), Mood::Bored);
        assert_eq!(idle_decay(Mood::Sad, 100, 10), Mood::Sad);
        assert_eq!(idle_decay(Mood::Angry, 100, 10), Mood::Angry);
        assert_eq!(idle_decay(Mood::Happy, 100, 0), Mood::Happy);
    }
}
