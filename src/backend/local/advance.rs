use rand::{Rng, RngExt};

use super::RepeatMode;

/// Index of the track after `current`, wrapping at the end of the list.
/// Shuffle draws uniformly over the whole list and may land on `current`.
pub fn next_index<R: Rng>(
    current: Option<usize>,
    len: usize,
    shuffle: bool,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if shuffle {
        return Some(rng.random_range(0..len));
    }
    Some(match current {
        Some(i) => (i + 1) % len,
        None => 0,
    })
}

/// Index of the track before `current`, wrapping at the start of the list.
pub fn prev_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) => (i + len - 1) % len,
        None => 0,
    })
}

/// Where playback goes when a track runs out on its own. Repeat-one replays
/// the same index; everything else behaves like an ordinary next, including
/// the wrap from the last track back to the first.
pub fn on_end_index<R: Rng>(
    current: usize,
    len: usize,
    repeat: RepeatMode,
    shuffle: bool,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match repeat {
        RepeatMode::One => Some(current.min(len - 1)),
        RepeatMode::Off | RepeatMode::All => next_index(Some(current), len, shuffle, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn next_and_prev_round_trip() {
        let mut r = rng();
        for start in 0..5usize {
            let next = next_index(Some(start), 5, false, &mut r).unwrap();
            assert_eq!(prev_index(Some(next), 5), Some(start));
        }
    }

    #[test]
    fn next_wraps_from_the_last_track() {
        let mut r = rng();
        assert_eq!(next_index(Some(2), 3, false, &mut r), Some(0));
        assert_eq!(prev_index(Some(0), 3), Some(2));
    }

    #[test]
    fn empty_list_has_no_advance_target() {
        let mut r = rng();
        assert_eq!(next_index(None, 0, false, &mut r), None);
        assert_eq!(prev_index(Some(3), 0), None);
        assert_eq!(on_end_index(0, 0, RepeatMode::All, false, &mut r), None);
    }

    #[test]
    fn end_of_track_wraps_even_with_repeat_off() {
        let mut r = rng();
        assert_eq!(on_end_index(2, 3, RepeatMode::Off, false, &mut r), Some(0));
        assert_eq!(on_end_index(0, 3, RepeatMode::All, false, &mut r), Some(1));
    }

    #[test]
    fn repeat_one_replays_the_same_index() {
        let mut r = rng();
        assert_eq!(on_end_index(1, 3, RepeatMode::One, true, &mut r), Some(1));
    }

    #[test]
    fn shuffle_stays_in_bounds_and_may_repeat_current() {
        let mut r = rng();
        let mut hit_current = false;
        for _ in 0..200 {
            let i = next_index(Some(2), 4, true, &mut r).unwrap();
            assert!(i < 4);
            hit_current |= i == 2;
        }
        assert!(hit_current, "uniform shuffle should sometimes redraw the current index");
    }
}
