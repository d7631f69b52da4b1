//! Play queue with a cursor.

use rand::Rng;

use crate::mode::{next_index, previous_index, PlaybackMode};
use crate::song::Song;

/// Where the cursor sits relative to the songs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// On the loaded song.
    At(usize),
    /// In front of `songs[i]`, which has not started yet. `i` may equal the
    /// queue length when the loaded song was removed from the end.
    Before(usize),
}

/// Ordered songs plus the current position.
///
/// After [`replace`](Queue::replace), or after the loaded song is removed,
/// the cursor sits between songs so "next" lands on the song in that slot
/// instead of skipping it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    songs: Vec<Song>,
    position: Option<Position>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Index of the selected slot, `None` when nothing is selected or the
    /// cursor sits past the last song.
    pub fn cursor(&self) -> Option<usize> {
        match self.position? {
            Position::At(i) => Some(i),
            Position::Before(i) => (i < self.songs.len()).then_some(i),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn current(&self) -> Option<&Song> {
        self.cursor().and_then(|i| self.songs.get(i))
    }

    pub fn position_of(&self, song_id: &str) -> Option<usize> {
        self.songs.iter().position(|s| s.id == song_id)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.songs.len().checked_sub(1)
    }

    /// Replace the whole queue. An out-of-range `start` selects nothing.
    ///
    /// The start song is queued up, not loaded: "next" plays it.
    pub fn replace(&mut self, songs: Vec<Song>, start: Option<usize>) {
        self.position = start.filter(|&i| i < songs.len()).map(Position::Before);
        self.songs = songs;
    }

    /// Put the cursor on a loaded song. Returns `false` and leaves it
    /// untouched when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.songs.len() {
            self.position = Some(Position::At(index));
            true
        } else {
            false
        }
    }

    /// Insert right after the cursor (or at the end when nothing is selected).
    /// Returns the new song's index.
    pub fn insert_after_current(&mut self, song: Song) -> usize {
        let index = self.cursor().map_or(self.songs.len(), |c| c + 1);
        self.songs.insert(index, song);
        if let Some(Position::Before(i)) = self.position {
            if i >= index {
                self.position = Some(Position::Before(i + 1));
            }
        }
        index
    }

    /// Remove a song by id, keeping the cursor on the same song when possible.
    ///
    /// Removing the loaded song leaves the cursor in front of the song that
    /// took its place.
    pub fn remove(&mut self, song_id: &str) -> Option<Song> {
        let index = self.position_of(song_id)?;
        let removed = self.songs.remove(index);

        self.position = match self.position {
            _ if self.songs.is_empty() => None,
            Some(Position::At(c)) if c > index => Some(Position::At(c - 1)),
            Some(Position::At(c)) if c == index => Some(Position::Before(index)),
            Some(Position::Before(i)) if i > index => Some(Position::Before(i - 1)),
            other => other,
        };
        Some(removed)
    }

    /// Index "next" resolves to under `mode`. `None` means stay put.
    pub fn next_index<R: Rng + ?Sized>(&self, mode: PlaybackMode, rng: &mut R) -> Option<usize> {
        let len = self.songs.len();
        match self.position {
            Some(Position::Before(i)) if i < len => Some(i),
            Some(Position::Before(_)) => match mode {
                PlaybackMode::Normal => None,
                _ => (len > 0).then_some(0),
            },
            Some(Position::At(i)) => next_index(mode, Some(i), len, rng),
            None => next_index(mode, None, len, rng),
        }
    }

    /// Index "previous" resolves to under `mode`. `None` means stay put.
    pub fn previous_index<R: Rng + ?Sized>(
        &self,
        mode: PlaybackMode,
        rng: &mut R,
    ) -> Option<usize> {
        let len = self.songs.len();
        match self.position {
            Some(Position::Before(i)) => match i.checked_sub(1) {
                Some(prev) => Some(prev),
                None if mode == PlaybackMode::Normal => None,
                None => self.last_index(),
            },
            Some(Position::At(i)) => previous_index(mode, Some(i), len, rng),
            None => previous_index(mode, None, len, rng),
        }
    }

    pub fn clear(&mut self) {
        self.songs.clear();
        self.position = None;
    }
}
