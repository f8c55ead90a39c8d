//! The unordered event stream the compiler emits. Events carry absolute tick times and a
//! globally increasing emission id; finalization sorts them by track name, then time, then
//! id, so that simultaneous events keep their source order.

use crate::core::Message;
use crate::file::QuartersPerMinute;

/// What a score event does when it reaches the finalizer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ScoreEventKind {
    /// A channel voice message, written with its elapsed delta time.
    Channel(Message),
    /// A tempo change, written as a set-tempo meta event.
    Tempo(QuartersPerMinute),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct ScoreEvent {
    /// Index of the owning track in the compiler's track store.
    pub(crate) track: usize,
    /// Emission order, unique across the whole compilation.
    pub(crate) id: u32,
    /// Absolute time in ticks.
    pub(crate) time: u32,
    pub(crate) kind: ScoreEventKind,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct EventList {
    events: Vec<ScoreEvent>,
}

impl EventList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, track: usize, time: u32, kind: ScoreEventKind) {
        let id = self.events.len() as u32;
        self.events.push(ScoreEvent {
            track,
            id,
            time,
            kind,
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    /// Order for writing: track name (ASCII-lexicographic), then time, then emission id.
    /// Names are resolved through the track index; `names` must parallel the track store.
    pub(crate) fn into_sorted(self, names: &[&str]) -> Vec<ScoreEvent> {
        let mut events = self.events;
        events.sort_by(|a, b| {
            names[a.track]
                .cmp(names[b.track])
                .then(a.time.cmp(&b.time))
                .then(a.id.cmp(&b.id))
        });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_groups_by_name_then_time_then_id() {
        let names = ["INST", "DRUM"];
        let mut list = EventList::new();
        list.push(0, 50, ScoreEventKind::Channel(Message::note_on(0, 60, 127))); // id 0
        list.push(1, 10, ScoreEventKind::Channel(Message::note_on(9, 31, 127))); // id 1
        list.push(0, 0, ScoreEventKind::Channel(Message::note_on(0, 62, 127))); // id 2
        list.push(0, 0, ScoreEventKind::Channel(Message::note_on(0, 64, 127))); // id 3
        let sorted = list.into_sorted(&names);
        // DRUM sorts before INST; same-time events keep emission order
        let order: Vec<(usize, u32, u32)> =
            sorted.iter().map(|e| (e.track, e.time, e.id)).collect();
        assert_eq!(vec![(1, 10, 1), (0, 0, 2), (0, 0, 3), (0, 50, 0)], order);
    }
}
