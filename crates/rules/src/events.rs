//! Change notifications.
//!
//! Events carry ids, never references into the tracker, so subscribers can
//! hold them past the emitting call. Subscribers run synchronously inside
//! the mutating call and must not try to mutate the tracker themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a location section: `location_id/section_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    pub location: String,
    pub section: String,
}

impl SectionRef {
    pub fn new(location: &str, section: &str) -> Self {
        Self {
            location: location.to_string(),
            section: section.to_string(),
        }
    }

    /// Split a full id at the last `/`.
    pub fn parse(full_id: &str) -> Option<Self> {
        let (location, section) = full_id.rsplit_once('/')?;
        if location.is_empty() {
            return None;
        }
        Some(Self::new(location, section))
    }

    pub fn full_id(&self) -> String {
        format!("{}/{}", self.location, self.section)
    }
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location, self.section)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackerEvent {
    /// An item's state, stage or count changed.
    StateChanged { item_id: String },
    /// An item's icon override was set or cleared.
    DisplayChanged { item_id: String },
    /// Cleared count or highlight of a section changed.
    SectionChanged(SectionRef),
    /// A bulk update committed and all deferred events have fired.
    BulkUpdateDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Slot<E> = Box<dyn FnMut(&E)>;

/// Minimal observer list, typed by its event payload.
pub struct Signal<E> {
    slots: Vec<(SubscriptionId, Slot<E>)>,
    next_id: u64,
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, f: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, Box::new(f)));
        id
    }

    /// Returns `false` if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(sid, _)| *sid != id);
        self.slots.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, slot) in self.slots.iter_mut() {
            slot(event);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn section_ref_splits_at_last_slash() {
        let r = SectionRef::parse("Overworld/Cave/Chest").unwrap();
        assert_eq!(r.location, "Overworld/Cave");
        assert_eq!(r.section, "Chest");
        assert_eq!(r.full_id(), "Overworld/Cave/Chest");
        assert!(SectionRef::parse("nosection").is_none());
        assert!(SectionRef::parse("/x").is_none());
    }

    #[test]
    fn subscribers_receive_events_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal: Signal<u32> = Signal::new();

        let sink = Rc::clone(&seen);
        let id = signal.subscribe(move |e| sink.borrow_mut().push(*e));
        signal.emit(&1);
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        signal.emit(&2);

        assert_eq!(*seen.borrow(), vec![1]);
        assert!(signal.is_empty());
    }
}
