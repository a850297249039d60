//! Change notification for engine state.
//!
//! Owners keep the last value they announced and only fire when the new value
//! differs, so repeated identical input never produces a second notification.

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<T> = Box<dyn FnMut(&T)>;

/// Registry of change callbacks with value-level deduplication.
pub struct Listeners<T> {
    next_id: u64,
    callbacks: Vec<(ListenerId, Callback<T>)>,
    last: Option<T>,
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
            last: None,
        }
    }
}

impl<T> std::fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

impl<T: PartialEq + Clone> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Returns false when the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(cid, _)| *cid != id);
        self.callbacks.len() != before
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Fire `value` if it differs from the last announced one. Returns whether it fired.
    pub fn emit_if_changed(&mut self, value: &T) -> bool {
        if self.last.as_ref() == Some(value) {
            return false;
        }
        self.last = Some(value.clone());
        for (_, callback) in &mut self.callbacks {
            callback(value);
        }
        true
    }

    /// Record `value` as announced without firing (used to seed initial state).
    pub fn prime(&mut self, value: &T) {
        self.last = Some(value.clone());
    }
}
