use tokio::sync::watch;

/// A single observable value.
///
/// Readers either take the current value with [`Slot::get`] or hold a
/// [`watch::Receiver`] from [`Slot::subscribe`] and await changes. Writes
/// never fail, even when nobody is subscribed, and writing the value that is
/// already stored does not wake subscribers.
#[derive(Debug)]
pub struct Slot<T> {
    name: &'static str,
    tx: watch::Sender<T>,
}

impl<T> Slot<T>
where
    T: Clone + PartialEq,
{
    pub fn new(name: &'static str, initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { name, tx }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replace the stored value. Returns whether subscribers were notified.
    pub fn set(&self, value: T) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
        tracing::trace!(slot = self.name, changed, "slot write");
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    #[test]
    fn set_without_subscribers_still_stores() {
        let slot = Slot::new("name", String::new());
        assert_eq!(slot.subscriber_count(), 0);
        assert!(slot.set("a.xlsx".to_string()));
        assert_eq!(slot.get(), "a.xlsx");
        assert_eq!(slot.with(|s| s.len()), 6);
    }

    #[tokio::test]
    async fn subscribers_see_changes_but_not_repeats() {
        let slot = Slot::new("name", String::new());
        let mut rx = slot.subscribe();

        assert!(slot.set("x".to_string()));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "x");

        // Same value again: stored state unchanged, nobody woken.
        assert!(!slot.set("x".to_string()));
        assert!(!rx.has_changed().unwrap());
        let woke = timeout(Duration::from_millis(20), rx.changed()).await;
        assert!(woke.is_err(), "repeat write must not notify");
    }
}
