use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Watcher<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct SignalInner<T> {
    value: RefCell<T>,
    watchers: RefCell<Vec<(u64, Watcher<T>)>>,
    next_watcher: Cell<u64>,
}

/// Observable value shared between a producer and its consumers.
///
/// Writes that do not change the value are dropped, so watchers only see
/// transitions. Watchers run after the value is stored and with no borrow held,
/// which lets them read the signal or write to other signals.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                watchers: RefCell::new(Vec::new()),
                next_watcher: Cell::new(1),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Stores `value` and notifies watchers. Returns `false` if nothing changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        let watchers: Vec<(u64, Watcher<T>)> = self
            .inner
            .watchers
            .borrow()
            .iter()
            .map(|(id, watcher)| (*id, Rc::clone(watcher)))
            .collect();
        for (id, watcher) in watchers {
            if !self.is_watching(id) {
                continue;
            }
            match watcher.try_borrow_mut() {
                Ok(mut watcher) => (&mut *watcher)(&value),
                Err(_) => log::warn!("signal watcher {id} re-entered; nested update skipped"),
            }
        }
        true
    }

    /// Registers `watcher` for future changes. The current value is not replayed.
    pub fn watch(&self, watcher: impl FnMut(&T) + 'static) -> WatchRegistration {
        let id = self.inner.next_watcher.get();
        self.inner.next_watcher.set(id + 1);
        let watcher: Watcher<T> = Rc::new(RefCell::new(watcher));
        self.inner.watchers.borrow_mut().push((id, watcher));
        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        WatchRegistration {
            remove: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.watchers.borrow_mut().retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.borrow().len()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn is_watching(&self, id: u64) -> bool {
        self.inner
            .watchers
            .borrow()
            .iter()
            .any(|(entry, _)| *entry == id)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal").field(&*self.inner.value.borrow()).finish()
    }
}

/// Keeps a [`Signal`] watcher registered; dropping it unregisters the watcher.
#[must_use = "dropping a WatchRegistration stops the watcher"]
pub struct WatchRegistration {
    remove: Option<Box<dyn FnOnce()>>,
}

impl WatchRegistration {
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for WatchRegistration {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchers_see_only_transitions() {
        let signal = Signal::new(false);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _registration = {
            let seen = Rc::clone(&seen);
            signal.watch(move |value| seen.borrow_mut().push(*value))
        };

        assert!(signal.set(true));
        assert!(!signal.set(true));
        assert!(signal.set(false));
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn dropped_registration_stops_notifications() {
        let signal = Signal::new(0);
        let count = Rc::new(Cell::new(0));
        let registration = {
            let count = Rc::clone(&count);
            signal.watch(move |_| count.set(count.get() + 1))
        };
        signal.set(1);
        drop(registration);
        signal.set(2);
        assert_eq!(count.get(), 1);
        assert_eq!(signal.watcher_count(), 0);
    }

    #[test]
    fn watcher_can_read_the_signal() {
        let signal = Signal::new(1);
        let observed = Rc::new(Cell::new(0));
        let _registration = {
            let signal_for_watcher = signal.clone();
            let observed = Rc::clone(&observed);
            signal.watch(move |_| observed.set(signal_for_watcher.get()))
        };
        signal.set(7);
        assert_eq!(observed.get(), 7);
    }
}
