use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SubscriptionId(u64);

type Callback<E> = Rc<dyn Fn(&E)>;

/// List of observers of events of type `E`.
///
/// Observers are called synchronously in subscription order. Observer list is
/// copied before delivery, so an observer may subscribe or unsubscribe others
/// (or itself) while an event is being delivered.
pub struct Subscribers<E> {
    next_id: Cell<u64>,
    list: RefCell<Vec<(SubscriptionId, Callback<E>)>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(1),
            list: RefCell::default(),
        }
    }
}

impl<E> std::fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers").field("len", &self.len()).finish()
    }
}

impl<E> Subscribers<E> {
    pub fn subscribe(&self, f: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.list.borrow_mut().push((id, Rc::new(f)));
        id
    }

    /// Remove observer, return `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut list = self.list.borrow_mut();
        let len_before = list.len();
        list.retain(|(sid, _)| *sid != id);
        list.len() != len_before
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Callback<E>> =
            self.list.borrow().iter().map(|(_, f)| f.clone()).collect();
        snapshot.iter().for_each(|f| f(event));
    }

    pub fn len(&self) -> usize {
        self.list.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.borrow().is_empty()
    }
}
