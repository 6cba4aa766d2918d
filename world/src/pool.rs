//! Reusable storage for short-lived simulation objects.

/// Allocator that recycles objects instead of dropping them.
///
/// Every object is either active (visible through [`ObjectPool::active`]) or
/// free (reset and waiting to be handed out again). The sum of both counts
/// only grows when [`ObjectPool::acquire`] finds the free list empty.
#[derive(Debug)]
pub struct ObjectPool<T> {
    active: Vec<T>,
    free: Vec<T>,
    create: fn() -> T,
    reset: fn(&mut T),
}

impl<T> ObjectPool<T> {
    /// Creates an empty pool using the provided constructor and reset hook.
    #[must_use]
    pub fn new(create: fn() -> T, reset: fn(&mut T)) -> Self {
        Self {
            active: Vec::new(),
            free: Vec::new(),
            create,
            reset,
        }
    }

    /// Hands out a free object, constructing one when none is available.
    ///
    /// The returned object is appended to the end of the active list.
    pub fn acquire(&mut self) -> &mut T {
        let object = self.free.pop().unwrap_or_else(self.create);
        let index = self.active.len();
        self.active.push(object);
        &mut self.active[index]
    }

    /// Returns the active object at `index` to the free list.
    ///
    /// Reports `false` when the index does not name an active object.
    pub fn release(&mut self, index: usize) -> bool {
        if index >= self.active.len() {
            return false;
        }
        let mut object = self.active.remove(index);
        (self.reset)(&mut object);
        self.free.push(object);
        true
    }

    /// Visits every active object in order and releases those for which the
    /// predicate returns `true`.
    ///
    /// Surviving objects keep their relative order. Returns the number of
    /// released objects.
    pub fn release_if<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut kept = 0;
        for index in 0..self.active.len() {
            if !predicate(&mut self.active[index]) {
                self.active.swap(kept, index);
                kept += 1;
            }
        }
        self.reclaim_from(kept)
    }

    /// Releases every active object.
    pub fn release_all(&mut self) -> usize {
        self.reclaim_from(0)
    }

    fn reclaim_from(&mut self, start: usize) -> usize {
        let reset = self.reset;
        let released = self.active.len().saturating_sub(start);
        for mut object in self.active.drain(start..) {
            reset(&mut object);
            self.free.push(object);
        }
        released
    }

    /// Active objects in acquisition order.
    #[must_use]
    pub fn active(&self) -> &[T] {
        &self.active
    }

    /// Number of objects currently handed out.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of reset objects waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}
