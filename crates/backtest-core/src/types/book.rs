//! Identity-keyed order stores.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::OrderError;
use crate::types::order::{Order, OrderId};

/// Shared handle to a live order.
///
/// A book or queue owns its orders exclusively; audit stores hold additional
/// handles that keep observing fills after the order leaves the live book.
/// The engine is single-threaded, hence `Rc` over `Arc`.
pub type SharedOrder = Rc<RefCell<Order>>;

/// Wrap an order for shared bookkeeping.
pub fn share(order: Order) -> SharedOrder {
    Rc::new(RefCell::new(order))
}

/// Unordered identity-keyed store of live orders.
#[derive(Debug, Default)]
pub struct OrderBook {
    book: HashMap<OrderId, SharedOrder>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap and insert a freshly constructed order, returning its id.
    pub fn place(&mut self, order: Order) -> OrderId {
        self.insert(share(order))
    }

    /// Insert a shared order handle, returning its id.
    pub fn insert(&mut self, order: SharedOrder) -> OrderId {
        let id = order.borrow().id().clone();
        self.book.insert(id.clone(), order);
        id
    }

    /// Remove an order, handing its live handle back to the caller.
    pub fn remove(&mut self, id: &OrderId) -> Result<SharedOrder, OrderError> {
        self.book
            .remove(id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))
    }

    /// Look up an order by id.
    pub fn get(&self, id: &OrderId) -> Result<SharedOrder, OrderError> {
        self.book
            .get(id)
            .cloned()
            .ok_or_else(|| OrderError::NotFound(id.clone()))
    }

    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }

    pub fn len(&self) -> usize {
        self.book.len()
    }

    /// Ids of all contained orders, in no particular order.
    pub fn ids(&self) -> HashSet<OrderId> {
        self.book.keys().cloned().collect()
    }

    /// Iterate over contained orders, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedOrder> {
        self.book.values()
    }
}

/// Insertion-ordered order store with FIFO pop semantics: first submitted,
/// first processed.
#[derive(Debug, Default)]
pub struct OrderQueue {
    book: IndexMap<OrderId, SharedOrder>,
}

impl OrderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap and insert a freshly constructed order, returning its id.
    pub fn place(&mut self, order: Order) -> OrderId {
        self.insert(share(order))
    }

    /// Insert a shared order handle at the back of the queue.
    pub fn insert(&mut self, order: SharedOrder) -> OrderId {
        let id = order.borrow().id().clone();
        self.book.insert(id.clone(), order);
        id
    }

    /// Remove an order by id, preserving the order of the rest.
    pub fn remove(&mut self, id: &OrderId) -> Result<SharedOrder, OrderError> {
        self.book
            .shift_remove(id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))
    }

    /// Look up an order by id.
    pub fn get(&self, id: &OrderId) -> Result<SharedOrder, OrderError> {
        self.book
            .get(id)
            .cloned()
            .ok_or_else(|| OrderError::NotFound(id.clone()))
    }

    /// Remove and return the earliest inserted order.
    pub fn pop_oldest(&mut self) -> Result<SharedOrder, OrderError> {
        self.book
            .shift_remove_index(0)
            .map(|(_, order)| order)
            .ok_or(OrderError::EmptyQueue)
    }

    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }

    pub fn len(&self) -> usize {
        self.book.len()
    }

    /// Ids of all contained orders.
    pub fn ids(&self) -> HashSet<OrderId> {
        self.book.keys().cloned().collect()
    }

    /// Iterate over contained orders in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SharedOrder> {
        self.book.values()
    }
}
