//! Where emitted operations go.
//!
//! The reconciler only knows [`OperationSink`]. [`ImmediateSink`] forwards
//! each operation to a [`Presentation`] as soon as it is emitted, while
//! [`BufferingSink`] holds a batch so it can be applied later in one go,
//! right after the consumer swaps in its new collection.

use crate::types::Operation;
use log::trace;

/// Receives operations in emission order.
pub trait OperationSink {
    fn emit(&mut self, op: Operation);
}

impl OperationSink for Vec<Operation> {
    fn emit(&mut self, op: Operation) {
        self.push(op);
    }
}

impl<T: OperationSink + ?Sized> OperationSink for &mut T {
    fn emit(&mut self, op: Operation) {
        (**self).emit(op);
    }
}

/// The live, presented list that structural changes are applied to.
///
/// Each callback must be fully applied before the next one arrives;
/// positions of later calls assume earlier ones already happened.
pub trait Presentation {
    fn on_remove(&mut self, position_start: usize, count: usize);
    fn on_insert(&mut self, position_start: usize, count: usize);
    fn on_change(&mut self, position_start: usize, count: usize);
    fn on_move(&mut self, from: usize, to: usize);

    /// Everything may have changed; redraw from scratch.
    fn on_reset(&mut self) {}

    fn apply(&mut self, op: Operation) {
        match op {
            Operation::Remove { position_start, count } => self.on_remove(position_start, count),
            Operation::Insert { position_start, count } => self.on_insert(position_start, count),
            Operation::Change { position_start, count } => self.on_change(position_start, count),
            Operation::Move { from, to } => self.on_move(from, to),
        }
    }
}

impl<P: Presentation + ?Sized> Presentation for &mut P {
    fn on_remove(&mut self, position_start: usize, count: usize) {
        (**self).on_remove(position_start, count);
    }
    fn on_insert(&mut self, position_start: usize, count: usize) {
        (**self).on_insert(position_start, count);
    }
    fn on_change(&mut self, position_start: usize, count: usize) {
        (**self).on_change(position_start, count);
    }
    fn on_move(&mut self, from: usize, to: usize) {
        (**self).on_move(from, to);
    }
    fn on_reset(&mut self) {
        (**self).on_reset();
    }
}

/// Forwards every operation straight to the presentation.
pub struct ImmediateSink<'a, P: Presentation + ?Sized> {
    presentation: &'a mut P,
}

impl<'a, P: Presentation + ?Sized> ImmediateSink<'a, P> {
    pub fn new(presentation: &'a mut P) -> Self {
        ImmediateSink { presentation }
    }
}

impl<P: Presentation + ?Sized> OperationSink for ImmediateSink<'_, P> {
    fn emit(&mut self, op: Operation) {
        trace!("ImmediateSink: {}", op);
        self.presentation.apply(op);
    }
}

/// Collects operations for deferred, in-order replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferingSink {
    ops: Vec<Operation>,
}

impl BufferingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Replays the buffered batch against `presentation`, then empties it.
    pub fn flush<P: Presentation + ?Sized>(&mut self, presentation: &mut P) {
        trace!("BufferingSink: flushing {} operation(s)", self.ops.len());
        for op in self.ops.drain(..) {
            presentation.apply(op);
        }
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.ops
    }
}

impl OperationSink for BufferingSink {
    fn emit(&mut self, op: Operation) {
        self.ops.push(op);
    }
}
