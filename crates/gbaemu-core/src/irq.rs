//! Interrupt signal plumbing between peripherals and the interrupt controller.

use tracing::trace;

/// Receiver of interrupt line changes (the interrupt controller)
pub trait IrqSink {
    fn set_irq(&mut self, line: usize, level: bool);
}

/// An interrupt output owned by a single peripheral.
///
/// Only edges are forwarded: driving a line to the level it already has does
/// not reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqLine {
    index: usize,
    level: bool,
}

impl IrqLine {
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            level: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn level(&self) -> bool {
        self.level
    }

    pub fn set(&mut self, sink: &mut dyn IrqSink, level: bool) {
        if self.level == level {
            return;
        }
        self.level = level;
        trace!("IRQ line {} -> {}", self.index, level);
        sink.set_irq(self.index, level);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Sink that records every propagated change
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSink {
        pub events: Vec<(usize, bool)>,
    }

    impl IrqSink for RecordingSink {
        fn set_irq(&mut self, line: usize, level: bool) {
            self.events.push((line, level));
        }
    }

    #[test]
    fn only_edges_propagate() {
        let mut sink = RecordingSink::default();
        let mut line = IrqLine::new(5);

        line.set(&mut sink, false);
        line.set(&mut sink, true);
        line.set(&mut sink, true);
        line.set(&mut sink, false);

        assert_eq!(sink.events, vec![(5, true), (5, false)]);
        assert!(!line.level());
    }
}
