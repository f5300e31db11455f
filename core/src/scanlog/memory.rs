use crate::scanlog::{LogStore, ScanEvent};
use crate::Result;

/// In-memory store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    events: Vec<ScanEvent>,
    flushes: usize,
}

impl MemoryLogStore {
    pub fn events(&self) -> &[ScanEvent] {
        &self.events
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl LogStore for MemoryLogStore {
    fn append(&mut self, event: &ScanEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
