use std::{
    io::{self, Write},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// In-memory sink. Clones share the same buffer, so one clone can be handed to
/// a logger while another reads what was written.
#[derive(Debug, Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Returns the contents and empties the buffer.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.buffer());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn clear(&self) {
        self.buffer().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::MemorySink;

    #[test]
    fn clones_share_the_buffer() -> anyhow::Result<()> {
        let reader = MemorySink::new();
        let mut writer = reader.clone();
        writer.write_all(b"one\ntwo\n")?;

        assert_eq!(reader.lines(), ["one", "two"]);
        assert_eq!(reader.take(), "one\ntwo\n");
        assert!(reader.is_empty());
        Ok(())
    }
}
