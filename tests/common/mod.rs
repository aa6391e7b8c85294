use std::io::Write;
use std::sync::{Arc, Mutex};

use ecs_context_logger::{EcsLogger, EventFormatter};

/// A writer that keeps everything logged so tests can read it back.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(ToOwned::to_owned)
            .collect()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Installs the global logger once, rendering through `formatter` into the
/// returned buffer. The global logger can only be set once per process, so
/// tests sharing a binary share the buffer.
pub fn init_captured_logger<F>(formatter: F) -> CapturedOutput
where
    F: EventFormatter + Send + Sync + 'static,
{
    let output = CapturedOutput::default();
    EcsLogger::new(formatter)
        .with_writer(output.clone())
        .with_level(log::LevelFilter::Trace)
        .init();
    output
}
