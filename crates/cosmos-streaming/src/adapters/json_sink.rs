use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::warn;

use crate::domain::CosmosSnapshot;
use crate::ports::outbound::SnifferClient;

/// Sink client writing each snapshot as one JSON line.
///
/// Used by the replay tool (stdout) and by tests (`Vec<u8>`).
pub struct JsonLinesClient<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesClient<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, snapshot: &CosmosSnapshot) -> io::Result<()> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, snapshot)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl JsonLinesClient<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> SnifferClient for JsonLinesClient<W> {
    fn observe_cosmos_data(&self, snapshot: &CosmosSnapshot) {
        if let Err(e) = self.write_line(snapshot) {
            warn!(height = snapshot.block().height, error = %e, "Failed to write snapshot");
        }
    }
}
