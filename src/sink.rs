//! Destinations for emitted signatures.
//!
//! The engine never stores or transmits signatures itself; every cycle's
//! snapshot is handed to a [`SignatureSink`] supplied by the host.

use crate::core::signature::BehavioralSignature;
use crate::error::EngineError;
use crossbeam_channel::Sender;
use std::io::Write;

/// Receives one signature per aggregation cycle.
pub trait SignatureSink: Send + 'static {
    fn deliver(&mut self, signature: BehavioralSignature) -> Result<(), EngineError>;
}

impl<F> SignatureSink for F
where
    F: FnMut(BehavioralSignature) + Send + 'static,
{
    fn deliver(&mut self, signature: BehavioralSignature) -> Result<(), EngineError> {
        self(signature);
        Ok(())
    }
}

/// Forwards signatures over a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<BehavioralSignature>,
}

impl ChannelSink {
    pub fn new(sender: Sender<BehavioralSignature>) -> Self {
        Self { sender }
    }
}

impl SignatureSink for ChannelSink {
    fn deliver(&mut self, signature: BehavioralSignature) -> Result<(), EngineError> {
        self.sender
            .send(signature)
            .map_err(|_| EngineError::SinkClosed)
    }
}

/// Writes each signature as one JSON line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send + 'static> SignatureSink for JsonLinesSink<W> {
    fn deliver(&mut self, signature: BehavioralSignature) -> Result<(), EngineError> {
        serde_json::to_writer(&mut self.writer, &signature)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
