//! Incremental parser for newline-delimited JSON streams.
//!
//! Chunks arrive with arbitrary boundaries; [`NdjsonAccumulator::push`]
//! buffers the incomplete tail and returns every line completed by the new
//! chunk, parsed into `T`. Blank lines are skipped. Each line succeeds or
//! fails on its own.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct NdjsonAccumulator<T> {
    buffer: Vec<u8>,
    lines_parsed: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for NdjsonAccumulator<T> {
    fn default() -> Self {
        Self {
            buffer: Vec::new(),
            lines_parsed: 0,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> NdjsonAccumulator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the lines completed by it, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<T>> {
        self.buffer.extend_from_slice(chunk);
        let mut items = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(item) = self.parse_line(&line[..line.len() - 1]).transpose() {
                items.push(item);
            }
        }
        items
    }

    /// Parse whatever remains after the stream ends (a final line without `\n`).
    pub fn finish(mut self) -> Result<Option<T>> {
        let rest = std::mem::take(&mut self.buffer);
        self.parse_line(&rest)
    }

    /// Bytes buffered waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn lines_parsed(&self) -> usize {
        self.lines_parsed
    }

    fn parse_line(&mut self, line: &[u8]) -> Result<Option<T>> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }
        self.lines_parsed += 1;
        let item = serde_json::from_slice(line).map_err(|e| {
            Error::Serialization(format!(
                "NDJSON line {} is not valid: {}",
                self.lines_parsed, e
            ))
        })?;
        trace!(line = self.lines_parsed, "NDJSON line parsed");
        Ok(Some(item))
    }
}
