//! Transcript parsing: find the latest assistant turn in a JSONL session log.
//!
//! The log is append-only and only the newest assistant turn is judged, so
//! lines are read from the end of the file in fixed-size chunks and the scan
//! stops at the first assistant record. Older history is never loaded.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, trace};

use crate::verdict::SkipReason;

const CHUNK_SIZE: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Assistant,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text(String),
    NonText,
}

impl From<&Value> for ContentBlock {
    fn from(block: &Value) -> Self {
        if block.get("type").and_then(Value::as_str) != Some("text") {
            return ContentBlock::NonText;
        }
        let text = block.get("text").and_then(Value::as_str).unwrap_or("");
        ContentBlock::Text(text.to_string())
    }
}

/// One line of the transcript.
#[derive(Debug, Deserialize)]
pub struct TranscriptEntry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default, deserialize_with = "content_blocks")]
    content: Vec<ContentBlock>,
}

/// Block arrays become blocks; string or missing content carries no blocks.
fn content_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let content = Value::deserialize(deserializer)?;
    Ok(content
        .as_array()
        .map(|blocks| blocks.iter().map(ContentBlock::from).collect())
        .unwrap_or_default())
}

impl TranscriptEntry {
    /// Parse one line. Only JSON objects are records.
    pub fn parse(line: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(line)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("transcript record is not a JSON object"));
        }
        Self::deserialize(value)
    }

    pub fn role(&self) -> Role {
        match self.kind.as_deref() {
            Some("assistant") => Role::Assistant,
            _ => Role::Other,
        }
    }

    pub fn content_blocks(&self) -> &[ContentBlock] {
        match &self.message {
            Some(message) => &message.content,
            None => &[],
        }
    }

    /// Every text block in order, each followed by a newline.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for block in self.content_blocks() {
            if let ContentBlock::Text(t) = block {
                text.push_str(t);
                text.push('\n');
            }
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Reverse line reader
// ---------------------------------------------------------------------------

/// Yields the lines of a seekable source last-to-first.
///
/// Lines are split on `\n` with a trailing `\r` removed. A source ending in
/// a newline yields an empty line first. Pieces of a line spanning several
/// chunks are joined once, so long lines cost linear copying.
pub struct ReverseLines<R> {
    reader: R,
    /// Offset of the first byte not yet pulled into `buf`.
    pos: u64,
    /// Earliest chunk read; bytes up to the next yielded line.
    buf: Vec<u8>,
    /// Newline-free chunks following `buf`, latest in the file first.
    carry: Vec<Vec<u8>>,
    chunk_size: usize,
    done: bool,
}

impl<R: Read + Seek> ReverseLines<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Self::with_chunk_size(reader, CHUNK_SIZE)
    }

    pub fn with_chunk_size(mut reader: R, chunk_size: usize) -> io::Result<Self> {
        let pos = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader,
            pos,
            buf: Vec::new(),
            carry: Vec::new(),
            chunk_size: chunk_size.max(1),
            done: false,
        })
    }

    /// Read the preceding chunk into `buf`. Returns false at start of input.
    fn fill(&mut self) -> io::Result<bool> {
        if self.pos == 0 {
            return Ok(false);
        }

        let len = self.pos.min(self.chunk_size as u64) as usize;
        self.pos -= len as u64;
        self.reader.seek(SeekFrom::Start(self.pos))?;

        let mut chunk = vec![0; len];
        self.reader.read_exact(&mut chunk)?;
        let rest = std::mem::replace(&mut self.buf, chunk);
        if !rest.is_empty() {
            self.carry.push(rest);
        }
        Ok(true)
    }

    /// Split off `buf[start..]` and append the carried pieces in file order.
    fn take_line(&mut self, start: usize) -> Vec<u8> {
        let mut line = self.buf.split_off(start);
        for piece in self.carry.drain(..).rev() {
            line.extend_from_slice(&piece);
        }
        trim_cr(line)
    }
}

impl<R: Read + Seek> Iterator for ReverseLines<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(idx) = self.buf.iter().rposition(|&b| b == b'\n') {
                let line = self.take_line(idx + 1);
                self.buf.truncate(idx);
                return Some(Ok(line));
            }

            match self.fill() {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return Some(Ok(self.take_line(0)));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

fn trim_cr(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Result of looking for the latest assistant response.
#[derive(Debug, PartialEq, Eq)]
pub enum Extraction {
    Response(String),
    Nothing(SkipReason),
}

/// Scan lines (newest first) and extract the text of the first assistant record.
///
/// Unparseable lines are skipped. A read error ends the scan with nothing to judge.
pub fn latest_assistant_response<I>(lines: I) -> Extraction
where
    I: IntoIterator<Item = io::Result<Vec<u8>>>,
{
    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                debug!(%err, "transcript read failed mid-scan");
                return Extraction::Nothing(SkipReason::TranscriptUnavailable);
            }
        };

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let entry = match TranscriptEntry::parse(&line) {
            Ok(entry) => entry,
            Err(err) => {
                trace!(%err, "skipping malformed transcript line");
                continue;
            }
        };

        if entry.role() != Role::Assistant {
            continue;
        }

        let text = entry.text();
        if text.is_empty() {
            return Extraction::Nothing(SkipReason::EmptyResponse);
        }
        return Extraction::Response(text);
    }

    Extraction::Nothing(SkipReason::NoAssistantTurn)
}

pub fn read_latest_response(path: &Path) -> Extraction {
    let lines = match File::open(path).and_then(ReverseLines::new) {
        Ok(lines) => lines,
        Err(err) => {
            debug!(path = %path.display(), %err, "transcript unavailable");
            return Extraction::Nothing(SkipReason::TranscriptUnavailable);
        }
    };
    latest_assistant_response(lines)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
