// Stream event model and SSE frame parsing

use tracing::warn;

/// Channel an event arrived on, taken from the SSE `event:` field.
///
/// The set is closed: unknown channel names are routed as generic messages
/// so a newer backend never breaks an older dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    /// Generic/default channel
    Message,
    /// Full snapshot, first meaningful event after connect
    Initial,
    /// Partial KPI/alert delta applied on top of the last snapshot
    Update,
    /// Named occurrence (machine offline, test overdue, ...)
    Event,
    /// Keep-alive, no payload semantics
    Heartbeat,
}

impl Channel {
    pub fn from_name(name: &str) -> Self {
        match name {
            "" | "message" => Channel::Message,
            "initial" => Channel::Initial,
            "update" => Channel::Update,
            "event" => Channel::Event,
            "heartbeat" => Channel::Heartbeat,
            other => {
                warn!(target: "stream", channel = %other, "Unknown stream channel, routing as message");
                Channel::Message
            }
        }
    }
}

/// Named occurrences carried on the `event` channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamedEvent {
    TestOverdue,
    TestCompleted,
    MachineOffline,
    TeflonExpired,
}

impl NamedEvent {
    /// Returns `None` for unrecognized names; callers log and ignore those.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "test_overdue" => Some(NamedEvent::TestOverdue),
            "test_completed" => Some(NamedEvent::TestCompleted),
            "machine_offline" => Some(NamedEvent::MachineOffline),
            "teflon_expired" => Some(NamedEvent::TeflonExpired),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamedEvent::TestOverdue => "test_overdue",
            NamedEvent::TestCompleted => "test_completed",
            NamedEvent::MachineOffline => "machine_offline",
            NamedEvent::TeflonExpired => "teflon_expired",
        }
    }
}

/// A complete server-sent event frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseFrame {
    pub channel: Channel,
    pub data: String,
}

/// Incremental SSE parser fed with raw byte chunks.
///
/// Frames are delimited by a blank line. Chunk boundaries can fall anywhere,
/// so unterminated input stays buffered until the next push.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and drain all frames it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));
        // Normalize CRLF so frame splitting only deals with LF
        if self.buf.contains('\r') {
            self.buf = self.buf.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.find("\n\n") {
            let raw: String = self.buf.drain(..pos + 2).collect();
            if let Some(frame) = parse_frame(&raw) {
                frames.push(frame);
            }
        }
        frames
    }
}

/// Parse one raw frame (field lines up to the blank line).
///
/// Comment lines and fields we do not use (`id:`, `retry:`) are skipped.
fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event_name: Option<&str> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event_name = Some(value),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if event_name.is_none() && data_lines.is_empty() {
        return None;
    }

    Some(SseFrame {
        channel: Channel::from_name(event_name.unwrap_or("")),
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_frame() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: update\ndata: {\"a\":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].channel, Channel::Update);
        assert_eq!(frames[0].data, "{\"a\":1}");
    }

    #[test]
    fn buffers_across_chunk_boundaries() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"event: ini").is_empty());
        assert!(parser.push(b"tial\ndata: {}").is_empty());
        let frames = parser.push(b"\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].channel, Channel::Initial);
    }

    #[test]
    fn handles_crlf_delimiters() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: heartbeat\r\ndata: {}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].channel, Channel::Heartbeat);
    }

    #[test]
    fn joins_multiline_data() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"data: line one\ndata: line two\n\n");
        assert_eq!(frames[0].channel, Channel::Message);
        assert_eq!(frames[0].data, "line one\nline two");
    }

    #[test]
    fn skips_comments_and_unused_fields() {
        let mut parser = SseParser::new();
        let frames = parser.push(b": keep-alive comment\n\nid: 42\nretry: 1000\ndata: x\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "x");
    }

    #[test]
    fn drains_multiple_frames_from_one_chunk() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: update\ndata: 1\n\nevent: event\ndata: 2\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].channel, Channel::Update);
        assert_eq!(frames[1].channel, Channel::Event);
    }

    #[test]
    fn unknown_channel_falls_back_to_message() {
        let mut parser = SseParser::new();
        let frames = parser.push(b"event: surprise\ndata: {}\n\n");
        assert_eq!(frames[0].channel, Channel::Message);
    }

    #[test]
    fn named_event_round_trip() {
        for name in [
            "test_overdue",
            "test_completed",
            "machine_offline",
            "teflon_expired",
        ] {
            let event = NamedEvent::from_name(name).expect("recognized name");
            assert_eq!(event.name(), name);
        }
        assert!(NamedEvent::from_name("spindle_on_fire").is_none());
    }
}
