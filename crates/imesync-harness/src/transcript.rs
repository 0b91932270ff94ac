#![forbid(unsafe_code)]

//! Session transcripts: record and replay.
//!
//! A transcript is a JSONL file. The first line is a `header` carrying the
//! schema version, the session name and the adapter configuration; the last
//! is a `summary`. Every line in between is a `step` (an input event with
//! the notifications it produced), a `clipboard` record (text placed on the
//! clipboard by the test driver) or a `show_ime` record (a keyboard request
//! and whether it was made).
//!
//! [`replay`] feeds the recorded inputs into a fresh [`ImeSession`] and
//! compares what comes out against what was recorded, reporting the first
//! step that differs.
//!
//! ```ignore
//! let mut session = ImeSession::new("paste");
//! session.click(TextInputType::Text);
//! session.dispatch(InputEvent::Paste);
//! session.transcript().write_to(std::fs::File::create("paste.jsonl")?)?;
//!
//! let transcript = TranscriptReader::open("paste.jsonl")?;
//! assert!(replay(&transcript).is_clean());
//! ```

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use imesync_core::event::InputEvent;
use imesync_edit::{AdapterConfig, Notification};
use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;
use crate::session::ImeSession;

/// Current schema version for transcript files.
pub const SCHEMA_VERSION: &str = "imesync-transcript-v1";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single line of a transcript file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum TranscriptRecord {
    /// First line.
    Header {
        schema_version: String,
        session_name: String,
        config: AdapterConfig,
    },

    /// An input event and the notifications it produced.
    Step {
        seq: u64,
        handled: bool,
        event: InputEvent,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        notifications: Vec<Notification>,
    },

    /// Text placed on the clipboard by the driver.
    Clipboard { seq: u64, text: String },

    /// Keyboard requested for the focused element.
    ShowIme { seq: u64, shown: bool },

    /// Last line.
    Summary {
        total_steps: u64,
        total_notifications: u64,
    },
}

/// One logged action of an [`ImeSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    /// An input event was dispatched.
    Input {
        event: InputEvent,
        handled: bool,
        notifications: Vec<Notification>,
    },
    /// The driver put text on the clipboard.
    SetClipboard { text: String },
    /// The driver asked for the keyboard.
    ShowImeIfNeeded { shown: bool },
}

impl SessionStep {
    /// Notifications produced by this step.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        match self {
            Self::Input { notifications, .. } => notifications,
            Self::SetClipboard { .. } | Self::ShowImeIfNeeded { .. } => &[],
        }
    }

    /// Whether the adapter acted on the step. Clipboard steps always count.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        match self {
            Self::Input { handled, .. } => *handled,
            Self::SetClipboard { .. } => true,
            Self::ShowImeIfNeeded { shown } => *shown,
        }
    }

    fn to_record(&self, seq: u64) -> TranscriptRecord {
        match self {
            Self::Input {
                event,
                handled,
                notifications,
            } => TranscriptRecord::Step {
                seq,
                handled: *handled,
                event: event.clone(),
                notifications: notifications.clone(),
            },
            Self::SetClipboard { text } => TranscriptRecord::Clipboard {
                seq,
                text: text.clone(),
            },
            Self::ShowImeIfNeeded { shown } => TranscriptRecord::ShowIme { seq, shown: *shown },
        }
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// A complete recorded session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    session_name: String,
    config: AdapterConfig,
    steps: Vec<SessionStep>,
}

impl Transcript {
    /// Assemble a transcript from logged steps.
    pub fn new(
        session_name: impl Into<String>,
        config: AdapterConfig,
        steps: Vec<SessionStep>,
    ) -> Self {
        Self {
            session_name: session_name.into(),
            config,
            steps,
        }
    }

    /// Session name from the header.
    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Adapter configuration the session ran with.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Logged steps in order.
    #[must_use]
    pub fn steps(&self) -> &[SessionStep] {
        &self.steps
    }

    /// Total notifications across all steps.
    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.steps.iter().map(|s| s.notifications().len()).sum()
    }

    /// Write the transcript as JSONL.
    ///
    /// Returns the underlying writer.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<W, TranscriptError> {
        let mut out = TranscriptWriter::from_writer(writer, &self.session_name, &self.config)?;
        for step in &self.steps {
            out.write_step(step)?;
        }
        out.finish()
    }

    /// Render the transcript as a JSONL string.
    pub fn to_jsonl(&self) -> Result<String, TranscriptError> {
        let bytes = self.write_to(Vec::new())?;
        String::from_utf8(bytes).map_err(|e| TranscriptError::Io(std::io::Error::other(e)))
    }
}

// ---------------------------------------------------------------------------
// TranscriptWriter
// ---------------------------------------------------------------------------

/// Streams transcript records to any `Write`.
pub struct TranscriptWriter<W: Write> {
    writer: BufWriter<W>,
    next_seq: u64,
    total_notifications: u64,
}

impl<W: Write> TranscriptWriter<W> {
    /// Create a writer and emit the header record.
    pub fn from_writer(
        writer: W,
        session_name: &str,
        config: &AdapterConfig,
    ) -> Result<Self, TranscriptError> {
        let mut this = Self {
            writer: BufWriter::new(writer),
            next_seq: 0,
            total_notifications: 0,
        };
        this.emit(&TranscriptRecord::Header {
            schema_version: SCHEMA_VERSION.to_owned(),
            session_name: session_name.to_owned(),
            config: config.clone(),
        })?;
        Ok(this)
    }

    /// Append one session step.
    pub fn write_step(&mut self, step: &SessionStep) -> Result<(), TranscriptError> {
        let record = step.to_record(self.next_seq);
        self.next_seq += 1;
        self.total_notifications += step.notifications().len() as u64;
        self.emit(&record)
    }

    /// Write the summary record and flush.
    pub fn finish(mut self) -> Result<W, TranscriptError> {
        let summary = TranscriptRecord::Summary {
            total_steps: self.next_seq,
            total_notifications: self.total_notifications,
        };
        self.emit(&summary)?;
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| TranscriptError::Io(e.into_error()))
    }

    fn emit(&mut self, record: &TranscriptRecord) -> Result<(), TranscriptError> {
        serde_json::to_writer(&mut self.writer, record).map_err(TranscriptError::Encode)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TranscriptReader
// ---------------------------------------------------------------------------

/// Parses transcript files.
pub struct TranscriptReader;

impl TranscriptReader {
    /// Open and parse a transcript file.
    pub fn open(path: impl AsRef<Path>) -> Result<Transcript, TranscriptError> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Parse a transcript from raw JSONL bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Transcript, TranscriptError> {
        let mut header: Option<(String, AdapterConfig)> = None;
        let mut summary: Option<(u64, u64)> = None;
        let mut steps = Vec::new();

        for (idx, line) in BufReader::new(data).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let record: TranscriptRecord = serde_json::from_str(&line)
                .map_err(|source| TranscriptError::Json { line: line_no, source })?;

            match record {
                TranscriptRecord::Header {
                    schema_version,
                    session_name,
                    config,
                } => {
                    if header.is_some() || summary.is_some() || !steps.is_empty() {
                        return Err(TranscriptError::UnexpectedRecord {
                            line: line_no,
                            record: "header",
                        });
                    }
                    if schema_version != SCHEMA_VERSION {
                        return Err(TranscriptError::UnsupportedSchema(schema_version));
                    }
                    header = Some((session_name, config));
                }
                TranscriptRecord::Summary {
                    total_steps,
                    total_notifications,
                } => {
                    if header.is_none() || summary.is_some() {
                        return Err(TranscriptError::UnexpectedRecord {
                            line: line_no,
                            record: "summary",
                        });
                    }
                    summary = Some((total_steps, total_notifications));
                }
                TranscriptRecord::Step {
                    handled,
                    event,
                    notifications,
                    ..
                } => {
                    Self::require_open(header.is_some(), summary.is_some(), line_no, "step")?;
                    steps.push(SessionStep::Input {
                        event,
                        handled,
                        notifications,
                    });
                }
                TranscriptRecord::Clipboard { text, .. } => {
                    Self::require_open(header.is_some(), summary.is_some(), line_no, "clipboard")?;
                    steps.push(SessionStep::SetClipboard { text });
                }
                TranscriptRecord::ShowIme { shown, .. } => {
                    Self::require_open(header.is_some(), summary.is_some(), line_no, "show_ime")?;
                    steps.push(SessionStep::ShowImeIfNeeded { shown });
                }
            }
        }

        let Some((session_name, config)) = header else {
            return Err(TranscriptError::MissingHeader);
        };
        let transcript = Transcript::new(session_name, config, steps);

        if let Some((total_steps, total_notifications)) = summary {
            let actual = (
                transcript.steps.len() as u64,
                transcript.notification_count() as u64,
            );
            if (total_steps, total_notifications) != actual {
                return Err(TranscriptError::SummaryMismatch {
                    expected_steps: total_steps,
                    expected_notifications: total_notifications,
                    actual_steps: actual.0,
                    actual_notifications: actual.1,
                });
            }
        } else {
            tracing::warn!(
                target: "imesync.harness",
                session = %transcript.session_name,
                "transcript has no summary record"
            );
        }

        Ok(transcript)
    }

    fn require_open(
        has_header: bool,
        has_summary: bool,
        line: usize,
        record: &'static str,
    ) -> Result<(), TranscriptError> {
        if !has_header {
            return Err(TranscriptError::MissingHeader);
        }
        if has_summary {
            return Err(TranscriptError::UnexpectedRecord { line, record });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// First point where a replay disagreed with its transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    /// Step index.
    pub seq: usize,
    /// Recorded `handled` flag.
    pub expected_handled: bool,
    /// Replayed `handled` flag.
    pub actual_handled: bool,
    /// Recorded notifications.
    pub expected: Vec<Notification>,
    /// Replayed notifications.
    pub actual: Vec<Notification>,
}

/// Outcome of [`replay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Session name from the transcript.
    pub session_name: String,
    /// Steps fed before stopping.
    pub steps_replayed: usize,
    /// Notifications produced by the replay.
    pub notifications: usize,
    /// First differing step, if any.
    pub divergence: Option<Divergence>,
}

impl ReplayReport {
    /// Whether the replay matched the transcript exactly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.divergence.is_none()
    }
}

/// Replay a transcript against a fresh session.
///
/// Stops at the first divergent step.
pub fn replay(transcript: &Transcript) -> ReplayReport {
    let _span = tracing::info_span!(
        "ime.replay",
        session = %transcript.session_name,
        steps = transcript.steps.len()
    )
    .entered();

    let mut session =
        ImeSession::with_config(transcript.session_name.clone(), transcript.config.clone());
    let mut report = ReplayReport {
        session_name: transcript.session_name.clone(),
        steps_replayed: 0,
        notifications: 0,
        divergence: None,
    };

    for (seq, step) in transcript.steps.iter().enumerate() {
        match step {
            SessionStep::SetClipboard { text } => session.set_clipboard_text(text),
            SessionStep::ShowImeIfNeeded { shown } => {
                let actual_shown = session.show_ime_if_needed();
                if actual_shown != *shown {
                    tracing::warn!(
                        target: "imesync.harness",
                        seq,
                        "replay diverged on keyboard request"
                    );
                    report.steps_replayed = seq + 1;
                    report.divergence = Some(Divergence {
                        seq,
                        expected_handled: *shown,
                        actual_handled: actual_shown,
                        expected: Vec::new(),
                        actual: Vec::new(),
                    });
                    return report;
                }
            }
            SessionStep::Input {
                event,
                handled,
                notifications,
            } => {
                let actual_handled = session.dispatch(event.clone());
                let actual = session
                    .steps()
                    .last()
                    .map(|s| s.notifications().to_vec())
                    .unwrap_or_default();
                report.notifications += actual.len();
                if actual_handled != *handled || actual != *notifications {
                    tracing::warn!(
                        target: "imesync.harness",
                        seq,
                        operation = event.operation_name(),
                        "replay diverged"
                    );
                    report.steps_replayed = seq + 1;
                    report.divergence = Some(Divergence {
                        seq,
                        expected_handled: *handled,
                        actual_handled,
                        expected: notifications.clone(),
                        actual,
                    });
                    return report;
                }
            }
        }
        report.steps_replayed = seq + 1;
    }

    tracing::info!(
        target: "imesync.harness",
        steps = report.steps_replayed,
        notifications = report.notifications,
        "replay clean"
    );
    report
}
