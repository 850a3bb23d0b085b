//! Allocation events: one per observed registration

use crate::config::BacktraceMode;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Diagnostic record of a single registration.
///
/// Events have no identity of their own. They exist so a leak report can
/// point at the code that registered the listener.
#[derive(Debug, Clone)]
pub struct AllocationEvent {
    sequence: u64,
    location: Option<&'static Location<'static>>,
    thread: Option<String>,
    backtrace: Option<Arc<Backtrace>>,
}

impl AllocationEvent {
    /// Capture an event at the caller's location
    #[track_caller]
    pub fn capture(sequence: u64, mode: BacktraceMode) -> Self {
        let location = match mode {
            BacktraceMode::Off => None,
            BacktraceMode::Location | BacktraceMode::Full => Some(Location::caller()),
        };
        let backtrace = match mode {
            BacktraceMode::Full => Some(Arc::new(Backtrace::force_capture())),
            BacktraceMode::Off | BacktraceMode::Location => None,
        };
        Self {
            sequence,
            location,
            thread: std::thread::current().name().map(str::to_owned),
            backtrace,
        }
    }

    /// Position of this event among all registrations seen by its tracker
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Source location of the registering call
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }

    /// Name of the registering thread
    pub fn thread(&self) -> Option<&str> {
        self.thread.as_deref()
    }

    /// Captured backtrace, when capture was enabled and supported
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace
            .as_deref()
            .filter(|bt| bt.status() == BacktraceStatus::Captured)
    }

    /// Write the event, limiting the backtrace to `max_frames` frames
    pub(crate) fn write_limited(
        &self,
        f: &mut fmt::Formatter<'_>,
        max_frames: Option<usize>,
    ) -> fmt::Result {
        write!(f, "registration #{}", self.sequence)?;
        if let Some(location) = self.location {
            write!(f, " at {location}")?;
        }
        if let Some(thread) = &self.thread {
            write!(f, " on thread '{thread}'")?;
        }
        if let Some(backtrace) = self.backtrace() {
            write_frames(f, &backtrace.to_string(), max_frames)?;
        }
        Ok(())
    }
}

/// Whether `line` opens a frame (`  12: symbol`) rather than continuing one
pub(crate) fn is_frame_header(line: &str) -> bool {
    line.trim_start()
        .split_once(':')
        .is_some_and(|(index, _)| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Write a rendered backtrace keeping at most `max_frames` frames.
///
/// A frame is its numbered symbol line plus the `at file:line` lines that
/// follow it.
fn write_frames(
    f: &mut fmt::Formatter<'_>,
    rendered: &str,
    max_frames: Option<usize>,
) -> fmt::Result {
    let limit = max_frames.unwrap_or(usize::MAX);
    let mut frames = 0usize;
    let mut omitted = 0usize;
    for line in rendered.lines() {
        if is_frame_header(line) {
            frames += 1;
        }
        if frames > limit {
            if is_frame_header(line) {
                omitted += 1;
            }
            continue;
        }
        write!(f, "\n      {line}")?;
    }
    if omitted > 0 {
        write!(f, "\n      ... {omitted} more frames")?;
    }
    Ok(())
}

impl fmt::Display for AllocationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_limited(f, None)
    }
}
