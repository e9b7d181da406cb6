use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

const RECENT_MAX: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagKind {
    /// A surface was asked to display an entry whose resource was reclaimed.
    InvalidResource,
    /// An entry was released more times than it was marked in use.
    DoubleRelease,
    /// A resource arrived with a buffer that does not match its dimensions.
    MalformedResource,
    RenderFailed,
}

impl fmt::Display for DiagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagKind::InvalidResource => "invalid-resource",
            DiagKind::DoubleRelease => "double-release",
            DiagKind::MalformedResource => "malformed-resource",
            DiagKind::RenderFailed => "render-failed",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagKind,
    pub message: String,
}

#[derive(Default)]
struct DiagLog {
    recent: VecDeque<Diagnostic>,
}

impl DiagLog {
    fn push(&mut self, diag: Diagnostic) {
        if self.recent.len() >= RECENT_MAX {
            self.recent.pop_front();
        }
        self.recent.push_back(diag);
    }

    fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let mut written = 0usize;
        while let Some(diag) = self.recent.pop_front() {
            let line = format!("{}: {}", diag.kind, diag.message);
            let bytes = line.as_bytes();
            let needed = bytes.len().saturating_add(1);
            if written + needed > out.len() {
                self.recent.push_front(diag);
                break;
            }
            out[written..written + bytes.len()].copy_from_slice(bytes);
            written += bytes.len();
            out[written] = b'\n';
            written += 1;
        }
        written
    }
}

static DIAG: OnceLock<Mutex<DiagLog>> = OnceLock::new();

fn with_diag<T>(f: impl FnOnce(&mut DiagLog) -> T) -> T {
    let lock = DIAG.get_or_init(|| Mutex::new(DiagLog::default()));
    let mut guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Log a diagnostic and keep it in the bounded recent buffer.
pub fn record(kind: DiagKind, message: String) {
    match kind {
        DiagKind::InvalidResource | DiagKind::DoubleRelease => {
            log::error!("{kind}: {message}")
        }
        DiagKind::MalformedResource | DiagKind::RenderFailed => {
            log::warn!("{kind}: {message}")
        }
    }
    with_diag(|d| d.push(Diagnostic { kind, message }));
}

pub fn recent() -> Vec<Diagnostic> {
    with_diag(|d| d.recent.iter().cloned().collect())
}

/// Move as many whole lines as fit into `out`, newline separated.
/// Returns the number of bytes written.
pub fn drain_into(out: &mut [u8]) -> usize {
    if out.is_empty() {
        return 0;
    }
    with_diag(|d| d.drain_into(out))
}
