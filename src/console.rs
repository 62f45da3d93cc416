use std::sync::{Arc, Mutex, PoisonError};

/// Where response bodies and intent lines end up.
pub trait ConsoleSink {
    fn log(&self, text: &str);
}

/// Append-only transcript shared by every clone. Never truncated.
#[derive(Debug, Clone, Default)]
pub struct Console {
    entries: Arc<Mutex<Vec<String>>>,
    echo: bool,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prints each new line to stdout as it is appended.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConsoleSink for Console {
    fn log(&self, text: &str) {
        let mut entries = self.lock();
        entries.push(text.to_owned());
        // printed under the lock so stdout order matches the transcript
        if self.echo {
            println!("{}", text);
        }
    }
}

/// Sink of the legacy client, which popped the ping answer up instead of
/// appending it to the console.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alert;

impl ConsoleSink for Alert {
    fn log(&self, text: &str) {
        eprintln!("[alert] {}", text);
    }
}
