//! Priority-threshold logger with console fallback and fan-out.
//!
//! Every `log` call runs one open/write/close cycle on the destination, so a
//! line is on disk before the call returns and nothing is held open between
//! calls. Priority 0 is the program's stop signal: the message is always
//! written, followed by `Stopped`, and the call returns [`LogError::Fatal`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::ptr;
use std::rc::{Rc, Weak};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::LogError;
use crate::paths::{self, Destination};

pub const DEFAULT_THRESHOLD: u32 = 2;

const STOPPED: &str = "Stopped";
const TIMESTAMP_FORMAT: &str = "%c";

enum Handle {
    File(File),
    Console,
    Discard,
}

pub struct Logger {
    destination: RefCell<Destination>,
    handle: RefCell<Option<Handle>>,
    threshold: Cell<u32>,
    simulated_time: RefCell<Option<String>>,
    fan_out: RefCell<Vec<Weak<Logger>>>,
    console: RefCell<Box<dyn Write>>,
    in_flight: Cell<bool>,
}

impl Logger {
    /// Build a logger writing to `file_name` (resolved against `dir`), or to
    /// the console when no name is given.
    pub fn new(
        file_name: Option<&str>,
        dir: Option<&str>,
        threshold: u32,
    ) -> Result<Self, LogError> {
        let destination = paths::resolve(file_name, dir)?;
        Ok(Self::with_destination(destination, threshold))
    }

    /// A console logger with the default threshold.
    pub fn console() -> Self {
        Self::with_destination(Destination::Console, DEFAULT_THRESHOLD)
    }

    fn with_destination(destination: Destination, threshold: u32) -> Self {
        Self {
            destination: RefCell::new(destination),
            handle: RefCell::new(None),
            threshold: Cell::new(threshold),
            simulated_time: RefCell::new(None),
            fan_out: RefCell::new(Vec::new()),
            console: RefCell::new(Box::new(io::stderr())),
            in_flight: Cell::new(false),
        }
    }

    /// Replace the console stream (standard error by default).
    pub fn with_console_writer(self, writer: impl Write + 'static) -> Self {
        *self.console.borrow_mut() = Box::new(writer);
        self
    }

    /// Point the logger somewhere else and check the new destination can be
    /// opened. Returns the file path, or `None` for console or discard.
    pub fn set_destination(
        &self,
        file_name: Option<&str>,
        dir: Option<&str>,
    ) -> Result<Option<Utf8PathBuf>, LogError> {
        let destination = paths::resolve(file_name, dir)?;
        self.close();
        *self.destination.borrow_mut() = destination;

        self.open(None, None)?;
        self.close();

        let path = self.destination.borrow().path().map(Utf8Path::to_owned);
        info!(path = ?path, "log destination changed");
        Ok(path)
    }

    pub fn destination(&self) -> Destination {
        self.destination.borrow().clone()
    }

    /// Negative or oversized values are ignored.
    pub fn set_threshold(&self, threshold: i64) -> u32 {
        match u32::try_from(threshold) {
            Ok(value) => self.threshold.set(value),
            Err(_) => debug!(threshold, "ignoring out-of-range threshold"),
        }
        self.threshold.get()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold.get()
    }

    /// Forward every subsequent `log` call to `other` as well.
    ///
    /// Only a weak reference is kept. Registering the same logger twice
    /// delivers twice; registering a logger on itself is ignored.
    pub fn register_fan_out(&self, other: &Rc<Logger>) {
        if ptr::eq(self, Rc::as_ptr(other)) {
            debug!("ignoring fan-out registration of a logger on itself");
            return;
        }
        self.fan_out.borrow_mut().push(Rc::downgrade(other));
    }

    pub fn deregister_fan_out(&self, other: &Rc<Logger>) {
        let target = Rc::as_ptr(other);
        self.fan_out
            .borrow_mut()
            .retain(|entry| !ptr::eq(entry.as_ptr(), target));
    }

    /// Live fan-out registrations, duplicates included.
    pub fn fan_out_len(&self) -> usize {
        self.fan_out
            .borrow()
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Use `prompt` verbatim as the line prefix. `None` or an empty prompt
    /// goes back to wall-clock timestamps.
    pub fn set_simulated_time(&self, prompt: Option<&str>) {
        *self.simulated_time.borrow_mut() = prompt.filter(|p| !p.is_empty()).map(str::to_owned);
    }

    pub fn simulated_time(&self) -> Option<String> {
        self.simulated_time.borrow().clone()
    }

    /// Write `message` when `priority <= threshold`, then forward it to the
    /// fan-out targets, each of which applies its own threshold.
    ///
    /// Priority 0 returns [`LogError::Fatal`] once every target has seen it.
    /// Otherwise the first [`LogError::Open`] (this logger's or a target's)
    /// is returned, after every remaining target has still been served.
    pub fn log(&self, priority: u32, message: &str) -> Result<(), LogError> {
        if self.in_flight.replace(true) {
            debug!(priority, "fan-out cycle reached a logger already logging");
            return Ok(());
        }
        let result = self.dispatch(priority, message);
        self.in_flight.set(false);
        result
    }

    pub fn fatal(&self, message: &str) -> Result<(), LogError> {
        self.log(0, message)
    }

    fn dispatch(&self, priority: u32, message: &str) -> Result<(), LogError> {
        let mut failure = None;
        if priority <= self.threshold.get() {
            match self.open(None, None) {
                Ok(()) => {
                    self.emit(message);
                    if priority == 0 {
                        self.emit(STOPPED);
                    }
                    self.close();
                }
                Err(err) => failure = Some(err),
            }
        }

        for target in self.fan_out_snapshot() {
            match target.log(priority, message) {
                Ok(()) | Err(LogError::Fatal { .. }) => {}
                Err(err) => {
                    warn!(%err, "fan-out target failed");
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }

        if priority == 0 {
            return Err(LogError::Fatal {
                message: format!("{message}\n{STOPPED}"),
            });
        }
        failure.map_or(Ok(()), Err)
    }

    fn fan_out_snapshot(&self) -> Vec<Rc<Logger>> {
        let mut fan_out = self.fan_out.borrow_mut();
        let before = fan_out.len();
        fan_out.retain(|entry| entry.strong_count() > 0);
        if fan_out.len() != before {
            debug!(dropped = before - fan_out.len(), "pruned dropped fan-out targets");
        }
        fan_out.iter().filter_map(Weak::upgrade).collect()
    }

    /// Write `"<prefix>: <message>"` to the open stream. Does nothing when
    /// the logger is closed; write failures are dropped.
    pub fn emit(&self, message: &str) {
        let line = format!("{}: {}\n", self.prefix(), message);
        let mut handle = self.handle.borrow_mut();
        let result = match handle.as_mut() {
            None => return,
            Some(Handle::File(file)) => file
                .write_all(line.as_bytes())
                .and_then(|()| file.flush()),
            Some(Handle::Console) => {
                let mut console = self.console.borrow_mut();
                console
                    .write_all(line.as_bytes())
                    .and_then(|()| console.flush())
            }
            Some(Handle::Discard) => Ok(()),
        };
        if let Err(err) = result {
            warn!(%err, "failed to write log line");
        }
    }

    fn prefix(&self) -> String {
        match self.simulated_time.borrow().as_deref() {
            Some(prompt) => prompt.to_owned(),
            None => Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Open the destination for appending. A no-op when a file is already
    /// open; a new `file_name` re-resolves the destination first.
    pub fn open(&self, file_name: Option<&str>, dir: Option<&str>) -> Result<(), LogError> {
        if self.is_open() && self.is_file_backed() {
            return Ok(());
        }
        if let Some(name) = file_name {
            *self.destination.borrow_mut() = paths::resolve(Some(name), dir)?;
        }

        let handle = match &*self.destination.borrow() {
            Destination::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LogError::Open {
                        path: path.clone(),
                        source,
                    })?;
                Handle::File(file)
            }
            Destination::Console => Handle::Console,
            Destination::Discard => Handle::Discard,
        };
        *self.handle.borrow_mut() = Some(handle);
        Ok(())
    }

    pub fn close(&self) {
        self.handle.borrow_mut().take();
    }

    pub fn is_open(&self) -> bool {
        self.handle.borrow().is_some()
    }

    pub fn is_file_backed(&self) -> bool {
        matches!(*self.destination.borrow(), Destination::File(_))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("destination", &*self.destination.borrow())
            .field("open", &self.is_open())
            .field("threshold", &self.threshold.get())
            .field("simulated_time", &*self.simulated_time.borrow())
            .field("fan_out", &self.fan_out_len())
            .finish()
    }
}
