//! File handles for the `open` / `newFile` built-ins.
//!
//! A handle loads the file's lines into memory when opened; `readLine`
//! consumes them from the front. Writes go through a buffer: `writeLine`
//! only appends to the buffer, and `close` flushes it by writing the
//! buffered lines joined with `\n`. A handle dropped without `close`
//! loses its buffered writes.

use std::collections::VecDeque;
use std::fs;
use std::io;

use crate::error::RuntimeError;

/// An open file, with its remaining read lines and buffered writes.
#[derive(Debug)]
pub struct FileHandle {
    path: String,
    lines: VecDeque<String>,
    pending: Vec<String>,
}

impl FileHandle {
    /// Opens `path` for reading and loads its lines.
    pub fn open(path: &str) -> io::Result<FileHandle> {
        let content = fs::read_to_string(path)?;
        let lines = content.trim().lines().map(str::to_string).collect();
        Ok(FileHandle {
            path: path.to_string(),
            lines,
            pending: Vec::new(),
        })
    }

    /// Creates or truncates `path` and returns a handle to it.
    pub fn create(path: &str) -> io::Result<FileHandle> {
        fs::write(path, "")?;
        Ok(FileHandle {
            path: path.to_string(),
            lines: VecDeque::new(),
            pending: Vec::new(),
        })
    }

    /// The path this handle was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Takes the next unread line.
    ///
    /// Fails with an end-of-file error once the loaded lines run out.
    pub fn read_line(&mut self) -> Result<String, RuntimeError> {
        self.lines.pop_front().ok_or_else(|| RuntimeError::Eof {
            message: format!("end of file {}", self.path),
        })
    }

    /// Buffers one line for the next `close`.
    pub fn write_line(&mut self, line: String) {
        self.pending.push(line);
    }

    /// Reads the whole file from disk.
    pub fn read_file(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    /// Overwrites the file with `text`.
    pub fn write_file(&self, text: &str) -> io::Result<()> {
        fs::write(&self.path, text)
    }

    /// Flushes buffered lines to disk, joined with `\n`.
    pub fn close(&mut self) -> io::Result<()> {
        self.write_file(&self.pending.join("\n"))
    }
}
