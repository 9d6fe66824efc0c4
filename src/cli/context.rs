//! Execution context shared by every command in a dispatch

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

struct Sink {
    writer: Box<dyn Write + Send>,
    written: usize,
}

/// A shareable byte-oriented output destination.
///
/// Clones write to the same underlying writer, which lets the same stream
/// serve both as a command's stderr and as the destination of log output.
#[derive(Clone)]
pub struct Stream {
    sink: Arc<Mutex<Sink>>,
}

impl Stream {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink {
                writer: Box::new(writer),
                written: 0,
            })),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Returns the number of bytes written through this stream so far
    pub fn written(&self) -> usize {
        self.lock().written
    }

    fn lock(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = self.lock();
        let n = sink.writer.write(buf)?;
        sink.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().writer.flush()
    }
}

impl<'a> MakeWriter<'a> for Stream {
    type Writer = Stream;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// An in-memory writer whose contents can be read back.
#[derive(Clone, Default)]
pub struct Buffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buffered bytes as (lossy) UTF-8
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap_or_else(|p| p.into_inner());
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The world a command runs in: working directory, input, the two output
/// streams and the logging sink installed for this dispatch.
pub struct Context {
    dir: PathBuf,
    stdin: Box<dyn Read>,
    stdout: Stream,
    stderr: Stream,
    serialisable: bool,
    log_guard: Option<DefaultGuard>,
}

impl Context {
    pub fn new(dir: impl Into<PathBuf>, stdin: Box<dyn Read>, stdout: Stream, stderr: Stream) -> Self {
        Self {
            dir: dir.into(),
            stdin,
            stdout,
            stderr,
            serialisable: false,
            log_guard: None,
        }
    }

    /// Builds a context attached to the process's standard streams
    pub fn default_context() -> io::Result<Self> {
        let dir = std::env::current_dir()?;
        Ok(Self::new(
            dir,
            Box::new(io::stdin()),
            Stream::stdout(),
            Stream::stderr(),
        ))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves `path` relative to the context's working directory
    pub fn abs_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    pub fn stdin(&mut self) -> &mut dyn Read {
        self.stdin.as_mut()
    }

    pub fn stdout(&mut self) -> &mut Stream {
        &mut self.stdout
    }

    pub fn stderr(&mut self) -> &mut Stream {
        &mut self.stderr
    }

    /// A handle to the error stream, for collaborators that outlive a borrow
    pub fn stderr_handle(&self) -> Stream {
        self.stderr.clone()
    }

    /// Returns true once a machine-readable output format has been selected
    pub fn is_serial(&self) -> bool {
        self.serialisable
    }

    pub fn set_serialisable(&mut self, serialisable: bool) {
        self.serialisable = serialisable;
    }

    /// Keeps a logging subscriber active for as long as this context lives.
    ///
    /// The first guard wins; a later one is dropped at once, which restores
    /// the subscriber that was active before it.
    pub fn install_log_guard(&mut self, guard: DefaultGuard) {
        if self.log_guard.is_none() {
            self.log_guard = Some(guard);
        }
    }

    /// Returns true once a logging subscriber is attached to this context
    pub fn has_log(&self) -> bool {
        self.log_guard.is_some()
    }

    /// Writes a user-facing warning to the error stream
    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.stderr, "WARNING {}", message)
    }
}
