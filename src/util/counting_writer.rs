use std::io::{Result, Write};

/// Writer adapter which counts how many bytes have gone through it
///
/// Record lengths are computed ahead of writing (they are themselves length-prefixed), so this is
/// how the class writer double-checks that the computed and the emitted sizes agree.
pub struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> CountingWriter<W> {
        CountingWriter { inner, written: 0 }
    }

    /// Number of bytes written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let len = self.inner.write(buf)?;
        self.written += len as u64;
        Ok(len)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}
