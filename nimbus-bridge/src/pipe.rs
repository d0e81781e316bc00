//! Unbuffered in-memory byte conduits
//!
//! [`pipe`] creates one unidirectional conduit with rendezvous semantics:
//! a write parks until a reader has drained every byte, a read parks until
//! bytes arrive. There is no internal buffering beyond the handoff, so a
//! slow reader stalls the writer instead of packets being dropped.
//!
//! [`duplex`] cross-wires two conduits into a pair of [`PipeEnd`]s, the
//! coupling the bridge hangs its two adapters on: whatever one end writes,
//! the other end reads.
//!
//! Each conduit is safe for one concurrent reader plus one concurrent
//! writer. Multiple writers (or readers) on the same conduit are not
//! supported.
//!
//! Closing either half closes the whole conduit: parked reads and writes
//! wake with [`std::io::ErrorKind::BrokenPipe`], and later operations fail
//! the same way. Close is idempotent and never fails.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")
}

#[derive(Default)]
struct Inner {
    /// Bytes deposited by the in-flight write, drained by reads
    buf: VecDeque<u8>,
    closed: bool,
}

struct Conduit {
    inner: Mutex<Inner>,
    /// Signaled when bytes arrive or the conduit closes
    readable: Notify,
    /// Signaled when the handoff buffer drains or the conduit closes
    writable: Notify,
}

impl Conduit {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            readable: Notify::new(),
            writable: Notify::new(),
        })
    }

    async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if !inner.buf.is_empty() {
                    let n = buf.len().min(inner.buf.len());
                    for (slot, byte) in buf.iter_mut().zip(inner.buf.drain(..n)) {
                        *slot = byte;
                    }
                    if inner.buf.is_empty() {
                        self.writable.notify_one();
                    }
                    return Ok(n);
                }
                if inner.closed {
                    return Err(closed_error());
                }
            }
            self.readable.notified().await;
        }
    }

    async fn write(&self, data: &[u8]) -> io::Result<usize> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.closed {
                return Err(closed_error());
            }
            // previous writes only return once drained, so the buffer is
            // empty here under the single-writer contract
            inner.buf.extend(data.iter().copied());
        }
        self.readable.notify_one();
        loop {
            {
                let inner = self.inner.lock().unwrap();
                if inner.closed {
                    return Err(closed_error());
                }
                if inner.buf.is_empty() {
                    return Ok(data.len());
                }
            }
            self.writable.notified().await;
        }
    }

    fn close(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.closed = true;
            inner.buf.clear();
        }
        self.readable.notify_one();
        self.writable.notify_one();
    }
}

/// Read half of a conduit
pub struct PipeReader {
    conduit: Arc<Conduit>,
}

impl PipeReader {
    /// Read up to `buf.len()` bytes, waiting until bytes are available or
    /// the conduit closes
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.conduit.read(buf).await
    }

    /// Close the conduit for both halves
    pub fn close(&self) -> io::Result<()> {
        self.conduit.close();
        Ok(())
    }
}

/// Write half of a conduit
pub struct PipeWriter {
    conduit: Arc<Conduit>,
}

impl PipeWriter {
    /// Write all of `data`, waiting until the reader has drained it or the
    /// conduit closes.
    ///
    /// Not cancel-safe: a write future dropped mid-flight leaves its chunk
    /// in the conduit for the reader. The only way to abandon a pending
    /// write cleanly is to close the conduit.
    pub async fn write(&self, data: &[u8]) -> io::Result<usize> {
        self.conduit.write(data).await
    }

    /// Close the conduit for both halves
    pub fn close(&self) -> io::Result<()> {
        self.conduit.close();
        Ok(())
    }
}

/// Create one unidirectional conduit
pub fn pipe() -> (PipeReader, PipeWriter) {
    let conduit = Conduit::new();
    (
        PipeReader {
            conduit: conduit.clone(),
        },
        PipeWriter { conduit },
    )
}

/// One endpoint of a cross-wired duplex pair
pub struct PipeEnd {
    reader: PipeReader,
    writer: PipeWriter,
}

impl PipeEnd {
    /// Read from the conduit this end receives on
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf).await
    }

    /// Write to the conduit this end sends on
    pub async fn write(&self, data: &[u8]) -> io::Result<usize> {
        self.writer.write(data).await
    }

    /// Close the receiving conduit (both its halves)
    pub fn close_read(&self) -> io::Result<()> {
        self.reader.close()
    }

    /// Close the sending conduit (both its halves)
    pub fn close_write(&self) -> io::Result<()> {
        self.writer.close()
    }
}

/// Create a cross-wired duplex pair: bytes written to one end are read
/// from the other
pub fn duplex() -> (PipeEnd, PipeEnd) {
    let (r1, w1) = pipe();
    let (r2, w2) = pipe();
    (
        PipeEnd {
            reader: r1,
            writer: w2,
        },
        PipeEnd {
            reader: r2,
            writer: w1,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn delivers_bytes_in_order() {
        let (reader, writer) = pipe();
        let mut buf = [0u8; 16];

        let (written, read) = tokio::join!(writer.write(b"hello"), reader.read(&mut buf));
        assert_eq!(written.unwrap(), 5);
        assert_eq!(read.unwrap(), 5);
        assert_eq!(&buf[..5], b"hello");
    }

    #[tokio::test]
    async fn survives_mismatched_chunk_sizes() {
        let (reader, writer) = pipe();
        let payload: Vec<u8> = (0..=255).cycle().take(1000).collect();

        let expected = payload.clone();
        let write_task = tokio::spawn(async move {
            // uneven chunks on the way in
            for chunk in payload.chunks(33) {
                writer.write(chunk).await.unwrap();
            }
            writer.close().unwrap();
        });

        // small buffer on the way out
        let mut received = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            match reader.read(&mut buf).await {
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) => {
                    assert_eq!(e.kind(), io::ErrorKind::BrokenPipe);
                    break;
                }
            }
        }
        write_task.await.unwrap();
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn write_parks_until_read() {
        let (reader, writer) = pipe();
        let write_task = tokio::spawn(async move { writer.write(b"xy").await });

        // no reader yet: the write must not complete
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!write_task.is_finished());

        let mut buf = [0u8; 4];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"xy");
        assert_eq!(write_task.await.unwrap().unwrap(), 2);
    }

    #[tokio::test]
    async fn read_parks_until_write() {
        let (reader, writer) = pipe();
        let mut buf = [0u8; 4];
        let pending = timeout(Duration::from_millis(50), reader.read(&mut buf)).await;
        assert!(pending.is_err());

        let (_, read) = tokio::join!(writer.write(b"ok"), reader.read(&mut buf));
        assert_eq!(read.unwrap(), 2);
    }

    #[tokio::test]
    async fn close_unblocks_parked_read() {
        let (reader, writer) = pipe();
        let read_task = tokio::spawn(async move {
            let mut buf = [0u8; 4];
            reader.read(&mut buf).await
        });
        // let the read park first
        tokio::time::sleep(Duration::from_millis(10)).await;

        writer.close().unwrap();
        let err = read_task.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn close_unblocks_parked_write() {
        let (reader, writer) = pipe();
        let write_task = tokio::spawn(async move { writer.write(b"stuck").await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        reader.close().unwrap();
        let err = write_task.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn operations_after_close_fail() {
        let (reader, writer) = pipe();
        reader.close().unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            reader.read(&mut buf).await.unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
        assert_eq!(
            writer.write(b"late").await.unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }

    #[tokio::test]
    async fn double_close_is_ok() {
        let (reader, writer) = pipe();
        assert!(reader.close().is_ok());
        assert!(reader.close().is_ok());
        assert!(writer.close().is_ok());
    }

    #[tokio::test]
    async fn duplex_ends_are_cross_wired() {
        let (left, right) = duplex();
        let mut buf = [0u8; 16];

        let (_, read) = tokio::join!(left.write(b"to-right"), right.read(&mut buf));
        assert_eq!(&buf[..read.unwrap()], b"to-right");

        let (_, read) = tokio::join!(right.write(b"to-left"), left.read(&mut buf));
        assert_eq!(&buf[..read.unwrap()], b"to-left");
    }

    #[tokio::test]
    async fn closing_one_end_write_side_stops_peer_reads() {
        let (left, right) = duplex();
        left.close_write().unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            right.read(&mut buf).await.unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }
}
