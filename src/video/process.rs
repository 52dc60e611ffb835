//! Background stderr draining for ffmpeg child processes.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Bytes of stderr kept for error messages
const TAIL_LIMIT: usize = 8 * 1024;

/// Reads a child's stderr to the end in the background, keeping the last few KiB.
///
/// Must be created inside a tokio runtime. The pipe is always drained, so the
/// child never blocks on a full stderr buffer.
pub(crate) struct StderrTail {
    handle: Option<JoinHandle<String>>,
}

impl StderrTail {
    /// Take `child`'s stderr pipe and start draining it
    pub(crate) fn capture(child: &mut Child) -> Self {
        let handle = child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(read_tail(stderr, TAIL_LIMIT)));
        Self { handle }
    }

    /// Wait for the child to close stderr and return what was kept
    pub(crate) async fn collect(self) -> String {
        match self.handle {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Read `reader` to EOF and return its last `limit` bytes as trimmed text
pub(crate) async fn read_tail<R: AsyncRead + Unpin>(mut reader: R, limit: usize) -> String {
    let mut tail: Vec<u8> = Vec::with_capacity(limit);
    let mut chunk = [0u8; 4096];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        tail.extend_from_slice(&chunk[..n]);
        if tail.len() > limit {
            let excess = tail.len() - limit;
            tail.drain(..excess);
        }
    }

    String::from_utf8_lossy(&tail).trim().to_string()
}
