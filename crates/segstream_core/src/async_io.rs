//! `tokio::io` adapters.
//!
//! The stream never waits on anything, so every poll completes on the first
//! call. These impls exist so a stream can be handed to async code that
//! expects `AsyncRead`/`AsyncWrite`/`AsyncSeek`.

use crate::pool::SegmentPool;
use crate::stream::SegmentedStream;
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};

impl<P: SegmentPool> AsyncRead for SegmentedStream<P> {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let dst = buf.initialize_unfilled();
        let n = this.read(dst)?;
        buf.advance(n);
        Poll::Ready(Ok(()))
    }
}

impl<P: SegmentPool> AsyncWrite for SegmentedStream<P> {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().write(buf)?;
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl<P: SegmentPool> AsyncSeek for SegmentedStream<P> {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        self.get_mut().seek(position)?;
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Ok(self.position()))
    }
}

#[cfg(test)]
mod tests {
    use crate::ArrayStream;
    use std::io::SeekFrom;
    use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

    #[tokio::test]
    async fn async_roundtrip() {
        let mut stream = ArrayStream::builder().segment_size(4).build().unwrap();
        AsyncWriteExt::write_all(&mut stream, b"async bytes").await.unwrap();
        AsyncSeekExt::seek(&mut stream, SeekFrom::Start(6)).await.unwrap();

        let mut out = Vec::new();
        AsyncReadExt::read_to_end(&mut stream, &mut out).await.unwrap();
        assert_eq!(out, b"bytes");
    }

    #[tokio::test]
    async fn async_write_while_frozen_fails() {
        let mut stream = ArrayStream::new();
        stream.freeze().unwrap();
        let result = AsyncWriteExt::write_all(&mut stream, b"x").await;
        assert_eq!(
            result.unwrap_err().kind(),
            std::io::ErrorKind::PermissionDenied
        );
    }
}
