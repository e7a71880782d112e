use std::pin::Pin;
use std::task::{Context, Poll};
use bytes::Bytes;
use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::sync::mpsc;

pin_project! {
    /// 包装上传用的文件流，把累计已发送的字节数转发给进度通道
    pub struct CountingStream<S> {
        #[pin]
        inner: S,
        progress_tx: Option<mpsc::UnboundedSender<u64>>,
        bytes_sent: u64,
    }
}

impl<S> CountingStream<S> {
    pub fn new(inner: S, progress_tx: Option<mpsc::UnboundedSender<u64>>) -> Self {
        Self {
            inner,
            progress_tx,
            bytes_sent: 0,
        }
    }
}

impl<S> Stream for CountingStream<S>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                *this.bytes_sent += chunk.len() as u64;
                if let Some(tx) = this.progress_tx.as_ref() {
                    let _ = tx.send(*this.bytes_sent);
                }

                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}
