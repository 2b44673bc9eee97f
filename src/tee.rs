//! Byte-stream fan-out
//!
//! Splits one backend body stream into two independently consumable copies
//! with identical bytes: one for the client response, one for cache
//! population. A spawned driver task pumps the source into two unbounded
//! channels, so a slow or dropped consumer on either side never stalls the
//! other, and a client disconnect never cancels the backend read.

use crate::store::ByteStream;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::io;
use tokio::sync::mpsc;
use tracing::debug;

/// Split a body stream into two byte-identical copies
///
/// The driver task runs to completion regardless of what either consumer
/// does; dropping one receiver only discards that copy's chunks.
pub fn tee(mut source: ByteStream) -> (ByteStream, ByteStream) {
    let (tx_a, rx_a) = mpsc::unbounded_channel::<io::Result<Bytes>>();
    let (tx_b, rx_b) = mpsc::unbounded_channel::<io::Result<Bytes>>();

    tokio::spawn(async move {
        while let Some(item) = source.next().await {
            match item {
                Ok(chunk) => {
                    // Bytes clones share the underlying buffer
                    let _ = tx_a.send(Ok(chunk.clone()));
                    let _ = tx_b.send(Ok(chunk));
                }
                Err(e) => {
                    debug!("tee source errored: {}", e);
                    let _ = tx_a.send(Err(io::Error::new(e.kind(), e.to_string())));
                    let _ = tx_b.send(Err(e));
                    break;
                }
            }
        }
    });

    (receiver_stream(rx_a), receiver_stream(rx_b))
}

/// Drain a body stream into a single contiguous buffer
pub async fn collect(mut stream: ByteStream) -> io::Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}

fn receiver_stream(rx: mpsc::UnboundedReceiver<io::Result<Bytes>>) -> ByteStream {
    Box::pin(futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}
