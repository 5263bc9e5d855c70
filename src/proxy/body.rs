use crate::error::{ProxyError, Result};
use bytes::{Bytes, BytesMut};
use futures::{pin_mut, Stream, StreamExt};
use std::fmt::Display;

/// Accumulates a streamed request body, failing as soon as more than `limit`
/// bytes have arrived.
pub async fn read_limited<S, E>(stream: S, limit: usize) -> Result<Bytes>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    pin_mut!(stream);
    let mut body = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProxyError::BodyRead(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(ProxyError::PayloadTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body.freeze())
}

/// Rejects a request whose declared `Content-Length` already exceeds the limit.
pub fn check_declared_length(content_length: Option<u64>, limit: usize) -> Result<()> {
    match content_length {
        Some(len) if len > limit as u64 => Err(ProxyError::PayloadTooLarge { limit }),
        _ => Ok(()),
    }
}
