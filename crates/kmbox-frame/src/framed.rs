use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::FrameError;
use crate::scanner::{FrameScanner, ScannerConfig};

/// `tokio_util` decoder yielding one item per marker-delimited reply.
///
/// Useful for passively tapping a device stream with `FramedRead`; bytes
/// outside the markers are dropped. Request/response correlation lives in
/// the session layer, not here.
#[derive(Debug, Default)]
pub struct ReplyCodec {
    scanner: FrameScanner,
}

impl ReplyCodec {
    /// Create a codec with explicit scanner configuration.
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            scanner: FrameScanner::with_config(config),
        }
    }
}

impl Decoder for ReplyCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let chunk = src.split();
        match self.scanner.push(&chunk)? {
            Some(payload) => {
                self.scanner.reset();
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::FramedRead;

    use super::*;
    use crate::scanner::wrap_reply;

    #[tokio::test]
    async fn framed_read_yields_each_reply() {
        let (mut device, host) = tokio::io::duplex(256);
        let mut frames = FramedRead::new(host, ReplyCodec::default());

        let mut wire = b"noise".to_vec();
        wire.extend_from_slice(&wrap_reply(b"one"));
        wire.extend_from_slice(b"\r\n");
        wire.extend_from_slice(&wrap_reply(b"two"));
        device.write_all(&wire).await.unwrap();
        drop(device);

        let first = frames.next().await.unwrap().unwrap();
        let second = frames.next().await.unwrap().unwrap();
        assert_eq!(first.as_ref(), b"one");
        assert_eq!(second.as_ref(), b"two");
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_read_surfaces_protocol_errors() {
        let (mut device, host) = tokio::io::duplex(256);
        let mut frames = FramedRead::new(host, ReplyCodec::default());

        device
            .write_all(crate::scanner::END_MARKER)
            .await
            .unwrap();
        drop(device);

        let err = frames.next().await.unwrap().unwrap_err();
        assert!(matches!(err, FrameError::EndBeforeStart));
    }
}
