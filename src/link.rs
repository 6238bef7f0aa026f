/*!
    TCP transport of the ethernet interface and the single-exchange primitive.

    The protocol cannot multiplex: the device answers requests strictly in order and one at a
    time, so [Link] allows exactly one exchange in flight. A mutex around the socket serializes
    concurrent callers, a second caller entering [Link::exchange] blocks until the first one
    returns. The sequence counter is independently atomic so identifiers can be allocated
    without holding the mutex.

    Responses are matched to requests positionally, never by sequence id: the id travels so the
    device can log it. If a deadline elapses mid exchange the stream may hold a half written
    request or an unread response, there is no resynchronization, close and reopen the session
    before further use.
*/

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::{EthernetError, EthernetResult};
use crate::frame::{self, Frame};

/// receive buffer size, one ethernet MTU
const MAX_FRAME_SIZE: usize = frame::HEADER_SIZE + frame::BUFFER_SIZE;

/// TCP session to one device: socket lifecycle, sequence ids, bounded-time exchanges
pub struct Link {
    endpoint: SocketAddr,
    stream: Mutex<Option<TcpStream>>,
    sequence: AtomicU16,
}

impl Link {
    /// session for the given endpoint, initially closed
    pub fn new(endpoint: SocketAddr) -> Self {
        Self {
            endpoint,
            stream: Mutex::new(None),
            sequence: AtomicU16::new(0),
        }
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    /**
        blocking TCP connect to the endpoint

        Returns whether the session is open afterwards. A failure is logged and leaves the
        session closed.
    */
    pub async fn connect(&self) -> bool {
        let mut guard = self.stream.lock().await;
        if guard.is_some() {
            return true;
        }
        match TcpStream::connect(self.endpoint).await {
            Ok(stream) => {
                *guard = Some(stream);
                true
            }
            Err(error) => {
                log::error!("connection to {} failed: {}", self.endpoint, error);
                false
            }
        }
    }

    /// close the socket, idempotent
    pub async fn disconnect(&self) {
        self.stream.lock().await.take();
    }

    /// whether the socket is open, this does not probe reachability
    pub async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }

    /// allocate the next sequence identifier, wrapping from 0xffff to 0
    pub fn next_sequence(&self) -> u16 {
        self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /**
        send one request and read one response, both bounded by `expiry`

        The response is read in a single recv and parsed from its start, the device sends one
        frame per response. On [EthernetError::Timeout] the socket operation is abandoned
        wherever it was: the session is broken and must be reconnected.
    */
    pub async fn exchange(&self, request: &Frame, expiry: Duration) -> EthernetResult<Frame> {
        let raw = request.serialize()?;
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut()
            .ok_or(EthernetError::Client("the session is not connected"))?;
        let received = tokio::time::timeout(expiry, async {
            stream.write_all(&raw).await?;
            let mut buffer = vec![0; MAX_FRAME_SIZE];
            let size = stream.read(&mut buffer).await?;
            buffer.truncate(size);
            Ok::<_, std::io::Error>(buffer)
        })
        .await
        .map_err(|_| EthernetError::Timeout("the device did not answer before the deadline"))??;
        Frame::parse(&received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_wraps() {
        let link = Link::new("127.0.0.1:8080".parse().unwrap());
        assert_eq!(link.next_sequence(), 1);
        assert_eq!(link.next_sequence(), 2);
        for _ in 2 .. 0xffff {
            link.next_sequence();
        }
        assert_eq!(link.next_sequence(), 0);
        assert_eq!(link.next_sequence(), 1);
    }
}
