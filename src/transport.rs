// Transport seam: a session is a sink/stream pair of text frames

use futures_util::{Sink, SinkExt, Stream, StreamExt, future};
use std::future::Future;
use std::pin::Pin;
use tokio_tungstenite::tungstenite::Message;

use crate::error::TransportError;

pub type FrameSink = Pin<Box<dyn Sink<String, Error = TransportError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// One live connection. Replaced, never reused, on every reconnect attempt.
pub struct Session {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Session {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

/// Opens sessions to a URL.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str)
    -> impl Future<Output = Result<Session, TransportError>> + Send;
}

/// WebSocket connector (tokio-tungstenite). Text and binary frames become text;
/// ping/pong are answered by tungstenite; a close frame ends the stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Session, TransportError> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        let (write, read) = ws.split();

        let sink = write
            .sink_map_err(TransportError::from)
            .with(|text: String| future::ready(Ok::<_, TransportError>(Message::Text(text.into()))));

        let stream = read
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(bytes)) => {
                        Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(TransportError::from(e))),
                })
            });

        Ok(Session::new(Box::pin(sink), Box::pin(stream)))
    }
}
