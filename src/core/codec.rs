use crate::core::packet::{Request, Response};
use crate::error::{QueryError, Result};
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// Codec for query datagrams.
///
/// Decodes client requests and encodes server responses. Each call to `decode`
/// treats the whole buffer as one datagram: a short buffer is a
/// `TruncatedPacket` error rather than a request for more bytes, since UDP never
/// delivers half a frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryCodec;

impl Decoder for QueryCodec {
    type Item = Request;
    type Error = QueryError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        let request = Request::from_bytes(src)?;
        // The datagram is consumed whole, trailing bytes included
        src.clear();
        Ok(Some(request))
    }
}

impl Encoder<Response> for QueryCodec {
    type Error = QueryError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<()> {
        item.write_to(dst);
        Ok(())
    }
}

impl Encoder<Request> for QueryCodec {
    type Error = QueryError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<()> {
        item.write_to(dst);
        Ok(())
    }
}
