// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The framing codec: translates between a raw byte stream and typed
//! [`Message`] values via [`tokio_util::codec::Framed`].
//!
//! Decoding is prefix-driven by the header's `length` field (§4.1): we never
//! consume a byte until the whole message is buffered, so a `Framed` built
//! on top of this codec is automatically prefix-safe — a short read just
//! means `decode` returns `Ok(None)` and is asked again once more bytes
//! arrive.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::wire::{
    header::{HEADER_LEN, RawSerpHeader},
    kind::{Kind, UnknownKind},
    message::{Body, Message, Request, Response},
    method::{InvalidMethod, Method},
    serpid::SerpId,
};

/// Default cap on `length`, guarding against a corrupt or hostile header
/// claiming an implausible payload size. Configurable per hub instance via
/// [`SerpCodec::with_max_message_len`].
pub const DEFAULT_MAX_MESSAGE_LEN: u32 = 1 << 20;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    #[error("truncated payload: connection closed mid-message")]
    TruncatedPayload,
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),
    #[error(transparent)]
    InvalidMethod(#[from] InvalidMethod),
    #[error("target is not valid UTF-8")]
    InvalidTarget,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stateless codec for one client connection's byte stream.
///
/// Holds no per-connection state beyond the configured size cap, so it is
/// cheap to construct per [`Framed`](tokio_util::codec::Framed) session.
#[derive(Debug, Clone, Copy)]
pub struct SerpCodec {
    max_message_len: u32,
}

impl Default for SerpCodec {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl SerpCodec {
    pub fn with_max_message_len(max_message_len: u32) -> Self {
        Self { max_message_len }
    }
}

impl Decoder for SerpCodec {
    type Error = CodecError;
    type Item = Message;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, CodecError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let hdr = RawSerpHeader::from_bytes(&src[..HEADER_LEN])
            .map_err(|e| CodecError::MalformedHeader(e.to_string()))?;
        if hdr.reserved_nonzero() {
            return Err(CodecError::MalformedHeader(
                "reserved header bits must be zero".into(),
            ));
        }
        let body_len = hdr.length.get();
        if body_len > self.max_message_len {
            return Err(CodecError::MalformedHeader(format!(
                "length {body_len} exceeds cap {}",
                self.max_message_len
            )));
        }

        let total = HEADER_LEN + body_len as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(total);
        frame.advance(HEADER_LEN);

        let kind = hdr.kind()?;
        let source = SerpId::new(hdr.source.get());
        let destination = SerpId::new(hdr.destination.get());
        let correlation = hdr.correlation.get();

        let destinations = if hdr.multi_send() {
            if kind != Kind::Request {
                return Err(CodecError::MalformedHeader(
                    "multi_send set on a Response".into(),
                ));
            }
            Some(decode_destination_list(&mut frame)?)
        } else {
            None
        };

        let body = match kind {
            Kind::Request => Body::Request(decode_request(&mut frame)?),
            Kind::Response => Body::Response(decode_response(&mut frame)?),
        };

        Ok(Some(Message {
            source,
            destination,
            correlation,
            destinations,
            body,
        }))
    }
}

fn decode_destination_list(frame: &mut Bytes) -> Result<Vec<SerpId>, CodecError> {
    if frame.len() < 2 {
        return Err(CodecError::TruncatedPayload);
    }
    let count = frame.get_u16() as usize;
    if frame.len() < count * 2 {
        return Err(CodecError::TruncatedPayload);
    }
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(SerpId::new(frame.get_u16()));
    }
    Ok(ids)
}

fn decode_request(frame: &mut Bytes) -> Result<Request, CodecError> {
    if frame.is_empty() {
        return Err(CodecError::TruncatedPayload);
    }
    let method = Method::from_u8(frame.get_u8())?;

    if frame.len() < 2 {
        return Err(CodecError::TruncatedPayload);
    }
    let target_len = frame.get_u16() as usize;
    if frame.len() < target_len {
        return Err(CodecError::TruncatedPayload);
    }
    let target_bytes = frame.split_to(target_len);
    let target =
        String::from_utf8(target_bytes.to_vec()).map_err(|_| CodecError::InvalidTarget)?;

    let body = frame.split_off(0);
    Ok(Request {
        method,
        target,
        body,
    })
}

fn decode_response(frame: &mut Bytes) -> Result<Response, CodecError> {
    if frame.len() < 2 {
        return Err(CodecError::TruncatedPayload);
    }
    let status = frame.get_u16();
    let body = frame.split_off(0);
    Ok(Response { status, body })
}

impl Encoder<Message> for SerpCodec {
    type Error = CodecError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), CodecError> {
        let mut body_buf = BytesMut::new();

        if let Some(destinations) = &msg.destinations {
            body_buf.put_u16(destinations.len() as u16);
            for id in destinations {
                body_buf.put_u16(id.get());
            }
        }

        let kind = match &msg.body {
            Body::Request(req) => {
                body_buf.put_u8(req.method.as_u8());
                body_buf.put_u16(req.target.len() as u16);
                body_buf.put_slice(req.target.as_bytes());
                body_buf.put_slice(&req.body);
                Kind::Request
            },
            Body::Response(resp) => {
                body_buf.put_u16(resp.status);
                body_buf.put_slice(&resp.body);
                Kind::Response
            },
        };

        let length = u32::try_from(body_buf.len()).map_err(|_| {
            CodecError::MalformedHeader("encoded body exceeds u32::MAX".into())
        })?;
        if length > self.max_message_len {
            return Err(CodecError::MalformedHeader(format!(
                "length {length} exceeds cap {}",
                self.max_message_len
            )));
        }

        let mut hdr =
            RawSerpHeader::new(msg.source.get(), msg.destination.get(), kind, length, msg.correlation);
        if msg.destinations.is_some() {
            hdr.set_multi_send(true);
        }

        dst.reserve(HEADER_LEN + body_buf.len());
        let mut hdr_bytes = [0u8; HEADER_LEN];
        hdr.to_bytes(&mut hdr_bytes)
            .map_err(|e| CodecError::MalformedHeader(e.to_string()))?;
        dst.put_slice(&hdr_bytes);
        dst.put_slice(&body_buf);

        Ok(())
    }
}
