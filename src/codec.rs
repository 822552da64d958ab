//! The RFC 6455 §5 frame codec: pure functions over a byte input stream and a
//! byte output stream. No fragmentation policy, no control-frame dispatch,
//! no I/O-scheduling opinions live here — that belongs to the receive loop
//! (`crate::receive`) and the connection (`crate::connection`).

use crate::close_code::CloseCode;
use crate::error::Error;
use crate::frame::{Frame, OpCode, MAX_CONTROL_PAYLOAD};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads exactly one frame off `reader`, rejecting payload lengths above
/// `max_frame_size` before the payload buffer is allocated. The returned
/// payload is already unmasked. Unmasked client frames are tolerated, not
/// rejected — see the masking open question in the design notes.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_frame_size: usize,
) -> Result<Frame, Error> {
    let mut header = [0u8; 2];
    read_exact_checked(reader, &mut header).await?;

    // Bit 7 of byte 0: whether this frame is the final fragment of a message.
    let final_fragment = (header[0] & 0b1000_0000) != 0;
    // Bits 6-4 of byte 0: reserved, must be zero in the absence of negotiated extensions.
    let reserved_bits_set = (header[0] & 0b0111_0000) != 0;
    // Bits 3-0 of byte 0: the opcode.
    let opcode = OpCode::from_byte(header[0] & 0b0000_1111)?;

    if reserved_bits_set {
        return Err(Error::RsvNotZero);
    }

    if opcode.is_control() && !final_fragment {
        return Err(Error::ControlFrameFragmented);
    }

    // Bit 7 of byte 1: the mask bit. Bits 6-0: the 7-bit length field.
    let masked = (header[1] & 0b1000_0000) != 0;
    let mut length = (header[1] & 0b0111_1111) as u64;

    if opcode.is_control() && length > MAX_CONTROL_PAYLOAD as u64 {
        return Err(Error::ControlFramePayloadTooLarge);
    }

    if length == 126 {
        let mut extended = [0u8; 2];
        read_exact_checked(reader, &mut extended).await?;
        length = u16::from_be_bytes(extended) as u64;
    } else if length == 127 {
        let mut extended = [0u8; 8];
        read_exact_checked(reader, &mut extended).await?;
        length = u64::from_be_bytes(extended);
    }

    if length > max_frame_size as u64 {
        return Err(Error::MaxFrameSizeExceeded {
            actual: length as usize,
            limit: max_frame_size,
        });
    }

    let mask = if masked {
        let mut key = [0u8; 4];
        read_exact_checked(reader, &mut key).await?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; length as usize];
    read_exact_checked(reader, &mut payload).await?;

    if let Some(key) = mask {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= key[i % 4];
        }
    }

    Ok(Frame::new(final_fragment, opcode, payload))
}

async fn read_exact_checked<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), Error> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(source) if source.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(Error::ShortRead {
                expected: buf.len(),
                actual: 0,
            })
        }
        Err(source) => Err(source.into()),
    }
}

/// Writes one `FIN=1`, unmasked frame. Server-to-client frames are never
/// masked, per RFC 6455 §5.1.
async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    opcode: OpCode,
    payload: &[u8],
) -> Result<(), Error> {
    let first_byte = 0b1000_0000 | opcode.as_u8();
    writer.write_all(&[first_byte]).await?;

    let len = payload.len();
    if len < 126 {
        writer.write_all(&[len as u8]).await?;
    } else if len <= 0xFFFF {
        writer
            .write_all(&[126, (len >> 8) as u8, len as u8])
            .await?;
    } else {
        writer.write_all(&[127]).await?;
        writer.write_all(&(len as u64).to_be_bytes()).await?;
    }

    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn write_text<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<(), Error> {
    write_frame(writer, OpCode::Text, text.as_bytes()).await
}

pub async fn write_binary<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), Error> {
    write_frame(writer, OpCode::Binary, payload).await
}

pub async fn write_ping<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), Error> {
    write_frame(writer, OpCode::Ping, payload).await
}

pub async fn write_pong<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), Error> {
    write_frame(writer, OpCode::Pong, payload).await
}

/// Writes a `Close` frame carrying the 2-byte big-endian status code followed
/// by the UTF-8 reason. Fails with `CloseReasonTooLong` if the reason would
/// push the control payload past 125 bytes, and with `ReservedCloseCode` if
/// `code` is one of the locally-reserved codes (1005, 1006, 1015).
pub async fn write_close<W: AsyncWrite + Unpin>(
    writer: &mut W,
    code: CloseCode,
    reason: &str,
) -> Result<(), Error> {
    if code.is_reserved_local() {
        return Err(Error::ReservedCloseCode(code));
    }

    if reason.len() > MAX_CONTROL_PAYLOAD - 2 {
        return Err(Error::CloseReasonTooLong {
            actual: reason.len(),
        });
    }

    let mut payload = Vec::with_capacity(2 + reason.len());
    payload.extend_from_slice(&u16::from(code).to_be_bytes());
    payload.extend_from_slice(reason.as_bytes());

    write_frame(writer, OpCode::Close, &payload).await
}
