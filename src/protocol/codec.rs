//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! Requests are assembled into a buffer and written in one piece; responses
//! are decoded incrementally off the connection's input stream (status byte,
//! then the command-specific body, then - for write commands - the trailing
//! invalidation list).

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{HostlinkError, Result};

use super::{CommandId, InvalidateList, Param, ProtocolVersion, Status, TableId};

/// Maximum byte length of a bounded string parameter (16-bit length space)
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Maximum length of an unbounded string or raw byte block (16 MB)
pub const MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// Terminator closing an invalidation list on the wire
const INVALIDATE_LIST_END: i32 = -1;

// =============================================================================
// Compressed Integers
// =============================================================================

/// Write a compressed integer (ZigZag + LEB128)
///
/// Small magnitudes of either sign occupy a single byte; `-1` encodes as 0x01.
pub fn write_compressed_int(out: &mut BytesMut, value: i32) {
    // ZigZag: interleave signs so small negatives stay small
    let mut zigzag = ((value as u32) << 1) ^ ((value >> 31) as u32);
    loop {
        let byte = (zigzag & 0x7f) as u8;
        zigzag >>= 7;
        if zigzag == 0 {
            out.put_u8(byte);
            return;
        }
        out.put_u8(byte | 0x80);
    }
}

/// Read a compressed integer from a stream
///
/// A 32-bit value needs at most 5 LEB128 bytes; anything longer is malformed.
pub fn read_compressed_int<R: Read + ?Sized>(reader: &mut R) -> Result<i32> {
    let mut zigzag: u32 = 0;
    let mut shift = 0u32;
    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        let b = byte[0];

        if shift == 28 && (b & 0x70) != 0 {
            return Err(HostlinkError::Protocol(
                "Compressed integer overflows 32 bits".to_string(),
            ));
        }
        zigzag |= ((b & 0x7f) as u32) << shift;

        if b & 0x80 == 0 {
            // Undo the ZigZag mapping
            return Ok(((zigzag >> 1) as i32) ^ -((zigzag & 1) as i32));
        }

        shift += 7;
        if shift > 28 {
            return Err(HostlinkError::Protocol(
                "Compressed integer longer than 5 bytes".to_string(),
            ));
        }
    }
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a request frame: compressed-int command ID, then each parameter
/// back-to-back in its canonical per-variant encoding
pub fn encode_request(
    command_id: CommandId,
    params: &[Param],
    version: ProtocolVersion,
) -> Result<BytesMut> {
    let mut out = BytesMut::with_capacity(16);
    write_compressed_int(&mut out, command_id.0 as i32);

    for param in params {
        match param {
            Param::Int(v) => write_compressed_int(&mut out, *v),
            Param::Long(v) => out.put_i64(*v),
            Param::Short(v) => out.put_i16(*v),
            Param::Bool(v) => out.put_u8(u8::from(*v)),
            Param::Float(v) => out.put_u32(v.to_bits()),
            Param::Str(s) => {
                if s.len() > MAX_STRING_LEN {
                    return Err(HostlinkError::Encoding(format!(
                        "Bounded string of {} bytes exceeds {} byte limit (use a long string)",
                        s.len(),
                        MAX_STRING_LEN
                    )));
                }
                write_compressed_int(&mut out, s.len() as i32);
                out.put_slice(s.as_bytes());
            }
            Param::LongStr(s) => {
                check_block_len(s.len(), "long string")?;
                write_compressed_int(&mut out, s.len() as i32);
                out.put_slice(s.as_bytes());
            }
            Param::Bytes(b) => {
                check_block_len(b.len(), "byte block")?;
                write_compressed_int(&mut out, b.len() as i32);
                out.put_slice(b);
            }
            Param::Composite(c) => c.write_wire(version, &mut out)?,
        }
    }

    Ok(out)
}

/// Every frame the encoder accepts must also pass the read-side limits
fn check_block_len(len: usize, what: &str) -> Result<()> {
    if len > MAX_BLOCK_SIZE {
        return Err(HostlinkError::Encoding(format!(
            "{} of {} bytes exceeds {} byte limit",
            what, len, MAX_BLOCK_SIZE
        )));
    }
    Ok(())
}

/// Encode and write a request to a stream, flushing when done
pub fn write_request<W: Write + ?Sized>(
    writer: &mut W,
    command_id: CommandId,
    params: &[Param],
    version: ProtocolVersion,
) -> Result<()> {
    let frame = encode_request(command_id, params, version)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Read the one-byte response status
///
/// An unrecognized status byte is a protocol error: it indicates a version
/// mismatch or a server defect, and is never retried.
pub fn read_status<R: Read + ?Sized>(reader: &mut R) -> Result<Status> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    match byte[0] {
        0x00 => Ok(Status::Done),
        0x01 => Ok(Status::Error),
        other => Err(HostlinkError::Protocol(format!(
            "Unknown response status: 0x{:02x}",
            other
        ))),
    }
}

/// Decode the shared structured-error payload following a [`Status::Error`]
///
/// Returns the server-reported failure as an error value; if the payload
/// itself cannot be read, the transport or framing failure takes its place.
pub fn read_server_error<R: Read + ?Sized>(reader: &mut R) -> HostlinkError {
    fn payload<R: Read + ?Sized>(reader: &mut R) -> Result<(i32, String)> {
        let code = read_compressed_int(reader)?;
        let message = read_string(reader)?;
        Ok((code, message))
    }

    match payload(reader) {
        Ok((code, message)) => HostlinkError::Application { code, message },
        Err(e) => e,
    }
}

/// Read a status byte and fail unless the command completed
///
/// Routes [`Status::Error`] through the shared error decoder.
pub fn read_done<R: Read + ?Sized>(reader: &mut R) -> Result<()> {
    match read_status(reader)? {
        Status::Done => Ok(()),
        Status::Error => Err(read_server_error(reader)),
    }
}

/// Read an invalidation list: compressed-int table IDs until the terminator
///
/// Returns an empty list if the terminator appears immediately. Order and
/// duplicates are preserved exactly as sent.
pub fn read_invalidate_list<R: Read + ?Sized>(reader: &mut R) -> Result<InvalidateList> {
    let mut ids = Vec::new();
    loop {
        let raw = read_compressed_int(reader)?;
        if raw == INVALIDATE_LIST_END {
            return Ok(InvalidateList(ids));
        }
        if raw < 0 || raw > u16::MAX as i32 {
            return Err(HostlinkError::Protocol(format!(
                "Invalid table ID in invalidation list: {}",
                raw
            )));
        }
        ids.push(TableId(raw as u16));
    }
}

// =============================================================================
// Scalar Read Helpers
// =============================================================================

/// Read an 8-byte big-endian long
pub fn read_long<R: Read + ?Sized>(reader: &mut R) -> Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_be_bytes(buf))
}

/// Read a 2-byte big-endian short
pub fn read_short<R: Read + ?Sized>(reader: &mut R) -> Result<i16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(i16::from_be_bytes(buf))
}

/// Read a boolean byte (0x00 or 0x01)
pub fn read_bool<R: Read + ?Sized>(reader: &mut R) -> Result<bool> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    match buf[0] {
        0x00 => Ok(false),
        0x01 => Ok(true),
        other => Err(HostlinkError::Protocol(format!(
            "Invalid boolean byte: 0x{:02x}",
            other
        ))),
    }
}

/// Read a 4-byte big-endian IEEE-754 float
pub fn read_float<R: Read + ?Sized>(reader: &mut R) -> Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_bits(u32::from_be_bytes(buf)))
}

/// Read a bounded string (compressed-int length + UTF-8)
pub fn read_string<R: Read + ?Sized>(reader: &mut R) -> Result<String> {
    read_utf8(reader, MAX_STRING_LEN)
}

/// Read an unbounded string (compressed-int length + UTF-8)
pub fn read_long_string<R: Read + ?Sized>(reader: &mut R) -> Result<String> {
    read_utf8(reader, MAX_BLOCK_SIZE)
}

/// Read a raw byte block (compressed-int length + bytes)
pub fn read_bytes<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_block_len(reader, MAX_BLOCK_SIZE)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_utf8<R: Read + ?Sized>(reader: &mut R, max: usize) -> Result<String> {
    let len = read_block_len(reader, max)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| HostlinkError::Protocol(format!("Invalid UTF-8 in string: {}", e)))
}

fn read_block_len<R: Read + ?Sized>(reader: &mut R, max: usize) -> Result<usize> {
    let len = read_compressed_int(reader)?;
    if len < 0 {
        return Err(HostlinkError::Protocol(format!(
            "Negative block length: {}",
            len
        )));
    }
    let len = len as usize;
    if len > max {
        return Err(HostlinkError::Protocol(format!(
            "Block too large: {} bytes (max {})",
            len, max
        )));
    }
    Ok(len)
}
