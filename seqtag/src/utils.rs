use std::io::{self, Read, Write};

use crate::errors::Result;

/// Reads a little-endian `u64`, returning `None` when the stream is already exhausted.
///
/// A stream that ends in the middle of the integer yields `UnexpectedEof`.
pub fn read_u64_or_eof<R>(mut rdr: R) -> io::Result<Option<u64>>
where
    R: Read,
{
    let mut buf = [0; 8];
    let mut filled = 0;
    while filled < buf.len() {
        match rdr.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Some(u64::from_le_bytes(buf)))
}

/// Reads the body of a string whose byte length has already been read.
pub fn read_string_body<R>(mut rdr: R, len: u64) -> Result<String>
where
    R: Read,
{
    let mut bytes = vec![0; usize::try_from(len)?];
    rdr.read_exact(&mut bytes)?;
    Ok(String::from_utf8(bytes)?)
}

/// Writes a string prefixed with its byte length.
pub fn write_string<W>(mut wtr: W, s: &str) -> Result<()>
where
    W: Write,
{
    write_u64(&mut wtr, u64::try_from(s.len())?)?;
    wtr.write_all(s.as_bytes())?;
    Ok(())
}

/// Reads a length-prefixed string, or `None` at a clean end of stream.
pub fn read_string_or_eof<R>(mut rdr: R) -> Result<Option<String>>
where
    R: Read,
{
    match read_u64_or_eof(&mut rdr)? {
        Some(len) => Ok(Some(read_string_body(rdr, len)?)),
        None => Ok(None),
    }
}

pub fn read_u64<R>(mut rdr: R) -> io::Result<u64>
where
    R: Read,
{
    let mut buf = [0; 8];
    rdr.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn write_u64<W>(mut wtr: W, x: u64) -> io::Result<()>
where
    W: Write,
{
    wtr.write_all(&x.to_le_bytes())
}
