//! RESP encode/decode. This module knows nothing about pipelining or reply
//! ordering -- it only turns a [`Cmd`] into request bytes and turns the next
//! reply on a byte stream into a typed value. Everything here operates one
//! frame at a time; sequencing frames into the right order is [`crate::queue`]
//! and [`crate::connection`]'s job.

use std::io::{BufRead, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Error, Result};

/// Anything that can be rendered as a single binary-safe RESP bulk argument.
///
/// This is the "mechanical mapping from typed args to RESP request frames"
/// the design treats as a given -- implementations just need to produce the
/// raw bytes that go between `$<len>\r\n` and `\r\n`.
pub trait ToArg {
    fn to_arg(&self) -> Bytes;
}

macro_rules! impl_to_arg_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Bytes {
                    Bytes::from(self.to_string().into_bytes())
                }
            }
        )*
    };
}

impl_to_arg_display!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ToArg for str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for &str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

/// A RESP request under construction: a command name plus zero or more
/// binary-safe arguments, built with the same `.arg()` chaining redis client
/// libraries commonly use.
#[derive(Debug, Clone)]
pub struct Cmd {
    name: &'static str,
    args: Vec<Bytes>,
}

impl Cmd {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, a: impl ToArg) -> Self {
        self.args.push(a.to_arg());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Appends the unified multi-bulk encoding of `cmd` to `out`.
///
/// `*<n+1>\r\n$<len(name)>\r\n<name>\r\n` followed by
/// `$<len(arg)>\r\n<arg>\r\n` for each argument. No escaping: argument bytes
/// are written verbatim, which is what makes RESP binary-safe.
pub(crate) fn encode_request(cmd: &Cmd, out: &mut BytesMut) {
    out.put_u8(b'*');
    write_decimal(out, (cmd.args.len() + 1) as i64);
    out.put_slice(b"\r\n");
    write_bulk_arg(out, cmd.name.as_bytes());
    for arg in &cmd.args {
        write_bulk_arg(out, arg);
    }
}

fn write_bulk_arg(out: &mut BytesMut, arg: &[u8]) {
    out.put_u8(b'$');
    write_decimal(out, arg.len() as i64);
    out.put_slice(b"\r\n");
    out.put_slice(arg);
    out.put_slice(b"\r\n");
}

fn write_decimal(out: &mut BytesMut, n: i64) {
    let mut buf = itoa_buf();
    let s = format_decimal(n, &mut buf);
    out.put_slice(s.as_bytes());
}

/// Small stack buffer big enough for any i64 in decimal, with sign.
fn itoa_buf() -> [u8; 20] {
    [0u8; 20]
}

fn format_decimal(n: i64, buf: &mut [u8; 20]) -> &str {
    use std::io::Write;
    let mut cursor: &mut [u8] = buf;
    write!(cursor, "{n}").expect("20 bytes always fits an i64");
    let written = 20 - cursor.len();
    std::str::from_utf8(&buf[..written]).expect("decimal digits are ascii")
}

/// Reads one CRLF-terminated line, tolerating leading whitespace before the
/// payload (legacy stream-extraction leniency the original client relied on)
/// but nothing else.
fn read_line(r: &mut impl BufRead) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    r.read_until(b'\n', &mut line)?;
    if line.last() != Some(&b'\n') {
        return Err(Error::Protocol("connection closed mid-reply".into()));
    }
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(line)
}

fn read_prefixed_line(r: &mut impl BufRead, expect: u8) -> Result<Vec<u8>> {
    let mut prefix = [0u8; 1];
    r.read_exact(&mut prefix)?;
    let line = read_line(r)?;
    if prefix[0] == b'-' {
        return Err(Error::Server(String::from_utf8_lossy(&line).into_owned()));
    }
    if prefix[0] != expect {
        return Err(Error::Protocol(format!(
            "expected reply kind '{}', got '{}'",
            expect as char, prefix[0] as char
        )));
    }
    Ok(line)
}

/// Reads a `+` simple status reply, returning its text. A `-` error reply is
/// surfaced as [`Error::Server`] regardless of which reader was called.
pub(crate) fn read_status(r: &mut impl BufRead) -> Result<String> {
    let line = read_prefixed_line(r, b'+')?;
    Ok(String::from_utf8_lossy(&line).into_owned())
}

/// Reads a `:` integer reply.
pub(crate) fn read_integer(r: &mut impl BufRead) -> Result<i64> {
    let line = read_prefixed_line(r, b':')?;
    parse_decimal(&line)
}

/// Reads a `$` bulk reply. `$-1` decodes to `None`.
pub(crate) fn read_bulk(r: &mut impl BufRead) -> Result<Option<Bytes>> {
    let line = read_prefixed_line(r, b'$')?;
    let len = parse_decimal(&line)?;
    if len < 0 {
        return Ok(None);
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    let mut crlf = [0u8; 2];
    r.read_exact(&mut crlf)?;
    Ok(Some(Bytes::from(buf)))
}

/// Reads a `*` multi-bulk header, returning the element count. `*-1` decodes
/// to `None` (a null array, e.g. a timed-out `BLPOP`).
pub(crate) fn read_multibulk_header(r: &mut impl BufRead) -> Result<Option<i64>> {
    let line = read_prefixed_line(r, b'*')?;
    let count = parse_decimal(&line)?;
    if count < 0 {
        return Ok(None);
    }
    Ok(Some(count))
}

/// Parses a decimal integer, tolerating leading ASCII whitespace.
fn parse_decimal(line: &[u8]) -> Result<i64> {
    let text = std::str::from_utf8(line)?;
    let trimmed = text.trim_start();
    trimmed
        .parse::<i64>()
        .map_err(|_| Error::Protocol(format!("malformed integer field: {text:?}")))
}

/// A reply decoded without committing to a target Rust type, used to drain
/// or inspect a reply generically: skipping a predecessor's slot, or walking
/// an `EXEC` array whose elements can be any reply kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RespValue {
    Status(String),
    Integer(i64),
    Bulk(Option<Bytes>),
    Array(Option<Vec<RespValue>>),
}

/// Reads exactly one reply of any kind, recursing into nested arrays.
pub(crate) fn read_value(r: &mut impl BufRead) -> Result<RespValue> {
    let mut prefix = [0u8; 1];
    r.read_exact(&mut prefix)?;
    let line = read_line(r)?;
    match prefix[0] {
        b'+' => Ok(RespValue::Status(String::from_utf8_lossy(&line).into_owned())),
        b'-' => Err(Error::Server(String::from_utf8_lossy(&line).into_owned())),
        b':' => Ok(RespValue::Integer(parse_decimal(&line)?)),
        b'$' => {
            let len = parse_decimal(&line)?;
            if len < 0 {
                return Ok(RespValue::Bulk(None));
            }
            let mut buf = vec![0u8; len as usize];
            r.read_exact(&mut buf)?;
            let mut crlf = [0u8; 2];
            r.read_exact(&mut crlf)?;
            Ok(RespValue::Bulk(Some(Bytes::from(buf))))
        }
        b'*' => {
            let count = parse_decimal(&line)?;
            if count < 0 {
                return Ok(RespValue::Array(None));
            }
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                items.push(read_value(r)?);
            }
            Ok(RespValue::Array(Some(items)))
        }
        other => Err(Error::Protocol(format!(
            "unrecognized reply prefix '{}'",
            other as char
        ))),
    }
}

/// Reads and discards exactly one reply, whatever kind it turns out to be.
pub(crate) fn skip_reply(r: &mut impl BufRead) -> Result<()> {
    read_value(r).map(|_| ())
}

/// Converts an already-decoded array reply into bulk-string elements, the
/// shape every `MultiBulk`-kind command (`LRANGE`, `KEYS`, `SMEMBERS`, ...)
/// and an `EXEC` array element both resolve to.
pub(crate) fn value_into_bulk_array(value: RespValue) -> Result<Vec<Option<Bytes>>> {
    match value {
        RespValue::Array(Some(items)) => items
            .into_iter()
            .map(|item| match item {
                RespValue::Bulk(b) => Ok(b),
                other => Err(Error::Protocol(format!(
                    "expected bulk string element, got {other:?}"
                ))),
            })
            .collect(),
        RespValue::Array(None) => Ok(Vec::new()),
        other => Err(Error::Protocol(format!("expected array reply, got {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn encodes_set_command() {
        let cmd = Cmd::new("SET").arg("hello").arg("world");
        let mut out = BytesMut::new();
        encode_request(&cmd, &mut out);
        assert_eq!(
            &out[..],
            b"*3\r\n$3\r\nSET\r\n$5\r\nhello\r\n$5\r\nworld\r\n"
        );
    }

    #[test]
    fn encodes_integer_argument() {
        let cmd = Cmd::new("EXPIRE").arg("k").arg(30i64);
        let mut out = BytesMut::new();
        encode_request(&cmd, &mut out);
        assert_eq!(&out[..], b"*3\r\n$6\r\nEXPIRE\r\n$1\r\nk\r\n$2\r\n30\r\n");
    }

    #[test]
    fn reads_status() {
        let mut r = Cursor::new(b"+OK\r\n".to_vec());
        assert_eq!(read_status(&mut r).unwrap(), "OK");
    }

    #[test]
    fn reads_error_as_server_error() {
        let mut r = Cursor::new(b"-ERR wrong type\r\n".to_vec());
        let err = read_status(&mut r).unwrap_err();
        assert!(matches!(err, Error::Server(msg) if msg == "ERR wrong type"));
    }

    #[test]
    fn reads_integer() {
        let mut r = Cursor::new(b":1000\r\n".to_vec());
        assert_eq!(read_integer(&mut r).unwrap(), 1000);
    }

    #[test]
    fn reads_bulk_and_null_bulk() {
        let mut r = Cursor::new(b"$5\r\nworld\r\n".to_vec());
        assert_eq!(read_bulk(&mut r).unwrap().as_deref(), Some(&b"world"[..]));

        let mut r = Cursor::new(b"$-1\r\n".to_vec());
        assert_eq!(read_bulk(&mut r).unwrap(), None);
    }

    #[test]
    fn reads_multibulk_header_and_null_array() {
        let mut r = Cursor::new(b"*2\r\n".to_vec());
        assert_eq!(read_multibulk_header(&mut r).unwrap(), Some(2));

        let mut r = Cursor::new(b"*-1\r\n".to_vec());
        assert_eq!(read_multibulk_header(&mut r).unwrap(), None);
    }

    #[test]
    fn tolerates_leading_whitespace_in_numeric_fields() {
        let mut r = Cursor::new(b": 42\r\n".to_vec());
        assert_eq!(read_integer(&mut r).unwrap(), 42);
    }

    #[test]
    fn rejects_wrong_kind_prefix() {
        let mut r = Cursor::new(b":42\r\n".to_vec());
        assert!(read_bulk(&mut r).is_err());
    }

    #[test]
    fn read_value_recurses_into_nested_arrays() {
        let mut r = Cursor::new(b"*2\r\n:1\r\n*2\r\n$1\r\na\r\n$-1\r\n".to_vec());
        let v = read_value(&mut r).unwrap();
        assert_eq!(
            v,
            RespValue::Array(Some(vec![
                RespValue::Integer(1),
                RespValue::Array(Some(vec![
                    RespValue::Bulk(Some(Bytes::from_static(b"a"))),
                    RespValue::Bulk(None),
                ])),
            ]))
        );
    }

    #[test]
    fn skip_reply_consumes_a_whole_array_without_decoding_it() {
        let mut r = Cursor::new(b"*3\r\n:1\r\n:2\r\n:3\r\n+OK\r\n".to_vec());
        skip_reply(&mut r).unwrap();
        assert_eq!(read_status(&mut r).unwrap(), "OK");
    }
}
