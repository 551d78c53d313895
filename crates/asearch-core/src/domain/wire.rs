//! Wire encoding primitives shared by the request envelopes.
//!
//! All integers are big-endian. Optional values are written as a presence
//! byte (0/1) followed by the value when present.
//!
//! 後方互換: バッファが optional フィールドの手前で終わっていれば「なし」として読む。
//! 前方互換: 既知フィールドの後ろに残るバイトは読み捨てる。

use thiserror::Error;

use super::time_value::{TimeUnit, TimeValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    #[error("invalid presence flag: 0x{0:02x}")]
    InvalidPresenceFlag(u8),

    #[error("unknown time unit tag: 0x{0:02x}")]
    UnknownTimeUnit(u8),

    #[error("string field is not valid UTF-8")]
    InvalidUtf8,

    #[error("string field too long: {0} bytes")]
    StringTooLong(usize),
}

/// Writer appending to a byte buffer.
pub struct StreamWriter<'a> {
    buf: &'a mut Vec<u8>,
}

impl<'a> StreamWriter<'a> {
    pub fn new(buf: &'a mut Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_bool(&mut self, v: bool) {
        self.put_u8(u8::from(v));
    }

    /// u32 length prefix + UTF-8 bytes.
    pub fn put_string(&mut self, s: &str) -> Result<(), WireError> {
        let len = u32::try_from(s.len()).map_err(|_| WireError::StringTooLong(s.len()))?;
        self.put_u32(len);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    pub fn put_time_value(&mut self, tv: TimeValue) {
        self.put_i64(tv.duration());
        self.put_u8(tv.unit().tag());
    }

    pub fn put_optional_time_value(&mut self, tv: Option<TimeValue>) {
        match tv {
            Some(tv) => {
                self.put_bool(true);
                self.put_time_value(tv);
            }
            None => self.put_bool(false),
        }
    }
}

/// Cursor over an encoded buffer.
pub struct StreamReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> StreamReader<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < n {
            return Err(WireError::BufferTooSmall {
                need: n,
                have: self.remaining(),
            });
        }
        let bytes = &self.buf[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut arr = [0u8; N];
        arr.copy_from_slice(self.take(N)?);
        Ok(arr)
    }

    pub fn take_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn take_u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn take_i64(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn take_bool(&mut self) -> Result<bool, WireError> {
        match self.take_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidPresenceFlag(other)),
        }
    }

    pub fn take_string(&mut self) -> Result<String, WireError> {
        let len = self.take_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
    }

    pub fn take_time_value(&mut self) -> Result<TimeValue, WireError> {
        let duration = self.take_i64()?;
        let tag = self.take_u8()?;
        let unit = TimeUnit::from_tag(tag).ok_or(WireError::UnknownTimeUnit(tag))?;
        Ok(TimeValue::new(duration, unit))
    }

    /// A missing presence byte (end of buffer) reads as absent.
    pub fn take_optional_time_value(&mut self) -> Result<Option<TimeValue>, WireError> {
        if self.is_exhausted() {
            return Ok(None);
        }
        if self.take_bool()? {
            Ok(Some(self.take_time_value()?))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_absent_is_single_byte() {
        let mut buf = Vec::new();
        StreamWriter::new(&mut buf).put_optional_time_value(None);
        assert_eq!(buf, vec![0]);
    }

    #[test]
    fn optional_present_is_flag_value_tag() {
        let mut buf = Vec::new();
        StreamWriter::new(&mut buf).put_optional_time_value(Some(TimeValue::from_secs(5)));
        assert_eq!(buf, vec![1, 0, 0, 0, 0, 0, 0, 0, 5, TimeUnit::Seconds.tag()]);
    }

    #[test]
    fn negative_values_survive() {
        let mut buf = Vec::new();
        StreamWriter::new(&mut buf).put_time_value(TimeValue::MINUS_ONE);
        let tv = StreamReader::new(&buf).take_time_value().unwrap();
        assert_eq!(tv, TimeValue::MINUS_ONE);
    }

    #[test]
    fn exhausted_buffer_reads_optional_as_absent() {
        let mut reader = StreamReader::new(&[]);
        assert_eq!(reader.take_optional_time_value().unwrap(), None);
    }

    #[test]
    fn truncated_value_is_an_error() {
        let mut reader = StreamReader::new(&[1, 0, 0]);
        assert!(matches!(
            reader.take_optional_time_value(),
            Err(WireError::BufferTooSmall { need: 8, have: 2 })
        ));
    }

    #[test]
    fn rejects_bad_flag_and_unit() {
        assert_eq!(
            StreamReader::new(&[7]).take_optional_time_value(),
            Err(WireError::InvalidPresenceFlag(7))
        );
        let mut buf = Vec::new();
        let mut w = StreamWriter::new(&mut buf);
        w.put_i64(1);
        w.put_u8(42);
        assert_eq!(
            StreamReader::new(&buf).take_time_value(),
            Err(WireError::UnknownTimeUnit(42))
        );
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut buf = Vec::new();
        StreamWriter::new(&mut buf).put_string("héllo").unwrap();
        assert_eq!(&buf[..4], &6u32.to_be_bytes());
        let mut reader = StreamReader::new(&buf);
        assert_eq!(reader.take_string().unwrap(), "héllo");
        assert!(reader.is_exhausted());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let buf = [0, 0, 0, 2, 0xff, 0xfe];
        assert_eq!(StreamReader::new(&buf).take_string(), Err(WireError::InvalidUtf8));
    }
}
