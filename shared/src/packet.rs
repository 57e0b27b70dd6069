//! Positional wire codec.
//!
//! A [`Packet`] is an append-only byte buffer with a read cursor. All
//! primitives are fixed-width little-endian; strings carry a 4-byte length
//! prefix. There is no checksum and no outer framing: the transport delivers
//! whole messages atomically, so the length prefix is only needed for
//! variable-length fields inside a message.
//!
//! Field order is the wire contract. Writers and readers must agree on it;
//! there is no versioning byte and no migration path.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::math::Vec3;
use crate::orbit::OrbitPosition;

/// Errors that can occur while decoding a packet
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Out of data: need {needed} more bytes, have {available}")]
    OutOfData { needed: usize, available: usize },

    #[error("Unknown command tag: {0:#04x}")]
    UnknownCommandTag(u8),

    #[error("Unknown drone kind: {0:#04x}")]
    UnknownDroneKind(u8),

    #[error("Unknown motion state: {0:#04x}")]
    UnknownMotionState(u8),

    #[error("Invalid boolean encoding: {0:#04x}")]
    InvalidBool(u8),

    #[error("Non-finite vector component")]
    NonFiniteVector,

    #[error("Command arrived with its initialized flag cleared")]
    UninitializedCommand,

    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Append-only byte buffer with a positional read cursor.
#[derive(Debug, Default, Clone)]
pub struct Packet {
    buf: BytesMut,
    read_pos: usize,
}

impl Packet {
    /// Create an empty packet for writing.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
            read_pos: 0,
        }
    }

    /// Wrap received bytes for reading.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(data),
            read_pos: 0,
        }
    }

    /// Total number of bytes in the packet.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes not yet consumed by the read cursor.
    pub fn unread(&self) -> usize {
        self.buf.len() - self.read_pos
    }

    /// Freeze the packet into an immutable byte buffer for sending.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    fn ensure(&self, needed: usize) -> Result<(), CodecError> {
        let available = self.unread();
        if available < needed {
            Err(CodecError::OutOfData { needed, available })
        } else {
            Ok(())
        }
    }

    fn take(&mut self, width: usize) -> Result<&[u8], CodecError> {
        self.ensure(width)?;
        let start = self.read_pos;
        self.read_pos += width;
        Ok(&self.buf[start..start + width])
    }

    // --- primitive writes (chainable) ---

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32_le(value);
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64_le(value);
        self
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.buf.put_f32_le(value);
        self
    }

    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.buf.put_f64_le(value);
        self
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.buf.put_u8(u8::from(value));
        self
    }

    pub fn write_str(&mut self, value: &str) -> &mut Self {
        self.buf.put_i32_le(value.len() as i32);
        self.buf.put_slice(value.as_bytes());
        self
    }

    // --- primitive reads ---

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_f64(&mut self) -> Result<f64, CodecError> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_str(&mut self) -> Result<String, CodecError> {
        let len = self.read_i32()?.max(0) as usize;
        let bytes = self.take(len)?.to_vec();
        Ok(String::from_utf8(bytes)?)
    }

    // --- domain-value helpers ---

    pub fn write_vec3(&mut self, v: Vec3) -> &mut Self {
        self.write_f64(v.x).write_f64(v.y).write_f64(v.z)
    }

    /// NaN or infinite components would poison every downstream distance
    /// and angle computation, so they are rejected at the wire boundary.
    pub fn read_vec3(&mut self) -> Result<Vec3, CodecError> {
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        let z = self.read_f64()?;
        let v = Vec3::new(x, y, z);
        if !v.is_finite() {
            return Err(CodecError::NonFiniteVector);
        }
        Ok(v)
    }

    /// Orbit position wire layout: origin, direction, radius.
    pub fn write_orbit(&mut self, position: &OrbitPosition) -> &mut Self {
        self.write_vec3(position.origin)
            .write_vec3(position.direction)
            .write_i32(position.radius)
    }

    pub fn read_orbit(&mut self) -> Result<OrbitPosition, CodecError> {
        let origin = self.read_vec3()?;
        let direction = self.read_vec3()?;
        let radius = self.read_i32()?;
        Ok(OrbitPosition {
            origin,
            direction,
            radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_roundtrip() {
        let mut p = Packet::new();
        p.write_u8(0xAB)
            .write_u16(0xBEEF)
            .write_i32(-1234)
            .write_u64(u64::MAX)
            .write_f32(1.5)
            .write_f64(-0.25)
            .write_bool(true)
            .write_str("drone");

        let mut r = Packet::from_bytes(&p.clone().into_bytes());
        assert_eq!(r.read_u8().unwrap(), 0xAB);
        assert_eq!(r.read_u16().unwrap(), 0xBEEF);
        assert_eq!(r.read_i32().unwrap(), -1234);
        assert_eq!(r.read_u64().unwrap(), u64::MAX);
        assert_eq!(r.read_f32().unwrap(), 1.5);
        assert_eq!(r.read_f64().unwrap(), -0.25);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_str().unwrap(), "drone");
        assert_eq!(r.unread(), 0);
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut p = Packet::new();
        p.write_u16(7);

        let mut r = Packet::from_bytes(&p.into_bytes());
        r.read_u8().unwrap();
        let err = r.read_u64().unwrap_err();
        assert!(matches!(
            err,
            CodecError::OutOfData {
                needed: 8,
                available: 1
            }
        ));
    }

    #[test]
    fn test_empty_packet_read_fails() {
        let mut r = Packet::from_bytes(&[]);
        assert!(matches!(r.read_u8(), Err(CodecError::OutOfData { .. })));
    }

    #[test]
    fn test_vec3_roundtrip_preserves_field_order() {
        let mut p = Packet::new();
        p.write_vec3(Vec3::new(1.0, 2.0, 3.0));

        // x must come first on the wire
        let bytes = p.clone().into_bytes();
        assert_eq!(f64::from_le_bytes(bytes[0..8].try_into().unwrap()), 1.0);

        let mut r = Packet::from_bytes(&bytes);
        assert_eq!(r.read_vec3().unwrap(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_orbit_roundtrip() {
        let orbit = OrbitPosition {
            origin: Vec3::new(10.0, -20.0, 30.0),
            direction: Vec3::new(0.0, 1.0, 0.0),
            radius: 100,
        };
        let mut p = Packet::new();
        p.write_orbit(&orbit);
        assert_eq!(p.len(), 6 * 8 + 4);

        let mut r = Packet::from_bytes(&p.into_bytes());
        assert_eq!(r.read_orbit().unwrap(), orbit);
    }

    #[test]
    fn test_truncated_orbit_fails() {
        let orbit = OrbitPosition {
            origin: Vec3::ZERO,
            direction: Vec3::new(1.0, 0.0, 0.0),
            radius: 0,
        };
        let mut p = Packet::new();
        p.write_orbit(&orbit);
        let bytes = p.into_bytes();

        let mut r = Packet::from_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(r.read_orbit(), Err(CodecError::OutOfData { .. })));
    }

    #[test]
    fn test_non_finite_vector_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut p = Packet::new();
            p.write_vec3(Vec3::new(1.0, bad, 0.0));
            let mut r = Packet::from_bytes(&p.into_bytes());
            assert!(matches!(r.read_vec3(), Err(CodecError::NonFiniteVector)));
        }
    }

    #[test]
    fn test_orbit_with_non_finite_origin_rejected() {
        let mut p = Packet::new();
        p.write_orbit(&OrbitPosition {
            origin: Vec3::new(f64::NAN, 0.0, 0.0),
            direction: Vec3::new(0.0, 1.0, 0.0),
            radius: 100,
        });
        let mut r = Packet::from_bytes(&p.into_bytes());
        assert!(matches!(r.read_orbit(), Err(CodecError::NonFiniteVector)));
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let mut r = Packet::from_bytes(&[2]);
        assert!(matches!(r.read_bool(), Err(CodecError::InvalidBool(2))));
    }
}
