use bytes::BufMut;
use ethereum_types::{H160, H256};

use super::constants::{RLP_EMPTY_LIST, RLP_NULL};

/// Encodes a value to a fresh RLP buffer.
pub fn encode<T: RLPEncode>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.encode(&mut buf);
    buf
}

pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

/// Encodes a big-endian integer, dropping leading zero bytes. Zero encodes as
/// the empty string and single bytes below 0x80 encode as themselves.
fn encode_integer_be<const N: usize>(value_be: [u8; N], buf: &mut dyn BufMut) {
    let zeros = value_be.iter().take_while(|byte| **byte == 0).count();

    if zeros == N {
        buf.put_u8(RLP_NULL);
        return;
    }

    let payload = &value_be[zeros..];
    if payload.len() == 1 && payload[0] < RLP_NULL {
        buf.put_u8(payload[0]);
        return;
    }

    // integers never exceed 16 bytes here, so the short-string form suffices
    buf.put_u8(RLP_NULL + payload.len() as u8);
    buf.put_slice(payload);
}

impl RLPEncode for u8 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for u64 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for usize {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_integer_be(self.to_be_bytes(), buf);
    }
}

impl RLPEncode for [u8] {
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.len() == 1 && self[0] < RLP_NULL {
            buf.put_u8(self[0]);
        } else {
            encode_string_header(self.len(), buf);
            buf.put_slice(self);
        }
    }
}

impl RLPEncode for Vec<u8> {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_slice().encode(buf);
    }
}

// Addresses and hashes are fixed-width byte strings.
impl RLPEncode for H160 {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf);
    }
}

impl RLPEncode for H256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf);
    }
}

impl<T: RLPEncode + ?Sized> RLPEncode for &T {
    fn encode(&self, buf: &mut dyn BufMut) {
        (**self).encode(buf);
    }
}

/// Writes the header for a string payload of `payload_len` bytes.
pub fn encode_string_header(payload_len: usize, buf: &mut dyn BufMut) {
    encode_header(payload_len, RLP_NULL, buf);
}

/// Writes the header for a list whose items occupy `payload_len` bytes.
pub fn encode_list_header(payload_len: usize, buf: &mut dyn BufMut) {
    encode_header(payload_len, RLP_EMPTY_LIST, buf);
}

fn encode_header(payload_len: usize, short_offset: u8, buf: &mut dyn BufMut) {
    if payload_len < 56 {
        buf.put_u8(short_offset + payload_len as u8);
    } else {
        let len_be = payload_len.to_be_bytes();
        let zeros = len_be.iter().take_while(|byte| **byte == 0).count();
        buf.put_u8(short_offset + 55 + (len_be.len() - zeros) as u8);
        buf.put_slice(&len_be[zeros..]);
    }
}
