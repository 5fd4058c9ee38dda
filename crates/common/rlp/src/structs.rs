use bytes::BufMut;

use super::{
    decode::{decode_rlp_item, RLPDecode},
    encode::{encode_list_header, RLPEncode},
    error::RLPDecodeError,
};

/// # Struct encoding helper
///
/// Encodes a sequence of fields as an RLP list. Fields are buffered so the
/// list header can be written once their total length is known.
///
/// ```
/// # use ember_rlp::structs::Encoder;
/// let mut buf = Vec::new();
/// Encoder::new(&mut buf)
///     .encode_field(&17u64)
///     .encode_field(&0u64)
///     .finish();
/// assert_eq!(buf, [0xc2, 0x11, 0x80]);
/// ```
#[must_use = "`Encoder` must be consumed with `finish` to write the list"]
pub struct Encoder<'a> {
    buf: &'a mut dyn BufMut,
    payload: Vec<u8>,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut dyn BufMut) -> Self {
        Self {
            buf,
            payload: Vec::new(),
        }
    }

    pub fn encode_field<T: RLPEncode + ?Sized>(mut self, value: &T) -> Self {
        value.encode(&mut self.payload);
        self
    }

    /// Writes the list header followed by the buffered fields.
    pub fn finish(self) {
        encode_list_header(self.payload.len(), self.buf);
        self.buf.put_slice(&self.payload);
    }
}

/// # Struct decoding helper
///
/// Walks the fields of an RLP list in order. [`finish`](Decoder::finish)
/// fails if any payload bytes are left over, so truncated or oversized
/// encodings cannot pass silently.
#[derive(Debug)]
#[must_use = "`Decoder` must be consumed with `finish` to perform decoding checks"]
pub struct Decoder<'a> {
    payload: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, RLPDecodeError> {
        match decode_rlp_item(buf)? {
            (true, payload, remaining) => Ok(Self { payload, remaining }),
            (false, _, _) => Err(RLPDecodeError::UnexpectedString),
        }
    }

    pub fn decode_field<T: RLPDecode>(self) -> Result<(T, Self), RLPDecodeError> {
        let (field, rest) = T::decode_unfinished(self.payload)?;
        Ok((
            field,
            Self {
                payload: rest,
                ..self
            },
        ))
    }

    /// Returns the bytes after the list, failing if fields remain undecoded.
    pub fn finish(self) -> Result<&'a [u8], RLPDecodeError> {
        if self.payload.is_empty() {
            Ok(self.remaining)
        } else {
            Err(RLPDecodeError::MalformedData)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::H160;
    use hex_literal::hex;

    fn roundtrip_pair(sender: H160, nonce: u64) {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&sender)
            .encode_field(&nonce)
            .finish();

        let decoder = Decoder::new(&buf).unwrap();
        let (decoded_sender, decoder) = decoder.decode_field::<H160>().unwrap();
        let (decoded_nonce, decoder) = decoder.decode_field::<u64>().unwrap();
        assert!(decoder.finish().unwrap().is_empty());

        assert_eq!(decoded_sender, sender);
        assert_eq!(decoded_nonce, nonce);
    }

    #[test]
    fn sender_nonce_roundtrip() {
        let sender = H160::from_slice(&hex!("6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0"));
        // covers the single-byte, 0x80 boundary and length-prefixed nonce forms
        for nonce in [0, 1, 0x7f, 0x80, 0xff, 0x100, u64::MAX] {
            roundtrip_pair(sender, nonce);
        }
    }

    #[test]
    fn zero_nonce_uses_empty_string_form() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&H160::zero())
            .encode_field(&0u64)
            .finish();
        // 0xd6 list header, 0x94 + 20 address bytes, 0x80 for the nonce
        assert_eq!(buf.len(), 23);
        assert_eq!(buf[0], 0xd6);
        assert_eq!(buf[1], 0x94);
        assert_eq!(buf[22], 0x80);
    }

    #[test]
    fn short_nonce_encodes_as_itself() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&H160::zero())
            .encode_field(&0x7fu64)
            .finish();
        assert_eq!(buf[22], 0x7f);
    }

    #[test]
    fn truncated_list_is_rejected() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&H160::zero())
            .encode_field(&42u64)
            .finish();
        buf.pop();
        assert!(Decoder::new(&buf).is_err());
    }
}
