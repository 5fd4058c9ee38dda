use ethereum_types::{H160, H256};

use super::error::RLPDecodeError;

/// Decoding mirror of [`RLPEncode`](crate::encode::RLPEncode).
///
/// Implementors provide [`decode_unfinished`](RLPDecode::decode_unfinished),
/// which returns the decoded value together with the bytes that follow it;
/// [`decode`](RLPDecode::decode) additionally demands that nothing follows.
pub trait RLPDecode: Sized {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError>;

    fn decode(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let (decoded, remaining) = Self::decode_unfinished(rlp)?;
        if !remaining.is_empty() {
            return Err(RLPDecodeError::InvalidLength);
        }
        Ok(decoded)
    }
}

impl RLPDecode for u8 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((u8::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for u64 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((u64::from_be_bytes(static_left_pad(bytes)?), rest))
    }
}

impl RLPDecode for Vec<u8> {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((bytes.to_vec(), rest))
    }
}

impl RLPDecode for H160 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        if bytes.len() != 20 {
            return Err(RLPDecodeError::InvalidLength);
        }
        Ok((H160::from_slice(bytes), rest))
    }
}

impl RLPDecode for H256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        if bytes.len() != 32 {
            return Err(RLPDecodeError::InvalidLength);
        }
        Ok((H256::from_slice(bytes), rest))
    }
}

/// Splits the first RLP item off `data`.
///
/// Returns whether the item is a list, its payload, and the remaining bytes.
pub fn decode_rlp_item(data: &[u8]) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let first_byte = *data.first().ok_or(RLPDecodeError::InvalidLength)?;

    match first_byte {
        0x00..=0x7f => Ok((false, &data[..1], &data[1..])),
        0x80..=0xb7 => {
            let length = (first_byte - 0x80) as usize;
            split_payload(data, 1, length).map(|(payload, rest)| (false, payload, rest))
        }
        0xb8..=0xbf => {
            let (length, header_len) = decode_long_length(data, first_byte - 0xb7)?;
            split_payload(data, header_len, length).map(|(payload, rest)| (false, payload, rest))
        }
        0xc0..=0xf7 => {
            let length = (first_byte - 0xc0) as usize;
            split_payload(data, 1, length).map(|(payload, rest)| (true, payload, rest))
        }
        0xf8..=0xff => {
            let (length, header_len) = decode_long_length(data, first_byte - 0xf7)?;
            split_payload(data, header_len, length).map(|(payload, rest)| (true, payload, rest))
        }
    }
}

/// Decodes the first item of `data`, which must be a string.
pub fn decode_bytes(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (is_list, payload, rest) = decode_rlp_item(data)?;
    if is_list {
        return Err(RLPDecodeError::UnexpectedList);
    }
    Ok((payload, rest))
}

fn decode_long_length(data: &[u8], length_of_length: u8) -> Result<(usize, usize), RLPDecodeError> {
    let length_of_length = length_of_length as usize;
    let length_bytes = data
        .get(1..1 + length_of_length)
        .ok_or(RLPDecodeError::InvalidLength)?;
    let length = usize::from_be_bytes(static_left_pad(length_bytes)?);
    Ok((length, 1 + length_of_length))
}

fn split_payload(
    data: &[u8],
    header_len: usize,
    payload_len: usize,
) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let end = header_len
        .checked_add(payload_len)
        .ok_or(RLPDecodeError::InvalidLength)?;
    if data.len() < end {
        return Err(RLPDecodeError::InvalidLength);
    }
    Ok((&data[header_len..end], &data[end..]))
}

/// Left-pads `data` with zeros up to N bytes. Leading zeros in the input are
/// rejected since canonical RLP integers never carry them.
pub fn static_left_pad<const N: usize>(data: &[u8]) -> Result<[u8; N], RLPDecodeError> {
    let mut result = [0; N];

    if data.is_empty() {
        return Ok(result);
    }
    if data[0] == 0 {
        return Err(RLPDecodeError::MalformedData);
    }
    if data.len() > N {
        return Err(RLPDecodeError::InvalidLength);
    }

    result[N - data.len()..].copy_from_slice(data);
    Ok(result)
}
