use std::mem::size_of;

pub fn encode_fixed16(dst: &mut [u8], value: u16) {
    dst[..size_of::<u16>()].copy_from_slice(&value.to_le_bytes());
}

pub fn encode_fixed32(dst: &mut [u8], value: u32) {
    dst[..size_of::<u32>()].copy_from_slice(&value.to_le_bytes());
}

pub fn decode_fixed16(input: &[u8]) -> u16 {
    u16::from_le_bytes([input[0], input[1]])
}

pub fn decode_fixed32(input: &[u8]) -> u32 {
    u32::from_le_bytes([input[0], input[1], input[2], input[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed32() {
        let mut buf = vec![];
        for v in 0..100000u32 {
            let mut tmp = [0; 4];
            encode_fixed32(&mut tmp, v);
            buf.extend_from_slice(&tmp);
        }
        for (v, chunk) in buf.chunks(4).enumerate() {
            assert_eq!(v as u32, decode_fixed32(chunk));
        }
    }

    #[test]
    fn test_encoding_output() {
        let mut dst = [0; 4];
        encode_fixed32(&mut dst, 0x04030201);
        assert_eq!([0x01, 0x02, 0x03, 0x04], dst);

        let mut dst = [0; 2];
        encode_fixed16(&mut dst, 0xfff8);
        assert_eq!([0xf8, 0xff], dst);
        assert_eq!(0xfff8, decode_fixed16(&dst));
    }

    #[test]
    fn test_encode_leaves_tail_untouched() {
        let mut dst = [0xaa; 7];
        encode_fixed32(&mut dst, 0);
        encode_fixed16(&mut dst[4..], 1);
        assert_eq!([0, 0, 0, 0, 1, 0, 0xaa], dst);
    }
}
