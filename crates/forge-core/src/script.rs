//! Script construction for coinbase inputs and payment outputs.

use crate::hash::sha256;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = OP_1;
pub const OP_16: u8 = 0x60;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;

/// An append-only script builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptBuilder {
    bytes: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw opcode.
    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.bytes.push(opcode);
        self
    }

    /// Push an integer the way script numbers are pushed.
    ///
    /// 0, -1 and 1..=16 use their dedicated opcodes; anything else is a data
    /// push of the minimal script-number encoding.
    pub fn push_int(self, n: i64) -> Self {
        match n {
            0 => self.push_opcode(OP_0),
            -1 => self.push_opcode(OP_1NEGATE),
            1..=16 => self.push_opcode(OP_1 + (n as u8 - 1)),
            _ => {
                let encoded = encode_script_num(n);
                self.push_slice(&encoded)
            }
        }
    }

    /// Push arbitrary data with the smallest push opcode that fits.
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len < OP_PUSHDATA1 as usize {
            self.bytes.push(len as u8);
        } else if len <= 0xff {
            self.bytes.push(OP_PUSHDATA1);
            self.bytes.push(len as u8);
        } else {
            self.bytes.push(OP_PUSHDATA2);
            self.bytes.extend_from_slice(&(len as u16).to_le_bytes());
        }
        self.bytes.extend_from_slice(data);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Minimal little-endian sign-magnitude encoding of a script number.
pub fn encode_script_num(n: i64) -> Vec<u8> {
    if n == 0 {
        return Vec::new();
    }

    let negative = n < 0;
    let mut abs = n.unsigned_abs();
    let mut bytes = Vec::with_capacity(9);

    while abs > 0 {
        bytes.push((abs & 0xff) as u8);
        abs >>= 8;
    }

    // If the high bit is set, append a byte to carry the sign
    if let Some(last) = bytes.last_mut() {
        if *last & 0x80 != 0 {
            bytes.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            *last |= 0x80;
        }
    }

    bytes
}

/// The coinbase scriptSig `<height> OP_0`.
pub fn coinbase_script_sig(height: u32) -> Vec<u8> {
    ScriptBuilder::new()
        .push_int(i64::from(height))
        .push_opcode(OP_0)
        .into_bytes()
}

/// `OP_0 <sha256(OP_TRUE)>`: a witness script hash output anyone can spend.
pub fn p2wsh_op_true() -> Vec<u8> {
    let program = sha256(&[OP_TRUE]);
    ScriptBuilder::new()
        .push_opcode(OP_0)
        .push_slice(&program)
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_script_num() {
        assert_eq!(encode_script_num(0), Vec::<u8>::new());
        assert_eq!(encode_script_num(1), vec![0x01]);
        assert_eq!(encode_script_num(127), vec![0x7F]);
        // 0x80 needs padding to avoid being read as negative
        assert_eq!(encode_script_num(128), vec![0x80, 0x00]);
        assert_eq!(encode_script_num(256), vec![0x00, 0x01]);
        assert_eq!(encode_script_num(500000), vec![0x20, 0xA1, 0x07]);
        assert_eq!(encode_script_num(-1), vec![0x81]);
        assert_eq!(encode_script_num(-128), vec![0x80, 0x80]);
    }

    #[test]
    fn test_coinbase_script_sig() {
        // Small heights use OP_N
        assert_eq!(coinbase_script_sig(1), vec![OP_1, OP_0]);
        assert_eq!(coinbase_script_sig(16), vec![OP_16, OP_0]);
        // Larger heights are pushed as data
        assert_eq!(coinbase_script_sig(17), vec![0x01, 0x11, OP_0]);
        assert_eq!(coinbase_script_sig(500000), vec![0x03, 0x20, 0xA1, 0x07, OP_0]);
    }

    #[test]
    fn test_p2wsh_op_true() {
        let script = p2wsh_op_true();

        assert_eq!(script.len(), 34);
        assert_eq!(script[0], OP_0);
        assert_eq!(script[1], 0x20);
        assert_eq!(&script[2..], &sha256(&[OP_TRUE])[..]);
    }

    #[test]
    fn test_push_slice_lengths() {
        let short = ScriptBuilder::new().push_slice(&[0xab; 75]).into_bytes();
        assert_eq!(short[0], 75);

        let medium = ScriptBuilder::new().push_slice(&[0xab; 76]).into_bytes();
        assert_eq!(&medium[..2], &[OP_PUSHDATA1, 76]);

        let long = ScriptBuilder::new().push_slice(&[0xab; 300]).into_bytes();
        assert_eq!(&long[..3], &[OP_PUSHDATA2, 0x2c, 0x01]);
    }
}
