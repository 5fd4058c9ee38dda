use crate::errors::ExceptionalHalt;

/// The opcodes the engine dispatches itself: the system family plus the
/// baseline subset programs need to reach it. Anything else takes the
/// INVALID path.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[repr(u8)]
pub enum Opcode {
    // Stop
    STOP = 0x00,

    // Block information
    NUMBER = 0x43,
    TIMESTAMP = 0x42,

    // Stack, memory and storage
    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    SLOAD = 0x54,
    SSTORE = 0x55,
    GAS = 0x5A,
    JUMPDEST = 0x5B,

    // Push operations
    PUSH0 = 0x5F,
    PUSH1 = 0x60,
    PUSH2 = 0x61,
    PUSH3 = 0x62,
    PUSH4 = 0x63,
    PUSH5 = 0x64,
    PUSH6 = 0x65,
    PUSH7 = 0x66,
    PUSH8 = 0x67,
    PUSH9 = 0x68,
    PUSH10 = 0x69,
    PUSH11 = 0x6A,
    PUSH12 = 0x6B,
    PUSH13 = 0x6C,
    PUSH14 = 0x6D,
    PUSH15 = 0x6E,
    PUSH16 = 0x6F,
    PUSH17 = 0x70,
    PUSH18 = 0x71,
    PUSH19 = 0x72,
    PUSH20 = 0x73,
    PUSH21 = 0x74,
    PUSH22 = 0x75,
    PUSH23 = 0x76,
    PUSH24 = 0x77,
    PUSH25 = 0x78,
    PUSH26 = 0x79,
    PUSH27 = 0x7A,
    PUSH28 = 0x7B,
    PUSH29 = 0x7C,
    PUSH30 = 0x7D,
    PUSH31 = 0x7E,
    PUSH32 = 0x7F,

    // Logging
    LOG0 = 0xA0,
    LOG1 = 0xA1,
    LOG2 = 0xA2,
    LOG3 = 0xA3,
    LOG4 = 0xA4,

    // System operations
    CREATE = 0xF0,
    CALL = 0xF1,
    CALLCODE = 0xF2,
    RETURN = 0xF3,
    DELEGATECALL = 0xF4,
    CREATE2 = 0xF5,
    STATICCALL = 0xFA,
    REVERT = 0xFD,
    INVALID = 0xFE,
    SELFDESTRUCT = 0xFF,
}

impl Opcode {
    /// Number of immediate bytes for PUSH1..=PUSH32, `None` otherwise.
    pub fn push_size(self) -> Option<usize> {
        let byte = self as u8;
        (0x60..=0x7F)
            .contains(&byte)
            .then(|| (byte - 0x5F) as usize)
    }

    /// Topic count for LOG0..=LOG4, `None` otherwise.
    pub fn log_topic_count(self) -> Option<usize> {
        let byte = self as u8;
        (0xA0..=0xA4)
            .contains(&byte)
            .then(|| (byte - 0xA0) as usize)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ExceptionalHalt;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        let opcode = match byte {
            0x00 => Opcode::STOP,
            0x42 => Opcode::TIMESTAMP,
            0x43 => Opcode::NUMBER,
            0x50 => Opcode::POP,
            0x51 => Opcode::MLOAD,
            0x52 => Opcode::MSTORE,
            0x53 => Opcode::MSTORE8,
            0x54 => Opcode::SLOAD,
            0x55 => Opcode::SSTORE,
            0x5A => Opcode::GAS,
            0x5B => Opcode::JUMPDEST,
            0x5F => Opcode::PUSH0,
            0x60 => Opcode::PUSH1,
            0x61 => Opcode::PUSH2,
            0x62 => Opcode::PUSH3,
            0x63 => Opcode::PUSH4,
            0x64 => Opcode::PUSH5,
            0x65 => Opcode::PUSH6,
            0x66 => Opcode::PUSH7,
            0x67 => Opcode::PUSH8,
            0x68 => Opcode::PUSH9,
            0x69 => Opcode::PUSH10,
            0x6A => Opcode::PUSH11,
            0x6B => Opcode::PUSH12,
            0x6C => Opcode::PUSH13,
            0x6D => Opcode::PUSH14,
            0x6E => Opcode::PUSH15,
            0x6F => Opcode::PUSH16,
            0x70 => Opcode::PUSH17,
            0x71 => Opcode::PUSH18,
            0x72 => Opcode::PUSH19,
            0x73 => Opcode::PUSH20,
            0x74 => Opcode::PUSH21,
            0x75 => Opcode::PUSH22,
            0x76 => Opcode::PUSH23,
            0x77 => Opcode::PUSH24,
            0x78 => Opcode::PUSH25,
            0x79 => Opcode::PUSH26,
            0x7A => Opcode::PUSH27,
            0x7B => Opcode::PUSH28,
            0x7C => Opcode::PUSH29,
            0x7D => Opcode::PUSH30,
            0x7E => Opcode::PUSH31,
            0x7F => Opcode::PUSH32,
            0xA0 => Opcode::LOG0,
            0xA1 => Opcode::LOG1,
            0xA2 => Opcode::LOG2,
            0xA3 => Opcode::LOG3,
            0xA4 => Opcode::LOG4,
            0xF0 => Opcode::CREATE,
            0xF1 => Opcode::CALL,
            0xF2 => Opcode::CALLCODE,
            0xF3 => Opcode::RETURN,
            0xF4 => Opcode::DELEGATECALL,
            0xF5 => Opcode::CREATE2,
            0xFA => Opcode::STATICCALL,
            0xFD => Opcode::REVERT,
            0xFE => Opcode::INVALID,
            0xFF => Opcode::SELFDESTRUCT,
            _ => return Err(ExceptionalHalt::InvalidOpcode),
        };
        Ok(opcode)
    }
}
