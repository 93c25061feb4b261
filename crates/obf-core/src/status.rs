// crates/obf-core/src/status.rs

//! The execution status byte and its exit-code taxonomy.
//!
//! `0xff` means the VM is still running, `0x00` is success, anything else is
//! an error code. Execution-layer errors are *state*, not Rust errors: the VM
//! writes them into the status leaf and halts.

use std::fmt;

/// Status byte while the VM is running.
pub const STATUS_RUNNING: u8 = 0xff;

/// Status byte for successful termination.
pub const STATUS_SUCCESS: u8 = 0x00;

/// Execution-layer exit codes written into the status byte.
pub mod exit_code {
    /// The program counter ran off the end of `code`.
    pub const OUT_OF_CODE: u8 = 0x01;
    /// `>` would move the tape pointer past the cell capacity.
    pub const TAPE_OVERFLOW: u8 = 0x02;
    /// `<` with the pointer already at zero.
    pub const TAPE_UNDERFLOW: u8 = 0x03;
    /// `,` with the input fully consumed.
    pub const INPUT_EXHAUSTED: u8 = 0x04;
    /// `[` with a zero cell and no matching `]`.
    pub const UNMATCHED_BRACKET: u8 = 0x05;
    /// `[` would push past the stack capacity.
    pub const STACK_OVERFLOW: u8 = 0x06;
    /// `]` with an empty stack.
    pub const STACK_UNDERFLOW: u8 = 0x07;
    /// Gas hit zero at opcode charge time.
    pub const OUT_OF_GAS: u8 = 0x08;
    /// `.` would grow `output` past its capacity.
    pub const OUTPUT_OVERFLOW: u8 = 0x09;
}

/// Decoded execution status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The VM accepts further opcodes.
    Running,
    /// Terminated successfully; persisted state commits.
    Success,
    /// Terminated with an error code; persisted state rolls back.
    Error(u8),
}

impl Status {
    /// Decode a status byte.
    #[must_use]
    pub const fn from_byte(b: u8) -> Self {
        match b {
            STATUS_RUNNING => Self::Running,
            STATUS_SUCCESS => Self::Success,
            other => Self::Error(other),
        }
    }

    /// Encode back into the status byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Running => STATUS_RUNNING,
            Self::Success => STATUS_SUCCESS,
            Self::Error(code) => code,
        }
    }

    /// Whether the VM accepts further opcodes.
    #[inline]
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether this is a terminal error.
    #[inline]
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Error(code) => {
                let name = match *code {
                    exit_code::OUT_OF_CODE => "out-of-code",
                    exit_code::TAPE_OVERFLOW => "tape-overflow",
                    exit_code::TAPE_UNDERFLOW => "tape-underflow",
                    exit_code::INPUT_EXHAUSTED => "input-exhausted",
                    exit_code::UNMATCHED_BRACKET => "unmatched-bracket",
                    exit_code::STACK_OVERFLOW => "stack-overflow",
                    exit_code::STACK_UNDERFLOW => "stack-underflow",
                    exit_code::OUT_OF_GAS => "out-of-gas",
                    exit_code::OUTPUT_OVERFLOW => "output-overflow",
                    _ => "contract-error",
                };
                write!(f, "error({code:#04x}, {name})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_codec_roundtrips() {
        for b in 0..=u8::MAX {
            assert_eq!(Status::from_byte(b).as_byte(), b);
        }
    }

    #[test]
    fn classification() {
        assert!(Status::from_byte(0xff).is_running());
        assert!(!Status::from_byte(0x00).is_running());
        assert!(!Status::from_byte(0x00).is_error());
        assert!(Status::from_byte(exit_code::OUT_OF_GAS).is_error());
        assert_eq!(format!("{}", Status::Error(0x08)), "error(0x08, out-of-gas)");
    }
}
