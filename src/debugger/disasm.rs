use crate::debugger::address::Address;

/// Single assembly instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub address: Address,
    /// Rendered mnemonic and operands.
    pub display: String,
    /// Enclosing function name with offset, if known.
    pub function: Option<String>,
}
