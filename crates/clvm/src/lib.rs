pub mod coin;
pub mod curry;
pub mod decoder;
pub mod eval;
pub mod value;

use thiserror::Error;

/// Errors raised while parsing or evaluating a CLVM program (§4.A: fatal,
/// must abort the sync pass without persisting partial state).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClvmError {
    #[error("puzzle evaluation failed: {0}")]
    Eval(String),

    #[error("unexpected CREATE_COIN amount: {0}")]
    UnexpectedAmount(u64),

    #[error("malformed program: {0}")]
    Malformed(String),
}

pub use coin::coin_id;
pub use curry::{curry, curry_args};
pub use decoder::{decode_pair_state, eval_new_state, ReserveTriple};
pub use eval::{run_puzzle, Condition, CREATE_COIN_OPCODE};
pub use value::{canonical_amount, parse_program, serialize, Value};
