//! State Transition Table
//!
//! The encoder's finite state machine in tabulated form. For every
//! `(state, input bit)` pair the table holds the emitted symbol and the next
//! state:
//!
//! ```text
//!   register   = state | input << delay
//!   next_state = register >> 1
//!   output     = encode_symbol(register)
//! ```
//!
//! The Viterbi decoder sees the encoder only through this table.

use crate::fec::encoder::ConvolutionalEncoder;
use crate::types::{State, Symbol};

/// Precomputed `(state, input) -> (output, next state)` lookup.
#[derive(Debug, Clone)]
pub struct StateTransitionTable {
    delay: usize,
    output_length: usize,
    /// Indexed by `state * 2 + input`.
    outputs: Vec<Symbol>,
    /// Indexed by `state * 2 + input`.
    next_states: Vec<State>,
}

impl StateTransitionTable {
    /// Tabulate the transitions of `encoder`. O(2^delay).
    pub fn new(encoder: &ConvolutionalEncoder) -> Self {
        let delay = encoder.delay();
        let num_states = encoder.num_states();
        let mut outputs = Vec::with_capacity(num_states * 2);
        let mut next_states = Vec::with_capacity(num_states * 2);

        for state in 0..num_states as u32 {
            for input in 0..2u32 {
                let register = state | (input << delay);
                next_states.push((register >> 1) as State);
                outputs.push(encoder.encode_symbol(register));
            }
        }

        Self {
            delay,
            output_length: encoder.output_length(),
            outputs,
            next_states,
        }
    }

    /// Symbol emitted when `input` is shifted into `state`.
    #[inline]
    pub fn output(&self, state: State, input: u8) -> Symbol {
        self.outputs[Self::index(state, input)]
    }

    /// State reached when `input` is shifted into `state`.
    #[inline]
    pub fn next_state(&self, state: State, input: u8) -> State {
        self.next_states[Self::index(state, input)]
    }

    /// Input bit that drives `prev` to `next`, if any.
    pub fn input_for(&self, prev: State, next: State) -> Option<u8> {
        (0..2u8).find(|&input| self.next_state(prev, input) == next)
    }

    pub fn num_states(&self) -> usize {
        1 << self.delay
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Bits per symbol.
    pub fn output_length(&self) -> usize {
        self.output_length
    }

    #[inline]
    fn index(state: State, input: u8) -> usize {
        ((state as usize) << 1) | (input as usize & 1)
    }
}
