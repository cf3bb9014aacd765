//! Share-code generation.
//!
//! Codes follow a fixed five-position consonant/vowel grammar (CVCVC) so
//! they stay pronounceable and easy to relay over the phone. The
//! addressable space is 21^3 * 5^2 = 231,525 codes, which is the hard
//! ceiling on concurrently assigned codes; batch generation close to that
//! ceiling takes rapidly more attempts per new code.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;

pub const CONSONANTS: &[u8] = b"BCDFGHJKLMNPQRSTVWXYZ";
pub const VOWELS: &[u8] = b"AEIOU";
pub const CODE_LENGTH: usize = 5;
pub const CODE_SPACE: usize = 21 * 5 * 21 * 5 * 21;

#[derive(Debug, Error)]
pub enum CodeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Stateless code generator over an injected randomness source, so tests
/// can seed determinism.
pub struct CodeGenerator {
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng<R: RngCore + Send + 'static>(rng: R) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
        }
    }

    /// A single 5-character code following the position grammar.
    pub fn generate(&self) -> String {
        let mut rng = self.rng.lock().unwrap();
        let mut code = String::with_capacity(CODE_LENGTH);
        for position in 0..CODE_LENGTH {
            code.push(pick(&mut rng, alphabet_for(position)));
        }
        code
    }

    /// n distinct codes. Errors when n exceeds the total space; large n
    /// relative to the space still terminates but degrades.
    pub fn generate_batch(&self, n: usize) -> Result<HashSet<String>, CodeError> {
        if n > CODE_SPACE {
            return Err(CodeError::InvalidArgument(format!(
                "cannot generate {} distinct codes from a space of {}",
                n, CODE_SPACE
            )));
        }
        let mut codes = HashSet::with_capacity(n);
        while codes.len() < n {
            codes.insert(self.generate());
        }
        Ok(codes)
    }

    /// A code seeded with the given prefix verbatim (uppercased). The
    /// remaining positions alternate consonant/vowel starting from a
    /// consonant, so the prefix may be at most 2 characters.
    pub fn generate_with_prefix(&self, prefix: &str) -> Result<String, CodeError> {
        let prefix = prefix.trim().to_uppercase();
        let seeded = prefix.chars().count();
        if CODE_LENGTH.saturating_sub(seeded) < 3 {
            return Err(CodeError::InvalidArgument(format!(
                "prefix '{}' leaves fewer than 3 positions to fill",
                prefix
            )));
        }

        let mut rng = self.rng.lock().unwrap();
        let mut code = prefix;
        for offset in 0..(CODE_LENGTH - seeded) {
            let alphabet = if offset % 2 == 0 { CONSONANTS } else { VOWELS };
            code.push(pick(&mut rng, alphabet));
        }
        Ok(code)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural check only: length 5 and the right alphabet at each
/// position. Case-insensitive.
pub fn is_valid(code: &str) -> bool {
    let upper = code.trim().to_uppercase();
    let chars: Vec<char> = upper.chars().collect();
    if chars.len() != CODE_LENGTH {
        return false;
    }
    chars
        .iter()
        .enumerate()
        .all(|(position, c)| c.is_ascii() && alphabet_for(position).contains(&(*c as u8)))
}

fn alphabet_for(position: usize) -> &'static [u8] {
    if position % 2 == 0 {
        CONSONANTS
    } else {
        VOWELS
    }
}

fn pick(rng: &mut Box<dyn RngCore + Send>, alphabet: &'static [u8]) -> char {
    alphabet[rng.gen_range(0..alphabet.len())] as char
}
