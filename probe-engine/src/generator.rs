//! Candidate code generation
//!
//! Each worker owns its own [`CodeGenerator`], so no RNG state is shared
//! across tasks. Seeded construction makes runs reproducible in tests.

use crate::types::{AlphabetMode, EngineConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DIGITS: &str = "0123456789";
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const ALPHANUMERIC: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Resolve the character set for a configuration.
///
/// An empty custom alphabet falls back to [`DIGITS`].
pub fn resolve_alphabet(config: &EngineConfig) -> Vec<char> {
    let chars = match config.alphabet {
        AlphabetMode::Digits => DIGITS,
        AlphabetMode::Lowercase => LOWERCASE,
        AlphabetMode::Alphanumeric => ALPHANUMERIC,
        AlphabetMode::Custom if config.custom_alphabet.is_empty() => DIGITS,
        AlphabetMode::Custom => config.custom_alphabet.as_str(),
    };
    chars.chars().collect()
}

/// Generates fixed-length codes drawn uniformly from an alphabet
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
    rng: StdRng,
}

impl CodeGenerator {
    /// Create a generator seeded from OS entropy
    pub fn new(config: &EngineConfig) -> Self {
        Self::from_rng(config, StdRng::from_entropy())
    }

    /// Create a deterministic generator
    pub fn with_seed(config: &EngineConfig, seed: u64) -> Self {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: &EngineConfig, rng: StdRng) -> Self {
        Self {
            alphabet: resolve_alphabet(config),
            // Length is validated upstream, but never produce an empty code.
            length: config.code_length.max(1),
            rng,
        }
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Produce the next candidate code
    pub fn generate(&mut self) -> String {
        (0..self.length)
            .map(|_| self.alphabet[self.rng.gen_range(0..self.alphabet.len())])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(alphabet: AlphabetMode, custom: &str, length: usize) -> EngineConfig {
        EngineConfig {
            alphabet,
            custom_alphabet: custom.to_string(),
            code_length: length,
            ..Default::default()
        }
    }

    #[test]
    fn test_builtin_alphabets() {
        assert_eq!(resolve_alphabet(&config(AlphabetMode::Digits, "", 4)).len(), 10);
        assert_eq!(resolve_alphabet(&config(AlphabetMode::Lowercase, "", 4)).len(), 26);
        assert_eq!(resolve_alphabet(&config(AlphabetMode::Alphanumeric, "", 4)).len(), 36);
    }

    #[test]
    fn test_empty_custom_alphabet_falls_back_to_digits() {
        let mut generator = CodeGenerator::with_seed(&config(AlphabetMode::Custom, "", 8), 7);
        assert_eq!(generator.alphabet(), DIGITS.chars().collect::<Vec<_>>().as_slice());

        let code = generator.generate();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_custom_alphabet_with_multibyte_chars() {
        let mut generator = CodeGenerator::with_seed(&config(AlphabetMode::Custom, "αβ", 5), 1);
        let code = generator.generate();
        assert_eq!(code.chars().count(), 5);
        assert!(code.chars().all(|c| c == 'α' || c == 'β'));
    }

    #[test]
    fn test_seeded_generators_are_reproducible() {
        let cfg = config(AlphabetMode::Alphanumeric, "", 6);
        let mut a = CodeGenerator::with_seed(&cfg, 42);
        let mut b = CodeGenerator::with_seed(&cfg, 42);
        for _ in 0..20 {
            assert_eq!(a.generate(), b.generate());
        }
    }
}
