//! Digital encoding for nucleotide sequences.

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

use typenum::consts::U4;
use typenum::marker_traits::Unsigned;

use super::err::InvalidSymbol;

// --- Symbol ------------------------------------------------------------------

/// A symbol from a biological alphabet.
pub trait Symbol: Default + Sized + Copy + Eq {
    /// View this symbol as a zero-based index.
    fn as_index(&self) -> usize;
    /// View this symbol as a string character.
    fn as_char(&self) -> char {
        self.as_ascii() as char
    }
    /// Parse a string character into a symbol.
    fn from_char(c: char) -> Result<Self, InvalidSymbol> {
        if c.is_ascii() {
            Self::from_ascii(c as u8)
        } else {
            Err(InvalidSymbol(c))
        }
    }
    /// View this symbol as an ASCII charater.
    fn as_ascii(&self) -> u8;
    /// Parse an ASCII character into a symbol.
    fn from_ascii(c: u8) -> Result<Self, InvalidSymbol>;
}

// --- Dna ---------------------------------------------------------------------

/// The number of symbols in the DNA alphabet, as a type number.
pub type K = U4;

/// The DNA alphabet composed of the 4 deoxyribonucleotides.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dna;

impl Dna {
    /// Get all the symbols of this alphabet, in index order.
    pub fn symbols() -> &'static [Nucleotide; 4] {
        &SYMBOLS
    }

    /// Get a string with all symbols from this alphabet, in index order.
    pub fn as_str() -> &'static str {
        "ACGT"
    }

    /// The number of symbols in the alphabet.
    pub fn len() -> usize {
        K::USIZE
    }
}

const SYMBOLS: [Nucleotide; 4] = [Nucleotide::A, Nucleotide::C, Nucleotide::G, Nucleotide::T];

const ASCII: &[u8; 4] = b"ACGT";

const INVALID: u8 = 0xFF;

const LOOKUP: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < 4 {
        table[ASCII[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// A deoxyribonucleotide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Nucleotide {
    /// Adenine.
    #[default]
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Thymine.
    T = 3,
}

impl Nucleotide {
    /// Get the nucleotide with the given index, if any.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        SYMBOLS.get(index).copied()
    }
}

impl From<Nucleotide> for char {
    fn from(n: Nucleotide) -> char {
        n.as_char()
    }
}

impl Display for Nucleotide {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.as_char())
    }
}

impl Symbol for Nucleotide {
    #[inline]
    fn as_index(&self) -> usize {
        *self as usize
    }

    #[inline]
    fn as_ascii(&self) -> u8 {
        ASCII[self.as_index()]
    }

    #[inline]
    fn from_ascii(c: u8) -> Result<Self, InvalidSymbol> {
        match LOOKUP[c as usize] {
            INVALID => Err(InvalidSymbol(c as char)),
            i => Ok(SYMBOLS[i as usize]),
        }
    }
}
