//! Chemical formula parsing into element amounts.

use std::collections::BTreeMap;

use thiserror::Error;

/// Element symbol → amount (atoms per formula unit, or mass fraction when
/// given explicitly in data).
pub type Composition = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("empty formula")]
    Empty,

    #[error("unknown element {symbol:?} in {formula:?}")]
    UnknownElement { formula: String, symbol: String },

    #[error("unexpected {found:?} at offset {offset} in {formula:?}")]
    Unexpected {
        formula: String,
        found: char,
        offset: usize,
    },

    #[error("unbalanced brackets in {0:?}")]
    Unbalanced(String),
}

#[rustfmt::skip]
const ELEMENTS: &[&str] = &[
    "H", "He",
    "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar",
    "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr",
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe",
    "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy",
    "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt",
    "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn",
    "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf",
    "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Phase annotations stripped from the end of a formula.
const PHASES: &[&str] = &["(aq)", "(s)", "(l)", "(g)"];

pub fn is_element(symbol: &str) -> bool {
    ELEMENTS.contains(&symbol)
}

/// Parses a formula such as `Lu1.8Y0.2SiO5`, `Ca(OH)2`, `(C2H4)n`,
/// `CuSO4·5H2O` or `NaCl(aq)` into element amounts.
///
/// Fractional subscripts are allowed. A polymer repeat marker `n` after a
/// closing bracket counts the repeat unit once.
///
/// # Errors
///
/// Returns a [`FormulaError`] for unknown element symbols, stray characters
/// or unbalanced brackets.
pub fn parse_formula(formula: &str) -> Result<Composition, FormulaError> {
    let mut body = formula.trim();
    for phase in PHASES {
        if let Some(stripped) = body.strip_suffix(phase) {
            body = stripped.trim_end();
            break;
        }
    }
    if body.is_empty() {
        return Err(FormulaError::Empty);
    }

    let mut total = Composition::new();
    for part in body.split(['·', '*']) {
        let mut parser = Parser {
            formula,
            chars: part.trim().chars().collect(),
            pos: 0,
        };
        let multiplier = parser.number()?.unwrap_or(1.0);
        let group = parser.group(None)?;
        if group.is_empty() {
            return Err(FormulaError::Empty);
        }
        merge(&mut total, group, multiplier);
    }
    Ok(total)
}

fn merge(into: &mut Composition, from: Composition, factor: f64) {
    for (element, amount) in from {
        *into.entry(element).or_insert(0.0) += amount * factor;
    }
}

struct Parser<'a> {
    formula: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Reads a count, or `None` when no digits follow.
    fn number(&mut self) -> Result<Option<f64>, FormulaError> {
        let start = self.pos;
        while let Some(c) = self.peek()
            && (c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse().map(Some).map_err(|_| FormulaError::Unexpected {
            formula: self.formula.to_string(),
            found: self.chars[start],
            offset: start,
        })
    }

    fn unexpected(&self, found: char) -> FormulaError {
        FormulaError::Unexpected {
            formula: self.formula.to_string(),
            found,
            offset: self.pos,
        }
    }

    fn group(&mut self, closing: Option<char>) -> Result<Composition, FormulaError> {
        let mut out = Composition::new();
        while let Some(c) = self.peek() {
            match c {
                '(' | '[' => {
                    self.pos += 1;
                    let close = if c == '(' { ')' } else { ']' };
                    let inner = self.group(Some(close))?;
                    let mut count = self.number()?.unwrap_or(1.0);
                    if self.peek() == Some('n') {
                        self.pos += 1;
                        count = 1.0;
                    }
                    merge(&mut out, inner, count);
                }
                ')' | ']' => {
                    if closing != Some(c) {
                        return Err(FormulaError::Unbalanced(self.formula.to_string()));
                    }
                    self.pos += 1;
                    return Ok(out);
                }
                c if c.is_ascii_uppercase() => {
                    let mut symbol = c.to_string();
                    self.pos += 1;
                    if let Some(next) = self.peek()
                        && next.is_ascii_lowercase()
                    {
                        symbol.push(next);
                        self.pos += 1;
                    }
                    if !is_element(&symbol) {
                        return Err(FormulaError::UnknownElement {
                            formula: self.formula.to_string(),
                            symbol,
                        });
                    }
                    let count = self.number()?.unwrap_or(1.0);
                    *out.entry(symbol).or_insert(0.0) += count;
                }
                other => return Err(self.unexpected(other)),
            }
        }
        if closing.is_some() {
            return Err(FormulaError::Unbalanced(self.formula.to_string()));
        }
        Ok(out)
    }
}
