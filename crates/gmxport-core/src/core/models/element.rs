use phf::{Map, phf_map};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ElementData {
    atomic_number: u8,
    mass: f64,
}

static ELEMENTS: Map<&'static str, ElementData> = phf_map! {
    "H" => ElementData { atomic_number: 1, mass: 1.008 },
    "He" => ElementData { atomic_number: 2, mass: 4.0026 },
    "Li" => ElementData { atomic_number: 3, mass: 6.94 },
    "Be" => ElementData { atomic_number: 4, mass: 9.0122 },
    "B" => ElementData { atomic_number: 5, mass: 10.81 },
    "C" => ElementData { atomic_number: 6, mass: 12.011 },
    "N" => ElementData { atomic_number: 7, mass: 14.007 },
    "O" => ElementData { atomic_number: 8, mass: 15.999 },
    "F" => ElementData { atomic_number: 9, mass: 18.998 },
    "Ne" => ElementData { atomic_number: 10, mass: 20.180 },
    "Na" => ElementData { atomic_number: 11, mass: 22.990 },
    "Mg" => ElementData { atomic_number: 12, mass: 24.305 },
    "Al" => ElementData { atomic_number: 13, mass: 26.982 },
    "Si" => ElementData { atomic_number: 14, mass: 28.085 },
    "P" => ElementData { atomic_number: 15, mass: 30.974 },
    "S" => ElementData { atomic_number: 16, mass: 32.06 },
    "Cl" => ElementData { atomic_number: 17, mass: 35.45 },
    "Ar" => ElementData { atomic_number: 18, mass: 39.948 },
    "K" => ElementData { atomic_number: 19, mass: 39.098 },
    "Ca" => ElementData { atomic_number: 20, mass: 40.078 },
    "Mn" => ElementData { atomic_number: 25, mass: 54.938 },
    "Fe" => ElementData { atomic_number: 26, mass: 55.845 },
    "Co" => ElementData { atomic_number: 27, mass: 58.933 },
    "Ni" => ElementData { atomic_number: 28, mass: 58.693 },
    "Cu" => ElementData { atomic_number: 29, mass: 63.546 },
    "Zn" => ElementData { atomic_number: 30, mass: 65.38 },
    "Se" => ElementData { atomic_number: 34, mass: 78.971 },
    "Br" => ElementData { atomic_number: 35, mass: 79.904 },
    "Kr" => ElementData { atomic_number: 36, mass: 83.798 },
    "Rb" => ElementData { atomic_number: 37, mass: 85.468 },
    "Sr" => ElementData { atomic_number: 38, mass: 87.62 },
    "I" => ElementData { atomic_number: 53, mass: 126.90 },
    "Xe" => ElementData { atomic_number: 54, mass: 131.29 },
    "Cs" => ElementData { atomic_number: 55, mass: 132.91 },
    "Ba" => ElementData { atomic_number: 56, mass: 137.33 },
};

/// A chemical element, identified by its canonical symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element {
    symbol: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol '{0}'")]
pub struct ParseElementError(pub String);

impl Element {
    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn atomic_number(&self) -> u8 {
        self.data().atomic_number
    }

    /// Standard atomic mass in daltons.
    pub fn mass(&self) -> f64 {
        self.data().mass
    }

    fn data(&self) -> &'static ElementData {
        // Every constructed `Element` holds a key taken from the table itself.
        &ELEMENTS[self.symbol]
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let canonical: String = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(|c| c.to_lowercase()))
                .collect(),
            None => return Err(ParseElementError(s.to_string())),
        };
        ELEMENTS
            .get_entry(canonical.as_str())
            .map(|(symbol, _)| Element { symbol: *symbol })
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl TryFrom<String> for Element {
    type Error = ParseElementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Element::try_from(symbol).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbols_case_insensitively() {
        let cl: Element = "cl".parse().unwrap();
        assert_eq!(cl.symbol(), "Cl");
        assert_eq!(cl.atomic_number(), 17);
        let o: Element = " O ".parse().unwrap();
        assert_eq!(o.symbol(), "O");
    }

    #[test]
    fn exposes_atomic_number_and_mass() {
        let h: Element = "H".parse().unwrap();
        assert_eq!(h.atomic_number(), 1);
        assert!((h.mass() - 1.008).abs() < 1e-12);
    }

    #[test]
    fn rejects_unknown_and_empty_symbols() {
        assert!("Xx".parse::<Element>().is_err());
        assert!("".parse::<Element>().is_err());
    }

    #[test]
    fn display_outputs_canonical_symbol() {
        assert_eq!("NA".parse::<Element>().unwrap().to_string(), "Na");
    }

    #[derive(Debug, Deserialize)]
    struct Labeled {
        element: Element,
    }

    #[test]
    fn deserializes_inside_a_derived_struct() {
        let labeled: Labeled = toml::from_str("element = \"cl\"").unwrap();
        assert_eq!(labeled.element.symbol(), "Cl");

        let err = toml::from_str::<Labeled>("element = \"Qq\"").unwrap_err();
        assert!(err.to_string().contains("Unknown element symbol 'Qq'"));
    }
}
