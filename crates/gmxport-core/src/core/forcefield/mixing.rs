use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Combination rule used to derive pair parameters from per-particle ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixingRule {
    LorentzBerthelot,
    Geometric,
    /// Only meaningful for Buckingham-6 tables; written as comb-rule 2.
    Buckingham,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown mixing rule '{0}'")]
pub struct UnknownMixingRule(pub String);

impl MixingRule {
    /// The `comb-rule` column of the `[ defaults ]` directive.
    pub fn comb_rule(self) -> u8 {
        match self {
            Self::LorentzBerthelot | Self::Buckingham => 2,
            Self::Geometric => 3,
        }
    }

    /// Combines two `(sigma, epsilon)` pairs.
    ///
    /// Returns `None` for rules that have no Lennard-Jones combination.
    pub fn combine(self, a: (f64, f64), b: (f64, f64)) -> Option<(f64, f64)> {
        let epsilon = (a.1 * b.1).sqrt();
        match self {
            Self::LorentzBerthelot => Some(((a.0 + b.0) * 0.5, epsilon)),
            Self::Geometric => Some(((a.0 * b.0).sqrt(), epsilon)),
            Self::Buckingham => None,
        }
    }
}

impl FromStr for MixingRule {
    type Err = UnknownMixingRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lorentz-berthelot" => Ok(Self::LorentzBerthelot),
            "geometric" => Ok(Self::Geometric),
            "buckingham" => Ok(Self::Buckingham),
            _ => Err(UnknownMixingRule(s.to_string())),
        }
    }
}

impl fmt::Display for MixingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LorentzBerthelot => "lorentz-berthelot",
            Self::Geometric => "geometric",
            Self::Buckingham => "buckingham",
        };
        write!(f, "{}", name)
    }
}
