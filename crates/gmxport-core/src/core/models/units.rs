use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const KCAL_TO_KJ: f64 = 4.184;
const ANGSTROM_TO_NM: f64 = 0.1;

/// Physical dimension of a [`Unit`]. Conversions are only defined within one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Length,
    Angle,
    Energy,
    BondForceConstant,
    AngleForceConstant,
    InverseLength,
    DispersionCoefficient,
    Charge,
    Dimensionless,
}

/// Closed set of units understood by the exporter.
///
/// Each unit carries a fixed factor to the GROMACS base unit of its dimension
/// (nm, degree, kJ/mol, e), so a conversion is one multiplication and one division.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Unit {
    Nanometer,
    Angstrom,
    Degree,
    Radian,
    KilojoulePerMole,
    KilocaloriePerMole,
    KilojoulePerMolePerNanometer2,
    KilocaloriePerMolePerAngstrom2,
    KilojoulePerMolePerRadian2,
    KilocaloriePerMolePerRadian2,
    PerNanometer,
    PerAngstrom,
    KilojoulePerMoleNanometer6,
    KilocaloriePerMoleAngstrom6,
    ElementaryCharge,
    Dimensionless,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("Cannot convert '{from}' to '{to}': incompatible dimensions")]
    UnitMismatch { from: Unit, to: Unit },
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),
}

impl Unit {
    pub fn dimension(self) -> Dimension {
        match self {
            Self::Nanometer | Self::Angstrom => Dimension::Length,
            Self::Degree | Self::Radian => Dimension::Angle,
            Self::KilojoulePerMole | Self::KilocaloriePerMole => Dimension::Energy,
            Self::KilojoulePerMolePerNanometer2 | Self::KilocaloriePerMolePerAngstrom2 => {
                Dimension::BondForceConstant
            }
            Self::KilojoulePerMolePerRadian2 | Self::KilocaloriePerMolePerRadian2 => {
                Dimension::AngleForceConstant
            }
            Self::PerNanometer | Self::PerAngstrom => Dimension::InverseLength,
            Self::KilojoulePerMoleNanometer6 | Self::KilocaloriePerMoleAngstrom6 => {
                Dimension::DispersionCoefficient
            }
            Self::ElementaryCharge => Dimension::Charge,
            Self::Dimensionless => Dimension::Dimensionless,
        }
    }

    /// Factor that converts a value in this unit to the base unit of its dimension.
    fn factor(self) -> f64 {
        match self {
            Self::Nanometer => 1.0,
            Self::Angstrom => ANGSTROM_TO_NM,
            Self::Degree => 1.0,
            Self::Radian => 180.0 / std::f64::consts::PI,
            Self::KilojoulePerMole => 1.0,
            Self::KilocaloriePerMole => KCAL_TO_KJ,
            Self::KilojoulePerMolePerNanometer2 => 1.0,
            Self::KilocaloriePerMolePerAngstrom2 => KCAL_TO_KJ / (ANGSTROM_TO_NM * ANGSTROM_TO_NM),
            Self::KilojoulePerMolePerRadian2 => 1.0,
            Self::KilocaloriePerMolePerRadian2 => KCAL_TO_KJ,
            Self::PerNanometer => 1.0,
            Self::PerAngstrom => 1.0 / ANGSTROM_TO_NM,
            Self::KilojoulePerMoleNanometer6 => 1.0,
            Self::KilocaloriePerMoleAngstrom6 => KCAL_TO_KJ * ANGSTROM_TO_NM.powi(6),
            Self::ElementaryCharge => 1.0,
            Self::Dimensionless => 1.0,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Nanometer => "nanometer",
            Self::Angstrom => "angstrom",
            Self::Degree => "degree",
            Self::Radian => "radian",
            Self::KilojoulePerMole => "kilojoule/mole",
            Self::KilocaloriePerMole => "kilocalorie/mole",
            Self::KilojoulePerMolePerNanometer2 => "kilojoule/mole/nanometer**2",
            Self::KilocaloriePerMolePerAngstrom2 => "kilocalorie/mole/angstrom**2",
            Self::KilojoulePerMolePerRadian2 => "kilojoule/mole/radian**2",
            Self::KilocaloriePerMolePerRadian2 => "kilocalorie/mole/radian**2",
            Self::PerNanometer => "1/nanometer",
            Self::PerAngstrom => "1/angstrom",
            Self::KilojoulePerMoleNanometer6 => "kilojoule/mole*nanometer**6",
            Self::KilocaloriePerMoleAngstrom6 => "kilocalorie/mole*angstrom**6",
            Self::ElementaryCharge => "elementary_charge",
            Self::Dimensionless => "dimensionless",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
            .replace("kj", "kilojoule")
            .replace("kcal", "kilocalorie")
            .replace("/mol/", "/mole/")
            .replace("/mol*", "/mole*")
            .replace("^", "**");
        let normalized = normalized
            .strip_suffix("/mol")
            .map(|p| format!("{p}/mole"))
            .unwrap_or(normalized);

        match normalized.as_str() {
            "nanometer" | "nm" => Ok(Self::Nanometer),
            "angstrom" | "a" => Ok(Self::Angstrom),
            "degree" | "deg" => Ok(Self::Degree),
            "radian" | "rad" => Ok(Self::Radian),
            "kilojoule/mole" => Ok(Self::KilojoulePerMole),
            "kilocalorie/mole" => Ok(Self::KilocaloriePerMole),
            "kilojoule/mole/nanometer**2" | "kilojoule/mole/nm**2" => {
                Ok(Self::KilojoulePerMolePerNanometer2)
            }
            "kilocalorie/mole/angstrom**2" => Ok(Self::KilocaloriePerMolePerAngstrom2),
            "kilojoule/mole/radian**2" | "kilojoule/mole/rad**2" => {
                Ok(Self::KilojoulePerMolePerRadian2)
            }
            "kilocalorie/mole/radian**2" | "kilocalorie/mole/rad**2" => {
                Ok(Self::KilocaloriePerMolePerRadian2)
            }
            "1/nanometer" | "1/nm" => Ok(Self::PerNanometer),
            "1/angstrom" => Ok(Self::PerAngstrom),
            "kilojoule/mole*nanometer**6" | "kilojoule/mole*nm**6" => {
                Ok(Self::KilojoulePerMoleNanometer6)
            }
            "kilocalorie/mole*angstrom**6" => Ok(Self::KilocaloriePerMoleAngstrom6),
            "elementary_charge" | "e" => Ok(Self::ElementaryCharge),
            "dimensionless" | "" => Ok(Self::Dimensionless),
            _ => Err(UnitError::UnknownUnit(s.to_string())),
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A scalar value tagged with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Returns the magnitude of this quantity expressed in `unit`.
    pub fn m_as(&self, unit: Unit) -> Result<f64, UnitError> {
        if self.unit.dimension() != unit.dimension() {
            return Err(UnitError::UnitMismatch {
                from: self.unit,
                to: unit,
            });
        }
        if self.unit == unit {
            return Ok(self.value);
        }
        Ok(self.value * self.unit.factor() / unit.factor())
    }

    pub fn to(&self, unit: Unit) -> Result<Quantity, UnitError> {
        Ok(Quantity::new(self.m_as(unit)?, unit))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}
