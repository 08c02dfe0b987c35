use crate::core::models::units::{Quantity, Unit, UnitError};
use serde::Deserialize;

fn default_idivf() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BondParams {
    pub k: Quantity,
    pub length: Quantity,
}

impl BondParams {
    pub fn length_nm(&self) -> Result<f64, UnitError> {
        self.length.m_as(Unit::Nanometer)
    }

    pub fn k_kj_nm2(&self) -> Result<f64, UnitError> {
        self.k.m_as(Unit::KilojoulePerMolePerNanometer2)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AngleParams {
    pub k: Quantity,
    pub angle: Quantity,
}

impl AngleParams {
    pub fn angle_deg(&self) -> Result<f64, UnitError> {
        self.angle.m_as(Unit::Degree)
    }

    pub fn k_kj_rad2(&self) -> Result<f64, UnitError> {
        self.k.m_as(Unit::KilojoulePerMolePerRadian2)
    }
}

/// Periodic torsion term, shared by proper and improper torsions.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TorsionParams {
    pub k: Quantity,
    pub periodicity: u32,
    pub phase: Quantity,
    #[serde(default = "default_idivf")]
    pub idivf: f64,
}

impl TorsionParams {
    pub fn phase_deg(&self) -> Result<f64, UnitError> {
        self.phase.m_as(Unit::Degree)
    }

    /// Barrier height in kJ/mol, already divided by `idivf`.
    pub fn k_kj(&self) -> Result<f64, UnitError> {
        Ok(self.k.m_as(Unit::KilojoulePerMole)? / self.idivf)
    }
}

/// Ryckaert-Bellemans coefficients `c0`..`c5`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RbTorsionParams {
    pub c0: Quantity,
    pub c1: Quantity,
    pub c2: Quantity,
    pub c3: Quantity,
    pub c4: Quantity,
    pub c5: Quantity,
}

impl RbTorsionParams {
    pub fn coefficients_kj(&self) -> Result<[f64; 6], UnitError> {
        let energy = Unit::KilojoulePerMole;
        Ok([
            self.c0.m_as(energy)?,
            self.c1.m_as(energy)?,
            self.c2.m_as(energy)?,
            self.c3.m_as(energy)?,
            self.c4.m_as(energy)?,
            self.c5.m_as(energy)?,
        ])
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LennardJonesParams {
    pub sigma: Quantity,
    pub epsilon: Quantity,
}

impl LennardJonesParams {
    /// Returns `(sigma [nm], epsilon [kJ/mol])`.
    pub fn in_gromacs_units(&self) -> Result<(f64, f64), UnitError> {
        Ok((
            self.sigma.m_as(Unit::Nanometer)?,
            self.epsilon.m_as(Unit::KilojoulePerMole)?,
        ))
    }
}

/// Buckingham exp-6 parameters: `A exp(-B r) - C / r^6`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BuckinghamParams {
    pub a: Quantity,
    pub b: Quantity,
    pub c: Quantity,
}

impl BuckinghamParams {
    /// Returns `(A [kJ/mol], B [1/nm], C [kJ/mol nm^6])`.
    pub fn in_gromacs_units(&self) -> Result<(f64, f64, f64), UnitError> {
        Ok((
            self.a.m_as(Unit::KilojoulePerMole)?,
            self.b.m_as(Unit::PerNanometer)?,
            self.c.m_as(Unit::KilojoulePerMoleNanometer6)?,
        ))
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ChargeParams {
    pub charge: Quantity,
}

impl ChargeParams {
    pub fn charge_e(&self) -> Result<f64, UnitError> {
        self.charge.m_as(Unit::ElementaryCharge)
    }
}

/// Placement of a virtual site relative to its parent atoms.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct VirtualSiteParams {
    pub distance: Quantity,
    #[serde(default)]
    pub in_plane_angle: Option<Quantity>,
    #[serde(default)]
    pub out_of_plane_angle: Option<Quantity>,
}

impl VirtualSiteParams {
    pub fn distance_nm(&self) -> Result<f64, UnitError> {
        self.distance.m_as(Unit::Nanometer)
    }

    pub fn in_plane_angle_deg(&self) -> Result<Option<f64>, UnitError> {
        self.in_plane_angle
            .map(|q| q.m_as(Unit::Degree))
            .transpose()
    }

    /// Out-of-plane angle in degrees; an absent angle is zero.
    pub fn out_of_plane_angle_deg(&self) -> Result<f64, UnitError> {
        self.out_of_plane_angle
            .map_or(Ok(0.0), |q| q.m_as(Unit::Degree))
    }
}
