use super::error::ExportError;
use crate::core::forcefield::mixing::MixingRule;
use crate::core::forcefield::table::ForceField;

/// Which nonbonded functional form the export uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonbondedForm {
    LennardJones,
    Buckingham,
}

/// Global nonbonded settings that passed the compatibility gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedSettings {
    pub form: NonbondedForm,
    pub mixing_rule: MixingRule,
    /// 1-4 scale factor of the active van der Waals category.
    pub scale_lj: f64,
    /// 1-4 scale factor of electrostatics.
    pub scale_qq: f64,
}

impl NonbondedSettings {
    /// The `nbfunc` column of `[ defaults ]`.
    pub fn nbfunc(&self) -> u8 {
        match self.form {
            NonbondedForm::LennardJones => 1,
            NonbondedForm::Buckingham => 2,
        }
    }

    pub fn comb_rule(&self) -> u8 {
        self.mixing_rule.comb_rule()
    }
}

fn parse_rule(name: &str, allow_buckingham: bool) -> Result<MixingRule, ExportError> {
    match name.parse::<MixingRule>() {
        Ok(MixingRule::Buckingham) if !allow_buckingham => {
            Err(ExportError::UnsupportedMixingRule(name.to_string()))
        }
        Ok(rule) => Ok(rule),
        Err(_) => Err(ExportError::UnsupportedMixingRule(name.to_string())),
    }
}

/// Validates the nonbonded categories of `force_field` before any translation.
pub fn check_compatibility(force_field: &ForceField) -> Result<NonbondedSettings, ExportError> {
    let (form, mixing_rule, scale_lj) = match (&force_field.vdw, &force_field.buckingham) {
        (Some(_), Some(_)) => {
            return Err(ExportError::UnsupportedExport(
                "Cannot mix 12-6 and Buckingham potentials".to_string(),
            ));
        }
        (None, None) => {
            return Err(ExportError::UnsupportedExport(
                "no vdW interactions found".to_string(),
            ));
        }
        (Some(vdw), None) => (
            NonbondedForm::LennardJones,
            parse_rule(&vdw.mixing_rule, false)?,
            vdw.scale_14,
        ),
        (None, Some(buckingham)) => (
            NonbondedForm::Buckingham,
            parse_rule(&buckingham.mixing_rule, true)?,
            buckingham.scale_14,
        ),
    };

    let electrostatics = force_field
        .electrostatics
        .as_ref()
        .ok_or_else(|| ExportError::UnsupportedExport("no electrostatics found".to_string()))?;

    Ok(NonbondedSettings {
        form,
        mixing_rule,
        scale_lj,
        scale_qq: electrostatics.scale_14,
    })
}
