use crate::core::io::gro::GroFile;
use crate::core::io::top::TopFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::system::Model;
use crate::engine::config::ExportConfig;
use crate::engine::error::ExportError;
use crate::engine::plan::TopologyPlan;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Record counts of one export, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportSummary {
    pub atoms: usize,
    pub virtual_sites: usize,
    pub pairs: usize,
    pub bonds: usize,
    pub angles: usize,
    pub dihedrals: usize,
}

impl ExportSummary {
    fn from_plan(plan: &TopologyPlan) -> Self {
        let topology = &plan.topology;
        Self {
            atoms: topology.atoms.len() - topology.virtual_sites.len(),
            virtual_sites: topology.virtual_sites.len(),
            pairs: topology.pairs.len(),
            bonds: topology.bonds.len(),
            angles: topology.angles.len(),
            dihedrals: topology.dihedrals.len(),
        }
    }
}

/// Both output files, rendered but not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedExport {
    pub gro: String,
    pub top: String,
    pub summary: ExportSummary,
}

/// Plans `model` and renders both files into memory.
#[instrument(skip_all, name = "render_workflow")]
pub fn render(model: &Model, config: &ExportConfig) -> Result<RenderedExport, ExportError> {
    info!(
        "Planning export of {} atoms across {} residues.",
        model.n_atoms(),
        model.residues().len()
    );
    let plan = TopologyPlan::build(model, config)?;

    info!("Rendering coordinate and topology files.");
    let gro = GroFile::render(&plan.coordinates)?;
    let top = TopFile::render(&plan.topology)?;

    Ok(RenderedExport {
        gro,
        top,
        summary: ExportSummary::from_plan(&plan),
    })
}

/// Writes `contents` to a temporary file beside `path`, ready to be persisted.
fn stage(path: &Path, contents: &str) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents.as_bytes())?;
    staged.as_file().sync_all()?;
    if let Ok(metadata) = fs::metadata(path) {
        staged.as_file().set_permissions(metadata.permissions())?;
    }
    Ok(staged)
}

/// Exports `model` to a `.gro`/`.top` pair.
///
/// Both files are rendered and staged next to their targets before either
/// target is replaced, so a failed render or an unwritable destination
/// leaves existing targets untouched.
#[instrument(skip_all, name = "export_workflow")]
pub fn run(
    model: &Model,
    config: &ExportConfig,
    gro_path: &Path,
    top_path: &Path,
) -> Result<ExportSummary, ExportError> {
    let rendered = render(model, config)?;

    let staged_gro = stage(gro_path, &rendered.gro)?;
    let staged_top = stage(top_path, &rendered.top)?;
    debug!("Staged both outputs; committing.");
    staged_gro.persist(gro_path).map_err(|e| e.error)?;
    staged_top.persist(top_path).map_err(|e| e.error)?;
    info!(
        "Wrote {} and {}.",
        gro_path.display(),
        top_path.display()
    );
    Ok(rendered.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::{ChargeParams, LennardJonesParams};
    use crate::core::forcefield::table::{ElectrostaticsHandler, NonbondedHandler};
    use crate::core::models::atom::Atom;
    use crate::core::models::keys::{Category, ParticleKey};
    use crate::core::models::units::{Quantity, Unit};
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn argon() -> Model {
        let mut model = Model::new();
        let res = model.add_residue("AR");
        model
            .add_atom(Atom::new(
                "AR",
                "Ar".parse().unwrap(),
                res,
                Point3::new(1.0, 2.0, 3.0),
            ))
            .unwrap();
        let ff = model.force_field_mut();
        let mut vdw = NonbondedHandler::new(Category::Vdw, "lorentz-berthelot", 0.5);
        vdw.table.assign(ParticleKey::Atom(0), "ar");
        vdw.table.insert_potential(
            "ar",
            LennardJonesParams {
                sigma: Quantity::new(0.34, Unit::Nanometer),
                epsilon: Quantity::new(0.99, Unit::KilojoulePerMole),
            },
        );
        ff.vdw = Some(vdw);
        let mut electrostatics = ElectrostaticsHandler::new(0.8333333333);
        electrostatics.table.assign(ParticleKey::Atom(0), "ar");
        electrostatics.table.insert_potential(
            "ar",
            ChargeParams {
                charge: Quantity::new(0.0, Unit::ElementaryCharge),
            },
        );
        ff.electrostatics = Some(electrostatics);
        model
    }

    #[test]
    fn run_writes_both_files() {
        let dir = tempdir().unwrap();
        let gro_path = dir.path().join("argon.gro");
        let top_path = dir.path().join("argon.top");

        let summary = run(&argon(), &ExportConfig::default(), &gro_path, &top_path).unwrap();
        assert_eq!(summary.atoms, 1);
        assert_eq!(summary.virtual_sites, 0);

        let gro = fs::read_to_string(&gro_path).unwrap();
        let top = fs::read_to_string(&top_path).unwrap();
        assert!(gro.starts_with("Generated by gmxport\n1\n"));
        assert!(top.contains("[ moleculetype ]"));
    }

    #[test]
    fn failed_export_leaves_existing_files_untouched() {
        let dir = tempdir().unwrap();
        let gro_path = dir.path().join("out.gro");
        let top_path = dir.path().join("out.top");
        fs::write(&gro_path, "previous").unwrap();

        let mut model = argon();
        model.force_field_mut().electrostatics = None;
        let result = run(&model, &ExportConfig::default(), &gro_path, &top_path);

        assert!(matches!(result, Err(ExportError::UnsupportedExport(_))));
        assert_eq!(fs::read_to_string(&gro_path).unwrap(), "previous");
        assert!(!top_path.exists());
    }

    #[test]
    fn unwritable_topology_target_leaves_coordinates_untouched() {
        let dir = tempdir().unwrap();
        let gro_path = dir.path().join("out.gro");
        let top_path = dir.path().join("missing").join("out.top");
        fs::write(&gro_path, "previous").unwrap();

        let result = run(&argon(), &ExportConfig::default(), &gro_path, &top_path);

        assert!(matches!(result, Err(ExportError::Io(_))));
        assert_eq!(fs::read_to_string(&gro_path).unwrap(), "previous");
        assert!(!top_path.exists());
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("out.gro")]);
    }

    #[test]
    fn run_replaces_existing_outputs() {
        let dir = tempdir().unwrap();
        let gro_path = dir.path().join("argon.gro");
        let top_path = dir.path().join("argon.top");
        fs::write(&gro_path, "stale").unwrap();
        fs::write(&top_path, "stale").unwrap();

        run(&argon(), &ExportConfig::default(), &gro_path, &top_path).unwrap();

        assert!(fs::read_to_string(&gro_path).unwrap().starts_with("Generated by gmxport\n"));
        assert!(fs::read_to_string(&top_path).unwrap().contains("[ system ]"));
    }
}
