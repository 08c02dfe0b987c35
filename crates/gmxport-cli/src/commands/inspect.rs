use crate::cli::InspectGroArgs;
use crate::error::{CliError, Result};
use gmxport::core::io::gro::{GroFile, GroFrame};
use gmxport::core::io::traits::ReadableFile;
use tracing::info;

pub fn run(args: InspectGroArgs) -> Result<()> {
    info!("Reading coordinate file {:?}", &args.input);
    let frame = GroFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    print!("{}", describe(&frame));
    Ok(())
}

fn describe(frame: &GroFrame) -> String {
    let mut residues: Vec<(usize, &str)> = frame
        .particles
        .iter()
        .map(|p| (p.residue_number, p.residue_name.as_str()))
        .collect();
    residues.dedup();

    let b = &frame.box_vectors;
    format!(
        "Title:     {}\nParticles: {}\nResidues:  {}\nPrecision: {} decimals\nBox (nm):  {:.5} {:.5} {:.5}\n",
        frame.title,
        frame.particles.len(),
        residues.len(),
        frame.precision,
        b[(0, 0)],
        b[(1, 1)],
        b[(2, 2)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const WATER_GRO: &str = "\
tip3p
    3
    1HOH      O    1   0.000   0.000   0.000
    1HOH     H1    2   0.096   0.000   0.000
    1HOH     H2    3  -0.024   0.093   0.000
   3.00000   3.00000   3.00000
";

    #[test]
    fn describe_summarizes_frame() {
        let frame = GroFile::read_from(&mut WATER_GRO.as_bytes()).unwrap();
        let text = describe(&frame);
        assert!(text.contains("Title:     tip3p"));
        assert!(text.contains("Particles: 3"));
        assert!(text.contains("Residues:  1"));
        assert!(text.contains("Precision: 3 decimals"));
        assert!(text.contains("3.00000 3.00000 3.00000"));
    }

    #[test]
    fn unreadable_file_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.gro");
        fs::write(&path, "title\nnot a number\n").unwrap();

        let result = run(InspectGroArgs { input: path });
        assert!(matches!(result, Err(CliError::FileParsing { .. })));

        let result = run(InspectGroArgs {
            input: dir.path().join("missing.gro"),
        });
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
