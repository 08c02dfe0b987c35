use crate::cli::ExportArgs;
use crate::config::PartialExportConfig;
use crate::error::Result;
use gmxport::core::models::system::Model;
use gmxport::workflows;
use tracing::info;

pub fn run(args: ExportArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialExportConfig::from_file(path)?,
        None => PartialExportConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    info!("Loading model from {:?}", &args.input);
    let model = Model::load(&args.input)?;

    let summary = workflows::export::run(&model, &config, &args.gro, &args.top)?;

    println!(
        "✓ Exported {} atoms and {} virtual sites.",
        summary.atoms, summary.virtual_sites
    );
    println!(
        "  {} bonds, {} angles, {} dihedrals, {} pairs",
        summary.bonds, summary.angles, summary.dihedrals, summary.pairs
    );
    println!("  Coordinates: {}", args.gro.display());
    println!("  Topology:    {}", args.top.display());
    Ok(())
}
