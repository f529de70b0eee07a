//! Load a reference map, build its resolution pyramid and write a PNG
//! preview of every level.
//!
//! ```bash
//! map_pyramid --folder maps --name office --levels 3 --out /tmp/pyramid
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use grid_localizer::LocalizerConfig;
use grid_localizer::loaders::load_reference_map;
use grid_localizer::visualization::grid_map_to_image;

#[derive(Debug, Parser)]
#[command(about = "Build and preview the resolution pyramid of a reference map")]
struct Args {
    /// Folder holding `<name>.yaml` and its image.
    #[arg(long)]
    folder: PathBuf,
    /// Base name of the map definition file.
    #[arg(long)]
    name: String,
    /// Number of coarser levels. Defaults to `coarse_level` from the config.
    #[arg(long)]
    levels: Option<usize>,
    /// Localizer configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory for the PNG previews.
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => LocalizerConfig::from_yaml_file(path)?,
        None => LocalizerConfig::default(),
    };
    let levels = args.levels.unwrap_or(config.coarse_level);

    let reference = load_reference_map(&args.folder, &args.name)?;
    std::fs::create_dir_all(&args.out)?;

    for (level, grid) in reference.pyramid(levels)?.iter().enumerate() {
        let path = args.out.join(format!("{}_level{level}.png", args.name));
        grid_map_to_image(grid).save(&path)?;
        info!(
            "level {level}: {}x{} cells @ {} m, {} occupied -> {}",
            grid.width(),
            grid.height(),
            grid.resolution(),
            grid.occupied_cells(grid.occupied_thresh()).len(),
            path.display()
        );
    }

    Ok(())
}
