use clap::{value_t, App, AppSettings, Arg};
use failure::{Error, ResultExt};
use game::EngineState;
use log::{error, info, warn};
use math::Pnt2f;
use std::path::PathBuf;
use std::time::Instant;
use wad::{Archive, WadMetadata};

type Result<T> = std::result::Result<T, Error>;

pub struct Inputs {
    wad_file: PathBuf,
    gwa_file: Option<PathBuf>,
    metadata_file: Option<PathBuf>,
}

impl Inputs {
    fn open(&self) -> Result<(Archive, Option<Archive>, WadMetadata)> {
        let wad = Archive::open(&self.wad_file)
            .with_context(|_| format!("Could not open {:?}", self.wad_file))?;
        let gwa = match self.gwa_file {
            Some(ref gwa_file) => Some(
                Archive::open(gwa_file)
                    .with_context(|_| format!("Could not open {:?}", gwa_file))?,
            ),
            None => None,
        };
        let metadata = match self.metadata_file {
            Some(ref metadata_file) => WadMetadata::from_file(metadata_file)?,
            None => {
                info!("No metadata file, using defaults.");
                WadMetadata::default()
            }
        };
        Ok((wad, gwa, metadata))
    }
}

pub enum RunMode {
    ListLevelNames(Inputs),
    Check(Inputs),
    Summary { inputs: Inputs, level: String },
}

impl RunMode {
    pub fn from_args() -> Result<RunMode> {
        let matches = App::new("Rust GL Doom")
            .version(env!("CARGO_PKG_VERSION"))
            .author("Cristi Cobzarenco <cristi.cobzarenco@gmail.com>")
            .about("Loads Doom levels with GL nodes and builds their render meshes.")
            .settings(&[AppSettings::ColoredHelp])
            .arg(
                Arg::with_name("iwad")
                    .long("iwad")
                    .short("i")
                    .help("WAD file to load textures and levels from")
                    .value_name("FILE")
                    .default_value("doom1.wad"),
            )
            .arg(
                Arg::with_name("gwa")
                    .long("gwa")
                    .short("g")
                    .help("separate file holding the GL nodes, if they are not in the WAD")
                    .value_name("FILE")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("metadata")
                    .long("metadata")
                    .short("m")
                    .help("path to TOML metadata file, e.g. assets/meta/doom.toml")
                    .value_name("FILE")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("level")
                    .long("level")
                    .short("l")
                    .help("name of the level to load")
                    .value_name("NAME")
                    .default_value("E1M1"),
            )
            .arg(
                Arg::with_name("check")
                    .long("check")
                    .help("load every level with GL nodes, then exit"),
            )
            .arg(
                Arg::with_name("list-levels")
                    .long("list-levels")
                    .help("list the indices and names of all the levels in the WAD, then exit"),
            )
            .get_matches();

        let inputs = Inputs {
            wad_file: value_t!(matches, "iwad", String)?.into(),
            gwa_file: matches.value_of("gwa").map(PathBuf::from),
            metadata_file: matches.value_of("metadata").map(PathBuf::from),
        };

        Ok(if matches.is_present("list-levels") {
            RunMode::ListLevelNames(inputs)
        } else if matches.is_present("check") {
            RunMode::Check(inputs)
        } else {
            RunMode::Summary {
                inputs,
                level: value_t!(matches, "level", String)?,
            }
        })
    }
}

fn list_levels(inputs: &Inputs) -> Result<()> {
    let wad = Archive::open(&inputs.wad_file)?;
    for (i_level, name) in wad.level_names().enumerate() {
        println!("{:3} {:8}", i_level, name);
    }
    Ok(())
}

fn check(inputs: &Inputs) -> Result<()> {
    let (wad, gwa, metadata) = inputs.open()?;
    let gl = gwa.as_ref().unwrap_or(&wad);

    info!("Loading all levels...");
    let start_time = Instant::now();
    let (mut num_loaded, mut num_failed) = (0, 0);
    for name in wad.level_names() {
        let name = name.to_string();
        if let Err(err) = gl.find_record(format!("GL_{}", name).as_str()) {
            if err.kind().is_not_found() {
                warn!("Level {} has no GL nodes, skipping.", name);
            } else {
                error!("Level {}: {}", name, err);
                num_failed += 1;
            }
            continue;
        }
        match EngineState::load(&wad, gwa.as_ref(), &name, &metadata) {
            Ok(_) => num_loaded += 1,
            Err(err) => {
                error!("Level {}: {}", name, err);
                num_failed += 1;
            }
        }
    }
    info!(
        "Done loading {} levels ({} failed) in {:.2}ms.",
        num_loaded,
        num_failed,
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

fn summary(inputs: &Inputs, level: &str) -> Result<()> {
    let (wad, gwa, metadata) = inputs.open()?;
    let state = EngineState::load(&wad, gwa.as_ref(), level, &metadata)?;

    let map = state.level();
    let index = state.index();
    println!("Level {}", map.name);
    println!("  {:6} vertices", map.vertices.len());
    println!("  {:6} linedefs", map.linedefs.len());
    println!("  {:6} sidedefs", map.sidedefs.len());
    println!("  {:6} sectors", map.sectors.len());
    println!("  {:6} things", map.things.len());
    println!("  {:6} GL vertices", index.vertices.len());
    println!("  {:6} segs", index.segs.len());
    println!("  {:6} leaves", index.leaves.len());
    println!("  {:6} nodes", index.nodes.len());
    println!("  {:6} flats", state.flats().len());
    println!("  {:6} wall textures", state.walls().len());
    println!("  {:6} palettes", state.palettes().len());

    let stats = &state.meshes().stats;
    println!("Meshes");
    println!("  {:6} leaves ({} degenerate)", stats.num_leaves, stats.num_degenerate_leaves);
    println!("  {:6} floor polygons", stats.num_floor_polys);
    println!(
        "  {:6} ceiling polygons ({} sky)",
        stats.num_ceil_polys, stats.num_sky_ceil_polys
    );
    println!("  {:6} lower quads", stats.num_lower_quads);
    println!("  {:6} upper quads", stats.num_upper_quads);
    println!("  {:6} middle quads", stats.num_middle_quads);
    println!("  {:6} sky quads", stats.num_sky_quads);
    println!("  {:6} skipped segs", stats.num_skipped_segs);
    println!("  {:6} triangles", stats.num_triangles);
    println!("  max height {}", state.meshes().max_height);

    match map.player_start() {
        Some(start) => {
            let leaf = index.locate_leaf(Pnt2f::new(start.position.x, start.position.y));
            println!(
                "Player start at ({}, {}) facing {:.1} degrees, in leaf {:?}",
                start.position.x,
                start.position.y,
                start.angle.0.to_degrees(),
                leaf
            );
        }
        None => println!("No player start"),
    }
    let eye = state.camera().position;
    println!("Eye at ({}, {}, {})", eye.x, eye.y, eye.z);
    Ok(())
}

fn run() -> Result<()> {
    env_logger::init();

    match RunMode::from_args()? {
        RunMode::ListLevelNames(inputs) => list_levels(&inputs)?,
        RunMode::Check(inputs) => check(&inputs)?,
        RunMode::Summary { inputs, level } => summary(&inputs, &level)?,
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        for cause in err.iter_causes() {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
