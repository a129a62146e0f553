use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::SCENE_EXTENSION;


/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    /// Path to the input scene.
    pub scene: String,
    /// Path of the solved scene to write.
    pub output: String,
    /// Names of the objects whose faces emit light.
    pub lamps: Vec<String>,
    /// Gamma exponent applied to the saturated radiosity.
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// Directory of the persisted system cache. No cache is used if unset.
    pub cache_dir: Option<String>,
    /// Size of the worker pool. Defaults to one worker per core.
    pub threads: Option<usize>,
}

fn default_gamma() -> f64 {
    1.0
}

impl Settings {
    /// Path of the JSON summary written next to the solved scene.
    pub fn result_path(&self) -> PathBuf {
        Path::new(&self.output).with_extension("json")
    }
}

pub fn load_default_config() -> Result<Settings> {
    let root_dir = retrieve_project_root()?;
    let default_config_file = root_dir.join("config/default.toml");

    let settings: Config = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("Error loading configuration")?;

    let config: Settings = settings
        .try_deserialize()
        .context("Error deserializing configuration")?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the configuration files, then applies the command line on top.
pub fn load_config() -> Result<Settings> {
    load_config_with(CliArgs::parse())
}

pub fn load_config_with(args: CliArgs) -> Result<Settings> {
    let root_dir = retrieve_project_root()?;

    let default_config_file = root_dir.join("config/default.toml");
    let local_config = root_dir.join("config/local.toml");

    // Check if local config exists, if not use default
    let config_file = if local_config.exists() {
        info!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let settings: Config = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(
            Environment::with_prefix("radiosity")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("lamps"),
        )
        .build()
        .context("Error loading configuration")?;

    let mut config: Settings = settings
        .try_deserialize()
        .context("Error deserializing configuration")?;

    apply_args(&mut config, args);
    validate_config(&config)?;

    if let Ok(text) = toml::to_string_pretty(&config) {
        debug!("Effective configuration:\n{}", text);
    }

    Ok(config)
}

fn apply_args(config: &mut Settings, args: CliArgs) {
    if let Some(scene) = args.scene {
        config.scene = scene;
    }
    if !args.lamps.is_empty() {
        config.lamps = args.lamps;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(gamma) = args.gamma {
        config.gamma = gamma;
    }
    if let Some(cache_dir) = args.cache_dir {
        config.cache_dir = Some(cache_dir);
    }
    if args.no_cache {
        config.cache_dir = None;
    }
    if let Some(threads) = args.threads {
        config.threads = Some(threads);
    }
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the RADIOSITY_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("RADIOSITY_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    // Start from the executable directory and walk upward
    let exe_path = env::current_exe().context("Failed to get current executable path")?;
    let mut current_dir = exe_path.parent();
    while let Some(dir) = current_dir {
        if dir.join("config").is_dir() {
            return Ok(dir.to_path_buf());
        }
        current_dir = dir.parent();
    }

    Err(anyhow!(
        "Could not find project root directory, set RADIOSITY_ROOT_DIR"
    ))
}

fn validate_config(config: &Settings) -> Result<()> {
    if !config.scene.ends_with(SCENE_EXTENSION) {
        bail!(
            "Invalid file format: {}. Please provide a {} file",
            config.scene,
            SCENE_EXTENSION
        );
    }
    if !Path::new(&config.scene).exists() {
        bail!("The file {} does not exist.", config.scene);
    }
    if !config.output.ends_with(SCENE_EXTENSION) {
        bail!(
            "Invalid file format: {}. Please provide a {} name for the output file.",
            config.output,
            SCENE_EXTENSION
        );
    }
    if !(0.0..=1.0).contains(&config.gamma) {
        bail!(
            "Invalid gamma value: {:.2}. Please provide a gamma factor between 0.0 and 1.0.",
            config.gamma
        );
    }
    if config.lamps.is_empty() {
        bail!("At least one light object name is required.");
    }
    if config.threads == Some(0) {
        bail!("The number of threads must be greater than 0.");
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Radiosity - diffuse global illumination for triangulated scenes"
)]
pub struct CliArgs {
    /// File path to the input scene. Only the Wavefront .obj format is supported.
    /// Vertex colors (`v x y z r g b`) or material diffuse colors are used as reflectance.
    scene: Option<String>,

    /// Names of the light objects, separated by spaces.
    lamps: Vec<String>,

    /// File path of the solved scene. A JSON summary is written next to it.
    #[arg(short, long)]
    output: Option<String>,

    /// Gamma factor for gamma correction, between 0.0 and 1.0.
    #[arg(short, long)]
    gamma: Option<f64>,

    /// Directory holding the persisted radiosity systems.
    #[arg(long)]
    cache_dir: Option<String>,

    /// Always rebuild the radiosity system, ignoring any cache directory.
    #[arg(long, conflicts_with = "cache_dir")]
    no_cache: bool,

    /// Number of worker threads.
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Scene: {}
  - Output: {}
  - Lamps: {:?}
  - Gamma: {:.6}
  - Cache Directory: {}
  - Threads: {}
  ",
            self.scene,
            self.output,
            self.lamps,
            self.gamma,
            self.cache_dir.as_deref().unwrap_or("none"),
            self.threads
                .map(|n| n.to_string())
                .unwrap_or_else(|| "auto".to_string()),
        )
    }
}
