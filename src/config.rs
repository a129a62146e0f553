pub const DEFAULT_VERTEX_COLOR: [f64; 3] = [0.8, 0.8, 0.8]; // reflectance of vertices without color or material
pub const SCENE_EXTENSION: &str = ".obj"; // format of the scenes read and written
pub const CACHE_ENTRY_PREFIX: &str = "system-";
pub const CACHE_ENTRY_EXTENSION: &str = ".bin";
pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}";
