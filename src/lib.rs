pub mod cache;
pub mod config;
pub mod corrections;
pub mod geom;
pub mod output;
pub mod problem;
pub mod result;
pub mod scene;
pub mod settings;
pub mod shape_factor;
pub mod solver;
pub mod system;
pub mod visibility;
