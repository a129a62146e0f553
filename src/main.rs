use anyhow::{Context, Result};
use log::info;
use radiosity::cache::SystemCache;
use radiosity::geom::Geom;
use radiosity::output;
use radiosity::problem::Problem;
use radiosity::scene::Scene;
use radiosity::settings;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = settings::load_config()?;
    info!("{}", settings);

    if let Some(threads) = settings.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the worker pool")?;
    }

    let geom = Geom::from_file(&settings.scene)?;
    let scene = Scene::from_objects(&geom.objects, &settings.lamps);
    info!(
        "Scene has {} faces, {} of them luminous",
        scene.len(),
        scene.num_luminous()
    );

    let cache = settings
        .cache_dir
        .as_ref()
        .map(|dir| SystemCache::new(dir.as_str()))
        .transpose()?;

    let mut problem = Problem::new(scene, cache);
    problem.solve()?;
    problem.apply_colors(settings.gamma);

    output::write_obj(&settings.output, &geom.objects, &problem.scene)?;
    output::write_result(settings.result_path(), &problem.result)?;

    println!("{}", problem.result);
    Ok(())
}
