#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
mod board;

#[cfg(target_os = "linux")]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use log::info;
    use sampler::{allocate_run_directory, run_all, DEFAULT_RUN_DIRECTORY_BASE};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let run_dir = allocate_run_directory(DEFAULT_RUN_DIRECTORY_BASE)
        .context("failed to allocate run directory")?;
    let bus = board::open_bus()?;
    let handles = board::start_loops(&bus, &run_dir)?;

    info!("sampling into {}", run_dir.display());
    let counts = run_all(handles).context("sampling loop failed")?;
    info!("all loops stopped after {:?} iterations", counts);
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    anyhow::bail!("an I2C adapter is only available on Linux")
}
