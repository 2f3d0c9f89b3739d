//! Final stage: hand the assembled inputs to the site generator.

use tracing::info;

use crate::config::Config;
use crate::contract::CommandRunner;
use crate::error::Result;
use crate::pipeline::{BuildStep, CommandSpec};

pub fn site_build_command(config: &Config) -> CommandSpec {
    CommandSpec::from_argv(
        BuildStep::SiteBuild,
        &config.toolchain().site_build_command,
        &config.site().root,
    )
}

pub fn build_site<R>(runner: &R, config: &Config) -> Result<()>
where
    R: CommandRunner + ?Sized,
{
    let spec = site_build_command(config);
    info!(command = %spec.command_line(), "=> Running site build");
    runner.run(&spec)?;
    info!("=> Docs built successfully");
    Ok(())
}
