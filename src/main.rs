use std::path::PathBuf;

use clap::Parser;

use phosphor::app::{AppConfig, run};
use phosphor::logging::{LoggingConfig, init_logging};

#[derive(Parser, Debug)]
#[command(version, about = "Render a scene manifest to a numbered PNG sequence")]
struct Args {
    /// Scene manifest; models resolve relative to its directory
    #[arg(default_value = "assets/lunar.json")]
    manifest: PathBuf,

    /// Number of frames to render
    #[arg(long, short = 'n', default_value_t = 1)]
    frames: u32,

    /// Override the manifest viewport, as WIDTHxHEIGHT
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    size: Option<(u32, u32)>,

    /// Output directory
    #[arg(long, short = 'o', default_value = "frames")]
    out: PathBuf,

    /// Log filter, e.g. `phosphor=debug`; falls back to RUST_LOG
    #[arg(long)]
    log: Option<String>,
}

impl Args {
    fn into_configs(self) -> (AppConfig, LoggingConfig) {
        let mut config = AppConfig::new()
            .manifest(self.manifest)
            .output(self.out)
            .frames(self.frames);
        if let Some((width, height)) = self.size {
            config = config.size(width, height);
        }
        let mut logging = LoggingConfig::default();
        if let Some(filter) = self.log {
            logging = logging.with_filter(filter);
        }
        (config, logging)
    }
}

fn parse_size(text: &str) -> Result<(u32, u32), String> {
    let (w, h) = text
        .split_once('x')
        .ok_or_else(|| format!("'{}' is not WIDTHxHEIGHT", text))?;
    let side = |s: &str| match s.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("bad size component '{}'", s)),
    };
    Ok((side(w)?, side(h)?))
}

fn main() -> anyhow::Result<()> {
    let (config, logging) = Args::parse().into_configs();
    init_logging(logging);
    run(config)
}
