use anyhow::Result;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    pub scene: PathBuf,
    pub width: f32,
    pub height: f32,
    pub speed_ms: Option<u64>,
    pub explode: bool,
    pub print_ops: bool,
    pub config: Option<PathBuf>,
    pub write_config: bool,
}

pub fn parse_args() -> Result<CliConfig> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_dimension(flag: &str, value: Option<OsString>) -> Result<f32> {
    let Some(value) = value else {
        anyhow::bail!("{flag} expects a number of pixels");
    };
    let value = value.to_string_lossy();
    match value.parse::<f32>() {
        Ok(px) if px > 0.0 => Ok(px),
        _ => anyhow::bail!("invalid {flag}: {value} (expected a positive number)"),
    }
}

fn parse_args_from<I>(args: I) -> Result<CliConfig>
where
    I: IntoIterator<Item = OsString>,
{
    let mut scene = None;
    let mut width = 800.0;
    let mut height = 600.0;
    let mut speed_ms = None;
    let mut explode = false;
    let mut print_ops = false;
    let mut config = None;
    let mut write_config = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--scene" {
            let Some(path) = args.next() else {
                anyhow::bail!("--scene expects a path");
            };
            scene = Some(PathBuf::from(path));
        } else if arg == "--width" {
            width = parse_dimension("--width", args.next())?;
        } else if arg == "--height" {
            height = parse_dimension("--height", args.next())?;
        } else if arg == "--speed-ms" {
            let Some(value) = args.next() else {
                anyhow::bail!("--speed-ms expects milliseconds");
            };
            let value = value.to_string_lossy();
            let Ok(ms) = value.parse::<u64>() else {
                anyhow::bail!("invalid --speed-ms: {value}");
            };
            speed_ms = Some(ms);
        } else if arg == "--config" {
            let Some(path) = args.next() else {
                anyhow::bail!("--config expects a path");
            };
            config = Some(PathBuf::from(path));
        } else if arg == "--explode" {
            explode = true;
        } else if arg == "--ops" {
            print_ops = true;
        } else if arg == "--write-config" {
            write_config = true;
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    let Some(scene) = scene else {
        anyhow::bail!("--scene <path> is required");
    };

    Ok(CliConfig {
        scene,
        width,
        height,
        speed_ms,
        explode,
        print_ops,
        config,
        write_config,
    })
}
