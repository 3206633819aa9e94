//! Command-line arguments of the `volprobe` binary.

use std::path::PathBuf;

use clap::Parser;

/// Parsed command line.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about = "Volumetric light-probe pipeline (headless)")]
pub struct CliArgs {
    /// Scene config, JSON or `key = value` text
    pub config: PathBuf,

    /// Updates to run after priming
    #[arg(long, default_value_t = 1)]
    pub frames: usize,

    /// Write the filtered volume (mip 0) as a .vol file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Write the middle z slice of the filtered volume as a PNG
    #[arg(long, value_name = "FILE")]
    pub slice: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("volprobe").chain(args.iter().copied()))
    }

    #[test]
    fn test_config_only() {
        let args = parse(&["scene.txt"]).unwrap();
        assert_eq!(args.config, PathBuf::from("scene.txt"));
        assert_eq!(args.frames, 1);
        assert!(args.export.is_none());
        assert!(args.slice.is_none());
    }

    #[test]
    fn test_all_options() {
        let args = parse(&[
            "--frames",
            "12",
            "scene.json",
            "--export",
            "out.vol",
            "--slice",
            "out.png",
        ])
        .unwrap();
        assert_eq!(args.frames, 12);
        assert_eq!(args.config, PathBuf::from("scene.json"));
        assert_eq!(args.export, Some(PathBuf::from("out.vol")));
        assert_eq!(args.slice, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["a", "b"]).is_err());
        assert!(parse(&["a", "--frames"]).is_err());
        assert!(parse(&["a", "--frames", "many"]).is_err());
        assert!(parse(&["a", "--verbose"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
