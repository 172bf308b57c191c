use clap::Parser;
use env_logger::Builder;
use fast_wrap::options::{Center, Execution, WrapOptions};
use fast_wrap::trajectory::{Topology, Trajectory};
use fast_wrap::wrap::wrap_in_place;
use fast_wrap::WrapError;
use log::{info, LevelFilter};
use std::path::PathBuf;

/// Wrap a trajectory.
#[derive(Parser, Debug)]
#[command(name = "fast_wrap", version, about = "Wrap a trajectory.", long_about = None)]
struct Args {
    /// Unwrapped trajectory file (JSON)
    #[arg(short = 'f', long = "traj")]
    traj: PathBuf,

    /// Topology file (JSON); replaces the residues stored in the trajectory
    #[arg(short = 'c', long = "top")]
    top: Option<PathBuf>,

    /// Output file (JSON)
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Don't keep molecules whole
    #[arg(long)]
    nowhole: bool,

    /// Center the box at the origin instead of at half the box lengths
    #[arg(long, conflicts_with = "center")]
    center_origin: bool,

    /// Center the box at "x,y,z"
    #[arg(long, allow_hyphen_values = true)]
    center: Option<Center>,

    /// Spread the work over all cores
    #[arg(long)]
    parallel: bool,

    /// JSON file with wrapping options; command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Wrapping options from the `--config` file, overridden by the command line flags.
fn options(args: &Args) -> Result<WrapOptions, WrapError> {
    let mut options = match &args.config {
        Some(path) => WrapOptions::load_from_file(path)?,
        None => WrapOptions::default(),
    };
    if args.nowhole {
        options.whole_molecules = false;
    }
    if args.center_origin {
        options.center = Some(Center::origin());
    }
    if let Some(center) = args.center {
        options.center = Some(center);
    }
    if args.parallel {
        options.execution = Execution::Parallel;
    }
    Ok(options)
}

fn main() -> Result<(), WrapError> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new().filter_level(level).parse_default_env().init();

    let options = options(&args)?;

    let mut traj = Trajectory::load_from_file(&args.traj)?;
    if let Some(top) = &args.top {
        traj = traj.with_topology(Topology::load_from_file(top)?)?;
    }
    info!(
        "Loaded {} frames of {} atoms in {} residues from {}",
        traj.n_frames(),
        traj.n_atoms(),
        traj.topology().residues.len(),
        args.traj.display()
    );

    wrap_in_place(&mut traj, &options)?;

    traj.save_to_file(&args.output)?;
    info!("Wrapped trajectory written to {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(flags: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["fast_wrap", "-f", "in.json", "-o", "out.json"];
        argv.extend_from_slice(flags);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_defaults_without_flags() {
        let args = parse(&[]).unwrap();
        assert_eq!(options(&args).unwrap(), WrapOptions::default());
    }

    #[test]
    fn test_flags_override_config() -> Result<(), WrapError> {
        let mut config = NamedTempFile::new()?;
        write!(
            config,
            r#"{{"whole_molecules": true, "center": [1.0, 2.0, 3.0], "execution": "serial"}}"#
        )?;
        let config_path = config.path().to_string_lossy().into_owned();
        let config_path = config_path.as_str();

        let args = parse(&["--config", config_path]).unwrap();
        let from_file = options(&args)?;
        assert!(from_file.whole_molecules);
        assert_eq!(from_file.center, Some(Center::new([1.0, 2.0, 3.0])?));
        assert_eq!(from_file.execution, Execution::Serial);

        let args = parse(&[
            "--config",
            config_path,
            "--nowhole",
            "--center-origin",
            "--parallel",
        ])
        .unwrap();
        let merged = options(&args)?;
        assert!(!merged.whole_molecules);
        assert_eq!(merged.center, Some(Center::origin()));
        assert_eq!(merged.execution, Execution::Parallel);

        let args = parse(&["--config", config_path, "--center", "-1,0.5,4"]).unwrap();
        assert_eq!(options(&args)?.center, Some(Center::new([-1.0, 0.5, 4.0])?));
        Ok(())
    }

    #[test]
    fn test_center_flags_conflict() {
        let result = parse(&["--center-origin", "--center", "1,2,3"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_bad_center_is_rejected() {
        for center in ["1,2", "1,x,3", "1,2,inf"] {
            let result = parse(&["--center", center]);
            assert_eq!(
                result.unwrap_err().kind(),
                clap::error::ErrorKind::ValueValidation
            );
        }
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let args = parse(&["--config", "/nonexistent/options.json"]).unwrap();
        assert!(matches!(options(&args), Err(WrapError::Io(_))));
    }
}
