use std::path::PathBuf;

pub const USAGE: &str = "Usage: workout-grid [--sample] [--db <path>]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Run against an in-memory store seeded with sample workouts.
    pub sample: bool,
    pub db: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliMode {
    Run(CliOptions),
    Help,
}

pub fn parse_cli_mode(args: impl IntoIterator<Item = String>) -> Result<CliMode, String> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sample" => {
                options.sample = true;
            }
            "--db" => {
                let path = args
                    .next()
                    .filter(|value| !value.starts_with("--"))
                    .ok_or_else(|| "--db needs a path".to_string())?;
                options.db = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Ok(CliMode::Help),
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    Ok(CliMode::Run(options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliMode, String> {
        parse_cli_mode(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn no_arguments_runs_with_defaults() {
        assert_eq!(parse(&[]), Ok(CliMode::Run(CliOptions::default())));
    }

    #[test]
    fn sample_and_db_flags() {
        let mode = parse(&["--sample", "--db", "/tmp/w.db"]).unwrap();
        assert_eq!(mode, CliMode::Run(CliOptions {
            sample: true,
            db: Some(PathBuf::from("/tmp/w.db")),
        }));
    }

    #[test]
    fn db_without_path_is_an_error() {
        assert!(parse(&["--db"]).is_err());
        assert!(parse(&["--db", "--sample"]).is_err());
    }

    #[test]
    fn help_and_unknown_arguments() {
        assert_eq!(parse(&["--help"]), Ok(CliMode::Help));
        assert_eq!(parse(&["--agenda"]), Err("Unknown argument: --agenda".to_string()));
    }
}
