use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use apigen_core::emit::{emit_target, emitter_for};
use apigen_core::{GeneratedCode, GeneratorConfig, Target, prepare_from_str};
use clap::Args;
use rayon::prelude::*;
use tracing::{debug, info};

/// `all` or a single target name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets(Vec<Target>);

impl FromStr for Targets {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(Self(Target::ALL.to_vec()))
        } else {
            s.parse().map(|target| Self(vec![target]))
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// OpenAPI document, JSON or YAML
    #[arg(long, short, value_name = "FILE")]
    pub input: PathBuf,

    /// mobile, server, web or all
    #[arg(long, short, default_value = "all", value_parser = Targets::from_str)]
    pub target: Targets,

    /// Output directory; each target writes below `<out>/<target>/`
    #[arg(long, short, value_name = "DIR")]
    pub out: PathBuf,

    /// TOML generator configuration
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: &GenerateArgs) -> i32 {
    match generate(args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
}

fn generate(args: &GenerateArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => GeneratorConfig::from_toml_str(&read(path)?).map_err(|e| e.to_string())?,
        None => GeneratorConfig::default(),
    };
    let api = prepare_from_str(&read(&args.input)?).map_err(|e| e.to_string())?;

    // One shared resolved API, one emitter per target.
    let results: Vec<_> = args
        .target
        .0
        .par_iter()
        .map(|target| emit_target(&api, emitter_for(*target, &config).as_ref()))
        .collect();

    for result in results {
        let code = result.map_err(|e| e.to_string())?;
        let dir = args.out.join(code.target.as_str());
        write_artifacts(&dir, &code)?;
        for exclusion in &code.excluded {
            println!(
                "{}: skipped {} ({})",
                code.target, exclusion.operation_name, exclusion.reason
            );
        }
        println!(
            "{}: wrote {} files to {}",
            code.target,
            code.artifacts.len(),
            dir.display()
        );
    }
    Ok(())
}

fn write_artifacts(dir: &Path, code: &GeneratedCode) -> Result<(), String> {
    for artifact in &code.artifacts {
        let path = dir.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
        fs::write(&path, &artifact.contents)
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        debug!(path = %path.display(), "Wrote artifact");
    }
    info!(target = %code.target, dir = %dir.display(), files = code.artifacts.len(), "Target written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_selection() {
        assert_eq!("all".parse::<Targets>().unwrap().0.len(), 3);
        assert_eq!("web".parse::<Targets>().unwrap().0, vec![Target::WebClient]);
        assert!("desktop".parse::<Targets>().is_err());
    }
}
