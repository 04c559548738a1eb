//! Check command - runs the conformance checks over a project

use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::debug;
use tsgate_core::analysis::{AnalysisEngine, CheckerCache, find_exemption_config};
use tsgate_core::config::tsconfig::find_tsconfig;
use tsgate_core::config::{Config, find_config_file, load_config_or_default_with_warnings};
use tsgate_core::diagnostic::Diagnostic;
use tsgate_core::program::Program;
use tsgate_core::rules::{Confidence, Severity};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to file or directory to analyze (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// tsconfig.json whose plugin options locate the exemption list
    #[arg(short, long, value_name = "TSCONFIG")]
    pub project: Option<PathBuf>,

    /// Output format for diagnostics (pretty, json)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Also report failures silenced by the exemption list
    #[arg(long)]
    pub audit: bool,

    /// Filter diagnostics by minimum confidence level (high, medium, low)
    #[arg(long, value_name = "LEVEL")]
    pub min_confidence: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let root = self.path.clone().unwrap_or_else(|| PathBuf::from("."));
        let root = root
            .canonicalize()
            .with_context(|| format!("Path does not exist: {}", root.display()))?;
        let start_dir = if root.is_file() {
            root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone())
        } else {
            root.clone()
        };

        let config_result = load_config_or_default_with_warnings(&start_dir);
        for warning in &config_result.warnings {
            print_warning(warning);
        }
        let config = config_result.config;
        let config_dir = find_config_file(&start_dir)
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| start_dir.clone());

        let filter = FileFilter::new(&config, &config_dir)?;
        let files = discover_files(&root, &filter)?;
        if files.is_empty() {
            println!("No TypeScript or JavaScript files found.");
            return Ok(());
        }

        let engine = self.build_engine(&config, &config_dir, &start_dir)?;
        let program = build_program(&files)?;
        let mut cache = CheckerCache::new();
        let checker = cache.get_or_build(&engine, &program);

        let wanted: HashSet<String> = files
            .iter()
            .map(|f| program_path(f))
            .collect();
        let mut diagnostics: Vec<Diagnostic> = engine.exemption_diagnostics().to_vec();
        let per_file: Vec<Vec<Diagnostic>> = program
            .files()
            .par_iter()
            .filter(|file| wanted.contains(file.path()))
            .map(|file| {
                if file.is_declaration() {
                    debug!(path = file.path(), "skipping declaration file");
                    return Vec::new();
                }
                engine.check_file(&checker, file)
            })
            .collect();
        diagnostics.extend(per_file.into_iter().flatten());

        let error_count = diagnostics
            .iter()
            .filter(|d| !d.exempted && matches!(d.severity, Severity::Error))
            .count();

        match self.format.as_str() {
            "json" => {
                let formatter = JsonFormatter::new();
                println!(
                    "{}",
                    formatter.format(&diagnostics, files.len(), &root.to_string_lossy())
                );
            }
            _ => {
                let sources: HashMap<String, String> = program
                    .user_files()
                    .map(|f| (f.path().to_string(), f.source().to_string()))
                    .collect();
                let formatter = PrettyFormatter::with_sources(sources);
                print!("{}", formatter.format(&diagnostics));
            }
        }

        if error_count > 0 {
            process::exit(1);
        }

        Ok(())
    }

    fn build_engine(
        &self,
        config: &Config,
        config_dir: &Path,
        start_dir: &Path,
    ) -> Result<AnalysisEngine> {
        let mut engine = AnalysisEngine::with_config(config);
        for error in engine.rule_errors() {
            print_warning(&format!("Skipping custom rule: {}", error));
        }
        if let Some(confidence) = self.parse_confidence()? {
            engine.registry_mut().set_min_confidence(confidence);
        }
        engine.set_audit(self.audit);

        let tsconfig = match &self.project {
            Some(project) => Some(
                project
                    .canonicalize()
                    .with_context(|| format!("tsconfig not found: {}", project.display()))?,
            ),
            None => find_tsconfig(start_dir),
        };
        debug!(tsconfig = ?tsconfig, "resolved project");

        if let Some(path) = find_exemption_config(config, config_dir, tsconfig.as_deref()) {
            if let Err(e) = engine.load_exemptions(&path) {
                print_warning(&e.to_string());
            }
        }

        Ok(engine)
    }

    fn parse_confidence(&self) -> Result<Option<Confidence>> {
        match self.min_confidence.as_deref() {
            None => Ok(None),
            Some("high") => Ok(Some(Confidence::High)),
            Some("medium") => Ok(Some(Confidence::Medium)),
            Some("low") => Ok(Some(Confidence::Low)),
            Some(other) => anyhow::bail!(
                "Invalid confidence '{}'. Valid values: high, medium, low",
                other
            ),
        }
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }
}

fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// `include`/`exclude` globs from `tsgate.toml`, matched against paths
/// relative to the directory holding it.
struct FileFilter {
    base: PathBuf,
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl FileFilter {
    fn new(config: &Config, base: &Path) -> Result<Self> {
        let include = if config.include.is_empty() {
            None
        } else {
            Some(compile_globset(&config.include)?)
        };
        Ok(Self {
            base: base.to_path_buf(),
            include,
            exclude: compile_globset(&config.exclude)?,
        })
    }

    fn accepts(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.base).unwrap_or(path);
        if let Some(include) = &self.include {
            if !include.is_match(relative) {
                return false;
            }
        }
        !self.exclude.is_match(relative)
    }
}

fn compile_globset(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(Glob::new(glob).with_context(|| format!("invalid glob: {glob:?}"))?);
    }
    Ok(builder.build()?)
}

fn discover_files(path: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        if is_supported_file(path) {
            return Ok(vec![path.to_path_buf()]);
        } else {
            return Ok(vec![]);
        }
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_file(e.path()))
        .filter(|e| filter.accepts(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    Ok(files)
}

fn build_program(files: &[PathBuf]) -> Result<Arc<Program>> {
    let builder = files
        .iter()
        .try_fold(Program::builder().load_imports(true), |builder, file| {
            builder.add_file(file)
        })?;
    let program = builder.build();
    debug!(
        program = program.id().value(),
        files = program.files().len(),
        "program built"
    );
    Ok(Arc::new(program))
}

fn program_path(path: &Path) -> String {
    tsgate_core::resolution::normalize_path(&path.to_string_lossy())
}

fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || name == "node_modules")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn no_filter(dir: &Path) -> FileFilter {
        FileFilter::new(&Config::default(), dir).unwrap()
    }

    fn args(min_confidence: Option<&str>) -> CheckArgs {
        CheckArgs {
            path: Some(PathBuf::from(".")),
            project: None,
            format: "pretty".to_string(),
            audit: false,
            min_confidence: min_confidence.map(str::to_string),
            no_color: false,
        }
    }

    #[test]
    fn discover_files_finds_single_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("app.ts");
        File::create(&file_path).unwrap();

        let files = discover_files(&file_path, &no_filter(dir.path())).unwrap();

        assert_eq!(files, vec![file_path]);
    }

    #[test]
    fn discover_files_recurses_and_skips_hidden_and_node_modules() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/widgets")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/dep")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        File::create(dir.path().join("src/main.ts")).unwrap();
        File::create(dir.path().join("src/widgets/list.tsx")).unwrap();
        File::create(dir.path().join("node_modules/dep/index.d.ts")).unwrap();
        File::create(dir.path().join(".cache/tmp.ts")).unwrap();
        File::create(dir.path().join("README.md")).unwrap();

        let files = discover_files(dir.path(), &no_filter(dir.path())).unwrap();

        assert_eq!(files.len(), 2, "{files:?}");
    }

    #[test]
    fn include_and_exclude_globs_are_relative_to_config_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        File::create(dir.path().join("src/app.ts")).unwrap();
        File::create(dir.path().join("src/app.spec.ts")).unwrap();
        File::create(dir.path().join("scripts/build.ts")).unwrap();
        let config = Config {
            include: vec!["src/**/*.ts".to_string()],
            exclude: vec!["**/*.spec.ts".to_string()],
            ..Config::default()
        };
        let filter = FileFilter::new(&config, dir.path()).unwrap();

        let files = discover_files(dir.path(), &filter).unwrap();

        assert_eq!(files, vec![dir.path().join("src/app.ts")]);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let config = Config {
            exclude: vec!["src/[".to_string()],
            ..Config::default()
        };

        assert!(FileFilter::new(&config, Path::new("/p")).is_err());
    }

    #[test]
    fn is_supported_file_accepts_script_extensions() {
        for name in ["a.ts", "a.tsx", "a.mts", "a.cts", "a.js", "a.jsx", "a.mjs", "a.cjs"] {
            assert!(is_supported_file(Path::new(name)), "{name}");
        }
        assert!(!is_supported_file(Path::new("a.json")));
        assert!(!is_supported_file(Path::new("a.md")));
    }

    #[test]
    fn parse_confidence_accepts_levels() {
        assert_eq!(args(None).parse_confidence().unwrap(), None);
        assert_eq!(
            args(Some("high")).parse_confidence().unwrap(),
            Some(Confidence::High)
        );
        assert!(args(Some("certain")).parse_confidence().is_err());
    }

    #[test]
    fn build_program_reads_discovered_files() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("app.ts");
        fs::write(&file, "eval('1');\n").unwrap();
        let file = file.canonicalize().unwrap();

        let program = build_program(std::slice::from_ref(&file)).unwrap();

        assert!(program.file_by_path(&program_path(&file)).is_some());
    }

    #[test]
    fn engine_reads_exemptions_named_by_project() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.app.json"),
            r#"{ "compilerOptions": { "plugins": [{ "name": "tsgate", "exemptionConfig": "exemptions.json" }] } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("exemptions.json"),
            r#"{ "ban-eval-calls": ["src/**/*.ts"] }"#,
        )
        .unwrap();
        let mut check = args(Some("low"));
        check.project = Some(dir.path().join("tsconfig.app.json"));

        let engine = check
            .build_engine(&Config::default(), dir.path(), dir.path())
            .unwrap();

        assert!(engine.exemptions().allowlist_for("ban-eval-calls").is_some());
        assert_eq!(engine.registry().min_confidence(), Confidence::Low);
    }

    #[test]
    fn missing_project_is_an_error() {
        let dir = tempdir().unwrap();
        let mut check = args(None);
        check.project = Some(dir.path().join("missing.json"));

        assert!(
            check
                .build_engine(&Config::default(), dir.path(), dir.path())
                .is_err()
        );
    }
}
