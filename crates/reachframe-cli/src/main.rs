use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use reachframe::{
    ClusterLevel, Engine, EngineConfig, NormalizationTable, ReachError, Report,
    StaticCapabilityDb, UsageInput,
};
use tracing::info;

mod logging;

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    usage: Option<PathBuf>,
    db: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    watch: Vec<String>,
    level: Option<ClusterLevel>,
    verbose: bool,
    log_file: Option<PathBuf>,
    show_help: bool,
}

fn main() {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let exit_code = run(std::env::args_os(), &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run<I, W, E>(args: I, out: &mut W, err: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            let _ = writeln!(err, "error: {message}");
            let _ = write_usage(err);
            return 2;
        }
    };

    if options.show_help {
        if write_usage(out).is_err() {
            return 1;
        }
        return 0;
    }

    if let Err(error) = logging::init_logging(options.log_file.as_deref(), options.verbose) {
        let _ = writeln!(err, "error: cannot open log file: {error}");
        return 74;
    }

    match execute(&options, out, err) {
        Ok(()) => 0,
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            if let Some(hint) = error.suggestion() {
                let _ = writeln!(err, "hint: {hint}");
            }
            error.exit_code()
        }
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut options = CliOptions {
        usage: None,
        db: None,
        config: None,
        output: None,
        watch: Vec::new(),
        level: None,
        verbose: false,
        log_file: None,
        show_help: false,
    };

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy().into_owned();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_owned(), Some(value.to_owned())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| -> Result<String, String> {
            match inline.clone() {
                Some(value) => Ok(value),
                None => iter
                    .next()
                    .map(|next| next.to_string_lossy().into_owned())
                    .ok_or_else(|| format!("missing value for `{name}`")),
            }
        };

        match flag.as_str() {
            "-h" | "--help" => options.show_help = true,
            "-v" | "--verbose" => options.verbose = true,
            "--usage" => set_once(&mut options.usage, "--usage", value("--usage")?)?,
            "--db" => set_once(&mut options.db, "--db", value("--db")?)?,
            "--config" => set_once(&mut options.config, "--config", value("--config")?)?,
            "-o" | "--output" => set_once(&mut options.output, "--output", value("--output")?)?,
            "--log-file" => set_once(&mut options.log_file, "--log-file", value("--log-file")?)?,
            "-w" | "--watch" => options.watch.push(value("--watch")?),
            "--level" => {
                if options.level.is_some() {
                    return Err(String::from("`--level` may only be provided once"));
                }
                let level = ClusterLevel::parse(&value("--level")?).map_err(|e| e.to_string())?;
                options.level = Some(level);
            }
            other => return Err(format!("unknown option `{other}`")),
        }
    }

    if !options.show_help {
        if options.usage.is_none() {
            return Err(String::from("`--usage FILE` is required"));
        }
        if options.db.is_none() {
            return Err(String::from("`--db FILE` is required"));
        }
    }
    Ok(options)
}

fn set_once(slot: &mut Option<PathBuf>, name: &str, value: String) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("`{name}` may only be provided once"));
    }
    *slot = Some(PathBuf::from(value));
    Ok(())
}

fn execute<W, E>(options: &CliOptions, out: &mut W, err: &mut E) -> Result<(), ReachError>
where
    W: Write,
    E: Write,
{
    let mut config = match &options.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env()?;
    config.watch_features.extend(options.watch.iter().cloned());
    if let Some(level) = options.level {
        config.cluster_level = level;
    }

    let (Some(usage_path), Some(db_path)) = (&options.usage, &options.db) else {
        return Err(ReachError::internal("input paths missing after argument parsing"));
    };
    let db = StaticCapabilityDb::from_json_file(db_path)?;
    let input = UsageInput::from_json_file(usage_path)?;
    info!(records = input.records.len(), usage = %usage_path.display(), "usage loaded");

    let engine = Engine::new(&db, NormalizationTable::default(), config)?;
    let report = engine.run(&input)?;

    write_summary(&report, err)?;
    let json = report.to_json_pretty()?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, json + "\n")?;
            info!(output = %path.display(), "report written");
        }
        None => writeln!(out, "{json}")?,
    }
    Ok(())
}

fn write_summary<E>(report: &Report, err: &mut E) -> io::Result<()>
where
    E: Write,
{
    let stats = &report.stats;
    writeln!(err, "Total users:      {}", stats.total_users)?;
    writeln!(err, "Known browsers:   {}", stats.known_browsers)?;
    writeln!(err, "Unknown browsers: {}", stats.unknown_browsers.len())?;
    writeln!(
        err,
        "Unknown users:    {} ({:.2}%)",
        stats.unknown_users,
        stats.unknown_share() * 100.0
    )?;
    writeln!(err, "Adjusted users:   {}", stats.adjusted_total_users)?;
    writeln!(
        err,
        "Clusters:         {} by version, {} by feature set",
        stats.unique_version_clusters, stats.unique_feature_clusters
    )?;
    writeln!(err, "Frames:           {}", report.frames.len())?;
    for name in &stats.unknown_features {
        writeln!(err, "Unknown feature:  {name}")?;
    }
    Ok(())
}

fn write_usage<W>(out: &mut W) -> io::Result<()>
where
    W: Write,
{
    writeln!(
        out,
        "Usage: reachframe --usage FILE --db FILE [OPTIONS]\n\
         \n\
         Options:\n\
         \n\
         --usage FILE        Decoded usage export (JSON)\n\
         --db FILE           Capability database snapshot (JSON)\n\
         --config FILE       Engine configuration (JSON)\n\
         -o, --output FILE   Write the report here instead of stdout\n\
         -w, --watch NAME    Track a feature's reach (repeatable)\n\
         --level LEVEL       Version granularity: major|minor|full\n\
         --log-file FILE     Also write JSON-lines logs to FILE\n\
         -v, --verbose       Debug logging on stderr\n\
         -h, --help          Show this help\n\
         \n\
         Environment: REACHFRAME_THRESHOLDS, REACHFRAME_CLUSTER_LEVEL,\n\
         REACHFRAME_WATCH, RUST_LOG\n",
    )
}
