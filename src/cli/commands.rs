//! Command dispatch: one function per subcommand.

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, FilterArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{Dimension, FilterSpec, FlatCompanyView};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let project_dir = resolve_project_dir(cli)?;
    debug!("project_dir: {}", project_dir.display());

    match &cli.command {
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
        Some(Commands::Config { command }) => {
            let settings = load_settings(cli, &project_dir)?;
            cmd_config(command, &settings, &project_dir)
        }
        Some(command) => {
            let settings = load_settings(cli, &project_dir)?;
            let container = ServiceContainer::new(settings);
            container.initialize()?;
            dispatch(command, &container, cli.json)
        }
        None => Err(CliError::Usage(
            "no command given, run 'orgchart --help'".to_string(),
        )),
    }
}

/// Run a query command against an initialized container.
pub fn dispatch(command: &Commands, container: &ServiceContainer, json: bool) -> CliResult<()> {
    match command {
        Commands::Tree { code } => cmd_tree(container, code.as_deref(), json),
        Commands::List { filter } => cmd_list(container, filter, json),
        Commands::Stats {
            dimension,
            members,
            filter,
        } => {
            let dimension = dimension.unwrap_or(container.settings.display.default_dimension);
            if *members {
                cmd_stats_members(container, dimension, filter, json)
            } else {
                cmd_stats(container, dimension, filter, json)
            }
        }
        Commands::Show { code } => cmd_show(container, code, json),
        Commands::Metrics { filter } => cmd_metrics(container, filter, json),
        Commands::Validate => cmd_validate(container, json),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not query the hierarchy".to_string(),
        )),
    }
}

fn resolve_project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e).into()),
    }
}

fn load_settings(cli: &Cli, project_dir: &Path) -> CliResult<Settings> {
    let mut settings = Settings::load(Some(project_dir))?;
    if let Some(data_dir) = &cli.data_dir {
        settings.data_dir = data_dir.clone();
    }
    Ok(settings)
}

/// Combine `--filter-file` (if any) with the individual flags.
fn build_filter(fs: &dyn FileSystem, args: &FilterArgs) -> CliResult<FilterSpec> {
    let base = match &args.filter_file {
        Some(path) => {
            let content = fs
                .read_to_string(path)
                .map_err(|e| InfraError::io(format!("read filter file {}", path.display()), e))?;
            serde_json::from_str(&content).map_err(|e| {
                CliError::InvalidArgs(format!("filter file {}: {}", path.display(), e))
            })?
        }
        None => FilterSpec::default(),
    };
    Ok(args.apply_to(base))
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, code: Option<&str>, json: bool) -> CliResult<()> {
    let companies = &container.companies;
    if json {
        return match code {
            Some(code) => output::json(&companies.subtree(code)?),
            None => output::json(&companies.structure()?),
        };
    }
    output::info(&companies.tree(code)?);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_list(container: &ServiceContainer, filter: &FilterArgs, json: bool) -> CliResult<()> {
    let spec = build_filter(container.fs.as_ref(), filter)?;
    let views = container.companies.list_filtered(&spec)?;
    if json {
        return output::json(&views);
    }
    let precision = container.settings.display.efficiency_precision;
    output::header(&format!(
        "{:<8} {:<28} {:>5} {:<16} {:<16} {:>10}",
        "CODE", "NAME", "LEVEL", "COUNTRY", "CITY", "EFFICIENCY"
    ));
    for view in &views {
        output::info(&format_row(view, precision));
    }
    output::detail(&format!("{} companies", views.len()));
    Ok(())
}

fn format_row(view: &FlatCompanyView, precision: usize) -> String {
    format!(
        "{:<8} {:<28} {:>5} {:<16} {:<16} {:>10.*}",
        view.code, view.name, view.level, view.country, view.city, precision, view.efficiency
    )
}

#[instrument(skip(container))]
fn cmd_stats(
    container: &ServiceContainer,
    dimension: Dimension,
    filter: &FilterArgs,
    json: bool,
) -> CliResult<()> {
    let spec = build_filter(container.fs.as_ref(), filter)?;
    let series = container.companies.stats(dimension, &spec)?;
    if json {
        return output::json(&series);
    }
    output::header(&format!("Companies by {dimension}"));
    let width = series.labels.iter().map(String::len).max().unwrap_or(0);
    for (label, count) in series.labels.iter().zip(&series.values) {
        output::detail(&format!("{label:<width$}  {count}"));
    }
    output::detail(&format!(
        "{} companies in {} groups",
        series.values.iter().sum::<usize>(),
        series.labels.len()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_stats_members(
    container: &ServiceContainer,
    dimension: Dimension,
    filter: &FilterArgs,
    json: bool,
) -> CliResult<()> {
    let spec = build_filter(container.fs.as_ref(), filter)?;
    let partitions = container.companies.partition(dimension, &spec)?;
    if json {
        return output::json(&partitions);
    }
    let precision = container.settings.display.efficiency_precision;
    for partition in &partitions {
        output::header(&format!("{} ({})", partition.key, partition.members.len()));
        for view in &partition.members {
            output::detail(&format_row(view, precision));
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_show(container: &ServiceContainer, code: &str, json: bool) -> CliResult<()> {
    if json {
        return output::json(&container.companies.detail(code)?);
    }

    let profile = container.companies.profile(code)?;
    let company = &profile.company;
    output::header(&format!("{} {}", company.code, company.name));
    output::field("level", &company.level);
    output::field("location", &format!("{}, {}", company.city, company.country));
    output::field("founded", &company.founded_year);
    output::field("revenue", &company.annual_revenue);
    output::field("employees", &company.employees);
    output::field(
        "efficiency",
        &format!("{:.*}", container.settings.display.efficiency_precision, profile.efficiency),
    );
    if let Some(parent) = &profile.parent {
        output::field("parent", parent);
    }
    output::field("subsidiaries", &profile.subsidiaries);
    if !profile.children.is_empty() {
        output::field("children", &profile.children.join(", "));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_metrics(container: &ServiceContainer, filter: &FilterArgs, json: bool) -> CliResult<()> {
    let spec = build_filter(container.fs.as_ref(), filter)?;
    let dashboard = container.companies.dashboard(&spec)?;
    if json {
        return output::json(&dashboard);
    }

    let metrics = &dashboard.metrics;
    output::header("Metrics");
    output::field("companies", &metrics.company_count);
    output::field("total revenue", &metrics.total_revenue);
    output::field("total employees", &metrics.total_employees);
    output::field("countries", &metrics.country_count);
    output::header("Tiers");
    for tier in &dashboard.tier_distribution {
        output::detail(&format!(
            "level{}  {:>5}  {:>6}",
            tier.level,
            tier.count,
            tier.percentage_label()
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_validate(container: &ServiceContainer, json: bool) -> CliResult<()> {
    let summary = container.companies.summary()?;
    if json {
        return output::json(&summary);
    }

    output::success(&format!(
        "{} companies form one tree rooted at {} (depth {}, {} leaves)",
        summary.companies, summary.root, summary.depth, summary.leaves
    ));
    let mismatches = &summary.level_mismatches;
    if !mismatches.is_empty() {
        output::warning(&format!(
            "{} companies have a stored level different from their depth: {}",
            mismatches.len(),
            mismatches
                .iter()
                .map(|m| format!("{} (level {}, depth {})", m.code, m.stored, m.depth))
                .join(", ")
        ));
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands, settings: &Settings, project_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::field("global", &path.display()),
                None => output::field("global", "unavailable"),
            }
            output::field("local", &local_config_path(project_dir).display());
            output::field("companies", &settings.companies_path().display());
            output::field("relationships", &settings.relationships_path().display());
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
        ConfigCommands::Init => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("no config directory on this system".into()))?;
            init_config_file(&crate::infrastructure::traits::RealFileSystem, &path)?;
            output::success(&format!("wrote {}", path.display()));
            Ok(())
        }
    }
}

/// Write the config template to `path` unless a file already exists there.
pub fn init_config_file(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config file already exists: {}",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .map_err(|e| InfraError::io(format!("create directory for {}", path.display()), e))?;
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    eprintln!("Generating completion file for {shell:?}...");
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

