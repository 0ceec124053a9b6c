//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::domain::{Bounds, Dimension, FilterSpec, YearRange};

/// Company hierarchy engine: build an org tree from flat records, then flatten, filter, group and locate
#[derive(Parser, Debug)]
#[command(name = "orgchart")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Project directory (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Directory with companies.csv and relationships.csv (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy (or the part below CODE) as a tree
    Tree {
        /// Company code to start from
        code: Option<String>,
    },

    /// List companies in hierarchy order, with efficiency
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Count companies per level, country or city
    Stats {
        /// Grouping dimension: level, country or city (default from config)
        dimension: Option<Dimension>,
        /// List the companies of every group instead of counting them
        #[arg(long)]
        members: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one company and its subsidiaries
    Show {
        /// Company code
        code: String,
    },

    /// Show dashboard metrics and tier distribution
    Metrics {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Check that the sources form one consistent tree
    Validate,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a commented config template
    Template,
    /// Write the template to the global config location
    Init,
}

/// Filter flags shared by list, stats and metrics.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Levels to keep, comma separated
    #[arg(long = "level", value_delimiter = ',')]
    pub levels: Vec<u8>,

    /// Countries to keep, comma separated (exact match)
    #[arg(long = "country", value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Cities to keep, comma separated (exact match)
    #[arg(long = "city", value_delimiter = ',')]
    pub cities: Vec<String>,

    /// Substring of the company name
    #[arg(long)]
    pub name: Option<String>,

    /// Earliest founding year
    #[arg(long)]
    pub min_year: Option<i32>,

    /// Latest founding year
    #[arg(long)]
    pub max_year: Option<i32>,

    /// Minimum annual revenue
    #[arg(long)]
    pub min_revenue: Option<f64>,

    /// Maximum annual revenue
    #[arg(long)]
    pub max_revenue: Option<f64>,

    /// Minimum number of employees
    #[arg(long)]
    pub min_employees: Option<u64>,

    /// Maximum number of employees
    #[arg(long)]
    pub max_employees: Option<u64>,

    /// JSON file with a filter spec; flags given on the command line take precedence
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub filter_file: Option<PathBuf>,
}

impl FilterArgs {
    /// Apply the flags on top of `base`.
    pub fn apply_to(&self, mut spec: FilterSpec) -> FilterSpec {
        if !self.levels.is_empty() {
            spec.levels = Some(self.levels.iter().copied().collect());
        }
        if !self.countries.is_empty() {
            spec.countries = Some(self.countries.iter().cloned().collect());
        }
        if !self.cities.is_empty() {
            spec.cities = Some(self.cities.iter().cloned().collect());
        }
        if self.name.is_some() {
            spec.name = self.name.clone();
        }

        if self.min_year.is_some() || self.max_year.is_some() {
            let range = spec.founded_year.unwrap_or_default();
            spec.founded_year = Some(YearRange {
                start: self.min_year.or(range.start),
                end: self.max_year.or(range.end),
            });
        }
        if self.min_revenue.is_some() || self.max_revenue.is_some() {
            let bounds = spec.annual_revenue.unwrap_or_default();
            spec.annual_revenue = Some(Bounds {
                min: self.min_revenue.or(bounds.min),
                max: self.max_revenue.or(bounds.max),
            });
        }
        if self.min_employees.is_some() || self.max_employees.is_some() {
            let bounds = spec.employees.unwrap_or_default();
            spec.employees = Some(Bounds {
                min: self.min_employees.or(bounds.min),
                max: self.max_employees.or(bounds.max),
            });
        }
        spec
    }
}
