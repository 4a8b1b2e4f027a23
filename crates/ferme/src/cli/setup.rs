use clap::{Args, Parser, Subcommand};
use fermeapp::model::{AlertPriority, PlotStatus};
use fermeapp::store::seed::DEMO_USER_ID;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ferme",
    bin_name = "ferme",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Farm plots, input stock and field alerts, with daily task prediction", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Farmer whose data is used
    #[arg(short, long, global = true, default_value_t = DEMO_USER_ID, help_heading = "Options")]
    pub user: i64,

    /// JSON data file (overrides configuration)
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Keep changes in memory only
    #[arg(long, global = true, help_heading = "Options")]
    pub read_only: bool,

    /// Reject statements the store does not recognize
    #[arg(long, global = true, help_heading = "Options")]
    pub strict: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Counters and the most pressing tasks
    #[command(alias = "d")]
    Dashboard,

    /// Recommended tasks for every active plot
    #[command(alias = "t")]
    Tasks,

    /// List plots
    Plots,

    /// Create, update or remove a plot
    Plot {
        #[command(subcommand)]
        action: PlotCommands,
    },

    /// List stock, or change quantities
    Stock {
        #[command(subcommand)]
        action: Option<StockCommands>,
    },

    /// List alerts
    Alerts,

    /// Report or acknowledge an alert
    Alert {
        #[command(subcommand)]
        action: AlertCommands,
    },

    /// Run a raw statement against the store
    Query {
        /// Statement text, with $1..$N placeholders
        statement: String,

        /// Parameters: JSON literals (12, 2.5, null, true) or plain strings
        #[arg(allow_hyphen_values = true)]
        params: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlotCommands {
    /// Create a plot
    Add {
        /// Plot name
        name: String,

        /// Crop name or id
        #[arg(short, long)]
        crop: String,

        /// Area in hectares
        #[arg(short, long)]
        surface: f64,

        /// Sowing date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        sown: Option<String>,

        #[arg(long, default_value_t = PlotStatus::InProgress)]
        status: PlotStatus,
    },

    /// Change some fields of a plot
    Update {
        id: i64,

        #[command(flatten)]
        fields: PlotFields,
    },

    /// Delete a plot
    #[command(alias = "delete")]
    Rm { id: i64 },
}

#[derive(Args, Debug, Default)]
pub struct PlotFields {
    #[arg(long)]
    pub name: Option<String>,

    /// Crop name or id
    #[arg(long)]
    pub crop: Option<String>,

    #[arg(long)]
    pub surface: Option<f64>,

    #[arg(long)]
    pub sown: Option<String>,

    /// en_cours, recolte or termine
    #[arg(long)]
    pub status: Option<PlotStatus>,
}

#[derive(Subcommand, Debug)]
pub enum StockCommands {
    /// Overwrite the quantity of a stock entry
    Set { id: i64, quantity: f64 },

    /// Add to (or, negative, take from) a stock entry; never below zero
    Adjust {
        id: i64,
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },

    /// Receive an input, by name or id
    Add {
        input: String,
        quantity: f64,

        /// Register the input with this category if it is unknown
        #[arg(long, requires = "unit")]
        category: Option<String>,

        /// Unit for a newly registered input
        #[arg(long, requires = "category")]
        unit: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AlertCommands {
    /// Report an incident
    Add {
        title: String,

        #[arg(short, long, default_value = "")]
        message: String,

        /// Category tag (truncated to 50 characters)
        #[arg(short, long, default_value = "general")]
        kind: String,

        /// haute, moyenne or basse
        #[arg(short, long, default_value_t = AlertPriority::Medium)]
        priority: AlertPriority,

        /// Plot concerned
        #[arg(long)]
        plot: Option<i64>,
    },

    /// Mark an alert as read
    Read { id: i64 },
}
