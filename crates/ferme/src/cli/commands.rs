use super::render;
use super::setup::{AlertCommands, Cli, Commands, PlotCommands, PlotFields, StockCommands};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use fermeapp::api::FermeApi;
use fermeapp::commands::alerts::NewAlert;
use fermeapp::commands::plots::{CropRef, NewPlot, PlotUpdate};
use fermeapp::commands::stock::NewInputType;
use fermeapp::commands::CmdResult;
use fermeapp::config::FermeConfig;
use fermeapp::init::initialize;
use fermeapp::store::FsBackend;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ferme=debug,fermeapp=debug"
    } else {
        "ferme=warn,fermeapp=warn"
    };
    // Logs go to stderr so command output stays pipeable.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn load_config(cli: &Cli) -> Result<FermeConfig> {
    let mut config = FermeConfig::load().context("loading configuration")?;
    if let Some(path) = &cli.data {
        config.data_file = Some(path.clone());
    }
    if cli.read_only {
        config.emulate_read_only = true;
    }
    if cli.strict {
        config.strict_queries = true;
    }
    Ok(config)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let mut ctx = initialize(config)?;
    tracing::debug!(data_file = %ctx.data_file.display(), user = cli.user, "context ready");

    let output = dispatch(&mut ctx.api, cli.user, cli.command)?;
    print!("{}", output);
    Ok(())
}

fn plot_update(fields: PlotFields) -> PlotUpdate {
    PlotUpdate {
        name: fields.name,
        crop: fields.crop.as_deref().map(CropRef::from),
        surface: fields.surface,
        sowing_date: fields.sown,
        status: fields.status,
    }
}

/// Runs one command and renders its result.
fn dispatch(api: &mut FermeApi<FsBackend>, user: i64, command: Option<Commands>) -> Result<String> {
    let command = command.unwrap_or(Commands::Dashboard);
    let out = match command {
        Commands::Dashboard => {
            let result = api.dashboard(user)?;
            result
                .summary
                .as_ref()
                .map(render::dashboard)
                .unwrap_or_default()
        }
        Commands::Tasks => render::tasks(&api.tasks(user)?.tasks),
        Commands::Plots => render::plots(&api.plots(user)?.plots),
        Commands::Plot { action } => {
            let result = match action {
                PlotCommands::Add {
                    name,
                    crop,
                    surface,
                    sown,
                    status,
                } => api.create_plot(
                    user,
                    NewPlot {
                        name,
                        crop: CropRef::from(crop.as_str()),
                        surface,
                        sowing_date: sown
                            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
                        status,
                    },
                )?,
                PlotCommands::Update { id, fields } => {
                    api.update_plot(user, id, plot_update(fields))?
                }
                PlotCommands::Rm { id } => api.delete_plot(user, id)?,
            };
            render_change(&result)
        }
        Commands::Stock { action: None } => render::stock(&api.stock(user)?.stock),
        Commands::Stock {
            action: Some(action),
        } => {
            let result = match action {
                StockCommands::Set { id, quantity } => api.set_stock(user, id, quantity)?,
                StockCommands::Adjust { id, delta } => api.adjust_stock(user, id, delta)?,
                StockCommands::Add {
                    input,
                    quantity,
                    category,
                    unit,
                } => {
                    let new_input = match (category, unit) {
                        (Some(category), Some(unit)) => Some(NewInputType { category, unit }),
                        _ => None,
                    };
                    api.add_stock(user, &input, quantity, new_input)?
                }
            };
            render_change(&result)
        }
        Commands::Alerts => render::alerts(&api.alerts(user)?.alerts),
        Commands::Alert { action } => {
            let result = match action {
                AlertCommands::Add {
                    title,
                    message,
                    kind,
                    priority,
                    plot,
                } => api.report_alert(
                    user,
                    NewAlert {
                        plot_id: plot,
                        title,
                        message,
                        kind,
                        priority,
                    },
                )?,
                AlertCommands::Read { id } => api.mark_alert_read(user, id)?,
            };
            render_change(&result)
        }
        Commands::Query { statement, params } => {
            let result = api.query(&statement, &params)?;
            let mut out = result.rows.as_ref().map(render::rows).unwrap_or_default();
            out.push_str(&render::messages(&result.messages));
            out
        }
    };
    Ok(out)
}

/// Output of commands that modify data: the new row id, if any, then messages.
fn render_change(result: &CmdResult) -> String {
    let mut out = String::new();
    if let Some(id) = result.created_id {
        out.push_str(&format!("id: {}\n", id));
    }
    out.push_str(&render::messages(&result.messages));
    out
}
