//! # API Facade
//!
//! The single entry point for farm operations, whatever the UI. [`FermeApi`] owns the
//! store and the weather source and forwards each call to the matching command.
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: lives in `commands/*.rs`
//! - **I/O**: no stdout, no formatting
//!
//! ## Generic Over StorageBackend
//!
//! - Production: `FermeApi<FsBackend>`
//! - Testing: `FermeApi<MemBackend>`

use crate::commands::{self, CmdResult};
use crate::error::Result;
use crate::store::{DocumentStore, StorageBackend};
use crate::weather::{NoWeather, WeatherAdvisory};
use serde_json::Value;

pub struct FermeApi<B: StorageBackend> {
    store: DocumentStore<B>,
    advisory: Box<dyn WeatherAdvisory>,
    strict: bool,
}

impl<B: StorageBackend> FermeApi<B> {
    pub fn new(store: DocumentStore<B>) -> Self {
        Self {
            store,
            advisory: Box::new(NoWeather),
            strict: false,
        }
    }

    pub fn with_advisory(mut self, advisory: Box<dyn WeatherAdvisory>) -> Self {
        self.advisory = advisory;
        self
    }

    /// Rejects unrecognized statements in [`query`](Self::query).
    pub fn with_strict_queries(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn store(&self) -> &DocumentStore<B> {
        &self.store
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.store.set_read_only(read_only);
    }

    pub fn tasks(&mut self, user_id: i64) -> Result<CmdResult> {
        commands::tasks::run(&mut self.store, user_id, self.advisory.as_ref())
    }

    pub fn dashboard(&mut self, user_id: i64) -> Result<CmdResult> {
        commands::dashboard::run(&mut self.store, user_id, self.advisory.as_ref())
    }

    pub fn plots(&mut self, user_id: i64) -> Result<CmdResult> {
        commands::plots::list(&mut self.store, user_id)
    }

    pub fn create_plot(&mut self, user_id: i64, plot: commands::plots::NewPlot) -> Result<CmdResult> {
        commands::plots::create(&mut self.store, user_id, plot)
    }

    pub fn update_plot(
        &mut self,
        user_id: i64,
        plot_id: i64,
        update: commands::plots::PlotUpdate,
    ) -> Result<CmdResult> {
        commands::plots::update(&mut self.store, user_id, plot_id, update)
    }

    pub fn delete_plot(&mut self, user_id: i64, plot_id: i64) -> Result<CmdResult> {
        commands::plots::delete(&mut self.store, user_id, plot_id)
    }

    pub fn stock(&mut self, user_id: i64) -> Result<CmdResult> {
        commands::stock::list(&mut self.store, user_id)
    }

    pub fn set_stock(&mut self, user_id: i64, stock_id: i64, quantity: f64) -> Result<CmdResult> {
        commands::stock::set(&mut self.store, user_id, stock_id, quantity)
    }

    pub fn adjust_stock(&mut self, user_id: i64, stock_id: i64, delta: f64) -> Result<CmdResult> {
        commands::stock::adjust(&mut self.store, user_id, stock_id, delta)
    }

    pub fn add_stock(
        &mut self,
        user_id: i64,
        input: &str,
        quantity: f64,
        new_input: Option<commands::stock::NewInputType>,
    ) -> Result<CmdResult> {
        commands::stock::add(&mut self.store, user_id, input, quantity, new_input)
    }

    pub fn alerts(&mut self, user_id: i64) -> Result<CmdResult> {
        commands::alerts::list(&mut self.store, user_id)
    }

    pub fn report_alert(&mut self, user_id: i64, alert: commands::alerts::NewAlert) -> Result<CmdResult> {
        commands::alerts::report(&mut self.store, user_id, alert)
    }

    pub fn mark_alert_read(&mut self, user_id: i64, alert_id: i64) -> Result<CmdResult> {
        commands::alerts::mark_read(&mut self.store, user_id, alert_id)
    }

    pub fn query<S: AsRef<str>>(&mut self, statement: &str, params: &[S]) -> Result<CmdResult> {
        let params: Vec<Value> = params
            .iter()
            .map(|p| commands::query::parse_param(p.as_ref()))
            .collect();
        commands::query::run(&mut self.store, statement, &params, self.strict)
    }
}
