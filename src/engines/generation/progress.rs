use crate::types::CashSnapshot;

/// What a finished generation hands to reporting/plotting consumers
#[derive(Debug, Clone)]
pub struct GenerationReport<'a> {
    pub generation: usize,
    pub season: Option<usize>,
    /// Mean earnings over every agent and asset, in percent
    pub mean_profit: f64,
    pub best_score: f64,
    pub best_fitness: f64,
    pub best_cash_history: &'a [CashSnapshot],
    pub prices: &'a [f64],
}

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize, season: Option<usize>);
    fn on_agents_evaluated(&mut self, failed: usize, total: usize);
    fn on_generation_complete(&mut self, report: &GenerationReport<'_>);
}

/// Default callback: generation banners and profit through the `log` facade
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize, season: Option<usize>) {
        match season {
            Some(season) => log::info!("Generation {} (season {}) starting", generation, season),
            None => log::info!("Generation {} starting", generation),
        }
    }

    fn on_agents_evaluated(&mut self, failed: usize, total: usize) {
        if failed > 0 {
            log::warn!("  {}/{} agents failed evaluation", failed, total);
        } else {
            log::debug!("  Evaluated {} agents", total);
        }
    }

    fn on_generation_complete(&mut self, report: &GenerationReport<'_>) {
        log::info!(
            "Generation {} complete. Mean profit: {:.5}%, best score: {:.5}%, best fitness: {:.4}, best agent trades: {}",
            report.generation,
            report.mean_profit,
            report.best_score,
            report.best_fitness,
            report.best_cash_history.len()
        );
    }
}
