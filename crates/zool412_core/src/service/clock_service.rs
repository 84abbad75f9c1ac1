//! Weekly clock use-case.

use crate::repo::{ClockRepository, RepoResult, WeekReport};
use log::info;

pub struct ClockService<R: ClockRepository> {
    repo: R,
}

impl<R: ClockRepository> ClockService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Advances the game by one week, delivering due orders and
    /// completing due experiments.
    pub fn advance_one_week(&self) -> RepoResult<WeekReport> {
        let report = self.repo.advance_week()?;
        for experiment in &report.completed {
            info!(
                "event=experiment_complete module=service status=ok experiment_id={} autostation={}",
                experiment.id, experiment.autostation
            );
        }
        Ok(report)
    }
}
