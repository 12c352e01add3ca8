use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::SimulationConfig;
use crate::job::{GenerationJob, GenerationRequest, JobStatus, JobUpdate};
use crate::lifecycle::runner::{JobHandle, JobRunner};

const MIN_INCREMENT: f32 = 1.0;

/// Produces the result reference of a finished simulated job.
#[async_trait]
pub trait ResultRenderer: Send + Sync {
    async fn render(&self, job: &GenerationJob) -> anyhow::Result<String>;
}

/// Seeded placeholder photos keyed by job id.
#[derive(Debug, Clone, Copy, Default)]
pub struct PicsumRenderer;

#[async_trait]
impl ResultRenderer for PicsumRenderer {
    async fn render(&self, job: &GenerationJob) -> anyhow::Result<String> {
        Ok(format!(
            "https://picsum.photos/seed/{}/{}/{}",
            job.id, job.parameters.width, job.parameters.height
        ))
    }
}

/// Fakes a backend: waits, then raises progress in random steps until done.
pub struct SimulatedRunner {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
    renderer: Arc<dyn ResultRenderer>,
}

impl SimulatedRunner {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_renderer(config, Arc::new(PicsumRenderer))
    }

    pub fn with_renderer(config: SimulationConfig, renderer: Arc<dyn ResultRenderer>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
            renderer,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Next progress step; never below `MIN_INCREMENT`, so every run reaches 100.
    fn next_increment(&self) -> f32 {
        let min = self.config.min_increment.max(MIN_INCREMENT);
        let max = self.config.max_increment.max(min);
        if max <= min {
            return min;
        }
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(min..=max)
    }
}

impl std::fmt::Debug for SimulatedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl JobRunner for SimulatedRunner {
    async fn run(&self, job: GenerationJob, _request: GenerationRequest, handle: JobHandle) {
        if !handle.sleep(self.config.onset_delay).await {
            return;
        }
        if !handle
            .advance(JobUpdate::status(JobStatus::Processing))
            .await
            .is_applied()
        {
            return;
        }

        let mut progress = 0.0_f32;
        loop {
            if !handle.sleep(self.config.tick_interval).await {
                return;
            }
            progress = (progress + self.next_increment()).min(100.0);
            if !handle.advance(JobUpdate::progress(progress)).await.is_applied() {
                return;
            }
            if progress >= 100.0 {
                break;
            }
        }

        if !handle.sleep(self.config.settle_delay).await {
            return;
        }
        match self.renderer.render(&job).await {
            Ok(result_url) => {
                debug!(job_id = %job.id, %result_url, "simulated job finished");
                handle.advance(JobUpdate::completed(result_url)).await;
            }
            Err(err) => {
                warn!(job_id = %job.id, "rendering result failed: {err:#}");
                handle.fail(err.to_string()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(min_increment: f32, max_increment: f32) -> SimulatedRunner {
        SimulatedRunner::new(SimulationConfig {
            min_increment,
            max_increment,
            seed: Some(3),
            ..Default::default()
        })
    }

    #[test]
    fn test_increment_stays_in_configured_range() {
        let runner = runner(5.0, 20.0);
        for _ in 0..100 {
            let step = runner.next_increment();
            assert!((5.0..=20.0).contains(&step));
        }
    }

    #[test]
    fn test_non_positive_increment_is_raised() {
        assert_eq!(runner(0.0, 0.0).next_increment(), MIN_INCREMENT);
        assert_eq!(runner(-10.0, -2.0).next_increment(), MIN_INCREMENT);
        assert_eq!(runner(f32::NAN, f32::NAN).next_increment(), MIN_INCREMENT);
        let step = runner(-5.0, 4.0).next_increment();
        assert!((MIN_INCREMENT..=4.0).contains(&step));
    }
}
