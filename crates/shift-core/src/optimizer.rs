use crate::error::{Result, ShiftError};
use crate::grid::AssignmentCell;
use crate::request::OptimizeRequest;
use std::time::Duration;

pub const OPTIMIZE_PATH: &str = "/api/v1/optimize";

/// The external assignment solver.
pub trait Optimizer {
    /// Returns a complete assignment grid honouring `request.locked`.
    fn optimize(&self, request: &OptimizeRequest) -> Result<Vec<AssignmentCell>>;
}

/// Talks to the optimizer service over HTTP.
pub struct HttpOptimizer {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpOptimizer {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), OPTIMIZE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Optimizer for HttpOptimizer {
    fn optimize(&self, request: &OptimizeRequest) -> Result<Vec<AssignmentCell>> {
        tracing::info!(
            endpoint = %self.endpoint,
            staffs = request.staffs.len(),
            shifts = request.shifts.len(),
            locked = request.locked.len(),
            "requesting optimized shifts"
        );

        let resp = self.client.post(&self.endpoint).json(request).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(ShiftError::Optimizer(format!("{status}: {}", body.trim())));
        }

        let cells: Vec<AssignmentCell> = resp.json()?;
        tracing::info!(cells = cells.len(), "optimizer responded");
        Ok(cells)
    }
}
