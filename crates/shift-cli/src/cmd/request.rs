use crate::output::print_json;
use std::path::Path;

/// The request body is JSON either way.
pub fn run(config_path: Option<&Path>, scenario: &Path) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let coordinator = super::load_scenario(&config, scenario)?;
    let request = coordinator.build_request();
    tracing::debug!(
        staffs = request.staffs.len(),
        shifts = request.shifts.len(),
        locked = request.locked.len(),
        expected_cells = request.expected_cells(),
        "request built"
    );
    print_json(&request)
}
