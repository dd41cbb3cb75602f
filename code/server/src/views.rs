use askama::Template;
use terralib::types::{ControlState, StatusReport};

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardView {
    pub report: StatusReport,
    pub control: ControlState,
}

#[derive(Template)]
#[template(path = "threshold.html")]
pub struct ThresholdView {
    pub report: StatusReport,
    pub control: ControlState,
}

impl DashboardView {
    pub fn new(report: StatusReport) -> Self {
        let control = ControlState::decode(&report.control_data);
        Self { report, control }
    }
}

impl ThresholdView {
    pub fn new(report: StatusReport) -> Self {
        let control = ControlState::decode(&report.control_data);
        Self { report, control }
    }
}
