use log::debug;

use super::{GateOutcome, QualityGate, QualityGateResult, QualityGateStatus};
use crate::models::IssueStatistics;

/// Evaluates a list of quality gates against issue statistics
///
/// Evaluation is pure: the statistics are not modified and the overall
/// status does not depend on the order of the gates.
pub struct QualityGateEvaluator<'a> {
    gates: &'a [QualityGate],
}

impl<'a> QualityGateEvaluator<'a> {
    pub fn new(gates: &'a [QualityGate]) -> Self {
        Self { gates }
    }

    pub fn evaluate(&self, statistics: &IssueStatistics) -> QualityGateResult {
        let outcomes: Vec<GateOutcome> = self
            .gates
            .iter()
            .map(|gate| evaluate_gate(gate, statistics))
            .collect();

        let overall_status = outcomes
            .iter()
            .map(|o| o.status)
            .fold(QualityGateStatus::Inactive, QualityGateStatus::max);

        debug!(
            "Evaluated {} quality gates, overall status {}",
            outcomes.len(),
            overall_status
        );

        QualityGateResult {
            overall_status,
            outcomes,
        }
    }
}

fn evaluate_gate(gate: &QualityGate, statistics: &IssueStatistics) -> GateOutcome {
    let actual = gate.gate_type.actual_value(statistics);

    if gate.threshold < 1 {
        return GateOutcome {
            gate: gate.clone(),
            actual,
            status: QualityGateStatus::Inactive,
            message: format!(
                "{} - {}: threshold too small: {}",
                QualityGateStatus::Inactive,
                gate.name(),
                gate.threshold
            ),
        };
    }

    let status = if actual >= i64::from(gate.threshold) {
        gate.criticality.status()
    } else {
        QualityGateStatus::Passed
    };

    GateOutcome {
        gate: gate.clone(),
        actual,
        status,
        message: format!(
            "{} - {}: actual value {}, quality gate {}",
            status,
            gate.name(),
            actual,
            gate.threshold
        ),
    }
}
