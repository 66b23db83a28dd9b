//! Per-period quantity/rate/cost table for every row of a sweep.

use serde::Serialize;

use super::types::{LoadFactorRow, PeriodCharge, SweepInputs, SweepResult};
use crate::tariff::RateTierStructure;

/// Kind of charge a column group prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeKind {
    Energy,
    Demand,
    FlatDemand,
}

impl ChargeKind {
    /// Unit of the quantity column.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Energy => "kWh",
            Self::Demand | Self::FlatDemand => "kW",
        }
    }

    fn charges(self, row: &LoadFactorRow) -> &[PeriodCharge] {
        match self {
            Self::Energy => &row.energy,
            Self::Demand => &row.demand,
            Self::FlatDemand => &row.flat_demand,
        }
    }

    fn rates(self, inputs: &SweepInputs) -> &RateTierStructure {
        match self {
            Self::Energy => &inputs.tariff.energy_rates,
            Self::Demand => &inputs.tariff.demand_rates,
            Self::FlatDemand => &inputs.tariff.flat_demand_rates,
        }
    }
}

/// One period's (quantity, rate, cost) column triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnGroup {
    pub kind: ChargeKind,
    pub period: usize,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreakdownCell {
    pub quantity: f64,
    pub rate: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub load_factor: f64,
    /// Aligned with [`BreakdownTable::columns`].
    pub cells: Vec<BreakdownCell>,
    pub demand_cost: f64,
    pub energy_cost: f64,
    pub fixed_cost: f64,
    pub total_cost: f64,
    pub effective_rate: Option<f64>,
}

/// Comprehensive breakdown of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownTable {
    pub columns: Vec<ColumnGroup>,
    pub rows: Vec<BreakdownRow>,
    /// False when no demand value was entered, so zero demand columns mean
    /// "unset" rather than "free".
    pub demand_entered: bool,
}

impl BreakdownTable {
    /// Flat header: load factor, three columns per group, then totals.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["load_factor".to_string()];
        for col in &self.columns {
            let kind = match col.kind {
                ChargeKind::Energy => "energy",
                ChargeKind::Demand => "demand",
                ChargeKind::FlatDemand => "flat_demand",
            };
            header.push(format!("{} {kind} ({})", col.label, col.kind.unit()));
            header.push(format!("{} {kind} rate", col.label));
            header.push(format!("{} {kind} cost", col.label));
        }
        header.extend(
            [
                "demand_cost",
                "energy_cost",
                "fixed_cost",
                "total_cost",
                "effective_rate",
            ]
            .map(String::from),
        );
        header
    }
}

/// Lays out `result` with one column group per period that appears in any row.
///
/// A period missing from a particular row gets zero quantity and cost but
/// keeps its tariff rate.
pub fn comprehensive_breakdown(result: &SweepResult, inputs: &SweepInputs) -> BreakdownTable {
    let mut columns: Vec<ColumnGroup> = Vec::new();
    for kind in [ChargeKind::Energy, ChargeKind::Demand, ChargeKind::FlatDemand] {
        let mut periods: Vec<(usize, String)> = result
            .rows
            .iter()
            .flat_map(|row| kind.charges(row))
            .map(|c| (c.period, c.label.clone()))
            .collect();
        periods.sort_by_key(|(period, _)| *period);
        periods.dedup_by_key(|(period, _)| *period);
        columns.extend(
            periods
                .into_iter()
                .map(|(period, label)| ColumnGroup { kind, period, label }),
        );
    }

    let rows = result
        .rows
        .iter()
        .map(|row| BreakdownRow {
            load_factor: row.load_factor,
            cells: columns
                .iter()
                .map(|col| {
                    col.kind
                        .charges(row)
                        .iter()
                        .find(|c| c.period == col.period)
                        .map_or_else(
                            || BreakdownCell {
                                quantity: 0.0,
                                rate: col.kind.rates(inputs).total_rate(col.period),
                                cost: 0.0,
                            },
                            |c| BreakdownCell {
                                quantity: c.quantity,
                                rate: c.rate,
                                cost: c.cost,
                            },
                        )
                })
                .collect(),
            demand_cost: row.demand_cost,
            energy_cost: row.energy_cost,
            fixed_cost: row.fixed_cost,
            total_cost: row.total_cost,
            effective_rate: row.effective_rate,
        })
        .collect();

    BreakdownTable {
        columns,
        rows,
        demand_entered: !inputs.demand.is_unset(),
    }
}
