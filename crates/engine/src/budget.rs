// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Budget enforcement against a job's ceilings

use chrono::{DateTime, Utc};
use serde::Serialize;
use wrkr_core::{BudgetState, Budgets, Clock};
use wrkr_storage::Counters;

/// Ceilings to check a job against in place of its jobspec's
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetOverrides {
    pub max_wall_time_seconds: Option<u64>,
    pub max_retries: Option<u64>,
    pub max_step_count: Option<u64>,
    pub max_tool_calls: Option<u64>,
}

impl BudgetOverrides {
    pub fn apply(&self, budgets: Budgets) -> Budgets {
        Budgets {
            max_wall_time_seconds: self
                .max_wall_time_seconds
                .unwrap_or(budgets.max_wall_time_seconds),
            max_retries: self.max_retries.unwrap_or(budgets.max_retries),
            max_step_count: self.max_step_count.unwrap_or(budgets.max_step_count),
            max_tool_calls: self.max_tool_calls.unwrap_or(budgets.max_tool_calls),
        }
    }
}

/// Outcome of checking a job's recorded usage against ceilings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetCheck {
    pub job_id: String,
    pub limits: Budgets,
    pub usage: BudgetState,
    pub violations: Vec<String>,
    /// The terminal checkpoint appended because of this check
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
}

impl BudgetCheck {
    pub fn exceeded(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// What is asking to be admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Step,
    ToolCall,
}

/// Counter/gate keyed to one job's budgets.
///
/// Counters start from the persisted values so a resumed run keeps
/// consuming the same budget.
#[derive(Debug, Clone)]
pub struct BudgetEnforcer<C: Clock> {
    budgets: Budgets,
    started_at: DateTime<Utc>,
    clock: C,
    counters: Counters,
}

impl<C: Clock> BudgetEnforcer<C> {
    pub fn new(budgets: Budgets, started_at: DateTime<Utc>, clock: C, counters: Counters) -> Self {
        Self {
            budgets,
            started_at,
            clock,
            counters,
        }
    }

    /// Seconds since the job was created
    pub fn elapsed_seconds(&self) -> f64 {
        let elapsed = self.clock.now() - self.started_at;
        elapsed.num_milliseconds().max(0) as f64 / 1000.0
    }

    fn wall_time_ok(&self) -> bool {
        self.elapsed_seconds() <= self.budgets.max_wall_time_seconds as f64
    }

    pub fn admit_step(&self) -> bool {
        self.violations(Admission::Step).is_empty()
    }

    pub fn admit_tool_call(&self) -> bool {
        self.violations(Admission::ToolCall).is_empty()
    }

    /// Every ceiling the requested admission would exceed, as `<counter>><limit>`
    pub fn violations(&self, admission: Admission) -> Vec<String> {
        let b = &self.budgets;
        let c = &self.counters;
        let mut out = Vec::new();
        if !self.wall_time_ok() {
            out.push(format!("wall_time_seconds>{}", b.max_wall_time_seconds));
        }
        match admission {
            Admission::Step => {
                if c.step_count + 1 > b.max_step_count {
                    out.push(format!("step_count>{}", b.max_step_count));
                }
                if c.tool_call_count > b.max_tool_calls {
                    out.push(format!("tool_call_count>{}", b.max_tool_calls));
                }
            }
            Admission::ToolCall => {
                if c.tool_call_count + 1 > b.max_tool_calls {
                    out.push(format!("tool_call_count>{}", b.max_tool_calls));
                }
            }
        }
        out
    }

    /// Ceilings the recorded usage has already passed, as `<counter>><limit>`
    pub fn exceeded(&self) -> Vec<String> {
        let b = &self.budgets;
        let c = &self.counters;
        let mut out = Vec::new();
        if !self.wall_time_ok() {
            out.push(format!("wall_time_seconds>{}", b.max_wall_time_seconds));
        }
        if c.retry_count > b.max_retries {
            out.push(format!("retry_count>{}", b.max_retries));
        }
        if c.step_count > b.max_step_count {
            out.push(format!("step_count>{}", b.max_step_count));
        }
        if c.tool_call_count > b.max_tool_calls {
            out.push(format!("tool_call_count>{}", b.max_tool_calls));
        }
        out
    }

    pub fn record_tool_call(&mut self) {
        self.counters.tool_call_count += 1;
    }

    pub fn record_step(&mut self) {
        self.counters.step_count += 1;
    }

    /// Consume one retry; false once `max_retries` is exhausted
    pub fn record_retry(&mut self) -> bool {
        if self.counters.retry_count >= self.budgets.max_retries {
            return false;
        }
        self.counters.retry_count += 1;
        true
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn usage(&self) -> BudgetState {
        BudgetState {
            wall_time_seconds: self.elapsed_seconds() as u64,
            retry_count: self.counters.retry_count,
            step_count: self.counters.step_count,
            tool_call_count: self.counters.tool_call_count,
        }
    }
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;
