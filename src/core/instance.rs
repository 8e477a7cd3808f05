use crate::error::{Error, Result};
use ahash::{HashMap, HashSet, HashSetExt};
use serde::{Deserialize, Serialize};

/// Dense index of a task inside an [`Instance`].
pub type TaskId = usize;

/// A task. Belongs to exactly one unit and never changes once loaded.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    pub unit: usize,
    /// Position in the unit's declared order.
    pub position: usize,
    pub name: String,
    pub duration: f64,
    pub batch_min: f64,
    pub batch_max: f64,
}

/// A unit (machine). Holds its tasks in declared order.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub name: String,
    pub tasks: Vec<TaskId>,
}

/// Description of a task used to build an instance.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSpec {
    pub name: String,
    pub duration: f64,
    pub batch_min: f64,
    pub batch_max: f64,
}

impl TaskSpec {
    /// Creates a task description.
    #[must_use]
    pub fn new(name: impl Into<String>, duration: f64, batch_min: f64, batch_max: f64) -> Self {
        Self {
            name: name.into(),
            duration,
            batch_min,
            batch_max,
        }
    }
}

/// A precedence edge between two tasks, given as `(unit, task)` names.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Precedence {
    pub before: (String, String),
    pub after: (String, String),
}

/// Auxiliary schema fields. They are accepted and preserved, but no pipeline consumes them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Extras {
    #[serde(default)]
    pub precedences: Vec<Precedence>,
    #[serde(rename = "C_min", default)]
    pub capacity_min: HashMap<String, f64>,
    #[serde(rename = "C_max", default)]
    pub capacity_max: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub alpha_in: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub alpha_out: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub d_data: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub e_data: serde_json::Value,
    #[serde(rename = "Pj_max", default, skip_serializing_if = "serde_json::Value::is_null")]
    pub pj_max: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub p_init: serde_json::Value,
}

impl Extras {
    /// Number of auxiliary entries that carry data.
    #[must_use]
    pub fn populated(&self) -> usize {
        let tables = [
            &self.alpha_in,
            &self.alpha_out,
            &self.d_data,
            &self.e_data,
            &self.pj_max,
            &self.p_init,
        ];
        let tables = tables.iter().filter(|value| !is_empty_value(value)).count();
        self.precedences.len() + self.capacity_min.len() + self.capacity_max.len() + tables
    }
}

fn is_empty_value(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(list) => list.is_empty(),
        _ => false,
    }
}

/// An instance of the batch scheduling problem.
///
/// Built once through [`Instance::new`], which validates every field, and never mutated
/// afterwards. The big-M constant (`horizon + max duration`) is derived here so every
/// model uses the same value.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    units: Vec<Unit>,
    tasks: Vec<Task>,
    horizon: f64,
    slots: usize,
    big_m: f64,
    extras: Extras,
}

impl Instance {
    /// Creates a validated instance.
    ///
    /// # Errors
    /// - [`Error::MalformedInstance`] if the horizon is negative or not finite, the slot count
    ///   is zero, there are no tasks, names repeat, a duration is not positive, or batch
    ///   bounds are inconsistent.
    pub fn new(horizon: f64, slots: usize, units: Vec<(String, Vec<TaskSpec>)>) -> Result<Self> {
        if !horizon.is_finite() || horizon < 0.0 {
            return Err(Error::malformed(format!("horizon `H` must be a non-negative number, got {horizon}")));
        }
        if slots == 0 {
            return Err(Error::malformed("slot count `P` must be at least 1"));
        }

        let mut unit_names = HashSet::with_capacity(units.len());
        let mut built_units = Vec::with_capacity(units.len());
        let mut tasks = Vec::new();

        for (unit, (unit_name, specs)) in units.into_iter().enumerate() {
            if !unit_names.insert(unit_name.clone()) {
                return Err(Error::malformed(format!("unit `{unit_name}` is declared twice")));
            }

            let mut task_names = HashSet::with_capacity(specs.len());
            let mut ids = Vec::with_capacity(specs.len());

            for (position, spec) in specs.into_iter().enumerate() {
                validate_task(&unit_name, &spec)?;
                if !task_names.insert(spec.name.clone()) {
                    return Err(Error::malformed(format!(
                        "task `{}` is declared twice on unit `{unit_name}`",
                        spec.name
                    )));
                }

                ids.push(tasks.len());
                tasks.push(Task {
                    unit,
                    position,
                    name: spec.name,
                    duration: spec.duration,
                    batch_min: spec.batch_min,
                    batch_max: spec.batch_max,
                });
            }

            built_units.push(Unit {
                name: unit_name,
                tasks: ids,
            });
        }

        if tasks.is_empty() {
            return Err(Error::malformed("instance has no tasks"));
        }

        let max_duration = tasks.iter().map(|task| task.duration).fold(0.0, f64::max);

        Ok(Self {
            units: built_units,
            tasks,
            horizon,
            slots,
            big_m: horizon + max_duration,
            extras: Extras::default(),
        })
    }

    /// Creates an instance from plain durations.
    /// Units are named `u1, u2, …` and the `j`-th task of unit `u{n}` is `iu{n}_{j}`, both 1-based.
    /// Every batch bound is `[1, 10]`.
    ///
    /// # Errors
    /// - Same as [`Instance::new`].
    pub fn with_durations(horizon: f64, slots: usize, durations: &[&[f64]]) -> Result<Self> {
        let units = durations
            .iter()
            .enumerate()
            .map(|(u, unit)| {
                let specs = unit
                    .iter()
                    .enumerate()
                    .map(|(j, &duration)| {
                        TaskSpec::new(format!("iu{}_{}", u + 1, j + 1), duration, 1.0, 10.0)
                    })
                    .collect();
                (format!("u{}", u + 1), specs)
            })
            .collect();
        Self::new(horizon, slots, units)
    }

    /// Attaches the inert auxiliary fields.
    #[must_use]
    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }

    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    /// Tasks of a unit in declared order.
    #[must_use]
    pub fn unit_tasks(&self, unit: usize) -> &[TaskId] {
        &self.units[unit].tasks
    }

    #[must_use]
    pub const fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Number of full-fidelity slots `P`.
    #[must_use]
    pub const fn slots(&self) -> usize {
        self.slots
    }

    /// Deactivation constant, `horizon + max duration`.
    #[must_use]
    pub const fn big_m(&self) -> f64 {
        self.big_m
    }

    #[must_use]
    pub fn max_duration(&self) -> f64 {
        self.big_m - self.horizon
    }

    #[must_use]
    pub const fn extras(&self) -> &Extras {
        &self.extras
    }
}

fn validate_task(unit: &str, spec: &TaskSpec) -> Result<()> {
    let name = &spec.name;
    if !spec.duration.is_finite() || spec.duration <= 0.0 {
        return Err(Error::malformed(format!(
            "task `{name}` on unit `{unit}` has non-positive duration {}",
            spec.duration
        )));
    }
    if !spec.batch_min.is_finite() || !spec.batch_max.is_finite() || spec.batch_min < 0.0 {
        return Err(Error::malformed(format!("task `{name}` on unit `{unit}` has invalid batch bounds")));
    }
    if spec.batch_min > spec.batch_max {
        return Err(Error::malformed(format!(
            "task `{name}` on unit `{unit}` has batch lower bound {} above upper bound {}",
            spec.batch_min, spec.batch_max
        )));
    }
    Ok(())
}
