//! JSON instance schema, schedule output and the instance generator.

mod run;

pub use run::*;

use crate::core::{Extras, Instance, Precedence, Schedule, Task, TaskSpec};
use crate::error::{Error, Result};
use ahash::{HashMap, HashMapExt};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use std::io::BufRead;
use std::path::{Path, PathBuf};

type Table<T> = HashMap<String, HashMap<String, T>>;

/// Instance as stored on disk.
#[derive(Debug, Deserialize, Serialize)]
struct RawInstance {
    #[serde(rename = "U_data")]
    units: Vec<String>,
    #[serde(rename = "I_data")]
    tasks: HashMap<String, Vec<String>>,
    #[serde(rename = "P")]
    slots: usize,
    #[serde(rename = "H")]
    horizon: f64,
    tau_data: Table<f64>,
    #[serde(rename = "B_min")]
    batch_min: Table<f64>,
    #[serde(rename = "B_max")]
    batch_max: Table<f64>,
    #[serde(flatten)]
    extras: Extras,
}

fn lookup<T: Copy>(table: &Table<T>, field: &str, unit: &str, task: &str) -> Result<T> {
    table
        .get(unit)
        .and_then(|tasks| tasks.get(task))
        .copied()
        .ok_or_else(|| Error::malformed(format!("`{field}` has no entry for task `{task}` on unit `{unit}`")))
}

impl RawInstance {
    fn into_instance(self) -> Result<Instance> {
        let raw = self;
        let mut units = Vec::with_capacity(raw.units.len());

        for unit in raw.units {
            let names = raw
                .tasks
                .get(&unit)
                .ok_or_else(|| Error::malformed(format!("`I_data` has no entry for unit `{unit}`")))?;

            let specs = names
                .iter()
                .map(|task| {
                    Ok(TaskSpec::new(
                        task.clone(),
                        lookup(&raw.tau_data, "tau_data", &unit, task)?,
                        lookup(&raw.batch_min, "B_min", &unit, task)?,
                        lookup(&raw.batch_max, "B_max", &unit, task)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;

            units.push((unit, specs));
        }

        let instance = Instance::new(raw.horizon, raw.slots, units)?;
        tracing::debug!(
            units = instance.units().len(),
            tasks = instance.tasks().len(),
            auxiliary = raw.extras.populated(),
            "instance loaded"
        );
        Ok(instance.with_extras(raw.extras))
    }

    fn from_instance(instance: &Instance) -> Self {
        let mut raw = Self {
            units: Vec::with_capacity(instance.units().len()),
            tasks: HashMap::with_capacity(instance.units().len()),
            slots: instance.slots(),
            horizon: instance.horizon(),
            tau_data: HashMap::with_capacity(instance.units().len()),
            batch_min: HashMap::with_capacity(instance.units().len()),
            batch_max: HashMap::with_capacity(instance.units().len()),
            extras: instance.extras().clone(),
        };

        for unit in instance.units() {
            let tasks = unit.tasks.iter().map(|&id| instance.task(id));
            let table = |value: fn(&Task) -> f64| {
                let iter = unit.tasks.iter().map(|&id| instance.task(id));
                iter.map(|task| (task.name.clone(), value(task))).collect()
            };

            raw.units.push(unit.name.clone());
            raw.tasks.insert(unit.name.clone(), tasks.map(|task| task.name.clone()).collect());
            raw.tau_data.insert(unit.name.clone(), table(|task| task.duration));
            raw.batch_min.insert(unit.name.clone(), table(|task| task.batch_min));
            raw.batch_max.insert(unit.name.clone(), table(|task| task.batch_max));
        }

        raw
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawInstance::from_instance(self).serialize(serializer)
    }
}

/// Single line of a serialised schedule.
#[derive(Debug, Serialize)]
struct Entry<'a> {
    unit: &'a str,
    task: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot: Option<usize>,
    start: f64,
    finish: f64,
    quantity: f64,
}

impl Serialize for Schedule<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let instance = self.instance();
        serializer.collect_seq(self.assignments().iter().map(|assignment| {
            let task = instance.task(assignment.task);
            Entry {
                unit: &instance.units()[task.unit].name,
                task: &task.name,
                slot: assignment.slot,
                start: assignment.start,
                finish: assignment.finish,
                quantity: assignment.quantity,
            }
        }))
    }
}

/// Reads an instance in the JSON schema (`U_data`, `I_data`, `P`, `H`, `tau_data`, `B_min`,
/// `B_max` and the auxiliary fields).
///
/// # Errors
/// - [`Error::MalformedInstance`] if the document does not parse or a field is missing or invalid.
pub fn deserialize(reader: &mut impl BufRead) -> Result<Instance> {
    let raw: RawInstance = serde_json::from_reader(reader).map_err(|err| Error::malformed(err.to_string()))?;
    raw.into_instance()
}

/// Serialises a value as pretty JSON.
///
/// # Errors
/// - If the value cannot be serialised.
pub fn to_string(value: &impl Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| Error::Io(err.into()))
}

/// Size class of generated instances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeClass {
    pub name: &'static str,
    pub units: usize,
    pub tasks: usize,
    pub slots: usize,
    pub horizon: f64,
}

/// The classes written by [`generate_classes`].
pub const SIZE_CLASSES: [SizeClass; 3] = [
    SizeClass { name: "small", units: 5, tasks: 5, slots: 10, horizon: 200.0 },
    SizeClass { name: "medium", units: 10, tasks: 10, slots: 15, horizon: 200.0 },
    SizeClass { name: "large", units: 15, tasks: 10, slots: 20, horizon: 200.0 },
];

/// Generates a random instance of the given class.
///
/// One task in five is long (80 to 150), the rest take 5 to 50. Batch bounds are `[1, 10]`,
/// unit capacities `[1, 20]`, and random precedence pairs are drawn for 30 % of the tasks.
///
/// # Errors
/// - If the class has no units or no tasks.
pub fn generate(class: &SizeClass, rng: &mut impl Rng) -> Result<Instance> {
    let mut units = Vec::with_capacity(class.units);
    let mut extras = Extras::default();

    for u in 1..=class.units {
        let unit = format!("u{u}");
        let specs: Vec<TaskSpec> = (1..=class.tasks)
            .map(|j| {
                let duration = if rng.gen_bool(0.2) {
                    rng.gen_range(80_u32..=150)
                } else {
                    rng.gen_range(5_u32..=50)
                };
                TaskSpec::new(format!("i{unit}_{j}"), f64::from(duration), 1.0, 10.0)
            })
            .collect();
        extras.capacity_min.insert(unit.clone(), 1.0);
        extras.capacity_max.insert(unit.clone(), 20.0);
        units.push((unit, specs));
    }

    let pairs: Vec<(String, String)> = units
        .iter()
        .flat_map(|(unit, specs)| specs.iter().map(|spec| (unit.clone(), spec.name.clone())))
        .collect();
    if pairs.len() >= 2 {
        for _ in 0..pairs.len() * 3 / 10 {
            let mut sample = pairs.choose_multiple(rng, 2).cloned();
            if let (Some(before), Some(after)) = (sample.next(), sample.next()) {
                extras.precedences.push(Precedence { before, after });
            }
        }
    }

    for table in [
        &mut extras.alpha_in,
        &mut extras.alpha_out,
        &mut extras.d_data,
        &mut extras.e_data,
        &mut extras.pj_max,
        &mut extras.p_init,
    ] {
        *table = serde_json::json!({});
    }

    Ok(Instance::new(class.horizon, class.slots, units)?.with_extras(extras))
}

/// Writes `count` instances of every size class to `{dir}/{class}_{idx}.json`, creating the
/// directory if needed. Returns the written paths.
///
/// # Errors
/// - If the directory or a file cannot be written.
pub fn generate_classes(dir: &Path, count: usize, rng: &mut impl Rng) -> Result<Vec<PathBuf>> {
    if !dir.try_exists()? {
        std::fs::create_dir_all(dir)?;
    }

    let mut written = Vec::with_capacity(SIZE_CLASSES.len() * count);
    for class in &SIZE_CLASSES {
        for idx in 1..=count {
            let path = dir.join(format!("{}_{idx}.json", class.name));
            let instance = generate(class, rng)?;
            std::fs::write(&path, to_string(&instance)?)?;
            tracing::info!(path = %path.display(), "instance written");
            written.push(path);
        }
    }

    Ok(written)
}
