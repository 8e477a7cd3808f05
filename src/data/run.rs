use crate::core::Scheduler;
use crate::data::deserialize;
use crate::solver::{Optimizer, Status};
use anyhow::{anyhow, ensure};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Report of running every pipeline on a directory of instances.
#[derive(Debug, Serialize)]
pub struct Report {
    pipelines: Vec<String>,
    entries: Vec<ReportEntry>,
}

impl Report {
    fn new(pipelines: Vec<String>) -> Self {
        let entries = Vec::new();
        Self { pipelines, entries }
    }

    /// Get the pipeline names, in column order.
    #[must_use]
    pub fn pipelines(&self) -> &[String] {
        &self.pipelines
    }

    /// Get the entries.
    #[must_use]
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Writes one row per instance with the time and makespan of every pipeline.
    /// A missing makespan is left empty.
    ///
    /// # Errors
    /// - If the writer fails.
    pub fn write_csv(&self, writer: &mut impl Write) -> std::io::Result<()> {
        write!(writer, "class,instance")?;
        for pipeline in &self.pipelines {
            write!(writer, ",{pipeline}_time,{pipeline}_ms")?;
        }
        writeln!(writer)?;

        for row in self.entries.chunks(self.pipelines.len().max(1)) {
            let Some(first) = row.first() else { continue };
            write!(writer, "{},{}", first.class, first.instance)?;
            for entry in row {
                let makespan = entry.makespan.map(|ms| format!("{ms:.2}")).unwrap_or_default();
                write!(writer, ",{:.2},{makespan}", entry.time)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    /// Mean time and mean makespan per class and pipeline, classes in first-seen order.
    /// The makespan mean only covers runs that produced a schedule.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn class_means(&self) -> Vec<ClassMean> {
        let mut means: Vec<ClassMean> = Vec::new();

        for entry in &self.entries {
            let position = means
                .iter()
                .position(|mean| mean.class == entry.class && mean.pipeline == entry.pipeline);
            let mean = if let Some(position) = position {
                &mut means[position]
            } else {
                means.push(ClassMean::new(&entry.class, &entry.pipeline));
                let last = means.len() - 1;
                &mut means[last]
            };

            mean.runs += 1;
            mean.time += entry.time;
            if let Some(makespan) = entry.makespan {
                mean.solved += 1;
                mean.makespan = Some(mean.makespan.unwrap_or_default() + makespan);
            }
        }

        for mean in &mut means {
            mean.time /= mean.runs as f64;
            mean.makespan = mean.makespan.map(|total| total / mean.solved as f64);
        }

        means
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "Means per class:")?;
        for mean in self.class_means() {
            writeln!(f, "{mean}")?;
        }
        writeln!(f, "-------------------")
    }
}

/// Report of running a single pipeline on a single instance.
#[non_exhaustive]
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub class: String,
    pub instance: String,
    pub pipeline: String,
    pub status: Status,
    pub makespan: Option<f64>,
    pub time: f64,
}

impl Display for ReportEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.makespan {
            Some(makespan) => write!(f, "{} / {}: {makespan:.2} in {:.2} sec", self.instance, self.pipeline, self.time),
            None => write!(f, "{} / {}: {} in {:.2} sec", self.instance, self.pipeline, self.status, self.time),
        }
    }
}

/// Averages of one pipeline over one class.
#[non_exhaustive]
#[derive(Debug, PartialEq, Serialize)]
pub struct ClassMean {
    pub class: String,
    pub pipeline: String,
    pub runs: usize,
    pub solved: usize,
    pub time: f64,
    pub makespan: Option<f64>,
}

impl ClassMean {
    fn new(class: &str, pipeline: &str) -> Self {
        Self {
            class: class.into(),
            pipeline: pipeline.into(),
            runs: 0,
            solved: 0,
            time: 0.0,
            makespan: None,
        }
    }
}

impl Display for ClassMean {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let makespan = self.makespan.map_or_else(|| "-".into(), |ms| format!("{ms:.2}"));
        write!(
            f,
            "{} / {}: makespan {makespan}, {:.2} sec ({}/{} solved)",
            self.class, self.pipeline, self.time, self.solved, self.runs
        )
    }
}

/// Runs every pipeline once on every `.json` instance of `dir`, in file name order.
///
/// # Errors
/// - If a file cannot be read or is not a valid instance.
/// - If a pipeline fails or returns an invalid schedule.
pub fn run(
    dir: impl AsRef<Path>,
    pipelines: &mut [Box<dyn Scheduler>],
    optimizer: &mut dyn Optimizer,
) -> anyhow::Result<Report> {
    let mut report = Report::new(pipelines.iter().map(|p| p.name().to_owned()).collect());

    let mut files = Vec::new();
    for file in std::fs::read_dir(dir)? {
        let path = file?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("Cannot read filename"))?;
        let class = parse_class(name)?;
        let instance = deserialize(&mut BufReader::new(File::open(&path)?))?;

        for pipeline in pipelines.iter_mut() {
            let time = std::time::Instant::now();
            let solution = pipeline.schedule(&instance, optimizer)?;
            let time = time.elapsed().as_secs_f64();

            if let Some(schedule) = &solution.schedule {
                ensure!(schedule.verify(), "Invalid schedule created by {} on {name}", pipeline.name());
            }

            let entry = ReportEntry {
                class: class.into(),
                instance: name.into(),
                pipeline: pipeline.name().into(),
                status: solution.status,
                makespan: solution.makespan(),
                time,
            };
            tracing::info!("{entry}");
            report.entries.push(entry);
        }
    }

    Ok(report)
}

/// Class of an instance file: the part of its name before the first `_`.
fn parse_class(filename: &str) -> anyhow::Result<&str> {
    static NAME_ERR: &str = "Cannot read filename";

    let stem = filename.split('.').next().ok_or_else(|| anyhow!(NAME_ERR))?;
    let (class, _) = stem.split_once('_').ok_or_else(|| anyhow!(NAME_ERR))?;
    ensure!(!class.is_empty(), NAME_ERR);
    Ok(class)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{Instance, Solution};
    use crate::data::to_string;
    use crate::solver::Embedded;

    fn entry(class: &str, instance: &str, pipeline: &str, makespan: Option<f64>, time: f64) -> ReportEntry {
        let status = if makespan.is_some() { Status::Optimal } else { Status::Timeout };
        ReportEntry {
            class: class.into(),
            instance: instance.into(),
            pipeline: pipeline.into(),
            status,
            makespan,
            time,
        }
    }

    fn sample_report() -> Report {
        let mut report = Report::new(vec!["exact".into(), "windowed".into()]);
        report.entries = vec![
            entry("small", "small_1.json", "exact", Some(30.0), 1.0),
            entry("small", "small_1.json", "windowed", Some(32.0), 0.5),
            entry("small", "small_2.json", "exact", Some(40.0), 3.0),
            entry("small", "small_2.json", "windowed", None, 0.25),
        ];
        report
    }

    #[test]
    fn test_parse_class() -> anyhow::Result<()> {
        assert_eq!(parse_class("small_1.json")?, "small");
        assert_eq!(parse_class("large_12.json")?, "large");
        assert_eq!(parse_class("medium_3_extra.json")?, "medium");
        Ok(())
    }

    #[test]
    fn test_parse_class_errors() {
        assert!(parse_class("").is_err());
        assert!(parse_class(".json").is_err());
        assert!(parse_class("small.json").is_err());
        assert!(parse_class("_1.json").is_err());
    }

    #[test]
    fn csv_has_column_pair_per_pipeline() -> anyhow::Result<()> {
        let mut buffer = Vec::new();
        sample_report().write_csv(&mut buffer)?;
        let text = String::from_utf8(buffer)?;
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "class,instance,exact_time,exact_ms,windowed_time,windowed_ms");
        assert_eq!(lines[1], "small,small_1.json,1.00,30.00,0.50,32.00");
        assert_eq!(lines[2], "small,small_2.json,3.00,40.00,0.25,");
        assert_eq!(lines.len(), 3);
        Ok(())
    }

    #[test]
    fn means_skip_missing_makespans() {
        let means = sample_report().class_means();
        assert_eq!(means.len(), 2);

        assert_eq!(means[0].pipeline, "exact");
        assert!((means[0].time - 2.0).abs() < f64::EPSILON);
        assert_eq!(means[0].makespan, Some(35.0));

        assert_eq!(means[1].pipeline, "windowed");
        assert_eq!((means[1].runs, means[1].solved), (2, 1));
        assert_eq!(means[1].makespan, Some(32.0));
    }

    #[derive(Debug)]
    struct Failing;

    impl Scheduler for Failing {
        fn schedule<'a>(&mut self, _: &'a Instance, _: &mut dyn Optimizer) -> crate::Result<Solution<'a>> {
            Ok(Solution::unsolved(Status::Infeasible))
        }

        fn configure(&mut self, _: &crate::core::Settings) {}

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn runs_every_pipeline_on_every_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let instance = Instance::with_durations(40.0, 4, &[&[10.0, 20.0], &[15.0]])?;
        std::fs::write(dir.path().join("small_2.json"), to_string(&instance)?)?;
        std::fs::write(dir.path().join("small_1.json"), to_string(&instance)?)?;
        std::fs::write(dir.path().join("notes.txt"), "ignored")?;

        let mut pipelines: Vec<Box<dyn Scheduler>> = vec![Box::new(crate::algo::Exact::default()), Box::new(Failing)];
        let report = run(dir.path(), &mut pipelines, &mut Embedded)?;

        assert_eq!(report.pipelines(), ["exact", "failing"]);
        assert_eq!(report.entries().len(), 4);
        assert_eq!(report.entries()[0].instance, "small_1.json");
        assert_eq!(report.entries()[0].makespan, Some(30.0));
        assert_eq!(report.entries()[1].status, Status::Infeasible);
        assert!(report.entries()[1].makespan.is_none());
        Ok(())
    }
}
