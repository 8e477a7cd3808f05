#![deny(clippy::all, clippy::cargo, clippy::expect_used, clippy::unwrap_used)]
#![deny(clippy::pedantic, clippy::nursery, unsafe_code)]
#![warn(clippy::unimplemented, clippy::redundant_type_annotations)]

use std::io::{BufRead, Write};

pub mod algo;
pub mod core;
pub mod data;
pub mod error;
pub mod solver;

pub use error::{Error, Result};

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Log directives used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG: &str = "batch_slots=warn";

/// Builds the log filter from the `RUST_LOG` directives, falling back to [`DEFAULT_LOG`].
///
/// # Errors
/// - If the default directives cannot be parsed.
pub fn log_filter(directives: Option<&str>) -> std::result::Result<EnvFilter, ParseError> {
    directives
        .map_or_else(|| EnvFilter::try_new(DEFAULT_LOG), EnvFilter::try_new)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG))
}

/// Runs the given pipeline on the instance read from reader and writes the schedule to writer,
/// followed by a `makespan: X.XX` line. When no schedule exists the terminating status is
/// written instead. Returns the status of the final solve.
///
/// # Errors
/// - If the instance could not be read from the reader.
/// - If the optimizer backend fails.
/// - If the output could not be written.
///
/// # Panics
///  - If the schedule is invalid in debug mode.
pub fn run_reader(
    scheduler: &mut dyn core::Scheduler,
    optimizer: &mut dyn solver::Optimizer,
    reader: &mut impl BufRead,
    writer: &mut impl Write,
) -> Result<solver::Status> {
    let instance = data::deserialize(reader)?;
    let solution = scheduler.schedule(&instance, optimizer)?;

    if solution.fallback {
        tracing::warn!("coarse phase replaced by the greedy baseline");
    }

    match &solution.schedule {
        Some(schedule) => {
            debug_assert!(schedule.verify(), "Schedule is invalid: {schedule:?}");
            writeln!(writer, "{}", data::to_string(schedule)?)?;
            writeln!(writer, "makespan: {:.2}", schedule.makespan())?;
        }
        None => writeln!(writer, "status: {}", solution.status)?,
    }

    Ok(solution.status)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algo::{Exact, Windowed};
    use crate::solver::{Embedded, Status};
    use std::io::BufReader;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn log_filter_keeps_user_directives() -> anyhow::Result<()> {
        let filter = log_filter(Some("batch_slots=debug"))?;
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        assert_eq!(log_filter(None)?.max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(Some("batch_slots=loud"))?.max_level_hint(), Some(LevelFilter::WARN));
        Ok(())
    }

    #[test]
    fn prints_schedule_and_makespan() -> anyhow::Result<()> {
        let instance = crate::core::Instance::with_durations(40.0, 4, &[&[10.0, 20.0], &[15.0]])?;
        let input = data::to_string(&instance)?;
        let mut output = Vec::new();

        let status = run_reader(
            &mut Exact::default(),
            &mut Embedded,
            &mut BufReader::new(input.as_bytes()),
            &mut output,
        )?;

        let output = String::from_utf8(output)?;
        assert_eq!(status, Status::Optimal);
        assert_eq!(output.lines().last(), Some("makespan: 30.00"));
        Ok(())
    }

    #[test]
    fn prints_status_without_schedule() -> anyhow::Result<()> {
        let instance = crate::core::Instance::with_durations(40.0, 2, &[&[10.0, 20.0, 5.0]])?;
        let input = data::to_string(&instance)?;
        let mut output = Vec::new();

        let status = run_reader(
            &mut Windowed::with_width(0),
            &mut Embedded,
            &mut BufReader::new(input.as_bytes()),
            &mut output,
        )?;

        assert_eq!(status, Status::Infeasible);
        assert_eq!(String::from_utf8(output)?, "status: infeasible\n");
        Ok(())
    }

    #[test]
    fn malformed_input_is_rejected() {
        let mut output = Vec::new();
        let result = run_reader(
            &mut Exact::default(),
            &mut Embedded,
            &mut BufReader::new("{}".as_bytes()),
            &mut output,
        );
        assert!(matches!(result, Err(Error::MalformedInstance(_))));
        assert!(output.is_empty());
    }
}
