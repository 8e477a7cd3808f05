use batch_slots::algo::greedy::greedy_starts;
use batch_slots::algo::refine::{left_shift, unit_sequences};
use batch_slots::algo::slots::SlotModel;
use batch_slots::algo::{full_domains, pipelines, Exact, TwoPhase, Windowed};
use batch_slots::core::{Instance, Scheduler, Settings};
use batch_slots::solver::{Embedded, Optimizer, Status};

const EPS: f64 = 1e-6;

fn two_units(horizon: f64) -> anyhow::Result<Instance> {
    Ok(Instance::with_durations(horizon, 4, &[&[10.0, 20.0], &[15.0]])?)
}

fn makespan(scheduler: &mut dyn Scheduler, instance: &Instance) -> anyhow::Result<f64> {
    let solution = scheduler.schedule(instance, &mut Embedded)?;
    let schedule = solution
        .schedule
        .ok_or_else(|| anyhow::anyhow!("{} returned {}", scheduler.name(), solution.status))?;
    anyhow::ensure!(schedule.verify(), "{} returned an invalid schedule", scheduler.name());
    Ok(schedule.makespan())
}

#[test]
fn slot_pipelines_reach_thirty() -> anyhow::Result<()> {
    let instance = two_units(40.0)?;
    assert!((makespan(&mut Exact::default(), &instance)? - 30.0).abs() < EPS);
    assert!((makespan(&mut Windowed::default(), &instance)? - 30.0).abs() < EPS);
    Ok(())
}

#[test]
fn two_phase_keeps_its_grid_estimates() -> anyhow::Result<()> {
    // The grid [0, 13, 27, 40] places the long task at 13 at the earliest.
    assert!((makespan(&mut TwoPhase::default(), &two_units(40.0)?)? - 33.0).abs() < EPS);
    // With H = 30 the grid [0, 10, 20, 30] contains the serial start.
    assert!((makespan(&mut TwoPhase::default(), &two_units(30.0)?)? - 30.0).abs() < EPS);
    Ok(())
}

#[test]
fn generator_shaped_unit_is_solved_by_every_pipeline() -> anyhow::Result<()> {
    // The serial run of 230 ends past the horizon, slot starts stay within H + max τ = 320.
    let instance = Instance::with_durations(200.0, 10, &[&[40.0, 30.0, 120.0, 25.0, 15.0]])?;
    assert!((makespan(&mut Exact::default(), &instance)? - 230.0).abs() < EPS);
    assert!((makespan(&mut Windowed::default(), &instance)? - 230.0).abs() < EPS);
    assert!(makespan(&mut TwoPhase::default(), &instance)? >= 230.0 - EPS);
    Ok(())
}

#[test]
fn units_stay_independent() -> anyhow::Result<()> {
    let instance = two_units(40.0)?;
    let solution = Exact::default().schedule(&instance, &mut Embedded)?;
    let schedule = solution.schedule.ok_or_else(|| anyhow::anyhow!("no schedule"))?;

    let finish = |task| schedule.assignment(task).map(|a| a.finish).unwrap_or_default();
    assert!((finish(0).max(finish(1)) - 30.0).abs() < EPS);
    assert!((finish(2) - 15.0).abs() < EPS);
    Ok(())
}

#[test]
fn single_task_units_finish_with_longest_task() -> anyhow::Result<()> {
    let instance = Instance::with_durations(100.0, 5, &[&[12.0], &[40.0], &[7.5]])?;
    for mut pipeline in pipelines() {
        let value = makespan(pipeline.as_mut(), &instance)?;
        assert!((value - 40.0).abs() < EPS, "{}: {value}", pipeline.name());
    }
    Ok(())
}

#[test]
fn every_pipeline_returns_valid_schedules() -> anyhow::Result<()> {
    let durations: [&[f64]; 3] = [&[10.0, 20.0, 5.0], &[7.0, 7.0, 7.0, 3.0], &[50.0]];
    let instance = Instance::with_durations(120.0, 6, &durations)?;
    let serial = 50.0;

    for mut pipeline in pipelines() {
        let value = makespan(pipeline.as_mut(), &instance)?;
        assert!(value >= serial - EPS, "{}: {value}", pipeline.name());
    }
    Ok(())
}

#[test]
fn window_width_is_monotone() -> anyhow::Result<()> {
    let durations: [&[f64]; 2] = [&[30.0, 5.0, 12.0, 8.0], &[9.0, 9.0]];
    let instance = Instance::with_durations(100.0, 5, &durations)?;
    let exact = makespan(&mut Exact::default(), &instance)?;

    let mut previous = f64::INFINITY;
    for width in 0..=instance.slots() {
        let settings = Settings {
            width,
            ..Settings::default()
        };
        let solution = Windowed::from(&settings).schedule(&instance, &mut Embedded)?;
        match solution.makespan() {
            Some(value) => {
                assert!(value <= previous + EPS, "width {width}: {value} > {previous}");
                previous = value;
            }
            None => assert!(previous.is_infinite(), "width {width} lost feasibility"),
        }
    }
    assert!((previous - exact).abs() < EPS);
    Ok(())
}

#[test]
fn left_shift_stays_within_serial_bound() -> anyhow::Result<()> {
    let durations: [&[f64]; 2] = [&[30.0, 5.0, 12.0], &[80.0, 1.0]];
    let instance = Instance::with_durations(200.0, 8, &durations)?;
    let estimates = greedy_starts(&instance);
    let budget = Settings::default().refine;

    let solution = left_shift(&instance, &estimates, &mut Embedded, budget)?;
    let schedule = solution.schedule.ok_or_else(|| anyhow::anyhow!("no schedule"))?;

    let serial = unit_sequences(&instance, &estimates)
        .iter()
        .map(|tasks| tasks.iter().map(|&task| instance.task(task).duration).sum::<f64>())
        .fold(0.0, f64::max);
    assert!(schedule.makespan() <= serial + EPS);
    for (start, estimate) in schedule.starts().iter().zip(&estimates) {
        assert!(*start >= estimate - EPS);
    }
    Ok(())
}

#[test]
fn unassigned_slots_carry_no_quantity() -> anyhow::Result<()> {
    let instance = two_units(40.0)?;
    let model = SlotModel::new("full", &instance, full_domains(&instance));
    let outcome = Embedded.solve(&model.problem, Settings::default().exact)?;
    assert_eq!(outcome.status, Status::Optimal);

    for (k, task) in instance.tasks().iter().enumerate() {
        for (z, q) in model.assign[k].iter().zip(&model.quantity[k]) {
            let quantity = outcome.value(*q).unwrap_or_default();
            if outcome.is_set(*z) {
                assert!(quantity >= task.batch_min - EPS && quantity <= task.batch_max + EPS);
            } else {
                assert!(quantity.abs() < EPS);
            }
        }
    }
    Ok(())
}
