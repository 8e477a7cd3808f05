use batch_slots::algo::TwoPhase;
use batch_slots::solver::{Embedded, Status};
use batch_slots::{data, run_reader, Error};
use std::fs::File;
use std::io::{BufReader, Write};

const INSTANCE: &str = r#"{
  "U_data": ["u1", "u2"],
  "I_data": { "u1": ["iu1_1", "iu1_2"], "u2": ["iu2_1"] },
  "P": 4,
  "H": 30,
  "tau_data": { "u1": { "iu1_1": 10, "iu1_2": 20 }, "u2": { "iu2_1": 15 } },
  "B_min": { "u1": { "iu1_1": 1, "iu1_2": 1 }, "u2": { "iu2_1": 1 } },
  "B_max": { "u1": { "iu1_1": 10, "iu1_2": 10 }, "u2": { "iu2_1": 10 } },
  "C_min": { "u1": 1, "u2": 1 },
  "C_max": { "u1": 20, "u2": 20 },
  "alpha_in": {},
  "alpha_out": {},
  "d_data": {},
  "e_data": {},
  "Pj_max": {},
  "p_init": {},
  "precedences": [
    { "before": ["u1", "iu1_2"], "after": ["u2", "iu2_1"] }
  ]
}"#;

#[test]
fn auxiliary_fields_are_inert() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("small_1.json");
    File::create(&path)?.write_all(INSTANCE.as_bytes())?;

    let instance = data::deserialize(&mut BufReader::new(File::open(&path)?))?;
    assert_eq!(instance.extras().precedences.len(), 1);
    assert_eq!(instance.extras().capacity_min.len(), 2);

    let mut output = Vec::new();
    let status = run_reader(
        &mut TwoPhase::default(),
        &mut Embedded,
        &mut BufReader::new(File::open(&path)?),
        &mut output,
    )?;
    let output = String::from_utf8(output)?;

    // The precedence would delay `iu2_1` until 30; it is ignored.
    assert_eq!(status, Status::Optimal);
    assert_eq!(output.lines().last(), Some("makespan: 30.00"));

    let json: String = output.lines().take_while(|line| !line.starts_with("makespan")).collect();
    let schedule: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(schedule[2]["task"], "iu2_1");
    assert_eq!(schedule[2]["start"], 0.0);
    Ok(())
}

#[test]
fn missing_field_is_malformed() {
    let broken = INSTANCE.replace(r#""tau_data""#, r#""durations""#);
    let result = data::deserialize(&mut BufReader::new(broken.as_bytes()));
    assert!(matches!(result, Err(Error::MalformedInstance(_))));
}

#[test]
fn unknown_unit_is_malformed() {
    let broken = INSTANCE.replace(r#""U_data": ["u1", "u2"]"#, r#""U_data": ["u1", "u3"]"#);
    let result = data::deserialize(&mut BufReader::new(broken.as_bytes()));
    assert!(matches!(result, Err(Error::MalformedInstance(message)) if message.contains("u3")));
}
