mod common;

use std::fs;

use assert_cmd::Command;
use common::{PersonRow, TestWorkspace, legacy_csv, scenario_rows};
use predicates::str::contains;

fn siniestros() -> Command {
    Command::cargo_bin("siniestros").expect("binary exists")
}

fn scenario_file(workspace: &TestWorkspace) -> String {
    workspace
        .write("personas.csv", &legacy_csv(&scenario_rows()))
        .to_str()
        .expect("utf-8 path")
        .to_string()
}

#[test]
fn summary_reports_metrics_as_json() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    let output = siniestros()
        .args(["summary", "-i", &input, "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).expect("summary json");
    assert_eq!(json["metrics"]["fatalities"], 57);
    assert_eq!(json["metrics"]["distinct_incidents"], 50);
    assert_eq!(json["report"]["fatalities"]["dropped_missing_vehicle"], 3);
    assert_eq!(json["years"], serde_json::json!([2021, 2022, 2023]));
}

#[test]
fn summary_table_lists_headline_figures() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    siniestros()
        .args(["summary", "-i", &input, "--years", "2022"])
        .assert()
        .success()
        .stdout(contains("distinct incidents"))
        .stdout(contains("2021,2022,2023"));
}

#[test]
fn age_sex_chart_ends_with_unknown_ages() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    siniestros()
        .args(["chart", "age-sex", "-i", &input])
        .assert()
        .success()
        .stdout(contains("Fallecidos por rango de edad y sexo"))
        .stdout(contains("Edad desconocida"));
}

#[test]
fn departments_chart_honours_top() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    let output = siniestros()
        .args(["chart", "departments", "-i", &input, "--top", "3", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let chart: serde_json::Value = serde_json::from_slice(&output).expect("chart json");
    assert_eq!(chart["rows"].as_array().map(Vec::len), Some(3));
    assert_eq!(chart["title"], "Top 3 departamentos con más fallecidos");
}

#[test]
fn group_by_department_with_shares() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    siniestros()
        .args(["group", "-i", &input, "--by", "departamento", "--shares"])
        .assert()
        .success()
        .stdout(contains("DEPARTAMENTO"))
        .stdout(contains("JUNÍN"))
        .stdout(contains("%"));
}

fn group_json(input: &str, extra: &[&str]) -> Vec<serde_json::Value> {
    let output = siniestros()
        .args(["group", "-i", input, "--by", "departamento", "--shares", "--json"])
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).expect("group json");
    json.as_array().expect("group rows").clone()
}

fn percents(rows: &[serde_json::Value]) -> Vec<f64> {
    rows.iter()
        .map(|row| row["percent"].as_f64().expect("percent"))
        .collect()
}

#[test]
fn group_top_shares_use_the_whole_subset() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);

    // 57 fatalities; PIURA holds 15 of them.
    let rows = group_json(&input, &["--top", "1"]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["key"], serde_json::json!(["PIURA"]));
    assert_eq!(rows[0]["count"], 15);
    let percent = percents(&rows)[0];
    assert!((percent - 15.0 / 57.0 * 100.0).abs() < 1e-9, "{percent}");
    assert_eq!(format!("{percent:.2}"), "26.32");
}

#[test]
fn group_shares_sum_to_one_hundred_for_a_year_selection() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    for extra in [&[][..], &["--years", "2022"][..]] {
        let rows = group_json(&input, extra);
        let total: f64 = percents(&rows).iter().sum();
        assert!((total - 100.0).abs() < 1e-9, "{extra:?}: {total}");
    }
}

#[test]
fn group_rejects_unknown_columns() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    siniestros()
        .args(["group", "-i", &input, "--by", "color"])
        .assert()
        .failure()
        .stderr(contains("Unknown column 'color'"));
}

#[test]
fn export_writes_clean_utf8_csv() {
    let workspace = TestWorkspace::new();
    let input = scenario_file(&workspace);
    let output = workspace.path().join("fallecidos.csv");
    siniestros()
        .args([
            "export",
            "-i",
            &input,
            "-o",
            output.to_str().expect("utf-8 path"),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read export");
    let mut lines = contents.lines();
    let header = lines.next().expect("header");
    assert!(header.starts_with("CÓDIGO SINIESTRO,CÓDIGO PERSONA"));
    assert!(header.ends_with("RANGO DE EDAD"));
    assert_eq!(lines.clone().count(), 57);
    assert!(contents.contains("CAÍDA DE PASAJERO"));
    assert!(contents.contains("EDAD DESCONOCIDA"));
}

#[test]
fn missing_file_reports_no_data() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("nope.csv");
    siniestros()
        .args(["summary", "-i", missing.to_str().expect("utf-8 path")])
        .assert()
        .failure()
        .stderr(contains("No data available"));
}

#[test]
fn source_without_fatalities_reports_no_data() {
    let workspace = TestWorkspace::new();
    let mut row = PersonRow::fatal("S1", "30", "MOTO");
    row.severity = "ILESO";
    let input = workspace.write("ilesos.csv", &legacy_csv(&[row]));
    siniestros()
        .args(["chart", "trend", "-i", input.to_str().expect("utf-8 path")])
        .assert()
        .failure()
        .stderr(contains("No data available"));
}

#[test]
fn config_file_supplies_source_options() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "canonical.csv",
        "codigo_siniestro;gravedad;edad;vehiculo\nA1;FALLECIDO;33;MOTO\nA2;FALLECIDO;;MOTO\n",
    );
    let config = workspace.write(
        "pipeline.yaml",
        "header_row: 0\ndelimiter: \";\"\nencoding: utf-8\nlayout: canonical\n",
    );
    let output = siniestros()
        .args([
            "summary",
            "-i",
            input.to_str().expect("utf-8 path"),
            "-c",
            config.to_str().expect("utf-8 path"),
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).expect("summary json");
    assert_eq!(json["metrics"]["fatalities"], 2);
    assert_eq!(json["report"]["fatalities"]["imputed_age_ranges"], 1);
}

#[test]
fn feed_writes_store_rows() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "feed.csv",
        "Nro Parte,Fecha y hora,Dirección / Distrito,Tipo\n\
         2024-001,05/03/2024 10:22:01 p.m.,\"AV. JAVIER PRADO (-12.0891,-77.0012)\",ACCIDENTE VEHICULAR\n\
         2024-002,05/03/2024 10:40:00 p.m.,JR. UNION,INCENDIO\n",
    );
    let output = workspace.path().join("points.csv");
    siniestros()
        .args([
            "feed",
            "-i",
            input.to_str().expect("utf-8 path"),
            "-o",
            output.to_str().expect("utf-8 path"),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read points");
    assert_eq!(
        contents,
        "cod_sin,lat,lon,fecha\n2024-001,-12.0891,-77.0012,2024-03-05\n"
    );
}

#[test]
fn feed_json_includes_map_center() {
    let workspace = TestWorkspace::new();
    let input = workspace.write(
        "store.csv",
        "cod_sin,lat,lon,fecha\nA,-12.0,-77.0,2024-01-01\nB,-14.0,-75.0,2024-01-02\nC,,,\n",
    );
    let output = siniestros()
        .args(["feed", "-i", input.to_str().expect("utf-8 path"), "--store", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).expect("feed json");
    assert_eq!(json["center"]["latitude"], -13.0);
    assert_eq!(json["markers"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["points"].as_array().map(Vec::len), Some(3));
}
