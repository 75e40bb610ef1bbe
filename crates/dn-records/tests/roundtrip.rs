use dn_core::NodeId;
use dn_graph::{AggregationPolicy, check_network, filter_to_calibrate, simplify_network, sort_node};
use dn_records::*;
use proptest::prelude::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const BASIN: &str = "node_id,downstream_id,area,elevation\n\
                     1,2,10,900\n\
                     2,3,5,700\n\
                     3,,20,100\n\
                     4,3,7,650\n";

#[test]
fn file_round_trip_and_pipeline() {
    let dir = temp_dir("dn_records_pipeline");
    let path = dir.join("basin.csv");
    std::fs::write(&path, BASIN).unwrap();

    let network = load_network(&path, &RecordFormat::csv()).unwrap();
    assert!(check_network(&network).is_valid());
    assert_eq!(sort_node(&network).last(), Some(&NodeId::from(3)));

    let simplified = simplify_network(&network, &AggregationPolicy::default()).unwrap();
    assert_eq!(simplified.len(), 3);
    let out = dir.join("simplified.csv");
    save_network(&out, &simplified, &RecordFormat::csv()).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        written,
        "node_id,downstream_id,area,elevation\n1,3,15,700\n3,,20,100\n4,3,7,650\n"
    );
}

#[test]
fn geoframe_file_for_simulator() {
    let dir = temp_dir("dn_records_geoframe");
    let network = parse_table(BASIN, &RecordFormat::csv())
        .unwrap()
        .into_network()
        .unwrap();

    let path = dir.join("topo.txt");
    save_table(
        &path,
        &RecordTable::from_network(&network).ids_only(),
        &RecordFormat::geoframe(),
    )
    .unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "1 2\n2 3\n3 0\n4 3\n");

    let back = load_network(&path, &RecordFormat::geoframe()).unwrap();
    assert_eq!(sort_node(&back), sort_node(&network));
}

#[test]
fn gauges_and_config_from_files() {
    let dir = temp_dir("dn_records_config");
    std::fs::write(dir.join("gauges.txt"), "G_up 2\nG_out 3\n").unwrap();
    std::fs::write(
        dir.join("workflow.yaml"),
        "gauges: gauges.txt\naggregation:\n  attributes:\n    area: sum\n",
    )
    .unwrap();

    let config = load_config(&dir.join("workflow.yaml")).unwrap();
    let gauges = load_gauges(config.gauges.as_deref().unwrap()).unwrap();
    let network = parse_table(BASIN, &config.format)
        .unwrap()
        .into_network()
        .unwrap();

    let set = filter_to_calibrate(&network, &gauges).unwrap();
    assert_eq!(set.basins.len(), 2);
    assert!(set.uncalibrated.is_empty());
}

#[test]
fn cyclic_table_is_refused_by_validated_load() {
    let dir = temp_dir("dn_records_cyclic");
    let path = dir.join("cyc.csv");
    std::fs::write(&path, "node_id,downstream_id\nA,B\nB,C\nC,A\nD,\n").unwrap();

    let raw = load_network(&path, &RecordFormat::csv()).unwrap();
    assert_eq!(sort_node(&raw), vec![NodeId::from("D")]);

    match load_valid_network(&path, &RecordFormat::csv()) {
        Err(RecordError::Graph(dn_graph::GraphError::InvalidTopology { findings })) => {
            assert_eq!(findings.len(), 1);
        }
        other => panic!("expected InvalidTopology, got {other:?}"),
    }

    let basin = dir.join("basin.csv");
    std::fs::write(&basin, BASIN).unwrap();
    assert_eq!(load_valid_network(&basin, &RecordFormat::csv()).unwrap().len(), 4);
}

#[test]
fn missing_file_names_path() {
    let err = load_table(
        std::path::Path::new("/definitely/not/here.csv"),
        &RecordFormat::csv(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.csv"));
}

fn arb_value() -> impl Strategy<Value = String> {
    "[ a-z0-9.\\-]{0,6}"
}

proptest! {
    #[test]
    fn parse_serialize_is_lossless(
        extra in prop::collection::vec(" ?[a-z]{1,5} ?", 0..4),
        rows in prop::collection::vec(prop::collection::vec(arb_value(), 4), 1..20),
    ) {
        let mut columns: Vec<String> = vec!["node_id".into(), "downstream_id".into()];
        for (i, name) in extra.iter().enumerate() {
            columns.push(format!("{name}{i}"));
        }
        let mut text = columns.join(",");
        text.push('\n');
        for (i, values) in rows.iter().enumerate() {
            let mut fields = vec![format!("n{i}"), if i == 0 { String::new() } else { "n0".into() }];
            fields.extend(values.iter().take(extra.len()).cloned());
            text.push_str(&fields.join(","));
            text.push('\n');
        }

        let format = RecordFormat::csv();
        let table = parse_table(&text, &format).unwrap();
        prop_assert_eq!(serialize_table(&table, &format).unwrap(), text);
    }
}
