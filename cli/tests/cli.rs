use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use bzip2::read::MultiBzDecoder;
use predicates::prelude::*;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn cli_command() -> Command {
    let mut command = Command::cargo_bin("rdf-spatial").unwrap();
    command.env("RUST_LOG", "info");
    command
}

fn read_bz2(path: &Path) -> String {
    let mut content = String::new();
    MultiBzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut content)
        .unwrap();
    content
}

fn write_zip(path: &Path, members: &[(&str, &str)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in members {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn cli_help() {
    cli_command()
        .assert()
        .failure()
        .stderr(predicate::str::contains("rdf-spatial"));
}

#[test]
fn cli_csv2rdf() {
    let dir = TempDir::new().unwrap();
    let input = dir.child("bars.csv");
    input
        .write_str("id;name;link\nb-1;Zum Löwen;https://osm.example/node/17\n")
        .unwrap();
    let output = dir.child("bars.ttl.bz2");

    cli_command()
        .arg("csv2rdf")
        .arg("--input")
        .arg(input.path())
        .arg("--dataset")
        .arg("bars")
        .arg("--output")
        .arg(output.path())
        .arg("--prefix")
        .arg("ex:bar_")
        .arg("--iri")
        .arg("http://example.com/")
        .arg("--parent")
        .arg("ex:all")
        .arg("--separator")
        .arg(";")
        .arg("--primary-col")
        .arg("id")
        .arg("--column-mapping")
        .arg(r#"{"name": "rdfs:label"}"#)
        .arg("--values-mapping")
        .arg(r#"{"id": [[["-", "_"]], "lit"], "link": [[["^.*/(\\d+)$", "osmnode:$1"]], "iri"]}"#)
        .arg("--additional-prefixes")
        .arg(r#"{"osmnode": "https://www.openstreetmap.org/node/"}"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("Emitted 5 triples"));

    let turtle = read_bz2(output.path());
    assert!(turtle.contains("@prefix ex: <http://example.com/> .\n"));
    assert!(turtle.contains("@prefix osmnode: <https://www.openstreetmap.org/node/> .\n"));
    assert!(turtle.ends_with(
        "ex:bar_b_1 a ex:bars .\n\
         ex:bar_b_1 rdfs:member ex:all .\n\
         ex:bar_b_1 ex:id \"b_1\" .\n\
         ex:bar_b_1 rdfs:label \"Zum Löwen\" .\n\
         ex:bar_b_1 ex:link osmnode:17 .\n"
    ));
}

#[test]
fn cli_csv2rdf_rejects_bad_options() {
    let dir = TempDir::new().unwrap();
    let input = dir.child("bars.csv");
    input.write_str("id\n1\n").unwrap();

    cli_command()
        .arg("csv2rdf")
        .arg("-i")
        .arg(input.path())
        .arg("-d")
        .arg("bars")
        .arg("-o")
        .arg(dir.child("bars.ttl.bz2").path())
        .arg("-p")
        .arg("ex:")
        .arg("-r")
        .arg("http://example.com/")
        .arg("--separator")
        .arg("::")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--separator must be a single byte"));

    cli_command()
        .arg("csv2rdf")
        .arg("-i")
        .arg(input.path())
        .arg("-d")
        .arg("bars")
        .arg("-o")
        .arg(dir.child("bars.ttl.bz2").path())
        .arg("-p")
        .arg("ex")
        .arg("-r")
        .arg("http://example.com/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("short form 'prefix:'"));
}

#[test]
fn cli_kml2rdf_from_kmz() {
    let dir = TempDir::new().unwrap();
    let input = dir.child("places.kmz");
    write_zip(
        input.path(),
        &[(
            "doc.kml",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document>
            <Placemark><name>Tor</name><Point><coordinates>7.8,48</coordinates></Point></Placemark>
            </Document></kml>"#,
        )],
    );
    let output = dir.child("places.ttl.bz2");
    let aux_geo = dir.child("places.tsv");

    cli_command()
        .arg("kml2rdf")
        .arg("--input")
        .arg(input.path())
        .arg("--dataset")
        .arg("places")
        .arg("--output")
        .arg(output.path())
        .arg("--prefix")
        .arg("ex:place_")
        .arg("--iri")
        .arg("http://example.com/")
        .arg("--aux-geo")
        .arg(aux_geo.path())
        .arg("--kmz")
        .assert()
        .success()
        .stderr(predicate::str::contains("Emitted 4 triples and 1 aux geo entries"));

    dir.child("places.kml")
        .assert(predicate::str::contains("<name>Tor</name>"));
    aux_geo.assert("ex:place_1\tPOINT(7.8 48.0)\n");
    assert!(read_bz2(output.path()).ends_with(
        "ex:place_1 a ex:places .\n\
         ex:place_1 rdfs:label \"Tor\" .\n\
         ex:place_1 geo:hasGeometry ex:place_1_geo .\n\
         ex:place_1_geo geo:asWKT \"POINT(7.8 48.0)\"^^geo:wktLiteral .\n"
    ));
}

#[test]
fn cli_gtfs2rdf() {
    let dir = TempDir::new().unwrap();
    let input = dir.child("feed.zip");
    write_zip(
        input.path(),
        &[
            ("stops.txt", "stop_id,stop_name,stop_lat,stop_lon\ns1,Hbf,47.99,7.84\n"),
            ("agency.txt", "agency_id,agency_name\nA,Verkehrsbetriebe\n"),
        ],
    );
    let workdir = dir.child("work");
    let output = dir.child("feed.ttl.bz2");
    let aux_geo = dir.child("feed.tsv");

    cli_command()
        .arg("gtfs2rdf")
        .arg("--feed")
        .arg("vag")
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .arg("--output-aux-geo")
        .arg(aux_geo.path())
        .arg("--exclude")
        .arg("agency.txt")
        .arg("--workdir")
        .arg(workdir.path())
        .assert()
        .success();

    workdir.child("stops.txt").assert(predicate::path::exists());
    workdir.child("agency.txt").assert(predicate::path::missing());
    aux_geo.assert(predicate::str::contains("POINT(7.84 47.99)"));
    let turtle = read_bz2(output.path());
    assert!(turtle.contains("@prefix gtfs: <http://vocab.gtfs.org/terms#> .\n"));
    assert!(turtle.contains("gtfs:stop_vag_s1 a gtfs:Stop .\n"));
    assert!(turtle.contains("gtfs:stop_vag_s1 rdfs:member gtfs:feed_vag .\n"));
    assert!(!turtle.contains("gtfs:Agency"));
}

#[test]
fn cli_gtfs2rdf_skip_prefixes() {
    let dir = TempDir::new().unwrap();
    let input = dir.child("feed.zip");
    write_zip(input.path(), &[("agency.txt", "agency_id,agency_name\nA,VAG\n")]);
    let output = dir.child("feed.ttl.bz2");

    cli_command()
        .arg("gtfs2rdf")
        .arg("-f")
        .arg("vag")
        .arg("-i")
        .arg(input.path())
        .arg("-o")
        .arg(output.path())
        .arg("--skip-prefixes")
        .arg("--workdir")
        .arg(dir.path())
        .assert()
        .success();

    let turtle = read_bz2(output.path());
    assert!(!turtle.contains("@prefix"));
    assert!(turtle.starts_with("gtfs:agency_vag_A a gtfs:Agency .\n"));
}

#[test]
fn cli_election2rdf() {
    let dir = TempDir::new().unwrap();
    dir.child("districts.csv")
        .write_str("nr,name\n1,Mitte\n")
        .unwrap();
    let config = dir.child("election.json");
    config
        .write_str(&format!(
            r#"{{
                "prefixes": [{{"prefix": "election", "iri": "http://example.com/election/"}}],
                "election": {{"label": "Test election", "id_prefix": "t"}},
                "csv": [{{
                    "dataset": "district",
                    "command": "",
                    "store_filename": "{}",
                    "primary_prefix": "election:district",
                    "csv_separator": ",",
                    "csv_quote": "\"",
                    "column_mapping": {{}},
                    "primary_col": "nr"
                }}],
                "kml": []
            }}"#,
            dir.child("districts.csv").path().display()
        ))
        .unwrap();
    let output = dir.child("election.ttl.bz2");

    cli_command()
        .arg("election2rdf")
        .arg("--config")
        .arg(config.path())
        .arg("--output")
        .arg(output.path())
        .arg("--warn-missing-col-mapping")
        .assert()
        .success()
        .stderr(predicate::str::contains("Downloading datasets"));

    let turtle = read_bz2(output.path());
    assert!(turtle.contains("@prefix election: <http://example.com/election/> .\n"));
    assert!(turtle.contains("election:districtt1 rdfs:member "));
}

#[test]
fn cli_compose() {
    let dir = TempDir::new().unwrap();
    dir.child("main_compose.json")
        .write_str(
            r#"{
            "template": {"filename": "template.rq"},
            "spatial_searches": [{
                "config": {"algorithm": "baseline", "maxDistance": 100},
                "left": ["station.rq"],
                "right": [{"filename": "bar.rq"}],
                "group_template": {
                    "filename": "group.rq",
                    "patterns": {"queries": "%QUERIES%", "select": "%SELECT%"}
                },
                "template_pattern": "%SPATIALSEARCH%",
                "name_template": {
                    "template": "%LEFT%_%RIGHT%",
                    "patterns": {"type": "%TYPE%", "left": "%LEFT%", "right": "%RIGHT%"}
                },
                "add_selectors": {
                    "selectors": ["%DIST%"],
                    "patterns": {"dist": "%DIST%", "count": "%COUNT%", "centroid": "%CENTROID%"}
                }
            }]
        }"#,
        )
        .unwrap();
    dir.child("template.rq")
        .write_str("SELECT * WHERE {\n%SPATIALSEARCH%\n}")
        .unwrap();
    dir.child("group.rq")
        .write_str("{\nSELECT %SELECT% WHERE {\n%QUERIES%\n}\n}")
        .unwrap();
    dir.child("station.rq").write_str("?station a ex:Station .").unwrap();
    dir.child("bar.rq").write_str("?bar a ex:Bar .").unwrap();

    cli_command()
        .arg("compose")
        .arg(dir.path())
        .arg("--main-config")
        .arg("main_compose.json")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("SELECT * WHERE {\n"))
        .stdout(predicate::str::contains("SERVICE spatialSearch:"))
        .stdout(predicate::str::contains("spatialSearch:maxDistance 100"))
        .stdout(predicate::str::contains("?bar a ex:Bar ."));

    let output = dir.child("query.rq");
    cli_command()
        .arg("compose")
        .arg(dir.path())
        .arg("-c")
        .arg("main_compose.json")
        .arg("-o")
        .arg(output.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    output.assert(predicate::str::ends_with("}\n"));
}

#[test]
fn cli_compose_reports_missing_files() {
    let dir = TempDir::new().unwrap();
    dir.child("main_compose.json")
        .write_str(r#"{"template": {"filename": "template.rq"}}"#)
        .unwrap();

    cli_command()
        .arg("compose")
        .arg(dir.path())
        .arg("-c")
        .arg("main_compose.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File 'template.rq' is missing"));

    cli_command()
        .arg("compose")
        .arg(dir.child("nothing.zip").path())
        .arg("-c")
        .arg("main_compose.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
