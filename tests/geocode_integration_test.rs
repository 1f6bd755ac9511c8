use anyhow::Result;
use httpmock::prelude::*;
use sheet_geocoder::adapters::spreadsheet::{read_table, write_xlsx};
use sheet_geocoder::core::Pipeline;
use sheet_geocoder::{CliConfig, GeocodeEngine, GeocoderError, LocalStorage, SpreadsheetPipeline};
use std::path::Path;
use tempfile::TempDir;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn config(input: &Path, output: &Path, endpoint: String) -> CliConfig {
    CliConfig {
        input: input.to_str().unwrap().to_string(),
        output_path: output.to_str().unwrap().to_string(),
        api_endpoint: endpoint,
        api_key: "pk.test".to_string(),
        lat_column: None,
        lng_column: None,
        columns: vec![],
        location_columns: vec![],
        format: "xlsx".to_string(),
        timeout_seconds: 10,
        throttle_ms: 0,
        phone_country_code: "+213".to_string(),
        address_debug: false,
        dry_run: false,
        verbose: false,
        monitor: false,
        log_json: false,
    }
}

#[tokio::test]
async fn test_end_to_end_xlsx_with_mock_locationiq() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input_path = temp_dir.path().join("points.xlsx");
    let output_dir = temp_dir.path().join("output");

    let columns = strings(&["Nom", "Lat", "Long", "Téléphone"]);
    let rows = vec![
        strings(&["Poste Alger", "36.7525", "3.04197", "0555123456"]),
        strings(&["Sans coords", "", "", "0666123456"]),
        strings(&["Oran", "35.6971", "-0.6308", "041123"]),
        strings(&["Bad", "abc", "3.0", ""]),
        strings(&["Zero", "0", "0", ""]),
    ];
    std::fs::write(&input_path, write_xlsx("Sheet1", &columns, &rows)?)?;

    let server = MockServer::start();
    let algiers = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/reverse.php")
            .query_param("lat", "36.7525")
            .query_param("key", "pk.test")
            .query_param("format", "json")
            .query_param("addressdetails", "1");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "display_name": "Grande Poste, Alger Centre, Alger, Algérie",
                "address": {
                    "municipality": "Alger Centre",
                    "city": "Alger",
                    "state": "Alger",
                    "country": "Algérie",
                    "postcode": "16000"
                }
            }));
    });
    let oran = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/reverse.php")
            .query_param("lat", "35.6971");
        then.status(404);
    });

    let config = config(&input_path, &output_dir, server.url("/v1/reverse.php"));
    let pipeline = SpreadsheetPipeline::with_locationiq(LocalStorage::default(), config);
    let engine = GeocodeEngine::new(pipeline);

    let output_path = engine.run().await?;

    algiers.assert_hits(1);
    oran.assert_hits(1);

    let file_name = Path::new(&output_path)
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(file_name.starts_with("processed_addresses_"));
    assert!(file_name.ends_with(".xlsx"));
    // processed_addresses_YYYYMMDD_HHMMSS.xlsx
    assert_eq!(file_name.len(), "processed_addresses_".len() + 15 + ".xlsx".len());

    let bytes = std::fs::read(&output_path)?;
    let table = read_table(&bytes, &file_name)?;

    assert_eq!(table.len(), 5);
    assert_eq!(&table.columns()[..4], columns.as_slice());

    let names: Vec<&str> = (0..5).map(|i| table.cell(i, "Nom").unwrap()).collect();
    assert_eq!(names, vec!["Poste Alger", "Sans coords", "Oran", "Bad", "Zero"]);

    assert_eq!(table.cell(0, "commune"), Some("Alger Centre"));
    assert_eq!(table.cell(0, "postcode"), Some("16000"));
    assert_eq!(table.cell(0, "geocoding_status"), Some("success"));
    assert_eq!(table.cell(0, "Téléphone"), Some("+213555123456"));

    assert_eq!(table.cell(1, "commune"), Some("Invalid Coordinates"));
    assert_eq!(table.cell(1, "geocoding_status"), Some("skipped"));
    assert_eq!(table.cell(1, "Téléphone"), Some("+213666123456"));

    assert_eq!(table.cell(2, "commune"), Some("API Error"));
    assert_eq!(table.cell(2, "full_address"), Some("Error: 404"));
    assert_eq!(table.cell(2, "geocoding_status"), Some("error"));
    assert_eq!(table.cell(2, "Téléphone"), Some("041123"));

    assert_eq!(table.cell(3, "commune"), Some("Invalid Data"));
    assert_eq!(table.cell(3, "geocoding_status"), Some("error"));

    assert_eq!(table.cell(4, "geocoding_status"), Some("skipped"));

    for row in 0..table.len() {
        let status = table.cell(row, "geocoding_status").unwrap();
        assert!(["success", "error", "skipped"].contains(&status));
    }

    Ok(())
}

#[tokio::test]
async fn test_counters_add_up_to_total_rows() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input_path = temp_dir.path().join("points.csv");
    std::fs::write(
        &input_path,
        "id,latitude,longitude\n1,36.1,3.1\n2,36.2,3.2\n3,,\n4,x,y\n5,36.5,3.5\n",
    )?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200)
            .json_body(serde_json::json!({"display_name": "Somewhere", "address": {"town": "Blida"}}));
    });

    let config = config(&input_path, temp_dir.path(), server.url("/reverse"));
    let pipeline = SpreadsheetPipeline::with_locationiq(LocalStorage::default(), config);

    let table = pipeline.extract().await?;
    let total_rows = table.len();
    let session = pipeline.transform(table).await?;

    api_mock.assert_hits(3);
    assert_eq!(session.counters.successful, 3);
    assert_eq!(session.counters.failed, 2);
    assert_eq!(session.counters.successful + session.counters.failed, total_rows);
    assert_eq!(session.output.get(0, "commune"), Some("Blida"));
    assert_eq!(session.output.get(3, "commune"), Some("Invalid Data"));

    Ok(())
}

#[tokio::test]
async fn test_selected_columns_and_csv_export() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input_path = temp_dir.path().join("points.csv");
    std::fs::write(
        &input_path,
        "Name,GPS Lat,GPS Lon,Mobile\nA,36.1,3.1,0770123456\n",
    )?;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(serde_json::json!({
            "display_name": "Rue X, Tipaza",
            "address": {"town": "Tipaza", "country": "Algérie"}
        }));
    });

    let mut config = config(&input_path, temp_dir.path(), server.url("/reverse"));
    config.format = "csv".to_string();
    config.columns = strings(&["Name", "Mobile"]);
    config.location_columns = strings(&["commune", "geocoding_status"]);

    let pipeline = SpreadsheetPipeline::with_locationiq(LocalStorage::default(), config);
    let output_path = GeocodeEngine::new(pipeline).run().await?;

    assert!(output_path.ends_with(".csv"));
    let text = std::fs::read_to_string(&output_path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Name,Mobile,commune,geocoding_status",
            "A,+213770123456,Tipaza,success"
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_unparseable_input_halts_before_api_calls() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input_path = temp_dir.path().join("broken.xlsx");
    std::fs::write(&input_path, b"definitely not a spreadsheet")?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(serde_json::json!({}));
    });

    let config = config(&input_path, temp_dir.path(), server.url("/reverse"));
    let pipeline = SpreadsheetPipeline::with_locationiq(LocalStorage::default(), config);
    let result = GeocodeEngine::new(pipeline).run().await;

    assert!(matches!(result, Err(GeocoderError::SpreadsheetError(_))));
    api_mock.assert_hits(0);

    Ok(())
}

#[tokio::test]
async fn test_no_valid_coordinates_halts_before_api_calls() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input_path = temp_dir.path().join("points.csv");
    std::fs::write(&input_path, "lat,lng\n,\n0,0\nnan,nan\n")?;

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(serde_json::json!({}));
    });

    let config = config(&input_path, temp_dir.path(), server.url("/reverse"));
    let pipeline = SpreadsheetPipeline::with_locationiq(LocalStorage::default(), config);
    let result = GeocodeEngine::new(pipeline).run().await;

    assert!(matches!(
        result,
        Err(GeocoderError::NoValidCoordinates { .. })
    ));
    api_mock.assert_hits(0);

    Ok(())
}
