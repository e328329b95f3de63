//! End-to-end behaviour of the prediction service across ingests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use sipcast_core::{
    CategoryId, CoreError, EncoderConfig, PredictionService, ProductName, ServiceConfig,
};
use sipcast_gbdt::GradientBoostingConfig;
use sipcast_io::SalesRecord;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn config() -> ServiceConfig {
    ServiceConfig::new(
        GradientBoostingConfig::new(25)
            .unwrap()
            .with_min_child_weight(0.01),
    )
}

fn initial_service() -> PredictionService {
    PredictionService::initialize(&fixture("initial_sales.csv"), config()).unwrap()
}

#[test]
fn initial_file_builds_registries_and_predicts() {
    let service = initial_service();
    let weathers = service.list_weather_options();
    assert_eq!(
        weathers,
        vec![
            ("Sunny".to_string(), CategoryId::new(0)),
            ("Rainy".to_string(), CategoryId::new(1)),
        ]
    );
    let products = service.list_product_names();
    assert_eq!(products.get(&CategoryId::new(0)).map(String::as_str), Some("Cola"));
    assert_eq!(products.get(&CategoryId::new(1)).map(String::as_str), Some("Tea"));

    let prediction = service.predict(22.0, CategoryId::new(0)).unwrap();
    assert!(prediction.product_id.index() < 2);
}

#[test]
fn ingest_new_product_extends_registry_and_schema() {
    let service = initial_service();
    let summary = service
        .ingest_additional_data(&fixture("coffee_sales.csv"))
        .unwrap();
    assert_eq!(summary.rows_added, 3);
    assert_eq!(summary.new_products, 1);
    assert_eq!(summary.new_weathers, 1);

    let snapshot = service.snapshot();
    let corpus = snapshot.corpus();
    assert_eq!(corpus.products().id_of("Coffee"), Some(CategoryId::new(2)));
    assert_eq!(corpus.products().id_of("Cola"), Some(CategoryId::new(0)));
    assert_eq!(corpus.schema().len(), 5);
    for row in &corpus.rows()[..2] {
        assert_eq!(row.product_indicators()[2], 0.0);
    }
    for row in corpus.rows() {
        assert_eq!(row.values().len(), corpus.schema().len());
    }
    assert_eq!(snapshot.classifier().n_classes(), 3);
}

#[test]
fn predict_after_ingest_never_reports_schema_mismatch() {
    let service = initial_service();
    service
        .ingest_additional_data(&fixture("coffee_sales.csv"))
        .unwrap();
    for weather in 0..3 {
        for temperature in [-5.0, 5.0, 20.0, 35.0] {
            let prediction = service
                .predict(temperature, CategoryId::new(weather))
                .unwrap();
            assert!(prediction.product_id.index() < 3);
            assert!(matches!(prediction.product, ProductName::Known(_)));
        }
    }
}

#[test]
fn all_blank_temperatures_use_the_fallback() {
    let service = PredictionService::initialize(
        &fixture("blank_temperatures.csv"),
        config().with_encoder(EncoderConfig::new().with_missing_temperature_fallback(12.5)),
    )
    .unwrap();
    let snapshot = service.snapshot();
    assert!(
        snapshot
            .corpus()
            .rows()
            .iter()
            .all(|r| r.temperature() == 12.5)
    );
}

#[test]
fn failed_ingest_leaves_state_untouched() {
    let service = initial_service();
    let before = service.snapshot();

    let err = service
        .ingest_additional_data(&fixture("missing_product.csv"))
        .unwrap_err();
    assert!(matches!(err, CoreError::MalformedInput { row_index: 1, .. }));

    let err = service
        .ingest_additional_data(Path::new("/nonexistent/more.csv"))
        .unwrap_err();
    assert!(matches!(err, CoreError::Io(_)));

    let after = service.snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(service.corpus_len(), 2);
    assert_eq!(service.list_product_names().len(), 2);
    assert!(after.corpus().products().id_of("Juice").is_none());
}

#[test]
fn listings_are_idempotent() {
    let service = initial_service();
    assert_eq!(service.list_product_names(), service.list_product_names());
    assert_eq!(service.list_weather_options(), service.list_weather_options());
}

#[test]
fn existing_ids_survive_repeated_ingests() {
    let service = initial_service();
    for batch in [
        vec![SalesRecord::new(Some(30.0), "Sunny", "Soda")],
        vec![SalesRecord::new(Some(10.0), "Rainy", "Tea")],
        vec![SalesRecord::new(None, "Foggy", "Cola")],
    ] {
        service.ingest_records(&batch).unwrap();
        let products = service.list_product_names();
        assert_eq!(products[&CategoryId::new(0)], "Cola");
        assert_eq!(products[&CategoryId::new(1)], "Tea");
    }
    assert_eq!(service.list_product_names()[&CategoryId::new(2)], "Soda");
    assert_eq!(service.corpus_len(), 5);
}

#[test]
fn huge_readings_with_a_blank_still_ingest() {
    let service = initial_service();
    let summary = service
        .ingest_contents(
            Path::new("upload.csv"),
            "temperature,weather,product\n1e308,Sunny,Cola\n1.5e308,Rainy,Tea\n,Sunny,Cola\n",
        )
        .unwrap();
    assert_eq!(summary.rows_added, 3);
    let snapshot = service.snapshot();
    assert!(
        snapshot
            .corpus()
            .rows()
            .iter()
            .all(|r| r.temperature().is_finite())
    );
    assert!(service.predict(1.2e308, CategoryId::new(0)).is_ok());
}

#[test]
fn contents_ingest_reports_source_on_error() {
    let service = initial_service();
    let err = service
        .ingest_contents(Path::new("upload.csv"), "temperature,product\n20,Cola\n")
        .unwrap_err();
    assert!(err.to_string().contains("upload.csv"));
}

#[test]
fn predictions_run_alongside_ingests() {
    let service = Arc::new(initial_service());
    let reader = {
        let service = Arc::clone(&service);
        thread::spawn(move || {
            for _ in 0..50 {
                let prediction = service.predict(20.0, CategoryId::new(0)).unwrap();
                assert!(prediction.product_id.index() < 4);
            }
        })
    };
    for t in [3.0, 31.0] {
        service
            .ingest_records(&[
                SalesRecord::new(Some(t), "Sunny", "Lemonade"),
                SalesRecord::new(Some(t + 1.0), "Rainy", "Coffee"),
            ])
            .unwrap();
    }
    reader.join().unwrap();
    assert_eq!(service.list_product_names().len(), 4);
}
