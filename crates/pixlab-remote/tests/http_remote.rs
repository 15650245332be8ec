//! HttpRemote against an in-process stand-in for the image service

use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pixlab_document::BinaryRef;
use pixlab_remote::{
    BatchOperation, BatchRequest, CommandTable, ExportFormat, ExportRequest, HttpRemote,
    OperationId, Parameters, RemoteError, RemoteService,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Default)]
struct Collected {
    files: Vec<(String, String, Vec<u8>)>,
    fields: BTreeMap<String, String>,
}

async fn collect(mut multipart: Multipart) -> Collected {
    let mut collected = Collected::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let data = field.bytes().await.unwrap();
                collected.files.push((name, file_name, data.to_vec()));
            }
            None => {
                let text = field.text().await.unwrap();
                collected.fields.insert(name, text);
            }
        }
    }
    collected
}

/// Answers with `<filename>|k=v,k=v|<payload>` as a PNG
async fn echo(multipart: Multipart) -> Response {
    let collected = collect(multipart).await;
    let (_, file_name, data) = &collected.files[0];
    let fields: Vec<String> = collected.fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
    let mut body = format!("{file_name}|{}|", fields.join(",")).into_bytes();
    body.extend_from_slice(data);
    ([(header::CONTENT_TYPE, "image/png")], body).into_response()
}

async fn failing(_multipart: Multipart) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "kernel exploded").into_response()
}

async fn json_instead_of_image(_multipart: Multipart) -> Response {
    Json(serde_json::json!({"detail": "not an image"})).into_response()
}

async fn batch(multipart: Multipart) -> Response {
    let collected = collect(multipart).await;
    let results: Vec<_> = collected
        .files
        .iter()
        .enumerate()
        .map(|(i, (_, name, data))| {
            let mut out = collected.fields["operation"].clone().into_bytes();
            out.push(b':');
            out.extend_from_slice(data);
            serde_json::json!({
                "filename": format!("processed_{}_{name}", i + 1),
                "image_data": STANDARD.encode(out),
                "original_filename": name,
            })
        })
        .collect();
    Json(serde_json::json!({
        "success": true,
        "processed_count": results.len(),
        "results": results,
        "download_available": true,
    }))
    .into_response()
}

async fn upload(_multipart: Multipart) -> Response {
    (
        [("x-image-width", "640"), ("x-image-height", "480")],
        Json(serde_json::json!({"message": "ok"})),
    )
        .into_response()
}

async fn report(multipart: Multipart) -> Response {
    let collected = collect(multipart).await;
    let operations: Vec<String> = serde_json::from_str(&collected.fields["operations"]).unwrap();
    Json(serde_json::json!({
        "timestamp": "2024-01-01 00:00:00",
        "original_filename": collected.files[0].1,
        "original_dimensions": "640 x 480",
        "operations_applied": operations.len(),
        "operations": operations,
    }))
    .into_response()
}

/// Answers only after the client's one-second timeout has passed
async fn slow(_multipart: Multipart) -> Response {
    tokio::time::sleep(Duration::from_secs(3)).await;
    ([(header::CONTENT_TYPE, "image/png")], b"late".to_vec()).into_response()
}

async fn spawn_service() -> HttpRemote {
    HttpRemote::new(serve().await, Duration::from_secs(5), Duration::from_secs(5)).unwrap()
}

/// Base address of a freshly bound stand-in service
async fn serve() -> String {
    let app = Router::new()
        .route("/convolution", post(echo))
        .route("/resize_crop", post(echo))
        .route("/export", post(echo))
        .route("/transform", post(failing))
        .route("/threshold", post(json_instead_of_image))
        .route("/batch_process", post(batch))
        .route("/upload", post(upload))
        .route("/create_report", post(report))
        .route("/denoise", post(slow));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

fn photo() -> BinaryRef {
    BinaryRef::new("photo.png", b"PIXELS".to_vec())
}

#[tokio::test]
async fn process_sends_file_and_fields() {
    let remote = spawn_service().await;
    let table = CommandTable::standard();
    let prepared = table
        .prepare(OperationId::Convolution, &Parameters::new().with("op", "sharpen"))
        .unwrap();

    let result = remote.process(photo(), prepared).await.unwrap();

    assert_eq!(result.bytes(), b"photo.png|op=sharpen|PIXELS");
    assert_eq!(result.name(), "photo.png");
}

#[tokio::test]
async fn default_fields_reach_the_service() {
    let remote = spawn_service().await;
    let prepared = CommandTable::standard()
        .prepare(OperationId::ResizeCrop, &Parameters::new())
        .unwrap();

    let result = remote.process(photo(), prepared).await.unwrap();

    assert_eq!(result.bytes(), b"photo.png|crop=true,height=100,width=100|PIXELS");
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let remote = spawn_service().await;
    let prepared = CommandTable::standard()
        .prepare(OperationId::Transform, &Parameters::new().with("angle", 90))
        .unwrap();

    let err = remote.process(photo(), prepared).await.unwrap_err();

    assert_eq!(
        err,
        RemoteError::Status {
            status: 500,
            body: "kernel exploded".into()
        }
    );
}

#[tokio::test]
async fn json_body_on_image_endpoint_is_decode_error() {
    let remote = spawn_service().await;
    let prepared = CommandTable::standard()
        .prepare(OperationId::Threshold, &Parameters::new())
        .unwrap();

    let err = remote.process(photo(), prepared).await.unwrap_err();

    assert!(err.is_decode(), "{err}");
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let remote = HttpRemote::new(
        "http://127.0.0.1:9",
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
    .unwrap();
    let prepared = CommandTable::standard()
        .prepare(OperationId::Grayscale, &Parameters::new())
        .unwrap();

    let err = remote.process(photo(), prepared).await.unwrap_err();

    assert!(matches!(err, RemoteError::Transport(_)), "{err}");
}

#[tokio::test]
async fn slow_service_times_out_as_transport_error() {
    let remote = HttpRemote::new(serve().await, Duration::from_secs(1), Duration::from_secs(1))
        .unwrap();
    let prepared = CommandTable::standard()
        .prepare(OperationId::Denoise, &Parameters::new())
        .unwrap();

    let started = std::time::Instant::now();
    let err = remote.process(photo(), prepared).await.unwrap_err();

    assert!(matches!(err, RemoteError::Transport(_)), "{err}");
    assert!(err.to_string().contains("timed out"), "{err}");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn batch_round_trip_preserves_order() {
    let remote = spawn_service().await;
    let inputs = vec![
        BinaryRef::new("a.png", b"A".to_vec()),
        BinaryRef::new("b.png", b"B".to_vec()),
        BinaryRef::new("c.png", b"C".to_vec()),
    ];
    let request = BatchRequest::new(BatchOperation::Blur, &Parameters::new(), inputs).unwrap();

    let items = remote.process_batch(request).await.unwrap();

    let names: Vec<_> = items.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, ["processed_1_a.png", "processed_2_b.png", "processed_3_c.png"]);
    assert_eq!(items[1].image.bytes(), b"blur:B");
    assert_eq!(items[2].original_filename.as_deref(), Some("c.png"));
}

#[tokio::test]
async fn export_names_file_by_format() {
    let remote = spawn_service().await;
    let request = ExportRequest::new(photo(), ExportFormat::Jpeg, 80).unwrap();

    let exported = remote.export(request).await.unwrap();

    assert_eq!(exported.filename(), "exported_image.jpg");
    assert_eq!(exported.media_type, "image/png");
    assert_eq!(exported.file.bytes(), b"photo.png|format=jpg,quality=80|PIXELS");
}

#[tokio::test]
async fn inspect_reads_dimension_headers() {
    let remote = spawn_service().await;

    let info = remote.inspect(photo()).await.unwrap();

    assert_eq!((info.width, info.height), (640, 480));
}

#[tokio::test]
async fn report_carries_operations() {
    let remote = spawn_service().await;
    let ops = vec!["Original".to_string(), "Grayscale".to_string()];

    let report = remote.create_report(photo(), ops.clone()).await.unwrap();

    assert_eq!(report.original_filename, "photo.png");
    assert_eq!(report.operations, ops);
    assert_eq!(report.operations_applied, 2);
}
