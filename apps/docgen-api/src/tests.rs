//! Tests for the document generator API
//!
//! Test categories:
//! - Download filename validation and content types (proptest)
//! - HTTP endpoints against in-memory templates and a stub converter

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;

    use crate::api::{content_type, download_url, is_plain_filename};

    fn generated_name() -> impl Strategy<Value = String> {
        ("[a-z_]{1,32}", "[0-9a-f]{8}", prop_oneof![Just("docx"), Just("pdf")])
            .prop_map(|(prefix, id, ext)| format!("{prefix}_{id}.{ext}"))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn generated_names_are_downloadable(name in generated_name()) {
            prop_assert!(is_plain_filename(&name));
            prop_assert_eq!(download_url(&name), format!("/download/{name}"));
        }

        #[test]
        fn names_with_separators_are_rejected(
            a in "[a-z0-9]{0,8}",
            sep in prop_oneof![Just("/"), Just("\\"), Just(".."), Just(":"), Just(" ")],
            b in "[a-z0-9]{0,8}",
        ) {
            let name = format!("{a}{sep}{b}");
            prop_assert!(!is_plain_filename(&name));
        }

        #[test]
        fn hidden_names_are_rejected(rest in "[a-z0-9.]{0,12}") {
            let name = format!(".{rest}");
            prop_assert!(!is_plain_filename(&name));
        }

        #[test]
        fn only_docx_gets_the_word_type(stem in "[a-z0-9_]{1,16}", ext in "[a-z]{1,5}") {
            let name = format!("{stem}.{ext}");
            let expected = if ext == "docx" {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            } else {
                "application/pdf"
            };
            prop_assert_eq!(content_type(&name), expected);
        }
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(!is_plain_filename(""));
    }

    #[test]
    fn test_parent_directory_is_rejected() {
        assert!(!is_plain_filename(".."));
        assert!(!is_plain_filename("a..b.pdf"));
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        assert_eq!(
            content_type("offer_letter_0a1b2c3d.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(content_type("LETTER.DOCX"), "application/pdf");
    }
}

#[cfg(test)]
mod http_endpoint_tests {
    //! Integration tests for HTTP endpoints using axum-test

    use std::future::IntoFuture;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use docgen_core::fixtures::{self, StubConverter};
    use docgen_core::{
        DocumentGenerator, DocumentKind, DocxPackage, RetentionSweeper, DEFAULT_RETAIN,
        PDF_FAILED_WARNING,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::{router, AppState};

    struct TestApp {
        server: TestServer,
        templates: TempDir,
        output: TempDir,
    }

    fn create_test_app(converter: StubConverter, with_templates: bool) -> TestApp {
        let templates = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        if with_templates {
            fixtures::write_all_templates(templates.path());
        }

        let state = Arc::new(AppState {
            generator: DocumentGenerator::new(
                templates.path(),
                output.path(),
                Arc::new(converter),
            ),
            sweeper: RetentionSweeper::new(output.path(), DEFAULT_RETAIN),
        });

        TestApp {
            server: TestServer::new(router(state)).unwrap(),
            templates,
            output,
        }
    }

    fn create_test_server() -> TestApp {
        create_test_app(StubConverter::succeeding(), true)
    }

    /// A request body with every field of `kind` set to `<FIELD>`
    fn body_for(kind: DocumentKind) -> Value {
        let fields: serde_json::Map<String, Value> = kind
            .fields()
            .iter()
            .map(|spec| (spec.field.to_string(), json!(format!("<{}>", spec.field))))
            .collect();
        Value::Object(fields)
    }

    fn filename_of(url: &str) -> &str {
        url.strip_prefix("/download/").unwrap()
    }

    fn docx_text(path: &Path) -> String {
        DocxPackage::open(path)
            .unwrap()
            .paragraph_texts()
            .unwrap()
            .join("\n")
    }

    #[tokio::test]
    async fn test_root_returns_message() {
        let app = create_test_server();
        let response = app.server.get("/").await;
        response.assert_status_ok();

        let json = response.json::<Value>();
        assert_eq!(json["message"], "Document Generator API is running");
    }

    #[tokio::test]
    async fn test_health_returns_200() {
        let app = create_test_server();
        let response = app.server.get("/health").await;
        response.assert_status_ok();

        let json = response.json::<Value>();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "docgen-api");
    }

    #[tokio::test]
    async fn test_templates_lists_every_kind() {
        let app = create_test_server();
        std::fs::remove_file(app.templates.path().join("certificate.docx")).unwrap();

        let response = app.server.get("/templates").await;
        response.assert_status_ok();

        let json = response.json::<Value>();
        assert_eq!(json["count"], 6);
        let templates = json["templates"].as_array().unwrap();

        let certificate = templates
            .iter()
            .find(|t| t["route"] == "/generate/certificate")
            .unwrap();
        assert_eq!(certificate["available"], false);
        assert_eq!(certificate["required_fields"], json!(["NAME", "POSITION", "DURATION"]));

        let termination = templates
            .iter()
            .find(|t| t["kind"] == "termination_letter")
            .unwrap();
        assert_eq!(termination["template_file"], "Termination Letter.docx");
        assert_eq!(termination["available"], true);
    }

    #[tokio::test]
    async fn test_every_kind_generates_docx_and_pdf() {
        let app = create_test_server();

        for kind in DocumentKind::ALL {
            let response = app
                .server
                .post(&format!("/generate/{}", kind.route()))
                .json(&body_for(kind))
                .await;
            response.assert_status_ok();

            let json = response.json::<Value>();
            assert_eq!(json["success"], true);
            assert_eq!(
                json["message"],
                format!("{} generated successfully", kind.label())
            );
            assert!(json.get("warning").is_none());

            let docx = filename_of(json["docx_url"].as_str().unwrap());
            let pdf = filename_of(json["pdf_url"].as_str().unwrap());
            assert!(docx.starts_with(kind.output_prefix()));
            assert!(docx.ends_with(".docx"));
            assert_eq!(docx.trim_end_matches(".docx"), pdf.trim_end_matches(".pdf"));

            let text = docx_text(&app.output.path().join(docx));
            assert!(!text.contains("{{"), "{kind}: {text}");
            assert!(app.output.path().join(pdf).exists());
        }
    }

    #[tokio::test]
    async fn test_termination_ref_fills_refno() {
        let app = create_test_server();
        let response = app
            .server
            .post("/generate/termination-letter")
            .json(&json!({
                "REF": "HR/2024/017",
                "DATE": "1 March 2024",
                "NAME": "Grace Hopper",
                "POSITION": "Engineer",
                "TERMDATE": "15 March 2024",
                "LASTDAY": "31 March 2024"
            }))
            .await;
        response.assert_status_ok();

        let json = response.json::<Value>();
        let docx = filename_of(json["docx_url"].as_str().unwrap());
        let text = docx_text(&app.output.path().join(docx));
        assert!(text.contains("REF: HR/2024/017"), "{text}");
        assert!(text.contains("NAME: Grace Hopper"), "{text}");
    }

    #[tokio::test]
    async fn test_null_field_fills_empty_string() {
        let app = create_test_server();
        let response = app
            .server
            .post("/generate/certificate")
            .json(&json!({ "NAME": "Ada", "POSITION": null, "DURATION": "6 months" }))
            .await;
        response.assert_status_ok();

        let json = response.json::<Value>();
        let docx = filename_of(json["docx_url"].as_str().unwrap());
        let text = docx_text(&app.output.path().join(docx));
        assert!(text.contains("POSITION: \nDURATION: 6 months"), "{text}");
    }

    #[tokio::test]
    async fn test_missing_field_returns_422() {
        let app = create_test_server();
        let response = app
            .server
            .post("/generate/certificate")
            .json(&json!({ "NAME": "Ada", "DURATION": 6 }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let json = response.json::<Value>();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INVALID_FIELDS");
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("POSITION"), "{error}");
        assert!(error.contains("DURATION"), "{error}");
        assert_eq!(std::fs::read_dir(app.output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_fields_are_ignored() {
        let app = create_test_server();
        let response = app
            .server
            .post("/generate/certificate")
            .json(&json!({
                "NAME": "Ada",
                "POSITION": "Intern",
                "DURATION": "3 months",
                "FAVOURITE_COLOUR": "green"
            }))
            .await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_conversion_failure_returns_warning() {
        let app = create_test_app(StubConverter::failing(), true);
        let response = app
            .server
            .post("/generate/certificate")
            .json(&body_for(DocumentKind::Certificate))
            .await;
        response.assert_status_ok();

        let json = response.json::<Value>();
        assert_eq!(json["success"], true);
        assert_eq!(json["warning"], PDF_FAILED_WARNING);
        assert!(json.get("pdf_url").is_none());

        let docx_url = json["docx_url"].as_str().unwrap();
        app.server.get(docx_url).await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_template_returns_500() {
        let app = create_test_app(StubConverter::succeeding(), false);
        let response = app
            .server
            .post("/generate/offer-letter")
            .json(&body_for(DocumentKind::OfferLetter))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let json = response.json::<Value>();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "TEMPLATE_NOT_FOUND");
        assert!(json.get("trace").is_none());
        assert_eq!(std::fs::read_dir(app.output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_template_returns_500() {
        let app = create_test_server();
        std::fs::write(app.templates.path().join("certificate.docx"), b"not a zip").unwrap();

        let response = app
            .server
            .post("/generate/certificate")
            .json(&body_for(DocumentKind::Certificate))
            .await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["code"], "TEMPLATE_ERROR");
    }

    #[tokio::test]
    async fn test_download_missing_file_returns_404() {
        let app = create_test_server();
        let response = app.server.get("/download/doesnotexist.pdf").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["code"], "FILE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_download_rejects_path_tricks() {
        let app = create_test_server();
        for path in ["/download/..secret.pdf", "/download/a..b.pdf", "/download/bad%20name.pdf"] {
            let response = app.server.get(path).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.json::<Value>()["code"], "INVALID_FILENAME", "{path}");
        }
    }

    #[tokio::test]
    async fn test_download_serves_docx_and_pdf() {
        let app = create_test_server();
        let json = app
            .server
            .post("/generate/certificate")
            .json(&body_for(DocumentKind::Certificate))
            .await
            .json::<Value>();

        let docx_url = json["docx_url"].as_str().unwrap();
        let response = app.server.get(docx_url).await;
        response.assert_status_ok();
        assert_eq!(
            response.header("content-type"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        let disposition = response.header("content-disposition");
        assert_eq!(
            disposition.to_str().unwrap(),
            format!("attachment; filename=\"{}\"", filename_of(docx_url))
        );
        let package = DocxPackage::from_bytes(response.as_bytes().to_vec()).unwrap();
        assert!(package.paragraph_texts().unwrap().join("\n").contains("<NAME>"));

        let pdf_url = json["pdf_url"].as_str().unwrap();
        let response = app.server.get(pdf_url).await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "application/pdf");
        assert!(response.as_bytes().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_get_distinct_files() {
        let app = create_test_server();
        let body = body_for(DocumentKind::Certificate);

        let first = app.server.post("/generate/certificate").json(&body);
        let second = app.server.post("/generate/certificate").json(&body);
        let (first, second) = tokio::join!(first.into_future(), second.into_future());

        first.assert_status_ok();
        second.assert_status_ok();
        let (first, second) = (first.json::<Value>(), second.json::<Value>());
        assert_ne!(first["docx_url"], second["docx_url"]);
        assert_ne!(first["pdf_url"], second["pdf_url"]);
    }

    fn output_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_generation_triggers_retention_sweep() {
        let app = create_test_app(StubConverter::failing(), true);
        let body = body_for(DocumentKind::Certificate);

        let mut generated = Vec::new();
        for _ in 0..45 {
            let json = app
                .server
                .post("/generate/certificate")
                .json(&body)
                .await
                .json::<Value>();
            generated.push(filename_of(json["docx_url"].as_str().unwrap()).to_string());
            // keep creation times distinct at filesystem timestamp granularity
            tokio::time::sleep(Duration::from_millis(15)).await;
        }

        // sweeps run in the background after each response
        let mut remaining = output_files(app.output.path());
        for _ in 0..100 {
            if remaining.len() <= DEFAULT_RETAIN {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            remaining = output_files(app.output.path());
        }

        assert_eq!(remaining.len(), DEFAULT_RETAIN);
        for evicted in &generated[..5] {
            assert!(!remaining.contains(evicted), "{evicted} should have been evicted");
        }
        for kept in &generated[5..] {
            assert!(remaining.contains(kept), "{kept} should be kept");
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let app = create_test_server();
        let response = app
            .server
            .post("/generate/certificate")
            .json(&json!(["NAME", "POSITION"]))
            .await;
        assert!(response.status_code().is_client_error());
    }
}
