#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, PathItemType, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            other => panic!("{} should be an object schema, got {:?}", name, other.is_some()),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        for name in [
            "ErrorResponse",
            "HealthResponse",
            "ClientAnalytics",
            "BoardSnapshot",
            "ReportSubmission",
            "WeeklySummaryReport",
        ] {
            assert!(components.schemas.contains_key(name), "missing schema {}", name);
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for key in ["error", "code", "success"] {
            assert!(properties.iter().any(|p| p == key), "missing {}", key);
        }
    }

    #[test]
    fn test_weekly_summary_schema_lists_counts() {
        let properties = object_properties("WeeklySummaryReport");
        for key in ["weekly_meetings", "weekly_proposals", "weekly_sales_count", "lead_quality"] {
            assert!(properties.iter().any(|p| p == key), "missing {}", key);
        }
    }

    #[test]
    fn test_paths_use_expected_methods() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expect = [
            ("/health", PathItemType::Get),
            ("/api/v1/clients", PathItemType::Post),
            ("/api/v1/clients/{client_id}/pause", PathItemType::Post),
            ("/api/v1/tasks/{task_id}/category", PathItemType::Patch),
            ("/api/v1/tasks/{task_id}/completion", PathItemType::Patch),
            ("/api/v1/campaigns/{campaign_id}/metrics", PathItemType::Post),
            ("/api/v1/clients/{client_id}/insights/generate", PathItemType::Post),
            ("/api/v1/reports/evolution", PathItemType::Get),
            ("/api/v1/admin/summary", PathItemType::Get),
            ("/api/v1/report/{client_id}", PathItemType::Post),
        ];
        for (path, method) in expect {
            let item = paths.get(path).unwrap_or_else(|| panic!("missing path {}", path));
            assert!(item.operations.contains_key(&method), "{} lacks {:?}", path, method);
        }
    }

    #[test]
    fn test_destructive_client_actions_document_confirmation() {
        let openapi = ApiDoc::openapi();
        let item = openapi.paths.paths.get("/api/v1/clients/{client_id}").unwrap();
        let delete = item.operations.get(&PathItemType::Delete).unwrap();
        assert!(delete.responses.responses.contains_key("428"));
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
