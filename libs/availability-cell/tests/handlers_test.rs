use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::{Extension, Path, State};
use axum::Json;
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::Authorization;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::handlers::{create_rule, delete_rule, get_week_availability};
use availability_cell::models::CreateRuleRequest;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn weekday_name(date: chrono::NaiveDate) -> &'static str {
    use chrono::Datelike;
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

#[tokio::test]
async fn week_availability_with_no_rules_returns_seven_unavailable_days() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();

    let therapist_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_rules"))
        .and(query_param("therapist_id", format!("eq.{}", therapist_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = get_week_availability(
        State(Arc::new(config)),
        Path(therapist_id.clone()),
    )
    .await;

    assert!(result.is_ok());
    let response = result.unwrap().0;
    assert_eq!(response["therapist_id"], therapist_id);

    let days = response["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    for day in days {
        assert!(day["unavailable"].as_bool().unwrap());
        assert_eq!(day["morning"].as_array().unwrap().len(), 0);
        assert_eq!(day["afternoon"].as_array().unwrap().len(), 0);
    }
}

#[tokio::test]
async fn week_availability_expands_todays_recurring_rule() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();

    let therapist_id = Uuid::new_v4().to_string();
    let today = Utc::now().date_naive();

    // A recurring rule on today's weekday lands on the window's first day.
    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::availability_rule_response(
                &therapist_id,
                weekday_name(today),
                "09:00",
                "11:00",
                None,
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = get_week_availability(
        State(Arc::new(config)),
        Path(therapist_id.clone()),
    )
    .await;

    assert!(result.is_ok());
    let response = result.unwrap().0;
    let days = response["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);

    let first = &days[0];
    assert_eq!(first["date"], today.format("%Y-%m-%d").to_string());
    assert_eq!(first["morning"], json!(["09:00", "10:00"]));
    assert_eq!(first["afternoon"], json!([]));
    assert!(!first["unavailable"].as_bool().unwrap());

    // Same weekday does not reappear within the 7-day window.
    for day in &days[1..] {
        assert!(day["unavailable"].as_bool().unwrap());
    }
}

#[tokio::test]
async fn create_rule_with_unknown_weekday_is_rejected_as_validation() {
    let test_config = TestConfig::default();
    let config = test_config.to_arc();
    let user = TestUser::therapist("pt@example.com");
    let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, None);

    let request = CreateRuleRequest {
        day_of_week: "Someday".to_string(),
        start_time: Some("09:00".to_string()),
        end_time: Some("11:00".to_string()),
        is_available: None,
        special_date: None,
    };

    let result = create_rule(
        State(config),
        Path(Uuid::new_v4().to_string()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_user()),
        Json(request),
    )
    .await;

    assert_matches!(result.err().unwrap(), AppError::ValidationError(msg) if msg.contains("day_of_week"));
}

#[tokio::test]
async fn create_rule_store_failure_is_not_a_validation_error() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();
    let user = TestUser::therapist("pt@example.com");
    let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, None);

    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_rules"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&mock_server)
        .await;

    let request = CreateRuleRequest {
        day_of_week: "Monday".to_string(),
        start_time: Some("09:00".to_string()),
        end_time: Some("11:00".to_string()),
        is_available: None,
        special_date: None,
    };

    let result = create_rule(
        State(Arc::new(config)),
        Path(Uuid::new_v4().to_string()),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_user()),
        Json(request),
    )
    .await;

    // A failing store must surface as a server-side error, not a 400.
    assert_matches!(result.err().unwrap(), AppError::Database(_));
}

#[tokio::test]
async fn delete_rule_requests_the_representation_and_succeeds() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();
    let user = TestUser::therapist("pt@example.com");
    let token = JwtTestUtils::create_test_token(&user, &test_config.jwt_secret, None);

    let rule_id = Uuid::new_v4().to_string();

    // Without the Prefer header PostgREST answers 204 with no body.
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/availability_rules"))
        .and(query_param("id", format!("eq.{}", rule_id)))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::availability_rule_response(
                &Uuid::new_v4().to_string(),
                "Monday",
                "09:00",
                "11:00",
                None,
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = delete_rule(
        State(Arc::new(config)),
        Path(rule_id),
        TypedHeader(Authorization::bearer(&token).unwrap()),
        Extension(user.to_user()),
    )
    .await;

    let response = result.expect("delete should succeed").0;
    assert_eq!(response["success"], json!(true));
}

#[tokio::test]
async fn week_availability_surfaces_store_failure_as_error() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_rules"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let result = get_week_availability(
        State(Arc::new(config)),
        Path(Uuid::new_v4().to_string()),
    )
    .await;

    assert!(result.is_err());
}
