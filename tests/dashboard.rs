mod common;

use axum::http::StatusCode;
use common::{json, test_app};
use serde_json::json;

#[tokio::test]
async fn summary_counts_and_stats() {
    let (app, _) = test_app();
    let (_, dept) = json(&app, "POST", "/api/department", Some(json!({"dept_name": "History"}))).await;
    let dept_id = dept["data"]["dept_id"].clone();
    for (i, name) in ["Ada", "Grace", "Edsger"].iter().enumerate() {
        let (status, _) = json(
            &app,
            "POST",
            "/api/student",
            Some(json!({
                "first_name": name,
                "last_name": "Tester",
                "email": format!("s{}@example.edu", i),
                "department_id": dept_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, summary) = json(&app, "GET", "/api/dashboard/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalStudents"], 3);
    assert_eq!(summary["totalDepartments"], 1);
    assert_eq!(summary["totalCourses"], 0);
    assert!(summary["lastUpdated"].is_string());

    let (status, stats) = json(&app, "GET", "/api/dashboard/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["recentStudents"][0]["first_name"], "Edsger");
    assert_eq!(stats["departmentStats"][0]["departmentName"], "History");
    assert_eq!(stats["departmentStats"][0]["studentCount"], 3);

    let (status, activity) = json(&app, "GET", "/api/dashboard/recent-activity", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = activity.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i["type"] == "Student" && i["action"] == "Created"));
}

#[tokio::test]
async fn service_directory_lists_every_contract() {
    let (app, _) = test_app();
    let (status, body) = json(&app, "GET", "/api/services", None).await;
    assert_eq!(status, StatusCode::OK);
    let services = body["services"].as_array().unwrap();
    assert_eq!(services.len(), 23);
    assert!(services.iter().any(|s| s["contract"] == "IStudentService"));
    assert!(services.iter().any(|s| s["contract"] == "IGenericCrud"));
}
