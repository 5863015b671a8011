//! HTTP-level tests for the recommendation and task endpoints against a mock server.

#[cfg(test)]
mod tests {
    use super::super::client::ApiClient;
    use super::super::recommendations::*;
    use crate::error::ApiError;
    use crate::task::TaskStatus;
    use mockito::{Matcher, Server, ServerGuard};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn wire_task(id: &str, title: &str, status: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "status": status,
            "sort_order": 1000,
            "tags": ["deep"],
            "project_id": null,
            "goal_id": null,
            "hard_due_at": null,
            "soft_due_at": null,
            "effort_minutes": 30,
            "created_at": "2023-01-01T00:00:00Z",
            "updated_at": "2023-01-01T00:00:00Z"
        })
    }

    fn wire_items(n: usize) -> Value {
        let items: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "task": wire_task(&(i + 1).to_string(), &format!("Recommendation {}", i + 1), "backlog"),
                    "score": 0.9 - (i as f64 * 0.1),
                    "factors": {"urgency": 0.8, "effort": 0.9},
                    "why": format!("Recommendation {} reasoning", i + 1)
                })
            })
            .collect();
        json!({ "items": items })
    }

    fn client_for(server: &ServerGuard) -> ApiClient {
        ApiClient::new(&format!("{}/api/v1", server.url())).unwrap()
    }

    #[tokio::test]
    async fn list_passes_limit_and_returns_items_verbatim() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/recommendations/next")
            .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(wire_items(3).to_string())
            .create_async()
            .await;

        let items = client_for(&server)
            .list_recommendations(DEFAULT_LIST_LIMIT)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].task.id, "1");
        assert_eq!(items[2].task.title, "Recommendation 3");
        assert_eq!(items[1].why, "Recommendation 2 reasoning");
        assert!((items[1].score - 0.8).abs() < 1e-9);
        assert_eq!(items[0].task.tags, vec!["deep"]);
    }

    #[tokio::test]
    async fn list_custom_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/recommendations/next")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body(wire_items(2).to_string())
            .create_async()
            .await;

        let items = client_for(&server).list_recommendations(5).await.unwrap();
        mock.assert_async().await;
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn all_three_operations_tolerate_malformed_bodies() {
        let bodies = [
            "{}",
            r#"{"items": null}"#,
            r#"{"items": 42}"#,
            r#"{"items": {"task": 1}}"#,
            r#"{"data": []}"#,
            "",
            "<html>oops</html>",
        ];

        for body in bodies {
            let mut server = Server::new_async().await;
            let _get = server
                .mock("GET", "/api/v1/recommendations/next")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(body)
                .expect(2)
                .create_async()
                .await;
            let _post = server
                .mock("POST", "/api/v1/recommendations/suggest-week")
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(body)
                .create_async()
                .await;

            let client = client_for(&server);
            let query = NextQuery::new(EnergyLevel::Low, TimeWindow::new(15).unwrap());

            assert!(client.list_recommendations(10).await.unwrap().is_empty(), "list: {body}");
            assert!(client.get_next_recommendations(&query).await.unwrap().is_empty(), "next: {body}");
            assert!(client.suggest_week(5).await.unwrap().is_empty(), "week: {body}");
        }
    }

    #[tokio::test]
    async fn server_error_is_surfaced() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/recommendations/next")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client_for(&server).list_recommendations(10).await.unwrap_err();
        match err {
            ApiError::Status { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_surfaced() {
        // Nothing listens on port 1.
        let client = ApiClient::new("http://127.0.0.1:1/api/v1").unwrap();
        let err = client.list_recommendations(10).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }

    #[tokio::test]
    async fn next_returns_why_exactly() {
        let mut server = Server::new_async().await;
        let body = json!({
            "items": [{
                "task": wire_task("T1", "Refactor parser", "todo"),
                "score": 3.5,
                "why": "Good fit for your energy"
            }]
        });
        let mock = server
            .mock("GET", "/api/v1/recommendations/next")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("energy".into(), "high".into()),
                Matcher::UrlEncoded("time_window".into(), "60".into()),
                Matcher::UrlEncoded("limit".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let query = NextQuery::new(EnergyLevel::High, TimeWindow::new(60).unwrap());
        let items = client_for(&server).get_next_recommendations(&query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].why, "Good fit for your energy");
        assert!(items[0].factors.is_none());
    }

    #[tokio::test]
    async fn next_sends_each_energy_level() {
        for energy in EnergyLevel::ALL {
            let mut server = Server::new_async().await;
            let mock = server
                .mock("GET", "/api/v1/recommendations/next")
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("energy".into(), energy.as_str().into()),
                    Matcher::UrlEncoded("time_window".into(), "30".into()),
                ]))
                .with_status(200)
                .with_body(r#"{"items": []}"#)
                .create_async()
                .await;

            let query = NextQuery::new(energy, TimeWindow::new(30).unwrap());
            let items = client_for(&server).get_next_recommendations(&query).await.unwrap();
            mock.assert_async().await;
            assert!(items.is_empty());
        }
    }

    #[tokio::test]
    async fn suggest_week_posts_limit_in_body() {
        let mut server = Server::new_async().await;
        let body = json!({
            "items": [{
                "task": wire_task("1", "Custom Limit Task", "backlog"),
                "score": 0.85,
                "factors": {"priority": 0.8},
                "why": "Custom limit test"
            }]
        });
        let mock = server
            .mock("POST", "/api/v1/recommendations/suggest-week")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({"limit": 3})))
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;

        let items = client_for(&server).suggest_week(3).await.unwrap();
        mock.assert_async().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task.title, "Custom Limit Task");
    }

    #[tokio::test]
    async fn update_status_patches_task() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/v1/tasks/T1")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({"status": "done"})))
            .with_status(200)
            .with_body(wire_task("T1", "Ship it", "done").to_string())
            .create_async()
            .await;

        let task = client_for(&server)
            .update_task_status("T1", TaskStatus::Done)
            .await
            .unwrap()
            .unwrap();
        mock.assert_async().await;
        assert_eq!(task.status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn update_status_accepts_empty_success() {
        let mut server = Server::new_async().await;
        let no_content = server
            .mock("PATCH", "/api/v1/tasks/T1")
            .match_query(Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let task = client.update_task_status("T1", TaskStatus::Done).await.unwrap();
        no_content.assert_async().await;
        assert!(task.is_none());

        no_content.remove_async().await;
        let _ack = server
            .mock("PATCH", "/api/v1/tasks/T1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;
        let task = client.update_task_status("T1", TaskStatus::Done).await.unwrap();
        assert!(task.is_none());
    }

    #[tokio::test]
    async fn promote_week_sends_ids() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/tasks/promote-week")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({"task_ids": ["a", "b"]})))
            .with_status(200)
            .with_body(r#"{"moved": 2}"#)
            .create_async()
            .await;

        let moved = client_for(&server)
            .promote_tasks_to_week(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(moved, 2);
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z ]{0,12}".prop_map(Value::String),
        ]
    }

    fn body_without_items_array() -> impl Strategy<Value = Value> {
        prop_oneof![
            leaf(),
            prop::collection::vec(leaf(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-h]{1,6}", leaf(), 0..4).prop_map(|m| {
                Value::Object(m.into_iter().collect())
            }),
            leaf().prop_map(|items| json!({ "items": items })),
        ]
    }

    proptest! {
        #[test]
        fn bodies_without_items_array_normalize_to_empty(body in body_without_items_array()) {
            prop_assert!(items_from_body(&body).is_empty());
        }
    }
}
