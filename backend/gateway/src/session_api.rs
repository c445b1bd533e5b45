//! Session, form and chat endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use tripforge_agent::{ChatAction, ChatCommand};
use tripforge_core::FormStatus;

use crate::api_error::ApiError;
use crate::server::GatewayState;

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub action: Option<ChatAction>,
}

/// Form status as clients see it, with a progress counter.
pub fn form_status_json(status: &FormStatus) -> Value {
    json!({
        "filled_fields": status.filled_fields,
        "missing_fields": status.missing_fields,
        "is_complete": status.is_complete,
        "is_locked": status.is_locked,
        "progress": {
            "filled": status.filled_count,
            "required": status.required_count,
        },
    })
}

/// Handler for `POST /api/session`
pub async fn create_session(State(state): State<GatewayState>) -> Json<Value> {
    let (session_id, message) = state.controller.create_session().await;
    Json(json!({ "session_id": session_id, "message": message }))
}

/// Handler for `GET /api/form/:session_id`
pub async fn get_form(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> ApiResult {
    let status = state.controller.form_status(&session_id).await?;
    Ok(Json(form_status_json(&status)))
}

/// Handler for `POST /api/form/:session_id`. Validates, merges and locks.
pub async fn submit_form(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    let status = state.controller.submit_form(&session_id, &body).await?;
    Ok(Json(json!({
        "success": true,
        "form_locked": status.is_locked,
        "form_status": form_status_json(&status),
    })))
}

/// Handler for `PUT /api/form/:session_id`. Merges without locking.
///
/// Accepts the fields either at the top level or under `field_updates`.
pub async fn update_form(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult {
    let fields = match body.get("field_updates") {
        Some(inner) if inner.is_object() => inner,
        _ => &body,
    };
    let status = state.controller.update_form(&session_id, fields).await?;
    Ok(Json(json!({
        "success": true,
        "form_status": form_status_json(&status),
    })))
}

/// Handler for `POST /api/chat`
pub async fn chat(State(state): State<GatewayState>, Json(request): Json<ChatRequest>) -> ApiResult {
    debug!(session_id = %request.session_id, action = ?request.action, "Chat request");
    let command = ChatCommand::resolve(request.action, request.message);
    let outcome = state.controller.chat(&request.session_id, command).await?;

    let mut body = json!({
        "message": outcome.reply,
        "state": outcome.state,
        "form_status": form_status_json(&outcome.form_status),
    });
    if let Some(itinerary) = outcome.itinerary {
        body["itinerary"] = json!(itinerary);
    }
    Ok(Json(body))
}

/// Handler for `GET /api/messages/:session_id`
pub async fn get_messages(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> ApiResult {
    let messages = state.controller.messages(&session_id).await?;
    Ok(Json(json!({ "messages": messages })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::test_support::{complete_form, plan, state};

    async fn new_session(state: &GatewayState) -> String {
        let Json(body) = create_session(State(state.clone())).await;
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_session_and_empty_form() {
        let (state, _) = state();
        let id = new_session(&state).await;

        let Json(form) = get_form(State(state), Path(id)).await.unwrap();
        assert_eq!(form["is_locked"], false);
        assert_eq!(form["is_complete"], false);
        assert_eq!(form["progress"]["filled"], 0);
        assert_eq!(form["progress"]["required"], 18);
        assert_eq!(form["missing_fields"].as_array().unwrap().len(), 18);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (state, _) = state();
        let err = get_form(State(state.clone()), Path("nope".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let request = ChatRequest {
            session_id: "nope".into(),
            message: "hello".into(),
            action: None,
        };
        let err = chat(State(state), Json(request)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submit_form_locks_then_conflicts() {
        let (state, _) = state();
        let id = new_session(&state).await;

        let Json(body) = submit_form(State(state.clone()), Path(id.clone()), Json(complete_form()))
            .await
            .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["form_locked"], true);
        assert_eq!(body["form_status"]["is_complete"], true);

        let err = submit_form(State(state.clone()), Path(id.clone()), Json(complete_form()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = update_form(State(state), Path(id), Json(json!({"budget": "luxury"})))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_submit_incomplete_form_is_422() {
        let (state, _) = state();
        let id = new_session(&state).await;

        let mut form = complete_form();
        form["traveler_count"] = json!(0);
        form.as_object_mut().unwrap().remove("budget");

        let err = submit_form(State(state.clone()), Path(id.clone()), Json(form))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = err.body();
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"traveler_count"));
        assert!(fields.contains(&"budget"));

        let Json(status) = get_form(State(state), Path(id)).await.unwrap();
        assert_eq!(status["is_locked"], false);
        assert_eq!(status["progress"]["filled"], 0);
    }

    #[tokio::test]
    async fn test_update_form_accepts_wrapped_fields() {
        let (state, _) = state();
        let id = new_session(&state).await;

        let body = json!({"session_id": id, "field_updates": {"destinations": ["Goa"], "budget": "luxury"}});
        let Json(body) = update_form(State(state.clone()), Path(id.clone()), Json(body))
            .await
            .unwrap();
        assert_eq!(body["form_status"]["progress"]["filled"], 2);
        assert_eq!(body["form_status"]["is_locked"], false);

        let Json(body) = update_form(State(state), Path(id), Json(json!({"traveler_count": 3})))
            .await
            .unwrap();
        assert_eq!(body["form_status"]["filled_fields"]["traveler_count"], 3);
    }

    #[tokio::test]
    async fn test_chat_generate_returns_itinerary() {
        let (state, provider) = state();
        let id = new_session(&state).await;
        submit_form(State(state.clone()), Path(id.clone()), Json(complete_form()))
            .await
            .unwrap();

        provider.push_text(plan());
        let request = ChatRequest {
            session_id: id.clone(),
            message: "Generate Itinerary ".into(),
            action: None,
        };
        let Json(body) = chat(State(state.clone()), Json(request)).await.unwrap();
        assert_eq!(body["state"], "has_itinerary");
        assert_eq!(body["itinerary"]["version"], 1);
        assert_eq!(body["itinerary"]["days"].as_array().unwrap().len(), 2);
        assert_eq!(body["itinerary"]["days"][1]["date"], "2025-06-02");

        let Json(messages) = get_messages(State(state), Path(id)).await.unwrap();
        let messages = messages["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[tokio::test]
    async fn test_chat_generation_failure_is_502() {
        let (state, provider) = state();
        let id = new_session(&state).await;
        submit_form(State(state.clone()), Path(id.clone()), Json(complete_form()))
            .await
            .unwrap();

        provider.push_text("this is not json");
        let request = ChatRequest {
            session_id: id.clone(),
            message: String::new(),
            action: Some(ChatAction::Generate),
        };
        let err = chat(State(state.clone()), Json(request)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.body()["error"], crate::api_error::GENERATION_FAILED_MESSAGE);

        let Json(messages) = get_messages(State(state), Path(id)).await.unwrap();
        assert!(messages["messages"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_chat_request_action_is_optional() {
        let request: ChatRequest =
            serde_json::from_value(json!({"session_id": "s", "message": "hi"})).unwrap();
        assert_eq!(request.action, None);

        let request: ChatRequest = serde_json::from_value(
            json!({"session_id": "s", "message": "is it rainy?", "action": "ask"}),
        )
        .unwrap();
        assert_eq!(request.action, Some(ChatAction::Ask));
    }
}
