use crate::gui_bridge::model::{status_for, BridgeReply};
use anyhow::Context;
use lookoutcore::export::{CSV_FILE_NAME, HEATMAP_FILE_NAME};
use lookoutcore::session::{ControlAction, SessionClient};
use lookoutcore::DashboardError;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const CONTROL_BODY_LIMIT: u64 = 4 * 1024;

/// HTTP front of a running session: the dashboard polls `/payload` and
/// `/frame`, posts UI actions to `/control` and downloads exports.
pub struct GuiBridge {
    client: SessionClient,
}

impl GuiBridge {
    pub fn new(client: SessionClient) -> Self {
        Self { client }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone + Send + Sync + 'static {
        let client = self.client.clone();
        let client_filter = warp::any().map(move || client.clone());

        let payload_route = warp::path("payload")
            .and(warp::path::end())
            .and(warp::get())
            .and(client_filter.clone())
            .and_then(payload_reply);

        let control_route = warp::path("control")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::content_length_limit(CONTROL_BODY_LIMIT))
            .and(warp::body::json())
            .and(client_filter.clone())
            .and_then(control_reply);

        let frame_route = warp::path("frame")
            .and(warp::path::end())
            .and(warp::get())
            .and(client_filter.clone())
            .and_then(frame_reply);

        let csv_route = warp::path!("export" / "csv")
            .and(warp::get())
            .and(client_filter.clone())
            .and_then(csv_reply);

        let heatmap_route = warp::path!("export" / "heatmap")
            .and(warp::get())
            .and(client_filter)
            .and_then(heatmap_reply);

        payload_route
            .or(control_route)
            .unify()
            .or(frame_route)
            .unify()
            .or(csv_route)
            .unify()
            .or(heatmap_route)
            .unify()
    }

    /// Binds the listener; the returned future serves until `shutdown` resolves.
    pub fn bind(
        &self,
        addr: SocketAddr,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<(SocketAddr, impl Future<Output = ()>)> {
        let routes = self.routes().with(warp::log("lookout::bridge"));
        warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, shutdown)
            .with_context(|| format!("binding HTTP bridge on {}", addr))
    }
}

async fn payload_reply(client: SessionClient) -> Result<Response, Infallible> {
    Ok(match client.snapshot().await {
        Ok(model) => warp::reply::json(&model).into_response(),
        Err(err) => rejected(err),
    })
}

async fn control_reply(action: ControlAction, client: SessionClient) -> Result<Response, Infallible> {
    log::debug!("control action {:?}", action);
    Ok(match client.control(action).await {
        Ok(()) => warp::reply::json(&BridgeReply::ok()).into_response(),
        Err(err) => rejected(err),
    })
}

async fn frame_reply(client: SessionClient) -> Result<Response, Infallible> {
    Ok(match client.frame_preview().await {
        Ok(bytes) => {
            let reply = warp::reply::with_header(bytes, "content-type", "image/png");
            warp::reply::with_header(reply, "cache-control", "no-store").into_response()
        }
        Err(err) => rejected(err),
    })
}

async fn csv_reply(client: SessionClient) -> Result<Response, Infallible> {
    Ok(match client.export_csv().await {
        Ok(bytes) => attachment(bytes, "text/csv", CSV_FILE_NAME),
        Err(err) => rejected(err),
    })
}

async fn heatmap_reply(client: SessionClient) -> Result<Response, Infallible> {
    Ok(match client.export_heatmap().await {
        Ok(bytes) => attachment(bytes, "image/png", HEATMAP_FILE_NAME),
        Err(err) => rejected(err),
    })
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, file_name: &str) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file_name);
    let reply = warp::reply::with_header(bytes, "content-type", content_type);
    warp::reply::with_header(reply, "content-disposition", disposition).into_response()
}

fn rejected(err: DashboardError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        log::warn!("bridge request failed: {}", err);
    }
    warp::reply::with_status(warp::reply::json(&BridgeReply::rejected(&err)), status)
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::WorkflowConfig;
    use crate::workflow::runner::Runner;
    use lookoutcore::render::DrawSurface;
    use lookoutcore::session::{DashboardModel, SessionHandle, SessionStatus};
    use std::time::Duration;
    use warp::http::StatusCode;

    async fn running_session() -> SessionHandle {
        let mut cfg = WorkflowConfig::from_args(5, 0.0, 160, 120, 4);
        cfg.generator.load_delay_ms = 0;
        cfg.generator.detect_delay_ms = 0;
        let handle = Runner::new(cfg).build_session().unwrap().spawn();
        assert_eq!(handle.client().wait_until_loaded().await, SessionStatus::Ready);
        handle
    }

    async fn wait_for_history(client: &SessionClient) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while client.snapshot().await.unwrap().history_len == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn payload_serves_the_dashboard_model() {
        let handle = running_session().await;
        let client = handle.client();
        wait_for_history(&client).await;
        let routes = GuiBridge::new(client).routes();

        let response = warp::test::request()
            .method("GET")
            .path("/payload")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let model: DashboardModel = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(model.status, SessionStatus::Ready);
        assert!(model.history_len > 0);
        assert_eq!(model.surface.width(), 160);

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn control_toggles_and_rejects() {
        let handle = running_session().await;
        let client = handle.client();
        wait_for_history(&client).await;
        let routes = GuiBridge::new(client.clone()).routes();

        let response = warp::test::request()
            .method("POST")
            .path("/control")
            .json(&ControlAction::SetPrivacy { enabled: true })
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(client.snapshot().await.unwrap().privacy_mode);

        let response = warp::test::request()
            .method("POST")
            .path("/control")
            .body(r#"{"action":"scrub","index":0}"#)
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!client.snapshot().await.unwrap().playback.is_live());

        let response = warp::test::request()
            .method("POST")
            .path("/control")
            .body(r#"{"action":"explode"}"#)
            .reply(&routes)
            .await;
        assert!(response.status().is_client_error());

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn frame_serves_the_latest_camera_image() {
        let handle = running_session().await;
        let client = handle.client();
        wait_for_history(&client).await;
        let routes = GuiBridge::new(client).routes();

        let response = warp::test::request()
            .path("/frame")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        let decoded = image::load_from_memory(response.body()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (160, 120));

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn exports_are_downloads() {
        let handle = running_session().await;
        let client = handle.client();
        wait_for_history(&client).await;
        let routes = GuiBridge::new(client).routes();

        let response = warp::test::request()
            .path("/export/csv")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/csv");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"detection_history.csv\""
        );
        assert!(response.body().starts_with(b"Timestamp,Class,Score,BBox\n"));

        let response = warp::test::request()
            .path("/export/heatmap")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = warp::test::request()
            .method("POST")
            .path("/control")
            .json(&ControlAction::SetHeatmap { enabled: true })
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .path("/export/heatmap")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        assert_eq!(&response.body()[1..4], b"PNG");

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stopped_session_is_unavailable() {
        let handle = running_session().await;
        let routes = GuiBridge::new(handle.client()).routes();
        handle.stop().await.unwrap();

        let response = warp::test::request()
            .path("/payload")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
