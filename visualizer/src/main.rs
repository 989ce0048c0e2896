use iced::{
    time,
    widget::{
        button, column, image, row, scrollable, slider, stack, text, Canvas, Column, Container,
    },
    Alignment, ContentFit, Element, Length, Subscription, Task, Theme,
};
use lookoutcore::export::{CSV_FILE_NAME, HEATMAP_FILE_NAME};
use lookoutcore::history::PlaybackSelection;
use lookoutcore::interface::Detection;
use lookoutcore::session::{ControlAction, DashboardModel, SessionStatus};
use overlay::{Legend, Overlay};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

mod overlay;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Dashboard::boot, Dashboard::update, Dashboard::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Dashboard) -> String {
    "Lookout Dashboard".into()
}

fn application_subscription(_: &Dashboard) -> Subscription<Message> {
    time::every(POLL_INTERVAL).map(|_| Message::Tick)
}

fn application_theme(state: &Dashboard) -> Theme {
    match &state.model {
        Some(model) if !model.dark_mode => Theme::Light,
        _ => Theme::Dark,
    }
}

#[derive(Debug)]
struct Dashboard {
    bridge: Bridge,
    model: Option<DashboardModel>,
    backdrop: Option<image::Handle>,
    fetching: bool,
    fetching_frame: bool,
    status: String,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    PayloadFetched(Result<DashboardModel, String>),
    FrameFetched(Result<Vec<u8>, String>),
    Control(ControlAction),
    ControlSent(Result<(), String>),
    Export(ExportKind),
    Exported(Result<PathBuf, String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportKind {
    Csv,
    Heatmap,
}

impl ExportKind {
    fn route(self) -> &'static str {
        match self {
            ExportKind::Csv => "export/csv",
            ExportKind::Heatmap => "export/heatmap",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            ExportKind::Csv => CSV_FILE_NAME,
            ExportKind::Heatmap => HEATMAP_FILE_NAME,
        }
    }
}

impl Dashboard {
    fn boot() -> (Self, Task<Message>) {
        let bridge = Bridge::from_env();
        let state = Dashboard {
            bridge: bridge.clone(),
            model: None,
            backdrop: None,
            fetching: true,
            fetching_frame: false,
            status: format!("Connecting to {}...", bridge.base),
        };
        (
            state,
            Task::perform(bridge.fetch_payload(), Message::PayloadFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                let mut tasks = Vec::new();
                if !state.fetching {
                    state.fetching = true;
                    tasks.push(Task::perform(
                        state.bridge.clone().fetch_payload(),
                        Message::PayloadFetched,
                    ));
                }
                if !state.fetching_frame && state.model.is_some() {
                    state.fetching_frame = true;
                    tasks.push(Task::perform(
                        state.bridge.clone().fetch_frame(),
                        Message::FrameFetched,
                    ));
                }
                Task::batch(tasks)
            }
            Message::PayloadFetched(Ok(model)) => {
                state.fetching = false;
                if state.model.is_none() {
                    state.status = "Connected".into();
                }
                state.model = Some(model);
                Task::none()
            }
            Message::PayloadFetched(Err(err)) => {
                state.fetching = false;
                state.status = format!("Bridge unreachable: {err}");
                Task::none()
            }
            Message::FrameFetched(Ok(bytes)) => {
                state.fetching_frame = false;
                state.backdrop = Some(image::Handle::from_bytes(bytes));
                Task::none()
            }
            Message::FrameFetched(Err(err)) => {
                state.fetching_frame = false;
                log::debug!("no camera frame: {err}");
                state.backdrop = None;
                Task::none()
            }
            Message::Control(action) => Task::perform(
                state.bridge.clone().post_control(action),
                Message::ControlSent,
            ),
            Message::ControlSent(Ok(())) => Task::none(),
            Message::ControlSent(Err(err)) => {
                state.status = format!("Control rejected: {err}");
                Task::none()
            }
            Message::Export(kind) => {
                state.status = format!("Downloading {}...", kind.file_name());
                Task::perform(state.bridge.clone().download(kind), Message::Exported)
            }
            Message::Exported(Ok(path)) => {
                state.status = format!("Saved {}", path.display());
                Task::none()
            }
            Message::Exported(Err(err)) => {
                state.status = format!("Export failed: {err}");
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let Some(model) = &state.model else {
            return Container::new(text(&state.status).size(20))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into();
        };

        let header = row![
            text("Lookout").size(26),
            text(status_badge(model)).size(18),
            toggle_button("Privacy", model.privacy_mode, |enabled| {
                ControlAction::SetPrivacy { enabled }
            }),
            toggle_button("Heatmap", model.show_heatmap, |enabled| {
                ControlAction::SetHeatmap { enabled }
            }),
            toggle_button("Dark mode", model.dark_mode, |enabled| {
                ControlAction::SetDarkMode { enabled }
            }),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        let overlay = Canvas::new(Overlay::new(&model.surface, state.backdrop.is_some()))
            .width(Length::Fill)
            .height(Length::Fill);
        let stage: Element<'_, Message> = match &state.backdrop {
            Some(handle) => stack![
                image(handle.clone())
                    .content_fit(ContentFit::Contain)
                    .width(Length::Fill)
                    .height(Length::Fill),
                overlay,
            ]
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            None => overlay.into(),
        };

        let timeline = match slider_position(model) {
            Some((last, value)) => row![
                text("Timeline").size(14),
                slider(0..=last, value, |index| {
                    Message::Control(ControlAction::Scrub {
                        index: index as usize,
                    })
                })
                .width(Length::Fill),
                text(format!("{}/{}", value + 1, last + 1)).size(14),
            ],
            None => row![text("Timeline: no history yet").size(14)],
        }
        .spacing(10)
        .align_y(Alignment::Center);

        let live_button = button("Live").on_press_maybe(
            (!model.playback.is_live()).then_some(Message::Control(ControlAction::ResumeLive)),
        );
        let exports = row![
            live_button,
            button("Export CSV")
                .on_press_maybe((model.history_len > 0).then_some(Message::Export(ExportKind::Csv))),
            button("Export heatmap").on_press_maybe(
                model
                    .show_heatmap
                    .then_some(Message::Export(ExportKind::Heatmap))
            ),
            text(&state.status).size(14),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let counts = if model.counts.is_empty() {
            Column::new().push(text("Nothing detected").size(14))
        } else {
            model
                .counts
                .iter()
                .fold(Column::new().spacing(4), |col, (class, count)| {
                    col.push(text(format!("{class}: {count}")).size(14))
                })
        };

        let recent = if model.recent.is_empty() {
            Column::new().push(text("No detections recorded").size(12))
        } else {
            model
                .recent
                .iter()
                .fold(Column::new().spacing(4), |col, detection| {
                    col.push(text(recent_entry(detection)).size(12))
                })
        };

        let legend = column![
            text("Heatmap density").size(14),
            Canvas::new(Legend)
                .width(Length::Fill)
                .height(Length::Fixed(14.0)),
            row![text("low").size(12), text("high").size(12)].spacing(180),
        ]
        .spacing(4);

        let side = column![
            text("Current objects").size(18),
            Container::new(counts).padding(6),
            text(format!("History ({} entries)", model.history_len)).size(18),
            Container::new(scrollable(recent).height(Length::Fill)).padding(6),
            legend,
            text(format!(
                "ticks {} | errors {} | skipped {}",
                model.metrics.ticks,
                model.metrics.detector_errors,
                model.metrics.skipped_not_ready + model.metrics.skipped_paused
            ))
            .size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(320.0));

        let main = column![header, stage, timeline, exports]
            .spacing(12)
            .padding(16)
            .width(Length::Fill);

        Container::new(row![main, side].spacing(12).padding(12))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

fn toggle_button(
    label: &str,
    enabled: bool,
    action: impl Fn(bool) -> ControlAction,
) -> button::Button<'static, Message> {
    let caption = format!("{label}: {}", if enabled { "on" } else { "off" });
    button(text(caption)).on_press(Message::Control(action(!enabled)))
}

fn status_badge(model: &DashboardModel) -> String {
    match &model.status {
        SessionStatus::Loading => "Loading model...".into(),
        SessionStatus::Failed(reason) => format!("Model failed: {reason}"),
        SessionStatus::Stopped => "Stopped".into(),
        SessionStatus::Ready => match model.playback {
            PlaybackSelection::Live => "Live".into(),
            PlaybackSelection::Paused(index) => {
                format!("Playback #{} of {}", index + 1, model.history_len)
            }
        },
    }
}

/// `(last index, current index)` for the timeline, or `None` without history.
fn slider_position(model: &DashboardModel) -> Option<(u32, u32)> {
    let last = u32::try_from(model.history_len.checked_sub(1)?).ok()?;
    let value = match model.playback {
        PlaybackSelection::Live => last,
        PlaybackSelection::Paused(index) => u32::try_from(index).map_or(last, |i| i.min(last)),
    };
    Some((last, value))
}

fn recent_entry(detection: &Detection) -> String {
    let bbox = detection.bbox;
    format!(
        "{} {} {:.2} [{:.0}, {:.0}, {:.0}, {:.0}]",
        detection.timestamp_label(),
        detection.class,
        detection.score,
        bbox.x,
        bbox.y,
        bbox.width,
        bbox.height
    )
}

#[derive(Debug, Deserialize)]
struct BridgeReply {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
struct Bridge {
    base: String,
    http: reqwest::Client,
}

impl Bridge {
    fn from_env() -> Self {
        let base = std::env::var("LOOKOUT_BRIDGE_URL")
            .unwrap_or_else(|_| DEFAULT_BRIDGE_URL.to_string());
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base, route)
    }

    async fn fetch_payload(self) -> Result<DashboardModel, String> {
        let response = self
            .http
            .get(self.url("payload"))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        check(response)
            .await?
            .json::<DashboardModel>()
            .await
            .map_err(|e| e.to_string())
    }

    async fn fetch_frame(self) -> Result<Vec<u8>, String> {
        let response = self
            .http
            .get(self.url("frame"))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        check(response)
            .await?
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| e.to_string())
    }

    async fn post_control(self, action: ControlAction) -> Result<(), String> {
        let response = self
            .http
            .post(self.url("control"))
            .json(&action)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        check(response).await.map(|_| ())
    }

    async fn download(self, kind: ExportKind) -> Result<PathBuf, String> {
        let response = self
            .http
            .get(self.url(kind.route()))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let bytes = check(response)
            .await?
            .bytes()
            .await
            .map_err(|e| e.to_string())?;
        let path = PathBuf::from(kind.file_name());
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        log::info!("saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, String> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<BridgeReply>(&body)
        .ok()
        .and_then(|reply| reply.error)
        .unwrap_or(body);
    Err(format!("{}: {}", status, reason))
}
