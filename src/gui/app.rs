use std::sync::Arc;
use std::time::Duration;

use iced::widget::{self, button, column, container, row, text};
use iced::{Element, Length, Size, Subscription, Task};
use image::DynamicImage;
use tracing::debug;

use super::Message;
use super::widgets::{self, ButtonKind};
use crate::config::AppConfig;
use crate::pipeline::PipelineContext;
use crate::presentation::{PresentationController, scale_to_width};
use crate::speech::{RequestOutcome, SpeechDispatcher};

const WINDOW_SIZE: Size = Size {
    width: 1200.0,
    height: 800.0,
};

pub struct AqroadApp {
    controller: PresentationController,
    title: String,
    tick_interval: Duration,
    display_size: (u32, u32),
    frame: Option<widget::image::Handle>,
    shown_revision: u64,
}

impl AqroadApp {
    pub fn new(
        config: &AppConfig,
        context: Arc<PipelineContext>,
        speech: Arc<SpeechDispatcher>,
        video_size: (u32, u32),
    ) -> Self {
        Self {
            controller: PresentationController::new(context, speech),
            title: config.window_title.clone(),
            tick_interval: config.tick_interval,
            display_size: (
                config.display_width,
                config.display_height(video_size.0, video_size.1),
            ),
            frame: None,
            shown_revision: 0,
        }
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if self.controller.tick() {
                    self.refresh_frame();
                }
            }
            Message::ToggleCapture => self.controller.toggle_capture(),
            Message::SpeakCurrent => {
                if let Some(RequestOutcome::Dropped) = self.controller.speak_current() {
                    debug!("Read-aloud request dropped");
                }
            }
        }
        Task::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(self.tick_interval).map(|_| Message::Tick)
    }

    /// Rebuild the canvas image only when the controller shows a new frame.
    fn refresh_frame(&mut self) {
        let view = self.controller.view();
        if view.frame_revision == self.shown_revision {
            return;
        }
        self.shown_revision = view.frame_revision;

        if let Some(frame) = &view.frame {
            let scaled = scale_to_width(frame, self.display_size.0);
            let (width, height) = scaled.dimensions();
            let rgba = DynamicImage::ImageRgb8(scaled).to_rgba8().into_raw();
            self.frame = Some(widget::image::Handle::from_rgba(width, height, rgba));
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let view = self.controller.view();
        let (canvas_width, canvas_height) = self.display_size;

        let canvas: Element<'_, Message> = match &self.frame {
            Some(handle) => widget::image(handle.clone())
                .width(Length::Fixed(canvas_width as f32))
                .height(Length::Fixed(canvas_height as f32))
                .into(),
            None => text("").into(),
        };

        let left = column![
            container(canvas)
                .width(Length::Fixed(canvas_width as f32))
                .height(Length::Fixed(canvas_height as f32))
                .style(widgets::canvas_style),
            text("AQROAD: AI Road Sign Detector").size(24),
        ]
        .spacing(20);

        let capture_kind = if view.frozen { ButtonKind::Resume } else { ButtonKind::Capture };
        let buttons = column![
            button(text(view.capture_caption()).size(11))
                .padding([12, 20])
                .style(capture_kind.style())
                .on_press(Message::ToggleCapture),
            button(text("Read Sign Info").size(11))
                .padding([12, 20])
                .style(ButtonKind::Speak.style())
                .on_press_maybe(view.speak_enabled.then_some(Message::SpeakCurrent)),
        ]
        .spacing(15);

        let right = column![
            widgets::header("DETECTED SIGN"),
            widgets::value(&view.labels.name),
            widgets::header("DESCRIPTION"),
            widgets::value(&view.labels.description),
            widgets::header("CONFIDENCE"),
            widgets::value(&view.labels.confidence),
            container(buttons).padding([30, 0]),
        ]
        .spacing(10);

        container(row![left, right].spacing(30))
            .padding(30)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(widgets::panel_style)
            .into()
    }
}

/// Open the window and block until it is closed.
pub fn run(
    config: AppConfig,
    context: Arc<PipelineContext>,
    speech: Arc<SpeechDispatcher>,
    video_size: (u32, u32),
) -> iced::Result {
    iced::application(
        move || AqroadApp::new(&config, context.clone(), speech.clone(), video_size),
        AqroadApp::update,
        AqroadApp::view,
    )
    .title(AqroadApp::title)
    .subscription(AqroadApp::subscription)
    .window_size(WINDOW_SIZE)
    .resizable(false)
    .run()
}
