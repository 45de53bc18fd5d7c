// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline strip rendering with egui.
//!
//! Features:
//! - Time ruler with a draggable playhead
//! - One row per track with a clickable thumbnail column
//! - Bars and points that drag along their row
//! - Edge handles on the active bar for resizing
//! - Play/pause, capture and delete controls
//!
//! Pointer responses are turned into [`ViewAction`]s and applied after
//! painting, so the engine is never borrowed while the frame is built.

use crate::backend::AnimationBackend;
use crate::canvas::SceneCanvas;
use crate::config::Viewport;
use crate::engine::TimelineEngine;
use crate::gesture::ResizeEdge;
use crate::notice::Notice;
use crate::scene::SceneObjectId;
use crate::track::{TimelineTrack, VisualUnitProxy};
use crate::unit::{Endpoint, UnitId, UnitKind};
use egui::{Color32, Pos2, Rect, Sense, Stroke, Vec2};
use std::time::Instant;

const RULER_HEIGHT: f32 = 20.0;
const EDGE_HANDLE_WIDTH: f32 = 6.0;
const PLAYHEAD_WIDTH: f32 = 2.0;
const MIN_BAR_WIDTH: f32 = 2.0;

/// Something the user did on the timeline strip
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewAction {
    /// Click on a unit
    Activate(UnitId),
    /// Press on a unit body
    BeginDrag(UnitId, f32),
    /// Pointer moved during a drag
    DragTo(f32),
    /// Pointer released after a drag
    EndDrag,
    /// Press on an edge handle
    BeginResize(UnitId, ResizeEdge),
    /// Pointer moved during a resize
    ResizeTo(f32),
    /// Pointer released after a resize
    EndResize,
    /// Click on a track thumbnail
    SelectObject(SceneObjectId),
    /// Press on the ruler
    BeginScrub,
    /// Playhead moved to a track-relative x
    Scrub(f32),
    /// Ruler released
    EndScrub,
    /// Play/pause button
    TogglePlayback,
    /// Capture button for an endpoint of the active unit
    Capture(Endpoint),
    /// Delete button for the active unit
    Delete(UnitId),
}

/// Timeline strip widget
#[derive(Debug, Default)]
pub struct TimelineView {
    last_viewport: Option<Viewport>,
}

impl TimelineView {
    /// Create a new view
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the strip and apply what the user did
    ///
    /// Returns the notices the host should show as toasts.
    pub fn ui<B: AnimationBackend, C: SceneCanvas>(
        &mut self,
        ui: &mut egui::Ui,
        engine: &mut TimelineEngine<B, C>,
    ) -> Vec<Notice> {
        let mut notices = Vec::new();
        self.track_viewport(ui.ctx(), engine, &mut notices);

        let mut actions = Vec::new();
        self.render_toolbar(ui, engine, &mut actions);
        ui.separator();
        self.render_strip(ui, engine, &mut actions);

        for action in actions {
            notices.extend(Self::apply(engine, action));
        }
        if !engine.playback().is_paused() {
            ui.ctx().request_repaint();
        }
        notices
    }

    /// Apply one action to the engine
    pub fn apply<B: AnimationBackend, C: SceneCanvas>(
        engine: &mut TimelineEngine<B, C>,
        action: ViewAction,
    ) -> Option<Notice> {
        let failure = |result: crate::error::Result<()>| result.err().map(|e| Notice::error(e.to_string()));
        match action {
            ViewAction::Activate(unit_id) => failure(engine.activate_unit(unit_id)),
            ViewAction::BeginDrag(unit_id, x) => {
                failure(engine.activate_unit(unit_id).and_then(|()| engine.begin_drag(unit_id, x)))
            }
            ViewAction::DragTo(x) => failure(engine.drag_to(x)),
            ViewAction::EndDrag => Notice::from_change(&engine.end_drag(), Notice::UPDATED),
            ViewAction::BeginResize(unit_id, edge) => failure(engine.begin_resize(unit_id, edge)),
            ViewAction::ResizeTo(x) => failure(engine.resize_to(x)),
            ViewAction::EndResize => Notice::from_change(&engine.end_resize(), Notice::UPDATED),
            ViewAction::SelectObject(id) => failure(engine.select_object_from_track(id)),
            ViewAction::BeginScrub => {
                engine.begin_pointer_drag();
                None
            }
            ViewAction::Scrub(x) => {
                engine.scrub_pointer(x);
                None
            }
            ViewAction::EndScrub => {
                engine.end_pointer_drag();
                None
            }
            ViewAction::TogglePlayback => {
                engine.toggle_playback();
                None
            }
            ViewAction::Capture(endpoint) => {
                Some(Notice::from_result(&engine.recapture(endpoint), Notice::UPDATED))
            }
            ViewAction::Delete(unit_id) => {
                Some(Notice::from_result(&engine.delete_unit(unit_id), Notice::DELETED))
            }
        }
    }

    /// Feed window size changes through the engine's debouncer
    fn track_viewport<B: AnimationBackend, C: SceneCanvas>(
        &mut self,
        ctx: &egui::Context,
        engine: &mut TimelineEngine<B, C>,
        notices: &mut Vec<Notice>,
    ) {
        let screen = ctx.screen_rect();
        let viewport = Viewport::new(screen.width(), screen.height());
        let now = Instant::now();
        if self.last_viewport != Some(viewport) {
            self.last_viewport = Some(viewport);
            if viewport != engine.viewport() {
                engine.on_viewport_resize(viewport, now);
            }
        }
        match engine.poll_resize(now) {
            Ok(true) => ctx.request_repaint(),
            Ok(false) => {}
            Err(e) => notices.push(Notice::error(e.to_string())),
        }
    }

    fn render_toolbar<B: AnimationBackend, C: SceneCanvas>(
        &self,
        ui: &mut egui::Ui,
        engine: &TimelineEngine<B, C>,
        actions: &mut Vec<ViewAction>,
    ) {
        ui.horizontal(|ui| {
            let play_label = if engine.playback().is_paused() { "Play" } else { "Pause" };
            if ui.button(play_label).clicked() {
                actions.push(ViewAction::TogglePlayback);
            }

            ui.monospace(format!(
                "{:.2}s / {:.0}s",
                engine.playback().current_time(),
                engine.playback().total_duration()
            ));

            if let Some(unit) = engine.active_unit() {
                ui.separator();
                let capture_labels: &[(Endpoint, &str)] = match unit.kind() {
                    UnitKind::Interval => &[(Endpoint::Start, "Capture start"), (Endpoint::End, "Capture end")],
                    UnitKind::Point => &[(Endpoint::Start, "Capture")],
                };
                for (endpoint, label) in capture_labels {
                    if ui.button(*label).clicked() {
                        actions.push(ViewAction::Capture(*endpoint));
                    }
                }
                if ui.button("Delete").clicked() {
                    actions.push(ViewAction::Delete(unit.id()));
                }
            }
        });
    }

    fn render_strip<B: AnimationBackend, C: SceneCanvas>(
        &self,
        ui: &mut egui::Ui,
        engine: &TimelineEngine<B, C>,
        actions: &mut Vec<ViewAction>,
    ) {
        let timeline = engine.timeline();
        let layout = timeline.layout();
        let rows_height = layout.slot_y(timeline.track_count());
        let (rect, _) = ui.allocate_exact_size(
            Vec2::new(ui.available_width(), RULER_HEIGHT + rows_height),
            Sense::hover(),
        );
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, Color32::from_gray(30));

        let track_origin = rect.min.x + layout.track_start_x;
        let track_width = engine.time_scale().track_pixel_width();
        let rows_top = rect.min.y + RULER_HEIGHT;

        // Ruler
        let ruler = Rect::from_min_size(
            Pos2::new(track_origin, rect.min.y),
            Vec2::new(track_width, RULER_HEIGHT),
        );
        self.render_ruler(&painter, ruler, engine);
        let ruler_response = ui.interact(ruler, ui.id().with("timeline_ruler"), Sense::click_and_drag());
        if ruler_response.drag_started() {
            actions.push(ViewAction::BeginScrub);
        }
        if ruler_response.dragged() || ruler_response.clicked() {
            if let Some(pos) = ruler_response.interact_pointer_pos() {
                actions.push(ViewAction::Scrub(pos.x - track_origin));
            }
        }
        if ruler_response.drag_stopped() {
            actions.push(ViewAction::EndScrub);
        }

        // Rows
        let tracks: Vec<TimelineTrack> = timeline.tracks().cloned().collect();
        for track in &tracks {
            let row_y = rows_top + layout.slot_y(track.slot);
            let row = Rect::from_min_size(
                Pos2::new(track_origin, row_y),
                Vec2::new(track_width, layout.track_height),
            );
            let bg = if track.slot % 2 == 0 {
                Color32::from_gray(36)
            } else {
                Color32::from_gray(32)
            };
            painter.rect_filled(row, 0.0, bg);

            let thumb = Rect::from_min_size(
                Pos2::new(rect.min.x, row_y),
                Vec2::new(layout.track_start_x, layout.track_height),
            );
            painter.text(
                thumb.left_center() + Vec2::new(4.0, 0.0),
                egui::Align2::LEFT_CENTER,
                &track.label,
                egui::FontId::proportional(10.0),
                Color32::from_gray(200),
            );
            let thumb_response = ui.interact(
                thumb,
                ui.id().with(("track_thumb", track.scene_object_id.0)),
                Sense::click(),
            );
            if thumb_response.clicked() {
                actions.push(ViewAction::SelectObject(track.scene_object_id));
            }
        }

        // Units
        let proxies: Vec<VisualUnitProxy> = timeline.proxies().cloned().collect();
        let strip_x = |pos: Pos2| pos.x - rect.min.x;
        for proxy in &proxies {
            let body = Rect::from_min_size(
                Pos2::new(track_origin + proxy.x, rows_top + proxy.y),
                Vec2::new((proxy.width * proxy.scale_x).max(MIN_BAR_WIDTH), layout.track_height),
            );
            let fill = match (proxy.kind, proxy.active) {
                (UnitKind::Interval, false) => Color32::from_rgb(100, 150, 255),
                (UnitKind::Interval, true) => Color32::from_rgb(150, 190, 255),
                (UnitKind::Point, false) => Color32::from_rgb(255, 200, 100),
                (UnitKind::Point, true) => Color32::from_rgb(255, 225, 160),
            };
            painter.rect_filled(body.shrink2(Vec2::new(0.0, 3.0)), 2.0, fill);

            let id = ui.id().with(("timeline_unit", proxy.unit_id.0));
            let response = ui.interact(body, id, Sense::click_and_drag());
            if response.clicked() {
                actions.push(ViewAction::Activate(proxy.unit_id));
            }
            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    actions.push(ViewAction::BeginDrag(proxy.unit_id, strip_x(pos)));
                }
            }
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    actions.push(ViewAction::DragTo(strip_x(pos)));
                }
            }
            if response.drag_stopped() {
                actions.push(ViewAction::EndDrag);
            }

            if proxy.active && proxy.kind == UnitKind::Interval {
                self.render_edge_handles(ui, &painter, rect.min.x, body, proxy.unit_id, actions);
            }
        }

        // Playhead
        let playhead_x = track_origin + engine.pointer_x();
        painter.line_segment(
            [Pos2::new(playhead_x, rect.min.y), Pos2::new(playhead_x, rect.max.y)],
            Stroke::new(PLAYHEAD_WIDTH, Color32::from_rgb(255, 100, 100)),
        );
    }

    fn render_ruler<B: AnimationBackend, C: SceneCanvas>(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        engine: &TimelineEngine<B, C>,
    ) {
        painter.rect_filled(rect, 0.0, Color32::from_gray(40));
        let scale = engine.time_scale();
        let whole_seconds = scale.total_duration().floor() as u32;
        for second in 0..=whole_seconds {
            let x = rect.min.x + scale.x_from_time(second as f32);
            painter.line_segment(
                [Pos2::new(x, rect.max.y - 6.0), Pos2::new(x, rect.max.y)],
                Stroke::new(1.0, Color32::from_gray(150)),
            );
            painter.text(
                Pos2::new(x + 2.0, rect.min.y + 2.0),
                egui::Align2::LEFT_TOP,
                format!("{second}s"),
                egui::FontId::monospace(9.0),
                Color32::from_gray(180),
            );
        }
    }

    fn render_edge_handles(
        &self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        strip_left: f32,
        body: Rect,
        unit_id: UnitId,
        actions: &mut Vec<ViewAction>,
    ) {
        for (edge, x) in [(ResizeEdge::Left, body.min.x), (ResizeEdge::Right, body.max.x)] {
            let handle = Rect::from_center_size(
                Pos2::new(x, body.center().y),
                Vec2::new(EDGE_HANDLE_WIDTH, body.height()),
            );
            painter.rect_filled(handle, 1.0, Color32::WHITE);

            let id = ui.id().with(("timeline_edge", unit_id.0, edge == ResizeEdge::Left));
            let response = ui.interact(handle, id, Sense::drag());
            if response.drag_started() {
                actions.push(ViewAction::BeginResize(unit_id, edge));
            }
            if response.dragged() {
                if let Some(pos) = response.interact_pointer_pos() {
                    actions.push(ViewAction::ResizeTo(pos.x - strip_left));
                }
            }
            if response.drag_stopped() {
                actions.push(ViewAction::EndResize);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::canvas::MemoryCanvas;
    use crate::config::TimelineConfig;
    use crate::scene::ObjectGeometry;
    use crate::unit::AnimationUnit;

    type TestEngine = TimelineEngine<MemoryBackend, MemoryCanvas>;

    fn engine(debounce_ms: u64) -> TestEngine {
        let config = TimelineConfig {
            total_duration: 12.0,
            resize_debounce_ms: debounce_ms,
            ..Default::default()
        };
        TimelineEngine::new(config, Viewport::new(1110.0, 800.0), MemoryBackend::new(), MemoryCanvas::new())
    }

    fn run_frame(view: &mut TimelineView, engine: &mut TestEngine, size: Vec2) -> Vec<Notice> {
        let ctx = egui::Context::default();
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, size)),
            ..Default::default()
        };
        let mut notices = Vec::new();
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                notices = view.ui(ui, &mut *engine);
            });
        });
        notices
    }

    #[test]
    fn test_headless_frame() {
        let mut engine = engine(150);
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        engine.create_animation(a).unwrap();
        engine.create_point(a).unwrap();

        let mut view = TimelineView::new();
        let notices = run_frame(&mut view, &mut engine, Vec2::new(1110.0, 800.0));
        assert!(notices.is_empty());
        assert_eq!(engine.timeline().proxies().count(), 2);
    }

    #[test]
    fn test_window_size_goes_through_debouncer() {
        let mut engine = engine(0);
        let mut view = TimelineView::new();
        run_frame(&mut view, &mut engine, Vec2::new(1310.0, 900.0));
        assert_eq!(engine.viewport(), Viewport::new(1310.0, 900.0));
        assert_eq!(engine.time_scale().track_pixel_width(), 1200.0);
    }

    #[test]
    fn test_apply_drag_sequence() {
        let mut engine = engine(150);
        let a = engine.add_scene_object("A", ObjectGeometry::default());
        let unit_id = engine.create_animation(a).unwrap();
        let x0 = engine.config().track_start_x;

        assert_eq!(TimelineView::apply(&mut engine, ViewAction::BeginDrag(unit_id, x0)), None);
        assert_eq!(engine.active_unit().map(AnimationUnit::id), Some(unit_id));
        TimelineView::apply(&mut engine, ViewAction::DragTo(x0 + 500.0));
        let notice = TimelineView::apply(&mut engine, ViewAction::EndDrag);

        assert_eq!(notice, Some(Notice::success(Notice::UPDATED)));
        assert_eq!(engine.unit(unit_id).map(AnimationUnit::start), Some(6.0));
    }

    #[test]
    fn test_apply_reports_failures() {
        let mut engine = engine(150);
        let notice = TimelineView::apply(&mut engine, ViewAction::Capture(Endpoint::End));
        assert!(notice.is_some_and(|n| n.is_error()));

        let ghost = UnitId::new();
        let notice = TimelineView::apply(&mut engine, ViewAction::Delete(ghost));
        assert!(notice.is_some_and(|n| n.is_error()));
    }

    #[test]
    fn test_apply_scrub_holds_playhead() {
        let mut engine = engine(150);
        TimelineView::apply(&mut engine, ViewAction::BeginScrub);
        TimelineView::apply(&mut engine, ViewAction::Scrub(250.0));
        assert!(engine.playback().is_pointer_locked());
        assert_eq!(engine.playback().current_time(), 3.0);
        TimelineView::apply(&mut engine, ViewAction::EndScrub);
        assert!(!engine.playback().is_pointer_locked());
    }
}
