use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Rect, vec2};
use radar_layout::dashboard::{Dashboard, Peak, load_dashboard};
use radar_layout::session::GraphSession;
use radar_layout::simulation::{GraphData, QuadtreeCell};
use radar_layout::timeline::{TimelineCluster, TimelineLayout};
use radar_layout::treemap::{TreemapEngine, TreemapLayout};
use tracing::warn;

use crate::Settings;

mod graph;
mod render_utils;
mod timeline;
mod treemap;
mod ui;

pub struct RadarApp {
    input: PathBuf,
    settings: Settings,
    state: AppState,
    reload_rx: Option<Receiver<Result<Dashboard, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dashboard, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
    Graph,
    Treemap,
    Timeline,
}

struct ViewModel {
    settings: Settings,
    tab: Tab,
    graph: Option<GraphView>,
    peaks: PeakView,
    timeline: Option<TimelineView>,
}

struct GraphView {
    data: GraphData,
    session: GraphSession,
    live_physics: bool,
    show_quadtree_overlay: bool,
    show_labels: bool,
    search: String,
    search_miss: bool,
    hovered: Option<usize>,
    canvas: Option<Rect>,
    quadtree_cells: Vec<QuadtreeCell>,
}

struct PeakView {
    peaks: Vec<Peak>,
    selected: usize,
    engine: TreemapEngine,
    layout: Option<CachedTreemap>,
    selected_leaf: Option<String>,
}

struct CachedTreemap {
    peak: usize,
    size: egui::Vec2,
    layout: TreemapLayout,
}

struct TimelineView {
    beginning: f64,
    ending: f64,
    clusters: Vec<TimelineCluster>,
    layout: Option<(f32, TimelineLayout)>,
    selected: Option<String>,
}

impl ViewModel {
    fn new(dashboard: Dashboard, settings: Settings) -> Self {
        let graph = dashboard.graph.map(|data| {
            let center = vec2(settings.width / 2.0, settings.height / 2.0);
            let session = GraphSession::new(
                &data,
                settings.simulation,
                settings.interaction,
                center,
            );
            GraphView {
                data,
                session,
                live_physics: true,
                show_quadtree_overlay: false,
                show_labels: true,
                search: String::new(),
                search_miss: false,
                hovered: None,
                canvas: None,
                quadtree_cells: Vec::new(),
            }
        });

        let timeline = dashboard.timeline.map(|data| TimelineView {
            beginning: data.beginning,
            ending: data.ending,
            clusters: data.clusters(),
            layout: None,
            selected: None,
        });

        let tab = if graph.is_some() {
            Tab::Graph
        } else if !dashboard.peaks.is_empty() {
            Tab::Treemap
        } else {
            Tab::Timeline
        };

        Self {
            tab,
            graph,
            peaks: PeakView {
                peaks: dashboard.peaks,
                selected: 0,
                engine: TreemapEngine::new(settings.treemap),
                layout: None,
                selected_leaf: None,
            },
            timeline,
            settings,
        }
    }

    fn absorb(&mut self, dashboard: Dashboard) {
        let previous_graph = self.graph.take();
        let engine = std::mem::take(&mut self.peaks.engine);
        let tab = self.tab;
        let settings = self.settings;
        *self = Self::new(dashboard, settings);
        self.tab = tab;
        self.peaks.engine = engine;

        if let (Some(mut previous), Some(next)) = (previous_graph, self.graph.take()) {
            previous.session.replace_graph(&next.data);
            previous.data = next.data;
            previous.hovered = None;
            self.graph = Some(previous);
        }
    }
}

impl RadarApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, input: PathBuf, settings: Settings) -> Self {
        let state = Self::start_load(input.clone());
        Self {
            input,
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(input: PathBuf) -> Receiver<Result<Dashboard, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dashboard(&input).map_err(|error| format!("{error:#}"));
            if tx.send(result).is_err() {
                warn!("dashboard loaded after the viewer went away");
            }
        });

        rx
    }

    fn start_load(input: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(input),
        }
    }
}

impl eframe::App for RadarApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(dashboard) => {
                                AppState::Ready(Box::new(ViewModel::new(dashboard, self.settings)))
                            }
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading dashboard...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load dashboard");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.input.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.input, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.input.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(dashboard)) => model.absorb(dashboard),
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(AppState::Error("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
