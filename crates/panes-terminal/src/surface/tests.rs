use std::sync::{Arc, Mutex};

use panes_config::schema::ThemeMode;
use panes_config::TerminalTheme;

use super::*;

/// Records every backend call as a readable string.
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn backend(&self) -> Box<dyn RenderBackend> {
        Box::new(RecordingBackend(self.clone()))
    }
}

struct RecordingBackend(Recorder);

impl RenderBackend for RecordingBackend {
    fn attach(&mut self, theme: &TerminalTheme, size: TermSize) {
        self.0 .0.lock().unwrap().push(format!(
            "attach {} {}x{}",
            theme.background, size.cols, size.rows
        ));
    }

    fn write(&mut self, text: &str) {
        self.0 .0.lock().unwrap().push(format!("write {text:?}"));
    }

    fn fit(&mut self, size: TermSize) {
        self.0 .0.lock().unwrap().push(format!("fit {}x{}", size.cols, size.rows));
    }

    fn restyle(&mut self, theme: &TerminalTheme) {
        self.0 .0.lock().unwrap().push(format!("restyle {}", theme.background));
    }

    fn dispose(&mut self) {
        self.0 .0.lock().unwrap().push("dispose".into());
    }
}

fn surface_with(recorder: &Recorder) -> TerminalSurface {
    TerminalSurface::new(SurfaceOptions::default(), recorder.backend())
}

#[test]
fn construction_reads_theme_once() {
    let recorder = Recorder::default();
    let options = SurfaceOptions {
        theme: TerminalTheme::for_mode(ThemeMode::Light),
        ..Default::default()
    };
    let surface = TerminalSurface::new(options, recorder.backend());

    assert_eq!(recorder.calls(), vec!["attach #ffffff 80x24"]);
    assert_eq!(surface.theme().mode, ThemeMode::Light);
}

#[test]
fn writes_render_in_order() {
    let recorder = Recorder::default();
    let surface = surface_with(&recorder);

    surface.write("foo");
    surface.write("bar");

    assert_eq!(surface.contents(), "foobar");
    assert_eq!(
        &recorder.calls()[1..],
        &["write \"foo\"".to_string(), "write \"bar\"".to_string()]
    );
}

#[test]
fn write_line_appends_crlf() {
    let surface = TerminalSurface::new(SurfaceOptions::default(), Box::new(NullBackend));
    surface.write_line("> hello");
    assert_eq!(surface.contents(), "> hello\n");
    assert_eq!(surface.scrollback_len(), 1);
}

#[test]
fn input_handlers_run_in_order() {
    let surface = TerminalSurface::new(SurfaceOptions::default(), Box::new(NullBackend));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let first = seen.clone();
    surface.on_input(move |data| first.lock().unwrap().push(format!("a:{data}")));
    let second = seen.clone();
    surface.on_input(move |data| second.lock().unwrap().push(format!("b:{data}")));

    surface.input("l");
    surface.input("s");

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["a:l", "b:l", "a:s", "b:s"]
    );
}

#[test]
fn input_handler_may_write_back_to_surface() {
    let surface = TerminalSurface::new(SurfaceOptions::default(), Box::new(NullBackend));
    let echo = surface.clone();
    surface.on_input(move |data| echo.write(data));

    surface.input("x");
    surface.input("y");

    assert_eq!(surface.contents(), "xy");
}

#[test]
fn dispose_is_idempotent() {
    let recorder = Recorder::default();
    let surface = surface_with(&recorder);

    assert!(surface.dispose());
    assert!(!surface.dispose());

    let disposals = recorder.calls().iter().filter(|c| *c == "dispose").count();
    assert_eq!(disposals, 1);
    assert!(surface.is_disposed());
}

#[test]
fn writes_and_input_after_dispose_are_dropped() {
    let recorder = Recorder::default();
    let surface = surface_with(&recorder);
    let fired = Arc::new(Mutex::new(0));
    let counter = fired.clone();
    surface.on_input(move |_| *counter.lock().unwrap() += 1);

    surface.write("before");
    surface.dispose();
    surface.write("after");
    surface.input("k");

    assert_eq!(surface.contents(), "before");
    assert_eq!(*fired.lock().unwrap(), 0);
    assert!(!recorder.calls().iter().any(|c| c.contains("after")));
}

#[test]
fn refit_keeps_scrollback() {
    let recorder = Recorder::default();
    let surface = surface_with(&recorder);
    surface.write("line one\r\nline two\r\n");

    assert!(surface.fit(TermSize::new(120, 40)));
    assert!(!surface.fit(TermSize::new(120, 40)));

    assert_eq!(surface.size(), TermSize::new(120, 40));
    assert_eq!(surface.scrollback_len(), 2);
    assert_eq!(surface.contents(), "line one\nline two\n");
    let fits = recorder.calls().iter().filter(|c| c.starts_with("fit")).count();
    assert_eq!(fits, 1);
}

#[test]
fn container_observation_refits_only_on_change() {
    let options = SurfaceOptions {
        metrics: CellMetrics {
            cell_width: 10.0,
            cell_height: 20.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let surface = TerminalSurface::new(options, Box::new(NullBackend));

    assert!(surface.observe_container(ContainerSize {
        width: 1000.0,
        height: 400.0
    }));
    assert_eq!(surface.size(), TermSize::new(100, 20));

    // A few pixels more does not change the grid.
    assert!(!surface.observe_container(ContainerSize {
        width: 1005.0,
        height: 405.0
    }));
}

#[test]
fn restyle_is_explicit() {
    let recorder = Recorder::default();
    let surface = surface_with(&recorder);

    surface.restyle(TerminalTheme::for_mode(ThemeMode::Light));
    surface.restyle(TerminalTheme::for_mode(ThemeMode::Light));

    let restyles: Vec<_> = recorder
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("restyle"))
        .collect();
    assert_eq!(restyles, vec!["restyle #ffffff"]);
    assert_eq!(surface.theme().mode, ThemeMode::Light);
}

#[test]
fn clones_share_one_surface() {
    let a = TerminalSurface::new(SurfaceOptions::default(), Box::new(NullBackend));
    let b = a.clone();
    let c = TerminalSurface::new(SurfaceOptions::default(), Box::new(NullBackend));

    b.write("shared");
    assert_eq!(a.contents(), "shared");
    assert!(a.same_as(&b));
    assert!(!a.same_as(&c));
}
