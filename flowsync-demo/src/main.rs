use std::fs::File;

use flowsync::headless::{MemoryFlow, Value, WidgetKind, WidgetTree};
use flowsync::{
    AttrValue, Attribute, AuxParams, EventFilter, FlowStateId, NativeEventKind, PropertyRef,
    RawKeyframe, Runtime, RuntimeConfig, TickOutcome, TimelineError, Toolkit, ToolkitError,
    UpdateTask,
};
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

const SCREEN: FlowStateId = FlowStateId(0);
const TICKS: u32 = 12;

/// Slide the panel in, then move it right while fading to half opacity.
/// Property bits: X=1, Y=2, OPACITY=16. Easing ids: 0 linear, 6 in-out cubic, 29 out-bounce.
const PANEL_KEYFRAMES: &str = r#"[
    { "start": 0.0, "end": 0.5, "enabled_properties": 3,
      "x": -200, "y": 40, "y_easing": 29 },
    { "start": 0.5, "end": 1.0, "enabled_properties": 17,
      "x": 120, "x_easing": 6, "opacity": 0.5 }
]"#;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Toolkit error: {0}")]
    Toolkit(#[from] ToolkitError),

    #[error("Invalid keyframe: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Failed to parse keyframes: {0}")]
    Keyframes(#[from] serde_json::Error),
}

fn main() {
    let log_file = File::create("flowsync-demo.log").expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
    }
}

fn run() -> Result<(), DemoError> {
    let mut tree = WidgetTree::new();
    let mut flow = MemoryFlow::new();
    let mut runtime = Runtime::new(RuntimeConfig::new("demo"));

    let root = tree.create(WidgetKind::Screen, None)?;
    let title = tree.create(WidgetKind::Label, Some(root))?;
    let volume = tree.create(WidgetKind::Slider, Some(root))?;
    let mute = tree.create(WidgetKind::Checkbox, Some(root))?;
    let gauge = tree.create(WidgetKind::Meter, Some(root))?;
    let needle = tree.add_indicator(gauge)?;
    let panel = tree.create(WidgetKind::Container, Some(root))?;

    // Flow-side state: component 0 holds the title, 1 the volume variable,
    // 2 the mute output, 3 the gauge tick labels.
    let title_text = PropertyRef::new(SCREEN, 0, 0);
    let volume_value = PropertyRef::new(SCREEN, 1, 0);
    let muted_output = PropertyRef::new(SCREEN, 2, 0);
    let tick_labels = PropertyRef::new(SCREEN, 3, 0);

    flow.set(title_text, "Volume");
    flow.set(volume_value, 20);
    flow.set(
        tick_labels,
        Value::TickLabels((0..=4).map(|i| format!("{}%", i * 25)).collect()),
    );

    runtime.add_update_task(UpdateTask::new(Attribute::LabelText, title, title_text));
    runtime.add_update_task(UpdateTask::new(Attribute::SliderValue, volume, volume_value));
    runtime.add_update_task(
        UpdateTask::new(Attribute::MeterIndicatorValue, gauge, volume_value)
            .with_aux(AuxParams::with_sub_object(needle)),
    );
    runtime.add_event_binding(volume, EventFilter::SliderValueChanged, volume_value);
    runtime.add_event_binding(mute, EventFilter::Checked, muted_output);
    runtime.add_event_binding(
        mute,
        EventFilter::Native(NativeEventKind::Clicked),
        muted_output,
    );
    runtime.add_event_binding(gauge, EventFilter::MeterTickLabel, tick_labels);

    let keyframes: Vec<RawKeyframe> = serde_json::from_str(PANEL_KEYFRAMES)?;
    for keyframe in keyframes {
        runtime.add_raw_keyframe(panel, SCREEN, keyframe)?;
    }
    runtime.set_active_screen(Some(SCREEN));

    for tick in 0..TICKS {
        flow.set_timeline_position(SCREEN, tick as f32 / (TICKS - 1) as f32);

        let TickOutcome::Ran(report) = runtime.tick(&mut flow, &mut tree) else {
            info!("Flow stopped at tick {}", tick);
            break;
        };
        info!(
            "Tick {}: {} writes, {} echoes suppressed, {} timelines written",
            tick,
            report.update.writes,
            report.update.suppressed_echoes,
            report.animate.written
        );

        // The user drags the slider and later toggles mute.
        if tick == 4 {
            let events = tree.input(
                volume,
                Attribute::SliderValue,
                AuxParams::none(),
                AttrValue::Integer(75),
            )?;
            for event in &events {
                runtime.dispatch_event(event, &mut flow, &tree);
            }
        }
        if tick == 8 {
            for event in &tree.click(mute)? {
                runtime.dispatch_event(event, &mut flow, &tree);
            }
        }
    }

    let labels: Vec<String> = (0..5)
        .filter_map(|i| runtime.draw_tick_label(gauge, i, &mut flow))
        .collect();
    let style = tree.style(panel)?;
    let counters = tree.counters();

    println!("ticks run:        {}", flow.ticks());
    println!("volume in flow:   {:?}", flow.get(volume_value));
    let needle_value = tree.read_attribute(
        gauge,
        Attribute::MeterIndicatorValue,
        AuxParams::with_sub_object(needle),
    )?;
    println!("gauge needle:     {:?}", needle_value);
    println!("mute outputs:     {}", flow.propagations().len());
    println!("gauge labels:     {}", labels.join(" "));
    println!(
        "panel style:      x={} y={} opacity={}",
        style.x, style.y, style.opacity
    );
    println!(
        "toolkit work:     {} attribute writes, {} style writes, {} layouts",
        counters.attribute_writes, counters.style_writes, counters.layout_requests
    );
    Ok(())
}
