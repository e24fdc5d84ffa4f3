use flowsync::headless::{MemoryFlow, Value, WidgetKind, WidgetTree};
use flowsync::{
    AttrValue, Attribute, AuxParams, DispatchReport, EventBridge, EventFilter, FeedbackGuard,
    FlowStateId, NativeEvent, NativeEventKind, PropertyRef, Runtime, RuntimeConfig, Toolkit,
    UpdateTask, WidgetId,
};
use simplelog::{Config, LevelFilter, TestLogger};

const SCREEN: FlowStateId = FlowStateId(1);

fn prop(component: u32, property: u32) -> PropertyRef {
    PropertyRef::new(SCREEN, component, property)
}

fn setup(config: RuntimeConfig) -> (WidgetTree, MemoryFlow, Runtime, WidgetId) {
    // Already installed by an earlier test in this binary.
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
    let mut tree = WidgetTree::new();
    let screen = tree.create(WidgetKind::Screen, None).unwrap();
    (tree, MemoryFlow::new(), Runtime::new(config), screen)
}

fn dispatch_all(
    runtime: &Runtime,
    events: &[NativeEvent],
    flow: &mut MemoryFlow,
    tree: &WidgetTree,
) -> DispatchReport {
    let mut report = DispatchReport::default();
    for event in events {
        report += runtime.dispatch_event(event, flow, tree);
    }
    report
}

/// A slider whose value is bound to `prop(0, 0)` and whose edits are
/// assigned back to `prop(0, 1)`.
fn bound_slider(tree: &mut WidgetTree, runtime: &mut Runtime, screen: WidgetId) -> WidgetId {
    let slider = tree.create(WidgetKind::Slider, Some(screen)).unwrap();
    runtime.add_update_task(UpdateTask::new(Attribute::SliderValue, slider, prop(0, 0)));
    runtime.add_event_binding(slider, EventFilter::SliderValueChanged, prop(0, 1));
    slider
}

// =============================================================================
// Echo Suppression Tests
// =============================================================================

#[test]
fn test_runtime_write_is_not_assigned_back() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::new("echo"));
    let slider = bound_slider(&mut tree, &mut runtime, screen);
    flow.set(prop(0, 0), 50);

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.writes, 1);
    assert_eq!(report.suppressed_echoes, 1);
    assert!(flow.assignments().is_empty());
    assert_eq!(
        tree.read_attribute(slider, Attribute::SliderValue, AuxParams::none()),
        Ok(AttrValue::Integer(50))
    );
}

#[test]
fn test_user_edit_on_same_widget_is_assigned() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::new("echo"));
    let slider = bound_slider(&mut tree, &mut runtime, screen);
    flow.set(prop(0, 0), 50);
    runtime.run_update_tasks(&mut flow, &mut tree);

    let events = tree
        .input(slider, Attribute::SliderValue, AuxParams::none(), AttrValue::Integer(70))
        .unwrap();
    let report = dispatch_all(&runtime, &events, &mut flow, &tree);

    assert_eq!(report.forwarded, 1);
    assert_eq!(report.suppressed, 0);
    assert_eq!(flow.assignments(), &[(prop(0, 1), Value::Integer(70))]);
}

#[test]
fn test_disabled_suppression_forwards_echoes() {
    let config = RuntimeConfig::new("diagnostic").without_echo_suppression();
    let (mut tree, mut flow, mut runtime, screen) = setup(config);
    bound_slider(&mut tree, &mut runtime, screen);
    flow.set(prop(0, 0), 50);

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.suppressed_echoes, 0);
    assert_eq!(flow.assignments(), &[(prop(0, 1), Value::Integer(50))]);
}

#[test]
fn test_guard_only_covers_the_written_widget() {
    let mut tree = WidgetTree::new();
    let written = tree.create(WidgetKind::Slider, None).unwrap();
    let other = tree.create(WidgetKind::Slider, None).unwrap();
    tree.input(other, Attribute::SliderValue, AuxParams::none(), AttrValue::Integer(9))
        .unwrap();

    let mut bridge = EventBridge::new();
    bridge.register(written, EventFilter::SliderValueChanged, prop(0, 1));
    bridge.register(other, EventFilter::SliderValueChanged, prop(1, 1));

    let mut guard = FeedbackGuard::new();
    guard.enter(written, 0);
    let mut flow = MemoryFlow::new();

    let echo = bridge.dispatch(&NativeEvent::value_changed(written), &guard, true, &mut flow, &tree);
    assert_eq!(echo.suppressed, 1);

    let user = bridge.dispatch(&NativeEvent::value_changed(other), &guard, true, &mut flow, &tree);
    assert_eq!(user.forwarded, 1);
    assert_eq!(flow.assignments(), &[(prop(1, 1), Value::Integer(9))]);
}

#[test]
fn test_runtime_write_does_not_fire_gates_or_outputs() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::new("echo"));
    let checkbox = tree.create(WidgetKind::Checkbox, Some(screen)).unwrap();
    let slider = tree.create(WidgetKind::Slider, Some(screen)).unwrap();
    runtime.add_update_task(UpdateTask::new(Attribute::CheckedState, checkbox, prop(0, 0)));
    runtime.add_event_binding(checkbox, EventFilter::Checked, prop(0, 1));
    runtime.add_update_task(UpdateTask::new(Attribute::SliderValue, slider, prop(1, 0)));
    runtime.add_event_binding(
        slider,
        EventFilter::Native(NativeEventKind::ValueChanged),
        prop(1, 1),
    );
    flow.set(prop(0, 0), true);
    flow.set(prop(1, 0), 42);

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.writes, 2);
    assert_eq!(report.suppressed_echoes, 2);
    assert!(flow.propagations().is_empty());

    // The same bindings still fire for the user.
    let events = tree
        .input(slider, Attribute::SliderValue, AuxParams::none(), AttrValue::Integer(7))
        .unwrap();
    dispatch_all(&runtime, &events, &mut flow, &tree);
    assert_eq!(flow.propagations(), &[prop(1, 1)]);
}

#[test]
fn test_silent_writes_have_nothing_to_suppress() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::new("silent"));
    tree.set_echo_writes(false);
    bound_slider(&mut tree, &mut runtime, screen);
    flow.set(prop(0, 0), 50);

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.writes, 1);
    assert_eq!(report.suppressed_echoes, 0);
    assert!(flow.assignments().is_empty());
}

#[test]
fn test_guard_is_released_after_each_task() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::new("echo"));
    bound_slider(&mut tree, &mut runtime, screen);
    flow.set(prop(0, 0), 50);

    runtime.run_update_tasks(&mut flow, &mut tree);
    assert!(runtime.guard().current().is_none());
}

// =============================================================================
// Value Filter Tests
// =============================================================================

#[test]
fn test_textarea_text_is_assigned_as_string() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::default());
    let textarea = tree.create(WidgetKind::Textarea, Some(screen)).unwrap();
    runtime.add_event_binding(textarea, EventFilter::TextareaTextChanged, prop(3, 0));

    let events = tree
        .input(
            textarea,
            Attribute::TextareaText,
            AuxParams::none(),
            AttrValue::Text("typed".into()),
        )
        .unwrap();
    dispatch_all(&runtime, &events, &mut flow, &tree);

    assert_eq!(flow.assignments(), &[(prop(3, 0), Value::Text("typed".into()))]);
}

#[test]
fn test_checked_state_is_assigned_as_boolean() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::default());
    let switch = tree.create(WidgetKind::Switch, Some(screen)).unwrap();
    runtime.add_event_binding(switch, EventFilter::CheckedStateChanged, prop(4, 0));

    let events = tree.click(switch).unwrap();
    let report = dispatch_all(&runtime, &events, &mut flow, &tree);

    assert_eq!(report.forwarded, 1);
    // Pressed, Released and Clicked do not carry a value.
    assert_eq!(report.ignored, 3);
    assert_eq!(flow.assignments(), &[(prop(4, 0), Value::Boolean(true))]);
}

#[test]
fn test_failed_assignment_is_counted() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::default());
    let arc = tree.create(WidgetKind::Arc, Some(screen)).unwrap();
    runtime.add_event_binding(arc, EventFilter::ArcValueChanged, prop(5, 0));
    flow.set_read_only(prop(5, 0));

    let events = tree
        .input(arc, Attribute::ArcValue, AuxParams::none(), AttrValue::Integer(3))
        .unwrap();
    let report = dispatch_all(&runtime, &events, &mut flow, &tree);

    assert_eq!(report.failures, 1);
    assert!(flow.assignments().is_empty());
}

// =============================================================================
// Gate Tests
// =============================================================================

#[test]
fn test_checked_and_unchecked_gates() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::default());
    let checkbox = tree.create(WidgetKind::Checkbox, Some(screen)).unwrap();
    runtime.add_event_binding(checkbox, EventFilter::Checked, prop(6, 0));
    runtime.add_event_binding(checkbox, EventFilter::Unchecked, prop(6, 1));

    let events = tree.click(checkbox).unwrap();
    dispatch_all(&runtime, &events, &mut flow, &tree);
    assert_eq!(flow.propagations(), &[prop(6, 0)]);

    flow.clear_logs();
    let events = tree.click(checkbox).unwrap();
    dispatch_all(&runtime, &events, &mut flow, &tree);
    assert_eq!(flow.propagations(), &[prop(6, 1)]);
    assert!(flow.assignments().is_empty());
}

#[test]
fn test_native_filter_fires_only_on_its_event() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::default());
    let button = tree.create(WidgetKind::Button, Some(screen)).unwrap();
    runtime.add_event_binding(button, EventFilter::Native(NativeEventKind::Clicked), prop(7, 0));
    runtime.add_event_binding(
        button,
        EventFilter::Native(NativeEventKind::LongPressed),
        prop(7, 1),
    );

    let events = tree.click(button).unwrap();
    dispatch_all(&runtime, &events, &mut flow, &tree);
    assert_eq!(flow.propagations(), &[prop(7, 0)]);
}

// =============================================================================
// Tick Label Tests
// =============================================================================

#[test]
fn test_meter_tick_label() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::default());
    let meter = tree.create(WidgetKind::Meter, Some(screen)).unwrap();
    let plain = tree.create(WidgetKind::Meter, Some(screen)).unwrap();
    runtime.add_event_binding(meter, EventFilter::MeterTickLabel, prop(8, 0));
    flow.set(
        prop(8, 0),
        Value::TickLabels(vec!["0".into(), "25".into(), "x".repeat(40)]),
    );

    assert_eq!(runtime.draw_tick_label(meter, 1, &mut flow), Some("25".into()));
    assert_eq!(flow.tick_index(), 1);

    let long = runtime.draw_tick_label(meter, 2, &mut flow).unwrap();
    assert_eq!(long.len(), 31);

    // Evaluation failure and missing binding both fall back to the toolkit's label.
    assert_eq!(runtime.draw_tick_label(meter, 9, &mut flow), None);
    assert_eq!(runtime.draw_tick_label(plain, 0, &mut flow), None);

    // Tick labels never react to dispatched events.
    let report = runtime.dispatch_event(&NativeEvent::value_changed(meter), &mut flow, &tree);
    assert_eq!(report.ignored, 1);
}

#[test]
fn test_tick_label_capacity_is_configurable() {
    let config = RuntimeConfig::new("small").tick_label_capacity(4);
    let (mut tree, mut flow, mut runtime, screen) = setup(config);
    let meter = tree.create(WidgetKind::Meter, Some(screen)).unwrap();
    runtime.add_event_binding(meter, EventFilter::MeterTickLabel, prop(8, 0));
    flow.set(prop(8, 0), "100 km/h");

    assert_eq!(runtime.draw_tick_label(meter, 0, &mut flow), Some("100".into()));

    // Three bytes fit; the second two-byte degree sign does not.
    flow.set(prop(8, 0), "°°");
    assert_eq!(runtime.draw_tick_label(meter, 0, &mut flow), Some("°".into()));
}

// =============================================================================
// Teardown Tests
// =============================================================================

#[test]
fn test_remove_widget_drops_bindings_and_tasks() {
    let (mut tree, mut flow, mut runtime, screen) = setup(RuntimeConfig::default());
    let slider = bound_slider(&mut tree, &mut runtime, screen);

    assert!(runtime.remove_widget(slider));
    assert!(runtime.tasks().is_empty());
    assert!(runtime.bridge().is_empty());
    assert!(!runtime.remove_widget(slider));

    let events = tree
        .input(slider, Attribute::SliderValue, AuxParams::none(), AttrValue::Integer(1))
        .unwrap();
    let report = dispatch_all(&runtime, &events, &mut flow, &tree);
    assert_eq!(report, DispatchReport::default());
}
