use flowsync::attribute::{ROLLER_INFINITE_PAGES, repeat_roller_options};
use flowsync::headless::{MemoryFlow, Value, WidgetKind, WidgetTree};
use flowsync::{
    AttrValue, Attribute, AuxParams, FlowStateId, PropertyRef, RollerMode, Runtime, RuntimeConfig,
    TickOutcome, Toolkit, UpdateTask, WidgetId,
};

const SCREEN: FlowStateId = FlowStateId(1);

fn prop(component: u32, property: u32) -> PropertyRef {
    PropertyRef::new(SCREEN, component, property)
}

fn setup() -> (WidgetTree, MemoryFlow, Runtime, WidgetId) {
    let mut tree = WidgetTree::new();
    let screen = tree.create(WidgetKind::Screen, None).unwrap();
    let mut runtime = Runtime::new(RuntimeConfig::new("test"));
    runtime.set_active_screen(Some(SCREEN));
    (tree, MemoryFlow::new(), runtime, screen)
}

fn read(tree: &WidgetTree, widget: WidgetId, attribute: Attribute, aux: AuxParams) -> AttrValue {
    tree.read_attribute(widget, attribute, aux).unwrap()
}

// =============================================================================
// Diff-Before-Write Tests
// =============================================================================

#[test]
fn test_unchanged_value_is_not_written() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let label = tree.create(WidgetKind::Label, Some(screen)).unwrap();
    flow.set(prop(0, 0), "hello");
    runtime.add_update_task(UpdateTask::new(Attribute::LabelText, label, prop(0, 0)));

    let first = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(first.tasks, 1);
    assert_eq!(first.writes, 1);
    assert_eq!(
        read(&tree, label, Attribute::LabelText, AuxParams::none()),
        AttrValue::Text("hello".into())
    );

    tree.reset_counters();
    let second = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(second.writes, 0);
    assert_eq!(tree.counters().attribute_writes, 0);
    assert_eq!(tree.counters().layout_requests, 0);
}

#[test]
fn test_changed_value_is_written() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let slider = tree.create(WidgetKind::Slider, Some(screen)).unwrap();
    flow.set(prop(0, 0), 10);
    runtime.add_update_task(UpdateTask::new(Attribute::SliderValue, slider, prop(0, 0)));

    runtime.run_update_tasks(&mut flow, &mut tree);
    flow.set(prop(0, 0), 42);
    let report = runtime.run_update_tasks(&mut flow, &mut tree);

    assert_eq!(report.writes, 1);
    assert_eq!(tree.counters().attribute_writes, 2);
    assert_eq!(
        read(&tree, slider, Attribute::SliderValue, AuxParams::none()).as_integer(),
        Some(42)
    );
}

#[test]
fn test_boolean_flags() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let button = tree.create(WidgetKind::Button, Some(screen)).unwrap();
    flow.set(prop(0, 0), true);
    flow.set(prop(0, 1), false);
    runtime.add_update_task(UpdateTask::new(Attribute::HiddenFlag, button, prop(0, 0)));
    runtime.add_update_task(UpdateTask::new(Attribute::DisabledState, button, prop(0, 1)));

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    // Disabled already reads false.
    assert_eq!(report.tasks, 2);
    assert_eq!(report.writes, 1);
    assert_eq!(
        read(&tree, button, Attribute::HiddenFlag, AuxParams::none()),
        AttrValue::Boolean(true)
    );
}

// =============================================================================
// Option Lists
// =============================================================================

#[test]
fn test_dropdown_options_are_joined_with_newlines() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let dropdown = tree.create(WidgetKind::Dropdown, Some(screen)).unwrap();
    flow.set(
        prop(0, 0),
        Value::StringArray(vec!["red".into(), "green".into(), "blue".into()]),
    );
    runtime.add_update_task(UpdateTask::new(Attribute::DropdownOptions, dropdown, prop(0, 0)));

    runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(
        read(&tree, dropdown, Attribute::DropdownOptions, AuxParams::none()),
        AttrValue::Text("red\ngreen\nblue".into())
    );
}

#[test]
fn test_infinite_roller_is_not_rewritten() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let roller = tree.create(WidgetKind::Roller, Some(screen)).unwrap();
    let aux = AuxParams::with_param(RollerMode::Infinite.param());
    flow.set(prop(0, 0), Value::StringArray(vec!["a".into(), "b".into()]));
    runtime.add_update_task(
        UpdateTask::new(Attribute::RollerOptions, roller, prop(0, 0)).with_aux(aux),
    );

    let first = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(first.writes, 1);
    let stored = read(&tree, roller, Attribute::RollerOptions, aux);
    assert_eq!(
        stored,
        AttrValue::Text(repeat_roller_options("a\nb", RollerMode::Infinite))
    );
    assert_eq!(
        stored.as_text().unwrap().lines().count(),
        2 * ROLLER_INFINITE_PAGES
    );

    let second = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(second.writes, 0);
    assert_eq!(tree.counters().attribute_writes, 1);
}

// =============================================================================
// Auxiliary Addressing
// =============================================================================

#[test]
fn test_meter_indicator_values() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let meter = tree.create(WidgetKind::Meter, Some(screen)).unwrap();
    let needle = tree.add_indicator(meter).unwrap();
    let arc = tree.add_indicator(meter).unwrap();
    flow.set(prop(0, 0), 30);
    flow.set(prop(0, 1), 70);
    runtime.add_update_task(
        UpdateTask::new(Attribute::MeterIndicatorValue, meter, prop(0, 0))
            .with_aux(AuxParams::with_sub_object(needle)),
    );
    runtime.add_update_task(
        UpdateTask::new(Attribute::MeterIndicatorEndValue, meter, prop(0, 1))
            .with_aux(AuxParams::with_sub_object(arc)),
    );

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.writes, 2);
    assert_eq!(
        read(
            &tree,
            meter,
            Attribute::MeterIndicatorValue,
            AuxParams::with_sub_object(needle)
        ),
        AttrValue::Integer(30)
    );
    assert_eq!(
        read(
            &tree,
            meter,
            Attribute::MeterIndicatorValue,
            AuxParams::with_sub_object(arc)
        ),
        AttrValue::Integer(0)
    );
}

#[test]
fn test_tab_name_by_index() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let tabs = tree.create(WidgetKind::Tabview, Some(screen)).unwrap();
    tree.add_tab(tabs, "First").unwrap();
    let second = tree.add_tab(tabs, "Second").unwrap();
    flow.set(prop(0, 0), "Renamed");
    runtime.add_update_task(
        UpdateTask::new(Attribute::TabName, tabs, prop(0, 0))
            .with_aux(AuxParams::with_param(second as i32)),
    );

    runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(
        read(&tree, tabs, Attribute::TabName, AuxParams::with_param(0)),
        AttrValue::Text("First".into())
    );
    assert_eq!(
        read(&tree, tabs, Attribute::TabName, AuxParams::with_param(1)),
        AttrValue::Text("Renamed".into())
    );
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_eval_failure_skips_only_that_task() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let broken = tree.create(WidgetKind::Label, Some(screen)).unwrap();
    let fine = tree.create(WidgetKind::Label, Some(screen)).unwrap();
    flow.set(prop(0, 0), Value::Error("division by zero".into()));
    flow.set(prop(1, 0), "ok");
    runtime.add_update_task(UpdateTask::new(Attribute::LabelText, broken, prop(0, 0)));
    // Never set in the flow.
    runtime.add_update_task(UpdateTask::new(Attribute::LabelText, broken, prop(2, 0)));
    runtime.add_update_task(UpdateTask::new(Attribute::LabelText, fine, prop(1, 0)));

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.tasks, 3);
    assert_eq!(report.eval_failures, 2);
    assert_eq!(report.writes, 1);
    assert_eq!(
        read(&tree, broken, Attribute::LabelText, AuxParams::none()),
        AttrValue::Text(String::new())
    );
    assert!(runtime.guard().current().is_none());
}

#[test]
fn test_deleted_widget_task_is_inert_until_pruned() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let label = tree.create(WidgetKind::Label, Some(screen)).unwrap();
    flow.set(prop(0, 0), "hello");
    runtime.add_update_task(UpdateTask::new(Attribute::LabelText, label, prop(0, 0)));
    tree.delete(label).unwrap();

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.stale, 1);
    assert_eq!(report.writes, 0);

    assert_eq!(runtime.prune_stale(&tree), 1);
    assert!(runtime.tasks().is_empty());
}

#[test]
fn test_unsupported_attribute_is_skipped() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let label = tree.create(WidgetKind::Label, Some(screen)).unwrap();
    flow.set(prop(0, 0), 5);
    runtime.add_update_task(UpdateTask::new(Attribute::ArcValue, label, prop(0, 0)));

    let report = runtime.run_update_tasks(&mut flow, &mut tree);
    assert_eq!(report.stale, 1);
    assert_eq!(tree.counters().attribute_writes, 0);
}

// =============================================================================
// Tick Tests
// =============================================================================

#[test]
fn test_tick_runs_update_tasks() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let bar = tree.create(WidgetKind::Bar, Some(screen)).unwrap();
    flow.set(prop(0, 0), 64);
    runtime.add_update_task(UpdateTask::new(Attribute::BarValue, bar, prop(0, 0)));

    let outcome = runtime.tick(&mut flow, &mut tree);
    assert_eq!(flow.ticks(), 1);
    let report = outcome.report().unwrap();
    assert_eq!(report.update.writes, 1);
}

#[test]
fn test_stopped_flow_does_nothing() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let bar = tree.create(WidgetKind::Bar, Some(screen)).unwrap();
    flow.set(prop(0, 0), 64);
    runtime.add_update_task(UpdateTask::new(Attribute::BarValue, bar, prop(0, 0)));
    flow.stop();

    assert_eq!(runtime.tick(&mut flow, &mut tree), TickOutcome::Stopped);
    assert_eq!(flow.ticks(), 0);
    assert_eq!(tree.counters().attribute_writes, 0);
}

#[test]
fn test_flow_stopping_mid_tick_skips_sync() {
    let (mut tree, mut flow, mut runtime, screen) = setup();
    let bar = tree.create(WidgetKind::Bar, Some(screen)).unwrap();
    flow.set(prop(0, 0), 64);
    runtime.add_update_task(UpdateTask::new(Attribute::BarValue, bar, prop(0, 0)));
    flow.stop_after(1);

    assert!(runtime.tick(&mut flow, &mut tree).is_stopped());
    assert_eq!(flow.ticks(), 1);
    assert_eq!(tree.counters().attribute_writes, 0);
}
