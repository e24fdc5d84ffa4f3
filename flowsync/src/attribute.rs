//! Widget attributes that can be bound to flow properties.
//!
//! The attribute set is closed. Each attribute has one row in
//! [`ATTRIBUTE_TABLE`] describing how its flow value is evaluated and, for
//! attributes a user can edit, how it is assigned back.

/// Shape of a flow value as evaluated for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Boolean,
    Text,
    /// A string array joined with `'\n'` (dropdown and roller options).
    OptionList,
}

/// A concrete (widget type, attribute) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    LabelText,
    TextareaText,
    DropdownOptions,
    DropdownSelected,
    RollerOptions,
    RollerSelected,
    SliderValue,
    SliderLeftValue,
    ArcValue,
    ArcRangeMin,
    ArcRangeMax,
    BarValue,
    BarStartValue,
    CheckedState,
    DisabledState,
    HiddenFlag,
    ClickableFlag,
    MeterIndicatorValue,
    MeterIndicatorStartValue,
    MeterIndicatorEndValue,
    SpinboxValue,
    SpinboxStep,
    LedColor,
    LedBrightness,
    TabName,
}

/// How an attribute is evaluated and assigned.
#[derive(Debug, Clone, Copy)]
pub struct AttributeInfo {
    pub value: ValueKind,
    /// Error context passed to the flow engine when evaluating.
    pub eval_context: &'static str,
    /// Error context passed when assigning a user edit back, if the attribute is user-editable.
    pub assign_context: Option<&'static str>,
    /// Whether the toolkit needs a sub-object handle (meter indicator) to address the attribute.
    pub needs_sub_object: bool,
}

const fn info(value: ValueKind, eval_context: &'static str) -> AttributeInfo {
    AttributeInfo {
        value,
        eval_context,
        assign_context: None,
        needs_sub_object: false,
    }
}

const fn editable(
    value: ValueKind,
    eval_context: &'static str,
    assign_context: &'static str,
) -> AttributeInfo {
    AttributeInfo {
        value,
        eval_context,
        assign_context: Some(assign_context),
        needs_sub_object: false,
    }
}

const fn indicator(eval_context: &'static str) -> AttributeInfo {
    AttributeInfo {
        value: ValueKind::Integer,
        eval_context,
        assign_context: None,
        needs_sub_object: true,
    }
}

/// One row per [`Attribute`], in declaration order.
pub const ATTRIBUTE_TABLE: [AttributeInfo; Attribute::COUNT] = [
    info(ValueKind::Text, "Failed to evaluate Text in Label widget"),
    editable(
        ValueKind::Text,
        "Failed to evaluate Text in Textarea widget",
        "Failed to assign Text in Textarea widget",
    ),
    info(ValueKind::OptionList, "Failed to evaluate Options in Dropdown widget"),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Selected in Dropdown widget",
        "Failed to assign Selected in Dropdown widget",
    ),
    info(ValueKind::OptionList, "Failed to evaluate Options in Roller widget"),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Selected in Roller widget",
        "Failed to assign Selected in Roller widget",
    ),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Value in Slider widget",
        "Failed to assign Value in Slider widget",
    ),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Value Left in Slider widget",
        "Failed to assign Value Left in Slider widget",
    ),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Value in Arc widget",
        "Failed to assign Value in Arc widget",
    ),
    info(ValueKind::Integer, "Failed to evaluate Range Min in Arc widget"),
    info(ValueKind::Integer, "Failed to evaluate Range Max in Arc widget"),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Value in Bar widget",
        "Failed to assign Value in Bar widget",
    ),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Value Start in Bar widget",
        "Failed to assign Value Start in Bar widget",
    ),
    editable(
        ValueKind::Boolean,
        "Failed to evaluate Checked state",
        "Failed to assign Checked state",
    ),
    info(ValueKind::Boolean, "Failed to evaluate Disabled state"),
    info(ValueKind::Boolean, "Failed to evaluate Hidden flag"),
    info(ValueKind::Boolean, "Failed to evaluate Clickable flag"),
    indicator("Failed to evaluate Indicator Value in Meter widget"),
    indicator("Failed to evaluate Indicator Start Value in Meter widget"),
    indicator("Failed to evaluate Indicator End Value in Meter widget"),
    editable(
        ValueKind::Integer,
        "Failed to evaluate Value in Spinbox widget",
        "Failed to assign Value in Spinbox widget",
    ),
    info(ValueKind::Integer, "Failed to evaluate Step in Spinbox widget"),
    info(ValueKind::Integer, "Failed to evaluate Color in Led widget"),
    info(ValueKind::Integer, "Failed to evaluate Brightness in Led widget"),
    info(ValueKind::Text, "Failed to evaluate Tab name in Tabview widget"),
];

impl Attribute {
    pub const COUNT: usize = 25;

    pub fn info(self) -> &'static AttributeInfo {
        &ATTRIBUTE_TABLE[self as usize]
    }

    pub fn value_kind(self) -> ValueKind {
        self.info().value
    }
}

/// A widget attribute value as read from or written to the toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Integer(i32),
    Boolean(bool),
    Text(String),
}

impl AttrValue {
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            AttrValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Opaque handle to a widget's secondary object, e.g. a meter indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubObjectId(pub u32);

/// Roller option display mode, carried in [`AuxParams::param`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RollerMode {
    #[default]
    Normal,
    /// Options are repeated [`ROLLER_INFINITE_PAGES`] times so the list can wrap.
    Infinite,
}

impl RollerMode {
    pub fn from_param(param: i32) -> Self {
        if param == 1 {
            RollerMode::Infinite
        } else {
            RollerMode::Normal
        }
    }

    pub fn param(self) -> i32 {
        match self {
            RollerMode::Normal => 0,
            RollerMode::Infinite => 1,
        }
    }
}

/// How many copies of the option list an infinite roller keeps.
pub const ROLLER_INFINITE_PAGES: usize = 7;

/// Secondary addressing for an attribute.
///
/// `param` is attribute specific: roller mode for roller options, tab index
/// for tab names, an animate flag for slider and bar values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuxParams {
    pub sub_object: Option<SubObjectId>,
    pub param: i32,
}

impl AuxParams {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_sub_object(sub_object: SubObjectId) -> Self {
        Self {
            sub_object: Some(sub_object),
            param: 0,
        }
    }

    pub fn with_param(param: i32) -> Self {
        Self {
            sub_object: None,
            param,
        }
    }
}

/// Expand a newline-separated option list the way an infinite roller stores it.
pub fn repeat_roller_options(options: &str, mode: RollerMode) -> String {
    match mode {
        RollerMode::Normal => options.to_string(),
        RollerMode::Infinite => vec![options; ROLLER_INFINITE_PAGES].join("\n"),
    }
}

/// True when `current` (as stored by the roller) differs from the flow's `new` option list.
pub fn roller_options_changed(new: &str, current: &str, mode: RollerMode) -> bool {
    match mode {
        RollerMode::Normal => new != current,
        RollerMode::Infinite => repeat_roller_options(new, mode) != current,
    }
}
